//! Record model matching the document the Mini App client reads and writes.
//!
//! The proxy passes the record through as opaque JSON text; these types describe the
//! shape the client uses and back the content summary written to the logs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Identity;

/// Post, comment and review authors share the caller identity shape.
pub type Author = Identity;

/// The whole application state held in the document store.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Record {
    #[serde(default)]
    pub posts: Vec<Post>,
    #[serde(default)]
    pub reviews: Vec<Review>,
    /// Members the client added that this model does not know about
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A feed post.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub author: Author,
    pub date: DateTime<Utc>,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub likes: i64,
    #[serde(default)]
    pub liked_by: Vec<i64>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

/// A comment under a post.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    pub id: i64,
    pub author: Author,
    pub date: DateTime<Utc>,
    pub text: String,
}

/// An entry on the reviews board.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub id: i64,
    pub author: Author,
    pub date: DateTime<Utc>,
    pub text: String,
    pub rating: i32,
}

/// Counts reported in the logs when a record passes through the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordSummary {
    pub posts: usize,
    pub comments: usize,
    pub reviews: usize,
}

impl Record {
    /// Summarize a stored document, or `None` when it does not have the client's shape.
    pub fn summarize(document: &str) -> Option<RecordSummary> {
        let record: Record = serde_json::from_str(document).ok()?;
        Some(RecordSummary {
            posts: record.posts.len(),
            comments: record.posts.iter().map(|p| p.comments.len()).sum(),
            reviews: record.reviews.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "posts": [{
                "id": 1718000000000i64,
                "author": { "id": 1, "name": "Stefan Budimir", "username": "stefan_budimir" },
                "date": "2024-06-10T06:13:20.000Z",
                "text": "First post",
                "likes": 2,
                "likedBy": [5, 6],
                "comments": [{
                    "id": 1718000000001i64,
                    "author": { "id": 5, "name": "Ana", "username": null },
                    "date": "2024-06-10T07:00:00.000Z",
                    "text": "Nice"
                }]
            }],
            "reviews": [{
                "id": 1718000000002i64,
                "author": { "id": 6, "name": "Ivan", "username": "ivan" },
                "date": "2024-06-11T00:00:00Z",
                "text": "Great",
                "rating": 5
            }],
            "pinned": 1
        })
    }

    #[test]
    fn test_summary_counts_content() {
        let summary = Record::summarize(&sample().to_string()).unwrap();
        assert_eq!(
            summary,
            RecordSummary {
                posts: 1,
                comments: 1,
                reviews: 1
            }
        );
    }

    #[test]
    fn test_summary_of_foreign_shape() {
        assert!(Record::summarize(r#"{ "posts": "nope" }"#).is_none());
        assert!(Record::summarize("[1, 2, 3]").is_none());
        assert!(Record::summarize("null").is_none());
        assert!(
            Record::summarize(r#"{"posts":[],"big":123456789012345678901234567890}"#).is_some()
        );
        assert_eq!(
            Record::summarize("{}"),
            Some(RecordSummary {
                posts: 0,
                comments: 0,
                reviews: 0
            })
        );
    }

    #[test]
    fn test_typed_record_keeps_unknown_members() {
        let record: Record = serde_json::from_value(sample()).unwrap();
        assert_eq!(record.posts[0].liked_by, vec![5, 6]);
        assert_eq!(record.posts[0].comments[0].author.username, None);
        assert_eq!(record.reviews[0].rating, 5);
        assert_eq!(record.extra.get("pinned"), Some(&json!(1)));

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["pinned"], 1);
        assert_eq!(back["posts"][0]["likedBy"], json!([5, 6]));
    }
}
