//! Record repository with revision checks on top of the store client.
//!
//! The store itself only knows whole-document reads and overwrites. Revisions
//! are hashes of the document text computed here; a write that names the revision it was
//! based on is only applied while the stored document still has that revision.
//! Writes from this process are serialized, so the check and the overwrite
//! cannot interleave with another request of the same process.

use serde_json::value::RawValue;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use super::JsonBinClient;
use crate::errors::AppError;

/// Content hash identifying one version of the record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Revision(String);

impl Revision {
    /// Revision of a document text.
    pub fn of(document: &str) -> Self {
        Self(hex::encode(Sha256::digest(document.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Quoted entity tag for the `ETag` header.
    pub fn to_etag(&self) -> String {
        format!("\"{}\"", self.0)
    }
}

/// Precondition parsed from an `If-Match` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precondition {
    /// `*`: any stored document is acceptable
    Any,
    /// One of the listed revisions must be stored
    OneOf(Vec<Revision>),
}

impl Precondition {
    /// Parse an `If-Match` value; `None` when it names nothing usable.
    pub fn parse(header: &str) -> Option<Self> {
        let header = header.trim();
        if header == "*" {
            return Some(Self::Any);
        }

        let revisions: Vec<Revision> = header
            .split(',')
            .map(|tag| tag.trim())
            .map(|tag| tag.strip_prefix("W/").unwrap_or(tag))
            .map(|tag| tag.trim_matches('"'))
            .filter(|tag| !tag.is_empty())
            .map(|tag| Revision(tag.to_ascii_lowercase()))
            .collect();

        if revisions.is_empty() {
            None
        } else {
            Some(Self::OneOf(revisions))
        }
    }

    pub fn matches(&self, current: &Revision) -> bool {
        match self {
            Self::Any => true,
            Self::OneOf(revisions) => revisions.contains(current),
        }
    }
}

/// Reads and writes the single record document.
#[derive(Debug)]
pub struct RecordRepository {
    client: JsonBinClient,
    write_lock: Mutex<()>,
}

impl RecordRepository {
    pub fn new(client: JsonBinClient) -> Self {
        Self {
            client,
            write_lock: Mutex::new(()),
        }
    }

    /// Get the stored record and its revision.
    pub async fn read(&self) -> Result<(Box<RawValue>, Revision), AppError> {
        let record = self.client.fetch().await?;
        let revision = Revision::of(record.get());
        Ok((record, revision))
    }

    /// Replace the stored record.
    ///
    /// Without a precondition this is a blind overwrite: concurrent writers race
    /// and the last overwrite to reach the store wins. With one, the stored
    /// document is re-read and the overwrite only happens if it still matches.
    pub async fn write(
        &self,
        record: &RawValue,
        precondition: Option<&Precondition>,
    ) -> Result<Revision, AppError> {
        let _guard = self.write_lock.lock().await;

        if let Some(precondition @ Precondition::OneOf(_)) = precondition {
            let current = Revision::of(self.client.fetch().await?.get());
            if !precondition.matches(&current) {
                return Err(AppError::Conflict {
                    message: "Record was changed by someone else".to_string(),
                    current_revision: current.as_str().to_string(),
                });
            }
        }

        let stored = self.client.replace(record).await?;
        Ok(Revision::of(stored.as_deref().unwrap_or(record).get()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"{"posts":[],"reviews":[{"id":1,"rating":5}]}"#;

    #[test]
    fn test_revision_is_stable_for_identical_text() {
        assert_eq!(Revision::of(DOCUMENT), Revision::of(&DOCUMENT.to_string()));
        assert_eq!(Revision::of(DOCUMENT).as_str().len(), 64);
    }

    #[test]
    fn test_revision_changes_with_text() {
        assert_ne!(
            Revision::of(r#"{"posts":[{"likes":1}]}"#),
            Revision::of(r#"{"posts":[{"likes":2}]}"#)
        );
        // Same members in another order is another document text.
        assert_ne!(
            Revision::of(DOCUMENT),
            Revision::of(r#"{"reviews":[{"id":1,"rating":5}],"posts":[]}"#)
        );
    }

    #[test]
    fn test_etag_is_quoted() {
        let revision = Revision::of("{}");
        assert_eq!(revision.to_etag(), format!("\"{}\"", revision.as_str()));
    }

    #[test]
    fn test_precondition_parsing() {
        let revision = Revision::of(DOCUMENT);

        assert_eq!(Precondition::parse("*"), Some(Precondition::Any));
        assert_eq!(Precondition::parse(""), None);
        assert_eq!(Precondition::parse("\"\""), None);

        let exact = Precondition::parse(&revision.to_etag()).unwrap();
        assert!(exact.matches(&revision));

        let weak = Precondition::parse(&format!("W/{}", revision.to_etag())).unwrap();
        assert!(weak.matches(&revision));

        let upper = Precondition::parse(&revision.as_str().to_uppercase()).unwrap();
        assert!(upper.matches(&revision));

        let list = Precondition::parse(&format!("\"0000\", {}", revision.to_etag())).unwrap();
        assert!(list.matches(&revision));

        let stale = Precondition::parse("\"0000\"").unwrap();
        assert!(!stale.matches(&revision));
        assert!(Precondition::Any.matches(&revision));
    }
}
