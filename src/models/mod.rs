//! Data models for the Mini App backend.
//!
//! These models match the JSON the Mini App client exchanges with the API.

mod api;
mod identity;
mod record;

pub use api::*;
pub use identity::*;
pub use record::*;
