//! REST API module.
//!
//! Contains all API routes and handlers following the Mini App client contract.

mod admin;
mod data;
mod donation;

pub use admin::*;
pub use data::*;
pub use donation::*;

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<T, crate::errors::AppError>;
