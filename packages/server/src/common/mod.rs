// Common types and utilities shared across the application

pub mod csv;
pub mod entity_ids;
pub mod error;
pub mod id;
pub mod types;
pub mod validation;

pub use entity_ids::*;
pub use error::StartError;
pub use id::Id;
pub use types::*;
pub use validation::{parse_http_url, parse_http_urls, validate_url_count, ValidationError};
