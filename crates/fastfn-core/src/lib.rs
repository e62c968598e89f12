//! # fastfn Core
//!
//! Core types shared by every fastfn crate:
//!
//! - [`Request`] - Read-only view of one inbound request
//! - [`Response`] - Finalized `(status, headers, body, base64)` response
//! - [`Schema`] - Declared value shapes and the validation capability
//! - [`ValidationError`] - Location-tagged validation failure
//! - [`FastfnError`] - Standard error type and its client rendering

#![doc(html_root_url = "https://docs.rs/fastfn-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod request;
mod response;
mod schema;
mod validation;

pub use error::{ErrorCategory, FastfnError, FastfnResult, HttpException};
pub use request::{parse_query, Request, RequestBuilder};
pub use response::{Response, HTML_CONTENT_TYPE, JSON_CONTENT_TYPE, TEXT_CONTENT_TYPE};
pub use schema::{FieldDefault, ModelField, ModelSchema, Schema};
pub use validation::{Loc, LocSegment, ValidationError};
