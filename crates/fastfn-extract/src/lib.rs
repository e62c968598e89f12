//! # fastfn Extract
//!
//! Location-aware extraction of request values.
//!
//! A [`FieldDescriptor`] says where one value lives ([`ParamLocation`]),
//! what it must look like ([`Schema`](fastfn_core::Schema)) and what to use
//! when it is absent. The extractor functions turn a group of descriptors
//! plus a raw source into validated values and location-tagged errors:
//!
//! | Function          | Source                                   |
//! |-------------------|------------------------------------------|
//! | [`extract`]       | path params, query map or header map     |
//! | [`extract_body`]  | parsed JSON body, per [`BodyPolicy`]     |
//!
//! Errors are never short-circuited: every field in the group is tried and
//! every failure is returned.

#![doc(html_root_url = "https://docs.rs/fastfn-extract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod extract;
mod field;
mod source;

pub use extract::{extract, extract_body, validate_field, BodyPolicy, Extracted};
pub use field::{FieldDescriptor, ParamLocation};
pub use source::ParamSource;
