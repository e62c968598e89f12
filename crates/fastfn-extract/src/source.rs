//! Raw value sources.

use std::collections::HashMap;

use fastfn_router::Params;
use http::HeaderMap;
use indexmap::IndexMap;

/// A single-valued string mapping that fields are looked up in.
///
/// Header maps are case-insensitive; other sources are exact.
pub trait ParamSource {
    /// The raw value for `key`, if present.
    fn get_raw(&self, key: &str) -> Option<&str>;
}

impl ParamSource for HeaderMap {
    fn get_raw(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| v.to_str().ok())
    }
}

impl ParamSource for IndexMap<String, String> {
    fn get_raw(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}

impl ParamSource for HashMap<String, String> {
    fn get_raw(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}

impl ParamSource for Params {
    fn get_raw(&self, key: &str) -> Option<&str> {
        self.get(key)
    }
}
