//! Path pattern compilation and segment converters.
//!
//! A pattern such as `/users/{user_id:int}/files/{rest:path}` is compiled
//! once at registration into an anchored regular expression. Each
//! placeholder carries a [`Converter`] that decides both what the segment
//! may look like and how the captured text is normalized.

use regex::Regex;

use crate::{Params, RouteError};

/// How a single placeholder segment is matched and converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Converter {
    /// Any run of characters except `/`. The default.
    Str,
    /// Digits only; the captured value is normalized to its integer form.
    Int,
    /// Greedy match of the remaining path, slashes included.
    Path,
}

impl Converter {
    /// Look up a converter by the name used in patterns (`str`, `int`, `path`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "str" => Some(Self::Str),
            "int" => Some(Self::Int),
            "path" => Some(Self::Path),
            _ => None,
        }
    }

    /// The regular expression fragment for this converter.
    #[must_use]
    pub const fn regex(self) -> &'static str {
        match self {
            Self::Str => "[^/]+",
            Self::Int => "[0-9]+",
            Self::Path => ".*",
        }
    }

    /// Convert a captured segment into the value exposed to handlers.
    #[must_use]
    pub fn convert(self, raw: &str) -> String {
        match self {
            Self::Str | Self::Path => raw.to_string(),
            Self::Int => {
                let trimmed = raw.trim_start_matches('0');
                if trimmed.is_empty() {
                    "0".to_string()
                } else {
                    trimmed.to_string()
                }
            }
        }
    }
}

/// A compiled route pattern.
#[derive(Debug, Clone)]
pub struct PathPattern {
    path: String,
    regex: Regex,
    params: Vec<(String, Converter)>,
}

impl PathPattern {
    /// Compile a route pattern.
    ///
    /// # Errors
    ///
    /// Fails on an unknown converter name or a repeated placeholder.
    ///
    /// # Example
    ///
    /// ```rust
    /// use fastfn_router::PathPattern;
    ///
    /// let pattern = PathPattern::compile("/items/{item_id:int}").unwrap();
    /// let params = pattern.match_path("/items/042").unwrap();
    /// assert_eq!(params.get("item_id"), Some("42"));
    /// assert!(pattern.match_path("/items/abc").is_none());
    /// ```
    pub fn compile(path: &str) -> Result<Self, RouteError> {
        let mut expr = String::with_capacity(path.len() + 8);
        let mut params: Vec<(String, Converter)> = Vec::new();
        expr.push('^');

        let mut rest = path;
        while let Some(open) = rest.find('{') {
            let Some(close) = rest[open..].find('}').map(|i| open + i) else {
                break;
            };
            let inner = &rest[open + 1..close];
            let (name, converter_name) = match inner.split_once(':') {
                Some((name, conv)) => (name, Some(conv)),
                None => (inner, None),
            };

            if !is_identifier(name) || !converter_name.map_or(true, is_identifier) {
                // Not a placeholder; keep the braces literally.
                expr.push_str(&regex::escape(&rest[..=open]));
                rest = &rest[open + 1..];
                continue;
            }

            let converter = match converter_name {
                Some(conv) => Converter::from_name(conv)
                    .ok_or_else(|| RouteError::unknown_converter(conv, path))?,
                None => Converter::Str,
            };
            if params.iter().any(|(existing, _)| existing == name) {
                return Err(RouteError::duplicate_param(name, path));
            }

            expr.push_str(&regex::escape(&rest[..open]));
            expr.push('(');
            expr.push_str(converter.regex());
            expr.push(')');
            params.push((name.to_string(), converter));
            rest = &rest[close + 1..];
        }
        expr.push_str(&regex::escape(rest));
        expr.push('$');

        let regex = Regex::new(&expr).map_err(|source| RouteError::InvalidPattern {
            path: path.to_string(),
            source,
        })?;

        Ok(Self {
            path: path.to_string(),
            regex,
            params,
        })
    }

    /// The pattern as it was registered.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// Placeholder names in declaration order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|(name, _)| name.as_str())
    }

    /// Returns true if `name` is one of this pattern's placeholders.
    #[must_use]
    pub fn has_param(&self, name: &str) -> bool {
        self.params.iter().any(|(n, _)| n == name)
    }

    /// Match a request path, returning converted parameters on success.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<Params> {
        let captures = self.regex.captures(path)?;
        let mut params = Params::new();
        for (index, (name, converter)) in self.params.iter().enumerate() {
            let raw = captures.get(index + 1)?.as_str();
            params.push(name.as_str(), converter.convert(raw));
        }
        Some(params)
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_static_pattern() {
        let pattern = PathPattern::compile("/health").unwrap();
        assert!(pattern.match_path("/health").is_some());
        assert!(pattern.match_path("/health/").is_none());
        assert!(pattern.match_path("/healthz").is_none());
    }

    #[test]
    fn test_str_converter_is_default() {
        let pattern = PathPattern::compile("/users/{name}").unwrap();
        let params = pattern.match_path("/users/alice").unwrap();
        assert_eq!(params.get("name"), Some("alice"));
        assert!(pattern.match_path("/users/a/b").is_none());
    }

    #[test]
    fn test_int_converter_rejects_non_digits() {
        let pattern = PathPattern::compile("/items/{item_id:int}").unwrap();
        assert!(pattern.match_path("/items/abc").is_none());
        assert!(pattern.match_path("/items/-1").is_none());
        assert_eq!(
            pattern.match_path("/items/0010").unwrap().get("item_id"),
            Some("10")
        );
        assert_eq!(
            pattern.match_path("/items/000").unwrap().get("item_id"),
            Some("0")
        );
    }

    #[test]
    fn test_path_converter_is_greedy() {
        let pattern = PathPattern::compile("/files/{file_path:path}").unwrap();
        let params = pattern.match_path("/files/a/b/c.txt").unwrap();
        assert_eq!(params.get("file_path"), Some("a/b/c.txt"));
    }

    #[test]
    fn test_multiple_params_keep_order() {
        let pattern = PathPattern::compile("/orgs/{org}/repos/{repo_id:int}").unwrap();
        let names: Vec<_> = pattern.param_names().collect();
        assert_eq!(names, vec!["org", "repo_id"]);
        assert!(pattern.has_param("repo_id"));
        assert!(!pattern.has_param("repo"));
    }

    #[test]
    fn test_unknown_converter_fails() {
        let err = PathPattern::compile("/items/{id:uuid}").unwrap_err();
        assert!(matches!(err, RouteError::UnknownConverter { ref converter, .. } if converter == "uuid"));
    }

    #[test]
    fn test_duplicate_param_fails() {
        let err = PathPattern::compile("/a/{id}/b/{id}").unwrap_err();
        assert!(matches!(err, RouteError::DuplicateParam { .. }));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let pattern = PathPattern::compile("/v1.0/items").unwrap();
        assert!(pattern.match_path("/v1.0/items").is_some());
        assert!(pattern.match_path("/v1x0/items").is_none());
    }

    #[test]
    fn test_non_identifier_braces_are_literal() {
        let pattern = PathPattern::compile("/weird/{1x}").unwrap();
        assert_eq!(pattern.param_names().count(), 0);
        assert!(pattern.match_path("/weird/{1x}").is_some());
    }

    proptest! {
        #[test]
        fn prop_int_converter_matches_any_digit_run(n in 0u64..u64::MAX) {
            let pattern = PathPattern::compile("/n/{value:int}").unwrap();
            let params = pattern.match_path(&format!("/n/{n}")).unwrap();
            let expected = n.to_string();
            prop_assert_eq!(params.get("value"), Some(expected.as_str()));
        }

        #[test]
        fn prop_str_converter_never_spans_slash(a in "[a-z]{1,8}", b in "[a-z]{1,8}") {
            let pattern = PathPattern::compile("/s/{value}").unwrap();
            let spanning = format!("/s/{a}/{b}");
            prop_assert!(pattern.match_path(&spanning).is_none());
            let matched = pattern.match_path(&format!("/s/{a}"));
            prop_assert!(matched.is_some());
        }
    }
}
