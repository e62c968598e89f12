//! The dependant graph.
//!
//! A [`Dependant`] is built once per route. The root describes the endpoint
//! itself; every child describes one sub-dependency, with the parameters
//! it reads grouped by location and its own children below it. Shared
//! dependencies appear once per use site; identity is recovered at request
//! time through the [`CacheKey`].

use std::collections::HashSet;

use fastfn_extract::{BodyPolicy, FieldDescriptor, ParamLocation};
use fastfn_router::PathPattern;

use crate::param::{classify, Classified, DependsMarker};
use crate::{CallKind, CallableId, DeclarationError, Dependency, ParamDecl, SecurityRequirement};

/// Identity of a dependency result within one request.
///
/// Two uses of the same callable share a slot only when they also request
/// the same set of security scopes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    callable: CallableId,
    scopes: Vec<String>,
}

impl CacheKey {
    /// Key for `callable` under `scopes`; order and duplicates are ignored.
    pub fn new<I, S>(callable: CallableId, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut scopes: Vec<String> = scopes.into_iter().map(Into::into).collect();
        scopes.sort();
        scopes.dedup();
        Self { callable, scopes }
    }

    /// The callable part of the key.
    pub fn callable(&self) -> CallableId {
        self.callable
    }

    /// The sorted, de-duplicated scopes.
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }
}

/// How a non-root node is invoked.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Dependency name, for logs and teardown bookkeeping.
    pub label: String,
    /// Invocation strategy.
    pub kind: CallKind,
    /// Whether the per-request cache is consulted and filled.
    pub use_cache: bool,
    /// Cache slot.
    pub cache_key: CacheKey,
}

/// One node of the dependency graph.
#[derive(Debug, Clone, Default)]
pub struct Dependant {
    /// Name the node's value is delivered under; `None` for side-effect
    /// dependencies and the root.
    pub name: Option<String>,
    /// How to invoke this node; `None` for the root.
    pub invocation: Option<Invocation>,
    /// Path fields read by this node.
    pub path_params: Vec<FieldDescriptor>,
    /// Query fields read by this node.
    pub query_params: Vec<FieldDescriptor>,
    /// Header fields read by this node.
    pub header_params: Vec<FieldDescriptor>,
    /// Body fields read by this node.
    pub body_params: Vec<FieldDescriptor>,
    /// Sub-dependencies in declaration order.
    pub dependencies: Vec<Dependant>,
    /// Security schemes enforced at this node.
    pub security_requirements: Vec<SecurityRequirement>,
    /// Scopes accumulated from the root down to this node.
    pub security_scopes: Vec<String>,
    /// Parameters that receive the live request.
    pub request_params: Vec<String>,
}

impl Dependant {
    /// Build the graph for an endpoint.
    ///
    /// `route_dependencies` run first, in order, and deliver no value.
    ///
    /// # Errors
    ///
    /// Returns the first [`DeclarationError`] found anywhere in the graph.
    ///
    /// # Example
    ///
    /// ```
    /// use fastfn_core::Schema;
    /// use fastfn_di::{Dependant, Param};
    /// use fastfn_router::PathPattern;
    ///
    /// let pattern = PathPattern::compile("/items/{item_id}").unwrap();
    /// let params = [
    ///     Param::inferred("item_id", Schema::integer()),
    ///     Param::inferred("q", Schema::string()),
    /// ];
    /// let root = Dependant::for_endpoint("read_item", &pattern, &params, &[]).unwrap();
    /// assert_eq!(root.path_params.len(), 1);
    /// assert_eq!(root.query_params.len(), 1);
    /// ```
    pub fn for_endpoint(
        endpoint: &str,
        pattern: &PathPattern,
        params: &[ParamDecl],
        route_dependencies: &[Dependency],
    ) -> Result<Self, DeclarationError> {
        let mut root = Self::default();
        for dependency in route_dependencies {
            let marker = DependsMarker::new(Some(dependency.clone()));
            root.dependencies
                .push(Self::for_dependency(None, dependency, &marker, &[], pattern)?);
        }
        root.add_params(endpoint, params, &[], pattern)?;
        Ok(root)
    }

    fn for_dependency(
        name: Option<String>,
        dependency: &Dependency,
        marker: &DependsMarker,
        parent_scopes: &[String],
        pattern: &PathPattern,
    ) -> Result<Self, DeclarationError> {
        let mut scopes = parent_scopes.to_vec();
        for scope in &marker.scopes {
            if !scopes.contains(scope) {
                scopes.push(scope.clone());
            }
        }

        let callable = dependency.callable();
        let mut node = Self {
            name,
            invocation: Some(Invocation {
                label: dependency.name().to_string(),
                kind: callable.kind(dependency.name()),
                use_cache: marker.use_cache,
                cache_key: CacheKey::new(callable.id(), scopes.iter().cloned()),
            }),
            ..Self::default()
        };
        if let Some(scheme) = dependency.security() {
            node.security_requirements.push(SecurityRequirement {
                scheme: scheme.clone(),
                scopes: scopes.clone(),
            });
        }
        node.add_params(dependency.name(), dependency.params(), &scopes, pattern)?;
        node.security_scopes = scopes;
        Ok(node)
    }

    fn add_params(
        &mut self,
        owner: &str,
        params: &[ParamDecl],
        scopes: &[String],
        pattern: &PathPattern,
    ) -> Result<(), DeclarationError> {
        let mut seen = HashSet::new();
        for decl in params {
            if !seen.insert(decl.name.as_str()) {
                return Err(DeclarationError::DuplicateParam {
                    param: decl.name.clone(),
                    owner: owner.to_string(),
                });
            }
            match classify(decl, pattern)? {
                Classified::Dependency { dependency, marker } => {
                    let child = Self::for_dependency(
                        Some(decl.name.clone()),
                        &dependency,
                        &marker,
                        scopes,
                        pattern,
                    )?;
                    self.dependencies.push(child);
                }
                Classified::Field(field) => match field.location {
                    ParamLocation::Path => self.path_params.push(field),
                    ParamLocation::Query => self.query_params.push(field),
                    ParamLocation::Header => self.header_params.push(field),
                    ParamLocation::Body => self.body_params.push(field),
                },
                Classified::InjectRequest => self.request_params.push(decl.name.clone()),
                Classified::Skip => {}
            }
        }
        Ok(())
    }

    /// True if this node's callable asked for the request.
    pub fn injects_request(&self) -> bool {
        !self.request_params.is_empty()
    }

    /// Body fields of this node and every descendant, in resolution order.
    pub fn flat_body_params(&self) -> Vec<&FieldDescriptor> {
        let mut out = Vec::new();
        self.collect_body(&mut out);
        out
    }

    fn collect_body<'a>(&'a self, out: &mut Vec<&'a FieldDescriptor>) {
        for child in &self.dependencies {
            child.collect_body(out);
        }
        out.extend(&self.body_params);
    }

    /// How body fields anywhere in this graph locate their values.
    pub fn body_policy(&self) -> BodyPolicy {
        BodyPolicy::for_fields(self.flat_body_params())
    }

    /// True if any node in the graph reads the body.
    pub fn reads_body(&self) -> bool {
        !self.body_params.is_empty() || self.dependencies.iter().any(Self::reads_body)
    }

    /// Security requirements of every node, root first.
    pub fn flat_security_requirements(&self) -> Vec<&SecurityRequirement> {
        let mut out: Vec<&SecurityRequirement> = self.security_requirements.iter().collect();
        for child in &self.dependencies {
            out.extend(child.flat_security_requirements());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Callable, Param, SecurityScheme};
    use fastfn_core::{ModelField, ModelSchema, Schema};
    use serde_json::{json, Value};

    fn pattern(path: &str) -> PathPattern {
        PathPattern::compile(path).unwrap()
    }

    fn noop(name: &str) -> Dependency {
        Dependency::new(name, Callable::from_async(|_| async { Ok(Value::Null) }))
    }

    #[test]
    fn test_cache_key_ignores_scope_order() {
        let id = noop("a").callable().id();
        assert_eq!(
            CacheKey::new(id, ["write", "read", "read"]),
            CacheKey::new(id, ["read", "write"])
        );
        assert_ne!(CacheKey::new(id, ["read"]), CacheKey::new(id, Vec::<String>::new()));
    }

    #[test]
    fn test_fields_grouped_by_location() {
        let params = [
            Param::inferred("item_id", Schema::integer()),
            Param::inferred("q", Schema::string()),
            Param::header("user_agent", Schema::string()),
            Param::inferred("item", Schema::model(ModelSchema::new("Item"))),
            Param::request("request"),
            Param::context("context"),
        ];
        let root = Dependant::for_endpoint("ep", &pattern("/items/{item_id}"), &params, &[]).unwrap();
        assert_eq!(root.path_params.len(), 1);
        assert_eq!(root.query_params.len(), 1);
        assert_eq!(root.header_params[0].alias, "user-agent");
        assert_eq!(root.body_params.len(), 1);
        assert!(root.injects_request());
        assert!(root.invocation.is_none());
        assert_eq!(root.body_policy(), BodyPolicy::Raw);
    }

    #[test]
    fn test_shared_dependency_shares_cache_key() {
        let shared = noop("get_user");
        let a = noop("a").param(Param::depends("user", &shared));
        let params = [Param::depends("a", &a), Param::depends("user", &shared)];
        let root = Dependant::for_endpoint("ep", &pattern("/"), &params, &[]).unwrap();

        let via_a = &root.dependencies[0].dependencies[0];
        let direct = &root.dependencies[1];
        assert_eq!(
            via_a.invocation.as_ref().unwrap().cache_key,
            direct.invocation.as_ref().unwrap().cache_key
        );
    }

    #[test]
    fn test_scopes_accumulate_downwards() {
        let scheme = SecurityScheme {
            name: "OAuth2".to_string(),
            kind: "oauth2".to_string(),
            scheme: None,
        };
        let token = noop("token").security_scheme(scheme);
        let user = noop("user").param(Param::security("token", &token, ["me"]));
        let params = [Param::security("user", &user, ["items"])];
        let root = Dependant::for_endpoint("ep", &pattern("/"), &params, &[]).unwrap();

        let user_node = &root.dependencies[0];
        let token_node = &user_node.dependencies[0];
        assert_eq!(user_node.security_scopes, ["items"]);
        assert_eq!(token_node.security_scopes, ["items", "me"]);
        assert_eq!(
            token_node.invocation.as_ref().unwrap().cache_key.scopes(),
            ["items", "me"]
        );
        let reqs = root.flat_security_requirements();
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].scopes, ["items", "me"]);
    }

    #[test]
    fn test_route_dependencies_first_and_unnamed() {
        let verify = noop("verify_key");
        let params = [Param::depends("user", &noop("user"))];
        let root = Dependant::for_endpoint("ep", &pattern("/"), &params, &[verify]).unwrap();
        assert_eq!(root.dependencies.len(), 2);
        assert!(root.dependencies[0].name.is_none());
        assert_eq!(root.dependencies[1].name.as_deref(), Some("user"));
    }

    #[test]
    fn test_flat_body_makes_embedded_policy() {
        let model = Schema::model(ModelSchema::new("Item").field(ModelField::new("name", Schema::string())));
        let dep = noop("extra").param(Param::body("importance", Schema::integer()));
        let params = [Param::inferred("item", model), Param::depends("extra", &dep)];
        let root = Dependant::for_endpoint("ep", &pattern("/"), &params, &[]).unwrap();

        let names: Vec<&str> = root.flat_body_params().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["importance", "item"]);
        assert_eq!(root.body_policy(), BodyPolicy::Embedded);
        assert!(root.reads_body());
    }

    #[test]
    fn test_use_cache_flag_and_invalid_kind() {
        let sync = Dependency::new("legacy", Callable::from_sync(|_| Ok(json!(1))));
        let params = [Param::depends("legacy", &sync).use_cache(false)];
        let root = Dependant::for_endpoint("ep", &pattern("/"), &params, &[]).unwrap();
        let invocation = root.dependencies[0].invocation.as_ref().unwrap();
        assert!(!invocation.use_cache);
        assert!(invocation.kind.is_invalid());
    }

    #[test]
    fn test_duplicate_param_rejected() {
        let params = [
            Param::inferred("q", Schema::string()),
            Param::inferred("q", Schema::integer()),
        ];
        assert!(matches!(
            Dependant::for_endpoint("ep", &pattern("/"), &params, &[]),
            Err(DeclarationError::DuplicateParam { .. })
        ));
    }

    #[test]
    fn test_nested_declaration_error_surfaces() {
        let bad = noop("bad").param(Param::query("item_id", Schema::integer()));
        let params = [Param::depends("bad", &bad)];
        assert!(matches!(
            Dependant::for_endpoint("ep", &pattern("/items/{item_id}"), &params, &[]),
            Err(DeclarationError::PathKindMismatch { .. })
        ));
    }
}
