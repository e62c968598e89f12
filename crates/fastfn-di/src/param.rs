//! Parameter declarations and their classification.
//!
//! A [`ParamDecl`] is the registration-time description of one parameter of
//! an endpoint or dependency: its declared type, any markers attached to the
//! type, and its default (which may itself be a marker). [`classify`] turns a
//! declaration into exactly one [`Classified`] role.

use fastfn_core::{FieldDefault, Schema};
use fastfn_extract::{FieldDescriptor, ParamLocation};
use fastfn_router::PathPattern;
use serde_json::Value;

use crate::{Callable, DeclarationError, Dependency};

/// The declared type of a parameter.
#[derive(Debug, Clone)]
pub enum DeclaredType {
    /// A value with a schema.
    Value(Schema),
    /// The live request object.
    Request,
    /// The platform's per-invocation context object.
    InvocationContext,
    /// No annotation; treated as an unconstrained scalar.
    Unannotated,
}

impl DeclaredType {
    fn schema(&self) -> Schema {
        match self {
            Self::Value(schema) => schema.clone(),
            _ => Schema::any(),
        }
    }

    fn type_name(&self) -> String {
        match self {
            Self::Value(Schema::Model(model)) => model.name.clone(),
            Self::Value(_) => "value".to_string(),
            Self::Request => "Request".to_string(),
            Self::InvocationContext => "InvocationContext".to_string(),
            Self::Unannotated => "Any".to_string(),
        }
    }
}

/// Declares that a parameter is produced by a dependency.
#[derive(Debug, Clone)]
pub struct DependsMarker {
    /// The dependency; `None` means "use the declared type".
    pub dependency: Option<Dependency>,
    /// Reuse a value already produced in this request.
    pub use_cache: bool,
    /// Security scopes requested from this point down.
    pub scopes: Vec<String>,
    /// Whether this is a security requirement.
    pub security: bool,
}

impl DependsMarker {
    /// A cached, scope-less dependency marker.
    #[must_use]
    pub fn new(dependency: Option<Dependency>) -> Self {
        Self {
            dependency,
            use_cache: true,
            scopes: Vec::new(),
            security: false,
        }
    }
}

/// Declares where a parameter is read from.
#[derive(Debug, Clone)]
pub struct FieldMarker {
    /// Source location.
    pub location: ParamLocation,
    /// Lookup key overriding the name.
    pub alias: Option<String>,
    /// For headers, derive the key by replacing `_` with `-`.
    pub convert_underscores: bool,
    /// For body fields, force lookup inside the body mapping.
    pub embed: bool,
    /// Default when absent.
    pub default: FieldDefault,
}

impl FieldMarker {
    /// A required marker for `location`.
    #[must_use]
    pub fn new(location: ParamLocation) -> Self {
        Self {
            location,
            alias: None,
            convert_underscores: true,
            embed: false,
            default: FieldDefault::Required,
        }
    }
}

/// Metadata attached to a parameter.
#[derive(Debug, Clone)]
pub enum Marker {
    /// Produced by a dependency.
    Depends(DependsMarker),
    /// Read from the request.
    Field(FieldMarker),
}

impl Marker {
    fn describe(&self) -> &'static str {
        match self {
            Self::Depends(d) if d.security => "Security",
            Self::Depends(_) => "Depends",
            Self::Field(f) => match f.location {
                ParamLocation::Path => "Path",
                ParamLocation::Query => "Query",
                ParamLocation::Header => "Header",
                ParamLocation::Body => "Body",
            },
        }
    }
}

/// A parameter's default.
#[derive(Debug, Clone)]
pub enum ParamDefault {
    /// No default.
    Empty,
    /// A plain default value or factory.
    Value(FieldDefault),
    /// A marker given in default position.
    Marker(Marker),
}

/// One declared parameter.
///
/// Most declarations are made through [`Param`]; the fields are public for
/// callers that need an unusual combination.
#[derive(Debug, Clone)]
pub struct ParamDecl {
    /// Parameter name.
    pub name: String,
    /// Declared type.
    pub ty: DeclaredType,
    /// Markers attached to the type annotation.
    pub annotated: Vec<Marker>,
    /// Default, possibly a marker.
    pub default: ParamDefault,
}

impl ParamDecl {
    /// A plain declaration with no markers and no default.
    pub fn new(name: impl Into<String>, ty: DeclaredType) -> Self {
        Self {
            name: name.into(),
            ty,
            annotated: Vec::new(),
            default: ParamDefault::Empty,
        }
    }

    /// Attach a marker to the type annotation.
    #[must_use]
    pub fn annotate(mut self, marker: Marker) -> Self {
        self.annotated.push(marker);
        self
    }

    /// Give the default as a marker.
    #[must_use]
    pub fn default_marker(mut self, marker: Marker) -> Self {
        self.default = ParamDefault::Marker(marker);
        self
    }

    /// Set a fixed default.
    ///
    /// If the default position already holds a field marker, the value
    /// becomes that marker's default.
    #[must_use]
    pub fn default(self, value: Value) -> Self {
        self.with_field_default(FieldDefault::Value(value))
    }

    /// Set a default factory, run once per absent value.
    #[must_use]
    pub fn default_factory<F>(self, f: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.with_field_default(FieldDefault::factory(f))
    }

    fn with_field_default(mut self, default: FieldDefault) -> Self {
        match &mut self.default {
            ParamDefault::Marker(Marker::Field(marker)) => marker.default = default,
            slot => *slot = ParamDefault::Value(default),
        }
        self
    }

    /// Set the lookup alias on the field marker.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        let alias = alias.into();
        if let Some(marker) = self.field_marker_mut() {
            marker.alias = Some(alias);
        }
        self
    }

    /// Force an embedded body lookup.
    #[must_use]
    pub fn embed(mut self) -> Self {
        if let Some(marker) = self.field_marker_mut() {
            marker.embed = true;
        }
        self
    }

    /// Toggle `_` to `-` conversion for header keys.
    #[must_use]
    pub fn convert_underscores(mut self, convert: bool) -> Self {
        if let Some(marker) = self.field_marker_mut() {
            marker.convert_underscores = convert;
        }
        self
    }

    /// Toggle per-request caching of the dependency.
    #[must_use]
    pub fn use_cache(mut self, use_cache: bool) -> Self {
        if let Some(marker) = self.depends_marker_mut() {
            marker.use_cache = use_cache;
        }
        self
    }

    /// Add requested security scopes.
    #[must_use]
    pub fn scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Some(marker) = self.depends_marker_mut() {
            marker.scopes.extend(scopes.into_iter().map(Into::into));
        }
        self
    }

    fn markers_mut(&mut self) -> impl Iterator<Item = &mut Marker> {
        let default = match &mut self.default {
            ParamDefault::Marker(marker) => Some(marker),
            _ => None,
        };
        self.annotated.iter_mut().chain(default)
    }

    fn field_marker_mut(&mut self) -> Option<&mut FieldMarker> {
        self.markers_mut().find_map(|m| match m {
            Marker::Field(f) => Some(f),
            Marker::Depends(_) => None,
        })
    }

    fn depends_marker_mut(&mut self) -> Option<&mut DependsMarker> {
        self.markers_mut().find_map(|m| match m {
            Marker::Depends(d) => Some(d),
            Marker::Field(_) => None,
        })
    }
}

/// Shorthand constructors for common declarations.
///
/// ```
/// use fastfn_core::Schema;
/// use fastfn_di::Param;
/// use serde_json::json;
///
/// let q = Param::query("q", Schema::string()).alias("item-query");
/// let limit = Param::inferred("limit", Schema::integer()).default(json!(10));
/// let token = Param::header("x_token", Schema::string());
/// # let _ = (q, limit, token);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Param;

impl Param {
    fn field(name: &str, schema: Schema, location: ParamLocation) -> ParamDecl {
        ParamDecl::new(name, DeclaredType::Value(schema))
            .annotate(Marker::Field(FieldMarker::new(location)))
    }

    /// A parameter whose location is inferred from its type.
    pub fn inferred(name: &str, schema: Schema) -> ParamDecl {
        ParamDecl::new(name, DeclaredType::Value(schema))
    }

    /// An explicit path parameter.
    pub fn path(name: &str, schema: Schema) -> ParamDecl {
        Self::field(name, schema, ParamLocation::Path)
    }

    /// An explicit query parameter.
    pub fn query(name: &str, schema: Schema) -> ParamDecl {
        Self::field(name, schema, ParamLocation::Query)
    }

    /// An explicit header parameter.
    pub fn header(name: &str, schema: Schema) -> ParamDecl {
        Self::field(name, schema, ParamLocation::Header)
    }

    /// An explicit body parameter.
    pub fn body(name: &str, schema: Schema) -> ParamDecl {
        Self::field(name, schema, ParamLocation::Body)
    }

    /// A parameter produced by `dependency`.
    pub fn depends(name: &str, dependency: &Dependency) -> ParamDecl {
        ParamDecl::new(name, DeclaredType::Unannotated)
            .annotate(Marker::Depends(DependsMarker::new(Some(dependency.clone()))))
    }

    /// A parameter produced by a security dependency with requested scopes.
    pub fn security<I, S>(name: &str, dependency: &Dependency, scopes: I) -> ParamDecl
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut marker = DependsMarker::new(Some(dependency.clone()));
        marker.security = true;
        marker.scopes = scopes.into_iter().map(Into::into).collect();
        ParamDecl::new(name, DeclaredType::Unannotated).annotate(Marker::Depends(marker))
    }

    /// A parameter that receives the live request.
    pub fn request(name: &str) -> ParamDecl {
        ParamDecl::new(name, DeclaredType::Request)
    }

    /// A parameter bound to the platform invocation context.
    pub fn context(name: &str) -> ParamDecl {
        ParamDecl::new(name, DeclaredType::InvocationContext)
    }
}

/// The single role a parameter plays.
#[derive(Debug, Clone)]
pub enum Classified {
    /// Produced by a sub-dependency.
    Dependency {
        /// The dependency to invoke.
        dependency: Dependency,
        /// Caching and scope options from the marker.
        marker: DependsMarker,
    },
    /// Read from the request.
    Field(FieldDescriptor),
    /// Receives the live request.
    InjectRequest,
    /// Supplied by the platform outside resolution.
    Skip,
}

/// Classify one declaration against the route pattern.
///
/// # Errors
///
/// Returns a [`DeclarationError`] for conflicting markers, a dependency in
/// both annotation and default, or a path placeholder declared with a
/// non-path kind, a non-scalar type, or a default.
pub fn classify(decl: &ParamDecl, pattern: &PathPattern) -> Result<Classified, DeclarationError> {
    let name = decl.name.as_str();

    let mut annotated = decl.annotated.iter();
    let explicit = annotated.next();
    if let Some(extra) = annotated.next() {
        return Err(DeclarationError::conflict(
            name,
            format!(
                "cannot combine {} and {} in one annotation",
                explicit.map_or("", Marker::describe),
                extra.describe()
            ),
        ));
    }

    let marker = match (explicit, &decl.default) {
        (Some(Marker::Depends(_)), ParamDefault::Marker(Marker::Depends(_))) => {
            return Err(DeclarationError::DualDependency {
                param: name.to_string(),
            });
        }
        (Some(a), ParamDefault::Marker(b)) => {
            return Err(DeclarationError::conflict(
                name,
                format!(
                    "{} in the annotation cannot be combined with {} as the default",
                    a.describe(),
                    b.describe()
                ),
            ));
        }
        (Some(Marker::Depends(_)), ParamDefault::Value(_)) => {
            return Err(DeclarationError::conflict(
                name,
                "a dependency parameter cannot have a default value",
            ));
        }
        (Some(marker), _) | (None, ParamDefault::Marker(marker)) => Some(marker),
        (None, _) => None,
    };

    if let Some(Marker::Depends(depends)) = marker {
        let dependency = depends.dependency.clone().unwrap_or_else(|| {
            let type_name = decl.ty.type_name();
            Dependency::new(type_name.clone(), Callable::type_reference(type_name))
        });
        return Ok(Classified::Dependency {
            dependency,
            marker: depends.clone(),
        });
    }

    let field_marker = match marker {
        Some(Marker::Field(f)) => Some(f),
        _ => None,
    };

    match decl.ty {
        DeclaredType::Request | DeclaredType::InvocationContext if field_marker.is_some() => {
            return Err(DeclarationError::conflict(
                name,
                "request and context parameters cannot carry field markers",
            ));
        }
        DeclaredType::Request => return Ok(Classified::InjectRequest),
        DeclaredType::InvocationContext => return Ok(Classified::Skip),
        DeclaredType::Value(_) | DeclaredType::Unannotated => {}
    }

    let schema = decl.ty.schema();
    let default = match (field_marker, &decl.default) {
        (Some(f), ParamDefault::Empty | ParamDefault::Marker(_)) => f.default.clone(),
        (_, ParamDefault::Value(default)) => default.clone(),
        (None, _) => FieldDefault::Required,
    };

    let location = if pattern.has_param(name) {
        if let Some(f) = field_marker.filter(|f| f.location != ParamLocation::Path) {
            return Err(DeclarationError::PathKindMismatch {
                param: name.to_string(),
                kind: f.location,
            });
        }
        if !schema.is_scalar() {
            return Err(DeclarationError::NonScalarPath {
                param: name.to_string(),
            });
        }
        if !default.is_required() {
            return Err(DeclarationError::PathDefault {
                param: name.to_string(),
            });
        }
        ParamLocation::Path
    } else if let Some(f) = field_marker {
        if f.location == ParamLocation::Path {
            return Err(DeclarationError::NotAPathPlaceholder {
                param: name.to_string(),
                path: pattern.as_str().to_string(),
            });
        }
        f.location
    } else if schema.is_scalar() {
        ParamLocation::Query
    } else {
        ParamLocation::Body
    };

    let alias = match field_marker.and_then(|f| f.alias.clone()) {
        Some(alias) => alias,
        None if location == ParamLocation::Header
            && field_marker.map_or(true, |f| f.convert_underscores) =>
        {
            name.replace('_', "-")
        }
        None => name.to_string(),
    };

    let descriptor = FieldDescriptor::new(name, location, schema)
        .with_alias(alias)
        .with_field_default(default)
        .embedded(field_marker.is_some_and(|f| f.embed));
    Ok(Classified::Field(descriptor))
}
