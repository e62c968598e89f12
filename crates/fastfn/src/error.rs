//! Route registration errors.

use fastfn_di::DeclarationError;
use fastfn_router::RouteError;
use thiserror::Error;

/// A route could not be registered.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The path pattern or method set is invalid.
    #[error(transparent)]
    Route(#[from] RouteError),

    /// A parameter or dependency declaration is invalid.
    #[error("endpoint '{endpoint}': {source}")]
    Declaration {
        /// Endpoint name.
        endpoint: String,
        /// What was wrong.
        #[source]
        source: DeclarationError,
    },
}
