use thiserror::Error;

use glossa_core::GlossaError;

/// Errors raised by the term service operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Core(#[from] GlossaError),

    #[error("text is empty after normalization")]
    EmptyText,

    #[error("parent text is empty after normalization")]
    EmptyParentText,

    #[error("terms span multiple languages")]
    MixedLanguages,

    #[error("term '{0}' already exists in this language")]
    DuplicateTerm(String),
}

/// Convenience Result alias for the service crate.
pub type Result<T> = std::result::Result<T, ServiceError>;
