//! Error types for form definitions

use grants_services::AppError;
use std::path::PathBuf;

/// Errors while loading or validating form definitions
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    /// Definition directory or file could not be read
    #[error("io error reading {}: {source}", path.display())]
    Io {
        /// File or directory
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// YAML did not match the definition schema
    #[error("invalid form yaml: {0}")]
    Yaml(#[source] serde_yaml::Error),

    /// Definition parsed but is inconsistent
    #[error("invalid form '{slug}': {message}")]
    Invalid {
        /// Form slug
        slug: String,
        /// What is wrong
        message: String,
    },

    /// Two definitions share a slug
    #[error("duplicate form slug: '{0}'")]
    DuplicateSlug(String),

    /// A file in the definitions directory failed to load
    #[error("{}: {source}", path.display())]
    Load {
        /// Definition file
        path: PathBuf,
        /// Load failure
        #[source]
        source: Box<FormError>,
    },
}

impl FormError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<FormError> for AppError {
    fn from(err: FormError) -> Self {
        AppError::config(err.to_string()).with_source(err)
    }
}
