//! Engine-wide error handling
//!
//! Every fallible operation in the crate returns [`ArenaResult`]. Helper
//! constructors below keep call sites short and replace `unwrap()` calls with
//! errors that name the resource involved.

use std::path::{Path, PathBuf};

/// Result type for arena operations
pub type ArenaResult<T> = Result<T, ArenaError>;

/// Errors that can occur while provisioning, editing or disposing arenas
#[derive(Debug, thiserror::Error)]
pub enum ArenaError {
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Not found: {what}")]
    NotFound { what: String },

    #[error("Arena name '{name}' is already in use")]
    NameInUse { name: String },

    #[error("Builder is missing parameters: {missing}")]
    Unfinished { missing: String },

    #[error("IO failure at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No templates are available")]
    EmptyCatalog,

    #[error("Config error in {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Arena '{name}' has already been disposed")]
    Disposed { name: String },
}

impl From<bincode::Error> for ArenaError {
    fn from(err: bincode::Error) -> Self {
        ArenaError::Serialization {
            message: err.to_string(),
        }
    }
}

/// Attach the path being operated on to an io error
pub trait ArenaErrorContext<T> {
    fn io_context(self, path: impl AsRef<Path>) -> ArenaResult<T>;
}

impl<T> ArenaErrorContext<T> for Result<T, std::io::Error> {
    fn io_context(self, path: impl AsRef<Path>) -> ArenaResult<T> {
        self.map_err(|source| io_error(path, source))
    }
}

/// Create an io error for a path
pub fn io_error(path: impl AsRef<Path>, source: std::io::Error) -> ArenaError {
    ArenaError::Io {
        path: path.as_ref().to_path_buf(),
        source,
    }
}

/// Create an invalid argument error
pub fn invalid_argument(message: impl Into<String>) -> ArenaError {
    ArenaError::InvalidArgument {
        message: message.into(),
    }
}

/// Create a template not found error
pub fn template_not_found(name: &str) -> ArenaError {
    ArenaError::NotFound {
        what: format!("template '{}'", name),
    }
}

/// Create a config error
pub fn config_error(path: impl AsRef<Path>, message: impl std::fmt::Display) -> ArenaError {
    ArenaError::Config {
        path: path.as_ref().to_path_buf(),
        message: message.to_string(),
    }
}
