//! Instance subsystem error helpers

use crate::error::{invalid_argument, ArenaError};

/// Create a use-after-dispose error
pub fn disposed(name: &str) -> ArenaError {
    ArenaError::Disposed {
        name: name.to_string(),
    }
}

/// Create an error for an index-addressed removal past the end
pub fn index_out_of_range(what: &str, index: usize, len: usize) -> ArenaError {
    invalid_argument(format!(
        "No {} at index {} (have {})",
        what, index, len
    ))
}

/// Create a name in use error
pub fn name_in_use(name: &str) -> ArenaError {
    ArenaError::NameInUse {
        name: name.to_string(),
    }
}
