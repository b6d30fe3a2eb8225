//! Filesystem persistence for templates and working copies

pub mod atomic;
pub mod transfer;

pub use atomic::atomic_write;
pub use transfer::{copy_tree, delete_tree, strip_identity_marker, tree_size};
