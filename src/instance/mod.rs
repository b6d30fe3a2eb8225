/// Arena Instance System
///
/// Provisions ephemeral working copies of arena templates, tracks one edit
/// session per template and tears instances down again.
///
/// Lifecycle per template: none -> live (cloned and loaded) -> optional edit
/// session -> disposed.

pub mod arena;
pub mod builder;
pub mod catalog;
pub mod edit_session;
pub mod error;
pub mod events;
pub mod factory;

pub use arena::Instance;
pub use builder::InstanceBuilder;
pub use catalog::{Template, TemplateCatalog};
pub use edit_session::{ConfigDiagnostic, EditableInstance};
pub use events::{DisposeListener, PreDisposeEvent};
pub use factory::{Disposable, InstanceFactory, SharedEditSession};
