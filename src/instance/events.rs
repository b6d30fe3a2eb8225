//! Pre-dispose notification
//!
//! Listeners run synchronously inside [`InstanceFactory::dispose`](super::InstanceFactory::dispose)
//! while the environment is still loaded. They run under the factory lock, so
//! a listener must not call back into the factory.

use super::arena::Instance;

/// An instance about to be torn down
#[derive(Debug)]
pub struct PreDisposeEvent<'a> {
    pub instance: &'a Instance,
    /// Whether the instance is an edit session that will be committed
    pub edit_session: bool,
}

/// Receives [`PreDisposeEvent`]s
pub trait DisposeListener: Send + Sync {
    fn on_pre_dispose(&self, event: &PreDisposeEvent<'_>);

    fn listener_name(&self) -> &str {
        "unnamed_listener"
    }
}
