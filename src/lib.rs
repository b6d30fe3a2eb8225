//! Arena Engine
//!
//! Lifecycle engine for disposable, filesystem-backed arena instances cloned
//! from named templates. The host runtime that actually runs an environment
//! sits behind [`world::HostRuntime`]; [`world::HeadlessHost`] runs it in
//! process.

pub mod config;
pub mod constants;
pub mod error;
pub mod instance;
pub mod persistence;
pub mod world;

pub use config::{ArenaConfigFile, ArenaConfigKey, EngineConfig};
pub use error::{ArenaError, ArenaResult};
pub use instance::{
    ConfigDiagnostic, DisposeListener, EditableInstance, Instance, InstanceBuilder,
    InstanceFactory, PreDisposeEvent, SharedEditSession, Template,
};
pub use world::{CuboidRegion, HeadlessHost, HostRuntime, Location, VoidGenerator, VoxelPos};
