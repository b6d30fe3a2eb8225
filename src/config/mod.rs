//! Configuration: the engine-wide TOML config and the per-arena YAML schema

pub mod arena_config;
pub mod engine;

pub use arena_config::{ArenaConfigFile, ArenaConfigKey};
pub use engine::EngineConfig;
