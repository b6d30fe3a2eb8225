//! World Module
//!
//! Positions and regions shared by every arena, the contract of the host
//! runtime that loads arenas as live environments, and the void terrain used
//! for anything an arena template does not store on disk.
//!
//! # Layout
//!
//! - **position / region**: plain data types serialized into arena configs
//! - **host**: `HostRuntime`, `ChunkGenerator` and `WorldView` traits
//! - **generation**: `VoidGenerator` terrain provider
//! - **headless**: in-process `HostRuntime` implementation

pub mod generation;
pub mod headless;
pub mod host;
pub mod position;
pub mod region;

pub use generation::{VoidGenerator, VoidPopulator};
pub use headless::{ChunkStore, HeadlessHost, LevelData};
pub use host::{
    ActorId, BlockPopulator, ChunkGenerator, ChunkSections, EnvironmentHandle, EnvironmentId,
    HostRuntime, WorldView,
};
pub use position::{ChunkPos, Location, VoxelPos};
pub use region::CuboidRegion;
