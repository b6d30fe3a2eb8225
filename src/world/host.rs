//! Host runtime contract
//!
//! The host owns live environments: it loads a folder as a playable world,
//! drives chunk generation through a [`ChunkGenerator`], and unloads it again.
//! The instance factory only talks to the host through these traits.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::{ChunkPos, Location, VoxelPos};
use crate::error::ArenaResult;

/// Sections of one chunk column, bottom up. `None` means all air.
pub type ChunkSections = Vec<Option<Vec<u16>>>;

/// 128-bit identity of a loaded environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EnvironmentId {
    pub high: u64,
    pub low: u64,
}

impl EnvironmentId {
    /// Create a new random id
    pub fn new() -> Self {
        Self {
            high: rand::random(),
            low: rand::random(),
        }
    }

    pub fn to_bytes(&self) -> [u8; 16] {
        let mut bytes = [0u8; 16];
        bytes[0..8].copy_from_slice(&self.high.to_be_bytes());
        bytes[8..16].copy_from_slice(&self.low.to_be_bytes());
        bytes
    }
}

impl Default for EnvironmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EnvironmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}{:016x}", self.high, self.low)
    }
}

/// Someone present inside an environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(pub u64);

/// Handle to an environment loaded by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentHandle {
    pub id: EnvironmentId,
    pub name: String,
    pub folder: PathBuf,
}

impl EnvironmentHandle {
    pub fn folder(&self) -> &Path {
        &self.folder
    }
}

/// Block access the generator needs while populating or picking a spawn
pub trait WorldView {
    fn max_height(&self) -> usize;

    fn is_chunk_loaded(&self, pos: ChunkPos) -> bool;

    fn load_chunk(&mut self, pos: ChunkPos);

    /// Height of the highest non-air block in the column, 0 when empty
    fn highest_block_y_at(&self, x: i32, z: i32) -> i32;

    fn block_at(&self, pos: VoxelPos) -> u16;

    fn set_block_data(&mut self, pos: VoxelPos, data: u8);
}

/// Post-generation pass over a freshly generated chunk
pub trait BlockPopulator: Send + Sync {
    fn populate(&self, world: &mut dyn WorldView, rng: &mut dyn RngCore, chunk: ChunkPos);
}

/// Procedural content for chunks that have no backing data on disk
pub trait ChunkGenerator: Send + Sync {
    /// Generate the block sections for one chunk column
    fn generate_sections(
        &self,
        max_height: usize,
        rng: &mut dyn RngCore,
        chunk: ChunkPos,
    ) -> ChunkSections;

    /// Spawn point for a world with no stored spawn
    fn fixed_spawn(&self, world: &mut dyn WorldView, rng: &mut dyn RngCore) -> Location;

    /// Populators run on every newly generated chunk
    fn populators(&self) -> Vec<Box<dyn BlockPopulator>> {
        Vec::new()
    }
}

/// The environment engine hosting live arenas
pub trait HostRuntime: Send + Sync {
    /// Directory that holds every loaded environment folder
    fn container_dir(&self) -> &Path;

    /// Load `container_dir()/name` as a live environment
    fn create_environment(
        &self,
        name: &str,
        generator: Arc<dyn ChunkGenerator>,
    ) -> ArenaResult<EnvironmentHandle>;

    /// Unload an environment. Returns false if the host refused.
    fn unload(&self, handle: &EnvironmentHandle, save: bool) -> bool;

    fn is_registered(&self, id: EnvironmentId) -> bool;

    fn list_actors(&self, handle: &EnvironmentHandle) -> Vec<ActorId>;

    fn notify(&self, actor: ActorId, message: &str);

    /// Flush the environment's state to its folder
    fn save(&self, handle: &EnvironmentHandle) -> ArenaResult<()>;
}
