//! In-process host runtime
//!
//! Keeps every loaded environment in memory: generated chunks, spawn point and
//! the actors present. Saving writes `level.dat` into the environment folder,
//! loading reads it back. Used by the binary and by the test suites.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use super::host::{
    ActorId, ChunkGenerator, ChunkSections, EnvironmentHandle, EnvironmentId, HostRuntime,
    WorldView,
};
use super::{ChunkPos, Location, VoxelPos};
use crate::constants::blocks::AIR;
use crate::constants::files::{LEVEL_FILE, UID_MARKER};
use crate::constants::terrain::{CHUNK_WIDTH, SECTION_HEIGHT, SECTION_VOLUME};
use crate::error::{ArenaErrorContext, ArenaResult};
use crate::persistence::atomic_write;

/// Level data persisted on save
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelData {
    pub name: String,
    pub spawn: Location,
    /// Unix timestamp of the last save
    pub saved_at: i64,
}

struct StoredChunk {
    sections: ChunkSections,
    data: HashMap<VoxelPos, u8>,
}

/// Chunk storage of one environment
pub struct ChunkStore {
    max_height: usize,
    generator: Arc<dyn ChunkGenerator>,
    chunks: HashMap<ChunkPos, StoredChunk>,
}

impl ChunkStore {
    fn new(max_height: usize, generator: Arc<dyn ChunkGenerator>) -> Self {
        Self {
            max_height,
            generator,
            chunks: HashMap::new(),
        }
    }

    /// Place a block, loading its chunk first
    pub fn set_block(&mut self, pos: VoxelPos, id: u16) {
        if pos.y < 0 || pos.y as usize >= self.max_height {
            return;
        }
        let chunk_pos = pos.to_chunk_pos();
        if !self.is_chunk_loaded(chunk_pos) {
            self.load_chunk(chunk_pos);
        }
        if let Some(chunk) = self.chunks.get_mut(&chunk_pos) {
            let section_index = pos.y as usize / SECTION_HEIGHT;
            if section_index >= chunk.sections.len() {
                return;
            }
            let section = chunk.sections[section_index].get_or_insert_with(|| vec![AIR; SECTION_VOLUME]);
            section[voxel_index(pos)] = id;
        }
    }

    pub fn block_data(&self, pos: VoxelPos) -> u8 {
        self.chunks
            .get(&pos.to_chunk_pos())
            .and_then(|chunk| chunk.data.get(&pos).copied())
            .unwrap_or(0)
    }
}

fn voxel_index(pos: VoxelPos) -> usize {
    let lx = pos.x.rem_euclid(CHUNK_WIDTH) as usize;
    let lz = pos.z.rem_euclid(CHUNK_WIDTH) as usize;
    let ly = pos.y as usize % SECTION_HEIGHT;
    ly * SECTION_HEIGHT * SECTION_HEIGHT + lz * SECTION_HEIGHT + lx
}

impl WorldView for ChunkStore {
    fn max_height(&self) -> usize {
        self.max_height
    }

    fn is_chunk_loaded(&self, pos: ChunkPos) -> bool {
        self.chunks.contains_key(&pos)
    }

    fn load_chunk(&mut self, pos: ChunkPos) {
        if self.chunks.contains_key(&pos) {
            return;
        }
        let mut rng = rand::thread_rng();
        let sections = self.generator.generate_sections(self.max_height, &mut rng, pos);
        self.chunks.insert(
            pos,
            StoredChunk {
                sections,
                data: HashMap::new(),
            },
        );

        for populator in self.generator.populators() {
            populator.populate(self, &mut rng, pos);
        }
    }

    fn highest_block_y_at(&self, x: i32, z: i32) -> i32 {
        for y in (0..self.max_height as i32).rev() {
            if self.block_at(VoxelPos::new(x, y, z)) != AIR {
                return y;
            }
        }
        0
    }

    fn block_at(&self, pos: VoxelPos) -> u16 {
        if pos.y < 0 || pos.y as usize >= self.max_height {
            return AIR;
        }
        self.chunks
            .get(&pos.to_chunk_pos())
            .and_then(|chunk| chunk.sections.get(pos.y as usize / SECTION_HEIGHT))
            .and_then(|section| section.as_ref())
            .map(|section| section[voxel_index(pos)])
            .unwrap_or(AIR)
    }

    fn set_block_data(&mut self, pos: VoxelPos, data: u8) {
        if let Some(chunk) = self.chunks.get_mut(&pos.to_chunk_pos()) {
            chunk.data.insert(pos, data);
        }
    }
}

struct LoadedEnvironment {
    handle: EnvironmentHandle,
    store: ChunkStore,
    spawn: Location,
    actors: HashSet<ActorId>,
}

/// Host runtime that runs environments inside the current process
pub struct HeadlessHost {
    container: PathBuf,
    max_height: usize,
    environments: RwLock<HashMap<EnvironmentId, LoadedEnvironment>>,
    inboxes: Mutex<HashMap<ActorId, Vec<String>>>,
    fail_next_unload: AtomicBool,
}

impl HeadlessHost {
    pub fn new(container: impl Into<PathBuf>, max_height: usize) -> Self {
        Self {
            container: container.into(),
            max_height,
            environments: RwLock::new(HashMap::new()),
            inboxes: Mutex::new(HashMap::new()),
            fail_next_unload: AtomicBool::new(false),
        }
    }

    /// Number of environments currently loaded
    pub fn loaded_count(&self) -> usize {
        self.environments.read().len()
    }

    /// Put an actor into an environment
    pub fn join(&self, handle: &EnvironmentHandle, actor: ActorId) -> bool {
        match self.environments.write().get_mut(&handle.id) {
            Some(env) => env.actors.insert(actor),
            None => false,
        }
    }

    /// Messages delivered to an actor so far
    pub fn inbox(&self, actor: ActorId) -> Vec<String> {
        self.inboxes.lock().get(&actor).cloned().unwrap_or_default()
    }

    pub fn spawn_of(&self, id: EnvironmentId) -> Option<Location> {
        self.environments.read().get(&id).map(|env| env.spawn)
    }

    /// Run `f` against the block store of a loaded environment
    pub fn with_world<R>(&self, id: EnvironmentId, f: impl FnOnce(&mut ChunkStore) -> R) -> Option<R> {
        self.environments.write().get_mut(&id).map(|env| f(&mut env.store))
    }

    /// Make the next `unload` call report failure
    pub fn fail_next_unload(&self) {
        self.fail_next_unload.store(true, Ordering::SeqCst);
    }

    fn read_identity(&self, folder: &Path) -> Option<EnvironmentId> {
        let bytes = fs::read(folder.join(UID_MARKER)).ok()?;
        if bytes.len() != 16 {
            return None;
        }
        let mut high = [0u8; 8];
        let mut low = [0u8; 8];
        high.copy_from_slice(&bytes[0..8]);
        low.copy_from_slice(&bytes[8..16]);
        Some(EnvironmentId {
            high: u64::from_be_bytes(high),
            low: u64::from_be_bytes(low),
        })
    }

    fn read_level(folder: &Path) -> Option<LevelData> {
        let bytes = fs::read(folder.join(LEVEL_FILE)).ok()?;
        match bincode::deserialize(&bytes) {
            Ok(level) => Some(level),
            Err(err) => {
                log::warn!("Ignoring unreadable level data in {}: {}", folder.display(), err);
                None
            }
        }
    }

    fn write_level(env: &LoadedEnvironment) -> ArenaResult<()> {
        let level = LevelData {
            name: env.handle.name.clone(),
            spawn: env.spawn,
            saved_at: chrono::Utc::now().timestamp(),
        };
        let data = bincode::serialize(&level)?;
        atomic_write(env.handle.folder.join(LEVEL_FILE), &data)
    }
}

impl HostRuntime for HeadlessHost {
    fn container_dir(&self) -> &Path {
        &self.container
    }

    fn create_environment(
        &self,
        name: &str,
        generator: Arc<dyn ChunkGenerator>,
    ) -> ArenaResult<EnvironmentHandle> {
        let folder = self.container.join(name);
        fs::create_dir_all(&folder).io_context(&folder)?;

        let mut environments = self.environments.write();

        // A copied marker would collide with the environment it came from
        let id = match self.read_identity(&folder) {
            Some(id) if !environments.contains_key(&id) => id,
            _ => {
                let id = EnvironmentId::new();
                let marker = folder.join(UID_MARKER);
                fs::write(&marker, id.to_bytes()).io_context(&marker)?;
                id
            }
        };

        let mut store = ChunkStore::new(self.max_height, generator.clone());
        let spawn = match Self::read_level(&folder) {
            Some(level) => level.spawn,
            None => generator.fixed_spawn(&mut store, &mut rand::thread_rng()),
        };

        let handle = EnvironmentHandle {
            id,
            name: name.to_string(),
            folder,
        };
        environments.insert(
            id,
            LoadedEnvironment {
                handle: handle.clone(),
                store,
                spawn,
                actors: HashSet::new(),
            },
        );

        log::info!("Loaded environment {} ({}) spawn at {:?}", name, id, spawn);
        Ok(handle)
    }

    fn unload(&self, handle: &EnvironmentHandle, save: bool) -> bool {
        if self.fail_next_unload.swap(false, Ordering::SeqCst) {
            log::debug!("Refusing to unload {}", handle.name);
            return false;
        }

        let mut environments = self.environments.write();
        let env = match environments.get(&handle.id) {
            Some(env) => env,
            None => return false,
        };
        if save {
            if let Err(err) = Self::write_level(env) {
                log::warn!("Failed to save {} during unload: {}", handle.name, err);
                return false;
            }
        }
        environments.remove(&handle.id);
        log::info!("Unloaded environment {} (saved: {})", handle.name, save);
        true
    }

    fn is_registered(&self, id: EnvironmentId) -> bool {
        self.environments.read().contains_key(&id)
    }

    fn list_actors(&self, handle: &EnvironmentHandle) -> Vec<ActorId> {
        self.environments
            .read()
            .get(&handle.id)
            .map(|env| env.actors.iter().copied().collect())
            .unwrap_or_default()
    }

    fn notify(&self, actor: ActorId, message: &str) {
        log::debug!("-> actor {}: {}", actor.0, message);
        self.inboxes
            .lock()
            .entry(actor)
            .or_default()
            .push(message.to_string());
    }

    fn save(&self, handle: &EnvironmentHandle) -> ArenaResult<()> {
        let environments = self.environments.read();
        match environments.get(&handle.id) {
            Some(env) => Self::write_level(env),
            None => Err(crate::error::ArenaError::NotFound {
                what: format!("environment '{}'", handle.name),
            }),
        }
    }
}
