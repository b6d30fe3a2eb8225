//! Void terrain for arenas
//!
//! Arena templates carry all of their content on disk, so anything the host
//! has to generate beyond that is empty space. The generator emits air up to
//! the environment's build height and picks a spawn that never suffocates.

use parking_lot::Mutex;
use rand::RngCore;

use crate::constants::blocks::AIR;
use crate::constants::terrain::{
    CHUNK_WIDTH, GROUND_LEVEL, SECTION_HEIGHT, SECTION_VOLUME, VOID_LAYER_HEIGHT,
    VOID_SPAWN_HEIGHT,
};
use crate::world::host::{BlockPopulator, ChunkGenerator, ChunkSections, WorldView};
use crate::world::{ChunkPos, Location, VoxelPos};

/// Generator producing empty chunks
pub struct VoidGenerator {
    /// Column template, one block id per height
    layer: Mutex<Vec<u16>>,
    /// Per-height data values painted by the populator
    layer_data_values: Option<Vec<u8>>,
}

impl VoidGenerator {
    pub fn new() -> Self {
        Self {
            layer: Mutex::new(vec![AIR; VOID_LAYER_HEIGHT]),
            layer_data_values: None,
        }
    }

    /// Paint `data[y]` onto every block at height `y` after generation
    pub fn with_overlay(mut self, data: Vec<u8>) -> Self {
        self.layer_data_values = Some(data);
        self
    }

    pub fn has_overlay(&self) -> bool {
        self.layer_data_values.is_some()
    }
}

impl Default for VoidGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkGenerator for VoidGenerator {
    fn generate_sections(
        &self,
        max_height: usize,
        _rng: &mut dyn RngCore,
        chunk: ChunkPos,
    ) -> ChunkSections {
        let mut layer = self.layer.lock();
        if layer.len() > max_height {
            layer.truncate(max_height);
        }

        let mut result: ChunkSections = vec![None; max_height / SECTION_HEIGHT];
        for (index, base) in (0..layer.len()).step_by(SECTION_HEIGHT).enumerate() {
            if index >= result.len() {
                break;
            }
            let mut section = vec![AIR; SECTION_VOLUME];
            let filled = SECTION_HEIGHT.min(layer.len() - base);
            for y in 0..filled {
                let row = y * SECTION_HEIGHT * SECTION_HEIGHT;
                section[row..row + SECTION_HEIGHT * SECTION_HEIGHT].fill(layer[base + y]);
            }
            result[index] = Some(section);
        }

        log::trace!("Generated void chunk ({}, {})", chunk.x, chunk.z);
        result
    }

    fn fixed_spawn(&self, world: &mut dyn WorldView, _rng: &mut dyn RngCore) -> Location {
        let origin = ChunkPos::new(0, 0);
        if !world.is_chunk_loaded(origin) {
            world.load_chunk(origin);
        }

        let highest = world.highest_block_y_at(0, 0);
        if highest <= GROUND_LEVEL && world.block_at(VoxelPos::new(0, 0, 0)) == AIR {
            // Nothing to stand on, give a short fall into the arena
            return Location::new(0.0, VOID_SPAWN_HEIGHT, 0.0);
        }
        Location::new(0.0, highest as f64, 0.0)
    }

    fn populators(&self) -> Vec<Box<dyn BlockPopulator>> {
        match &self.layer_data_values {
            Some(values) => vec![Box::new(VoidPopulator::new(values.clone()))],
            None => Vec::new(),
        }
    }
}

/// Writes per-height data values across a whole chunk
pub struct VoidPopulator {
    layer_data_values: Vec<u8>,
}

impl VoidPopulator {
    pub fn new(layer_data_values: Vec<u8>) -> Self {
        Self { layer_data_values }
    }
}

impl BlockPopulator for VoidPopulator {
    fn populate(&self, world: &mut dyn WorldView, _rng: &mut dyn RngCore, chunk: ChunkPos) {
        let (x, z) = chunk.origin();
        for (y, &data_value) in self.layer_data_values.iter().enumerate() {
            if data_value == 0 {
                continue;
            }
            for xx in 0..CHUNK_WIDTH {
                for zz in 0..CHUNK_WIDTH {
                    world.set_block_data(VoxelPos::new(x + xx, y as i32, z + zz), data_value);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

    /// Column heights keyed by (x, z), everything else is air
    struct StubWorld {
        loaded: HashSet<ChunkPos>,
        columns: HashMap<(i32, i32), i32>,
        data: HashMap<VoxelPos, u8>,
    }

    impl StubWorld {
        fn new() -> Self {
            Self {
                loaded: HashSet::new(),
                columns: HashMap::new(),
                data: HashMap::new(),
            }
        }
    }

    impl WorldView for StubWorld {
        fn max_height(&self) -> usize {
            256
        }

        fn is_chunk_loaded(&self, pos: ChunkPos) -> bool {
            self.loaded.contains(&pos)
        }

        fn load_chunk(&mut self, pos: ChunkPos) {
            self.loaded.insert(pos);
        }

        fn highest_block_y_at(&self, x: i32, z: i32) -> i32 {
            self.columns.get(&(x, z)).copied().unwrap_or(0)
        }

        fn block_at(&self, pos: VoxelPos) -> u16 {
            match self.columns.get(&(pos.x, pos.z)) {
                Some(&top) if pos.y <= top => crate::constants::blocks::STONE,
                _ => AIR,
            }
        }

        fn set_block_data(&mut self, pos: VoxelPos, data: u8) {
            self.data.insert(pos, data);
        }
    }

    #[test]
    fn test_empty_origin_spawns_above_void() {
        let mut world = StubWorld::new();
        let spawn = VoidGenerator::new().fixed_spawn(&mut world, &mut rand::thread_rng());

        assert_eq!(spawn.y, 64.0);
        assert!(world.is_chunk_loaded(ChunkPos::new(0, 0)));
    }

    #[test]
    fn test_solid_origin_spawns_on_top() {
        let mut world = StubWorld::new();
        world.columns.insert((0, 0), 40);

        let spawn = VoidGenerator::new().fixed_spawn(&mut world, &mut rand::thread_rng());
        assert_eq!(spawn, Location::new(0.0, 40.0, 0.0));
    }

    #[test]
    fn test_sections_are_air_and_truncated() {
        let generator = VoidGenerator::new();
        let sections = generator.generate_sections(32, &mut rand::thread_rng(), ChunkPos::new(3, -1));

        assert_eq!(sections.len(), 2);
        for section in &sections {
            let section = section.as_ref().expect("section covered by layer");
            assert_eq!(section.len(), SECTION_VOLUME);
            assert!(section.iter().all(|&id| id == AIR));
        }
    }

    #[test]
    fn test_sections_beyond_layer_are_empty() {
        let sections = VoidGenerator::new().generate_sections(256, &mut rand::thread_rng(), ChunkPos::new(0, 0));

        assert_eq!(sections.len(), 16);
        // 65 air entries cover five sections
        assert_eq!(sections.iter().filter(|s| s.is_some()).count(), 5);
    }

    #[test]
    fn test_overlay_populator_paints_heights() {
        let generator = VoidGenerator::new().with_overlay(vec![0, 3]);
        let populators = generator.populators();
        assert_eq!(populators.len(), 1);

        let mut world = StubWorld::new();
        populators[0].populate(&mut world, &mut rand::thread_rng(), ChunkPos::new(1, 0));

        assert_eq!(world.data.len(), 16 * 16);
        assert_eq!(world.data.get(&VoxelPos::new(16, 1, 0)), Some(&3));
        assert!(world.data.get(&VoxelPos::new(16, 0, 0)).is_none());
    }

    #[test]
    fn test_no_overlay_no_populators() {
        assert!(VoidGenerator::new().populators().is_empty());
    }
}
