use serde::{Deserialize, Serialize};

use crate::constants::terrain::CHUNK_WIDTH;

/// Position of a chunk column in the world (chunk coordinates)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Create ChunkPos from world block coordinates
    pub fn from_world_pos(world_x: i32, world_z: i32) -> Self {
        Self::new(
            world_x.div_euclid(CHUNK_WIDTH),
            world_z.div_euclid(CHUNK_WIDTH),
        )
    }

    /// World x/z of the chunk's lowest corner
    pub fn origin(&self) -> (i32, i32) {
        (self.x * CHUNK_WIDTH, self.z * CHUNK_WIDTH)
    }
}

/// Position of a voxel in the world (world coordinates)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VoxelPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl VoxelPos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Get the chunk column this voxel belongs to
    pub fn to_chunk_pos(&self) -> ChunkPos {
        ChunkPos::from_world_pos(self.x, self.z)
    }

    /// Component-wise minimum
    pub fn min(&self, other: VoxelPos) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    /// Component-wise maximum
    pub fn max(&self, other: VoxelPos) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }
}

/// A point an actor can be placed at, with facing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default)]
    pub yaw: f32,
    #[serde(default)]
    pub pitch: f32,
}

impl Location {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    pub fn with_facing(mut self, yaw: f32, pitch: f32) -> Self {
        self.yaw = yaw;
        self.pitch = pitch;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_pos_negative_coordinates() {
        assert_eq!(ChunkPos::from_world_pos(-1, 15), ChunkPos::new(-1, 0));
        assert_eq!(ChunkPos::from_world_pos(16, -17), ChunkPos::new(1, -2));
        assert_eq!(ChunkPos::new(-2, 3).origin(), (-32, 48));
    }

    #[test]
    fn test_location_yaml_defaults_facing() {
        let loc: Location = serde_yaml::from_str("x: 1.0\ny: 2.0\nz: 3.0\n").expect("Failed to parse location");
        assert_eq!(loc, Location::new(1.0, 2.0, 3.0));
    }
}
