use serde::{Deserialize, Deserializer, Serialize};

use super::VoxelPos;

/// Axis-aligned box of blocks that must survive a session
///
/// Corners are normalised on construction and on deserialization, so
/// `minimum <= maximum` holds on every axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CuboidRegion {
    minimum: VoxelPos,
    maximum: VoxelPos,
}

#[derive(Deserialize)]
struct RawRegion {
    minimum: VoxelPos,
    maximum: VoxelPos,
}

impl<'de> Deserialize<'de> for CuboidRegion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawRegion::deserialize(deserializer)?;
        Ok(CuboidRegion::new(raw.minimum, raw.maximum))
    }
}

impl CuboidRegion {
    pub fn new(pos1: VoxelPos, pos2: VoxelPos) -> Self {
        Self {
            minimum: pos1.min(pos2),
            maximum: pos1.max(pos2),
        }
    }

    pub fn minimum(&self) -> VoxelPos {
        self.minimum
    }

    pub fn maximum(&self) -> VoxelPos {
        self.maximum
    }

    pub fn contains(&self, pos: VoxelPos) -> bool {
        pos.x >= self.minimum.x
            && pos.x <= self.maximum.x
            && pos.y >= self.minimum.y
            && pos.y <= self.maximum.y
            && pos.z >= self.minimum.z
            && pos.z <= self.maximum.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_normalizes_corners() {
        let region = CuboidRegion::new(VoxelPos::new(10, 0, -5), VoxelPos::new(-2, 8, 5));

        assert_eq!(region.minimum(), VoxelPos::new(-2, 0, -5));
        assert_eq!(region.maximum(), VoxelPos::new(10, 8, 5));
        assert!(region.contains(VoxelPos::new(0, 4, 0)));
        assert!(!region.contains(VoxelPos::new(0, 9, 0)));
    }

    #[test]
    fn test_region_deserialize_normalizes() {
        let yaml = "minimum: {x: 5, y: 5, z: 5}\nmaximum: {x: 0, y: 0, z: 0}\n";
        let region: CuboidRegion = serde_yaml::from_str(yaml).expect("Failed to parse region");

        assert_eq!(region.minimum(), VoxelPos::new(0, 0, 0));
        assert_eq!(region.maximum(), VoxelPos::new(5, 5, 5));
    }
}
