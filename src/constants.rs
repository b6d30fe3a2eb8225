// Arena Engine Constants - SINGLE SOURCE OF TRUTH
//
// Block ids, heights and on-disk names shared by the generator, the host
// and the instance factory. Do NOT redefine these elsewhere.

/// Block ID constants (raw u16 values)
pub mod blocks {
    pub const AIR: u16 = 0;
    pub const STONE: u16 = 1;
}

/// Terrain and chunk geometry
pub mod terrain {
    /// Chunk footprint in voxels along x and z
    pub const CHUNK_WIDTH: i32 = 16;
    /// Height of a single chunk section
    pub const SECTION_HEIGHT: usize = 16;
    /// Voxels in one 16x16x16 section
    pub const SECTION_VOLUME: usize = 16 * 16 * 16;
    /// Ground level of a void world
    pub const GROUND_LEVEL: i32 = 0;
    /// Spawn height used when the origin column is empty
    pub const VOID_SPAWN_HEIGHT: f64 = 64.0;
    /// Number of cached air entries in the void column template
    pub const VOID_LAYER_HEIGHT: usize = 65;
    /// Default build height of a hosted environment
    pub const DEFAULT_MAX_HEIGHT: usize = 256;
}

/// File and directory names
pub mod files {
    /// Per-template / per-instance configuration file
    pub const CONFIG_FILE: &str = "config.yml";
    /// Host runtime identity marker, never copied back into a template
    pub const UID_MARKER: &str = "uid.dat";
    /// Level data written by the host on save
    pub const LEVEL_FILE: &str = "level.dat";
    /// Prefix of every working copy directory
    pub const WORKING_COPY_PREFIX: &str = "world_";
    /// Appended to a working copy name until it is free
    pub const RETRY_MARKER: char = '_';
    /// Default templates directory
    pub const TEMPLATES_DIR: &str = "worlds";
}

/// Messages delivered to actors by the factory
pub mod messages {
    pub const ARENA_UNLOAD: &str = "Arena being unloaded!";
}
