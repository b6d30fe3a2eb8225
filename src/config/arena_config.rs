//! Per-arena configuration schema
//!
//! Every template and working copy carries a `config.yml`. Keys are read
//! lazily: the first access of a key materialises it from the document and
//! caches it, and a key missing from the document is back-filled with its
//! default and written back to disk.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_yaml::{Mapping, Value};

use crate::error::{config_error, ArenaErrorContext, ArenaResult};
use crate::persistence::atomic_write;
use crate::world::{CuboidRegion, Location};

/// Keys of an arena config
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArenaConfigKey {
    /// Number of slots reserved for VIP players
    VipSlotCount,
    /// Seconds before the game begins
    TimerPregame,
    /// Seconds before the walls collapse
    TimerPrewall,
    /// Seconds of endgame after the walls collapse
    TimerFullgame,
    /// Number of teams in the arena
    TeamCount,
    /// Players per team
    TeamSize,
    /// Whether a player can join before the walls collapse
    JoinPrewall,
    /// Whether spectators can fly
    SpectatorFlight,
    /// Commands run for VIPs when the game begins
    VipCommands,
    /// Regions that are never destroyed
    ProtectedRegions,
    /// Team spawn points
    SpawnPoints,
    /// Where spectators are placed
    SpectatorSpawn,
    /// Where an editor is placed when authoring the arena
    EditSpawn,
}

impl ArenaConfigKey {
    pub const ALL: [ArenaConfigKey; 13] = [
        ArenaConfigKey::VipSlotCount,
        ArenaConfigKey::TimerPregame,
        ArenaConfigKey::TimerPrewall,
        ArenaConfigKey::TimerFullgame,
        ArenaConfigKey::TeamCount,
        ArenaConfigKey::TeamSize,
        ArenaConfigKey::JoinPrewall,
        ArenaConfigKey::SpectatorFlight,
        ArenaConfigKey::VipCommands,
        ArenaConfigKey::ProtectedRegions,
        ArenaConfigKey::SpawnPoints,
        ArenaConfigKey::SpectatorSpawn,
        ArenaConfigKey::EditSpawn,
    ];

    /// Dotted path of the key inside `config.yml`
    pub fn path(&self) -> &'static str {
        match self {
            ArenaConfigKey::VipSlotCount => "signs.vip-slots",
            ArenaConfigKey::TimerPregame => "game.timer.pregame",
            ArenaConfigKey::TimerPrewall => "game.timer.prewall",
            ArenaConfigKey::TimerFullgame => "game.timer.fullgame",
            ArenaConfigKey::TeamCount => "teams.number",
            ArenaConfigKey::TeamSize => "teams.size",
            ArenaConfigKey::JoinPrewall => "game.join-prewall",
            ArenaConfigKey::SpectatorFlight => "game.spectator-flight",
            ArenaConfigKey::VipCommands => "game.vip-commands",
            ArenaConfigKey::ProtectedRegions => "game.protect",
            ArenaConfigKey::SpawnPoints => "game.spawns",
            ArenaConfigKey::SpectatorSpawn => "game.spectate-location",
            ArenaConfigKey::EditSpawn => "editing.spawn",
        }
    }

    pub fn default_value(&self) -> Value {
        match self {
            ArenaConfigKey::VipSlotCount => Value::from(3),
            ArenaConfigKey::TimerPregame => Value::from(60),
            ArenaConfigKey::TimerPrewall => Value::from(900),
            ArenaConfigKey::TimerFullgame => Value::from(720),
            ArenaConfigKey::TeamCount => Value::from(4),
            ArenaConfigKey::TeamSize => Value::from(6),
            ArenaConfigKey::JoinPrewall => Value::Bool(true),
            ArenaConfigKey::SpectatorFlight => Value::Bool(false),
            ArenaConfigKey::VipCommands
            | ArenaConfigKey::ProtectedRegions
            | ArenaConfigKey::SpawnPoints => Value::Sequence(Vec::new()),
            ArenaConfigKey::SpectatorSpawn | ArenaConfigKey::EditSpawn => Value::Null,
        }
    }
}

struct ConfigDocument {
    root: Value,
    cache: HashMap<ArenaConfigKey, Value>,
}

/// A `config.yml` bound to one arena folder
pub struct ArenaConfigFile {
    path: PathBuf,
    document: Mutex<ConfigDocument>,
}

impl std::fmt::Debug for ArenaConfigFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArenaConfigFile").field("path", &self.path).finish()
    }
}

impl ArenaConfigFile {
    /// Open the config at `path`. A missing file is an empty document.
    pub fn open(path: impl Into<PathBuf>) -> ArenaResult<Self> {
        let path = path.into();
        let root = if path.exists() {
            let raw = fs::read_to_string(&path).io_context(&path)?;
            match serde_yaml::from_str::<Value>(&raw) {
                Ok(Value::Null) => Value::Mapping(Mapping::new()),
                Ok(value @ Value::Mapping(_)) => value,
                Ok(_) => return Err(config_error(&path, "top level must be a mapping")),
                Err(err) => return Err(config_error(&path, err)),
            }
        } else {
            Value::Mapping(Mapping::new())
        };

        Ok(Self {
            path,
            document: Mutex::new(ConfigDocument {
                root,
                cache: HashMap::new(),
            }),
        })
    }

    /// Open `folder/config.yml`
    pub fn in_folder(folder: &Path) -> ArenaResult<Self> {
        Self::open(folder.join(crate::constants::files::CONFIG_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw value of a key, back-filling the default if it is missing
    pub fn value(&self, key: ArenaConfigKey) -> ArenaResult<Value> {
        let mut document = self.document.lock();
        if let Some(value) = document.cache.get(&key) {
            return Ok(value.clone());
        }

        let existing = lookup_path(&document.root, key.path()).cloned();
        let value = match existing {
            Some(value) => value,
            None => {
                let default = key.default_value();
                log::debug!(
                    "Back-filling {} = {:?} in {}",
                    key.path(),
                    default,
                    self.path.display()
                );
                insert_path(&mut document.root, key.path(), default.clone());
                self.write_document(&document.root)?;
                default
            }
        };

        document.cache.insert(key, value.clone());
        Ok(value)
    }

    /// Typed value of a key
    pub fn get<T: DeserializeOwned>(&self, key: ArenaConfigKey) -> ArenaResult<T> {
        let value = self.value(key)?;
        serde_yaml::from_value(value)
            .map_err(|err| config_error(&self.path, format!("{}: {}", key.path(), err)))
    }

    pub fn get_int(&self, key: ArenaConfigKey) -> ArenaResult<i64> {
        self.get(key)
    }

    pub fn get_bool(&self, key: ArenaConfigKey) -> ArenaResult<bool> {
        self.get(key)
    }

    pub fn get_string_list(&self, key: ArenaConfigKey) -> ArenaResult<Vec<String>> {
        self.get(key)
    }

    pub fn get_locations(&self, key: ArenaConfigKey) -> ArenaResult<Vec<Location>> {
        self.get(key)
    }

    pub fn get_regions(&self, key: ArenaConfigKey) -> ArenaResult<Vec<CuboidRegion>> {
        self.get(key)
    }

    pub fn get_location(&self, key: ArenaConfigKey) -> ArenaResult<Option<Location>> {
        self.get(key)
    }

    /// Set a key in memory. Call [`save`](Self::save) to persist it.
    pub fn set<T: Serialize>(&self, key: ArenaConfigKey, value: &T) -> ArenaResult<()> {
        let value = serde_yaml::to_value(value)
            .map_err(|err| config_error(&self.path, format!("{}: {}", key.path(), err)))?;
        let mut document = self.document.lock();
        insert_path(&mut document.root, key.path(), value.clone());
        document.cache.insert(key, value);
        Ok(())
    }

    /// Write the document to disk
    pub fn save(&self) -> ArenaResult<()> {
        let document = self.document.lock();
        self.write_document(&document.root)
    }

    fn write_document(&self, root: &Value) -> ArenaResult<()> {
        let raw = serde_yaml::to_string(root).map_err(|err| config_error(&self.path, err))?;
        atomic_write(&self.path, raw.as_bytes())
    }
}

fn lookup_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

fn insert_path(node: &mut Value, path: &str, value: Value) {
    let segments: Vec<&str> = path.split('.').collect();
    insert_segments(node, &segments, value);
}

fn insert_segments(node: &mut Value, segments: &[&str], value: Value) {
    let (first, rest) = match segments.split_first() {
        Some(split) => split,
        None => return,
    };
    if !node.is_mapping() {
        *node = Value::Mapping(Mapping::new());
    }
    if let Value::Mapping(map) = node {
        let key = Value::String((*first).to_string());
        if rest.is_empty() {
            map.insert(key, value);
        } else {
            let child = map.entry(key).or_insert(Value::Null);
            insert_segments(child, rest, value);
        }
    }
}
