//! Authoring mode for an arena
//!
//! An [`EditableInstance`] reads like any other [`Instance`] and adds the
//! mutations an author needs. Nothing reaches the template until the factory
//! disposes the session and commits it.

use std::fmt;
use std::ops::Deref;

use serde::Serialize;

use super::arena::Instance;
use super::error::index_out_of_range;
use crate::config::ArenaConfigKey;
use crate::error::{invalid_argument, ArenaResult};
use crate::world::{CuboidRegion, Location};

/// First problem found by [`EditableInstance::verify_config`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigDiagnostic {
    NoSpawn,
    NonPositive { field: &'static str },
    Negative { field: &'static str },
    TeamSpawnMismatch { teams: i64, spawns: usize },
}

impl fmt::Display for ConfigDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigDiagnostic::NoSpawn => write!(f, "You have not set any spawn points!"),
            ConfigDiagnostic::NonPositive { field } => {
                write!(f, "{} must be a non-zero positive integer!", field)
            }
            ConfigDiagnostic::Negative { field } => write!(f, "{} must be a positive integer!", field),
            ConfigDiagnostic::TeamSpawnMismatch { .. } => {
                write!(f, "Number of teams does not match number of spawns!")
            }
        }
    }
}

/// Keys owned by the instance collections rather than the config document
const COLLECTION_KEYS: [ArenaConfigKey; 3] = [
    ArenaConfigKey::ProtectedRegions,
    ArenaConfigKey::SpawnPoints,
    ArenaConfigKey::SpectatorSpawn,
];

#[derive(Debug)]
pub struct EditableInstance {
    inner: Instance,
}

impl Deref for EditableInstance {
    type Target = Instance;

    fn deref(&self) -> &Instance {
        &self.inner
    }
}

impl EditableInstance {
    pub(crate) fn new(inner: Instance) -> Self {
        Self { inner }
    }

    pub(crate) fn instance_mut(&mut self) -> &mut Instance {
        &mut self.inner
    }

    pub fn add_spawn(&mut self, spawn: Location) -> ArenaResult<()> {
        self.inner.state_mut()?.spawns.push(spawn);
        Ok(())
    }

    /// Remove the spawn at `index`, returning it
    pub fn remove_spawn(&mut self, index: usize) -> ArenaResult<Location> {
        let spawns = &mut self.inner.state_mut()?.spawns;
        if index >= spawns.len() {
            return Err(index_out_of_range("spawn", index, spawns.len()));
        }
        Ok(spawns.remove(index))
    }

    pub fn add_protected_region(&mut self, region: CuboidRegion) -> ArenaResult<()> {
        self.inner.state_mut()?.protected.push(region);
        Ok(())
    }

    /// Remove the protected region at `index`, returning it
    pub fn remove_protected_region(&mut self, index: usize) -> ArenaResult<CuboidRegion> {
        let protected = &mut self.inner.state_mut()?.protected;
        if index >= protected.len() {
            return Err(index_out_of_range("protected region", index, protected.len()));
        }
        Ok(protected.remove(index))
    }

    pub fn set_spectator_spawn(&mut self, spawn: Option<Location>) -> ArenaResult<()> {
        self.inner.state_mut()?.spectator = spawn;
        Ok(())
    }

    /// Set a scalar config value. Spawns, regions and the spectator spawn go
    /// through their own setters.
    pub fn set_config<T: Serialize>(&mut self, key: ArenaConfigKey, value: &T) -> ArenaResult<()> {
        if COLLECTION_KEYS.contains(&key) {
            return Err(invalid_argument(format!(
                "{} is managed by the edit session, use its setters",
                key.path()
            )));
        }
        self.inner.state_mut()?.config.set(key, value)
    }

    /// Check the arena is playable, returning the first problem found
    pub fn verify_config(&self) -> ArenaResult<Option<ConfigDiagnostic>> {
        let config = self.inner.config()?;
        let spawns = self.inner.spawns()?.len();

        if spawns == 0 {
            return Ok(Some(ConfigDiagnostic::NoSpawn));
        }
        let teams = config.get_int(ArenaConfigKey::TeamCount)?;
        if teams <= 0 {
            return Ok(Some(ConfigDiagnostic::NonPositive {
                field: "Number of teams",
            }));
        }
        if teams != spawns as i64 {
            return Ok(Some(ConfigDiagnostic::TeamSpawnMismatch { teams, spawns }));
        }
        if config.get_int(ArenaConfigKey::TeamSize)? <= 0 {
            return Ok(Some(ConfigDiagnostic::NonPositive { field: "Team size" }));
        }
        if config.get_int(ArenaConfigKey::VipSlotCount)? < 0 {
            return Ok(Some(ConfigDiagnostic::Negative {
                field: "Vip slot count",
            }));
        }

        let timers = [
            (ArenaConfigKey::TimerPrewall, "Wall countdown"),
            (ArenaConfigKey::TimerFullgame, "Endgame length"),
            (ArenaConfigKey::TimerPregame, "Pregame countdown"),
        ];
        for (key, field) in timers {
            if config.get_int(key)? < 0 {
                return Ok(Some(ConfigDiagnostic::Negative { field }));
            }
        }

        Ok(None)
    }

    /// Serialise spawns, regions and the spectator spawn into the config
    pub fn write_config_values(&self) -> ArenaResult<()> {
        self.inner.write_config_values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ArenaError;
    use crate::instance::catalog::Template;
    use crate::world::{EnvironmentHandle, EnvironmentId, VoxelPos};
    use tempfile::TempDir;

    fn session(temp_dir: &TempDir) -> EditableInstance {
        let handle = EnvironmentHandle {
            id: EnvironmentId::new(),
            name: "world_1".to_string(),
            folder: temp_dir.path().to_path_buf(),
        };
        let instance = Instance::load(Template::new("castle", temp_dir.path()), handle, false)
            .expect("Failed to load instance");
        EditableInstance::new(instance)
    }

    fn spawn(i: usize) -> Location {
        Location::new(i as f64, 65.0, 0.0)
    }

    #[test]
    fn test_spawn_editing() {
        let temp_dir = TempDir::new().expect("Failed to create temporary directory for test");
        let mut session = session(&temp_dir);

        session.add_spawn(spawn(0)).expect("add");
        session.add_spawn(spawn(1)).expect("add");
        session.add_spawn(spawn(2)).expect("add");
        assert_eq!(session.remove_spawn(1).expect("remove"), spawn(1));
        assert_eq!(session.spawns().expect("spawns"), &[spawn(0), spawn(2)]);

        let err = session.remove_spawn(5).unwrap_err();
        assert!(matches!(err, ArenaError::InvalidArgument { .. }));
    }

    #[test]
    fn test_region_editing() {
        let temp_dir = TempDir::new().expect("Failed to create temporary directory for test");
        let mut session = session(&temp_dir);
        let region = CuboidRegion::new(VoxelPos::new(5, 5, 5), VoxelPos::new(0, 0, 0));

        session.add_protected_region(region).expect("add");
        assert!(session.remove_protected_region(1).is_err());
        assert_eq!(session.remove_protected_region(0).expect("remove"), region);
        assert!(session.protected_regions().expect("regions").is_empty());
    }

    #[test]
    fn test_no_spawn_reported_before_team_count() {
        let temp_dir = TempDir::new().expect("Failed to create temporary directory for test");
        let mut session = session(&temp_dir);
        session.set_config(ArenaConfigKey::TeamCount, &0).expect("set");

        let diagnostic = session.verify_config().expect("verify");
        assert_eq!(diagnostic, Some(ConfigDiagnostic::NoSpawn));
        assert_eq!(
            diagnostic.map(|d| d.to_string()),
            Some("You have not set any spawn points!".to_string())
        );
    }

    #[test]
    fn test_diagnostic_priority() {
        let temp_dir = TempDir::new().expect("Failed to create temporary directory for test");
        let mut session = session(&temp_dir);
        for i in 0..3 {
            session.add_spawn(spawn(i)).expect("add");
        }
        session.set_config(ArenaConfigKey::TeamCount, &0).expect("set");
        session.set_config(ArenaConfigKey::TeamSize, &0).expect("set");
        assert_eq!(
            session.verify_config().expect("verify"),
            Some(ConfigDiagnostic::NonPositive { field: "Number of teams" })
        );

        session.set_config(ArenaConfigKey::TeamCount, &4).expect("set");
        assert_eq!(
            session.verify_config().expect("verify"),
            Some(ConfigDiagnostic::TeamSpawnMismatch { teams: 4, spawns: 3 })
        );

        session.add_spawn(spawn(3)).expect("add");
        assert_eq!(
            session.verify_config().expect("verify"),
            Some(ConfigDiagnostic::NonPositive { field: "Team size" })
        );

        session.set_config(ArenaConfigKey::TeamSize, &1).expect("set");
        session.set_config(ArenaConfigKey::VipSlotCount, &-1).expect("set");
        session.set_config(ArenaConfigKey::TimerPregame, &-1).expect("set");
        assert_eq!(
            session.verify_config().expect("verify"),
            Some(ConfigDiagnostic::Negative { field: "Vip slot count" })
        );

        session.set_config(ArenaConfigKey::VipSlotCount, &0).expect("set");
        session.set_config(ArenaConfigKey::TimerFullgame, &-1).expect("set");
        assert_eq!(
            session.verify_config().expect("verify"),
            Some(ConfigDiagnostic::Negative { field: "Endgame length" })
        );

        session.set_config(ArenaConfigKey::TimerPrewall, &-1).expect("set");
        assert_eq!(
            session.verify_config().expect("verify"),
            Some(ConfigDiagnostic::Negative { field: "Wall countdown" })
        );
    }

    #[test]
    fn test_valid_config() {
        let temp_dir = TempDir::new().expect("Failed to create temporary directory for test");
        let mut session = session(&temp_dir);
        for i in 0..4 {
            session.add_spawn(spawn(i)).expect("add");
        }
        session.set_config(ArenaConfigKey::TeamSize, &1).expect("set");
        session.set_config(ArenaConfigKey::VipSlotCount, &0).expect("set");
        session.set_config(ArenaConfigKey::TimerPregame, &0).expect("set");

        assert_eq!(session.verify_config().expect("verify"), None);
    }

    #[test]
    fn test_collection_keys_rejected() {
        let temp_dir = TempDir::new().expect("Failed to create temporary directory for test");
        let mut session = session(&temp_dir);
        let err = session
            .set_config(ArenaConfigKey::SpawnPoints, &Vec::<Location>::new())
            .unwrap_err();
        assert!(matches!(err, ArenaError::InvalidArgument { .. }));
    }

    #[test]
    fn test_write_config_values() {
        let temp_dir = TempDir::new().expect("Failed to create temporary directory for test");
        let mut session = session(&temp_dir);
        session.add_spawn(spawn(7)).expect("add");
        session.set_spectator_spawn(Some(spawn(9))).expect("set");
        session.write_config_values().expect("write");
        session.config().expect("config").save().expect("save");

        let reopened = crate::config::ArenaConfigFile::in_folder(temp_dir.path()).expect("reopen");
        assert_eq!(
            reopened.get_locations(ArenaConfigKey::SpawnPoints).expect("spawns"),
            vec![spawn(7)]
        );
        assert_eq!(
            reopened.get_location(ArenaConfigKey::SpectatorSpawn).expect("spectator"),
            Some(spawn(9))
        );
    }
}
