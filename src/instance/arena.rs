//! Read-only view of a provisioned arena

use std::path::Path;

use rand::seq::SliceRandom;

use super::catalog::Template;
use super::error::disposed;
use crate::config::{ArenaConfigFile, ArenaConfigKey};
use crate::error::ArenaResult;
use crate::world::{CuboidRegion, EnvironmentHandle, Location};

/// Everything an instance holds while it is live
pub(crate) struct InstanceState {
    pub(crate) template: Template,
    pub(crate) environment: EnvironmentHandle,
    pub(crate) config: ArenaConfigFile,
    pub(crate) protected: Vec<CuboidRegion>,
    pub(crate) spawns: Vec<Location>,
    pub(crate) spectator: Option<Location>,
}

/// A working copy of a template, loaded into the host
///
/// Once disposed by the factory every accessor fails with
/// [`ArenaError::Disposed`](crate::error::ArenaError::Disposed).
pub struct Instance {
    label: String,
    state: Option<InstanceState>,
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut debug = f.debug_struct("Instance");
        debug.field("name", &self.label);
        match &self.state {
            Some(state) => debug.field("folder", &state.environment.folder),
            None => debug.field("disposed", &true),
        };
        debug.finish()
    }
}

impl Instance {
    /// Wrap a loaded environment, reading spawns and regions from its config
    pub(crate) fn load(
        template: Template,
        environment: EnvironmentHandle,
        shuffle_spawns: bool,
    ) -> ArenaResult<Self> {
        let config = ArenaConfigFile::in_folder(&environment.folder)?;
        let protected = config.get_regions(ArenaConfigKey::ProtectedRegions)?;
        let mut spawns = config.get_locations(ArenaConfigKey::SpawnPoints)?;
        let spectator = config.get_location(ArenaConfigKey::SpectatorSpawn)?;

        if shuffle_spawns {
            spawns.shuffle(&mut rand::thread_rng());
        }

        Ok(Self {
            label: template.name().to_string(),
            state: Some(InstanceState {
                template,
                environment,
                config,
                protected,
                spawns,
                spectator,
            }),
        })
    }

    fn state(&self) -> ArenaResult<&InstanceState> {
        self.state.as_ref().ok_or_else(|| disposed(&self.label))
    }

    pub(crate) fn state_mut(&mut self) -> ArenaResult<&mut InstanceState> {
        match self.state.as_mut() {
            Some(state) => Ok(state),
            None => Err(disposed(&self.label)),
        }
    }

    /// Move the live resources out, leaving the instance poisoned
    pub(crate) fn take_state(&mut self) -> Option<InstanceState> {
        self.state.take()
    }

    pub fn is_disposed(&self) -> bool {
        self.state.is_none()
    }

    /// Name of the template this instance was cloned from
    pub fn name(&self) -> ArenaResult<&str> {
        Ok(self.state()?.template.name())
    }

    /// Name of the working copy folder
    pub fn raw_name(&self) -> ArenaResult<&str> {
        Ok(&self.state()?.environment.name)
    }

    pub fn world_folder(&self) -> ArenaResult<&Path> {
        Ok(self.state()?.environment.folder())
    }

    /// Folder of the template this instance was cloned from
    pub fn original_location(&self) -> ArenaResult<&Path> {
        Ok(self.state()?.template.path())
    }

    pub fn template(&self) -> ArenaResult<&Template> {
        Ok(&self.state()?.template)
    }

    pub fn environment(&self) -> ArenaResult<&EnvironmentHandle> {
        Ok(&self.state()?.environment)
    }

    pub fn config(&self) -> ArenaResult<&ArenaConfigFile> {
        Ok(&self.state()?.config)
    }

    /// Regions that must not be destroyed during a session
    pub fn protected_regions(&self) -> ArenaResult<&[CuboidRegion]> {
        Ok(&self.state()?.protected)
    }

    /// Spawn points in assignment order
    pub fn spawns(&self) -> ArenaResult<&[Location]> {
        Ok(&self.state()?.spawns)
    }

    pub fn spectator_spawn(&self) -> ArenaResult<Option<Location>> {
        Ok(self.state()?.spectator)
    }

    /// Copy spawns, regions and the spectator spawn into the config document
    pub(crate) fn write_config_values(&self) -> ArenaResult<()> {
        let state = self.state()?;
        state.config.set(ArenaConfigKey::ProtectedRegions, &state.protected)?;
        state.config.set(ArenaConfigKey::SpawnPoints, &state.spawns)?;
        state.config.set(ArenaConfigKey::SpectatorSpawn, &state.spectator)?;
        Ok(())
    }
}
