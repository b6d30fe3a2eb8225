//! Instance factory
//!
//! Owns the template catalog and the edit-session registry. Every mutating
//! operation runs under one factory-wide lock, so working copy names and the
//! registry never race.
//!
//! Lock order is factory state first, then an edit session's own lock.
//! Release any guard on a [`SharedEditSession`] before handing it to
//! [`InstanceFactory::dispose`].

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use super::arena::Instance;
use super::builder::InstanceBuilder;
use super::catalog::{Template, TemplateCatalog};
use super::edit_session::EditableInstance;
use super::error::name_in_use;
use super::events::{DisposeListener, PreDisposeEvent};
use crate::config::{ArenaConfigFile, ArenaConfigKey, EngineConfig};
use crate::constants::files::{RETRY_MARKER, WORKING_COPY_PREFIX};
use crate::constants::messages::ARENA_UNLOAD;
use crate::error::{invalid_argument, template_not_found, ArenaError, ArenaResult};
use crate::persistence::{copy_tree, delete_tree, strip_identity_marker};
use crate::world::{ChunkGenerator, HostRuntime, VoidGenerator};

/// An edit session shared between everyone who asked for it
pub type SharedEditSession = Arc<Mutex<EditableInstance>>;

/// Something [`InstanceFactory::dispose`] can tear down
pub enum Disposable<'a> {
    Instance(&'a mut Instance),
    EditSession(&'a SharedEditSession),
}

impl<'a> From<&'a mut Instance> for Disposable<'a> {
    fn from(instance: &'a mut Instance) -> Self {
        Disposable::Instance(instance)
    }
}

impl<'a> From<&'a SharedEditSession> for Disposable<'a> {
    fn from(session: &'a SharedEditSession) -> Self {
        Disposable::EditSession(session)
    }
}

struct FactoryState {
    catalog: TemplateCatalog,
    edit_sessions: HashMap<String, SharedEditSession>,
    last_stamp: i64,
}

pub struct InstanceFactory {
    config: EngineConfig,
    host: Arc<dyn HostRuntime>,
    generator: Arc<VoidGenerator>,
    state: Mutex<FactoryState>,
    listeners: RwLock<Vec<Arc<dyn DisposeListener>>>,
}

impl InstanceFactory {
    /// Create a factory, indexing the templates under `config.templates_dir`
    pub fn new(config: EngineConfig, host: Arc<dyn HostRuntime>) -> ArenaResult<Self> {
        config.validate().map_err(invalid_argument)?;
        let catalog = TemplateCatalog::scan(&config.templates_dir)?;
        let generator = match &config.overlay {
            Some(overlay) => VoidGenerator::new().with_overlay(overlay.clone()),
            None => VoidGenerator::new(),
        };

        log::info!(
            "Instance factory ready with {} templates from {} (overlay: {})",
            catalog.len(),
            catalog.root().display(),
            generator.has_overlay()
        );

        Ok(Self {
            config,
            host,
            generator: Arc::new(generator),
            state: Mutex::new(FactoryState {
                catalog,
                edit_sessions: HashMap::new(),
                last_stamp: 0,
            }),
            listeners: RwLock::new(Vec::new()),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Snapshot of the template catalog
    pub fn templates(&self) -> Vec<Template> {
        self.state.lock().catalog.list().to_vec()
    }

    /// Re-read the template root, picking up external changes
    pub fn reload_templates(&self) -> ArenaResult<usize> {
        self.state.lock().catalog.rescan()
    }

    /// Template names with an open edit session
    pub fn active_edit_sessions(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.lock().edit_sessions.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn register_listener(&self, listener: Arc<dyn DisposeListener>) {
        log::debug!("Registered dispose listener {}", listener.listener_name());
        self.listeners.write().push(listener);
    }

    /// Provision a working copy of the named template
    pub fn get_instance(&self, name: &str) -> ArenaResult<Instance> {
        let mut state = self.state.lock();
        let template = state
            .catalog
            .find(name)
            .cloned()
            .ok_or_else(|| template_not_found(name))?;
        self.provision(&mut state, template, self.config.shuffle_spawns)
    }

    /// Like [`get_instance`](Self::get_instance), falling back to a random template
    pub fn get_instance_or_random(&self, name: &str) -> ArenaResult<Instance> {
        let mut state = self.state.lock();
        let template = match state.catalog.find(name) {
            Some(template) => template.clone(),
            None => {
                log::debug!("No template named '{}', picking one at random", name);
                Self::random_template(&state)?
            }
        };
        self.provision(&mut state, template, self.config.shuffle_spawns)
    }

    /// Provision a working copy of a uniformly random template
    pub fn get_random_instance(&self) -> ArenaResult<Instance> {
        let mut state = self.state.lock();
        let template = Self::random_template(&state)?;
        self.provision(&mut state, template, self.config.shuffle_spawns)
    }

    /// The open edit session for a template, opening one if there is none
    ///
    /// Spawns keep their file order here, so removal by index always
    /// addresses the spawn the author sees at that position.
    pub fn get_edit_session(&self, name: &str) -> ArenaResult<SharedEditSession> {
        let mut state = self.state.lock();
        let key = name.to_ascii_lowercase();
        if let Some(session) = state.edit_sessions.get(&key) {
            return Ok(Arc::clone(session));
        }

        let template = state
            .catalog
            .find(name)
            .cloned()
            .ok_or_else(|| template_not_found(name))?;
        let instance = self.provision(&mut state, template, false)?;
        let session = Arc::new(Mutex::new(EditableInstance::new(instance)));
        state.edit_sessions.insert(key, Arc::clone(&session));

        log::info!("Opened edit session for '{}'", name);
        Ok(session)
    }

    /// Tear an instance down
    ///
    /// Edit sessions are committed back to their template. A commit failure
    /// is returned once teardown has finished, and the working copy is then
    /// kept on disk even when `delete_working_copy` is set.
    pub fn dispose<'a>(
        &self,
        target: impl Into<Disposable<'a>>,
        delete_working_copy: bool,
    ) -> ArenaResult<()> {
        let mut state = self.state.lock();
        match target.into() {
            Disposable::Instance(instance) => self.teardown(instance, false, delete_working_copy),
            Disposable::EditSession(session) => {
                let mut guard = session.lock();
                if let Ok(name) = guard.name() {
                    let key = name.to_ascii_lowercase();
                    let tracked = state
                        .edit_sessions
                        .get(&key)
                        .map_or(false, |existing| Arc::ptr_eq(existing, session));
                    if tracked {
                        state.edit_sessions.remove(&key);
                    }
                }
                self.teardown(guard.instance_mut(), true, delete_working_copy)
            }
        }
    }

    /// Promote a live environment into a new template
    pub fn handle_build(&self, builder: &InstanceBuilder) -> ArenaResult<Template> {
        let mut state = self.state.lock();
        let (name, spawn, world) = builder.check_complete()?;
        validate_template_name(name)?;

        let destination = state.catalog.root().join(name);
        if state.catalog.find(name).is_some() || destination.exists() {
            return Err(name_in_use(name));
        }

        self.host.save(world)?;
        copy_tree(world.folder(), &destination)?;
        strip_identity_marker(&destination)?;

        let template = Template::new(name, destination.clone());
        state.catalog.add(template.clone());

        let config = ArenaConfigFile::in_folder(&destination)?;
        config.set(ArenaConfigKey::EditSpawn, &Some(spawn))?;
        config.save()?;

        log::info!("Built template '{}' from {}", name, world.name);
        Ok(template)
    }

    fn random_template(state: &FactoryState) -> ArenaResult<Template> {
        state
            .catalog
            .random(&mut rand::thread_rng())
            .cloned()
            .ok_or(ArenaError::EmptyCatalog)
    }

    /// Next free working copy name under the host's container
    fn working_copy_name(&self, state: &mut FactoryState) -> (String, PathBuf) {
        let now = chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0);
        let stamp = now.max(state.last_stamp + 1);
        state.last_stamp = stamp;

        let container = self.host.container_dir();
        let mut name = format!("{}{}", WORKING_COPY_PREFIX, stamp);
        let mut folder = container.join(&name);
        while folder.exists() {
            log::debug!("Working copy {} exists, retrying", name);
            name.push(RETRY_MARKER);
            folder = container.join(&name);
        }
        (name, folder)
    }

    fn provision(
        &self,
        state: &mut FactoryState,
        template: Template,
        shuffle_spawns: bool,
    ) -> ArenaResult<Instance> {
        let (name, folder) = self.working_copy_name(state);
        log::debug!("Cloning {} into {}", template.path().display(), folder.display());
        copy_tree(template.path(), &folder)?;

        let generator: Arc<dyn ChunkGenerator> = self.generator.clone();
        let environment = match self.host.create_environment(&name, generator) {
            Ok(environment) => environment,
            Err(err) => {
                discard_working_copy(&folder);
                return Err(err);
            }
        };

        match Instance::load(template, environment.clone(), shuffle_spawns) {
            Ok(instance) => {
                log::info!("Provisioned {} as {}", instance.name()?, name);
                Ok(instance)
            }
            Err(err) => {
                if !self.host.unload(&environment, false) {
                    log::warn!("Failed to unload {} after a failed load", name);
                }
                discard_working_copy(&folder);
                Err(err)
            }
        }
    }

    fn teardown(&self, instance: &mut Instance, edit: bool, delete_working_copy: bool) -> ArenaResult<()> {
        if instance.is_disposed() {
            return Err(invalid_argument("Instance has already been disposed"));
        }

        let event = PreDisposeEvent {
            instance: &*instance,
            edit_session: edit,
        };
        for listener in self.listeners.read().iter() {
            log::debug!("Pre-dispose -> {}", listener.listener_name());
            listener.on_pre_dispose(&event);
        }

        let environment = instance.environment()?.clone();
        for actor in self.host.list_actors(&environment) {
            self.host.notify(actor, ARENA_UNLOAD);
        }
        if !self.host.unload(&environment, edit) {
            log::warn!("Failed to unload environment {}", environment.name);
        }

        let commit = if edit { self.commit(instance) } else { Ok(()) };
        if let Err(err) = &commit {
            log::error!(
                "Failed to commit {} back to its template, keeping {}: {}",
                environment.name,
                environment.folder.display(),
                err
            );
        }

        if self.host.is_registered(environment.id) && !self.host.unload(&environment, false) {
            log::warn!("Environment {} is still registered after unload", environment.name);
        }

        let label = instance.name()?.to_string();
        drop(instance.take_state());

        if delete_working_copy && commit.is_ok() {
            delete_tree(&environment.folder)?;
        }

        log::info!("Disposed {} ({})", label, environment.name);
        commit
    }

    /// Replace the template with the edited working copy
    fn commit(&self, instance: &Instance) -> ArenaResult<()> {
        instance.write_config_values()?;
        instance.config()?.save()?;

        let working = instance.world_folder()?;
        let template = instance.original_location()?;
        if template.exists() {
            delete_tree(template)?;
        }
        strip_identity_marker(working)?;
        copy_tree(working, template)?;

        log::info!("Committed {} into {}", working.display(), template.display());
        Ok(())
    }
}

fn discard_working_copy(folder: &Path) {
    if folder.exists() {
        if let Err(err) = delete_tree(folder) {
            log::warn!("Failed to remove working copy {}: {}", folder.display(), err);
        }
    }
}

/// A template name must be a single plain path component
fn validate_template_name(name: &str) -> ArenaResult<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(invalid_argument(format!("'{}' is not a valid template name", name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::HeadlessHost;
    use std::fs;
    use tempfile::TempDir;

    fn factory(temp_dir: &TempDir) -> InstanceFactory {
        let config = EngineConfig::rooted_at(temp_dir.path());
        fs::create_dir_all(config.templates_dir.join("castle")).expect("Failed to create template");
        fs::create_dir_all(&config.container_dir).expect("Failed to create container");
        let host = Arc::new(HeadlessHost::new(&config.container_dir, config.max_height));
        InstanceFactory::new(config, host).expect("Failed to create factory")
    }

    #[test]
    fn test_template_names_are_single_components() {
        assert!(validate_template_name("castle").is_ok());
        assert!(validate_template_name("").is_err());
        assert!(validate_template_name("../castle").is_err());
        assert!(validate_template_name("a/b").is_err());
        assert!(validate_template_name(".").is_err());
    }

    #[test]
    fn test_working_copy_names_are_monotonic() {
        let temp_dir = TempDir::new().expect("Failed to create temporary directory for test");
        let factory = factory(&temp_dir);
        let mut state = factory.state.lock();

        let (first, _) = factory.working_copy_name(&mut state);
        let (second, _) = factory.working_copy_name(&mut state);
        assert!(first.starts_with(WORKING_COPY_PREFIX));
        assert_ne!(first, second);
    }

    #[test]
    fn test_collision_appends_retry_marker() {
        let temp_dir = TempDir::new().expect("Failed to create temporary directory for test");
        let factory = factory(&temp_dir);
        let mut state = factory.state.lock();

        let stamp = chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0) + 1_000_000_000;
        state.last_stamp = stamp - 1;
        let taken = format!("{}{}", WORKING_COPY_PREFIX, stamp);
        fs::create_dir_all(factory.host.container_dir().join(&taken)).expect("Failed to create folder");

        let (name, folder) = factory.working_copy_name(&mut state);
        assert_eq!(name, format!("{}{}", taken, RETRY_MARKER));
        assert!(!folder.exists());
    }

    #[test]
    fn test_disposing_twice_is_invalid() {
        let temp_dir = TempDir::new().expect("Failed to create temporary directory for test");
        let factory = factory(&temp_dir);

        let mut instance = factory.get_instance("castle").expect("Failed to provision");
        factory.dispose(&mut instance, true).expect("Failed to dispose");
        let err = factory.dispose(&mut instance, true).unwrap_err();
        assert!(matches!(err, ArenaError::InvalidArgument { .. }));
    }

    #[test]
    fn test_shared_container_dir_rejected() {
        let temp_dir = TempDir::new().expect("Failed to create temporary directory for test");
        let mut config = EngineConfig::rooted_at(temp_dir.path());
        config.container_dir = config.templates_dir.clone();
        fs::create_dir_all(&config.templates_dir).expect("Failed to create template root");
        let host = Arc::new(HeadlessHost::new(&config.container_dir, config.max_height));

        let err = InstanceFactory::new(config, host).err().expect("factory accepted shared dirs");
        assert!(matches!(err, ArenaError::InvalidArgument { .. }));
    }
}
