//! Builder for promoting a live environment into a new template

use std::fmt;

use crate::error::{ArenaError, ArenaResult};
use crate::world::{EnvironmentHandle, Location};

/// Name, edit spawn and source environment of a template being built
#[derive(Debug, Clone, Default)]
pub struct InstanceBuilder {
    name: Option<String>,
    spawn: Option<Location>,
    world: Option<EnvironmentHandle>,
}

impl InstanceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_spawn(mut self, spawn: Location) -> Self {
        self.spawn = Some(spawn);
        self
    }

    pub fn with_world(mut self, world: EnvironmentHandle) -> Self {
        self.world = Some(world);
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn spawn(&self) -> Option<Location> {
        self.spawn
    }

    pub fn world(&self) -> Option<&EnvironmentHandle> {
        self.world.as_ref()
    }

    /// Fail with `Unfinished` listing every unset field
    pub fn check_complete(&self) -> ArenaResult<(&str, Location, &EnvironmentHandle)> {
        match (self.name.as_deref(), self.spawn, self.world.as_ref()) {
            (Some(name), Some(spawn), Some(world)) => Ok((name, spawn, world)),
            _ => {
                let mut missing = Vec::new();
                if self.name.is_none() {
                    missing.push("name");
                }
                if self.spawn.is_none() {
                    missing.push("spawn");
                }
                if self.world.is_none() {
                    missing.push("world");
                }
                Err(ArenaError::Unfinished {
                    missing: missing.join(", "),
                })
            }
        }
    }
}

impl fmt::Display for InstanceBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn mark(set: bool) -> &'static str {
            if set {
                "Set!"
            } else {
                "Not Set!"
            }
        }
        writeln!(f, "Arena builder")?;
        writeln!(f, "  Name: {}", self.name.as_deref().unwrap_or("Not Set!"))?;
        writeln!(f, "  Spawn: {}", mark(self.spawn.is_some()))?;
        write!(f, "  World: {}", mark(self.world.is_some()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_listed() {
        let builder = InstanceBuilder::new().with_name("castle");
        match builder.check_complete() {
            Err(ArenaError::Unfinished { missing }) => assert_eq!(missing, "spawn, world"),
            other => panic!("expected Unfinished, got {:?}", other),
        }
    }

    #[test]
    fn test_display_marks_fields() {
        let builder = InstanceBuilder::new().with_spawn(Location::new(0.0, 64.0, 0.0));
        let text = builder.to_string();
        assert!(text.contains("Name: Not Set!"));
        assert!(text.contains("Spawn: Set!"));
        assert!(text.contains("World: Not Set!"));
    }
}
