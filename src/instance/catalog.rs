//! Index of arena templates on disk
//!
//! A snapshot of the template root taken at construction. It is kept in step
//! with the disk only through factory operations, external changes show up
//! after [`TemplateCatalog::rescan`].

use std::fs;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{ArenaErrorContext, ArenaResult};

/// A named template directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    name: String,
    path: PathBuf,
}

impl Template {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Debug)]
pub struct TemplateCatalog {
    root: PathBuf,
    templates: Vec<Template>,
}

impl TemplateCatalog {
    /// Index every directory directly under `root`, creating `root` if needed
    pub fn scan(root: impl Into<PathBuf>) -> ArenaResult<Self> {
        let mut catalog = Self {
            root: root.into(),
            templates: Vec::new(),
        };
        catalog.rescan()?;
        Ok(catalog)
    }

    /// Replace the index with the current contents of the root
    pub fn rescan(&mut self) -> ArenaResult<usize> {
        fs::create_dir_all(&self.root).io_context(&self.root)?;

        let mut templates = Vec::new();
        for entry in fs::read_dir(&self.root).io_context(&self.root)? {
            let entry = entry.io_context(&self.root)?;
            if !entry.file_type().io_context(entry.path())?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            templates.push(Template::new(name, entry.path()));
        }
        templates.sort_by(|a, b| a.name.cmp(&b.name));

        log::debug!("Indexed {} templates under {}", templates.len(), self.root.display());
        self.templates = templates;
        Ok(self.templates.len())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn list(&self) -> &[Template] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Case-insensitive lookup by name
    pub fn find(&self, name: &str) -> Option<&Template> {
        self.templates
            .iter()
            .find(|template| template.name.eq_ignore_ascii_case(name))
    }

    pub fn add(&mut self, template: Template) {
        self.templates.push(template);
    }

    /// Uniformly random template
    pub fn random<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Template> {
        self.templates.choose(rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_scan_lists_directories_only() {
        let temp_dir = TempDir::new().expect("Failed to create temporary directory for test");
        fs::create_dir_all(temp_dir.path().join("Castle")).expect("Failed to create template");
        fs::create_dir_all(temp_dir.path().join("bridge").join("region")).expect("Failed to create template");
        fs::write(temp_dir.path().join("notes.txt"), "not a template").expect("Failed to write file");

        let catalog = TemplateCatalog::scan(temp_dir.path()).expect("Failed to scan");
        let names: Vec<&str> = catalog.list().iter().map(Template::name).collect();
        assert_eq!(names, vec!["Castle", "bridge"]);
    }

    #[test]
    fn test_find_ignores_case() {
        let temp_dir = TempDir::new().expect("Failed to create temporary directory for test");
        fs::create_dir_all(temp_dir.path().join("Castle")).expect("Failed to create template");
        let catalog = TemplateCatalog::scan(temp_dir.path()).expect("Failed to scan");

        assert_eq!(catalog.find("castle").map(Template::name), Some("Castle"));
        assert!(catalog.find("cast").is_none());
    }

    #[test]
    fn test_snapshot_until_rescan() {
        let temp_dir = TempDir::new().expect("Failed to create temporary directory for test");
        let mut catalog = TemplateCatalog::scan(temp_dir.path().join("worlds")).expect("Failed to scan");
        assert!(catalog.is_empty());

        fs::create_dir_all(temp_dir.path().join("worlds").join("late")).expect("Failed to create template");
        assert!(catalog.find("late").is_none());
        assert_eq!(catalog.rescan().expect("rescan"), 1);
        assert!(catalog.find("late").is_some());
    }

    #[test]
    fn test_random_on_empty_catalog() {
        let temp_dir = TempDir::new().expect("Failed to create temporary directory for test");
        let catalog = TemplateCatalog::scan(temp_dir.path()).expect("Failed to scan");
        assert!(catalog.random(&mut rand::thread_rng()).is_none());
    }
}
