//! Atomic file writes
//!
//! Data is written to a sibling temp file, synced, and renamed over the target
//! so readers never observe a half-written config or level file.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use crate::error::{ArenaErrorContext, ArenaResult};

/// Atomically replace `path` with `data`
pub fn atomic_write(path: impl AsRef<Path>, data: &[u8]) -> ArenaResult<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).io_context(parent)?;
        }
    }

    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = Path::new(&temp_name);

    {
        let mut file = File::create(temp_path).io_context(temp_path)?;
        file.write_all(data).io_context(temp_path)?;
        file.sync_all().io_context(temp_path)?;
    }

    if let Err(err) = fs::rename(temp_path, path) {
        let _ = fs::remove_file(temp_path);
        return Err(err).io_context(path);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write_replaces_content() {
        let temp_dir = TempDir::new().expect("Failed to create temporary directory for test");
        let path = temp_dir.path().join("nested").join("config.yml");

        atomic_write(&path, b"first").expect("Failed first write");
        atomic_write(&path, b"second").expect("Failed second write");

        assert_eq!(fs::read(&path).expect("Failed to read back"), b"second");
        assert!(!temp_dir.path().join("nested").join("config.yml.tmp").exists());
    }
}
