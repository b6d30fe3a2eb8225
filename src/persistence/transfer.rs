//! Recursive directory copy and delete
//!
//! Templates and working copies are plain directory trees. Copying never
//! merges into an existing destination, and a failed copy removes whatever it
//! managed to write before returning the error.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::constants::files::UID_MARKER;
use crate::error::{invalid_argument, io_error, ArenaErrorContext, ArenaResult};

/// Copy `source` to `destination`, which must not exist yet
pub fn copy_tree(source: &Path, destination: &Path) -> ArenaResult<()> {
    if !source.is_dir() {
        return Err(invalid_argument(format!(
            "Source ({}) must be an existing directory",
            source.display()
        )));
    }
    if destination.exists() {
        return Err(invalid_argument(format!(
            "Destination ({}) exists",
            destination.display()
        )));
    }

    if let Err(err) = copy_dir_recursive(source, destination) {
        log::error!(
            "Copy of {} to {} failed: {}",
            source.display(),
            destination.display(),
            err
        );
        if destination.exists() {
            if let Err(cleanup) = fs::remove_dir_all(destination) {
                log::warn!(
                    "Could not remove partial copy at {}: {}",
                    destination.display(),
                    cleanup
                );
            }
        }
        return Err(err);
    }

    log::debug!("Copied {} to {}", source.display(), destination.display());
    Ok(())
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> ArenaResult<()> {
    fs::create_dir_all(dst).io_context(dst)?;

    for entry in fs::read_dir(src).io_context(src)? {
        let entry = entry.io_context(src)?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        let file_type = entry.file_type().io_context(&src_path)?;

        if file_type.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path).io_context(&src_path)?;
        }
    }

    Ok(())
}

/// Delete `folder` and everything below it
///
/// Deletion keeps going past entries that cannot be removed. If anything
/// failed, the first failure is returned once every entry has been attempted,
/// with the number of failed entries appended to its message.
pub fn delete_tree(folder: &Path) -> ArenaResult<()> {
    delete_tree_with(folder, &remove_entry)
}

fn remove_entry(path: &Path, is_dir: bool) -> io::Result<()> {
    if is_dir {
        fs::remove_dir(path)
    } else {
        fs::remove_file(path)
    }
}

fn delete_tree_with(folder: &Path, remove: &dyn Fn(&Path, bool) -> io::Result<()>) -> ArenaResult<()> {
    if !folder.is_dir() {
        return Err(invalid_argument(format!(
            "Source ({}) must be a directory",
            folder.display()
        )));
    }

    let mut failures = Vec::new();
    delete_dir_recursive(folder, remove, &mut failures);

    match failures.len() {
        0 => {
            log::debug!("Deleted {}", folder.display());
            Ok(())
        }
        count => {
            log::warn!("{} entries under {} could not be deleted", count, folder.display());
            let (path, source) = failures.swap_remove(0);
            let source = io::Error::new(
                source.kind(),
                format!("{} ({} entries could not be deleted)", source, count),
            );
            Err(io_error(path, source))
        }
    }
}

fn delete_dir_recursive(
    folder: &Path,
    remove: &dyn Fn(&Path, bool) -> io::Result<()>,
    failures: &mut Vec<(PathBuf, io::Error)>,
) {
    match fs::read_dir(folder) {
        Ok(entries) => {
            for entry in entries {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        failures.push((folder.to_path_buf(), err));
                        continue;
                    }
                };
                let path = entry.path();
                let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);

                if is_dir {
                    delete_dir_recursive(&path, remove, failures);
                } else if let Err(err) = remove(&path, false) {
                    log::warn!("Failed to delete {}: {}", path.display(), err);
                    failures.push((path, err));
                }
            }
        }
        Err(err) => {
            failures.push((folder.to_path_buf(), err));
            return;
        }
    }

    if let Err(err) = remove(folder, true) {
        log::warn!("Failed to delete {}: {}", folder.display(), err);
        failures.push((folder.to_path_buf(), err));
    }
}

/// Remove the host identity marker from an environment folder, if present
pub fn strip_identity_marker(folder: &Path) -> ArenaResult<bool> {
    let marker = folder.join(UID_MARKER);
    if !marker.exists() {
        return Ok(false);
    }
    fs::remove_file(&marker).io_context(&marker)?;
    Ok(true)
}

/// Total size of every file below `path`
pub fn tree_size(path: &Path) -> ArenaResult<u64> {
    let mut size = 0;

    for entry in fs::read_dir(path).io_context(path)? {
        let entry = entry.io_context(path)?;
        let metadata = entry.metadata().io_context(entry.path())?;

        if metadata.is_file() {
            size += metadata.len();
        } else if metadata.is_dir() {
            size += tree_size(&entry.path())?;
        }
    }

    Ok(size)
}
