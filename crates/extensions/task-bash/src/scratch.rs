//! Scratch working directories for tasks.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, info, warn};

use ecfjob_config::ScratchConfig;

use crate::error::TaskError;

/// Name prefix shared by every scratch directory.
pub const SCRATCH_PREFIX: &str = "ecflow-";

/// A directory named `ecflow-<prefix><random>` owned by one task run.
///
/// Removed on drop unless preserved.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
    preserve: bool,
}

impl ScratchDir {
    /// Create a fresh directory under `base`.
    pub fn create(base: impl AsRef<Path>, prefix: &str) -> Result<Self, TaskError> {
        let base = base.as_ref();
        let dir = tempfile::Builder::new()
            .prefix(&format!("{}{}", SCRATCH_PREFIX, prefix))
            .keep(true)
            .tempdir_in(base)
            .map_err(|source| TaskError::Scratch {
                path: base.to_path_buf(),
                source,
            })?;
        let path = dir.path().to_path_buf();
        debug!("Created scratch directory {}", path.display());
        Ok(Self {
            path,
            preserve: false,
        })
    }

    /// Reuse the most recently modified directory for `prefix`, or create one.
    ///
    /// The result is preserved: it is left in place on drop.
    pub fn preserved(base: impl AsRef<Path>, prefix: &str) -> Result<Self, TaskError> {
        let base = base.as_ref();
        let mut dir = match Self::find_latest(base, prefix) {
            Some(path) => {
                info!("Reusing scratch directory {}", path.display());
                Self {
                    path,
                    preserve: true,
                }
            }
            None => Self::create(base, prefix)?,
        };
        dir.preserve = true;
        Ok(dir)
    }

    /// Create or reuse a directory as configured.
    pub fn from_config(config: &ScratchConfig) -> Result<Self, TaskError> {
        if config.preserve {
            Self::preserved(&config.base_dir, &config.prefix)
        } else {
            Self::create(&config.base_dir, &config.prefix)
        }
    }

    fn find_latest(base: &Path, prefix: &str) -> Option<PathBuf> {
        let pattern = format!(
            "{}/{}*",
            glob::Pattern::escape(&base.to_string_lossy()),
            glob::Pattern::escape(&format!("{}{}", SCRATCH_PREFIX, prefix))
        );
        let entries = match glob::glob(&pattern) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Invalid scratch pattern {}: {}", pattern, e);
                return None;
            }
        };

        entries
            .filter_map(Result::ok)
            .filter(|path| path.is_dir())
            .map(|path| {
                let mtime = std::fs::metadata(&path)
                    .and_then(|m| m.modified())
                    .unwrap_or(SystemTime::UNIX_EPOCH);
                (path, mtime)
            })
            .max_by_key(|(_, mtime)| *mtime)
            .map(|(path, _)| path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Keep the directory after drop.
    pub fn preserve(&mut self) {
        self.preserve = true;
    }

    /// Cancel preservation; the directory is removed on drop.
    pub fn clean(&mut self) {
        self.preserve = false;
    }

    pub fn is_preserved(&self) -> bool {
        self.preserve
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if self.preserve {
            debug!("Keeping scratch directory {}", self.path.display());
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            warn!(
                "Failed to remove scratch directory {}: {}",
                self.path.display(),
                e
            );
        }
    }
}

#[cfg(test)]
#[path = "scratch_tests.rs"]
mod tests;
