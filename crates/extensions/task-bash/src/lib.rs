//! Bash task extension for ecfjob.
//!
//! Runs a script through `/bin/bash` (or a configured shell) from a scratch
//! directory, inside a [`JobLifecycle`](ecfjob_lifecycle::JobLifecycle).

mod bash;
mod error;
mod scratch;

pub use bash::{BashTask, SCRIPT_FILE_NAME};
pub use error::TaskError;
pub use scratch::{ScratchDir, SCRATCH_PREFIX};
