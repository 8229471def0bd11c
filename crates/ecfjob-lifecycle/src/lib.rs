//! # ecfjob Lifecycle
//!
//! Drives a batch job through its scheduler lifecycle.
//!
//! ## Features
//!
//! - Init on entry, then exactly one of complete or abort
//! - Errors and panics in the job body become an abort
//! - Termination-class signals are relayed into an abort from normal control flow
//! - Event, label and meter updates, plus a per-job logger
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ecfjob_config::{ClientConfig, JobIdentity};
//! use ecfjob_lifecycle::JobLifecycle;
//!
//! let identity = JobIdentity::from_env()?;
//! let job = JobLifecycle::from_config(identity, &ClientConfig::default());
//! job.run(|job| async move {
//!     job.event("started").await?;
//!     job.meter("progress", 50).await?;
//!     Ok(())
//! })
//! .await?;
//! ```

pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod signal;

pub use error::{LifecycleError, LifecycleState};
pub use lifecycle::JobLifecycle;
pub use logging::{JobLogger, LogLevel};
pub use signal::{SignalRelay, TRAPPED_SIGNALS};

/// Signal type used by [`LifecycleError::Interrupted`].
pub use nix::sys::signal::Signal;
