//! # ecfjob Config
//!
//! Configuration and job identity for the ecfjob lifecycle wrapper.
//!
//! - [`JobIdentity`]: the `ECF_*` variables a job must carry to talk to the
//!   scheduler, validated eagerly.
//! - [`Config`]: the optional TOML configuration (client program, timeouts,
//!   logging and scratch directories).

mod error;
mod identity;
mod loader;
mod schema;
mod validator;

pub use error::ConfigError;
pub use identity::{
    JobIdentity, ECF_NAME, ECF_NODE, ECF_PASS, ECF_PORT, ECF_RID, ECF_TRYNO, LOGGER_KEY,
    MANDATORY_VARS,
};
pub use loader::ConfigLoader;
pub use schema::*;
pub use validator::{ConfigValidator, ValidationError, ValidationResult, ValidationWarning};
