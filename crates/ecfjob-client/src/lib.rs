//! Scheduler client plumbing for ecfjob.
//!
//! This crate provides:
//! - [`CommandInvoker`]: run a command line and capture its output and exit code
//! - [`ClientRequest`]: the notifications a job can send to the scheduler
//! - [`SchedulerClient`]: the seam the lifecycle manager talks through, with
//!   [`EcflowClient`] as the implementation backed by `ecflow_client`

mod client;
mod error;
mod invoker;
mod request;

pub use client::{EcflowClient, SchedulerClient};
pub use error::InvokeError;
pub use invoker::{CommandInvoker, CommandOutput};
pub use request::ClientRequest;
