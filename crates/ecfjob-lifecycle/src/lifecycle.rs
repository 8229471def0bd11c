//! Job lifecycle management.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use futures::FutureExt;
use nix::sys::signal::Signal;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use ecfjob_client::{ClientRequest, EcflowClient, SchedulerClient};
use ecfjob_config::{ClientConfig, JobIdentity};

use crate::error::{LifecycleError, LifecycleState};
use crate::logging::{JobLogger, LogLevel};
use crate::signal::SignalRelay;

/// How the job body ended when driven by [`JobLifecycle::run`].
enum Outcome<T> {
    Finished(std::thread::Result<anyhow::Result<T>>),
    Signalled(io::Result<Signal>),
}

/// Drives one job execution through init, complete and abort.
///
/// Exactly one terminal notification is sent per instance. The terminal slot
/// is claimed by a compare-and-swap from `Running` before the notification
/// goes out, and every client invocation is serialized.
pub struct JobLifecycle {
    identity: JobIdentity,
    client: Arc<dyn SchedulerClient>,
    state: AtomicU8,
    notify_lock: Mutex<()>,
    logger: JobLogger,
    trap_signals: bool,
}

impl JobLifecycle {
    /// Create a lifecycle for a validated identity.
    pub fn new(identity: JobIdentity, client: Arc<dyn SchedulerClient>) -> Self {
        let logger = JobLogger::new(identity.logger_name());
        Self {
            identity,
            client,
            state: AtomicU8::new(LifecycleState::Created as u8),
            notify_lock: Mutex::new(()),
            logger,
            trap_signals: true,
        }
    }

    /// Create a lifecycle from a parameter map.
    ///
    /// Fails before any client invocation if a mandatory key is missing.
    pub fn from_params(
        params: &HashMap<String, String>,
        client: Arc<dyn SchedulerClient>,
    ) -> Result<Self, LifecycleError> {
        let identity = JobIdentity::from_params(params)?;
        Ok(Self::new(identity, client))
    }

    /// Create a lifecycle that talks to `ecflow_client` as configured.
    pub fn from_config(identity: JobIdentity, config: &ClientConfig) -> Self {
        let client = EcflowClient::from_config(config).with_identity(&identity);
        let mut lifecycle = Self::new(identity, Arc::new(client));
        lifecycle.trap_signals = config.trap_signals;
        lifecycle
    }

    /// Log under `name` instead of the identity's logger name.
    pub fn with_logger_name(mut self, name: impl Into<String>) -> Self {
        self.logger = JobLogger::new(name);
        self
    }

    /// Leave process signal dispositions alone in [`run`](Self::run).
    pub fn without_signal_relay(mut self) -> Self {
        self.trap_signals = false;
        self
    }

    pub fn state(&self) -> LifecycleState {
        LifecycleState::from(self.state.load(Ordering::SeqCst))
    }

    pub fn identity(&self) -> &JobIdentity {
        &self.identity
    }

    pub fn run_id(&self) -> u32 {
        self.identity.run_id()
    }

    pub fn logger(&self) -> &JobLogger {
        &self.logger
    }

    pub fn traps_signals(&self) -> bool {
        self.trap_signals
    }

    /// Send init and move to `Running`.
    ///
    /// On a rejected or failed init the state stays `Created`. No signal
    /// relay is installed here; only [`run`](Self::run) traps signals.
    pub async fn enter(&self) -> Result<&Self, LifecycleError> {
        let _guard = self.notify_lock.lock().await;

        let current = self.state();
        if current != LifecycleState::Created {
            return Err(LifecycleError::InvalidStateTransition {
                from: current,
                to: LifecycleState::Running,
            });
        }

        self.dispatch(&ClientRequest::Init {
            run_id: self.run_id(),
        })
        .await?;

        self.state
            .store(LifecycleState::Running as u8, Ordering::SeqCst);
        info!(
            job = self.logger.name(),
            "Job started (run id {})",
            self.run_id()
        );
        Ok(self)
    }

    /// Leave the scope with the body's outcome.
    ///
    /// `Ok` sends complete, `Err` sends abort. Nothing is sent when a
    /// terminal notification already went out. Signals delivered between
    /// [`enter`](Self::enter) and `exit` are not relayed.
    pub async fn exit<T>(&self, outcome: anyhow::Result<T>) -> Result<T, LifecycleError> {
        match outcome {
            Ok(value) => {
                if self.claim(LifecycleState::Completed)? {
                    self.notify(&ClientRequest::Complete).await?;
                    info!(job = self.logger.name(), "Job complete");
                } else {
                    debug!("Terminal notification already sent, skipping complete");
                }
                Ok(value)
            }
            Err(e) => Err(self.abort_with(LifecycleError::JobFailed(e)).await),
        }
    }

    /// Enter, run `body`, then exit.
    ///
    /// With signal trapping enabled, a trapped signal cancels the body and
    /// sends the abort. A panic in the body also aborts the job.
    pub async fn run<'a, F, Fut, T>(&'a self, body: F) -> Result<T, LifecycleError>
    where
        F: FnOnce(&'a Self) -> Fut,
        Fut: Future<Output = anyhow::Result<T>> + 'a,
    {
        let mut relay = if self.trap_signals {
            Some(SignalRelay::install()?)
        } else {
            None
        };

        self.enter().await?;

        let pending = relay.as_ref().and_then(SignalRelay::pending);
        let outcome = match pending {
            Some(signal) => {
                debug!("{} arrived during init, skipping body", signal.as_str());
                Outcome::Signalled(Ok(signal))
            }
            None => {
                let body = AssertUnwindSafe(body(self)).catch_unwind();
                tokio::pin!(body);

                match relay.as_mut() {
                    Some(relay) => {
                        tokio::select! {
                            biased;
                            signal = relay.recv() => Outcome::Signalled(signal),
                            result = &mut body => Outcome::Finished(result),
                        }
                    }
                    None => Outcome::Finished(body.await),
                }
            }
        };

        // The body can finish in the same poll a signal lands, before the
        // reactor reports the wake byte.
        let outcome = match (outcome, relay.as_ref().and_then(SignalRelay::pending)) {
            (Outcome::Finished(_), Some(signal)) => Outcome::Signalled(Ok(signal)),
            (outcome, _) => outcome,
        };

        match outcome {
            Outcome::Finished(Ok(result)) => self.exit(result).await,
            Outcome::Finished(Err(panic)) => {
                let message = panic_message(&*panic);
                error!(job = self.logger.name(), "Job panicked: {}", message);
                Err(self
                    .abort_with(LifecycleError::JobFailed(anyhow::anyhow!(
                        "job panicked: {}",
                        message
                    )))
                    .await)
            }
            Outcome::Signalled(Ok(signal)) => {
                let extra = relay.as_mut().map(|r| r.drain()).unwrap_or(0);
                warn!(
                    job = self.logger.name(),
                    "Received {}, aborting ({} further signals ignored)",
                    signal.as_str(),
                    extra
                );
                Err(self
                    .abort_with(LifecycleError::Interrupted { signal })
                    .await)
            }
            Outcome::Signalled(Err(e)) => Err(self
                .abort_with(LifecycleError::SignalSetup(e.to_string()))
                .await),
        }
    }

    /// Abort the job now.
    ///
    /// Returns `Ok(false)` without sending anything when a terminal
    /// notification already went out.
    pub async fn force_abort(&self) -> Result<bool, LifecycleError> {
        if !self.claim(LifecycleState::Aborted)? {
            return Ok(false);
        }
        warn!(job = self.logger.name(), "Job aborted by request");
        self.notify(&ClientRequest::Abort {
            run_id: self.run_id(),
        })
        .await?;
        Ok(true)
    }

    /// Set a scheduler event.
    pub async fn event(&self, name: &str) -> Result<(), LifecycleError> {
        self.notify(&ClientRequest::Event {
            name: name.to_string(),
        })
        .await
    }

    /// Update a scheduler label.
    pub async fn label(&self, name: &str, message: &str) -> Result<(), LifecycleError> {
        self.notify(&ClientRequest::Label {
            name: name.to_string(),
            message: message.to_string(),
        })
        .await
    }

    /// Update a scheduler meter.
    pub async fn meter(&self, name: &str, value: i64) -> Result<(), LifecycleError> {
        self.notify(&ClientRequest::Meter {
            name: name.to_string(),
            value,
        })
        .await
    }

    /// Write to the job's logger. No scheduler interaction.
    pub fn log(&self, message: &str, level: LogLevel) {
        self.logger.log(message, level);
    }

    /// Claim the terminal slot.
    ///
    /// `Ok(true)` means this caller owns the terminal notification,
    /// `Ok(false)` means another path already claimed it.
    fn claim(&self, to: LifecycleState) -> Result<bool, LifecycleError> {
        match self.state.compare_exchange(
            LifecycleState::Running as u8,
            to as u8,
            Ordering::SeqCst,
            Ordering::SeqCst,
        ) {
            Ok(_) => Ok(true),
            Err(current) => {
                let current = LifecycleState::from(current);
                if current.is_terminal() {
                    Ok(false)
                } else {
                    Err(LifecycleError::InvalidStateTransition { from: current, to })
                }
            }
        }
    }

    /// Send the abort for `cause` if the terminal slot is still free.
    async fn abort_with(&self, cause: LifecycleError) -> LifecycleError {
        match self.claim(LifecycleState::Aborted) {
            Ok(true) => {
                error!(job = self.logger.name(), "Aborting job: {}", cause);
                let request = ClientRequest::Abort {
                    run_id: self.run_id(),
                };
                match self.notify(&request).await {
                    Ok(()) => cause,
                    Err(notification) => {
                        error!("Abort notification failed: {}", notification);
                        LifecycleError::AbortFailed {
                            cause: Box::new(cause),
                            notification: Box::new(notification),
                        }
                    }
                }
            }
            Ok(false) => {
                debug!("Terminal notification already sent, skipping abort");
                cause
            }
            Err(transition) => LifecycleError::AbortFailed {
                cause: Box::new(cause),
                notification: Box::new(transition),
            },
        }
    }

    async fn notify(&self, request: &ClientRequest) -> Result<(), LifecycleError> {
        let _guard = self.notify_lock.lock().await;
        self.dispatch(request).await
    }

    /// Send one request; callers hold `notify_lock`.
    async fn dispatch(&self, request: &ClientRequest) -> Result<(), LifecycleError> {
        debug!(job = self.logger.name(), "Notifying scheduler: {}", request);
        let output = self.client.send(request).await?;
        if output.success() {
            Ok(())
        } else {
            Err(LifecycleError::Notification {
                action: request.action(),
                exit_code: output.exit_code,
                stderr: output.stderr_lossy().trim().to_string(),
            })
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

impl Drop for JobLifecycle {
    fn drop(&mut self) {
        if self.state() == LifecycleState::Running {
            warn!(
                job = self.logger.name(),
                "Job dropped while running; no terminal notification was sent"
            );
        }
    }
}

impl std::fmt::Debug for JobLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobLifecycle")
            .field("identity", &self.identity)
            .field("state", &self.state())
            .field("logger", &self.logger.name())
            .field("trap_signals", &self.trap_signals)
            .finish()
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
