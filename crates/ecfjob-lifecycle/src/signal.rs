//! Signal relay: turns termination-class signals into an awaitable event.
//!
//! The installed handler records the first signal number in an atomic and
//! writes every signal number into a non-blocking socket pair. Whatever awaits
//! [`SignalRelay::recv`] or polls [`SignalRelay::pending`] does the real work
//! (sending the abort) in normal control flow, outside signal context.

use std::io;
use std::os::fd::AsRawFd;
use std::os::unix::net::UnixStream as StdUnixStream;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

use nix::errno::Errno;
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use tokio::net::UnixStream;
use tracing::{debug, info, warn};

use crate::error::LifecycleError;

/// Signals trapped by a job.
pub const TRAPPED_SIGNALS: [Signal; 12] = [
    Signal::SIGHUP,
    Signal::SIGINT,
    Signal::SIGQUIT,
    Signal::SIGILL,
    Signal::SIGTRAP,
    Signal::SIGABRT,
    Signal::SIGBUS,
    Signal::SIGFPE,
    Signal::SIGUSR1,
    Signal::SIGUSR2,
    Signal::SIGPIPE,
    Signal::SIGTERM,
];

/// Write end of the active relay, or -1.
static WAKE_FD: AtomicI32 = AtomicI32::new(-1);

/// First signal delivered since install, or 0.
///
/// Set without depending on the reactor, so a body that never yields after
/// the delivery still sees it.
static PENDING: AtomicI32 = AtomicI32::new(0);

/// Only one relay may own the process signal table at a time.
static INSTALLED: AtomicBool = AtomicBool::new(false);

extern "C" fn relay_handler(signo: libc::c_int) {
    let saved = Errno::last_raw();

    let _ = PENDING.compare_exchange(0, signo, Ordering::SeqCst, Ordering::SeqCst);

    let fd = WAKE_FD.load(Ordering::SeqCst);
    if fd >= 0 {
        let byte = signo as u8;
        // SAFETY: write(2) is async-signal-safe and `byte` outlives the call.
        // A full buffer drops the byte; one pending byte is enough to wake the relay.
        unsafe {
            libc::write(fd, (&byte as *const u8).cast(), 1);
        }
    }

    Errno::set_raw(saved);
}

/// Synchronous fault signals re-trigger on return from the handler, so they
/// fall back to the default disposition after the first delivery.
fn flags_for(signal: Signal) -> SaFlags {
    match signal {
        Signal::SIGILL | Signal::SIGBUS | Signal::SIGFPE | Signal::SIGTRAP => {
            SaFlags::SA_RESTART | SaFlags::SA_RESETHAND
        }
        _ => SaFlags::SA_RESTART,
    }
}

/// Owns the process-wide handlers for a set of signals.
///
/// Dropping the relay restores every disposition it replaced.
pub struct SignalRelay {
    reader: UnixStream,
    _writer: StdUnixStream,
    previous: Vec<(Signal, SigAction)>,
    received: u32,
}

impl SignalRelay {
    /// Install handlers for [`TRAPPED_SIGNALS`].
    ///
    /// Must be called from within a Tokio runtime.
    pub fn install() -> Result<Self, LifecycleError> {
        Self::install_for(&TRAPPED_SIGNALS)
    }

    /// Install handlers for the given signals.
    pub fn install_for(signals: &[Signal]) -> Result<Self, LifecycleError> {
        if INSTALLED
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(LifecycleError::SignalSetup(
                "another signal relay is already installed".to_string(),
            ));
        }

        let (reader, writer) = match Self::socket_pair() {
            Ok(pair) => pair,
            Err(e) => {
                INSTALLED.store(false, Ordering::SeqCst);
                return Err(LifecycleError::SignalSetup(e.to_string()));
            }
        };
        PENDING.store(0, Ordering::SeqCst);
        WAKE_FD.store(writer.as_raw_fd(), Ordering::SeqCst);

        let mut relay = Self {
            reader,
            _writer: writer,
            previous: Vec::with_capacity(signals.len()),
            received: 0,
        };

        for &signal in signals {
            let action = SigAction::new(
                SigHandler::Handler(relay_handler),
                flags_for(signal),
                SigSet::empty(),
            );
            // SAFETY: the handler only loads an atomic and calls write(2).
            let previous = unsafe { sigaction(signal, &action) }.map_err(|e| {
                LifecycleError::SignalSetup(format!("{}: {}", signal.as_str(), e))
            })?;
            relay.previous.push((signal, previous));
        }

        info!("Signal relay installed for {} signals", signals.len());
        Ok(relay)
    }

    fn socket_pair() -> io::Result<(UnixStream, StdUnixStream)> {
        let (reader, writer) = StdUnixStream::pair()?;
        reader.set_nonblocking(true)?;
        writer.set_nonblocking(true)?;
        Ok((UnixStream::from_std(reader)?, writer))
    }

    /// Whether a relay currently owns the signal table.
    pub fn is_installed() -> bool {
        INSTALLED.load(Ordering::SeqCst)
    }

    /// Signals this relay handles.
    pub fn signals(&self) -> impl Iterator<Item = Signal> + '_ {
        self.previous.iter().map(|(signal, _)| *signal)
    }

    /// Number of deliveries observed so far.
    pub fn received(&self) -> u32 {
        self.received
    }

    /// First signal delivered since install, if any.
    ///
    /// Reads the handler's atomic directly rather than the socket, so it is
    /// accurate even when the reactor has not yet seen the wake byte.
    pub fn pending(&self) -> Option<Signal> {
        match PENDING.load(Ordering::SeqCst) {
            0 => None,
            signo => Signal::try_from(signo).ok(),
        }
    }

    /// Wait for the next trapped signal. Cancel safe.
    pub async fn recv(&mut self) -> io::Result<Signal> {
        loop {
            self.reader.readable().await?;
            if let Some(signal) = self.read_one()? {
                return Ok(signal);
            }
        }
    }

    /// Return a pending signal without waiting.
    pub fn try_recv(&mut self) -> io::Result<Option<Signal>> {
        self.read_one()
    }

    /// Consume every pending delivery and return how many there were.
    pub fn drain(&mut self) -> usize {
        let mut count = 0;
        while let Ok(Some(_)) = self.read_one() {
            count += 1;
        }
        count
    }

    fn read_one(&mut self) -> io::Result<Option<Signal>> {
        let mut buf = [0u8; 1];
        loop {
            match self.reader.try_read(&mut buf) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "signal relay closed",
                    ));
                }
                Ok(_) => match Signal::try_from(buf[0] as i32) {
                    Ok(signal) => {
                        self.received += 1;
                        debug!("Relay received {}", signal.as_str());
                        return Ok(Some(signal));
                    }
                    Err(_) => continue,
                },
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(None),
                Err(e) => return Err(e),
            }
        }
    }
}

impl Drop for SignalRelay {
    fn drop(&mut self) {
        for (signal, previous) in self.previous.drain(..).rev() {
            // SAFETY: reinstates the disposition that was active before install.
            if let Err(e) = unsafe { sigaction(signal, &previous) } {
                warn!("Failed to restore handler for {}: {}", signal.as_str(), e);
            }
        }
        WAKE_FD.store(-1, Ordering::SeqCst);
        PENDING.store(0, Ordering::SeqCst);
        INSTALLED.store(false, Ordering::SeqCst);
        debug!("Signal relay removed");
    }
}

impl std::fmt::Debug for SignalRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalRelay")
            .field("signals", &self.previous.len())
            .field("received", &self.received)
            .finish()
    }
}

#[cfg(test)]
#[path = "signal_tests.rs"]
mod tests;
