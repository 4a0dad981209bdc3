//! # Shutdown Module
//!
//! Termination-signal handling for the forward loop.
//!
//! SIGINT, SIGTERM, and SIGHUP are converted into stream events that the
//! run loop consumes through `tokio::select!`. Nothing runs in
//! signal-handler context; cleanup (ungrab, calibration restore) happens
//! on the main task after the loop returns.
//!
//! The streams are installed before the device is touched. A signal that
//! lands during startup is latched by tokio and delivered on the first
//! poll, so the calibration ledger is never caught half-restored by an
//! early Ctrl-C.

use std::fmt;
use tokio::signal::unix::{signal, Signal, SignalKind};

use crate::error::{EvwrapError, Result};

/// Which termination signal ended the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermSignal {
    Interrupt,
    Terminate,
    Hangup,
}

impl fmt::Display for TermSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TermSignal::Interrupt => "SIGINT",
            TermSignal::Terminate => "SIGTERM",
            TermSignal::Hangup => "SIGHUP",
        };
        write!(f, "{name}")
    }
}

/// Listens for the three termination signals.
pub struct ShutdownController {
    interrupt: Signal,
    terminate: Signal,
    hangup: Signal,
}

impl ShutdownController {
    /// Install the signal streams, replacing the default dispositions.
    ///
    /// # Errors
    ///
    /// `Signal` if any stream cannot be registered with the runtime.
    pub fn install() -> Result<Self> {
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())
                .map_err(|source| EvwrapError::Signal { source })?,
            terminate: signal(SignalKind::terminate())
                .map_err(|source| EvwrapError::Signal { source })?,
            hangup: signal(SignalKind::hangup())
                .map_err(|source| EvwrapError::Signal { source })?,
        })
    }

    /// Wait for the next termination signal.
    pub async fn recv(&mut self) -> TermSignal {
        tokio::select! {
            _ = self.interrupt.recv() => TermSignal::Interrupt,
            _ = self.terminate.recv() => TermSignal::Terminate,
            _ = self.hangup.recv() => TermSignal::Hangup,
        }
    }
}
