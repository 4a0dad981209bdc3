//! # Error Types
//!
//! Custom error types for evwrap using `thiserror`.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for evwrap
#[derive(Debug, Error)]
pub enum EvwrapError {
    /// A `SYMBOL=CODE` mapping argument could not be parsed
    #[error("could not parse mapping '{text}': {reason}")]
    InvalidMapping { text: String, reason: String },

    /// The physical device node could not be opened
    #[error("failed to open physical device {path}: {source}")]
    DeviceOpen { path: PathBuf, source: io::Error },

    /// The physical device was opened but could not be initialized
    #[error("failed to initialize physical device: {source}")]
    DeviceInit { source: io::Error },

    /// The exclusive grab on the physical device failed
    #[error("failed to grab physical device: {source}")]
    Grab { source: io::Error },

    /// Axis parameters for a mapped EV_ABS code could not be queried
    #[error("failed to query axis info for axis {axis}: {source}")]
    AxisQuery { axis: u16, source: io::Error },

    /// The fuzz/flat override could not be pushed to the kernel
    #[error("failed to override axis info for axis {axis}: {source}")]
    AxisOverride { axis: u16, source: io::Error },

    /// The uinput virtual device could not be created
    #[error("failed to create virtual device: {source}")]
    DeviceCreate { source: io::Error },

    /// Reading an event from the physical device failed mid-run
    #[error("error reading event from physical device: {source}")]
    EventRead { source: io::Error },

    /// A termination-signal stream could not be installed
    #[error("failed to install signal handler: {source}")]
    Signal { source: io::Error },

    /// Other I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl EvwrapError {
    /// Process exit code for this error.
    ///
    /// Uses the originating OS error code when one exists so the shell sees
    /// the same errno the failing syscall produced, falling back to 1.
    pub fn exit_code(&self) -> i32 {
        match self.os_error() {
            Some(code) if code != 0 => code,
            _ => 1,
        }
    }

    fn os_error(&self) -> Option<i32> {
        match self {
            EvwrapError::InvalidMapping { .. } => None,
            EvwrapError::DeviceOpen { source, .. }
            | EvwrapError::DeviceInit { source }
            | EvwrapError::Grab { source }
            | EvwrapError::AxisQuery { source, .. }
            | EvwrapError::AxisOverride { source, .. }
            | EvwrapError::DeviceCreate { source }
            | EvwrapError::EventRead { source }
            | EvwrapError::Signal { source } => source.raw_os_error(),
            EvwrapError::Io(source) => source.raw_os_error(),
        }
    }
}

/// Result type alias for evwrap
pub type Result<T> = std::result::Result<T, EvwrapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_uses_os_error() {
        let err = EvwrapError::DeviceOpen {
            path: PathBuf::from("/dev/input/event0"),
            source: io::Error::from_raw_os_error(libc::EACCES),
        };
        assert_eq!(err.exit_code(), libc::EACCES);
    }

    #[test]
    fn test_exit_code_falls_back_to_one() {
        let err = EvwrapError::InvalidMapping {
            text: "BTN_SOUTH".to_string(),
            reason: "missing '='".to_string(),
        };
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_event_read_without_errno_exits_nonzero() {
        let err = EvwrapError::EventRead {
            source: io::Error::new(io::ErrorKind::UnexpectedEof, "device vanished"),
        };
        assert_eq!(err.exit_code(), 1);
    }
}
