//! # Calibration Module
//!
//! Records and restores kernel-level axis parameters on the physical
//! device.
//!
//! The kernel applies fuzz/flat filtering to EV_ABS events during its own
//! preprocessing. The virtual device performs the same EV_ABS handling, so
//! leaving the physical device's filtering active would apply it twice and
//! corrupt reported positions. The virtual-device builder therefore zeroes
//! fuzz and flat on every mapped physical axis — and this module is the
//! record of what the values were, so they can be put back on exit.
//!
//! This module handles:
//! - Capturing the original `AxisInfo` per mapped axis, before override
//! - Restoring every captured axis exactly once, on any exit path
//! - Continuing past per-axis restore failures (logged, not fatal)
//!
//! ## Usage
//!
//! ```
//! use evwrap::calibration::{AxisInfo, AxisPort, CalibrationLedger};
//! use evwrap::calibration::mocks::MockAxisPort;
//!
//! let port = MockAxisPort::new();
//! port.set_axis(3, AxisInfo { fuzz: 16, flat: 128, ..AxisInfo::default() });
//!
//! let mut ledger = CalibrationLedger::with_capacity(1);
//! let original = port.axis_info(3).unwrap();
//! ledger.record(3, original);
//! port.push_axis_info(3, original.unfiltered()).unwrap();
//!
//! ledger.restore_all(&port);
//! assert_eq!(port.axis_info(3).unwrap(), original);
//! ```

use std::io;
use tracing::{debug, info, warn};

/// Calibration parameters of one absolute axis.
///
/// Owned mirror of the kernel's `input_absinfo`, kept separate so ledger
/// state can be compared and printed without reaching for libc types.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AxisInfo {
    pub value: i32,
    pub minimum: i32,
    pub maximum: i32,
    pub fuzz: i32,
    pub flat: i32,
    pub resolution: i32,
}

impl AxisInfo {
    pub fn from_raw(raw: &libc::input_absinfo) -> Self {
        Self {
            value: raw.value,
            minimum: raw.minimum,
            maximum: raw.maximum,
            fuzz: raw.fuzz,
            flat: raw.flat,
            resolution: raw.resolution,
        }
    }

    pub fn to_raw(self) -> libc::input_absinfo {
        libc::input_absinfo {
            value: self.value,
            minimum: self.minimum,
            maximum: self.maximum,
            fuzz: self.fuzz,
            flat: self.flat,
            resolution: self.resolution,
        }
    }

    /// Same axis with kernel-side filtering disabled. Range and resolution
    /// are untouched so values stay consistent end-to-end.
    pub fn unfiltered(self) -> Self {
        Self {
            fuzz: 0,
            flat: 0,
            ..self
        }
    }
}

/// Axis-parameter access on the physical device.
///
/// The seam between the calibration logic and the real `EVIOCGABS`/
/// `EVIOCSABS` ioctls, so the record/override/restore cycle can run
/// against a mock in tests.
pub trait AxisPort {
    /// Current parameters of `axis` as the kernel reports them.
    fn axis_info(&self, axis: u16) -> io::Result<AxisInfo>;

    /// Push parameters for `axis` down into the kernel's representation.
    fn push_axis_info(&self, axis: u16, info: AxisInfo) -> io::Result<()>;
}

/// Original parameters of one overridden axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationEntry {
    pub axis_code: u16,
    pub original: AxisInfo,
}

/// Append-only record of overridden axes, drained exactly once at
/// shutdown.
///
/// Pre-sized to the known mapping count and finalized before the forward
/// loop starts; the `restored` latch makes `restore_all` idempotent, so
/// every exit path may call it unconditionally.
#[derive(Debug, Default)]
pub struct CalibrationLedger {
    entries: Vec<CalibrationEntry>,
    restored: bool,
}

impl CalibrationLedger {
    /// Create a ledger sized for `capacity` axis mappings.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            restored: false,
        }
    }

    /// Record the original parameters of `axis_code`, in encounter order.
    ///
    /// Must be called before the corresponding override is pushed to the
    /// kernel.
    pub fn record(&mut self, axis_code: u16, original: AxisInfo) {
        debug!(
            "recorded original axis info for axis {}: min {} max {} fuzz {} flat {} resolution {}",
            axis_code,
            original.minimum,
            original.maximum,
            original.fuzz,
            original.flat,
            original.resolution
        );
        self.entries.push(CalibrationEntry {
            axis_code,
            original,
        });
    }

    pub fn entries(&self) -> &[CalibrationEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Push every recorded axis's original parameters back to the kernel.
    ///
    /// A failing axis is logged and skipped so one bad axis does not
    /// prevent restoring the others. Calling this a second time is a
    /// no-op. Returns the number of axes restored on this call.
    pub fn restore_all(&mut self, port: &dyn AxisPort) -> usize {
        if self.restored {
            return 0;
        }
        self.restored = true;

        let mut restored = 0;
        for entry in &self.entries {
            match port.push_axis_info(entry.axis_code, entry.original) {
                Ok(()) => restored += 1,
                Err(err) => {
                    warn!(
                        "failed to restore axis settings for axis {}: {}",
                        entry.axis_code, err
                    );
                }
            }
        }
        if !self.entries.is_empty() {
            info!(
                "restored calibration for {} of {} axes",
                restored,
                self.entries.len()
            );
        }
        restored
    }
}

/// Mock axis port for testing, following the hand-rolled mock style used
/// for the serial port.
pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// In-memory stand-in for the kernel's per-axis state.
    #[derive(Clone, Default)]
    pub struct MockAxisPort {
        state: Arc<Mutex<HashMap<u16, AxisInfo>>>,
        failing: Arc<Mutex<Vec<u16>>>,
        pushes: Arc<Mutex<Vec<(u16, AxisInfo)>>>,
    }

    impl MockAxisPort {
        pub fn new() -> Self {
            Self::default()
        }

        /// Seed the simulated kernel state for one axis.
        pub fn set_axis(&self, axis: u16, info: AxisInfo) {
            self.state.lock().unwrap().insert(axis, info);
        }

        /// Make pushes to `axis` fail with EIO.
        pub fn fail_axis(&self, axis: u16) {
            self.failing.lock().unwrap().push(axis);
        }

        /// Every push seen, in order.
        pub fn pushes(&self) -> Vec<(u16, AxisInfo)> {
            self.pushes.lock().unwrap().clone()
        }
    }

    impl AxisPort for MockAxisPort {
        fn axis_info(&self, axis: u16) -> io::Result<AxisInfo> {
            self.state
                .lock()
                .unwrap()
                .get(&axis)
                .copied()
                .ok_or_else(|| {
                    io::Error::new(io::ErrorKind::NotFound, format!("no such axis: {axis}"))
                })
        }

        fn push_axis_info(&self, axis: u16, info: AxisInfo) -> io::Result<()> {
            self.pushes.lock().unwrap().push((axis, info));
            if self.failing.lock().unwrap().contains(&axis) {
                return Err(io::Error::from_raw_os_error(libc::EIO));
            }
            self.state.lock().unwrap().insert(axis, info);
            Ok(())
        }
    }
}
