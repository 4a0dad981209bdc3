//! # Physical Device Module
//!
//! Handle for the real input device being wrapped.
//!
//! The device is opened, switched to non-blocking mode, and registered
//! with the tokio reactor so the forward loop can wait for readiness
//! instead of spinning. The exclusive grab keeps other consumers from
//! seeing the raw events; it is released implicitly when the descriptor
//! closes, on every exit path.

use evdev::{AbsoluteAxisType, Device, InputEvent};
use std::io;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use tokio::io::unix::AsyncFd;
use tracing::debug;

use crate::calibration::{AxisInfo, AxisPort};
use crate::error::{EvwrapError, Result};

/// The wrapped physical input device.
///
/// Owns the open file descriptor and the exclusive grab.
pub struct PhysicalDevice {
    device: AsyncFd<Device>,
    path: PathBuf,
}

impl std::fmt::Debug for PhysicalDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicalDevice")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl PhysicalDevice {
    /// Open the device node and register it with the async reactor.
    ///
    /// # Errors
    ///
    /// - `DeviceOpen` when the node cannot be opened (missing, EACCES, ...)
    /// - `DeviceInit` when the descriptor cannot be made non-blocking or
    ///   registered with the reactor
    pub fn open(path: &Path) -> Result<Self> {
        let device = Device::open(path).map_err(|source| EvwrapError::DeviceOpen {
            path: path.to_path_buf(),
            source,
        })?;

        set_nonblocking(&device).map_err(|source| EvwrapError::DeviceInit { source })?;
        let device = AsyncFd::new(device).map_err(|source| EvwrapError::DeviceInit { source })?;

        debug!(
            "opened physical device {} ({})",
            path.display(),
            device.get_ref().name().unwrap_or("unnamed")
        );

        Ok(Self {
            device,
            path: path.to_path_buf(),
        })
    }

    /// Take the exclusive grab on the device.
    pub fn grab(&mut self) -> Result<()> {
        self.device
            .get_mut()
            .grab()
            .map_err(|source| EvwrapError::Grab { source })
    }

    /// Path this device was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Human-readable device name from evdev, if the kernel reports one.
    pub fn name(&self) -> Option<&str> {
        self.device.get_ref().name()
    }

    /// Wait until events are ready and fetch the pending batch.
    ///
    /// Blocks (asynchronously) until the kernel signals readiness; never
    /// spins. The returned batch preserves arrival order.
    ///
    /// # Errors
    ///
    /// `EventRead` on any read failure; a failed read is fatal for the
    /// run loop.
    pub async fn next_events(&mut self) -> Result<Vec<InputEvent>> {
        loop {
            let mut guard = self
                .device
                .readable_mut()
                .await
                .map_err(|source| EvwrapError::EventRead { source })?;

            // Drain the iterator before matching; holding it across the
            // match would keep the guard mutably borrowed.
            let fetched = guard
                .get_inner_mut()
                .fetch_events()
                .map(|events| events.collect::<Vec<_>>());

            match fetched {
                Ok(events) => return Ok(events),
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                    // Readiness was stale; wait for the next edge.
                    guard.clear_ready();
                }
                Err(source) => return Err(EvwrapError::EventRead { source }),
            }
        }
    }
}

impl AxisPort for PhysicalDevice {
    fn axis_info(&self, axis: u16) -> io::Result<AxisInfo> {
        let device = self.device.get_ref();
        let supported = device
            .supported_absolute_axes()
            .map_or(false, |axes| axes.contains(AbsoluteAxisType(axis)));
        if !supported {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "axis {} is not an absolute axis of {}",
                    axis,
                    self.path.display()
                ),
            ));
        }

        let state = device.get_abs_state()?;
        let raw = state.get(axis as usize).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("axis {axis} out of range"),
            )
        })?;
        Ok(AxisInfo::from_raw(raw))
    }

    fn push_axis_info(&self, axis: u16, info: AxisInfo) -> io::Result<()> {
        let raw = info.to_raw();
        let fd = self.device.get_ref().as_raw_fd();
        // Safety: fd is a valid, owned evdev descriptor and `raw` outlives
        // the call.
        let ret = unsafe { libc::ioctl(fd, eviocsabs(axis), &raw) };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }
        debug!(
            "pushed axis info for axis {}: fuzz {} flat {}",
            axis, info.fuzz, info.flat
        );
        Ok(())
    }
}

fn set_nonblocking(device: &Device) -> io::Result<()> {
    let fd = device.as_raw_fd();

    // Preserve existing flags; just OR in O_NONBLOCK.
    let current = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if current < 0 {
        return Err(io::Error::last_os_error());
    }
    let ret = unsafe { libc::fcntl(fd, libc::F_SETFL, current | libc::O_NONBLOCK) };
    if ret < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

// EVIOCSABS ioctl request number.
// From linux/input.h:
// #define EVIOCSABS(abs) _IOW('E', 0xc0 + (abs), struct input_absinfo)
//
// Direction: 2 bits at 30-31 (_IOC_WRITE = 1), Size: 14 bits at 16-29,
// Type: 8 bits at 8-15, Nr: 8 bits at 0-7.
fn eviocsabs(axis: u16) -> libc::c_ulong {
    let dir: u32 = 1; // _IOC_WRITE
    let size = std::mem::size_of::<libc::input_absinfo>() as u32 & 0x3FFF;
    let typ = b'E' as u32;
    let nr = (0xc0 + axis as u32) & 0xFF;
    ((dir << 30) | (size << 16) | (typ << 8) | nr) as libc::c_ulong
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eviocsabs_number() {
        // Verify ioctl number calculation against the kernel header
        // expansion for EVIOCSABS(ABS_X): _IOW('E', 0xc0, input_absinfo)
        // with sizeof(input_absinfo) == 24.
        assert_eq!(std::mem::size_of::<libc::input_absinfo>(), 24);
        assert_eq!(eviocsabs(0), 0x4018_45c0, "EVIOCSABS(ABS_X) mismatch");
        assert_eq!(eviocsabs(3), 0x4018_45c3, "EVIOCSABS(ABS_RX) mismatch");
    }

    // Integration test - only runs with real hardware
    #[tokio::test]
    #[ignore]
    async fn test_open_and_grab_with_real_hardware() {
        // This test requires a readable /dev/input/event0
        let mut device =
            PhysicalDevice::open(Path::new("/dev/input/event0")).expect("open event0");
        assert!(device.name().is_some());
        device.grab().expect("grab event0");
    }
}
