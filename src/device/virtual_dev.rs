//! # Virtual Device Builder Module
//!
//! Builds the uinput virtual device from the mapping table and the
//! physical device's capabilities.
//!
//! This module handles:
//! - Enabling each mapped `event_type`/`virtual_code` on the prototype
//! - Copying the physical axis parameters onto mapped EV_ABS codes so
//!   value ranges stay consistent end-to-end
//! - Recording originals in the calibration ledger, then zeroing the
//!   physical device's fuzz/flat so the kernel's EV_ABS filtering runs
//!   only once (on the virtual device)
//!
//! Device-creation failure is fatal; the caller consults the ledger so
//! any overrides already pushed are undone.

use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{
    AbsInfo, AbsoluteAxisType, AttributeSet, EventType, InputEvent, Key, RelativeAxisType,
    UinputAbsSetup,
};
use std::io;
use tracing::{debug, info};

use crate::calibration::{AxisPort, CalibrationLedger};
use crate::error::{EvwrapError, Result};
use crate::mapping::MappingTable;

/// One prepared EV_ABS capability for the prototype.
#[derive(Debug, Clone, Copy)]
struct AxisSetup {
    virtual_code: u16,
    info: crate::calibration::AxisInfo,
}

/// The created uinput device. Capabilities are fixed at creation time.
pub struct VirtualOutput {
    device: VirtualDevice,
}

impl VirtualOutput {
    /// Write one event to the virtual device node.
    pub fn write_event(&mut self, event: InputEvent) -> io::Result<()> {
        self.device.emit(&[event])
    }
}

/// Query, record, and override every mapped EV_ABS axis on the physical
/// device, returning the parameters the virtual axes should carry.
///
/// Ledger entries are recorded *before* the corresponding override is
/// pushed, so a failure partway through leaves the ledger covering
/// exactly the axes that were touched.
fn prepare_axes(
    table: &MappingTable,
    port: &dyn AxisPort,
    ledger: &mut CalibrationLedger,
) -> Result<Vec<AxisSetup>> {
    let mut setups = Vec::with_capacity(table.axis_count());

    for entry in table.entries() {
        if entry.event_type != EventType::ABSOLUTE.0 {
            continue;
        }

        let original = port
            .axis_info(entry.physical_code)
            .map_err(|source| EvwrapError::AxisQuery {
                axis: entry.physical_code,
                source,
            })?;
        ledger.record(entry.physical_code, original);

        port.push_axis_info(entry.physical_code, original.unfiltered())
            .map_err(|source| EvwrapError::AxisOverride {
                axis: entry.physical_code,
                source,
            })?;

        setups.push(AxisSetup {
            virtual_code: entry.virtual_code,
            info: original,
        });
    }

    Ok(setups)
}

/// Build the virtual device for `table`, overriding the physical axes as
/// a side effect.
///
/// # Errors
///
/// - `AxisQuery` / `AxisOverride` when a mapped axis cannot be read or
///   written on the physical device
/// - `DeviceCreate` when the uinput device cannot be created; no partial
///   virtual device is left usable
pub fn build_virtual_device(
    name: &str,
    port: &dyn AxisPort,
    table: &MappingTable,
    ledger: &mut CalibrationLedger,
) -> Result<VirtualOutput> {
    let setups = prepare_axes(table, port, ledger)?;

    let mut keys = AttributeSet::<Key>::new();
    let mut rel_axes = AttributeSet::<RelativeAxisType>::new();
    for entry in table.entries() {
        match EventType(entry.event_type) {
            EventType::KEY => keys.insert(Key::new(entry.virtual_code)),
            EventType::RELATIVE => rel_axes.insert(RelativeAxisType(entry.virtual_code)),
            _ => {}
        }
    }

    let mut builder = VirtualDeviceBuilder::new()
        .map_err(|source| EvwrapError::DeviceCreate { source })?
        .name(name);

    if keys.iter().next().is_some() {
        builder = builder
            .with_keys(&keys)
            .map_err(|source| EvwrapError::DeviceCreate { source })?;
    }
    if rel_axes.iter().next().is_some() {
        builder = builder
            .with_relative_axes(&rel_axes)
            .map_err(|source| EvwrapError::DeviceCreate { source })?;
    }
    for setup in &setups {
        let info = setup.info;
        let abs = UinputAbsSetup::new(
            AbsoluteAxisType(setup.virtual_code),
            AbsInfo::new(
                info.value,
                info.minimum,
                info.maximum,
                info.fuzz,
                info.flat,
                info.resolution,
            ),
        );
        builder = builder
            .with_absolute_axis(&abs)
            .map_err(|source| EvwrapError::DeviceCreate { source })?;
    }

    let mut device = builder
        .build()
        .map_err(|source| EvwrapError::DeviceCreate { source })?;

    match device.enumerate_dev_nodes_blocking() {
        Ok(nodes) => {
            for node in nodes.flatten() {
                info!("created virtual device '{}' at {}", name, node.display());
            }
        }
        Err(err) => debug!("could not enumerate virtual device nodes: {err}"),
    }

    Ok(VirtualOutput { device })
}
