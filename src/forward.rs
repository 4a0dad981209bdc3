//! # Event Forwarding Module
//!
//! The run loop: waits for events from the grabbed physical device,
//! translates them through the mapping table, and writes the results to
//! the virtual device until a termination signal arrives.
//!
//! Translation rules:
//! - EV_SYN events pass through unchanged so batch boundaries survive
//! - A matched event is re-emitted with its mapped `event_type` and
//!   `virtual_code`, keeping the original value
//! - Everything else is dropped; the grab means nobody else sees it
//!   either
//!
//! Virtual-device write failures are logged and skipped. A failed read
//! from the physical device is fatal.

use evdev::{EventType, InputEvent};
use std::io;
use tracing::{trace, warn};

use crate::device::{PhysicalDevice, VirtualOutput};
use crate::error::Result;
use crate::mapping::{codes, MappingTable};
use crate::shutdown::{ShutdownController, TermSignal};

/// Destination for translated events.
///
/// The seam between the forward loop and the real uinput device, so
/// translation and drop/forward decisions can be tested without
/// `/dev/uinput`.
pub trait EventSink {
    fn write_event(&mut self, event: InputEvent) -> io::Result<()>;
}

impl EventSink for VirtualOutput {
    fn write_event(&mut self, event: InputEvent) -> io::Result<()> {
        VirtualOutput::write_event(self, event)
    }
}

/// Translate one physical event for the virtual device.
///
/// Returns `None` when the event has no mapping and should be dropped.
pub fn translate(table: &MappingTable, event: &InputEvent) -> Option<InputEvent> {
    if event.event_type() == EventType::SYNCHRONIZATION {
        return Some(*event);
    }

    table
        .lookup(event.event_type().0, event.code())
        .map(|mapping| {
            InputEvent::new(
                EventType(mapping.event_type),
                mapping.virtual_code,
                event.value(),
            )
        })
}

/// Translate `event` and write it to `sink` if it is mapped.
fn forward_event(table: &MappingTable, sink: &mut impl EventSink, event: &InputEvent) {
    match translate(table, event) {
        Some(translated) => {
            if let Err(err) = sink.write_event(translated) {
                warn!(
                    "failed to write {} {} to virtual device: {}",
                    codes::type_name(translated.event_type().0),
                    translated.code(),
                    err
                );
            }
        }
        None => {
            trace!(
                "dropping unmapped event: {} {} value {}",
                codes::type_name(event.event_type().0),
                event.code(),
                event.value()
            );
        }
    }
}

/// Forward events until a termination signal arrives or a read fails.
///
/// Returns the signal that ended the run; propagates `EventRead` on a
/// fatal device error. The caller restores axis calibration in either
/// case.
pub async fn run(
    physical: &mut PhysicalDevice,
    sink: &mut impl EventSink,
    table: &MappingTable,
    shutdown: &mut ShutdownController,
) -> Result<TermSignal> {
    loop {
        tokio::select! {
            signal = shutdown.recv() => {
                return Ok(signal);
            }
            events = physical.next_events() => {
                for event in events? {
                    forward_event(table, sink, &event);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evdev::Key;

    struct RecordingSink {
        events: Vec<InputEvent>,
        fail: bool,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                events: Vec::new(),
                fail: false,
            }
        }
    }

    impl EventSink for RecordingSink {
        fn write_event(&mut self, event: InputEvent) -> io::Result<()> {
            if self.fail {
                return Err(io::Error::from_raw_os_error(libc::EIO));
            }
            self.events.push(event);
            Ok(())
        }
    }

    fn table(tokens: &[&str]) -> MappingTable {
        let tokens: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
        MappingTable::parse(&tokens).unwrap()
    }

    #[test]
    fn test_translate_rewrites_matched_code() {
        // Physical BTN_SOUTH (0x130) presses come out as BTN_NORTH.
        let table = table(&["BTN_NORTH=0x130"]);
        let event = InputEvent::new(EventType::KEY, Key::BTN_SOUTH.code(), 1);

        let translated = translate(&table, &event).unwrap();
        assert_eq!(translated.event_type(), EventType::KEY);
        assert_eq!(translated.code(), Key::BTN_NORTH.code());
        assert_eq!(translated.value(), 1);
    }

    #[test]
    fn test_translate_preserves_value_for_axes() {
        // Physical axis 3 re-emitted as ABS_X, value untouched.
        let table = table(&["ABS_X=3"]);
        let event = InputEvent::new(EventType::ABSOLUTE, 3, -1874);

        let translated = translate(&table, &event).unwrap();
        assert_eq!(translated.event_type(), EventType::ABSOLUTE);
        assert_eq!(translated.code(), 0); // ABS_X
        assert_eq!(translated.value(), -1874);
    }

    #[test]
    fn test_translate_passes_syn_through() {
        // No SYN mapping exists, but sync events must still reach the
        // virtual device or batches would never be delivered.
        let table = table(&["BTN_NORTH=0x130"]);
        let syn = InputEvent::new(EventType::SYNCHRONIZATION, 0, 0);

        let translated = translate(&table, &syn).unwrap();
        assert_eq!(translated.event_type(), EventType::SYNCHRONIZATION);
        assert_eq!(translated.code(), 0);
    }

    #[test]
    fn test_translate_drops_unmapped_events() {
        let table = table(&["BTN_NORTH=0x130"]);

        // Same physical code, wrong type.
        let abs = InputEvent::new(EventType::ABSOLUTE, 0x130, 10);
        assert!(translate(&table, &abs).is_none());

        // Mapped type, unmapped code.
        let other_key = InputEvent::new(EventType::KEY, Key::BTN_EAST.code(), 1);
        assert!(translate(&table, &other_key).is_none());
    }

    #[test]
    fn test_translate_matches_type_and_code_together() {
        // KEY and ABS mappings with the same physical code must not
        // shadow each other.
        let table = table(&["BTN_NORTH=3", "ABS_X=3"]);

        let key = InputEvent::new(EventType::KEY, 3, 1);
        assert_eq!(translate(&table, &key).unwrap().code(), Key::BTN_NORTH.code());

        let abs = InputEvent::new(EventType::ABSOLUTE, 3, 55);
        assert_eq!(translate(&table, &abs).unwrap().code(), 0); // ABS_X
    }

    #[test]
    fn test_forward_writes_mapped_and_skips_unmapped() {
        let table = table(&["BTN_NORTH=0x130"]);
        let mut sink = RecordingSink::new();

        forward_event(&table, &mut sink, &InputEvent::new(EventType::KEY, Key::BTN_SOUTH.code(), 1));
        forward_event(&table, &mut sink, &InputEvent::new(EventType::KEY, Key::BTN_EAST.code(), 1));
        forward_event(&table, &mut sink, &InputEvent::new(EventType::SYNCHRONIZATION, 0, 0));

        let codes: Vec<u16> = sink.events.iter().map(|e| e.code()).collect();
        assert_eq!(codes, vec![Key::BTN_NORTH.code(), 0]);
    }

    #[test]
    fn test_forward_survives_sink_errors() {
        let table = table(&["BTN_NORTH=0x130"]);
        let mut sink = RecordingSink::new();
        sink.fail = true;

        // Must not panic; the error is logged and the event dropped.
        forward_event(&table, &mut sink, &InputEvent::new(EventType::KEY, Key::BTN_SOUTH.code(), 1));
        assert!(sink.events.is_empty());
    }

    // End-to-end test - only runs with a grabbable ABS_X device at event0
    #[tokio::test]
    #[ignore]
    async fn test_signal_ends_run_and_calibration_restores() {
        use crate::calibration::{AxisPort, CalibrationLedger};
        use std::path::Path;

        let mut physical =
            PhysicalDevice::open(Path::new("/dev/input/event0")).expect("open event0");
        physical.grab().expect("grab event0");

        let original = physical.axis_info(0).expect("ABS_X info");
        let mut ledger = CalibrationLedger::with_capacity(1);
        ledger.record(0, original);
        physical
            .push_axis_info(0, original.unfiltered())
            .expect("override ABS_X");

        let table = table(&["ABS_X=0"]);
        let mut shutdown = ShutdownController::install().expect("install signal streams");
        let mut sink = RecordingSink::new();

        // Latched before the loop polls; run must return it, not hang.
        unsafe {
            libc::raise(libc::SIGTERM);
        }
        let signal = run(&mut physical, &mut sink, &table, &mut shutdown)
            .await
            .expect("run loop");
        assert_eq!(signal, TermSignal::Terminate);

        ledger.restore_all(&physical);
        assert_eq!(physical.axis_info(0).expect("ABS_X info"), original);
    }
}
