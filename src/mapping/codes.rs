//! # Event-Code Namespace
//!
//! Resolves symbolic event-code names (`KEY_*`, `BTN_*`, `ABS_*`, `REL_*`)
//! to `(event_type, code)` pairs and renders codes back to their canonical
//! names for logging.
//!
//! Key and button names come from the `evdev` crate's own name table via
//! `Key::from_str`. The axis types carry no `FromStr` impl in evdev 0.12,
//! so the (much smaller) axis namespaces are tabled here.

use evdev::{AbsoluteAxisType, EventType, Key, RelativeAxisType};
use std::str::FromStr;

/// Resolve a symbolic code name to its `(event_type, code)` pair.
///
/// Returns `None` when the symbol does not belong to any known namespace
/// or names a code the namespace does not define.
///
/// # Examples
///
/// ```
/// use evwrap::mapping::codes::resolve;
///
/// assert_eq!(resolve("BTN_SOUTH"), Some((1, 304))); // EV_KEY
/// assert_eq!(resolve("ABS_X"), Some((3, 0)));       // EV_ABS
/// assert_eq!(resolve("LED_NUML"), None);
/// ```
pub fn resolve(symbol: &str) -> Option<(u16, u16)> {
    if symbol.starts_with("KEY_") || symbol.starts_with("BTN_") {
        let key = Key::from_str(symbol).ok()?;
        Some((EventType::KEY.0, key.code()))
    } else if symbol.starts_with("ABS_") {
        let axis = abs_axis_from_name(symbol)?;
        Some((EventType::ABSOLUTE.0, axis.0))
    } else if symbol.starts_with("REL_") {
        let axis = rel_axis_from_name(symbol)?;
        Some((EventType::RELATIVE.0, axis.0))
    } else {
        None
    }
}

/// Canonical `EV_*` name for an event type.
pub fn type_name(event_type: u16) -> &'static str {
    match EventType(event_type) {
        EventType::SYNCHRONIZATION => "EV_SYN",
        EventType::KEY => "EV_KEY",
        EventType::RELATIVE => "EV_REL",
        EventType::ABSOLUTE => "EV_ABS",
        EventType::MISC => "EV_MSC",
        EventType::SWITCH => "EV_SW",
        _ => "EV_?",
    }
}

/// Canonical name for a code within an event type.
///
/// Falls back to the bare number for types without a symbolic namespace.
pub fn code_name(event_type: u16, code: u16) -> String {
    match EventType(event_type) {
        EventType::KEY => format!("{:?}", Key::new(code)),
        EventType::ABSOLUTE => format!("{:?}", AbsoluteAxisType(code)),
        EventType::RELATIVE => format!("{:?}", RelativeAxisType(code)),
        _ => code.to_string(),
    }
}

// Absolute-axis namespace, from linux/input-event-codes.h. The multitouch
// slot axes are left out: a single-code remap of one MT axis cannot
// produce a coherent virtual touch device.
fn abs_axis_from_name(name: &str) -> Option<AbsoluteAxisType> {
    let axis = match name {
        "ABS_X" => AbsoluteAxisType::ABS_X,
        "ABS_Y" => AbsoluteAxisType::ABS_Y,
        "ABS_Z" => AbsoluteAxisType::ABS_Z,
        "ABS_RX" => AbsoluteAxisType::ABS_RX,
        "ABS_RY" => AbsoluteAxisType::ABS_RY,
        "ABS_RZ" => AbsoluteAxisType::ABS_RZ,
        "ABS_THROTTLE" => AbsoluteAxisType::ABS_THROTTLE,
        "ABS_RUDDER" => AbsoluteAxisType::ABS_RUDDER,
        "ABS_WHEEL" => AbsoluteAxisType::ABS_WHEEL,
        "ABS_GAS" => AbsoluteAxisType::ABS_GAS,
        "ABS_BRAKE" => AbsoluteAxisType::ABS_BRAKE,
        "ABS_HAT0X" => AbsoluteAxisType::ABS_HAT0X,
        "ABS_HAT0Y" => AbsoluteAxisType::ABS_HAT0Y,
        "ABS_HAT1X" => AbsoluteAxisType::ABS_HAT1X,
        "ABS_HAT1Y" => AbsoluteAxisType::ABS_HAT1Y,
        "ABS_HAT2X" => AbsoluteAxisType::ABS_HAT2X,
        "ABS_HAT2Y" => AbsoluteAxisType::ABS_HAT2Y,
        "ABS_HAT3X" => AbsoluteAxisType::ABS_HAT3X,
        "ABS_HAT3Y" => AbsoluteAxisType::ABS_HAT3Y,
        "ABS_PRESSURE" => AbsoluteAxisType::ABS_PRESSURE,
        "ABS_DISTANCE" => AbsoluteAxisType::ABS_DISTANCE,
        "ABS_TILT_X" => AbsoluteAxisType::ABS_TILT_X,
        "ABS_TILT_Y" => AbsoluteAxisType::ABS_TILT_Y,
        "ABS_TOOL_WIDTH" => AbsoluteAxisType::ABS_TOOL_WIDTH,
        "ABS_VOLUME" => AbsoluteAxisType::ABS_VOLUME,
        "ABS_MISC" => AbsoluteAxisType::ABS_MISC,
        _ => return None,
    };
    Some(axis)
}

// Relative-axis namespace, from linux/input-event-codes.h.
fn rel_axis_from_name(name: &str) -> Option<RelativeAxisType> {
    let axis = match name {
        "REL_X" => RelativeAxisType::REL_X,
        "REL_Y" => RelativeAxisType::REL_Y,
        "REL_Z" => RelativeAxisType::REL_Z,
        "REL_RX" => RelativeAxisType::REL_RX,
        "REL_RY" => RelativeAxisType::REL_RY,
        "REL_RZ" => RelativeAxisType::REL_RZ,
        "REL_HWHEEL" => RelativeAxisType::REL_HWHEEL,
        "REL_DIAL" => RelativeAxisType::REL_DIAL,
        "REL_WHEEL" => RelativeAxisType::REL_WHEEL,
        "REL_MISC" => RelativeAxisType::REL_MISC,
        "REL_WHEEL_HI_RES" => RelativeAxisType::REL_WHEEL_HI_RES,
        "REL_HWHEEL_HI_RES" => RelativeAxisType::REL_HWHEEL_HI_RES,
        _ => return None,
    };
    Some(axis)
}
