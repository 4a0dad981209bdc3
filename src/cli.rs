//! # Command-Line Interface
//!
//! Argument parsing for the evwrap binary using `clap`.
//!
//! The surface mirrors the classic wrapper-tool invocation:
//!
//! ```text
//! evwrap [-n NAME] /dev/input/eventX [SYMBOL=CODE]...
//! ```

use clap::Parser;
use std::path::PathBuf;

/// Default name given to the virtual device when `-n` is not supplied.
pub const DEFAULT_DEVICE_NAME: &str = "An Unnamed Virtual Device";

/// Wrap a Linux input device in a remapped uinput virtual device.
///
/// evwrap exclusively grabs the given input device, creates a virtual
/// device exposing only the mapped capabilities, and forwards matching
/// events to it. Each MAPPING is of the form `SYMBOL=CODE`, where SYMBOL
/// names the event code the virtual device emits and CODE is the numeric
/// event code to match on the physical device (decimal or 0x-prefixed
/// hex). Supported symbol namespaces are `KEY_*`/`BTN_*` (EV_KEY),
/// `ABS_*` (EV_ABS), and `REL_*` (EV_REL); other event types cannot be
/// mapped.
#[derive(Debug, Parser)]
#[command(name = "evwrap", version, about)]
pub struct Cli {
    /// Name to give the virtual device
    #[arg(short = 'n', long = "name", default_value = DEFAULT_DEVICE_NAME)]
    pub name: String,

    /// Path of the input device to wrap (e.g. /dev/input/event3)
    #[arg(value_name = "DEVICE")]
    pub device: PathBuf,

    /// Event mappings, SYMBOL=CODE
    #[arg(value_name = "MAPPING")]
    pub mappings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_device_only() {
        let cli = Cli::parse_from(["evwrap", "/dev/input/event3"]);
        assert_eq!(cli.device, PathBuf::from("/dev/input/event3"));
        assert_eq!(cli.name, DEFAULT_DEVICE_NAME);
        assert!(cli.mappings.is_empty());
    }

    #[test]
    fn test_parse_name_and_mappings() {
        let cli = Cli::parse_from([
            "evwrap",
            "-n",
            "Wrapped Pad",
            "/dev/input/event3",
            "BTN_SOUTH=304",
            "ABS_RX=0x03",
        ]);
        assert_eq!(cli.name, "Wrapped Pad");
        assert_eq!(cli.mappings, vec!["BTN_SOUTH=304", "ABS_RX=0x03"]);
    }

    #[test]
    fn test_device_is_required() {
        assert!(Cli::try_parse_from(["evwrap"]).is_err());
    }
}
