//! # Mapping Table Module
//!
//! Parses `SYMBOL=CODE` arguments into the table that drives event
//! translation.
//!
//! This module handles:
//! - Resolving symbolic code names against the evdev namespace
//! - Parsing the physical event code (decimal or 0x-hex)
//! - Rejecting malformed tokens without producing partial entries
//! - Lookup of `(event_type, physical_code)` during forwarding

pub mod codes;

use crate::error::{EvwrapError, Result};
use evdev::EventType;

/// One translation rule: events of `event_type` carrying `physical_code`
/// on the physical device are re-emitted as `virtual_code` on the virtual
/// device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingEntry {
    pub event_type: u16,
    pub physical_code: u16,
    pub virtual_code: u16,
}

impl MappingEntry {
    /// Human-readable rendering used when the table is logged at startup.
    pub fn describe(&self) -> String {
        format!(
            "mapping type: {} ({}) code: {} ({}) from: {} ({}) on the physical device",
            codes::type_name(self.event_type),
            self.event_type,
            codes::code_name(self.event_type, self.virtual_code),
            self.virtual_code,
            codes::code_name(self.event_type, self.physical_code),
            self.physical_code,
        )
    }
}

/// The full mapping table. Built once at startup, immutable afterwards.
#[derive(Debug, Default)]
pub struct MappingTable {
    entries: Vec<MappingEntry>,
}

impl MappingTable {
    /// Parse every `SYMBOL=CODE` token into a table.
    ///
    /// Fails on the first malformed token; no partial table escapes this
    /// function.
    pub fn parse(tokens: &[String]) -> Result<Self> {
        let mut entries = Vec::with_capacity(tokens.len());
        for token in tokens {
            entries.push(parse_mapping(token)?);
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of EV_ABS entries; sizes the calibration ledger.
    pub fn axis_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|m| m.event_type == EventType::ABSOLUTE.0)
            .count()
    }

    /// First entry matching an incoming physical event, if any.
    pub fn lookup(&self, event_type: u16, physical_code: u16) -> Option<&MappingEntry> {
        self.entries
            .iter()
            .find(|m| m.event_type == event_type && m.physical_code == physical_code)
    }
}

/// Parse one `SYMBOL=CODE` token.
///
/// # Errors
///
/// Returns `InvalidMapping` when the token has no `=`, the symbol does not
/// resolve to a known type/code pair, or the code is not a valid 16-bit
/// integer (trailing garbage included).
///
/// # Examples
///
/// ```
/// use evwrap::mapping::parse_mapping;
///
/// let entry = parse_mapping("BTN_NORTH=304").unwrap();
/// assert_eq!(entry.event_type, 1); // EV_KEY
/// assert_eq!(entry.physical_code, 304);
///
/// assert!(parse_mapping("BTN_NORTH").is_err());
/// ```
pub fn parse_mapping(token: &str) -> Result<MappingEntry> {
    let invalid = |reason: &str| EvwrapError::InvalidMapping {
        text: token.to_string(),
        reason: reason.to_string(),
    };

    let (symbol, code_text) = token.split_once('=').ok_or_else(|| invalid("missing '='"))?;

    let (event_type, virtual_code) =
        codes::resolve(symbol).ok_or_else(|| invalid("unknown event code name"))?;

    let physical_code = parse_code(code_text)
        .ok_or_else(|| invalid("physical code is not a valid 16-bit integer"))?;

    Ok(MappingEntry {
        event_type,
        physical_code,
        virtual_code,
    })
}

// Decimal or 0x-prefixed hex; `from_str_radix` rejects empty input and
// trailing garbage, so a partially-consumed token can never succeed.
fn parse_code(text: &str) -> Option<u16> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u16::from_str_radix(hex, 16).ok()
    } else {
        text.parse::<u16>().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evdev::Key;

    #[test]
    fn test_parse_key_mapping() {
        let entry = parse_mapping("BTN_NORTH=304").unwrap();
        assert_eq!(entry.event_type, EventType::KEY.0);
        assert_eq!(entry.virtual_code, Key::BTN_NORTH.code());
        assert_eq!(entry.physical_code, 304);
    }

    #[test]
    fn test_parse_abs_mapping_with_hex_code() {
        let entry = parse_mapping("ABS_RX=0x03").unwrap();
        assert_eq!(entry.event_type, EventType::ABSOLUTE.0);
        assert_eq!(entry.physical_code, 3);
    }

    #[test]
    fn test_parse_round_trip_preserves_codes() {
        // Parsing then re-rendering the names must resolve to the same
        // type and codes.
        let entry = parse_mapping("ABS_RZ=5").unwrap();
        let type_and_code = codes::resolve(&codes::code_name(
            entry.event_type,
            entry.virtual_code,
        ));
        assert_eq!(type_and_code, Some((entry.event_type, entry.virtual_code)));
        assert_eq!(entry.physical_code, 5);
    }

    #[test]
    fn test_parse_rejects_missing_equals() {
        assert!(matches!(
            parse_mapping("BTN_NORTH"),
            Err(EvwrapError::InvalidMapping { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_unknown_symbol() {
        assert!(matches!(
            parse_mapping("BTN_IMAGINARY=3"),
            Err(EvwrapError::InvalidMapping { .. })
        ));
        assert!(matches!(
            parse_mapping("LED_NUML=3"),
            Err(EvwrapError::InvalidMapping { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_bad_integers() {
        // Trailing garbage is a failure, not a partial success.
        for token in [
            "BTN_NORTH=3x",
            "BTN_NORTH=3 ",
            "BTN_NORTH=",
            "BTN_NORTH=-1",
            "BTN_NORTH=65536",
            "BTN_NORTH=1=2",
        ] {
            assert!(
                matches!(parse_mapping(token), Err(EvwrapError::InvalidMapping { .. })),
                "token {token:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_table_parse_and_lookup() {
        let tokens = vec!["BTN_NORTH=304".to_string(), "ABS_RX=3".to_string()];
        let table = MappingTable::parse(&tokens).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.axis_count(), 1);

        let hit = table.lookup(EventType::KEY.0, 304).unwrap();
        assert_eq!(hit.virtual_code, Key::BTN_NORTH.code());
        assert!(table.lookup(EventType::KEY.0, 305).is_none());
        assert!(table.lookup(EventType::ABSOLUTE.0, 304).is_none());
    }

    #[test]
    fn test_table_parse_fails_whole_on_one_bad_token() {
        let tokens = vec!["BTN_NORTH=304".to_string(), "garbage".to_string()];
        assert!(MappingTable::parse(&tokens).is_err());
    }

    #[test]
    fn test_describe_names_both_codes() {
        let entry = parse_mapping("BTN_NORTH=304").unwrap();
        let text = entry.describe();
        assert!(text.contains("EV_KEY"), "{text}");
        assert!(text.contains("BTN_NORTH"), "{text}");
        assert!(text.contains("304"), "{text}");
    }
}
