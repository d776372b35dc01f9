//! `yaml_asn` schema parser.

use super::document::SCHEMA_VERSION;
use super::{EntryError, EntryKind, ListParser, Schema, validate};

/// Parser for autonomous-system number lists.
///
/// Values may be written as YAML strings or integers; both normalize to the
/// decimal string without leading zeros.
///
/// # Format
///
/// ```yaml
/// Schema: yaml_asn
/// Schema_version: '2019120601'
/// items:
/// - asn: '64496'
/// - asn: 64511
///   disable: true
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct AsnParser;

impl ListParser for AsnParser {
    fn kind(&self) -> EntryKind {
        EntryKind::Asn
    }

    fn describe(&self) -> Schema {
        Schema::new("yaml_asn", SCHEMA_VERSION)
    }

    fn validate(&self, raw: &str) -> Result<String, EntryError> {
        validate::asn(raw)
    }
}
