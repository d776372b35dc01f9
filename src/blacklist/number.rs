//! `yaml_number` schema parser.

use super::document::SCHEMA_VERSION;
use super::{EntryError, EntryKind, ListParser, Schema, validate};

/// Parser for watched and blacklisted number patterns.
///
/// Each value is a regex fragment. Loading only checks that it compiles; the
/// integrity audit checks it against the number grammar.
///
/// # Format
///
/// ```yaml
/// Schema: yaml_number
/// Schema_version: '2019120601'
/// items:
/// - number: 1-?800-?555-?0199
/// - number: '18885550142'
///   comment: tech support scam
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberParser;

impl ListParser for NumberParser {
    fn kind(&self) -> EntryKind {
        EntryKind::Number
    }

    fn describe(&self) -> Schema {
        Schema::new("yaml_number", SCHEMA_VERSION)
    }

    fn validate(&self, raw: &str) -> Result<String, EntryError> {
        validate::number_pattern(raw)
    }
}
