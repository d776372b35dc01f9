//! `yaml_cidr` schema parser.

use super::document::SCHEMA_VERSION;
use super::{EntryError, EntryKind, ListParser, Schema, validate};

/// Parser for IPv4 address and CIDR range lists.
///
/// # Format
///
/// ```yaml
/// Schema: yaml_cidr
/// Schema_version: '2019120601'
/// items:
/// - ip: 203.0.113.7
/// - ip: 198.51.100.0/24
///   comment: bulk hosting
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct CidrParser;

impl ListParser for CidrParser {
    fn kind(&self) -> EntryKind {
        EntryKind::Cidr
    }

    fn describe(&self) -> Schema {
        Schema::new("yaml_cidr", SCHEMA_VERSION)
    }

    fn validate(&self, raw: &str) -> Result<String, EntryError> {
        validate::cidr(raw)
    }
}
