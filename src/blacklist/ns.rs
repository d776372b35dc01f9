//! `yaml_ns` schema parser.

use super::document::SCHEMA_VERSION;
use super::{EntryError, EntryKind, ListParser, Schema, validate};

/// Parser for nameserver domain lists.
///
/// Names must be fully qualified (trailing dot) and are compared exactly as
/// written, so letter case matters.
///
/// # Format
///
/// ```yaml
/// Schema: yaml_ns
/// Schema_version: '2019120601'
/// items:
/// - ns: ns1.example.com.
/// - ns: ns2.example.net.
///   comment: parked domains
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct NameserverParser;

impl ListParser for NameserverParser {
    fn kind(&self) -> EntryKind {
        EntryKind::Ns
    }

    fn describe(&self) -> Schema {
        Schema::new("yaml_ns", SCHEMA_VERSION)
    }

    fn validate(&self, raw: &str) -> Result<String, EntryError> {
        validate::nameserver(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blacklist::{Document, Entry, ParseError};

    fn read(content: &str) -> Result<Vec<Entry>, ParseError> {
        NameserverParser.read(&Document::from_yaml(content)?)
    }

    #[test]
    fn test_case_variants_are_distinct() {
        let content = "Schema: yaml_ns\nSchema_version: '2019120601'\nitems:\n- ns: example.com.\n- ns: EXAMPLE.COM.\n";
        let entries = read(content).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].value, "EXAMPLE.COM.");
    }

    #[test]
    fn test_relative_name_rejected() {
        let content = "Schema: yaml_ns\nSchema_version: '2019120601'\nitems:\n- ns: example.com\n";
        assert!(matches!(
            read(content),
            Err(ParseError::InvalidEntry {
                position: 1,
                source: EntryError::MalformedNameserver { .. }
            })
        ));
    }

    #[test]
    fn test_comment_preserved() {
        let content = "Schema: yaml_ns\nSchema_version: '2019120601'\nitems:\n- ns: example.org.\n  comment: comment\n";
        let entries = read(content).unwrap();
        assert_eq!(entries[0].comment.as_deref(), Some("comment"));
    }
}
