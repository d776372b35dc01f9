//! On-disk schema documents.
//!
//! ```yaml
//! Schema: yaml_cidr
//! Schema_version: '2019120601'
//! items:
//! - ip: 1.2.3.4
//! - ip: 2.3.4.5
//!   disable: true
//! - ip: 3.4.5.6
//!   comment: hosting range
//! ```

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::{Mapping, Value};

use super::{Entry, EntryError, EntryKind, ParseError};

/// Schema version written by every parser in this crate.
pub const SCHEMA_VERSION: &str = "2019120601";

const DISABLE_KEY: &str = "disable";
const COMMENT_KEY: &str = "comment";

/// Schema identifier and version pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Schema {
    pub id: String,
    pub version: String,
}

impl Schema {
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} version {}", self.id, self.version)
    }
}

/// A schema document: header plus raw records.
///
/// Records are kept as raw YAML values so that a single bad record is
/// reported with its position instead of failing the whole document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "Schema")]
    pub schema: String,

    /// Date-coded version; integers and strings are both accepted.
    #[serde(rename = "Schema_version", deserialize_with = "deserialize_version")]
    pub schema_version: String,

    #[serde(default)]
    pub items: Vec<Value>,
}

fn deserialize_version<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawVersion {
        Text(String),
        Number(u64),
    }

    Ok(match RawVersion::deserialize(deserializer)? {
        RawVersion::Text(text) => text,
        RawVersion::Number(number) => number.to_string(),
    })
}

impl Document {
    /// Parse a document from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Yaml`] if the text is not a schema document.
    pub fn from_yaml(content: &str) -> Result<Self, ParseError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Serialize the document to YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Yaml`] if serialization fails.
    pub fn to_yaml(&self) -> Result<String, ParseError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Schema declared by this document.
    #[must_use]
    pub fn declared_schema(&self) -> Schema {
        Schema::new(self.schema.clone(), self.schema_version.clone())
    }

    pub(crate) fn check_schema(&self, expected: &Schema) -> Result<(), ParseError> {
        let found = self.declared_schema();
        if found == *expected {
            Ok(())
        } else {
            Err(ParseError::SchemaMismatch {
                expected: expected.clone(),
                found,
            })
        }
    }

    /// Build a document from entries, in order.
    pub(crate) fn from_entries(schema: Schema, kind: EntryKind, entries: &[Entry]) -> Self {
        let items = entries
            .iter()
            .map(|entry| {
                let mut record = Mapping::new();
                record.insert(kind.key().into(), entry.value.clone().into());
                if entry.disabled {
                    record.insert(DISABLE_KEY.into(), Value::Bool(true));
                }
                if let Some(comment) = &entry.comment {
                    record.insert(COMMENT_KEY.into(), comment.clone().into());
                }
                for (key, value) in &entry.extra {
                    record.insert(key.clone(), value.clone());
                }
                Value::Mapping(record)
            })
            .collect();

        Self {
            schema: schema.id,
            schema_version: schema.version,
            items,
        }
    }

    /// Map every record to an entry, validating values with `validate`.
    ///
    /// Fails on the first bad record. Active values must be unique.
    pub(crate) fn entries<F>(&self, kind: EntryKind, validate: F) -> Result<Vec<Entry>, ParseError>
    where
        F: Fn(&str) -> Result<String, EntryError>,
    {
        let mut entries = Vec::with_capacity(self.items.len());
        let mut seen: HashMap<String, usize> = HashMap::new();

        for (index, item) in self.items.iter().enumerate() {
            let position = index + 1;
            let entry = record_to_entry(item, kind, position, &validate)?;

            if entry.is_active() {
                if let Some(first) = seen.get(&entry.value) {
                    return Err(ParseError::DuplicateEntry {
                        position,
                        value: entry.value,
                        first: *first,
                    });
                }
                seen.insert(entry.value.clone(), position);
            }
            entries.push(entry);
        }

        Ok(entries)
    }
}

fn record_to_entry<F>(
    item: &Value,
    kind: EntryKind,
    position: usize,
    validate: &F,
) -> Result<Entry, ParseError>
where
    F: Fn(&str) -> Result<String, EntryError>,
{
    let invalid = |reason: String| ParseError::InvalidRecord { position, reason };

    let Value::Mapping(record) = item else {
        return Err(invalid("record must be a mapping".to_string()));
    };

    let raw = match record.get(kind.key()) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) if number.is_i64() || number.is_u64() => number.to_string(),
        Some(_) => {
            return Err(invalid(format!(
                "{:?} must be a string or an integer",
                kind.key()
            )));
        }
        None => {
            return Err(ParseError::MissingKey {
                position,
                key: kind.key(),
            });
        }
    };

    let disabled = match record.get(DISABLE_KEY) {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(_) => return Err(invalid(format!("{DISABLE_KEY:?} must be a boolean"))),
    };

    let comment = match record.get(COMMENT_KEY) {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text.clone()),
        Some(_) => return Err(invalid(format!("{COMMENT_KEY:?} must be a string"))),
    };

    let mut extra = Mapping::new();
    for (key, value) in record {
        let known = key
            .as_str()
            .is_some_and(|k| k == kind.key() || k == DISABLE_KEY || k == COMMENT_KEY);
        if !known {
            tracing::debug!(position, key = ?key, "keeping unknown record field");
            extra.insert(key.clone(), value.clone());
        }
    }

    let value = validate(&raw).map_err(|source| ParseError::InvalidEntry { position, source })?;

    Ok(Entry {
        kind,
        value,
        disabled,
        comment,
        extra,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blacklist::validate;

    fn read(content: &str, kind: EntryKind) -> Result<Vec<Entry>, ParseError> {
        Document::from_yaml(content)?.entries(kind, |raw| validate::validate(kind, raw))
    }

    #[test]
    fn should_accept_string_and_integer_versions() {
        let text = Document::from_yaml("Schema: yaml_asn\nSchema_version: '2019120601'\n").unwrap();
        let number = Document::from_yaml("Schema: yaml_asn\nSchema_version: 2019120601\n").unwrap();
        assert_eq!(text.declared_schema(), number.declared_schema());
        assert!(text.items.is_empty());
    }

    #[test]
    fn should_reject_document_without_header() {
        assert!(matches!(
            Document::from_yaml("items: []\n"),
            Err(ParseError::Yaml(_))
        ));
    }

    #[test]
    fn should_read_disable_and_comment() {
        let content = r"
Schema: yaml_cidr
Schema_version: '2019120601'
items:
- ip: 1.2.3.4
- ip: 2.3.4.5
  disable: true
- ip: 3.4.5.6
  comment: comment
";
        let entries = read(content, EntryKind::Cidr).unwrap();
        assert_eq!(entries.len(), 3);
        assert!(entries[0].is_active());
        assert!(entries[1].disabled);
        assert_eq!(entries[2].comment.as_deref(), Some("comment"));
    }

    #[test]
    fn should_accept_numeric_values() {
        let content = "Schema: yaml_asn\nSchema_version: '2019120601'\nitems:\n- asn: 123\n";
        let entries = read(content, EntryKind::Asn).unwrap();
        assert_eq!(entries[0].value, "123");
    }

    #[test]
    fn should_report_missing_key_with_position() {
        let content = "Schema: yaml_ns\nSchema_version: '2019120601'\nitems:\n- ns: a.example.\n- ip: 1.2.3.4\n";
        let err = read(content, EntryKind::Ns).unwrap_err();
        assert!(matches!(
            err,
            ParseError::MissingKey {
                position: 2,
                key: "ns"
            }
        ));
    }

    #[test]
    fn should_report_invalid_entry_with_position() {
        let content = "Schema: yaml_cidr\nSchema_version: '2019120601'\nitems:\n- ip: 1.2.3.4\n- ip: 1.2.3\n";
        let err = read(content, EntryKind::Cidr).unwrap_err();
        assert_eq!(err.position(), Some(2));
        assert!(matches!(
            err,
            ParseError::InvalidEntry {
                source: EntryError::MalformedAddress { .. },
                ..
            }
        ));
    }

    #[test]
    fn should_reject_non_mapping_records() {
        let content = "Schema: yaml_cidr\nSchema_version: '2019120601'\nitems:\n- 1.2.3.4\n";
        assert!(matches!(
            read(content, EntryKind::Cidr),
            Err(ParseError::InvalidRecord { position: 1, .. })
        ));
    }

    #[test]
    fn should_reject_non_boolean_disable() {
        let content = "Schema: yaml_cidr\nSchema_version: '2019120601'\nitems:\n- ip: 1.2.3.4\n  disable: maybe\n";
        assert!(matches!(
            read(content, EntryKind::Cidr),
            Err(ParseError::InvalidRecord { position: 1, .. })
        ));
    }

    #[test]
    fn should_reject_duplicate_active_values() {
        let content = "Schema: yaml_asn\nSchema_version: '2019120601'\nitems:\n- asn: '1'\n- asn: '2'\n- asn: '1'\n";
        assert!(matches!(
            read(content, EntryKind::Asn),
            Err(ParseError::DuplicateEntry {
                position: 3,
                first: 1,
                ..
            })
        ));
    }

    #[test]
    fn should_allow_disabled_duplicate_of_active_value() {
        let content = "Schema: yaml_asn\nSchema_version: '2019120601'\nitems:\n- asn: '1'\n  disable: true\n- asn: '1'\n";
        let entries = read(content, EntryKind::Asn).unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn should_write_records_in_order_with_optional_fields() {
        let entries = vec![
            Entry::new(EntryKind::Cidr, "1.2.3.4"),
            Entry {
                kind: EntryKind::Cidr,
                value: "2.3.4.5".into(),
                disabled: true,
                comment: Some("old".into()),
                extra: Mapping::new(),
            },
        ];
        let document = Document::from_entries(
            Schema::new("yaml_cidr", SCHEMA_VERSION),
            EntryKind::Cidr,
            &entries,
        );
        let yaml = document.to_yaml().unwrap();

        assert!(yaml.starts_with("Schema: yaml_cidr\n"));
        let value = yaml.find("ip: 2.3.4.5").unwrap();
        let disable = yaml.find("disable: true").unwrap();
        let comment = yaml.find("comment: old").unwrap();
        assert!(value < disable && disable < comment);
        assert_eq!(read(&yaml, EntryKind::Cidr).unwrap(), entries);
    }

    #[test]
    fn should_reject_float_values() {
        let content = "Schema: yaml_number\nSchema_version: '2019120601'\nitems:\n- number: 12345678e3\n";
        assert!(matches!(
            read(content, EntryKind::Number),
            Err(ParseError::InvalidRecord { position: 1, .. })
        ));
    }

    #[test]
    fn should_keep_integer_values_verbatim() {
        let content = "Schema: yaml_number\nSchema_version: '2019120601'\nitems:\n- number: 18005550199\n";
        let entries = read(content, EntryKind::Number).unwrap();
        assert_eq!(entries[0].value, "18005550199");
    }

    #[test]
    fn should_round_trip_unknown_record_fields() {
        let content = "Schema: yaml_cidr\nSchema_version: '2019120601'\nitems:\n- ip: 1.2.3.4\n  added_by: alice\n  comment: seen twice\n";
        let entries = read(content, EntryKind::Cidr).unwrap();
        assert_eq!(
            entries[0].extra.get("added_by"),
            Some(&Value::String("alice".into()))
        );

        let yaml = Document::from_entries(
            Schema::new("yaml_cidr", SCHEMA_VERSION),
            EntryKind::Cidr,
            &entries,
        )
        .to_yaml()
        .unwrap();
        assert!(yaml.contains("added_by: alice"));
        assert!(yaml.find("comment: seen twice").unwrap() < yaml.find("added_by").unwrap());
        assert_eq!(read(&yaml, EntryKind::Cidr).unwrap(), entries);
    }
}
