//! List entries and mutation candidates.

use std::fmt;
use std::str::FromStr;

use serde_yaml::Mapping;

/// Kind of identifier a list holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntryKind {
    /// IPv4 addresses and CIDR ranges.
    Cidr,
    /// Autonomous-system numbers.
    Asn,
    /// Nameserver domains.
    Ns,
    /// Phone-style number patterns.
    Number,
}

impl EntryKind {
    /// All kinds, in schema order.
    pub const ALL: [Self; 4] = [Self::Cidr, Self::Asn, Self::Ns, Self::Number];

    /// Record key holding the value in a schema document.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Cidr => "ip",
            Self::Asn => "asn",
            Self::Ns => "ns",
            Self::Number => "number",
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cidr => "cidr",
            Self::Asn => "asn",
            Self::Ns => "ns",
            Self::Number => "number",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown [`EntryKind`] name.
#[derive(Debug, thiserror::Error)]
#[error("unknown list kind {0:?} (expected cidr, asn, ns or number)")]
pub struct UnknownKind(pub String);

impl FromStr for EntryKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

/// A single list item as read from (or written to) a schema document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub kind: EntryKind,
    /// Normalized value.
    pub value: String,
    /// Present in the document but excluded from lookups.
    pub disabled: bool,
    pub comment: Option<String>,
    /// Record fields this crate does not interpret, written back unchanged.
    pub extra: Mapping,
}

impl Entry {
    /// Create an active entry without a comment.
    pub fn new(kind: EntryKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
            disabled: false,
            comment: None,
            extra: Mapping::new(),
        }
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        !self.disabled
    }
}

/// Input to [`Blacklist::add`](super::store::Blacklist::add) and
/// [`Blacklist::remove`](super::store::Blacklist::remove).
///
/// Callers either pass a bare value or a full record; both are normalized to
/// an [`Entry`] by the store before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    Bare(String),
    Structured {
        value: String,
        comment: Option<String>,
        disable: bool,
    },
}

impl Candidate {
    /// Start a structured record for `value`.
    pub fn record(value: impl Into<String>) -> Self {
        Self::Structured {
            value: value.into(),
            comment: None,
            disable: false,
        }
    }

    /// Attach a comment, turning a bare value into a record.
    #[must_use]
    pub fn with_comment(self, comment: impl Into<String>) -> Self {
        match self {
            Self::Bare(value) => Self::Structured {
                value,
                comment: Some(comment.into()),
                disable: false,
            },
            Self::Structured { value, disable, .. } => Self::Structured {
                value,
                comment: Some(comment.into()),
                disable,
            },
        }
    }

    /// Mark the record as disabled.
    #[must_use]
    pub fn disabled(self) -> Self {
        match self {
            Self::Bare(value) => Self::Structured {
                value,
                comment: None,
                disable: true,
            },
            Self::Structured { value, comment, .. } => Self::Structured {
                value,
                comment,
                disable: true,
            },
        }
    }

    /// Raw, not yet validated value.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Bare(value) | Self::Structured { value, .. } => value,
        }
    }

    /// Build the entry to store, using an already normalized value.
    pub(crate) fn into_entry(self, kind: EntryKind, value: String) -> Entry {
        match self {
            Self::Bare(_) => Entry::new(kind, value),
            Self::Structured {
                comment, disable, ..
            } => Entry {
                kind,
                value,
                disabled: disable,
                comment,
                extra: Mapping::new(),
            },
        }
    }
}

impl From<&str> for Candidate {
    fn from(value: &str) -> Self {
        Self::Bare(value.to_string())
    }
}

impl From<String> for Candidate {
    fn from(value: String) -> Self {
        Self::Bare(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_kind_names_case_insensitively() {
        assert_eq!("cidr".parse::<EntryKind>().unwrap(), EntryKind::Cidr);
        assert_eq!("NS".parse::<EntryKind>().unwrap(), EntryKind::Ns);
        assert!("ipv6".parse::<EntryKind>().is_err());
    }

    #[test]
    fn should_map_kinds_to_record_keys() {
        assert_eq!(EntryKind::Cidr.key(), "ip");
        assert_eq!(EntryKind::Asn.key(), "asn");
        assert_eq!(EntryKind::Ns.key(), "ns");
        assert_eq!(EntryKind::Number.key(), "number");
    }

    #[test]
    fn should_build_active_entry_from_bare_candidate() {
        let entry = Candidate::from("1.2.3.4").into_entry(EntryKind::Cidr, "1.2.3.4".into());
        assert_eq!(entry, Entry::new(EntryKind::Cidr, "1.2.3.4"));
        assert!(entry.is_active());
    }

    #[test]
    fn should_keep_record_metadata() {
        let candidate = Candidate::record("123").with_comment("hosting").disabled();
        assert_eq!(candidate.value(), "123");

        let entry = candidate.into_entry(EntryKind::Asn, "123".into());
        assert!(entry.disabled);
        assert_eq!(entry.comment.as_deref(), Some("hosting"));
    }

    #[test]
    fn should_promote_bare_value_when_comment_is_added() {
        let candidate = Candidate::from("example.com.").with_comment("spam host");
        assert_eq!(
            candidate,
            Candidate::Structured {
                value: "example.com.".into(),
                comment: Some("spam host".into()),
                disable: false,
            }
        );
    }
}
