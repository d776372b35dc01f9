//! Schema-validated blacklist documents.
//!
//! Every list lives in a YAML document that declares its schema and carries an
//! ordered sequence of records. A [`ListParser`] knows one schema: how to read
//! the records into [`Entry`] values and how to write them back.
//!
//! # Supported Schemas
//!
//! - **`yaml_cidr`**: IPv4 addresses and CIDR ranges (`{ip: 1.2.3.0/24}`)
//! - **`yaml_asn`**: Autonomous-system numbers (`{asn: 13335}`)
//! - **`yaml_ns`**: Fully-qualified nameserver domains (`{ns: ns1.example.com.}`)
//! - **`yaml_number`**: Phone-style number patterns (`{number: 1-?800-?555}`)
//!
//! Any record may also carry `disable: true` (kept in the file, excluded from
//! lookups) and a free-text `comment`.
//!
//! # Example
//!
//! ```
//! use blacklists::blacklist::{Document, EntryKind, parser_for_kind};
//!
//! let content = "Schema: yaml_asn\nSchema_version: '2019120601'\nitems:\n- asn: '13335'\n";
//! let parser = parser_for_kind(EntryKind::Asn);
//! let entries = parser.read(&Document::from_yaml(content).unwrap()).unwrap();
//! assert_eq!(entries[0].value, "13335");
//! ```

mod asn;
pub mod changes;
mod cidr;
mod document;
mod entry;
pub mod loader;
mod ns;
mod number;
pub mod store;
pub mod validate;

pub use asn::AsnParser;
pub use cidr::CidrParser;
pub use document::{Document, SCHEMA_VERSION, Schema};
pub use entry::{Candidate, Entry, EntryKind, UnknownKind};
pub use ns::NameserverParser;
pub use number::NumberParser;

/// Error raised when a single value is not valid for its list kind.
#[derive(Debug, thiserror::Error)]
pub enum EntryError {
    /// Not a dotted-quad IPv4 address or CIDR range.
    #[error("malformed address {value:?}: {reason}")]
    MalformedAddress {
        /// Offending value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Not a positive autonomous-system number.
    #[error("malformed ASN {value:?}")]
    MalformedAsn {
        /// Offending value.
        value: String,
    },

    /// Not a fully-qualified domain name.
    #[error("malformed nameserver {value:?}: {reason}")]
    MalformedNameserver {
        /// Offending value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Does not compile as a regular expression.
    #[error("malformed pattern {value:?}: {source}")]
    MalformedPattern {
        /// Offending value.
        value: String,
        /// Compiler diagnostic.
        #[source]
        source: regex::Error,
    },
}

/// Error type for schema document operations.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The document is not valid YAML or lacks the top-level keys.
    #[error("invalid YAML document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The document declares a schema the parser does not accept.
    #[error("schema mismatch: expected {expected}, found {found}")]
    SchemaMismatch {
        /// Schema the parser was built for.
        expected: Schema,
        /// Schema the document declares.
        found: Schema,
    },

    /// A record lacks the kind-specific key.
    #[error("item {position}: missing {key:?} key")]
    MissingKey {
        /// Record position (1-indexed).
        position: usize,
        /// Expected key.
        key: &'static str,
    },

    /// A record has the wrong shape.
    #[error("item {position}: {reason}")]
    InvalidRecord {
        /// Record position (1-indexed).
        position: usize,
        /// Reason for the error.
        reason: String,
    },

    /// A record value failed entry validation.
    #[error("item {position}: {source}")]
    InvalidEntry {
        /// Record position (1-indexed).
        position: usize,
        /// Validation failure.
        #[source]
        source: EntryError,
    },

    /// Two active records carry the same value.
    #[error("item {position}: duplicate entry {value:?} (also item {first})")]
    DuplicateEntry {
        /// Record position (1-indexed).
        position: usize,
        /// Duplicated value.
        value: String,
        /// Position of the first occurrence.
        first: usize,
    },
}

impl ParseError {
    /// Record position the error refers to, if any.
    #[must_use]
    pub const fn position(&self) -> Option<usize> {
        match self {
            Self::MissingKey { position, .. }
            | Self::InvalidRecord { position, .. }
            | Self::InvalidEntry { position, .. }
            | Self::DuplicateEntry { position, .. } => Some(*position),
            Self::Yaml(_) | Self::SchemaMismatch { .. } => None,
        }
    }
}

/// Trait for schema parsers.
///
/// An implementation binds one [`EntryKind`] to one [`Schema`] and supplies
/// the value validator; reading and writing documents is shared.
pub trait ListParser: Send + Sync {
    /// List kind handled by this parser.
    fn kind(&self) -> EntryKind;

    /// Schema identifier and version this parser accepts and writes.
    fn describe(&self) -> Schema;

    /// Validate a raw value and return its normalized form.
    ///
    /// # Errors
    ///
    /// Returns the kind-specific [`EntryError`] for malformed values.
    fn validate(&self, raw: &str) -> Result<String, EntryError>;

    /// Read a document into its ordered entries.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::SchemaMismatch`] if the document declares another
    /// schema, or a positional error for the first bad record.
    fn read(&self, document: &Document) -> Result<Vec<Entry>, ParseError> {
        document.check_schema(&self.describe())?;
        document.entries(self.kind(), |raw| self.validate(raw))
    }

    /// Serialize entries into a document carrying this parser's schema.
    fn write(&self, entries: &[Entry]) -> Document {
        Document::from_entries(self.describe(), self.kind(), entries)
    }
}

/// Returns a boxed parser for the given list kind.
///
/// # Example
///
/// ```
/// use blacklists::blacklist::{EntryKind, parser_for_kind};
///
/// let parser = parser_for_kind(EntryKind::Cidr);
/// assert_eq!(parser.describe().id, "yaml_cidr");
/// assert!(parser.validate("10.0.0.0/8").is_ok());
/// ```
#[must_use]
pub fn parser_for_kind(kind: EntryKind) -> Box<dyn ListParser> {
    match kind {
        EntryKind::Cidr => Box::new(CidrParser),
        EntryKind::Asn => Box::new(AsnParser),
        EntryKind::Ns => Box::new(NameserverParser),
        EntryKind::Number => Box::new(NumberParser),
    }
}
