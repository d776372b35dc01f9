//! File-backed blacklist store.
//!
//! A [`Blacklist`] binds one schema document on disk to one [`ListParser`].
//! The document is read lazily, the set of active values is memoized, and
//! every mutation rewrites the whole document before the in-memory state is
//! updated.

use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use super::{
    Candidate, Document, Entry, EntryError, EntryKind, ListParser, ParseError, parser_for_kind,
};

/// Error type for blacklist store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// List file was not found at the specified path.
    #[error("list file not found: {0:?}")]
    NotFound(PathBuf),

    /// Refused to overwrite an existing list file.
    #[error("list file already exists: {0:?}")]
    AlreadyExists(PathBuf),

    /// I/O error while reading or writing the file.
    #[error("I/O error on {path:?}: {source}")]
    Io {
        /// Path to the file that caused the error.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The document could not be read or written.
    #[error("{path:?}: {source}")]
    Parse {
        /// Path to the offending document.
        path: PathBuf,
        /// Underlying schema error.
        #[source]
        source: ParseError,
    },

    /// The candidate value is malformed.
    #[error(transparent)]
    Invalid(#[from] EntryError),

    /// The value is already an active entry.
    #[error("duplicate entry {0:?}")]
    DuplicateEntry(String),

    /// No active entry carries the value.
    #[error("entry not found: {0:?}")]
    EntryNotFound(String),
}

/// Cache state of a [`Blacklist`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    /// The document has not been read yet.
    Unloaded,
    /// The document is loaded and the active set is current.
    Fresh,
    /// The document is loaded but the active set must be recomputed.
    Stale,
}

/// A single list file and the parser for its schema.
///
/// # Example
///
/// ```no_run
/// use blacklists::blacklist::EntryKind;
/// use blacklists::blacklist::store::Blacklist;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut list = Blacklist::new("watched_cidrs.yml", EntryKind::Cidr);
/// list.add("203.0.113.0/24")?;
/// assert!(list.parse()?.contains("203.0.113.0/24"));
/// list.remove("203.0.113.0/24")?;
/// # Ok(())
/// # }
/// ```
pub struct Blacklist {
    path: PathBuf,
    parser: Box<dyn ListParser>,
    /// Document entries in file order, once loaded.
    entries: Option<Vec<Entry>>,
    /// Memoized active values; cleared by every mutation.
    active: Option<HashSet<String>>,
}

impl std::fmt::Debug for Blacklist {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blacklist")
            .field("path", &self.path)
            .field("kind", &self.parser.kind())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Blacklist {
    /// Bind a list file to the parser for `kind`. Nothing is read yet.
    pub fn new(path: impl Into<PathBuf>, kind: EntryKind) -> Self {
        Self::with_parser(path, parser_for_kind(kind))
    }

    /// Bind a list file to a specific parser.
    pub fn with_parser(path: impl Into<PathBuf>, parser: Box<dyn ListParser>) -> Self {
        Self {
            path: path.into(),
            parser,
            entries: None,
            active: None,
        }
    }

    /// Write an empty document for `kind` and return a store bound to it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AlreadyExists`] rather than overwriting a file.
    pub fn create(path: impl Into<PathBuf>, kind: EntryKind) -> Result<Self, StoreError> {
        let mut store = Self::new(path, kind);
        if store.path.exists() {
            return Err(StoreError::AlreadyExists(store.path));
        }
        persist(&store.path, store.parser.as_ref(), &[])?;
        store.entries = Some(Vec::new());
        Ok(store)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn kind(&self) -> EntryKind {
        self.parser.kind()
    }

    #[must_use]
    pub const fn state(&self) -> StoreState {
        match (&self.entries, &self.active) {
            (None, _) => StoreState::Unloaded,
            (Some(_), Some(_)) => StoreState::Fresh,
            (Some(_), None) => StoreState::Stale,
        }
    }

    /// All entries in document order, disabled ones included.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be loaded.
    pub fn entries(&mut self) -> Result<&[Entry], StoreError> {
        Ok(self.load()?.as_slice())
    }

    /// Normalized values of all active entries.
    ///
    /// The result is memoized until the next [`add`](Self::add) or
    /// [`remove`](Self::remove).
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be loaded.
    pub fn parse(&mut self) -> Result<&HashSet<String>, StoreError> {
        let active = match self.active.take() {
            Some(active) => active,
            None => {
                let active: HashSet<String> = self
                    .load()?
                    .iter()
                    .filter(|entry| entry.is_active())
                    .map(|entry| entry.value.clone())
                    .collect();
                tracing::debug!(path = ?self.path, count = active.len(), "parsed list");
                active
            }
        };
        Ok(&*self.active.insert(active))
    }

    /// Validate and append a new entry, then persist the document.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Invalid`] if the value is malformed (checked first)
    /// - [`StoreError::DuplicateEntry`] if any record carries the value,
    ///   disabled ones included
    /// - [`StoreError::Io`] / [`StoreError::Parse`] if persisting fails
    pub fn add(&mut self, candidate: impl Into<Candidate>) -> Result<(), StoreError> {
        let candidate = candidate.into();
        let value = self.parser.validate(candidate.value())?;
        let kind = self.parser.kind();

        let entries = self.load()?;
        if entries.iter().any(|entry| entry.value == value) {
            return Err(StoreError::DuplicateEntry(value));
        }

        let mut updated = entries.clone();
        updated.push(candidate.into_entry(kind, value.clone()));
        persist(&self.path, self.parser.as_ref(), &updated)?;

        self.entries = Some(updated);
        self.active = None;
        tracing::info!(path = ?self.path, value = %value, "added entry");
        Ok(())
    }

    /// Delete the active entry carrying the candidate's value, then persist.
    ///
    /// Disabled records with the same value stay in the document.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Invalid`] if the value is malformed
    /// - [`StoreError::EntryNotFound`] if no active entry matches
    /// - [`StoreError::Io`] / [`StoreError::Parse`] if persisting fails
    pub fn remove(&mut self, candidate: impl Into<Candidate>) -> Result<(), StoreError> {
        let candidate = candidate.into();
        let value = self.parser.validate(candidate.value())?;

        let entries = self.load()?;
        let Some(index) = entries
            .iter()
            .position(|entry| entry.is_active() && entry.value == value)
        else {
            return Err(StoreError::EntryNotFound(value));
        };

        let mut updated = entries.clone();
        updated.remove(index);
        persist(&self.path, self.parser.as_ref(), &updated)?;

        self.entries = Some(updated);
        self.active = None;
        tracing::info!(path = ?self.path, value = %value, "removed entry");
        Ok(())
    }

    /// Re-read the document from disk and run the parser over it.
    ///
    /// Independent of any cached state. Returns the number of active entries.
    ///
    /// # Errors
    ///
    /// Returns the first schema, validation or I/O error encountered.
    pub fn validate(&self) -> Result<usize, StoreError> {
        let entries = read_entries(&self.path, self.parser.as_ref())?;
        Ok(entries.iter().filter(|entry| entry.is_active()).count())
    }

    fn load(&mut self) -> Result<&mut Vec<Entry>, StoreError> {
        let entries = match self.entries.take() {
            Some(entries) => entries,
            None => {
                let entries = read_entries(&self.path, self.parser.as_ref())?;
                tracing::debug!(path = ?self.path, count = entries.len(), "loaded list document");
                entries
            }
        };
        Ok(self.entries.insert(entries))
    }
}

fn read_entries(path: &Path, parser: &dyn ListParser) -> Result<Vec<Entry>, StoreError> {
    let content = fs::read_to_string(path).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => StoreError::NotFound(path.to_path_buf()),
        _ => StoreError::Io {
            path: path.to_path_buf(),
            source: err,
        },
    })?;

    let parse_error = |source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    };
    let document = Document::from_yaml(&content).map_err(parse_error)?;
    parser.read(&document).map_err(parse_error)
}

/// Write the full document next to `path`, then rename it into place.
fn persist(path: &Path, parser: &dyn ListParser, entries: &[Entry]) -> Result<(), StoreError> {
    let content = parser
        .write(entries)
        .to_yaml()
        .map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    let mut staging = OsString::from(path.as_os_str());
    staging.push(".tmp");
    let staging = PathBuf::from(staging);

    let io_error = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };
    fs::write(&staging, content).map_err(io_error)?;
    if let Err(err) = fs::rename(&staging, path) {
        if let Err(cleanup) = fs::remove_file(&staging) {
            tracing::warn!(path = ?staging, error = %cleanup, "failed to remove staging file");
        }
        return Err(io_error(err));
    }

    tracing::debug!(path = ?path, entries = entries.len(), "persisted list document");
    Ok(())
}
