//! Loading every list into a published snapshot.
//!
//! The [`Loader`] knows the full set of list files. Each call to
//! [`Loader::load_blacklists`] parses all of them and, only if every one
//! succeeds, swaps in a new immutable [`Snapshot`] for the classification
//! pipeline to read.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::RwLock;

use super::changes::files_changed;
use super::store::{Blacklist, StoreError};
use super::EntryKind;

/// Error type for loading lists.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A list failed to parse; nothing was published.
    #[error("failed to load {name} list: {source}")]
    Store {
        /// List that failed.
        name: ListName,
        /// Underlying store error.
        #[source]
        source: StoreError,
    },

    /// The list is not part of this loader.
    #[error("list {0} is not configured")]
    UnknownList(ListName),
}

/// The lists consumed by the classification pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ListName {
    WatchedNumbers,
    BlacklistedNumbers,
    WatchedCidrs,
    BlacklistedCidrs,
    WatchedAsns,
    WatchedNses,
    BlacklistedNses,
}

impl ListName {
    pub const ALL: [Self; 7] = [
        Self::WatchedNumbers,
        Self::BlacklistedNumbers,
        Self::WatchedCidrs,
        Self::BlacklistedCidrs,
        Self::WatchedAsns,
        Self::WatchedNses,
        Self::BlacklistedNses,
    ];

    #[must_use]
    pub const fn kind(self) -> EntryKind {
        match self {
            Self::WatchedNumbers | Self::BlacklistedNumbers => EntryKind::Number,
            Self::WatchedCidrs | Self::BlacklistedCidrs => EntryKind::Cidr,
            Self::WatchedAsns => EntryKind::Asn,
            Self::WatchedNses | Self::BlacklistedNses => EntryKind::Ns,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WatchedNumbers => "watched_numbers",
            Self::BlacklistedNumbers => "blacklisted_numbers",
            Self::WatchedCidrs => "watched_cidrs",
            Self::BlacklistedCidrs => "blacklisted_cidrs",
            Self::WatchedAsns => "watched_asns",
            Self::WatchedNses => "watched_nses",
            Self::BlacklistedNses => "blacklisted_nses",
        }
    }

    /// Default file name, relative to the data directory.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::WatchedNumbers => "watched_numbers.yml",
            Self::BlacklistedNumbers => "blacklisted_numbers.yml",
            Self::WatchedCidrs => "watched_cidrs.yml",
            Self::BlacklistedCidrs => "blacklisted_cidrs.yml",
            Self::WatchedAsns => "watched_asns.yml",
            Self::WatchedNses => "watched_nses.yml",
            Self::BlacklistedNses => "blacklisted_nses.yml",
        }
    }

    /// `"watched"` or `"blacklisted"`.
    #[must_use]
    pub const fn severity(self) -> &'static str {
        match self {
            Self::WatchedNumbers | Self::WatchedCidrs | Self::WatchedAsns | Self::WatchedNses => {
                "watched"
            }
            Self::BlacklistedNumbers | Self::BlacklistedCidrs | Self::BlacklistedNses => {
                "blacklisted"
            }
        }
    }
}

impl fmt::Display for ListName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown [`ListName`].
#[derive(Debug, thiserror::Error)]
#[error("unknown list {0:?}")]
pub struct UnknownListName(pub String);

impl FromStr for ListName {
    type Err = UnknownListName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| UnknownListName(s.to_string()))
    }
}

/// A list and the file it is stored in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSource {
    pub name: ListName,
    pub path: PathBuf,
}

impl ListSource {
    pub fn new(name: ListName, path: impl Into<PathBuf>) -> Self {
        Self {
            name,
            path: path.into(),
        }
    }

    /// Source at the default file name inside `data_dir`.
    pub fn in_dir(name: ListName, data_dir: &Path) -> Self {
        Self::new(name, data_dir.join(name.file_name()))
    }

    /// Open a store bound to this source.
    #[must_use]
    pub fn open(&self) -> Blacklist {
        Blacklist::new(&self.path, self.name.kind())
    }
}

/// Immutable view of all active values, as published by one load.
#[derive(Debug, Default)]
pub struct Snapshot {
    version: u64,
    lists: HashMap<ListName, HashSet<String>>,
}

impl Snapshot {
    /// Load counter; `0` is the empty snapshot published at startup.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Active values of a list, if it was loaded.
    #[must_use]
    pub fn list(&self, name: ListName) -> Option<&HashSet<String>> {
        self.lists.get(&name)
    }

    #[must_use]
    pub fn watched_numbers(&self) -> Option<&HashSet<String>> {
        self.list(ListName::WatchedNumbers)
    }

    #[must_use]
    pub fn blacklisted_numbers(&self) -> Option<&HashSet<String>> {
        self.list(ListName::BlacklistedNumbers)
    }

    #[must_use]
    pub fn watched_cidrs(&self) -> Option<&HashSet<String>> {
        self.list(ListName::WatchedCidrs)
    }

    #[must_use]
    pub fn blacklisted_cidrs(&self) -> Option<&HashSet<String>> {
        self.list(ListName::BlacklistedCidrs)
    }

    #[must_use]
    pub fn watched_asns(&self) -> Option<&HashSet<String>> {
        self.list(ListName::WatchedAsns)
    }

    #[must_use]
    pub fn watched_nses(&self) -> Option<&HashSet<String>> {
        self.list(ListName::WatchedNses)
    }

    #[must_use]
    pub fn blacklisted_nses(&self) -> Option<&HashSet<String>> {
        self.list(ListName::BlacklistedNses)
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, name: ListName, value: &str) -> bool {
        self.lists
            .get(&name)
            .is_some_and(|values| values.contains(value))
    }

    /// Number of active values per loaded list.
    #[must_use]
    pub fn stats(&self) -> BTreeMap<ListName, usize> {
        self.lists
            .iter()
            .map(|(name, values)| (*name, values.len()))
            .collect()
    }
}

/// Loads all configured lists and publishes them as one [`Snapshot`].
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use blacklists::blacklist::loader::{ListName, Loader};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let loader = Loader::in_dir(Path::new("/srv/lists"));
/// loader.load_blacklists()?;
///
/// let snapshot = loader.snapshot();
/// if snapshot.contains(ListName::WatchedAsns, "64496") {
///     println!("watched");
/// }
/// # Ok(())
/// # }
/// ```
pub struct Loader {
    sources: Vec<ListSource>,

    /// Current snapshot, shared with readers; replaced wholesale.
    snapshot: Arc<RwLock<Arc<Snapshot>>>,
}

impl Loader {
    /// Create a loader for explicit sources. Publishes an empty snapshot.
    #[must_use]
    pub fn new(sources: Vec<ListSource>) -> Self {
        Self {
            sources,
            snapshot: Arc::new(RwLock::new(Arc::new(Snapshot::default()))),
        }
    }

    /// Create a loader for every list at its default name inside `data_dir`.
    #[must_use]
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(
            ListName::ALL
                .into_iter()
                .map(|name| ListSource::in_dir(name, data_dir))
                .collect(),
        )
    }

    #[must_use]
    pub fn sources(&self) -> &[ListSource] {
        &self.sources
    }

    /// Source for a list.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::UnknownList`] if the list is not configured.
    pub fn source(&self, name: ListName) -> Result<&ListSource, LoadError> {
        self.sources
            .iter()
            .find(|source| source.name == name)
            .ok_or(LoadError::UnknownList(name))
    }

    /// Shared slot holding the current snapshot.
    ///
    /// Readers that keep this handle always see the latest published
    /// snapshot after each [`load_blacklists`](Self::load_blacklists).
    #[must_use]
    pub fn shared(&self) -> Arc<RwLock<Arc<Snapshot>>> {
        Arc::clone(&self.snapshot)
    }

    /// The current snapshot. It never changes once obtained.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot.read())
    }

    /// Parse every list and publish the result as a new snapshot.
    ///
    /// The previous snapshot is replaced, not merged. If any list fails, the
    /// first error is returned and the previous snapshot stays published.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Store`] for the first list that fails to parse.
    pub fn load_blacklists(&self) -> Result<Arc<Snapshot>, LoadError> {
        let mut lists = HashMap::with_capacity(self.sources.len());

        for source in &self.sources {
            tracing::debug!(name = %source.name, path = ?source.path, "loading list");
            let mut store = source.open();
            let active = store.parse().map_err(|err| LoadError::Store {
                name: source.name,
                source: err,
            })?;
            lists.insert(source.name, active.clone());
        }

        let mut slot = self.snapshot.write();
        let snapshot = Arc::new(Snapshot {
            version: slot.version + 1,
            lists,
        });
        *slot = Arc::clone(&snapshot);
        drop(slot);

        tracing::info!(
            version = snapshot.version,
            lists = snapshot.lists.len(),
            entries = snapshot.lists.values().map(HashSet::len).sum::<usize>(),
            "published blacklist snapshot"
        );
        Ok(snapshot)
    }

    /// Active values of one list in document order, read from disk.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::UnknownList`] or [`LoadError::Store`].
    pub fn active_values(&self, name: ListName) -> Result<Vec<String>, LoadError> {
        let source = self.source(name)?;
        let mut store = source.open();
        let entries = store.entries().map_err(|err| LoadError::Store {
            name,
            source: err,
        })?;
        Ok(entries
            .iter()
            .filter(|entry| entry.is_active())
            .map(|entry| entry.value.clone())
            .collect())
    }

    /// List file paths relative to `root`, as they appear in a diff listing.
    ///
    /// Paths outside `root` are returned as-is.
    #[must_use]
    pub fn file_paths(&self, root: &Path) -> HashSet<String> {
        self.sources
            .iter()
            .map(|source| {
                source
                    .path
                    .strip_prefix(root)
                    .unwrap_or(&source.path)
                    .to_string_lossy()
                    .into_owned()
            })
            .collect()
    }

    /// Reload when `diff` lists one of the list files.
    ///
    /// Returns whether a reload happened.
    ///
    /// # Errors
    ///
    /// Propagates [`load_blacklists`](Self::load_blacklists) errors.
    pub fn reload_if_changed(&self, diff: &str, root: &Path) -> Result<bool, LoadError> {
        if !files_changed(diff, &self.file_paths(root)) {
            tracing::debug!("no list files changed");
            return Ok(false);
        }
        self.load_blacklists()?;
        Ok(true)
    }
}
