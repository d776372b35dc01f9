//! Change detection for list files.
//!
//! The remote sync step produces a whitespace-separated listing of the files
//! touched between two revisions. Lists only need reloading when one of their
//! files appears in it.

use std::borrow::Borrow;
use std::collections::HashSet;
use std::hash::Hash;

/// Returns `true` if any path in `diff` is one of `files`.
///
/// # Example
///
/// ```
/// use std::collections::HashSet;
/// use blacklists::blacklist::changes::files_changed;
///
/// let files: HashSet<&str> = ["watched_cidrs.yml", "watched_asns.yml"].into();
/// assert!(files_changed("README.md watched_asns.yml", &files));
/// assert!(!files_changed("README.md", &files));
/// ```
pub fn files_changed<S>(diff: &str, files: &HashSet<S>) -> bool
where
    S: Borrow<str> + Eq + Hash,
{
    diff.split_whitespace().any(|path| files.contains(path))
}
