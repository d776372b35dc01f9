//! Integration tests for the blacklist tooling.
//!
//! These tests drive the public API end to end against list files in a
//! temporary data directory.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use blacklists::Config;
use blacklists::blacklist::loader::{ListName, Loader};
use blacklists::blacklist::store::{Blacklist, StoreError};
use blacklists::blacklist::{Candidate, EntryKind};
use blacklists::grammar::NumberGrammar;
use blacklists::integrity::audit;
use tempfile::TempDir;

const CIDR_DOCUMENT: &str = r#"Schema: yaml_cidr
Schema_version: '2019120601'
items:
- ip: 1.2.3.4
- ip: 2.3.4.5
  disable: true
- ip: 3.4.5.6
  comment: "x"
"#;

fn set(values: &[&str]) -> HashSet<String> {
    values.iter().map(ToString::to_string).collect()
}

fn empty_document(schema: &str) -> String {
    format!("Schema: {schema}\nSchema_version: '2019120601'\nitems: []\n")
}

/// Write every list, all empty, into `dir`.
fn write_empty_lists(dir: &Path) {
    for name in ListName::ALL {
        let schema = match name.kind() {
            EntryKind::Cidr => "yaml_cidr",
            EntryKind::Asn => "yaml_asn",
            EntryKind::Ns => "yaml_ns",
            EntryKind::Number => "yaml_number",
        };
        fs::write(dir.join(name.file_name()), empty_document(schema)).unwrap();
    }
}

#[test]
fn test_cidr_end_to_end() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("watched_cidrs.yml");
    fs::write(&path, CIDR_DOCUMENT).unwrap();

    let mut store = Blacklist::new(&path, EntryKind::Cidr);
    assert_eq!(store.parse().unwrap(), &set(&["1.2.3.4", "3.4.5.6"]));

    store.remove("3.4.5.6").unwrap();
    assert_eq!(store.parse().unwrap(), &set(&["1.2.3.4"]));

    // The change is on disk, disabled record and comment handling included.
    let mut reopened = Blacklist::new(&path, EntryKind::Cidr);
    assert_eq!(reopened.parse().unwrap(), &set(&["1.2.3.4"]));
    assert_eq!(reopened.entries().unwrap().len(), 2);
    assert_eq!(reopened.validate().unwrap(), 1);
}

#[test]
fn test_cidr_add_remove_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("watched_cidrs.yml");
    fs::write(&path, CIDR_DOCUMENT).unwrap();

    let mut store = Blacklist::new(&path, EntryKind::Cidr);
    let before = store.parse().unwrap().clone();

    for value in ["10.0.0.1", "192.168.0.0/16", "0.0.0.0/0"] {
        store.add(value).unwrap();
        assert!(store.parse().unwrap().contains(value));
        store.remove(value).unwrap();
        assert_eq!(store.parse().unwrap(), &before);
    }
}

#[test]
fn test_cidr_mutation_errors() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("watched_cidrs.yml");
    fs::write(&path, CIDR_DOCUMENT).unwrap();
    let mut store = Blacklist::new(&path, EntryKind::Cidr);

    assert!(matches!(store.add("1.3.4"), Err(StoreError::Invalid(_))));
    assert!(matches!(
        store.add("1.2.3.4"),
        Err(StoreError::DuplicateEntry(_))
    ));
    assert!(matches!(
        store.remove("9.9.9.9"),
        Err(StoreError::EntryNotFound(_))
    ));

    // A disabled record still owns its value.
    assert!(matches!(
        store.add(Candidate::record("2.3.4.5").with_comment("back")),
        Err(StoreError::DuplicateEntry(_))
    ));
    assert!(!store.parse().unwrap().contains("2.3.4.5"));
}

#[test]
fn test_asn_lists() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("watched_asns.yml");
    let mut store = Blacklist::create(&path, EntryKind::Asn).unwrap();

    store.add("123").unwrap();
    store.add("0456").unwrap();
    assert_eq!(store.parse().unwrap(), &set(&["123", "456"]));

    assert!(matches!(store.add("invalid"), Err(StoreError::Invalid(_))));
    assert!(matches!(
        store.add("00123"),
        Err(StoreError::DuplicateEntry(_))
    ));

    store.remove("456").unwrap();
    assert_eq!(Blacklist::new(&path, EntryKind::Asn).validate().unwrap(), 1);
}

#[test]
fn test_ns_lists() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("watched_nses.yml");
    let mut store = Blacklist::create(&path, EntryKind::Ns).unwrap();

    store.add("example.com.").unwrap();
    assert!(matches!(store.add("example.com"), Err(StoreError::Invalid(_))));
    assert!(matches!(
        store.add("example.com."),
        Err(StoreError::DuplicateEntry(_))
    ));

    // Values are compared exactly as written.
    store.add("EXAMPLE.COM.").unwrap();
    assert_eq!(
        store.parse().unwrap(),
        &set(&["example.com.", "EXAMPLE.COM."])
    );
}

#[test]
fn test_loader_with_config() {
    let dir = TempDir::new().unwrap();
    write_empty_lists(dir.path());
    fs::write(
        dir.path().join("asns.yml"),
        "Schema: yaml_asn\nSchema_version: 2019120601\nitems:\n- asn: 64496\n",
    )
    .unwrap();

    let config = Config::parse(&format!(
        "data_dir = {:?}\n\n[lists]\nwatched_asns = \"asns.yml\"\n",
        dir.path().display().to_string()
    ))
    .unwrap();
    let loader = config.loader();

    let snapshot = loader.load_blacklists().unwrap();
    assert!(snapshot.contains(ListName::WatchedAsns, "64496"));
    assert_eq!(snapshot.stats().values().sum::<usize>(), 1);

    // Loading again publishes an equal snapshot under a new version.
    let again = loader.load_blacklists().unwrap();
    assert_eq!(again.version(), snapshot.version() + 1);
    assert_eq!(again.stats(), snapshot.stats());
}

#[test]
fn test_loader_fails_fast() {
    let dir = TempDir::new().unwrap();
    write_empty_lists(dir.path());
    let loader = Loader::in_dir(dir.path());
    let shared = loader.shared();
    loader.load_blacklists().unwrap();

    fs::write(
        dir.path().join(ListName::BlacklistedNses.file_name()),
        "Schema: yaml_ns\nSchema_version: '2019120601'\nitems:\n- ns: no-trailing-dot\n",
    )
    .unwrap();

    let err = loader.load_blacklists().unwrap_err();
    assert!(err.to_string().contains("blacklisted_nses"));
    assert_eq!(shared.read().version(), 1);
}

#[test]
fn test_audit_separates_warnings_from_errors() {
    let dir = TempDir::new().unwrap();
    write_empty_lists(dir.path());
    fs::write(
        dir.path().join(ListName::WatchedNumbers.file_name()),
        "Schema: yaml_number\nSchema_version: '2019120601'\nitems:\n- number: '18005550199'\n- number: 'tel 18005550199'\n",
    )
    .unwrap();

    let loader = Loader::in_dir(dir.path());
    let grammar = NumberGrammar::standard().unwrap();

    let report = audit(&loader, &grammar);
    assert!(report.is_pass());
    assert_eq!(report.warnings.len(), 1);
    assert!(report.to_string().starts_with("1 pattern(s) can't match exactly:\n\t"));

    fs::write(
        dir.path().join(ListName::BlacklistedNumbers.file_name()),
        "Schema: yaml_number\nSchema_version: '2019120601'\nitems:\n- number: '555'\n",
    )
    .unwrap();

    let report = audit(&loader, &grammar);
    assert!(!report.is_pass());
    assert_eq!(report.errors.len(), 1);
    assert!(
        report.errors[0]
            .contains("blacklisted number (1): fails NUMBER_REGEX: 3 digits is not >= 7 and <= 20")
    );
    assert_eq!(report.warnings.len(), 1);
}

#[test]
fn test_audit_collects_every_problem() {
    let dir = TempDir::new().unwrap();
    write_empty_lists(dir.path());
    fs::write(
        dir.path().join(ListName::WatchedCidrs.file_name()),
        "Schema: yaml_cidr\nSchema_version: '2019120601'\nitems:\n- ip: 1.2.3\n",
    )
    .unwrap();
    fs::write(
        dir.path().join(ListName::WatchedAsns.file_name()),
        "Schema: yaml_ns\nSchema_version: '2019120601'\nitems: []\n",
    )
    .unwrap();
    fs::remove_file(dir.path().join(ListName::BlacklistedNses.file_name())).unwrap();

    let report = audit(&Loader::in_dir(dir.path()), &NumberGrammar::standard().unwrap());
    assert_eq!(report.errors.len(), 3);
    assert!(report.to_string().starts_with("3 error(s) have occurred:\n"));
}
