//! Blacklists - curated watch/blacklists for a moderation pipeline.
//!
//! The lists classify incoming content as "watched" or "blacklisted" by the
//! IP ranges, autonomous systems, nameservers and phone-style numbers it
//! references. Every list is a schema-validated YAML document; this crate
//! reads, edits and audits them.
//!
//! # Architecture
//!
//! - [`blacklist`]: entry validators, schema parsers, the per-file store, the
//!   snapshot loader and change detection
//! - [`grammar`]: the number pattern grammar and its digit bounds
//! - [`integrity`]: exhaustive auditing of every list
//! - [`config`]: configuration loading and validation
//! - [`error`]: crate-level error types
//!
//! # Example
//!
//! ```rust
//! use blacklists::grammar::NumberGrammar;
//! use blacklists::integrity::number_integrity_check;
//!
//! let grammar = NumberGrammar::standard().unwrap();
//! let report = number_integrity_check(&grammar, &["1-800-555-0199".to_string()], &[]);
//! assert!(report.errors.is_empty());
//! assert!(report.no_exacts.is_empty());
//! ```

pub mod blacklist;
pub mod config;
pub mod error;
pub mod grammar;
pub mod integrity;

pub use config::Config;
pub use error::{Error, Result};
