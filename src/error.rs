//! Error types for the blacklist tooling.
//!
//! Each subsystem owns a focused error enum next to its code
//! ([`EntryError`](crate::blacklist::EntryError),
//! [`ParseError`](crate::blacklist::ParseError),
//! [`StoreError`](crate::blacklist::store::StoreError),
//! [`LoadError`](crate::blacklist::loader::LoadError)). This module holds the
//! crate-level error that wraps them, plus configuration errors.

use std::io;

use thiserror::Error;

use crate::blacklist::loader::LoadError;
use crate::blacklist::store::StoreError;
use crate::grammar::GrammarError;

/// Main error type for blacklist operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("list error: {0}")]
    Store(#[from] StoreError),

    #[error("load error: {0}")]
    Load(#[from] LoadError),

    #[error("number grammar error: {0}")]
    Grammar(#[from] GrammarError),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadFile(#[source] io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
}

/// Validation errors for configuration values.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("number_grammar.minimum_digits must be greater than 0")]
    ZeroMinimumDigits,

    #[error(
        "number_grammar.minimum_digits ({minimum}) must not exceed maximum_digits ({maximum})"
    )]
    InvertedDigitBounds { minimum: usize, maximum: usize },

    #[error("data_dir cannot be empty")]
    EmptyDataDir,

    #[error("list {name:?} has empty file path")]
    EmptyListPath { name: String },
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;
