//! Configuration loading and validation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use serde::de::Error as _;

use crate::blacklist::Candidate;
use crate::blacklist::loader::{ListName, ListSource, Loader, Snapshot};
use crate::blacklist::store::Blacklist;
use crate::error::{ConfigError, Result, ValidationError};
use crate::grammar::{NUMBER_REGEX_MAXIMUM_DIGITS, NUMBER_REGEX_MINIMUM_DIGITS, NumberGrammar};

/// Main configuration for the blacklist tooling.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory holding the list files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Per-list file overrides. Relative paths resolve against `data_dir`.
    #[serde(default, deserialize_with = "deserialize_lists")]
    pub lists: HashMap<ListName, PathBuf>,

    /// Digit bounds for number patterns.
    #[serde(default)]
    pub number_grammar: NumberGrammarSettings,
}

/// Digit-count bounds used when auditing number patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NumberGrammarSettings {
    #[serde(default = "default_minimum_digits")]
    pub minimum_digits: usize,

    #[serde(default = "default_maximum_digits")]
    pub maximum_digits: usize,
}

impl Default for NumberGrammarSettings {
    fn default() -> Self {
        Self {
            minimum_digits: default_minimum_digits(),
            maximum_digits: default_maximum_digits(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            lists: HashMap::new(),
            number_grammar: NumberGrammarSettings::default(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}

const fn default_minimum_digits() -> usize {
    NUMBER_REGEX_MINIMUM_DIGITS
}

const fn default_maximum_digits() -> usize {
    NUMBER_REGEX_MAXIMUM_DIGITS
}

fn deserialize_lists<'de, D>(
    deserializer: D,
) -> std::result::Result<HashMap<ListName, PathBuf>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    HashMap::<String, PathBuf>::deserialize(deserializer)?
        .into_iter()
        .map(|(name, path)| {
            name.parse::<ListName>()
                .map(|name| (name, path))
                .map_err(D::Error::custom)
        })
        .collect()
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(ValidationError::EmptyDataDir.into());
        }

        for (name, path) in &self.lists {
            if path.as_os_str().is_empty() {
                return Err(ValidationError::EmptyListPath {
                    name: name.to_string(),
                }
                .into());
            }
        }

        let NumberGrammarSettings {
            minimum_digits,
            maximum_digits,
        } = self.number_grammar;
        if minimum_digits == 0 {
            return Err(ValidationError::ZeroMinimumDigits.into());
        }
        if minimum_digits > maximum_digits {
            return Err(ValidationError::InvertedDigitBounds {
                minimum: minimum_digits,
                maximum: maximum_digits,
            }
            .into());
        }

        Ok(())
    }

    /// Resolved file for a list.
    #[must_use]
    pub fn list_path(&self, name: ListName) -> PathBuf {
        match self.lists.get(&name) {
            Some(path) => self.data_dir.join(path),
            None => self.data_dir.join(name.file_name()),
        }
    }

    /// Every list with its resolved file, in [`ListName::ALL`] order.
    #[must_use]
    pub fn list_sources(&self) -> Vec<ListSource> {
        ListName::ALL
            .into_iter()
            .map(|name| ListSource::new(name, self.list_path(name)))
            .collect()
    }

    /// Loader over every configured list.
    #[must_use]
    pub fn loader(&self) -> Loader {
        Loader::new(self.list_sources())
    }

    /// Compile the number grammar for the configured bounds.
    pub fn number_grammar(&self) -> Result<NumberGrammar> {
        Ok(NumberGrammar::new(
            self.number_grammar.minimum_digits,
            self.number_grammar.maximum_digits,
        )?)
    }

    /// Store for a single configured list.
    #[must_use]
    pub fn open_list(&self, name: ListName) -> Blacklist {
        Blacklist::new(self.list_path(name), name.kind())
    }

    /// Append an entry to a configured list.
    pub fn add_entry(&self, name: ListName, candidate: impl Into<Candidate>) -> Result<()> {
        self.open_list(name).add(candidate)?;
        Ok(())
    }

    /// Delete the active entry with this value from a configured list.
    pub fn remove_entry(&self, name: ListName, candidate: impl Into<Candidate>) -> Result<()> {
        self.open_list(name).remove(candidate)?;
        Ok(())
    }

    /// Load every configured list into a fresh snapshot.
    pub fn load_blacklists(&self) -> Result<Arc<Snapshot>> {
        Ok(self.loader().load_blacklists()?)
    }
}
