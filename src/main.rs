//! Blacklist maintenance CLI.
//!
//! Audits, inspects and edits the watched/blacklisted list files used by the
//! classification pipeline.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use blacklists::Config;
use blacklists::blacklist::loader::ListName;
use blacklists::blacklist::store::Blacklist;
use blacklists::blacklist::{Candidate, EntryKind};
use blacklists::integrity;

const DEFAULT_CONFIG_PATH: &str = "blacklists.toml";

#[derive(Parser, Debug)]
#[command(name = "blacklists")]
#[command(about = "Maintain and audit watched/blacklisted CIDRs, ASNs, nameservers and numbers")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "CONFIG_PATH")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Audit every list; exits with status 1 on hard errors
    Check,

    /// Load every list and print the number of active entries
    Load,

    /// Print the active values of a list
    List {
        list: ListName,
    },

    /// Append an entry to a list
    Add {
        list: ListName,
        value: String,
        /// Free-text comment stored with the entry
        #[arg(long)]
        comment: Option<String>,
        /// Store the entry disabled
        #[arg(long)]
        disable: bool,
    },

    /// Delete the active entry with this value from a list
    Remove {
        list: ListName,
        value: String,
    },

    /// Validate a single list file
    Validate {
        file: PathBuf,
        /// Entry kind (cidr, asn, ns, number)
        #[arg(short, long)]
        kind: EntryKind,
    },

    /// Reload when a whitespace-separated file listing touches a list file
    Changed { diff: String },
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            Config::load(DEFAULT_CONFIG_PATH).context("Failed to load configuration")
        }
        None => {
            debug!("no configuration file, using defaults");
            Ok(Config::default())
        }
    }
}

fn run(args: Args) -> Result<ExitCode> {
    let config = load_config(args.config.as_deref())?;
    debug!(data_dir = %config.data_dir.display(), "configuration loaded");

    match args.command {
        Command::Check => {
            let grammar = config
                .number_grammar()
                .context("Failed to build number grammar")?;
            let report = integrity::audit(&config.loader(), &grammar);
            print!("{report}");
            if report.is_pass() {
                println!("All lists passed.");
                return Ok(ExitCode::SUCCESS);
            }
            return Ok(ExitCode::FAILURE);
        }
        Command::Load => {
            let snapshot = config.load_blacklists().context("Failed to load lists")?;
            for (name, count) in snapshot.stats() {
                println!("{name}: {count}");
            }
        }
        Command::List { list } => {
            let values = config
                .loader()
                .active_values(list)
                .with_context(|| format!("Failed to read {list}"))?;
            for value in values {
                println!("{value}");
            }
        }
        Command::Add {
            list,
            value,
            comment,
            disable,
        } => {
            let mut candidate = Candidate::record(value);
            if let Some(comment) = comment {
                candidate = candidate.with_comment(comment);
            }
            if disable {
                candidate = candidate.disabled();
            }
            config
                .add_entry(list, candidate)
                .with_context(|| format!("Failed to add entry to {list}"))?;
            info!(list = %list, "entry added");
        }
        Command::Remove { list, value } => {
            config
                .remove_entry(list, value)
                .with_context(|| format!("Failed to remove entry from {list}"))?;
            info!(list = %list, "entry removed");
        }
        Command::Validate { file, kind } => {
            let active = Blacklist::new(&file, kind)
                .validate()
                .with_context(|| format!("{} is not a valid {kind} list", file.display()))?;
            println!("{}: {active} active entries", file.display());
        }
        Command::Changed { diff } => {
            let reloaded = config
                .loader()
                .reload_if_changed(&diff, &config.data_dir)
                .context("Failed to reload lists")?;
            println!("{}", if reloaded { "changed" } else { "unchanged" });
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
