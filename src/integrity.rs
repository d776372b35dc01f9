//! Auditing of the reference data.
//!
//! Unlike loading, which stops at the first bad list, every check here runs
//! to completion and collects all problems so that one run surfaces the full
//! picture. Hard errors and "cannot match exactly" warnings are kept apart:
//! a report without hard errors passes even when it carries warnings.

use std::collections::HashMap;
use std::fmt;
use std::fs;

use crate::blacklist::EntryKind;
use crate::blacklist::loader::{ListName, ListSource, Loader};
use crate::blacklist::store::StoreError;
use crate::grammar::NumberGrammar;

/// Check every list file for schema, validation and hygiene problems.
///
/// Returns one `"{file}: {message}"` line per problem; empty means clean.
pub fn blacklist_integrity_check(sources: &[ListSource]) -> Vec<String> {
    let mut errors = Vec::new();
    // Active values per kind: value -> (file, item position).
    let mut seen: HashMap<EntryKind, HashMap<String, (String, usize)>> = HashMap::new();

    for source in sources {
        let file = source.path.display().to_string();

        match fs::read(&source.path) {
            Ok(bytes) => errors.extend(
                hygiene_problems(&bytes)
                    .into_iter()
                    .map(|problem| format!("{file}: {problem}")),
            ),
            Err(err) => {
                errors.push(format!("{file}: {err}"));
                continue;
            }
        }

        let mut store = source.open();
        if let Err(err) = store.validate() {
            errors.push(format!("{file}: {}", err_message(&err)));
            continue;
        }

        let entries = match store.entries() {
            Ok(entries) => entries,
            Err(err) => {
                errors.push(format!("{file}: {}", err_message(&err)));
                continue;
            }
        };

        let values = seen.entry(source.name.kind()).or_default();
        for (index, entry) in entries.iter().enumerate() {
            if !entry.is_active() {
                continue;
            }
            let position = index + 1;
            match values.get(&entry.value) {
                Some((other_file, other_position)) => errors.push(format!(
                    "{file}: item {position}: duplicate entry {:?} (also {other_file} item {other_position})",
                    entry.value
                )),
                None => {
                    values.insert(entry.value.clone(), (file.clone(), position));
                }
            }
        }
    }

    tracing::debug!(files = sources.len(), errors = errors.len(), "blacklist integrity checked");
    errors
}

/// Store errors already carry the path; report only what follows it.
fn err_message(err: &StoreError) -> String {
    match err {
        StoreError::Parse { source, .. } => source.to_string(),
        StoreError::Io { source, .. } => source.to_string(),
        other => other.to_string(),
    }
}

fn hygiene_problems(bytes: &[u8]) -> Vec<String> {
    let mut problems = Vec::new();

    let mut dos_lines = bytes
        .split(|b| *b == b'\n')
        .enumerate()
        .filter(|(_, line)| line.ends_with(b"\r"))
        .map(|(index, _)| index + 1);
    if let Some(first) = dos_lines.next() {
        let count = 1 + dos_lines.count();
        if count > 1 {
            problems.push(format!(
                "line {first}: DOS line ending ({count} lines in total)"
            ));
        } else {
            problems.push(format!("line {first}: DOS line ending"));
        }
    }
    if !bytes.is_empty() && !bytes.ends_with(b"\n") {
        problems.push("no newline at end of file".to_string());
    }

    problems
}

/// Outcome of auditing number patterns.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NumberReport {
    /// Patterns that break the grammar or the digit bounds.
    pub errors: Vec<String>,
    /// Patterns that cannot participate in an exact match.
    pub no_exacts: Vec<String>,
}

/// Audit one list of patterns; `label` is `"watched"` or `"blacklisted"`.
pub fn check_number_list(
    grammar: &NumberGrammar,
    label: &str,
    patterns: &[String],
    report: &mut NumberReport,
) {
    for (index, pattern) in patterns.iter().enumerate() {
        let position = index + 1;
        let digits = grammar.digit_count(pattern);
        let in_bounds = grammar.digits_in_bounds(digits);
        let digit_text = if in_bounds {
            format!(" ({digits} digits is OK)")
        } else {
            format!(
                ": {digits} digits is not >= {} and <= {}",
                grammar.minimum_digits(),
                grammar.maximum_digits()
            )
        };

        if !in_bounds || !grammar.matches(pattern) {
            report.errors.push(format!(
                "{label} number ({position}): fails NUMBER_REGEX{digit_text}::{pattern}"
            ));
            continue;
        }

        let mut reasons = String::new();
        if !grammar.matches_start(pattern) {
            reasons.push_str(" Does not match NUMBER_REGEX_START.");
        }
        if !grammar.matches_end(pattern) {
            reasons.push_str(" Does not match NUMBER_REGEX_END.");
        }
        if !reasons.is_empty() {
            report.no_exacts.push(format!(
                "{label} number ({position}):{reasons}{digit_text}::{pattern}"
            ));
        }
    }
}

/// Audit watched then blacklisted patterns.
#[must_use]
pub fn number_integrity_check(
    grammar: &NumberGrammar,
    watched: &[String],
    blacklisted: &[String],
) -> NumberReport {
    let mut report = NumberReport::default();
    check_number_list(grammar, ListName::WatchedNumbers.severity(), watched, &mut report);
    check_number_list(
        grammar,
        ListName::BlacklistedNumbers.severity(),
        blacklisted,
        &mut report,
    );
    report
}

/// Consolidated result of a full audit.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AuditReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl AuditReport {
    /// `true` when there are no hard errors; warnings do not fail a run.
    #[must_use]
    pub fn is_pass(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for AuditReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.errors.is_empty() {
            writeln!(f, "{} error(s) have occurred:", self.errors.len())?;
            for error in &self.errors {
                writeln!(f, "\t{error}")?;
            }
        }
        if !self.warnings.is_empty() {
            writeln!(f, "{} pattern(s) can't match exactly:", self.warnings.len())?;
            for warning in &self.warnings {
                writeln!(f, "\t{warning}")?;
            }
        }
        Ok(())
    }
}

/// Run both checks over every list known to `loader`.
///
/// Number lists that cannot be read are already reported by the blacklist
/// check and are skipped by the pattern check.
#[must_use]
pub fn audit(loader: &Loader, grammar: &NumberGrammar) -> AuditReport {
    let mut errors = blacklist_integrity_check(loader.sources());

    let patterns = |name: ListName| match loader.active_values(name) {
        Ok(values) => values,
        Err(err) => {
            tracing::debug!(error = %err, "skipping pattern audit of unreadable list");
            Vec::new()
        }
    };
    let numbers = number_integrity_check(
        grammar,
        &patterns(ListName::WatchedNumbers),
        &patterns(ListName::BlacklistedNumbers),
    );
    errors.extend(numbers.errors);

    let report = AuditReport {
        errors,
        warnings: numbers.no_exacts,
    };
    if report.is_pass() {
        tracing::info!(warnings = report.warnings.len(), "audit passed");
    } else {
        tracing::warn!(
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            "audit failed"
        );
    }
    report
}
