//! Number pattern grammar.
//!
//! Watched and blacklisted numbers are regex fragments describing phone-style
//! digit sequences. The grammar below is the contract they are audited
//! against: a pattern must contain a run of `MIN..=MAX` digits, optionally led
//! by `+` and separated by non-word characters, bounded by non-digits.
//!
//! Every check runs twice, once with Unicode digit classes and once with
//! ASCII-only classes, and only counts as a match when both agree.

use regex::Regex;
use regex::bytes::{Regex as BytesRegex, RegexBuilder};

/// Default lower bound (inclusive) on the number of digits in a pattern.
pub const NUMBER_REGEX_MINIMUM_DIGITS: usize = 7;

/// Default upper bound (inclusive) on the number of digits in a pattern.
pub const NUMBER_REGEX_MAXIMUM_DIGITS: usize = 20;

/// General number grammar for the default digit bounds.
pub const NUMBER_REGEX: &str = r"(?:^|\D)\+?(?:\d[\W_]*){6,19}\d(?:$|\D)";

/// Start-anchored variant: the digit run must begin the pattern.
pub const NUMBER_REGEX_START: &str = r"^\+?(?:\d[\W_]*){6,19}\d(?:$|\D)";

/// End-anchored variant: the digit run must end the pattern.
pub const NUMBER_REGEX_END: &str = r"(?:^|\D)\+?(?:\d[\W_]*){6,19}\d$";

/// Error building a [`NumberGrammar`].
#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    /// The minimum digit count was zero.
    #[error("minimum digit count must be greater than 0")]
    ZeroMinimum,

    /// The minimum digit count exceeded the maximum.
    #[error("minimum digit count {minimum} exceeds maximum {maximum}")]
    InvertedBounds {
        /// Requested minimum.
        minimum: usize,
        /// Requested maximum.
        maximum: usize,
    },

    /// One of the generated expressions failed to compile.
    #[error("failed to compile number grammar: {0}")]
    Regex(#[from] regex::Error),
}

/// The same expression compiled for Unicode and ASCII digit semantics.
#[derive(Debug, Clone)]
struct DualRegex {
    unicode: Regex,
    ascii: BytesRegex,
}

impl DualRegex {
    fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            unicode: Regex::new(pattern)?,
            // ASCII classes may match arbitrary bytes, which only the bytes API allows.
            ascii: RegexBuilder::new(pattern).unicode(false).build()?,
        })
    }

    fn is_match(&self, text: &str) -> bool {
        self.unicode.is_match(text) && self.ascii.is_match(text.as_bytes())
    }
}

/// Compiled number grammar with its digit-count bounds.
#[derive(Debug, Clone)]
pub struct NumberGrammar {
    minimum_digits: usize,
    maximum_digits: usize,
    general: DualRegex,
    start: DualRegex,
    end: DualRegex,
    digit: Regex,
}

impl NumberGrammar {
    /// Build the grammar for the default bounds
    /// ([`NUMBER_REGEX_MINIMUM_DIGITS`], [`NUMBER_REGEX_MAXIMUM_DIGITS`]).
    ///
    /// # Errors
    ///
    /// Only fails if the regex engine rejects the built-in expressions.
    pub fn standard() -> Result<Self, GrammarError> {
        Self::new(NUMBER_REGEX_MINIMUM_DIGITS, NUMBER_REGEX_MAXIMUM_DIGITS)
    }

    /// Build the grammar for custom inclusive digit bounds.
    ///
    /// # Errors
    ///
    /// Returns [`GrammarError::ZeroMinimum`] or [`GrammarError::InvertedBounds`]
    /// for unusable bounds.
    pub fn new(minimum_digits: usize, maximum_digits: usize) -> Result<Self, GrammarError> {
        if minimum_digits == 0 {
            return Err(GrammarError::ZeroMinimum);
        }
        if minimum_digits > maximum_digits {
            return Err(GrammarError::InvertedBounds {
                minimum: minimum_digits,
                maximum: maximum_digits,
            });
        }

        Ok(Self {
            minimum_digits,
            maximum_digits,
            general: DualRegex::new(&general_pattern(minimum_digits, maximum_digits))?,
            start: DualRegex::new(&start_pattern(minimum_digits, maximum_digits))?,
            end: DualRegex::new(&end_pattern(minimum_digits, maximum_digits))?,
            digit: Regex::new(r"\d")?,
        })
    }

    #[must_use]
    pub const fn minimum_digits(&self) -> usize {
        self.minimum_digits
    }

    #[must_use]
    pub const fn maximum_digits(&self) -> usize {
        self.maximum_digits
    }

    /// Count the (Unicode) digit characters in a pattern.
    #[must_use]
    pub fn digit_count(&self, pattern: &str) -> usize {
        self.digit.find_iter(pattern).count()
    }

    #[must_use]
    pub const fn digits_in_bounds(&self, count: usize) -> bool {
        count >= self.minimum_digits && count <= self.maximum_digits
    }

    /// Whether the pattern matches the general grammar in both digit modes.
    #[must_use]
    pub fn matches(&self, pattern: &str) -> bool {
        self.general.is_match(pattern)
    }

    /// Whether the pattern matches the start-anchored grammar in both modes.
    #[must_use]
    pub fn matches_start(&self, pattern: &str) -> bool {
        self.start.is_match(pattern)
    }

    /// Whether the pattern matches the end-anchored grammar in both modes.
    #[must_use]
    pub fn matches_end(&self, pattern: &str) -> bool {
        self.end.is_match(pattern)
    }
}

fn digit_run(minimum_digits: usize, maximum_digits: usize) -> String {
    // The trailing `\d` accounts for one digit of the run.
    format!(
        r"\+?(?:\d[\W_]*){{{},{}}}\d",
        minimum_digits - 1,
        maximum_digits - 1
    )
}

/// Source of the general grammar for the given bounds.
#[must_use]
pub fn general_pattern(minimum_digits: usize, maximum_digits: usize) -> String {
    format!(r"(?:^|\D){}(?:$|\D)", digit_run(minimum_digits, maximum_digits))
}

/// Source of the start-anchored grammar for the given bounds.
#[must_use]
pub fn start_pattern(minimum_digits: usize, maximum_digits: usize) -> String {
    format!(r"^{}(?:$|\D)", digit_run(minimum_digits, maximum_digits))
}

/// Source of the end-anchored grammar for the given bounds.
#[must_use]
pub fn end_pattern(minimum_digits: usize, maximum_digits: usize) -> String {
    format!(r"(?:^|\D){}$", digit_run(minimum_digits, maximum_digits))
}
