//! Entry validators.
//!
//! Pure functions that check a candidate value for one list kind and return
//! its normalized form. Surrounding whitespace is trimmed first.

use std::net::Ipv4Addr;
use std::str::FromStr;

use hickory_proto::rr::Name;
use ipnet::Ipv4Net;
use regex::Regex;

use super::{EntryError, EntryKind};

/// Validate `raw` as a value of `kind`.
///
/// # Errors
///
/// Returns the kind-specific [`EntryError`] variant.
pub fn validate(kind: EntryKind, raw: &str) -> Result<String, EntryError> {
    match kind {
        EntryKind::Cidr => cidr(raw),
        EntryKind::Asn => asn(raw),
        EntryKind::Ns => nameserver(raw),
        EntryKind::Number => number_pattern(raw),
    }
}

/// Dotted-quad IPv4 address with an optional `/prefix`.
///
/// # Errors
///
/// Returns [`EntryError::MalformedAddress`].
pub fn cidr(raw: &str) -> Result<String, EntryError> {
    let value = raw.trim();
    let malformed = |reason: String| EntryError::MalformedAddress {
        value: value.to_string(),
        reason,
    };

    let (address, prefix) = match value.split_once('/') {
        Some((address, prefix)) => (address, Some(prefix)),
        None => (value, None),
    };

    let octets: Vec<&str> = address.split('.').collect();
    if octets.len() != 4 {
        return Err(malformed(format!(
            "expected 4 octets, found {}",
            octets.len()
        )));
    }
    for octet in &octets {
        if octet.is_empty() || !octet.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed(format!("octet {octet:?} is not a number")));
        }
        if octet.len() > 3 || octet.parse::<u16>().map_or(true, |n| n > 255) {
            return Err(malformed(format!("octet {octet} is out of range")));
        }
    }
    Ipv4Addr::from_str(address).map_err(|err| malformed(err.to_string()))?;

    if let Some(prefix) = prefix {
        if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed(format!("prefix {prefix:?} is not a number")));
        }
        Ipv4Net::from_str(value)
            .map_err(|_| malformed(format!("prefix {prefix} is not between 0 and 32")))?;
    }

    Ok(value.to_string())
}

/// Positive autonomous-system number, normalized without leading zeros.
///
/// # Errors
///
/// Returns [`EntryError::MalformedAsn`].
pub fn asn(raw: &str) -> Result<String, EntryError> {
    let value = raw.trim();
    let malformed = || EntryError::MalformedAsn {
        value: value.to_string(),
    };

    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    match value.parse::<u32>() {
        Ok(0) | Err(_) => Err(malformed()),
        Ok(number) => Ok(number.to_string()),
    }
}

/// Fully-qualified domain name with a trailing dot.
///
/// The value is kept exactly as written: `EXAMPLE.COM.` and `example.com.`
/// are different entries. Callers wanting case-insensitive lists normalize
/// before insertion.
///
/// # Errors
///
/// Returns [`EntryError::MalformedNameserver`].
pub fn nameserver(raw: &str) -> Result<String, EntryError> {
    let value = raw.trim();
    let malformed = |reason: String| EntryError::MalformedNameserver {
        value: value.to_string(),
        reason,
    };

    let Some(name) = value.strip_suffix('.') else {
        return Err(malformed("must end with a trailing dot".to_string()));
    };
    if name.is_empty() || name.split('.').any(str::is_empty) {
        return Err(malformed("contains an empty label".to_string()));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(malformed(format!("invalid character {bad:?}")));
    }

    // Length limits and label rules.
    Name::from_ascii(value).map_err(|err| malformed(err.to_string()))?;

    Ok(value.to_string())
}

/// Any regex fragment the engine accepts.
///
/// Whether it looks like a phone number is audited separately against the
/// [`NumberGrammar`](crate::grammar::NumberGrammar).
///
/// # Errors
///
/// Returns [`EntryError::MalformedPattern`].
pub fn number_pattern(raw: &str) -> Result<String, EntryError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(EntryError::MalformedPattern {
            value: String::new(),
            source: regex::Error::Syntax("empty pattern".to_string()),
        });
    }
    match Regex::new(value) {
        Ok(_) => Ok(value.to_string()),
        Err(source) => Err(EntryError::MalformedPattern {
            value: value.to_string(),
            source,
        }),
    }
}
