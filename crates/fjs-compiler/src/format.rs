//! # String Formats
//!
//! The `format` values the runtime checks. Any other format name is
//! accepted without a check (the compiler logs a warning).
//!
//! Dates and times are parsed with `chrono`, IP addresses with `std::net`,
//! URIs with `url`, and `regex` with the same engine used for `pattern`.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime};
use regex::Regex;
use url::Url;

/// Format names with a runtime check.
pub const KNOWN_FORMATS: &[&str] = &[
    "date-time",
    "date",
    "time",
    "email",
    "hostname",
    "ipv4",
    "ipv6",
    "uri",
    "regex",
];

/// Whether `name` has a runtime check.
pub fn is_known(name: &str) -> bool {
    KNOWN_FORMATS.contains(&name)
}

/// Whether `value` conforms to `format`. Unknown formats always conform.
pub fn conforms(format: &str, value: &str) -> bool {
    match format {
        "date-time" => DateTime::parse_from_rfc3339(value).is_ok(),
        "date" => is_date(value),
        "time" => is_time(value),
        "email" => is_email(value),
        "hostname" => is_hostname(value),
        "ipv4" => Ipv4Addr::from_str(value).is_ok(),
        "ipv6" => Ipv6Addr::from_str(value).is_ok(),
        "uri" => Url::parse(value).is_ok(),
        "regex" => Regex::new(value).is_ok(),
        _ => true,
    }
}

fn is_date(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

/// `HH:MM:SS[.fraction][Z|±HH:MM]`.
fn is_time(value: &str) -> bool {
    let local = if let Some(local) = value.strip_suffix(['Z', 'z']) {
        local
    } else if value.len() >= 14 && matches!(value.as_bytes()[value.len() - 6], b'+' | b'-') {
        let (local, offset) = value.split_at(value.len() - 6);
        if !is_offset(&offset[1..]) {
            return false;
        }
        local
    } else {
        value
    };
    let bytes = local.as_bytes();
    bytes.len() >= 8
        && bytes[2] == b':'
        && bytes[5] == b':'
        && NaiveTime::parse_from_str(local, "%H:%M:%S%.f").is_ok()
}

fn is_offset(offset: &str) -> bool {
    let bytes = offset.as_bytes();
    bytes.len() == 5
        && bytes[2] == b':'
        && bytes[..2].iter().chain(&bytes[3..]).all(u8::is_ascii_digit)
        && offset[..2].parse::<u8>().is_ok_and(|h| h < 24)
        && offset[3..].parse::<u8>().is_ok_and(|m| m < 60)
}

fn is_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !value.chars().any(char::is_whitespace)
}

/// RFC 1123 host names: labels of 1-63 letters, digits and hyphens, not
/// starting or ending with a hyphen; 253 characters at most.
fn is_hostname(value: &str) -> bool {
    let name = value.strip_suffix('.').unwrap_or(value);
    !name.is_empty()
        && name.len() <= 253
        && name.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
        })
}
