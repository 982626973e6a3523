//! String formats implied by the `email`, `uri`, `date`, `datetime` and
//! `uuid` schema types

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate};
use regex::Regex;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Email,
    Uri,
    Date,
    DateTime,
    Uuid,
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)*$")
            .unwrap_or_else(|e| panic!("email pattern: {}", e))
    })
}

fn uri_regex() -> &'static Regex {
    static URI: OnceLock<Regex> = OnceLock::new();
    URI.get_or_init(|| {
        Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*:[^\s]+$")
            .unwrap_or_else(|e| panic!("uri pattern: {}", e))
    })
}

impl Format {
    pub fn name(&self) -> &'static str {
        match self {
            Format::Email => "email",
            Format::Uri => "uri",
            Format::Date => "date",
            Format::DateTime => "datetime",
            Format::Uuid => "uuid",
        }
    }

    /// Returns true if the decoded string has the format.
    pub fn matches(&self, text: &str) -> bool {
        match self {
            Format::Email => email_regex().is_match(text),
            Format::Uri => uri_regex().is_match(text),
            Format::Date => NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok(),
            Format::DateTime => DateTime::parse_from_rfc3339(text).is_ok(),
            Format::Uuid => Uuid::parse_str(text).is_ok(),
        }
    }
}
