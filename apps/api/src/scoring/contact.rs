//! Contact Extractor: best-effort email and candidate-name heuristics.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const NOT_FOUND: &str = "Not found";

/// A first line with this many tokens or more is assumed not to be a name.
const MAX_NAME_TOKENS: usize = 5;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\w.-]+@[\w.-]+\.[[:alpha:]]+").expect("valid email regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub name: String,
    pub email: String,
}

impl Default for ContactInfo {
    fn default() -> Self {
        Self {
            name: NOT_FOUND.to_string(),
            email: NOT_FOUND.to_string(),
        }
    }
}

pub fn extract_contact(text: &str) -> ContactInfo {
    let mut info = ContactInfo::default();
    if text.is_empty() {
        return info;
    }

    if let Some(email) = extract_email(text) {
        info.email = email;
    }
    if let Some(name) = guess_name(text) {
        info.name = name;
    }
    info
}

/// First email-shaped substring, scanning top to bottom, left to right.
pub fn extract_email(text: &str) -> Option<String> {
    EMAIL_RE.find(text).map(|m| m.as_str().to_string())
}

/// The first non-empty line if it is short and has no `@`; otherwise the
/// second non-empty line, unvalidated.
pub fn guess_name(text: &str) -> Option<String> {
    let mut lines = text.split('\n').map(str::trim).filter(|l| !l.is_empty());

    let first = lines.next()?;
    if first.split_whitespace().count() < MAX_NAME_TOKENS && !first.contains('@') {
        return Some(first.to_string());
    }
    lines.next().map(str::to_string)
}
