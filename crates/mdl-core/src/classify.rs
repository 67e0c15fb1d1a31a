//! Failure classifier: maps a backend fault to the message the user sees.
//!
//! Machine-readable codes win; message text is only consulted when the
//! backend could not attach a code (or attached one with no fixed mapping).

use crate::backend::{BackendFault, FaultCode};

pub const GEO_MESSAGE: &str =
    "⚠️ This video is not available in the bot's region or requires special access.";
pub const NOT_FOUND_MESSAGE: &str = "⚠️ Error: The video was not found or has been removed.";
pub const ACCESS_DENIED_MESSAGE: &str =
    "⚠️ Error: Access denied. The video might be private or restricted.";

/// Category of a probe or fetch failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureClass {
    GeoOrAccessLocked,
    NotFoundOrRemoved,
    AccessDenied,
    /// Anything else; carries the backend's own description.
    Unclassified(String),
}

impl FailureClass {
    pub fn user_message(&self) -> String {
        match self {
            FailureClass::GeoOrAccessLocked => GEO_MESSAGE.to_string(),
            FailureClass::NotFoundOrRemoved => NOT_FOUND_MESSAGE.to_string(),
            FailureClass::AccessDenied => ACCESS_DENIED_MESSAGE.to_string(),
            FailureClass::Unclassified(detail) => format!("⚠️ Error: {}", detail),
        }
    }
}

pub fn classify(fault: &BackendFault) -> FailureClass {
    if let Some(class) = fault.code.and_then(classify_code) {
        return class;
    }
    classify_text(&fault.message)
}

fn classify_code(code: FaultCode) -> Option<FailureClass> {
    match code {
        FaultCode::GeoRestricted | FaultCode::Http(451) => Some(FailureClass::GeoOrAccessLocked),
        FaultCode::Unavailable | FaultCode::Http(404) | FaultCode::Http(410) => {
            Some(FailureClass::NotFoundOrRemoved)
        }
        FaultCode::Private
        | FaultCode::LoginRequired
        | FaultCode::Http(401)
        | FaultCode::Http(403) => Some(FailureClass::AccessDenied),
        FaultCode::Timeout | FaultCode::Http(_) => None,
    }
}

const GEO_TERMS: &[&str] = &["geo", "geoblocked", "georestricted", "region", "country"];
const NOT_FOUND_TERMS: &[&str] = &[
    "not found",
    "removed",
    "unavailable",
    "http error 404",
    "http error 410",
];
const ACCESS_TERMS: &[&str] = &[
    "forbidden",
    "access denied",
    "http error 401",
    "http error 403",
    "private",
    "permission",
];

/// Lowercase alphanumeric words, so terms never match inside ids, URLs or
/// longer words.
fn words(message: &str) -> Vec<String> {
    message
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// `term` is one or more space-separated words that must appear consecutively.
fn has_term(words: &[String], term: &str) -> bool {
    let needle: Vec<&str> = term.split(' ').collect();
    words
        .windows(needle.len())
        .any(|w| w.iter().zip(&needle).all(|(a, b)| a == b))
}

fn classify_text(message: &str) -> FailureClass {
    let words = words(message);
    let has = |terms: &[&str]| terms.iter().any(|t| has_term(&words, t));

    if has(GEO_TERMS) {
        FailureClass::GeoOrAccessLocked
    } else if has(NOT_FOUND_TERMS) {
        FailureClass::NotFoundOrRemoved
    } else if has(ACCESS_TERMS) {
        FailureClass::AccessDenied
    } else {
        FailureClass::Unclassified(message.to_string())
    }
}
