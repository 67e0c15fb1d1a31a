//! Selection payload codec: `q:<token>:<format_id>`, at most 64 bytes.

use crate::error::MalformedCallback;
use crate::store::TOKEN_LEN;

/// Callback payload budget of the chat platform.
pub const MAX_PAYLOAD_BYTES: usize = 64;
/// Payload of the "Download" button in the welcome menu.
pub const START_DOWNLOAD_PAYLOAD: &str = "download";

const PREFIX: &str = "q:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub token: String,
    pub format_id: String,
}

/// `None` when the payload would not fit the budget.
pub fn encode(token: &str, format_id: &str) -> Option<String> {
    let payload = format!("{PREFIX}{token}:{format_id}");
    (payload.len() <= MAX_PAYLOAD_BYTES).then_some(payload)
}

pub fn decode(payload: &str) -> Result<Selection, MalformedCallback> {
    let malformed = || MalformedCallback(payload.to_string());
    let rest = payload.strip_prefix(PREFIX).ok_or_else(malformed)?;
    // Format ids may contain ':'; only the first one separates the token.
    let (token, format_id) = rest.split_once(':').ok_or_else(malformed)?;
    if token.len() != TOKEN_LEN || !token.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(malformed());
    }
    if format_id.is_empty() {
        return Err(malformed());
    }
    Ok(Selection {
        token: token.to_string(),
        format_id: format_id.to_string(),
    })
}
