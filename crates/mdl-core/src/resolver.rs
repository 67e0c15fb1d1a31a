//! Format resolver: turns backend metadata into the options a user may pick.

use std::collections::HashSet;

use crate::backend::{BackendFormat, MediaBackend, MediaInfo};
use crate::error::ProbeError;

/// Assumed total size when the backend reports none (informational only).
pub const DEFAULT_SIZE_BYTES: u64 = 10 * 1024 * 1024;
/// Assumed duration when the backend reports none (informational only).
pub const DEFAULT_DURATION_SECS: u64 = 600;

/// One selectable variant. `format_id` goes back to the backend untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOption {
    pub format_id: String,
    pub label: String,
    /// 0 when the backend did not say.
    pub approx_size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub title: String,
    pub thumbnail_url: Option<String>,
    pub duration_secs: u64,
    pub approx_size_bytes: u64,
    /// Viable variants in backend order. Empty means "use the backend default".
    pub formats: Vec<FormatOption>,
}

/// Probe `url` and keep only variants that carry both video and audio.
pub async fn resolve(backend: &dyn MediaBackend, url: &str) -> Result<ProbeResult, ProbeError> {
    let info = backend
        .probe(url)
        .await
        .map_err(|cause| ProbeError { cause })?;
    let result = normalize(info);
    tracing::debug!(
        url,
        viable = result.formats.len(),
        size = result.approx_size_bytes,
        "probe resolved"
    );
    Ok(result)
}

pub fn normalize(info: MediaInfo) -> ProbeResult {
    let mut seen = HashSet::new();
    let formats = info
        .formats
        .iter()
        .filter(|f| is_viable(f))
        .filter(|f| seen.insert(f.format_id.clone()))
        .map(to_option)
        .collect();

    ProbeResult {
        title: info
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| "Unknown".to_string()),
        thumbnail_url: info.thumbnail.filter(|t| !t.is_empty()),
        duration_secs: info
            .duration
            .filter(|d| d.is_finite() && *d > 0.0)
            .map(|d| d.round() as u64)
            .unwrap_or(DEFAULT_DURATION_SECS),
        approx_size_bytes: info
            .filesize_approx
            .and_then(bytes)
            .unwrap_or(DEFAULT_SIZE_BYTES),
        formats,
    }
}

fn has_track(codec: &Option<String>) -> bool {
    matches!(codec.as_deref(), Some(c) if !c.is_empty() && c != "none")
}

fn is_viable(f: &BackendFormat) -> bool {
    !f.format_id.is_empty() && has_track(&f.vcodec) && has_track(&f.acodec)
}

fn bytes(v: f64) -> Option<u64> {
    (v.is_finite() && v > 0.0).then(|| v.round() as u64)
}

fn to_option(f: &BackendFormat) -> FormatOption {
    let base = f
        .resolution
        .clone()
        .filter(|r| !r.is_empty())
        .or_else(|| f.height.map(|h| format!("{h}p")))
        .unwrap_or_else(|| f.format_id.clone());
    let label = match f.format_note.as_deref() {
        Some(note) if !note.is_empty() && note != base => format!("{base} ({note})"),
        _ => base,
    };
    FormatOption {
        format_id: f.format_id.clone(),
        label,
        approx_size_bytes: f
            .filesize
            .and_then(bytes)
            .or_else(|| f.filesize_approx.and_then(bytes))
            .unwrap_or(0),
    }
}
