//! Media Backend interface: metadata probing and file retrieval.
//!
//! The orchestrator only depends on the `MediaBackend` trait; the yt-dlp
//! adapter is one implementation of it.

mod fault;
mod ytdlp;

pub use fault::{BackendFault, FaultCode};
pub use ytdlp::YtDlpBackend;

use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;

/// Metadata reported by the backend for one URL, as the backend shapes it.
/// The format resolver turns this into a `ProbeResult`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaInfo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    /// Duration in seconds; some extractors report fractions.
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub filesize_approx: Option<f64>,
    #[serde(default)]
    pub formats: Vec<BackendFormat>,
}

/// One variant as reported by the backend (before viability filtering).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackendFormat {
    pub format_id: String,
    /// Video codec; `"none"` marks an audio-only variant.
    #[serde(default)]
    pub vcodec: Option<String>,
    /// Audio codec; `"none"` marks a video-only variant.
    #[serde(default)]
    pub acodec: Option<String>,
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub format_note: Option<String>,
    #[serde(default)]
    pub filesize: Option<f64>,
    #[serde(default)]
    pub filesize_approx: Option<f64>,
}

/// Probing and fetching. Both calls are fallible and may take arbitrarily long;
/// callers bound them with their own timeout.
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Fetch metadata and the list of available variants.
    async fn probe(&self, url: &str) -> Result<MediaInfo, BackendFault>;

    /// Download `url` in the given variant (`None` = backend default) and
    /// return the produced local files in order. On failure the backend
    /// removes whatever it already wrote.
    async fn fetch(&self, url: &str, format_id: Option<&str>) -> Result<Vec<PathBuf>, BackendFault>;
}
