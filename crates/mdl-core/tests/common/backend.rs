//! Media backend fake driven by per-URL scripts.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use mdl_core::backend::{BackendFault, BackendFormat, MediaBackend, MediaInfo};

use super::{Event, Journal};

#[derive(Debug, Clone)]
pub enum FetchScript {
    /// Write `count` files of `size` bytes each.
    Files { count: usize, size: usize },
    Fault(BackendFault),
}

impl Default for FetchScript {
    fn default() -> Self {
        FetchScript::Files { count: 1, size: 64 }
    }
}

pub struct ScriptedBackend {
    journal: Journal,
    dir: PathBuf,
    probes: Mutex<HashMap<String, Result<MediaInfo, BackendFault>>>,
    fetches: Mutex<HashMap<String, FetchScript>>,
    probe_delays: Mutex<HashMap<String, Duration>>,
    fetch_delays: Mutex<HashMap<String, Duration>>,
}

impl ScriptedBackend {
    pub fn new(journal: Journal, dir: &Path) -> Self {
        Self {
            journal,
            dir: dir.to_path_buf(),
            probes: Mutex::new(HashMap::new()),
            fetches: Mutex::new(HashMap::new()),
            probe_delays: Mutex::new(HashMap::new()),
            fetch_delays: Mutex::new(HashMap::new()),
        }
    }

    pub fn on_probe(&self, url: &str, result: Result<MediaInfo, BackendFault>) {
        self.probes.lock().unwrap().insert(url.to_string(), result);
    }

    pub fn on_fetch(&self, url: &str, script: FetchScript) {
        self.fetches.lock().unwrap().insert(url.to_string(), script);
    }

    pub fn delay_probe(&self, url: &str, d: Duration) {
        self.probe_delays.lock().unwrap().insert(url.to_string(), d);
    }

    pub fn delay_fetch(&self, url: &str, d: Duration) {
        self.fetch_delays.lock().unwrap().insert(url.to_string(), d);
    }

    /// Files left in the download dir.
    pub fn leftovers(&self) -> Vec<PathBuf> {
        std::fs::read_dir(&self.dir)
            .unwrap()
            .flatten()
            .map(|e| e.path())
            .collect()
    }
}

#[async_trait]
impl MediaBackend for ScriptedBackend {
    async fn probe(&self, url: &str) -> Result<MediaInfo, BackendFault> {
        let delay = self.probe_delays.lock().unwrap().get(url).copied();
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
        self.probes
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| Ok(MediaInfo::default()))
    }

    async fn fetch(&self, url: &str, format_id: Option<&str>) -> Result<Vec<PathBuf>, BackendFault> {
        self.journal.push(Event::FetchStarted {
            url: url.to_string(),
            format_id: format_id.map(str::to_string),
        });
        let delay = self.fetch_delays.lock().unwrap().get(url).copied();
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
        let script = self
            .fetches
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_default();
        self.journal.push(Event::FetchFinished {
            url: url.to_string(),
        });
        match script {
            FetchScript::Fault(f) => Err(f),
            FetchScript::Files { count, size } => {
                let stem = url.rsplit('/').next().unwrap_or("media");
                let mut out = Vec::new();
                for i in 0..count {
                    let path = self.dir.join(format!("{stem}_{i}.mp4"));
                    std::fs::write(&path, vec![0u8; size]).unwrap();
                    out.push(path);
                }
                Ok(out)
            }
        }
    }
}

/// A variant with both tracks, labelled by height.
pub fn av(id: &str, height: u32, size: f64) -> BackendFormat {
    BackendFormat {
        format_id: id.to_string(),
        vcodec: Some("avc1".into()),
        acodec: Some("mp4a".into()),
        height: Some(height),
        filesize: (size > 0.0).then_some(size),
        ..Default::default()
    }
}

pub fn info(formats: Vec<BackendFormat>) -> MediaInfo {
    MediaInfo {
        title: Some("Test clip".into()),
        duration: Some(125.0),
        filesize_approx: Some(3.0 * 1024.0 * 1024.0),
        formats,
        ..Default::default()
    }
}
