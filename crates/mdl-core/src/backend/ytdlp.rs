//! yt-dlp adapter: `-J` for probing, `--print after_move:filepath` for fetching.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use super::{BackendFault, FaultCode, MediaBackend, MediaInfo};
use crate::config::MdlConfig;

/// Runs the yt-dlp binary as a child process. The child is killed when the
/// future is dropped, so an outer timeout also stops the transfer.
#[derive(Debug, Clone)]
pub struct YtDlpBackend {
    binary: String,
    cookies_file: Option<PathBuf>,
    download_dir: PathBuf,
    default_format: String,
}

impl YtDlpBackend {
    pub fn new(binary: impl Into<String>, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            cookies_file: None,
            download_dir: download_dir.into(),
            default_format: "best".to_string(),
        }
    }

    pub fn from_config(cfg: &MdlConfig) -> Self {
        Self {
            binary: cfg.ytdlp.binary.clone(),
            cookies_file: cfg.ytdlp.cookies_file.clone(),
            download_dir: cfg.download_dir(),
            default_format: cfg.ytdlp.default_format.clone(),
        }
    }

    pub fn with_cookies_file(mut self, path: Option<PathBuf>) -> Self {
        self.cookies_file = path;
        self
    }

    fn common_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["--no-warnings".into()];
        if let Some(ref cookies) = self.cookies_file {
            args.push("--cookies".into());
            args.push(cookies.clone().into_os_string());
        }
        args
    }

    fn probe_args(&self, url: &str) -> Vec<OsString> {
        let mut args = self.common_args();
        args.push("-J".into());
        args.push(url.into());
        args
    }

    fn fetch_args(&self, url: &str, format_id: Option<&str>, tag: &str) -> Vec<OsString> {
        let template = self
            .download_dir
            .join(format!("{tag}_%(title).30B_%(id)s.%(ext)s"));
        let mut args = self.common_args();
        args.push("-f".into());
        args.push(format_id.unwrap_or(&self.default_format).into());
        args.push("-o".into());
        args.push(template.into_os_string());
        args.extend(
            [
                "--restrict-filenames",
                "--no-simulate",
                "--print",
                "after_move:filepath",
            ]
            .map(OsString::from),
        );
        args.push(url.into());
        args
    }

    async fn run(&self, args: Vec<OsString>) -> Result<std::process::Output, BackendFault> {
        tracing::debug!(binary = %self.binary, ?args, "spawning yt-dlp");
        let output = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| BackendFault::new(format!("could not run {}: {}", self.binary, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::debug!(status = %output.status, stderr = %stderr.trim(), "yt-dlp failed");
            return Err(parse_fault(&stderr));
        }
        Ok(output)
    }
}

#[async_trait]
impl MediaBackend for YtDlpBackend {
    async fn probe(&self, url: &str) -> Result<MediaInfo, BackendFault> {
        let output = self.run(self.probe_args(url)).await?;
        serde_json::from_slice(&output.stdout)
            .map_err(|e| BackendFault::new(format!("yt-dlp returned invalid JSON: {}", e)))
    }

    async fn fetch(&self, url: &str, format_id: Option<&str>) -> Result<Vec<PathBuf>, BackendFault> {
        tokio::fs::create_dir_all(&self.download_dir)
            .await
            .map_err(|e| {
                BackendFault::new(format!(
                    "could not create download dir {}: {}",
                    self.download_dir.display(),
                    e
                ))
            })?;

        let tag = uuid::Uuid::new_v4().simple().to_string()[..8].to_string();
        // Removes `<tag>_*` unless disarmed, including when this future is
        // dropped by an outer timeout.
        let mut partials = PartialFiles::new(&self.download_dir, &tag);
        let output = self.run(self.fetch_args(url, format_id, &tag)).await?;
        let files = parse_printed_paths(&String::from_utf8_lossy(&output.stdout));
        if files.is_empty() {
            return Err(BackendFault::new("yt-dlp finished without producing a file"));
        }
        partials.disarm();
        Ok(files)
    }
}

struct PartialFiles {
    dir: PathBuf,
    prefix: String,
    armed: bool,
}

impl PartialFiles {
    fn new(dir: &Path, tag: &str) -> Self {
        Self {
            dir: dir.to_path_buf(),
            prefix: format!("{tag}_"),
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for PartialFiles {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let dir = std::mem::take(&mut self.dir);
        let prefix = std::mem::take(&mut self.prefix);
        // Directory scans stay off the runtime's worker threads.
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || remove_prefixed_files(&dir, &prefix));
            }
            Err(_) => remove_prefixed_files(&dir, &prefix),
        }
    }
}

/// One path per non-empty stdout line, in the order yt-dlp printed them.
fn parse_printed_paths(stdout: &str) -> Vec<PathBuf> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Best-effort removal of everything a failed fetch left behind.
fn remove_prefixed_files(dir: &Path, prefix: &str) {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), "could not scan download dir: {}", e);
            return;
        }
    };
    for entry in entries.flatten() {
        if !entry.file_name().to_string_lossy().starts_with(prefix) {
            continue;
        }
        let path = entry.path();
        match std::fs::remove_file(&path) {
            Ok(()) => tracing::debug!(path = %path.display(), "removed partial file"),
            Err(e) => tracing::warn!(path = %path.display(), "could not remove partial file: {}", e),
        }
    }
}

/// Turn yt-dlp's stderr into a fault: the last `ERROR:` line is the message,
/// known markers become a `FaultCode`.
pub(crate) fn parse_fault(stderr: &str) -> BackendFault {
    let last_error = stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| l.starts_with("ERROR:"));

    let message = match last_error {
        Some(line) => line.trim_start_matches("ERROR:").trim().to_string(),
        None => {
            let trimmed = stderr.trim();
            if trimmed.is_empty() {
                "yt-dlp exited with an error".to_string()
            } else {
                truncate_chars(trimmed, 300)
            }
        }
    };

    let code = detect_code(&message.to_lowercase());
    BackendFault { code, message }
}

fn detect_code(lower: &str) -> Option<FaultCode> {
    if let Some(status) = http_status(lower) {
        return Some(FaultCode::Http(status));
    }
    if lower.contains("geo restriction")
        || lower.contains("geo-restricted")
        || lower.contains("available in your country")
        || lower.contains("not available from your location")
    {
        return Some(FaultCode::GeoRestricted);
    }
    if lower.contains("private video") {
        return Some(FaultCode::Private);
    }
    if lower.contains("sign in to confirm") || lower.contains("login required") {
        return Some(FaultCode::LoginRequired);
    }
    if lower.contains("video unavailable")
        || lower.contains("has been removed")
        || lower.contains("no longer available")
        || lower.contains("does not exist")
    {
        return Some(FaultCode::Unavailable);
    }
    if lower.contains("timed out") {
        return Some(FaultCode::Timeout);
    }
    None
}

/// Extract `NNN` from `... http error NNN ...`.
fn http_status(lower: &str) -> Option<u16> {
    let rest = &lower[lower.find("http error ")? + "http error ".len()..];
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.len() != 3 {
        return None;
    }
    digits.parse().ok()
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_becomes_code() {
        let f = parse_fault(
            "[youtube] abc: Downloading webpage\nERROR: unable to download video data: HTTP Error 403: Forbidden\n",
        );
        assert_eq!(f.code, Some(FaultCode::Http(403)));
        assert_eq!(f.message, "unable to download video data: HTTP Error 403: Forbidden");
    }

    #[test]
    fn geo_marker_becomes_code() {
        let f = parse_fault(
            "ERROR: [generic] xyz: The uploader has not made this video available in your country",
        );
        assert_eq!(f.code, Some(FaultCode::GeoRestricted));
    }

    #[test]
    fn unavailable_and_private_markers() {
        assert_eq!(
            parse_fault("ERROR: [youtube] a: Video unavailable").code,
            Some(FaultCode::Unavailable)
        );
        assert_eq!(
            parse_fault("ERROR: [youtube] a: Private video. Sign in if you've been granted access").code,
            Some(FaultCode::Private)
        );
    }

    #[test]
    fn unknown_text_has_no_code() {
        let f = parse_fault("ERROR: something odd happened");
        assert_eq!(f.code, None);
        assert_eq!(f.message, "something odd happened");
    }

    #[test]
    fn empty_stderr_gets_generic_message() {
        let f = parse_fault("   \n");
        assert_eq!(f.message, "yt-dlp exited with an error");
        assert_eq!(f.code, None);
    }

    #[test]
    fn fetch_args_pass_format_verbatim() {
        let b = YtDlpBackend::new("yt-dlp", "/tmp/mdl");
        let args = b.fetch_args("https://example.com/v", Some("hls-720p_id"), "deadbeef");
        let pos = args.iter().position(|a| a == "-f").unwrap();
        assert_eq!(args[pos + 1], "hls-720p_id");
        assert_eq!(args.last().unwrap(), "https://example.com/v");
        let out = args.iter().position(|a| a == "-o").unwrap();
        assert!(args[out + 1]
            .to_string_lossy()
            .starts_with("/tmp/mdl/deadbeef_"));
    }

    #[test]
    fn fetch_args_default_format_and_cookies() {
        let b = YtDlpBackend::new("yt-dlp", "/tmp/mdl")
            .with_cookies_file(Some(PathBuf::from("/etc/mdl/cookies.txt")));
        let args = b.fetch_args("https://example.com/v", None, "t");
        let pos = args.iter().position(|a| a == "-f").unwrap();
        assert_eq!(args[pos + 1], "best");
        let c = args.iter().position(|a| a == "--cookies").unwrap();
        assert_eq!(args[c + 1], "/etc/mdl/cookies.txt");
    }

    #[test]
    fn printed_paths_skip_blank_lines() {
        let paths = parse_printed_paths("/tmp/a.mp4\n\n  /tmp/b.mp4  \n");
        assert_eq!(paths, vec![PathBuf::from("/tmp/a.mp4"), PathBuf::from("/tmp/b.mp4")]);
    }

    #[test]
    fn armed_guard_removes_only_its_tag() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("abcd1234_part.mp4"), b"x").unwrap();
        std::fs::write(dir.path().join("other.mp4"), b"y").unwrap();
        drop(PartialFiles::new(dir.path(), "abcd1234"));
        assert!(!dir.path().join("abcd1234_part.mp4").exists());
        assert!(dir.path().join("other.mp4").exists());
    }

    #[tokio::test]
    async fn guard_dropped_on_runtime_cleans_up_in_background() {
        let dir = tempfile::tempdir().unwrap();
        let partial = dir.path().join("abcd1234_part.mp4");
        std::fs::write(&partial, b"x").unwrap();
        drop(PartialFiles::new(dir.path(), "abcd1234"));
        for _ in 0..200 {
            if !partial.exists() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(!partial.exists());
    }

    #[test]
    fn disarmed_guard_keeps_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("abcd1234_done.mp4"), b"x").unwrap();
        let mut guard = PartialFiles::new(dir.path(), "abcd1234");
        guard.disarm();
        drop(guard);
        assert!(dir.path().join("abcd1234_done.mp4").exists());
    }
}
