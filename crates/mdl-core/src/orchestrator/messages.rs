//! User-facing texts.

use crate::queue::QueueTicket;

pub const INVALID_URL: &str = "⚠️ Please send a valid URL";
pub const DOWNLOAD_USAGE: &str = "⚠️ Usage: /download <URL>";
pub const INVALID_SELECTION: &str = "⚠️ Invalid selection.";
pub const VIDEO_NOT_FOUND: &str = "⚠️ Error: Video not found.";
pub const PROCESSING: &str = "Processing...";
pub const DOWNLOADING: &str = "📥 Downloading, please wait...";
pub const SENDING: &str = "📤 Sending, please wait...";
pub const COMPLETE: &str = "✅ Download complete! 🎥";
pub const SEND_FAILED: &str = "⚠️ Error sending the video.";
pub const SELECT_QUALITY: &str = "📥 Select the quality you want:";
pub const STORAGE_UNAVAILABLE: &str =
    "⚠️ Could not prepare the quality menu right now. Please try again later.";
pub const QUEUE_UNAVAILABLE: &str =
    "⚠️ The download queue is not accepting requests right now. Please try again later.";
pub const GATED: &str = "⚠️ Every available quality of this video exceeds the size limit for your account.";
pub const NOT_AUTHORIZED: &str = "⛔ You are not authorized to use this command.";
pub const EXPORT_FAILED: &str = "⚠️ Export failed, see the bot log for details.";
pub const GENERIC_ERROR: &str = "⚠️ An error occurred while processing your request.";
pub const STORAGE_LOOKUP_FAILED: &str =
    "⚠️ Could not look up this selection right now. Please try again later.";
pub const WELCOME: &str = "Welcome! Choose an option:";
pub const WELCOME_GROUP: &str = "👋 Hello Group! Use /download to start downloading videos.";
pub const DOWNLOAD_BUTTON: &str = "Download";
pub const SEND_LINK: &str = "Send me a video or audio link, and I will try to download it.";

const MIB: f64 = 1024.0 * 1024.0;

pub fn size_mb(bytes: u64) -> f64 {
    bytes as f64 / MIB
}

fn plural(n: u64, unit: &str) -> String {
    if n > 1 {
        format!("{n} {unit}s")
    } else {
        format!("{n} {unit}")
    }
}

/// `3725` → `"1 hr 2 mins 5 secs"`.
pub fn format_time(seconds: u64) -> String {
    let hrs = seconds / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hrs > 0 {
        format!("{} {} {}", plural(hrs, "hr"), plural(mins, "min"), plural(secs, "sec"))
    } else if mins > 0 {
        format!("{} {}", plural(mins, "min"), plural(secs, "sec"))
    } else {
        plural(secs, "sec")
    }
}

pub fn video_info(size_bytes: u64, duration_secs: u64) -> String {
    format!(
        "📂 Video Information:\nFile Size: {:.2} MB\n⏱ Duration: {}\n⌛ Estimated Time to Receive: Calculating...",
        size_mb(size_bytes),
        format_time(duration_secs)
    )
}

/// Caption of the quality menu when a thumbnail is shown.
pub fn prompt_caption(title: &str, size_bytes: u64, duration_secs: u64) -> String {
    format!(
        "{SELECT_QUALITY}\n\n🎥 Title: {title}\n📂 File Size: {:.2} MB\n⏱ Duration: {}",
        size_mb(size_bytes),
        format_time(duration_secs)
    )
}

pub fn option_label(label: &str, size_bytes: u64, show_size: bool) -> String {
    if show_size {
        format!("{label} - {:.2} MB", size_mb(size_bytes))
    } else {
        label.to_string()
    }
}

pub fn queued(ticket: QueueTicket) -> String {
    format!("📥 Your request has been added to the queue. Your position: {ticket}. Please wait...")
}

pub fn too_large(size_bytes: u64, limit_bytes: u64) -> String {
    format!(
        "⚠️ The file is too large to send ({:.2} MB, limit {:.2} MB).",
        size_mb(size_bytes),
        size_mb(limit_bytes)
    )
}

/// Tip for hosts whose tracking parameters tend to break extraction.
pub fn clean_url_tip(url: &url::Url, hosts: &[String]) -> Option<String> {
    let host = url.host_str()?;
    let matches = hosts
        .iter()
        .any(|h| host == h || host.ends_with(&format!(".{h}")));
    if !matches {
        return None;
    }
    let raw = url.as_str();
    let base = raw.split(['?', '&', '#']).next().unwrap_or(raw);
    Some(format!(
        "👀 Heads up! For smoother downloads, use a clean URL like:\n\n{base}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_time_pluralizes() {
        assert_eq!(format_time(0), "0 sec");
        assert_eq!(format_time(1), "1 sec");
        assert_eq!(format_time(59), "59 secs");
        assert_eq!(format_time(61), "1 min 1 sec");
        assert_eq!(format_time(600), "10 mins 0 sec");
        assert_eq!(format_time(3725), "1 hr 2 mins 5 secs");
        assert_eq!(format_time(7200), "2 hrs 0 min 0 sec");
    }

    #[test]
    fn video_info_mentions_size_and_duration() {
        let text = video_info(10 * 1024 * 1024, 600);
        assert!(text.contains("File Size: 10.00 MB"));
        assert!(text.contains("Duration: 10 mins 0 sec"));
        assert!(text.ends_with("Calculating..."));
    }

    #[test]
    fn option_label_size_toggle() {
        assert_eq!(option_label("720p", 1024 * 1024, true), "720p - 1.00 MB");
        assert_eq!(option_label("720p", 1024 * 1024, false), "720p");
    }

    #[test]
    fn clean_tip_only_for_listed_hosts() {
        let hosts = vec!["faphouse.com".to_string()];
        let u = url::Url::parse("https://www.faphouse.com/videos/abc?utm=1&ref=2").unwrap();
        assert_eq!(
            clean_url_tip(&u, &hosts).unwrap(),
            "👀 Heads up! For smoother downloads, use a clean URL like:\n\nhttps://www.faphouse.com/videos/abc"
        );
        let other = url::Url::parse("https://example.com/v?x=1").unwrap();
        assert!(clean_url_tip(&other, &hosts).is_none());
        let lookalike = url::Url::parse("https://notfaphouse.com/v").unwrap();
        assert!(clean_url_tip(&lookalike, &hosts).is_none());
    }

    #[test]
    fn queued_message_shows_ticket() {
        assert_eq!(
            queued(QueueTicket(3)),
            "📥 Your request has been added to the queue. Your position: 3. Please wait..."
        );
    }
}
