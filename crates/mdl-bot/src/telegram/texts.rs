pub const HELP: &str = "Help - List of Commands\n\n\
/start - Show the welcome menu\n\
/download <URL> - Download media from a link\n\
/about - Information about the bot\n\
/donate - How to support the bot\n\
/help - Show this help message\n\n\
To download media, send a video or audio link.\n\n\
Tip for sites with long URLs: use only the base URL and drop everything \
after `?` or `&`, for example\n\
https://website.com/videos/abcc\n\n\
Avoid links with tracking parameters like `utm_content=...&ref=...`.";

pub const ABOUT: &str = "MDL is a Telegram bot that downloads videos and audio \
from links you send. Requests are handled one at a time in arrival order and the \
files are delivered straight to this chat.";

/// Reply to `/donate`; `link` comes from the `donate_url` setting.
pub fn donate(link: Option<&str>) -> String {
    match link {
        Some(url) => format!(
            "If you like this bot and want to support its development, you can donate at: {url}"
        ),
        None => "Donations are not set up for this bot.".to_string(),
    }
}
