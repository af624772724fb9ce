use std::sync::LazyLock;

use regex::Regex;

static YT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:https?://)?(?:www\.|m\.)?(?:youtube(?:-nocookie)?\.com/(?:watch\?(?:[^#]*&)?v=|embed/|shorts/|v/|live/)|youtu\.be/)([A-Za-z0-9_-]{11})(?:[?&#/]|$)",
    )
    .expect("youtube url regex is valid")
});

/// Extracts the 11-character video id from standard, shortened, embed and shorts
/// YouTube urls. Anything else, including non-YouTube urls, yields `None`.
pub fn yt_id(url: &str) -> Option<String> {
    YT_REGEX
        .captures(url.trim())
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn embed_url(video_id: &str) -> String {
    format!("https://www.youtube.com/embed/{video_id}")
}

/// How a lesson's video area is rendered. The three cases are kept apart on purpose:
/// an unembeddable url is still shown as a link, only an empty url means no video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoRender {
    Embed { video_id: String, embed_url: String },
    ExternalLink(String),
    NoVideo,
}

impl VideoRender {
    pub fn for_url(url: &str) -> Self {
        if let Some(video_id) = yt_id(url) {
            let embed_url = embed_url(&video_id);
            return Self::Embed {
                video_id,
                embed_url,
            };
        }

        let url = url.trim();
        if url.is_empty() {
            Self::NoVideo
        } else {
            Self::ExternalLink(url.to_string())
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Embed { .. } => "video",
            Self::ExternalLink(_) => "link",
            Self::NoVideo => "no video",
        }
    }
}

impl std::fmt::Display for VideoRender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Embed { embed_url, .. } => write!(f, "{embed_url}"),
            Self::ExternalLink(url) => write!(f, "{url}"),
            Self::NoVideo => write!(f, "No video for this lesson"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn yt_id_known_shapes_test() {
        for url in [
            "https://youtu.be/abc12345678",
            "https://www.youtube.com/watch?v=abc12345678&t=5",
            "https://youtube.com/embed/abc12345678",
            "https://www.youtube.com/shorts/abc12345678",
            "http://m.youtube.com/watch?feature=share&v=abc12345678",
            "youtu.be/abc12345678?si=xyz",
        ] {
            assert_eq!(yt_id(url).as_deref(), Some("abc12345678"), "{url}");
        }
    }

    #[test]
    fn yt_id_rejects_test() {
        assert_eq!(yt_id("https://vimeo.com/12345"), None);
        assert_eq!(yt_id(""), None);
        assert_eq!(yt_id("https://youtu.be/short"), None);
        assert_eq!(yt_id("https://youtu.be/abc123456789"), None);
        assert_eq!(yt_id("https://notyoutube.com/embed/abc12345678"), None);
    }

    #[test]
    fn video_render_branches_test() {
        assert_eq!(
            VideoRender::for_url("https://youtu.be/abc12345678"),
            VideoRender::Embed {
                video_id: "abc12345678".into(),
                embed_url: "https://www.youtube.com/embed/abc12345678".into(),
            }
        );
        assert_eq!(
            VideoRender::for_url("https://vimeo.com/12345"),
            VideoRender::ExternalLink("https://vimeo.com/12345".into())
        );
        assert_eq!(VideoRender::for_url("   "), VideoRender::NoVideo);
    }
}
