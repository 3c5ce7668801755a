//! Helpers for the YouTube URLs used by video lessons.

use url::Url;

const VIDEO_ID_LEN: usize = 11;

fn is_video_id(s: &str) -> bool {
    s.len() == VIDEO_ID_LEN
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn is_youtube_host(host: &str) -> bool {
    matches!(
        host,
        "youtube.com" | "www.youtube.com" | "m.youtube.com" | "music.youtube.com"
    )
}

/// Extracts the 11-character video id from a YouTube URL.
///
/// Supports `youtube.com/watch?v=ID`, `youtu.be/ID`, `youtube.com/embed/ID`
/// and `youtube.com/v/ID`. Returns `None` for anything else.
#[must_use]
pub fn video_id(url: &Url) -> Option<String> {
    let host = url.host_str()?;

    if host == "youtu.be" || host == "www.youtu.be" {
        let id = url.path_segments()?.next()?;
        return is_video_id(id).then(|| id.to_owned());
    }

    if !is_youtube_host(host) {
        return None;
    }

    let mut segments = url.path_segments()?;
    match segments.next()? {
        "watch" => {
            let (_, id) = url.query_pairs().find(|(k, _)| k == "v")?;
            is_video_id(&id).then(|| id.into_owned())
        }
        "embed" | "v" => {
            let id = segments.next()?;
            is_video_id(id).then(|| id.to_owned())
        }
        _ => None,
    }
}

/// Extracts a video id from a raw lesson source string.
///
/// Accepts a full URL or a bare 11-character id.
#[must_use]
pub fn video_id_from_str(source: &str) -> Option<String> {
    let source = source.trim();
    if is_video_id(source) {
        return Some(source.to_owned());
    }
    video_id(&Url::parse(source).ok()?)
}

/// Thumbnail size variants offered by the YouTube image CDN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThumbnailQuality {
    Default,
    #[default]
    Medium,
    High,
    MaxRes,
}

impl ThumbnailQuality {
    fn file_stem(self) -> &'static str {
        match self {
            ThumbnailQuality::Default => "default",
            ThumbnailQuality::Medium => "mqdefault",
            ThumbnailQuality::High => "hqdefault",
            ThumbnailQuality::MaxRes => "maxresdefault",
        }
    }
}

/// Thumbnail URL for a video id.
#[must_use]
pub fn thumbnail_url(video_id: &str, quality: ThumbnailQuality) -> String {
    format!(
        "https://img.youtube.com/vi/{video_id}/{}.jpg",
        quality.file_stem()
    )
}

/// Embed URL for a video id.
#[must_use]
pub fn embed_url(video_id: &str, autoplay: bool) -> String {
    if autoplay {
        format!("https://www.youtube.com/embed/{video_id}?autoplay=1")
    } else {
        format!("https://www.youtube.com/embed/{video_id}")
    }
}
