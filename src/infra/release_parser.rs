//! Release-name attribute parser
//!
//! Pulls quality, codec, resolution, encoder and audio out of scene-style
//! names such as:
//! - "Movie.2010.720p.BluRay.x264-SPARKS.nfo"
//! - "Show.S01E02.1080p.WEB-DL.DD5.1.H.264-NTb.srt"

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use crate::domain::models::ReleaseAttributes;
use crate::domain::ports::AttributeParser;

const KNOWN_EXTENSIONS: &[&str] = &[
    "nfo", "srt", "sub", "ass", "ssa", "vtt", "mkv", "mp4", "m4v", "avi", "mov", "wmv", "mpg",
    "mpeg", "webm",
];

static RESOLUTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b([0-9]{3,4}p|4k)\b").expect("valid resolution regex"));

static QUALITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b((?:PPV[. ])?[HP]DTV|(?:HD)?CAM|B[DR]Rip|HD-?TS|WEB-?DL|WEB-?Rip|HDRip|DVDRip|CamRip|Blu-?Ray|DVDScr|Telesync|WEB)\b",
    )
    .expect("valid quality regex")
});

static CODEC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(xvid|divx|[hx][. ]?26[45]|hevc|avc)\b").expect("valid codec regex")
});

static AUDIO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(MP3|DDP?[. ]?[25][. ]?[01]|Dual[- ]Audio|LiNE|DTS(?:-HD)?|TrueHD|Atmos|AAC(?:[. ]?2[. ]0|[. -]LC)?|AC3)\b",
    )
    .expect("valid audio regex")
});

static ENCODER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"-\s?([A-Za-z0-9]+)(?:\s?\[[^\]]*\])?$").expect("valid encoder regex")
});

/// Regex-based parser for scene release names.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReleaseNameParser;

impl AttributeParser for ReleaseNameParser {
    fn parse(&self, file_name: &str) -> ReleaseAttributes {
        parse_release_name(file_name)
    }
}

/// Parse the attributes of a file name or path.
pub fn parse_release_name(file_name: &str) -> ReleaseAttributes {
    let base = Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(file_name);
    let stem = strip_known_extension(base);

    ReleaseAttributes {
        quality: capture(&QUALITY_RE, stem),
        codec: capture(&CODEC_RE, stem),
        resolution: capture(&RESOLUTION_RE, stem),
        encoder: capture(&ENCODER_RE, stem),
        audio: capture(&AUDIO_RE, stem),
    }
}

fn strip_known_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext)) if KNOWN_EXTENSIONS.contains(&ext.to_lowercase().as_str()) => stem,
        _ => name,
    }
}

fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| normalize(m.as_str()))
        .filter(|v| !v.is_empty())
}

/// Lowercase and drop separators so "WEB-DL" equals "web.dl".
fn normalize(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, '.' | '-' | '_' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}
