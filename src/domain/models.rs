use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Release attributes the match metric compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKey {
    Quality,
    Codec,
    Resolution,
    Encoder,
    Audio,
}

impl AttributeKey {
    pub const ALL: [AttributeKey; 5] = [
        AttributeKey::Quality,
        AttributeKey::Codec,
        AttributeKey::Resolution,
        AttributeKey::Encoder,
        AttributeKey::Audio,
    ];
}

/// Attributes parsed out of a release file name. A `None` field means the
/// parser could not determine that attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseAttributes {
    pub quality: Option<String>,
    pub codec: Option<String>,
    pub resolution: Option<String>,
    pub encoder: Option<String>,
    pub audio: Option<String>,
}

impl ReleaseAttributes {
    pub fn get(&self, key: AttributeKey) -> Option<&str> {
        match key {
            AttributeKey::Quality => self.quality.as_deref(),
            AttributeKey::Codec => self.codec.as_deref(),
            AttributeKey::Resolution => self.resolution.as_deref(),
            AttributeKey::Encoder => self.encoder.as_deref(),
            AttributeKey::Audio => self.audio.as_deref(),
        }
    }
}

/// One downloadable file of a catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleFile {
    pub remote_id: u64,
    pub file_name: Option<String>,
}

/// A catalog search result: one subtitle offering in one language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleCandidate {
    pub id: String,
    pub language: String,
    pub files: Vec<SubtitleFile>,
    pub download_count: Option<u64>,
}

impl SubtitleCandidate {
    pub fn is_multi_file(&self) -> bool {
        self.files.len() > 1
    }

    pub fn primary_file(&self) -> Option<&SubtitleFile> {
        self.files.first()
    }

    /// File name of the primary file, if the catalog supplied one.
    pub fn file_name(&self) -> Option<&str> {
        self.primary_file().and_then(|f| f.file_name.as_deref())
    }
}

/// Parameters of a catalog search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub languages: Vec<String>,
    pub identifier: String,
}

/// A local media item, identified by its NFO sidecar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAsset {
    /// Path without extension, shared by the media file, NFO and subtitles.
    pub base: PathBuf,
    pub nfo_path: PathBuf,
    pub existing_languages: BTreeSet<String>,
}

impl MediaAsset {
    pub fn new(nfo_path: impl Into<PathBuf>, existing_languages: BTreeSet<String>) -> Self {
        let nfo_path = nfo_path.into();
        Self {
            base: nfo_path.with_extension(""),
            nfo_path,
            existing_languages,
        }
    }

    /// Name used as the reference when matching candidate file names.
    pub fn reference_name(&self) -> String {
        self.nfo_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// `{base}.{lang}.{extension}`
    pub fn subtitle_path(&self, language: &str, extension: &str) -> PathBuf {
        subtitle_path(&self.base, language, extension)
    }
}

pub fn subtitle_path(base: &Path, language: &str, extension: &str) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    name.push(format!(".{language}.{extension}"));
    PathBuf::from(name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    UnsupportedMetadata,
    UnsupportedFormat,
    DownloadVerificationFailed,
    /// Error raised by an external collaborator (network, parsing, IO).
    Collaborator(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::UnsupportedMetadata => write!(f, "unsupported metadata"),
            FailureReason::UnsupportedFormat => write!(f, "unsupported format"),
            FailureReason::DownloadVerificationFailed => write!(f, "download not written"),
            FailureReason::Collaborator(msg) => write!(f, "{msg}"),
        }
    }
}

/// Result of processing one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionOutcome {
    Exist,
    NotFound,
    Downloaded(Vec<String>),
    Failed(FailureReason),
    QuotaExhausted,
}
