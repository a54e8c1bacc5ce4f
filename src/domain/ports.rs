//! Capabilities the acquisition core consumes.

use anyhow::Result;
use std::path::Path;

use crate::domain::models::{ReleaseAttributes, SearchQuery, SubtitleCandidate, SubtitleFile};

/// Remote subtitle catalog.
pub trait SubtitleCatalog {
    fn search(&mut self, query: &SearchQuery) -> Result<Vec<SubtitleCandidate>>;

    /// Download one file entry to `destination`.
    fn download_item(&mut self, file: &SubtitleFile, destination: &Path) -> Result<()>;

    /// Remaining download allowance, `None` when unknown or unlimited.
    fn remaining_downloads(&self) -> Option<u32>;
}

/// Reads single fields out of a metadata sidecar.
pub trait MetadataReader {
    /// `Ok(None)` when the document parses but has no such field.
    fn read_field(&self, path: &Path, key: &str) -> Result<Option<String>>;
}

/// Extracts release attributes from a file name.
pub trait AttributeParser {
    fn parse(&self, file_name: &str) -> ReleaseAttributes;
}

impl<F> AttributeParser for F
where
    F: Fn(&str) -> ReleaseAttributes,
{
    fn parse(&self, file_name: &str) -> ReleaseAttributes {
        self(file_name)
    }
}
