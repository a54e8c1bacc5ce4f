//! Fakes of the catalog and metadata capabilities.

use anyhow::{bail, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::models::{SearchQuery, SubtitleCandidate, SubtitleFile};
use crate::domain::ports::{MetadataReader, SubtitleCatalog};

pub struct FakeCatalog {
    pub candidates: Vec<SubtitleCandidate>,
    pub remaining: Option<u32>,
    /// Write the destination file on download.
    pub write_files: bool,
    pub fail_search: bool,
    /// Return every candidate, whatever languages were asked for.
    pub ignore_language_filter: bool,
    /// Refuse downloads as the service does once the daily limit is hit.
    pub refuse_downloads: bool,
    pub searches: Vec<SearchQuery>,
    pub downloads: Vec<(u64, PathBuf)>,
}

impl FakeCatalog {
    pub fn new(candidates: Vec<SubtitleCandidate>) -> Self {
        Self {
            candidates,
            remaining: None,
            write_files: true,
            fail_search: false,
            ignore_language_filter: false,
            refuse_downloads: false,
            searches: Vec::new(),
            downloads: Vec::new(),
        }
    }
}

impl SubtitleCatalog for FakeCatalog {
    fn search(&mut self, query: &SearchQuery) -> Result<Vec<SubtitleCandidate>> {
        self.searches.push(query.clone());
        if self.fail_search {
            bail!("connection reset by peer");
        }
        Ok(self
            .candidates
            .iter()
            .filter(|c| self.ignore_language_filter || query.languages.contains(&c.language))
            .cloned()
            .collect())
    }

    fn download_item(&mut self, file: &SubtitleFile, destination: &Path) -> Result<()> {
        self.downloads.push((file.remote_id, destination.to_path_buf()));
        if self.refuse_downloads {
            self.remaining = Some(0);
            bail!("download limit reached");
        }
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining = remaining.saturating_sub(1);
        }
        if self.write_files {
            fs::write(destination, format!("subtitle {}", file.remote_id))?;
        }
        Ok(())
    }

    fn remaining_downloads(&self) -> Option<u32> {
        self.remaining
    }
}

/// Returns the same identifier for every file; `None` acts as an NFO
/// without the field.
pub struct FakeMetadata(pub Option<String>);

impl MetadataReader for FakeMetadata {
    fn read_field(&self, _path: &Path, _key: &str) -> Result<Option<String>> {
        Ok(self.0.clone())
    }
}

pub fn candidate(id: u64, language: &str, file_name: &str) -> SubtitleCandidate {
    SubtitleCandidate {
        id: id.to_string(),
        language: language.to_string(),
        files: vec![SubtitleFile {
            remote_id: id,
            file_name: Some(file_name.to_string()),
        }],
        download_count: None,
    }
}
