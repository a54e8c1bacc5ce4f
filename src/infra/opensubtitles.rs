use anyhow::{bail, Context, Result};
use log::{debug, info};
use serde::Deserialize;
use std::io::Write;
use std::path::Path;

use crate::config::Credentials;
use crate::domain::models::{SearchQuery, SubtitleCandidate, SubtitleFile};
use crate::domain::ports::SubtitleCatalog;

const OPENSUBTITLES_API_BASE: &str = "https://api.opensubtitles.com/api/v1";
const USER_AGENT: &str = concat!("subsgrab v", env!("CARGO_PKG_VERSION"));

/// Blocking client for the OpenSubtitles REST API.
pub struct OpenSubtitlesClient {
    credentials: Credentials,
    http: reqwest::blocking::Client,
    token: Option<String>,
    remaining_downloads: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    data: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: String,
    attributes: SearchAttributes,
}

#[derive(Debug, Deserialize)]
struct SearchAttributes {
    language: Option<String>,
    download_count: Option<u64>,
    #[serde(default)]
    files: Vec<FileEntry>,
}

#[derive(Debug, Deserialize)]
struct FileEntry {
    file_id: u64,
    file_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DownloadResponse {
    link: String,
    remaining: Option<i64>,
}

impl OpenSubtitlesClient {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            http: reqwest::blocking::Client::new(),
            token: None,
            remaining_downloads: None,
        }
    }

    pub fn login(&mut self) -> Result<()> {
        let body = serde_json::json!({
            "username": self.credentials.username,
            "password": self.credentials.password,
        });
        let response = self
            .http
            .post(format!("{OPENSUBTITLES_API_BASE}/login"))
            .header("Api-Key", &self.credentials.api_key)
            .header("User-Agent", USER_AGENT)
            .header("Content-Type", "application/json")
            .body(body.to_string())
            .send()?;

        if !response.status().is_success() {
            bail!("OpenSubtitles login failed: HTTP {}", response.status());
        }

        let login_resp: LoginResponse = serde_json::from_str(&response.text()?)?;
        self.token = Some(login_resp.token);
        info!("Logged in to OpenSubtitles as {}", self.credentials.username);
        Ok(())
    }

    fn ensure_authenticated(&mut self) -> Result<String> {
        if self.token.is_none() {
            self.login()?;
        }
        self.token
            .clone()
            .context("OpenSubtitles login returned no token")
    }
}

impl SubtitleCatalog for OpenSubtitlesClient {
    fn search(&mut self, query: &SearchQuery) -> Result<Vec<SubtitleCandidate>> {
        let imdb_id = normalize_imdb_id(&query.identifier)?;
        let languages = query.languages.join(",");

        let response = self
            .http
            .get(format!("{OPENSUBTITLES_API_BASE}/subtitles"))
            .header("Api-Key", &self.credentials.api_key)
            .header("User-Agent", USER_AGENT)
            .query(&[("imdb_id", imdb_id.as_str()), ("languages", languages.as_str())])
            .send()?;

        if !response.status().is_success() {
            bail!("OpenSubtitles search failed: HTTP {}", response.status());
        }

        let candidates = parse_search_response(&response.text()?)?;
        debug!(
            "Search for imdb {imdb_id} [{languages}] returned {} candidate(s)",
            candidates.len()
        );
        Ok(candidates)
    }

    fn download_item(&mut self, file: &SubtitleFile, destination: &Path) -> Result<()> {
        let token = self.ensure_authenticated()?;

        let body = serde_json::json!({ "file_id": file.remote_id });
        let response = self
            .http
            .post(format!("{OPENSUBTITLES_API_BASE}/download"))
            .header("Api-Key", &self.credentials.api_key)
            .header("User-Agent", USER_AGENT)
            .header("Authorization", format!("Bearer {token}"))
            .header("Content-Type", "application/json")
            .body(body.to_string())
            .send()?;

        let status = response.status();
        let response_text = response.text()?;
        if !status.is_success() {
            // 406 means the daily allowance is used up
            if status.as_u16() == 406 {
                self.remaining_downloads = Some(0);
            }
            bail!("OpenSubtitles download request failed: HTTP {status}");
        }

        let download: DownloadResponse = serde_json::from_str(&response_text)?;
        if let Some(remaining) = download.remaining {
            self.remaining_downloads = Some(download_allowance(remaining));
            debug!("OpenSubtitles downloads remaining: {remaining}");
        }

        let content = self.http.get(&download.link).send()?;
        if !content.status().is_success() {
            bail!("Subtitle file fetch failed: HTTP {}", content.status());
        }
        let bytes = content.bytes()?;

        write_atomically(destination, &bytes)
    }

    fn remaining_downloads(&self) -> Option<u32> {
        self.remaining_downloads
    }
}

fn parse_search_response(text: &str) -> Result<Vec<SubtitleCandidate>> {
    let search_resp: SearchResponse = serde_json::from_str(text)?;
    Ok(search_resp
        .data
        .into_iter()
        .filter_map(|item| {
            let language = item.attributes.language?;
            Some(SubtitleCandidate {
                id: item.id,
                language,
                files: item
                    .attributes
                    .files
                    .into_iter()
                    .map(|f| SubtitleFile {
                        remote_id: f.file_id,
                        file_name: f.file_name,
                    })
                    .collect(),
                download_count: item.attributes.download_count,
            })
        })
        .collect())
}

/// Remaining allowance as reported, clamped into `u32`.
fn download_allowance(remaining: i64) -> u32 {
    u32::try_from(remaining.max(0)).unwrap_or(u32::MAX)
}

/// The API takes IMDb ids as plain numbers: "tt0111161" becomes "111161".
fn normalize_imdb_id(identifier: &str) -> Result<String> {
    let trimmed = identifier.trim();
    let digits = trimmed
        .strip_prefix("tt")
        .or_else(|| trimmed.strip_prefix("TT"))
        .unwrap_or(trimmed);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        bail!("Invalid IMDb id: {identifier:?}");
    }
    let normalized = digits.trim_start_matches('0');
    if normalized.is_empty() {
        bail!("Invalid IMDb id: {identifier:?}");
    }
    Ok(normalized.to_string())
}

fn write_atomically(destination: &Path, bytes: &[u8]) -> Result<()> {
    let directory = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = tempfile::NamedTempFile::new_in(directory)
        .with_context(|| format!("Failed to create temporary file in {}", directory.display()))?;
    temp.write_all(bytes)?;
    temp.persist(destination)
        .with_context(|| format!("Failed to write {}", destination.display()))?;
    Ok(())
}
