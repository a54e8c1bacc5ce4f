use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    api_key: Option<String>,
    username: Option<String>,
    password: Option<String>,
    fetch_all_languages: Option<bool>,
    multi_file_support: Option<bool>,
}

/// OpenSubtitles account credentials.
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Settings of the acquisition workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrabberConfig {
    /// Desired languages, highest priority first.
    pub languages: Vec<String>,
    /// Fetch every missing language instead of stopping at the best one.
    pub fetch_all_languages: bool,
    pub multi_file_support: bool,
    pub subtitle_extension: String,
    /// NFO tag holding the catalog identifier.
    pub identifier_field: String,
}

impl GrabberConfig {
    pub fn new(languages: Vec<String>) -> Self {
        Self {
            languages,
            fetch_all_languages: false,
            multi_file_support: false,
            subtitle_extension: "srt".to_string(),
            identifier_field: "imdbid".to_string(),
        }
    }
}

/// Everything resolved from the environment and the config file.
#[derive(Debug)]
pub struct Settings {
    pub credentials: Credentials,
    pub fetch_all_languages: bool,
    pub multi_file_support: bool,
}

pub fn load_settings() -> Result<Settings> {
    let config_path = get_config_path();
    let file = read_config_file(&config_path)?;
    resolve_settings(file, |key| env::var(key).ok(), &config_path)
}

fn read_config_file(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Ok(ConfigFile::default());
    }
    let content = fs::read_to_string(path)?;
    toml::from_str(&content).with_context(|| format!("Invalid config file {}", path.display()))
}

fn resolve_settings(
    file: ConfigFile,
    env_lookup: impl Fn(&str) -> Option<String>,
    config_path: &Path,
) -> Result<Settings> {
    let api_key = env_lookup("OPENSUBTITLES_API_KEY").or(file.api_key);
    let username = env_lookup("OPENSUBTITLES_USERNAME").or(file.username);
    let password = env_lookup("OPENSUBTITLES_PASSWORD").or(file.password);

    let (Some(api_key), Some(username), Some(password)) = (api_key, username, password) else {
        bail!(
            "OpenSubtitles credentials not found. Set OPENSUBTITLES_API_KEY, OPENSUBTITLES_USERNAME and OPENSUBTITLES_PASSWORD or create config file at {} with api_key, username and password",
            config_path.display()
        )
    };

    Ok(Settings {
        credentials: Credentials {
            api_key,
            username,
            password,
        },
        fetch_all_languages: file.fetch_all_languages.unwrap_or(false),
        multi_file_support: file.multi_file_support.unwrap_or(false),
    })
}

fn get_config_dir_path() -> PathBuf {
    xdir::config()
        .map(|path| path.join("subsgrab"))
        // If the standard path could not be found (e.g.`$HOME` is not set),
        // default to the current directory.
        .unwrap_or_default()
}

fn get_config_path() -> PathBuf {
    get_config_dir_path().join("config.toml")
}
