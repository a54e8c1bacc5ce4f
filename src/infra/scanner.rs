//! Library scanning: NFO discovery and local subtitle detection.

use anyhow::Result;
use log::{debug, warn};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::domain::languages::language_name;
use crate::domain::models::MediaAsset;

/// Collect a media asset for every NFO under `root` that sits next to a
/// media file. Results are sorted by path.
pub fn discover_assets(root: &Path, subtitle_extension: &str) -> Result<Vec<MediaAsset>> {
    let mut nfo_files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry: {e}");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| is_nfo(p))
        .collect();
    nfo_files.sort();

    let mut assets = Vec::new();
    for nfo_path in nfo_files {
        if !has_media_companion(&nfo_path)? {
            debug!("Skipping {nfo_path:?}: no media file alongside");
            continue;
        }
        let existing = existing_subtitle_languages(&nfo_path.with_extension(""), subtitle_extension)?;
        assets.push(MediaAsset::new(nfo_path, existing));
    }
    Ok(assets)
}

fn is_nfo(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("nfo"))
}

/// Sibling file names of `base` that start with `{base}.`
fn sibling_suffixes(base: &Path) -> Result<Vec<String>> {
    let Some(directory) = base.parent() else {
        return Ok(Vec::new());
    };
    let Some(stem) = base.file_name().and_then(|s| s.to_str()) else {
        return Ok(Vec::new());
    };
    let directory = if directory.as_os_str().is_empty() {
        Path::new(".")
    } else {
        directory
    };
    let prefix = format!("{stem}.");

    let mut suffixes = Vec::new();
    for entry in fs::read_dir(directory)? {
        let entry = entry?;
        let name = entry.file_name();
        if let Some(suffix) = name.to_str().and_then(|n| n.strip_prefix(&prefix)) {
            suffixes.push(suffix.to_string());
        }
    }
    Ok(suffixes)
}

/// An NFO belongs to a media item only if some other file shares its base name.
pub fn has_media_companion(nfo_path: &Path) -> Result<bool> {
    let own_ext = nfo_path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    Ok(sibling_suffixes(&nfo_path.with_extension(""))?
        .iter()
        .any(|suffix| suffix != own_ext))
}

/// Languages of local subtitles named `{base}.{lang…}.{extension}`, read from
/// the first two characters after `{base}.`.
pub fn existing_subtitle_languages(base: &Path, extension: &str) -> Result<BTreeSet<String>> {
    let ext_suffix = format!(".{extension}");
    Ok(sibling_suffixes(base)?
        .into_iter()
        .filter_map(|suffix| {
            let middle = suffix.strip_suffix(&ext_suffix)?;
            let lang = middle.get(..2)?.to_ascii_lowercase();
            language_name(&lang).is_some().then_some(lang)
        })
        .collect())
}
