//! NFO sidecar reader

use anyhow::{anyhow, Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs;
use std::path::Path;

use crate::domain::ports::MetadataReader;

/// Reads fields from Kodi-style XML `.nfo` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct NfoReader;

impl MetadataReader for NfoReader {
    fn read_field(&self, path: &Path, key: &str) -> Result<Option<String>> {
        let xml = fs::read_to_string(path)
            .with_context(|| format!("Failed to read metadata file {}", path.display()))?;
        read_top_level_field(&xml, key)
            .with_context(|| format!("Failed to parse metadata file {}", path.display()))
    }
}

/// Text of the first direct child of the root element named `key`.
pub fn read_top_level_field(xml: &str, key: &str) -> Result<Option<String>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut depth = 0usize;
    let mut capturing = false;
    let mut value = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                depth += 1;
                if depth == 2 && e.name().as_ref() == key.as_bytes() {
                    capturing = true;
                }
            }
            Ok(Event::Empty(ref e)) => {
                if depth == 1 && e.name().as_ref() == key.as_bytes() {
                    return Ok(Some(String::new()));
                }
            }
            Ok(Event::Text(ref e)) if capturing => {
                value.push_str(&e.unescape()?);
            }
            Ok(Event::CData(e)) if capturing => {
                value.push_str(&String::from_utf8_lossy(&e.into_inner()));
            }
            Ok(Event::End(_)) => {
                if capturing && depth == 2 {
                    return Ok(Some(value.trim().to_string()));
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(anyhow!(
                    "Error parsing XML at position {}: {e}",
                    reader.error_position()
                ));
            }
            _ => {}
        }
    }

    Ok(None)
}
