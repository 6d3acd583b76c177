//! Loads feed descriptors from TOML files.
//!
//! Every key is optional at this level: a file that omits `title` still
//! loads, and the renderer reports the missing field. Unknown top-level keys
//! are accepted but logged, since they are usually typos.
use std::path::Path;
use thiserror::Error;

use crate::feed::FeedDescriptor;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read feed descriptor: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in feed descriptor: {0}")]
    Parse(#[from] toml::de::Error),

    /// SEC-014: Descriptor file exceeds maximum allowed size.
    #[error("Feed descriptor too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Loading
// ============================================================================

/// SEC-014: Maximum descriptor file size (1 MB).
const MAX_FILE_SIZE: u64 = 1_048_576;

/// Top-level keys of a descriptor file.
const KNOWN_KEYS: [&str; 15] = [
    "title",
    "description",
    "link",
    "encoding",
    "date_modified",
    "last_build_date",
    "generator",
    "language",
    "feed_links",
    "base_url",
    "authors",
    "copyright",
    "categories",
    "hubs",
    "image",
];

/// Load a feed descriptor from a TOML file.
///
/// - Missing file → `Err(ConfigError::Io)`
/// - Empty file → `Ok(FeedDescriptor::default())`
/// - Invalid TOML or wrong value types → `Err(ConfigError::Parse)` with line info
/// - Unknown keys → accepted, logged as warning
///
/// Dates are RFC 3339 strings (`date_modified = "2009-02-13T23:31:30Z"`).
pub fn load_descriptor(path: &Path) -> Result<FeedDescriptor, ConfigError> {
    // SEC-014: Check file size before reading to prevent memory exhaustion
    let meta = std::fs::metadata(path)?;
    if meta.len() > MAX_FILE_SIZE {
        return Err(ConfigError::TooLarge(format!(
            "File is {} bytes (max {} bytes)",
            meta.len(),
            MAX_FILE_SIZE
        )));
    }

    let content = std::fs::read_to_string(path)?;
    parse_descriptor(&content, path)
}

fn parse_descriptor(content: &str, path: &Path) -> Result<FeedDescriptor, ConfigError> {
    if content.trim().is_empty() {
        tracing::debug!(path = %path.display(), "Feed descriptor is empty");
        return Ok(FeedDescriptor::default());
    }

    // Parse as a raw table first to detect unknown keys
    if let Ok(raw) = content.parse::<toml::Table>() {
        for key in raw.keys() {
            if !KNOWN_KEYS.contains(&key.as_str()) {
                tracing::warn!(key = %key, "Unknown key in feed descriptor, ignoring");
            }
        }
    }

    let descriptor: FeedDescriptor = toml::from_str(content)?;
    tracing::info!(
        path = %path.display(),
        title = descriptor.title.as_deref().unwrap_or(""),
        "Loaded feed descriptor"
    );
    Ok(descriptor)
}

// ============================================================================
// Tests
// ============================================================================
