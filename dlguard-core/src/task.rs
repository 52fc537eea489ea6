//! Task descriptor loading.
//!
//! The upstream task producer writes a small JSON record naming the album to
//! download. A missing file is the normal idle state and is reported as
//! [`TaskLoad::Absent`], not as an error.

use std::fs;
use std::io;
use std::path::Path;

use serde::Deserialize;
use serde::de;

use crate::error::{CoreError, CoreResult};

/// Display name used when the descriptor carries no `album_name`.
pub const UNKNOWN_ALBUM_NAME: &str = "Unknown Album";

/// What to download in this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDescriptor {
    pub album_url: String,
    pub album_name: Option<String>,
}

impl TaskDescriptor {
    /// Album name for display, falling back to [`UNKNOWN_ALBUM_NAME`].
    pub fn display_name(&self) -> &str {
        self.album_name.as_deref().unwrap_or(UNKNOWN_ALBUM_NAME)
    }
}

/// Result of looking for a task descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskLoad {
    /// No descriptor at the configured path; nothing to do.
    Absent,
    Loaded(TaskDescriptor),
}

#[derive(Deserialize)]
struct RawTask {
    #[serde(default)]
    album_url: Option<String>,
    #[serde(default)]
    album_name: Option<String>,
}

/// Reads the descriptor at `path`.
///
/// # Returns
///
/// * `Ok(TaskLoad::Absent)` - If no file exists at `path`
/// * `Ok(TaskLoad::Loaded(_))` - If the file parsed and names a URL
/// * `Err(CoreError::TaskRead)` - If the file exists but cannot be read
/// * `Err(CoreError::TaskMalformed)` - If the content is not a task object
/// * `Err(CoreError::TaskMissingUrl)` - If `album_url` is absent, null or empty
pub fn load_task(path: &Path) -> CoreResult<TaskLoad> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::debug!("No task file at {}", path.display());
            return Ok(TaskLoad::Absent);
        }
        Err(source) => {
            return Err(CoreError::TaskRead {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    parse_task(&bytes, path).map(TaskLoad::Loaded)
}

/// Parses descriptor bytes; `path` is only used in error messages.
pub fn parse_task(bytes: &[u8], path: &Path) -> CoreResult<TaskDescriptor> {
    // Writers on Windows commonly prepend a UTF-8 BOM.
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

    let malformed = |source: serde_json::Error| CoreError::TaskMalformed {
        path: path.to_path_buf(),
        source,
    };

    let value: serde_json::Value = serde_json::from_slice(bytes).map_err(malformed)?;
    if !value.is_object() {
        return Err(malformed(<serde_json::Error as de::Error>::custom(
            "expected a JSON object",
        )));
    }
    let raw: RawTask = serde_json::from_value(value).map_err(malformed)?;

    match raw.album_url {
        Some(album_url) if !album_url.is_empty() => Ok(TaskDescriptor {
            album_url,
            album_name: raw.album_name,
        }),
        _ => Err(CoreError::TaskMissingUrl(path.to_path_buf())),
    }
}
