//! Uploaded files are written under `<public>/uploads/<module>/` with a
//! timestamp prefix and referenced from records by their public URL.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs::{self, create_dir_all};
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::store::next_timestamp;

lazy_static! {
    static ref UNSAFE_CHARS: Regex = Regex::new(r"[^a-zA-Z0-9.\-]").unwrap();
}

/// A file stored under the public uploads directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    /// URL the browser can fetch, e.g. `/uploads/chat/1710750000000-scan.pdf`
    pub file_url: String,
    /// Name as submitted by the client
    pub file_name: String,
    pub file_type: String,
    pub file_size: u64,
}

/// Replace every character outside `[A-Za-z0-9.-]` with `_`.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned = UNSAFE_CHARS.replace_all(base, "_").into_owned();
    // a name made only of dots would resolve to a directory
    if cleaned.chars().all(|c| c == '.') {
        "file".to_string()
    } else {
        cleaned
    }
}

/// Writes uploads for the modules below one public directory.
#[derive(Debug, Clone)]
pub struct Uploads {
    public_dir: PathBuf,
    max_bytes: u64,
}

impl Uploads {
    pub fn new(public_dir: impl Into<PathBuf>, max_bytes: u64) -> Self {
        Uploads {
            public_dir: public_dir.into(),
            max_bytes,
        }
    }

    pub fn public_dir(&self) -> &Path {
        &self.public_dir
    }

    /// Store `bytes` for `module` (which may contain a sub-path such as
    /// `legalitas/<entity id>`).
    pub fn store(
        &self,
        module: &str,
        original_name: &str,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<StoredFile> {
        if bytes.is_empty() {
            return Err(AppError::Upload("empty file".to_string()));
        }
        if bytes.len() as u64 > self.max_bytes {
            return Err(AppError::Upload(format!(
                "{} bytes exceeds the {} byte limit",
                bytes.len(),
                self.max_bytes
            )));
        }

        let segments = module_segments(module)?;
        let mut dir = self.public_dir.join("uploads");
        for segment in &segments {
            dir.push(segment);
        }
        create_dir_all(&dir)?;

        let file_name = format!("{}-{}", next_timestamp(), sanitize_file_name(original_name));
        fs::write(dir.join(&file_name), bytes)?;
        log::info!("stored upload {}/{} ({} bytes)", segments.join("/"), file_name, bytes.len());

        Ok(StoredFile {
            file_url: format!("/uploads/{}/{}", segments.join("/"), file_name),
            file_name: original_name.to_string(),
            file_type: content_type
                .unwrap_or("application/octet-stream")
                .to_string(),
            file_size: bytes.len() as u64,
        })
    }
}

impl Uploads {
    /// Delete a file written by [`Uploads::store`]. Only paths below the
    /// uploads directory are touched; a file that is already gone is fine.
    pub fn remove(&self, stored: &StoredFile) -> Result<()> {
        let relative = stored
            .file_url
            .strip_prefix("/uploads/")
            .filter(|rest| !rest.split('/').any(|s| s.is_empty() || s.starts_with('.')))
            .ok_or_else(|| AppError::Upload(format!("not an upload: {}", stored.file_url)))?;
        let path = self.public_dir.join("uploads").join(relative);
        match fs::remove_file(&path) {
            Ok(()) => {
                log::info!("removed upload {}", stored.file_url);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn module_segments(module: &str) -> Result<Vec<String>> {
    let raw: Vec<&str> = module.split('/').filter(|s| !s.is_empty()).collect();
    if raw.is_empty() || raw.iter().any(|s| s.starts_with('.')) {
        return Err(AppError::Upload(format!("invalid upload directory: {}", module)));
    }
    Ok(raw.into_iter().map(sanitize_file_name).collect())
}
