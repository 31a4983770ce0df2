use chrono::{DateTime, Local};
use once_cell::sync::Lazy;
use regex::Regex;
use rocket::fs::TempFile;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

use crate::config::AppConfig;
use crate::error::AppError;

/// Relative prefix stored in the database and used as the public mount point.
pub const UPLOADS_PREFIX: &str = "uploads";

static UNSAFE_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.-]").expect("static regex"));

/// Reduces a client-supplied file name to ASCII letters, digits, `_`, `.`
/// and `-`, with no path components.
pub fn sanitize_filename(name: &str) -> String {
    let ascii: String = name.chars().filter(|c| c.is_ascii()).collect();
    let spaced = ascii.replace(['/', '\\'], " ");
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned = UNSAFE_FILENAME_CHARS.replace_all(&joined, "");

    cleaned.trim_matches(|c| c == '.' || c == '_').to_string()
}

fn extension(name: &str) -> Option<String> {
    name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase())
}

/// Writes certificate uploads into one directory under
/// `<timestamp>_<sanitized name>`.
#[derive(Debug, Clone)]
pub struct UploadSink {
    upload_dir: PathBuf,
    allowed_extensions: Vec<String>,
}

impl UploadSink {
    pub fn new(upload_dir: impl Into<PathBuf>, allowed_extensions: &[String]) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            allowed_extensions: allowed_extensions
                .iter()
                .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.upload_folder, &config.allowed_extensions)
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn is_allowed(&self, filename: &str) -> bool {
        extension(filename)
            .map(|ext| self.allowed_extensions.iter().any(|allowed| *allowed == ext))
            .unwrap_or(false)
    }

    /// "Invalid file type. Please upload PDF, PNG, JPG, or JPEG files."
    pub fn rejection_message(&self) -> String {
        let names: Vec<String> = self
            .allowed_extensions
            .iter()
            .map(|e| e.to_ascii_uppercase())
            .collect();

        let listed = match names.as_slice() {
            [] => String::from("supported"),
            [only] => only.clone(),
            [init @ .., last] => format!("{}, or {}", init.join(", "), last),
        };

        format!("Invalid file type. Please upload {} files.", listed)
    }

    pub fn stored_name(&self, filename: &str, now: DateTime<Local>) -> String {
        let mut sanitized = sanitize_filename(filename);
        if sanitized.is_empty() {
            sanitized = String::from("certificate");
        }
        format!("{}_{}", now.format("%Y%m%d%H%M%S"), sanitized)
    }

    /// Persists `file` if one was actually submitted.
    ///
    /// Returns the path to record on the achievement (`uploads/<name>`), or
    /// `None` when the field was left empty. A disallowed extension fails
    /// before anything touches the disk.
    #[instrument(skip_all)]
    pub async fn save(&self, file: &mut TempFile<'_>) -> Result<Option<String>, AppError> {
        let Some(raw_name) = file
            .raw_name()
            .map(|n| n.dangerous_unsafe_unsanitized_raw().as_str().to_string())
            .filter(|n| !n.is_empty())
        else {
            return Ok(None);
        };

        if !self.is_allowed(&raw_name) {
            return Err(AppError::Validation(self.rejection_message()));
        }

        let stored_name = self.stored_name(&raw_name, Local::now());
        let destination = self.upload_dir.join(&stored_name);

        rocket::tokio::fs::create_dir_all(&self.upload_dir).await?;
        file.copy_to(&destination).await?;

        info!(
            file = %stored_name,
            bytes = file.len(),
            "Stored certificate upload"
        );

        Ok(Some(format!("{}/{}", UPLOADS_PREFIX, stored_name)))
    }
}
