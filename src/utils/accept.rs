//! Upload candidate validation.
//!
//! The gate is intentionally permissive (extension OR media-type substring)
//! because platforms report inconsistent media types for spreadsheet files.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

/// Filename patterns accepted for analysis: Excel or CSV.
static SPREADSHEET_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(xlsx?|csv)$").unwrap());

/// A user-selected file, before submission.
///
/// Held only until hand-off to the analyze exchange; never retained after
/// the upload completes.
#[derive(Debug, Clone)]
pub struct UploadCandidate {
    /// Filename as selected (no directory components).
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Declared media type (best-effort; derived from the extension here the
    /// way a browser would report `File.type`).
    pub media_type: String,
}

/// Rejection reasons for an upload candidate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("'{0}' is not a supported file type. Please choose an Excel file (.xls, .xlsx) or CSV.")]
    UnsupportedType(String),
    #[error("'{0}' is empty")]
    EmptyFile(String),
}

/// Build an upload candidate from a path on disk.
pub fn candidate_from_path(path: &Path, size: u64) -> UploadCandidate {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let media_type = mime_guess::from_path(path)
        .first_raw()
        .unwrap_or("application/octet-stream")
        .to_string();
    UploadCandidate {
        name,
        size,
        media_type,
    }
}

/// Validate a candidate before any network activity.
///
/// Passes when the filename matches a spreadsheet/CSV extension
/// (case-insensitive) or the declared media type contains "spreadsheet" or
/// "csv". Failure aborts the submission; no request is made.
pub fn validate_candidate(candidate: &UploadCandidate) -> Result<(), ValidationError> {
    if candidate.size == 0 {
        return Err(ValidationError::EmptyFile(candidate.name.clone()));
    }

    let ok = SPREADSHEET_NAME.is_match(&candidate.name)
        || candidate.media_type.contains("spreadsheet")
        || candidate.media_type.contains("csv");

    if ok {
        Ok(())
    } else {
        Err(ValidationError::UnsupportedType(candidate.name.clone()))
    }
}
