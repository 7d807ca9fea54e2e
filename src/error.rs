//! Error types for the hwp-import library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`HwpImportError`] — **Fatal**: the import cannot proceed at all
//!   (no file uploaded, converter missing, conversion failed, no HTML
//!   produced). Returned as `Err(HwpImportError)` from
//!   [`crate::import::import_document`].
//!
//! * [`ImageError`] — **Non-fatal**: one image inside the document could not
//!   be re-hosted (file missing on disk, upload refused) but the rest of the
//!   document is fine. Stored inside [`crate::output::ImageOutcome`] so
//!   callers can inspect partial success rather than losing the whole
//!   document to one bad picture.
//!
//! Mandatory stages (intake, conversion, output discovery) abort the job on
//! the first error; the image stage aggregates per-item outcomes instead.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the hwp-import library.
///
/// Per-image failures use [`ImageError`] and are stored in
/// [`crate::output::ImageOutcome`] rather than propagated here.
#[derive(Debug, Error)]
pub enum HwpImportError {
    // ── Intake errors ─────────────────────────────────────────────────────
    /// The request carried no file (or an empty one). Client error.
    #[error("No file was supplied with the request")]
    MissingFile,

    /// Could not create or populate the job's temporary directory.
    #[error("Failed to stage the uploaded file: {source}")]
    StagingFailed {
        #[source]
        source: std::io::Error,
    },

    // ── Converter errors ──────────────────────────────────────────────────
    /// The hwp5html executable could not be resolved on this host.
    #[error(
        "hwp5html converter not found (looked for '{searched}')\n\
         Install it with: pip install pyhwp\n\
         Or point HWP5HTML_PATH at an existing executable."
    )]
    ToolUnavailable { searched: String },

    /// The converter was spawned but exited non-zero or could not start.
    ///
    /// `stdout`/`stderr` carry whatever the subprocess printed so operators
    /// can diagnose malformed documents without re-running by hand.
    #[error("hwp5html conversion failed: {detail}")]
    ConversionFailed {
        detail: String,
        stdout: String,
        stderr: String,
    },

    /// The converter exceeded the wall-clock budget and was killed.
    #[error("hwp5html conversion timed out after {secs}s")]
    ConversionTimeout {
        secs: u64,
        stdout: String,
        stderr: String,
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// The converter exited zero but produced no discoverable HTML file.
    #[error("Converter produced no HTML output in '{dir}'")]
    OutputNotFound { dir: PathBuf },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error at any stage.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HwpImportError {
    /// Captured converter output, when this error carries any.
    ///
    /// Returns `(stdout, stderr)` for the conversion-failure variants so the
    /// HTTP layer can attach diagnostics without matching every variant.
    pub fn converter_output(&self) -> Option<(&str, &str)> {
        match self {
            HwpImportError::ConversionFailed { stdout, stderr, .. }
            | HwpImportError::ConversionTimeout { stdout, stderr, .. } => {
                Some((stdout.as_str(), stderr.as_str()))
            }
            _ => None,
        }
    }
}

/// A non-fatal error for a single image inside the document.
///
/// Stored in [`crate::output::ImageOutcome`] when an image fails to re-host.
/// The overall import continues; the affected `<img>` keeps its original
/// `src` attribute.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum ImageError {
    /// The referenced file exists in none of the candidate directories.
    #[error("Image {index}: source file '{raw_name}' not found on disk")]
    SourceMissing { index: usize, raw_name: String },

    /// The file was read but the object store refused the upload.
    #[error("Image {index}: upload of '{new_name}' failed: {detail}")]
    UploadFailed {
        index: usize,
        new_name: String,
        detail: String,
    },

    /// The file exists but could not be read.
    #[error("Image {index}: failed to read '{raw_name}': {detail}")]
    ReadFailed {
        index: usize,
        raw_name: String,
        detail: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_failed_display_carries_detail() {
        let e = HwpImportError::ConversionFailed {
            detail: "exit status: 1".into(),
            stdout: String::new(),
            stderr: "boom".into(),
        };
        assert!(e.to_string().contains("exit status: 1"), "got: {e}");
    }

    #[test]
    fn timeout_display() {
        let e = HwpImportError::ConversionTimeout {
            secs: 60,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert!(e.to_string().contains("60s"));
    }

    #[test]
    fn converter_output_accessor() {
        let e = HwpImportError::ConversionFailed {
            detail: "x".into(),
            stdout: "out".into(),
            stderr: "err".into(),
        };
        assert_eq!(e.converter_output(), Some(("out", "err")));
        assert_eq!(HwpImportError::MissingFile.converter_output(), None);
    }

    #[test]
    fn image_error_display() {
        let e = ImageError::SourceMissing {
            index: 3,
            raw_name: "BIN0001.bmp".into(),
        };
        assert!(e.to_string().contains("BIN0001.bmp"));
        assert!(e.to_string().contains("Image 3"));
    }
}
