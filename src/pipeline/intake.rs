//! Job intake: assign an identifier and stage the upload in an isolated
//! temporary directory.
//!
//! ## Why a TempDir per job?
//!
//! hwp5html requires a file-system path and scribbles its output (HTML, CSS,
//! a `bindata/` folder of images) next to it. Giving every job its own
//! uniquely named `TempDir` means concurrent requests can never see each
//! other's files, and dropping [`ConversionJob`] removes the whole tree —
//! even on early return or panic — which is the pipeline's unconditional
//! cleanup guarantee.

use crate::config::OUTPUT_DIR_NAME;
use crate::error::HwpImportError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};
use uuid::Uuid;

/// One import job: identifier plus exclusively owned working directory.
///
/// The directory layout after staging:
///
/// ```text
/// {tempdir}/
///   input.hwp        the uploaded bytes, under a collision-safe name
///   result/          created by the converter (stage 2)
/// ```
#[derive(Debug)]
pub struct ConversionJob {
    id: String,
    temp: TempDir,
    input_path: PathBuf,
}

impl ConversionJob {
    /// Stage uploaded bytes into a fresh job directory.
    ///
    /// Fails with [`HwpImportError::MissingFile`] when `bytes` is empty —
    /// before any directory is created, so a rejected request leaves nothing
    /// behind on disk.
    ///
    /// The input keeps only the extension of `original_filename`
    /// (`input.hwp`, `input.hwpx`, …): the uploaded name is user-controlled
    /// and must never become a path component.
    pub fn stage(bytes: &[u8], original_filename: &str) -> Result<Self, HwpImportError> {
        if bytes.is_empty() {
            return Err(HwpImportError::MissingFile);
        }

        let id = Uuid::new_v4().to_string();
        let temp = tempfile::Builder::new()
            .prefix("hwp-import-")
            .tempdir()
            .map_err(|e| HwpImportError::StagingFailed { source: e })?;

        let ext = Path::new(original_filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("hwp");
        let input_path = temp.path().join(format!("input.{ext}"));

        std::fs::write(&input_path, bytes)
            .map_err(|e| HwpImportError::StagingFailed { source: e })?;

        debug!("staged job {} at {}", id, input_path.display());
        Ok(Self {
            id,
            temp,
            input_path,
        })
    }

    /// The generated job identifier (a UUID v4).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Root of the job's working directory.
    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    /// Path of the staged input file.
    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    /// Directory the converter is asked to write into (`{root}/result`).
    pub fn output_dir(&self) -> PathBuf {
        self.temp.path().join(OUTPUT_DIR_NAME)
    }

    /// Remove the working directory now instead of waiting for drop.
    /// Failure is logged, never raised.
    pub fn cleanup(self) {
        let path = self.temp.path().to_path_buf();
        if let Err(e) = self.temp.close() {
            warn!("failed to remove job directory {}: {e}", path.display());
        }
    }
}
