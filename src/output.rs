//! Output types for a completed import.

use crate::error::ImageError;
use serde::{Deserialize, Serialize};

/// The result of a successful import.
///
/// "Successful" means the mandatory stages all completed; individual images
/// may still have failed — check [`ImportStats::failed_images`] or walk
/// [`ImportOutput::images`] for per-item outcomes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportOutput {
    /// The final HTML fragment: no `<head>`, no `<meta>`, no `style`
    /// attributes except the generated `color` spans. Safe to hand to a
    /// rich-text editor's document model.
    pub fragment: String,

    /// The job identifier that prefixes every re-hosted image filename.
    pub job_id: String,

    /// Per-image outcomes in document order.
    pub images: Vec<ImageOutcome>,

    /// Timing and counts for the whole job.
    pub stats: ImportStats,
}

/// What happened to one `<img>` element, in document order.
///
/// The index is assigned by document traversal order and is stable for a
/// given input, so re-running the same bytes in the same job produces the
/// same generated filenames.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageOutcome {
    /// Zero-based position in document order.
    pub index: usize,

    /// Filename as referenced by the original `src` (separators normalised).
    pub raw_name: String,

    /// Outcome of re-hosting this image.
    pub status: ImageStatus,
}

/// Terminal state of one image reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ImageStatus {
    /// Bytes uploaded; the `src` attribute now points at this public URL.
    Uploaded { url: String },

    /// Upload or disk read failed; the `src` attribute was left untouched.
    Failed { error: ImageError },
}

impl ImageOutcome {
    pub fn is_uploaded(&self) -> bool {
        matches!(self.status, ImageStatus::Uploaded { .. })
    }
}

/// Statistics for one import job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportStats {
    /// `<img>` elements discovered in the converted document.
    pub total_images: usize,
    /// Images whose bytes reached the object store.
    pub uploaded_images: usize,
    /// Images left unresolved (missing on disk, read error, upload error).
    pub failed_images: usize,
    /// Wall-clock time spent inside the converter subprocess.
    pub convert_duration_ms: u64,
    /// Wall-clock time for the whole job, staging through cleanup.
    pub total_duration_ms: u64,
}
