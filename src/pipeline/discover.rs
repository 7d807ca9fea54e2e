//! Output discovery: find the HTML and stylesheet the converter produced.
//!
//! hwp5html conventionally writes `index.html`, but the name has varied
//! across converter versions, so when the conventional file is absent the
//! directory is scanned for the first HTML-family file instead. The
//! stylesheet (`styles.css`) is optional — older documents carry no styles
//! and the inlining stage simply skips.

use crate::error::HwpImportError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Conventional primary output filename.
const PRIMARY_HTML: &str = "index.html";
/// Conventional stylesheet filename.
const STYLESHEET: &str = "styles.css";

/// What the converter left behind.
#[derive(Debug)]
pub struct DiscoveredOutput {
    pub html_path: PathBuf,
    /// Absent when the converter emitted no stylesheet; not an error.
    pub css_path: Option<PathBuf>,
}

/// Locate the converter's HTML output, preferring `index.html` and falling
/// back to the first `.html` / `.xhtml` file in the directory.
pub fn discover_output(output_dir: &Path) -> Result<DiscoveredOutput, HwpImportError> {
    let primary = output_dir.join(PRIMARY_HTML);
    let html_path = if primary.is_file() {
        primary
    } else {
        scan_for_html(output_dir).ok_or_else(|| HwpImportError::OutputNotFound {
            dir: output_dir.to_path_buf(),
        })?
    };

    let css = output_dir.join(STYLESHEET);
    let css_path = css.is_file().then_some(css);

    debug!(
        "discovered {} (stylesheet: {})",
        html_path.display(),
        css_path.is_some()
    );
    Ok(DiscoveredOutput {
        html_path,
        css_path,
    })
}

/// First file in `dir` with an HTML-family extension, in directory order.
fn scan_for_html(dir: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        match path.extension().and_then(|e| e.to_str()) {
            Some("html") | Some("xhtml") => return Some(path),
            _ => {}
        }
    }
    None
}
