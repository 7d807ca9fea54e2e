//! External conversion: run hwp5html against the staged input.
//!
//! ## Execution contract
//!
//! The converter is invoked as `<tool> --output <dir> <input-file>` with the
//! job directory as its working directory, mirroring how the production site
//! shells out to the pyhwp toolchain. Both stdout and stderr are captured
//! regardless of outcome so a failing document can be diagnosed from the job
//! log alone. A wall-clock timeout bounds the subprocess; on expiry the child
//! is killed and the job aborts. No partial converter output is ever used.

use crate::config::ImportConfig;
use crate::error::HwpImportError;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Fixed install location of hwp5html.exe on the Windows host the site runs
/// on (pip places console scripts under the per-user Scripts directory).
#[cfg(windows)]
const WINDOWS_HWP5HTML: &str =
    r"C:\Users\mugen\AppData\Roaming\Python\Python314\Scripts\hwp5html.exe";

/// Bare command resolved via PATH on non-Windows hosts.
#[cfg(not(windows))]
const HWP5HTML_COMMAND: &str = "hwp5html";

/// Captured subprocess output, kept verbatim for diagnostics.
#[derive(Debug)]
pub struct ConverterOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Resolve the converter executable, uniformly across platforms.
///
/// Order: explicit config override, then the platform default (fixed path on
/// Windows, PATH lookup elsewhere). A not-found result is always
/// [`HwpImportError::ToolUnavailable`] so callers never branch per platform.
pub fn resolve_converter(config: &ImportConfig) -> Result<PathBuf, HwpImportError> {
    if let Some(ref path) = config.converter_path {
        if path.is_file() {
            return Ok(path.clone());
        }
        return Err(HwpImportError::ToolUnavailable {
            searched: path.display().to_string(),
        });
    }

    platform_default()
}

#[cfg(windows)]
fn platform_default() -> Result<PathBuf, HwpImportError> {
    let path = PathBuf::from(WINDOWS_HWP5HTML);
    if path.is_file() {
        Ok(path)
    } else {
        Err(HwpImportError::ToolUnavailable {
            searched: WINDOWS_HWP5HTML.to_string(),
        })
    }
}

#[cfg(not(windows))]
fn platform_default() -> Result<PathBuf, HwpImportError> {
    if let Some(found) = search_path(HWP5HTML_COMMAND) {
        return Ok(found);
    }
    Err(HwpImportError::ToolUnavailable {
        searched: HWP5HTML_COMMAND.to_string(),
    })
}

/// Walk PATH entries for an executable file named `command`.
#[cfg(not(windows))]
fn search_path(command: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path_var) {
        let candidate = dir.join(command);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

/// Run the converter over the staged input, bounded by the configured
/// timeout.
///
/// `job_root` becomes the subprocess working directory; `input` and the
/// output directory name are passed relative to it, exactly as the
/// production invocation does.
pub async fn run_converter(
    tool: &Path,
    job_root: &Path,
    input_filename: &str,
    output_dir_name: &str,
    timeout_secs: u64,
) -> Result<ConverterOutput, HwpImportError> {
    debug!(
        "executing: {} --output {} {} (cwd {})",
        tool.display(),
        output_dir_name,
        input_filename,
        job_root.display()
    );

    let child = Command::new(tool)
        .arg("--output")
        .arg(output_dir_name)
        .arg(input_filename)
        .current_dir(job_root)
        .kill_on_drop(true)
        .output();

    let output = match tokio::time::timeout(Duration::from_secs(timeout_secs), child).await {
        Err(_elapsed) => {
            // kill_on_drop reaps the child when the future is dropped here.
            return Err(HwpImportError::ConversionTimeout {
                secs: timeout_secs,
                stdout: String::new(),
                stderr: String::new(),
            });
        }
        Ok(Err(spawn_err)) => {
            return Err(HwpImportError::ConversionFailed {
                detail: format!("failed to spawn converter: {spawn_err}"),
                stdout: String::new(),
                stderr: String::new(),
            });
        }
        Ok(Ok(output)) => output,
    };

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if !output.status.success() {
        return Err(HwpImportError::ConversionFailed {
            detail: output.status.to_string(),
            stdout,
            stderr,
        });
    }

    Ok(ConverterOutput { stdout, stderr })
}
