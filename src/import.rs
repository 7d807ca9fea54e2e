//! Top-level import orchestration.
//!
//! One call runs the whole request-scoped pipeline, each stage to completion
//! before the next — there is no internal parallelism and no retry. A
//! failure in a mandatory stage (staging, conversion, discovery) aborts the
//! job immediately; only per-image upload failures are isolated. The job's
//! temporary directory is owned by a [`ConversionJob`] and removed whichever
//! way the function exits.

use crate::config::{ImportConfig, OUTPUT_DIR_NAME};
use crate::error::HwpImportError;
use crate::joblog::JobLog;
use crate::output::{ImportOutput, ImportStats};
use crate::pipeline::{convert, discover, images, inline, intake, normalize};
use crate::storage::ObjectStore;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Convert uploaded HWP bytes into a rich-text-ready HTML fragment.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `bytes`    — the uploaded document (empty input is rejected)
/// * `filename` — the client-supplied name; only its extension is used
/// * `config`   — pipeline configuration
/// * `store`    — object store receiving the re-hosted images
///
/// # Returns
/// `Ok(ImportOutput)` when the mandatory stages succeed, even if some images
/// could not be re-hosted (check `output.stats.failed_images`).
///
/// # Errors
/// Returns `Err(HwpImportError)` for fatal failures only: no file, converter
/// missing, conversion failed or timed out, no HTML produced.
pub async fn import_document(
    bytes: &[u8],
    filename: &str,
    config: &ImportConfig,
    store: &dyn ObjectStore,
) -> Result<ImportOutput, HwpImportError> {
    let total_start = Instant::now();
    let log = JobLog::start(config.log_path.clone(), "HWP Conversion Started");

    // ── Step 1: Stage the upload ─────────────────────────────────────────
    // Validates before creating anything, so a missing file leaves no
    // directory behind.
    let job = intake::ConversionJob::stage(bytes, filename)?;
    log.log(&format!("Job Started: {} for file: {}", job.id(), filename));
    log.log(&format!("Input file written: {}", job.input_path().display()));

    // ── Step 2: Run the converter ────────────────────────────────────────
    let tool = convert::resolve_converter(config)?;
    log.log(&format!("Executing hwp5html: {}", tool.display()));

    let input_filename = job
        .input_path()
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| HwpImportError::Internal("staged input has no filename".into()))?
        .to_string();

    let convert_start = Instant::now();
    let converter_result = convert::run_converter(
        &tool,
        job.root(),
        &input_filename,
        OUTPUT_DIR_NAME,
        config.convert_timeout_secs,
    )
    .await;
    let convert_duration_ms = convert_start.elapsed().as_millis() as u64;

    if let Err(e) = converter_result {
        log.log(&format!("hwp5html failed: {e}"));
        return Err(e);
    }
    log.log("hwp5html completed successfully");

    // ── Step 3: Discover the output ──────────────────────────────────────
    let output_dir = job.output_dir();
    let discovered = discover::discover_output(&output_dir).inspect_err(|_| {
        log.log("Error: Converted HTML not found");
    })?;

    let html = std::fs::read_to_string(&discovered.html_path)
        .map_err(|e| HwpImportError::Internal(format!("failed to read converter HTML: {e}")))?;
    dump_debug(config, "hwp-raw.html", html.as_bytes());

    let css = match discovered.css_path {
        Some(ref path) => {
            let css = std::fs::read_to_string(path).map_err(|e| {
                HwpImportError::Internal(format!("failed to read stylesheet: {e}"))
            })?;
            log.log(&format!("styles.css found ({} bytes)", css.len()));
            dump_debug(config, "hwp-styles.css", css.as_bytes());
            Some(css)
        }
        None => {
            log.log("styles.css NOT found");
            None
        }
    };

    // ── Step 4: Inline the stylesheet ────────────────────────────────────
    log.log("Starting style inlining...");
    let doc = inline::inline_document(&html, css.as_deref());
    log.log("Style inlining completed");

    // ── Step 5: Re-host images ───────────────────────────────────────────
    let outcomes = images::rehost_images(
        &doc,
        &output_dir,
        job.root(),
        job.id(),
        config,
        store,
        &log,
    )
    .await;

    // ── Step 6: Normalize styles into semantic markup ────────────────────
    log.log("Starting style normalization...");
    let fragment = normalize::normalize_document(&doc);
    log.log("Style normalization completed");
    dump_debug(config, "hwp-debug.html", fragment.as_bytes());

    // ── Step 7: Cleanup + stats ──────────────────────────────────────────
    let job_id = job.id().to_string();
    job.cleanup();
    log.log("Temp directory removed");

    let uploaded = outcomes.iter().filter(|o| o.is_uploaded()).count();
    let stats = ImportStats {
        total_images: outcomes.len(),
        uploaded_images: uploaded,
        failed_images: outcomes.len() - uploaded,
        convert_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "import complete: job {}, {}/{} images, {}ms total",
        job_id, stats.uploaded_images, stats.total_images, stats.total_duration_ms
    );

    Ok(ImportOutput {
        fragment,
        job_id,
        images: outcomes,
        stats,
    })
}

/// Import a document already on disk. Reads the file and delegates to
/// [`import_document`]; the on-disk name supplies the extension.
pub async fn import_from_file(
    path: impl AsRef<Path>,
    config: &ImportConfig,
    store: &dyn ObjectStore,
) -> Result<ImportOutput, HwpImportError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => HwpImportError::MissingFile,
        _ => HwpImportError::Internal(format!("failed to read '{}': {e}", path.display())),
    })?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("input.hwp");
    import_document(&bytes, filename, config, store).await
}

/// Best-effort debug artifact dump; failures are logged, never raised.
fn dump_debug(config: &ImportConfig, name: &str, bytes: &[u8]) {
    let Some(ref dir) = config.debug_dump_dir else {
        return;
    };
    if let Err(e) = std::fs::create_dir_all(dir).and_then(|()| std::fs::write(dir.join(name), bytes))
    {
        warn!("debug dump {name} failed: {e}");
    }
}
