//! Integration tests for the full import pipeline.
//!
//! The real hwp5html converter is a Python tool that is not installed in CI,
//! so these tests stand in a small shell script that reproduces its
//! observable contract: invoked as `<tool> --output <dir> <input>` with the
//! job directory as cwd, it populates `<dir>` with HTML, an optional
//! stylesheet, and a `bindata/` folder of images. Everything downstream of
//! the subprocess boundary is exercised for real.

#![cfg(unix)]

use hwp_import::{import_document, HwpImportError, ImportConfig, MemoryStore};
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

// ── Fixture helpers ──────────────────────────────────────────────────────

/// A fake converter: a shell script that copies a prepared fixture tree into
/// the requested output directory.
struct FakeConverter {
    _dir: tempfile::TempDir,
    script: PathBuf,
    fixture: PathBuf,
}

impl FakeConverter {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let fixture = dir.path().join("fixture");
        std::fs::create_dir_all(&fixture).unwrap();

        let script = dir.path().join("hwp5html-fake.sh");
        let mut f = std::fs::File::create(&script).unwrap();
        writeln!(
            f,
            "#!/bin/sh\nmkdir -p \"$2\"\ncp -R {}/. \"$2\"/",
            fixture.display()
        )
        .unwrap();
        let mut perms = f.metadata().unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&script, perms).unwrap();

        Self {
            _dir: dir,
            script,
            fixture,
        }
    }

    fn write(&self, rel: &str, contents: &[u8]) -> &Self {
        let path = self.fixture.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
        self
    }

    fn config(&self) -> ImportConfig {
        ImportConfig::builder()
            .converter_path(&self.script)
            .no_log_file()
            .build()
            .unwrap()
    }
}

/// A converter fixture resembling real hwp5html output: classed paragraphs,
/// a stylesheet, and one embedded image.
fn typical_converter() -> FakeConverter {
    let conv = FakeConverter::new();
    conv.write(
        "index.html",
        br#"<html><head><meta charset="utf-8"><title>doc</title></head>
<body>
<p class="HStyle0">First paragraph</p>
<p class="HStyle1" style="text-decoration: underline">Second</p>
<p><img src="bindata\BIN0001.png"></p>
</body></html>"#,
    );
    conv.write(
        "styles.css",
        b".HStyle0 { font-weight: bold; color: red } .HStyle1 { font-size: 10pt }",
    );
    conv.write("bindata/BIN0001.png", b"not-really-a-png");
    conv
}

// ── Mandatory-stage failures ─────────────────────────────────────────────

#[tokio::test]
async fn empty_upload_is_rejected_with_missing_file() {
    let conv = FakeConverter::new();
    let store = MemoryStore::new();
    let err = import_document(&[], "doc.hwp", &conv.config(), &store)
        .await
        .unwrap_err();
    assert!(matches!(err, HwpImportError::MissingFile));
}

#[tokio::test]
async fn missing_converter_is_tool_unavailable() {
    let config = ImportConfig::builder()
        .converter_path("/nowhere/hwp5html")
        .no_log_file()
        .build()
        .unwrap();
    let store = MemoryStore::new();
    let err = import_document(b"bytes", "doc.hwp", &config, &store)
        .await
        .unwrap_err();
    assert!(matches!(err, HwpImportError::ToolUnavailable { .. }));
}

#[tokio::test]
async fn failing_converter_aborts_with_captured_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("broken.sh");
    std::fs::write(&script, "#!/bin/sh\necho cannot parse document >&2\nexit 1\n").unwrap();
    let mut perms = std::fs::metadata(&script).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&script, perms).unwrap();

    let config = ImportConfig::builder()
        .converter_path(&script)
        .no_log_file()
        .build()
        .unwrap();
    let store = MemoryStore::new();
    let err = import_document(b"bytes", "doc.hwp", &config, &store)
        .await
        .unwrap_err();
    match err {
        HwpImportError::ConversionFailed { stderr, .. } => {
            assert!(stderr.contains("cannot parse document"));
        }
        other => panic!("expected ConversionFailed, got {other:?}"),
    }
    assert!(store.is_empty());
}

#[tokio::test]
async fn converter_without_html_output_is_output_not_found() {
    let conv = FakeConverter::new();
    conv.write("styles.css", b".a { color: red }");
    let store = MemoryStore::new();
    let err = import_document(b"bytes", "doc.hwp", &conv.config(), &store)
        .await
        .unwrap_err();
    assert!(matches!(err, HwpImportError::OutputNotFound { .. }));
}

// ── Happy path ───────────────────────────────────────────────────────────

#[tokio::test]
async fn full_pipeline_produces_clean_fragment_and_uploads_images() {
    let conv = typical_converter();
    let store = MemoryStore::new();
    let output = import_document(b"HWP bytes", "bulletin.hwp", &conv.config(), &store)
        .await
        .unwrap();

    // Fragment hygiene: no head, meta, or converter styling. (Class
    // attributes survive — the editor ignores them — matching production.)
    assert!(!output.fragment.contains("<head"));
    assert!(!output.fragment.contains("<meta"));
    assert!(!output.fragment.contains("<title"));
    assert!(!output.fragment.contains("font-weight"));
    assert!(!output.fragment.contains("font-size"));

    // Stylesheet bold+color resolved into semantic wrappers, span outermost.
    assert!(
        output
            .fragment
            .contains(r#"<span style="color: red"><strong>First paragraph</strong></span>"#),
        "fragment: {}",
        output.fragment
    );
    // Pre-existing inline underline preserved as a semantic tag.
    assert!(output.fragment.contains("<u>Second</u>"));

    // Image uploaded under the job-tagged key and the src rewritten.
    let key = format!("uploads/hwp-images/{}_0.png", output.job_id);
    let (bytes, content_type) = store.get(&key).unwrap();
    assert_eq!(bytes, b"not-really-a-png");
    assert_eq!(content_type, "image/png");
    assert!(output.fragment.contains(&format!("src=\"/{key}\"")));

    assert_eq!(output.stats.total_images, 1);
    assert_eq!(output.stats.uploaded_images, 1);
    assert_eq!(output.stats.failed_images, 0);
}

#[tokio::test]
async fn public_domain_prefixes_rewritten_urls() {
    let conv = typical_converter();
    let config = ImportConfig::builder()
        .converter_path(&conv.script)
        .public_domain("https://cdn.example.org")
        .no_log_file()
        .build()
        .unwrap();
    let store = MemoryStore::new();
    let output = import_document(b"bytes", "doc.hwp", &config, &store)
        .await
        .unwrap();

    let expected = format!(
        "https://cdn.example.org/uploads/hwp-images/{}_0.png",
        output.job_id
    );
    assert!(
        output.fragment.contains(&expected),
        "fragment: {}",
        output.fragment
    );
}

#[tokio::test]
async fn missing_stylesheet_is_a_noop_not_a_failure() {
    let conv = FakeConverter::new();
    conv.write(
        "index.html",
        b"<html><body><p style=\"font-weight: bold\">X</p></body></html>",
    );
    let store = MemoryStore::new();
    let output = import_document(b"bytes", "doc.hwp", &conv.config(), &store)
        .await
        .unwrap();
    assert!(output.fragment.contains("<strong>X</strong>"));
}

#[tokio::test]
async fn discovery_falls_back_to_xhtml() {
    let conv = FakeConverter::new();
    conv.write("converted.xhtml", b"<html><body><p>X</p></body></html>");
    let store = MemoryStore::new();
    let output = import_document(b"bytes", "doc.hwp", &conv.config(), &store)
        .await
        .unwrap();
    assert!(output.fragment.contains("<p>X</p>"));
}

// ── Per-image isolation ──────────────────────────────────────────────────

#[tokio::test]
async fn upload_failures_do_not_abort_the_job() {
    let conv = typical_converter();
    let store = MemoryStore::failing();
    let output = import_document(b"bytes", "doc.hwp", &conv.config(), &store)
        .await
        .unwrap();

    assert_eq!(output.stats.total_images, 1);
    assert_eq!(output.stats.uploaded_images, 0);
    assert_eq!(output.stats.failed_images, 1);
    // Unresolved image keeps its original (normalised) reference — never a
    // temp-directory path.
    assert!(output.fragment.contains(r#"src="bindata\BIN0001.png""#));
    assert!(!output.fragment.contains("/tmp/"));
}

#[tokio::test]
async fn missing_image_on_disk_is_logged_not_fatal() {
    let conv = FakeConverter::new();
    conv.write(
        "index.html",
        br#"<html><body><img src="bindata/GONE.png"><p>text survives</p></body></html>"#,
    );
    let store = MemoryStore::new();
    let output = import_document(b"bytes", "doc.hwp", &conv.config(), &store)
        .await
        .unwrap();
    assert_eq!(output.stats.failed_images, 1);
    assert!(output.fragment.contains("text survives"));
    assert!(store.is_empty());
}

// ── Determinism ──────────────────────────────────────────────────────────

#[tokio::test]
async fn reprocessing_identical_bytes_differs_only_in_job_id() {
    let conv = typical_converter();
    let store = MemoryStore::new();
    let config = conv.config();

    let a = import_document(b"same bytes", "doc.hwp", &config, &store)
        .await
        .unwrap();
    let b = import_document(b"same bytes", "doc.hwp", &config, &store)
        .await
        .unwrap();

    assert_ne!(a.job_id, b.job_id);
    let canon_a = a.fragment.replace(&a.job_id, "JOB");
    let canon_b = b.fragment.replace(&b.job_id, "JOB");
    assert_eq!(canon_a, canon_b);
}

// ── Artifacts ────────────────────────────────────────────────────────────

#[tokio::test]
async fn job_log_records_the_transcript() {
    let conv = typical_converter();
    let log_dir = tempfile::tempdir().unwrap();
    let log_path = log_dir.path().join("hwp-process.log");
    let config = ImportConfig::builder()
        .converter_path(&conv.script)
        .log_path(&log_path)
        .build()
        .unwrap();
    let store = MemoryStore::new();
    import_document(b"bytes", "doc.hwp", &config, &store)
        .await
        .unwrap();

    let transcript = std::fs::read_to_string(&log_path).unwrap();
    assert!(transcript.contains("Job Started:"));
    assert!(transcript.contains("hwp5html completed successfully"));
    assert!(transcript.contains("styles.css found"));
    assert!(transcript.contains("Image processed: BIN0001.png"));
    assert!(transcript.contains("Temp directory removed"));
}

#[tokio::test]
async fn debug_dumps_are_written_when_enabled() {
    let conv = typical_converter();
    let dump_dir = tempfile::tempdir().unwrap();
    let dump = dump_dir.path().join("dumps");
    let config = ImportConfig::builder()
        .converter_path(&conv.script)
        .debug_dump_dir(&dump)
        .no_log_file()
        .build()
        .unwrap();
    let store = MemoryStore::new();
    let output = import_document(b"bytes", "doc.hwp", &config, &store)
        .await
        .unwrap();

    assert!(dump.join("hwp-raw.html").is_file());
    assert!(dump.join("hwp-styles.css").is_file());
    let final_dump = std::fs::read_to_string(dump.join("hwp-debug.html")).unwrap();
    assert_eq!(final_dump, output.fragment);
}
