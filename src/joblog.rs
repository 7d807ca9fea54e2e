//! Best-effort append-only job log.
//!
//! The production site keeps a flat `hwp-process.log` next to the server so
//! operators can read a timestamped transcript of the last import without
//! grepping structured logs. This module reproduces that sink: one line per
//! event, ISO-8601 timestamp prefix, truncated at the start of each job.
//!
//! Every line is mirrored to `tracing` at info level, so the file is purely
//! additive. Write failures are swallowed by design — a full disk or a
//! read-only mount must never abort a conversion that would otherwise
//! succeed.

use chrono::Utc;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// Append-only, timestamped transcript of one job. Cheap to construct;
/// every write opens and closes the file so concurrent processes interleave
/// whole lines rather than corrupting each other.
#[derive(Debug)]
pub struct JobLog {
    path: Option<PathBuf>,
}

impl JobLog {
    /// Start a fresh transcript at `path`, truncating any previous one.
    /// `None` disables the file sink entirely.
    pub fn start(path: Option<PathBuf>, header: &str) -> Self {
        if let Some(ref p) = path {
            // Truncate; ignore failure (unwritable path just disables nothing,
            // later appends will fail silently too).
            let _ = std::fs::write(p, format!("--- {header} ---\n"));
        }
        Self { path }
    }

    /// Append one timestamped line; mirror it to tracing.
    pub fn log(&self, msg: &str) {
        info!("{msg}");
        let Some(ref path) = self.path else { return };
        let line = format!("[{}] {}\n", Utc::now().to_rfc3339(), msg);
        let _ = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut f| f.write_all(line.as_bytes()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_header_and_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job.log");
        let log = JobLog::start(Some(path.clone()), "HWP Conversion POST Started");
        log.log("Job Started: abc");
        log.log("Input file written");

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("--- HWP Conversion POST Started ---\n"));
        assert_eq!(text.lines().count(), 3);
        assert!(text.contains("Job Started: abc"));
        // Each appended line carries a timestamp prefix.
        assert!(text.lines().nth(1).unwrap().starts_with('['));
    }

    #[test]
    fn disabled_sink_is_silent() {
        let log = JobLog::start(None, "header");
        log.log("goes nowhere"); // must not panic
    }

    #[test]
    fn unwritable_path_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        // A directory is not a writable file target.
        let log = JobLog::start(Some(dir.path().to_path_buf()), "header");
        log.log("still must not panic");
    }
}
