//! Configuration for an HWP import job.
//!
//! All pipeline behaviour is controlled through [`ImportConfig`], built via
//! its [`ImportConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share a config across requests and to log it when diagnosing
//! why two runs of the same document behaved differently.
//!
//! # Design choice: builder over constructor
//! A ten-field constructor is unreadable and breaks on every new field. The
//! builder lets callers set only what they care about and rely on documented
//! defaults for the rest.

use crate::error::HwpImportError;
use std::path::PathBuf;

/// The subdirectory name passed to the converter via `--output`.
pub const OUTPUT_DIR_NAME: &str = "result";

/// Configuration for an HWP-to-fragment import.
///
/// Built via [`ImportConfig::builder()`] or [`ImportConfig::default()`].
///
/// # Example
/// ```rust
/// use hwp_import::ImportConfig;
///
/// let config = ImportConfig::builder()
///     .public_domain("https://cdn.example.org")
///     .convert_timeout_secs(30)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ImportConfig {
    /// Explicit path to the hwp5html executable. Default: None.
    ///
    /// When unset, resolution is platform-dependent: a fixed install path on
    /// Windows (pip drops the exe in the user Scripts directory) and a bare
    /// `hwp5html` resolved via PATH everywhere else.
    pub converter_path: Option<PathBuf>,

    /// Wall-clock budget for the converter subprocess in seconds. Default: 60.
    ///
    /// hwp5html normally finishes a church-bulletin-sized document in under a
    /// second; anything past a minute means a hung interpreter or a
    /// pathological document, and the request handler should not be blocked
    /// any longer than that.
    pub convert_timeout_secs: u64,

    /// Object-store key prefix for re-hosted images. Default: `uploads/hwp-images`.
    ///
    /// Keys become `{prefix}/{jobId}_{index}.{ext}`. The job id inside the
    /// filename is what keeps concurrent jobs from colliding in the shared
    /// bucket; the prefix only namespaces them away from regular attachment
    /// uploads.
    pub key_prefix: String,

    /// Public base URL under which object-store keys are reachable. Default: None.
    ///
    /// When set, rewritten `src` attributes become `{domain}/{key}`. When
    /// unset, a local relative `/{key}` path is emitted — that only works if
    /// something else serves the bucket under the site root, so production
    /// deployments should always configure this.
    pub public_domain: Option<String>,

    /// Path of the append-only job log. Default: `hwp-process.log` in the
    /// working directory. `None` disables the file sink (tracing output is
    /// unaffected). Write failures are swallowed; logging never aborts a job.
    pub log_path: Option<PathBuf>,

    /// Directory for debug artifact dumps (raw converter HTML, discovered
    /// CSS, final fragment). Default: None (disabled).
    ///
    /// Matches the raw/styles/debug files the production site drops next to
    /// its process log when an import misbehaves.
    pub debug_dump_dir: Option<PathBuf>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            converter_path: None,
            convert_timeout_secs: 60,
            key_prefix: "uploads/hwp-images".to_string(),
            public_domain: None,
            log_path: Some(PathBuf::from("hwp-process.log")),
            debug_dump_dir: None,
        }
    }
}

impl ImportConfig {
    /// Create a new builder for `ImportConfig`.
    pub fn builder() -> ImportConfigBuilder {
        ImportConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ImportConfig`].
#[derive(Debug)]
pub struct ImportConfigBuilder {
    config: ImportConfig,
}

impl ImportConfigBuilder {
    pub fn converter_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.converter_path = Some(path.into());
        self
    }

    pub fn convert_timeout_secs(mut self, secs: u64) -> Self {
        self.config.convert_timeout_secs = secs;
        self
    }

    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.key_prefix = prefix.into();
        self
    }

    pub fn public_domain(mut self, domain: impl Into<String>) -> Self {
        self.config.public_domain = Some(domain.into());
        self
    }

    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.log_path = Some(path.into());
        self
    }

    pub fn no_log_file(mut self) -> Self {
        self.config.log_path = None;
        self
    }

    pub fn debug_dump_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.debug_dump_dir = Some(dir.into());
        self
    }

    /// Validate and produce the final config.
    pub fn build(self) -> Result<ImportConfig, HwpImportError> {
        let mut config = self.config;

        if config.convert_timeout_secs == 0 {
            return Err(HwpImportError::InvalidConfig(
                "convert_timeout_secs must be at least 1".to_string(),
            ));
        }

        config.key_prefix = config.key_prefix.trim_matches('/').to_string();
        if config.key_prefix.is_empty() {
            return Err(HwpImportError::InvalidConfig(
                "key_prefix must not be empty".to_string(),
            ));
        }

        // Trailing slash here would double up when joined with "/{key}".
        if let Some(domain) = config.public_domain.take() {
            let trimmed = domain.trim_end_matches('/').to_string();
            if trimmed.is_empty() {
                return Err(HwpImportError::InvalidConfig(
                    "public_domain must not be empty; omit it for the relative-path fallback"
                        .to_string(),
                ));
            }
            config.public_domain = Some(trimmed);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_production_route() {
        let c = ImportConfig::default();
        assert_eq!(c.convert_timeout_secs, 60);
        assert_eq!(c.key_prefix, "uploads/hwp-images");
        assert!(c.public_domain.is_none());
        assert_eq!(c.log_path.as_deref(), Some(std::path::Path::new("hwp-process.log")));
    }

    #[test]
    fn builder_trims_domain_and_prefix() {
        let c = ImportConfig::builder()
            .public_domain("https://cdn.example.org/")
            .key_prefix("/custom/prefix/")
            .build()
            .unwrap();
        assert_eq!(c.public_domain.as_deref(), Some("https://cdn.example.org"));
        assert_eq!(c.key_prefix, "custom/prefix");
    }

    #[test]
    fn zero_timeout_rejected() {
        let err = ImportConfig::builder().convert_timeout_secs(0).build();
        assert!(matches!(err, Err(HwpImportError::InvalidConfig(_))));
    }

    #[test]
    fn empty_prefix_rejected() {
        let err = ImportConfig::builder().key_prefix("//").build();
        assert!(matches!(err, Err(HwpImportError::InvalidConfig(_))));
    }
}
