//! # hwp-import
//!
//! Convert HWP (Korean word processor) documents into HTML fragments ready
//! for a rich-text editor, re-hosting embedded images into object storage.
//!
//! ## Why this crate?
//!
//! Parish staff write homilies and bulletins in HWP. Pasting from the word
//! processor into a web editor loses bold runs, underlines, colours, and
//! every picture. This crate drives the `hwp5html` converter and then does
//! the unglamorous work the converter doesn't: folding the stylesheet into
//! the elements, moving images out of the job's temp directory into a public
//! bucket, and rewriting converter styling into the semantic tags
//! (`<strong>`, `<u>`, colour spans) an editor's document model accepts.
//!
//! ## Pipeline Overview
//!
//! ```text
//! HWP upload
//!  │
//!  ├─ 1. Intake     job id + isolated temp dir, input staged safely
//!  ├─ 2. Convert    hwp5html subprocess, 60 s budget, output captured
//!  ├─ 3. Discover   find index.html (or any .html/.xhtml) + styles.css
//!  ├─ 4. Inline     stylesheet rules → per-element style attributes
//!  ├─ 5. Images     upload to object store, src → public URL, per-item errors
//!  ├─ 6. Normalize  bold/underline/colour → semantic tags, strip the rest
//!  └─ 7. Cleanup    temp dir removed unconditionally (RAII)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hwp_import::{import_document, ImportConfig, MemoryStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ImportConfig::builder()
//!         .public_domain("https://cdn.example.org")
//!         .build()?;
//!     let store = MemoryStore::new(); // S3Store::from_credentials(...) in production
//!     let bytes = std::fs::read("sermon.hwp")?;
//!     let output = import_document(&bytes, "sermon.hwp", &config, &store).await?;
//!     println!("{}", output.fragment);
//!     eprintln!("images: {}/{} uploaded",
//!         output.stats.uploaded_images,
//!         output.stats.total_images);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | Enables the `hwp-import-server` binary (axum + clap + tracing-subscriber) |
//!
//! Disable `server` when using only the library:
//! ```toml
//! hwp-import = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
mod dom;
pub mod error;
pub mod import;
pub mod joblog;
pub mod output;
pub mod pipeline;
pub mod storage;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ImportConfig, ImportConfigBuilder};
pub use error::{HwpImportError, ImageError};
pub use import::{import_document, import_from_file};
pub use output::{ImageOutcome, ImageStatus, ImportOutput, ImportStats};
pub use storage::{MemoryStore, ObjectStore, S3Store, StoreError};
