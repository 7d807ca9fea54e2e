//! Image extraction and re-hosting.
//!
//! Every `<img>` in the converted document points at a file inside the job's
//! temporary directory — a reference that dies with the job. This stage
//! walks the images in document order, uploads each one to the object store
//! under a collision-safe `{jobId}_{index}.{ext}` name, and rewrites the
//! `src` to the public URL. Indices follow document traversal order, so
//! re-running the same bytes in the same job reproduces the same filenames.
//!
//! Failures here are per-item: a missing or unuploadable image is logged and
//! its tag left untouched, and the import carries on. One broken picture
//! must not cost the user the whole document.

use crate::config::ImportConfig;
use crate::error::ImageError;
use crate::joblog::JobLog;
use crate::output::{ImageOutcome, ImageStatus};
use crate::storage::ObjectStore;
use kuchikiki::NodeRef;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Substituted when the referenced file has no usable extension. hwp5html
/// emits `.tmp` for embedded pictures it could not classify; they are JPEGs
/// in every document we have seen.
const DEFAULT_IMAGE_EXT: &str = "jpg";

/// Derive `(raw filename, collision-safe new filename)` from an `img` `src`.
///
/// Backslashes are normalised first — hwp5html on Windows writes `bindata\x`
/// references. A `.tmp` or missing extension becomes [`DEFAULT_IMAGE_EXT`].
pub fn derive_image_name(src: &str, job_id: &str, index: usize) -> Option<(String, String)> {
    let clean = src.replace('\\', "/");
    let raw_name = clean.rsplit('/').next()?.trim().to_string();
    if raw_name.is_empty() {
        return None;
    }

    let ext = match raw_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() && !ext.eq_ignore_ascii_case("tmp") => {
            ext.to_string()
        }
        _ => DEFAULT_IMAGE_EXT.to_string(),
    };

    Some((raw_name.clone(), format!("{job_id}_{index}.{ext}")))
}

/// MIME type for an image file extension. Explicit mapping for the common
/// raster formats, generic `image/<ext>` fallback for the rest.
pub fn mime_for_extension(ext: &str) -> String {
    match ext.to_ascii_lowercase().as_str() {
        "png" => "image/png".to_string(),
        "jpg" | "jpeg" => "image/jpeg".to_string(),
        "gif" => "image/gif".to_string(),
        "bmp" => "image/bmp".to_string(),
        "webp" => "image/webp".to_string(),
        other => format!("image/{other}"),
    }
}

/// Public URL for an object key: domain-prefixed when a public domain is
/// configured, local relative path otherwise.
pub fn public_url(config: &ImportConfig, key: &str) -> String {
    match config.public_domain {
        Some(ref domain) => format!("{domain}/{key}"),
        None => format!("/{key}"),
    }
}

/// Locate `raw_name` on disk, trying the converter's `bindata/` folder, the
/// output directory, then the job root, in that order.
///
/// All three are searched because different converter versions have dropped
/// images in different places; the order matches the production site and
/// must not be changed without re-testing against old documents.
fn find_image_source(raw_name: &str, output_dir: &Path, job_root: &Path) -> Option<PathBuf> {
    let candidates = [
        output_dir.join("bindata").join(raw_name),
        output_dir.join(raw_name),
        job_root.join(raw_name),
    ];
    candidates.into_iter().find(|p| p.is_file())
}

/// Upload every referenced image and rewrite its `src` to the public URL.
///
/// Returns per-image outcomes in document order. Uploads run one at a time,
/// deliberately: documents rarely carry more than a handful of pictures, and
/// a sequential loop bounds memory and never floods the bucket.
pub async fn rehost_images(
    doc: &NodeRef,
    output_dir: &Path,
    job_root: &Path,
    job_id: &str,
    config: &ImportConfig,
    store: &dyn ObjectStore,
    log: &JobLog,
) -> Vec<ImageOutcome> {
    let images: Vec<_> = match doc.select("img") {
        Ok(sel) => sel.collect(),
        Err(()) => return Vec::new(),
    };
    log.log(&format!("Processing {} images...", images.len()));

    let mut outcomes = Vec::new();
    for (index, el) in images.iter().enumerate() {
        let src = el.attributes.borrow().get("src").map(str::to_string);
        let Some(src) = src else { continue };
        let Some((raw_name, new_name)) = derive_image_name(&src, job_id, index) else {
            continue;
        };

        let status = rehost_one(
            &raw_name, &new_name, index, output_dir, job_root, config, store, log,
        )
        .await;

        if let ImageStatus::Uploaded { ref url } = status {
            el.attributes.borrow_mut().insert("src", url.clone());
        }

        outcomes.push(ImageOutcome {
            index,
            raw_name,
            status,
        });
    }

    outcomes
}

#[allow(clippy::too_many_arguments)]
async fn rehost_one(
    raw_name: &str,
    new_name: &str,
    index: usize,
    output_dir: &Path,
    job_root: &Path,
    config: &ImportConfig,
    store: &dyn ObjectStore,
    log: &JobLog,
) -> ImageStatus {
    let Some(source_path) = find_image_source(raw_name, output_dir, job_root) else {
        log.log(&format!("Warning: Image NOT FOUND: {raw_name}"));
        return ImageStatus::Failed {
            error: ImageError::SourceMissing {
                index,
                raw_name: raw_name.to_string(),
            },
        };
    };

    let bytes = match tokio::fs::read(&source_path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("failed to read {}: {e}", source_path.display());
            return ImageStatus::Failed {
                error: ImageError::ReadFailed {
                    index,
                    raw_name: raw_name.to_string(),
                    detail: e.to_string(),
                },
            };
        }
    };

    let ext = new_name.rsplit_once('.').map(|(_, e)| e).unwrap_or(DEFAULT_IMAGE_EXT);
    let content_type = mime_for_extension(ext);
    let key = format!("{}/{}", config.key_prefix, new_name);

    match store.put(&key, bytes, &content_type).await {
        Ok(()) => {
            let url = public_url(config, &key);
            log.log(&format!("Image processed: {raw_name} -> {new_name}"));
            ImageStatus::Uploaded { url }
        }
        Err(e) => {
            log.log(&format!("Warning: Image upload failed: {new_name}: {e}"));
            ImageStatus::Failed {
                error: ImageError::UploadFailed {
                    index,
                    new_name: new_name.to_string(),
                    detail: e.to_string(),
                },
            }
        }
    }
}
