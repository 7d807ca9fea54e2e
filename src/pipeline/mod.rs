//! Pipeline stages for HWP-to-fragment import.
//!
//! Each submodule implements exactly one transformation step. Keeping stages
//! separate makes each independently testable and lets us swap
//! implementations (e.g. a different converter binary) without touching the
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! intake ──▶ convert ──▶ discover ──▶ inline ──▶ images ──▶ normalize
//! (temp dir) (hwp5html)  (html+css)   (style     (object    (strong/u/
//!                                      attrs)     store)     span tags)
//! ```
//!
//! 1. [`intake`]    — assign a job id, stage the upload in an isolated temp dir
//! 2. [`convert`]   — run hwp5html as a subprocess with a 60 s budget; the
//!    only stage that spawns a process
//! 3. [`discover`]  — locate the produced HTML (name varies by converter
//!    version) and the optional `styles.css`
//! 4. [`inline`]    — fold stylesheet rules into per-element `style`
//!    attributes so no external CSS survives
//! 5. [`images`]    — re-host every referenced image into the object store
//!    and rewrite `src`; the only stage with network I/O, and the only one
//!    where failures are per-item instead of fatal
//! 6. [`normalize`] — convert inline bold/underline/color into semantic
//!    markup, strip heads and style attributes, emit the body fragment

pub mod convert;
pub mod discover;
pub mod images;
pub mod inline;
pub mod intake;
pub mod normalize;
