//! Pipeline stages for signature scanning.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. switch the rendering backend) without
//! touching other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ binarize ──▶ regions ──▶ classify ──▶ encode
//! (URL/path)  (pdfium)  (crop+mask)  (components)  (verdict)   (PNG)
//! ```
//!
//! 1. [`input`]    — canonicalise the user-supplied path or URL to a local file
//! 2. [`render`]   — rasterise selected pages to grayscale; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 3. [`binarize`] — crop to the scan region, adaptive inverse threshold,
//!    ruled-line suppression
//! 4. [`regions`]  — connected components and per-region metrics
//! 5. [`classify`] — the acceptance gates and annotated verdict
//! 6. [`encode`]   — PNG-encode annotated pages for saving/display
//! 7. [`expiry`]   — conditional text-layer scan for license expiry dates

pub mod binarize;
pub mod classify;
pub mod encode;
pub mod expiry;
pub mod input;
pub mod regions;
pub mod render;
