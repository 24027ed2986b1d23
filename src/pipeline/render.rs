//! PDF rasterisation: render selected pages to grayscale via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto a dedicated thread pool
//! thread designed for blocking operations, preventing the Tokio worker
//! threads from stalling during CPU-heavy rendering.
//!
//! ## Why DPI-true sizing?
//!
//! The classifier's pixel thresholds (minimum region width/height, the
//! ruled-line kernel) were tuned against 150-DPI geometry, so pages are
//! rendered at `page_points / 72 × dpi` rather than a fixed pixel width.
//! `max_rendered_pixels` still caps the longest edge so an oversized page
//! (A0 poster scanned into a loan package, it happens) cannot exhaust
//! memory.

use crate::config::ScanConfig;
use crate::error::{DocCheckError, PageError};
use crate::report::DocumentMetadata;
use image::GrayImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info, warn};

/// One rendered page, ready for classification.
pub struct RenderedPage {
    /// 0-based page index within the document.
    pub index: usize,
    /// 8-bit grayscale raster at the configured DPI.
    pub gray: GrayImage,
    /// The page's embedded text layer, extracted only when the license
    /// scan is enabled. Empty string for pages with no text layer.
    pub text: Option<String>,
}

/// Rasterise selected pages of a PDF into grayscale images.
///
/// Failures opening the document are fatal; failures rendering a single
/// page come back as a per-page [`PageError`] so one glitchy page never
/// loses the rest of the scan.
///
/// This runs inside `spawn_blocking` since pdfium operations are CPU-bound.
pub async fn render_pages(
    pdf_path: &Path,
    config: &ScanConfig,
    page_indices: &[usize],
) -> Result<Vec<Result<RenderedPage, PageError>>, DocCheckError> {
    let path = pdf_path.to_path_buf();
    let dpi = config.dpi;
    let max_pixels = config.max_rendered_pixels;
    let password = config.password.clone();
    let want_text = config.scan_license_text;
    let indices = page_indices.to_vec();

    tokio::task::spawn_blocking(move || {
        render_pages_blocking(&path, dpi, max_pixels, password.as_deref(), want_text, &indices)
    })
    .await
    .map_err(|e| DocCheckError::Internal(format!("Render task panicked: {}", e)))?
}

/// Bind to the pdfium shared library, preferring a copy next to the
/// executable, then the system library path.
fn bind_pdfium() -> Result<Pdfium, DocCheckError> {
    Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map(Pdfium::new)
        .map_err(|e| DocCheckError::PdfiumBindingFailed(format!("{:?}", e)))
}

/// Blocking implementation of page rendering.
fn render_pages_blocking(
    pdf_path: &Path,
    dpi: u32,
    max_pixels: u32,
    password: Option<&str>,
    want_text: bool,
    page_indices: &[usize],
) -> Result<Vec<Result<RenderedPage, PageError>>, DocCheckError> {
    let pdfium = bind_pdfium()?;

    let document = pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                DocCheckError::WrongPassword {
                    path: pdf_path.to_path_buf(),
                }
            } else {
                DocCheckError::PasswordRequired {
                    path: pdf_path.to_path_buf(),
                }
            }
        } else {
            DocCheckError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: err_str,
            }
        }
    })?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    let mut results = Vec::with_capacity(page_indices.len());

    for &idx in page_indices {
        if idx >= total_pages {
            warn!(
                "Skipping page {} (out of range, total={})",
                idx + 1,
                total_pages
            );
            continue;
        }

        let page = match pages.get(idx as u16) {
            Ok(p) => p,
            Err(e) => {
                results.push(Err(PageError::RenderFailed {
                    page: idx + 1,
                    detail: format!("{:?}", e),
                }));
                continue;
            }
        };

        // PDF points are 1/72 inch; scale to the requested DPI, then cap
        // the longest edge.
        let target_width = (page.width().value / 72.0 * dpi as f32).round() as i32;
        let render_config = PdfRenderConfig::new()
            .set_target_width(target_width.clamp(1, max_pixels as i32))
            .set_maximum_height(max_pixels as i32);

        let bitmap = match page.render_with_config(&render_config) {
            Ok(b) => b,
            Err(e) => {
                results.push(Err(PageError::RenderFailed {
                    page: idx + 1,
                    detail: format!("{:?}", e),
                }));
                continue;
            }
        };

        let gray = bitmap.as_image().to_luma8();
        debug!(
            "Rendered page {} → {}x{} px grayscale",
            idx + 1,
            gray.width(),
            gray.height()
        );

        let text = if want_text {
            match page.text() {
                Ok(t) => Some(t.all()),
                Err(e) => {
                    warn!("No text layer on page {}: {:?}", idx + 1, e);
                    Some(String::new())
                }
            }
        } else {
            None
        };

        results.push(Ok(RenderedPage {
            index: idx,
            gray,
            text,
        }));
    }

    Ok(results)
}

/// Extract document metadata from a PDF without rendering pages.
pub async fn extract_metadata(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<DocumentMetadata, DocCheckError> {
    let path = pdf_path.to_path_buf();
    let pwd = password.map(|s| s.to_string());

    tokio::task::spawn_blocking(move || extract_metadata_blocking(&path, pwd.as_deref()))
        .await
        .map_err(|e| DocCheckError::Internal(format!("Metadata task panicked: {}", e)))?
}

/// Blocking implementation of metadata extraction.
fn extract_metadata_blocking(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<DocumentMetadata, DocCheckError> {
    let pdfium = bind_pdfium()?;

    let document =
        pdfium
            .load_pdf_from_file(pdf_path, password)
            .map_err(|e| DocCheckError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: format!("{:?}", e),
            })?;

    let metadata = document.metadata();
    let pages = document.pages();

    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata.get(tag).and_then(|t| {
            let v = t.value().to_string();
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        })
    };

    Ok(DocumentMetadata {
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        subject: get_meta(PdfDocumentMetadataTagType::Subject),
        creator: get_meta(PdfDocumentMetadataTagType::Creator),
        producer: get_meta(PdfDocumentMetadataTagType::Producer),
        creation_date: get_meta(PdfDocumentMetadataTagType::CreationDate),
        modification_date: get_meta(PdfDocumentMetadataTagType::ModificationDate),
        page_count: pages.len() as usize,
        pdf_version: format!("{:?}", document.version()),
        is_encrypted: false, // pdfium doesn't readily expose this after opening
    })
}
