//! Eager (full-document) scan entry points.
//!
//! ## Why eager vs. streaming?
//!
//! This module provides the simpler API: wait for all pages, then return.
//! It collects every [`PageVerdict`] into memory and aggregates the summary
//! before returning. Use [`crate::stream::scan_stream`] instead when you
//! want verdicts progressively or need to limit peak memory on documents
//! with hundreds of pages.

use crate::config::ScanConfig;
use crate::error::{DocCheckError, PageError};
use crate::pipeline::classify::SignatureClassifier;
use crate::pipeline::encode::encode_annotated;
use crate::pipeline::render::RenderedPage;
use crate::pipeline::{expiry, input, render};
use crate::report::{DocumentMetadata, PageVerdict, ScanReport, ScanStats, ScanSummary};
use futures::stream::{self, StreamExt};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Scan a PDF file or URL for pages missing a handwritten signature.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input_str` — Local file path or HTTP/HTTPS URL to a PDF
/// * `config`    — Scan configuration
///
/// # Returns
/// `Ok(ScanReport)` on success, even if some pages failed
/// (check `report.stats.failed_pages`).
///
/// # Errors
/// Returns `Err(DocCheckError)` only for fatal errors:
/// - File not found / permission denied
/// - Not a valid PDF / wrong password
/// - Every selected page failed
pub async fn scan(
    input_str: impl AsRef<str>,
    config: &ScanConfig,
) -> Result<ScanReport, DocCheckError> {
    let total_start = Instant::now();
    let input_str = input_str.as_ref();
    info!("Starting scan: {}", input_str);

    // ── Step 1: Resolve input ────────────────────────────────────────────
    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    let pdf_path = resolved.path().to_path_buf();

    // ── Step 2: Extract metadata ─────────────────────────────────────────
    let metadata = render::extract_metadata(&pdf_path, config.password.as_deref()).await?;
    let total_pages = metadata.page_count;
    info!("PDF has {} pages", total_pages);

    // ── Step 3: Compute page indices ─────────────────────────────────────
    let page_indices = config.pages.to_indices(total_pages);
    if page_indices.is_empty() {
        return Err(DocCheckError::PageOutOfRange {
            page: 0,
            total: total_pages,
        });
    }
    debug!("Selected {} pages for scanning", page_indices.len());

    // Fire on_scan_start now that we know how many pages will actually be
    // scanned (page_indices.len()), not the full document page count.
    if let Some(ref cb) = config.progress_callback {
        cb.on_scan_start(page_indices.len());
    }

    // ── Step 4: Rasterise pages ──────────────────────────────────────────
    let render_start = Instant::now();
    let rendered = render::render_pages(&pdf_path, config, &page_indices).await?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;
    info!(
        "Rendered {} pages in {}ms",
        rendered.len(),
        render_duration_ms
    );

    // ── Step 5: Classify pages ───────────────────────────────────────────
    let classify_start = Instant::now();
    let mut pages = classify_pages(rendered, config).await;
    let classify_duration_ms = classify_start.elapsed().as_millis() as u64;

    // Sort by page number: classification finishes out of order in
    // concurrent mode, but the report contract is document order.
    pages.sort_by_key(|p| p.page_num);

    // ── Step 6: Aggregate ────────────────────────────────────────────────
    let processed = pages.iter().filter(|p| p.error.is_none()).count();
    let failed = pages.iter().filter(|p| p.error.is_some()).count();
    let skipped = page_indices.len().saturating_sub(pages.len());

    if processed == 0 {
        let first_error = pages
            .iter()
            .find_map(|p| p.error.as_ref())
            .map(|e| format!("{}", e))
            .unwrap_or_else(|| "Unknown error".to_string());

        return Err(DocCheckError::AllPagesFailed {
            total: pages.len(),
            first_error,
        });
    }

    let summary = ScanSummary::from_pages(&pages);

    let stats = ScanStats {
        total_pages,
        processed_pages: processed,
        failed_pages: failed,
        skipped_pages: skipped,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        render_duration_ms,
        classify_duration_ms,
    };

    info!(
        "Scan complete: {}/{} pages, {} missing signatures, {}ms total",
        processed, total_pages, summary.missing_count, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_scan_complete(page_indices.len(), summary.missing_count);
    }

    Ok(ScanReport {
        pages,
        summary,
        metadata,
        stats,
    })
}

/// Scan PDF bytes in memory.
///
/// This avoids the need for the caller to create a temporary file.
/// Internally the library writes `bytes` to a managed [`tempfile`] and
/// cleans it up automatically on return or panic.
///
/// This is the recommended API when PDF data comes from an upload, a
/// database, or an in-memory buffer rather than a file on disk.
///
/// # Example
/// ```rust,no_run
/// use doccheck::{scan_from_bytes, ScanConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes: Vec<u8> = std::fs::read("loan_package.pdf")?;
/// let config = ScanConfig::default();
/// let report = scan_from_bytes(&bytes, &config).await?;
/// println!("{} pages missing signatures", report.summary.missing_count);
/// # Ok(())
/// # }
/// ```
pub async fn scan_from_bytes(
    bytes: &[u8],
    config: &ScanConfig,
) -> Result<ScanReport, DocCheckError> {
    let mut tmp = tempfile::NamedTempFile::new()
        .map_err(|e| DocCheckError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| DocCheckError::Internal(format!("tempfile write: {e}")))?;
    let path = tmp.path().to_string_lossy().to_string();
    // `tmp` is dropped (and the file deleted) when `scan` returns
    scan(&path, config).await
}

/// Synchronous wrapper around [`scan`].
///
/// Creates a temporary tokio runtime internally.
pub fn scan_sync(
    input_str: impl AsRef<str>,
    config: &ScanConfig,
) -> Result<ScanReport, DocCheckError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| DocCheckError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(scan(input_str, config))
}

/// Extract PDF metadata without scanning content.
///
/// Does not render any pages.
pub async fn inspect(input_str: impl AsRef<str>) -> Result<DocumentMetadata, DocCheckError> {
    let resolved = input::resolve_input(input_str.as_ref(), 120).await?;
    let pdf_path = resolved.path().to_path_buf();
    render::extract_metadata(&pdf_path, None).await
}

/// Write the annotated image of every missing-signature page to `dir` as
/// `page_NNN.png`, creating the directory if needed.
///
/// Returns the written paths in ascending page order.
pub fn save_missing_annotations(
    report: &ScanReport,
    dir: impl AsRef<Path>,
) -> Result<Vec<PathBuf>, DocCheckError> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir).map_err(|e| DocCheckError::OutputWriteFailed {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut written = Vec::new();
    for page in report.missing_pages() {
        let Some(annotated) = page.annotated.as_ref() else {
            continue;
        };
        let path = dir.join(format!("page_{:03}.png", page.page_num));
        let png = encode_annotated(annotated)
            .map_err(|e| DocCheckError::Internal(format!("PNG encoding failed: {e}")))?;
        std::fs::write(&path, png).map_err(|e| DocCheckError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        })?;
        written.push(path);
    }
    Ok(written)
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Classify rendered pages concurrently, bounded by `config.concurrency`.
///
/// Classification is pure CPU work, so each page runs on a blocking thread;
/// render failures pass straight through as failed verdicts. Completion
/// order is arbitrary — the caller re-sorts.
async fn classify_pages(
    rendered: Vec<Result<RenderedPage, PageError>>,
    config: &ScanConfig,
) -> Vec<PageVerdict> {
    let total = rendered.len();
    let classifier = Arc::new(SignatureClassifier::new(config.classifier.clone()));

    stream::iter(rendered.into_iter().map(|entry| {
        let classifier = Arc::clone(&classifier);
        let callback = config.progress_callback.clone();
        let scan_text = config.scan_license_text;
        async move {
            let page = match entry {
                Ok(page) => page,
                Err(err) => {
                    let page_num = match &err {
                        PageError::RenderFailed { page, .. }
                        | PageError::ClassifyFailed { page, .. } => *page,
                    };
                    if let Some(ref cb) = callback {
                        cb.on_page_error(page_num, total, err.to_string());
                    }
                    return PageVerdict::failed(page_num, err);
                }
            };

            let page_num = page.index + 1;
            if let Some(ref cb) = callback {
                cb.on_page_start(page_num, total);
            }
            let verdict = classify_one(classifier, page, scan_text).await;
            if let Some(ref cb) = callback {
                match &verdict.error {
                    None => cb.on_page_complete(page_num, total, verdict.is_signed),
                    Some(e) => cb.on_page_error(page_num, total, e.to_string()),
                }
            }
            verdict
        }
    }))
    .buffer_unordered(config.concurrency)
    .collect()
    .await
}

/// Run the classifier (and optional text scan) for one page on a blocking
/// thread.
async fn classify_one(
    classifier: Arc<SignatureClassifier>,
    page: RenderedPage,
    scan_text: bool,
) -> PageVerdict {
    let page_num = page.index + 1;
    let RenderedPage { gray, text, .. } = page;

    let result = tokio::task::spawn_blocking(move || {
        let classification = classifier.classify(&gray);
        let license_expiry = if scan_text {
            text.as_deref().and_then(expiry::scan_license_expiry)
        } else {
            None
        };
        (classification, license_expiry)
    })
    .await;

    match result {
        Ok((classification, license_expiry)) => PageVerdict {
            page_num,
            is_signed: classification.is_signed,
            regions: classification.regions,
            annotated: Some(classification.annotated),
            license_expiry,
            error: None,
        },
        Err(e) => PageVerdict::failed(
            page_num,
            PageError::ClassifyFailed {
                page: page_num,
                detail: format!("{}", e),
            },
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClassifierConfig;
    use image::{GrayImage, Luma};

    fn page_with_scribble() -> RenderedPage {
        let mut gray = GrayImage::from_pixel(1275, 1650, Luma([245]));
        let amp = 59u32;
        let period = 2 * amp;
        for i in 0..200u32 {
            let phase = i % period;
            let dy = if phase <= amp { phase } else { period - phase };
            gray.put_pixel(500 + i, 900 + dy, Luma([30]));
        }
        RenderedPage {
            index: 0,
            gray,
            text: None,
        }
    }

    fn blank_page(index: usize) -> RenderedPage {
        RenderedPage {
            index,
            gray: GrayImage::from_pixel(1275, 1650, Luma([245])),
            text: None,
        }
    }

    #[tokio::test]
    async fn classify_pages_sorts_into_verdicts() {
        let config = ScanConfig::builder().concurrency(4).build().unwrap();
        let rendered = vec![
            Ok(page_with_scribble()),
            Ok(blank_page(1)),
            Ok(blank_page(2)),
        ];
        let mut pages = classify_pages(rendered, &config).await;
        pages.sort_by_key(|p| p.page_num);

        assert_eq!(pages.len(), 3);
        assert!(pages[0].is_signed);
        assert!(!pages[1].is_signed);
        assert!(!pages[2].is_signed);

        let summary = ScanSummary::from_pages(&pages);
        assert_eq!(summary.signed_count, 1);
        assert_eq!(summary.missing_count, 2);
    }

    #[tokio::test]
    async fn render_failure_becomes_failed_verdict() {
        let config = ScanConfig::default();
        let rendered = vec![
            Ok(blank_page(0)),
            Err(PageError::RenderFailed {
                page: 2,
                detail: "bitmap".into(),
            }),
        ];
        let mut pages = classify_pages(rendered, &config).await;
        pages.sort_by_key(|p| p.page_num);

        assert_eq!(pages.len(), 2);
        assert!(pages[0].error.is_none());
        assert!(pages[1].error.is_some());
        assert!(!pages[1].is_signed);
        let summary = ScanSummary::from_pages(&pages);
        assert_eq!(summary.signed_count, 0);
        assert_eq!(summary.missing_count, 1);
    }

    #[tokio::test]
    async fn concurrency_does_not_change_verdicts() {
        let sequential = ScanConfig::builder().concurrency(1).build().unwrap();
        let parallel = ScanConfig::builder().concurrency(8).build().unwrap();

        let make_input = || {
            (0..6)
                .map(|i| {
                    if i % 2 == 0 {
                        Ok(RenderedPage { index: i, ..page_with_scribble() })
                    } else {
                        Ok(blank_page(i))
                    }
                })
                .collect::<Vec<_>>()
        };

        let mut a = classify_pages(make_input(), &sequential).await;
        let mut b = classify_pages(make_input(), &parallel).await;
        a.sort_by_key(|p| p.page_num);
        b.sort_by_key(|p| p.page_num);

        let verdicts_a: Vec<(usize, bool)> = a.iter().map(|p| (p.page_num, p.is_signed)).collect();
        let verdicts_b: Vec<(usize, bool)> = b.iter().map(|p| (p.page_num, p.is_signed)).collect();
        assert_eq!(verdicts_a, verdicts_b);
    }

    #[tokio::test]
    async fn license_scan_rides_on_verdict() {
        let config = ScanConfig::builder().scan_license_text(true).build().unwrap();
        let mut page = blank_page(0);
        page.text = Some("TEXAS DRIVER LICENSE EXP 06/01/2029".to_string());
        let pages = classify_pages(vec![Ok(page)], &config).await;
        let finding = pages[0].license_expiry.as_ref().unwrap();
        assert_eq!(finding.raw, "06/01/2029");
        // The text scan never flips the raster verdict.
        assert!(!pages[0].is_signed);
    }

    #[tokio::test]
    async fn custom_classifier_config_is_used() {
        // Raise min_width beyond the scribble's 200 px so it gets rejected.
        let mut classifier = ClassifierConfig::default();
        classifier.min_width = 400;
        let config = ScanConfig::builder().classifier(classifier).build().unwrap();
        let pages = classify_pages(vec![Ok(page_with_scribble())], &config).await;
        assert!(!pages[0].is_signed);
    }
}
