//! Streaming scan API: emit page verdicts as they complete.
//!
//! ## Why stream?
//!
//! Large loan packages run to hundreds of pages. A streams-based API lets
//! callers display partial results immediately, wire up progress bars, or
//! write annotated pages to disk incrementally instead of buffering the
//! entire document in memory.
//!
//! Unlike the eager [`crate::scan::scan`] which returns only after all
//! pages finish, [`scan_stream`] yields [`PageVerdict`] items via a
//! `Stream` as each page completes. In concurrent mode verdicts may arrive
//! out of order (sort by `page_num` if order matters).

use crate::config::ScanConfig;
use crate::error::{DocCheckError, PageError};
use crate::pipeline::classify::SignatureClassifier;
use crate::pipeline::render::RenderedPage;
use crate::pipeline::{expiry, input, render};
use crate::report::PageVerdict;
use futures::stream::{self, StreamExt};
use std::io::Write;
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of page verdicts.
pub type VerdictStream = Pin<Box<dyn Stream<Item = Result<PageVerdict, PageError>> + Send>>;

/// Scan a PDF, streaming verdicts as they are ready.
///
/// Verdicts are emitted in completion order, not necessarily page order.
/// Sort by `page_num` if order matters.
///
/// # Returns
/// - `Ok(VerdictStream)` — a stream of `Result<PageVerdict, PageError>`
/// - `Err(DocCheckError)` — fatal error (file not found, not a PDF, etc.)
pub async fn scan_stream(
    input_str: impl AsRef<str>,
    config: &ScanConfig,
) -> Result<VerdictStream, DocCheckError> {
    let input_str = input_str.as_ref();
    info!("Starting streaming scan: {}", input_str);

    // ── Resolve input ────────────────────────────────────────────────────
    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    let pdf_path = resolved.path().to_path_buf();

    // ── Extract metadata for page count ──────────────────────────────────
    let metadata = render::extract_metadata(&pdf_path, config.password.as_deref()).await?;
    let total_pages = metadata.page_count;

    // ── Compute page indices ─────────────────────────────────────────────
    let page_indices = config.pages.to_indices(total_pages);
    if page_indices.is_empty() {
        return Err(DocCheckError::PageOutOfRange {
            page: 0,
            total: total_pages,
        });
    }

    // ── Render all pages ─────────────────────────────────────────────────
    let rendered = render::render_pages(&pdf_path, config, &page_indices).await?;

    // ── Build the stream ─────────────────────────────────────────────────
    let concurrency = config.concurrency;
    let classifier = Arc::new(SignatureClassifier::new(config.classifier.clone()));
    let scan_text = config.scan_license_text;

    let s = stream::iter(rendered.into_iter().map(move |entry| {
        let classifier = Arc::clone(&classifier);
        async move {
            let page = entry?;
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
                Ok((classification, license_expiry)) => Ok(PageVerdict {
                    page_num,
                    is_signed: classification.is_signed,
                    regions: classification.regions,
                    annotated: Some(classification.annotated),
                    license_expiry,
                    error: None,
                }),
                Err(e) => Err(PageError::ClassifyFailed {
                    page: page_num,
                    detail: format!("{}", e),
                }),
            }
        }
    }))
    .buffer_unordered(concurrency);

    Ok(Box::pin(s))
}

/// Scan PDF bytes in memory, streaming verdicts as they complete.
///
/// This is the streaming equivalent of [`crate::scan::scan_from_bytes`].
/// The PDF bytes are written to a temporary file internally; the file is
/// cleaned up before the stream is returned, which is safe because all
/// pages are rendered into memory before that point.
pub async fn scan_stream_from_bytes(
    bytes: &[u8],
    config: &ScanConfig,
) -> Result<VerdictStream, DocCheckError> {
    let mut tmp = tempfile::NamedTempFile::new()
        .map_err(|e| DocCheckError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| DocCheckError::Internal(format!("tempfile write: {e}")))?;
    let path = tmp.path().to_string_lossy().to_string();
    // The stream is fully materialised (pages rendered) before we return,
    // so the tempfile can be dropped here.
    let stream = scan_stream(&path, config).await?;
    drop(tmp);
    Ok(stream)
}
