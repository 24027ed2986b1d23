//! Report types: per-page verdicts, the aggregated summary, and scan stats.
//!
//! A [`PageVerdict`] is created once per page and never mutated; the
//! [`ScanReport`] owns the verdicts until display. Verdicts are stored in
//! ascending page-number order regardless of the order classification
//! finished in — the ordering contract belongs to reporting, not to the
//! algorithm.
//!
//! Everything here serialises to JSON for the `--json` CLI mode and API
//! consumers, except the annotated image buffer, which is skipped (export
//! it separately as PNG via [`crate::pipeline::encode::encode_annotated`]).

use crate::error::PageError;
use crate::pipeline::expiry::ExpiryFinding;
use crate::pipeline::regions::Region;
use image::RgbImage;
use serde::{Deserialize, Serialize};

/// The verdict for a single scanned page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageVerdict {
    /// 1-based page number, matching what a human sees in a PDF viewer.
    pub page_num: usize,
    /// True iff the signature heuristic accepted at least one region.
    /// Always false when `error` is set.
    pub is_signed: bool,
    /// Every candidate region with metrics and accept/reject flags.
    pub regions: Vec<Region>,
    /// Annotated copy of the cropped scan region (RGB; green = accepted,
    /// red = rejected). Not serialised — write it out as PNG instead.
    /// `None` when the page failed to render.
    #[serde(skip)]
    pub annotated: Option<RgbImage>,
    /// License-expiry finding from the conditional text scan.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub license_expiry: Option<ExpiryFinding>,
    /// Set when the page failed to render or classify; such pages are
    /// excluded from the signed/missing split.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<PageError>,
}

impl PageVerdict {
    /// A verdict for a page that failed before classification.
    pub fn failed(page_num: usize, error: PageError) -> Self {
        Self {
            page_num,
            is_signed: false,
            regions: Vec::new(),
            annotated: None,
            license_expiry: None,
            error: Some(error),
        }
    }

    /// Whether this page needs attention (processed and missing a signature).
    pub fn is_missing(&self) -> bool {
        self.error.is_none() && !self.is_signed
    }
}

/// Aggregated counts over an ordered sequence of page verdicts.
///
/// Pages that failed to process are counted in neither bucket; they are
/// tracked by [`ScanStats::failed_pages`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Number of verdicts folded (including failed pages).
    pub total_pages: usize,
    /// Pages where a signature was found.
    pub signed_count: usize,
    /// Pages scanned successfully but missing a signature.
    pub missing_count: usize,
}

impl ScanSummary {
    /// Fold verdicts into counts. No reordering, no deduplication —
    /// page numbers are assumed unique and in ascending document order.
    pub fn from_pages(pages: &[PageVerdict]) -> Self {
        let signed_count = pages
            .iter()
            .filter(|p| p.error.is_none() && p.is_signed)
            .count();
        let missing_count = pages.iter().filter(|p| p.is_missing()).count();
        Self {
            total_pages: pages.len(),
            signed_count,
            missing_count,
        }
    }

    /// True when every processed page carries a signature.
    pub fn all_signed(&self) -> bool {
        self.missing_count == 0
    }
}

/// Timing and coverage statistics for one scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanStats {
    /// Pages in the document (not just the selection).
    pub total_pages: usize,
    /// Pages rendered and classified successfully.
    pub processed_pages: usize,
    /// Pages that failed to render or classify.
    pub failed_pages: usize,
    /// Selected pages skipped (out of range).
    pub skipped_pages: usize,
    /// Wall-clock for the whole scan.
    pub total_duration_ms: u64,
    /// Wall-clock spent inside pdfium.
    pub render_duration_ms: u64,
    /// Wall-clock spent in classification.
    pub classify_duration_ms: u64,
}

/// Document metadata extracted without rendering.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
    pub is_encrypted: bool,
}

/// The complete result of scanning one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    /// Per-page verdicts in ascending page-number order.
    pub pages: Vec<PageVerdict>,
    /// Aggregated counts over `pages`.
    pub summary: ScanSummary,
    /// Document metadata.
    pub metadata: DocumentMetadata,
    /// Timing and coverage.
    pub stats: ScanStats,
}

impl ScanReport {
    /// The pages needing attention, in ascending page-number order.
    pub fn missing_pages(&self) -> impl Iterator<Item = &PageVerdict> {
        self.pages.iter().filter(|p| p.is_missing())
    }

    /// The pages that failed to process, in ascending page-number order.
    pub fn failed_pages(&self) -> impl Iterator<Item = &PageVerdict> {
        self.pages.iter().filter(|p| p.error.is_some())
    }
}
