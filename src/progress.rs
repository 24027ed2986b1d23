//! Progress-callback trait for per-page scan events.
//!
//! Inject an [`Arc<dyn ScanProgressCallback>`] via
//! [`crate::config::ScanConfigBuilder::progress_callback`] to receive
//! real-time events as the pipeline classifies each page.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a Tokio broadcast channel, a WebSocket, a database record,
//! or a terminal progress bar — without the library knowing anything about how
//! the host application communicates. The trait is `Send + Sync` so it works
//! correctly when pages are classified concurrently.
//!
//! # Example
//!
//! ```rust
//! use doccheck::{ScanConfig, ScanProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     missing: Arc<AtomicUsize>,
//! }
//!
//! impl ScanProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, page_num: usize, total_pages: usize, is_signed: bool) {
//!         if !is_signed {
//!             self.missing.fetch_add(1, Ordering::SeqCst);
//!         }
//!         eprintln!("Page {}/{} {}", page_num, total_pages,
//!             if is_signed { "signed" } else { "MISSING" });
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     missing: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = ScanConfig::builder()
//!     .progress_callback(counter as Arc<dyn ScanProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the scan pipeline as it processes each page.
///
/// Implementations must be `Send + Sync` (pages are classified concurrently
/// on blocking threads). All methods have default no-op implementations so
/// callers only override what they care about.
///
/// # Thread safety
///
/// `on_page_start`, `on_page_complete`, and `on_page_error` may be called
/// concurrently from different threads. Implementations must protect shared
/// mutable state with appropriate synchronisation primitives
/// (e.g. `Mutex`, `AtomicUsize`).
pub trait ScanProgressCallback: Send + Sync {
    /// Called once before any page is rendered.
    ///
    /// # Arguments
    /// * `total_pages` — number of pages that will be scanned
    fn on_scan_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called just before a page is classified.
    ///
    /// # Arguments
    /// * `page_num`    — 1-indexed page number
    /// * `total_pages` — total pages selected for the scan
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when a page verdict is ready.
    ///
    /// # Arguments
    /// * `page_num`    — 1-indexed page number
    /// * `total_pages` — total pages selected for the scan
    /// * `is_signed`   — the verdict (false = missing signature)
    fn on_page_complete(&self, page_num: usize, total_pages: usize, is_signed: bool) {
        let _ = (page_num, total_pages, is_signed);
    }

    /// Called when a page could not be rendered or classified.
    ///
    /// # Arguments
    /// * `page_num`    — 1-indexed page number
    /// * `total_pages` — total pages selected for the scan
    /// * `error`       — human-readable error description
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: String) {
        let _ = (page_num, total_pages, error);
    }

    /// Called once after all pages have been attempted.
    ///
    /// # Arguments
    /// * `total_pages`   — total pages selected for the scan
    /// * `missing_count` — pages flagged as missing a signature
    fn on_scan_complete(&self, total_pages: usize, missing_count: usize) {
        let _ = (total_pages, missing_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl ScanProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ScanConfig`].
pub type ProgressCallback = Arc<dyn ScanProgressCallback>;
