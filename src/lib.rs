//! # doccheck
//!
//! Scan scanned loan-document PDFs for pages that appear to be missing a
//! handwritten signature, and compute legal rescission deadlines from a
//! signing date.
//!
//! ## Why this crate?
//!
//! A loan signing agent who couriers a package with one missed initial gets
//! it back as a funding condition days later. This crate rasterises each
//! page and runs a deterministic, rule-based detector over it — no model
//! weights, no network calls — flagging pages with no handwriting-shaped
//! ink so the package can be fixed before it ships. The same product rules
//! need the borrower's rescission deadline, so the three-business-day
//! calculator lives here too.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     resolve local file or download from URL
//!  ├─ 2. Render    rasterise pages to grayscale via pdfium (spawn_blocking)
//!  ├─ 3. Classify  crop → binarise → de-rule → regions → gates (CPU-bound)
//!  ├─ 4. Annotate  verdict rectangles on an RGB copy of the scan region
//!  └─ 5. Report    verdicts sorted by page + signed/missing summary
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use doccheck::{scan, RescissionCalculator, ScanConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ScanConfig::default();
//!     let report = scan("loan_package.pdf", &config).await?;
//!     for page in report.missing_pages() {
//!         println!("page {} needs a signature", page.page_num);
//!     }
//!     println!(
//!         "{} of {} pages signed",
//!         report.summary.signed_count, report.summary.total_pages
//!     );
//!
//!     let deadline = RescissionCalculator::default().compute("01/20/2026")?;
//!     println!("rescission deadline: {deadline}");
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `doccheck` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! doccheck = { version = "0.3", default-features = false }
//! ```
//!
//! ## What the detector is — and is not
//!
//! The classifier is a geometric heuristic: it finds compact, sparse ink
//! blobs that survive ruled-line removal and pass size/aspect/density
//! gates. It does **not** verify whose signature is on the page, and a
//! determined doodle will fool it. Treat the verdicts as a pre-courier
//! safety net, not a compliance authority — every flagged page still needs
//! a human look.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod deadline;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod report;
pub mod scan;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ClassifierConfig, PageSelection, ScanConfig, ScanConfigBuilder};
pub use deadline::{DeadlineError, HolidayCalendar, RescissionCalculator};
pub use error::{DocCheckError, PageError};
pub use pipeline::classify::{Classification, SignatureClassifier};
pub use pipeline::expiry::ExpiryFinding;
pub use pipeline::regions::Region;
pub use progress::{NoopProgressCallback, ProgressCallback, ScanProgressCallback};
pub use report::{DocumentMetadata, PageVerdict, ScanReport, ScanStats, ScanSummary};
pub use scan::{inspect, save_missing_annotations, scan, scan_from_bytes, scan_sync};
pub use stream::{scan_stream, scan_stream_from_bytes, VerdictStream};
