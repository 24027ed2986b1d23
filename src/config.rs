//! Configuration types for signature scanning.
//!
//! All scan behaviour is controlled through [`ScanConfig`], built via its
//! [`ScanConfigBuilder`]. Keeping every knob in one struct makes it trivial
//! to share configs across threads, serialise them for logging, and diff two
//! runs to understand why their verdicts differ.
//!
//! The heuristic's numeric thresholds live in their own [`ClassifierConfig`]
//! so the detector can be re-tuned (and tested against alternate tunings)
//! without touching code. The defaults are the production constants.
//!
//! # Design choice: builder over constructor
//! A fifteen-field constructor is unreadable and breaks on every new field.
//! The builder pattern lets callers set only what they care about and rely on
//! well-documented defaults for the rest.

use crate::error::DocCheckError;
use crate::progress::ScanProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Configuration for a document scan.
///
/// Built via [`ScanConfig::builder()`] or using [`ScanConfig::default()`].
///
/// # Example
/// ```rust
/// use doccheck::ScanConfig;
///
/// let config = ScanConfig::builder()
///     .dpi(150)
///     .concurrency(4)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ScanConfig {
    /// Rendering DPI used when rasterising each PDF page. Range: 72–400. Default: 150.
    ///
    /// The classifier's pixel thresholds (minimum region size, line-kernel
    /// width) were tuned against 150-DPI renders of US-letter loan pages.
    /// Scanning at a different DPI without re-tuning [`ClassifierConfig`]
    /// shifts what "big enough to be a signature" means.
    pub dpi: u32,

    /// Maximum rendered image dimension (width or height) in pixels. Default: 2000.
    ///
    /// A safety cap independent of DPI. A 150-DPI render of an A0 poster
    /// could produce a 9 900 × 14 000 px image and exhaust memory. This
    /// field caps either dimension, scaling the other proportionally.
    pub max_rendered_pixels: u32,

    /// Number of pages classified concurrently. Default: 4.
    ///
    /// Classification is CPU-bound, so the useful ceiling is the core count.
    /// Verdicts are re-sorted by page number before aggregation, so the
    /// report is identical whatever the concurrency.
    pub concurrency: usize,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Page selection. Default: all pages.
    pub pages: PageSelection,

    /// Signature-heuristic thresholds. Default: production tuning.
    pub classifier: ClassifierConfig,

    /// Also scan each page's text layer for a driver-license expiry date.
    /// Default: false.
    ///
    /// This is a separate, much weaker heuristic than the raster classifier;
    /// its finding rides on the verdict and never affects `is_signed`.
    pub scan_license_text: bool,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional progress callback receiving per-page events.
    pub progress_callback: Option<Arc<dyn ScanProgressCallback>>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            dpi: 150,
            max_rendered_pixels: 2000,
            concurrency: 4,
            password: None,
            pages: PageSelection::default(),
            classifier: ClassifierConfig::default(),
            scan_license_text: false,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ScanConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanConfig")
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("concurrency", &self.concurrency)
            .field("pages", &self.pages)
            .field("classifier", &self.classifier)
            .field("scan_license_text", &self.scan_license_text)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn callback>"),
            )
            .finish()
    }
}

impl ScanConfig {
    /// Create a new builder for `ScanConfig`.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ScanConfig`].
#[derive(Debug)]
pub struct ScanConfigBuilder {
    config: ScanConfig,
}

impl ScanConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 400);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn classifier(mut self, classifier: ClassifierConfig) -> Self {
        self.config.classifier = classifier;
        self
    }

    pub fn scan_license_text(mut self, v: bool) -> Self {
        self.config.scan_license_text = v;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: Arc<dyn ScanProgressCallback>) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ScanConfig, DocCheckError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 400 {
            return Err(DocCheckError::InvalidConfig(format!(
                "DPI must be 72–400, got {}",
                c.dpi
            )));
        }
        if c.concurrency == 0 {
            return Err(DocCheckError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        c.classifier.validate()?;
        Ok(self.config)
    }
}

// ── Classifier thresholds ────────────────────────────────────────────────

/// Every numeric threshold of the signature-presence heuristic, named.
///
/// The detector trades recall against precision via three independently
/// tunable gates (size, aspect ratio, ink density) applied to candidate
/// regions extracted from a binarised, line-suppressed crop of the page.
/// No single gate suffices: size alone cannot distinguish a signature from
/// a stamp, and density alone cannot distinguish a signature from a ruled
/// box — the combination is the contract.
///
/// Defaults are the production tuning for 150-DPI renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Top of the scan region as a fraction of page height. Default: 0.15.
    /// The top band typically holds letterhead and logos that false-positive.
    pub crop_top: f32,
    /// Bottom of the scan region as a fraction of page height. Default: 0.95.
    pub crop_bottom: f32,
    /// Left edge of the scan region as a fraction of page width. Default: 0.20.
    /// The left band holds hole punches and margin stamps.
    pub crop_left: f32,
    /// Right edge of the scan region as a fraction of page width. Default: 0.95.
    pub crop_right: f32,

    /// Side length of the square neighborhood used for adaptive
    /// binarisation. Must be odd and ≥ 3. Default: 21.
    pub adaptive_block_size: u32,
    /// Constant subtracted from the local mean before thresholding.
    /// Default: 10.
    pub adaptive_c: i16,

    /// Minimum length of a horizontal foreground run for it to be treated
    /// as a ruled line and erased. Default: 50.
    pub line_kernel_width: u32,

    /// A region must be strictly wider than this to be a candidate. Default: 60.
    pub min_width: u32,
    /// A region must be strictly taller than this to be a candidate. Default: 25.
    pub min_height: u32,
    /// Width/height must strictly exceed this; rejects thin vertical
    /// bracket and margin artifacts. Default: 0.5.
    pub min_aspect_ratio: f32,
    /// Fraction of dark pixels in the box must be strictly below this;
    /// rejects solid ink blocks (header bars, stamps) — handwriting is
    /// sparse. Default: 0.30.
    pub max_fill_ratio: f32,
    /// A grayscale sample counts as "dark" below this intensity. Default: 100.
    pub dark_pixel_threshold: u8,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            crop_top: 0.15,
            crop_bottom: 0.95,
            crop_left: 0.20,
            crop_right: 0.95,
            adaptive_block_size: 21,
            adaptive_c: 10,
            line_kernel_width: 50,
            min_width: 60,
            min_height: 25,
            min_aspect_ratio: 0.5,
            max_fill_ratio: 0.30,
            dark_pixel_threshold: 100,
        }
    }
}

impl ClassifierConfig {
    /// Validate threshold invariants.
    pub fn validate(&self) -> Result<(), DocCheckError> {
        let bad = |msg: String| Err(DocCheckError::InvalidConfig(msg));

        if !(0.0..=1.0).contains(&self.crop_top)
            || !(0.0..=1.0).contains(&self.crop_bottom)
            || !(0.0..=1.0).contains(&self.crop_left)
            || !(0.0..=1.0).contains(&self.crop_right)
        {
            return bad("crop fractions must lie in [0, 1]".into());
        }
        if self.crop_top >= self.crop_bottom {
            return bad(format!(
                "crop_top ({}) must be below crop_bottom ({})",
                self.crop_top, self.crop_bottom
            ));
        }
        if self.crop_left >= self.crop_right {
            return bad(format!(
                "crop_left ({}) must be left of crop_right ({})",
                self.crop_left, self.crop_right
            ));
        }
        if self.adaptive_block_size < 3 || self.adaptive_block_size % 2 == 0 {
            return bad(format!(
                "adaptive_block_size must be odd and ≥ 3, got {}",
                self.adaptive_block_size
            ));
        }
        if self.line_kernel_width < 2 {
            return bad("line_kernel_width must be ≥ 2".into());
        }
        if !(self.max_fill_ratio > 0.0 && self.max_fill_ratio <= 1.0) {
            return bad(format!(
                "max_fill_ratio must lie in (0, 1], got {}",
                self.max_fill_ratio
            ));
        }
        if self.min_aspect_ratio < 0.0 {
            return bad("min_aspect_ratio must be ≥ 0".into());
        }
        Ok(())
    }
}

// ── Page selection ───────────────────────────────────────────────────────

/// Specifies which pages of the PDF to scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum PageSelection {
    /// Scan all pages (default).
    #[default]
    All,
    /// Scan a single page (1-indexed).
    Single(usize),
    /// Scan a contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Scan specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into a sorted, deduplicated list of 0-indexed page numbers.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Single(p) => {
                if *p >= 1 && *p <= total_pages {
                    vec![p - 1]
                } else {
                    vec![]
                }
            }
            PageSelection::Range(start, end) => {
                let s = (*start).max(1) - 1;
                let e = (*end).min(total_pages);
                (s..e).collect()
            }
            PageSelection::Set(pages) => pages
                .iter()
                .filter(|&&p| p >= 1 && p <= total_pages)
                .map(|p| p - 1)
                .collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}
