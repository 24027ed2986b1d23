//! Signature-presence classification for one page raster.
//!
//! ## The heuristic
//!
//! ```text
//! grayscale page
//!  │
//!  ├─ 1. Crop      drop letterhead / hole-punch / scan-edge bands
//!  ├─ 2. Binarise  adaptive inverse threshold (ink → foreground)
//!  ├─ 3. De-rule   erase horizontal runs ≥ line_kernel_width
//!  ├─ 4. Extract   8-connected components → bounding boxes
//!  ├─ 5. Measure   aspect ratio + grayscale fill ratio per box
//!  └─ 6. Gate      size AND aspect AND sparseness → accepted
//! ```
//!
//! A page is "signed" iff at least one region passes all three gates. The
//! gates are deliberately independent: size alone cannot tell a signature
//! from a rubber stamp, and ink density alone cannot tell one from a ruled
//! box. Rule-based on purpose — no model weights, no randomness, identical
//! input gives identical output.

use crate::config::ClassifierConfig;
use crate::pipeline::binarize::{adaptive_threshold_inv, crop_scan_region, suppress_horizontal_runs};
use crate::pipeline::regions::{aspect_ratio, fill_ratio, find_component_bounds, Bounds, Region};
use image::{GrayImage, Rgb, RgbImage};
use tracing::debug;

/// Accepted regions are outlined in green, 2 px.
const ACCEPT_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const ACCEPT_THICKNESS: u32 = 2;

/// Rejected candidates are outlined in red, 1 px.
const REJECT_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const REJECT_THICKNESS: u32 = 1;

/// The outcome of classifying one page.
#[derive(Debug, Clone)]
pub struct Classification {
    /// True iff at least one candidate region passed every gate.
    pub is_signed: bool,
    /// Every candidate region with its metrics and accept/reject flag,
    /// in deterministic discovery order.
    pub regions: Vec<Region>,
    /// RGB copy of the cropped scan region with accepted regions drawn as
    /// 2 px green rectangles and rejected candidates as 1 px red ones.
    /// Channel order is the `image` crate's native RGB.
    pub annotated: RgbImage,
}

/// The rule-based signature detector. Cheap to construct; hold one per
/// configuration and reuse it across pages — it carries no per-page state.
#[derive(Debug, Clone)]
pub struct SignatureClassifier {
    cfg: ClassifierConfig,
}

impl Default for SignatureClassifier {
    fn default() -> Self {
        Self::new(ClassifierConfig::default())
    }
}

impl SignatureClassifier {
    pub fn new(cfg: ClassifierConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.cfg
    }

    /// Classify one grayscale page raster.
    ///
    /// The caller guarantees `page` has non-zero dimensions (it comes from
    /// a rendered PDF page); a degenerate raster yields an unsigned verdict
    /// with an empty annotation rather than a panic. The input is never
    /// mutated and two calls on the same raster return identical results.
    pub fn classify(&self, page: &GrayImage) -> Classification {
        let roi = crop_scan_region(page, &self.cfg);
        if roi.width() == 0 || roi.height() == 0 {
            return Classification {
                is_signed: false,
                regions: Vec::new(),
                annotated: RgbImage::new(0, 0),
            };
        }

        let mask = adaptive_threshold_inv(&roi, self.cfg.adaptive_block_size, self.cfg.adaptive_c);
        let cleaned = suppress_horizontal_runs(&mask, self.cfg.line_kernel_width);
        let bounds = find_component_bounds(&cleaned);

        let mut annotated = gray_to_rgb(&roi);
        let mut regions = Vec::with_capacity(bounds.len());
        let mut is_signed = false;

        for b in &bounds {
            let aspect = aspect_ratio(b);
            let fill = fill_ratio(&roi, b, self.cfg.dark_pixel_threshold);
            let accepted = self.passes_gates(b, aspect, fill);

            if accepted {
                is_signed = true;
                draw_rect(&mut annotated, b, ACCEPT_COLOR, ACCEPT_THICKNESS);
            } else {
                draw_rect(&mut annotated, b, REJECT_COLOR, REJECT_THICKNESS);
            }

            regions.push(Region {
                x: b.x,
                y: b.y,
                width: b.width,
                height: b.height,
                aspect_ratio: aspect,
                fill_ratio: fill,
                accepted,
            });
        }

        debug!(
            candidates = regions.len(),
            accepted = regions.iter().filter(|r| r.accepted).count(),
            is_signed,
            "Page classified"
        );

        Classification {
            is_signed,
            regions,
            annotated,
        }
    }

    /// Big enough AND not a thin vertical artifact AND sparse enough to be
    /// handwriting rather than solid ink.
    fn passes_gates(&self, b: &Bounds, aspect: f32, fill: f32) -> bool {
        let big_enough = b.width > self.cfg.min_width && b.height > self.cfg.min_height;
        let not_thin_bracket = aspect > self.cfg.min_aspect_ratio;
        let ink_sparse = fill < self.cfg.max_fill_ratio;
        big_enough && not_thin_bracket && ink_sparse
    }
}

/// Expand a grayscale image to 3-channel RGB for annotation overlays.
fn gray_to_rgb(gray: &GrayImage) -> RgbImage {
    let (w, h) = (gray.width(), gray.height());
    let mut rgb = RgbImage::new(w, h);
    for (x, y, pixel) in gray.enumerate_pixels() {
        let v = pixel.0[0];
        rgb.put_pixel(x, y, Rgb([v, v, v]));
    }
    rgb
}

/// Draw a hollow rectangle of the given edge thickness, clamped to the
/// image bounds. Thickness grows inward so the box never spills outside
/// its region.
fn draw_rect(img: &mut RgbImage, b: &Bounds, color: Rgb<u8>, thickness: u32) {
    let (w, h) = (img.width(), img.height());
    if w == 0 || h == 0 || b.width == 0 || b.height == 0 {
        return;
    }
    let x1 = (b.x + b.width).min(w);
    let y1 = (b.y + b.height).min(h);
    let t = thickness.max(1);

    for y in b.y..y1 {
        for x in b.x..x1 {
            let on_edge = x < b.x + t || x >= x1.saturating_sub(t) || y < b.y + t || y >= y1.saturating_sub(t);
            if on_edge {
                img.put_pixel(x, y, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    /// A letter-ish page at 150 DPI defaults: white paper everywhere.
    fn blank_page() -> GrayImage {
        GrayImage::from_pixel(1275, 1650, Luma([245]))
    }

    fn fill_rect(img: &mut GrayImage, x0: u32, y0: u32, w: u32, h: u32, v: u8) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                img.put_pixel(x, y, Luma([v]));
            }
        }
    }

    /// Paint a pen-like zig-zag stroke into the box: a triangle-wave
    /// polyline of diagonal segments, so every horizontal run is 1 px and
    /// ruled-line suppression leaves it intact, while the grayscale fill
    /// over the bounding box stays far below the sparseness gate.
    fn paint_scribble(img: &mut GrayImage, x0: u32, y0: u32, w: u32, h: u32) {
        let amp = h - 1;
        let period = 2 * amp;
        for i in 0..w {
            let phase = i % period;
            let dy = if phase <= amp { phase } else { period - phase };
            img.put_pixel(x0 + i, y0 + dy, Luma([30]));
        }
    }

    #[test]
    fn blank_page_is_unsigned() {
        let classifier = SignatureClassifier::default();
        let result = classifier.classify(&blank_page());
        assert!(!result.is_signed);
        assert!(result.regions.is_empty());
    }

    #[test]
    fn sparse_blob_of_signature_size_is_signed() {
        let classifier = SignatureClassifier::default();
        let mut page = blank_page();
        // ~200×60 scribble well inside the scan region.
        paint_scribble(&mut page, 500, 900, 200, 60);
        let result = classifier.classify(&page);
        assert!(result.is_signed);
        let accepted: Vec<_> = result.regions.iter().filter(|r| r.accepted).collect();
        assert_eq!(accepted.len(), 1);
        assert!(accepted[0].width > 60);
        assert!(accepted[0].height > 25);
        assert!(accepted[0].fill_ratio < 0.30);
        assert!(accepted[0].aspect_ratio > 0.5);
    }

    #[test]
    fn solid_black_block_is_rejected_by_fill_gate() {
        let classifier = SignatureClassifier::default();
        let mut page = blank_page();
        // A stamp-sized solid block: big enough, right aspect, but dense.
        fill_rect(&mut page, 500, 900, 200, 80, 10);
        let result = classifier.classify(&page);
        assert!(!result.is_signed);
        let rejected: Vec<_> = result.regions.iter().filter(|r| !r.accepted).collect();
        assert!(!rejected.is_empty());
        assert!(rejected.iter().any(|r| r.fill_ratio >= 0.30));
    }

    #[test]
    fn thin_vertical_artifact_rejected_by_aspect_gate() {
        let classifier = SignatureClassifier::default();
        let mut page = blank_page();
        // A tall, narrow zig-zag smear: 70 px wide and 400 px tall, so it
        // clears the size gate and stays sparse, but aspect ≈ 0.18.
        let amp = 69u32;
        let period = 2 * amp;
        for i in 0..400u32 {
            let phase = i % period;
            let dx = if phase <= amp { phase } else { period - phase };
            page.put_pixel(600 + dx, 700 + i, Luma([30]));
        }
        let result = classifier.classify(&page);
        assert!(!result.is_signed);
        // The smear must have been rejected by the aspect gate alone.
        let smear = result
            .regions
            .iter()
            .find(|r| r.width == 70 && r.height == 400)
            .expect("smear component found");
        assert!(!smear.accepted);
        assert!(smear.aspect_ratio < 0.5);
        assert!(smear.fill_ratio < 0.30);
        assert!(smear.width > 60 && smear.height > 25);
    }

    #[test]
    fn ruled_signature_line_alone_is_unsigned() {
        let classifier = SignatureClassifier::default();
        let mut page = blank_page();
        // A printed signature line: 400 px wide, 2 px tall.
        fill_rect(&mut page, 400, 1200, 400, 2, 20);
        let result = classifier.classify(&page);
        assert!(!result.is_signed, "a bare ruled line must not read as a signature");
    }

    #[test]
    fn scribble_on_ruled_line_is_still_signed() {
        let classifier = SignatureClassifier::default();
        let mut page = blank_page();
        fill_rect(&mut page, 400, 1200, 400, 2, 20);
        paint_scribble(&mut page, 450, 1120, 180, 70);
        let result = classifier.classify(&page);
        assert!(result.is_signed);
    }

    #[test]
    fn classify_is_idempotent() {
        let classifier = SignatureClassifier::default();
        let mut page = blank_page();
        paint_scribble(&mut page, 500, 900, 200, 60);
        fill_rect(&mut page, 300, 600, 120, 90, 10);

        let first = classifier.classify(&page);
        let second = classifier.classify(&page);
        assert_eq!(first.is_signed, second.is_signed);
        assert_eq!(first.regions, second.regions);
        assert_eq!(first.annotated.as_raw(), second.annotated.as_raw());
    }

    #[test]
    fn input_raster_not_mutated() {
        let classifier = SignatureClassifier::default();
        let mut page = blank_page();
        paint_scribble(&mut page, 500, 900, 200, 60);
        let before = page.clone();
        let _ = classifier.classify(&page);
        assert_eq!(page.as_raw(), before.as_raw());
    }

    #[test]
    fn annotated_matches_crop_dimensions() {
        let classifier = SignatureClassifier::default();
        let page = blank_page();
        let result = classifier.classify(&page);
        // 1275×1650 page, crop 20–95% × 15–95%.
        assert_eq!(result.annotated.width(), 956);
        assert_eq!(result.annotated.height(), 1320);
    }

    #[test]
    fn accepted_region_outlined_in_green() {
        let classifier = SignatureClassifier::default();
        let mut page = blank_page();
        paint_scribble(&mut page, 500, 900, 200, 60);
        let result = classifier.classify(&page);
        let region = result.regions.iter().find(|r| r.accepted).unwrap();
        let corner = result.annotated.get_pixel(region.x, region.y);
        assert_eq!(corner.0, [0, 255, 0]);
    }

    #[test]
    fn degenerate_raster_degrades_to_unsigned() {
        let classifier = SignatureClassifier::default();
        let tiny = GrayImage::from_pixel(1, 1, Luma([0]));
        let result = classifier.classify(&tiny);
        assert!(!result.is_signed);
        assert!(result.regions.is_empty());
    }
}
