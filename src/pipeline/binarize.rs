//! Crop + binarise + ruled-line suppression for one page raster.
//!
//! ## Why adaptive, not global, thresholding?
//!
//! Scan illumination drifts across a page — a single global cutoff either
//! swallows faint ink in bright corners or turns shading into foreground.
//! Each pixel is instead compared against the mean of its own
//! `block_size × block_size` neighborhood (minus a small constant), computed
//! in O(1) per pixel from an integral image.
//!
//! ## Why erase long horizontal runs?
//!
//! Printed signature lines and table borders binarise into exactly the kind
//! of wide foreground blobs that confuse region extraction. A morphological
//! opening with a wide flat `k × 1` element keeps only features at least
//! `k` px wide and 1 px tall — straight horizontal rules — and subtracting
//! that opening from the mask removes them while compact, non-linear ink
//! (handwriting) survives. With a 1-px-tall element the opening degenerates
//! to per-row run-length filtering, which is how it is implemented here.

use crate::config::ClassifierConfig;
use image::GrayImage;

/// Foreground value in binary masks.
pub const FOREGROUND: u8 = 255;

/// Crop a page raster to the configured scan region.
///
/// Row range `[h·crop_top, h·crop_bottom)`, column range
/// `[w·crop_left, w·crop_right)`, fractions truncated toward zero. The top
/// and left bands hold letterhead, logos and hole punches that would
/// false-positive; the thin bottom/right margins hold scan-edge artifacts.
pub fn crop_scan_region(page: &GrayImage, cfg: &ClassifierConfig) -> GrayImage {
    let (w, h) = (page.width(), page.height());
    let y_start = (h as f32 * cfg.crop_top) as u32;
    let y_end = (h as f32 * cfg.crop_bottom) as u32;
    let x_start = (w as f32 * cfg.crop_left) as u32;
    let x_end = (w as f32 * cfg.crop_right) as u32;

    let crop_w = x_end.saturating_sub(x_start);
    let crop_h = y_end.saturating_sub(y_start);
    image::imageops::crop_imm(page, x_start, y_start, crop_w, crop_h).to_image()
}

/// Inverse adaptive binarisation: ink → foreground (255), paper → 0.
///
/// A pixel becomes foreground iff its intensity is at most the local
/// neighborhood mean minus `c`. The neighborhood is clamped at the image
/// border, so edge pixels are compared against a smaller window rather
/// than padded data.
pub fn adaptive_threshold_inv(src: &GrayImage, block_size: u32, c: i16) -> GrayImage {
    let (w, h) = (src.width(), src.height());
    let mut out = GrayImage::new(w, h);
    if w == 0 || h == 0 {
        return out;
    }

    let integral = integral_image(src);
    let radius = (block_size / 2) as i64;
    let (wi, hi) = (w as i64, h as i64);

    for y in 0..hi {
        let y0 = (y - radius).max(0) as usize;
        let y1 = ((y + radius + 1).min(hi)) as usize;
        for x in 0..wi {
            let x0 = (x - radius).max(0) as usize;
            let x1 = ((x + radius + 1).min(wi)) as usize;

            let area = ((y1 - y0) * (x1 - x0)) as i64;
            let sum = window_sum(&integral, w as usize, x0, y0, x1, y1);
            let mean = sum / area;
            let threshold = mean - c as i64;

            let pixel = src.get_pixel(x as u32, y as u32).0[0] as i64;
            let value = if pixel <= threshold { FOREGROUND } else { 0 };
            out.put_pixel(x as u32, y as u32, image::Luma([value]));
        }
    }
    out
}

/// Summed-area table with a zero row/column of padding.
fn integral_image(src: &GrayImage) -> Vec<i64> {
    let (w, h) = (src.width() as usize, src.height() as usize);
    let stride = w + 1;
    let mut table = vec![0i64; stride * (h + 1)];
    for y in 0..h {
        let mut row_sum = 0i64;
        for x in 0..w {
            row_sum += src.get_pixel(x as u32, y as u32).0[0] as i64;
            table[(y + 1) * stride + x + 1] = table[y * stride + x + 1] + row_sum;
        }
    }
    table
}

/// Sum of the half-open window `[x0, x1) × [y0, y1)` from the padded table.
fn window_sum(integral: &[i64], width: usize, x0: usize, y0: usize, x1: usize, y1: usize) -> i64 {
    let stride = width + 1;
    integral[y1 * stride + x1] + integral[y0 * stride + x0]
        - integral[y0 * stride + x1]
        - integral[y1 * stride + x0]
}

/// Erase every horizontal foreground run of length ≥ `min_run`.
///
/// Equivalent to subtracting the morphological opening with a
/// `min_run × 1` flat structuring element: a run at least as wide as the
/// element survives opening in full and is therefore removed in full;
/// shorter runs vanish under erosion and are kept untouched.
pub fn suppress_horizontal_runs(mask: &GrayImage, min_run: u32) -> GrayImage {
    let (w, h) = (mask.width(), mask.height());
    let mut out = mask.clone();

    for y in 0..h {
        let mut x = 0;
        while x < w {
            if mask.get_pixel(x, y).0[0] == 0 {
                x += 1;
                continue;
            }
            let run_start = x;
            while x < w && mask.get_pixel(x, y).0[0] != 0 {
                x += 1;
            }
            if x - run_start >= min_run {
                for rx in run_start..x {
                    out.put_pixel(rx, y, image::Luma([0]));
                }
            }
        }
    }
    out
}
