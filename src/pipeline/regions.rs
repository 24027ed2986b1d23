//! Candidate-region extraction from a cleaned binary mask.
//!
//! Replaces contour tracing with 8-connected component labeling: external
//! contours and connected components produce identical axis-aligned
//! bounding boxes, and a flood fill over a `GrayImage` needs no geometry
//! library. Components are discovered in row-major scan order, so repeated
//! runs over the same mask yield the same region list — the classifier's
//! idempotence rests on this.

use image::GrayImage;
use serde::{Deserialize, Serialize};

/// One candidate region, with the metrics the acceptance filter looks at.
///
/// Coordinates are relative to the cropped scan region, not the full page.
/// Regions are ephemeral: computed during one classification pass and kept
/// only as annotation data on the verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// `width / height`; 0 when the height is 0.
    pub aspect_ratio: f32,
    /// Fraction of *original grayscale* pixels in the box darker than the
    /// configured ink threshold; 0 when the box area is 0.
    pub fill_ratio: f32,
    /// Whether the acceptance filter passed this region.
    pub accepted: bool,
}

/// Axis-aligned bounding box of one connected component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Bounding boxes of all 8-connected foreground components, in the order
/// their first pixel appears in a row-major scan.
pub fn find_component_bounds(mask: &GrayImage) -> Vec<Bounds> {
    let (w, h) = (mask.width() as usize, mask.height() as usize);
    if w == 0 || h == 0 {
        return Vec::new();
    }

    let mut visited = vec![false; w * h];
    let mut bounds = Vec::new();
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for y in 0..h {
        for x in 0..w {
            if visited[y * w + x] || mask.get_pixel(x as u32, y as u32).0[0] == 0 {
                continue;
            }

            // Flood-fill one component with an explicit stack; recursion
            // depth would be unbounded on large ink blobs.
            let (mut min_x, mut max_x) = (x, x);
            let (mut min_y, mut max_y) = (y, y);
            visited[y * w + x] = true;
            stack.push((x, y));

            while let Some((cx, cy)) = stack.pop() {
                min_x = min_x.min(cx);
                max_x = max_x.max(cx);
                min_y = min_y.min(cy);
                max_y = max_y.max(cy);

                for (nx, ny) in neighbors8(cx, cy, w, h) {
                    let idx = ny * w + nx;
                    if !visited[idx] && mask.get_pixel(nx as u32, ny as u32).0[0] != 0 {
                        visited[idx] = true;
                        stack.push((nx, ny));
                    }
                }
            }

            bounds.push(Bounds {
                x: min_x as u32,
                y: min_y as u32,
                width: (max_x - min_x + 1) as u32,
                height: (max_y - min_y + 1) as u32,
            });
        }
    }
    bounds
}

/// The up-to-eight in-bounds neighbors of `(x, y)`.
fn neighbors8(x: usize, y: usize, w: usize, h: usize) -> impl Iterator<Item = (usize, usize)> {
    const OFFSETS: [(i64, i64); 8] = [
        (-1, -1),
        (0, -1),
        (1, -1),
        (-1, 0),
        (1, 0),
        (-1, 1),
        (0, 1),
        (1, 1),
    ];
    let (xi, yi) = (x as i64, y as i64);
    let (wi, hi) = (w as i64, h as i64);
    OFFSETS.into_iter().filter_map(move |(dx, dy)| {
        let (nx, ny) = (xi + dx, yi + dy);
        if nx >= 0 && ny >= 0 && nx < wi && ny < hi {
            Some((nx as usize, ny as usize))
        } else {
            None
        }
    })
}

/// Fraction of pixels inside `bounds` of the *original cropped grayscale*
/// (not the binary mask) darker than `dark_threshold`.
///
/// Measured against the grayscale so anti-aliased mid-tones don't count as
/// ink: a sparse pen stroke scores low even though its mask box is filled
/// edge to edge.
pub fn fill_ratio(roi: &GrayImage, bounds: &Bounds, dark_threshold: u8) -> f32 {
    let total = (bounds.width as u64) * (bounds.height as u64);
    if total == 0 {
        return 0.0;
    }
    let mut dark = 0u64;
    for y in bounds.y..bounds.y + bounds.height {
        for x in bounds.x..bounds.x + bounds.width {
            if roi.get_pixel(x, y).0[0] < dark_threshold {
                dark += 1;
            }
        }
    }
    dark as f32 / total as f32
}

/// `width / height`, or 0 for a degenerate box.
pub fn aspect_ratio(bounds: &Bounds) -> f32 {
    if bounds.height == 0 {
        0.0
    } else {
        bounds.width as f32 / bounds.height as f32
    }
}
