//! Binary edge masks (0 or 255) feeding the stroke width transform.
//!
//! Two sources are available: `imageproc`'s Canny detector, and our own
//! Canny-style detector built from a Sobel gradient, a four-bin non-maxima
//! suppression and a two-threshold hysteresis.
use image::{ GrayImage, Luma };
use imageproc::edges::canny;
use itertools::iproduct;

use crate::config::{ EdgeDetector, SwtParams };
use crate::gradient::GradientField;
use crate::util::FloatImage;

pub const EDGE: u8 = 255;

/// Compute the edge mask selected by `params.edge_detector`.
pub fn detect_edges(gray: &GrayImage, params: &SwtParams) -> GrayImage {
    let (low, high) = (params.edge_threshold_min, params.edge_threshold_max);
    match params.edge_detector {
        EdgeDetector::Canny => canny(gray, low, high),
        EdgeDetector::Hysteresis => hysteresis_edges(gray, low, high),
    }
}

/// Sobel gradient, then non-maxima suppression, then hysteresis.
pub fn hysteresis_edges(gray: &GrayImage, low: f32, high: f32) -> GrayImage {
    let gradient = GradientField::sobel(gray);
    let suppressed = non_maxima_suppression(&gradient);
    hysteresis(&suppressed, low, high)
}

/// The two neighbours to compare against, given the gradient angle folded
/// into `[0, 180)` degrees. Rows grow downwards.
fn neighbour_offsets(angle: f32) -> [(i32, i32); 2] {
    if angle <= 22.5 || angle > 157.5 {
        [(-1, 0), (1, 0)]
    } else if angle <= 67.5 {
        [(-1, -1), (1, 1)]
    } else if angle <= 112.5 {
        [(0, -1), (0, 1)]
    } else {
        [(-1, 1), (1, -1)]
    }
}

/// Keep only the pixels whose magnitude is not exceeded by either neighbour
/// along the gradient. The outermost frame is always suppressed.
pub fn non_maxima_suppression(gradient: &GradientField) -> FloatImage {
    let (w, h) = gradient.dimensions();
    let mut result = FloatImage::new(w, h);
    if w < 3 || h < 3 {
        return result;
    }
    let magnitude = |x: i32, y: i32| gradient.magnitude.get_pixel(x as u32, y as u32).0[0];
    for (y, x) in iproduct!(1 .. h - 1, 1 .. w - 1) {
        let own = gradient.magnitude.get_pixel(x, y).0[0];
        if own == 0. {
            continue;
        }
        let gx = gradient.x.get_pixel(x, y).0[0];
        let gy = gradient.y.get_pixel(x, y).0[0];
        let angle = gy.atan2(gx).to_degrees().rem_euclid(180.);
        let suppressed = neighbour_offsets(angle).iter().any(|&(dx, dy)| {
            magnitude(x as i32 + dx, y as i32 + dy) > own
        });
        if !suppressed {
            result.put_pixel(x, y, Luma([own]));
        }
    }
    result
}

/// Pixels at or above `high` are edges, pixels in `[low, high)` are edges if
/// they are 8-connected, possibly through other such pixels, to an edge.
pub fn hysteresis(magnitude: &FloatImage, low: f32, high: f32) -> GrayImage {
    let (w, h) = magnitude.dimensions();
    let mut result = GrayImage::new(w, h);
    let mut pending = Vec::new();
    for (x, y, pixel) in magnitude.enumerate_pixels() {
        if pixel.0[0] >= high {
            result.put_pixel(x, y, Luma([EDGE]));
            pending.push((x, y));
        }
    }
    let strong = pending.len();

    while let Some((x, y)) = pending.pop() {
        for (dy, dx) in iproduct!(-1i32 ..= 1, -1i32 ..= 1) {
            let nx = x as i32 + dx;
            let ny = y as i32 + dy;
            if nx < 0 || ny < 0 || nx >= w as i32 || ny >= h as i32 {
                continue;
            }
            let (nx, ny) = (nx as u32, ny as u32);
            if result.get_pixel(nx, ny).0[0] == EDGE {
                continue;
            }
            let value = magnitude.get_pixel(nx, ny).0[0];
            if value >= low && value < high {
                // Weak pixel touching an edge, promote it.
                result.put_pixel(nx, ny, Luma([EDGE]));
                pending.push((nx, ny));
            }
        }
    }
    debug!("hysteresis: {} strong pixels", strong);
    result
}
