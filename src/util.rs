use image::{ ImageBuffer, Luma };
use imageproc::rect::Rect;
use itertools::iproduct;

use std::cmp::{ max, min };

/// Single-channel float raster (gradients, directions, stroke widths).
pub type FloatImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Component labels. 0 means "no component".
pub type LabelImage = ImageBuffer<Luma<u16>, Vec<u16>>;

/// A pixel coordinate, `x` being the column and `y` the row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

impl Point {
    pub fn new(x: u32, y: u32) -> Point {
        Point { x, y }
    }

    pub fn distance(&self, other: &Point) -> f32 {
        let dx = self.x as f32 - other.x as f32;
        let dy = self.y as f32 - other.y as f32;
        f32::sqrt(dx * dx + dy * dy)
    }
}

/// Axis-aligned box in pixel units. `width` and `height` count pixels, so a
/// single point has a 1x1 box.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// The smallest box containing all `points`, `None` if there are none.
    pub fn from_points<'a, I>(points: I) -> Option<BoundingBox>
        where I: IntoIterator<Item = &'a Point>
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (mut x0, mut y0, mut x1, mut y1) = (first.x, first.y, first.x, first.y);
        for point in points {
            x0 = min(x0, point.x);
            y0 = min(y0, point.y);
            x1 = max(x1, point.x);
            y1 = max(y1, point.y);
        }
        Some(BoundingBox {
            x: x0,
            y: y0,
            width: x1 - x0 + 1,
            height: y1 - y0 + 1,
        })
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn aspect_ratio(&self) -> Option<f32> {
        if self.height == 0 {
            return None;
        }
        Some(self.width as f32 / self.height as f32)
    }

    pub fn diagonal(&self) -> f32 {
        let w = self.width as f32;
        let h = self.height as f32;
        f32::sqrt(w * w + h * h)
    }

    pub fn vertical_center(&self) -> f32 {
        self.y as f32 + self.height as f32 / 2.
    }

    /// Every coordinate covered by the box, row by row.
    pub fn coords(&self) -> impl Iterator<Item = Point> {
        let (x, y, width, height) = (self.x, self.y, self.width, self.height);
        iproduct!(y .. y + height, x .. x + width).map(|(y, x)| Point { x, y })
    }

    pub fn to_rect(&self) -> Rect {
        Rect::at(self.x as i32, self.y as i32)
            .of_size(max(self.width, 1), max(self.height, 1))
    }
}

/// Median of an already sorted slice. Even lengths average the two middle values.
pub fn median(numbers: &[f32]) -> Option<f32> {
    match numbers.len() {
        0 => None,
        1 => Some(numbers[0]),
        len => {
            if len % 2 == 1 {
                Some(numbers[len / 2])
            } else {
                Some((numbers[len / 2 - 1] + numbers[len / 2]) / 2.)
            }
        }
    }
}

/// Sort `numbers` in place, then take their median.
pub fn sorted_median(numbers: &mut [f32]) -> Option<f32> {
    numbers.sort_by(f32::total_cmp);
    median(numbers)
}

/// Population mean and variance.
pub fn mean_variance(numbers: &[f32]) -> Option<(f32, f32)> {
    if numbers.is_empty() {
        return None;
    }
    let len = numbers.len() as f64;
    let mean = numbers.iter().map(|&n| n as f64).sum::<f64>() / len;
    let variance = numbers.iter()
        .map(|&n| {
            let delta = n as f64 - mean;
            delta * delta
        })
        .sum::<f64>() / len;
    Some((mean as f32, variance as f32))
}

/// `true` if `a / b` lies in `[1 / threshold, threshold]`, `threshold` being
/// normalized to be at least 1 first.
pub fn within_ratio(a: f32, b: f32, threshold: f32) -> bool {
    let threshold = normalize_ratio(threshold);
    let ratio = a / b;
    ratio >= 1. / threshold && ratio <= threshold
}

/// A ratio threshold and its reciprocal describe the same symmetric band.
pub fn normalize_ratio(threshold: f32) -> f32 {
    if threshold < 1. { 1. / threshold } else { threshold }
}
