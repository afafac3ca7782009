//! Stroke Width Transform.
//!
//! From every edge pixel, we walk along the gradient direction until we hit
//! another edge pixel. If that opposite edge faces us (its gradient is roughly
//! antiparallel to ours), the pixels walked over form a ray whose length is a
//! measure of the local stroke width.
use image::{ GrayImage, Luma };

use std::f32::consts::FRAC_PI_6;

use crate::edges::EDGE;
use crate::error::{ ensure_dimensions, Result, SwtError };
use crate::gradient::DirectionField;
use crate::util::{ sorted_median, FloatImage, Point };

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwtDirection {
    /// Follow the gradient, for light strokes on a dark background.
    DarkToBright = 1,
    /// Walk against the gradient, for dark strokes on a light background.
    BrightToDark = -1,
}

impl SwtDirection {
    pub fn from_black_on_white(black_on_white: bool) -> SwtDirection {
        if black_on_white {
            SwtDirection::BrightToDark
        } else {
            SwtDirection::DarkToBright
        }
    }

    pub fn sign(self) -> f32 {
        self as i32 as f32
    }
}

/// The pixels walked over between two facing edge pixels, both included.
#[derive(Clone, Debug, PartialEq)]
pub struct Ray {
    points: Vec<Point>,
}

impl Ray {
    /// A ray through `points`, `None` if there are none.
    pub fn from_points(points: Vec<Point>) -> Option<Ray> {
        if points.is_empty() {
            return None;
        }
        Some(Ray { points })
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn start(&self) -> Point {
        self.points[0]
    }

    pub fn end(&self) -> Point {
        self.points[self.points.len() - 1]
    }

    /// Euclidean distance between both ends.
    pub fn length(&self) -> f32 {
        self.start().distance(&self.end())
    }
}

/// Output of the first pass.
#[derive(Clone, Debug)]
pub struct StrokeWidths {
    /// Smallest ray length through each pixel, `f32::INFINITY` if no ray
    /// went through it.
    pub widths: FloatImage,

    /// Every valid ray, in the raster order of their starting pixel.
    pub rays: Vec<Ray>,
}

/// Walk from `start` along its gradient direction. `None` if we leave the
/// image or hit an edge that does not face us.
fn cast_ray(edges: &GrayImage, directions: &DirectionField, start: Point, sign: f32) -> Option<Ray> {
    let (width, height) = edges.dimensions();
    let (dx, dy) = directions.at(start.x, start.y);
    let norm = f32::hypot(dx, dy);
    if norm == 0. {
        // Flat area, the ray would never move.
        return None;
    }
    // Past this many steps, we have walked further than the image diagonal.
    let max_steps = ((width + height) as f32 / norm).ceil() as u32 + 1;

    let mut points = vec![start];
    for step in 1 ..= max_steps {
        let distance = step as f32 * sign;
        let x = (start.x as f32 + dx * distance).floor();
        let y = (start.y as f32 + dy * distance).floor();
        if x < 0. || y < 0. || x >= width as f32 || y >= height as f32 {
            // Leaving the image, no border found.
            return None;
        }
        let current = Point::new(x as u32, y as u32);
        if Some(&current) == points.last() {
            // Not enough progress to reach the next pixel yet.
            continue;
        }
        points.push(current);
        if edges.get_pixel(current.x, current.y).0[0] != EDGE {
            continue;
        }

        // Make sure that the opposite edge is in -d_p +/- pi/6. Otherwise,
        // the shape is too exotic to be a stroke.
        let (ex, ey) = directions.at(current.x, current.y);
        if -(dx * ex + dy * ey) >= f32::cos(FRAC_PI_6) {
            return Some(Ray { points });
        }
        return None;
    }
    None
}

/// First pass: cast a ray from every edge pixel and record, for each pixel,
/// the length of the shortest valid ray crossing it.
pub fn stroke_widths(edges: &GrayImage, directions: &DirectionField, direction: SwtDirection) -> Result<StrokeWidths> {
    directions.check()?;
    ensure_dimensions("edge mask", directions.dimensions(), edges.dimensions())?;

    let (width, height) = edges.dimensions();
    let mut widths = FloatImage::from_pixel(width, height, Luma([f32::INFINITY]));
    let mut rays = vec![];
    let mut discarded = 0;
    let sign = direction.sign();

    for (x, y, pixel) in edges.enumerate_pixels() {
        if pixel.0[0] != EDGE {
            continue;
        }
        let ray = match cast_ray(edges, directions, Point::new(x, y), sign) {
            Some(ray) => ray,
            None => {
                discarded += 1;
                continue;
            }
        };
        let length = ray.length();
        for point in ray.points() {
            let current = widths.get_pixel_mut(point.x, point.y);
            if length < current.0[0] {
                // We have found a shorter width. Update.
                current.0[0] = length;
            }
        }
        rays.push(ray);
    }
    debug!("swt: {} rays recorded, {} discarded", rays.len(), discarded);
    Ok(StrokeWidths { widths, rays })
}

/// Second pass.
///
/// The widths computed so far work nicely for simple forms, but corners make
/// them meaningless. Consider the corner of letter "L": rays leaving the
/// corner diagonally are much longer than the true width of either stroke.
/// So each pixel of a ray is clamped to the median width along that ray, and
/// a pixel crossed by several rays keeps the smallest such value. Pixels that
/// no ray crosses are 0.
pub fn refine(widths: &FloatImage, rays: &[Ray]) -> Result<FloatImage> {
    let (width, height) = widths.dimensions();
    for ray in rays {
        if let Some(point) = ray.points().iter().find(|p| p.x >= width || p.y >= height) {
            return Err(SwtError::RayOutOfBounds {
                point: (point.x, point.y),
                dimensions: (width, height),
            });
        }
    }

    let mut refined = FloatImage::from_pixel(width, height, Luma([f32::INFINITY]));
    let mut buf = Vec::new();
    for ray in rays {
        buf.clear();
        buf.extend(ray.points().iter().map(|p| widths.get_pixel(p.x, p.y).0[0]));
        let median = match sorted_median(&mut buf) {
            Some(median) => median,
            None => continue,
        };
        for point in ray.points() {
            let clamped = widths.get_pixel(point.x, point.y).0[0].min(median);
            let current = refined.get_pixel_mut(point.x, point.y);
            if clamped < current.0[0] {
                current.0[0] = clamped;
            }
        }
    }
    for pixel in refined.pixels_mut() {
        if !pixel.0[0].is_finite() {
            pixel.0[0] = 0.;
        }
    }
    Ok(refined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{ Rng, SeedableRng };
    use rand::rngs::StdRng;

    const S: f32 = std::f32::consts::FRAC_1_SQRT_2;

    fn field(w: u32, h: u32, entries: &[((u32, u32), (f32, f32))]) -> (GrayImage, DirectionField) {
        let mut edges = GrayImage::new(w, h);
        let mut directions = DirectionField {
            x: FloatImage::new(w, h),
            y: FloatImage::new(w, h),
        };
        for &((x, y), (dx, dy)) in entries {
            edges.put_pixel(x, y, Luma([EDGE]));
            directions.x.put_pixel(x, y, Luma([dx]));
            directions.y.put_pixel(x, y, Luma([dy]));
        }
        (edges, directions)
    }

    fn width_at(swt: &StrokeWidths, x: u32, y: u32) -> f32 {
        swt.widths.get_pixel(x, y).0[0]
    }

    #[test]
    fn black_on_white_walks_against_the_gradient() {
        assert_eq!(SwtDirection::from_black_on_white(true), SwtDirection::BrightToDark);
        assert_eq!(SwtDirection::from_black_on_white(false).sign(), 1.);
        assert_eq!(SwtDirection::BrightToDark.sign(), -1.);
    }

    #[test]
    fn facing_edges_make_rays_both_ways() {
        let (edges, directions) = field(10, 5, &[((2, 2), (-1., 0.)), ((6, 2), (1., 0.))]);
        let swt = stroke_widths(&edges, &directions, SwtDirection::BrightToDark).unwrap();
        assert_eq!(swt.rays.len(), 2);
        let expected: Vec<Point> = (2 ..= 6).map(|x| Point::new(x, 2)).collect();
        assert_eq!(swt.rays[0].points(), &expected[..]);
        assert_eq!(swt.rays[1].start(), Point::new(6, 2));
        assert_eq!(swt.rays[1].end(), Point::new(2, 2));
        for x in 2 ..= 6 {
            assert_eq!(width_at(&swt, x, 2), 4.);
        }
        assert_eq!(width_at(&swt, 7, 2), f32::INFINITY);
        assert_eq!(width_at(&swt, 4, 1), f32::INFINITY);
    }

    #[test]
    fn edges_must_face_each_other() {
        let angle = |degrees: f32| {
            let radians = degrees.to_radians();
            (radians.cos(), radians.sin())
        };
        let (edges, directions) = field(10, 10, &[((2, 2), (-1., 0.)), ((6, 2), angle(25.))]);
        let swt = stroke_widths(&edges, &directions, SwtDirection::BrightToDark).unwrap();
        assert!(swt.rays.iter().any(|ray| ray.start() == Point::new(2, 2)));

        let (edges, directions) = field(10, 10, &[((2, 2), (-1., 0.)), ((6, 2), angle(35.))]);
        let swt = stroke_widths(&edges, &directions, SwtDirection::BrightToDark).unwrap();
        assert!(swt.rays.iter().all(|ray| ray.start() != Point::new(2, 2)));
    }

    #[test]
    fn perpendicular_edge_ends_the_ray() {
        // The first edge met is perpendicular, so the facing one behind it is never reached.
        let (edges, directions) = field(10, 5, &[
            ((1, 2), (-1., 0.)),
            ((3, 2), (0., 1.)),
            ((6, 2), (1., 0.)),
        ]);
        let swt = stroke_widths(&edges, &directions, SwtDirection::BrightToDark).unwrap();
        assert!(swt.rays.iter().all(|ray| ray.start() != Point::new(1, 2)));
        assert_eq!(width_at(&swt, 2, 2), f32::INFINITY);
    }

    #[test]
    fn leaving_the_image_discards_the_ray() {
        let (edges, directions) = field(6, 3, &[((2, 1), (1., 0.))]);
        let swt = stroke_widths(&edges, &directions, SwtDirection::BrightToDark).unwrap();
        assert!(swt.rays.is_empty());
        assert!(swt.widths.pixels().all(|p| p.0[0] == f32::INFINITY));
    }

    #[test]
    fn flat_edge_pixels_cast_nothing() {
        let (edges, directions) = field(6, 3, &[((2, 1), (0., 0.)), ((4, 1), (1., 0.))]);
        let swt = stroke_widths(&edges, &directions, SwtDirection::DarkToBright).unwrap();
        assert!(swt.rays.is_empty());
    }

    #[test]
    fn diagonal_ray_skips_repeated_pixels() {
        let (edges, directions) = field(6, 6, &[((1, 1), (-S, -S)), ((3, 3), (S, S))]);
        let swt = stroke_widths(&edges, &directions, SwtDirection::BrightToDark).unwrap();
        let ray = &swt.rays[0];
        assert_eq!(ray.points(), &[Point::new(1, 1), Point::new(2, 2), Point::new(3, 3)]);
        assert!((ray.length() - 2. * std::f32::consts::SQRT_2).abs() < 1e-5);
    }

    #[test]
    fn recorded_rays_stay_inside_and_face_each_other() {
        let (edges, directions) = field(12, 12, &[
            ((2, 5), (-1., 0.)),
            ((7, 5), (1., 0.)),
            ((2, 8), (-1., 0.)),
            ((9, 8), (0., -1.)),
            ((5, 1), (0., 1.)),
        ]);
        let swt = stroke_widths(&edges, &directions, SwtDirection::BrightToDark).unwrap();
        assert!(!swt.rays.is_empty());
        for ray in &swt.rays {
            let (sx, sy) = directions.at(ray.start().x, ray.start().y);
            let (ex, ey) = directions.at(ray.end().x, ray.end().y);
            assert!(-(sx * ex + sy * ey) >= f32::cos(FRAC_PI_6));
            assert!(ray.points().iter().all(|p| p.x < 12 && p.y < 12));
        }
    }

    #[test]
    fn mismatched_mask_is_rejected() {
        let (_, directions) = field(6, 6, &[]);
        let edges = GrayImage::new(5, 6);
        match stroke_widths(&edges, &directions, SwtDirection::BrightToDark) {
            Err(SwtError::DimensionMismatch { expected, actual, .. }) => {
                assert_eq!(expected, (6, 6));
                assert_eq!(actual, (5, 6));
            }
            other => panic!("unexpected {:?}", other.map(|swt| swt.rays.len())),
        }
    }

    fn ray(points: &[(u32, u32)]) -> Ray {
        Ray { points: points.iter().map(|&(x, y)| Point::new(x, y)).collect() }
    }

    #[test]
    fn refine_clamps_to_the_median_and_keeps_the_minimum() {
        let widths = FloatImage::from_vec(6, 1, vec![3., 3., 10., 2., f32::INFINITY, f32::INFINITY]).unwrap();
        let a = ray(&[(0, 0), (1, 0), (2, 0)]);
        let b = ray(&[(2, 0), (3, 0)]);

        let forward = refine(&widths, &[a.clone(), b.clone()]).unwrap();
        let backward = refine(&widths, &[b, a]).unwrap();
        assert_eq!(forward, backward);
        let values: Vec<f32> = forward.pixels().map(|p| p.0[0]).collect();
        assert_eq!(values, vec![3., 3., 3., 2., 0., 0.]);
    }

    #[test]
    fn refine_never_increases_a_width() {
        let mut rng = StdRng::seed_from_u64(7);
        let (w, h) = (16, 16);
        let widths = FloatImage::from_fn(w, h, |_, _| Luma([rng.gen_range(1. .. 20.)]));
        let rays: Vec<Ray> = (0 .. 40).map(|_| {
            let len = rng.gen_range(1 .. 8);
            Ray {
                points: (0 .. len)
                    .map(|_| Point::new(rng.gen_range(0 .. w), rng.gen_range(0 .. h)))
                    .collect(),
            }
        }).collect();
        let refined = refine(&widths, &rays).unwrap();
        for (x, y, pixel) in refined.enumerate_pixels() {
            assert!(pixel.0[0] <= widths.get_pixel(x, y).0[0]);
        }
    }

    #[test]
    fn refine_rejects_rays_outside_the_map() {
        let widths = FloatImage::new(3, 3);
        assert!(refine(&widths, &[ray(&[(1, 1), (3, 1)])]).is_err());
    }
}
