//! Debug images for each stage of the detection.
use image::{ GrayImage, Luma, Rgb, RgbImage };
use imageproc::drawing::draw_hollow_rect_mut;
use rand::{ Rng, SeedableRng };
use rand::rngs::StdRng;

use crate::swt::Ray;
use crate::util::{ BoundingBox, FloatImage, LabelImage };

const PALETTE_SEED: u64 = 0x5717;

/// Stretch finite values to `[0, 255]`. Infinite and NaN values become 0.
pub fn normalize(image: &FloatImage) -> GrayImage {
    let finite = || image.pixels().map(|p| p.0[0]).filter(|v| v.is_finite());
    let min = finite().fold(f32::INFINITY, f32::min);
    let max = finite().fold(f32::NEG_INFINITY, f32::max);
    let range = max - min;
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let value = image.get_pixel(x, y).0[0];
        if !value.is_finite() {
            return Luma([0]);
        }
        if range <= 0. {
            return Luma([if value > 0. { 255 } else { 0 }]);
        }
        Luma([((value - min) / range * 255.).round() as u8])
    })
}

/// One color per label, white for label 0. Colors are the same from one run
/// to the next.
pub fn colorize_labels(labels: &LabelImage) -> RgbImage {
    let max_label = labels.pixels().map(|p| p.0[0]).max().unwrap_or(0);
    let mut rng = StdRng::seed_from_u64(PALETTE_SEED);
    let mut palette = vec![Rgb([255, 255, 255])];
    palette.extend((0 .. max_label).map(|_| {
        // Stay away from white so that components remain visible.
        Rgb([rng.gen_range(0 .. 224), rng.gen_range(0 .. 224), rng.gen_range(0 .. 224)])
    }));
    RgbImage::from_fn(labels.width(), labels.height(), |x, y| {
        palette[labels.get_pixel(x, y).0[0] as usize]
    })
}

/// White on black, every pixel walked over by a ray.
pub fn ray_image(rays: &[Ray], dimensions: (u32, u32)) -> GrayImage {
    let (width, height) = dimensions;
    let mut image = GrayImage::new(width, height);
    for point in rays.iter().flat_map(|ray| ray.points()) {
        if point.x < width && point.y < height {
            image.put_pixel(point.x, point.y, Luma([255]));
        }
    }
    image
}

pub fn draw_boxes(image: &mut RgbImage, boxes: &[BoundingBox], color: Rgb<u8>) {
    for bbox in boxes {
        draw_hollow_rect_mut(image, bbox.to_rect(), color);
    }
}
