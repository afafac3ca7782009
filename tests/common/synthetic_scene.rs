use image::{ GrayImage, Luma, Rgb, RgbImage };

use swt_text::edges::EDGE;
use swt_text::SwtParams;

/// Dark vertical bars, three pixels wide, on a white background.
///
/// Edges are marked on the left and right columns of each bar, leaving out
/// the first and last rows, so that the gradient there is purely horizontal.
/// Every bar thus yields rays of length 2, and a component whose box is
/// `(x, y + 1, 3, height - 2)`.
pub struct Scene {
    pub image: RgbImage,
    pub edges: GrayImage,
}

pub const BAR_WIDTH: u32 = 3;

impl Scene {
    pub fn new(width: u32, height: u32) -> Self {
        Scene {
            image: RgbImage::from_pixel(width, height, Rgb([255, 255, 255])),
            edges: GrayImage::new(width, height),
        }
    }

    pub fn bar(mut self, x: u32, y: u32, height: u32) -> Self {
        for row in y .. y + height {
            for column in x .. x + BAR_WIDTH {
                self.image.put_pixel(column, row, Rgb([0, 0, 0]));
            }
        }
        for row in y + 1 .. y + height - 1 {
            self.edges.put_pixel(x, row, Luma([EDGE]));
            self.edges.put_pixel(x + BAR_WIDTH - 1, row, Luma([EDGE]));
        }
        self
    }
}

/// Dark on light, no blur.
pub fn params() -> SwtParams {
    SwtParams {
        blur_sigma: 0.,
        black_on_white: true,
        ..Default::default()
    }
}
