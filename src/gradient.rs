//! Luminance and gradient direction field.
//!
//! Derivatives are 3x3 correlations with border clamping. The Scharr pair
//! feeds the stroke width transform, the Sobel pair feeds the edge detector in
//! `edges`.
use image::{ GrayImage, Luma, RgbImage };
use imageproc::filter::gaussian_blur_f32;

use crate::error::{ ensure_dimensions, Result };
use crate::util::FloatImage;

pub type Kernel3 = [[f32; 3]; 3];

pub const SCHARR_KERNEL_X: Kernel3 = [[-3., 0., 3.], [-10., 0., 10.], [-3., 0., 3.]];
pub const SCHARR_KERNEL_Y: Kernel3 = [[-3., -10., -3.], [0., 0., 0.], [3., 10., 3.]];

pub const SOBEL_KERNEL_X: Kernel3 = [[-1., 0., 1.], [-2., 0., 2.], [-1., 0., 1.]];
pub const SOBEL_KERNEL_Y: Kernel3 = [[-1., -2., -1.], [0., 0., 0.], [1., 2., 1.]];

/// Blur the input before computing luminance, to tame sensor noise.
/// A non-positive `sigma` leaves the image untouched.
pub fn blur(image: &RgbImage, sigma: f32) -> RgbImage {
    if sigma <= 0. {
        return image.clone();
    }
    gaussian_blur_f32(image, sigma)
}

/// Weighted luminance, `0.2989 R + 0.5870 G + 0.1140 B`, rounded.
pub fn luminance(image: &RgbImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b] = image.get_pixel(x, y).0;
        let value = 0.2989 * r as f32 + 0.5870 * g as f32 + 0.1140 * b as f32;
        Luma([value.round().max(0.).min(255.) as u8])
    })
}

/// Per-pixel derivatives and their Euclidean magnitude.
#[derive(Clone, Debug)]
pub struct GradientField {
    pub x: FloatImage,
    pub y: FloatImage,
    pub magnitude: FloatImage,
}

/// Unit gradient direction per pixel, `(0, 0)` where the magnitude is exactly 0.
#[derive(Clone, Debug)]
pub struct DirectionField {
    pub x: FloatImage,
    pub y: FloatImage,
}

impl GradientField {
    /// Scharr derivatives of `image`.
    pub fn scharr(image: &GrayImage) -> GradientField {
        GradientField::with_kernels(image, &SCHARR_KERNEL_X, &SCHARR_KERNEL_Y)
    }

    /// Sobel derivatives of `image`.
    pub fn sobel(image: &GrayImage) -> GradientField {
        GradientField::with_kernels(image, &SOBEL_KERNEL_X, &SOBEL_KERNEL_Y)
    }

    pub fn with_kernels(image: &GrayImage, kernel_x: &Kernel3, kernel_y: &Kernel3) -> GradientField {
        let (w, h) = image.dimensions();
        let mut gx = FloatImage::new(w, h);
        let mut gy = FloatImage::new(w, h);
        let mut magnitude = FloatImage::new(w, h);
        if w == 0 || h == 0 {
            return GradientField { x: gx, y: gy, magnitude };
        }

        let sample = |x: u32, y: u32| image.get_pixel(x, y).0[0] as f32;
        for y in 0 .. h {
            let y_idx = [y.saturating_sub(1), y, (y + 1).min(h - 1)];
            for x in 0 .. w {
                let x_idx = [x.saturating_sub(1), x, (x + 1).min(w - 1)];
                let mut sum_x = 0.;
                let mut sum_y = 0.;
                for (ky, &yy) in y_idx.iter().enumerate() {
                    for (kx, &xx) in x_idx.iter().enumerate() {
                        let value = sample(xx, yy);
                        sum_x += value * kernel_x[ky][kx];
                        sum_y += value * kernel_y[ky][kx];
                    }
                }
                gx.put_pixel(x, y, Luma([sum_x]));
                gy.put_pixel(x, y, Luma([sum_y]));
                magnitude.put_pixel(x, y, Luma([f32::sqrt(sum_x * sum_x + sum_y * sum_y)]));
            }
        }
        GradientField { x: gx, y: gy, magnitude }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.magnitude.dimensions()
    }

    /// Normalize the gradient into unit direction vectors.
    pub fn directions(&self) -> Result<DirectionField> {
        let dims = self.dimensions();
        ensure_dimensions("gradient x", dims, self.x.dimensions())?;
        ensure_dimensions("gradient y", dims, self.y.dimensions())?;

        let (w, h) = dims;
        let mut dir_x = FloatImage::new(w, h);
        let mut dir_y = FloatImage::new(w, h);
        for (x, y, magnitude) in self.magnitude.enumerate_pixels() {
            let magnitude = magnitude.0[0];
            if magnitude == 0. {
                // Flat area, no direction to follow.
                continue;
            }
            dir_x.put_pixel(x, y, Luma([self.x.get_pixel(x, y).0[0] / magnitude]));
            dir_y.put_pixel(x, y, Luma([self.y.get_pixel(x, y).0[0] / magnitude]));
        }
        Ok(DirectionField { x: dir_x, y: dir_y })
    }
}

impl DirectionField {
    pub fn dimensions(&self) -> (u32, u32) {
        self.x.dimensions()
    }

    pub fn check(&self) -> Result<()> {
        ensure_dimensions("direction y", self.x.dimensions(), self.y.dimensions())
    }

    #[inline]
    pub fn at(&self, x: u32, y: u32) -> (f32, f32) {
        (self.x.get_pixel(x, y).0[0], self.y.get_pixel(x, y).0[0])
    }
}
