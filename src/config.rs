use serde::{ Deserialize, Serialize };

use std::fs;
use std::path::{ Path, PathBuf };

use crate::error::{ ConfigError, Result, SwtError };

/// Which edge source feeds the stroke width transform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeDetector {
    /// `imageproc`'s Canny detector.
    Canny,
    /// Sobel gradient, non-maxima suppression and hysteresis, see `edges`.
    Hysteresis,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwtParams {
    /// Low threshold of the edge detector, on gradient magnitude.
    pub edge_threshold_min: f32,

    /// High threshold of the edge detector, on gradient magnitude.
    pub edge_threshold_max: f32,

    pub edge_detector: EdgeDetector,

    /// Standard deviation of the Gaussian blur applied to the input before
    /// computing luminance. 0 disables the blur.
    pub blur_sigma: f32,

    /// Dark text on a light background. Rays are then cast against the
    /// gradient, from the bright side of an edge into the dark stroke.
    pub black_on_white: bool,

    /// Limit on how quickly the stroke width may change inside a component.
    /// Two neighbouring pixels join the same component only if the ratio of
    /// their stroke widths lies strictly between 1/threshold and threshold.
    pub stroke_width_ratio_threshold: f32,

    /// Chebyshev radius of the neighbourhood examined while growing a component.
    pub neighbor_offset: u32,

    /// A letter's stroke width variance may not exceed `variance_ratio` times
    /// its median stroke width.
    pub variance_ratio: f32,

    /// The maximum aspect ratio for a letter, in either orientation.
    pub aspect_ratio_threshold: f32,

    /// Maximal ratio between a letter's bounding box diagonal and its median
    /// stroke width.
    pub diameter_ratio_threshold: f32,

    /// The minimal height of a letter. Smaller shapes are discarded as noise.
    pub min_height: u32,

    /// The maximal height of a letter. Larger shapes are discarded as background.
    pub max_height: u32,

    /// The allowable height variance when grouping letters.
    pub height_ratio_threshold: f32,

    /// The allowable width variance when grouping letters.
    pub width_ratio_threshold: f32,

    /// Maximal horizontal gap between two letters of a word, as a multiple of
    /// the wider letter's width.
    pub distance_ratio: f32,

    /// The allowable median stroke width variance when grouping letters.
    pub median_ratio_threshold: f32,

    /// Maximal distance between the average RGB colors of two letters of a word.
    pub color_distance_threshold: f32,
}

impl Default for SwtParams {
    fn default() -> SwtParams {
        SwtParams {
            edge_threshold_min: 50.,
            edge_threshold_max: 150.,
            edge_detector: EdgeDetector::Canny,
            blur_sigma: 0.8,
            black_on_white: true,
            stroke_width_ratio_threshold: 3.0,
            neighbor_offset: 1,
            variance_ratio: 0.83,
            aspect_ratio_threshold: 8.,
            diameter_ratio_threshold: 10.,
            min_height: 8,
            max_height: 300,
            height_ratio_threshold: 1.7,
            width_ratio_threshold: 5.,
            distance_ratio: 2.9,
            median_ratio_threshold: 1.5,
            color_distance_threshold: 40.,
        }
    }
}

impl SwtParams {
    pub fn validate(&self) -> Result<()> {
        for &(name, value) in &[
            ("stroke_width_ratio_threshold", self.stroke_width_ratio_threshold),
            ("aspect_ratio_threshold", self.aspect_ratio_threshold),
            ("height_ratio_threshold", self.height_ratio_threshold),
            ("width_ratio_threshold", self.width_ratio_threshold),
            ("median_ratio_threshold", self.median_ratio_threshold),
        ] {
            if !(value.is_finite() && value > 0.) {
                return Err(SwtError::InvalidParameter { name, value });
            }
        }
        for &(name, value) in &[
            ("variance_ratio", self.variance_ratio),
            ("diameter_ratio_threshold", self.diameter_ratio_threshold),
            ("distance_ratio", self.distance_ratio),
            ("color_distance_threshold", self.color_distance_threshold),
            ("blur_sigma", self.blur_sigma),
            ("edge_threshold_min", self.edge_threshold_min),
            ("edge_threshold_max", self.edge_threshold_max),
        ] {
            if !(value.is_finite() && value >= 0.) {
                return Err(SwtError::InvalidParameter { name, value });
            }
        }
        if self.edge_threshold_min > self.edge_threshold_max {
            return Err(SwtError::InvalidParameter {
                name: "edge_threshold_min",
                value: self.edge_threshold_min,
            });
        }
        if self.min_height > self.max_height {
            return Err(SwtError::InvalidParameter {
                name: "min_height",
                value: self.min_height as f32,
            });
        }
        Ok(())
    }
}

/// One image to process, with its own thresholds.
#[derive(Clone, Debug, Deserialize)]
pub struct TestCase {
    pub name: String,
    pub image_path: PathBuf,
    #[serde(flatten)]
    pub params: SwtParams,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct TestSuite {
    #[serde(default)]
    pub testcases: Vec<TestCase>,
}

pub fn load_suite(path: &Path) -> std::result::Result<TestSuite, ConfigError> {
    let data = fs::read_to_string(path)
        .map_err(|source| ConfigError::Io { path: path.to_owned(), source })?;
    parse_suite(&data)
        .map_err(|source| ConfigError::Parse { path: path.to_owned(), source })
}

pub fn parse_suite(data: &str) -> std::result::Result<TestSuite, serde_json::Error> {
    serde_json::from_str(data)
}
