//! Text detection with the Stroke Width Transform.
//!
//! See Epshtein, Ofek, Wexler, "Detecting Text in Natural Scenes with
//! Stroke Width Transform", CVPR 2010.
#[macro_use]
extern crate log;

pub mod components;
pub mod config;
pub mod edges;
pub mod error;
pub mod gradient;
pub mod letters;
pub mod pipeline;
pub mod render;
pub mod swt;
pub mod util;

pub use config::{ EdgeDetector, SwtParams };
pub use error::{ Result, SwtError };
pub use pipeline::{ detect_words, detect_words_with_edges, Detection };
pub use util::{ BoundingBox, Point };
