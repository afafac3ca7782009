//! End-to-end detection, from an RGB image to word boxes.
use image::{ GrayImage, RgbImage };

use crate::components::{ bounding_boxes, connected_components, discard_non_text, Component, TextComponents };
use crate::config::SwtParams;
use crate::edges::detect_edges;
use crate::error::{ ensure_dimensions, Result };
use crate::gradient::{ blur, luminance, DirectionField, GradientField };
use crate::letters::{ find_letter_groups, LetterGroups };
use crate::swt::{ refine, stroke_widths, Ray, SwtDirection };
use crate::util::{ BoundingBox, FloatImage, LabelImage };

/// Everything computed along the way. Rasters share the input's dimensions.
#[derive(Clone, Debug)]
pub struct Detection {
    pub gray: GrayImage,
    pub gradient: GradientField,
    pub directions: DirectionField,
    pub edges: GrayImage,
    pub rays: Vec<Ray>,
    /// Stroke widths before refinement, `f32::INFINITY` off rays.
    pub raw_stroke_widths: FloatImage,
    /// Stroke widths after refinement, 0 off rays.
    pub stroke_widths: FloatImage,
    pub labels: LabelImage,
    pub components: Vec<Component>,
    pub bounding_boxes: Vec<BoundingBox>,
    pub text: TextComponents,
    pub groups: LetterGroups,
}

impl Detection {
    pub fn words(&self) -> &[BoundingBox] {
        &self.groups.words
    }

    pub fn letters(&self) -> &[BoundingBox] {
        &self.groups.letters
    }
}

/// Detect words in `image`, computing edges with `params.edge_detector`.
pub fn detect_words(image: &RgbImage, params: &SwtParams) -> Result<Detection> {
    params.validate()?;
    let gray = luminance(&blur(image, params.blur_sigma));
    let edges = detect_edges(&gray, params);
    info!("edges: {} edge pixels", edges.pixels().filter(|p| p.0[0] != 0).count());
    run(image, gray, edges, params)
}

/// Same as `detect_words`, with an edge mask computed elsewhere.
pub fn detect_words_with_edges(image: &RgbImage, edges: &GrayImage, params: &SwtParams) -> Result<Detection> {
    params.validate()?;
    ensure_dimensions("edge mask", image.dimensions(), edges.dimensions())?;
    let gray = luminance(&blur(image, params.blur_sigma));
    run(image, gray, edges.clone(), params)
}

fn run(image: &RgbImage, gray: GrayImage, edges: GrayImage, params: &SwtParams) -> Result<Detection> {
    let gradient = GradientField::scharr(&gray);
    let directions = gradient.directions()?;

    let direction = SwtDirection::from_black_on_white(params.black_on_white);
    let raw = stroke_widths(&edges, &directions, direction)?;
    info!("swt: {} rays", raw.rays.len());
    let refined = refine(&raw.widths, &raw.rays)?;

    let (labels, components) = connected_components(&refined,
        params.stroke_width_ratio_threshold, params.neighbor_offset)?;
    info!("components: {} found", components.len());
    let boxes = bounding_boxes(&components);

    let text = discard_non_text(&refined, &labels, &components, &boxes, params)?;
    info!("components: {} look like text", text.components.len());

    // Colors come from the image as given, not from the blurred copy.
    let groups = find_letter_groups(image, &refined, &text.labels,
        &text.components, &text.bounding_boxes, params)?;
    info!("letters: {} words", groups.words.len());

    Ok(Detection {
        gray,
        gradient,
        directions,
        edges,
        rays: raw.rays,
        raw_stroke_widths: raw.widths,
        stroke_widths: refined,
        labels,
        components,
        bounding_boxes: boxes,
        text,
        groups,
    })
}
