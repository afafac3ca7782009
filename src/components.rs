use image::Luma;
use itertools::iproduct;

use crate::config::SwtParams;
use crate::error::{ ensure_dimensions, Result, SwtError };
use crate::util::{ mean_variance, median, normalize_ratio, sorted_median, BoundingBox, FloatImage, LabelImage, Point };

/// A set of pixels grown from one seed, sharing `label` in the label raster.
#[derive(Clone, Debug, PartialEq)]
pub struct Component {
    pub label: u16,
    pub points: Vec<Point>,
}

impl Component {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(&self.points)
    }

    /// Stroke widths of all points, sorted.
    pub fn stroke_widths(&self, swt: &FloatImage) -> Vec<f32> {
        let mut widths: Vec<f32> = self.points.iter()
            .map(|p| swt.get_pixel(p.x, p.y).0[0])
            .collect();
        widths.sort_by(f32::total_cmp);
        widths
    }

    pub fn median_stroke_width(&self, swt: &FloatImage) -> Option<f32> {
        sorted_median(&mut self.stroke_widths(swt))
    }
}

/// Group pixels by components.
///
/// Two pixels at most `neighbor_offset` apart (in both directions) belong to
/// the same component if:
/// 1. They both have a non-zero Stroke Width.
/// 2. The ratio of their Stroke Widths lies strictly between `1 / ratio_threshold`
///    and `ratio_threshold`.
///
/// Labels start at 1 and follow the raster order of each component's first pixel.
pub fn connected_components(swt: &FloatImage, ratio_threshold: f32, neighbor_offset: u32)
    -> Result<(LabelImage, Vec<Component>)>
{
    // Invariant: `ratio_threshold >= 1`.
    let ratio_threshold = normalize_ratio(ratio_threshold);
    let (width, height) = swt.dimensions();
    let offset = neighbor_offset as i64;

    // 0 for points that have not been explored yet, the label otherwise.
    let mut labels = LabelImage::new(width, height);
    let mut components = vec![];

    // Points that are part of the current component but whose neighbours have
    // not been examined yet. Reused for each component.
    let mut pending: Vec<(Point, f32)> = vec![];

    for (start_x, start_y, pixel) in swt.enumerate_pixels() {
        let start_width = pixel.0[0];
        if start_width == 0. {
            // Not part of a stroke.
            continue;
        }
        if labels.get_pixel(start_x, start_y).0[0] != 0 {
            // Component has already been labelled.
            continue;
        }
        if components.len() >= u16::MAX as usize {
            return Err(SwtError::LabelOverflow { max: u16::MAX as u32 });
        }
        let label = components.len() as u16 + 1;
        let start = Point::new(start_x, start_y);
        labels.put_pixel(start_x, start_y, Luma([label]));
        let mut component = Component { label, points: vec![start] };

        pending.clear();
        pending.push((start, start_width));
        while let Some((current, current_width)) = pending.pop() {
            for (dy, dx) in iproduct!(-offset ..= offset, -offset ..= offset) {
                let nx = current.x as i64 + dx;
                let ny = current.y as i64 + dy;
                if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
                    // This pixel is out of the picture.
                    continue;
                }
                let (nx, ny) = (nx as u32, ny as u32);
                if labels.get_pixel(nx, ny).0[0] != 0 {
                    continue;
                }
                let neighbor_width = swt.get_pixel(nx, ny).0[0];
                if neighbor_width == 0. {
                    continue;
                }
                let ratio = current_width / neighbor_width;
                if ratio > 1. / ratio_threshold && ratio < ratio_threshold {
                    // Smooth variation of Stroke Width: same component.
                    labels.put_pixel(nx, ny, Luma([label]));
                    let neighbor = Point::new(nx, ny);
                    component.points.push(neighbor);
                    pending.push((neighbor, neighbor_width));
                }
            }
        }
        components.push(component);
    }
    debug!("components: found {}", components.len());
    Ok((labels, components))
}

/// One bounding box per component, in the same order.
pub fn bounding_boxes(components: &[Component]) -> Vec<BoundingBox> {
    components.iter()
        .map(|component| component.bounding_box().unwrap_or(BoundingBox { x: 0, y: 0, width: 0, height: 0 }))
        .collect()
}

/// Why a component does not look like a letter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    Empty,
    Height,
    AspectRatio,
    Diameter,
    Variance,
}

/// Check a single component against the letter criteria.
pub fn classify(swt: &FloatImage, component: &Component, bbox: &BoundingBox, params: &SwtParams)
    -> std::result::Result<(), Rejection>
{
    if component.is_empty() {
        return Err(Rejection::Empty);
    }
    if bbox.height < params.min_height || bbox.height > params.max_height {
        return Err(Rejection::Height);
    }

    let max_aspect = normalize_ratio(params.aspect_ratio_threshold);
    match bbox.aspect_ratio() {
        Some(aspect) if aspect >= 1. / max_aspect && aspect <= max_aspect => {}
        _ => return Err(Rejection::AspectRatio),
    }

    let widths = component.stroke_widths(swt);
    let median = match median(&widths) {
        Some(median) if median > 0. => median,
        _ => return Err(Rejection::Diameter),
    };
    if bbox.diagonal() / median > params.diameter_ratio_threshold {
        return Err(Rejection::Diameter);
    }

    let variance = match mean_variance(&widths) {
        Some((_, variance)) => variance,
        None => return Err(Rejection::Empty),
    };
    if variance > params.variance_ratio * median {
        return Err(Rejection::Variance);
    }
    Ok(())
}

/// The components that look like letters.
#[derive(Clone, Debug)]
pub struct TextComponents {
    /// Accepted components, keeping their original labels.
    pub components: Vec<Component>,
    pub bounding_boxes: Vec<BoundingBox>,
    /// Same as the full label raster, with rejected components erased.
    pub labels: LabelImage,
}

/// Discard components whose geometry or stroke statistics are unlike text.
/// Surviving components are never relabelled.
pub fn discard_non_text(swt: &FloatImage, labels: &LabelImage, components: &[Component],
                        bounding_boxes: &[BoundingBox], params: &SwtParams) -> Result<TextComponents>
{
    ensure_dimensions("label raster", swt.dimensions(), labels.dimensions())?;
    if components.len() != bounding_boxes.len() {
        return Err(SwtError::DimensionMismatch {
            what: "bounding boxes",
            expected: (components.len() as u32, 1),
            actual: (bounding_boxes.len() as u32, 1),
        });
    }

    let (width, height) = labels.dimensions();
    let mut text = TextComponents {
        components: vec![],
        bounding_boxes: vec![],
        labels: LabelImage::new(width, height),
    };
    for (component, bbox) in components.iter().zip(bounding_boxes) {
        if let Err(reason) = classify(swt, component, bbox, params) {
            trace!("discard: component {} {:?} rejected ({:?})", component.label, bbox, reason);
            continue;
        }
        for point in &component.points {
            let label = *labels.get_pixel(point.x, point.y);
            text.labels.put_pixel(point.x, point.y, label);
        }
        text.components.push(component.clone());
        text.bounding_boxes.push(*bbox);
    }
    debug!("discard: kept {} of {} components", text.components.len(), components.len());
    Ok(text)
}
