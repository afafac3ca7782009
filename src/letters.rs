//! Grouping letters into words.
//!
//! Two letters are linked if they have similar heights, widths, stroke widths
//! and colors, sit on the same line and are close enough horizontally. Words
//! are the connected components of the resulting graph.
use image::RgbImage;
use itertools::Itertools;
use vec_map::VecMap;

use std::collections::BTreeSet;

use crate::components::Component;
use crate::config::SwtParams;
use crate::error::{ ensure_dimensions, Result, SwtError };
use crate::util::{ within_ratio, BoundingBox, FloatImage, LabelImage, Point };

/// Disjoint sets over `0 .. len`, with path compression.
#[derive(Clone, Debug)]
pub struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    pub fn new(len: usize) -> Self {
        DisjointSet { parent: (0 .. len).collect() }
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// The representative of `x`'s set. Iterative, so that long chains do
    /// not exhaust the stack.
    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut node = x;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    pub fn union(&mut self, a: usize, b: usize) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a != root_b {
            self.parent[root_a] = root_b;
        }
    }

    /// All sets, each sorted, ordered by their smallest member.
    pub fn sets(&mut self) -> Vec<Vec<usize>> {
        let mut by_root: VecMap<Vec<usize>> = VecMap::new();
        for i in 0 .. self.len() {
            let root = self.find(i);
            by_root.entry(root).or_insert_with(Vec::new).push(i);
        }
        let mut sets: Vec<Vec<usize>> = by_root.into_iter().map(|(_, set)| set).collect();
        sets.sort_by_key(|set| set[0]);
        sets
    }
}

/// Undirected graph over component indices.
#[derive(Clone, Debug, Default)]
pub struct SimilarityGraph {
    adjacency: Vec<BTreeSet<usize>>,
}

impl SimilarityGraph {
    pub fn new(len: usize) -> Self {
        SimilarityGraph { adjacency: vec![BTreeSet::new(); len] }
    }

    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    pub fn link(&mut self, a: usize, b: usize) {
        self.adjacency[a].insert(b);
        self.adjacency[b].insert(a);
    }

    pub fn neighbors(&self, node: usize) -> &BTreeSet<usize> {
        &self.adjacency[node]
    }

    /// Every edge once, as `(a, b)` with `a < b`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.adjacency.iter().enumerate().flat_map(|(a, neighbors)| {
            neighbors.iter().filter(move |&&b| a < b).map(move |&b| (a, b))
        })
    }

    /// Connected components, each sorted, ordered by their smallest member.
    pub fn connected_components(&self) -> Vec<Vec<usize>> {
        let mut sets = DisjointSet::new(self.len());
        for (a, b) in self.edges() {
            sets.union(a, b);
        }
        sets.sets()
    }
}

/// What the pairwise tests need to know about a letter.
#[derive(Clone, Debug)]
pub struct LetterStats {
    pub bbox: BoundingBox,
    pub median_stroke_width: f32,
    pub mean_color: [f32; 3],
}

/// Mean RGB color over the pixels of `bbox` carrying `label`. The region is
/// only ever read, so overlapping boxes cannot interfere.
pub fn mean_color(image: &RgbImage, labels: &LabelImage, label: u16, bbox: &BoundingBox) -> [f32; 3] {
    let mut total = [0f64; 3];
    let mut count = 0usize;
    for Point { x, y } in bbox.coords() {
        if labels.get_pixel(x, y).0[0] != label {
            continue;
        }
        let pixel = image.get_pixel(x, y).0;
        for (sum, &channel) in total.iter_mut().zip(pixel.iter()) {
            *sum += channel as f64;
        }
        count += 1;
    }
    if count == 0 {
        return [0.; 3];
    }
    let n = count as f64;
    [(total[0] / n) as f32, (total[1] / n) as f32, (total[2] / n) as f32]
}

fn color_distance(a: &[f32; 3], b: &[f32; 3]) -> f32 {
    a.iter().zip(b.iter())
        .map(|(a, b)| (a - b) * (a - b))
        .sum::<f32>()
        .sqrt()
}

/// Which test two letters failed first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mismatch {
    Height,
    Width,
    Line,
    Distance,
    StrokeWidth,
    Color,
}

/// Decide whether two letters plausibly belong to the same word.
pub fn same_word(a: &LetterStats, b: &LetterStats, params: &SwtParams) -> std::result::Result<(), Mismatch> {
    let (box_a, box_b) = (&a.bbox, &b.bbox);
    if !within_ratio(box_a.height as f32, box_b.height as f32, params.height_ratio_threshold) {
        return Err(Mismatch::Height);
    }
    if !within_ratio(box_a.width as f32, box_b.width as f32, params.width_ratio_threshold) {
        return Err(Mismatch::Width);
    }

    // Same line: each vertical center falls within the other box.
    let center_a = box_a.vertical_center();
    let center_b = box_b.vertical_center();
    if center_a < box_b.y as f32 || center_a > box_b.bottom() as f32
    || center_b < box_a.y as f32 || center_b > box_a.bottom() as f32 {
        return Err(Mismatch::Line);
    }

    // Gap between facing edges, negative if the boxes overlap horizontally.
    let (left, right) = if box_a.x <= box_b.x { (box_a, box_b) } else { (box_b, box_a) };
    let gap = right.x as i64 - left.right() as i64;
    let max_width = box_a.width.max(box_b.width) as f32;
    if gap as f32 > params.distance_ratio * max_width {
        return Err(Mismatch::Distance);
    }

    if a.median_stroke_width <= 0. || b.median_stroke_width <= 0.
    || !within_ratio(a.median_stroke_width, b.median_stroke_width, params.median_ratio_threshold) {
        return Err(Mismatch::StrokeWidth);
    }
    if color_distance(&a.mean_color, &b.mean_color) > params.color_distance_threshold {
        return Err(Mismatch::Color);
    }
    Ok(())
}

/// Words found among the letters.
#[derive(Clone, Debug, Default)]
pub struct LetterGroups {
    /// Indices into the letter list, one entry per word of two letters or more.
    pub groups: Vec<Vec<usize>>,
    /// One box per group, around all the pixels of its letters.
    pub words: Vec<BoundingBox>,
    /// Boxes of the letters that belong to a word, group by group.
    pub letters: Vec<BoundingBox>,
}

/// Build the similarity graph between `letters`.
pub fn similarity_graph(stats: &[LetterStats], params: &SwtParams) -> SimilarityGraph {
    let mut graph = SimilarityGraph::new(stats.len());
    for (i, j) in (0 .. stats.len()).tuple_combinations() {
        match same_word(&stats[i], &stats[j], params) {
            Ok(()) => graph.link(i, j),
            Err(reason) => trace!("letters: {} and {} differ ({:?})", i, j, reason),
        }
    }
    graph
}

/// Group `letters` (text components and their boxes) into words.
///
/// `image` provides the colors, `text_labels` the pixel masks of the letters.
pub fn find_letter_groups(image: &RgbImage, swt: &FloatImage, text_labels: &LabelImage,
                          letters: &[Component], bounding_boxes: &[BoundingBox],
                          params: &SwtParams) -> Result<LetterGroups>
{
    ensure_dimensions("input image", swt.dimensions(), image.dimensions())?;
    ensure_dimensions("text labels", swt.dimensions(), text_labels.dimensions())?;
    if letters.len() != bounding_boxes.len() {
        return Err(SwtError::DimensionMismatch {
            what: "bounding boxes",
            expected: (letters.len() as u32, 1),
            actual: (bounding_boxes.len() as u32, 1),
        });
    }

    let stats: Vec<LetterStats> = letters.iter().zip(bounding_boxes)
        .map(|(letter, bbox)| LetterStats {
            bbox: *bbox,
            median_stroke_width: letter.median_stroke_width(swt).unwrap_or(0.),
            mean_color: mean_color(image, text_labels, letter.label, bbox),
        })
        .collect();

    let graph = similarity_graph(&stats, params);
    let mut result = LetterGroups::default();
    for group in graph.connected_components() {
        if group.len() < 2 {
            continue;
        }
        let word = BoundingBox::from_points(group.iter().flat_map(|&i| letters[i].points.iter()));
        if let Some(word) = word {
            result.words.push(word);
        }
        result.letters.extend(group.iter().map(|&i| bounding_boxes[i]));
        result.groups.push(group);
    }
    debug!("letters: {} words from {} letters", result.words.len(), letters.len());
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ Luma, Rgb };

    #[test]
    fn long_chains_do_not_overflow() {
        let len = 200_000;
        let mut sets = DisjointSet::new(len);
        for i in 1 .. len {
            sets.union(i - 1, i);
        }
        let root = sets.find(0);
        assert!((0 .. len).all(|i| sets.find(i) == root));
        assert_eq!(sets.sets().len(), 1);
    }

    #[test]
    fn sets_are_ordered_by_smallest_member() {
        let mut sets = DisjointSet::new(6);
        sets.union(4, 1);
        sets.union(5, 3);
        sets.union(3, 0);
        assert_eq!(sets.sets(), vec![vec![0, 3, 5], vec![1, 4], vec![2]]);
    }

    #[test]
    fn regrouping_is_idempotent() {
        let mut graph = SimilarityGraph::new(7);
        graph.link(0, 2);
        graph.link(2, 5);
        graph.link(1, 6);
        let first = graph.connected_components();

        // Linking every pair inside each group again changes nothing.
        let mut again = graph.clone();
        for group in &first {
            for (a, b) in group.iter().tuple_combinations() {
                again.link(*a, *b);
            }
        }
        assert_eq!(again.connected_components(), first);
        assert_eq!(first, vec![vec![0, 2, 5], vec![1, 6], vec![3], vec![4]]);
        assert!(graph.neighbors(2).contains(&5));
        assert_eq!(graph.edges().count(), 3);
    }

    fn letter(x: u32, y: u32, width: u32, height: u32) -> LetterStats {
        LetterStats {
            bbox: BoundingBox { x, y, width, height },
            median_stroke_width: 2.,
            mean_color: [10., 10., 10.],
        }
    }

    fn params() -> SwtParams {
        SwtParams {
            height_ratio_threshold: 2.,
            width_ratio_threshold: 3.,
            distance_ratio: 2.,
            median_ratio_threshold: 2.,
            color_distance_threshold: 40.,
            ..Default::default()
        }
    }

    #[test]
    fn neighbours_on_a_line_match() {
        let params = params();
        assert_eq!(same_word(&letter(0, 0, 4, 10), &letter(6, 1, 4, 9), &params), Ok(()));
        // Order does not matter.
        assert_eq!(same_word(&letter(6, 1, 4, 9), &letter(0, 0, 4, 10), &params), Ok(()));
        // Overlapping boxes have a negative gap.
        assert_eq!(same_word(&letter(0, 0, 4, 10), &letter(2, 0, 4, 10), &params), Ok(()));
    }

    #[test]
    fn each_test_can_fail() {
        let params = params();
        let base = letter(0, 0, 4, 10);
        assert_eq!(same_word(&base, &letter(6, 0, 4, 30), &params), Err(Mismatch::Height));
        assert_eq!(same_word(&base, &letter(6, 0, 20, 10), &params), Err(Mismatch::Width));
        assert_eq!(same_word(&base, &letter(6, 8, 4, 10), &params), Err(Mismatch::Line));
        assert_eq!(same_word(&base, &letter(13, 0, 4, 10), &params), Err(Mismatch::Distance));

        let mut thick = letter(6, 0, 4, 10);
        thick.median_stroke_width = 5.;
        assert_eq!(same_word(&base, &thick, &params), Err(Mismatch::StrokeWidth));

        let mut red = letter(6, 0, 4, 10);
        red.mean_color = [200., 10., 10.];
        assert_eq!(same_word(&base, &red, &params), Err(Mismatch::Color));
    }

    #[test]
    fn mean_color_uses_the_label_mask() {
        let mut image = RgbImage::from_pixel(4, 4, Rgb([255, 255, 255]));
        let mut labels = LabelImage::new(4, 4);
        for &(x, y) in &[(1, 1), (2, 1)] {
            image.put_pixel(x, y, Rgb([10, 20, 30]));
            labels.put_pixel(x, y, Luma([3]));
        }
        // Another letter's pixel inside the same box is ignored.
        image.put_pixel(1, 2, Rgb([0, 0, 0]));
        labels.put_pixel(1, 2, Luma([4]));
        let bbox = BoundingBox { x: 1, y: 1, width: 2, height: 2 };
        assert_eq!(mean_color(&image, &labels, 3, &bbox), [10., 20., 30.]);
        assert_eq!(mean_color(&image, &labels, 9, &bbox), [0., 0., 0.]);
    }

    #[test]
    fn singletons_are_not_words() {
        let image = RgbImage::new(30, 12);
        let mut swt = FloatImage::new(30, 12);
        let mut labels = LabelImage::new(30, 12);
        let mut letters = vec![];
        for (i, &x0) in [0u32, 6, 25].iter().enumerate() {
            let label = i as u16 + 1;
            let mut points = vec![];
            for y in 1 .. 11 {
                for x in x0 .. x0 + 4 {
                    swt.put_pixel(x, y, Luma([2.]));
                    labels.put_pixel(x, y, Luma([label]));
                    points.push(Point::new(x, y));
                }
            }
            letters.push(Component { label, points });
        }
        let boxes: Vec<BoundingBox> = letters.iter().map(|l| l.bounding_box().unwrap()).collect();
        let groups = find_letter_groups(&image, &swt, &labels, &letters, &boxes, &params()).unwrap();
        assert_eq!(groups.groups, vec![vec![0, 1]]);
        assert_eq!(groups.words, vec![BoundingBox { x: 0, y: 1, width: 10, height: 10 }]);
        assert_eq!(groups.letters, vec![boxes[0], boxes[1]]);
    }
}
