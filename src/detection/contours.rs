use image::GrayImage;
use imageproc::contours::{BorderType, find_contours};
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::point::Point;
use log::debug;

use crate::config::DetectorConfig;
use crate::models::{BoundingRect, CandidateBox, Vertex};

/// Finds the quadrilateral most likely to be the nutrition-facts panel
pub struct LabelBoxDetector {
    config: DetectorConfig,
}

impl LabelBoxDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Largest-area external contour whose simplified polygon is a
    /// quadrilateral with acceptable aspect and area. First match wins.
    pub fn detect(&self, mask: &GrayImage, image_dims: (u32, u32)) -> Option<CandidateBox> {
        let (img_width, img_height) = image_dims;
        let image_area = img_width as f64 * img_height as f64;
        if image_area == 0.0 {
            return None;
        }

        let mut contours: Vec<(f64, Vec<Point<i32>>)> = external_contours(mask)
            .into_iter()
            .map(|c| (polygon_area(&c), c))
            .collect();
        // Stable sort: equal areas keep tracing order
        contours.sort_by(|a, b| b.0.total_cmp(&a.0));
        debug!("Found {} external contours", contours.len());

        for (rank, (_, contour)) in contours.iter().enumerate() {
            let perimeter = arc_length(contour.as_slice(), true);
            if perimeter <= 0.0 {
                continue;
            }

            let epsilon = self.config.epsilon_fraction * perimeter;
            let approx = approximate_closed_polygon(contour, epsilon);
            if approx.len() != 4 {
                continue;
            }

            let corners = [
                to_vertex(approx[0]),
                to_vertex(approx[1]),
                to_vertex(approx[2]),
                to_vertex(approx[3]),
            ];
            let Some(bounds) = BoundingRect::enclosing(&corners) else {
                continue;
            };

            let aspect = bounds.aspect_ratio();
            let area_fraction = bounds.area() as f64 / image_area;
            if !self.accepts(aspect, area_fraction) {
                debug!(
                    "Contour {} rejected: aspect={:.2}, area_fraction={:.3}",
                    rank, aspect, area_fraction
                );
                continue;
            }

            if let Some(candidate) = CandidateBox::new(corners, img_width, img_height) {
                debug!(
                    "Accepted contour {} at ({}, {}) {}x{}",
                    rank, bounds.x, bounds.y, bounds.width, bounds.height
                );
                return Some(candidate);
            }
        }

        None
    }

    fn accepts(&self, aspect: f64, area_fraction: f64) -> bool {
        let c = &self.config;
        aspect >= c.min_aspect
            && aspect <= c.max_aspect
            && area_fraction >= c.min_area_fraction
            && area_fraction <= c.max_area_fraction
    }
}

impl Default for LabelBoxDetector {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}

/// Outer borders of top-level foreground regions (holes and nested regions excluded)
pub fn external_contours(mask: &GrayImage) -> Vec<Vec<Point<i32>>> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| c.points)
        .collect()
}

/// Enclosed area of a closed polygon (shoelace formula)
pub fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0i64;
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        twice_area += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
    }
    twice_area.abs() as f64 / 2.0
}

/// Douglas-Peucker simplification of a closed curve.
///
/// The curve is split at the point farthest from its start and each half is
/// simplified as an open arc, so the result never depends on where tracing
/// happened to begin along a straight edge.
pub fn approximate_closed_polygon(points: &[Point<i32>], epsilon: f64) -> Vec<Point<i32>> {
    if points.len() < 3 || epsilon <= 0.0 {
        return points.to_vec();
    }

    let start = points[0];
    let mut far = 0;
    let mut far_dist = 0i64;
    for (i, p) in points.iter().enumerate() {
        let dx = (p.x - start.x) as i64;
        let dy = (p.y - start.y) as i64;
        let dist = dx * dx + dy * dy;
        if dist > far_dist {
            far = i;
            far_dist = dist;
        }
    }
    if far == 0 {
        return vec![start];
    }

    let mut result = approximate_polygon_dp(&points[..=far], epsilon, false);

    let mut returning: Vec<Point<i32>> = points[far..].to_vec();
    returning.push(start);
    let second = approximate_polygon_dp(&returning, epsilon, false);

    // Drop the shared split point and the repeated start
    result.pop();
    result.extend(second);
    result.pop();
    result
}

fn to_vertex(p: Point<i32>) -> Vertex {
    Vertex::new(p.x, p.y)
}
