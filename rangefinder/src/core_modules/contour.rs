// THEORY:
// Stages 4 and 6: turn the foreground mask into object outlines and pick the
// one that matters.
//
// Key architectural principles:
// 1.  **Outermost boundaries only**: border following (Suzuki–Abe, via
//     `imageproc`) reports every boundary with its nesting. We keep the outer
//     borders that have no parent; holes, and anything sitting inside a hole,
//     are ignored.
// 2.  **Compressed chains**: the raw border is a chain of 8-connected steps. Any
//     point that continues the previous step in the same direction is dropped,
//     so a filled rectangle collapses to its four corners.
// 3.  **Area from the polygon**: a contour's area is the shoelace area of the
//     polygon through its points (pixel centres). A filled `w x h` block
//     therefore has area `(w - 1) * (h - 1)`, and a one-pixel-wide blob has area
//     zero. The distance stage treats that zero as "no measurement".
// 4.  **Deterministic selection**: the largest area wins; equal areas go to the
//     contour whose top-most, then left-most point comes first in raster order.

use crate::core_modules::frame::BinaryFrame;
use imageproc::contours::{BorderType, find_contours};
use imageproc::point::Point;

/// A closed boundary of connected foreground pixels. Immutable once extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contour {
    points: Vec<Point<i32>>,
}

impl Contour {
    pub fn new(points: Vec<Point<i32>>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point<i32>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Enclosed area of the polygon through the contour points.
    pub fn area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let twice_signed: i64 = (0..n)
            .map(|i| {
                let a = self.points[i];
                let b = self.points[(i + 1) % n];
                a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64
            })
            .sum();
        twice_signed.abs() as f64 / 2.0
    }

    /// Top-most, then left-most point: the raster-order anchor used for tie-breaks.
    pub fn origin(&self) -> Option<Point<i32>> {
        self.points.iter().copied().min_by_key(|p| (p.y, p.x))
    }

    fn raster_key(&self) -> (i32, i32) {
        self.origin().map_or((i32::MAX, i32::MAX), |p| (p.y, p.x))
    }
}

/// Finds the outermost contours of the foreground mask, chain-compressed.
pub fn find_external_contours(binary: &BinaryFrame) -> Vec<Contour> {
    find_contours::<i32>(binary.as_image())
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
        .map(|c| Contour::new(compress_chain(&c.points)))
        .collect()
}

/// Drops every point that lies on a straight horizontal, vertical or diagonal
/// run, keeping only the points where the chain changes direction.
pub fn compress_chain(points: &[Point<i32>]) -> Vec<Point<i32>> {
    let mut points = points.to_vec();
    points.dedup();
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }

    let n = points.len();
    if n < 3 {
        return points;
    }

    let step = |from: Point<i32>, to: Point<i32>| ((to.x - from.x).signum(), (to.y - from.y).signum());

    let corners: Vec<Point<i32>> = (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let current = points[i];
            let next = points[(i + 1) % n];
            step(prev, current) != step(current, next)
        })
        .map(|i| points[i])
        .collect();

    // Every point coincident: the blob is a single pixel.
    if corners.is_empty() {
        vec![points[0]]
    } else {
        corners
    }
}

/// The contour with the largest enclosed area, if any.
pub fn select_largest(contours: &[Contour]) -> Option<&Contour> {
    contours
        .iter()
        .map(|c| (c, c.area()))
        .max_by(|(a, area_a), (b, area_b)| {
            area_a
                .total_cmp(area_b)
                // Reversed so the earlier raster position compares as larger.
                .then_with(|| b.raster_key().cmp(&a.raster_key()))
        })
        .map(|(c, _)| c)
}
