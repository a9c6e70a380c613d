//! Planar building blocks shared by the outline builders, the SVG reader and
//! the extruder.
//!
//! Everything here works in `f64` so that closure and tangency checks can be
//! made at `1e-9`; meshes drop to `f32` only when they are emitted.

use std::f64::consts::TAU;

use glam::{DAffine2, DVec2};
use serde::{Deserialize, Serialize};

/// A point in the outline plane.
pub type Point2 = DVec2;

const POINT_EPSILON: f64 = 1e-9;

/// One piece of an [`Outline`]. Each segment starts where the previous one
/// ended.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PathSegment {
    Line {
        end: Point2,
    },
    Arc {
        center: Point2,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        clockwise: bool,
    },
}

impl PathSegment {
    /// Point the segment starts from. Lines start at the pen, so `pen` is
    /// returned unchanged for them.
    pub fn start_point(&self, pen: Point2) -> Point2 {
        match *self {
            PathSegment::Line { .. } => pen,
            PathSegment::Arc {
                center,
                radius,
                start_angle,
                ..
            } => center + radius * DVec2::from_angle(start_angle),
        }
    }

    pub fn end_point(&self) -> Point2 {
        match *self {
            PathSegment::Line { end } => end,
            PathSegment::Arc {
                center,
                radius,
                end_angle,
                ..
            } => center + radius * DVec2::from_angle(end_angle),
        }
    }

    pub fn is_arc(&self) -> bool {
        matches!(self, PathSegment::Arc { .. })
    }

    /// Signed angular travel of an arc, zero for lines.
    ///
    /// The raw delta is folded into `[0, 2π)`; clockwise arcs then go the
    /// other way round, except that a full turn stays a full turn.
    pub fn sweep(&self) -> f64 {
        let PathSegment::Arc {
            start_angle,
            end_angle,
            clockwise,
            ..
        } = *self
        else {
            return 0.0;
        };
        let mut delta = end_angle - start_angle;
        let same_points = delta.abs() < f64::EPSILON;
        while delta < 0.0 {
            delta += TAU;
        }
        while delta > TAU {
            delta -= TAU;
        }
        if delta < f64::EPSILON {
            delta = if same_points { 0.0 } else { TAU };
        }
        if clockwise && !same_points {
            delta = if delta == TAU { -TAU } else { delta - TAU };
        }
        delta
    }

    /// Appends the points after `pen` that trace this segment.
    fn flatten_into(&self, divisions: usize, out: &mut Vec<Point2>) {
        match *self {
            PathSegment::Line { end } => out.push(end),
            PathSegment::Arc {
                center,
                radius,
                start_angle,
                ..
            } => {
                let sweep = self.sweep();
                let divisions = divisions.max(1);
                for step in 0..=divisions {
                    let t = step as f64 / divisions as f64;
                    let angle = start_angle + t * sweep;
                    out.push(center + radius * DVec2::from_angle(angle));
                }
            }
        }
    }
}

/// Closed planar boundary made of lines and arcs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    start: Point2,
    segments: Vec<PathSegment>,
}

impl Outline {
    pub fn new(start: Point2) -> Self {
        Self {
            start,
            segments: Vec::new(),
        }
    }

    pub fn line_to(mut self, end: Point2) -> Self {
        self.segments.push(PathSegment::Line { end });
        self
    }

    /// Appends an arc about `center`. The arc is expected to start at the
    /// current pen position.
    pub fn arc_to(
        mut self,
        center: Point2,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        clockwise: bool,
    ) -> Self {
        self.segments.push(PathSegment::Arc {
            center,
            radius,
            start_angle,
            end_angle,
            clockwise,
        });
        self
    }

    pub fn start(&self) -> Point2 {
        self.start
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn arc_count(&self) -> usize {
        self.segments.iter().filter(|s| s.is_arc()).count()
    }

    pub fn line_count(&self) -> usize {
        self.segments.len() - self.arc_count()
    }

    /// Point where the last segment ends.
    pub fn end_point(&self) -> Point2 {
        self.segments
            .last()
            .map(PathSegment::end_point)
            .unwrap_or(self.start)
    }

    /// Largest gap between a segment's start and the previous segment's end.
    pub fn continuity_gap(&self) -> f64 {
        let mut pen = self.start;
        let mut worst: f64 = 0.0;
        for segment in &self.segments {
            worst = worst.max(segment.start_point(pen).distance(pen));
            pen = segment.end_point();
        }
        worst
    }

    pub fn is_closed(&self, tolerance: f64) -> bool {
        !self.segments.is_empty()
            && self.end_point().distance(self.start) <= tolerance
            && self.continuity_gap() <= tolerance
    }

    /// Flattens the outline into a ring. Arcs are divided into
    /// `2 * curve_segments` pieces.
    pub fn to_contour(&self, curve_segments: usize) -> Contour {
        let mut points = vec![self.start];
        for segment in &self.segments {
            segment.flatten_into(curve_segments * 2, &mut points);
        }
        Contour::new(points)
    }

    /// Bounds of the flattened outline.
    pub fn bounds(&self) -> Bounds2 {
        let mut points = vec![self.start];
        for segment in &self.segments {
            segment.flatten_into(64, &mut points);
        }
        let mut bounds = Bounds2::from_point(self.start);
        for point in points {
            bounds.include(point);
        }
        bounds
    }
}

/// Axis-aligned rectangle in the outline plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds2 {
    pub min: Point2,
    pub max: Point2,
}

impl Bounds2 {
    pub fn from_point(point: Point2) -> Self {
        Self {
            min: point,
            max: point,
        }
    }

    pub fn include(&mut self, point: Point2) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn size(&self) -> DVec2 {
        self.max - self.min
    }

    pub fn contains(&self, other: &Bounds2) -> bool {
        self.min.x <= other.min.x
            && self.min.y <= other.min.y
            && self.max.x >= other.max.x
            && self.max.y >= other.max.y
    }
}

/// Closed ring of points. The closing edge from the last point back to the
/// first is implicit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Contour {
    points: Vec<Point2>,
}

impl Contour {
    /// Builds a ring, dropping consecutive duplicates and a repeated
    /// closing point.
    pub fn new(points: Vec<Point2>) -> Self {
        let mut cleaned: Vec<Point2> = Vec::with_capacity(points.len());
        for point in points {
            if cleaned
                .last()
                .map_or(false, |last| last.distance(point) <= POINT_EPSILON)
            {
                continue;
            }
            cleaned.push(point);
        }
        while cleaned.len() >= 2 && cleaned[0].distance(cleaned[cleaned.len() - 1]) <= POINT_EPSILON
        {
            cleaned.pop();
        }
        Self { points: cleaned }
    }

    /// Axis-aligned rectangle with corners `min` and `max`, wound
    /// counter-clockwise.
    pub fn rectangle(min: Point2, max: Point2) -> Self {
        Self::new(vec![
            min,
            DVec2::new(max.x, min.y),
            max,
            DVec2::new(min.x, max.y),
        ])
    }

    pub fn points(&self) -> &[Point2] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn is_finite(&self) -> bool {
        self.points.iter().all(|p| p.is_finite())
    }

    /// Shoelace area, positive for counter-clockwise rings in a y-up frame.
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut twice = 0.0;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];
            twice += a.perp_dot(b);
        }
        twice * 0.5
    }

    pub fn is_clockwise(&self) -> bool {
        self.signed_area() < 0.0
    }

    pub fn reversed(&self) -> Self {
        let mut points = self.points.clone();
        points.reverse();
        Self { points }
    }

    pub fn transformed(&self, transform: &DAffine2) -> Self {
        Self::new(
            self.points
                .iter()
                .map(|p| transform.transform_point2(*p))
                .collect(),
        )
    }

    pub fn bounds(&self) -> Option<Bounds2> {
        let (first, rest) = self.points.split_first()?;
        let mut bounds = Bounds2::from_point(*first);
        for point in rest {
            bounds.include(*point);
        }
        Some(bounds)
    }

    /// Even-odd ray cast.
    pub fn contains_point(&self, point: Point2) -> bool {
        let n = self.points.len();
        let mut inside = false;
        let mut j = n.wrapping_sub(1);
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[j];
            if (a.y > point.y) != (b.y > point.y) {
                let x = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
                if point.x < x {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    /// True when `other` lies inside this ring. Rings are assumed not to
    /// cross, so one vertex strictly inside is enough.
    pub fn encloses(&self, other: &Contour) -> bool {
        match (self.bounds(), other.bounds()) {
            (Some(outer), Some(inner)) if outer.contains(&inner) => {}
            _ => return false,
        }
        other
            .points
            .iter()
            .any(|p| self.contains_point(*p))
    }

    /// True when no two non-adjacent edges touch.
    pub fn is_simple(&self) -> bool {
        let n = self.points.len();
        if n < 3 {
            return false;
        }
        for i in 0..n {
            let a0 = self.points[i];
            let a1 = self.points[(i + 1) % n];
            for j in (i + 1)..n {
                let adjacent = j == i + 1 || (i == 0 && j == n - 1);
                if adjacent {
                    continue;
                }
                let b0 = self.points[j];
                let b1 = self.points[(j + 1) % n];
                if segments_intersect(a0, a1, b0, b1) {
                    return false;
                }
            }
        }
        true
    }
}

fn orientation(a: Point2, b: Point2, c: Point2) -> f64 {
    (b - a).perp_dot(c - a)
}

fn on_segment(a: Point2, b: Point2, p: Point2) -> bool {
    p.x >= a.x.min(b.x) - POINT_EPSILON
        && p.x <= a.x.max(b.x) + POINT_EPSILON
        && p.y >= a.y.min(b.y) - POINT_EPSILON
        && p.y <= a.y.max(b.y) + POINT_EPSILON
}

fn segments_intersect(a0: Point2, a1: Point2, b0: Point2, b1: Point2) -> bool {
    let d1 = orientation(b0, b1, a0);
    let d2 = orientation(b0, b1, a1);
    let d3 = orientation(a0, a1, b0);
    let d4 = orientation(a0, a1, b1);
    if ((d1 > POINT_EPSILON && d2 < -POINT_EPSILON) || (d1 < -POINT_EPSILON && d2 > POINT_EPSILON))
        && ((d3 > POINT_EPSILON && d4 < -POINT_EPSILON)
            || (d3 < -POINT_EPSILON && d4 > POINT_EPSILON))
    {
        return true;
    }
    (d1.abs() <= POINT_EPSILON && on_segment(b0, b1, a0))
        || (d2.abs() <= POINT_EPSILON && on_segment(b0, b1, a1))
        || (d3.abs() <= POINT_EPSILON && on_segment(a0, a1, b0))
        || (d4.abs() <= POINT_EPSILON && on_segment(a0, a1, b1))
}

/// Solid region: one outer ring and the holes cut from it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Shape {
    pub outer: Contour,
    pub holes: Vec<Contour>,
}

impl Shape {
    pub fn new(outer: Contour) -> Self {
        Self {
            outer,
            holes: Vec::new(),
        }
    }

    pub fn with_holes(outer: Contour, holes: Vec<Contour>) -> Self {
        Self { outer, holes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn clockwise_sweep_runs_backwards() {
        let arc = PathSegment::Arc {
            center: DVec2::ZERO,
            radius: 1.0,
            start_angle: FRAC_PI_2,
            end_angle: 0.0,
            clockwise: true,
        };
        assert!((arc.sweep() + FRAC_PI_2).abs() < 1e-12);

        let ccw = PathSegment::Arc {
            center: DVec2::ZERO,
            radius: 1.0,
            start_angle: FRAC_PI_2,
            end_angle: 0.0,
            clockwise: false,
        };
        assert!((ccw.sweep() - 3.0 * FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn contour_drops_closing_duplicate() {
        let ring = Contour::new(vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(0.0, 0.0),
        ]);
        assert_eq!(ring.len(), 3);
    }

    #[test]
    fn rectangle_is_counter_clockwise() {
        let rect = Contour::rectangle(DVec2::ZERO, DVec2::new(2.0, 3.0));
        assert!((rect.signed_area() - 6.0).abs() < 1e-12);
        assert!(!rect.is_clockwise());
        assert!(rect.reversed().is_clockwise());
    }

    #[test]
    fn bow_tie_is_not_simple() {
        let bow_tie = Contour::new(vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(0.0, 1.0),
        ]);
        assert!(!bow_tie.is_simple());
        assert!(Contour::rectangle(DVec2::ZERO, DVec2::ONE).is_simple());
    }

    #[test]
    fn encloses_nested_rings() {
        let outer = Contour::rectangle(DVec2::ZERO, DVec2::splat(10.0));
        let inner = Contour::rectangle(DVec2::splat(2.0), DVec2::splat(4.0));
        assert!(outer.encloses(&inner));
        assert!(!inner.encloses(&outer));
    }

    #[test]
    fn outline_reports_gaps() {
        let outline = Outline::new(DVec2::ZERO)
            .line_to(DVec2::new(1.0, 0.0))
            .arc_to(DVec2::new(1.0, 1.0), 1.0, -FRAC_PI_2, 0.0, false)
            .line_to(DVec2::ZERO);
        assert!(outline.continuity_gap() < 1e-12);
        assert!(outline.is_closed(1e-9));
        assert_eq!(outline.arc_count(), 1);
        assert_eq!(outline.line_count(), 2);
    }
}
