//! Heraldic cross outlines, optionally blended into a central circle.

use std::f64::consts::FRAC_PI_2;

use glam::DVec2;

use crate::error::InvalidGeometryError;
use crate::geometry::Outline;

/// Builds the closed outline of a cross whose arms are `2 * bar_half_width`
/// thick and reach `bar_reach` from the centre.
///
/// Without `arc_radius` the result is the twelve-line plus sign. With it,
/// the arms meet a circle of that radius and each quadrant between two
/// arms is a clockwise arc running from one arm's tangent point to the
/// next.
pub fn build_cross_outline(
    bar_half_width: f64,
    bar_reach: f64,
    arc_radius: Option<f64>,
) -> Result<Outline, InvalidGeometryError> {
    ensure_finite("bar half-width", bar_half_width)?;
    ensure_finite("bar reach", bar_reach)?;
    if bar_half_width <= 0.0 {
        return Err(InvalidGeometryError::NonPositiveHalfWidth(bar_half_width));
    }
    if bar_reach <= bar_half_width {
        return Err(InvalidGeometryError::ReachTooShort {
            reach: bar_reach,
            half_width: bar_half_width,
        });
    }

    match arc_radius {
        None => Ok(plain_cross(bar_half_width, bar_reach)),
        Some(radius) => {
            ensure_finite("arc radius", radius)?;
            if radius <= bar_half_width {
                return Err(InvalidGeometryError::RadiusTooSmall {
                    radius,
                    half_width: bar_half_width,
                });
            }
            let tangent = (radius * radius - bar_half_width * bar_half_width).sqrt();
            if tangent >= bar_reach {
                return Err(InvalidGeometryError::RadiusTooLarge {
                    radius,
                    reach: bar_reach,
                });
            }
            Ok(circle_cross(bar_half_width, bar_reach, radius, tangent))
        }
    }
}

fn ensure_finite(name: &'static str, value: f64) -> Result<(), InvalidGeometryError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(InvalidGeometryError::NonFinite { name, value })
    }
}

fn plain_cross(w: f64, reach: f64) -> Outline {
    Outline::new(DVec2::new(w, w))
        .line_to(DVec2::new(reach, w))
        .line_to(DVec2::new(reach, -w))
        .line_to(DVec2::new(w, -w))
        .line_to(DVec2::new(w, -reach))
        .line_to(DVec2::new(-w, -reach))
        .line_to(DVec2::new(-w, -w))
        .line_to(DVec2::new(-reach, -w))
        .line_to(DVec2::new(-reach, w))
        .line_to(DVec2::new(-w, w))
        .line_to(DVec2::new(-w, reach))
        .line_to(DVec2::new(w, reach))
        .line_to(DVec2::new(w, w))
}

/// `h` is where an arm's straight edge meets the circle.
fn circle_cross(w: f64, reach: f64, r: f64, h: f64) -> Outline {
    let a1 = (w / r).asin();
    let span = FRAC_PI_2 - 2.0 * a1;
    let q = FRAC_PI_2;
    let origin = DVec2::ZERO;

    Outline::new(DVec2::new(w, h))
        .arc_to(origin, r, q - a1, q - a1 - span, true)
        .line_to(DVec2::new(reach, w))
        .line_to(DVec2::new(reach, -w))
        .line_to(DVec2::new(h, -w))
        .arc_to(origin, r, -a1, -(a1 + span), true)
        .line_to(DVec2::new(w, -reach))
        .line_to(DVec2::new(-w, -reach))
        .line_to(DVec2::new(-w, -h))
        .arc_to(origin, r, -(q + a1), -(q + a1 + span), true)
        .line_to(DVec2::new(-reach, -w))
        .line_to(DVec2::new(-reach, w))
        .line_to(DVec2::new(-h, w))
        .arc_to(origin, r, q + a1 + span, q + a1, true)
        .line_to(DVec2::new(-w, reach))
        .line_to(DVec2::new(w, reach))
        .line_to(DVec2::new(w, h))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PathSegment;

    const TOLERANCE: f64 = 1e-9;

    #[test]
    fn plain_cross_is_a_closed_twelve_line_loop() {
        for (w, reach) in [(0.375, 10.0), (1.0, 1.5), (0.01, 100.0), (2.5, 3.0)] {
            let outline = build_cross_outline(w, reach, None).unwrap();
            assert_eq!(outline.segments().len(), 12);
            assert_eq!(outline.arc_count(), 0);
            assert!(outline.is_closed(0.0));
            assert!(outline.to_contour(12).is_simple());
        }
    }

    #[test]
    fn plain_cross_bounds_match_reach() {
        let outline = build_cross_outline(0.375, 10.0, None).unwrap();
        let bounds = outline.bounds();
        assert_eq!(bounds.min, DVec2::new(-10.0, -10.0));
        assert_eq!(bounds.max, DVec2::new(10.0, 10.0));
    }

    #[test]
    fn circle_cross_has_four_tangent_arcs() {
        for (w, reach, r) in [(0.375, 10.0, 1.0), (0.5, 4.0, 0.75), (0.1, 2.0, 1.9)] {
            let outline = build_cross_outline(w, reach, Some(r)).unwrap();
            assert_eq!(outline.arc_count(), 4);
            assert_eq!(outline.line_count(), 12);
            assert!(outline.is_closed(TOLERANCE));
            assert!(outline.to_contour(12).is_simple());

            let expected_span = FRAC_PI_2 - 2.0 * (w / r).asin();
            let mut pen = outline.start();
            for segment in outline.segments() {
                if let PathSegment::Arc { center, radius, .. } = *segment {
                    let start = segment.start_point(pen);
                    assert!((start.distance(center) - r).abs() < TOLERANCE);
                    assert!((segment.end_point().distance(center) - r).abs() < TOLERANCE);
                    assert!((radius - r).abs() < TOLERANCE);
                    assert!((segment.sweep() + expected_span).abs() < TOLERANCE);
                    assert!(start.distance(pen) < TOLERANCE);
                }
                pen = segment.end_point();
            }
        }
    }

    #[test]
    fn circle_cross_winds_clockwise_and_reaches_the_tips() {
        let outline = build_cross_outline(0.375, 10.0, Some(1.0)).unwrap();
        let contour = outline.to_contour(12);
        assert!(contour.is_clockwise());
        let bounds = contour.bounds().unwrap();
        assert!((bounds.max.x - 10.0).abs() < TOLERANCE);
        assert!((bounds.min.y + 10.0).abs() < TOLERANCE);
    }

    #[test]
    fn rejects_invalid_dimensions() {
        assert_eq!(
            build_cross_outline(0.0, 10.0, None),
            Err(InvalidGeometryError::NonPositiveHalfWidth(0.0))
        );
        assert!(matches!(
            build_cross_outline(1.0, 1.0, None),
            Err(InvalidGeometryError::ReachTooShort { .. })
        ));
        assert!(matches!(
            build_cross_outline(0.5, 10.0, Some(0.5)),
            Err(InvalidGeometryError::RadiusTooSmall { .. })
        ));
        assert!(matches!(
            build_cross_outline(0.5, 2.0, Some(3.0)),
            Err(InvalidGeometryError::RadiusTooLarge { .. })
        ));
        assert!(matches!(
            build_cross_outline(f64::NAN, 2.0, None),
            Err(InvalidGeometryError::NonFinite { .. })
        ));
    }
}
