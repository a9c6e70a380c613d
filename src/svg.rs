//! Reads the filled regions of an SVG document as flattened vector paths.
//!
//! Only geometry and fill colour are kept. Strokes, gradients, opacity and
//! text are ignored; `fill="none"` elements are dropped.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use glam::{DAffine2, DVec2};
use log::{debug, warn};
use roxmltree::{Document, Node};
use svgtypes::{Paint, PathParser, PathSegment as SvgSegment, PointsParser};

use crate::color::Color;
use crate::error::ParseError;
use crate::geometry::{Contour, Outline};

/// Steps used for each Bézier curve; elliptical arcs use twice as many.
pub const DEFAULT_CURVE_SEGMENTS: usize = 12;

const SKIPPED_ELEMENTS: &[&str] = &[
    "defs",
    "clipPath",
    "mask",
    "symbol",
    "style",
    "title",
    "desc",
    "metadata",
    "pattern",
    "marker",
    "linearGradient",
    "radialGradient",
];

/// One filled element: its colour and its closed sub-paths in document
/// coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorPath {
    pub id: Option<String>,
    pub color: Color,
    pub subpaths: Vec<Contour>,
}

/// Result of reading a document. Elements that could not be read are listed
/// in `rejected` and left out of `paths`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SvgDocument {
    pub paths: Vec<VectorPath>,
    pub rejected: Vec<ParseError>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Fill {
    Color(Color),
    None,
}

#[derive(Debug, Clone, Copy)]
struct Inherited {
    fill: Fill,
    transform: DAffine2,
}

pub fn parse_svg(text: &str) -> Result<SvgDocument, ParseError> {
    parse_svg_with(text, DEFAULT_CURVE_SEGMENTS)
}

/// Parses `text`, flattening each curve into `curve_segments` steps.
pub fn parse_svg_with(text: &str, curve_segments: usize) -> Result<SvgDocument, ParseError> {
    let document = Document::parse(text).map_err(|err| ParseError::Xml(err.to_string()))?;
    let root = document.root_element();
    if root.tag_name().name() != "svg" {
        return Err(ParseError::Xml(format!(
            "root element is <{}>, expected <svg>",
            root.tag_name().name()
        )));
    }

    let mut out = SvgDocument::default();
    let base = Inherited {
        fill: Fill::Color(Color::BLACK),
        transform: DAffine2::IDENTITY,
    };
    let inherited = element_state(root, base).unwrap_or_else(|err| {
        warn!("ignoring root style: {err}");
        out.rejected.push(err);
        base
    });
    visit(root, inherited, curve_segments.max(1), &mut out);
    debug!(
        "read {} filled paths ({} rejected)",
        out.paths.len(),
        out.rejected.len()
    );
    Ok(out)
}

fn visit(node: Node<'_, '_>, inherited: Inherited, curve_segments: usize, out: &mut SvgDocument) {
    for child in node.children().filter(Node::is_element) {
        let tag = child.tag_name().name();
        if SKIPPED_ELEMENTS.contains(&tag) {
            continue;
        }
        let state = match element_state(child, inherited) {
            Ok(state) => state,
            Err(err) => {
                warn!("skipping {}: {err}", describe(child));
                out.rejected.push(err);
                continue;
            }
        };

        match tag {
            "g" | "svg" | "a" => visit(child, state, curve_segments, out),
            "path" | "rect" | "circle" | "ellipse" | "polygon" | "polyline" => {
                let Fill::Color(color) = state.fill else {
                    debug!("{} has no fill", describe(child));
                    continue;
                };
                match element_contours(child, curve_segments) {
                    Ok(contours) if contours.is_empty() => {
                        let err = ParseError::EmptyPath(describe(child));
                        warn!("skipping {}: {err}", describe(child));
                        out.rejected.push(err);
                    }
                    Ok(contours) => out.paths.push(VectorPath {
                        id: child.attribute("id").map(str::to_string),
                        color,
                        subpaths: contours
                            .iter()
                            .map(|c| c.transformed(&state.transform))
                            .filter(|c| c.len() >= 3)
                            .collect(),
                    }),
                    Err(err) => {
                        warn!("skipping {}: {err}", describe(child));
                        out.rejected.push(err);
                    }
                }
            }
            _ => {}
        }
    }
}

fn describe(node: Node<'_, '_>) -> String {
    match node.attribute("id") {
        Some(id) => format!("<{} id=\"{id}\">", node.tag_name().name()),
        None => format!("<{}>", node.tag_name().name()),
    }
}

fn attribute_error(node: Node<'_, '_>, attribute: &str, value: &str) -> ParseError {
    ParseError::Attribute {
        element: describe(node),
        attribute: attribute.to_string(),
        value: value.to_string(),
    }
}

/// Fill and transform in effect for `node`.
fn element_state(node: Node<'_, '_>, inherited: Inherited) -> Result<Inherited, ParseError> {
    let mut state = inherited;

    if let Some(value) = node.attribute("transform") {
        let t = value
            .parse::<svgtypes::Transform>()
            .map_err(|_| attribute_error(node, "transform", value))?;
        let local = DAffine2::from_cols_array(&[t.a, t.b, t.c, t.d, t.e, t.f]);
        state.transform = inherited.transform * local;
    }

    let styled_fill = node.attribute("style").and_then(|style| {
        style
            .split(';')
            .filter_map(|decl| decl.split_once(':'))
            .find(|(name, _)| name.trim() == "fill")
            .map(|(_, value)| value.trim())
    });
    if let Some(value) = styled_fill.or_else(|| node.attribute("fill")) {
        match Paint::from_str(value) {
            Ok(Paint::Color(color)) => state.fill = Fill::Color(color.into()),
            Ok(Paint::None) => state.fill = Fill::None,
            Ok(_) => debug!("{}: unsupported fill {value}, inheriting", describe(node)),
            Err(_) => return Err(attribute_error(node, "fill", value)),
        }
    }

    Ok(state)
}

fn element_contours(
    node: Node<'_, '_>,
    curve_segments: usize,
) -> Result<Vec<Contour>, ParseError> {
    match node.tag_name().name() {
        "path" => {
            let d = node.attribute("d").ok_or_else(|| ParseError::PathData {
                element: describe(node),
                message: "missing d attribute".to_string(),
            })?;
            flatten_path_data(d, curve_segments).map_err(|message| ParseError::PathData {
                element: describe(node),
                message,
            })
        }
        "rect" => {
            let x = length(node, "x", 0.0)?;
            let y = length(node, "y", 0.0)?;
            let width = length(node, "width", 0.0)?;
            let height = length(node, "height", 0.0)?;
            let rx = node.attribute("rx").map(|_| length(node, "rx", 0.0)).transpose()?;
            let ry = node.attribute("ry").map(|_| length(node, "ry", 0.0)).transpose()?;
            Ok(rect_contour(x, y, width, height, rx, ry, curve_segments)
                .into_iter()
                .collect())
        }
        "circle" => {
            let center = DVec2::new(length(node, "cx", 0.0)?, length(node, "cy", 0.0)?);
            let r = length(node, "r", 0.0)?;
            Ok(ellipse_contour(center, r, r, curve_segments).into_iter().collect())
        }
        "ellipse" => {
            let center = DVec2::new(length(node, "cx", 0.0)?, length(node, "cy", 0.0)?);
            let rx = length(node, "rx", 0.0)?;
            let ry = length(node, "ry", 0.0)?;
            Ok(ellipse_contour(center, rx, ry, curve_segments).into_iter().collect())
        }
        "polygon" | "polyline" => {
            let points: Vec<DVec2> = PointsParser::from(node.attribute("points").unwrap_or(""))
                .map(|(x, y)| DVec2::new(x, y))
                .collect();
            let contour = Contour::new(points);
            Ok(if contour.len() >= 3 { vec![contour] } else { Vec::new() })
        }
        _ => Ok(Vec::new()),
    }
}

fn length(node: Node<'_, '_>, attribute: &str, default: f64) -> Result<f64, ParseError> {
    match node.attribute(attribute) {
        None => Ok(default),
        Some(value) => value
            .parse::<svgtypes::Length>()
            .map(|length| length.number)
            .map_err(|_| attribute_error(node, attribute, value)),
    }
}

/// Corners are rounded with a circle of the smaller corner radius.
fn rect_contour(
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    rx: Option<f64>,
    ry: Option<f64>,
    curve_segments: usize,
) -> Option<Contour> {
    if width <= 0.0 || height <= 0.0 {
        return None;
    }
    let r = match (rx, ry) {
        (Some(rx), Some(ry)) => rx.min(ry),
        (Some(r), None) | (None, Some(r)) => r,
        (None, None) => 0.0,
    }
    .min(width / 2.0)
        .min(height / 2.0);
    if r <= 0.0 {
        return Some(Contour::rectangle(
            DVec2::new(x, y),
            DVec2::new(x + width, y + height),
        ));
    }
    let (x0, y0, x1, y1) = (x, y, x + width, y + height);
    let outline = Outline::new(DVec2::new(x0 + r, y0))
        .line_to(DVec2::new(x1 - r, y0))
        .arc_to(DVec2::new(x1 - r, y0 + r), r, -FRAC_PI_2, 0.0, false)
        .line_to(DVec2::new(x1, y1 - r))
        .arc_to(DVec2::new(x1 - r, y1 - r), r, 0.0, FRAC_PI_2, false)
        .line_to(DVec2::new(x0 + r, y1))
        .arc_to(DVec2::new(x0 + r, y1 - r), r, FRAC_PI_2, PI, false)
        .line_to(DVec2::new(x0, y0 + r))
        .arc_to(DVec2::new(x0 + r, y0 + r), r, PI, PI + FRAC_PI_2, false);
    Some(outline.to_contour(curve_segments / 4 + 1))
}

fn ellipse_contour(center: DVec2, rx: f64, ry: f64, curve_segments: usize) -> Option<Contour> {
    if rx <= 0.0 || ry <= 0.0 {
        return None;
    }
    let divisions = curve_segments * 2;
    let points = (0..divisions)
        .map(|i| {
            let angle = TAU * i as f64 / divisions as f64;
            center + DVec2::new(rx * angle.cos(), ry * angle.sin())
        })
        .collect();
    Some(Contour::new(points))
}

/// Turns SVG path data into closed rings. Open sub-paths are closed
/// implicitly, as filling does; sub-paths with fewer than three distinct
/// points are dropped.
pub fn flatten_path_data(d: &str, curve_segments: usize) -> Result<Vec<Contour>, String> {
    let mut pen = PathPen::new(curve_segments.max(1));
    for segment in PathParser::from(d) {
        let segment = segment.map_err(|err| err.to_string())?;
        pen.apply(segment);
    }
    pen.finish_subpath();
    Ok(pen.contours)
}

struct PathPen {
    curve_segments: usize,
    contours: Vec<Contour>,
    current: Vec<DVec2>,
    position: DVec2,
    start: DVec2,
    last_cubic: Option<DVec2>,
    last_quadratic: Option<DVec2>,
}

impl PathPen {
    fn new(curve_segments: usize) -> Self {
        Self {
            curve_segments,
            contours: Vec::new(),
            current: Vec::new(),
            position: DVec2::ZERO,
            start: DVec2::ZERO,
            last_cubic: None,
            last_quadratic: None,
        }
    }

    fn resolve(&self, abs: bool, x: f64, y: f64) -> DVec2 {
        if abs {
            DVec2::new(x, y)
        } else {
            self.position + DVec2::new(x, y)
        }
    }

    fn finish_subpath(&mut self) {
        let points = std::mem::take(&mut self.current);
        let contour = Contour::new(points);
        if contour.len() >= 3 {
            self.contours.push(contour);
        }
    }

    fn push(&mut self, point: DVec2) {
        if self.current.is_empty() {
            self.current.push(self.position);
        }
        self.current.push(point);
        self.position = point;
    }

    fn apply(&mut self, segment: SvgSegment) {
        let mut cubic_control = None;
        let mut quadratic_control = None;
        match segment {
            SvgSegment::MoveTo { abs, x, y } => {
                self.finish_subpath();
                let to = self.resolve(abs, x, y);
                self.position = to;
                self.start = to;
                self.current.push(to);
            }
            SvgSegment::LineTo { abs, x, y } => {
                let to = self.resolve(abs, x, y);
                self.push(to);
            }
            SvgSegment::HorizontalLineTo { abs, x } => {
                let to = if abs {
                    DVec2::new(x, self.position.y)
                } else {
                    DVec2::new(self.position.x + x, self.position.y)
                };
                self.push(to);
            }
            SvgSegment::VerticalLineTo { abs, y } => {
                let to = if abs {
                    DVec2::new(self.position.x, y)
                } else {
                    DVec2::new(self.position.x, self.position.y + y)
                };
                self.push(to);
            }
            SvgSegment::CurveTo {
                abs,
                x1,
                y1,
                x2,
                y2,
                x,
                y,
            } => {
                let c1 = self.resolve(abs, x1, y1);
                let c2 = self.resolve(abs, x2, y2);
                let to = self.resolve(abs, x, y);
                self.cubic(c1, c2, to);
                cubic_control = Some(c2);
            }
            SvgSegment::SmoothCurveTo { abs, x2, y2, x, y } => {
                let c1 = self
                    .last_cubic
                    .map_or(self.position, |c| 2.0 * self.position - c);
                let c2 = self.resolve(abs, x2, y2);
                let to = self.resolve(abs, x, y);
                self.cubic(c1, c2, to);
                cubic_control = Some(c2);
            }
            SvgSegment::Quadratic { abs, x1, y1, x, y } => {
                let c = self.resolve(abs, x1, y1);
                let to = self.resolve(abs, x, y);
                self.quadratic(c, to);
                quadratic_control = Some(c);
            }
            SvgSegment::SmoothQuadratic { abs, x, y } => {
                let c = self
                    .last_quadratic
                    .map_or(self.position, |c| 2.0 * self.position - c);
                let to = self.resolve(abs, x, y);
                self.quadratic(c, to);
                quadratic_control = Some(c);
            }
            SvgSegment::EllipticalArc {
                abs,
                rx,
                ry,
                x_axis_rotation,
                large_arc,
                sweep,
                x,
                y,
            } => {
                let to = self.resolve(abs, x, y);
                self.arc(rx, ry, x_axis_rotation, large_arc, sweep, to);
            }
            SvgSegment::ClosePath { .. } => {
                self.finish_subpath();
                self.position = self.start;
            }
        }
        self.last_cubic = cubic_control;
        self.last_quadratic = quadratic_control;
    }

    fn cubic(&mut self, c1: DVec2, c2: DVec2, to: DVec2) {
        let from = self.position;
        let n = self.curve_segments;
        for i in 1..=n {
            let t = i as f64 / n as f64;
            let mt = 1.0 - t;
            let point = from * (mt * mt * mt)
                + c1 * (3.0 * mt * mt * t)
                + c2 * (3.0 * mt * t * t)
                + to * (t * t * t);
            self.push(point);
        }
    }

    fn quadratic(&mut self, c: DVec2, to: DVec2) {
        let from = self.position;
        let n = self.curve_segments;
        for i in 1..=n {
            let t = i as f64 / n as f64;
            let mt = 1.0 - t;
            let point = from * (mt * mt) + c * (2.0 * mt * t) + to * (t * t);
            self.push(point);
        }
    }

    /// Endpoint-parameterised arc, converted to centre form.
    fn arc(
        &mut self,
        rx: f64,
        ry: f64,
        rotation_deg: f64,
        large_arc: bool,
        sweep: bool,
        to: DVec2,
    ) {
        let from = self.position;
        if from == to {
            return;
        }
        let (mut rx, mut ry) = (rx.abs(), ry.abs());
        if rx == 0.0 || ry == 0.0 {
            self.push(to);
            return;
        }
        let phi = rotation_deg.to_radians();
        let (sin_phi, cos_phi) = phi.sin_cos();
        let half = (from - to) / 2.0;
        let p = DVec2::new(
            cos_phi * half.x + sin_phi * half.y,
            -sin_phi * half.x + cos_phi * half.y,
        );

        let lambda = (p.x * p.x) / (rx * rx) + (p.y * p.y) / (ry * ry);
        if lambda > 1.0 {
            let scale = lambda.sqrt();
            rx *= scale;
            ry *= scale;
        }
        let num = rx * rx * ry * ry - rx * rx * p.y * p.y - ry * ry * p.x * p.x;
        let den = rx * rx * p.y * p.y + ry * ry * p.x * p.x;
        let sign = if large_arc == sweep { -1.0 } else { 1.0 };
        let coef = sign * (num / den).max(0.0).sqrt();
        let center_prime = DVec2::new(coef * rx * p.y / ry, -coef * ry * p.x / rx);
        let mid = (from + to) / 2.0;
        let center = DVec2::new(
            cos_phi * center_prime.x - sin_phi * center_prime.y + mid.x,
            sin_phi * center_prime.x + cos_phi * center_prime.y + mid.y,
        );

        let u = DVec2::new((p.x - center_prime.x) / rx, (p.y - center_prime.y) / ry);
        let v = DVec2::new((-p.x - center_prime.x) / rx, (-p.y - center_prime.y) / ry);
        let theta1 = signed_angle(DVec2::X, u);
        let mut delta = signed_angle(u, v);
        if !sweep && delta > 0.0 {
            delta -= TAU;
        } else if sweep && delta < 0.0 {
            delta += TAU;
        }

        let n = self.curve_segments * 2;
        for i in 1..n {
            let theta = theta1 + delta * i as f64 / n as f64;
            let local = DVec2::new(rx * theta.cos(), ry * theta.sin());
            self.push(DVec2::new(
                cos_phi * local.x - sin_phi * local.y + center.x,
                sin_phi * local.x + cos_phi * local.y + center.y,
            ));
        }
        self.push(to);
    }
}

fn signed_angle(from: DVec2, to: DVec2) -> f64 {
    from.perp_dot(to).atan2(from.dot(to))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"
    <svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
        <defs><path id="hidden" d="M0 0 L1 0 L1 1 Z"/></defs>
        <g fill="#D51B30" transform="translate(10, 0)">
            <path id="red" d="M0 0 H10 V10 H0 Z"/>
        </g>
        <path id="line-art" fill="black" d="M0 0 L5 0 L5 5 Z m1 1 l1 0 l0 1 z"/>
        <path id="broken" fill="#00ff00" d="M0 0 L 1 oops"/>
        <rect style="fill: #007241" x="1" y="2" width="3" height="4"/>
        <circle fill="none" cx="0" cy="0" r="3"/>
    </svg>
    "##;

    #[test]
    fn reads_filled_elements_with_inherited_style() {
        let doc = parse_svg(SAMPLE).unwrap();
        assert_eq!(doc.paths.len(), 3);

        let red = &doc.paths[0];
        assert_eq!(red.id.as_deref(), Some("red"));
        assert_eq!(red.color, Color::from_hex(0xD51B30));
        let bounds = red.subpaths[0].bounds().unwrap();
        assert_eq!(bounds.min, DVec2::new(10.0, 0.0));
        assert_eq!(bounds.max, DVec2::new(20.0, 10.0));

        let line_art = &doc.paths[1];
        assert_eq!(line_art.color, Color::BLACK);
        assert_eq!(line_art.subpaths.len(), 2);
        assert_eq!(line_art.subpaths[1].points()[0], DVec2::new(1.0, 1.0));

        assert_eq!(doc.paths[2].color, Color::from_hex(0x007241));
        assert!((doc.paths[2].subpaths[0].signed_area().abs() - 12.0).abs() < 1e-9);
    }

    #[test]
    fn unfilled_elements_are_dropped_without_rejection() {
        let doc = parse_svg(
            r#"<svg><g fill="none"><path d="M0 0 H4 V4 Z"/>
               <rect fill="white" width="2" height="2"/></g></svg>"#,
        )
        .unwrap();
        assert_eq!(doc.paths.len(), 1);
        assert_eq!(doc.paths[0].color, Color::WHITE);
        assert!(doc.rejected.is_empty());
    }

    #[test]
    fn malformed_path_is_rejected_but_not_fatal() {
        let doc = parse_svg(SAMPLE).unwrap();
        assert_eq!(doc.rejected.len(), 1);
        assert!(matches!(
            &doc.rejected[0],
            ParseError::PathData { element, .. } if element.contains("broken")
        ));
    }

    #[test]
    fn invalid_xml_fails_the_document() {
        assert!(matches!(parse_svg("<svg><path></svg>"), Err(ParseError::Xml(_))));
        assert!(matches!(parse_svg("<html/>"), Err(ParseError::Xml(_))));
    }

    #[test]
    fn curves_are_flattened_per_segment_count() {
        let contours = flatten_path_data("M0 0 C 0 10 10 10 10 0 Z", 12).unwrap();
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].len(), 13);

        let smooth = flatten_path_data("M0 0 Q 5 10 10 0 T 20 0 L 20 -5 Z", 4).unwrap();
        assert_eq!(smooth[0].len(), 10);
    }

    #[test]
    fn arcs_follow_the_circle() {
        let contours = flatten_path_data("M0 0 A 5 5 0 0 1 10 0 Z", 24).unwrap();
        let area = contours[0].signed_area().abs();
        let half_disc = PI * 25.0 / 2.0;
        assert!((area - half_disc).abs() / half_disc < 0.01);
        for point in contours[0].points() {
            assert!((point.distance(DVec2::new(5.0, 0.0)) - 5.0).abs() < 1e-9);
        }
    }

    #[test]
    fn circles_and_rounded_rects_become_rings() {
        let doc = parse_svg(
            r#"<svg><circle cx="1" cy="1" r="2"/><rect width="4" height="4" rx="1"/></svg>"#,
        )
        .unwrap();
        assert_eq!(doc.paths.len(), 2);
        let disc = doc.paths[0].subpaths[0].signed_area().abs();
        assert!((disc - PI * 4.0).abs() / (PI * 4.0) < 0.02);
        let rounded = doc.paths[1].subpaths[0].signed_area().abs();
        let exact = 16.0 - (4.0 - PI);
        assert!((rounded - exact).abs() / exact < 0.01);
    }
}
