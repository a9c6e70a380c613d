use thiserror::Error;

/// Rejected input to the parametric outline builders.
///
/// Raised before any square root or inverse sine is evaluated, so callers
/// never observe NaN geometry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidGeometryError {
    #[error("{name} must be a finite number, got {value}")]
    NonFinite { name: &'static str, value: f64 },
    #[error("bar half-width must be positive, got {0}")]
    NonPositiveHalfWidth(f64),
    #[error("bar reach {reach} must exceed the bar half-width {half_width}")]
    ReachTooShort { reach: f64, half_width: f64 },
    #[error("arc radius {radius} must exceed the bar half-width {half_width}")]
    RadiusTooSmall { radius: f64, half_width: f64 },
    #[error("arc radius {radius} reaches past the arm tips at {reach}")]
    RadiusTooLarge { radius: f64, reach: f64 },
}

/// Failure to turn a closed shape into triangles.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TessellationError {
    #[error("contour has {0} distinct points, at least 3 are required")]
    DegenerateContour(usize),
    #[error("contour contains non-finite coordinates")]
    NonFinite,
    #[error("triangulation failed: {0}")]
    Triangulation(String),
}

/// Malformed vector or manifest input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("invalid XML: {0}")]
    Xml(String),
    #[error("invalid path data in {element}: {message}")]
    PathData { element: String, message: String },
    #[error("invalid attribute {attribute}=\"{value}\" on {element}")]
    Attribute {
        element: String,
        attribute: String,
        value: String,
    },
    #[error("{0} produced no closed sub-paths")]
    EmptyPath(String),
    #[error("path {index} could not be extruded: {source}")]
    Tessellation {
        index: usize,
        #[source]
        source: TessellationError,
    },
}
