//! Linear extrusion of planar shapes into closed, optionally bevelled
//! solids.
//!
//! The shape plane is `z = 0`; the solid grows towards `+z` by `depth`, and a
//! bevel adds `thickness` on both faces while widening the body by `size`.

use std::f64::consts::FRAC_PI_2;

use glam::{DVec2, Vec3};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::TessellationError;
use crate::geometry::{Contour, Point2, Shape};
use crate::mesh::{MeshBuffers, MeshBuilder};

/// Rounded edge between the caps and the side walls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bevel {
    pub thickness: f32,
    pub size: f32,
    pub segments: u32,
}

impl Default for Bevel {
    fn default() -> Self {
        Self {
            thickness: 0.2,
            size: 0.1,
            segments: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtrudeOptions {
    pub depth: f32,
    pub steps: u32,
    pub bevel: Option<Bevel>,
}

impl Default for ExtrudeOptions {
    fn default() -> Self {
        Self {
            depth: 1.0,
            steps: 1,
            bevel: Some(Bevel::default()),
        }
    }
}

impl ExtrudeOptions {
    /// Default bevel and step count with the given depth.
    pub fn with_depth(depth: f32) -> Self {
        Self {
            depth,
            ..Self::default()
        }
    }

    /// Sharp-edged prism.
    pub fn flat(depth: f32) -> Self {
        Self {
            depth,
            steps: 1,
            bevel: None,
        }
    }
}

/// Cap triangulation of a shape: the ring points (outer first, then holes,
/// oriented outer counter-clockwise and holes clockwise) and
/// counter-clockwise triangles indexing them.
#[derive(Debug, Clone, PartialEq)]
pub struct CapTriangulation {
    pub rings: Vec<Vec<Point2>>,
    pub triangles: Vec<[usize; 3]>,
}

impl CapTriangulation {
    pub fn points(&self) -> impl Iterator<Item = Point2> + '_ {
        self.rings.iter().flatten().copied()
    }

    pub fn area(&self) -> f64 {
        let points: Vec<Point2> = self.points().collect();
        self.triangles
            .iter()
            .map(|[a, b, c]| (points[*b] - points[*a]).perp_dot(points[*c] - points[*a]) * 0.5)
            .sum()
    }
}

/// Triangulates the face of `shape` with earcut.
pub fn triangulate(shape: &Shape) -> Result<CapTriangulation, TessellationError> {
    if !shape.outer.is_finite() || shape.holes.iter().any(|hole| !hole.is_finite()) {
        return Err(TessellationError::NonFinite);
    }
    if shape.outer.len() < 3 {
        return Err(TessellationError::DegenerateContour(shape.outer.len()));
    }

    let mut rings = vec![oriented(&shape.outer, false)];
    for hole in &shape.holes {
        if hole.len() < 3 {
            debug!("dropping hole with {} points", hole.len());
            continue;
        }
        rings.push(oriented(hole, true));
    }

    let mut coords: Vec<f64> = Vec::new();
    let mut hole_starts: Vec<usize> = Vec::new();
    for (i, ring) in rings.iter().enumerate() {
        if i > 0 {
            hole_starts.push(coords.len() / 2);
        }
        for point in ring {
            coords.extend_from_slice(&[point.x, point.y]);
        }
    }

    let indices = earcutr::earcut(&coords, &hole_starts, 2)
        .map_err(|err| TessellationError::Triangulation(format!("{err:?}")))?;
    if indices.len() < 3 || indices.len() % 3 != 0 {
        return Err(TessellationError::Triangulation(format!(
            "earcut returned {} indices",
            indices.len()
        )));
    }

    let point_at = |i: usize| DVec2::new(coords[i * 2], coords[i * 2 + 1]);
    let triangles = indices
        .chunks_exact(3)
        .map(|tri| {
            let (a, b, c) = (tri[0], tri[1], tri[2]);
            if (point_at(b) - point_at(a)).perp_dot(point_at(c) - point_at(a)) < 0.0 {
                [a, c, b]
            } else {
                [a, b, c]
            }
        })
        .collect();

    Ok(CapTriangulation { rings, triangles })
}

fn oriented(contour: &Contour, clockwise: bool) -> Vec<Point2> {
    if contour.is_clockwise() == clockwise {
        contour.points().to_vec()
    } else {
        contour.reversed().points().to_vec()
    }
}

/// Extrudes `shape` into a closed solid.
pub fn extrude_shape(
    shape: &Shape,
    options: &ExtrudeOptions,
) -> Result<MeshBuffers, TessellationError> {
    let cap = triangulate(shape)?;
    let layers = layers(options);
    let offsets: Vec<Vec<DVec2>> = match options.bevel {
        Some(bevel) if bevel.segments > 0 => cap.rings.iter().map(|r| bevel_vectors(r)).collect(),
        _ => cap.rings.iter().map(|r| vec![DVec2::ZERO; r.len()]).collect(),
    };

    let position = |ring: usize, i: usize, layer: usize| -> Vec3 {
        let (z, spread) = layers[layer];
        let p = cap.rings[ring][i] + offsets[ring][i] * f64::from(spread);
        Vec3::new(p.x as f32, p.y as f32, z)
    };

    let mut builder = MeshBuilder::new();
    let last = layers.len() - 1;

    // Caps: back faces +z, front faces -z.
    for (layer, normal, flip) in [(last, Vec3::Z, false), (0, Vec3::NEG_Z, true)] {
        let mut base = Vec::new();
        for (ring, points) in cap.rings.iter().enumerate() {
            for i in 0..points.len() {
                base.push(builder.push_vertex(position(ring, i, layer), normal));
            }
        }
        for [a, b, c] in &cap.triangles {
            if flip {
                builder.push_triangle(base[*a], base[*c], base[*b]);
            } else {
                builder.push_triangle(base[*a], base[*b], base[*c]);
            }
        }
    }

    for (ring, points) in cap.rings.iter().enumerate() {
        let n = points.len();
        for layer in 0..last {
            for i in 0..n {
                let j = (i + 1) % n;
                builder.push_quad(
                    position(ring, i, layer),
                    position(ring, j, layer),
                    position(ring, j, layer + 1),
                    position(ring, i, layer + 1),
                );
            }
        }
    }

    Ok(builder.finish())
}

/// `(z, bevel spread)` for every ring layer from the front cap to the back
/// cap.
fn layers(options: &ExtrudeOptions) -> Vec<(f32, f32)> {
    let steps = options.steps.max(1);
    let bevel = options.bevel.filter(|b| b.segments > 0);
    let mut layers = Vec::new();

    let profile = |bevel: &Bevel, b: u32| {
        let t = f64::from(b) / f64::from(bevel.segments) * FRAC_PI_2;
        let z = f64::from(bevel.thickness) * t.cos();
        let spread = f64::from(bevel.size) * t.sin();
        (z as f32, spread as f32)
    };

    if let Some(bevel) = &bevel {
        for b in 0..bevel.segments {
            let (z, spread) = profile(bevel, b);
            layers.push((-z, spread));
        }
    }
    let body_spread = bevel.map_or(0.0, |b| b.size);
    for s in 0..=steps {
        layers.push((options.depth * s as f32 / steps as f32, body_spread));
    }
    if let Some(bevel) = &bevel {
        for b in (0..bevel.segments).rev() {
            let (z, spread) = profile(bevel, b);
            layers.push((options.depth + z, spread));
        }
    }
    layers
}

/// Per-vertex miter directions that push every edge of the ring outwards by
/// one unit. Rings are expected counter-clockwise for solids and clockwise
/// for holes, so "outwards" always points away from the material.
fn bevel_vectors(ring: &[Point2]) -> Vec<DVec2> {
    let n = ring.len();
    (0..n)
        .map(|i| {
            let prev = ring[(i + n - 1) % n];
            let cur = ring[i];
            let next = ring[(i + 1) % n];
            let n1 = edge_normal(prev, cur);
            let n2 = edge_normal(cur, next);
            let denom = 1.0 + n1.dot(n2);
            let miter = if denom < 1e-6 {
                n1
            } else {
                (n1 + n2) / denom
            };
            // Sharp spikes would otherwise shoot far past the shape.
            let limit = std::f64::consts::SQRT_2;
            if miter.length_squared() > 2.0 {
                miter.normalize() * limit
            } else {
                miter
            }
        })
        .collect()
}

fn edge_normal(from: Point2, to: Point2) -> DVec2 {
    let dir = (to - from).normalize_or_zero();
    DVec2::new(dir.y, -dir.x)
}
