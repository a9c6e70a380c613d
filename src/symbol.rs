//! Turns the filled paths of an SVG symbol into a layered group of
//! extruded glass meshes.
//!
//! Achromatic paths form the line-art layer and are extruded deeper than
//! the coloured fills, which sit centred inside that layer. The whole
//! group is then shifted by half its size so that art drawn from the
//! canvas origin ends up around the group origin.

use std::sync::Arc;

use glam::{Mat4, Quat, Vec3};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::color::is_outline_color;
use crate::error::{ParseError, TessellationError};
use crate::extrude::{extrude_shape, ExtrudeOptions};
use crate::geometry::Shape;
use crate::material::{Material, MaterialCache};
use crate::mesh::{Aabb, MeshBuffers};
use crate::shape::{shapes_from_subpaths, FillMode};
use crate::svg::{VectorPath, DEFAULT_CURVE_SEGMENTS};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SymbolOptions {
    /// Extrusion depth of line-art paths, in source units.
    pub outline_depth: f32,
    /// Extrusion depth of coloured paths, in source units.
    pub fill_depth: f32,
    /// Uniform scale from source units to scene units.
    pub extrusion_scale: f32,
    /// Flattening resolution used when the symbol is read from SVG.
    pub curve_segments: usize,
}

impl Default for SymbolOptions {
    fn default() -> Self {
        Self {
            outline_depth: 40.0,
            fill_depth: 30.0,
            extrusion_scale: 0.01,
            curve_segments: DEFAULT_CURVE_SEGMENTS,
        }
    }
}

impl SymbolOptions {
    /// Z offset that centres fill members inside the outline layer.
    pub fn z_shift(&self) -> f32 {
        (self.outline_depth - self.fill_depth) * self.extrusion_scale / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathKind {
    Outline,
    Fill,
}

/// One extruded shape of the group.
#[derive(Debug, Clone)]
pub struct SymbolMember {
    /// Index of the source path.
    pub path_index: usize,
    pub kind: PathKind,
    pub shape: Shape,
    pub depth: f32,
    pub material: Arc<Material>,
    pub z_offset: f32,
    pub position: Vec3,
    pub scale: Vec3,
    pub mesh: Arc<MeshBuffers>,
}

impl SymbolMember {
    /// Local transform within the group.
    pub fn transform(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, Quat::IDENTITY, self.position)
    }

    pub fn bounds(&self) -> Option<Aabb> {
        self.mesh
            .bounds()
            .map(|bounds| bounds.transformed(&self.transform()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct SymbolGroup {
    pub members: Vec<SymbolMember>,
    /// Translation applied to every member to centre the group.
    pub offset: Vec3,
    pub rejected: Vec<ParseError>,
}

impl SymbolGroup {
    /// Union of the member boxes in group space.
    pub fn bounds(&self) -> Option<Aabb> {
        self.members
            .iter()
            .filter_map(SymbolMember::bounds)
            .reduce(Aabb::union)
    }

    pub fn outline_count(&self) -> usize {
        self.members
            .iter()
            .filter(|m| m.kind == PathKind::Outline)
            .count()
    }

    pub fn fill_count(&self) -> usize {
        self.members.len() - self.outline_count()
    }
}

/// Converts `paths` into a centred group of extruded members.
///
/// A path that cannot be turned into geometry is logged and listed in
/// [`SymbolGroup::rejected`]; the other paths still convert.
pub fn convert_to_group(
    paths: &[VectorPath],
    options: &SymbolOptions,
    materials: &MaterialCache,
) -> SymbolGroup {
    let s = options.extrusion_scale;
    let scale = Vec3::new(s, -s, s);
    let z_shift = options.z_shift();
    let mut group = SymbolGroup::default();

    for (index, path) in paths.iter().enumerate() {
        let kind = if is_outline_color(path.color) {
            PathKind::Outline
        } else {
            PathKind::Fill
        };
        let (depth, z_offset) = match kind {
            PathKind::Outline => (options.outline_depth, 0.0),
            PathKind::Fill => (options.fill_depth, z_shift),
        };

        let built = match extrude_path(index, path, kind, depth) {
            Ok(built) => built,
            Err(err) => {
                warn!("skipping symbol path {index}: {err}");
                group.rejected.push(err);
                continue;
            }
        };
        debug!(
            "path {index}: {:?} with {} shapes, colour #{:06x}",
            kind,
            built.len(),
            path.color.to_hex()
        );

        let material = materials.get_or_create(path.color);
        for (shape, mesh) in built {
            group.members.push(SymbolMember {
                path_index: index,
                kind,
                shape,
                depth,
                material: Arc::clone(&material),
                z_offset,
                position: Vec3::new(0.0, 0.0, z_offset),
                scale,
                mesh: Arc::new(mesh),
            });
        }
    }

    if let Some(bounds) = group.bounds() {
        let size = bounds.size();
        let offset = Vec3::new(-size.x / 2.0, size.y / 2.0, -size.z / 2.0);
        for member in &mut group.members {
            member.position = Vec3::new(offset.x, offset.y, member.z_offset + offset.z);
        }
        group.offset = offset;
    }
    group
}

/// Extrudes every shape of one path; any failure rejects the whole path.
fn extrude_path(
    index: usize,
    path: &VectorPath,
    kind: PathKind,
    depth: f32,
) -> Result<Vec<(Shape, MeshBuffers)>, ParseError> {
    if path.subpaths.iter().any(|c| !c.is_finite()) {
        return Err(ParseError::Tessellation {
            index,
            source: TessellationError::NonFinite,
        });
    }
    let mode = match kind {
        PathKind::Outline => FillMode::EvenOdd,
        PathKind::Fill => FillMode::Solid,
    };
    let shapes = shapes_from_subpaths(&path.subpaths, mode);
    if shapes.is_empty() {
        let name = path
            .id
            .clone()
            .unwrap_or_else(|| format!("path {index}"));
        return Err(ParseError::EmptyPath(name));
    }

    let options = ExtrudeOptions::with_depth(depth);
    shapes
        .into_iter()
        .map(|shape| {
            let mesh = extrude_shape(&shape, &options)
                .map_err(|source| ParseError::Tessellation { index, source })?;
            Ok((shape, mesh))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::geometry::Contour;
    use crate::material::GlassPreset;
    use glam::DVec2;

    fn square_path(color: Color, min: f64, max: f64) -> VectorPath {
        VectorPath {
            id: None,
            color,
            subpaths: vec![Contour::rectangle(DVec2::splat(min), DVec2::splat(max))],
        }
    }

    fn red() -> Color {
        Color::from_hex(0xD51B30)
    }

    #[test]
    fn single_fill_square_is_one_fill_member() {
        let options = SymbolOptions::default();
        let cache = MaterialCache::new(GlassPreset::GLASS);
        let group = convert_to_group(&[square_path(red(), 0.0, 100.0)], &options, &cache);

        assert_eq!(group.members.len(), 1);
        assert_eq!(group.outline_count(), 0);
        let member = &group.members[0];
        assert_eq!(member.kind, PathKind::Fill);
        assert_eq!(member.z_offset, options.z_shift());
        assert_eq!(member.depth, 30.0);
        assert_eq!(member.scale, Vec3::new(0.01, -0.01, 0.01));
        assert_eq!(member.material.base_color, red());
    }

    #[test]
    fn group_is_shifted_by_half_its_size() {
        let options = SymbolOptions::default();
        let cache = MaterialCache::default();
        let group = convert_to_group(&[square_path(red(), 0.0, 100.0)], &options, &cache);

        // pre-centring box: bevel adds 0.1 around and 0.2 on each face
        let size = Vec3::new(100.2, 100.2, 30.4) * 0.01;
        let expected = Vec3::new(-size.x / 2.0, size.y / 2.0, -size.z / 2.0);
        assert!(group.offset.abs_diff_eq(expected, 1e-5));
        assert_eq!(
            group.members[0].position,
            Vec3::new(group.offset.x, group.offset.y, options.z_shift() + group.offset.z)
        );

        let bounds = group.bounds().unwrap();
        let center = (bounds.min + bounds.max) / 2.0;
        assert!(center.x.abs() < 2e-3 && center.y.abs() < 2e-3, "{center:?}");
        // fills keep their shift on top of the centring
        assert!((center.z - options.z_shift()).abs() < 3e-3, "{center:?}");
    }

    #[test]
    fn centring_is_anchored_at_the_source_origin() {
        let options = SymbolOptions::default();
        let cache = MaterialCache::default();
        let at_origin = convert_to_group(&[square_path(red(), 0.0, 100.0)], &options, &cache);
        let moved = convert_to_group(&[square_path(red(), 100.0, 200.0)], &options, &cache);

        assert!(moved.offset.abs_diff_eq(at_origin.offset, 1e-5));
        let a = at_origin.bounds().unwrap();
        let b = moved.bounds().unwrap();
        assert!((b.min.x - a.min.x - 1.0).abs() < 1e-4);
        assert!((b.min.y - a.min.y + 1.0).abs() < 1e-4);
    }

    #[test]
    fn line_art_is_deeper_and_keeps_its_holes() {
        let ring = VectorPath {
            id: Some("ring".into()),
            color: Color::BLACK,
            // same winding on purpose: nesting alone makes the hole
            subpaths: vec![
                Contour::rectangle(DVec2::ZERO, DVec2::splat(100.0)),
                Contour::rectangle(DVec2::splat(20.0), DVec2::splat(80.0)),
            ],
        };
        let options = SymbolOptions::default();
        let cache = MaterialCache::default();
        let group = convert_to_group(
            &[ring, square_path(red(), 30.0, 70.0)],
            &options,
            &cache,
        );

        assert_eq!(group.outline_count(), 1);
        assert_eq!(group.fill_count(), 1);
        let outline = &group.members[0];
        assert_eq!(outline.shape.holes.len(), 1);
        assert_eq!(outline.z_offset, 0.0);

        let outline_box = outline.bounds().unwrap();
        let fill_box = group.members[1].bounds().unwrap();
        assert!(outline_box.size().z > fill_box.size().z);
        assert!(fill_box.min.z > outline_box.min.z);
        assert!(fill_box.max.z < outline_box.max.z);
    }

    #[test]
    fn conversion_is_repeatable_and_shares_materials() {
        let paths = vec![
            square_path(Color::BLACK, 0.0, 50.0),
            square_path(red(), 10.0, 40.0),
        ];
        let options = SymbolOptions::default();
        let cache = MaterialCache::default();
        let first = convert_to_group(&paths, &options, &cache);
        let second = convert_to_group(&paths, &options, &cache);

        assert_eq!(first.offset, second.offset);
        assert_eq!(cache.len(), 2);
        for (a, b) in first.members.iter().zip(&second.members) {
            assert_eq!(a.mesh, b.mesh);
            assert_eq!(a.position, b.position);
            assert!(Arc::ptr_eq(&a.material, &b.material));
        }
    }

    #[test]
    fn bad_paths_are_rejected_individually() {
        let nan = VectorPath {
            id: None,
            color: red(),
            subpaths: vec![Contour::new(vec![
                DVec2::ZERO,
                DVec2::new(f64::NAN, 1.0),
                DVec2::ONE,
            ])],
        };
        let sliver = VectorPath {
            id: Some("sliver".into()),
            color: red(),
            subpaths: vec![Contour::new(vec![DVec2::ZERO, DVec2::X])],
        };
        let cache = MaterialCache::default();
        let group = convert_to_group(
            &[nan, square_path(red(), 0.0, 10.0), sliver],
            &SymbolOptions::default(),
            &cache,
        );

        assert_eq!(group.members.len(), 1);
        assert_eq!(group.members[0].path_index, 1);
        assert_eq!(
            group.rejected,
            vec![
                ParseError::Tessellation {
                    index: 0,
                    source: TessellationError::NonFinite
                },
                ParseError::EmptyPath("sliver".into()),
            ]
        );
    }

    #[test]
    fn empty_input_gives_an_empty_group() {
        let group = convert_to_group(&[], &SymbolOptions::default(), &MaterialCache::default());
        assert!(group.members.is_empty());
        assert_eq!(group.offset, Vec3::ZERO);
        assert!(group.bounds().is_none());
    }
}
