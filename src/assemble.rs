use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use glam::{DVec2, Vec3};
use log::{debug, info, warn};

use crate::cross::build_cross_outline;
use crate::extrude::{extrude_shape, ExtrudeOptions};
use crate::geometry::{Contour, Shape};
use crate::manifest::{Layout, ObjectKind, ObjectSpec, SceneManifest};
use crate::material::{GlassPreset, MaterialCache};
use crate::mesh::{load_obj_from_str, MeshBuffers};
use crate::scene::{Camera, Light, NodeId, NodeKind, SceneContext, Transform};
use crate::svg::parse_svg_with;
use crate::symbol::convert_to_group;

/// Supplies the bytes of models and symbols referenced by a manifest.
pub trait AssetSource {
    fn load(&self, name: &str) -> Result<Vec<u8>>;
}

/// Assets stored as files below a root directory.
#[derive(Debug, Clone)]
pub struct DirectoryAssets {
    root: PathBuf,
}

impl DirectoryAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetSource for DirectoryAssets {
    fn load(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.root.join(name);
        fs::read(&path).with_context(|| format!("unable to read {}", path.display()))
    }
}

/// Assets held in memory, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssets {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.files.insert(name.into(), data.into());
    }
}

impl AssetSource for MemoryAssets {
    fn load(&self, name: &str) -> Result<Vec<u8>> {
        self.files
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow!("asset {name} not found"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssemblyOptions {
    /// Viewport in pixels; drives the quadrant layout.
    pub viewport: (u32, u32),
    /// Flattening resolution for cross arcs.
    pub curve_segments: usize,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            viewport: (1280, 720),
            curve_segments: 12,
        }
    }
}

/// Horizontal and vertical distance of the quadrant slots from the centre.
pub fn quadrant_offsets(viewport: (u32, u32)) -> (f32, f32) {
    let (width, height) = viewport;
    ((width as f32).sqrt() / 12.0, (height as f32).sqrt() / 14.0)
}

/// An object left out of the scene because its asset was unusable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedObject {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct Assembly {
    pub scene: SceneContext,
    pub skipped: Vec<SkippedObject>,
    /// SVG paths dropped while reading or converting symbols.
    pub rejected_paths: usize,
}

/// Builds the scene described by `manifest`.
///
/// Invalid parametric geometry fails the whole assembly. A missing or
/// unreadable asset only drops its own object, which is reported in
/// [`Assembly::skipped`].
pub fn assemble(
    manifest: &SceneManifest,
    assets: &dyn AssetSource,
    options: &AssemblyOptions,
) -> Result<Assembly> {
    let mut assembler = Assembler {
        scene: SceneContext::new(manifest.name.clone()),
        materials: Vec::new(),
        skipped: Vec::new(),
        rejected_paths: 0,
        options: *options,
    };
    assembler.scene.clear_color = manifest.background;
    assembler.scene.viewport = options.viewport;

    for object in &manifest.objects {
        assembler
            .add_object(object, assets)
            .with_context(|| format!("failed to build {}", object.name))?;
    }

    let Assembler {
        scene,
        skipped,
        rejected_paths,
        ..
    } = assembler;
    info!(
        "assembled scene {} with {} nodes, {} skipped objects",
        scene.name,
        scene.len(),
        skipped.len()
    );
    Ok(Assembly {
        scene,
        skipped,
        rejected_paths,
    })
}

struct Assembler {
    scene: SceneContext,
    materials: Vec<MaterialCache>,
    skipped: Vec<SkippedObject>,
    rejected_paths: usize,
    options: AssemblyOptions,
}

impl Assembler {
    fn materials(&mut self, preset: GlassPreset) -> &MaterialCache {
        let index = match self.materials.iter().position(|c| c.preset() == preset) {
            Some(index) => index,
            None => {
                self.materials.push(MaterialCache::new(preset));
                self.materials.len() - 1
            }
        };
        &self.materials[index]
    }

    fn skip(&mut self, object: &ObjectSpec, reason: anyhow::Error) {
        warn!("skipping {}: {reason:#}", object.name);
        self.skipped.push(SkippedObject {
            name: object.name.clone(),
            reason: format!("{reason:#}"),
        });
    }

    fn add_object(&mut self, object: &ObjectSpec, assets: &dyn AssetSource) -> Result<()> {
        match &object.kind {
            ObjectKind::Camera { fov } => {
                self.scene.camera = Camera {
                    position: object.position,
                    fov_degrees: *fov,
                    ..Camera::default()
                };
            }
            ObjectKind::Light { kind, intensity } => {
                self.scene.lights.push(Light {
                    kind: *kind,
                    color: object.color,
                    intensity: *intensity,
                    position: object.position,
                });
            }
            ObjectKind::Cross {
                half_width,
                reach,
                radius,
                extrude,
            } => {
                let outline = build_cross_outline(*half_width, *reach, *radius)?;
                let shape = Shape::new(outline.to_contour(self.options.curve_segments));
                let mesh = extrude_shape(&shape, extrude)?;
                self.add_mesh(object, mesh);
            }
            ObjectKind::Bar { size } => {
                let half = DVec2::new(f64::from(size.x), f64::from(size.y)) / 2.0;
                let shape = Shape::new(Contour::rectangle(-half, half));
                let mut mesh = extrude_shape(&shape, &ExtrudeOptions::flat(size.z))?;
                mesh.translate(Vec3::new(0.0, 0.0, -size.z / 2.0));
                self.add_mesh(object, mesh);
            }
            ObjectKind::Model { asset } => {
                let mesh = match load_text(assets, asset)
                    .and_then(|text| load_obj_from_str(&text))
                {
                    Ok(mesh) => mesh,
                    Err(err) => {
                        self.skip(object, err);
                        return Ok(());
                    }
                };
                self.add_mesh(object, mesh);
            }
            ObjectKind::Symbol { asset, options } => {
                let document = match load_text(assets, asset).and_then(|text| {
                    parse_svg_with(&text, options.curve_segments)
                        .with_context(|| format!("invalid SVG {asset}"))
                }) {
                    Ok(document) => document,
                    Err(err) => {
                        self.skip(object, err);
                        return Ok(());
                    }
                };
                self.rejected_paths += document.rejected.len();

                let materials = self.materials(object.material);
                let group = convert_to_group(&document.paths, options, materials);
                self.rejected_paths += group.rejected.len();
                if group.members.is_empty() {
                    self.skip(object, anyhow!("{asset} has no usable paths"));
                    return Ok(());
                }
                debug!(
                    "{}: {} outline and {} fill members",
                    object.name,
                    group.outline_count(),
                    group.fill_count()
                );

                let root = self.scene.add_root(
                    object.name.clone(),
                    NodeKind::Group,
                    root_transform(object),
                );
                for (index, member) in group.members.iter().enumerate() {
                    self.scene.add_child(
                        root,
                        format!("{} path {} #{index}", object.name, member.path_index),
                        NodeKind::Mesh {
                            mesh: Arc::clone(&member.mesh),
                            material: Arc::clone(&member.material),
                        },
                        Transform {
                            position: member.position,
                            rotation: Vec3::ZERO,
                            scale: member.scale,
                        },
                    );
                }
                self.place(object, root);
            }
        }
        Ok(())
    }

    fn add_mesh(&mut self, object: &ObjectSpec, mesh: MeshBuffers) {
        let material = self.materials(object.material).get_or_create(object.color);
        let root = self.scene.add_root(
            object.name.clone(),
            NodeKind::Mesh {
                mesh: Arc::new(mesh),
                material,
            },
            root_transform(object),
        );
        self.place(object, root);
    }

    /// Applies spin, anchoring and the quadrant layout to a freshly added
    /// root.
    fn place(&mut self, object: &ObjectSpec, root: NodeId) {
        self.scene.node_mut(root).spin = object.spin;
        let positions = placements(object, self.options.viewport);
        if positions.len() > 1 {
            self.scene.node_mut(root).name = format!("{} 1", object.name);
        }
        self.scene.node_mut(root).transform.position = positions[0];
        for (index, position) in positions.iter().enumerate().skip(1) {
            let copy = self.scene.clone_subtree(root, None);
            let node = self.scene.node_mut(copy);
            node.name = format!("{} {}", object.name, index + 1);
            node.transform.position = *position;
        }
    }
}

fn root_transform(object: &ObjectSpec) -> Transform {
    Transform {
        position: object.position,
        rotation: object.rotation,
        scale: object.scale,
    }
}

/// World positions for each copy of `object`.
fn placements(object: &ObjectSpec, viewport: (u32, u32)) -> Vec<Vec3> {
    let (p, h) = quadrant_offsets(viewport);
    let z = object.position.z;
    match object.layout {
        Layout::Quadrants => vec![
            Vec3::new(p, h, z),
            Vec3::new(p, -h, z),
            Vec3::new(-p, -h, z),
            Vec3::new(-p, h, z),
        ],
        Layout::Single => match object.anchor.signs() {
            Some((sx, sy)) => vec![Vec3::new(sx * p, sy * h, z)],
            None => vec![object.position],
        },
    }
}

fn load_text(assets: &dyn AssetSource, name: &str) -> Result<String> {
    let bytes = assets.load(name)?;
    String::from_utf8(bytes).with_context(|| format!("{name} is not valid UTF-8"))
}
