//! XML scene manifests.
//!
//! ```xml
//! <scene name="quebec">
//!     <background>0 61 165</background>
//!     <object>
//!         <name>Cross</name>
//!         <type>cross</type>
//!         <color>255 255 255</color>
//!         <half-width>0.375</half-width>
//!         <reach>10</reach>
//!         <depth>0.8</depth>
//!         <bevel>0.05 0.05 2</bevel>
//!         <position>0 0 -0.4</position>
//!     </object>
//! </scene>
//! ```

use anyhow::{anyhow, bail, Context, Result};
use glam::Vec3;
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::extrude::{Bevel, ExtrudeOptions};
use crate::material::GlassPreset;
use crate::scene::LightKind;
use crate::symbol::SymbolOptions;

/// Where an object is placed on the viewport-dependent quadrant grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Anchor {
    /// Use the authored position as is.
    #[default]
    Center,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Anchor {
    fn parse(value: &str) -> Result<Self> {
        Ok(match value {
            "center" => Anchor::Center,
            "top-left" => Anchor::TopLeft,
            "top-right" => Anchor::TopRight,
            "bottom-left" => Anchor::BottomLeft,
            "bottom-right" => Anchor::BottomRight,
            other => bail!("unknown anchor {other}"),
        })
    }

    /// Signs applied to the quadrant offsets, or `None` for free placement.
    pub fn signs(self) -> Option<(f32, f32)> {
        match self {
            Anchor::Center => None,
            Anchor::TopLeft => Some((-1.0, 1.0)),
            Anchor::TopRight => Some((1.0, 1.0)),
            Anchor::BottomLeft => Some((-1.0, -1.0)),
            Anchor::BottomRight => Some((1.0, -1.0)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Layout {
    #[default]
    Single,
    /// One copy in each quadrant.
    Quadrants,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObjectKind {
    Camera {
        fov: f32,
    },
    Light {
        kind: LightKind,
        intensity: f32,
    },
    Cross {
        half_width: f64,
        reach: f64,
        radius: Option<f64>,
        extrude: ExtrudeOptions,
    },
    /// Axis-aligned box centred on its position.
    Bar {
        size: Vec3,
    },
    /// External OBJ model.
    Model {
        asset: String,
    },
    /// SVG symbol converted into a layered glass group.
    Symbol {
        asset: String,
        options: SymbolOptions,
    },
}

impl ObjectKind {
    pub fn asset(&self) -> Option<&str> {
        match self {
            ObjectKind::Model { asset } | ObjectKind::Symbol { asset, .. } => {
                Some(asset.as_str())
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSpec {
    pub name: String,
    pub kind: ObjectKind,
    pub color: Color,
    pub material: GlassPreset,
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
    pub spin: Vec3,
    pub anchor: Anchor,
    pub layout: Layout,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneManifest {
    pub name: String,
    pub background: Color,
    pub objects: Vec<ObjectSpec>,
}

impl SceneManifest {
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("invalid scene XML")?;
        let root = document.root_element();
        if !root.has_tag_name("scene") {
            bail!("expected a <scene> root element");
        }

        let name = root.attribute("name").unwrap_or("scene").to_string();
        let background = parse_color(optional_text(&root, "background"), Color::WHITE)?;
        let objects = root
            .children()
            .filter(|n| n.has_tag_name("object"))
            .enumerate()
            .map(|(index, node)| {
                parse_object(&node).with_context(|| format!("invalid <object> #{}", index + 1))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name,
            background,
            objects,
        })
    }

    pub fn lights(&self) -> impl Iterator<Item = &ObjectSpec> + '_ {
        self.objects
            .iter()
            .filter(|object| matches!(object.kind, ObjectKind::Light { .. }))
    }
}

fn parse_object(node: &Node<'_, '_>) -> Result<ObjectSpec> {
    let name = required_text(node, "name")?;
    let object_type = required_text(node, "type")?;

    let kind = match object_type.as_str() {
        "camera" => ObjectKind::Camera {
            fov: parse_f32(optional_text(node, "fov"), 45.0)?,
        },
        "light" => ObjectKind::Light {
            kind: match optional_text(node, "light").as_deref() {
                None | Some("directional") => LightKind::Directional,
                Some("ambient") => LightKind::Ambient,
                Some("point") => LightKind::Point,
                Some(other) => bail!("unknown light kind {other}"),
            },
            intensity: parse_f32(optional_text(node, "intensity"), 1.0)?,
        },
        "cross" => {
            let bevel = match optional_text(node, "bevel").as_deref() {
                None => Some(Bevel::default()),
                Some("none") => None,
                Some(value) => {
                    let v = parse_vec3(Some(value.to_string()), Vec3::ZERO)?;
                    Some(Bevel {
                        thickness: v.x,
                        size: v.y,
                        segments: v.z.max(0.0).round() as u32,
                    })
                }
            };
            ObjectKind::Cross {
                half_width: parse_f64(required_text(node, "half-width")?)?,
                reach: parse_f64(required_text(node, "reach")?)?,
                radius: optional_text(node, "radius").map(parse_f64).transpose()?,
                extrude: ExtrudeOptions {
                    depth: parse_f32(optional_text(node, "depth"), 1.0)?,
                    steps: 1,
                    bevel,
                },
            }
        }
        "bar" => ObjectKind::Bar {
            size: parse_vec3(optional_text(node, "size"), Vec3::ONE)?,
        },
        "model" => ObjectKind::Model {
            asset: required_text(node, "asset")?,
        },
        "symbol" => {
            let defaults = SymbolOptions::default();
            ObjectKind::Symbol {
                asset: required_text(node, "asset")?,
                options: SymbolOptions {
                    outline_depth: parse_f32(
                        optional_text(node, "outline-depth"),
                        defaults.outline_depth,
                    )?,
                    fill_depth: parse_f32(optional_text(node, "fill-depth"), defaults.fill_depth)?,
                    extrusion_scale: parse_f32(
                        optional_text(node, "extrusion-scale"),
                        defaults.extrusion_scale,
                    )?,
                    curve_segments: defaults.curve_segments,
                },
            }
        }
        other => bail!("unknown object type {other}"),
    };

    let material = match optional_text(node, "material") {
        Some(preset) => {
            GlassPreset::by_name(&preset).ok_or_else(|| anyhow!("unknown material {preset}"))?
        }
        None => GlassPreset::default(),
    };

    Ok(ObjectSpec {
        name,
        kind,
        color: parse_color(optional_text(node, "color"), Color::WHITE)?,
        material,
        position: parse_vec3(optional_text(node, "position"), Vec3::ZERO)?,
        rotation: parse_vec3(optional_text(node, "rotation"), Vec3::ZERO)?,
        scale: parse_vec3(optional_text(node, "scale"), Vec3::ONE)?,
        spin: parse_vec3(optional_text(node, "spin"), Vec3::ZERO)?,
        anchor: optional_text(node, "anchor")
            .map(|value| Anchor::parse(&value))
            .transpose()?
            .unwrap_or_default(),
        layout: match optional_text(node, "layout").as_deref() {
            None | Some("single") => Layout::Single,
            Some("quadrants") => Layout::Quadrants,
            Some(other) => bail!("unknown layout {other}"),
        },
    })
}

fn required_text(node: &Node<'_, '_>, tag: &str) -> Result<String> {
    optional_text(node, tag).ok_or_else(|| anyhow!("<{tag}> tag is missing"))
}

fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    node.children()
        .find(|child| child.has_tag_name(tag))
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn parse_vec3(value: Option<String>, default: Vec3) -> Result<Vec3> {
    let Some(value) = value else {
        return Ok(default);
    };
    let numbers = value
        .split_whitespace()
        .map(|component| {
            component
                .parse::<f32>()
                .map_err(|err| anyhow!("invalid vector component {component}: {err}"))
        })
        .collect::<Result<Vec<_>>>()?;
    match numbers[..] {
        [x, y, z] => Ok(Vec3::new(x, y, z)),
        _ => Err(anyhow!("vector needs 3 components, got {}", numbers.len())),
    }
}

/// Colours are written as `r g b` in 0-255.
fn parse_color(value: Option<String>, default: Color) -> Result<Color> {
    let Some(value) = value else {
        return Ok(default);
    };
    let channels = parse_vec3(Some(value), Vec3::ZERO).context("invalid colour")?;
    if channels.min_element() < 0.0 || channels.max_element() > 255.0 {
        bail!("colour channels must be within 0-255");
    }
    Ok(Color::from(channels / 255.0))
}

fn parse_f32(value: Option<String>, default: f32) -> Result<f32> {
    match value {
        Some(value) => value
            .parse::<f32>()
            .map_err(|err| anyhow!("failed to parse float: {err}")),
        None => Ok(default),
    }
}

fn parse_f64(value: String) -> Result<f64> {
    value
        .parse::<f64>()
        .map_err(|err| anyhow!("failed to parse number {value}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
    <scene name="sample">
        <background>0 61 165</background>
        <object>
            <name>Camera</name>
            <type>camera</type>
            <fov>50</fov>
            <position>0 0 8</position>
        </object>
        <object>
            <name>Sun</name>
            <type>light</type>
            <light>directional</light>
            <intensity>3</intensity>
            <position>0 3 2.2</position>
        </object>
        <object>
            <name>Cross</name>
            <type>cross</type>
            <color>213 27 48</color>
            <material>quebec</material>
            <half-width>0.375</half-width>
            <reach>10</reach>
            <radius>1</radius>
            <depth>0.8</depth>
            <bevel>0.05 0.05 2</bevel>
        </object>
        <object>
            <name>Rose</name>
            <type>symbol</type>
            <asset>rose.svg</asset>
            <anchor>top-right</anchor>
            <fill-depth>20</fill-depth>
            <spin>0 -0.005 0</spin>
        </object>
    </scene>
    "#;

    #[test]
    fn parse_manifest_populates_objects() {
        let manifest = SceneManifest::from_xml(SAMPLE).unwrap();
        assert_eq!(manifest.name, "sample");
        assert_eq!(manifest.background, Color::from_hex(0x003DA5));
        assert_eq!(manifest.objects.len(), 4);
        assert_eq!(manifest.lights().count(), 1);

        let cross = &manifest.objects[2];
        assert_eq!(cross.color, Color::from_hex(0xD51B30));
        assert_eq!(cross.material, GlassPreset::QUEBEC);
        match &cross.kind {
            ObjectKind::Cross {
                half_width,
                radius,
                extrude,
                ..
            } => {
                assert_eq!(*half_width, 0.375);
                assert_eq!(*radius, Some(1.0));
                assert_eq!(extrude.depth, 0.8);
                assert_eq!(extrude.bevel.map(|b| b.segments), Some(2));
            }
            other => panic!("unexpected kind {other:?}"),
        }

        let rose = &manifest.objects[3];
        assert_eq!(rose.anchor, Anchor::TopRight);
        assert_eq!(rose.kind.asset(), Some("rose.svg"));
        match &rose.kind {
            ObjectKind::Symbol { options, .. } => {
                assert_eq!(options.fill_depth, 20.0);
                assert_eq!(options.outline_depth, 40.0);
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn missing_name_is_an_error() {
        let bad = "<scene><object><type>bar</type></object></scene>";
        assert!(SceneManifest::from_xml(bad).is_err());
    }

    #[test]
    fn bad_values_are_reported() {
        let unknown = "<scene><object><name>x</name><type>teapot</type></object></scene>";
        let err = SceneManifest::from_xml(unknown).unwrap_err();
        assert!(format!("{err:#}").contains("unknown object type teapot"));

        let short = "<scene><object><name>x</name><type>bar</type><size>1 2</size></object></scene>";
        assert!(SceneManifest::from_xml(short).is_err());

        let bright = "<scene><background>300 0 0</background></scene>";
        assert!(SceneManifest::from_xml(bright).is_err());
    }
}
