//! Glass emblem scenes built from parametric crosses and SVG symbols.
//!
//! The geometric core is [`build_cross_outline`] and [`convert_to_group`].
//! Around it sit an SVG reader, an extruder producing interleaved mesh
//! buffers, a small scene arena and an XML manifest layer that assembles
//! complete scenes. Rendering stays outside of the crate; the assembled
//! [`SceneContext`] with its meshes and material uniforms is the hand-off.

pub mod assemble;
pub mod color;
pub mod cross;
pub mod error;
pub mod export;
pub mod extrude;
pub mod geometry;
pub mod manifest;
pub mod material;
pub mod mesh;
pub mod presets;
pub mod scene;
pub mod shape;
pub mod svg;
pub mod symbol;

pub use assemble::{
    assemble, quadrant_offsets, AssemblyOptions, Assembly, AssetSource, DirectoryAssets,
    MemoryAssets, SkippedObject,
};
pub use color::{is_outline_color, Color};
pub use cross::build_cross_outline;
pub use error::{InvalidGeometryError, ParseError, TessellationError};
pub use export::{write_mtl, write_obj};
pub use extrude::{extrude_shape, Bevel, ExtrudeOptions};
pub use geometry::{Contour, Outline, PathSegment, Point2, Shape};
pub use manifest::{Anchor, Layout, ObjectKind, ObjectSpec, SceneManifest};
pub use material::{GlassPreset, Material, MaterialCache, MaterialUniform};
pub use mesh::{load_obj_from_str, Aabb, MeshBuffers};
pub use scene::{Camera, Light, LightKind, NodeId, NodeKind, SceneContext, Transform};
pub use svg::{parse_svg, SvgDocument, VectorPath};
pub use symbol::{convert_to_group, PathKind, SymbolGroup, SymbolMember, SymbolOptions};
