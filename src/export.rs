//! Wavefront OBJ/MTL export of assembled scenes.

use std::collections::BTreeMap;
use std::io::Write;

use anyhow::{Context, Result};

use crate::material::Material;
use crate::scene::{NodeKind, SceneContext};

/// Writes every mesh node in world space, one `o` block per node.
///
/// Returns the number of meshes written.
pub fn write_obj<W: Write>(
    scene: &SceneContext,
    out: &mut W,
    mtl_name: Option<&str>,
) -> Result<usize> {
    writeln!(out, "# {}", scene.name)?;
    if let Some(mtl) = mtl_name {
        writeln!(out, "mtllib {mtl}")?;
    }

    let mut base = 1usize;
    let mut written = 0usize;
    for (id, node) in scene.iter() {
        let NodeKind::Mesh { mesh, material } = &node.kind else {
            continue;
        };
        let world = mesh.transformed(&scene.world_matrix(id));
        writeln!(out, "o {}", node.name.replace(char::is_whitespace, "_"))?;
        writeln!(out, "usemtl {}", material.name())?;
        for i in 0..world.vertex_count() {
            let p = world.position(i);
            writeln!(out, "v {:.6} {:.6} {:.6}", p.x, p.y, p.z)?;
        }
        for i in 0..world.vertex_count() {
            let n = world.normal(i);
            writeln!(out, "vn {:.6} {:.6} {:.6}", n.x, n.y, n.z)?;
        }
        for tri in world.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| i as usize + base);
            writeln!(out, "f {a}//{a} {b}//{b} {c}//{c}")?;
        }
        base += world.vertex_count();
        written += 1;
    }
    out.flush().context("failed to flush OBJ output")?;
    Ok(written)
}

/// Writes one `newmtl` entry per distinct material, sorted by name.
pub fn write_mtl<W: Write>(scene: &SceneContext, out: &mut W) -> Result<usize> {
    let mut materials: BTreeMap<String, &Material> = BTreeMap::new();
    for (_, node) in scene.iter() {
        if let NodeKind::Mesh { material, .. } = &node.kind {
            materials.entry(material.name()).or_insert(material.as_ref());
        }
    }

    for (name, material) in &materials {
        let c = material.base_color;
        let t = material.transmission;
        writeln!(out, "newmtl {name}")?;
        writeln!(out, "Kd {:.4} {:.4} {:.4}", c.r, c.g, c.b)?;
        writeln!(out, "Ks {0:.4} {0:.4} {0:.4}", material.specular_intensity)?;
        writeln!(out, "Tf {t:.4} {t:.4} {t:.4}")?;
        writeln!(out, "d {:.4}", material.opacity)?;
        writeln!(out, "Ni {:.4}", material.ior)?;
        writeln!(out, "Pr {:.4}", material.roughness)?;
        writeln!(out, "Pm {:.4}", material.metalness)?;
        writeln!(out)?;
    }
    out.flush().context("failed to flush MTL output")?;
    Ok(materials.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use glam::Vec3;

    use crate::color::Color;
    use crate::material::GlassPreset;
    use crate::mesh::{load_obj_from_str, MeshBuilder};
    use crate::scene::Transform;

    fn scene_with_two_triangles() -> SceneContext {
        let mut builder = MeshBuilder::new();
        let a = builder.push_vertex(Vec3::ZERO, Vec3::Z);
        let b = builder.push_vertex(Vec3::X, Vec3::Z);
        let c = builder.push_vertex(Vec3::Y, Vec3::Z);
        builder.push_triangle(a, b, c);
        let mesh = Arc::new(builder.finish());
        let material = Arc::new(GlassPreset::GLASS.material(Color::from_hex(0x007241)));

        let mut scene = SceneContext::new("export");
        let group = scene.add_root("Group", NodeKind::Group, Transform::default());
        for (name, x) in [("first tri", 0.0), ("second tri", 5.0)] {
            scene.add_child(
                group,
                name,
                NodeKind::Mesh {
                    mesh: Arc::clone(&mesh),
                    material: Arc::clone(&material),
                },
                Transform::from_position(Vec3::new(x, 0.0, 0.0)),
            );
        }
        scene
    }

    #[test]
    fn obj_output_reloads_in_world_space() {
        let scene = scene_with_two_triangles();
        let mut out = Vec::new();
        let written = write_obj(&scene, &mut out, Some("export.mtl")).unwrap();
        assert_eq!(written, 2);

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("mtllib export.mtl"));
        assert!(text.contains("o second_tri"));
        assert!(text.contains("usemtl glass_007241"));
        assert!(text.contains("f 4//4 5//5 6//6"));

        let reloaded = load_obj_from_str(&text).unwrap();
        assert_eq!(reloaded.triangle_count(), 2);
        let bounds = reloaded.bounds().unwrap();
        assert_eq!(bounds.max, Vec3::new(6.0, 1.0, 0.0));
    }

    #[test]
    fn mtl_lists_each_material_once() {
        let scene = scene_with_two_triangles();
        let mut out = Vec::new();
        assert_eq!(write_mtl(&scene, &mut out).unwrap(), 1);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("newmtl").count(), 1);
        assert!(text.contains("Ni 1.3000"));
        assert!(text.contains("Tf 0.7500 0.7500 0.7500"));
    }

    #[test]
    fn same_color_under_two_presets_exports_two_materials() {
        let mut builder = MeshBuilder::new();
        builder.push_quad(Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y);
        let mesh = Arc::new(builder.finish());
        let red = Color::from_hex(0xFF0000);

        let mut scene = SceneContext::new("presets");
        for (name, preset) in [("A", GlassPreset::CANADA), ("B", GlassPreset::GLASS)] {
            scene.add_root(
                name,
                NodeKind::Mesh {
                    mesh: Arc::clone(&mesh),
                    material: Arc::new(preset.material(red)),
                },
                Transform::default(),
            );
        }

        let mut mtl = Vec::new();
        assert_eq!(write_mtl(&scene, &mut mtl).unwrap(), 2);
        let mtl = String::from_utf8(mtl).unwrap();
        assert!(mtl.contains("newmtl canada_ff0000\nKd 1.0000 0.0000 0.0000"));
        assert!(mtl.contains("Ni 1.5000"));
        assert!(mtl.contains("Ni 1.3000"));

        let mut obj = Vec::new();
        write_obj(&scene, &mut obj, None).unwrap();
        let obj = String::from_utf8(obj).unwrap();
        assert!(obj.contains("o A\nusemtl canada_ff0000"));
        assert!(obj.contains("o B\nusemtl glass_ff0000"));
    }
}
