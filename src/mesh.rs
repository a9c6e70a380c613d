use std::collections::HashMap;

use anyhow::{anyhow, bail, Context, Result};
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Floats per vertex: `position.xyz` followed by `normal.xyz`.
pub const VERTEX_STRIDE: usize = 6;

/// GPU ready mesh buffers.
///
/// Vertices are interleaved `position.xyz` followed by `normal.xyz`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MeshBuffers {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
}

/// Axis-aligned box in model or world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_point(point: Vec3) -> Self {
        Self {
            min: point,
            max: point,
        }
    }

    pub fn include(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn union(self, other: Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    /// Box around the eight transformed corners.
    pub fn transformed(&self, matrix: &Mat4) -> Aabb {
        let corners = self.corners();
        let mut out = Aabb::from_point(matrix.transform_point3(corners[0]));
        for corner in &corners[1..] {
            out.include(matrix.transform_point3(*corner));
        }
        out
    }
}

impl MeshBuffers {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / VERTEX_STRIDE
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn position(&self, index: usize) -> Vec3 {
        Vec3::from_slice(&self.vertices[index * VERTEX_STRIDE..index * VERTEX_STRIDE + 3])
    }

    pub fn normal(&self, index: usize) -> Vec3 {
        Vec3::from_slice(&self.vertices[index * VERTEX_STRIDE + 3..index * VERTEX_STRIDE + 6])
    }

    pub fn positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.vertices
            .chunks_exact(VERTEX_STRIDE)
            .map(|chunk| Vec3::from_slice(&chunk[..3]))
    }

    pub fn bounds(&self) -> Option<Aabb> {
        let mut positions = self.positions();
        let first = positions.next()?;
        let mut bounds = Aabb::from_point(first);
        for position in positions {
            bounds.include(position);
        }
        Some(bounds)
    }

    /// Moves every vertex by `offset`.
    pub fn translate(&mut self, offset: Vec3) {
        for chunk in self.vertices.chunks_exact_mut(VERTEX_STRIDE) {
            chunk[0] += offset.x;
            chunk[1] += offset.y;
            chunk[2] += offset.z;
        }
    }

    /// Copy of the mesh with positions and normals carried through
    /// `matrix`. Mirroring matrices also flip triangle winding so faces keep
    /// pointing outwards.
    pub fn transformed(&self, matrix: &Mat4) -> MeshBuffers {
        let normal_matrix = matrix.inverse().transpose();
        let mut vertices = Vec::with_capacity(self.vertices.len());
        for chunk in self.vertices.chunks_exact(VERTEX_STRIDE) {
            let position = matrix.transform_point3(Vec3::from_slice(&chunk[..3]));
            let normal = normal_matrix
                .transform_vector3(Vec3::from_slice(&chunk[3..]))
                .normalize_or_zero();
            vertices.extend_from_slice(&[
                position.x, position.y, position.z, normal.x, normal.y, normal.z,
            ]);
        }
        let mut indices = self.indices.clone();
        if matrix.determinant() < 0.0 {
            for triangle in indices.chunks_exact_mut(3) {
                triangle.swap(1, 2);
            }
        }
        MeshBuffers { vertices, indices }
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

/// Incremental writer for [`MeshBuffers`].
#[derive(Debug, Default)]
pub struct MeshBuilder {
    mesh: MeshBuffers,
}

impl MeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_vertex(&mut self, position: Vec3, normal: Vec3) -> u32 {
        let index = self.mesh.vertex_count() as u32;
        self.mesh.vertices.extend_from_slice(&[
            position.x, position.y, position.z, normal.x, normal.y, normal.z,
        ]);
        index
    }

    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.mesh.indices.extend_from_slice(&[a, b, c]);
    }

    /// Flat-shaded quad `a b c d`, wound counter-clockwise seen from the
    /// side its normal points to.
    pub fn push_quad(&mut self, a: Vec3, b: Vec3, c: Vec3, d: Vec3) {
        let normal = (b - a).cross(c - a);
        let normal = if normal.length_squared() > f32::EPSILON * f32::EPSILON {
            normal.normalize()
        } else {
            (c - a).cross(d - a).normalize_or_zero()
        };
        let ia = self.push_vertex(a, normal);
        let ib = self.push_vertex(b, normal);
        let ic = self.push_vertex(c, normal);
        let id = self.push_vertex(d, normal);
        self.push_triangle(ia, ib, ic);
        self.push_triangle(ia, ic, id);
    }

    pub fn finish(self) -> MeshBuffers {
        self.mesh
    }
}

/// Parses an OBJ model from memory. Corners sharing a position and normal
/// are welded into one vertex; if any corner lacks a normal, smooth normals
/// are computed for the whole model.
pub fn load_obj_from_str(data: &str) -> Result<MeshBuffers> {
    let mut reader = ObjReader::default();
    for (line_no, line) in data.lines().enumerate() {
        reader
            .read_line(line)
            .with_context(|| format!("OBJ line {}: `{}`", line_no + 1, line.trim()))?;
    }
    reader.finish()
}

#[derive(Default)]
struct ObjReader {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    welded: HashMap<(usize, Option<usize>), u32>,
    builder: MeshBuilder,
    missing_normals: bool,
}

impl ObjReader {
    fn read_line(&mut self, line: &str) -> Result<()> {
        let content = line.split_once('#').map_or(line, |(code, _)| code);
        let mut fields = content.split_whitespace();
        match fields.next() {
            Some("v") => self
                .positions
                .push(read_vec3(fields).context("bad vertex position")?),
            Some("vn") => self
                .normals
                .push(read_vec3(fields).context("bad vertex normal")?),
            Some("f") => self.read_face(fields)?,
            _ => {}
        }
        Ok(())
    }

    /// Fans a polygon around its first corner.
    fn read_face<'a>(&mut self, fields: impl Iterator<Item = &'a str>) -> Result<()> {
        let corners = fields
            .map(|field| self.corner(field))
            .collect::<Result<Vec<u32>>>()?;
        if corners.len() < 3 {
            bail!("face has {} corners, expected at least 3", corners.len());
        }
        for pair in corners[1..].windows(2) {
            self.builder.push_triangle(corners[0], pair[0], pair[1]);
        }
        Ok(())
    }

    fn corner(&mut self, field: &str) -> Result<u32> {
        let mut refs = field.split('/');
        let position = resolve(refs.next(), self.positions.len())?
            .ok_or_else(|| anyhow!("corner `{field}` has no vertex index"))?;
        let _texcoord = refs.next();
        let normal = resolve(refs.next(), self.normals.len())?;
        self.missing_normals |= normal.is_none();

        if let Some(&index) = self.welded.get(&(position, normal)) {
            return Ok(index);
        }
        let index = self.builder.push_vertex(
            self.positions[position],
            normal.map_or(Vec3::ZERO, |n| self.normals[n]),
        );
        self.welded.insert((position, normal), index);
        Ok(index)
    }

    fn finish(self) -> Result<MeshBuffers> {
        if self.positions.is_empty() {
            bail!("OBJ data defines no vertices");
        }
        let mut mesh = self.builder.finish();
        if self.missing_normals {
            smooth_normals(&mut mesh);
        }
        Ok(mesh)
    }
}

fn read_vec3<'a>(mut fields: impl Iterator<Item = &'a str>) -> Result<Vec3> {
    let mut next = || -> Result<f32> {
        let field = fields
            .next()
            .ok_or_else(|| anyhow!("expected three components"))?;
        field
            .parse()
            .with_context(|| format!("invalid number `{field}`"))
    };
    Ok(Vec3::new(next()?, next()?, next()?))
}

/// Resolves a 1-based reference; negative values count back from the last
/// element read so far. An empty field means no reference.
fn resolve(field: Option<&str>, len: usize) -> Result<Option<usize>> {
    let Some(field) = field.filter(|f| !f.is_empty()) else {
        return Ok(None);
    };
    let index: i64 = field
        .parse()
        .with_context(|| format!("invalid index `{field}`"))?;
    let resolved = match index {
        i if i > 0 => usize::try_from(i - 1).ok(),
        i if i < 0 => usize::try_from(i.unsigned_abs())
            .ok()
            .and_then(|back| len.checked_sub(back)),
        _ => None,
    };
    match resolved.filter(|&i| i < len) {
        Some(i) => Ok(Some(i)),
        None => bail!("index {index} out of range for {len} elements"),
    }
}

/// Area-weighted vertex normals.
fn smooth_normals(mesh: &mut MeshBuffers) {
    let mut sums = vec![Vec3::ZERO; mesh.vertex_count()];
    for tri in mesh.indices.chunks_exact(3) {
        let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| i as usize);
        let origin = mesh.position(a);
        let face = (mesh.position(b) - origin).cross(mesh.position(c) - origin);
        for i in [a, b, c] {
            sums[i] += face;
        }
    }
    for (vertex, sum) in mesh.vertices.chunks_exact_mut(VERTEX_STRIDE).zip(sums) {
        vertex[3..6].copy_from_slice(&sum.normalize_or_zero().to_array());
    }
}
