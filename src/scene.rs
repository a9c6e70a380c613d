use std::sync::Arc;

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::material::Material;
use crate::mesh::{Aabb, MeshBuffers};

/// Handle to a node of a [`SceneContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Position, XYZ Euler rotation in radians, and scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Rotation applied as X, then Y, then Z in the parent frame order
    /// `Rx * Ry * Rz`.
    pub fn quaternion(&self) -> Quat {
        Quat::from_rotation_x(self.rotation.x)
            * Quat::from_rotation_y(self.rotation.y)
            * Quat::from_rotation_z(self.rotation.z)
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.quaternion(), self.position)
    }
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Group,
    Mesh {
        mesh: Arc<MeshBuffers>,
        material: Arc<Material>,
    },
}

impl NodeKind {
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Group => "group",
            NodeKind::Mesh { .. } => "mesh",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    pub transform: Transform,
    /// Rotation added on every tick, in radians.
    pub spin: Vec3,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 8.0),
            target: Vec3::ZERO,
            fov_degrees: 45.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Camera {
    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        let view = Mat4::look_at_rh(self.position, self.target, Vec3::Y);
        let projection = Mat4::perspective_rh_gl(
            self.fov_degrees.to_radians(),
            aspect.max(0.01),
            self.near,
            self.far,
        );
        projection * view
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightKind {
    Ambient,
    Directional,
    Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub kind: LightKind,
    pub color: Color,
    pub intensity: f32,
    pub position: Vec3,
}

/// Everything a renderer needs for one emblem scene: the node arena,
/// camera, lights and clear colour.
#[derive(Debug, Clone)]
pub struct SceneContext {
    pub name: String,
    pub clear_color: Color,
    pub camera: Camera,
    pub lights: Vec<Light>,
    pub viewport: (u32, u32),
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
    ticks: u64,
}

impl SceneContext {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            clear_color: Color::WHITE,
            camera: Camera::default(),
            lights: Vec::new(),
            viewport: (1280, 720),
            nodes: Vec::new(),
            roots: Vec::new(),
            ticks: 0,
        }
    }

    fn push(
        &mut self,
        name: String,
        kind: NodeKind,
        transform: Transform,
        parent: Option<NodeId>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name,
            kind,
            transform,
            spin: Vec3::ZERO,
            parent,
            children: Vec::new(),
        });
        match parent {
            Some(parent) => self.nodes[parent.0].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    pub fn add_root(
        &mut self,
        name: impl Into<String>,
        kind: NodeKind,
        transform: Transform,
    ) -> NodeId {
        self.push(name.into(), kind, transform, None)
    }

    /// Adds a node under `parent`, which must belong to this scene.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        kind: NodeKind,
        transform: Transform,
    ) -> NodeId {
        self.push(name.into(), kind, transform, Some(parent))
    }

    /// Copies the subtree rooted at `source` under `parent` (or as a new
    /// root). Meshes and materials are shared, not duplicated.
    pub fn clone_subtree(&mut self, source: NodeId, parent: Option<NodeId>) -> NodeId {
        let original = self.nodes[source.0].clone();
        let copy = self.push(original.name, original.kind, original.transform, parent);
        self.nodes[copy.0].spin = original.spin;
        for child in original.children {
            self.clone_subtree(child, Some(copy));
        }
        copy
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|node| node.name == name)
            .map(NodeId)
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// All nodes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId(index), node))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn world_matrix(&self, id: NodeId) -> Mat4 {
        let node = &self.nodes[id.0];
        let local = node.transform.matrix();
        match node.parent {
            Some(parent) => self.world_matrix(parent) * local,
            None => local,
        }
    }

    /// World-space box of every mesh in the subtree rooted at `id`.
    pub fn world_bounds(&self, id: NodeId) -> Option<Aabb> {
        let own = match &self.nodes[id.0].kind {
            NodeKind::Mesh { mesh, .. } => mesh
                .bounds()
                .map(|bounds| bounds.transformed(&self.world_matrix(id))),
            NodeKind::Group => None,
        };
        self.nodes[id.0]
            .children
            .iter()
            .filter_map(|child| self.world_bounds(*child))
            .fold(own, |acc, bounds| match acc {
                Some(acc) => Some(acc.union(bounds)),
                None => Some(bounds),
            })
    }

    /// Advances the animation by one frame.
    pub fn tick(&mut self) {
        for node in &mut self.nodes {
            node.transform.rotation += node.spin;
        }
        self.ticks += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::GlassPreset;
    use crate::mesh::MeshBuilder;
    use std::f32::consts::FRAC_PI_2;

    fn unit_triangle() -> NodeKind {
        let mut builder = MeshBuilder::new();
        let a = builder.push_vertex(Vec3::ZERO, Vec3::Z);
        let b = builder.push_vertex(Vec3::X, Vec3::Z);
        let c = builder.push_vertex(Vec3::Y, Vec3::Z);
        builder.push_triangle(a, b, c);
        NodeKind::Mesh {
            mesh: Arc::new(builder.finish()),
            material: Arc::new(GlassPreset::GLASS.material(Color::WHITE)),
        }
    }

    #[test]
    fn world_matrix_composes_parents() {
        let mut scene = SceneContext::new("test");
        let group = scene.add_root(
            "group",
            NodeKind::Group,
            Transform {
                position: Vec3::new(1.0, 0.0, 0.0),
                scale: Vec3::splat(2.0),
                ..Transform::default()
            },
        );
        let child = scene.add_child(
            group,
            "tri",
            unit_triangle(),
            Transform::from_position(Vec3::Y),
        );

        let world = scene.world_matrix(child);
        assert!(world
            .transform_point3(Vec3::ZERO)
            .abs_diff_eq(Vec3::new(1.0, 2.0, 0.0), 1e-6));
        let bounds = scene.world_bounds(group).unwrap();
        assert!(bounds.max.abs_diff_eq(Vec3::new(3.0, 4.0, 0.0), 1e-6));
        assert_eq!(scene.node(child).parent(), Some(group));
        assert_eq!(scene.roots(), &[group]);
    }

    #[test]
    fn rotation_order_is_x_then_y_then_z() {
        let transform = Transform {
            rotation: Vec3::new(FRAC_PI_2, 0.0, FRAC_PI_2),
            ..Transform::default()
        };
        // Rx * Rz applied to +X: Rz turns it to +Y, Rx then to +Z.
        let turned = transform.matrix().transform_vector3(Vec3::X);
        assert!(turned.abs_diff_eq(Vec3::Z, 1e-6), "{turned:?}");
    }

    #[test]
    fn clone_subtree_shares_meshes() {
        let mut scene = SceneContext::new("test");
        let group = scene.add_root("leaf", NodeKind::Group, Transform::default());
        scene.node_mut(group).spin = Vec3::new(0.0, 0.0, 0.005);
        let tri = scene.add_child(group, "tri", unit_triangle(), Transform::default());

        let copy = scene.clone_subtree(group, None);
        assert_eq!(scene.len(), 4);
        assert_eq!(scene.roots().len(), 2);
        assert_eq!(scene.node(copy).spin, scene.node(group).spin);
        let copied_child = scene.node(copy).children()[0];
        match (&scene.node(tri).kind, &scene.node(copied_child).kind) {
            (NodeKind::Mesh { mesh: a, .. }, NodeKind::Mesh { mesh: b, .. }) => {
                assert!(Arc::ptr_eq(a, b))
            }
            _ => panic!("expected mesh nodes"),
        }
    }

    #[test]
    fn tick_applies_spin() {
        let mut scene = SceneContext::new("test");
        let id = scene.add_root("spinner", NodeKind::Group, Transform::default());
        scene.node_mut(id).spin = Vec3::new(0.0, -0.005, 0.0);
        for _ in 0..10 {
            scene.tick();
        }
        assert_eq!(scene.ticks(), 10);
        assert!((scene.node(id).transform.rotation.y + 0.05).abs() < 1e-6);
        assert_eq!(scene.find("spinner"), Some(id));
    }
}
