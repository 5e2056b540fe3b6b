/// Geometry primitives and the per-segment mesh registry
use std::collections::HashMap;

use nalgebra::{Point3, Vector3};

use crate::model::{ArmDimensions, ArmKind};
use crate::segment::SegmentId;

/// A 3D vertex with position, normal and colour
#[derive(Debug, Clone, Copy)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
    pub color: [f32; 3],
}

impl Vertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], color: [f32; 3]) -> Self {
        Self {
            position: Point3::from(position),
            normal: Vector3::from(normal),
            color,
        }
    }
}

/// A triangle face defined by three vertices
#[derive(Debug, Clone)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// Calculate the face normal from the triangle's vertices
    pub fn calculate_normal(&self) -> Vector3<f32> {
        let v0 = self.vertices[0].position;
        let v1 = self.vertices[1].position;
        let v2 = self.vertices[2].position;

        let edge1 = v1 - v0;
        let edge2 = v2 - v0;

        edge1.cross(&edge2).normalize()
    }
}

/// An indexed triangle list
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
}

// Face order: front, right, up, left, down, back.
const FACE_NORMALS: [[f32; 3]; 6] = [
    [0.0, 0.0, 1.0],
    [1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [-1.0, 0.0, 0.0],
    [0.0, -1.0, 0.0],
    [0.0, 0.0, -1.0],
];

const FACE_COLORS: [[f32; 3]; 6] = [
    [0.4, 0.4, 1.0],
    [0.4, 1.0, 0.4],
    [1.0, 0.4, 0.4],
    [1.0, 1.0, 0.4],
    [1.0, 0.4, 1.0],
    [0.4, 1.0, 1.0],
];

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Iterate the indexed triangles. Trailing indices that do not form a
    /// full triangle, or that point past the vertex list, are ignored.
    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.indices.chunks_exact(3).filter_map(move |tri| {
            let v0 = *self.vertices.get(tri[0] as usize)?;
            let v1 = *self.vertices.get(tri[1] as usize)?;
            let v2 = *self.vertices.get(tri[2] as usize)?;
            Some(Triangle::new(v0, v1, v2))
        })
    }

    /// Box centred on x/z, standing on y = 0 with its top at y = `height`.
    ///
    /// Segments are modelled this way so that translating by a segment's
    /// height lands on the attachment point of the next one.
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        let x = width / 2.0;
        let z = depth / 2.0;
        let h = height;

        let corners: [[[f32; 3]; 4]; 6] = [
            [[x, h, z], [-x, h, z], [-x, 0.0, z], [x, 0.0, z]],
            [[x, h, z], [x, 0.0, z], [x, 0.0, -z], [x, h, -z]],
            [[x, h, z], [x, h, -z], [-x, h, -z], [-x, h, z]],
            [[-x, h, z], [-x, h, -z], [-x, 0.0, -z], [-x, 0.0, z]],
            [[-x, 0.0, -z], [x, 0.0, -z], [x, 0.0, z], [-x, 0.0, z]],
            [[x, 0.0, -z], [-x, 0.0, -z], [-x, h, -z], [x, h, -z]],
        ];

        let mut mesh = Self {
            vertices: Vec::with_capacity(24),
            indices: Vec::with_capacity(36),
        };

        for (face, quad) in corners.iter().enumerate() {
            let base = mesh.vertices.len() as u16;
            for corner in quad {
                mesh.vertices
                    .push(Vertex::new(*corner, FACE_NORMALS[face], FACE_COLORS[face]));
            }
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        mesh
    }
}

/// Meshes for each segment of an arm
#[derive(Debug, Clone, Default)]
pub struct GeometrySet {
    meshes: HashMap<SegmentId, Mesh>,
}

impl GeometrySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Boxes for every segment the given arm draws
    pub fn for_arm(kind: ArmKind, dims: &ArmDimensions) -> Self {
        let mut set = Self::new();
        let arm1 = Mesh::cuboid(3.0, dims.arm1_length, 3.0);
        match kind {
            ArmKind::SingleJoint => {
                // Arm2 reuses arm1's box; the walker thickens it.
                set.insert(SegmentId::Arm2, arm1.clone());
                set.insert(SegmentId::Arm1, arm1);
            }
            ArmKind::MultiJoint => {
                let finger = Mesh::cuboid(1.0, 2.0, 1.0);
                set.insert(SegmentId::Base, Mesh::cuboid(10.0, dims.base_height, 10.0));
                set.insert(SegmentId::Arm1, arm1);
                set.insert(SegmentId::Arm2, Mesh::cuboid(4.0, dims.arm2_length, 4.0));
                set.insert(SegmentId::Palm, Mesh::cuboid(2.0, dims.palm_length, 6.0));
                set.insert(SegmentId::Finger1, finger.clone());
                set.insert(SegmentId::Finger2, finger);
            }
        }
        set
    }

    pub fn insert(&mut self, segment: SegmentId, mesh: Mesh) -> Option<Mesh> {
        self.meshes.insert(segment, mesh)
    }

    pub fn remove(&mut self, segment: SegmentId) -> Option<Mesh> {
        self.meshes.remove(&segment)
    }

    pub fn get(&self, segment: SegmentId) -> Option<&Mesh> {
        self.meshes.get(&segment)
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cuboid_layout() {
        let mesh = Mesh::cuboid(4.0, 10.0, 2.0);
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.index_count(), 36);
        assert_eq!(mesh.triangles().count(), 12);

        let min_y = mesh.vertices.iter().map(|v| v.position.y).fold(f32::INFINITY, f32::min);
        let max_y = mesh.vertices.iter().map(|v| v.position.y).fold(f32::NEG_INFINITY, f32::max);
        let max_x = mesh.vertices.iter().map(|v| v.position.x).fold(f32::NEG_INFINITY, f32::max);
        let max_z = mesh.vertices.iter().map(|v| v.position.z).fold(f32::NEG_INFINITY, f32::max);
        assert_eq!(min_y, 0.0);
        assert_eq!(max_y, 10.0);
        assert_eq!(max_x, 2.0);
        assert_eq!(max_z, 1.0);
    }

    #[test]
    fn test_cuboid_winding_matches_face_normals() {
        let mesh = Mesh::cuboid(2.0, 2.0, 2.0);
        for triangle in mesh.triangles() {
            let computed = triangle.calculate_normal();
            let stored = triangle.vertices[0].normal;
            assert!((computed - stored).norm() < 1e-5);
        }
    }

    #[test]
    fn test_triangles_skip_bad_indices() {
        let mut mesh = Mesh::cuboid(1.0, 1.0, 1.0);
        mesh.indices.extend_from_slice(&[0, 1, 200, 3]);
        assert_eq!(mesh.triangles().count(), 12);
    }

    #[test]
    fn test_multi_joint_geometry_set() {
        let set = GeometrySet::for_arm(ArmKind::MultiJoint, &ArmDimensions::default());
        assert_eq!(set.len(), 6);
        for segment in SegmentId::ALL {
            assert!(set.get(segment).is_some(), "{segment} should have a mesh");
        }
    }

    #[test]
    fn test_single_joint_geometry_set() {
        let set = GeometrySet::for_arm(ArmKind::SingleJoint, &ArmDimensions::default());
        assert_eq!(set.len(), 2);
        assert!(set.get(SegmentId::Base).is_none());
        assert!(set.get(SegmentId::Arm2).is_some());
    }
}
