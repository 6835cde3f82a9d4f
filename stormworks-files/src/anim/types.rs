use stormworks_files_derive_parseable::Parse;

use crate::common::types::{Aabb, SwColor, SwMatrix3, SwQuaternion, SwVec2, SwVec3};
use crate::mesh::types::{BoneWeights, MeshDocument, Shader, SubMesh, Vertex};

pub const ANIM_MAGIC: &[u8; 4] = b"anim";
pub const ANIM_VERSION: u32 = 1;
pub(crate) const ANIM_MESH_MARKER: u32 = 151;

/// position (12) + color (4) + uv (8) + normal (12) + bone indices and weights (16)
pub(crate) const ANIM_VERTEX_SIZE: usize = 52;
/// A triangle of u32 indices.
pub(crate) const ANIM_TRIANGLE_SIZE: usize = 12;
/// marker, shader, reserved, vertex and index buffer sizes
pub(crate) const ANIM_MESH_MIN_SIZE: usize = 4 + 4 + 2 + 4 + 4;
/// name length, rotation, translation, parent, child count
pub(crate) const BONE_MIN_SIZE: usize = 2 + 36 + 12 + 4 + 4;

#[derive(Debug, Copy, Clone, Parse)]
pub(crate) struct AnimVertexRecord {
    pub position: SwVec3,
    pub color: SwColor,
    pub uv: SwVec2,
    pub normal: SwVec3,
    /// bone index 0, bone index 1, weight 0, weight 1; the game stores the indices as floats as well.
    pub bones: [f32; 4],
}

impl From<AnimVertexRecord> for Vertex {
    fn from(record: AnimVertexRecord) -> Self {
        Vertex {
            position: record.position,
            color: record.color,
            normal: record.normal,
            uv: record.uv,
            bones: Some(BoneWeights {
                indices: [record.bones[0], record.bones[1]],
                weights: [record.bones[2], record.bones[3]],
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimMesh {
    pub shader: Shader,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    pub name: String,
    pub rotation: SwMatrix3,
    pub translation: SwVec3,
    /// -1 for root bones.
    pub parent: i32,
    pub children: Vec<u32>,
}

#[derive(Debug, Copy, Clone, PartialEq, Parse)]
pub struct BoneTransform {
    pub rotation: SwMatrix3,
    pub translation: SwVec3,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
    pub name: String,
    pub bone_transforms: Vec<BoneTransform>,
}

#[derive(Debug, Copy, Clone, PartialEq, Parse)]
pub struct TranslationKeyframe {
    pub timestamp: u16,
    pub translation: SwVec3,
}

#[derive(Debug, Copy, Clone, PartialEq, Parse)]
pub struct RotationKeyframe {
    pub timestamp: u16,
    pub rotation: SwQuaternion,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoneAnimation {
    pub bone: u32,
    pub translations: Vec<TranslationKeyframe>,
    pub rotations: Vec<RotationKeyframe>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    pub name: String,
    pub bones: Vec<BoneAnimation>,
}

/// Trailing per-file records of unknown purpose, kept so nothing is silently skipped.
#[derive(Debug, Copy, Clone, PartialEq, Parse)]
pub struct AuxRecord {
    pub tag: u32,
    pub m0: SwMatrix3,
    pub v0: SwVec3,
    pub p0: SwVec2,
    pub m1: SwMatrix3,
    pub m2: SwMatrix3,
    pub p1: SwVec2,
}

pub(crate) const AUX_RECORD_SIZE: usize = 4 + 36 + 12 + 8 + 36 + 36 + 8;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnimDocument {
    pub meshes: Vec<AnimMesh>,
    pub bones: Vec<Bone>,
    pub poses: Vec<Pose>,
    pub animations: Vec<Animation>,
    pub aux: Vec<AuxRecord>,
}

impl AnimDocument {
    /// All meshes merged into one vertex pool, one submesh per anim mesh.
    pub fn to_mesh_document(&self) -> MeshDocument {
        let mut document = MeshDocument::default();
        for mesh in &self.meshes {
            let base = document.vertices.len() as u32;
            let index_start = document.indices.len() as u32;
            document.vertices.extend_from_slice(&mesh.vertices);
            document.indices.extend(mesh.indices.iter().map(|&i| i + base));

            let bounds = Aabb::from_points(mesh.vertices.iter().map(|v| v.position)).unwrap_or_default();
            document.submeshes.push(SubMesh {
                index_start,
                index_count: mesh.indices.len() as u32,
                shader: mesh.shader,
                bounds,
                name: None,
                material_name: None,
            });
        }
        document
    }
}
