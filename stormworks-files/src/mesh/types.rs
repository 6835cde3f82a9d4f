use std::fmt::{Display, Formatter};
use std::io::Write;
use std::ops::Range;
use std::str::FromStr;

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::CodecError;
use crate::common::types::{Aabb, SwColor, SwVec2, SwVec3};

pub const MESH_MAGIC: &[u8; 4] = b"mesh";
pub const MESH_VERSION: u16 = 7;
pub(crate) const MESH_HEADER_FIELD: u16 = 1;
pub(crate) const MESH_VERTEX_LAYOUT: u16 = 19;

/// position (12) + color (4) + normal (12)
pub(crate) const MESH_VERTEX_SIZE: usize = 28;
/// start, length, reserved, shader, bounds, reserved, name length, scale marker; without the name bytes.
pub(crate) const SUBMESH_MIN_SIZE: usize = 4 + 4 + 2 + 2 + 24 + 2 + 2 + 12;

pub const NORMAL_EPSILON: f32 = 1e-3;
/// Shorter normals have no usable direction and are replaced by up.
pub const MIN_NORMAL_LENGTH: f32 = 1e-6;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, IntoPrimitive, TryFromPrimitive)]
#[repr(u16)]
pub enum Shader {
    #[default]
    Opaque = 0,
    Glass = 1,
    Additive = 2,
    Lava = 3,
}

impl Shader {
    pub const ALL: [Shader; 4] = [Shader::Opaque, Shader::Glass, Shader::Additive, Shader::Lava];

    /// The editor material names the game's special shaders are recognized by.
    pub fn material_name(self) -> Option<&'static str> {
        match self {
            Shader::Opaque => None,
            Shader::Glass => Some("MATERIALglass"),
            Shader::Additive => Some("MATERIALadditive"),
            Shader::Lava => Some("MATERIALlava"),
        }
    }

    pub fn from_material_name(name: &str) -> Shader {
        Shader::ALL
            .into_iter()
            .find(|shader| shader.material_name() == Some(name))
            .unwrap_or_default()
    }

    /// Vertex color used when the material doesn't define its own.
    pub fn default_color(self) -> SwColor {
        match self {
            Shader::Opaque => SwColor::new(153, 153, 153, 255),
            Shader::Glass => SwColor::new(160, 160, 199, 128),
            Shader::Additive => SwColor::new(255, 255, 0, 255),
            Shader::Lava => SwColor::new(149, 149, 149, 255),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct BoneWeights {
    pub indices: [f32; 2],
    pub weights: [f32; 2],
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Vertex {
    pub position: SwVec3,
    pub color: SwColor,
    pub normal: SwVec3,
    /// Only animated meshes carry texture coordinates; `.mesh` files leave this at zero.
    pub uv: SwVec2,
    pub bones: Option<BoneWeights>,
}

/// Bitwise identity of the fields a `.mesh` vertex stores, used to find duplicates.
pub type VertexKey = [u32; 7];

impl Vertex {
    pub fn new(position: SwVec3, color: SwColor, normal: SwVec3) -> Self {
        Vertex {
            position,
            color,
            normal,
            uv: SwVec2::ZERO,
            bones: None,
        }
    }

    pub fn key(&self) -> VertexKey {
        [
            self.position.x.to_bits(),
            self.position.y.to_bits(),
            self.position.z.to_bits(),
            self.color.to_bits(),
            self.normal.x.to_bits(),
            self.normal.y.to_bits(),
            self.normal.z.to_bits(),
        ]
    }
}

/// A contiguous run of the index buffer drawn with one shader.
#[derive(Debug, Clone, PartialEq)]
pub struct SubMesh {
    pub index_start: u32,
    pub index_count: u32,
    pub shader: Shader,
    pub bounds: Aabb,
    /// The name stored in the file. Encoding ignores it and embeds whatever the `NameMode` selects.
    pub name: Option<String>,
    /// Editor material the submesh was built from. Not stored in the file.
    pub material_name: Option<String>,
}

impl SubMesh {
    pub fn index_range(&self) -> Range<usize> {
        let start = self.index_start as usize;
        start..start + self.index_count as usize
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshDocument {
    pub name: Option<String>,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub submeshes: Vec<SubMesh>,
}

impl MeshDocument {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// The index slice of a submesh, or `None` when its range lies outside the index buffer.
    pub fn submesh_indices(&self, submesh: &SubMesh) -> Option<&[u32]> {
        self.indices.get(submesh.index_range())
    }

    /// Bounds of the vertices referenced by `indices`.
    pub fn bounds_of(&self, indices: &[u32]) -> Option<Aabb> {
        Aabb::from_points(
            indices
                .iter()
                .filter_map(|&i| self.vertices.get(i as usize))
                .map(|v| v.position),
        )
    }

    pub fn dump_to_wavefront_obj<W: Write>(&self, w: &mut W) -> Result<(), CodecError> {
        writeln!(w, "o {}", self.name.as_deref().unwrap_or("mesh"))?;
        for vert in &self.vertices {
            writeln!(w, "v {} {} {}", vert.position.x, vert.position.y, vert.position.z)?;
            writeln!(w, "vn {} {} {}", vert.normal.x, vert.normal.y, vert.normal.z)?;
        }
        for (i, submesh) in self.submeshes.iter().enumerate() {
            // g for groups/submeshes.
            match &submesh.name {
                Some(name) => writeln!(w, "g {}_{}", i, name)?,
                None => writeln!(w, "g {}", i)?,
            }
            writeln!(w, "usemtl {:?}", submesh.shader)?;
            for tri in self.submesh_indices(submesh).unwrap_or_default().chunks_exact(3) {
                // indexes are 1-based and here we specify the same index for vert and normal.
                writeln!(
                    w,
                    "f {}//{} {}//{} {}//{}",
                    tri[0] + 1,
                    tri[0] + 1,
                    tri[1] + 1,
                    tri[1] + 1,
                    tri[2] + 1,
                    tri[2] + 1
                )?;
            }
        }
        Ok(())
    }
}

/// Where the name embedded into each submesh of an exported `.mesh` comes from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum NameMode {
    /// The document's own (mesh data) name.
    Mesh,
    /// The owning object's name, supplied by the caller.
    Object,
    /// Each submesh's material name.
    Material,
    #[default]
    None,
}

impl FromStr for NameMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "MESH" => Ok(NameMode::Mesh),
            "OBJECT" => Ok(NameMode::Object),
            "MATERIAL" => Ok(NameMode::Material),
            "NONE" => Ok(NameMode::None),
            _ => Err(format!(
                "Unknown name mode {}, expected one of MESH, OBJECT, MATERIAL, NONE",
                s
            )),
        }
    }
}

impl Display for NameMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            NameMode::Mesh => "MESH",
            NameMode::Object => "OBJECT",
            NameMode::Material => "MATERIAL",
            NameMode::None => "NONE",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Copy, Clone, Default)]
pub struct NameSelection<'a> {
    pub mode: NameMode,
    pub object_name: Option<&'a str>,
}

impl<'a> NameSelection<'a> {
    pub fn new(mode: NameMode, object_name: Option<&'a str>) -> Self {
        NameSelection { mode, object_name }
    }

    pub fn resolve(&self, document: &MeshDocument, submesh: &SubMesh) -> String {
        let name = match self.mode {
            NameMode::Mesh => document.name.as_deref(),
            NameMode::Object => self.object_name,
            NameMode::Material => submesh
                .material_name
                .as_deref()
                .or_else(|| submesh.shader.material_name()),
            NameMode::None => None,
        };
        name.unwrap_or_default().to_owned()
    }
}
