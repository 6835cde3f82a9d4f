use std::collections::BTreeMap;
use std::io::Write;

use glam::{Quat, Vec3};

use crate::CodecError;
use crate::common::types::Aabb;
use crate::phys::grid::{self, GridKey};

pub const PHYS_MAGIC: &[u8; 4] = b"phys";
pub const PHYS_VERSION: u16 = 2;

/// Compounds may contain compounds, but no deeper than this.
pub const MAX_COMPOUND_DEPTH: usize = 8;

/// vertex count + index count, for an empty sub-mesh.
pub(crate) const SUB_MESH_MIN_SIZE: usize = 2 + 2;

pub const ROTATION_EPSILON: f32 = 1e-3;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Transform::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn from_position(position: Vec3) -> Self {
        Transform {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    /// Expresses `child`, given relative to `self`, in the space `self` is relative to.
    pub fn compose(&self, child: &Transform) -> Transform {
        Transform {
            position: self.apply(child.position),
            rotation: self.rotation * child.rotation,
        }
    }

    pub fn apply(&self, point: Vec3) -> Vec3 {
        self.position + self.rotation * point
    }
}

/// Triangle geometry of a mesh primitive, in the primitive's local space.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShapeMesh {
    pub vertices: Vec<Vec3>,
    /// Empty for a triangle soup, where every three consecutive vertices form a triangle.
    pub indices: Vec<u32>,
}

impl ShapeMesh {
    pub fn triangle_soup(vertices: Vec<Vec3>) -> Self {
        ShapeMesh {
            vertices,
            indices: Vec::new(),
        }
    }

    pub fn is_triangle_soup(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn triangles(&self) -> Vec<[Vec3; 3]> {
        if self.is_triangle_soup() {
            return self
                .vertices
                .chunks_exact(3)
                .map(|tri| [tri[0], tri[1], tri[2]])
                .collect();
        }

        self.indices
            .chunks_exact(3)
            .filter_map(|tri| {
                Some([
                    *self.vertices.get(tri[0] as usize)?,
                    *self.vertices.get(tri[1] as usize)?,
                    *self.vertices.get(tri[2] as usize)?,
                ])
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveShape {
    Box { half_extents: Vec3 },
    Mesh(ShapeMesh),
    /// Children are positioned relative to the compound.
    Compound(Vec<CollisionPrimitive>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollisionPrimitive {
    pub transform: Transform,
    pub shape: PrimitiveShape,
}

impl CollisionPrimitive {
    pub fn new(transform: Transform, shape: PrimitiveShape) -> Self {
        CollisionPrimitive { transform, shape }
    }

    /// Positions a world space mesh at the center of its triangle centroids, with vertices relative to that point.
    /// `None` when the mesh has no complete triangle.
    ///
    /// The file format only stores world space vertices, so this is how a decoded sub-mesh gets the position that
    /// decides its grid cell.
    pub fn anchored(mesh: ShapeMesh) -> Option<CollisionPrimitive> {
        let centroids = mesh.triangles().into_iter().map(|[a, b, c]| (a + b + c) / 3.0);
        let anchor = Aabb::from_points(centroids)?.center();
        let vertices = mesh.vertices.iter().map(|&v| v - anchor).collect();
        Some(CollisionPrimitive::new(
            Transform::from_position(anchor),
            PrimitiveShape::Mesh(ShapeMesh {
                vertices,
                indices: mesh.indices,
            }),
        ))
    }

    /// The same primitive, moved by `offset`.
    pub fn translated(&self, offset: Vec3) -> CollisionPrimitive {
        let mut primitive = self.clone();
        primitive.transform.position += offset;
        primitive
    }

    /// Number of primitive levels, 1 for anything that is not a compound.
    pub fn depth(&self) -> usize {
        match &self.shape {
            PrimitiveShape::Compound(children) => 1 + children.iter().map(|c| c.depth()).max().unwrap_or(0),
            _ => 1,
        }
    }

    /// Triangles in the space the primitive's transform is relative to. Boxes are expanded into 12 triangles and
    /// compounds are flattened.
    pub fn triangles(&self) -> Vec<[Vec3; 3]> {
        let mut triangles = Vec::new();
        self.collect_triangles(&Transform::IDENTITY, &mut triangles);
        triangles
    }

    fn collect_triangles(&self, parent: &Transform, triangles: &mut Vec<[Vec3; 3]>) {
        let transform = parent.compose(&self.transform);
        let local = match &self.shape {
            PrimitiveShape::Box { half_extents } => box_triangles(*half_extents).to_vec(),
            PrimitiveShape::Mesh(mesh) => mesh.triangles(),
            PrimitiveShape::Compound(children) => {
                for child in children {
                    child.collect_triangles(&transform, triangles);
                }
                return;
            }
        };
        triangles.extend(local.into_iter().map(|tri| tri.map(|v| transform.apply(v))));
    }
}

/// Corner `i` has the positive extent on x for bit 0, y for bit 1 and z for bit 2.
pub fn box_corners(half_extents: Vec3) -> [Vec3; 8] {
    std::array::from_fn(|i| {
        let sign = |bit: usize| if i & (1 << bit) != 0 { 1.0 } else { -1.0 };
        half_extents * Vec3::new(sign(0), sign(1), sign(2))
    })
}

pub fn box_triangles(half_extents: Vec3) -> [[Vec3; 3]; 12] {
    const QUADS: [[usize; 4]; 6] = [
        [0, 4, 6, 2],
        [1, 3, 7, 5],
        [0, 1, 5, 4],
        [2, 6, 7, 3],
        [0, 2, 3, 1],
        [4, 5, 7, 6],
    ];
    let corners = box_corners(half_extents);
    std::array::from_fn(|i| {
        let quad = QUADS[i / 2];
        let (b, c) = if i % 2 == 0 { (1, 2) } else { (2, 3) };
        [corners[quad[0]], corners[quad[b]], corners[quad[c]]]
    })
}

/// In-memory `.phys` file: top level primitives grouped by the grid cell they sit in, with positions relative to the
/// cell origin.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PhysDocument {
    pub cells: BTreeMap<GridKey, Vec<CollisionPrimitive>>,
    /// World space bounds of every triangle, `None` when there are none.
    pub bounds: Option<Aabb>,
}

impl PhysDocument {
    /// Builds a document from primitives positioned in world space.
    pub fn from_primitives(primitives: Vec<CollisionPrimitive>, divide_grid: bool) -> Result<PhysDocument, CodecError> {
        let mut document = PhysDocument {
            cells: grid::partition(primitives, divide_grid)?,
            bounds: None,
        };
        document.bounds = document.compute_bounds();
        Ok(document)
    }

    /// Every primitive moved back to world space, in cell order.
    pub fn primitives(&self) -> Vec<CollisionPrimitive> {
        self.cells
            .iter()
            .flat_map(|(key, primitives)| primitives.iter().map(move |p| p.translated(key.origin())))
            .collect()
    }

    pub fn primitive_count(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }

    pub fn compute_bounds(&self) -> Option<Aabb> {
        Aabb::from_points(self.primitives().iter().flat_map(|p| p.triangles()).flatten())
    }

    /// The same world space primitives, partitioned anew.
    pub fn regrid(&self, divide_grid: bool) -> Result<PhysDocument, CodecError> {
        PhysDocument::from_primitives(self.primitives(), divide_grid)
    }

    /// One OBJ object per top level primitive, in world space.
    pub fn dump_to_wavefront_obj<W: Write>(&self, w: &mut W) -> Result<(), CodecError> {
        let mut vertex_base = 1;
        for (i, primitive) in self.primitives().iter().enumerate() {
            writeln!(w, "o primitive_{}", i)?;
            let triangles = primitive.triangles();
            for v in triangles.iter().flatten() {
                writeln!(w, "v {} {} {}", v.x, v.y, v.z)?;
            }
            for t in 0..triangles.len() {
                let first = vertex_base + t * 3;
                writeln!(w, "f {} {} {}", first, first + 1, first + 2)?;
            }
            vertex_base += triangles.len() * 3;
        }
        Ok(())
    }
}
