use glam::{Affine3A, Mat3A, Vec3, Vec3A};
use stormworks_files::CodecError;

use crate::scene::{MaterialSlot, PolyMesh, SceneObject};

/// One triangle of an exported object, in editor space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FlatTriangle {
    pub positions: [Vec3; 3],
    /// Normal of the polygon the triangle was cut from.
    pub normal: Vec3,
    pub material_index: usize,
}

/// An object's final, triangulated geometry.
#[derive(Debug, Clone)]
pub struct FlatMesh<'a> {
    pub object_name: &'a str,
    pub mesh_name: &'a str,
    pub triangles: Vec<FlatTriangle>,
    pub materials: &'a [Option<MaterialSlot>],
}

impl FlatMesh<'_> {
    pub fn material(&self, index: usize) -> Option<&MaterialSlot> {
        self.materials.get(index).and_then(Option::as_ref)
    }
}

pub enum MeshFlattener {}

impl MeshFlattener {
    /// Picks the object's export mesh, bakes its world transform if requested and fan triangulates every polygon.
    /// Returns `None` for objects without mesh data.
    pub fn flatten(
        object: &SceneObject,
        apply_transform: bool,
        apply_modifiers: bool,
    ) -> Result<Option<FlatMesh<'_>>, CodecError> {
        let Some(mesh) = object.export_mesh(apply_modifiers) else {
            return Ok(None);
        };

        let transform = if apply_transform {
            object.world_transform
        } else {
            Affine3A::IDENTITY
        };

        Ok(Some(FlatMesh {
            object_name: &object.name,
            mesh_name: &mesh.name,
            triangles: Self::triangulate(mesh, &transform)?,
            materials: &mesh.materials,
        }))
    }

    pub fn triangulate(mesh: &PolyMesh, transform: &Affine3A) -> Result<Vec<FlatTriangle>, CodecError> {
        let normal_matrix = normal_matrix(transform);
        let mut triangles = Vec::with_capacity(mesh.polygons.len());

        for (polygon_index, polygon) in mesh.polygons.iter().enumerate() {
            if polygon.vertices.len() < 3 {
                return Err(CodecError::unsupported(format!(
                    "polygon {} of mesh {} has only {} corners",
                    polygon_index,
                    mesh.name,
                    polygon.vertices.len()
                )));
            }

            let corners = polygon
                .vertices
                .iter()
                .map(|&i| {
                    mesh.positions.get(i as usize).copied().ok_or_else(|| {
                        CodecError::unsupported(format!(
                            "polygon {} of mesh {} references the missing vertex {}",
                            polygon_index, mesh.name, i
                        ))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            let normal = normal_matrix
                .mul_vec3a(newell_normal(&corners))
                .try_normalize()
                .map(Vec3::from)
                .unwrap_or(Vec3::Z);

            let world: Vec<Vec3> = corners.iter().map(|&c| transform.transform_point3(c)).collect();
            for i in 1..world.len() - 1 {
                triangles.push(FlatTriangle {
                    positions: [world[0], world[i], world[i + 1]],
                    normal,
                    material_index: polygon.material_index,
                });
            }
        }
        Ok(triangles)
    }
}

/// The inverse transpose of the linear part, falling back to the linear part itself when it is singular.
fn normal_matrix(transform: &Affine3A) -> Mat3A {
    let linear = transform.matrix3;
    if linear.determinant().abs() <= f32::EPSILON {
        return linear;
    }
    linear.inverse().transpose()
}

/// Area weighted normal of a possibly non-planar polygon.
fn newell_normal(corners: &[Vec3]) -> Vec3A {
    let mut normal = Vec3A::ZERO;
    for (i, current) in corners.iter().enumerate() {
        let next = corners[(i + 1) % corners.len()];
        normal.x += (current.y - next.y) * (current.z + next.z);
        normal.y += (current.z - next.z) * (current.x + next.x);
        normal.z += (current.x - next.x) * (current.y + next.y);
    }
    normal
}
