use byteorder::LittleEndian;
use glam::Vec3;
use log::{debug, trace};

use crate::common::types::SwVec3;
use crate::common::writer::ByteWriter;
use crate::phys::grid::GridKey;
use crate::phys::types::{
    CollisionPrimitive, MAX_COMPOUND_DEPTH, PHYS_MAGIC, PHYS_VERSION, PhysDocument, PrimitiveShape, ROTATION_EPSILON,
    ShapeMesh, Transform,
};
use crate::{CodecError, Violation};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PhysEncodeOptions {
    /// Write one sub physics mesh per 128m grid cell. Otherwise everything goes into a single sub-mesh.
    pub divide_grid: bool,
}

impl Default for PhysEncodeOptions {
    fn default() -> Self {
        PhysEncodeOptions { divide_grid: true }
    }
}

pub struct PhysWriter {}

impl PhysWriter {
    /// Cell membership is always recomputed from the world space primitives, whatever partitioning `document`
    /// currently has. Every cell is written as one sub physics mesh of world space vertices, in ascending key
    /// order. Boxes and compounds are triangulated, since the format only holds triangles.
    pub fn write_document(document: &PhysDocument, options: &PhysEncodeOptions) -> Result<Vec<u8>, CodecError> {
        let document = document.regrid(options.divide_grid)?;

        let mut w = ByteWriter::new();
        w.write_bytes(PHYS_MAGIC);
        w.write_u16::<LittleEndian>(PHYS_VERSION);
        w.write_count_u16::<LittleEndian>(document.cells.len(), "sub physics meshes")?;

        for (key, primitives) in &document.cells {
            for primitive in primitives {
                Self::validate_primitive(primitive, 1)?;
            }
            let mesh = Self::cell_mesh(*key, primitives)?;
            trace!(
                "Writing cell {:?} with {} vertices and {} indices",
                key,
                mesh.vertices.len(),
                mesh.indices.len()
            );
            Self::write_sub_mesh(&mut w, &mesh)?;
        }

        debug!(
            "Encoded phys with {} primitives in {} sub-meshes into {} bytes",
            document.primitive_count(),
            document.cells.len(),
            w.position()
        );
        Ok(w.into_inner())
    }

    fn validate_primitive(primitive: &CollisionPrimitive, depth: usize) -> Result<(), CodecError> {
        let rotation = primitive.transform.rotation;
        let length = rotation.length();
        if !rotation.is_finite() || (length - 1.0).abs() > ROTATION_EPSILON {
            return Err(CodecError::unsupported(format!(
                "rotation quaternion of length {} is not normalized",
                length
            )));
        }
        if !primitive.transform.position.is_finite() {
            return Err(CodecError::unsupported("primitive position is not finite"));
        }

        match &primitive.shape {
            PrimitiveShape::Box { half_extents } => {
                if !half_extents.is_finite() || half_extents.cmplt(Vec3::ZERO).any() {
                    return Err(CodecError::unsupported("box half extents must be finite and positive"));
                }
            }
            PrimitiveShape::Mesh(mesh) => {
                let vertex_count = mesh.vertices.len();
                if mesh.indices.len() % 3 != 0 || (mesh.is_triangle_soup() && vertex_count % 3 != 0) {
                    return Err(CodecError::unsupported(format!(
                        "mesh with {} vertices and {} indices doesn't consist of whole triangles",
                        vertex_count,
                        mesh.indices.len()
                    )));
                }
                if let Some(index) = mesh.indices.iter().find(|&&index| index as usize >= vertex_count) {
                    return Err(CodecError::IndexOutOfBounds(Violation::unplaced(format!(
                        "index {} is out of the range [0, {})",
                        index, vertex_count
                    ))));
                }
                if mesh.vertices.iter().any(|v| !v.is_finite()) {
                    return Err(CodecError::unsupported("mesh vertices must be finite"));
                }
            }
            PrimitiveShape::Compound(children) => {
                if depth >= MAX_COMPOUND_DEPTH {
                    return Err(CodecError::unsupported(format!(
                        "compounds are nested deeper than {} levels",
                        MAX_COMPOUND_DEPTH
                    )));
                }
                for child in children {
                    Self::validate_primitive(child, depth + 1)?;
                }
            }
        }
        Ok(())
    }

    /// The world space geometry of a whole cell. Indexed meshes keep their indices, everything else is appended
    /// as separate triangles. A cell without indexed meshes stays a triangle soup.
    fn cell_mesh(key: GridKey, primitives: &[CollisionPrimitive]) -> Result<ShapeMesh, CodecError> {
        let cell = Transform::from_position(key.origin());
        let mut mesh = ShapeMesh::default();
        let mut indexed = false;

        for primitive in primitives {
            let base = Self::vertex_base(mesh.vertices.len())?;
            match &primitive.shape {
                PrimitiveShape::Mesh(shape) if !shape.is_triangle_soup() => {
                    let transform = cell.compose(&primitive.transform);
                    mesh.vertices.extend(shape.vertices.iter().map(|&v| transform.apply(v)));
                    mesh.indices.extend(shape.indices.iter().map(|&index| base + index));
                    indexed = true;
                }
                _ => {
                    let triangles = primitive.translated(key.origin()).triangles();
                    mesh.vertices.extend(triangles.iter().flatten());
                    mesh.indices.extend(base..base + triangles.len() as u32 * 3);
                }
            }
        }

        if !indexed {
            mesh.indices.clear();
        }
        Ok(mesh)
    }

    fn vertex_base(count: usize) -> Result<u32, CodecError> {
        u32::try_from(count).map_err(|_| CodecError::unsupported(format!("{} vertices in one grid cell", count)))
    }

    fn write_sub_mesh(w: &mut ByteWriter, mesh: &ShapeMesh) -> Result<(), CodecError> {
        w.write_count_u16::<LittleEndian>(mesh.vertices.len(), "vertices in one sub physics mesh")?;
        for &vertex in &mesh.vertices {
            w.emit(&SwVec3::from(vertex));
        }
        w.write_count_u16::<LittleEndian>(mesh.indices.len(), "indices in one sub physics mesh")?;
        for &index in &mesh.indices {
            w.write_u32::<LittleEndian>(index);
        }
        Ok(())
    }
}
