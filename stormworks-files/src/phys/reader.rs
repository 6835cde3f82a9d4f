use byteorder::LittleEndian;
use glam::Vec3;
use log::{debug, trace};

use crate::common::policy::{Decoded, Strictness, Validator};
use crate::common::reader::ByteReader;
use crate::common::types::SwVec3;
use crate::phys::types::{CollisionPrimitive, PHYS_MAGIC, PHYS_VERSION, PhysDocument, SUB_MESH_MIN_SIZE, ShapeMesh};
use crate::{CodecError, Violation};

pub struct PhysReader {}

impl PhysReader {
    /// Every sub physics mesh becomes one mesh primitive, filed into the grid cell its triangle centroids center
    /// on. Several sub-meshes may end up in the same cell.
    pub fn parse_document(data: &[u8], strictness: Strictness) -> Result<Decoded<PhysDocument>, CodecError> {
        let mut rdr = ByteReader::new(data);
        let mut validator = Validator::new(strictness);
        let rdr = &mut rdr;

        rdr.read_magic(PHYS_MAGIC)?;
        let version_offset = rdr.position();
        let version = rdr.read_u16::<LittleEndian>()?;
        if version != PHYS_VERSION {
            return Err(CodecError::BadMagicOrVersion(Violation::at(
                version_offset,
                format!("unsupported phys version {}, expected {}", version, PHYS_VERSION),
            )));
        }

        let count_offset = rdr.position();
        let sub_mesh_count = rdr.read_u16::<LittleEndian>()? as usize;
        rdr.check_count(count_offset, sub_mesh_count, SUB_MESH_MIN_SIZE)?;

        let mut primitives = Vec::with_capacity(sub_mesh_count);
        for i in 0..sub_mesh_count {
            let mesh = Self::read_sub_mesh(rdr, &mut validator)?;
            match CollisionPrimitive::anchored(mesh) {
                Some(primitive) => primitives.push(primitive),
                None => trace!("Sub physics mesh {} has no triangles, skipping it", i),
            }
        }

        if !rdr.is_at_end() {
            let offset = rdr.position();
            validator.violation(
                offset,
                format!("{} trailing bytes after the last sub physics mesh", rdr.remaining()),
            )?;
        }

        let document = PhysDocument::from_primitives(primitives, true)?;
        debug!(
            "Decoded phys with {} sub-meshes into {} primitives in {} cells",
            sub_mesh_count,
            document.primitive_count(),
            document.cells.len()
        );
        Ok(validator.finish(document))
    }

    /// u16 vertex count, vertices, u16 index count, u32 indices. No indices means a triangle soup.
    fn read_sub_mesh(rdr: &mut ByteReader<'_>, validator: &mut Validator) -> Result<ShapeMesh, CodecError> {
        let vertex_count_offset = rdr.position();
        let vertex_count = rdr.read_u16::<LittleEndian>()? as usize;
        let vertices: Vec<SwVec3> = rdr.read_vec(vertex_count_offset, vertex_count, 12)?;
        let mut vertices: Vec<Vec3> = vertices.into_iter().map(Vec3::from).collect();

        let index_count_offset = rdr.position();
        let index_count = rdr.read_u16::<LittleEndian>()? as usize;
        rdr.check_count(index_count_offset, index_count, 4)?;
        let mut indices = Vec::with_capacity(index_count);
        for _ in 0..index_count {
            let offset = rdr.position();
            let index = rdr.read_u32::<LittleEndian>()?;
            if index as usize >= vertex_count {
                return Err(CodecError::IndexOutOfBounds(Violation::at(
                    offset,
                    format!("index {} is out of the range [0, {})", index, vertex_count),
                )));
            }
            indices.push(index);
        }

        if index_count % 3 != 0 {
            validator.violation(
                index_count_offset,
                format!("index count {} is not a multiple of 3", index_count),
            )?;
            indices.truncate(index_count - index_count % 3);
        } else if index_count == 0 && vertex_count % 3 != 0 {
            validator.violation(
                vertex_count_offset,
                format!("triangle soup with {} vertices is not a multiple of 3", vertex_count),
            )?;
            vertices.truncate(vertex_count - vertex_count % 3);
        }

        if let Some(bad) = vertices.iter().position(|v| !v.is_finite()) {
            validator.violation(
                vertex_count_offset + 2 + bad * 12,
                format!("vertex {} is not finite", bad),
            )?;
            Self::drop_non_finite_triangles(&mut vertices, &mut indices);
        }

        Ok(ShapeMesh { vertices, indices })
    }

    fn drop_non_finite_triangles(vertices: &mut Vec<Vec3>, indices: &mut Vec<u32>) {
        if indices.is_empty() {
            *vertices = vertices
                .chunks_exact(3)
                .filter(|tri| tri.iter().all(|v| v.is_finite()))
                .flatten()
                .copied()
                .collect();
            return;
        }

        *indices = indices
            .chunks_exact(3)
            .filter(|tri| tri.iter().all(|&index| vertices[index as usize].is_finite()))
            .flatten()
            .copied()
            .collect();
        // No triangle refers to them anymore.
        for vertex in vertices.iter_mut().filter(|v| !v.is_finite()) {
            *vertex = Vec3::ZERO;
        }
    }
}
