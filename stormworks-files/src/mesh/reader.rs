use std::collections::HashMap;

use byteorder::LittleEndian;
use glam::Vec3;
use log::{debug, trace};

use crate::common::policy::{Decoded, Strictness, Validator};
use crate::common::reader::{ByteReader, read_name};
use crate::common::types::{Aabb, SwColor, SwVec3};
use crate::mesh::types::{
    MESH_HEADER_FIELD, MESH_MAGIC, MESH_VERSION, MESH_VERTEX_LAYOUT, MESH_VERTEX_SIZE, MIN_NORMAL_LENGTH, MeshDocument,
    NORMAL_EPSILON, SUBMESH_MIN_SIZE, Shader, SubMesh, Vertex,
};
use crate::{CodecError, Violation};

pub struct MeshReader {}

impl MeshReader {
    pub fn parse_document(data: &[u8], strictness: Strictness) -> Result<Decoded<MeshDocument>, CodecError> {
        let mut rdr = ByteReader::new(data);
        let mut validator = Validator::new(strictness);
        let rdr = &mut rdr;

        rdr.read_magic(MESH_MAGIC)?;
        let version_offset = rdr.position();
        let version = rdr.read_u16::<LittleEndian>()?;
        if version != MESH_VERSION {
            return Err(CodecError::BadMagicOrVersion(Violation::at(
                version_offset,
                format!("unsupported mesh version {}, expected {}", version, MESH_VERSION),
            )));
        }

        let offset = rdr.position();
        validator.expect_value(offset, "header field", MESH_HEADER_FIELD, rdr.read_u16::<LittleEndian>()?)?;
        let vertex_count_offset = rdr.position();
        let vertex_count = rdr.read_u16::<LittleEndian>()? as usize;
        let offset = rdr.position();
        validator.expect_value(
            offset,
            "vertex layout marker",
            MESH_VERTEX_LAYOUT,
            rdr.read_u16::<LittleEndian>()?,
        )?;
        let offset = rdr.position();
        validator.expect_value(offset, "reserved header field", 0, rdr.read_u16::<LittleEndian>()?)?;

        rdr.check_count(vertex_count_offset, vertex_count, MESH_VERTEX_SIZE)?;
        let mut vertices = Vec::with_capacity(vertex_count);
        for _ in 0..vertex_count {
            vertices.push(Self::read_vertex(rdr, &mut validator)?);
        }
        trace!("Read {} vertices", vertices.len());

        let index_count_offset = rdr.position();
        let index_count = rdr.read_u32::<LittleEndian>()? as usize;
        rdr.check_count(index_count_offset, index_count, 2)?;
        let mut indices = Vec::with_capacity(index_count);
        for _ in 0..index_count {
            let offset = rdr.position();
            let index = rdr.read_u16::<LittleEndian>()?;
            if index as usize >= vertex_count {
                return Err(CodecError::IndexOutOfBounds(Violation::at(
                    offset,
                    format!("index {} is out of the range [0, {})", index, vertex_count),
                )));
            }
            indices.push(index as u32);
        }
        if index_count % 3 != 0 {
            validator.violation(
                index_count_offset,
                format!("index count {} is not a multiple of 3", index_count),
            )?;
            indices.truncate(index_count - index_count % 3);
        }

        let submesh_count_offset = rdr.position();
        let submesh_count = rdr.read_u16::<LittleEndian>()? as usize;
        rdr.check_count(submesh_count_offset, submesh_count, SUBMESH_MIN_SIZE)?;
        let mut submeshes = Vec::with_capacity(submesh_count);
        for _ in 0..submesh_count {
            submeshes.push(Self::read_submesh(rdr, &mut validator, index_count, &vertices, &indices)?);
        }

        let offset = rdr.position();
        validator.expect_value(offset, "tail marker", 0, rdr.read_u16::<LittleEndian>()?)?;
        if !rdr.is_at_end() {
            let offset = rdr.position();
            validator.violation(offset, format!("{} trailing bytes after the tail marker", rdr.remaining()))?;
        }

        let mut document = MeshDocument {
            name: None,
            vertices,
            indices,
            submeshes,
        };

        Self::check_duplicate_vertices(&document, &mut validator)?;
        Self::check_unreferenced_vertices(&mut document, &mut validator)?;
        document.name = Self::common_name(&document.submeshes);

        debug!(
            "Decoded mesh with {} vertices, {} triangles and {} submeshes",
            document.vertices.len(),
            document.triangle_count(),
            document.submeshes.len()
        );
        Ok(validator.finish(document))
    }

    fn read_vertex(rdr: &mut ByteReader<'_>, validator: &mut Validator) -> Result<Vertex, CodecError> {
        let offset = rdr.position();
        let position: SwVec3 = rdr.parse()?;
        let color: SwColor = rdr.parse()?;
        let normal: SwVec3 = rdr.parse()?;
        let mut vertex = Vertex::new(position, color, normal);
        validate_vertex(&mut vertex, offset, validator)?;
        Ok(vertex)
    }

    fn read_submesh(
        rdr: &mut ByteReader<'_>,
        validator: &mut Validator,
        index_count: usize,
        vertices: &[Vertex],
        indices: &[u32],
    ) -> Result<SubMesh, CodecError> {
        let submesh_offset = rdr.position();
        let index_start = rdr.read_u32::<LittleEndian>()?;
        let index_length = rdr.read_u32::<LittleEndian>()?;
        if index_start as usize + index_length as usize > index_count {
            return Err(CodecError::IndexOutOfBounds(Violation::at(
                submesh_offset,
                format!(
                    "submesh range [{}, {}) exceeds the index buffer of length {}",
                    index_start,
                    index_start as u64 + index_length as u64,
                    index_count
                ),
            )));
        }

        let mut index_length = index_length;
        if index_length % 3 != 0 {
            validator.violation(
                submesh_offset + 4,
                format!("submesh length {} is not a multiple of 3", index_length),
            )?;
            index_length -= index_length % 3;
        }
        // The index buffer may have lost a partial trailing triangle.
        index_length = index_length.min((indices.len() as u32).saturating_sub(index_start));

        let offset = rdr.position();
        validator.expect_value(offset, "reserved submesh field", 0, rdr.read_u16::<LittleEndian>()?)?;

        let shader_offset = rdr.position();
        let shader_id = rdr.read_u16::<LittleEndian>()?;
        let shader = match Shader::try_from(shader_id) {
            Ok(shader) => shader,
            Err(_) => {
                validator.violation(
                    shader_offset,
                    format!("unexpected shader id {}, expected a value between 0 and 3", shader_id),
                )?;
                Shader::Opaque
            }
        };

        let bounds_offset = rdr.position();
        let mut bounds: Aabb = rdr.parse()?;
        if !bounds.is_valid() {
            validator.violation(bounds_offset, "submesh bounds are inverted or not finite")?;
            let range = index_start as usize..(index_start + index_length) as usize;
            bounds = Aabb::from_points(
                indices
                    .get(range)
                    .unwrap_or_default()
                    .iter()
                    .map(|&i| vertices[i as usize].position),
            )
            .unwrap_or_default();
        }

        let offset = rdr.position();
        validator.expect_value(offset, "reserved submesh field", 0, rdr.read_u16::<LittleEndian>()?)?;
        let name = read_name(rdr, validator)?;

        let offset = rdr.position();
        let scale: SwVec3 = rdr.parse()?;
        validator.expect_value(offset, "submesh scale marker", SwVec3::ONE, scale)?;

        Ok(SubMesh {
            index_start,
            index_count: index_length,
            shader,
            bounds,
            name: Some(name).filter(|name| !name.is_empty()),
            material_name: None,
        })
    }

    /// The exporter deduplicates vertices, so a file with bitwise identical vertices was not written by it.
    fn check_duplicate_vertices(document: &MeshDocument, validator: &mut Validator) -> Result<(), CodecError> {
        let mut seen = HashMap::with_capacity(document.vertices.len());
        for (i, vertex) in document.vertices.iter().enumerate() {
            if let Some(first) = seen.insert(vertex.key(), i) {
                validator.violation(
                    vertex_offset(i),
                    format!("vertex {} duplicates vertex {}", i, first),
                )?;
            }
        }
        Ok(())
    }

    fn check_unreferenced_vertices(document: &mut MeshDocument, validator: &mut Validator) -> Result<(), CodecError> {
        let mut referenced = vec![false; document.vertices.len()];
        for &index in &document.indices {
            referenced[index as usize] = true;
        }
        let unreferenced = referenced.iter().filter(|&&used| !used).count();
        if unreferenced == 0 {
            return Ok(());
        }

        let first = referenced.iter().position(|&used| !used).unwrap_or_default();
        validator.violation(
            vertex_offset(first),
            format!("{} vertices are not referenced by any triangle", unreferenced),
        )?;

        // Lenient: drop them and compact the index buffer.
        let mut remap = vec![0u32; document.vertices.len()];
        let mut kept = Vec::with_capacity(document.vertices.len() - unreferenced);
        for (i, vertex) in document.vertices.iter().enumerate() {
            if referenced[i] {
                remap[i] = kept.len() as u32;
                kept.push(*vertex);
            }
        }
        for index in &mut document.indices {
            *index = remap[*index as usize];
        }
        document.vertices = kept;
        Ok(())
    }

    fn common_name(submeshes: &[SubMesh]) -> Option<String> {
        let first = submeshes.first()?.name.as_ref()?;
        submeshes
            .iter()
            .all(|submesh| submesh.name.as_ref() == Some(first))
            .then(|| first.clone())
    }
}

/// Offset of vertex `i` in a `.mesh` file, for diagnostics raised after the vertex pool was read.
fn vertex_offset(i: usize) -> usize {
    14 + i * MESH_VERTEX_SIZE
}

/// Normal and texture coordinate sanity checks shared by every vertex carrying format.
pub(crate) fn validate_vertex(vertex: &mut Vertex, offset: usize, validator: &mut Validator) -> Result<(), CodecError> {
    let normal = Vec3::from(vertex.normal);
    if !normal.is_finite() || (normal.length() - 1.0).abs() > NORMAL_EPSILON {
        validator.violation(
            offset,
            format!(
                "vertex normal ({}, {}, {}) is not unit length",
                vertex.normal.x, vertex.normal.y, vertex.normal.z
            ),
        )?;
        vertex.normal = match normal.try_normalize() {
            Some(unit) if normal.length() >= MIN_NORMAL_LENGTH => unit.into(),
            _ => SwVec3::UP,
        };
    }

    let uv = vertex.uv;
    let sane = |v: f32| v.is_finite() && (0.0..=1.0).contains(&v);
    if !sane(uv.x) || !sane(uv.y) {
        validator.violation(
            offset,
            format!("texture coordinate ({}, {}) is outside [0, 1]", uv.x, uv.y),
        )?;
        let clamp = |v: f32| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
        vertex.uv.x = clamp(uv.x);
        vertex.uv.y = clamp(uv.y);
    }
    Ok(())
}
