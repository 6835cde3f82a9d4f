use byteorder::LittleEndian;
use glam::Vec3;
use log::debug;

use crate::common::types::SwVec3;
use crate::common::writer::ByteWriter;
use crate::mesh::types::{
    MESH_HEADER_FIELD, MESH_MAGIC, MESH_VERSION, MESH_VERTEX_LAYOUT, MESH_VERTEX_SIZE, MeshDocument, NORMAL_EPSILON,
    NameSelection, SubMesh,
};
use crate::{CodecError, Violation};

pub struct MeshWriter {}

impl MeshWriter {
    /// Serializes `document`, embedding the name `names` selects into every submesh. The output only depends on the
    /// arguments, so encoding the same document twice yields identical bytes.
    pub fn write_document(document: &MeshDocument, names: &NameSelection) -> Result<Vec<u8>, CodecError> {
        Self::validate(document)?;

        let mut w = ByteWriter::with_capacity(
            16 + document.vertices.len() * MESH_VERTEX_SIZE + 4 + document.indices.len() * 2,
        );
        w.write_bytes(MESH_MAGIC);
        w.write_u16::<LittleEndian>(MESH_VERSION);
        w.write_u16::<LittleEndian>(MESH_HEADER_FIELD);
        w.write_count_u16::<LittleEndian>(document.vertices.len(), "vertices")?;
        w.write_u16::<LittleEndian>(MESH_VERTEX_LAYOUT);
        w.write_u16::<LittleEndian>(0);

        for vertex in &document.vertices {
            w.emit(&vertex.position);
            w.emit(&vertex.color);
            w.emit(&vertex.normal);
        }

        w.write_count_u32::<LittleEndian>(document.indices.len(), "indices")?;
        for &index in &document.indices {
            // validate() guarantees every index addresses one of at most u16::MAX vertices.
            w.write_u16::<LittleEndian>(index as u16);
        }

        w.write_count_u16::<LittleEndian>(document.submeshes.len(), "submeshes")?;
        for submesh in &document.submeshes {
            Self::write_submesh(&mut w, document, submesh, names)?;
        }
        w.write_u16::<LittleEndian>(0);

        debug!(
            "Encoded mesh with {} vertices and {} submeshes into {} bytes",
            document.vertices.len(),
            document.submeshes.len(),
            w.position()
        );
        Ok(w.into_inner())
    }

    fn write_submesh(
        w: &mut ByteWriter,
        document: &MeshDocument,
        submesh: &SubMesh,
        names: &NameSelection,
    ) -> Result<(), CodecError> {
        w.write_u32::<LittleEndian>(submesh.index_start);
        w.write_u32::<LittleEndian>(submesh.index_count);
        w.write_u16::<LittleEndian>(0);
        w.write_u16::<LittleEndian>(submesh.shader.into());
        w.emit(&submesh.bounds);
        w.write_u16::<LittleEndian>(0);
        let name = names.resolve(document, submesh);
        w.write_prefixed_bytes::<LittleEndian>(name.as_bytes(), "name bytes")?;
        w.emit(&SwVec3::ONE);
        Ok(())
    }

    /// Everything that would make the written file unreadable or different from the document.
    fn validate(document: &MeshDocument) -> Result<(), CodecError> {
        let vertex_count = document.vertices.len();
        if vertex_count > u16::MAX as usize {
            return Err(CodecError::unsupported(format!(
                "{} vertices exceed the format limit of {}",
                vertex_count,
                u16::MAX
            )));
        }

        if document.indices.len() % 3 != 0 {
            return Err(CodecError::unsupported(format!(
                "index count {} is not a multiple of 3, the geometry was not triangulated",
                document.indices.len()
            )));
        }

        if let Some((position, index)) = document
            .indices
            .iter()
            .enumerate()
            .find(|&(_, &index)| index as usize >= vertex_count)
        {
            return Err(CodecError::IndexOutOfBounds(Violation::unplaced(format!(
                "index {} at position {} is out of the range [0, {})",
                index, position, vertex_count
            ))));
        }

        for (i, vertex) in document.vertices.iter().enumerate() {
            let length = Vec3::from(vertex.normal).length();
            if !length.is_finite() || (length - 1.0).abs() > NORMAL_EPSILON {
                return Err(CodecError::unsupported(format!(
                    "vertex {} has a normal of length {}, which is not unit length",
                    i, length
                )));
            }
        }

        for (i, submesh) in document.submeshes.iter().enumerate() {
            if submesh.index_count % 3 != 0 {
                return Err(CodecError::unsupported(format!(
                    "submesh {} spans {} indices, which is not a multiple of 3",
                    i, submesh.index_count
                )));
            }
            if document.submesh_indices(submesh).is_none() {
                return Err(CodecError::IndexOutOfBounds(Violation::unplaced(format!(
                    "submesh {} range {:?} exceeds the index buffer of length {}",
                    i,
                    submesh.index_range(),
                    document.indices.len()
                ))));
            }
        }
        Ok(())
    }
}
