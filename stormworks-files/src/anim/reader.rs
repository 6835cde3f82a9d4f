use byteorder::LittleEndian;
use log::{debug, trace};

use crate::anim::types::{
    ANIM_MAGIC, ANIM_MESH_MARKER, ANIM_MESH_MIN_SIZE, ANIM_TRIANGLE_SIZE, ANIM_VERSION, ANIM_VERTEX_SIZE,
    AUX_RECORD_SIZE, AnimDocument, AnimMesh, AnimVertexRecord, Animation, BONE_MIN_SIZE, Bone, BoneAnimation, Pose,
};
use crate::common::policy::{Decoded, Strictness, Validator};
use crate::common::reader::{ByteReader, read_name};
use crate::mesh::reader::validate_vertex;
use crate::mesh::types::{Shader, Vertex};
use crate::{CodecError, Violation};

pub struct AnimReader {}

impl AnimReader {
    pub fn parse_document(data: &[u8], strictness: Strictness) -> Result<Decoded<AnimDocument>, CodecError> {
        let mut rdr = ByteReader::new(data);
        let mut validator = Validator::new(strictness);
        let rdr = &mut rdr;

        rdr.read_magic(ANIM_MAGIC)?;
        let version_offset = rdr.position();
        let version = rdr.read_u32::<LittleEndian>()?;
        if version != ANIM_VERSION {
            return Err(CodecError::BadMagicOrVersion(Violation::at(
                version_offset,
                format!("unsupported anim version {}, expected {}", version, ANIM_VERSION),
            )));
        }

        let mut document = AnimDocument::default();

        let count_offset = rdr.position();
        let mesh_count = rdr.read_u32::<LittleEndian>()? as usize;
        rdr.check_count(count_offset, mesh_count, ANIM_MESH_MIN_SIZE)?;
        for _ in 0..mesh_count {
            document.meshes.push(Self::read_mesh(rdr, &mut validator)?);
        }

        let count_offset = rdr.position();
        let bone_count = rdr.read_u32::<LittleEndian>()? as usize;
        rdr.check_count(count_offset, bone_count, BONE_MIN_SIZE)?;
        for _ in 0..bone_count {
            document.bones.push(Self::read_bone(rdr, &mut validator)?);
        }

        let count_offset = rdr.position();
        let pose_count = rdr.read_u32::<LittleEndian>()? as usize;
        rdr.check_count(count_offset, pose_count, 2 + 4)?;
        for _ in 0..pose_count {
            let name = read_name(rdr, &mut validator)?;
            let count_offset = rdr.position();
            let count = rdr.read_u32::<LittleEndian>()? as usize;
            let bone_transforms = rdr.read_vec(count_offset, count, 36 + 12)?;
            document.poses.push(Pose { name, bone_transforms });
        }

        let count_offset = rdr.position();
        let animation_count = rdr.read_u32::<LittleEndian>()? as usize;
        rdr.check_count(count_offset, animation_count, 2 + 4)?;
        for _ in 0..animation_count {
            document
                .animations
                .push(Self::read_animation(rdr, &mut validator, bone_count)?);
        }

        let count_offset = rdr.position();
        let aux_count = rdr.read_u32::<LittleEndian>()? as usize;
        document.aux = rdr.read_vec(count_offset, aux_count, AUX_RECORD_SIZE)?;

        if !rdr.is_at_end() {
            let offset = rdr.position();
            validator.violation(offset, format!("{} trailing bytes after the last record", rdr.remaining()))?;
        }

        debug!(
            "Decoded anim with {} meshes, {} bones, {} poses and {} animations",
            document.meshes.len(),
            document.bones.len(),
            document.poses.len(),
            document.animations.len()
        );
        Ok(validator.finish(document))
    }

    fn read_mesh(rdr: &mut ByteReader<'_>, validator: &mut Validator) -> Result<AnimMesh, CodecError> {
        let offset = rdr.position();
        validator.expect_value(offset, "mesh marker", ANIM_MESH_MARKER, rdr.read_u32::<LittleEndian>()?)?;

        let shader_offset = rdr.position();
        let shader_id = rdr.read_u32::<LittleEndian>()?;
        let shader = match u16::try_from(shader_id).ok().and_then(|id| Shader::try_from(id).ok()) {
            Some(shader) => shader,
            None => {
                validator.violation(
                    shader_offset,
                    format!("unexpected shader id {}, expected a value between 0 and 3", shader_id),
                )?;
                Shader::Opaque
            }
        };

        let offset = rdr.position();
        validator.expect_value(offset, "reserved mesh field", 0, rdr.read_u16::<LittleEndian>()?)?;

        let size_offset = rdr.position();
        let vertices_size = rdr.read_u32::<LittleEndian>()? as usize;
        rdr.check_count(size_offset, vertices_size, 1)?;
        if vertices_size % ANIM_VERTEX_SIZE != 0 {
            validator.violation(
                size_offset,
                format!("vertex buffer size {} is not a multiple of {}", vertices_size, ANIM_VERTEX_SIZE),
            )?;
        }
        let vertex_count = vertices_size / ANIM_VERTEX_SIZE;
        let mut vertices = Vec::with_capacity(vertex_count);
        for _ in 0..vertex_count {
            let offset = rdr.position();
            let mut vertex: Vertex = rdr.parse::<AnimVertexRecord>()?.into();
            validate_vertex(&mut vertex, offset, validator)?;
            vertices.push(vertex);
        }
        // Lenient: skip the partial vertex.
        rdr.read_bytes(vertices_size % ANIM_VERTEX_SIZE)?;

        let size_offset = rdr.position();
        let indices_size = rdr.read_u32::<LittleEndian>()? as usize;
        rdr.check_count(size_offset, indices_size, 1)?;
        if indices_size % ANIM_TRIANGLE_SIZE != 0 {
            validator.violation(
                size_offset,
                format!("index buffer size {} is not a multiple of {}", indices_size, ANIM_TRIANGLE_SIZE),
            )?;
        }
        let index_count = indices_size / 4;
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
        rdr.read_bytes(indices_size % 4)?;
        indices.truncate(index_count - index_count % 3);

        trace!("Read anim mesh with {} vertices", vertices.len());
        Ok(AnimMesh {
            shader,
            vertices,
            indices,
        })
    }

    fn read_bone(rdr: &mut ByteReader<'_>, validator: &mut Validator) -> Result<Bone, CodecError> {
        let name = read_name(rdr, validator)?;
        let rotation = rdr.parse()?;
        let translation = rdr.parse()?;
        let parent = rdr.read_i32::<LittleEndian>()?;
        let count_offset = rdr.position();
        let count = rdr.read_u32::<LittleEndian>()? as usize;
        let children = rdr.read_vec(count_offset, count, 4)?;
        Ok(Bone {
            name,
            rotation,
            translation,
            parent,
            children,
        })
    }

    fn read_animation(
        rdr: &mut ByteReader<'_>,
        validator: &mut Validator,
        bone_count: usize,
    ) -> Result<Animation, CodecError> {
        let name = read_name(rdr, validator)?;
        let count_offset = rdr.position();
        let count = rdr.read_u32::<LittleEndian>()? as usize;
        rdr.check_count(count_offset, count, 4 + 4 + 4)?;

        let mut bones = Vec::with_capacity(count);
        for _ in 0..count {
            let bone_offset = rdr.position();
            let bone = rdr.read_u32::<LittleEndian>()?;
            if bone as usize >= bone_count {
                validator.violation(
                    bone_offset,
                    format!("animation {} targets bone {}, but there are {} bones", name, bone, bone_count),
                )?;
            }

            let count_offset = rdr.position();
            let count = rdr.read_u32::<LittleEndian>()? as usize;
            let translations = rdr.read_vec(count_offset, count, 2 + 12)?;
            let count_offset = rdr.position();
            let count = rdr.read_u32::<LittleEndian>()? as usize;
            let rotations = rdr.read_vec(count_offset, count, 2 + 16)?;

            bones.push(BoneAnimation {
                bone,
                translations,
                rotations,
            });
        }
        Ok(Animation { name, bones })
    }
}
