use byteorder::{ByteOrder, LittleEndian};

use crate::CodecError;
use crate::common::policy::Strictness;
use crate::common::types::{SwColor, SwVec3};
use crate::mesh::reader::MeshReader;
use crate::mesh::types::{MeshDocument, NameMode, NameSelection, Shader, SubMesh, Vertex};
use crate::mesh::writer::MeshWriter;

const HEADER_SIZE: usize = 14;
const CUBE_VERTICES: usize = 24;
const CUBE_INDICES: usize = 36;
const INDEX_BUFFER_OFFSET: usize = HEADER_SIZE + CUBE_VERTICES * 28 + 4;
const FIRST_SUBMESH_OFFSET: usize = INDEX_BUFFER_OFFSET + CUBE_INDICES * 2 + 2;

/// Unit cube with one quad per face, four faces opaque and the top and bottom glass.
fn cube() -> MeshDocument {
    let faces = [
        (SwVec3::new(1.0, 0.0, 0.0), SwVec3::new(0.0, 1.0, 0.0), SwVec3::new(0.0, 0.0, 1.0)),
        (SwVec3::new(-1.0, 0.0, 0.0), SwVec3::new(0.0, 0.0, 1.0), SwVec3::new(0.0, 1.0, 0.0)),
        (SwVec3::new(0.0, 0.0, 1.0), SwVec3::new(1.0, 0.0, 0.0), SwVec3::new(0.0, 1.0, 0.0)),
        (SwVec3::new(0.0, 0.0, -1.0), SwVec3::new(0.0, 1.0, 0.0), SwVec3::new(1.0, 0.0, 0.0)),
        (SwVec3::new(0.0, 1.0, 0.0), SwVec3::new(0.0, 0.0, 1.0), SwVec3::new(1.0, 0.0, 0.0)),
        (SwVec3::new(0.0, -1.0, 0.0), SwVec3::new(1.0, 0.0, 0.0), SwVec3::new(0.0, 0.0, 1.0)),
    ];

    let mut document = MeshDocument {
        name: Some("hull".to_owned()),
        ..Default::default()
    };
    for (face, (normal, u, v)) in faces.into_iter().enumerate() {
        let shader = if face < 4 { Shader::Opaque } else { Shader::Glass };
        let base = document.vertices.len() as u32;
        for (su, sv) in [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)] {
            let position = SwVec3::from(glam::Vec3::from(normal) * 0.5 + glam::Vec3::from(u) * su + glam::Vec3::from(v) * sv);
            document
                .vertices
                .push(Vertex::new(position, shader.default_color(), normal));
        }
        document
            .indices
            .extend([base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    for (start, count, shader) in [(0u32, 24u32, Shader::Opaque), (24, 12, Shader::Glass)] {
        let range = start as usize..(start + count) as usize;
        let bounds = document.bounds_of(&document.indices[range]).unwrap_or_default();
        document.submeshes.push(SubMesh {
            index_start: start,
            index_count: count,
            shader,
            bounds,
            name: None,
            material_name: None,
        });
    }
    document
}

/// What decoding a cube written with `name` in every submesh gives back.
fn decoded_cube(name: Option<&str>) -> MeshDocument {
    let mut document = cube();
    document.name = name.map(str::to_owned);
    for submesh in &mut document.submeshes {
        submesh.name = document.name.clone();
    }
    document
}

fn encode(document: &MeshDocument, mode: NameMode) -> Result<Vec<u8>, CodecError> {
    MeshWriter::write_document(document, &NameSelection::new(mode, Some("boat")))
}

fn patch_f32(bytes: &mut [u8], offset: usize, value: f32) {
    LittleEndian::write_f32(&mut bytes[offset..offset + 4], value);
}

fn patch_u16(bytes: &mut [u8], offset: usize, value: u16) {
    LittleEndian::write_u16(&mut bytes[offset..offset + 2], value);
}

#[test]
fn round_trip_embeds_the_mesh_name() -> Result<(), anyhow::Error> {
    let bytes = encode(&cube(), NameMode::Mesh)?;
    let decoded = MeshReader::parse_document(&bytes, Strictness::Strict)?;

    assert!(decoded.warnings.is_empty());
    assert_eq!(decoded.document, decoded_cube(Some("hull")));
    Ok(())
}

#[test]
fn round_trip_embeds_the_object_name() -> Result<(), anyhow::Error> {
    let bytes = encode(&cube(), NameMode::Object)?;
    let decoded = MeshReader::parse_document(&bytes, Strictness::Strict)?;

    assert_eq!(decoded.document, decoded_cube(Some("boat")));
    Ok(())
}

#[test]
fn round_trip_embeds_material_names() -> Result<(), anyhow::Error> {
    let mut document = cube();
    document.submeshes[0].material_name = Some("paint".to_owned());
    let bytes = encode(&document, NameMode::Material)?;
    let decoded = MeshReader::parse_document(&bytes, Strictness::Strict)?.document;

    assert_eq!(decoded.name, None);
    assert_eq!(decoded.submeshes[0].name.as_deref(), Some("paint"));
    // Glass without an editor material falls back to the shader's material name.
    assert_eq!(decoded.submeshes[1].name.as_deref(), Some("MATERIALglass"));
    assert_eq!(decoded.vertices, document.vertices);
    assert_eq!(decoded.indices, document.indices);
    Ok(())
}

#[test]
fn round_trip_without_names() -> Result<(), anyhow::Error> {
    let bytes = encode(&cube(), NameMode::None)?;
    let decoded = MeshReader::parse_document(&bytes, Strictness::Strict)?;

    assert_eq!(decoded.document, decoded_cube(None));
    Ok(())
}

#[test]
fn encoding_is_deterministic() -> Result<(), anyhow::Error> {
    let document = cube();
    assert_eq!(encode(&document, NameMode::Mesh)?, encode(&document, NameMode::Mesh)?);

    // Re-encoding a decoded file reproduces an equivalent document.
    let decoded = MeshReader::parse_document(&encode(&document, NameMode::Mesh)?, Strictness::Strict)?.document;
    let again = MeshReader::parse_document(&encode(&decoded, NameMode::Mesh)?, Strictness::Strict)?.document;
    assert_eq!(decoded, again);
    Ok(())
}

#[test]
fn non_unit_normal_is_strict_only() -> Result<(), anyhow::Error> {
    let mut bytes = encode(&cube(), NameMode::None)?;
    // Scale the normal of vertex 0, which is (1, 0, 0).
    patch_f32(&mut bytes, HEADER_SIZE + 16, 2.0);

    let err = MeshReader::parse_document(&bytes, Strictness::Strict).unwrap_err();
    assert!(matches!(err, CodecError::FormatViolation(_)), "{:?}", err);
    assert_eq!(err.offset(), Some(HEADER_SIZE));

    let decoded = MeshReader::parse_document(&bytes, Strictness::Lenient)?;
    assert_eq!(decoded.warnings.len(), 1);
    assert_eq!(decoded.document.vertices[0].normal, SwVec3::new(1.0, 0.0, 0.0));
    assert_eq!(decoded.document, decoded_cube(None));
    Ok(())
}

#[test]
fn zero_normal_is_replaced_by_up() -> Result<(), anyhow::Error> {
    let mut bytes = encode(&cube(), NameMode::None)?;
    patch_f32(&mut bytes, HEADER_SIZE + 16, 0.0);

    let decoded = MeshReader::parse_document(&bytes, Strictness::Lenient)?;
    assert_eq!(decoded.document.vertices[0].normal, SwVec3::UP);
    Ok(())
}

#[test]
fn index_equal_to_vertex_count_is_always_fatal() -> Result<(), anyhow::Error> {
    let mut bytes = encode(&cube(), NameMode::None)?;
    patch_u16(&mut bytes, INDEX_BUFFER_OFFSET, CUBE_VERTICES as u16);

    for strictness in [Strictness::Strict, Strictness::Lenient] {
        let err = MeshReader::parse_document(&bytes, strictness).unwrap_err();
        assert!(matches!(err, CodecError::IndexOutOfBounds(_)), "{:?}", err);
        assert_eq!(err.offset(), Some(INDEX_BUFFER_OFFSET));
    }
    Ok(())
}

#[test]
fn wrong_magic_and_version_are_always_fatal() -> Result<(), anyhow::Error> {
    let bytes = encode(&cube(), NameMode::None)?;

    let mut magic = bytes.clone();
    magic[..4].copy_from_slice(b"phys");
    let mut version = bytes;
    patch_u16(&mut version, 4, 8);

    for strictness in [Strictness::Strict, Strictness::Lenient] {
        let err = MeshReader::parse_document(&magic, strictness).unwrap_err();
        assert!(matches!(err, CodecError::BadMagicOrVersion(_)), "{:?}", err);
        let err = MeshReader::parse_document(&version, strictness).unwrap_err();
        assert!(matches!(err, CodecError::BadMagicOrVersion(_)), "{:?}", err);
        assert_eq!(err.offset(), Some(4));
    }
    Ok(())
}

#[test]
fn truncated_and_overflowing_buffers() -> Result<(), anyhow::Error> {
    let bytes = encode(&cube(), NameMode::None)?;

    let err = MeshReader::parse_document(&bytes[..bytes.len() - 1], Strictness::Lenient).unwrap_err();
    assert!(
        matches!(err, CodecError::TruncatedData { needed: 2, available: 1, .. }),
        "{:?}",
        err
    );

    let err = MeshReader::parse_document(&bytes[..10], Strictness::Lenient).unwrap_err();
    assert!(matches!(err, CodecError::TruncatedData { offset: 10, .. }), "{:?}", err);

    let mut overflow = bytes;
    patch_u16(&mut overflow, 8, u16::MAX);
    let err = MeshReader::parse_document(&overflow, Strictness::Lenient).unwrap_err();
    assert!(matches!(err, CodecError::Overflow { offset: 8, .. }), "{:?}", err);
    Ok(())
}

#[test]
fn unreferenced_vertices_are_dropped_when_lenient() -> Result<(), anyhow::Error> {
    let mut document = cube();
    let stray = Vertex::new(SwVec3::splat(5.0), SwColor::new(1, 2, 3, 4), SwVec3::UP);
    document.vertices.insert(0, stray);
    for index in &mut document.indices {
        *index += 1;
    }
    let bytes = encode(&document, NameMode::None)?;

    let err = MeshReader::parse_document(&bytes, Strictness::Strict).unwrap_err();
    assert!(matches!(err, CodecError::FormatViolation(_)), "{:?}", err);
    assert_eq!(err.offset(), Some(HEADER_SIZE));

    let decoded = MeshReader::parse_document(&bytes, Strictness::Lenient)?;
    assert_eq!(decoded.warnings.len(), 1);
    assert_eq!(decoded.document, decoded_cube(None));
    Ok(())
}

#[test]
fn duplicate_vertices_are_kept_when_lenient() -> Result<(), anyhow::Error> {
    let mut document = cube();
    let copy = document.vertices[0];
    document.vertices.push(copy);
    document.indices[0] = CUBE_VERTICES as u32;
    let bytes = encode(&document, NameMode::None)?;

    let err = MeshReader::parse_document(&bytes, Strictness::Strict).unwrap_err();
    assert!(matches!(err, CodecError::FormatViolation(_)), "{:?}", err);

    let decoded = MeshReader::parse_document(&bytes, Strictness::Lenient)?;
    assert_eq!(decoded.warnings.len(), 1);
    assert_eq!(decoded.document.vertices.len(), CUBE_VERTICES + 1);
    Ok(())
}

#[test]
fn invalid_utf8_name_becomes_empty() -> Result<(), anyhow::Error> {
    let mut bytes = MeshWriter::write_document(&cube(), &NameSelection::new(NameMode::Object, Some("ab")))?;
    let name_offset = FIRST_SUBMESH_OFFSET + 38;
    assert_eq!(&bytes[name_offset + 2..name_offset + 4], b"ab");
    bytes[name_offset + 2] = 0xff;
    bytes[name_offset + 3] = 0xfe;

    let err = MeshReader::parse_document(&bytes, Strictness::Strict).unwrap_err();
    assert!(matches!(err, CodecError::FormatViolation(_)), "{:?}", err);
    assert_eq!(err.offset(), Some(name_offset));

    let decoded = MeshReader::parse_document(&bytes, Strictness::Lenient)?.document;
    assert_eq!(decoded.submeshes[0].name, None);
    assert_eq!(decoded.submeshes[1].name.as_deref(), Some("ab"));
    assert_eq!(decoded.name, None);
    Ok(())
}

#[test]
fn inverted_bounds_are_recomputed() -> Result<(), anyhow::Error> {
    let mut bytes = encode(&cube(), NameMode::None)?;
    // bounds min.x of the first submesh
    patch_f32(&mut bytes, FIRST_SUBMESH_OFFSET + 12, 10.0);

    assert!(MeshReader::parse_document(&bytes, Strictness::Strict).is_err());
    let decoded = MeshReader::parse_document(&bytes, Strictness::Lenient)?;
    assert_eq!(decoded.document, decoded_cube(None));
    Ok(())
}

#[test]
fn unknown_shader_falls_back_to_opaque() -> Result<(), anyhow::Error> {
    let mut bytes = encode(&cube(), NameMode::None)?;
    let second_submesh = FIRST_SUBMESH_OFFSET + 52;
    patch_u16(&mut bytes, second_submesh + 10, 9);

    let err = MeshReader::parse_document(&bytes, Strictness::Strict).unwrap_err();
    assert_eq!(err.offset(), Some(second_submesh + 10));
    let decoded = MeshReader::parse_document(&bytes, Strictness::Lenient)?.document;
    assert_eq!(decoded.submeshes[1].shader, Shader::Opaque);
    Ok(())
}

#[test]
fn trailing_bytes_are_ignored_when_lenient() -> Result<(), anyhow::Error> {
    let mut bytes = encode(&cube(), NameMode::None)?;
    bytes.extend_from_slice(&[1, 2, 3]);

    assert!(MeshReader::parse_document(&bytes, Strictness::Strict).is_err());
    let decoded = MeshReader::parse_document(&bytes, Strictness::Lenient)?;
    assert_eq!(decoded.warnings.len(), 1);
    assert_eq!(decoded.document, decoded_cube(None));
    Ok(())
}

#[test]
fn encoder_rejects_what_the_format_can_not_hold() {
    let mut too_many = cube();
    too_many.vertices = vec![too_many.vertices[0]; u16::MAX as usize + 1];
    assert!(matches!(
        encode(&too_many, NameMode::None),
        Err(CodecError::UnsupportedGeometry { .. })
    ));

    let mut quads = cube();
    quads.indices.truncate(4);
    assert!(matches!(
        encode(&quads, NameMode::None),
        Err(CodecError::UnsupportedGeometry { .. })
    ));

    let mut bad_normal = cube();
    bad_normal.vertices[3].normal = SwVec3::splat(1.0);
    assert!(matches!(
        encode(&bad_normal, NameMode::None),
        Err(CodecError::UnsupportedGeometry { .. })
    ));

    let mut out_of_range = cube();
    out_of_range.indices[5] = CUBE_VERTICES as u32;
    assert!(matches!(
        encode(&out_of_range, NameMode::None),
        Err(CodecError::IndexOutOfBounds(_))
    ));

    let mut long_name = cube();
    long_name.name = Some("x".repeat(u16::MAX as usize + 1));
    assert!(matches!(
        encode(&long_name, NameMode::Mesh),
        Err(CodecError::UnsupportedGeometry { .. })
    ));
}

#[test]
fn name_mode_parsing() {
    assert_eq!("material".parse::<NameMode>(), Ok(NameMode::Material));
    assert_eq!("OBJECT".parse::<NameMode>(), Ok(NameMode::Object));
    assert!("texture".parse::<NameMode>().is_err());
    assert_eq!(NameMode::default().to_string(), "NONE");
}

#[test]
fn obj_dump_lists_every_triangle() -> Result<(), anyhow::Error> {
    let document = cube();
    let mut obj = Vec::new();
    document.dump_to_wavefront_obj(&mut obj)?;
    let obj = String::from_utf8(obj)?;

    assert_eq!(obj.lines().filter(|line| line.starts_with("v ")).count(), CUBE_VERTICES);
    assert_eq!(obj.lines().filter(|line| line.starts_with("f ")).count(), CUBE_INDICES / 3);
    assert!(obj.contains("f 1//1 2//2 3//3"));
    Ok(())
}
