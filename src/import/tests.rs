use std::path::Path;

use glam::{Vec3, Vec4};
use stormworks_files::CodecError;
use stormworks_files::common::types::{SwColor, SwVec3};
use stormworks_files::mesh::types::{MeshDocument, NameSelection, Shader, SubMesh, Vertex};
use stormworks_files::mesh::writer::MeshWriter;
use stormworks_files::phys::types::{CollisionPrimitive, PhysDocument, PrimitiveShape, ShapeMesh, Transform};
use stormworks_files::phys::writer::{PhysEncodeOptions, PhysWriter};

use crate::import::materials::ObjectMaterialBuilder;
use crate::import::{AssetKind, ImportOptions, SceneImporter};
use crate::scene::{CollectedScene, SceneBuilder};

const RED: SwColor = SwColor::new(255, 0, 0, 255);
const BLUE: SwColor = SwColor::new(0, 0, 255, 255);
const OVERRIDE_1: SwColor = SwColor::new(255, 125, 0, 255);

/// Four opaque triangles (override color, red, red, blue) and one glass triangle, every vertex distinct.
fn painted_mesh() -> Result<Vec<u8>, CodecError> {
    let colors = [OVERRIDE_1, RED, RED, BLUE, Shader::Glass.default_color()];
    let vertices = (0..15)
        .map(|i| {
            let i_f = i as f32;
            Vertex::new(SwVec3::new(i_f, 2.0 * i_f, 3.0 * i_f), colors[i / 3], SwVec3::UP)
        })
        .collect();
    let mut document = MeshDocument {
        name: None,
        vertices,
        indices: (0..15).collect(),
        submeshes: vec![],
    };
    for (start, count, shader) in [(0, 12, Shader::Opaque), (12, 3, Shader::Glass)] {
        let bounds = document
            .bounds_of(&document.indices[start..start + count])
            .unwrap_or_default();
        document.submeshes.push(SubMesh {
            index_start: start as u32,
            index_count: count as u32,
            shader,
            bounds,
            name: None,
            material_name: None,
        });
    }
    MeshWriter::write_document(&document, &NameSelection::default())
}

fn wreck(primitives: Vec<CollisionPrimitive>) -> Result<Vec<u8>, CodecError> {
    let document = PhysDocument::from_primitives(primitives, true)?;
    PhysWriter::write_document(&document, &PhysEncodeOptions::default())
}

fn box_at(position: Vec3) -> CollisionPrimitive {
    CollisionPrimitive::new(
        Transform::from_position(position),
        PrimitiveShape::Box {
            half_extents: Vec3::splat(0.5),
        },
    )
}

#[test]
fn asset_kinds_follow_the_extension() {
    assert_eq!(AssetKind::from_path(Path::new("hull.mesh")), Some(AssetKind::Mesh));
    assert_eq!(AssetKind::from_path(Path::new("dir/hull.PHYS")), Some(AssetKind::Phys));
    assert_eq!(AssetKind::from_path(Path::new("crew.anim")), Some(AssetKind::Anim));
    assert_eq!(AssetKind::from_path(Path::new("hull.obj")), None);
    assert_eq!(AssetKind::from_path(Path::new("hull")), None);
}

#[test]
fn mesh_materials_come_from_shaders_and_colors() -> Result<(), anyhow::Error> {
    let mut scene = CollectedScene::default();
    let report = SceneImporter::load_mesh(&painted_mesh()?, "hull", &mut scene, &ImportOptions::default())?;
    assert_eq!(report.objects, 1);
    assert!(report.warnings.is_empty());

    let object = scene.object("hull").ok_or_else(|| anyhow::anyhow!("hull missing"))?;
    let names: Vec<&str> = object.materials.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["OverrideColor1", "hull_01", "hull_02", "MATERIALglass"]);
    assert_eq!(object.triangle_materials, vec![0, 1, 1, 2, 3]);
    assert_eq!(object.materials[1].color, Vec4::new(1.0, 0.0, 0.0, 1.0));

    assert_eq!(object.positions.len(), 15);
    assert_eq!(object.triangles[4], [12, 13, 14]);
    // Game (1, 2, 3) is editor (1, 3, 2).
    assert_eq!(object.positions[1], Vec3::new(1.0, 3.0, 2.0));
    Ok(())
}

#[test]
fn submesh_vertices_are_compacted() {
    let vertices: Vec<Vertex> = (0..6)
        .map(|i| Vertex::new(SwVec3::splat(i as f32), RED, SwVec3::UP))
        .collect();

    let mut builder = ObjectMaterialBuilder::new("part");
    builder.add_submesh(Shader::Additive, &vertices, &[5, 3, 4]);
    builder.add_submesh(Shader::Additive, &vertices, &[]);
    let object = builder.finish();

    assert_eq!(object.positions, vec![Vec3::splat(3.0), Vec3::splat(4.0), Vec3::splat(5.0)]);
    assert_eq!(object.triangles, vec![[2, 0, 1]]);
    assert_eq!(object.materials.len(), 1);
    assert_eq!(object.materials[0].name, "MATERIALadditive");
}

#[test]
fn phys_primitives_become_world_space_objects() -> Result<(), anyhow::Error> {
    let soup = CollisionPrimitive::new(
        Transform::from_position(Vec3::new(1.0, 2.0, 3.0)),
        PrimitiveShape::Mesh(ShapeMesh::triangle_soup(vec![
            Vec3::ZERO,
            Vec3::new(3.0, 0.0, 0.0),
            Vec3::new(0.0, 3.0, 0.0),
        ])),
    );
    let bytes = wreck(vec![box_at(Vec3::new(200.0, 0.0, 0.0)), soup])?;

    let mut scene = CollectedScene::default();
    let report = SceneImporter::load_phys(&bytes, "wreck", &mut scene, &ImportOptions::default())?;
    assert_eq!(report.objects, 2);

    // The origin cell is written first.
    let soup = scene.object("wreck_00").ok_or_else(|| anyhow::anyhow!("soup missing"))?;
    assert_eq!(soup.positions, vec![
        Vec3::new(1.0, 3.0, 2.0),
        Vec3::new(4.0, 3.0, 2.0),
        Vec3::new(1.0, 3.0, 5.0)
    ]);
    assert_eq!(soup.triangles, vec![[0, 1, 2]]);

    let cube = scene.object("wreck_01").ok_or_else(|| anyhow::anyhow!("box missing"))?;
    assert_eq!(cube.positions.len(), 36);
    assert_eq!(cube.triangles.len(), 12);
    for position in &cube.positions {
        assert!(position.abs_diff_eq(Vec3::new(200.0, 0.0, 0.0), 0.5 + 1e-4), "{:?}", position);
    }
    Ok(())
}

#[test]
fn a_single_primitive_keeps_the_file_name() -> Result<(), anyhow::Error> {
    let bytes = wreck(vec![box_at(Vec3::ZERO)])?;
    let mut scene = CollectedScene::default();
    SceneImporter::load_phys(&bytes, "crate", &mut scene, &ImportOptions::default())?;
    assert!(scene.object("crate").is_some());
    Ok(())
}

#[test]
fn lenient_imports_report_warnings() -> Result<(), anyhow::Error> {
    let mut bytes = painted_mesh()?;
    // x component of the first vertex normal.
    bytes[30..34].copy_from_slice(&2.0f32.to_le_bytes());

    let mut scene = CollectedScene::default();
    let err = SceneImporter::load_mesh(&bytes, "hull", &mut scene, &ImportOptions::default()).unwrap_err();
    assert!(matches!(err, CodecError::FormatViolation(_)), "{:?}", err);
    assert!(scene.objects.is_empty());

    let lenient = ImportOptions {
        strict_mode: false,
        ..Default::default()
    };
    let report = SceneImporter::load_mesh(&bytes, "hull", &mut scene, &lenient)?;
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].offset, Some(14));
    assert_eq!(scene.objects.len(), 1);
    Ok(())
}

#[test]
fn files_are_grouped_into_collections() -> Result<(), anyhow::Error> {
    let directory = std::env::temp_dir().join(format!("swmesh-import-{}", std::process::id()));
    std::fs::create_dir_all(&directory)?;
    let bytes = wreck(vec![box_at(Vec3::ZERO)])?;
    let paths = [directory.join("left.phys"), directory.join("right.phys")];
    for path in &paths {
        std::fs::write(path, &bytes)?;
    }

    let options = ImportOptions {
        use_collection: true,
        ..Default::default()
    };
    let mut scene = CollectedScene::default();
    let report = SceneImporter::load(AssetKind::Phys, &paths, &mut scene, &options)?;
    // Objects added later land outside of any collection again.
    scene.add_object(Default::default());

    assert_eq!(report.objects, 2);
    assert_eq!(scene.collections, vec!["left", "right"]);
    let collections: Vec<Option<&str>> = scene.objects.iter().map(|o| o.collection.as_deref()).collect();
    assert_eq!(collections, vec![Some("left"), Some("right"), None]);

    let missing = [directory.join("missing.phys")];
    let err = SceneImporter::load(AssetKind::Phys, &missing, &mut scene, &options).unwrap_err();
    assert!(matches!(err, CodecError::IOError(_)), "{:?}", err);

    std::fs::remove_dir_all(&directory)?;
    Ok(())
}
