use glam::{Affine3A, Vec3, Vec4};
use swmesh::scene::{InMemoryScene, MaterialSlot, PolyMesh, Polygon, SceneObject};

/// Unit cube around the origin: 8 vertices and 6 quads, the top one made of glass.
pub fn cube_mesh(name: &str) -> PolyMesh {
    let positions = (0..8)
        .map(|i| {
            let sign = |bit: usize| if i & (1 << bit) != 0 { 0.5 } else { -0.5 };
            Vec3::new(sign(0), sign(1), sign(2))
        })
        .collect();
    let quads = [
        ([0, 2, 3, 1], 0),
        ([4, 5, 7, 6], 1),
        ([0, 1, 5, 4], 0),
        ([2, 6, 7, 3], 0),
        ([0, 4, 6, 2], 0),
        ([1, 3, 7, 5], 0),
    ];
    PolyMesh {
        name: name.to_owned(),
        positions,
        polygons: quads
            .into_iter()
            .map(|(corners, material)| Polygon::new(corners.to_vec(), material))
            .collect(),
        materials: vec![
            Some(MaterialSlot::new("hull_paint", Some(Vec4::new(0.2, 0.4, 0.6, 1.0)))),
            Some(MaterialSlot::new("MATERIALglass", None)),
        ],
    }
}

pub fn cube_scene_at(translation: Vec3) -> InMemoryScene {
    InMemoryScene::new(vec![
        SceneObject::new_mesh("cube", cube_mesh("cube_mesh")).with_transform(Affine3A::from_translation(translation)),
    ])
}
