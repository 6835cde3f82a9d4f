use std::collections::HashMap;

use itertools::Itertools;
use stormworks_files::common::types::SwColor;
use stormworks_files::mesh::types::{Shader, Vertex};

use crate::coordinate_systems::{game_to_editor, game_to_editor_color};
use crate::scene::{ImportedMaterial, ImportedObject};

/// The game's paintable override colors and the material names they are imported as.
pub const OVERRIDE_COLORS: [(SwColor, &str); 3] = [
    (SwColor::new(255, 125, 0, 255), "OverrideColor1"),
    (SwColor::new(155, 125, 0, 255), "OverrideColor2"),
    (SwColor::new(55, 125, 0, 255), "OverrideColor3"),
];

/// Accumulates submeshes into one editor object, deriving materials from shaders and vertex colors.
#[derive(Debug)]
pub struct ObjectMaterialBuilder {
    object: ImportedObject,
    named_materials: HashMap<String, usize>,
    color_materials: HashMap<SwColor, usize>,
}

impl ObjectMaterialBuilder {
    pub fn new(name: &str) -> Self {
        ObjectMaterialBuilder {
            object: ImportedObject {
                name: name.to_owned(),
                ..Default::default()
            },
            named_materials: HashMap::new(),
            color_materials: HashMap::new(),
        }
    }

    /// Appends the vertices `indices` reference, compacted in index order, and their triangles. Special shaders get
    /// one shared material each; opaque triangles get a material per override or plain color of their first corner.
    pub fn add_submesh(&mut self, shader: Shader, vertices: &[Vertex], indices: &[u32]) {
        let used = indices
            .iter()
            .copied()
            .filter(|&i| (i as usize) < vertices.len())
            .sorted()
            .dedup()
            .collect_vec();
        let Some(&first) = used.first() else {
            return;
        };

        let base = self.object.positions.len() as u32;
        let remap: HashMap<u32, u32> = used
            .iter()
            .enumerate()
            .map(|(local, &index)| (index, base + local as u32))
            .collect();
        self.object
            .positions
            .extend(used.iter().map(|&i| game_to_editor(vertices[i as usize].position.into())));

        let special = shader
            .material_name()
            .map(|name| self.named_material(name, vertices[first as usize].color));

        for triangle in indices.chunks_exact(3) {
            let [Some(&a), Some(&b), Some(&c)] = [triangle[0], triangle[1], triangle[2]].map(|i| remap.get(&i)) else {
                continue;
            };
            let material = match special {
                Some(material) => material,
                None => {
                    let color = vertices
                        .get(triangle[0] as usize)
                        .map(|v| v.color)
                        .unwrap_or_else(|| Shader::Opaque.default_color());
                    self.color_material(color)
                }
            };
            self.object.triangles.push([a, b, c]);
            self.object.triangle_materials.push(material);
        }
    }

    pub fn finish(self) -> ImportedObject {
        self.object
    }

    fn named_material(&mut self, name: &str, color: SwColor) -> usize {
        if let Some(&index) = self.named_materials.get(name) {
            return index;
        }
        let index = self.push_material(name.to_owned(), color);
        self.named_materials.insert(name.to_owned(), index);
        index
    }

    fn color_material(&mut self, color: SwColor) -> usize {
        if let Some((_, name)) = OVERRIDE_COLORS.iter().find(|(override_color, _)| *override_color == color) {
            return self.named_material(name, color);
        }
        if let Some(&index) = self.color_materials.get(&color) {
            return index;
        }

        let name = format!("{}_{:02}", self.object.name, self.color_materials.len() + 1);
        let index = self.push_material(name, color);
        self.color_materials.insert(color, index);
        index
    }

    fn push_material(&mut self, name: String, color: SwColor) -> usize {
        self.object.materials.push(ImportedMaterial {
            name,
            color: game_to_editor_color(color),
        });
        self.object.materials.len() - 1
    }
}
