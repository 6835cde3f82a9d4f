use stormworks_files::common::types::SwColor;
use stormworks_files::mesh::types::Shader;

use crate::coordinate_systems::editor_to_game_color;
use crate::scene::MaterialSlot;

/// How faces using a material are written to a `.mesh`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportMaterial {
    pub shader: Shader,
    pub color: SwColor,
    pub name: Option<String>,
}

impl ExportMaterial {
    /// The shader comes from the material name, the color from its base color or the shader's default.
    pub fn resolve(slot: Option<&MaterialSlot>) -> ExportMaterial {
        let Some(slot) = slot else {
            return ExportMaterial {
                shader: Shader::Opaque,
                color: Shader::Opaque.default_color(),
                name: None,
            };
        };

        let shader = Shader::from_material_name(&slot.name);
        let color = slot
            .base_color
            .map(editor_to_game_color)
            .unwrap_or_else(|| shader.default_color());

        ExportMaterial {
            shader,
            color,
            name: Some(slot.name.clone()),
        }
    }
}
