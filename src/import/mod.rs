//! Decodes game files and hands their content to a [`SceneBuilder`] as editor objects.

use std::fs;
use std::path::Path;

use log::{debug, info, warn};
use stormworks_files::anim::reader::AnimReader;
use stormworks_files::common::policy::Strictness;
use stormworks_files::mesh::reader::MeshReader;
use stormworks_files::phys::reader::PhysReader;
use stormworks_files::{CodecError, Violation};

use crate::coordinate_systems::game_to_editor;
use crate::import::materials::ObjectMaterialBuilder;
use crate::scene::{ImportedObject, SceneBuilder};

pub mod materials;

#[cfg(test)]
mod tests;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AssetKind {
    Mesh,
    Phys,
    Anim,
}

impl AssetKind {
    pub fn from_path(path: &Path) -> Option<AssetKind> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "mesh" => Some(AssetKind::Mesh),
            "phys" => Some(AssetKind::Phys),
            "anim" => Some(AssetKind::Anim),
            _ => None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ImportOptions {
    /// Put the objects of every file into a collection named after the file.
    pub use_collection: bool,
    pub strict_mode: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        ImportOptions {
            use_collection: false,
            strict_mode: true,
        }
    }
}

impl ImportOptions {
    pub fn strictness(&self) -> Strictness {
        Strictness::from_strict_mode(self.strict_mode)
    }
}

/// What an import produced. Warnings are only ever present in lenient mode.
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub objects: usize,
    pub warnings: Vec<Violation>,
}

impl ImportReport {
    fn merge(&mut self, other: ImportReport) {
        self.objects += other.objects;
        self.warnings.extend(other.warnings);
    }
}

pub enum SceneImporter {}

impl SceneImporter {
    /// Imports every file independently. Fails on the first file that can't be imported, objects of the files
    /// before it have been handed to `builder` already.
    pub fn load<P: AsRef<Path>>(
        kind: AssetKind,
        paths: &[P],
        builder: &mut dyn SceneBuilder,
        options: &ImportOptions,
    ) -> Result<ImportReport, CodecError> {
        let mut report = ImportReport::default();
        for path in paths {
            report.merge(Self::load_file(kind, path.as_ref(), builder, options)?);
        }
        Ok(report)
    }

    pub fn load_file(
        kind: AssetKind,
        path: &Path,
        builder: &mut dyn SceneBuilder,
        options: &ImportOptions,
    ) -> Result<ImportReport, CodecError> {
        let data = fs::read(path)?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();

        if options.use_collection {
            builder.begin_collection(&name);
        }
        let result = match kind {
            AssetKind::Mesh => Self::load_mesh(&data, &name, builder, options),
            AssetKind::Phys => Self::load_phys(&data, &name, builder, options),
            AssetKind::Anim => Self::load_anim(&data, &name, builder, options),
        };
        if options.use_collection {
            builder.end_collection();
        }

        let report = result?;
        for warning in &report.warnings {
            warn!("{}: {}", path.display(), warning);
        }
        info!("Imported {} object(s) from {}", report.objects, path.display());
        Ok(report)
    }

    /// One object for the whole file.
    pub fn load_mesh(
        data: &[u8],
        name: &str,
        builder: &mut dyn SceneBuilder,
        options: &ImportOptions,
    ) -> Result<ImportReport, CodecError> {
        let decoded = MeshReader::parse_document(data, options.strictness())?;
        let document = decoded.document;

        let mut object = ObjectMaterialBuilder::new(name);
        for submesh in &document.submeshes {
            let indices = document.submesh_indices(submesh).unwrap_or_default();
            object.add_submesh(submesh.shader, &document.vertices, indices);
        }
        builder.add_object(object.finish());

        Ok(ImportReport {
            objects: 1,
            warnings: decoded.warnings,
        })
    }

    /// One object per sub physics mesh, in grid cell order and world space.
    pub fn load_phys(
        data: &[u8],
        name: &str,
        builder: &mut dyn SceneBuilder,
        options: &ImportOptions,
    ) -> Result<ImportReport, CodecError> {
        let decoded = PhysReader::parse_document(data, options.strictness())?;
        let primitives = decoded.document.primitives();
        debug!("{} has {} primitives", name, primitives.len());

        for (i, primitive) in primitives.iter().enumerate() {
            let object_name = if primitives.len() == 1 {
                name.to_owned()
            } else {
                format!("{}_{:02}", name, i)
            };

            let positions: Vec<_> = primitive
                .triangles()
                .into_iter()
                .flatten()
                .map(game_to_editor)
                .collect();
            let triangles = (0..positions.len() as u32 / 3)
                .map(|t| [3 * t, 3 * t + 1, 3 * t + 2])
                .collect();

            builder.add_object(ImportedObject {
                name: object_name,
                positions,
                triangles,
                ..Default::default()
            });
        }

        Ok(ImportReport {
            objects: primitives.len(),
            warnings: decoded.warnings,
        })
    }

    /// The skinned meshes become one object, bones and animations are not imported.
    pub fn load_anim(
        data: &[u8],
        name: &str,
        builder: &mut dyn SceneBuilder,
        options: &ImportOptions,
    ) -> Result<ImportReport, CodecError> {
        let decoded = AnimReader::parse_document(data, options.strictness())?;

        let mut object = ObjectMaterialBuilder::new(name);
        for mesh in &decoded.document.meshes {
            object.add_submesh(mesh.shader, &mesh.vertices, &mesh.indices);
        }
        builder.add_object(object.finish());

        Ok(ImportReport {
            objects: 1,
            warnings: decoded.warnings,
        })
    }
}
