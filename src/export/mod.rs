//! Everything between a host scene and the codecs on export: object selection, transform and modifier flattening,
//! triangulation, material mapping and grid partitioning.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use stormworks_files::CodecError;
use stormworks_files::mesh::types::{NameMode, NameSelection};
use stormworks_files::mesh::writer::MeshWriter;
use stormworks_files::phys::types::PhysDocument;
use stormworks_files::phys::writer::{PhysEncodeOptions, PhysWriter};

use crate::export::flatten::{FlatMesh, MeshFlattener};
use crate::export::mesh::{ExportedMesh, MeshExporter};
use crate::export::phys::PhysExporter;
use crate::scene::{ObjectKind, SceneObject, SceneSource};

pub mod flatten;
pub mod grid_split;
pub mod materials;
pub mod mesh;
pub mod optimizer;
pub mod phys;


#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// Only export objects the host marked as selected.
    pub selected: bool,
    pub apply_transform: bool,
    pub apply_modifiers: bool,
    /// `.mesh` only.
    pub name_mode: NameMode,
    /// `.phys` only.
    pub divide_grid: bool,
    /// `.phys` only: cut objects at grid planes so that every primitive lies within one cell.
    pub split_at_grid: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            selected: false,
            apply_transform: true,
            apply_modifiers: true,
            name_mode: NameMode::None,
            divide_grid: true,
            split_at_grid: false,
        }
    }
}

pub enum SceneExporter {}

impl SceneExporter {
    /// Mesh objects to export, sorted by name.
    pub fn collect_objects(source: &dyn SceneSource, options: &ExportOptions) -> Vec<SceneObject> {
        let mut objects: Vec<SceneObject> = source
            .objects()
            .into_iter()
            .filter(|object| !options.selected || object.selected)
            .filter(|object| object.kind == ObjectKind::Mesh)
            .collect();
        objects.sort_by(|a, b| a.name.cmp(&b.name));
        objects
    }

    fn flatten<'a>(objects: &'a [SceneObject], options: &ExportOptions) -> Result<Vec<FlatMesh<'a>>, CodecError> {
        let mut meshes = Vec::with_capacity(objects.len());
        for object in objects {
            match MeshFlattener::flatten(object, options.apply_transform, options.apply_modifiers)? {
                Some(mesh) => meshes.push(mesh),
                None => debug!("Skipping {}, it has no mesh data", object.name),
            }
        }
        Ok(meshes)
    }

    pub fn build_mesh(source: &dyn SceneSource, options: &ExportOptions) -> Result<ExportedMesh, CodecError> {
        let objects = Self::collect_objects(source, options);
        Ok(MeshExporter::build(&Self::flatten(&objects, options)?))
    }

    pub fn build_phys(source: &dyn SceneSource, options: &ExportOptions) -> Result<PhysDocument, CodecError> {
        let objects = Self::collect_objects(source, options);
        PhysExporter::build(
            &Self::flatten(&objects, options)?,
            options.divide_grid,
            options.split_at_grid,
        )
    }

    pub fn encode_mesh(source: &dyn SceneSource, options: &ExportOptions) -> Result<Vec<u8>, CodecError> {
        let exported = Self::build_mesh(source, options)?;
        let names = NameSelection::new(options.name_mode, exported.object_name.as_deref());
        MeshWriter::write_document(&exported.document, &names)
    }

    pub fn encode_phys(source: &dyn SceneSource, options: &ExportOptions) -> Result<Vec<u8>, CodecError> {
        let document = Self::build_phys(source, options)?;
        PhysWriter::write_document(
            &document,
            &PhysEncodeOptions {
                divide_grid: options.divide_grid,
            },
        )
    }

    pub fn save_mesh(source: &dyn SceneSource, options: &ExportOptions, path: &Path) -> Result<(), CodecError> {
        let bytes = Self::encode_mesh(source, options)?;
        write_atomically(path, &bytes)?;
        info!("Exported {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }

    pub fn save_phys(source: &dyn SceneSource, options: &ExportOptions, path: &Path) -> Result<(), CodecError> {
        let bytes = Self::encode_phys(source, options)?;
        write_atomically(path, &bytes)?;
        info!("Exported {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }
}

/// Writes to a sibling temporary file first and renames it over `path`, so a failed export never leaves a partial
/// file behind.
pub fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), CodecError> {
    let temporary = temporary_sibling(path);
    if let Err(err) = fs::write(&temporary, bytes).and_then(|_| fs::rename(&temporary, path)) {
        match fs::remove_file(&temporary) {
            Err(cleanup) if cleanup.kind() != ErrorKind::NotFound => {
                warn!("Failed to remove {}: {}", temporary.display(), cleanup)
            }
            _ => {}
        }
        return Err(err.into());
    }
    Ok(())
}

fn temporary_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
