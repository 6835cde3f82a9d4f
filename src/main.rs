use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow, bail};
use clap::Parser;
use itertools::Itertools;
use log::info;
use stormworks_files::Violation;
use stormworks_files::anim::reader::AnimReader;
use stormworks_files::common::policy::Strictness;
use stormworks_files::mesh::reader::MeshReader;
use stormworks_files::mesh::types::{MeshDocument, NameSelection};
use stormworks_files::mesh::writer::MeshWriter;
use stormworks_files::phys::reader::PhysReader;
use stormworks_files::phys::types::PhysDocument;
use stormworks_files::phys::writer::{PhysEncodeOptions, PhysWriter};
use swmesh::export::write_atomically;
use swmesh::import::{AssetKind, ImportOptions, SceneImporter};
use swmesh::scene::CollectedScene;

use crate::settings::{CliArgs, Command};

mod settings;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = CliArgs::parse();
    log::trace!("Starting with args: {:?}", args);

    match &args.command {
        Command::Inspect { files } => {
            for file in files {
                inspect(&args, file).with_context(|| format!("Failed to inspect {}", file.display()))?;
            }
        }
        Command::Import { files } => import(&args, files)?,
        Command::DumpObj { input, output } => {
            dump_obj(&args, input, output).with_context(|| format!("Failed to dump {}", input.display()))?
        }
        Command::Regrid { input, output } => {
            let document = decode_phys(&args, input)?;
            write_phys(&args, &document, output)?;
        }
        Command::Reencode { input, output } => match asset_kind(input)? {
            AssetKind::Mesh => {
                let document = decode_mesh(&args, input)?;
                let object_name = input.file_stem().map(|s| s.to_string_lossy().into_owned());
                let names = NameSelection::new(args.name_mode, object_name.as_deref());
                let bytes = MeshWriter::write_document(&document, &names)
                    .with_context(|| format!("Failed to encode {}", input.display()))?;
                write_output(output, &bytes)?;
            }
            AssetKind::Phys => {
                let document = decode_phys(&args, input)?;
                write_phys(&args, &document, output)?;
            }
            AssetKind::Anim => bail!(".anim files can only be decoded"),
        },
    }
    Ok(())
}

fn strictness(args: &CliArgs) -> Strictness {
    Strictness::from_strict_mode(args.strict)
}

fn asset_kind(path: &Path) -> anyhow::Result<AssetKind> {
    AssetKind::from_path(path).ok_or_else(|| anyhow!("{} is not a .mesh, .phys or .anim file", path.display()))
}

fn read(path: &Path) -> anyhow::Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn report_warnings(path: &Path, warnings: &[Violation]) {
    for warning in warnings {
        println!("  warning {}", warning);
    }
    if !warnings.is_empty() {
        info!("{} decoded with {} warning(s)", path.display(), warnings.len());
    }
}

fn decode_mesh(args: &CliArgs, path: &Path) -> anyhow::Result<MeshDocument> {
    let decoded = MeshReader::parse_document(&read(path)?, strictness(args))
        .with_context(|| format!("Failed to decode {}", path.display()))?;
    report_warnings(path, &decoded.warnings);
    Ok(decoded.document)
}

fn decode_phys(args: &CliArgs, path: &Path) -> anyhow::Result<PhysDocument> {
    let decoded = PhysReader::parse_document(&read(path)?, strictness(args))
        .with_context(|| format!("Failed to decode {}", path.display()))?;
    report_warnings(path, &decoded.warnings);
    Ok(decoded.document)
}

fn write_phys(args: &CliArgs, document: &PhysDocument, output: &Path) -> anyhow::Result<()> {
    let options = PhysEncodeOptions {
        divide_grid: args.divide_grid,
    };
    let bytes = PhysWriter::write_document(document, &options).context("Failed to encode the physics mesh")?;
    write_output(output, &bytes)
}

fn write_output(output: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    write_atomically(output, bytes).with_context(|| format!("Failed to write {}", output.display()))?;
    info!("Wrote {} ({} bytes)", output.display(), bytes.len());
    Ok(())
}

fn inspect(args: &CliArgs, path: &Path) -> anyhow::Result<()> {
    println!("{}", path.display());
    match asset_kind(path)? {
        AssetKind::Mesh => {
            let document = decode_mesh(args, path)?;
            println!(
                "  mesh {:?}: {} vertices, {} triangles",
                document.name.as_deref().unwrap_or_default(),
                document.vertices.len(),
                document.triangle_count()
            );
            for submesh in &document.submeshes {
                println!(
                    "  submesh {:?}: {} indices from {}, name {:?}",
                    submesh.shader,
                    submesh.index_count,
                    submesh.index_start,
                    submesh.name.as_deref().unwrap_or_default()
                );
            }
        }
        AssetKind::Phys => {
            let document = decode_phys(args, path)?;
            println!(
                "  phys: {} primitives in {} cells",
                document.primitive_count(),
                document.cells.len()
            );
            if let Some(bounds) = document.bounds {
                println!("  bounds {:?} .. {:?}", bounds.min, bounds.max);
            }
            for (key, primitives) in &document.cells {
                println!("  cell ({}, {}, {}): {} primitives", key.x, key.y, key.z, primitives.len());
            }
        }
        AssetKind::Anim => {
            let decoded = AnimReader::parse_document(&read(path)?, strictness(args))
                .with_context(|| format!("Failed to decode {}", path.display()))?;
            report_warnings(path, &decoded.warnings);
            let anim = decoded.document;
            println!(
                "  anim: {} meshes, {} bones, {} poses, {} animations",
                anim.meshes.len(),
                anim.bones.len(),
                anim.poses.len(),
                anim.animations.len()
            );
        }
    }
    Ok(())
}

fn import(args: &CliArgs, files: &[PathBuf]) -> anyhow::Result<()> {
    let options = ImportOptions {
        use_collection: args.use_collection,
        strict_mode: args.strict,
    };

    let mut scene = CollectedScene::default();
    for file in files {
        let kind = asset_kind(file)?;
        let report = SceneImporter::load_file(kind, file, &mut scene, &options)
            .with_context(|| format!("Failed to import {}", file.display()))?;
        report_warnings(file, &report.warnings);
    }

    for collected in &scene.objects {
        let object = &collected.object;
        println!(
            "{}{}: {} vertices, {} triangles, materials [{}]",
            collected
                .collection
                .as_deref()
                .map(|c| format!("{}/", c))
                .unwrap_or_default(),
            object.name,
            object.positions.len(),
            object.triangles.len(),
            object.materials.iter().map(|m| &m.name).join(", ")
        );
    }
    Ok(())
}

fn dump_obj(args: &CliArgs, input: &Path, output: &Path) -> anyhow::Result<()> {
    let mut obj = Vec::new();
    match asset_kind(input)? {
        AssetKind::Mesh => decode_mesh(args, input)?.dump_to_wavefront_obj(&mut obj)?,
        AssetKind::Phys => decode_phys(args, input)?.dump_to_wavefront_obj(&mut obj)?,
        AssetKind::Anim => {
            let decoded = AnimReader::parse_document(&read(input)?, strictness(args))?;
            report_warnings(input, &decoded.warnings);
            decoded.document.to_mesh_document().dump_to_wavefront_obj(&mut obj)?
        }
    }
    write_output(output, &obj)
}
