use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, value_parser};
use stormworks_files::mesh::types::NameMode;

#[derive(Parser, Debug)]
#[command(name = "swmesh")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Inspect, convert and re-encode Stormworks .mesh, .phys and .anim files")]
pub struct CliArgs {
    /// Fail on recoverable format violations instead of fixing them up with a warning.
    #[arg(long, env = "SWMESH_STRICT", default_value_t = true, action = ArgAction::Set, global = true)]
    pub strict: bool,

    /// Group the objects of every imported file into a collection named after it.
    #[arg(long, env = "SWMESH_USE_COLLECTION", default_value_t = false, action = ArgAction::Set, global = true)]
    pub use_collection: bool,

    /// Partition .phys primitives into 128m grid cells when encoding.
    #[arg(long, env = "SWMESH_DIVIDE_GRID", default_value_t = true, action = ArgAction::Set, global = true)]
    pub divide_grid: bool,

    /// The name embedded into re-encoded .mesh files: MESH, OBJECT, MATERIAL or NONE.
    #[arg(long, env = "SWMESH_NAME_MODE", default_value = "NONE", value_parser = value_parser!(NameMode), global = true)]
    pub name_mode: NameMode,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode files and print a summary of their content.
    Inspect {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Import files the way an editor would and list the objects that would be created.
    Import {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Write the geometry of a .mesh, .phys or .anim file as Wavefront OBJ.
    DumpObj { input: PathBuf, output: PathBuf },
    /// Re-encode a .phys file with the partitioning chosen by --divide-grid.
    Regrid { input: PathBuf, output: PathBuf },
    /// Decode and encode a .mesh or .phys file again, normalizing it.
    Reencode { input: PathBuf, output: PathBuf },
}
