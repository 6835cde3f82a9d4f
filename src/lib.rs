pub mod coordinate_systems;
pub mod export;
pub mod import;
pub mod scene;
