use std::collections::BTreeMap;

use glam::Vec3;
use log::{debug, trace};
use stormworks_files::CodecError;
use stormworks_files::phys::grid::GridKey;
use stormworks_files::phys::types::{CollisionPrimitive, PhysDocument, ShapeMesh};

use crate::coordinate_systems::editor_to_game;
use crate::export::flatten::FlatMesh;
use crate::export::grid_split;

pub enum PhysExporter {}

impl PhysExporter {
    /// Turns every object into a triangle soup primitive, or one per grid cell it covers when `split_at_grid` is
    /// set, and partitions them into cells according to `divide_grid`.
    pub fn build(meshes: &[FlatMesh<'_>], divide_grid: bool, split_at_grid: bool) -> Result<PhysDocument, CodecError> {
        let mut primitives = Vec::new();
        for mesh in meshes {
            let triangles: Vec<[Vec3; 3]> = mesh.triangles.iter().map(|t| t.positions).collect();
            if triangles.is_empty() {
                continue;
            }

            if split_at_grid {
                let before = primitives.len();
                for piece in Self::group_by_cell(&grid_split::split_at_grid(&triangles))?.into_values() {
                    primitives.extend(soup_primitive(&piece));
                }
                trace!("Split {} into {} primitives", mesh.object_name, primitives.len() - before);
            } else {
                primitives.extend(soup_primitive(&triangles));
            }
        }

        let document = PhysDocument::from_primitives(primitives, divide_grid)?;
        debug!(
            "Built phys with {} primitives in {} cells",
            document.primitive_count(),
            document.cells.len()
        );
        Ok(document)
    }

    /// Buckets triangles by the cell holding their centroid, in ascending cell order.
    fn group_by_cell(triangles: &[[Vec3; 3]]) -> Result<BTreeMap<GridKey, Vec<[Vec3; 3]>>, CodecError> {
        let mut cells: BTreeMap<GridKey, Vec<[Vec3; 3]>> = BTreeMap::new();
        for triangle in triangles {
            let centroid = (triangle[0] + triangle[1] + triangle[2]) / 3.0;
            let key = GridKey::containing(editor_to_game(centroid))?;
            cells.entry(key).or_default().push(*triangle);
        }
        Ok(cells)
    }
}

/// A game space triangle soup, positioned where the decoder will place it again.
fn soup_primitive(triangles: &[[Vec3; 3]]) -> Option<CollisionPrimitive> {
    let vertices = triangles.iter().flatten().map(|&p| editor_to_game(p)).collect();
    CollisionPrimitive::anchored(ShapeMesh::triangle_soup(vertices))
}
