use std::collections::BTreeMap;

use glam::Vec3;

use crate::phys::types::CollisionPrimitive;
use crate::{CodecError, Violation};

/// Edge length of a grid cell in meters. Cells are anchored at the world origin.
pub const GRID_CELL_SIZE: f32 = 128.0;

/// Integer coordinate of a grid cell. The derived ordering (x, then y, then z) is the order cells are written in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct GridKey {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl GridKey {
    pub const ORIGIN: GridKey = GridKey::new(0, 0, 0);

    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        GridKey { x, y, z }
    }

    /// The cell whose half-open bounds `[key * 128, (key + 1) * 128)` contain `position`. Fails for positions that
    /// are not finite or whose cell coordinate doesn't fit an i32.
    pub fn containing(position: Vec3) -> Result<GridKey, CodecError> {
        Ok(GridKey::new(
            cell_index(position.x, position)?,
            cell_index(position.y, position)?,
            cell_index(position.z, position)?,
        ))
    }

    /// World space position of the cell's minimum corner.
    pub fn origin(self) -> Vec3 {
        Vec3::new(self.x as f32, self.y as f32, self.z as f32) * GRID_CELL_SIZE
    }
}

fn cell_index(v: f32, position: Vec3) -> Result<i32, CodecError> {
    // f64, so that the division doesn't round values just below a cell boundary up into the next cell.
    let cell = (v as f64 / GRID_CELL_SIZE as f64).floor();
    if !cell.is_finite() || cell < i32::MIN as f64 || cell > i32::MAX as f64 {
        return Err(CodecError::IndexOutOfBounds(Violation::unplaced(format!(
            "position ({}, {}, {}) has no grid cell",
            position.x, position.y, position.z
        ))));
    }
    Ok(cell as i32)
}

/// Groups primitives positioned in world space by the cell their origin lies in and makes their positions cell
/// relative. Without `divide_grid`, everything goes into the origin cell unchanged.
pub fn partition(
    primitives: Vec<CollisionPrimitive>,
    divide_grid: bool,
) -> Result<BTreeMap<GridKey, Vec<CollisionPrimitive>>, CodecError> {
    let mut cells: BTreeMap<GridKey, Vec<CollisionPrimitive>> = BTreeMap::new();
    if !divide_grid {
        if !primitives.is_empty() {
            cells.insert(GridKey::ORIGIN, primitives);
        }
        return Ok(cells);
    }

    for primitive in primitives {
        let key = GridKey::containing(primitive.transform.position)?;
        cells
            .entry(key)
            .or_default()
            .push(primitive.translated(-key.origin()));
    }
    Ok(cells)
}
