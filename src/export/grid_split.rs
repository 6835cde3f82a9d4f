use glam::Vec3;
use stormworks_files::phys::grid::GRID_CELL_SIZE;

/// Cuts every triangle along the 128m grid planes it crosses, so each piece lies within a single cell. The grid is
/// anchored at the origin on every axis, which makes it the same grid in editor and game space.
pub fn split_at_grid(triangles: &[[Vec3; 3]]) -> Vec<[Vec3; 3]> {
    let mut current = triangles.to_vec();
    for axis in 0..3 {
        let mut pieces = Vec::with_capacity(current.len());
        for triangle in current {
            split_along(triangle, axis, &mut pieces);
        }
        current = pieces;
    }
    current
}

fn split_along(triangle: [Vec3; 3], axis: usize, out: &mut Vec<[Vec3; 3]>) {
    let lo = triangle.iter().map(|v| v[axis]).fold(f32::INFINITY, f32::min);
    let hi = triangle.iter().map(|v| v[axis]).fold(f32::NEG_INFINITY, f32::max);
    if !lo.is_finite() || !hi.is_finite() {
        out.push(triangle);
        return;
    }

    // The first grid plane above the lowest corner.
    let cell_size = GRID_CELL_SIZE as f64;
    let plane = (((lo as f64 / cell_size).floor() + 1.0) * cell_size) as f32;
    if plane <= lo || plane >= hi {
        out.push(triangle);
        return;
    }

    let (below, above) = bisect(triangle, axis, plane);
    for piece in fan(&below) {
        out.push(piece);
    }
    for piece in fan(&above) {
        split_along(piece, axis, out);
    }
}

/// Splits a triangle into the polygons on either side of the plane `v[axis] == plane`, keeping the winding.
fn bisect(triangle: [Vec3; 3], axis: usize, plane: f32) -> (Vec<Vec3>, Vec<Vec3>) {
    let mut below = Vec::with_capacity(4);
    let mut above = Vec::with_capacity(4);
    for i in 0..3 {
        let a = triangle[i];
        let b = triangle[(i + 1) % 3];
        let da = a[axis] - plane;
        let db = b[axis] - plane;

        if da <= 0.0 {
            below.push(a);
        }
        if da >= 0.0 {
            above.push(a);
        }
        if (da < 0.0 && db > 0.0) || (da > 0.0 && db < 0.0) {
            let mut cut = a + (b - a) * (da / (da - db));
            cut[axis] = plane;
            below.push(cut);
            above.push(cut);
        }
    }
    (below, above)
}

fn fan(polygon: &[Vec3]) -> Vec<[Vec3; 3]> {
    (1..polygon.len().saturating_sub(1))
        .map(|i| [polygon[0], polygon[i], polygon[i + 1]])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area(triangle: &[Vec3; 3]) -> f32 {
        (triangle[1] - triangle[0]).cross(triangle[2] - triangle[0]).length() * 0.5
    }

    #[test]
    fn triangles_inside_a_cell_are_untouched() {
        let triangle = [Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), Vec3::new(0.0, 10.0, 0.0)];
        assert_eq!(split_at_grid(&[triangle]), vec![triangle]);
    }

    #[test]
    fn crossing_triangles_are_cut_at_the_plane() {
        let triangle = [
            Vec3::new(100.0, 0.0, 0.0),
            Vec3::new(300.0, 0.0, 0.0),
            Vec3::new(100.0, 20.0, 0.0),
        ];
        let pieces = split_at_grid(&[triangle]);

        // x = 128 and x = 256 cut the triangle into a triangle, a quad and a triangle.
        assert_eq!(pieces.len(), 5);
        let total: f32 = pieces.iter().map(area).sum();
        assert!((total - area(&triangle)).abs() < 1e-2);

        for piece in &pieces {
            let lo = piece.iter().map(|v| v.x).fold(f32::INFINITY, f32::min);
            let hi = piece.iter().map(|v| v.x).fold(f32::NEG_INFINITY, f32::max);
            assert_eq!((lo / 128.0).floor(), ((hi - 1e-3) / 128.0).floor(), "{:?}", piece);
        }
    }
}
