//! Axis-aligned uniform lattice of sample points.
//!
//! Values live at grid points; a grid with `n` points along an axis has
//! `n - 1` cells along it. Positions outside the grid are clamped to its
//! boundary before sampling.

use std::ops::{Add, Mul};

use glam::{Mat3, Vec3};

use crate::parallel::Executor;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridShape {
    pub min_corner: Vec3,
    pub spacing: Vec3,
    pub num_points: [usize; 3],
}

impl GridShape {
    /// Shape covering `[min, max]` with roughly `cell_budget` cubical cells.
    pub fn with_cell_budget(min: Vec3, max: Vec3, cell_budget: usize) -> Self {
        // Flat or point-like boxes still need a non-zero volume.
        let floor = (max - min).max_element().max(1.0e-3) * 1.0e-2;
        let extent = (max - min).max(Vec3::splat(floor));
        let volume = extent.x * extent.y * extent.z;
        let cell_side = (volume / cell_budget.max(1) as f32).cbrt();

        let cells = |e: f32| ((e / cell_side * (1.0 - 1.0e-4)).ceil() as usize).max(1);
        let num_cells = [cells(extent.x), cells(extent.y), cells(extent.z)];
        let spacing = Vec3::new(
            extent.x / num_cells[0] as f32,
            extent.y / num_cells[1] as f32,
            extent.z / num_cells[2] as f32,
        );

        Self {
            min_corner: min,
            spacing,
            num_points: [num_cells[0] + 1, num_cells[1] + 1, num_cells[2] + 1],
        }
    }

    pub fn num_cells(&self) -> [usize; 3] {
        [
            self.num_points[0] - 1,
            self.num_points[1] - 1,
            self.num_points[2] - 1,
        ]
    }

    pub fn total_points(&self) -> usize {
        self.num_points[0] * self.num_points[1] * self.num_points[2]
    }

    pub fn total_cells(&self) -> usize {
        let [cx, cy, cz] = self.num_cells();
        cx * cy * cz
    }

    pub fn extent(&self) -> Vec3 {
        let [cx, cy, cz] = self.num_cells();
        self.spacing * Vec3::new(cx as f32, cy as f32, cz as f32)
    }

    pub fn max_corner(&self) -> Vec3 {
        self.min_corner + self.extent()
    }

    pub fn point_offset(&self, ix: usize, iy: usize, iz: usize) -> usize {
        ix + self.num_points[0] * (iy + self.num_points[1] * iz)
    }

    pub fn point_indices(&self, offset: usize) -> [usize; 3] {
        let ix = offset % self.num_points[0];
        let iy = (offset / self.num_points[0]) % self.num_points[1];
        let iz = offset / (self.num_points[0] * self.num_points[1]);
        [ix, iy, iz]
    }

    pub fn point_position(&self, ix: usize, iy: usize, iz: usize) -> Vec3 {
        self.min_corner + self.spacing * Vec3::new(ix as f32, iy as f32, iz as f32)
    }

    pub fn cell_min_corner(&self, cx: usize, cy: usize, cz: usize) -> Vec3 {
        self.point_position(cx, cy, cz)
    }

    /// Cell containing `position` and the fractional coordinates within it.
    pub fn cell_and_fraction(&self, position: Vec3) -> ([usize; 3], Vec3) {
        let local = (position - self.min_corner) / self.spacing;
        let cells = self.num_cells();
        let mut index = [0usize; 3];
        let mut fraction = Vec3::ZERO;
        for axis in 0..3 {
            let max = cells[axis] as f32;
            let t = local[axis].clamp(0.0, max);
            let i = (t.floor() as usize).min(cells[axis] - 1);
            index[axis] = i;
            fraction[axis] = t - i as f32;
        }
        (index, fraction)
    }

    pub fn cell_offset_of(&self, position: Vec3) -> usize {
        let ([cx, cy, cz], _) = self.cell_and_fraction(position);
        let [nx, ny, _] = self.num_cells();
        cx + nx * (cy + ny * cz)
    }
}

#[derive(Debug, Clone)]
pub struct UniformGrid<T> {
    shape: GridShape,
    values: Vec<T>,
}

impl<T: Copy> UniformGrid<T> {
    pub fn new(shape: GridShape, fill: T) -> Self {
        Self {
            values: vec![fill; shape.total_points()],
            shape,
        }
    }

    pub fn from_values(shape: GridShape, values: Vec<T>) -> Self {
        assert_eq!(values.len(), shape.total_points());
        Self { shape, values }
    }

    pub fn shape(&self) -> &GridShape {
        &self.shape
    }

    pub fn min_corner(&self) -> Vec3 {
        self.shape.min_corner
    }

    pub fn extent(&self) -> Vec3 {
        self.shape.extent()
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn get(&self, ix: usize, iy: usize, iz: usize) -> T {
        self.values[self.shape.point_offset(ix, iy, iz)]
    }
}

impl<T> UniformGrid<T>
where
    T: Copy + Add<Output = T> + Mul<f32, Output = T>,
{
    /// Trilinear interpolation, clamped to the grid boundary.
    pub fn interpolate(&self, position: Vec3) -> T {
        let ([ix, iy, iz], f) = self.shape.cell_and_fraction(position);
        let g = Vec3::ONE - f;

        let v000 = self.get(ix, iy, iz);
        let v100 = self.get(ix + 1, iy, iz);
        let v010 = self.get(ix, iy + 1, iz);
        let v110 = self.get(ix + 1, iy + 1, iz);
        let v001 = self.get(ix, iy, iz + 1);
        let v101 = self.get(ix + 1, iy, iz + 1);
        let v011 = self.get(ix, iy + 1, iz + 1);
        let v111 = self.get(ix + 1, iy + 1, iz + 1);

        v000 * (g.x * g.y * g.z)
            + v100 * (f.x * g.y * g.z)
            + v010 * (g.x * f.y * g.z)
            + v110 * (f.x * f.y * g.z)
            + v001 * (g.x * g.y * f.z)
            + v101 * (f.x * g.y * f.z)
            + v011 * (g.x * f.y * f.z)
            + v111 * (f.x * f.y * f.z)
    }
}

impl UniformGrid<Vec3> {
    /// Velocity gradient at every grid point. Column `j` of each matrix is
    /// the derivative of the field along axis `j`: central differences in the
    /// interior, one-sided differences on the boundary.
    pub fn jacobian(&self, executor: &Executor) -> UniformGrid<Mat3> {
        let shape = self.shape;
        let values = executor.map_collect(shape.total_points(), |offset| {
            let idx = shape.point_indices(offset);
            let mut cols = [Vec3::ZERO; 3];
            for (axis, col) in cols.iter_mut().enumerate() {
                let n = shape.num_points[axis];
                if n < 2 {
                    continue;
                }
                let lo = idx[axis].saturating_sub(1);
                let hi = (idx[axis] + 1).min(n - 1);
                let mut idx_lo = idx;
                let mut idx_hi = idx;
                idx_lo[axis] = lo;
                idx_hi[axis] = hi;
                let span = (hi - lo) as f32 * shape.spacing[axis];
                let diff = self.get(idx_hi[0], idx_hi[1], idx_hi[2])
                    - self.get(idx_lo[0], idx_lo[1], idx_lo[2]);
                *col = diff / span;
            }
            Mat3::from_cols(cols[0], cols[1], cols[2])
        });
        UniformGrid::from_values(shape, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_budget_is_respected_roughly() {
        let shape = GridShape::with_cell_budget(Vec3::ZERO, Vec3::new(2.0, 2.0, 2.0), 64);
        assert_eq!(shape.num_cells(), [4, 4, 4]);
        assert!((shape.max_corner() - Vec3::splat(2.0)).length() < 1e-5);
    }

    #[test]
    fn degenerate_box_still_has_cells() {
        let shape = GridShape::with_cell_budget(Vec3::ONE, Vec3::ONE, 8);
        assert!(shape.total_cells() >= 1);
        assert!(shape.spacing.min_element() > 0.0);
    }

    #[test]
    fn interpolation_is_exact_for_linear_field() {
        let shape = GridShape::with_cell_budget(Vec3::splat(-1.0), Vec3::splat(1.0), 27);
        let field = |p: Vec3| Vec3::new(2.0 * p.x + 1.0, -p.y, 0.5 * p.z);
        let values = (0..shape.total_points())
            .map(|o| {
                let [ix, iy, iz] = shape.point_indices(o);
                field(shape.point_position(ix, iy, iz))
            })
            .collect();
        let grid = UniformGrid::from_values(shape, values);

        let probe = Vec3::new(0.3, -0.45, 0.1);
        assert!((grid.interpolate(probe) - field(probe)).length() < 1e-5);

        let jacobian = grid.jacobian(&Executor::sequential());
        let j = jacobian.interpolate(probe);
        assert!((j.x_axis - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-4);
        assert!((j.y_axis - Vec3::new(0.0, -1.0, 0.0)).length() < 1e-4);
        assert!((j.z_axis - Vec3::new(0.0, 0.0, 0.5)).length() < 1e-4);
    }

    #[test]
    fn outside_positions_clamp() {
        let shape = GridShape::with_cell_budget(Vec3::ZERO, Vec3::ONE, 1);
        let grid = UniformGrid::new(shape, 3.0f32);
        assert_eq!(grid.interpolate(Vec3::splat(10.0)), 3.0);
        assert_eq!(shape.cell_offset_of(Vec3::splat(-5.0)), 0);
    }
}
