//! Regular-grid terrain heightmaps
//!
//! The grid lies on the local XZ plane with heights along local +Y. Each cell
//! is split into two triangles along its (0,0)-(1,1) diagonal, and heights and
//! normals are interpolated on the triangle containing the query point.

use std::sync::Arc;

use super::aabb::AABB;
use super::GeometryError;
use crate::foundation::math::{Transform, Vec3};

/// Height samples and grid layout, shared between heightmap copies
#[derive(Debug, Clone, PartialEq)]
pub struct HeightmapData {
    heights: Vec<f32>,
    nx: usize,
    nz: usize,
    x_min: f32,
    z_min: f32,
    dx: f32,
    dz: f32,
    min_height: f32,
    max_height: f32,
}

impl HeightmapData {
    /// Create a grid of `nx * nz` samples (row-major along x) starting at
    /// `(x_min, z_min)` with spacing `dx`, `dz`
    pub fn new(
        heights: Vec<f32>,
        nx: usize,
        nz: usize,
        x_min: f32,
        z_min: f32,
        dx: f32,
        dz: f32,
    ) -> Result<Self, GeometryError> {
        if nx < 2 || nz < 2 {
            return Err(GeometryError::HeightmapTooSmall { nx, nz });
        }
        if heights.len() != nx * nz {
            return Err(GeometryError::HeightmapSampleCount {
                expected: nx * nz,
                actual: heights.len(),
            });
        }
        if !(dx > 0.0 && dz > 0.0) {
            return Err(GeometryError::HeightmapSpacing { dx, dz });
        }
        if heights.iter().any(|h| !h.is_finite()) {
            return Err(GeometryError::NonFinite("heightmap sample"));
        }

        let min_height = heights.iter().copied().fold(f32::MAX, f32::min);
        let max_height = heights.iter().copied().fold(-f32::MAX, f32::max);

        Ok(Self {
            heights,
            nx,
            nz,
            x_min,
            z_min,
            dx,
            dz,
            min_height,
            max_height,
        })
    }

    /// Flat grid at height zero
    pub fn flat(nx: usize, nz: usize, x_min: f32, z_min: f32, dx: f32, dz: f32) -> Result<Self, GeometryError> {
        Self::new(vec![0.0; nx * nz], nx, nz, x_min, z_min, dx, dz)
    }

    /// Sample at grid coordinates
    pub fn height(&self, ix: usize, iz: usize) -> f32 {
        self.heights[iz * self.nx + ix]
    }

    /// Local-space bounds of the terrain surface
    pub fn local_aabb(&self) -> AABB {
        AABB::new(
            Vec3::new(self.x_min, self.min_height, self.z_min),
            Vec3::new(
                self.x_min + self.dx * (self.nx - 1) as f32,
                self.max_height,
                self.z_min + self.dz * (self.nz - 1) as f32,
            ),
        )
    }

    /// Interpolated height and unit normal at a local (x, z); outside points clamp to the border
    pub fn local_height_and_normal(&self, x: f32, z: f32) -> (f32, Vec3) {
        let max_fx = (self.nx - 1) as f32;
        let max_fz = (self.nz - 1) as f32;
        let fx = ((x - self.x_min) / self.dx).clamp(0.0, max_fx);
        let fz = ((z - self.z_min) / self.dz).clamp(0.0, max_fz);

        let ix = (fx.floor() as usize).min(self.nx - 2);
        let iz = (fz.floor() as usize).min(self.nz - 2);
        let u = fx - ix as f32;
        let w = fz - iz as f32;

        let h00 = self.height(ix, iz);
        let h10 = self.height(ix + 1, iz);
        let h01 = self.height(ix, iz + 1);
        let h11 = self.height(ix + 1, iz + 1);

        let (height, slope_x, slope_z) = if u + w <= 1.0 {
            (
                h00 + u * (h10 - h00) + w * (h01 - h00),
                (h10 - h00) / self.dx,
                (h01 - h00) / self.dz,
            )
        } else {
            (
                h11 + (1.0 - u) * (h01 - h11) + (1.0 - w) * (h10 - h11),
                (h11 - h01) / self.dx,
                (h11 - h10) / self.dz,
            )
        };

        let normal = Vec3::new(-slope_x, 1.0, -slope_z).normalize();
        (height, normal)
    }
}

/// A heightmap placed in the world
#[derive(Debug, Clone, PartialEq)]
pub struct Heightmap {
    /// Shared grid data
    pub data: Arc<HeightmapData>,
    /// Local-to-world transform
    pub transform: Transform,
}

impl Heightmap {
    /// Place grid data in the world
    pub fn new(data: Arc<HeightmapData>, transform: Transform) -> Self {
        Self { data, transform }
    }

    /// Signed distance of a world point above the terrain and the world-space surface normal
    ///
    /// The distance is the vertical gap scaled by the normal's vertical
    /// component, which is exact on flat ground and an approximation on slopes.
    pub fn height_and_normal(&self, point: Vec3) -> (f32, Vec3) {
        let local = self.transform.inverse_transform_point(point);
        let (height, normal) = self.data.local_height_and_normal(local.x, local.z);
        let distance = (local.y - height) * normal.y;
        (distance, self.transform.transform_vector(normal))
    }

    /// World bounding box
    pub fn aabb(&self) -> AABB {
        self.data.local_aabb().transformed(&self.transform)
    }

    /// Heightmap after a rigid transform
    pub fn transformed(&self, transform: &Transform) -> Heightmap {
        Heightmap {
            data: Arc::clone(&self.data),
            transform: transform.combine(&self.transform),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rejects_bad_layout() {
        assert!(matches!(
            HeightmapData::new(vec![0.0; 3], 1, 3, 0.0, 0.0, 1.0, 1.0),
            Err(GeometryError::HeightmapTooSmall { .. })
        ));
        assert!(matches!(
            HeightmapData::new(vec![0.0; 3], 2, 2, 0.0, 0.0, 1.0, 1.0),
            Err(GeometryError::HeightmapSampleCount { expected: 4, actual: 3 })
        ));
        assert!(matches!(
            HeightmapData::new(vec![0.0; 4], 2, 2, 0.0, 0.0, 0.0, 1.0),
            Err(GeometryError::HeightmapSpacing { .. })
        ));
    }

    #[test]
    fn test_flat_terrain_distance() {
        let data = Arc::new(HeightmapData::flat(5, 5, -2.0, -2.0, 1.0, 1.0).unwrap());
        let map = Heightmap::new(data, Transform::from_position(Vec3::new(0.0, 1.0, 0.0)));

        let (dist, normal) = map.height_and_normal(Vec3::new(0.3, 3.0, -0.7));
        assert_relative_eq!(dist, 2.0, epsilon = 1e-6);
        assert_relative_eq!(normal, Vec3::y(), epsilon = 1e-6);
    }

    #[test]
    fn test_sloped_cell_interpolation() {
        // Height rises by 1 per unit of x
        let heights = vec![0.0, 1.0, 0.0, 1.0];
        let data = HeightmapData::new(heights, 2, 2, 0.0, 0.0, 1.0, 1.0).unwrap();

        for &(x, z) in &[(0.25, 0.25), (0.75, 0.75), (0.5, 0.1)] {
            let (h, n) = data.local_height_and_normal(x, z);
            assert_relative_eq!(h, x, epsilon = 1e-6);
            assert_relative_eq!(n, Vec3::new(-1.0, 1.0, 0.0).normalize(), epsilon = 1e-6);
        }
    }

    #[test]
    fn test_outside_grid_clamps() {
        let heights = vec![0.0, 2.0, 0.0, 2.0];
        let data = HeightmapData::new(heights, 2, 2, 0.0, 0.0, 1.0, 1.0).unwrap();
        let (h, _) = data.local_height_and_normal(10.0, 0.5);
        assert_relative_eq!(h, 2.0, epsilon = 1e-6);
    }
}
