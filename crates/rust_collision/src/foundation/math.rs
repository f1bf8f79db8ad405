//! Math utilities and types
//!
//! Provides the fundamental math types used by the collision core. All
//! collision math runs in `f32`, matching the rest of the engine.

pub use nalgebra::{
    Vector3,
    Matrix3,
    Quaternion,
    Unit,
};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Rigid transform: rotation followed by translation.
///
/// Collision shapes never carry scale; a scaled shape is expressed by its own
/// extents instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform with position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Rotation as a 3x3 matrix whose columns are the local axes in world space
    pub fn rotation_matrix(&self) -> Mat3 {
        *self.rotation.to_rotation_matrix().matrix()
    }

    /// Apply this transform to a point
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation * point + self.position
    }

    /// Apply this transform to a direction (rotation only)
    pub fn transform_vector(&self, vector: Vec3) -> Vec3 {
        self.rotation * vector
    }

    /// Map a world point into this transform's local frame
    pub fn inverse_transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation.inverse_transform_vector(&(point - self.position))
    }

    /// Map a world direction into this transform's local frame
    pub fn inverse_transform_vector(&self, vector: Vec3) -> Vec3 {
        self.rotation.inverse_transform_vector(&vector)
    }

    /// Combine this transform with another (`self * other`)
    pub fn combine(&self, other: &Transform) -> Transform {
        Transform {
            position: self.position + self.rotation * other.position,
            rotation: self.rotation * other.rotation,
        }
    }

    /// Get the inverse transform
    pub fn inverse(&self) -> Transform {
        let inv_rotation = self.rotation.inverse();
        Transform {
            position: inv_rotation * (-self.position),
            rotation: inv_rotation,
        }
    }

    /// Interpolate between two transforms: linear in position, spherical in rotation
    pub fn interpolate(&self, other: &Transform, t: f32) -> Transform {
        Transform {
            position: self.position.lerp(&other.position, t),
            rotation: self
                .rotation
                .try_slerp(&other.rotation, t, 1.0e-6)
                .unwrap_or(other.rotation),
        }
    }
}

/// Numerical tolerances shared by the collision routines
pub mod epsilon {
    /// General-purpose small value for degeneracy gates
    pub const EPSILON: f32 = 1.0e-6;

    /// Squared-length below which a direction is considered degenerate
    pub const DIRECTION_SQ: f32 = 1.0e-10;

    /// Parallel rejection threshold for plane intersections (`|n·d|`)
    pub const PARALLEL: f32 = 1.0e-6;
}

/// Math utility functions
pub mod utils {
    use super::*;

    /// Clamp a value between min and max
    pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
        if value < min { min } else if value > max { max } else { value }
    }

    /// Normalize `v`, or return `None` when it is too short to have a direction
    pub fn try_normalize(v: Vec3) -> Option<Vec3> {
        let len_sq = v.magnitude_squared();
        if len_sq > epsilon::DIRECTION_SQ {
            Some(v / len_sq.sqrt())
        } else {
            None
        }
    }

    /// Component-wise minimum of two vectors
    pub fn min_vec(a: Vec3, b: Vec3) -> Vec3 {
        Vec3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z))
    }

    /// Component-wise maximum of two vectors
    pub fn max_vec(a: Vec3, b: Vec3) -> Vec3 {
        Vec3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_transform_inverse_roundtrip() {
        let rotation = Quat::from_axis_angle(&Vec3::y_axis(), 0.7);
        let transform = Transform::from_position_rotation(Vec3::new(1.0, -2.0, 3.0), rotation);
        let point = Vec3::new(0.3, 0.4, -5.0);

        let world = transform.transform_point(point);
        assert_relative_eq!(transform.inverse_transform_point(world), point, epsilon = EPSILON);
        assert_relative_eq!(transform.inverse().transform_point(world), point, epsilon = EPSILON);
    }

    #[test]
    fn test_combine_with_inverse_is_identity() {
        let rotation = Quat::from_axis_angle(&Vec3::x_axis(), -1.2);
        let transform = Transform::from_position_rotation(Vec3::new(4.0, 0.5, -1.0), rotation);
        let identity = transform.combine(&transform.inverse());

        assert_relative_eq!(identity.position, Vec3::zeros(), epsilon = EPSILON);
        assert_relative_eq!(identity.rotation, Quat::identity(), epsilon = EPSILON);
    }

    #[test]
    fn test_interpolate_midpoint() {
        let a = Transform::from_position(Vec3::new(0.0, 0.0, 0.0));
        let b = Transform::from_position_rotation(
            Vec3::new(2.0, 4.0, 0.0),
            Quat::from_axis_angle(&Vec3::z_axis(), 1.0),
        );
        let mid = a.interpolate(&b, 0.5);

        assert_relative_eq!(mid.position, Vec3::new(1.0, 2.0, 0.0), epsilon = EPSILON);
        assert_relative_eq!(mid.rotation.angle(), 0.5, epsilon = EPSILON);
    }

    #[test]
    fn test_try_normalize_rejects_zero() {
        assert!(utils::try_normalize(Vec3::zeros()).is_none());
        let n = utils::try_normalize(Vec3::new(0.0, 3.0, 4.0)).unwrap();
        assert_relative_eq!(n.magnitude(), 1.0, epsilon = EPSILON);
    }
}
