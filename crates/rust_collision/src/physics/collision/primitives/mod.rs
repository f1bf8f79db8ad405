//! Geometric primitives for narrow-phase collision
//!
//! Shapes are stored in body-local space and transformed into world space
//! once per step (old and new pose). Heightmap and mesh geometry is shared
//! through `Arc`, so transformed copies only carry a new [`Transform`].

mod aabb;
mod heightmap;
mod oriented_box;
mod plane;
mod segment;
mod sphere;
mod triangle;
mod triangle_mesh;

pub use aabb::AABB;
pub use heightmap::{Heightmap, HeightmapData};
pub use oriented_box::OrientedBox;
pub use plane::Plane;
pub use segment::{Line, Ray, Segment};
pub use sphere::{Capsule, Sphere};
pub use triangle::Triangle;
pub use triangle_mesh::{ConvexFlags, IndexedTriangle, MeshGeometry, TriangleMesh};

use crate::foundation::math::Transform;

/// Errors raised while building collision geometry
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Mesh has no triangles
    #[error("mesh has no triangles")]
    EmptyMesh,

    /// Index buffer cannot be split into triangles
    #[error("index count {0} is not a multiple of 3")]
    IndexCount(usize),

    /// A triangle references a vertex that does not exist
    #[error("vertex index {index} out of range for {vertex_count} vertices")]
    VertexIndexOutOfRange {
        /// Offending index
        index: u32,
        /// Number of vertices in the mesh
        vertex_count: usize,
    },

    /// Vertex index too large for the k-d tree triangle key
    #[error("vertex index {0} does not fit in a 21-bit triangle key")]
    VertexKeyOverflow(u32),

    /// NaN or infinite input
    #[error("non-finite {0}")]
    NonFinite(&'static str),

    /// Heightmap needs at least one full cell
    #[error("heightmap must be at least 2x2 samples, got {nx}x{nz}")]
    HeightmapTooSmall {
        /// Samples along x
        nx: usize,
        /// Samples along z
        nz: usize,
    },

    /// Height buffer does not match the grid layout
    #[error("heightmap expects {expected} samples, got {actual}")]
    HeightmapSampleCount {
        /// `nx * nz`
        expected: usize,
        /// Length of the supplied buffer
        actual: usize,
    },

    /// Grid spacing must be positive
    #[error("heightmap spacing must be positive, got dx={dx} dz={dz}")]
    HeightmapSpacing {
        /// Spacing along x
        dx: f32,
        /// Spacing along z
        dz: f32,
    },
}

/// Discriminant of [`Primitive`], used to index the detector table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveKind {
    /// Oriented box
    Box = 0,
    /// Sphere
    Sphere = 1,
    /// Capsule
    Capsule = 2,
    /// Infinite plane
    Plane = 3,
    /// Terrain heightmap
    Heightmap = 4,
    /// Static triangle mesh
    TriangleMesh = 5,
}

impl PrimitiveKind {
    /// Number of primitive kinds
    pub const COUNT: usize = 6;

    /// Every kind in table order
    pub const ALL: [PrimitiveKind; Self::COUNT] = [
        PrimitiveKind::Box,
        PrimitiveKind::Sphere,
        PrimitiveKind::Capsule,
        PrimitiveKind::Plane,
        PrimitiveKind::Heightmap,
        PrimitiveKind::TriangleMesh,
    ];

    /// Row/column in the detector table
    pub fn index(self) -> usize {
        self as usize
    }

    /// Human-readable name
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Box => "Box",
            PrimitiveKind::Sphere => "Sphere",
            PrimitiveKind::Capsule => "Capsule",
            PrimitiveKind::Plane => "Plane",
            PrimitiveKind::Heightmap => "Heightmap",
            PrimitiveKind::TriangleMesh => "TriangleMesh",
        }
    }

    /// Immovable world geometry
    pub fn is_static(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Plane | PrimitiveKind::Heightmap | PrimitiveKind::TriangleMesh
        )
    }
}

/// A collision primitive
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// Oriented box
    Box(OrientedBox),
    /// Sphere
    Sphere(Sphere),
    /// Capsule
    Capsule(Capsule),
    /// Infinite plane
    Plane(Plane),
    /// Terrain heightmap
    Heightmap(Heightmap),
    /// Static triangle mesh
    TriangleMesh(TriangleMesh),
}

impl Primitive {
    /// Kind tag of this primitive
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Primitive::Box(_) => PrimitiveKind::Box,
            Primitive::Sphere(_) => PrimitiveKind::Sphere,
            Primitive::Capsule(_) => PrimitiveKind::Capsule,
            Primitive::Plane(_) => PrimitiveKind::Plane,
            Primitive::Heightmap(_) => PrimitiveKind::Heightmap,
            Primitive::TriangleMesh(_) => PrimitiveKind::TriangleMesh,
        }
    }

    /// Primitive mapped by a rigid transform (body-local to world)
    pub fn transformed(&self, transform: &Transform) -> Primitive {
        match self {
            Primitive::Box(b) => Primitive::Box(b.transformed(transform)),
            Primitive::Sphere(s) => Primitive::Sphere(s.transformed(transform)),
            Primitive::Capsule(c) => Primitive::Capsule(c.transformed(transform)),
            Primitive::Plane(p) => Primitive::Plane(p.transformed(transform)),
            Primitive::Heightmap(h) => Primitive::Heightmap(h.transformed(transform)),
            Primitive::TriangleMesh(m) => Primitive::TriangleMesh(m.transformed(transform)),
        }
    }

    /// World bounding box; `None` for unbounded planes
    pub fn aabb(&self) -> Option<AABB> {
        match self {
            Primitive::Box(b) => Some(b.aabb()),
            Primitive::Sphere(s) => Some(s.aabb()),
            Primitive::Capsule(c) => Some(c.aabb()),
            Primitive::Plane(_) => None,
            Primitive::Heightmap(h) => Some(h.aabb()),
            Primitive::TriangleMesh(m) => Some(m.aabb()),
        }
    }

    /// Box payload, if this is a box
    pub fn as_box(&self) -> Option<&OrientedBox> {
        match self {
            Primitive::Box(b) => Some(b),
            _ => None,
        }
    }

    /// Sphere payload, if this is a sphere
    pub fn as_sphere(&self) -> Option<&Sphere> {
        match self {
            Primitive::Sphere(s) => Some(s),
            _ => None,
        }
    }

    /// Capsule payload, if this is a capsule
    pub fn as_capsule(&self) -> Option<&Capsule> {
        match self {
            Primitive::Capsule(c) => Some(c),
            _ => None,
        }
    }

    /// Plane payload, if this is a plane
    pub fn as_plane(&self) -> Option<&Plane> {
        match self {
            Primitive::Plane(p) => Some(p),
            _ => None,
        }
    }

    /// Heightmap payload, if this is a heightmap
    pub fn as_heightmap(&self) -> Option<&Heightmap> {
        match self {
            Primitive::Heightmap(h) => Some(h),
            _ => None,
        }
    }

    /// Mesh payload, if this is a triangle mesh
    pub fn as_triangle_mesh(&self) -> Option<&TriangleMesh> {
        match self {
            Primitive::TriangleMesh(m) => Some(m),
            _ => None,
        }
    }
}

impl From<OrientedBox> for Primitive {
    fn from(b: OrientedBox) -> Self {
        Primitive::Box(b)
    }
}

impl From<Sphere> for Primitive {
    fn from(s: Sphere) -> Self {
        Primitive::Sphere(s)
    }
}

impl From<Capsule> for Primitive {
    fn from(c: Capsule) -> Self {
        Primitive::Capsule(c)
    }
}

impl From<Plane> for Primitive {
    fn from(p: Plane) -> Self {
        Primitive::Plane(p)
    }
}

impl From<Heightmap> for Primitive {
    fn from(h: Heightmap) -> Self {
        Primitive::Heightmap(h)
    }
}

impl From<TriangleMesh> for Primitive {
    fn from(m: TriangleMesh) -> Self {
        Primitive::TriangleMesh(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;

    #[test]
    fn test_kind_table_order() {
        for (i, kind) in PrimitiveKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
        assert!(PrimitiveKind::Heightmap.is_static());
        assert!(!PrimitiveKind::Capsule.is_static());
    }

    #[test]
    fn test_transformed_keeps_kind() {
        let sphere = Primitive::from(Sphere::new(Vec3::zeros(), 1.0));
        let moved = sphere.transformed(&Transform::from_position(Vec3::new(0.0, 2.0, 0.0)));
        assert_eq!(moved.kind(), PrimitiveKind::Sphere);
        assert_eq!(moved.as_sphere().unwrap().position, Vec3::new(0.0, 2.0, 0.0));
        assert!(moved.as_box().is_none());
    }
}
