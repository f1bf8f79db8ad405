//! Static triangle meshes
//!
//! [`MeshGeometry`] holds the local-space vertices, per-triangle records and
//! the spatial index, built once and shared through `Arc`. A
//! [`TriangleMesh`] places that geometry in the world.

use std::collections::HashMap;
use std::sync::Arc;

use bitflags::bitflags;

use super::aabb::AABB;
use super::plane::Plane;
use super::triangle::Triangle;
use super::GeometryError;
use crate::config::MeshIndexConfig;
use crate::foundation::math::{Transform, Vec3};
use crate::spatial::{CandidateBuffer, MeshIndex, TriangleIndex};

/// Neighbour vertices closer to the plane than this fraction of the shared edge length count as coplanar
const COPLANAR_FRACTION: f32 = 1.0e-3;

/// Degenerate triangles below this doubled area are skipped at build time
const MIN_DOUBLE_AREA: f32 = 1.0e-12;

bitflags! {
    /// Which edges and vertices of a triangle are convex
    ///
    /// Edge `i` runs from vertex `i` to vertex `(i + 1) % 3`. An edge is convex
    /// when it is on the mesh boundary or the neighbouring triangle folds away
    /// behind this triangle's plane; coplanar and concave edges are not. A
    /// vertex is convex when both of its edges in this triangle are.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ConvexFlags: u8 {
        /// Edge 0 (v0 → v1)
        const EDGE0 = 1 << 0;
        /// Edge 1 (v1 → v2)
        const EDGE1 = 1 << 1;
        /// Edge 2 (v2 → v0)
        const EDGE2 = 1 << 2;
        /// Vertex 0
        const VERT0 = 1 << 3;
        /// Vertex 1
        const VERT1 = 1 << 4;
        /// Vertex 2
        const VERT2 = 1 << 5;
    }
}

impl ConvexFlags {
    const EDGES: [ConvexFlags; 3] = [ConvexFlags::EDGE0, ConvexFlags::EDGE1, ConvexFlags::EDGE2];
    const VERTS: [ConvexFlags; 3] = [ConvexFlags::VERT0, ConvexFlags::VERT1, ConvexFlags::VERT2];

    /// Flag for edge `i`
    pub fn edge(i: usize) -> ConvexFlags {
        Self::EDGES[i]
    }

    /// Flag for vertex `i`
    pub fn vertex(i: usize) -> ConvexFlags {
        Self::VERTS[i]
    }
}

/// A mesh triangle referencing the owner's vertex array
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexedTriangle {
    /// Vertex indices, counter-clockwise seen from the front
    pub vertices: [u32; 3],
    /// Local-space supporting plane
    pub plane: Plane,
    /// Local-space bounds
    pub aabb: AABB,
    /// Edge and vertex convexity
    pub convex: ConvexFlags,
}

impl IndexedTriangle {
    /// True if edge `i` (v_i → v_{i+1}) is convex
    pub fn is_edge_convex(&self, i: usize) -> bool {
        self.convex.contains(ConvexFlags::edge(i))
    }

    /// True if vertex `i` is convex
    pub fn is_vertex_convex(&self, i: usize) -> bool {
        self.convex.contains(ConvexFlags::vertex(i))
    }
}

/// Local-space mesh data with its spatial index
#[derive(Debug, Clone)]
pub struct MeshGeometry {
    vertices: Vec<Vec3>,
    triangles: Vec<IndexedTriangle>,
    index: MeshIndex,
    bounds: AABB,
}

impl MeshGeometry {
    /// Build from vertices and a flat triangle index list
    pub fn new(
        vertices: Vec<Vec3>,
        indices: &[u32],
        config: &MeshIndexConfig,
    ) -> Result<Self, GeometryError> {
        if indices.len() % 3 != 0 {
            return Err(GeometryError::IndexCount(indices.len()));
        }
        if vertices.iter().any(|v| !(v.x.is_finite() && v.y.is_finite() && v.z.is_finite())) {
            return Err(GeometryError::NonFinite("mesh vertex"));
        }
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(GeometryError::VertexIndexOutOfRange {
                index,
                vertex_count: vertices.len(),
            });
        }

        let mut triples = Vec::with_capacity(indices.len() / 3);
        let mut skipped = 0;
        for chunk in indices.chunks_exact(3) {
            let triple = [chunk[0], chunk[1], chunk[2]];
            let tri = Triangle::from_points(
                vertices[triple[0] as usize],
                vertices[triple[1] as usize],
                vertices[triple[2] as usize],
            );
            if tri.double_area() > MIN_DOUBLE_AREA {
                triples.push(triple);
            } else {
                skipped += 1;
            }
        }
        if skipped > 0 {
            log::warn!("Skipped {} degenerate mesh triangles", skipped);
        }
        if triples.is_empty() {
            return Err(GeometryError::EmptyMesh);
        }

        let convex = compute_convexity(&vertices, &triples);
        let triangles: Vec<IndexedTriangle> = triples
            .iter()
            .zip(convex)
            .map(|(&triple, convex)| {
                let corners = triple.map(|i| vertices[i as usize]);
                IndexedTriangle {
                    vertices: triple,
                    plane: Plane::from_points(corners[0], corners[1], corners[2]),
                    aabb: AABB::from_points(&corners),
                    convex,
                }
            })
            .collect();

        let bounds = triangles.iter().fold(AABB::empty(), |acc, t| acc.merge(&t.aabb));
        let index = MeshIndex::build(config, &triples, &vertices)?;

        Ok(Self {
            vertices,
            triangles,
            index,
            bounds,
        })
    }

    /// Local-space vertex `i`
    pub fn vertex(&self, i: u32) -> Vec3 {
        self.vertices[i as usize]
    }

    /// All local-space vertices
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Triangle record `i`
    pub fn triangle(&self, i: u32) -> &IndexedTriangle {
        &self.triangles[i as usize]
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Triangle `i` as local-space geometry
    pub fn local_triangle(&self, i: u32) -> Triangle {
        let [a, b, c] = self.triangles[i as usize].vertices;
        Triangle::from_points(self.vertex(a), self.vertex(b), self.vertex(c))
    }

    /// Spatial index over the triangles
    pub fn index(&self) -> &MeshIndex {
        &self.index
    }

    /// Local-space bounds
    pub fn bounds(&self) -> AABB {
        self.bounds
    }
}

fn compute_convexity(vertices: &[Vec3], triples: &[[u32; 3]]) -> Vec<ConvexFlags> {
    // Undirected edge -> (triangle, edge slot) of every triangle using it
    let mut edge_users: HashMap<(u32, u32), Vec<(usize, usize)>> = HashMap::new();
    for (t, triple) in triples.iter().enumerate() {
        for e in 0..3 {
            let a = triple[e];
            let b = triple[(e + 1) % 3];
            edge_users.entry((a.min(b), a.max(b))).or_default().push((t, e));
        }
    }

    let planes: Vec<Plane> = triples
        .iter()
        .map(|t| {
            Plane::from_points(
                vertices[t[0] as usize],
                vertices[t[1] as usize],
                vertices[t[2] as usize],
            )
        })
        .collect();

    triples
        .iter()
        .enumerate()
        .map(|(t, triple)| {
            let mut flags = ConvexFlags::empty();
            for e in 0..3 {
                let a = triple[e];
                let b = triple[(e + 1) % 3];
                let edge_length = (vertices[b as usize] - vertices[a as usize]).magnitude();
                let threshold = COPLANAR_FRACTION * edge_length;

                let convex = edge_users[&(a.min(b), a.max(b))]
                    .iter()
                    .filter(|&&(other, _)| other != t)
                    .all(|&(other, other_edge)| {
                        let opposite = triples[other][(other_edge + 2) % 3];
                        planes[t].distance_to_point(vertices[opposite as usize]) < -threshold
                    });
                if convex {
                    flags |= ConvexFlags::edge(e);
                }
            }
            for v in 0..3 {
                let previous_edge = (v + 2) % 3;
                if flags.contains(ConvexFlags::edge(v)) && flags.contains(ConvexFlags::edge(previous_edge)) {
                    flags |= ConvexFlags::vertex(v);
                }
            }
            flags
        })
        .collect()
}

/// Mesh geometry placed in the world by a rigid transform
#[derive(Debug, Clone)]
pub struct TriangleMesh {
    /// Shared local-space geometry
    pub geometry: Arc<MeshGeometry>,
    transform: Transform,
    inverse: Transform,
}

impl PartialEq for TriangleMesh {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.geometry, &other.geometry) && self.transform == other.transform
    }
}

impl TriangleMesh {
    /// Place geometry in the world
    pub fn new(geometry: Arc<MeshGeometry>, transform: Transform) -> Self {
        Self {
            geometry,
            inverse: transform.inverse(),
            transform,
        }
    }

    /// Build geometry and place it at the origin
    pub fn from_vertices(
        vertices: Vec<Vec3>,
        indices: &[u32],
        config: &MeshIndexConfig,
    ) -> Result<Self, GeometryError> {
        let geometry = MeshGeometry::new(vertices, indices, config)?;
        Ok(Self::new(Arc::new(geometry), Transform::identity()))
    }

    /// Local-to-world transform
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// World-to-local transform
    pub fn inverse_transform(&self) -> &Transform {
        &self.inverse
    }

    /// Replace the local-to-world transform
    pub fn set_transform(&mut self, transform: Transform) {
        self.inverse = transform.inverse();
        self.transform = transform;
    }

    /// Local-space vertex `i`
    pub fn vertex(&self, i: u32) -> Vec3 {
        self.geometry.vertex(i)
    }

    /// Triangle record `i`
    pub fn triangle(&self, i: u32) -> &IndexedTriangle {
        self.geometry.triangle(i)
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.geometry.triangle_count()
    }

    /// Triangle `i` in mesh-local space
    pub fn local_triangle(&self, i: u32) -> Triangle {
        self.geometry.local_triangle(i)
    }

    /// Triangle `i` in world space
    pub fn world_triangle(&self, i: u32) -> Triangle {
        self.geometry.local_triangle(i).transformed(&self.transform)
    }

    /// Clear `out` and fill it with triangles whose bounds may overlap a world-space box
    pub fn triangles_intersecting_aabb(&self, world_aabb: &AABB, out: &mut CandidateBuffer) -> usize {
        out.clear();
        let local = world_aabb.transformed(&self.inverse);
        self.geometry.index().query(&local, out)
    }

    /// World bounding box
    pub fn aabb(&self) -> AABB {
        self.geometry.bounds().transformed(&self.transform)
    }

    /// Mesh after a rigid transform
    pub fn transformed(&self, transform: &Transform) -> TriangleMesh {
        TriangleMesh::new(Arc::clone(&self.geometry), transform.combine(&self.transform))
    }
}
