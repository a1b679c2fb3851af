//! Triangle meshes and the point-to-surface distance oracle seam.
//!
//! The mesh encoder needs one thing from a mesh backend: the unsigned
//! distance from each query point to the nearest point on the mesh surface
//! (faces, not vertices). [`SurfaceDistance`] is that seam; [`BvhSurface`]
//! is the built-in implementation, a flat bounding-volume hierarchy over
//! triangles with closest-point-on-triangle leaf tests.

use crate::error::{BpsError, Result};

/// An indexed triangle mesh.
#[derive(Debug, Clone)]
pub struct TriMesh {
    /// Vertex positions.
    pub vertices: Vec<[f32; 3]>,
    /// Triangles as vertex index triples.
    pub faces: Vec<[usize; 3]>,
}

impl TriMesh {
    /// Create a mesh from vertices and faces.
    pub fn new(vertices: Vec<[f32; 3]>, faces: Vec<[usize; 3]>) -> Self {
        Self { vertices, faces }
    }

    /// Number of vertices.
    pub fn n_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of faces.
    pub fn n_faces(&self) -> usize {
        self.faces.len()
    }

    /// Check structural validity: non-empty, all face indices in range.
    pub fn validate(&self) -> Result<()> {
        if self.vertices.is_empty() || self.faces.is_empty() {
            return Err(BpsError::InvalidMesh {
                message: "mesh has no vertices or no faces".to_string(),
            });
        }
        for (fid, face) in self.faces.iter().enumerate() {
            for &v in face {
                if v >= self.vertices.len() {
                    return Err(BpsError::InvalidMesh {
                        message: format!(
                            "face {} references vertex {} but mesh has {} vertices",
                            fid,
                            v,
                            self.vertices.len()
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Point-to-surface distance backend.
pub trait SurfaceDistance {
    /// Unsigned distance from each query point to the nearest point on the
    /// mesh surface. Returns one distance per query.
    fn surface_distances(&self, mesh: &TriMesh, queries: &[[f32; 3]]) -> Result<Vec<f32>>;
}

/// Built-in surface-distance oracle backed by a [`TriangleBvh`].
///
/// The hierarchy is rebuilt per mesh and amortized over all query points of
/// the call.
#[derive(Debug, Clone, Copy, Default)]
pub struct BvhSurface;

impl SurfaceDistance for BvhSurface {
    fn surface_distances(&self, mesh: &TriMesh, queries: &[[f32; 3]]) -> Result<Vec<f32>> {
        mesh.validate().map_err(|e| BpsError::Oracle {
            message: e.to_string(),
        })?;
        let bvh = TriangleBvh::build(mesh);
        Ok(queries.iter().map(|&q| bvh.distance(mesh, q)).collect())
    }
}

/// Triangles per BVH leaf.
const LEAF_SIZE: usize = 4;

#[derive(Debug, Clone, Copy)]
struct FlatNode {
    min: [f32; 3],
    max: [f32; 3],
    left: u32,
    right: u32,
    /// Leaf payload: span into `tri_order`. Internal nodes have `count == 0`.
    start: u32,
    count: u32,
}

impl FlatNode {
    fn dist_sq(&self, p: [f32; 3]) -> f32 {
        let mut acc = 0.0;
        for a in 0..3 {
            let d = (self.min[a] - p[a]).max(0.0).max(p[a] - self.max[a]);
            acc += d * d;
        }
        acc
    }
}

/// Flat bounding-volume hierarchy over mesh triangles.
///
/// Nodes live in a single `Vec` and leaves index into a reordered triangle
/// list, keeping traversal allocation-free apart from the explicit stack.
#[derive(Debug, Clone)]
pub struct TriangleBvh {
    nodes: Vec<FlatNode>,
    tri_order: Vec<u32>,
}

impl TriangleBvh {
    /// Build a hierarchy over the mesh triangles.
    pub fn build(mesh: &TriMesh) -> Self {
        let n = mesh.faces.len();
        let centroids: Vec<[f32; 3]> = mesh
            .faces
            .iter()
            .map(|&[i0, i1, i2]| {
                let (a, b, c) = (mesh.vertices[i0], mesh.vertices[i1], mesh.vertices[i2]);
                [
                    (a[0] + b[0] + c[0]) / 3.0,
                    (a[1] + b[1] + c[1]) / 3.0,
                    (a[2] + b[2] + c[2]) / 3.0,
                ]
            })
            .collect();

        let mut bvh = Self {
            nodes: Vec::with_capacity(2 * n / LEAF_SIZE + 1),
            tri_order: (0..n as u32).collect(),
        };
        if n > 0 {
            bvh.build_range(mesh, &centroids, 0, n);
        }
        bvh
    }

    /// Recursively build the node covering `tri_order[start..end]`.
    /// Returns the node index.
    fn build_range(
        &mut self,
        mesh: &TriMesh,
        centroids: &[[f32; 3]],
        start: usize,
        end: usize,
    ) -> u32 {
        let (min, max) = self.range_bounds(mesh, start, end);
        let node_idx = self.nodes.len() as u32;
        self.nodes.push(FlatNode {
            min,
            max,
            left: 0,
            right: 0,
            start: start as u32,
            count: (end - start) as u32,
        });

        if end - start <= LEAF_SIZE {
            return node_idx;
        }

        // Median split along the longest extent of the node bounds.
        let axis = longest_axis(min, max);
        let mid = (start + end) / 2;
        self.tri_order[start..end].select_nth_unstable_by(mid - start, |&a, &b| {
            centroids[a as usize][axis]
                .partial_cmp(&centroids[b as usize][axis])
                .unwrap_or(core::cmp::Ordering::Equal)
        });

        let left = self.build_range(mesh, centroids, start, mid);
        let right = self.build_range(mesh, centroids, mid, end);
        let node = &mut self.nodes[node_idx as usize];
        node.left = left;
        node.right = right;
        node.count = 0;
        node_idx
    }

    fn range_bounds(&self, mesh: &TriMesh, start: usize, end: usize) -> ([f32; 3], [f32; 3]) {
        let mut min = [f32::MAX; 3];
        let mut max = [f32::MIN; 3];
        for &tri in &self.tri_order[start..end] {
            for &v in &mesh.faces[tri as usize] {
                let p = mesh.vertices[v];
                for a in 0..3 {
                    min[a] = min[a].min(p[a]);
                    max[a] = max[a].max(p[a]);
                }
            }
        }
        (min, max)
    }

    /// Unsigned distance from `query` to the nearest point on the surface.
    pub fn distance(&self, mesh: &TriMesh, query: [f32; 3]) -> f32 {
        self.distance_squared(mesh, query).sqrt()
    }

    /// Squared distance from `query` to the nearest point on the surface.
    pub fn distance_squared(&self, mesh: &TriMesh, query: [f32; 3]) -> f32 {
        if self.nodes.is_empty() {
            return f32::MAX;
        }

        let mut best = f32::MAX;
        let mut stack = vec![0u32];

        while let Some(idx) = stack.pop() {
            let node = self.nodes[idx as usize];
            if node.dist_sq(query) >= best {
                continue;
            }

            if node.count > 0 {
                let span = node.start as usize..(node.start + node.count) as usize;
                for &tri in &self.tri_order[span] {
                    let [i0, i1, i2] = mesh.faces[tri as usize];
                    let closest = closest_point_on_triangle(
                        query,
                        mesh.vertices[i0],
                        mesh.vertices[i1],
                        mesh.vertices[i2],
                    );
                    best = best.min(len_sq(sub(query, closest)));
                }
            } else {
                // Push the farther child first so the closer one is
                // examined next and tightens the bound early.
                let (l, r) = (node.left, node.right);
                let ld = self.nodes[l as usize].dist_sq(query);
                let rd = self.nodes[r as usize].dist_sq(query);
                if ld < rd {
                    stack.push(r);
                    stack.push(l);
                } else {
                    stack.push(l);
                    stack.push(r);
                }
            }
        }

        best
    }
}

fn longest_axis(min: [f32; 3], max: [f32; 3]) -> usize {
    let extent = [max[0] - min[0], max[1] - min[1], max[2] - min[2]];
    if extent[0] >= extent[1] && extent[0] >= extent[2] {
        0
    } else if extent[1] >= extent[2] {
        1
    } else {
        2
    }
}

fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn dot(a: [f32; 3], b: [f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn len_sq(a: [f32; 3]) -> f32 {
    dot(a, a)
}

fn lerp2(a: [f32; 3], ab: [f32; 3], ac: [f32; 3], v: f32, w: f32) -> [f32; 3] {
    [
        a[0] + ab[0] * v + ac[0] * w,
        a[1] + ab[1] * v + ac[1] * w,
        a[2] + ab[2] * v + ac[2] * w,
    ]
}

/// Closest point on triangle `abc` to `p` (Voronoi-region case analysis).
fn closest_point_on_triangle(p: [f32; 3], a: [f32; 3], b: [f32; 3], c: [f32; 3]) -> [f32; 3] {
    let ab = sub(b, a);
    let ac = sub(c, a);

    let ap = sub(p, a);
    let d1 = dot(ab, ap);
    let d2 = dot(ac, ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return a;
    }

    let bp = sub(p, b);
    let d3 = dot(ab, bp);
    let d4 = dot(ac, bp);
    if d3 >= 0.0 && d4 <= d3 {
        return b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return lerp2(a, ab, ac, v, 0.0);
    }

    let cp = sub(p, c);
    let d5 = dot(ab, cp);
    let d6 = dot(ac, cp);
    if d6 >= 0.0 && d5 <= d6 {
        return c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return lerp2(a, ab, ac, 0.0, w);
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        let bc = sub(c, b);
        return [b[0] + bc[0] * w, b[1] + bc[1] * w, b[2] + bc[2] * w];
    }

    // Interior: project onto the triangle plane.
    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    lerp2(a, ab, ac, v, w)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_triangle() -> ([f32; 3], [f32; 3], [f32; 3]) {
        ([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0])
    }

    /// Unit cube mesh with 12 triangles.
    fn unit_cube() -> TriMesh {
        let vertices = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 1.0],
            [1.0, 1.0, 1.0],
            [0.0, 1.0, 1.0],
        ];
        let faces = vec![
            [0, 2, 1],
            [0, 3, 2],
            [4, 5, 6],
            [4, 6, 7],
            [0, 1, 5],
            [0, 5, 4],
            [2, 3, 7],
            [2, 7, 6],
            [1, 2, 6],
            [1, 6, 5],
            [3, 0, 4],
            [3, 4, 7],
        ];
        TriMesh::new(vertices, faces)
    }

    #[test]
    fn test_closest_point_regions() {
        let (a, b, c) = unit_triangle();

        // Vertex region.
        assert_eq!(closest_point_on_triangle([-1.0, -1.0, 0.0], a, b, c), a);
        assert_eq!(closest_point_on_triangle([2.0, -1.0, 0.0], a, b, c), b);
        // Edge region: closest to the midpoint of ab.
        let e = closest_point_on_triangle([0.5, -2.0, 0.0], a, b, c);
        assert!((e[0] - 0.5).abs() < 1e-6 && e[1].abs() < 1e-6);
        // Interior region: straight projection onto the plane.
        let i = closest_point_on_triangle([0.25, 0.25, 3.0], a, b, c);
        assert!((i[0] - 0.25).abs() < 1e-6);
        assert!((i[1] - 0.25).abs() < 1e-6);
        assert!(i[2].abs() < 1e-6);
    }

    #[test]
    fn test_mesh_validation() {
        let good = unit_cube();
        assert!(good.validate().is_ok());

        let empty = TriMesh::new(vec![], vec![]);
        assert!(empty.validate().is_err());

        let bad = TriMesh::new(vec![[0.0; 3]], vec![[0, 0, 7]]);
        assert!(matches!(
            bad.validate(),
            Err(BpsError::InvalidMesh { .. })
        ));
    }

    #[test]
    fn test_cube_surface_distances() {
        let mesh = unit_cube();
        let queries = [
            [0.5, 0.5, 2.0],   // above the top face
            [0.5, 0.5, 0.5],   // center, 0.5 from every face
            [-1.0, 0.5, 0.5],  // beside a side face
            [0.5, 0.5, 1.0],   // on the surface
        ];
        let dists = BvhSurface.surface_distances(&mesh, &queries).unwrap();
        let expected = [1.0, 0.5, 1.0, 0.0];
        for (d, e) in dists.iter().zip(expected) {
            assert!((d - e).abs() < 1e-5, "got {}, expected {}", d, e);
        }
    }

    #[test]
    fn test_bvh_matches_exhaustive_scan() {
        let mesh = unit_cube();
        let bvh = TriangleBvh::build(&mesh);

        let queries = [
            [0.3, -0.7, 0.2],
            [1.4, 1.4, 1.4],
            [0.5, 0.5, 0.49],
            [-0.2, 0.9, 1.3],
        ];
        for q in queries {
            let mut brute = f32::MAX;
            for &[i0, i1, i2] in &mesh.faces {
                let cp = closest_point_on_triangle(
                    q,
                    mesh.vertices[i0],
                    mesh.vertices[i1],
                    mesh.vertices[i2],
                );
                brute = brute.min(len_sq(sub(q, cp)));
            }
            let via_bvh = bvh.distance_squared(&mesh, q);
            assert!(
                (via_bvh - brute).abs() < 1e-6,
                "bvh {} vs exhaustive {}",
                via_bvh,
                brute
            );
        }
    }

    #[test]
    fn test_oracle_rejects_invalid_mesh() {
        let bad = TriMesh::new(vec![[0.0; 3]], vec![[0, 0, 3]]);
        let err = BvhSurface
            .surface_distances(&bad, &[[0.0; 3]])
            .unwrap_err();
        assert!(matches!(err, BpsError::Oracle { .. }));
    }
}
