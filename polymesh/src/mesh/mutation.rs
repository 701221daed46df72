//! Structural mutations.
//!
//! Insertions are split into two phases. First, a cache snapshots and
//! validates everything the insertion requires from the mesh. Only then is the
//! mesh modified, using the cache. A failed snapshot leaves the mesh untouched,
//! so adjacency is never partially written.

use arrayvec::ArrayVec;
use itertools::Itertools;
use nalgebra::Point3;
use smallvec::SmallVec;
use std::collections::BTreeSet;
use tracing::{debug, trace};

use crate::key::Key;
use crate::mesh::connectivity::EdgeConnectivity;
use crate::mesh::{
    loop_pairs, CellKey, EdgeKey, FaceKey, HalfFaceKey, MeshError, OptionExt as _, PolyMesh,
    VertexKey,
};

impl PolyMesh {
    /// Adds a vertex at the given position.
    ///
    /// A slot is appended to every vertex property. This never fails.
    pub fn add_vertex(&mut self, position: Point3<f32>) -> VertexKey {
        self.vprops.push();
        let vertex = VertexKey::from_index(self.n_vertices() - 1);
        *self.position_mut(vertex) = position;
        vertex
    }

    /// Adds a face with the given vertex loop.
    ///
    /// The loop must have at least three distinct and valid vertices. An
    /// opposing pair of half-faces is allocated, joining consecutive vertices
    /// with edges where they are not already joined. Returns the first
    /// half-face of the pair, which has the winding of the given loop. Its
    /// opposite has the reverse winding.
    ///
    /// A new face is always allocated, even if a face with the same vertices
    /// exists. Use [`find_face`] to reuse faces.
    ///
    /// # Errors
    ///
    /// Returns an error if the loop has fewer than three vertices, repeats a
    /// vertex, or refers to a vertex that does not exist.
    ///
    /// [`find_face`]: crate::mesh::PolyMesh::find_face
    pub fn add_face(&mut self, vertices: &[VertexKey]) -> Result<HalfFaceKey, MeshError> {
        let cache = FaceInsertCache::snapshot(self, vertices)?;
        Ok(self.insert_face_with_cache(cache))
    }

    pub fn add_triangle(
        &mut self,
        a: VertexKey,
        b: VertexKey,
        c: VertexKey,
    ) -> Result<HalfFaceKey, MeshError> {
        self.add_face(&[a, b, c])
    }

    pub fn add_quad(
        &mut self,
        a: VertexKey,
        b: VertexKey,
        c: VertexKey,
        d: VertexKey,
    ) -> Result<HalfFaceKey, MeshError> {
        self.add_face(&[a, b, c, d])
    }

    /// Adds a cell bounded by the given half-faces.
    ///
    /// Each half-face is claimed by the new cell, and the vertices and edges of
    /// the half-faces become incident to it. The order of the half-faces is
    /// preserved.
    ///
    /// # Errors
    ///
    /// Returns an error if no half-faces are given, a half-face does not exist
    /// or is given more than once, or a half-face is already claimed by another
    /// cell. In particular, claiming a half-face twice is always rejected.
    pub fn add_cell(&mut self, halffaces: &[HalfFaceKey]) -> Result<CellKey, MeshError> {
        let cache = CellInsertCache::snapshot(self, halffaces)?;
        let cell = self.insert_cell_with_cache(cache);
        debug!(%cell, halffaces = halffaces.len(), "added cell");
        Ok(cell)
    }

    /// Adds a tetrahedron with the given vertices.
    ///
    /// The half-faces of the tetrahedron are wound such that their normals
    /// face outward when $d$ lies on the positive side of the triangle
    /// $(a, b, c)$ (that is, when $(b - a) \times (c - a)$ points towards $d$).
    ///
    /// Faces that already exist are reused: when a triangle with the same
    /// vertices exists, the tetrahedron claims its half-face with matching
    /// winding instead of allocating a new face. This keeps faces shared by
    /// adjacent tetrahedra unique.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertices are not distinct and valid or if a
    /// reused half-face is already claimed by another cell. On error, no faces
    /// are added.
    pub fn add_tetra(
        &mut self,
        a: VertexKey,
        b: VertexKey,
        c: VertexKey,
        d: VertexKey,
    ) -> Result<CellKey, MeshError> {
        let cache = TetraInsertCache::snapshot(self, [a, b, c, d])?;
        let shared = cache
            .boundary
            .iter()
            .filter(|side| matches!(side, Side::Shared(_)))
            .count();
        let mut halffaces = ArrayVec::<HalfFaceKey, 4>::new();
        for side in cache.boundary.iter() {
            halffaces.push(match side {
                Side::Shared(halfface) => *halfface,
                Side::Detached(triangle) => {
                    self.insert_face_with_cache(FaceInsertCache { vertices: triangle })
                }
            });
        }
        // The sides have been validated, so claiming them cannot fail.
        let cache = CellInsertCache::snapshot(self, &halffaces)
            .ok()
            .expect_consistent();
        let cell = self.insert_cell_with_cache(cache);
        debug!(%cell, shared, "added tetrahedron");
        Ok(cell)
    }

    fn insert_face_with_cache(&mut self, cache: FaceInsertCache<'_>) -> HalfFaceKey {
        let FaceInsertCache { vertices } = cache;
        let edges = loop_pairs(vertices)
            .map(|(a, b)| match self.find_edge(a, b) {
                Some(edge) => edge,
                None => self.insert_edge(a, b),
            })
            .collect::<SmallVec<[EdgeKey; 8]>>();

        self.fprops.push();
        self.hprops.push();
        self.hprops.push();
        let face = FaceKey::from_index(self.n_faces() - 1);
        let (front, back) = (face.halfface(0), face.halfface(1));
        {
            let hconn = self.hprops.get_array_mut(&self.hconn).expect_consistent();
            let connectivity = &mut hconn[front];
            connectivity.vertices = vertices.to_vec();
            connectivity.edges = edges.iter().cloned().collect();
            connectivity.opposite = Some(back);
            let connectivity = &mut hconn[back];
            connectivity.vertices = vertices.iter().rev().cloned().collect();
            connectivity.edges = edges.iter().cloned().collect();
            connectivity.opposite = Some(front);
        }
        let vconn = self.vprops.get_array_mut(&self.vconn).expect_consistent();
        for vertex in vertices {
            let halffaces = &mut vconn[*vertex].halffaces;
            halffaces.insert(front);
            halffaces.insert(back);
        }
        let econn = self.eprops.get_array_mut(&self.econn).expect_consistent();
        for edge in edges {
            let halffaces = &mut econn[edge].halffaces;
            halffaces.insert(front);
            halffaces.insert(back);
        }
        front
    }

    // Callers must ensure that no edge joins the vertices yet.
    fn insert_edge(&mut self, a: VertexKey, b: VertexKey) -> EdgeKey {
        self.eprops.push();
        let edge = EdgeKey::from_index(self.n_edges() - 1);
        self.eprops.get_array_mut(&self.econn).expect_consistent()[edge] = EdgeConnectivity {
            vertices: Some((a, b)),
            ..Default::default()
        };
        let vconn = self.vprops.get_array_mut(&self.vconn).expect_consistent();
        for (vertex, neighbor) in [(a, b), (b, a)] {
            let connectivity = &mut vconn[vertex];
            connectivity.vertices.insert(neighbor);
            connectivity.edges.insert(edge);
        }
        trace!(%edge, %a, %b, "added edge");
        edge
    }

    fn insert_cell_with_cache(&mut self, cache: CellInsertCache<'_>) -> CellKey {
        let CellInsertCache {
            halffaces,
            vertices,
            edges,
        } = cache;
        self.cprops.push();
        let cell = CellKey::from_index(self.n_cells() - 1);
        {
            let hconn = self.hprops.get_array_mut(&self.hconn).expect_consistent();
            for halfface in halffaces {
                hconn[*halfface].cell = Some(cell);
            }
        }
        {
            let vconn = self.vprops.get_array_mut(&self.vconn).expect_consistent();
            for vertex in vertices.iter() {
                vconn[*vertex].cells.insert(cell);
            }
        }
        {
            let econn = self.eprops.get_array_mut(&self.econn).expect_consistent();
            for edge in edges.iter() {
                econn[*edge].cells.insert(cell);
            }
        }
        let connectivity = &mut self.cprops.get_array_mut(&self.cconn).expect_consistent()[cell];
        connectivity.halffaces = halffaces.to_vec();
        connectivity.vertices = vertices;
        connectivity.edges = edges;
        cell
    }
}

struct FaceInsertCache<'a> {
    vertices: &'a [VertexKey],
}

impl<'a> FaceInsertCache<'a> {
    fn snapshot(mesh: &PolyMesh, vertices: &'a [VertexKey]) -> Result<Self, MeshError> {
        let arity = vertices.len();
        if arity < 3 {
            return Err(MeshError::ArityNonPolygonal(arity));
        }
        if let Some(vertex) = vertices.iter().find(|vertex| !mesh.is_valid(**vertex)) {
            return Err(MeshError::VertexNotFound(*vertex));
        }
        if let Some(vertex) = vertices.iter().duplicates().next() {
            return Err(MeshError::DuplicateVertex(*vertex));
        }
        Ok(FaceInsertCache { vertices })
    }
}

struct CellInsertCache<'a> {
    halffaces: &'a [HalfFaceKey],
    vertices: BTreeSet<VertexKey>,
    edges: BTreeSet<EdgeKey>,
}

impl<'a> CellInsertCache<'a> {
    fn snapshot(mesh: &PolyMesh, halffaces: &'a [HalfFaceKey]) -> Result<Self, MeshError> {
        if halffaces.is_empty() {
            return Err(MeshError::EmptyCell);
        }
        if let Some(halfface) = halffaces.iter().find(|halfface| !mesh.is_valid(**halfface)) {
            return Err(MeshError::HalfFaceNotFound(*halfface));
        }
        if let Some(halfface) = halffaces.iter().duplicates().next() {
            return Err(MeshError::DuplicateHalfFace(*halfface));
        }
        let mut vertices = BTreeSet::new();
        let mut edges = BTreeSet::new();
        for halfface in halffaces {
            let connectivity = mesh.halfface_connectivity(*halfface);
            if let Some(cell) = connectivity.cell {
                return Err(MeshError::HalfFaceClaimed {
                    halfface: *halfface,
                    cell,
                });
            }
            vertices.extend(connectivity.vertices.iter().cloned());
            edges.extend(connectivity.edges.iter().cloned());
        }
        Ok(CellInsertCache {
            halffaces,
            vertices,
            edges,
        })
    }
}

// One side of a tetrahedron: either an unclaimed half-face of an existing face
// or a triangle that must be inserted.
enum Side {
    Shared(HalfFaceKey),
    Detached([VertexKey; 3]),
}

struct TetraInsertCache {
    boundary: ArrayVec<Side, 4>,
}

impl TetraInsertCache {
    fn snapshot(mesh: &PolyMesh, [a, b, c, d]: [VertexKey; 4]) -> Result<Self, MeshError> {
        let triangles = [[a, c, b], [a, b, d], [b, c, d], [a, d, c]];
        let mut boundary = ArrayVec::new();
        for triangle in triangles {
            // Validates the vertices even when the face is shared.
            FaceInsertCache::snapshot(mesh, &triangle)?;
            let side = match mesh.find_face(&triangle) {
                Some(halfface) => {
                    let halfface =
                        if is_rotation(&mesh.halfface_connectivity(halfface).vertices, &triangle) {
                            halfface
                        }
                        else {
                            mesh.opposite(halfface)
                        };
                    if let Some(cell) = mesh.owning_cell(halfface) {
                        return Err(MeshError::HalfFaceClaimed { halfface, cell });
                    }
                    Side::Shared(halfface)
                }
                None => Side::Detached(triangle),
            };
            boundary.push(side);
        }
        Ok(TetraInsertCache { boundary })
    }
}

fn is_rotation(winding: &[VertexKey], other: &[VertexKey]) -> bool {
    winding.len() == other.len()
        && (0..winding.len()).any(|offset| {
            winding
                .iter()
                .cycle()
                .skip(offset)
                .zip(other.iter())
                .all(|(a, b)| a == b)
        })
}

#[cfg(test)]
mod tests {
    use nalgebra::Point3;

    use crate::key::Key;
    use crate::mesh::{CellKey, HalfFaceKey, MeshError, PolyMesh, VertexKey};

    fn tetrahedron_vertices(mesh: &mut PolyMesh) -> [VertexKey; 4] {
        [
            mesh.add_vertex(Point3::new(0.0, 0.0, 0.0)),
            mesh.add_vertex(Point3::new(1.0, 0.0, 0.0)),
            mesh.add_vertex(Point3::new(0.0, 1.0, 0.0)),
            mesh.add_vertex(Point3::new(0.0, 0.0, 1.0)),
        ]
    }

    #[test]
    fn add_vertex_stores_position() {
        let mut mesh = PolyMesh::new();
        let a = mesh.add_vertex(Point3::new(1.0, 2.0, 3.0));
        let b = mesh.add_vertex(Point3::new(4.0, 5.0, 6.0));

        assert_eq!(0, a.index());
        assert_eq!(1, b.index());
        assert_eq!(&Point3::new(4.0, 5.0, 6.0), mesh.position(b));
        assert!(mesh.vertex(a).unwrap().is_isolated());
    }

    #[test]
    fn add_triangle() {
        let mut mesh = PolyMesh::new();
        let [a, b, c, _] = tetrahedron_vertices(&mut mesh);
        let abc = mesh.add_triangle(a, b, c).unwrap();

        assert_eq!(1, mesh.n_faces());
        assert_eq!(2, mesh.n_halffaces());
        assert_eq!(3, mesh.n_edges());
        assert_eq!(0, abc.side());
        let view = mesh.halfface(abc).unwrap();
        assert_eq!(&[a, b, c], view.vertex_keys());
        assert_eq!(&[c, b, a], view.opposite().vertex_keys());
        assert!(mesh.is_border(abc));
        assert!(mesh.is_border(abc.face()));
        for vertex in [a, b, c] {
            let vertex = mesh.vertex(vertex).unwrap();
            assert_eq!(2, vertex.valence());
            assert_eq!(2, vertex.halffaces().len());
        }
        for edge in mesh.edges() {
            assert_eq!(2, edge.halffaces().len());
        }
    }

    #[test]
    fn reuse_edges_between_faces() {
        let mut mesh = PolyMesh::new();
        let [a, b, c, d] = tetrahedron_vertices(&mut mesh);
        mesh.add_triangle(a, b, c).unwrap();
        mesh.add_triangle(c, b, d).unwrap();

        // The edge (b, c) is shared.
        assert_eq!(5, mesh.n_edges());
        let bc = mesh.find_edge(b, c).unwrap();
        assert_eq!(4, mesh.edge(bc).unwrap().halffaces().len());
        assert_eq!(3, mesh.vertex(b).unwrap().valence());
    }

    #[test]
    fn add_quad() {
        let mut mesh = PolyMesh::new();
        let [a, b, c, d] = tetrahedron_vertices(&mut mesh);
        let quad = mesh.add_quad(a, b, c, d).unwrap();

        assert_eq!(4, mesh.halfface(quad).unwrap().arity());
        assert_eq!(4, mesh.n_edges());
        assert!(mesh.find_edge(a, c).is_none());
    }

    #[test]
    fn reject_malformed_loops() {
        let mut mesh = PolyMesh::new();
        let [a, b, c, _] = tetrahedron_vertices(&mut mesh);
        let missing = VertexKey::from_index(10);

        assert_eq!(
            Err(MeshError::ArityNonPolygonal(2)),
            mesh.add_face(&[a, b])
        );
        assert_eq!(
            Err(MeshError::DuplicateVertex(a)),
            mesh.add_face(&[a, b, a])
        );
        assert_eq!(
            Err(MeshError::VertexNotFound(missing)),
            mesh.add_triangle(a, b, missing)
        );
        // Nothing was written.
        assert_eq!(0, mesh.n_faces());
        assert_eq!(0, mesh.n_edges());
        assert!(mesh.vertex(c).unwrap().is_isolated());
    }

    #[test]
    fn tetrahedron_from_triangles() {
        let mut mesh = PolyMesh::new();
        let [a, b, c, d] = tetrahedron_vertices(&mut mesh);
        let halffaces = [
            mesh.add_triangle(a, c, b).unwrap(),
            mesh.add_triangle(a, b, d).unwrap(),
            mesh.add_triangle(b, c, d).unwrap(),
            mesh.add_triangle(a, d, c).unwrap(),
        ];
        let cell = mesh.add_cell(&halffaces).unwrap();

        assert_eq!(1, mesh.n_cells());
        assert_eq!(6, mesh.n_edges());
        assert!(mesh.is_tetrahedral_mesh());
        for halfface in halffaces.iter() {
            assert_eq!(Some(cell), mesh.owning_cell(*halfface));
            assert!(!mesh.is_border(*halfface));
            assert!(mesh.is_border(mesh.opposite(*halfface)));
        }
        let view = mesh.cell(cell).unwrap();
        assert_eq!(&halffaces, view.halfface_keys());
        assert_eq!(4, view.vertices().len());
        assert_eq!(6, view.edges().len());
        for edge in mesh.edges() {
            assert_eq!(vec![cell], edge.cells().map(|cell| cell.key()).collect::<Vec<_>>());
        }
    }

    #[test]
    fn reject_claimed_halfface() {
        let mut mesh = PolyMesh::new();
        let [a, b, c, _] = tetrahedron_vertices(&mut mesh);
        let abc = mesh.add_triangle(a, b, c).unwrap();
        let cell = mesh.add_cell(&[abc]).unwrap();

        assert_eq!(
            Err(MeshError::HalfFaceClaimed { halfface: abc, cell }),
            mesh.add_cell(&[abc])
        );
        assert_eq!(1, mesh.n_cells());
        // The opposite half-face remains available.
        let other = mesh.add_cell(&[mesh.opposite(abc)]).unwrap();
        assert_ne!(cell, other);
        assert!(!mesh.is_border(abc.face()));
    }

    #[test]
    fn reject_malformed_cells() {
        let mut mesh = PolyMesh::new();
        let [a, b, c, _] = tetrahedron_vertices(&mut mesh);
        let abc = mesh.add_triangle(a, b, c).unwrap();
        let missing = HalfFaceKey::from_index(2);

        assert_eq!(Err(MeshError::EmptyCell), mesh.add_cell(&[]));
        assert_eq!(
            Err(MeshError::DuplicateHalfFace(abc)),
            mesh.add_cell(&[abc, abc])
        );
        assert_eq!(
            Err(MeshError::HalfFaceNotFound(missing)),
            mesh.add_cell(&[abc, missing])
        );
        assert_eq!(0, mesh.n_cells());
        assert!(mesh.owning_cell(abc).is_none());
    }

    #[test]
    fn adjacent_tetrahedra_share_face() {
        let mut mesh = PolyMesh::new();
        let [a, b, c, d] = tetrahedron_vertices(&mut mesh);
        let e = mesh.add_vertex(Point3::new(0.0, 0.0, -1.0));
        let upper = mesh.add_tetra(a, b, c, d).unwrap();
        let lower = mesh.add_tetra(a, c, b, e).unwrap();

        assert_eq!(5, mesh.n_vertices());
        assert_eq!(9, mesh.n_edges());
        assert_eq!(7, mesh.n_faces());
        assert_eq!(2, mesh.n_cells());
        assert!(mesh.is_tetrahedral_mesh());

        let shared = mesh.find_face(&[a, b, c]).unwrap();
        let cells = [
            mesh.owning_cell(shared),
            mesh.owning_cell(mesh.opposite(shared)),
        ];
        assert_eq!([Some(upper), Some(lower)], cells);
        assert!(!mesh.is_border(shared.face()));
        assert_eq!(
            1,
            mesh.face_keys().filter(|face| !mesh.is_border(*face)).count()
        );
    }

    #[test]
    fn reject_tetrahedron_overlapping_claimed_face() {
        let mut mesh = PolyMesh::new();
        let [a, b, c, d] = tetrahedron_vertices(&mut mesh);
        let e = mesh.add_vertex(Point3::new(1.0, 1.0, 1.0));
        mesh.add_tetra(a, b, c, d).unwrap();

        // Same winding for (a, c, b) as the first tetrahedron.
        let result = mesh.add_tetra(a, b, c, e);
        assert!(matches!(
            result,
            Err(MeshError::HalfFaceClaimed { cell, .. }) if cell == CellKey::from_index(0)
        ));
        assert_eq!(4, mesh.n_faces());
        assert_eq!(1, mesh.n_cells());
        assert!(mesh.vertex(e).unwrap().is_isolated());
    }

    #[test]
    fn reject_degenerate_tetrahedron() {
        let mut mesh = PolyMesh::new();
        let [a, b, c, _] = tetrahedron_vertices(&mut mesh);

        assert_eq!(
            Err(MeshError::DuplicateVertex(a)),
            mesh.add_tetra(a, b, c, a)
        );
        assert_eq!(0, mesh.n_faces());
    }

    #[test]
    fn empty_mesh_is_tetrahedral() {
        let mut mesh = PolyMesh::new();
        assert!(mesh.is_tetrahedral_mesh());

        let [a, b, c, d] = tetrahedron_vertices(&mut mesh);
        let quad = mesh.add_quad(a, b, c, d).unwrap();
        mesh.add_cell(&[quad]).unwrap();
        assert!(!mesh.is_tetrahedral_mesh());
    }
}
