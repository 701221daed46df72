//! Views of mesh entities.
//!
//! A view binds a key to an immutable borrow of a [`PolyMesh`]. Traversals
//! yield further views, so adjacency can be followed without looking up keys
//! manually:
//!
//! ```rust
//! use polymesh::prelude::*;
//! use polymesh::{Point3, PolyMesh};
//!
//! let mut mesh = PolyMesh::new();
//! let a = mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
//! let b = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
//! let c = mesh.add_vertex(Point3::new(0.0, 1.0, 0.0));
//! let halfface = mesh.add_triangle(a, b, c).unwrap();
//!
//! let view = mesh.halfface(halfface).unwrap();
//! assert_eq!(3, view.arity());
//! assert_eq!(
//!     vec![c, b, a],
//!     view.opposite().vertices().map(|vertex| vertex.key()).collect::<Vec<_>>(),
//! );
//! ```
//!
//! [`PolyMesh`]: crate::mesh::PolyMesh

use nalgebra::{Point3, Vector3};
use std::fmt::{self, Debug, Formatter};

use crate::mesh::{
    BorderKey, CellKey, EdgeKey, FaceKey, HalfFaceKey, OptionExt as _, PolyMesh, VertexKey,
};

macro_rules! impl_view {
    ($view:ident => $key:ident) => (
        impl<'a> $view<'a> {
            pub(in crate::mesh) fn bind(mesh: &'a PolyMesh, key: $key) -> Self {
                $view { mesh, key }
            }

            pub fn key(&self) -> $key {
                self.key
            }

            /// Gets the mesh to which the viewed entity belongs.
            pub fn mesh(&self) -> &'a PolyMesh {
                self.mesh
            }
        }

        impl<'a> Clone for $view<'a> {
            fn clone(&self) -> Self {
                *self
            }
        }

        impl<'a> Copy for $view<'a> {}

        impl<'a> Debug for $view<'a> {
            fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
                formatter
                    .debug_struct(stringify!($view))
                    .field("key", &self.key)
                    .finish()
            }
        }

        impl<'a> From<$view<'a>> for $key {
            fn from(view: $view<'a>) -> Self {
                view.key
            }
        }

        // Views are equal if they view the same entity of the same mesh.
        impl<'a> PartialEq for $view<'a> {
            fn eq(&self, other: &Self) -> bool {
                std::ptr::eq(self.mesh, other.mesh) && self.key == other.key
            }
        }

        impl<'a> Eq for $view<'a> {}
    );
}

/// View of a vertex.
pub struct VertexView<'a> {
    mesh: &'a PolyMesh,
    key: VertexKey,
}

impl_view!(VertexView => VertexKey);

impl<'a> VertexView<'a> {
    pub fn position(&self) -> &'a Point3<f32> {
        self.mesh.position(self.key)
    }

    /// Gets an iterator over the vertices joined to this vertex by an edge.
    pub fn neighboring_vertices(
        &self,
    ) -> impl 'a + Clone + ExactSizeIterator<Item = VertexView<'a>> {
        let mesh = self.mesh;
        mesh.vertex_connectivity(self.key)
            .vertices
            .iter()
            .map(move |key| VertexView::bind(mesh, *key))
    }

    pub fn edges(&self) -> impl 'a + Clone + ExactSizeIterator<Item = EdgeView<'a>> {
        let mesh = self.mesh;
        mesh.vertex_connectivity(self.key)
            .edges
            .iter()
            .map(move |key| EdgeView::bind(mesh, *key))
    }

    /// Gets an iterator over the half-faces whose loops contain this vertex.
    ///
    /// Both half-faces of each incident face are included.
    pub fn halffaces(&self) -> impl 'a + Clone + ExactSizeIterator<Item = HalfFaceView<'a>> {
        let mesh = self.mesh;
        mesh.vertex_connectivity(self.key)
            .halffaces
            .iter()
            .map(move |key| HalfFaceView::bind(mesh, *key))
    }

    pub fn cells(&self) -> impl 'a + Clone + ExactSizeIterator<Item = CellView<'a>> {
        let mesh = self.mesh;
        mesh.vertex_connectivity(self.key)
            .cells
            .iter()
            .map(move |key| CellView::bind(mesh, *key))
    }

    /// Gets the number of edges incident to the vertex.
    pub fn valence(&self) -> usize {
        self.mesh.vertex_connectivity(self.key).edges.len()
    }

    /// Determines if the vertex is incident to no edges.
    pub fn is_isolated(&self) -> bool {
        self.valence() == 0
    }
}

/// View of an edge.
pub struct EdgeView<'a> {
    mesh: &'a PolyMesh,
    key: EdgeKey,
}

impl_view!(EdgeView => EdgeKey);

impl<'a> EdgeView<'a> {
    /// Gets the endpoints of the edge in the order they were first joined.
    pub fn vertices(&self) -> (VertexView<'a>, VertexView<'a>) {
        let (a, b) = self.keys();
        (
            VertexView::bind(self.mesh, a),
            VertexView::bind(self.mesh, b),
        )
    }

    /// Gets the `i`th endpoint of the edge.
    ///
    /// # Panics
    ///
    /// Panics if `i` is not `0` or `1`.
    pub fn vertex(&self, i: usize) -> VertexView<'a> {
        let (a, b) = self.vertices();
        match i {
            0 => a,
            1 => b,
            _ => panic!("edge has exactly two vertices"),
        }
    }

    /// Gets the endpoint opposite to the given vertex, if the vertex is an
    /// endpoint of the edge.
    pub fn opposite_vertex(&self, key: VertexKey) -> Option<VertexView<'a>> {
        match self.keys() {
            (a, b) if a == key => Some(VertexView::bind(self.mesh, b)),
            (a, b) if b == key => Some(VertexView::bind(self.mesh, a)),
            _ => None,
        }
    }

    pub fn halffaces(&self) -> impl 'a + Clone + ExactSizeIterator<Item = HalfFaceView<'a>> {
        let mesh = self.mesh;
        mesh.edge_connectivity(self.key)
            .halffaces
            .iter()
            .map(move |key| HalfFaceView::bind(mesh, *key))
    }

    pub fn cells(&self) -> impl 'a + Clone + ExactSizeIterator<Item = CellView<'a>> {
        let mesh = self.mesh;
        mesh.edge_connectivity(self.key)
            .cells
            .iter()
            .map(move |key| CellView::bind(mesh, *key))
    }

    pub fn length(&self) -> f32 {
        self.mesh.edge_length(self.key)
    }

    /// Determines if the edge lies on a border half-face.
    pub fn is_border(&self) -> bool {
        self.halffaces().any(|halfface| halfface.is_border())
    }

    fn keys(&self) -> (VertexKey, VertexKey) {
        self.mesh
            .edge_connectivity(self.key)
            .vertices
            .expect_consistent()
    }
}

/// View of a half-face.
pub struct HalfFaceView<'a> {
    mesh: &'a PolyMesh,
    key: HalfFaceKey,
}

impl_view!(HalfFaceView => HalfFaceKey);

impl<'a> HalfFaceView<'a> {
    /// Gets the keys of the vertex loop in winding order.
    pub fn vertex_keys(&self) -> &'a [VertexKey] {
        &self.mesh.halfface_connectivity(self.key).vertices
    }

    /// Gets an iterator over the vertex loop in winding order.
    pub fn vertices(
        &self,
    ) -> impl 'a + Clone + DoubleEndedIterator<Item = VertexView<'a>> + ExactSizeIterator {
        let mesh = self.mesh;
        self.vertex_keys()
            .iter()
            .map(move |key| VertexView::bind(mesh, *key))
    }

    pub fn edges(&self) -> impl 'a + Clone + ExactSizeIterator<Item = EdgeView<'a>> {
        let mesh = self.mesh;
        mesh.halfface_connectivity(self.key)
            .edges
            .iter()
            .map(move |key| EdgeView::bind(mesh, *key))
    }

    /// Gets the number of vertices in the loop.
    pub fn arity(&self) -> usize {
        self.vertex_keys().len()
    }

    pub fn opposite(&self) -> HalfFaceView<'a> {
        HalfFaceView::bind(self.mesh, self.mesh.opposite(self.key))
    }

    pub fn face(&self) -> FaceView<'a> {
        FaceView::bind(self.mesh, self.key.face())
    }

    /// Gets the cell that claims this half-face, if any.
    pub fn cell(&self) -> Option<CellView<'a>> {
        self.mesh
            .owning_cell(self.key)
            .map(|key| CellView::bind(self.mesh, key))
    }

    pub fn is_border(&self) -> bool {
        self.key.is_border(self.mesh)
    }

    /// Computes the unit normal of the half-face.
    ///
    /// See [`PolyMesh::compute_face_normal`].
    pub fn normal(&self) -> Vector3<f32> {
        self.mesh.compute_face_normal(self.key)
    }

    pub fn is_degenerate(&self) -> bool {
        self.mesh.is_degenerate(self.key)
    }
}

/// View of a face: an opposing pair of half-faces.
pub struct FaceView<'a> {
    mesh: &'a PolyMesh,
    key: FaceKey,
}

impl_view!(FaceView => FaceKey);

impl<'a> FaceView<'a> {
    /// Gets the `i`th half-face of the face.
    ///
    /// # Panics
    ///
    /// Panics if `i` is not `0` or `1`.
    pub fn halfface(&self, i: usize) -> HalfFaceView<'a> {
        HalfFaceView::bind(self.mesh, self.key.halfface(i))
    }

    pub fn halffaces(&self) -> (HalfFaceView<'a>, HalfFaceView<'a>) {
        (self.halfface(0), self.halfface(1))
    }

    /// Gets an iterator over the vertex loop of the first half-face.
    pub fn vertices(
        &self,
    ) -> impl 'a + Clone + DoubleEndedIterator<Item = VertexView<'a>> + ExactSizeIterator {
        self.halfface(0).vertices()
    }

    /// Gets an iterator over the cells on either side of the face.
    ///
    /// At most two cells are yielded.
    pub fn cells(&self) -> impl 'a + Clone + Iterator<Item = CellView<'a>> {
        let (front, back) = self.halffaces();
        front.cell().into_iter().chain(back.cell())
    }

    pub fn arity(&self) -> usize {
        self.halfface(0).arity()
    }

    pub fn is_border(&self) -> bool {
        self.key.is_border(self.mesh)
    }
}

/// View of a cell.
pub struct CellView<'a> {
    mesh: &'a PolyMesh,
    key: CellKey,
}

impl_view!(CellView => CellKey);

impl<'a> CellView<'a> {
    pub fn vertices(&self) -> impl 'a + Clone + ExactSizeIterator<Item = VertexView<'a>> {
        let mesh = self.mesh;
        mesh.cell_connectivity(self.key)
            .vertices
            .iter()
            .map(move |key| VertexView::bind(mesh, *key))
    }

    pub fn edges(&self) -> impl 'a + Clone + ExactSizeIterator<Item = EdgeView<'a>> {
        let mesh = self.mesh;
        mesh.cell_connectivity(self.key)
            .edges
            .iter()
            .map(move |key| EdgeView::bind(mesh, *key))
    }

    /// Gets the keys of the bounding half-faces in the order they were given.
    pub fn halfface_keys(&self) -> &'a [HalfFaceKey] {
        &self.mesh.cell_connectivity(self.key).halffaces
    }

    pub fn halffaces(
        &self,
    ) -> impl 'a + Clone + DoubleEndedIterator<Item = HalfFaceView<'a>> + ExactSizeIterator {
        let mesh = self.mesh;
        self.halfface_keys()
            .iter()
            .map(move |key| HalfFaceView::bind(mesh, *key))
    }

    /// Gets an iterator over the cells that share a face with this cell.
    pub fn neighboring_cells(&self) -> impl 'a + Clone + Iterator<Item = CellView<'a>> {
        self.halffaces()
            .flat_map(|halfface| halfface.opposite().cell())
    }

    /// Determines if the cell is bounded by exactly four triangles.
    pub fn is_tetrahedron(&self) -> bool {
        let halffaces = self.halfface_keys();
        halffaces.len() == 4
            && halffaces
                .iter()
                .all(|key| self.mesh.halfface_connectivity(*key).vertices.len() == 3)
    }
}
