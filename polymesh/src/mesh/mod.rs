//! Polyhedral mesh connectivity.
//!
//! This module provides [`PolyMesh`], a representation of volumetric meshes
//! composed of five kinds of entities: _vertices_, _edges_, _half-faces_,
//! _faces_, and _cells_.
//!
//! # Representation
//!
//! Vertices carry a position. An edge joins two distinct vertices and there is
//! at most one edge between any pair of vertices. A half-face is an oriented
//! loop of at least three distinct vertices; the order of the loop is its
//! _winding_. Half-faces are always allocated in opposing pairs, where the
//! _opposite_ half-face has the reverse winding. Together, a pair of
//! half-faces forms a _face_. A cell is a volume bounded by an ordered list of
//! half-faces.
//!
//! Every half-face is claimed by at most one cell. A half-face with no cell is
//! a _border half-face_ and a face is a _border face_ if either of its
//! half-faces is on the border. Faces shared by two cells are interior.
//!
//! Meshes only grow: there is no API for removing individual entities.
//! [`PolyMesh::clear`] returns a mesh to its initial empty state, and filtered
//! copies are built by adding the retained entities to a new mesh.
//!
//! # Storage and Properties
//!
//! Each entity kind (and the mesh as a whole) owns a [`PropertyContainer`].
//! Connectivity and vertex positions are stored as built-in, pinned
//! properties of these containers, so every column of a kind always has one
//! slot per entity. User data is attached with the `add_*_property` family of
//! functions and read or written through the returned [`Property`] token.
//!
//! # Views
//!
//! Adjacency is exposed through _views_, which bind a key to an immutable
//! borrow of a mesh. Views are cheap to copy and yield other views when
//! traversing relationships, such as the vertices of a half-face or the cell
//! that owns it.
//!
//! [`Property`]: crate::property::Property
//! [`PropertyContainer`]: crate::property::PropertyContainer

mod connectivity;
mod geometry;
mod key;
mod mutation;
mod view;

use nalgebra::Point3;
use smallvec::SmallVec;
use std::fmt::{self, Display, Formatter};
use thiserror::Error;
use tracing::debug;

use crate::key::{Key, Keys};
use crate::mesh::connectivity::{
    CellConnectivity, EdgeConnectivity, HalfFaceConnectivity, VertexConnectivity,
};
use crate::property::{Property, PropertyArray, PropertyContainer, PropertyType};

pub use crate::mesh::geometry::DEGENERACY_EPSILON;
pub use crate::mesh::key::{CellKey, EdgeKey, FaceKey, HalfFaceKey, VertexKey};
pub use crate::mesh::view::{CellView, EdgeView, FaceView, HalfFaceView, VertexView};

pub type VertexProperty<T> = Property<VertexKey, T>;
pub type EdgeProperty<T> = Property<EdgeKey, T>;
pub type HalfFaceProperty<T> = Property<HalfFaceKey, T>;
pub type FaceProperty<T> = Property<FaceKey, T>;
pub type CellProperty<T> = Property<CellKey, T>;
pub type ModelProperty<T> = Property<usize, T>;

/// Errors concerning structural mutations of a [`PolyMesh`].
///
/// Mutations validate their inputs before modifying a mesh. When an error is
/// returned, the mesh is unchanged.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum MeshError {
    #[error("vertex {0} not found")]
    VertexNotFound(VertexKey),
    #[error("half-face {0} not found")]
    HalfFaceNotFound(HalfFaceKey),
    /// A face loop has fewer than three vertices.
    #[error("arity is non-polygonal: {0}")]
    ArityNonPolygonal(usize),
    #[error("vertex {0} occurs more than once in face loop")]
    DuplicateVertex(VertexKey),
    #[error("half-face {0} occurs more than once in cell")]
    DuplicateHalfFace(HalfFaceKey),
    /// A half-face already bounds another cell.
    #[error("half-face {halfface} is already claimed by cell {cell}")]
    HalfFaceClaimed { halfface: HalfFaceKey, cell: CellKey },
    #[error("cell has no half-faces")]
    EmptyCell,
}

trait OptionExt<T> {
    fn expect_consistent(self) -> T;
}

impl<T> OptionExt<T> for Option<T> {
    fn expect_consistent(self) -> T {
        self.expect("internal error: mesh consistency violated")
    }
}

/// Key of an entity kind stored in a [`PolyMesh`].
pub trait MeshKey: Key {
    /// Gets the number of entities of this kind in a mesh.
    fn count(mesh: &PolyMesh) -> usize;
}

impl MeshKey for VertexKey {
    fn count(mesh: &PolyMesh) -> usize {
        mesh.n_vertices()
    }
}

impl MeshKey for EdgeKey {
    fn count(mesh: &PolyMesh) -> usize {
        mesh.n_edges()
    }
}

impl MeshKey for HalfFaceKey {
    fn count(mesh: &PolyMesh) -> usize {
        mesh.n_halffaces()
    }
}

impl MeshKey for FaceKey {
    fn count(mesh: &PolyMesh) -> usize {
        mesh.n_faces()
    }
}

impl MeshKey for CellKey {
    fn count(mesh: &PolyMesh) -> usize {
        mesh.n_cells()
    }
}

/// Key of an entity that may lie on the border of a mesh.
pub trait BorderKey: MeshKey {
    fn is_border(self, mesh: &PolyMesh) -> bool;
}

impl BorderKey for HalfFaceKey {
    fn is_border(self, mesh: &PolyMesh) -> bool {
        mesh.halfface_connectivity(self).cell.is_none()
    }
}

impl BorderKey for FaceKey {
    fn is_border(self, mesh: &PolyMesh) -> bool {
        self.halfface(0).is_border(mesh) || self.halfface(1).is_border(mesh)
    }
}

/// Polyhedral mesh.
///
/// See the [module documentation](crate::mesh) for details.
#[derive(Clone, Debug)]
pub struct PolyMesh {
    vprops: PropertyContainer<VertexKey>,
    eprops: PropertyContainer<EdgeKey>,
    hprops: PropertyContainer<HalfFaceKey>,
    fprops: PropertyContainer<FaceKey>,
    cprops: PropertyContainer<CellKey>,
    mprops: PropertyContainer<usize>,
    vconn: VertexProperty<VertexConnectivity>,
    econn: EdgeProperty<EdgeConnectivity>,
    hconn: HalfFaceProperty<HalfFaceConnectivity>,
    cconn: CellProperty<CellConnectivity>,
    vpoint: VertexProperty<Point3<f32>>,
}

impl PolyMesh {
    /// Creates an empty mesh.
    pub fn new() -> Self {
        let mut vprops = PropertyContainer::new();
        let mut eprops = PropertyContainer::new();
        let mut hprops = PropertyContainer::new();
        let fprops = PropertyContainer::new();
        let mut cprops = PropertyContainer::new();
        let mut mprops = PropertyContainer::new();
        // The model container always has exactly one slot.
        mprops.push();
        let vconn = pinned(&mut vprops, "v:connectivity", VertexConnectivity::default());
        let econn = pinned(&mut eprops, "e:connectivity", EdgeConnectivity::default());
        let hconn = pinned(&mut hprops, "h:connectivity", HalfFaceConnectivity::default());
        let cconn = pinned(&mut cprops, "c:connectivity", CellConnectivity::default());
        let vpoint = pinned(&mut vprops, "v:point", Point3::origin());
        PolyMesh {
            vprops,
            eprops,
            hprops,
            fprops,
            cprops,
            mprops,
            vconn,
            econn,
            hconn,
            cconn,
            vpoint,
        }
    }

    pub fn n_vertices(&self) -> usize {
        self.vprops.len()
    }

    pub fn n_edges(&self) -> usize {
        self.eprops.len()
    }

    pub fn n_halffaces(&self) -> usize {
        self.hprops.len()
    }

    pub fn n_faces(&self) -> usize {
        self.fprops.len()
    }

    pub fn n_cells(&self) -> usize {
        self.cprops.len()
    }

    /// Determines if a key refers to an entity in the mesh.
    pub fn is_valid<K>(&self, key: K) -> bool
    where
        K: MeshKey,
    {
        key.index() < K::count(self)
    }

    /// Determines if a half-face or face is on the border of the mesh.
    ///
    /// A half-face is on the border if it bounds no cell. A face is on the
    /// border if either of its half-faces is on the border.
    ///
    /// # Panics
    ///
    /// Panics if the key is not valid.
    pub fn is_border<K>(&self, key: K) -> bool
    where
        K: BorderKey,
    {
        key.is_border(self)
    }

    /// Removes all entities and properties.
    ///
    /// After calling this function the mesh is the same as a newly constructed
    /// mesh. Custom properties are removed and all outstanding property tokens
    /// are invalidated.
    pub fn clear(&mut self) {
        debug!(
            vertices = self.n_vertices(),
            faces = self.n_faces(),
            cells = self.n_cells(),
            "clearing mesh"
        );
        self.vprops.clear();
        self.eprops.clear();
        self.hprops.clear();
        self.fprops.clear();
        self.cprops.clear();
        self.mprops.clear();
        self.mprops.push();
        self.vconn = pinned(&mut self.vprops, "v:connectivity", VertexConnectivity::default());
        self.econn = pinned(&mut self.eprops, "e:connectivity", EdgeConnectivity::default());
        self.hconn = pinned(&mut self.hprops, "h:connectivity", HalfFaceConnectivity::default());
        self.cconn = pinned(&mut self.cprops, "c:connectivity", CellConnectivity::default());
        self.vpoint = pinned(&mut self.vprops, "v:point", Point3::origin());
    }

    /// Reserves capacity for additional entities.
    ///
    /// Each face reserves capacity for its two half-faces.
    pub fn reserve(&mut self, vertices: usize, edges: usize, faces: usize, cells: usize) {
        self.vprops.reserve(vertices);
        self.eprops.reserve(edges);
        self.fprops.reserve(faces);
        self.hprops.reserve(faces.saturating_mul(2));
        self.cprops.reserve(cells);
    }

    /// Replaces the contents of the mesh with the entities of another mesh.
    ///
    /// Unlike `clone`, only connectivity and vertex positions are copied. The
    /// custom properties of both meshes are not carried over.
    pub fn assign(&mut self, other: &PolyMesh) {
        self.clear();
        self.vprops.resize(other.n_vertices());
        self.eprops.resize(other.n_edges());
        self.hprops.resize(other.n_halffaces());
        self.fprops.resize(other.n_faces());
        self.cprops.resize(other.n_cells());
        copy_array(&mut self.vprops, &self.vconn, &other.vprops, &other.vconn);
        copy_array(&mut self.vprops, &self.vpoint, &other.vprops, &other.vpoint);
        copy_array(&mut self.eprops, &self.econn, &other.eprops, &other.econn);
        copy_array(&mut self.hprops, &self.hconn, &other.hprops, &other.hconn);
        copy_array(&mut self.cprops, &self.cconn, &other.cprops, &other.cconn);
    }

    pub fn vertex_keys(&self) -> Keys<VertexKey> {
        Keys::new(self.n_vertices())
    }

    pub fn edge_keys(&self) -> Keys<EdgeKey> {
        Keys::new(self.n_edges())
    }

    pub fn halfface_keys(&self) -> Keys<HalfFaceKey> {
        Keys::new(self.n_halffaces())
    }

    pub fn face_keys(&self) -> Keys<FaceKey> {
        Keys::new(self.n_faces())
    }

    pub fn cell_keys(&self) -> Keys<CellKey> {
        Keys::new(self.n_cells())
    }

    /// Gets an iterator over views of all vertices in index order.
    pub fn vertices(
        &self,
    ) -> impl '_ + DoubleEndedIterator<Item = VertexView<'_>> + ExactSizeIterator {
        self.vertex_keys().map(move |key| VertexView::bind(self, key))
    }

    pub fn edges(
        &self,
    ) -> impl '_ + DoubleEndedIterator<Item = EdgeView<'_>> + ExactSizeIterator {
        self.edge_keys().map(move |key| EdgeView::bind(self, key))
    }

    pub fn halffaces(
        &self,
    ) -> impl '_ + DoubleEndedIterator<Item = HalfFaceView<'_>> + ExactSizeIterator {
        self.halfface_keys().map(move |key| HalfFaceView::bind(self, key))
    }

    pub fn faces(
        &self,
    ) -> impl '_ + DoubleEndedIterator<Item = FaceView<'_>> + ExactSizeIterator {
        self.face_keys().map(move |key| FaceView::bind(self, key))
    }

    pub fn cells(
        &self,
    ) -> impl '_ + DoubleEndedIterator<Item = CellView<'_>> + ExactSizeIterator {
        self.cell_keys().map(move |key| CellView::bind(self, key))
    }

    /// Gets a view of a vertex, or `None` if the key is not valid.
    pub fn vertex(&self, key: VertexKey) -> Option<VertexView<'_>> {
        self.is_valid(key).then(|| VertexView::bind(self, key))
    }

    pub fn edge(&self, key: EdgeKey) -> Option<EdgeView<'_>> {
        self.is_valid(key).then(|| EdgeView::bind(self, key))
    }

    pub fn halfface(&self, key: HalfFaceKey) -> Option<HalfFaceView<'_>> {
        self.is_valid(key).then(|| HalfFaceView::bind(self, key))
    }

    pub fn face(&self, key: FaceKey) -> Option<FaceView<'_>> {
        self.is_valid(key).then(|| FaceView::bind(self, key))
    }

    pub fn cell(&self, key: CellKey) -> Option<CellView<'_>> {
        self.is_valid(key).then(|| CellView::bind(self, key))
    }

    /// Gets the opposite of a half-face.
    ///
    /// The opposite is fixed when the half-face is allocated and the relation
    /// is symmetric.
    ///
    /// # Panics
    ///
    /// Panics if the key is not valid.
    pub fn opposite(&self, key: HalfFaceKey) -> HalfFaceKey {
        self.halfface_connectivity(key).opposite.expect_consistent()
    }

    /// Gets the `i`th half-face of a face.
    ///
    /// The half-faces of a face are allocated together, so this requires no
    /// lookup. The first half-face has the winding given when the face was
    /// added.
    ///
    /// # Panics
    ///
    /// Panics if `i` is not `0` or `1`.
    pub fn face_halfface(&self, key: FaceKey, i: usize) -> HalfFaceKey {
        key.halfface(i)
    }

    /// Gets the cell that claims a half-face, if any.
    ///
    /// # Panics
    ///
    /// Panics if the key is not valid.
    pub fn owning_cell(&self, key: HalfFaceKey) -> Option<CellKey> {
        self.halfface_connectivity(key).cell
    }

    /// Finds the edge between two vertices.
    ///
    /// This query visits the edges incident to `a`. Returns `None` if either
    /// key is not valid or if the vertices are not joined.
    pub fn find_edge(&self, a: VertexKey, b: VertexKey) -> Option<EdgeKey> {
        if !(self.is_valid(a) && self.is_valid(b)) {
            return None;
        }
        self.vertex_connectivity(a)
            .edges
            .iter()
            .cloned()
            .find(|edge| self.edge_connectivity(*edge).connects(a, b))
    }

    /// Finds a half-face with the same set of vertices as the given loop.
    ///
    /// The comparison ignores the order of the vertices, so either half-face of
    /// a face may match. When both match, the first half-face of the face is
    /// returned. Returns `None` if no such half-face exists or any key is not
    /// valid.
    pub fn find_face(&self, vertices: &[VertexKey]) -> Option<HalfFaceKey> {
        let first = *vertices.first()?;
        if !vertices.iter().all(|vertex| self.is_valid(*vertex)) {
            return None;
        }
        let mut expected = SmallVec::<[VertexKey; 8]>::from_slice(vertices);
        expected.sort_unstable();
        self.vertex_connectivity(first)
            .halffaces
            .iter()
            .cloned()
            .find(|halfface| {
                let winding = &self.halfface_connectivity(*halfface).vertices;
                if winding.len() != expected.len() {
                    return false;
                }
                let mut candidate = SmallVec::<[VertexKey; 8]>::from_slice(winding);
                candidate.sort_unstable();
                candidate == expected
            })
    }

    /// Determines if every cell is a tetrahedron.
    ///
    /// A tetrahedron is bounded by exactly four triangular half-faces. A mesh
    /// without cells is vacuously tetrahedral.
    pub fn is_tetrahedral_mesh(&self) -> bool {
        self.cells().all(|cell| cell.is_tetrahedron())
    }

    /// Gets a summary of the names of all properties of the mesh.
    ///
    /// The summary is intended to be displayed.
    pub fn property_stats(&self) -> PropertyStats<'_> {
        PropertyStats { mesh: self }
    }

    pub(in crate::mesh) fn vertex_connectivity(&self, key: VertexKey) -> &VertexConnectivity {
        &self.vprops.get_array(&self.vconn).expect_consistent()[key]
    }

    pub(in crate::mesh) fn edge_connectivity(&self, key: EdgeKey) -> &EdgeConnectivity {
        &self.eprops.get_array(&self.econn).expect_consistent()[key]
    }

    pub(in crate::mesh) fn halfface_connectivity(
        &self,
        key: HalfFaceKey,
    ) -> &HalfFaceConnectivity {
        &self.hprops.get_array(&self.hconn).expect_consistent()[key]
    }

    pub(in crate::mesh) fn cell_connectivity(&self, key: CellKey) -> &CellConnectivity {
        &self.cprops.get_array(&self.cconn).expect_consistent()[key]
    }
}

impl Default for PolyMesh {
    fn default() -> Self {
        PolyMesh::new()
    }
}

fn pinned<K, T>(container: &mut PropertyContainer<K>, name: &str, default: T) -> Property<K, T>
where
    K: Key,
    T: 'static + Clone,
{
    let property = container.add(name, default).expect_consistent();
    container.pin(&property);
    property
}

// Pairs of consecutive items of a closed loop, ending with the pair that
// closes the loop, so `[a, b, c]` yields `(a, b)`, `(b, c)`, and `(c, a)`.
pub(in crate::mesh) fn loop_pairs<T>(items: &[T]) -> impl '_ + Iterator<Item = (T, T)>
where
    T: Copy,
{
    items
        .iter()
        .copied()
        .zip(items.iter().copied().cycle().skip(1))
}

fn copy_array<K, T>(
    target: &mut PropertyContainer<K>,
    to: &Property<K, T>,
    source: &PropertyContainer<K>,
    from: &Property<K, T>,
) where
    K: Key,
    T: 'static + Clone,
{
    let source = source.get_array(from).expect_consistent();
    target
        .get_array_mut(to)
        .expect_consistent()
        .as_mut_slice()
        .clone_from_slice(source.as_slice());
}

macro_rules! impl_property_api {
    (
        kind => $kind:literal,
        key => $key:ty,
        container => $container:ident,
        add => $add:ident,
        get => $get:ident,
        get_or_add => $get_or_add:ident,
        remove => $remove:ident,
        remove_named => $remove_named:ident,
        rename => $rename:ident,
        names => $names:ident,
        type_of => $type_of:ident,
        data => $data:ident,
        data_mut => $data_mut:ident$(,)?
    ) => (
        impl PolyMesh {
            #[doc = concat!("Adds a ", $kind, " property named `name` filled with `default`.")]
            ///
            /// Returns `None` if a property with the same name already exists.
            pub fn $add<T>(&mut self, name: &str, default: T) -> Option<Property<$key, T>>
            where
                T: 'static + Clone,
            {
                self.$container.add(name, default)
            }

            #[doc = concat!("Gets the ", $kind, " property named `name` with element type `T`.")]
            ///
            /// Returns `None` if no such property exists or its type differs.
            pub fn $get<T>(&self, name: &str) -> Option<Property<$key, T>>
            where
                T: 'static + Clone,
            {
                self.$container.get(name)
            }

            #[doc = concat!("Gets the ", $kind, " property named `name`, adding it if needed.")]
            ///
            /// Returns `None` if a property with the same name but a different
            /// type already exists.
            pub fn $get_or_add<T>(&mut self, name: &str, default: T) -> Option<Property<$key, T>>
            where
                T: 'static + Clone,
            {
                self.$container.get_or_add(name, default)
            }

            #[doc = concat!("Removes a ", $kind, " property.")]
            ///
            /// Built-in properties cannot be removed.
            pub fn $remove<T>(&mut self, property: &Property<$key, T>) -> bool {
                self.$container.remove(property)
            }

            #[doc = concat!("Removes the ", $kind, " property named `name`.")]
            pub fn $remove_named(&mut self, name: &str) -> bool {
                self.$container.remove_named(name)
            }

            #[doc = concat!("Renames a ", $kind, " property, preserving its tokens.")]
            ///
            /// Built-in properties cannot be renamed.
            pub fn $rename(&mut self, old: &str, new: &str) -> bool {
                self.$container.rename(old, new)
            }

            #[doc = concat!("Gets the names of all ", $kind, " properties.")]
            pub fn $names(&self) -> Vec<String> {
                self.$container.properties()
            }

            #[doc = concat!("Gets the element type of the ", $kind, " property named `name`.")]
            pub fn $type_of(&self, name: &str) -> Option<PropertyType> {
                self.$container.type_of(name)
            }

            #[doc = concat!("Gets the data of a ", $kind, " property.")]
            pub fn $data<T>(&self, property: &Property<$key, T>) -> Option<&PropertyArray<$key, T>>
            where
                T: 'static + Clone,
            {
                self.$container.get_array(property)
            }

            #[doc = concat!("Gets the mutable data of a ", $kind, " property.")]
            pub fn $data_mut<T>(
                &mut self,
                property: &Property<$key, T>,
            ) -> Option<&mut PropertyArray<$key, T>>
            where
                T: 'static + Clone,
            {
                self.$container.get_array_mut(property)
            }
        }
    );
}
impl_property_api!(
    kind => "vertex",
    key => VertexKey,
    container => vprops,
    add => add_vertex_property,
    get => get_vertex_property,
    get_or_add => vertex_property,
    remove => remove_vertex_property,
    remove_named => remove_vertex_property_named,
    rename => rename_vertex_property,
    names => vertex_properties,
    type_of => vertex_property_type,
    data => vertex_data,
    data_mut => vertex_data_mut,
);
impl_property_api!(
    kind => "edge",
    key => EdgeKey,
    container => eprops,
    add => add_edge_property,
    get => get_edge_property,
    get_or_add => edge_property,
    remove => remove_edge_property,
    remove_named => remove_edge_property_named,
    rename => rename_edge_property,
    names => edge_properties,
    type_of => edge_property_type,
    data => edge_data,
    data_mut => edge_data_mut,
);
impl_property_api!(
    kind => "half-face",
    key => HalfFaceKey,
    container => hprops,
    add => add_halfface_property,
    get => get_halfface_property,
    get_or_add => halfface_property,
    remove => remove_halfface_property,
    remove_named => remove_halfface_property_named,
    rename => rename_halfface_property,
    names => halfface_properties,
    type_of => halfface_property_type,
    data => halfface_data,
    data_mut => halfface_data_mut,
);
impl_property_api!(
    kind => "face",
    key => FaceKey,
    container => fprops,
    add => add_face_property,
    get => get_face_property,
    get_or_add => face_property,
    remove => remove_face_property,
    remove_named => remove_face_property_named,
    rename => rename_face_property,
    names => face_properties,
    type_of => face_property_type,
    data => face_data,
    data_mut => face_data_mut,
);
impl_property_api!(
    kind => "cell",
    key => CellKey,
    container => cprops,
    add => add_cell_property,
    get => get_cell_property,
    get_or_add => cell_property,
    remove => remove_cell_property,
    remove_named => remove_cell_property_named,
    rename => rename_cell_property,
    names => cell_properties,
    type_of => cell_property_type,
    data => cell_data,
    data_mut => cell_data_mut,
);
impl_property_api!(
    kind => "model",
    key => usize,
    container => mprops,
    add => add_model_property,
    get => get_model_property,
    get_or_add => model_property,
    remove => remove_model_property,
    remove_named => remove_model_property_named,
    rename => rename_model_property,
    names => model_properties,
    type_of => model_property_type,
    data => model_data,
    data_mut => model_data_mut,
);

/// Names of the properties of a [`PolyMesh`], grouped by entity kind.
pub struct PropertyStats<'a> {
    mesh: &'a PolyMesh,
}

impl<'a> Display for PropertyStats<'a> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        let mesh = self.mesh;
        let groups = [
            ("vertex", mesh.vertex_properties()),
            ("edge", mesh.edge_properties()),
            ("half-face", mesh.halfface_properties()),
            ("face", mesh.face_properties()),
            ("cell", mesh.cell_properties()),
            ("model", mesh.model_properties()),
        ];
        for (kind, names) in groups.iter() {
            if names.is_empty() {
                continue;
            }
            writeln!(formatter, "{} properties:", kind)?;
            for name in names {
                writeln!(formatter, "\t{}", name)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::Point3;

    use crate::key::Key;
    use crate::mesh::{loop_pairs, CellKey, EdgeKey, FaceKey, HalfFaceKey, PolyMesh, VertexKey};

    fn quad() -> (PolyMesh, [VertexKey; 4]) {
        let mut mesh = PolyMesh::new();
        let a = mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let b = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let c = mesh.add_vertex(Point3::new(1.0, 1.0, 0.0));
        let d = mesh.add_vertex(Point3::new(0.0, 1.0, 0.0));
        mesh.add_quad(a, b, c, d).unwrap();
        (mesh, [a, b, c, d])
    }

    #[test]
    fn loop_pairs_close_loop() {
        assert_eq!(
            vec![(0u32, 1), (1, 2), (2, 0)],
            loop_pairs(&[0u32, 1, 2]).collect::<Vec<_>>()
        );
        assert_eq!(0, loop_pairs::<u32>(&[]).count());
    }

    #[test]
    fn vertex_columns_track_count() {
        let mut mesh = PolyMesh::new();
        let weight = mesh.add_vertex_property("v:weight", 0.0f64).unwrap();
        for n in 1..=8 {
            mesh.add_vertex(Point3::new(n as f32, 0.0, 0.0));
            if n == 4 {
                mesh.add_vertex_property("v:late", 0u8).unwrap();
            }

            assert_eq!(n, mesh.n_vertices());
            assert!(mesh.vprops.lengths().iter().all(|len| *len == n));
            assert_eq!(n, mesh.vertex_data(&weight).unwrap().len());
            assert_eq!(n, mesh.points().len());
        }
    }

    #[test]
    fn opposite_is_symmetric() {
        let (mesh, _) = quad();

        assert_eq!(2, mesh.n_halffaces());
        for halfface in mesh.halfface_keys() {
            let opposite = mesh.opposite(halfface);
            assert_ne!(halfface, opposite);
            assert_eq!(halfface, mesh.opposite(opposite));
            assert_eq!(halfface.face(), opposite.face());
        }
    }

    #[test]
    fn face_border_follows_halffaces() {
        let mut mesh = PolyMesh::new();
        let keys = (0..5)
            .map(|n| mesh.add_vertex(Point3::new(n as f32, (n * n) as f32, (n % 2) as f32)))
            .collect::<Vec<_>>();
        mesh.add_tetra(keys[0], keys[1], keys[2], keys[3]).unwrap();
        mesh.add_triangle(keys[1], keys[2], keys[4]).unwrap();

        for face in mesh.face_keys() {
            assert_eq!(
                mesh.is_border(face),
                mesh.is_border(face.halfface(0)) || mesh.is_border(face.halfface(1)),
            );
            // Every face here has a half-face without a cell.
            assert!(mesh.is_border(face));
        }
    }

    #[test]
    fn validate_keys() {
        let (mesh, [a, ..]) = quad();

        assert!(mesh.is_valid(a));
        assert!(!mesh.is_valid(VertexKey::from_index(4)));
        assert!(mesh.is_valid(EdgeKey::from_index(3)));
        assert!(!mesh.is_valid(EdgeKey::from_index(4)));
        assert!(mesh.is_valid(HalfFaceKey::from_index(1)));
        assert!(mesh.is_valid(FaceKey::from_index(0)));
        assert!(!mesh.is_valid(CellKey::from_index(0)));
        assert!(mesh.vertex(VertexKey::from_index(9)).is_none());
        assert!(mesh.cell(CellKey::from_index(0)).is_none());
    }

    #[test]
    fn find_edge_in_either_direction() {
        let (mesh, [a, b, c, d]) = quad();
        let ab = mesh.find_edge(a, b).unwrap();

        assert_eq!(Some(ab), mesh.find_edge(b, a));
        assert!(mesh.find_edge(c, d).is_some());
        assert!(mesh.find_edge(a, c).is_none());
        assert!(mesh.find_edge(a, VertexKey::from_index(100)).is_none());
    }

    #[test]
    fn find_face_ignores_winding() {
        let (mesh, [a, b, c, d]) = quad();
        let front = FaceKey::from_index(0).halfface(0);

        assert_eq!(Some(front), mesh.find_face(&[a, b, c, d]));
        assert_eq!(Some(front), mesh.find_face(&[d, c, b, a]));
        assert_eq!(Some(front), mesh.find_face(&[c, a, d, b]));
        assert!(mesh.find_face(&[a, b, c]).is_none());
        assert!(mesh.find_face(&[]).is_none());
    }

    #[test]
    fn clear_resets_mesh() {
        let (mut mesh, _) = quad();
        let label = mesh.add_vertex_property("v:label", 0u32).unwrap();
        let flag = mesh.add_model_property("m:flag", true).unwrap();
        mesh.clear();

        assert_eq!(0, mesh.n_vertices());
        assert_eq!(0, mesh.n_edges());
        assert_eq!(0, mesh.n_faces());
        assert_eq!(0, mesh.n_halffaces());
        assert_eq!(0, mesh.n_cells());
        assert!(mesh.get_vertex_property::<u32>("v:label").is_none());
        assert!(mesh.vertex_data(&label).is_none());
        assert!(mesh.model_data(&flag).is_none());
        assert_eq!(
            vec!["v:connectivity", "v:point"],
            mesh.vertex_properties()
        );

        // The mesh remains usable.
        let a = mesh.add_vertex(Point3::origin());
        assert_eq!(0, a.index());
        assert_eq!(vec![1, 1], mesh.vprops.lengths());
        assert_eq!(1, mesh.mprops.len());
    }

    #[test]
    fn builtin_properties_are_protected() {
        let mut mesh = PolyMesh::new();

        assert!(!mesh.remove_vertex_property_named("v:point"));
        assert!(!mesh.remove_vertex_property_named("v:connectivity"));
        assert!(!mesh.rename_vertex_property("v:point", "v:position"));
        assert!(mesh.add_vertex_property("v:point", 0u8).is_none());
        assert!(mesh
            .get_vertex_property::<Point3<f32>>("v:point")
            .is_some());
        assert!(mesh.vertex_property_type("v:connectivity").is_some());
    }

    #[test]
    fn properties_per_kind() {
        let (mut mesh, [a, ..]) = quad();
        let color = mesh.add_face_property("f:color", [0u8; 3]).unwrap();
        mesh.face_data_mut(&color).unwrap()[FaceKey::from_index(0)] = [255, 0, 0];
        let tag = mesh.edge_property("e:tag", 1i32).unwrap();
        let name = mesh.model_property("m:name", String::new()).unwrap();
        mesh.model_data_mut(&name).unwrap()[0] = "quad".to_owned();

        assert_eq!(vec!["f:color"], mesh.face_properties());
        assert_eq!(
            [255, 0, 0],
            mesh.face_data(&color).unwrap()[FaceKey::from_index(0)]
        );
        assert_eq!(&[1, 1, 1, 1], mesh.edge_data(&tag).unwrap().as_slice());
        assert_eq!("quad", mesh.model_data(&name).unwrap()[0]);
        assert_eq!(1, mesh.model_data(&name).unwrap().len());
        assert!(mesh.get_edge_property::<u32>("e:tag").is_none());

        assert!(mesh.rename_edge_property("e:tag", "e:mark"));
        assert_eq!(Some(tag), mesh.get_edge_property::<i32>("e:mark"));
        assert!(mesh.remove_edge_property(&tag));
        assert!(mesh.edge_properties().iter().all(|name| name != "e:mark"));

        let position = mesh.vertex_data(&mesh.vpoint).unwrap()[a];
        assert_eq!(Point3::origin(), position);
    }

    #[test]
    fn assign_drops_custom_properties() {
        let (mut mesh, _) = quad();
        mesh.add_halfface_property("h:mark", false).unwrap();

        let mut copy = PolyMesh::new();
        copy.add_cell_property("c:stale", 0u8).unwrap();
        copy.assign(&mesh);
        assert_eq!(4, copy.n_vertices());
        assert_eq!(4, copy.n_edges());
        assert_eq!(1, copy.n_faces());
        assert_eq!(mesh.points(), copy.points());
        assert_eq!(vec!["h:connectivity"], copy.halfface_properties());
        assert_eq!(vec!["c:connectivity"], copy.cell_properties());
        assert_eq!(
            mesh.halfface(HalfFaceKey::from_index(1))
                .unwrap()
                .vertex_keys(),
            copy.halfface(HalfFaceKey::from_index(1))
                .unwrap()
                .vertex_keys(),
        );

        let clone = mesh.clone();
        assert!(clone.get_halfface_property::<bool>("h:mark").is_some());
    }

    #[test]
    fn display_property_stats() {
        let (mut mesh, _) = quad();
        mesh.add_cell_property("c:volume", 0.0f32).unwrap();
        let stats = mesh.property_stats().to_string();

        assert!(stats.contains("vertex properties:\n\tv:connectivity\n\tv:point\n"));
        assert!(stats.contains("cell properties:\n\tc:connectivity\n\tc:volume\n"));
        assert!(!stats.lines().any(|line| line == "face properties:"));
    }

    #[test]
    fn iterate_entities_in_index_order() {
        let (mesh, [a, b, c, d]) = quad();
        let forward = mesh.vertices().map(|vertex| vertex.key()).collect::<Vec<_>>();
        let backward = mesh
            .vertices()
            .rev()
            .map(|vertex| vertex.key())
            .collect::<Vec<_>>();

        assert_eq!(vec![a, b, c, d], forward);
        assert_eq!(vec![d, c, b, a], backward);
        assert_eq!(4, mesh.edges().len());
        assert_eq!(2, mesh.halffaces().len());
        assert_eq!(1, mesh.faces().count());
        assert_eq!(0, mesh.cells().count());
    }
}
