//! Geometric queries.
//!
//! Positions are the only geometry stored by a mesh. Normals, lengths, and
//! areas are derived from positions on demand. Normals can also be cached in a
//! half-face property via [`PolyMesh::update_face_normals`].
//!
//! Degenerate geometry is never an error. Zero-length edges and zero-area
//! faces are stored as given, and derived normals of such faces are zero.

use nalgebra::{Point3, Vector3};
use tracing::debug;

use crate::key::Key;
use crate::mesh::{
    loop_pairs, EdgeKey, HalfFaceKey, HalfFaceProperty, OptionExt as _, PolyMesh, VertexKey,
};

/// Relative tolerance used to detect degenerate half-faces.
///
/// A half-face is degenerate if the magnitude of its Newell vector is at most
/// this tolerance times the squared length of its longest edge.
pub const DEGENERACY_EPSILON: f32 = 1e-6;

impl PolyMesh {
    /// Gets the position of a vertex.
    ///
    /// # Panics
    ///
    /// Panics if the key is not valid.
    pub fn position(&self, key: VertexKey) -> &Point3<f32> {
        &self.points()[key.index()]
    }

    /// # Panics
    ///
    /// Panics if the key is not valid.
    pub fn position_mut(&mut self, key: VertexKey) -> &mut Point3<f32> {
        &mut self.points_mut()[key.index()]
    }

    /// Gets the positions of all vertices in index order.
    pub fn points(&self) -> &[Point3<f32>] {
        self.vprops
            .get_array(&self.vpoint)
            .expect_consistent()
            .as_slice()
    }

    pub fn points_mut(&mut self) -> &mut [Point3<f32>] {
        self.vprops
            .get_array_mut(&self.vpoint)
            .expect_consistent()
            .as_mut_slice()
    }

    /// Computes the unit normal of a half-face.
    ///
    /// The normal is computed with Newell's method, which is robust for
    /// non-planar and concave loops. The normal of the opposite half-face is
    /// negated. The normal of a degenerate half-face is the zero vector.
    ///
    /// # Panics
    ///
    /// Panics if the key is not valid.
    pub fn compute_face_normal(&self, key: HalfFaceKey) -> Vector3<f32> {
        if self.is_degenerate(key) {
            Vector3::zeros()
        }
        else {
            self.newell(key).normalize()
        }
    }

    /// Computes and caches the normals of all half-faces.
    ///
    /// Normals are written to the half-face property `"h:normal"`, which is
    /// added if it does not exist. Returns `None` if a property with that name
    /// exists with a type other than `Vector3<f32>`.
    pub fn update_face_normals(&mut self) -> Option<HalfFaceProperty<Vector3<f32>>> {
        let property = self.halfface_property("h:normal", Vector3::zeros())?;
        let normals = self
            .halfface_keys()
            .map(|halfface| self.compute_face_normal(halfface))
            .collect::<Vec<_>>();
        self.halfface_data_mut(&property)
            .expect_consistent()
            .as_mut_slice()
            .copy_from_slice(&normals);
        debug!(halffaces = normals.len(), "updated face normals");
        Some(property)
    }

    /// Computes the Euclidean distance between the endpoints of an edge.
    ///
    /// # Panics
    ///
    /// Panics if the key is not valid.
    pub fn edge_length(&self, key: EdgeKey) -> f32 {
        let (a, b) = self.edge_connectivity(key).vertices.expect_consistent();
        nalgebra::distance(self.position(a), self.position(b))
    }

    /// Determines if a half-face has (nearly) zero area.
    ///
    /// See [`DEGENERACY_EPSILON`].
    ///
    /// # Panics
    ///
    /// Panics if the key is not valid.
    pub fn is_degenerate(&self, key: HalfFaceKey) -> bool {
        let longest = self
            .halfface_connectivity(key)
            .edges
            .iter()
            .map(|edge| self.edge_length(*edge))
            .fold(0.0f32, f32::max);
        self.newell(key).norm() <= DEGENERACY_EPSILON * longest * longest
    }

    // Sum of cross products of consecutive positions relative to the first
    // position of the loop. This is twice the vector area of the loop.
    fn newell(&self, key: HalfFaceKey) -> Vector3<f32> {
        let points = self.points();
        let vertices = &self.halfface_connectivity(key).vertices;
        let origin = match vertices.first() {
            Some(vertex) => points[vertex.index()],
            None => return Vector3::zeros(),
        };
        loop_pairs(vertices).fold(Vector3::zeros(), |normal, (a, b)| {
            let a = points[a.index()] - origin;
            let b = points[b.index()] - origin;
            normal + a.cross(&b)
        })
    }
}
