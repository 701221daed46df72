//! **Polymesh** is a library for polyhedral (volumetric) mesh connectivity.
//!
//! A [`PolyMesh`] stores vertices, edges, half-faces, faces, and cells in dense
//! storage addressed by opaque, strongly typed keys. Every entity kind owns a
//! [`PropertyContainer`] of named, typed columns. Connectivity and vertex
//! positions are themselves columns in these containers, and user code can
//! attach arbitrary columns of its own by name.
//!
//! Please note that versions in the `0.0.*` series are experimental and
//! unstable! Use exact version constraints when specifying a dependency to
//! avoid spurious breakage.
//!
//! # Examples
//!
//! Building a tetrahedron and attaching a per-cell property:
//!
//! ```rust
//! use polymesh::prelude::*;
//! use polymesh::{Point3, PolyMesh};
//!
//! let mut mesh = PolyMesh::new();
//! let a = mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
//! let b = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
//! let c = mesh.add_vertex(Point3::new(0.0, 1.0, 0.0));
//! let d = mesh.add_vertex(Point3::new(0.0, 0.0, 1.0));
//! let cell = mesh.add_tetra(a, b, c, d).unwrap();
//!
//! let quality = mesh.add_cell_property("c:quality", 0.0f32).unwrap();
//! mesh.cell_data_mut(&quality).unwrap()[cell] = 1.0;
//!
//! assert!(mesh.is_tetrahedral_mesh());
//! assert_eq!(4, mesh.n_faces());
//! ```
//!
//! [`PolyMesh`]: crate::mesh::PolyMesh
//! [`PropertyContainer`]: crate::property::PropertyContainer

pub mod key;
pub mod mesh;
pub mod property;

pub use nalgebra::{Point3, Vector3};

pub use crate::mesh::{MeshError, PolyMesh};

pub mod prelude {
    //! Re-exports commonly used types and traits.
    //!
    //! Importing the contents of this module is recommended when working with
    //! keys, as key conversions are expressed through traits.

    pub use crate::key::Key as _;
    pub use crate::mesh::{CellKey, EdgeKey, FaceKey, HalfFaceKey, VertexKey};
}
