//! Built-in connectivity records.
//!
//! Each entity kind stores its adjacency in one pinned property of its
//! container. Sets of keys are ordered so that iteration is deterministic, but
//! only the vertex loop of a half-face and the half-face list of a cell carry
//! meaningful order.
//!
//! Some fields are `Option` types, but are required in a consistent mesh.
//! These fields are only `Option` types because new slots are filled with a
//! default record before the mesh can populate them.

use std::collections::BTreeSet;

use crate::mesh::key::{CellKey, EdgeKey, HalfFaceKey, VertexKey};

#[derive(Clone, Debug, Default)]
pub(crate) struct VertexConnectivity {
    pub vertices: BTreeSet<VertexKey>,
    pub edges: BTreeSet<EdgeKey>,
    pub halffaces: BTreeSet<HalfFaceKey>,
    pub cells: BTreeSet<CellKey>,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct EdgeConnectivity {
    /// Required endpoints in creation order.
    pub vertices: Option<(VertexKey, VertexKey)>,
    pub halffaces: BTreeSet<HalfFaceKey>,
    pub cells: BTreeSet<CellKey>,
}

impl EdgeConnectivity {
    pub fn connects(&self, a: VertexKey, b: VertexKey) -> bool {
        matches!(self.vertices, Some((s, t)) if (s == a && t == b) || (s == b && t == a))
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct HalfFaceConnectivity {
    /// Vertex loop in winding order.
    pub vertices: Vec<VertexKey>,
    pub edges: BTreeSet<EdgeKey>,
    /// Optional owning cell. Half-faces without a cell are on the border.
    pub cell: Option<CellKey>,
    /// Required opposite half-face.
    pub opposite: Option<HalfFaceKey>,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct CellConnectivity {
    pub vertices: BTreeSet<VertexKey>,
    pub edges: BTreeSet<EdgeKey>,
    /// Bounding half-faces in the order given when the cell was added.
    pub halffaces: Vec<HalfFaceKey>,
}

#[cfg(test)]
mod tests {
    use crate::key::Key;
    use crate::mesh::connectivity::EdgeConnectivity;
    use crate::mesh::key::VertexKey;

    #[test]
    fn edge_connects_either_direction() {
        let a = VertexKey::from_index(0);
        let b = VertexKey::from_index(1);
        let c = VertexKey::from_index(2);
        let edge = EdgeConnectivity {
            vertices: Some((a, b)),
            ..Default::default()
        };

        assert!(edge.connects(a, b));
        assert!(edge.connects(b, a));
        assert!(!edge.connects(a, c));
        assert!(!EdgeConnectivity::default().connects(a, b));
    }
}
