//! Keys for mesh storage.
//!
//! This module defines opaque keys for looking up mesh entities. Keys do not
//! expose their underlying representation beyond an index and enforce that
//! lookups for a particular kind of entity use an appropriate key type.
//!
//! Half-faces are allocated in opposing pairs and each pair forms a face. The
//! half-faces of face $f$ are always $2f$ and $2f + 1$, so half-face and face
//! keys can be converted into each other without a lookup.

use std::convert::TryFrom;
use std::fmt::{self, Display, Formatter};

use crate::key::Key;

macro_rules! impl_keys {
    ($($(#[$attr:meta])* $key:ident => $prefix:literal),*$(,)?) => (
        $(
            $(#[$attr])*
            #[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
            pub struct $key(u32);

            impl Key for $key {
                fn from_index(index: usize) -> Self {
                    $key(u32::try_from(index).expect("key index out of range"))
                }

                fn index(self) -> usize {
                    self.0 as usize
                }
            }

            impl Display for $key {
                fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
                    write!(formatter, concat!($prefix, "{}"), self.0)
                }
            }
        )*
    );
}
impl_keys!(
    /// Key of a vertex.
    VertexKey => "v",
    /// Key of an (undirected) edge between two vertices.
    EdgeKey => "e",
    /// Key of a half-face: one oriented side of a face.
    HalfFaceKey => "h",
    /// Key of a face: an opposing pair of half-faces.
    FaceKey => "f",
    /// Key of a polyhedral cell.
    CellKey => "c",
);

impl HalfFaceKey {
    /// Gets the face formed by this half-face and its opposite.
    pub fn face(self) -> FaceKey {
        FaceKey(self.0 >> 1)
    }

    /// Gets the position (`0` or `1`) of this half-face within its face.
    pub fn side(self) -> usize {
        (self.0 & 1) as usize
    }
}

impl FaceKey {
    /// Gets the `i`th half-face of the face.
    ///
    /// # Panics
    ///
    /// Panics if `i` is not `0` or `1`.
    pub fn halfface(self, i: usize) -> HalfFaceKey {
        assert!(i <= 1, "face has exactly two half-faces");
        HalfFaceKey((self.0 << 1) + i as u32)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use crate::key::Key;
    use crate::mesh::key::{CellKey, EdgeKey, FaceKey, HalfFaceKey, VertexKey};

    #[test]
    fn display_with_prefix() {
        assert_eq!("v3", VertexKey::from_index(3).to_string());
        assert_eq!("e1", EdgeKey::from_index(1).to_string());
        assert_eq!("h4", HalfFaceKey::from_index(4).to_string());
        assert_eq!("f2", FaceKey::from_index(2).to_string());
        assert_eq!("c0", CellKey::from_index(0).to_string());
    }

    #[test]
    fn pair_halffaces_with_faces() {
        let face = FaceKey::from_index(5);

        assert_eq!(10, face.halfface(0).index());
        assert_eq!(11, face.halfface(1).index());
        assert_eq!(face, face.halfface(0).face());
        assert_eq!(face, face.halfface(1).face());
        assert_eq!(1, face.halfface(1).side());
    }

    #[test]
    #[should_panic]
    fn reject_third_halfface() {
        let _ = FaceKey::from_index(0).halfface(2);
    }

    #[test]
    fn order_by_index() {
        let keys = [2, 0, 1]
            .iter()
            .map(|index| VertexKey::from_index(*index))
            .collect::<BTreeSet<_>>();

        assert_eq!(
            vec![0, 1, 2],
            keys.into_iter().map(|key| key.index()).collect::<Vec<_>>()
        );
    }
}
