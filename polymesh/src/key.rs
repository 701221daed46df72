//! Opaque keys into dense entity storage.
//!
//! Entities are stored in dense columns and are addressed by their position in
//! those columns. Keys wrap that position in a distinct type per entity kind,
//! so that a vertex key can never be used to look up an edge even if their
//! indices coincide.

use std::fmt::Debug;
use std::hash::Hash;
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::ops::Range;

/// Key into dense storage.
///
/// Keys are ordered and hashed by their index.
pub trait Key: 'static + Copy + Debug + Eq + Hash + Ord + Sized {
    fn from_index(index: usize) -> Self;

    fn index(self) -> usize;
}

// Whole-model storage has no dedicated entity and is addressed by raw index.
impl Key for usize {
    fn from_index(index: usize) -> Self {
        index
    }

    fn index(self) -> usize {
        self
    }
}

/// Iterator over the keys of a dense range `0..n`.
///
/// The range is captured when the iterator is constructed. The iterator can be
/// stepped from either end and always knows its exact length.
#[derive(Clone, Debug)]
pub struct Keys<K>
where
    K: Key,
{
    range: Range<usize>,
    phantom: PhantomData<fn() -> K>,
}

impl<K> Keys<K>
where
    K: Key,
{
    pub fn new(len: usize) -> Self {
        Keys {
            range: 0..len,
            phantom: PhantomData,
        }
    }
}

impl<K> Iterator for Keys<K>
where
    K: Key,
{
    type Item = K;

    fn next(&mut self) -> Option<Self::Item> {
        self.range.next().map(K::from_index)
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        self.range.nth(n).map(K::from_index)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.range.size_hint()
    }
}

impl<K> DoubleEndedIterator for Keys<K>
where
    K: Key,
{
    fn next_back(&mut self) -> Option<Self::Item> {
        self.range.next_back().map(K::from_index)
    }
}

impl<K> ExactSizeIterator for Keys<K> where K: Key {}

impl<K> FusedIterator for Keys<K> where K: Key {}

#[cfg(test)]
mod tests {
    use crate::key::Keys;

    #[test]
    fn iterate_from_both_ends() {
        let mut keys = Keys::<usize>::new(4);

        assert_eq!(4, keys.len());
        assert_eq!(Some(0), keys.next());
        assert_eq!(Some(3), keys.next_back());
        assert_eq!(2, keys.len());
        assert_eq!(vec![1, 2], keys.collect::<Vec<_>>());
    }

    #[test]
    fn restart_revisits_all_keys() {
        let keys = Keys::<usize>::new(3);

        assert_eq!(3, keys.clone().count());
        assert_eq!(vec![2, 1, 0], keys.rev().collect::<Vec<_>>());
    }
}
