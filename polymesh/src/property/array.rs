use derivative::Derivative;
use std::any::{self, Any, TypeId};
use std::fmt::{self, Debug, Display, Formatter};
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};
use std::slice;

use crate::key::Key;

/// Runtime type tag of the elements stored in a property.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct PropertyType {
    id: TypeId,
    name: &'static str,
}

impl PropertyType {
    pub fn of<T>() -> Self
    where
        T: 'static,
    {
        PropertyType {
            id: TypeId::of::<T>(),
            name: any::type_name::<T>(),
        }
    }

    pub fn is<T>(&self) -> bool
    where
        T: 'static,
    {
        self.id == TypeId::of::<T>()
    }

    /// Gets the name of the element type.
    ///
    /// This is intended for diagnostics and its exact contents are not stable.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl Display for PropertyType {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.name)
    }
}

// Type-erased interface of a `PropertyArray`. Containers operate on every
// column through this trait and recover the concrete type by downcasting.
pub(in crate::property) trait Column: Any {
    fn name(&self) -> &str;

    fn set_name(&mut self, name: String);

    fn len(&self) -> usize;

    fn push(&mut self);

    fn resize(&mut self, len: usize);

    fn reserve(&mut self, additional: usize);

    fn shrink_to_fit(&mut self);

    fn swap(&mut self, a: usize, b: usize);

    fn property_type(&self) -> PropertyType;

    fn boxed_clone(&self) -> Box<dyn Column>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Dense column of per-entity data.
///
/// A property array holds one element per entity of its kind and is indexed
/// by that kind's key. New slots are filled with the default value given when
/// the property was added.
#[derive(Derivative)]
#[derivative(Clone(bound = "T: Clone"), Debug(bound = "T: Debug"))]
pub struct PropertyArray<K, T> {
    name: String,
    data: Vec<T>,
    default: T,
    #[derivative(Debug = "ignore")]
    phantom: PhantomData<fn() -> K>,
}

impl<K, T> PropertyArray<K, T>
where
    K: Key,
    T: Clone,
{
    pub(in crate::property) fn new(name: String, default: T, len: usize) -> Self {
        PropertyArray {
            name,
            data: vec![default.clone(); len],
            default,
            phantom: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Gets the value used to fill newly allocated slots.
    pub fn default_value(&self) -> &T {
        &self.default
    }

    pub fn get(&self, key: K) -> Option<&T> {
        self.data.get(key.index())
    }

    pub fn get_mut(&mut self, key: K) -> Option<&mut T> {
        self.data.get_mut(key.index())
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.data.iter()
    }

    pub fn iter_mut(&mut self) -> slice::IterMut<'_, T> {
        self.data.iter_mut()
    }
}

impl<K, T> Column for PropertyArray<K, T>
where
    K: Key,
    T: 'static + Clone,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn push(&mut self) {
        self.data.push(self.default.clone());
    }

    fn resize(&mut self, len: usize) {
        self.data.resize(len, self.default.clone());
    }

    fn reserve(&mut self, additional: usize) {
        self.data.reserve(additional);
    }

    fn shrink_to_fit(&mut self) {
        self.data.shrink_to_fit();
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.data.swap(a, b);
    }

    fn property_type(&self) -> PropertyType {
        PropertyType::of::<T>()
    }

    fn boxed_clone(&self) -> Box<dyn Column> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl<K, T> Index<K> for PropertyArray<K, T>
where
    K: Key,
{
    type Output = T;

    fn index(&self, key: K) -> &Self::Output {
        &self.data[key.index()]
    }
}

impl<K, T> IndexMut<K> for PropertyArray<K, T>
where
    K: Key,
{
    fn index_mut(&mut self, key: K) -> &mut Self::Output {
        &mut self.data[key.index()]
    }
}

impl<'a, K, T> IntoIterator for &'a PropertyArray<K, T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}
