//! Named, typed columns of per-entity data.
//!
//! A [`PropertyContainer`] stores any number of [`PropertyArray`]s for one
//! kind of entity. Every array in a container has the same length, which is
//! the number of entities of that kind: allocating an entity pushes a slot
//! onto every array, and an array added later is created at the container's
//! current length.
//!
//! Arrays are type-erased within the container and are identified by a name
//! that is unique per container. Adding, getting, and removing arrays yields
//! [`Property`] tokens, which are lightweight, copyable, and typed. A token
//! does not borrow its container; data is read and written by presenting the
//! token back to the container. Tokens are invalidated when their property is
//! removed or the container is cleared, in which case lookups yield `None`.
//!
//! A token is only meaningful for the container that issued it and for clones
//! of that container. Presenting it to any other container yields `None`.
//!
//! # Examples
//!
//! ```rust
//! use polymesh::property::PropertyContainer;
//!
//! let mut container = PropertyContainer::<usize>::new();
//! container.push();
//! container.push();
//!
//! let weight = container.add("weight", 1.0f32).unwrap();
//! container.get_array_mut(&weight).unwrap()[1] = 0.5;
//!
//! // Names are unique regardless of type.
//! assert!(container.add("weight", 0u8).is_none());
//! // Lookups must agree with the stored type.
//! assert!(container.get::<f64>("weight").is_none());
//! assert_eq!(Some(weight), container.get::<f32>("weight"));
//! ```

mod array;

use ahash::RandomState;
use derivative::Derivative;
use slotmap::{DefaultKey, SlotMap};
use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

use crate::key::Key;
use crate::property::array::Column;

pub use crate::property::array::{PropertyArray, PropertyType};

/// Typed token for a property in a [`PropertyContainer`].
///
/// Tokens compare equal if and only if they refer to the same property. The
/// key type `K` fixes the entity kind and `T` fixes the element type, so a
/// token can only be presented to a container of the matching kind.
#[derive(Derivative)]
#[derivative(
    Clone(bound = ""),
    Copy(bound = ""),
    Debug(bound = ""),
    Eq(bound = ""),
    Hash(bound = ""),
    PartialEq(bound = "")
)]
pub struct Property<K, T> {
    container: u64,
    key: DefaultKey,
    #[derivative(Debug = "ignore")]
    phantom: PhantomData<fn() -> (K, T)>,
}

impl<K, T> Property<K, T> {
    fn new(container: u64, key: DefaultKey) -> Self {
        Property {
            container,
            key,
            phantom: PhantomData,
        }
    }
}

struct Entry {
    column: Box<dyn Column>,
    is_pinned: bool,
}

impl Clone for Entry {
    fn clone(&self) -> Self {
        Entry {
            column: self.column.boxed_clone(),
            is_pinned: self.is_pinned,
        }
    }
}

/// Storage for the properties of one kind of entity.
///
/// Clones share the identity of their source, so tokens issued by either
/// container can be presented to both.
#[derive(Clone)]
pub struct PropertyContainer<K>
where
    K: Key,
{
    id: u64,
    entries: SlotMap<DefaultKey, Entry>,
    // Creation order of entries. Names are listed in this order.
    order: Vec<DefaultKey>,
    names: HashMap<String, DefaultKey, RandomState>,
    len: usize,
    phantom: PhantomData<fn() -> K>,
}

impl<K> PropertyContainer<K>
where
    K: Key,
{
    pub fn new() -> Self {
        static IDS: AtomicU64 = AtomicU64::new(0);
        PropertyContainer {
            id: IDS.fetch_add(1, Ordering::Relaxed),
            entries: SlotMap::with_key(),
            order: Vec::new(),
            names: HashMap::default(),
            len: 0,
            phantom: PhantomData,
        }
    }

    /// Gets the number of slots in every array of the container.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn n_properties(&self) -> usize {
        self.order.len()
    }

    pub fn exists(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Adds a property named `name` filled with `default`.
    ///
    /// Returns `None` if a property with the same name already exists,
    /// regardless of its type. The existing property is left untouched.
    pub fn add<T>(&mut self, name: &str, default: T) -> Option<Property<K, T>>
    where
        T: 'static + Clone,
    {
        if self.exists(name) {
            warn!(name, "property already exists");
            return None;
        }
        let column = PropertyArray::<K, T>::new(name.to_owned(), default, self.len);
        let key = self.entries.insert(Entry {
            column: Box::new(column),
            is_pinned: false,
        });
        self.order.push(key);
        self.names.insert(name.to_owned(), key);
        Some(Property::new(self.id, key))
    }

    /// Gets the property named `name` if it exists and stores elements of type
    /// `T`.
    pub fn get<T>(&self, name: &str) -> Option<Property<K, T>>
    where
        T: 'static + Clone,
    {
        let key = *self.names.get(name)?;
        self.entries
            .get(key)
            .filter(|entry| entry.column.as_any().is::<PropertyArray<K, T>>())
            .map(|_| Property::new(self.id, key))
    }

    /// Gets the property named `name`, adding it if it does not exist.
    ///
    /// Returns `None` if a property with the same name exists but stores a
    /// different type.
    pub fn get_or_add<T>(&mut self, name: &str, default: T) -> Option<Property<K, T>>
    where
        T: 'static + Clone,
    {
        if self.exists(name) {
            self.get(name)
        }
        else {
            self.add(name, default)
        }
    }

    pub fn get_array<T>(&self, property: &Property<K, T>) -> Option<&PropertyArray<K, T>>
    where
        T: 'static + Clone,
    {
        self.entry(property)
            .and_then(|entry| entry.column.as_any().downcast_ref())
    }

    pub fn get_array_mut<T>(
        &mut self,
        property: &Property<K, T>,
    ) -> Option<&mut PropertyArray<K, T>>
    where
        T: 'static + Clone,
    {
        if property.container != self.id {
            return None;
        }
        self.entries
            .get_mut(property.key)
            .and_then(|entry| entry.column.as_any_mut().downcast_mut())
    }

    fn entry<T>(&self, property: &Property<K, T>) -> Option<&Entry> {
        if property.container == self.id {
            self.entries.get(property.key)
        }
        else {
            None
        }
    }

    /// Removes the property referred to by a token.
    ///
    /// Returns `false` if the property does not exist or is pinned.
    pub fn remove<T>(&mut self, property: &Property<K, T>) -> bool {
        if property.container != self.id {
            return false;
        }
        self.remove_with_key(property.key)
    }

    /// Removes the property named `name`.
    ///
    /// Returns `false` if the property does not exist or is pinned.
    pub fn remove_named(&mut self, name: &str) -> bool {
        match self.names.get(name) {
            Some(key) => self.remove_with_key(*key),
            None => false,
        }
    }

    fn remove_with_key(&mut self, key: DefaultKey) -> bool {
        if let Some(entry) = self.entries.get(key) {
            if entry.is_pinned {
                warn!(name = entry.column.name(), "cannot remove pinned property");
                return false;
            }
        }
        match self.entries.remove(key) {
            Some(entry) => {
                self.names.remove(entry.column.name());
                self.order.retain(|other| *other != key);
                true
            }
            None => false,
        }
    }

    /// Renames a property, preserving its data and any tokens that refer to it.
    ///
    /// Returns `false` if `old` does not exist, `new` already exists, or the
    /// property is pinned.
    pub fn rename(&mut self, old: &str, new: &str) -> bool {
        let key = match self.names.get(old) {
            Some(key) => *key,
            None => {
                warn!(old, new, "cannot rename missing property");
                return false;
            }
        };
        if self.exists(new) {
            warn!(old, new, "cannot rename property onto an existing name");
            return false;
        }
        match self.entries.get_mut(key) {
            Some(entry) if !entry.is_pinned => {
                entry.column.set_name(new.to_owned());
                self.names.remove(old);
                self.names.insert(new.to_owned(), key);
                true
            }
            _ => {
                warn!(old, new, "cannot rename pinned property");
                false
            }
        }
    }

    /// Gets the names of all properties in creation order.
    pub fn properties(&self) -> Vec<String> {
        self.columns().map(|column| column.name().to_owned()).collect()
    }

    /// Gets the element type of the property named `name`.
    pub fn type_of(&self, name: &str) -> Option<PropertyType> {
        self.names
            .get(name)
            .and_then(|key| self.entries.get(*key))
            .map(|entry| entry.column.property_type())
    }

    /// Appends one slot filled with its default value to every array.
    pub fn push(&mut self) {
        for entry in self.entries.values_mut() {
            entry.column.push();
        }
        self.len += 1;
    }

    /// Truncates or extends every array to exactly `len` slots.
    pub fn resize(&mut self, len: usize) {
        for entry in self.entries.values_mut() {
            entry.column.resize(len);
        }
        self.len = len;
    }

    /// Reserves capacity for at least `additional` more slots in every array.
    pub fn reserve(&mut self, additional: usize) {
        for entry in self.entries.values_mut() {
            entry.column.reserve(additional);
        }
    }

    pub fn shrink_to_fit(&mut self) {
        for entry in self.entries.values_mut() {
            entry.column.shrink_to_fit();
        }
    }

    /// Swaps two slots in every array.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    pub fn swap(&mut self, a: usize, b: usize) {
        assert!(a < self.len && b < self.len, "slot out of bounds");
        for entry in self.entries.values_mut() {
            entry.column.swap(a, b);
        }
    }

    /// Removes every property, including pinned properties, and every slot.
    ///
    /// All outstanding tokens are invalidated.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.names.clear();
        self.len = 0;
    }

    /// Prevents a property from being removed or renamed.
    ///
    /// Pinned properties are only dropped by `clear`.
    pub(crate) fn pin<T>(&mut self, property: &Property<K, T>) {
        if property.container != self.id {
            return;
        }
        if let Some(entry) = self.entries.get_mut(property.key) {
            entry.is_pinned = true;
        }
    }

    fn columns(&self) -> impl '_ + Iterator<Item = &dyn Column> {
        self.order
            .iter()
            .flat_map(move |key| self.entries.get(*key))
            .map(|entry| entry.column.as_ref())
    }

    #[cfg(test)]
    pub(crate) fn lengths(&self) -> Vec<usize> {
        self.columns().map(|column| column.len()).collect()
    }
}

impl<K> Debug for PropertyContainer<K>
where
    K: Key,
{
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("PropertyContainer")
            .field("len", &self.len)
            .field("properties", &self.properties())
            .finish()
    }
}

impl<K> Default for PropertyContainer<K>
where
    K: Key,
{
    fn default() -> Self {
        PropertyContainer::new()
    }
}
