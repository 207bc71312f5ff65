// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Insertion-ordered dictionary.
//!
//! Keys are compared with the key type's own `Eq`/`Hash`. Strings and
//! primitives therefore compare by value; wrap a shared object in
//! [`ByIdentity`] to key by reference instead. `Value` keys follow the same
//! rule per object type.

use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::{ErrorKind, Exception, Result};

/// A shared object keyed by its address.
pub struct ByIdentity<T: ?Sized>(pub Rc<T>);

impl<T: ?Sized> Clone for ByIdentity<T> {
    fn clone(&self) -> Self {
        ByIdentity(self.0.clone())
    }
}

impl<T: ?Sized> PartialEq for ByIdentity<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: ?Sized> Eq for ByIdentity<T> {}

impl<T: ?Sized> Hash for ByIdentity<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Rc::as_ptr(&self.0) as *const (), state);
    }
}

impl<T: ?Sized> fmt::Debug for ByIdentity<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByIdentity({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Dictionary<K: Hash + Eq, V> {
    entries: IndexMap<K, V>,
}

impl<K: Hash + Eq, V> Dictionary<K, V> {
    pub fn new() -> Self {
        Self { entries: IndexMap::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { entries: IndexMap::with_capacity(capacity) }
    }

    /// Collection-initializer semantics: every pair goes through `add`, so a
    /// repeated key fails.
    pub fn try_from_pairs(pairs: impl IntoIterator<Item = (K, V)>) -> Result<Self>
    where
        K: fmt::Debug,
    {
        let mut dict = Self::new();
        for (key, value) in pairs {
            dict.add(key, value)?;
        }
        Ok(dict)
    }

    /// Insert a new key; fails if an equal key is present.
    pub fn add(&mut self, key: K, value: V) -> Result<()>
    where
        K: fmt::Debug,
    {
        if self.entries.contains_key(&key) {
            return Err(Exception::new(ErrorKind::DuplicateKey(format!("{key:?}"))));
        }
        self.entries.insert(key, value);
        Ok(())
    }

    /// Insert or overwrite. Overwriting keeps the key's original position.
    pub fn set(&mut self, key: K, value: V) {
        self.entries.insert(key, value);
    }

    pub fn get<Q>(&self, key: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Debug + ?Sized,
    {
        self.entries
            .get(key)
            .ok_or_else(|| Exception::new(ErrorKind::KeyNotFound(format!("{key:?}"))))
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Result<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Debug + ?Sized,
    {
        self.entries
            .get_mut(key)
            .ok_or_else(|| Exception::new(ErrorKind::KeyNotFound(format!("{key:?}"))))
    }

    pub fn try_get_value<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(key)
    }

    /// Remove the entry for `key`; later entries keep their relative order.
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.shift_remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter()
    }
}

impl<K: Hash + Eq, V> Default for Dictionary<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq + fmt::Debug, V: fmt::Debug> fmt::Debug for Dictionary<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

/// Set semantics: later pairs overwrite earlier equal keys.
impl<K: Hash + Eq, V> FromIterator<(K, V)> for Dictionary<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}

impl<K: Hash + Eq, V> IntoIterator for Dictionary<K, V> {
    type Item = (K, V);
    type IntoIter = indexmap::map::IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a, K: Hash + Eq, V> IntoIterator for &'a Dictionary<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = indexmap::map::Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::{TypeBuilder, TypeRegistry};
    use crate::value::Value;

    #[test]
    fn set_overwrites_without_changing_count() {
        let mut dict = Dictionary::new();
        dict.set("one".to_string(), 1);
        dict.set("two".to_string(), 2);
        dict.set("one".to_string(), 2);
        assert_eq!(dict.count(), 2);
        assert_eq!(*dict.get("one").unwrap(), 2);
        assert_eq!(*dict.get("two").unwrap(), 2);
        let keys: Vec<_> = dict.keys().cloned().collect();
        assert_eq!(keys, vec!["one", "two"]);
    }

    #[test]
    fn add_rejects_duplicates() {
        let mut dict = Dictionary::new();
        dict.add(1, "a").unwrap();
        let err = dict.add(1, "b").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::DuplicateKey(_)));
        assert_eq!(dict.count(), 1);
        assert_eq!(*dict.get(&1).unwrap(), "a");
    }

    #[test]
    fn missing_key() {
        let dict: Dictionary<String, i32> = Dictionary::new();
        let err = dict.get("nope").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::KeyNotFound(_)));
        assert_eq!(dict.try_get_value("nope"), None);
        assert!(!dict.contains_key("nope"));
    }

    #[test]
    fn remove_and_clear() {
        let mut dict: Dictionary<_, _> = [(1, 'a'), (2, 'b'), (3, 'c')].into_iter().collect();
        assert!(!dict.remove(&9));
        assert_eq!(dict.count(), 3);
        assert!(dict.remove(&2));
        assert_eq!(dict.count(), 2);
        let keys: Vec<_> = dict.keys().copied().collect();
        assert_eq!(keys, vec![1, 3]);
        dict.clear();
        assert!(dict.is_empty());
        assert_eq!(dict.count(), 0);
    }

    #[test]
    fn object_keys_use_identity() {
        struct Shape {
            _sides: u32,
        }
        let a = Rc::new(Shape { _sides: 3 });
        let b = Rc::new(Shape { _sides: 3 });
        let mut dict = Dictionary::new();
        dict.set(ByIdentity(a.clone()), "a");
        dict.set(ByIdentity(b.clone()), "b");
        assert_eq!(dict.count(), 2);
        assert_eq!(*dict.get(&ByIdentity(a)).unwrap(), "a");
        assert_eq!(*dict.get(&ByIdentity(b)).unwrap(), "b");
    }

    #[test]
    fn value_keys_follow_the_type_contract() {
        let mut registry = TypeRegistry::new();
        let node = registry.register(TypeBuilder::new("Node"));
        let point = registry.register(
            TypeBuilder::new("Point").field("x", "int", Value::Int(0)).value_equality(),
        );

        let mut dict = Dictionary::new();
        dict.set(Value::Object(node.allocate()), 1);
        dict.set(Value::Object(node.allocate()), 2);
        assert_eq!(dict.count(), 2);

        dict.set(Value::Object(point.allocate()), 3);
        dict.set(Value::Object(point.allocate()), 4);
        assert_eq!(dict.count(), 3);
        assert_eq!(*dict.get(&Value::Object(point.allocate())).unwrap(), 4);
    }

    #[test]
    fn initializer_pairs_use_add() {
        let ok = Dictionary::try_from_pairs([("a", 1), ("b", 2)]).unwrap();
        assert_eq!(ok.count(), 2);
        let err = Dictionary::try_from_pairs([("a", 1), ("a", 2)]).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::DuplicateKey(_)));
    }

    #[test]
    fn get_mut_updates_in_place() {
        let mut dict = Dictionary::new();
        dict.set("hits", 0);
        *dict.get_mut("hits").unwrap() += 5;
        assert_eq!(dict.values().copied().collect::<Vec<_>>(), vec![5]);
        let pairs: Vec<_> = (&dict).into_iter().collect();
        assert_eq!(pairs, vec![(&"hits", &5)]);
    }
}
