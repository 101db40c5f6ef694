use std::{
    borrow::Borrow,
    collections::HashMap,
    fmt::{self, Debug},
    hash::Hash,
};

/// A map whose value contains a list of multiple values. Keys and the values
/// under each key both iterate in the order they were first inserted.
#[derive(Clone)]
pub struct MultiMap<K, V> {
    inner: HashMap<K, Vec<V>>,
    order: Vec<K>,
}

impl<K: Hash + Eq + Clone, V: Eq> MultiMap<K, V> {
    pub fn new() -> Self {
        MultiMap {
            inner: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn get<Q: ?Sized>(&self, k: &Q) -> &[V]
    where
        K: Borrow<Q>,
        Q: Hash + Eq,
    {
        self.inner.get(k).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_key<Q: ?Sized>(&self, k: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq,
    {
        self.inner.contains_key(k)
    }

    pub fn insert(&mut self, k: K, v: V) {
        if !self.inner.contains_key(&k) {
            self.order.push(k.clone());
        }

        let bucket = self.inner.entry(k).or_default();

        if bucket.contains(&v) {
            return;
        }

        bucket.push(v);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &[V])> {
        self.order
            .iter()
            .map(move |key| (key, self.inner[key].as_slice()))
    }
}

impl<K: Debug + Hash + Eq, V: Debug> Debug for MultiMap<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter
            .debug_map()
            .entries(self.order.iter().map(|key| (key, &self.inner[key])))
            .finish()
    }
}

impl<K, V> Default for MultiMap<K, V> {
    fn default() -> Self {
        Self {
            inner: Default::default(),
            order: Default::default(),
        }
    }
}
