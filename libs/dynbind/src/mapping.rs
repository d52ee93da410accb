use std::collections::HashMap;

use crate::location::Location;
use crate::value::Value;

/// Map key with the locations it was written at.
#[derive(Debug, Clone, Default)]
pub struct Key {
    name: String,
    locations: Vec<Location>,
}

impl Key {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            locations: Vec::new(),
        }
    }

    pub fn with_locations(mut self, locations: Vec<Location>) -> Self {
        self.locations = locations;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// A single entry of a [`Mapping`].
#[derive(Debug, Clone)]
pub struct Pair {
    pub key: Key,
    pub value: Value,
}

/// Insertion-ordered map with unique string keys.
#[derive(Debug, Clone, Default)]
pub struct Mapping {
    pairs: Vec<Pair>,
    index: HashMap<String, usize>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pairs: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.get_pair(name).map(|pair| &pair.value)
    }

    pub fn get_pair(&self, name: &str) -> Option<&Pair> {
        self.index.get(name).map(|&i| &self.pairs[i])
    }

    /// Set `key` to `value`.
    ///
    /// An existing entry keeps its position; its key and value are replaced.
    pub fn insert(&mut self, key: impl Into<Key>, value: Value) {
        let key = key.into();
        match self.index.get(key.name()) {
            Some(&i) => self.pairs[i] = Pair { key, value },
            None => {
                self.index.insert(key.name().to_owned(), self.pairs.len());
                self.pairs.push(Pair { key, value });
            }
        }
    }

    pub fn pairs(&self) -> &[Pair] {
        &self.pairs
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.pairs.iter().map(|pair| (pair.key.name(), &pair.value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|pair| pair.key.name())
    }
}

/// Equal when both hold the same keys with equal values, in any order.
impl PartialEq for Mapping {
    fn eq(&self, other: &Self) -> bool {
        self.pairs.len() == other.pairs.len()
            && self
                .pairs
                .iter()
                .all(|pair| other.get(pair.key.name()) == Some(&pair.value))
    }
}

impl<K: Into<Key>> FromIterator<(K, Value)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut out = Mapping::new();
        for (key, value) in iter {
            out.insert(key, value);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_preserves_order() {
        let mut map = Mapping::new();
        map.insert("b", Value::from(1));
        map.insert("a", Value::from(2));
        map.insert("c", Value::from(3));
        assert_eq!(map.keys().collect::<Vec<_>>(), ["b", "a", "c"]);
    }

    #[test]
    fn insert_existing_key_replaces_in_place() {
        let mut map = Mapping::new();
        map.insert("a", Value::from(1));
        map.insert("b", Value::from(2));
        map.insert(Key::new("a").with_locations(vec![Location::new("x.yml", 4, 2)]), Value::from(3));

        assert_eq!(map.len(), 2);
        assert_eq!(map.keys().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(map.get("a"), Some(&Value::from(3)));
        let pair = map.get_pair("a").expect("a is present");
        assert_eq!(pair.key.locations(), [Location::new("x.yml", 4, 2)]);
    }

    #[test]
    fn equality_ignores_order() {
        let ab: Mapping = [("a", Value::from(1)), ("b", Value::from(2))].into_iter().collect();
        let ba: Mapping = [("b", Value::from(2)), ("a", Value::from(1))].into_iter().collect();
        let ac: Mapping = [("a", Value::from(1)), ("c", Value::from(2))].into_iter().collect();
        assert_eq!(ab, ba);
        assert_ne!(ab, ac);
    }
}
