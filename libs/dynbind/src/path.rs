use std::fmt;

use serde::{Serialize, Serializer};

/// One step into a value tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathElement {
    Key(String),
    Index(usize),
}

/// Structural position inside a value tree, e.g. `resources.jobs[0].name`.
///
/// Paths are cheap to extend: `key` and `index` return a new path and
/// leave the receiver untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path(Vec<PathElement>);

impl Path {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn key(&self, key: impl Into<String>) -> Self {
        let mut elements = self.0.clone();
        elements.push(PathElement::Key(key.into()));
        Self(elements)
    }

    pub fn index(&self, index: usize) -> Self {
        let mut elements = self.0.clone();
        elements.push(PathElement::Index(index));
        Self(elements)
    }

    pub fn elements(&self) -> &[PathElement] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Prepend an element; used while unwinding errors out of a nested walk.
    pub(crate) fn push_front(&mut self, element: PathElement) {
        self.0.insert(0, element);
    }
}

impl FromIterator<PathElement> for Path {
    fn from_iter<I: IntoIterator<Item = PathElement>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, element) in self.0.iter().enumerate() {
            match element {
                PathElement::Key(key) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(key)?;
                }
                PathElement::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_joins_keys_and_indices() {
        let path = Path::root().key("resources").key("jobs").index(0).key("name");
        assert_eq!(path.to_string(), "resources.jobs[0].name");
    }

    #[test]
    fn root_displays_empty() {
        assert_eq!(Path::root().to_string(), "");
        assert!(Path::root().is_root());
    }

    #[test]
    fn leading_index_has_no_separator() {
        let path = Path::root().index(3).key("a");
        assert_eq!(path.to_string(), "[3].a");
    }

    #[test]
    fn push_front_prepends() {
        let mut path = Path::root().key("b");
        path.push_front(PathElement::Key("a".into()));
        assert_eq!(path.to_string(), "a.b");
    }
}
