//! Document paths - locations of scalars inside a nested document

use std::fmt;

use serde_json::Value;
use smallvec::SmallVec;

/// One step from a node to a child node
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Path from the document root to a node
///
/// Renders as a JSON Pointer (`/inputs/parameters/0`); the root is `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocPath(SmallVec<[PathSegment; 6]>);

impl DocPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, segment: PathSegment) {
        self.0.push(segment);
    }

    /// New path one step deeper
    pub fn child(&self, segment: PathSegment) -> Self {
        let mut path = self.clone();
        path.push(segment);
        path
    }

    /// Split into parent path and last segment
    pub fn split_last(&self) -> Option<(DocPath, &PathSegment)> {
        let (last, rest) = self.0.split_last()?;
        Some((DocPath(rest.iter().cloned().collect()), last))
    }

    /// Resolve against a document
    pub fn get<'a>(&self, document: &'a Value) -> Option<&'a Value> {
        self.0.iter().try_fold(document, |node, segment| match (segment, node) {
            (PathSegment::Key(k), Value::Object(map)) => map.get(k),
            (PathSegment::Index(i), Value::Array(items)) => items.get(*i),
            _ => None,
        })
    }

    /// Resolve mutably against a document
    pub fn get_mut<'a>(&self, document: &'a mut Value) -> Option<&'a mut Value> {
        self.0.iter().try_fold(document, |node, segment| match (segment, node) {
            (PathSegment::Key(k), Value::Object(map)) => map.get_mut(k),
            (PathSegment::Index(i), Value::Array(items)) => items.get_mut(*i),
            _ => None,
        })
    }

    /// Detach the node at this path from its container.
    ///
    /// Mapping entries are removed by key; sequence elements are removed and
    /// later elements shift down. Removing the root is not possible.
    pub fn remove(&self, document: &mut Value) -> Option<Value> {
        let (parent, last) = self.split_last()?;
        match (last, parent.get_mut(document)?) {
            (PathSegment::Key(k), Value::Object(map)) => map.remove(k),
            (PathSegment::Index(i), Value::Array(items)) if *i < items.len() => {
                Some(items.remove(*i))
            }
            _ => None,
        }
    }
}

impl FromIterator<PathSegment> for DocPath {
    fn from_iter<I: IntoIterator<Item = PathSegment>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.0 {
            match segment {
                PathSegment::Key(k) => write!(f, "/{}", k.replace('~', "~0").replace('/', "~1"))?,
                PathSegment::Index(i) => write!(f, "/{}", i)?,
            }
        }
        Ok(())
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(segments: Vec<PathSegment>) -> DocPath {
        segments.into_iter().collect()
    }

    #[test]
    fn renders_as_json_pointer() {
        let p = path(vec!["inputs".into(), "parameters".into(), 0.into()]);
        assert_eq!(p.to_string(), "/inputs/parameters/0");
        assert_eq!(DocPath::root().to_string(), "");
    }

    #[test]
    fn escapes_pointer_characters() {
        let p = path(vec!["a/b".into(), "c~d".into()]);
        assert_eq!(p.to_string(), "/a~1b/c~0d");
    }

    #[test]
    fn get_and_get_mut_follow_segments() {
        let mut doc = json!({"args": ["x", {"k": 1}]});
        let p = path(vec!["args".into(), 1.into(), "k".into()]);
        assert_eq!(p.get(&doc), Some(&json!(1)));

        *p.get_mut(&mut doc).unwrap() = json!(2);
        assert_eq!(doc["args"][1]["k"], json!(2));

        let wrong = path(vec!["args".into(), "k".into()]);
        assert!(wrong.get(&doc).is_none());
    }

    #[test]
    fn remove_detaches_entries_and_elements() {
        let mut doc = json!({"a": 1, "b": [1, 2, 3]});
        assert_eq!(path(vec!["a".into()]).remove(&mut doc), Some(json!(1)));
        assert_eq!(path(vec!["b".into(), 1.into()]).remove(&mut doc), Some(json!(2)));
        assert_eq!(doc, json!({"b": [1, 3]}));
        assert!(DocPath::root().remove(&mut doc).is_none());
    }

    #[test]
    fn later_sequence_paths_sort_after_earlier() {
        let a = path(vec!["b".into(), 1.into()]);
        let b = path(vec!["b".into(), 2.into()]);
        assert!(a < b);
    }
}
