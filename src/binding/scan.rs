//! Reference Scanner - finds `$[[id]]` placeholders in a document
//!
//! A string scalar is a reference iff it is exactly `$[[` + id + `]]` where
//! the id is non-empty and does not contain `]]`. Strings that merely contain
//! the pattern are literals; `find_embedded_references` reports those
//! separately for the interpolating substitution mode.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::path::{DocPath, PathSegment};

const OPEN: &str = "$[[";
const CLOSE: &str = "]]";

/// Pre-compiled regex for `$[[id]]` occurrences inside a larger string
static EMBEDDED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\$\[\[(.+?)\]\]").unwrap());

/// Id of a whole-scalar reference, if `s` is one
pub fn reference_id(s: &str) -> Option<&str> {
    let id = s.strip_prefix(OPEN)?.strip_suffix(CLOSE)?;
    if id.is_empty() || id.contains(CLOSE) {
        return None;
    }
    Some(id)
}

pub fn is_reference(s: &str) -> bool {
    reference_id(s).is_some()
}

/// Ids referenced inside a string that is not itself a whole reference
pub fn embedded_ids(s: &str) -> impl Iterator<Item = &str> {
    let skip = is_reference(s) || !s.contains(OPEN);
    EMBEDDED_RE
        .captures_iter(s)
        .filter(move |_| !skip)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str()))
}

/// Replace every embedded `$[[id]]` using `lookup`; stops at the first error
pub fn replace_embedded<E>(
    s: &str,
    mut lookup: impl FnMut(&str) -> Result<String, E>,
) -> Result<String, E> {
    let mut result = String::with_capacity(s.len() + 32);
    let mut last_end = 0;
    for cap in EMBEDDED_RE.captures_iter(s) {
        let (Some(whole), Some(id)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        result.push_str(&s[last_end..whole.start()]);
        result.push_str(&lookup(id.as_str())?);
        last_end = whole.end();
    }
    result.push_str(&s[last_end..]);
    Ok(result)
}

/// Lazy depth-first walk over every string scalar of a document
pub struct Strings<'a> {
    stack: Vec<(DocPath, &'a Value)>,
}

impl<'a> Strings<'a> {
    pub fn new(document: &'a Value) -> Self {
        Self {
            stack: vec![(DocPath::root(), document)],
        }
    }
}

impl<'a> Iterator for Strings<'a> {
    type Item = (DocPath, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((path, node)) = self.stack.pop() {
            match node {
                Value::String(s) => return Some((path, s.as_str())),
                Value::Array(items) => {
                    // reversed so that pops come out in document order
                    for (i, item) in items.iter().enumerate().rev() {
                        self.stack.push((path.child(PathSegment::Index(i)), item));
                    }
                }
                Value::Object(map) => {
                    for (k, v) in map.iter().rev() {
                        self.stack.push((path.child(PathSegment::Key(k.clone())), v));
                    }
                }
                Value::Null | Value::Bool(_) | Value::Number(_) => {}
            }
        }
        None
    }
}

/// Every whole-scalar reference as `(path, id)`, lazily, in document order
pub fn find_references(document: &Value) -> impl Iterator<Item = (DocPath, &str)> {
    Strings::new(document).filter_map(|(path, s)| reference_id(s).map(|id| (path, id)))
}

/// Every reference embedded in a larger string as `(path, id)`
pub fn find_embedded_references(document: &Value) -> impl Iterator<Item = (DocPath, &str)> {
    Strings::new(document)
        .flat_map(|(path, s)| embedded_ids(s).map(move |id| (path.clone(), id)))
}
