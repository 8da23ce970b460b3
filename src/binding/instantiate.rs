//! Template Instantiation - `$[[id]]` substitution into a fresh document
//!
//! The source document is never mutated. All substitution sites are located
//! on the source first, then written into a deep copy, so a substituted value
//! that happens to look like a reference is never rescanned.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::ast::ParameterDeclaration;
use crate::error::WftError;
use crate::params::ParameterSet;

use super::coerce::to_text;
use super::path::{DocPath, PathSegment};
use super::scan::{embedded_ids, find_references, replace_embedded, Strings};
use super::validate::Binding;

/// How references are matched during instantiation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubstitutionMode {
    /// Only scalars that are exactly `$[[id]]` are substituted
    #[default]
    Whole,
    /// Also splice `$[[id]]` occurrences inside larger strings as text
    Interpolate,
}

impl SubstitutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubstitutionMode::Whole => "whole",
            SubstitutionMode::Interpolate => "interpolate",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "whole" => Some(SubstitutionMode::Whole),
            "interpolate" => Some(SubstitutionMode::Interpolate),
            _ => None,
        }
    }
}

impl fmt::Display for SubstitutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a single reference resolves to
enum Resolved<'b> {
    Value(&'b Value),
    /// File parameter staged under a fixed path
    Staged(&'b str),
    /// Optional parameter without a value
    Absent,
}

fn resolve<'b>(
    set: &'b ParameterSet,
    binding: &'b Binding,
    id: &str,
    path: &DocPath,
) -> Result<Resolved<'b>, WftError> {
    let Some(decl) = set.lookup(id) else {
        return binding
            .get_root(id)
            .map(Resolved::Value)
            .ok_or_else(|| unbound(id, path));
    };

    if decl.is_record() {
        return Err(WftError::RecordNotSubstitutable {
            id: id.to_string(),
            path: path.to_string(),
        });
    }

    match (binding.get(set, id), decl.as_target.as_deref()) {
        (Some(_), Some(target)) => Ok(Resolved::Staged(target)),
        (Some(value), None) => Ok(Resolved::Value(value)),
        (None, _) if is_optional(set, decl) => Ok(Resolved::Absent),
        (None, _) => Err(unbound(id, path)),
    }
}

/// A parameter is optional if it or any enclosing record is not required
fn is_optional(set: &ParameterSet, decl: &ParameterDeclaration) -> bool {
    set.lineage(&decl.id)
        .into_iter()
        .filter_map(|id| set.lookup(id))
        .any(|d| !d.required)
}

fn unbound(id: &str, path: &DocPath) -> WftError {
    WftError::UnboundReference {
        id: id.to_string(),
        path: path.to_string(),
    }
}

/// Substitute every whole-scalar reference using the binding
pub fn instantiate(
    document: &Value,
    set: &ParameterSet,
    binding: &Binding,
) -> Result<Value, WftError> {
    instantiate_with(document, set, binding, SubstitutionMode::Whole)
}

/// Substitute references using an explicit substitution mode
#[instrument(skip(document, set, binding))]
pub fn instantiate_with(
    document: &Value,
    set: &ParameterSet,
    binding: &Binding,
    mode: SubstitutionMode,
) -> Result<Value, WftError> {
    let mut writes: Vec<(DocPath, Value)> = Vec::new();
    let mut removals: Vec<DocPath> = Vec::new();

    for (path, id) in find_references(document) {
        match resolve(set, binding, id, &path)? {
            Resolved::Value(value) => {
                debug!(%path, id, "Substituting reference");
                writes.push((path, value.clone()));
            }
            Resolved::Staged(target) => {
                debug!(%path, id, target, "Substituting staged file");
                writes.push((path, Value::String(target.to_string())));
            }
            // a sequence keeps its positions, so the element becomes null
            Resolved::Absent => match path.segments().last() {
                Some(PathSegment::Key(_)) => {
                    debug!(%path, id, "Removing unbound optional reference");
                    removals.push(path);
                }
                _ => {
                    debug!(%path, id, "Nulling unbound optional reference");
                    writes.push((path, Value::Null));
                }
            },
        }
    }

    if mode == SubstitutionMode::Interpolate {
        for (path, s) in Strings::new(document) {
            if embedded_ids(s).next().is_none() {
                continue;
            }
            let text = replace_embedded(s, |id| match resolve(set, binding, id, &path)? {
                Resolved::Value(value) => Ok(to_text(value)),
                Resolved::Staged(target) => Ok(target.to_string()),
                Resolved::Absent => Err(unbound(id, &path)),
            })?;
            writes.push((path, Value::String(text)));
        }
    }

    let mut output = document.clone();
    let substituted = writes.len();
    for (path, value) in writes {
        if let Some(slot) = path.get_mut(&mut output) {
            *slot = value;
        }
    }

    let removed = removals.len();
    for path in removals {
        path.remove(&mut output);
    }

    info!(substituted, removed, "Instantiated document");
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Datatype;
    use crate::binding::validate;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn hello_world() -> ParameterSet {
        ParameterSet::build(vec![
            ParameterDeclaration::new("codeFile", Datatype::File),
            ParameterDeclaration::new("sleeptime", Datatype::Int).with_default(json!(10)),
        ])
        .unwrap()
    }

    #[test]
    fn substitutes_typed_values() {
        let set = hello_world();
        let doc = json!({
            "outputfile": "results/greetings.txt",
            "args": ["$[[codeFile]]", "$[[sleeptime]]"]
        });
        let binding = validate(&set, &json!({"codeFile": "helloworld.py"})).unwrap();
        let out = instantiate(&doc, &set, &binding).unwrap();
        assert_eq!(
            out,
            json!({"outputfile": "results/greetings.txt", "args": ["helloworld.py", 10]})
        );
    }

    #[test]
    fn source_document_is_not_mutated() {
        let set = hello_world();
        let doc = json!({"a": "$[[codeFile]]"});
        let before = doc.clone();
        let binding = validate(&set, &json!({"codeFile": "x.py"})).unwrap();
        instantiate(&doc, &set, &binding).unwrap();
        assert_eq!(doc, before);
    }

    #[test]
    fn reference_free_document_is_unchanged() {
        let set = hello_world();
        let doc = json!({"steps": [{"run": "echo $[[not closed"}, 1, true, null]});
        let binding = validate(&set, &json!({"codeFile": "x"})).unwrap();
        assert_eq!(instantiate(&doc, &set, &binding).unwrap(), doc);
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        let set = hello_world();
        let doc = json!(["$[[codeFile]]"]);
        let binding = validate(&set, &json!({"codeFile": "$[[sleeptime]]"})).unwrap();
        assert_eq!(
            instantiate(&doc, &set, &binding).unwrap(),
            json!(["$[[sleeptime]]"])
        );
    }

    #[test]
    fn record_reference_is_an_instantiation_error() {
        let set = ParameterSet::build(vec![
            ParameterDeclaration::new("output", Datatype::Record),
            ParameterDeclaration::new("t", Datatype::Int)
                .with_parent("output")
                .with_default(json!(1)),
        ])
        .unwrap();
        let binding = validate(&set, &json!({})).unwrap();
        let err = instantiate(&json!({"o": "$[[output]]"}), &set, &binding).unwrap_err();
        assert!(matches!(err, WftError::RecordNotSubstitutable { .. }));
        assert_eq!(err.document_path(), Some("/o"));
    }

    #[test]
    fn child_references_resolve_through_records() {
        let set = ParameterSet::build(vec![
            ParameterDeclaration::new("output", Datatype::Record),
            ParameterDeclaration::new("t", Datatype::Int)
                .with_parent("output")
                .with_default(json!(1)),
        ])
        .unwrap();
        let binding = validate(&set, &json!({"output": {"t": 4}})).unwrap();
        let out = instantiate(&json!({"type": "$[[t]]"}), &set, &binding).unwrap();
        assert_eq!(out, json!({"type": 4}));
    }

    #[test]
    fn missing_binding_entry_is_reported_with_path() {
        let set = hello_world();
        let err = instantiate(&json!({"x": ["$[[codeFile]]"]}), &set, &Binding::new()).unwrap_err();
        assert!(matches!(err, WftError::UnboundReference { ref path, .. } if path == "/x/0"));
    }

    #[test]
    fn undeclared_reference_without_binding_fails() {
        let err = instantiate(
            &json!({"x": "$[[ghost]]"}),
            &ParameterSet::default(),
            &Binding::new(),
        )
        .unwrap_err();
        assert_eq!(err.code(), "WFT-040");
    }

    #[test]
    fn unbound_optional_references_are_dropped_or_nulled() {
        let set = ParameterSet::build(vec![
            ParameterDeclaration::new("flag", Datatype::String).optional(),
            ParameterDeclaration::new("n", Datatype::Int).with_default(json!(1)),
        ])
        .unwrap();
        let binding = validate(&set, &json!({})).unwrap();
        let doc = json!({
            "opt": "$[[flag]]",
            "args": ["a", "$[[flag]]", "$[[n]]", "$[[flag]]", "z"]
        });
        assert_eq!(
            instantiate(&doc, &set, &binding).unwrap(),
            json!({"args": ["a", null, 1, null, "z"]})
        );
    }

    #[test]
    fn unbound_optional_keeps_positional_arguments_aligned() {
        let set = ParameterSet::build(vec![
            ParameterDeclaration::new("flag", Datatype::Bool).optional()
        ])
        .unwrap();
        let binding = validate(&set, &json!({})).unwrap();
        let doc = json!({"args": ["a", "$[[flag]]", "z"], "nested": [["$[[flag]]"]]});
        assert_eq!(
            instantiate(&doc, &set, &binding).unwrap(),
            json!({"args": ["a", null, "z"], "nested": [[null]]})
        );
        assert_eq!(
            instantiate(&json!("$[[flag]]"), &set, &binding).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn staged_files_substitute_their_target() {
        let set = ParameterSet::build(vec![
            ParameterDeclaration::new("names", Datatype::File).with_as("data/names.txt")
        ])
        .unwrap();
        let binding = validate(&set, &json!({"names": "/home/me/list.txt"})).unwrap();
        let out = instantiate(&json!({"input": "$[[names]]"}), &set, &binding).unwrap();
        assert_eq!(out, json!({"input": "data/names.txt"}));
    }

    #[test]
    fn whole_mode_leaves_embedded_references_literal() {
        let set = hello_world();
        let binding = validate(&set, &json!({"codeFile": "hello.py"})).unwrap();
        let doc = json!({"cmd": "python $[[codeFile]] $[[sleeptime]]"});
        assert_eq!(instantiate(&doc, &set, &binding).unwrap(), doc);
    }

    #[test]
    fn interpolate_mode_splices_text() {
        let set = hello_world();
        let binding = validate(&set, &json!({"codeFile": "hello.py"})).unwrap();
        let doc = json!({
            "cmd": "python $[[codeFile]] --sleep $[[sleeptime]]",
            "n": "$[[sleeptime]]"
        });
        let out = instantiate_with(&doc, &set, &binding, SubstitutionMode::Interpolate).unwrap();
        assert_eq!(out, json!({"cmd": "python hello.py --sleep 10", "n": 10}));
    }

    #[test]
    fn interpolate_mode_rejects_unbound_embedded() {
        let set = ParameterSet::build(vec![
            ParameterDeclaration::new("flag", Datatype::String).optional()
        ])
        .unwrap();
        let binding = validate(&set, &json!({})).unwrap();
        let err = instantiate_with(
            &json!({"cmd": "run $[[flag]]"}),
            &set,
            &binding,
            SubstitutionMode::Interpolate,
        )
        .unwrap_err();
        assert!(matches!(err, WftError::UnboundReference { .. }));
    }

    #[test]
    fn mode_parsing() {
        assert_eq!(SubstitutionMode::parse("Whole"), Some(SubstitutionMode::Whole));
        assert_eq!(
            SubstitutionMode::parse("interpolate"),
            Some(SubstitutionMode::Interpolate)
        );
        assert_eq!(SubstitutionMode::parse("partial"), None);
        assert_eq!(SubstitutionMode::default().to_string(), "whole");
    }
}
