//! Argument validation - user arguments to a typed Binding
//!
//! Resolution per declaration, walking roots then record children:
//! 1. a supplied argument is coerced against the datatype
//! 2. else `defaultValue`, else the enumerated value flagged `isDefault`
//! 3. else a required parameter fails, an optional one stays unbound
//!
//! A record resolves to a mapping of its children's values. Its scope is the
//! supplied nested mapping, or its own default mapping, or empty. A child id
//! may also be given at the top level of the arguments, where it is used when
//! the record scope does not name it. Argument ids that match no declaration
//! are ignored.

use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::ast::ParameterDeclaration;
use crate::error::WftError;
use crate::params::ParameterSet;

use super::coerce::{coerce, coerce_scalar, type_name};

/// Resolved values for one instantiation request
///
/// Root ids map to their values; a record id maps to a nested mapping keyed
/// by its children's ids.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Binding {
    values: Map<String, Value>,
}

impl Binding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(values: Map<String, Value>) -> Self {
        Self { values }
    }

    /// Value of a parameter, following its enclosing records
    pub fn get(&self, set: &ParameterSet, id: &str) -> Option<&Value> {
        let lineage = set.lineage(id);
        let (first, rest) = lineage.split_first()?;
        rest.iter()
            .try_fold(self.values.get(*first)?, |node, child| node.as_object()?.get(*child))
    }

    /// Top-level value by id, without record traversal
    pub fn get_root(&self, id: &str) -> Option<&Value> {
        self.values.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.values.clone())
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.values)
    }
}

/// Validate arguments against a parameter set, all-or-nothing
#[instrument(skip_all, fields(parameters = set.len()))]
pub fn validate(set: &ParameterSet, arguments: &Value) -> Result<Binding, WftError> {
    let scope = match arguments {
        Value::Object(map) => map,
        other => {
            return Err(WftError::ArgumentsNotMapping {
                actual: type_name(other).to_string(),
            })
        }
    };

    for key in scope.keys().filter(|k| !set.contains(k)) {
        debug!(id = %key, "Ignoring argument with no declaration");
    }

    let values = resolve_scope(set, set.roots(), scope, None, scope)?;
    debug!(bound = values.len(), "Arguments validated");
    Ok(Binding { values })
}

/// Non-null argument for `id` in a mapping
fn lookup<'v>(map: &'v Map<String, Value>, id: &str) -> Option<&'v Value> {
    map.get(id).filter(|v| !v.is_null())
}

/// Resolve declarations against the mapping supplied for their scope.
///
/// `defaults` is the enclosing record's default mapping, used only when the
/// record itself was not supplied. `top` is the argument root: a child id
/// given there binds when its record scope does not name it.
fn resolve_scope<'s>(
    set: &'s ParameterSet,
    declarations: impl Iterator<Item = &'s ParameterDeclaration>,
    scope: &Map<String, Value>,
    defaults: Option<&Map<String, Value>>,
    top: &Map<String, Value>,
) -> Result<Map<String, Value>, WftError> {
    let mut resolved = Map::new();

    for decl in declarations {
        let supplied = lookup(scope, &decl.id).or_else(|| {
            let flat = lookup(top, &decl.id);
            if flat.is_some() && decl.parent.is_some() {
                debug!(id = %decl.id, "Binding child from top-level argument");
            }
            flat
        });
        let record_default = defaults.and_then(|d| lookup(d, &decl.id));

        if decl.is_record() {
            if let Some(record) = resolve_record(set, decl, supplied, record_default, top)? {
                resolved.insert(decl.id.clone(), Value::Object(record));
            }
            continue;
        }

        let value = match supplied {
            Some(value) => coerce(decl, value)?,
            None => match record_default.or_else(|| decl.effective_default()) {
                Some(default) => {
                    coerce_scalar(decl.datatype, default).unwrap_or_else(|| default.clone())
                }
                None if decl.required => {
                    return Err(WftError::MissingArgument {
                        id: decl.id.clone(),
                    })
                }
                None => {
                    debug!(id = %decl.id, "Optional parameter left unbound");
                    continue;
                }
            },
        };

        debug!(id = %decl.id, value = %value, supplied = supplied.is_some(), "Resolved parameter");
        resolved.insert(decl.id.clone(), value);
    }

    Ok(resolved)
}

/// Resolve a record; `None` when an optional record cannot be completed
fn resolve_record(
    set: &ParameterSet,
    decl: &ParameterDeclaration,
    supplied: Option<&Value>,
    record_default: Option<&Value>,
    top: &Map<String, Value>,
) -> Result<Option<Map<String, Value>>, WftError> {
    let empty = Map::new();
    let (scope, defaults) = match supplied {
        Some(Value::Object(map)) => (map, None),
        Some(other) => {
            return Err(WftError::RecordArguments {
                id: decl.id.clone(),
                actual: type_name(other).to_string(),
            })
        }
        None => (
            &empty,
            record_default
                .or(decl.default_value.as_ref())
                .and_then(Value::as_object),
        ),
    };

    match resolve_scope(set, set.children(&decl.id), scope, defaults, top) {
        Ok(values) => Ok(Some(values)),
        Err(WftError::MissingArgument { id })
            if !decl.required && supplied.is_none() && defaults.is_none() =>
        {
            debug!(record = %decl.id, missing = %id, "Optional record left unbound");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
