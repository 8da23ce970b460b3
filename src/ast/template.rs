//! Template - workflow body paired with its parameter set
//!
//! Persisted form (YAML or JSON, interchangeable):
//!
//! ```yaml
//! template:
//!   version: 0.3.0
//!   inputs:
//!     files: [code/helloworld.py]
//!     parameters:
//!       helloworld: $[[codeFile]]
//!       sleeptime: $[[sleeptime]]
//! parameters:
//!   - id: codeFile
//!     datatype: file
//!   - id: sleeptime
//!     datatype: int
//!     defaultValue: 10
//! ```

use std::path::Path;

use rustc_hash::FxHashSet;
use serde_json::{Map, Value};
use tracing::{info, instrument, warn};

use crate::binding::{
    find_embedded_references, find_references, instantiate_with, validate, Binding,
    SubstitutionMode,
};
use crate::error::WftError;
use crate::params::ParameterSet;

/// Top-level key holding the workflow body
const BODY_KEY: &str = "template";
/// Older spelling of `template`
const LEGACY_BODY_KEY: &str = "workflow";
const PARAMETERS_KEY: &str = "parameters";

/// Template file names, in lookup order, inside a template directory
pub const TEMPLATE_FILE_NAMES: [&str; 8] = [
    "reana-template.yml",
    "reana-template.yaml",
    "reana_template.yml",
    "reana_template.yaml",
    "template.yml",
    "template.yaml",
    "workflow.yml",
    "workflow.yaml",
];

/// A parsed, checked template
#[derive(Debug, Clone)]
pub struct Template {
    body: Value,
    parameters: ParameterSet,
    version: Option<String>,
    unreferenced: Vec<String>,
}

impl Template {
    /// Pair a body with a parameter set, checking every reference is declared
    pub fn new(body: Value, parameters: ParameterSet) -> Result<Self, WftError> {
        if let Some((path, id)) = find_references(&body).find(|(_, id)| !parameters.contains(id)) {
            return Err(WftError::UndeclaredReference {
                id: id.to_string(),
                path: path.to_string(),
            });
        }

        let referenced: FxHashSet<&str> = find_references(&body)
            .chain(find_embedded_references(&body))
            .map(|(_, id)| id)
            .collect();
        let unreferenced: Vec<String> = parameters
            .iter()
            .filter(|d| !d.is_record() && !referenced.contains(d.id.as_str()))
            .map(|d| d.id.clone())
            .collect();
        for id in &unreferenced {
            warn!(id = %id, "Parameter is declared but never referenced");
        }

        let version = match body.get("version") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };

        Ok(Self {
            body,
            parameters,
            version,
            unreferenced,
        })
    }

    /// Build from a parsed document with `template` and `parameters` keys
    #[instrument(skip(document))]
    pub fn from_value(document: Value) -> Result<Self, WftError> {
        let Value::Object(top) = document else {
            return Err(WftError::ParseError {
                details: "template document must be a mapping".to_string(),
            });
        };

        let mut body = None;
        let mut records = None;
        for (key, value) in top {
            match key.as_str() {
                BODY_KEY | LEGACY_BODY_KEY if body.is_none() => body = Some(value),
                PARAMETERS_KEY => records = Some(value),
                _ => return Err(WftError::InvalidElement { element: key }),
            }
        }

        let body = body.ok_or_else(|| WftError::MissingElement {
            element: BODY_KEY.to_string(),
        })?;

        let parameters = match records {
            None | Some(Value::Null) => ParameterSet::default(),
            Some(Value::Array(records)) => ParameterSet::from_values(&records)?,
            Some(_) => {
                return Err(WftError::ParseError {
                    details: format!("'{}' must be a list of declarations", PARAMETERS_KEY),
                })
            }
        };

        let template = Self::new(body, parameters)?;
        info!(
            parameters = template.parameters.len(),
            version = template.version.as_deref().unwrap_or("-"),
            "Loaded template"
        );
        Ok(template)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, WftError> {
        let document: Value = serde_yaml::from_str(yaml)?;
        Self::from_value(document)
    }

    pub fn from_json_str(json: &str) -> Result<Self, WftError> {
        let document: Value = serde_json::from_str(json)?;
        Self::from_value(document)
    }

    /// Load a template file (`.json` as JSON, anything else as YAML)
    pub fn load(path: impl AsRef<Path>) -> Result<Self, WftError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json_str(&content),
            _ => Self::from_yaml_str(&content),
        }
    }

    /// Workflow body with `$[[id]]` references
    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.parameters
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Declared non-record parameters that no reference names
    pub fn unreferenced(&self) -> &[String] {
        &self.unreferenced
    }

    /// Serialize back to the persisted form
    pub fn to_value(&self) -> Value {
        let mut top = Map::new();
        top.insert(BODY_KEY.to_string(), self.body.clone());
        top.insert(
            PARAMETERS_KEY.to_string(),
            Value::Array(self.parameters.to_values()),
        );
        Value::Object(top)
    }

    /// Validate arguments against this template's parameters
    pub fn bind(&self, arguments: &Value) -> Result<Binding, WftError> {
        validate(&self.parameters, arguments)
    }

    /// Validate then substitute (whole-scalar references)
    pub fn instantiate(&self, arguments: &Value) -> Result<Value, WftError> {
        self.instantiate_with(arguments, SubstitutionMode::Whole)
    }

    pub fn instantiate_with(
        &self,
        arguments: &Value,
        mode: SubstitutionMode,
    ) -> Result<Value, WftError> {
        let binding = self.bind(arguments)?;
        instantiate_with(&self.body, &self.parameters, &binding, mode)
    }
}
