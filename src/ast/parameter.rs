//! Parameter Declarations - typed template parameters
//!
//! A declaration names a parameter (`id`), its datatype, an optional default
//! and an optional grouping parent:
//!
//! ```yaml
//! parameters:
//!   - id: codeFile
//!     datatype: file
//!     as: code/helloworld.py
//!   - id: sleeptime
//!     datatype: int
//!     defaultValue: 10
//!   - id: output
//!     datatype: record
//!   - id: outputType
//!     datatype: int
//!     parent: output
//!     defaultValue: 5
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::WftError;

use super::schema_validator::DeclarationSchemaValidator;

/// Parameter datatype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Datatype {
    String,
    Int,
    Decimal,
    Bool,
    File,
    Record,
}

impl Datatype {
    pub const ALL: [Datatype; 6] = [
        Datatype::String,
        Datatype::Int,
        Datatype::Decimal,
        Datatype::Bool,
        Datatype::File,
        Datatype::Record,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Datatype::String => "string",
            Datatype::Int => "int",
            Datatype::Decimal => "decimal",
            Datatype::Bool => "bool",
            Datatype::File => "file",
            Datatype::Record => "record",
        }
    }

    /// Parse a datatype name (exact, lowercase)
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|dt| dt.as_str() == name)
    }

    pub fn is_record(&self) -> bool {
        matches!(self, Datatype::Record)
    }

    /// Strict literal check used for declared defaults and enumerations.
    ///
    /// Unlike argument coercion, no string-to-number or string-to-bool
    /// conversion happens here. Record literals only need to be mappings;
    /// their entries are checked against the children by the parameter set.
    pub fn accepts_literal(&self, value: &Value) -> bool {
        match self {
            Datatype::String | Datatype::File => value.is_string(),
            Datatype::Int => value.is_i64() || value.is_u64(),
            Datatype::Decimal => value.is_number(),
            Datatype::Bool => value.is_boolean(),
            Datatype::Record => value.is_object(),
        }
    }

    /// Label shown in input prompts
    fn prompt_label(&self) -> Option<&'static str> {
        match self {
            Datatype::Bool => Some("bool"),
            Datatype::File => Some("filename"),
            Datatype::Decimal => Some("decimal"),
            Datatype::Int => Some("integer"),
            Datatype::String => Some("string"),
            Datatype::Record => None,
        }
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a parameter's value enumeration (for form selection lists)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumValue {
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

impl EnumValue {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            name: None,
            is_default: false,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    /// Display text: the explicit name, else the value itself
    pub fn label(&self) -> String {
        match (&self.name, &self.value) {
            (Some(name), _) => name.clone(),
            (None, Value::String(s)) => s.clone(),
            (None, other) => other.to_string(),
        }
    }
}

/// Raw declaration record as persisted in template files
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParameterRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    datatype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    values: Option<Vec<EnumValue>>,
    #[serde(default, rename = "as", skip_serializing_if = "Option::is_none")]
    as_target: Option<String>,
}

/// A single typed parameter declaration
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDeclaration {
    /// Unique id, used as the reference key in `$[[id]]`
    pub id: String,
    /// Human-readable label (defaults to `id`)
    pub name: String,
    pub description: Option<String>,
    pub datatype: Datatype,
    pub default_value: Option<Value>,
    /// Id of the enclosing `record` parameter
    pub parent: Option<String>,
    /// Presentation order only
    pub index: i64,
    /// Non-required parameters without value or default are left unbound
    pub required: bool,
    pub values: Option<Vec<EnumValue>>,
    /// Fixed staging path for `file` parameters
    pub as_target: Option<String>,
}

impl ParameterDeclaration {
    pub fn new(id: impl Into<String>, datatype: Datatype) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            description: None,
            datatype,
            default_value: None,
            parent: None,
            index: 0,
            required: true,
            values: None,
            as_target: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_index(mut self, index: i64) -> Self {
        self.index = index;
        self
    }

    pub fn with_as(mut self, target: impl Into<String>) -> Self {
        self.as_target = Some(target.into());
        self
    }

    pub fn with_values(mut self, values: Vec<EnumValue>) -> Self {
        self.values = Some(values);
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Parse and check a raw declaration record
    pub fn from_value(record: &Value) -> Result<Self, WftError> {
        if let Value::Object(map) = record {
            if !map.contains_key("id") {
                return Err(WftError::MissingParameterId);
            }
        }

        DeclarationSchemaValidator::new()?.validate(record)?;

        let raw: ParameterRecord =
            serde_json::from_value(record.clone()).map_err(|e| WftError::ParseError {
                details: format!("parameter declaration: {}", e),
            })?;

        let id = raw.id.ok_or(WftError::MissingParameterId)?;
        let datatype = match raw.datatype.as_deref() {
            None => Datatype::String,
            Some(name) => Datatype::parse(name).ok_or_else(|| WftError::UnknownDatatype {
                id: id.clone(),
                datatype: name.to_string(),
            })?,
        };

        let declaration = Self {
            name: raw.name.unwrap_or_else(|| id.clone()),
            description: raw.description,
            datatype,
            default_value: raw.default_value.filter(|v| !v.is_null()),
            parent: raw.parent,
            index: raw.index.unwrap_or(0),
            required: raw.required.unwrap_or(true),
            values: raw.values,
            as_target: raw.as_target,
            id,
        };
        declaration.check()?;
        Ok(declaration)
    }

    /// Serialize back to the persisted record form
    pub fn to_value(&self) -> Value {
        let record = ParameterRecord {
            id: Some(self.id.clone()),
            name: Some(self.name.clone()),
            description: self.description.clone(),
            datatype: Some(self.datatype.as_str().to_string()),
            default_value: self.default_value.clone(),
            parent: self.parent.clone(),
            index: Some(self.index),
            required: Some(self.required),
            values: self.values.clone(),
            as_target: self.as_target.clone(),
        };
        serde_json::to_value(record).unwrap_or(Value::Null)
    }

    /// Checks that need nothing but the declaration itself
    pub fn check(&self) -> Result<(), WftError> {
        if self.id.is_empty() {
            return Err(WftError::MissingParameterId);
        }

        if self.parent.as_deref() == Some(self.id.as_str()) {
            return Err(WftError::SelfParent {
                id: self.id.clone(),
            });
        }

        if let Some(default) = &self.default_value {
            if !self.datatype.accepts_literal(default) {
                return Err(WftError::DefaultTypeMismatch {
                    id: self.id.clone(),
                    what: "defaultValue",
                    expected: self.datatype.to_string(),
                    value: default.to_string(),
                });
            }
        }

        if let Some(values) = &self.values {
            if self.datatype.is_record() {
                return Err(WftError::InvalidDeclaration {
                    id: self.id.clone(),
                    reason: "record parameters cannot enumerate values".to_string(),
                });
            }
            for entry in values {
                if !self.datatype.accepts_literal(&entry.value) {
                    return Err(WftError::DefaultTypeMismatch {
                        id: self.id.clone(),
                        what: "enumerated value",
                        expected: self.datatype.to_string(),
                        value: entry.value.to_string(),
                    });
                }
            }
            if values.iter().filter(|v| v.is_default).count() > 1 {
                return Err(WftError::InvalidDeclaration {
                    id: self.id.clone(),
                    reason: "more than one enumerated value is flagged isDefault".to_string(),
                });
            }
        }

        if self.as_target.is_some() && self.datatype != Datatype::File {
            return Err(WftError::InvalidDeclaration {
                id: self.id.clone(),
                reason: "'as' is only allowed on file parameters".to_string(),
            });
        }

        Ok(())
    }

    /// Explicit default, else the enumerated value flagged `isDefault`
    pub fn effective_default(&self) -> Option<&Value> {
        self.default_value.as_ref().or_else(|| {
            self.values
                .as_ref()?
                .iter()
                .find(|v| v.is_default)
                .map(|v| &v.value)
        })
    }

    /// Description, falling back to the name
    pub fn description_or_name(&self) -> &str {
        self.description.as_deref().unwrap_or(&self.name)
    }

    pub fn is_record(&self) -> bool {
        self.datatype.is_record()
    }

    /// Input prompt: `name (type) [default v]: `
    pub fn prompt(&self) -> String {
        let mut prompt = self.name.clone();
        if let Some(label) = self.datatype.prompt_label() {
            prompt.push_str(&format!(" ({})", label));
        }
        if let Some(default) = self.effective_default() {
            match (self.datatype, default) {
                (Datatype::String | Datatype::File, Value::String(s)) => {
                    prompt.push_str(&format!(" [default '{}']", s));
                }
                (Datatype::Record, _) => {}
                (_, other) => prompt.push_str(&format!(" [default {}]", other)),
            }
        }
        prompt.push_str(": ");
        prompt
    }
}
