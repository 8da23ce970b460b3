//! Declaration Schema Validator
//!
//! Validates raw parameter declaration records against the embedded JSON
//! Schema before typed parsing, so structural mistakes (wrong field types,
//! missing `id`) are reported with JSON-pointer paths.

use jsonschema::Validator;
use serde_json::Value;
use std::sync::OnceLock;

use crate::error::WftError;

/// Embedded schema JSON (compiled at build time)
pub const PARAMETER_SCHEMA_JSON: &str = include_str!("../../schemas/parameter.schema.json");

/// Global schema validator instance (lazy initialization)
static VALIDATOR: OnceLock<Result<Validator, String>> = OnceLock::new();

/// A single schema violation
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaViolation {
    /// JSON pointer into the declaration record (e.g. "/index")
    pub path: String,
    /// Human-readable message
    pub message: String,
}

/// Parameter declaration schema validator
pub struct DeclarationSchemaValidator {
    validator: &'static Validator,
}

impl DeclarationSchemaValidator {
    /// Create a validator backed by the cached global instance
    pub fn new() -> Result<Self, WftError> {
        let validator_result = VALIDATOR.get_or_init(|| {
            let schema: Value = serde_json::from_str(PARAMETER_SCHEMA_JSON)
                .map_err(|e| format!("Failed to parse schema JSON: {}", e))?;
            Validator::new(&schema).map_err(|e| format!("Failed to compile schema: {}", e))
        });

        match validator_result {
            Ok(validator) => Ok(Self { validator }),
            Err(e) => Err(WftError::ConfigError { reason: e.clone() }),
        }
    }

    /// Validate one raw declaration record
    pub fn validate(&self, record: &Value) -> Result<(), WftError> {
        let violations: Vec<SchemaViolation> = self
            .validator
            .iter_errors(record)
            .map(|e| SchemaViolation {
                path: e.instance_path.to_string(),
                message: e.to_string(),
            })
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(WftError::DeclarationSchema { violations })
        }
    }
}

/// The declaration schema as a JSON value
pub fn parameter_schema() -> Result<Value, WftError> {
    Ok(serde_json::from_str(PARAMETER_SCHEMA_JSON)?)
}
