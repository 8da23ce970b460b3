//! AST Module - types parsed from template documents
//!
//! - `parameter`: Datatype, EnumValue, ParameterDeclaration
//! - `template`: Template (workflow body + parameter set)
//! - `schema_validator`: JSON Schema pre-check for declaration records
//!
//! These types represent the "what" - static structure read from YAML/JSON.
//! For argument resolution and substitution, see the `binding` module.

mod parameter;
pub mod schema_validator;
mod template;

// Re-export all public types
pub use parameter::{Datatype, EnumValue, ParameterDeclaration};
pub use schema_validator::{parameter_schema, DeclarationSchemaValidator, SchemaViolation};
pub use template::{Template, TEMPLATE_FILE_NAMES};
