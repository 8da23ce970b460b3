// The #[error] attribute from thiserror uses struct fields via string interpolation,
// but Rust's unused_assignments lint doesn't recognize this.
#![allow(unused_assignments)]

//! Error types with error codes
//!
//! Error code ranges:
//! - WFT-000-009: Template document errors
//! - WFT-010-019: Parameter declaration (schema) errors
//! - WFT-020-029: Lookup errors
//! - WFT-030-039: Argument validation errors
//! - WFT-040-049: Instantiation errors
//! - WFT-090-099: IO / serialization / config errors

use miette::Diagnostic;
use thiserror::Error;

use crate::ast::schema_validator::SchemaViolation;

pub type Result<T> = std::result::Result<T, WftError>;

/// Format declaration schema violations for display
fn format_violations(violations: &[SchemaViolation]) -> String {
    match violations {
        [] => "no errors".to_string(),
        [only] => format!("[{}] {}", only.path, only.message),
        many => format!(
            "{} errors: {}",
            many.len(),
            many.iter()
                .map(|v| format!("[{}] {}", v.path, v.message))
                .collect::<Vec<_>>()
                .join("; ")
        ),
    }
}

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

/// Coarse classification of every error variant.
///
/// `Schema` errors are fatal to a template until it is corrected,
/// `Validation` errors reject a single instantiation request and
/// `Instantiation` errors point at a defect in the template itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    Schema,
    NotFound,
    Validation,
    Instantiation,
    Io,
    Config,
}

#[derive(Error, Debug, Diagnostic)]
pub enum WftError {
    // ═══════════════════════════════════════════
    // TEMPLATE DOCUMENT ERRORS (000-009)
    // ═══════════════════════════════════════════
    #[error("[WFT-001] Failed to parse template: {details}")]
    #[diagnostic(
        code(wftempl::parse_error),
        help("Check YAML/JSON syntax: indentation and quoting")
    )]
    ParseError { details: String },

    #[error("[WFT-002] Missing element '{element}' in template")]
    #[diagnostic(
        code(wftempl::missing_element),
        help("A template needs a 'template' body and an optional 'parameters' list")
    )]
    MissingElement { element: String },

    #[error("[WFT-003] Invalid top-level element '{element}' in template")]
    #[diagnostic(code(wftempl::invalid_element))]
    InvalidElement { element: String },

    #[error("[WFT-005] Reference '$[[{id}]]' at '{path}' has no parameter declaration")]
    #[diagnostic(code(wftempl::undeclared_reference))]
    UndeclaredReference { id: String, path: String },

    // ═══════════════════════════════════════════
    // DECLARATION ERRORS (010-019)
    // ═══════════════════════════════════════════
    #[error("[WFT-010] Parameter declaration is missing an 'id'")]
    MissingParameterId,

    #[error("[WFT-011] Duplicate parameter id '{id}'")]
    DuplicateParameter { id: String },

    #[error("[WFT-012] Parameter '{id}' has unknown datatype '{datatype}'")]
    UnknownDatatype { id: String, datatype: String },

    #[error("[WFT-013] Parameter '{id}': {what} {value} does not match datatype '{expected}'")]
    DefaultTypeMismatch {
        id: String,
        what: &'static str,
        expected: String,
        value: String,
    },

    #[error("[WFT-014] Parameter '{id}' names itself as parent")]
    SelfParent { id: String },

    #[error("[WFT-015] Parameter '{id}' references unknown parent '{parent}'")]
    UnknownParent { id: String, parent: String },

    #[error("[WFT-016] Parent '{parent}' of parameter '{id}' is not a record")]
    ParentNotRecord { id: String, parent: String },

    #[error("[WFT-017] Cyclic parameter grouping: {cycle}")]
    GroupingCycle { cycle: String },

    #[error("[WFT-018] Invalid declaration for '{id}': {reason}")]
    InvalidDeclaration { id: String, reason: String },

    #[error("[WFT-019] Declaration schema violated: {}", format_violations(.violations))]
    #[diagnostic(
        code(wftempl::declaration_schema),
        help("Run `wftempl schema` to see the parameter declaration schema")
    )]
    DeclarationSchema { violations: Vec<SchemaViolation> },

    // ═══════════════════════════════════════════
    // LOOKUP ERRORS (020-029)
    // ═══════════════════════════════════════════
    #[error("[WFT-020] Parameter '{id}' not found")]
    ParameterNotFound { id: String },

    #[error("[WFT-021] File '{path}' not found")]
    FileNotFound { path: String },

    #[error("[WFT-022] Template '{id}' not found")]
    #[diagnostic(code(wftempl::template_not_found))]
    TemplateNotFound { id: String },

    // ═══════════════════════════════════════════
    // ARGUMENT VALIDATION ERRORS (030-039)
    // ═══════════════════════════════════════════
    #[error("[WFT-030] Missing value for required parameter '{id}'")]
    MissingArgument { id: String },

    #[error("[WFT-031] Invalid value {value} for parameter '{id}': expected {expected}")]
    ArgumentType {
        id: String,
        expected: String,
        value: String,
    },

    #[error("[WFT-032] Value {value} is not one of the allowed values for parameter '{id}'")]
    ValueNotAllowed { id: String, value: String },

    #[error("[WFT-033] Arguments for record '{id}' must be a mapping, got {actual}")]
    RecordArguments { id: String, actual: String },

    #[error("[WFT-034] Arguments must be a mapping, got {actual}")]
    ArgumentsNotMapping { actual: String },

    // ═══════════════════════════════════════════
    // INSTANTIATION ERRORS (040-049)
    // ═══════════════════════════════════════════
    #[error("[WFT-040] Reference '$[[{id}]]' at '{path}' has no bound value")]
    UnboundReference { id: String, path: String },

    #[error("[WFT-041] Record parameter '{id}' cannot be substituted at '{path}'")]
    RecordNotSubstitutable { id: String, path: String },

    // ═══════════════════════════════════════════
    // IO / SERIALIZATION / CONFIG ERRORS (090-099)
    // ═══════════════════════════════════════════
    #[error("[WFT-093] IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("[WFT-094] JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("[WFT-095] YAML parse error: {0}")]
    #[diagnostic(
        code(wftempl::yaml_parse),
        help("Check YAML syntax: indentation must be consistent, strings with special chars need quoting")
    )]
    YamlParse(#[from] serde_yaml::Error),

    #[error("[WFT-096] Config error: {reason}")]
    ConfigError { reason: String },
}

impl WftError {
    /// Get the error code (e.g., "WFT-030")
    pub fn code(&self) -> &'static str {
        match self {
            Self::ParseError { .. } => "WFT-001",
            Self::MissingElement { .. } => "WFT-002",
            Self::InvalidElement { .. } => "WFT-003",
            Self::UndeclaredReference { .. } => "WFT-005",
            Self::MissingParameterId => "WFT-010",
            Self::DuplicateParameter { .. } => "WFT-011",
            Self::UnknownDatatype { .. } => "WFT-012",
            Self::DefaultTypeMismatch { .. } => "WFT-013",
            Self::SelfParent { .. } => "WFT-014",
            Self::UnknownParent { .. } => "WFT-015",
            Self::ParentNotRecord { .. } => "WFT-016",
            Self::GroupingCycle { .. } => "WFT-017",
            Self::InvalidDeclaration { .. } => "WFT-018",
            Self::DeclarationSchema { .. } => "WFT-019",
            Self::ParameterNotFound { .. } => "WFT-020",
            Self::FileNotFound { .. } => "WFT-021",
            Self::TemplateNotFound { .. } => "WFT-022",
            Self::MissingArgument { .. } => "WFT-030",
            Self::ArgumentType { .. } => "WFT-031",
            Self::ValueNotAllowed { .. } => "WFT-032",
            Self::RecordArguments { .. } => "WFT-033",
            Self::ArgumentsNotMapping { .. } => "WFT-034",
            Self::UnboundReference { .. } => "WFT-040",
            Self::RecordNotSubstitutable { .. } => "WFT-041",
            Self::IoError(_) => "WFT-093",
            Self::JsonError(_) => "WFT-094",
            Self::YamlParse(_) => "WFT-095",
            Self::ConfigError { .. } => "WFT-096",
        }
    }

    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ParseError { .. }
            | Self::MissingElement { .. }
            | Self::InvalidElement { .. }
            | Self::JsonError(_)
            | Self::YamlParse(_) => ErrorKind::Parse,
            Self::UndeclaredReference { .. }
            | Self::MissingParameterId
            | Self::DuplicateParameter { .. }
            | Self::UnknownDatatype { .. }
            | Self::DefaultTypeMismatch { .. }
            | Self::SelfParent { .. }
            | Self::UnknownParent { .. }
            | Self::ParentNotRecord { .. }
            | Self::GroupingCycle { .. }
            | Self::InvalidDeclaration { .. }
            | Self::DeclarationSchema { .. } => ErrorKind::Schema,
            Self::TemplateNotFound { .. }
            | Self::ParameterNotFound { .. }
            | Self::FileNotFound { .. } => ErrorKind::NotFound,
            Self::MissingArgument { .. }
            | Self::ArgumentType { .. }
            | Self::ValueNotAllowed { .. }
            | Self::RecordArguments { .. }
            | Self::ArgumentsNotMapping { .. } => ErrorKind::Validation,
            Self::UnboundReference { .. } | Self::RecordNotSubstitutable { .. } => {
                ErrorKind::Instantiation
            }
            Self::IoError(_) => ErrorKind::Io,
            Self::ConfigError { .. } => ErrorKind::Config,
        }
    }

    /// The parameter id the error is about, if any
    pub fn parameter_id(&self) -> Option<&str> {
        match self {
            Self::UndeclaredReference { id, .. }
            | Self::DuplicateParameter { id }
            | Self::UnknownDatatype { id, .. }
            | Self::DefaultTypeMismatch { id, .. }
            | Self::SelfParent { id }
            | Self::UnknownParent { id, .. }
            | Self::ParentNotRecord { id, .. }
            | Self::InvalidDeclaration { id, .. }
            | Self::ParameterNotFound { id }
            | Self::MissingArgument { id }
            | Self::ArgumentType { id, .. }
            | Self::ValueNotAllowed { id, .. }
            | Self::RecordArguments { id, .. }
            | Self::UnboundReference { id, .. }
            | Self::RecordNotSubstitutable { id, .. } => Some(id.as_str()),
            _ => None,
        }
    }

    /// The document path (JSON pointer) the error is about, if any
    pub fn document_path(&self) -> Option<&str> {
        match self {
            Self::UndeclaredReference { path, .. }
            | Self::UnboundReference { path, .. }
            | Self::RecordNotSubstitutable { path, .. } => Some(path.as_str()),
            _ => None,
        }
    }
}

impl FixSuggestion for WftError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            WftError::ParseError { .. } | WftError::YamlParse(_) => {
                Some("Check YAML syntax: indentation and quoting")
            }
            WftError::MissingElement { .. } => {
                Some("Put the workflow body under a top-level 'template:' key")
            }
            WftError::InvalidElement { .. } => {
                Some("Only 'template' and 'parameters' are allowed at the top level")
            }
            WftError::TemplateNotFound { .. } => Some("Check the template id and store root"),
            WftError::UndeclaredReference { .. } => {
                Some("Declare the parameter under 'parameters:' or fix the $[[id]] typo")
            }
            WftError::MissingParameterId => Some("Every parameter declaration needs an 'id'"),
            WftError::DuplicateParameter { .. } => Some("Use unique ids across all parameters"),
            WftError::UnknownDatatype { .. } => {
                Some("Use one of: string, int, decimal, bool, file, record")
            }
            WftError::DefaultTypeMismatch { .. } => {
                Some("Make defaultValue match the declared datatype")
            }
            WftError::SelfParent { .. } => Some("Remove the 'parent' field or point it at a record"),
            WftError::UnknownParent { .. } => Some("Declare the parent record parameter"),
            WftError::ParentNotRecord { .. } => Some("Only 'record' parameters can have children"),
            WftError::GroupingCycle { .. } => Some("Remove the circular parent references"),
            WftError::InvalidDeclaration { .. } => Some("Check the parameter declaration fields"),
            WftError::DeclarationSchema { .. } => {
                Some("Run `wftempl schema` to see the declaration schema")
            }
            WftError::ParameterNotFound { .. } => Some("Check the parameter id"),
            WftError::FileNotFound { .. } => Some("Check the file path exists"),
            WftError::MissingArgument { .. } => {
                Some("Pass a value for the parameter or declare a defaultValue")
            }
            WftError::ArgumentType { .. } => Some("Pass a value matching the parameter datatype"),
            WftError::ValueNotAllowed { .. } => Some("Pick one of the enumerated values"),
            WftError::RecordArguments { .. } => {
                Some("Pass record arguments as a mapping of child id to value")
            }
            WftError::ArgumentsNotMapping { .. } => Some("Pass arguments as a mapping of id to value"),
            WftError::UnboundReference { .. } => {
                Some("Validate arguments against the same parameter set before instantiating")
            }
            WftError::RecordNotSubstitutable { .. } => {
                Some("Reference the record's children instead of the record itself")
            }
            WftError::IoError(_) => Some("Check file path and permissions"),
            WftError::JsonError(_) => Some("Check JSON syntax"),
            WftError::ConfigError { .. } => {
                Some("Check ~/.config/wftempl/config.toml for syntax errors")
            }
        }
    }
}
