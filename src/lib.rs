//! wftempl - parameterized workflow templates
//!
//! A template is a workflow document with `$[[id]]` placeholders plus a list
//! of typed parameter declarations. Arguments are validated against the
//! declarations into a `Binding`, which is substituted into a fresh copy of
//! the document.
//!
//! ## Module Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        DOMAIN MODEL                          │
//! │  ast/       YAML/JSON → Template, ParameterDeclaration       │
//! │  params/    ParameterSet (arena, grouping, ordering)         │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      APPLICATION LAYER                       │
//! │  binding/   scan, coerce, validate → Binding, instantiate    │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    INFRASTRUCTURE LAYER                      │
//! │  store/     TemplateSource, FileResolver (directory-backed)  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`ast`] | Template parsing, declaration model, declaration JSON Schema |
//! | [`params`] | Id lookup, parent/child grouping, cycle detection |
//! | [`binding`] | Reference scanning, argument coercion, substitution |
//! | [`store`] | Template and file lookup interfaces |
//! | [`config`] | `~/.config/wftempl/config.toml` + env overrides |
//! | [`error`] | Error types with codes and fix suggestions |
//!
//! ## Example
//!
//! ```
//! use serde_json::json;
//! use wftempl::Template;
//!
//! let template = Template::from_yaml_str(r#"
//! template:
//!   args: ["$[[codeFile]]", "$[[sleeptime]]"]
//! parameters:
//!   - id: codeFile
//!     datatype: file
//!   - id: sleeptime
//!     datatype: int
//!     defaultValue: 10
//! "#)?;
//!
//! let doc = template.instantiate(&json!({"codeFile": "helloworld.py"}))?;
//! assert_eq!(doc, json!({"args": ["helloworld.py", 10]}));
//! # Ok::<(), wftempl::WftError>(())
//! ```

// ═══════════════════════════════════════════════════════════════
// DOMAIN MODEL - YAML/JSON → Rust types
// ═══════════════════════════════════════════════════════════════
pub mod ast;
pub mod params;

// ═══════════════════════════════════════════════════════════════
// APPLICATION LAYER - Validation and substitution
// ═══════════════════════════════════════════════════════════════
pub mod binding;

// ═══════════════════════════════════════════════════════════════
// INFRASTRUCTURE LAYER - Template and file lookup
// ═══════════════════════════════════════════════════════════════
pub mod store;

// ═══════════════════════════════════════════════════════════════
// CROSS-CUTTING - Error handling, configuration
// ═══════════════════════════════════════════════════════════════
pub mod config;
pub mod error;

// ═══════════════════════════════════════════════════════════════
// PUBLIC API RE-EXPORTS
// ═══════════════════════════════════════════════════════════════

// Error types
pub use error::{ErrorKind, FixSuggestion, WftError};

// Config types
pub use config::{OutputFormat, WftConfig};

// AST types (Domain Model)
pub use ast::{parameter_schema, Datatype, EnumValue, ParameterDeclaration, Template};

// Parameter set
pub use params::ParameterSet;

// Binding types (Application Layer)
pub use binding::{
    find_references, instantiate, instantiate_with, read_arguments, upload_files, validate,
    Binding, DocPath, PathSegment, SubstitutionMode, UploadFile,
};

// Store types
pub use store::{DirectoryTemplateSource, FileResolver, LocalFileResolver, TemplateSource};
