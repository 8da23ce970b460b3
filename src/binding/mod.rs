//! Binding Module - arguments in, concrete document out
//!
//! - `path`: DocPath / PathSegment, locations inside a document
//! - `scan`: Reference scanner (`$[[id]]` whole-scalar matches)
//! - `coerce`: Per-datatype argument coercion
//! - `validate`: Arguments + ParameterSet → Binding
//! - `instantiate`: Document + Binding → reference-free document
//! - `upload`: Bound `file` arguments to stage for a run
//! - `read`: Interactive prompting for arguments
//!
//! Data flow:
//! ```text
//! arguments ──► validate(ParameterSet) ──► Binding
//!                                             │
//! document ──► find_references ──────────────►│
//!                                             ▼
//!                                      instantiate ──► document'
//! ```

mod coerce;
mod instantiate;
mod path;
mod read;
mod scan;
mod upload;
mod validate;

pub use coerce::{coerce, coerce_scalar, to_text};
pub use instantiate::{instantiate, instantiate_with, SubstitutionMode};
pub use path::{DocPath, PathSegment};
pub use read::read_arguments;
pub use scan::{find_embedded_references, find_references, is_reference, reference_id, Strings};
pub use upload::{upload_files, UploadFile};
pub use validate::{validate, Binding};
