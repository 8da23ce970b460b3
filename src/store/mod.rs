//! Store Module - interfaces to where templates and files live
//!
//! The engine never touches the filesystem on its own; it consumes:
//! - `TemplateSource`: template id → parsed `Template`
//! - `FileResolver`: `file` argument → local path to stage
//!
//! Directory layout understood by `DirectoryTemplateSource`:
//! ```text
//! <root>/
//! ├── hello-world/
//! │   └── reana-template.yml     (or template.yaml, workflow.yml, ...)
//! └── word-count/
//!     └── template.yaml
//! ```

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::ast::{Template, TEMPLATE_FILE_NAMES};
use crate::error::WftError;

/// Source of templates by id
pub trait TemplateSource {
    fn load_template(&self, id: &str) -> Result<Template, WftError>;
}

/// Resolves `file` argument values to readable local paths
pub trait FileResolver {
    fn resolve_file_argument(&self, reference: &str) -> Result<PathBuf, WftError>;
}

/// Templates stored one per sub-directory of a root directory
#[derive(Debug, Clone)]
pub struct DirectoryTemplateSource {
    root: PathBuf,
}

impl DirectoryTemplateSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// First existing template file inside a template directory
    pub fn template_file(dir: &Path) -> Option<PathBuf> {
        TEMPLATE_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    /// Ids of every directory under the root that holds a template file
    pub fn list(&self) -> Result<Vec<String>, WftError> {
        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() && Self::template_file(&path).is_some() {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    ids.push(name.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}

impl TemplateSource for DirectoryTemplateSource {
    fn load_template(&self, id: &str) -> Result<Template, WftError> {
        let not_found = || WftError::TemplateNotFound { id: id.to_string() };

        // ids are single path components
        if id.is_empty() || id.contains(['/', '\\']) || id == "." || id == ".." {
            return Err(not_found());
        }

        let dir = self.root.join(id);
        let file = Self::template_file(&dir).ok_or_else(not_found)?;
        debug!(id, file = %file.display(), "Loading template");
        Template::load(&file)
    }
}

/// Resolves file arguments against a base directory
#[derive(Debug, Clone)]
pub struct LocalFileResolver {
    base: PathBuf,
}

impl LocalFileResolver {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }
}

impl FileResolver for LocalFileResolver {
    fn resolve_file_argument(&self, reference: &str) -> Result<PathBuf, WftError> {
        let path = Path::new(reference);
        let resolved = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base.join(path)
        };

        if resolved.is_file() {
            Ok(resolved)
        } else {
            Err(WftError::FileNotFound {
                path: resolved.display().to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tempfile::TempDir;

    const TEMPLATE: &str = "template:\n  run: $[[n]]\nparameters:\n  - id: n\n    datatype: int\n";

    fn store_with(entries: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (id, file) in entries {
            let sub = dir.path().join(id);
            std::fs::create_dir_all(&sub).unwrap();
            std::fs::write(sub.join(file), TEMPLATE).unwrap();
        }
        dir
    }

    #[test]
    fn loads_template_by_id() {
        let dir = store_with(&[("hello", "template.yaml")]);
        let source = DirectoryTemplateSource::new(dir.path());
        let template = source.load_template("hello").unwrap();
        assert_eq!(template.parameters().len(), 1);
    }

    #[test]
    fn file_names_are_searched_in_order() {
        let dir = store_with(&[("t", "workflow.yml"), ("t", "reana-template.yaml")]);
        let found = DirectoryTemplateSource::template_file(&dir.path().join("t")).unwrap();
        assert!(found.ends_with("reana-template.yaml"));
    }

    #[test]
    fn unknown_id_is_not_found() {
        let dir = store_with(&[]);
        let source = DirectoryTemplateSource::new(dir.path());
        for id in ["missing", "", "../etc", "."] {
            let err = source.load_template(id).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NotFound, "{id:?}");
        }
    }

    #[test]
    fn list_returns_template_directories() {
        let dir = store_with(&[("b", "template.yml"), ("a", "workflow.yaml")]);
        std::fs::create_dir(dir.path().join("empty")).unwrap();
        let source = DirectoryTemplateSource::new(dir.path());
        assert_eq!(source.list().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn local_resolver_checks_existence() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("hello.py"), "print('hi')").unwrap();
        let resolver = LocalFileResolver::new(dir.path());

        let path = resolver.resolve_file_argument("hello.py").unwrap();
        assert_eq!(path, dir.path().join("hello.py"));

        let err = resolver.resolve_file_argument("absent.py").unwrap_err();
        assert!(matches!(err, WftError::FileNotFound { .. }));
    }
}
