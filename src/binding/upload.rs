//! File staging - which bound `file` arguments a run needs uploaded

use serde::Serialize;
use serde_json::Value;

use crate::ast::Datatype;
use crate::params::ParameterSet;

use super::validate::Binding;

/// One file to stage into the run's working directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadFile {
    pub parameter_id: String,
    /// Path supplied by the caller
    pub source: String,
    /// Destination inside the working directory
    pub target: String,
}

/// Every bound `file` parameter, records included, in declaration order
pub fn upload_files(set: &ParameterSet, binding: &Binding) -> Vec<UploadFile> {
    set.iter()
        .filter(|decl| decl.datatype == Datatype::File)
        .filter_map(|decl| {
            let Some(Value::String(source)) = binding.get(set, &decl.id) else {
                return None;
            };
            Some(UploadFile {
                parameter_id: decl.id.clone(),
                source: source.clone(),
                target: decl.as_target.clone().unwrap_or_else(|| source.clone()),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ParameterDeclaration;
    use crate::binding::validate;
    use serde_json::json;

    #[test]
    fn lists_bound_files_with_targets() {
        let set = ParameterSet::build(vec![
            ParameterDeclaration::new("codeFile", Datatype::File).with_as("code/helloworld.py"),
            ParameterDeclaration::new("names", Datatype::File),
            ParameterDeclaration::new("sleeptime", Datatype::Int).with_default(json!(1)),
            ParameterDeclaration::new("output", Datatype::Record),
            ParameterDeclaration::new("outputTarget", Datatype::File)
                .with_parent("output")
                .with_default(json!("data/output.txt")),
            ParameterDeclaration::new("extra", Datatype::File).optional(),
        ])
        .unwrap();
        let binding = validate(
            &set,
            &json!({"codeFile": "/src/hello.py", "names": "names.txt"}),
        )
        .unwrap();

        let uploads = upload_files(&set, &binding);
        assert_eq!(
            uploads,
            vec![
                UploadFile {
                    parameter_id: "codeFile".into(),
                    source: "/src/hello.py".into(),
                    target: "code/helloworld.py".into(),
                },
                UploadFile {
                    parameter_id: "names".into(),
                    source: "names.txt".into(),
                    target: "names.txt".into(),
                },
                UploadFile {
                    parameter_id: "outputTarget".into(),
                    source: "data/output.txt".into(),
                    target: "data/output.txt".into(),
                },
            ]
        );
    }
}
