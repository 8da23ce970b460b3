//! Test fixtures and helpers

#![allow(dead_code)]

use std::path::PathBuf;

use wftempl::Template;

/// Get path to test fixtures directory
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Get path to a specific fixture file
pub fn fixture(name: &str) -> PathBuf {
    fixtures_dir().join(name)
}

/// The hello-world template shipped in `tests/fixtures`
pub fn hello_world() -> Template {
    Template::load(fixture("hello-world/template.yaml")).unwrap()
}

/// Two-parameter template with a positional argument list
pub fn greetings_yaml() -> &'static str {
    r#"
template:
  outputfile: results/greetings.txt
  args:
    - $[[codeFile]]
    - $[[sleeptime]]
parameters:
  - id: codeFile
    datatype: file
  - id: sleeptime
    datatype: int
    defaultValue: 10
"#
}

/// Record parameter whose children all have defaults
pub fn grouped_yaml() -> &'static str {
    r#"
template:
  output:
    type: $[[outputType]]
    target: $[[outputTarget]]
parameters:
  - id: output
    datatype: record
    defaultValue: {}
  - id: outputType
    datatype: int
    parent: output
    defaultValue: 5
  - id: outputTarget
    datatype: file
    parent: output
    defaultValue: data/output.txt
"#
}
