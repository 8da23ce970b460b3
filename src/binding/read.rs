//! Interactive argument reading
//!
//! Walks declarations in presentation order and asks for one value per
//! parameter. Records print their name and prompt for their children one
//! level deeper. Empty input leaves the value to `validate`, which applies
//! the default; invalid input is reported and asked again.

use std::io::{BufRead, Write};

use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::ast::ParameterDeclaration;
use crate::error::WftError;
use crate::params::ParameterSet;

use super::coerce::coerce;

/// Read an arguments mapping from `input`, writing prompts to `output`
#[instrument(skip_all, fields(parameters = set.len()))]
pub fn read_arguments<R: BufRead, W: Write>(
    set: &ParameterSet,
    input: &mut R,
    output: &mut W,
) -> Result<Value, WftError> {
    let roots: Vec<&ParameterDeclaration> = set
        .list_sorted()
        .into_iter()
        .filter(|d| d.parent.is_none())
        .collect();
    let arguments = read_scope(set, &roots, 0, input, output)?;
    Ok(Value::Object(arguments))
}

fn read_scope<R: BufRead, W: Write>(
    set: &ParameterSet,
    declarations: &[&ParameterDeclaration],
    depth: usize,
    input: &mut R,
    output: &mut W,
) -> Result<Map<String, Value>, WftError> {
    let mut arguments = Map::new();
    let indent = "  ".repeat(depth);

    for decl in declarations {
        if decl.is_record() {
            writeln!(output, "{}{}", indent, decl.name)?;
            let children = set.sorted_children(&decl.id);
            let record = read_scope(set, &children, depth + 1, input, output)?;
            if !record.is_empty() {
                arguments.insert(decl.id.clone(), Value::Object(record));
            }
            continue;
        }

        if let Some(value) = read_value(decl, &indent, input, output)? {
            arguments.insert(decl.id.clone(), value);
        }
    }

    Ok(arguments)
}

/// Prompt until the answer coerces; `None` leaves the parameter unset
fn read_value<R: BufRead, W: Write>(
    decl: &ParameterDeclaration,
    indent: &str,
    input: &mut R,
    output: &mut W,
) -> Result<Option<Value>, WftError> {
    let needs_value = decl.required && decl.effective_default().is_none();

    loop {
        write!(output, "{}{}", indent, decl.prompt())?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            if needs_value {
                return Err(WftError::MissingArgument {
                    id: decl.id.clone(),
                });
            }
            writeln!(output)?;
            return Ok(None);
        }

        let answer = line.trim_end_matches(['\r', '\n']);
        if answer.trim().is_empty() {
            if needs_value {
                writeln!(output, "{}  a value is required", indent)?;
                continue;
            }
            debug!(id = %decl.id, "Empty answer, default applies");
            return Ok(None);
        }

        match coerce(decl, &Value::String(answer.to_string())) {
            Ok(value) => return Ok(Some(value)),
            Err(e) => writeln!(output, "{}  {}", indent, e)?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Datatype, EnumValue};
    use crate::binding::validate;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::io::Cursor;

    fn record_template() -> ParameterSet {
        ParameterSet::build(vec![
            ParameterDeclaration::new("codeFile", Datatype::File).with_index(0),
            ParameterDeclaration::new("sleeptime", Datatype::Int)
                .with_index(1)
                .with_default(json!(10)),
            ParameterDeclaration::new("verbose", Datatype::Bool).with_index(2),
            ParameterDeclaration::new("output", Datatype::Record)
                .with_name("Output")
                .with_index(3),
            ParameterDeclaration::new("outputTarget", Datatype::File).with_parent("output"),
            ParameterDeclaration::new("outputType", Datatype::Int).with_parent("output"),
            ParameterDeclaration::new("frac", Datatype::Decimal).with_index(4),
        ])
        .unwrap()
    }

    fn read(set: &ParameterSet, answers: &str) -> (Result<Value, WftError>, String) {
        let mut input = Cursor::new(answers.as_bytes().to_vec());
        let mut output = Vec::new();
        let result = read_arguments(set, &mut input, &mut output);
        (result, String::from_utf8(output).unwrap())
    }

    #[test]
    fn reads_values_including_record_children() {
        let set = record_template();
        let (args, _) = read(&set, "ABC.txt\n3\ntrue\nXYZ.txt\n6\n0.123\n");
        assert_eq!(
            args.unwrap(),
            json!({
                "codeFile": "ABC.txt",
                "sleeptime": 3,
                "verbose": true,
                "output": {"outputTarget": "XYZ.txt", "outputType": 6},
                "frac": 0.123
            })
        );
    }

    #[test]
    fn record_children_are_indented_under_the_record_name() {
        let set = record_template();
        let (_, transcript) = read(&set, "ABC.txt\n3\ntrue\nXYZ.txt\n6\n0.123\n");
        assert!(transcript.contains("Output\n  outputTarget (filename): "));
        assert!(transcript.contains("  outputType (integer): "));
        assert!(transcript.starts_with("codeFile (filename): "));
    }

    #[test]
    fn empty_answer_takes_the_default() {
        let set = record_template();
        let (args, _) = read(&set, "a.py\n\nfalse\nout.txt\n1\n2\n");
        let args = args.unwrap();
        assert!(args.get("sleeptime").is_none());
        let binding = validate(&set, &args).unwrap();
        assert_eq!(binding.get_root("sleeptime"), Some(&json!(10)));
    }

    #[test]
    fn invalid_answers_are_asked_again() {
        let set = ParameterSet::build(vec![ParameterDeclaration::new("n", Datatype::Int)]).unwrap();
        let (args, transcript) = read(&set, "ten\n\n7\n");
        assert_eq!(args.unwrap(), json!({"n": 7}));
        assert_eq!(transcript.matches("n (integer): ").count(), 3);
        assert!(transcript.contains("[WFT-031]"));
        assert!(transcript.contains("a value is required"));
    }

    #[test]
    fn enumeration_is_enforced_while_reading() {
        let set = ParameterSet::build(vec![ParameterDeclaration::new("color", Datatype::String)
            .with_values(vec![EnumValue::new(json!("red")), EnumValue::new(json!("blue"))])])
        .unwrap();
        let (args, transcript) = read(&set, "green\nblue\n");
        assert_eq!(args.unwrap(), json!({"color": "blue"}));
        assert!(transcript.contains("[WFT-032]"));
    }

    #[test]
    fn end_of_input_fails_only_for_required_values() {
        let set = ParameterSet::build(vec![
            ParameterDeclaration::new("flag", Datatype::Bool).optional(),
            ParameterDeclaration::new("n", Datatype::Int),
        ])
        .unwrap();
        let (args, _) = read(&set, "");
        let err = args.unwrap_err();
        assert!(matches!(err, WftError::MissingArgument { ref id } if id == "n"));

        let optional_only =
            ParameterSet::build(vec![ParameterDeclaration::new("flag", Datatype::Bool).optional()])
                .unwrap();
        assert_eq!(read(&optional_only, "").0.unwrap(), json!({}));
    }
}
