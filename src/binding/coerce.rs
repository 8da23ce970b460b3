//! Argument coercion - user-supplied scalars to typed values
//!
//! | datatype  | accepts                                          | produces |
//! |-----------|--------------------------------------------------|----------|
//! | `int`     | integers, exact integral floats, numeric strings | integer  |
//! | `decimal` | any number, numeric strings                      | float    |
//! | `bool`    | booleans, `"true"` / `"false"` (any case)        | boolean  |
//! | `file`    | non-empty strings (existence is not checked)     | string   |
//! | `string`  | any scalar                                       | string   |

use serde_json::{Number, Value};

use crate::ast::{Datatype, ParameterDeclaration};
use crate::error::WftError;

/// Short type name of a value, for error messages
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

/// Textual form used when a value is spliced into a larger string
pub fn to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// 2^53; integral floats below it convert to integers exactly
const MAX_EXACT_F64: f64 = 9_007_199_254_740_992.0;

fn integral_f64(f: f64) -> Option<i64> {
    (f.is_finite() && f.fract() == 0.0 && f.abs() < MAX_EXACT_F64).then_some(f as i64)
}

fn coerce_int(value: &Value) -> Option<Value> {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(Value::Number(n.clone())),
        Value::Number(n) => n.as_f64().and_then(integral_f64).map(Value::from),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .map(Value::from)
                .or_else(|_| s.parse::<u64>().map(Value::from))
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral_f64).map(Value::from))
        }
        _ => None,
    }
}

fn coerce_decimal(value: &Value) -> Option<Value> {
    let f = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    Number::from_f64(f).map(Value::Number)
}

fn coerce_bool(value: &Value) -> Option<Value> {
    match value {
        Value::Bool(b) => Some(Value::Bool(*b)),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Some(Value::Bool(true)),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Some(Value::Bool(false)),
        _ => None,
    }
}

fn coerce_file(value: &Value) -> Option<Value> {
    match value {
        Value::String(s) if !s.is_empty() => Some(Value::String(s.clone())),
        _ => None,
    }
}

fn coerce_string(value: &Value) -> Option<Value> {
    match value {
        Value::String(_) => Some(value.clone()),
        Value::Number(_) | Value::Bool(_) => Some(Value::String(value.to_string())),
        _ => None,
    }
}

/// Coerce a scalar against a datatype; `None` when it is not acceptable
pub fn coerce_scalar(datatype: Datatype, value: &Value) -> Option<Value> {
    match datatype {
        Datatype::Int => coerce_int(value),
        Datatype::Decimal => coerce_decimal(value),
        Datatype::Bool => coerce_bool(value),
        Datatype::File => coerce_file(value),
        Datatype::String => coerce_string(value),
        Datatype::Record => None,
    }
}

/// Coerce a value for a non-record declaration and check its enumeration
pub fn coerce(decl: &ParameterDeclaration, value: &Value) -> Result<Value, WftError> {
    let coerced = coerce_scalar(decl.datatype, value).ok_or_else(|| WftError::ArgumentType {
        id: decl.id.clone(),
        expected: decl.datatype.to_string(),
        value: format!("{} ({})", value, type_name(value)),
    })?;

    if let Some(values) = &decl.values {
        let allowed = values
            .iter()
            .any(|entry| coerce_scalar(decl.datatype, &entry.value).as_ref() == Some(&coerced));
        if !allowed {
            return Err(WftError::ValueNotAllowed {
                id: decl.id.clone(),
                value: coerced.to_string(),
            });
        }
    }

    Ok(coerced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::EnumValue;
    use serde_json::json;

    fn decl(datatype: Datatype) -> ParameterDeclaration {
        ParameterDeclaration::new("p", datatype)
    }

    #[test]
    fn int_accepts_numbers_and_numeric_strings() {
        let d = decl(Datatype::Int);
        assert_eq!(coerce(&d, &json!(10)).unwrap(), json!(10));
        assert_eq!(coerce(&d, &json!("42")).unwrap(), json!(42));
        assert_eq!(coerce(&d, &json!(" -7 ")).unwrap(), json!(-7));
        assert_eq!(coerce(&d, &json!(3.0)).unwrap(), json!(3));
        assert_eq!(coerce(&d, &json!("3.0")).unwrap(), json!(3));
    }

    #[test]
    fn int_rejects_non_numeric() {
        let d = decl(Datatype::Int);
        for bad in [json!("ten"), json!(1.5), json!(true), json!(null), json!([1])] {
            let err = coerce(&d, &bad).unwrap_err();
            assert!(matches!(err, WftError::ArgumentType { .. }), "{bad}");
            assert_eq!(err.parameter_id(), Some("p"));
        }
    }

    #[test]
    fn int_keeps_values_beyond_i64_exact() {
        let d = decl(Datatype::Int);
        assert_eq!(
            coerce(&d, &json!("9223372036854775808")).unwrap(),
            json!(9_223_372_036_854_775_808u64)
        );
        assert_eq!(
            coerce(&d, &json!("9223372036854775809")).unwrap(),
            json!(9_223_372_036_854_775_809u64)
        );
        assert_eq!(
            coerce(&d, &json!(9_223_372_036_854_775_808u64)).unwrap(),
            json!(9_223_372_036_854_775_808u64)
        );
    }

    #[test]
    fn int_rejects_values_that_would_be_rounded() {
        let d = decl(Datatype::Int);
        for bad in [
            json!("18446744073709551616"),
            json!("9.3e18"),
            json!(1e19),
            json!("9007199254740993.0"),
        ] {
            assert!(coerce(&d, &bad).is_err(), "{bad}");
        }
        assert_eq!(
            coerce(&d, &json!("9007199254740991.0")).unwrap(),
            json!(9_007_199_254_740_991i64)
        );
    }

    #[test]
    fn decimal_produces_floats() {
        let d = decl(Datatype::Decimal);
        assert_eq!(coerce(&d, &json!(1.5)).unwrap(), json!(1.5));
        assert_eq!(coerce(&d, &json!(2)).unwrap(), json!(2.0));
        assert_eq!(coerce(&d, &json!("0.25")).unwrap(), json!(0.25));
        assert!(coerce(&d, &json!("abc")).is_err());
        assert!(coerce(&d, &json!("NaN")).is_err());
    }

    #[test]
    fn bool_accepts_case_insensitive_strings() {
        let d = decl(Datatype::Bool);
        assert_eq!(coerce(&d, &json!(true)).unwrap(), json!(true));
        assert_eq!(coerce(&d, &json!("TRUE")).unwrap(), json!(true));
        assert_eq!(coerce(&d, &json!("False")).unwrap(), json!(false));
        assert!(coerce(&d, &json!("yes")).is_err());
        assert!(coerce(&d, &json!(1)).is_err());
    }

    #[test]
    fn file_needs_a_non_empty_reference() {
        let d = decl(Datatype::File);
        assert_eq!(
            coerce(&d, &json!("helloworld.py")).unwrap(),
            json!("helloworld.py")
        );
        assert!(coerce(&d, &json!("")).is_err());
        assert!(coerce(&d, &json!(5)).is_err());
    }

    #[test]
    fn string_accepts_any_scalar_as_text() {
        let d = decl(Datatype::String);
        assert_eq!(coerce(&d, &json!("hi")).unwrap(), json!("hi"));
        assert_eq!(coerce(&d, &json!(5)).unwrap(), json!("5"));
        assert_eq!(coerce(&d, &json!(false)).unwrap(), json!("false"));
        assert!(coerce(&d, &json!(null)).is_err());
        assert!(coerce(&d, &json!({"a": 1})).is_err());
    }

    #[test]
    fn enumerated_values_restrict_arguments() {
        let d = decl(Datatype::Int).with_values(vec![
            EnumValue::new(json!(1)),
            EnumValue::new(json!(2)).named("Two"),
        ]);
        assert_eq!(coerce(&d, &json!("2")).unwrap(), json!(2));
        let err = coerce(&d, &json!(3)).unwrap_err();
        assert!(matches!(err, WftError::ValueNotAllowed { .. }));
    }

    #[test]
    fn text_form_of_values() {
        assert_eq!(to_text(&json!("a b")), "a b");
        assert_eq!(to_text(&json!(10)), "10");
        assert_eq!(to_text(&json!(true)), "true");
    }
}
