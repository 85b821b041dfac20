//! Variable-declaration writer.
//!
//! Renders the `($name:Type!...)` argument list of an operation from a
//! variable set, e.g. `{"a": 123, "b": true}` -> `$a:Int!$b:Boolean!`.
//! Map keys are sorted bytewise; record fields are collected by their `json`
//! annotation name and sorted the same way, so output is deterministic.

use std::fmt::Write as _;

use crate::introspect;
use crate::value::{Value, Variables};

/// Render the minified argument declarations for `variables`.
///
/// # Panics
///
/// Panics when `Variables::Value` holds anything but a record (optionally
/// behind an optional layer); that is a caller contract violation.
pub fn write_arguments(variables: &Variables) -> String {
    let mut out = String::new();
    match variables {
        Variables::Map(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for k in keys {
                let _ = write!(out, "${k}:");
                write_argument_type(&mut out, &map[k.as_str()], true);
            }
        }
        Variables::Value(v) => {
            // Unwrap an optional layer first, then require a record.
            let v = match v {
                Value::Nullable { value, .. } => value.as_ref(),
                other => other,
            };
            let Value::Record(r) = v else {
                panic!("variables must be a struct or a map; got {}", v.kind());
            };
            let mut fields: Vec<(&str, &Value)> = Vec::new();
            for f in &r.fields {
                let Some(tag) = f.json.as_deref() else { continue };
                if tag.is_empty() || tag == "-" {
                    continue;
                }
                let name = match tag.split_once(',') {
                    Some((n, _)) => n,
                    None => tag,
                };
                if name.is_empty() || name == "-" {
                    continue;
                }
                fields.push((name, &f.value));
            }
            fields.sort_by_key(|(name, _)| *name);
            for (name, value) in fields {
                let _ = write!(out, "${name}:");
                write_argument_type(&mut out, value, true);
            }
        }
    }
    out
}

/// Write the GraphQL type for one variable. `required` appends `!`; an
/// optional layer clears it for everything underneath.
fn write_argument_type(out: &mut String, v: &Value, required: bool) {
    if introspect::declares_wire_type_name(v) {
        // Self-reported name. Required-ness is decided by the shape itself:
        // an optional layer on either side of the name means no `!`.
        let required = match v {
            Value::Nullable { .. } => false,
            Value::Typed { value, .. } => !matches!(value.as_ref(), Value::Nullable { .. }),
            _ => true,
        };
        if let Some(name) =
            introspect::wire_type_name(v).or_else(|| introspect::wire_type_name_of_shape(v))
        {
            out.push_str(name);
            if required {
                out.push('!');
            }
            return;
        }
    }

    match v {
        Value::Nullable { value, .. } => {
            // Optional: the payload type, no `!`.
            write_argument_type(out, value, false);
            return;
        }
        Value::Dynamic(held) => {
            if let Some(inner) = held.as_deref() {
                write_argument_type(out, inner, required);
            }
            return;
        }
        Value::Wrapper(inner) => {
            write_argument_type(out, inner, required);
            return;
        }
        _ => {}
    }

    if introspect::is_integer_kind(v) {
        out.push_str("Int");
    } else {
        match v {
            Value::List { elem, .. } => {
                out.push('[');
                write_argument_type(out, elem, true);
                out.push(']');
            }
            Value::Float(_) => out.push_str("Float"),
            Value::Bool(_) => out.push_str("Boolean"),
            Value::Str(_) => out.push_str("String"),
            Value::Id(_) => out.push_str("ID"),
            Value::Enum { name, .. } => out.push_str(name),
            Value::Record(r) => out.push_str(r.type_name.as_deref().unwrap_or_default()),
            _ => {}
        }
    }

    if required {
        out.push('!');
    }
}
