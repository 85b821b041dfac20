//! Selection writer.
//!
//! Renders a shape into the minified selection part of a document, e.g.
//! `struct{Foo int, BarBaz *bool}` -> `{foo,barBaz}`. Rules of note:
//!
//! - nullability is invisible: an optional contributes its payload's shape;
//! - an empty interface slot (or one holding a null) contributes nothing;
//! - wrappers are fully transparent;
//! - a field's self-reported wire-type name beats its tag, which beats the
//!   lowerCamelCase derivation of the host identifier;
//! - lists render their element shape exactly once;
//! - ordered pairs render every runtime pair with the key verbatim;
//! - native maps are rejected.

use heck::ToLowerCamelCase;

use crate::error::{Error, Result};
use crate::introspect;
use crate::value::{Field, Value};

/// Render the minified selection for `v`.
pub fn write_selection(v: &Value) -> Result<String> {
    let mut out = String::new();
    write_value(&mut out, v, false)?;
    Ok(out)
}

// ---- field preprocessing ---- //

struct FieldOutput<'a> {
    skip: bool,
    /// Emitted text; a tag is emitted verbatim (alias, arguments, fragment
    /// condition included).
    name: &'a str,
    derived: Option<String>,
    inline: bool,
    scalar: bool,
}

impl FieldOutput<'_> {
    fn skip() -> Self {
        FieldOutput { skip: true, name: "", derived: None, inline: false, scalar: false }
    }
}

/// Decide what a record field contributes: its emitted name (if any), whether
/// it is inlined, and whether it is a scalar leaf.
fn process_field(f: &Field) -> FieldOutput<'_> {
    let mut reported: Option<&str> = None;

    if introspect::declares_wire_type_name(&f.value) {
        // Self-reporting field. A null slot is omitted from the document
        // entirely; otherwise the reported name wins over any tag.
        if introspect::is_nullish(&f.value) {
            return FieldOutput::skip();
        }
        match introspect::wire_type_name(&f.value) {
            Some(n) => reported = Some(n),
            // Concrete value is null behind the indirection.
            None => return FieldOutput::skip(),
        }
    } else if let Value::List { elem, .. } = &f.value
        && let Some(n) = introspect::wire_type_name_of_shape(elem)
    {
        // List of self-reporting elements: the name comes from the element
        // shape alone, no instance needed.
        reported = Some(n);
    }

    let named = reported.or(f.tag.as_deref());
    if named == Some("-") {
        return FieldOutput::skip();
    }

    let inline = f.embedded && named.is_none();
    let (name, derived) = if inline {
        ("", None)
    } else {
        match named {
            Some(n) => (n, None),
            None => ("", Some(f.name.to_lower_camel_case())),
        }
    };

    FieldOutput { skip: false, name, derived, inline, scalar: f.scalar }
}

// ---- recursive walk ---- //

fn write_value(out: &mut String, v: &Value, inline: bool) -> Result<()> {
    match v {
        Value::Dynamic(held) => {
            let Some(inner) = held.as_deref() else {
                return Ok(());
            };
            // An interface holding a null contributes nothing.
            if introspect::is_nullish(inner) {
                return Ok(());
            }
            write_value(out, inner, inline)
                .map_err(|e| e.in_write_context("interface value"))
        }
        Value::Nullable { value, .. } => {
            // Shape-driven: the zero shape renders even when absent.
            write_value(out, value, false)
                .map_err(|e| e.in_write_context(format!("optional `{}`", value.kind())))
        }
        Value::Typed { value, .. } => write_value(out, value, inline),
        Value::Record(r) => {
            if !inline {
                out.push('{');
            }
            let mut iter = 0;
            for f in &r.fields {
                let output = process_field(f);
                if output.skip {
                    continue;
                }
                if iter != 0 {
                    out.push(',');
                }
                iter += 1;
                if !output.inline {
                    match &output.derived {
                        Some(d) => out.push_str(d),
                        None => out.push_str(output.name),
                    }
                }
                // Scalar leaves get a name but never expand.
                if output.scalar {
                    continue;
                }
                write_value(out, &f.value, output.inline)
                    .map_err(|e| e.in_write_context(format!("struct field `{}`", f.name)))?;
            }
            if !inline {
                out.push('}');
            }
            Ok(())
        }
        Value::Wrapper(inner) => write_value(out, inner, inline)
            .map_err(|e| e.in_write_context("wrapped value")),
        Value::List { elem, items } => {
            // The element shape renders once, from the first item when one
            // exists so runtime pairs/fragments inside it are visible.
            let sample = items.first().unwrap_or(elem);
            write_value(out, sample, false)
                .map_err(|e| e.in_write_context("slice item"))
        }
        Value::Pairs(pairs) => {
            out.push('{');
            for (key, val) in pairs {
                out.push_str(key);
                write_value(out, val, false)
                    .map_err(|e| e.in_write_context(format!("pair value `{key}`")))?;
            }
            out.push('}');
            Ok(())
        }
        Value::Map(_) => Err(Error::MapNotSupported),
        // Leaves: bool, numbers, strings, IDs, enums, raw capture.
        _ => Ok(()),
    }
}
