//! Capability queries over [`Value`] shapes.
//!
//! Pure read-only layer shared by the writer and the decoder. Everything here
//! returns `bool`/`Option`; the callers decide what absence means.

use crate::value::Value;

// ---- wire-type self-report ---- //

/// Type-level check: does this shape self-report a wire-type name? Peels
/// `Nullable` layers only (the optional's zero shape still answers), never
/// `Dynamic`: an interface-typed slot does not declare anything statically.
pub fn declares_wire_type_name(v: &Value) -> bool {
    wire_type_name_of_shape(v).is_some()
}

/// Value-level name lookup: a null hop (`Nullable` absent, empty `Dynamic`)
/// yields `None` even when the underlying shape would report a name.
pub fn wire_type_name(v: &Value) -> Option<&str> {
    match v {
        Value::Typed { name, .. } => Some(name),
        Value::Nullable { value, present: true } => wire_type_name(value),
        Value::Dynamic(Some(inner)) => wire_type_name(inner),
        _ => None,
    }
}

/// Type-only name lookup, for shapes with no instance behind them (empty
/// list element shapes, absent optionals).
pub fn wire_type_name_of_shape(v: &Value) -> Option<&str> {
    match v {
        Value::Typed { name, .. } => Some(name),
        Value::Nullable { value, .. } => wire_type_name_of_shape(value),
        _ => None,
    }
}

// ---- transparent containers ---- //

pub fn is_wrapper(v: &Value) -> bool {
    matches!(v, Value::Wrapper(_))
}

pub fn unwrap_wrapper(v: &Value) -> Option<&Value> {
    match v {
        Value::Wrapper(inner) => Some(inner),
        _ => None,
    }
}

pub fn unwrap_wrapper_mut(v: &mut Value) -> Option<&mut Value> {
    match v {
        Value::Wrapper(inner) => Some(inner),
        _ => None,
    }
}

// ---- indirection peeling ---- //

/// Peel `Nullable`/`Dynamic`/`Typed` layers down to a concrete value.
/// `None` when a hop is null.
pub fn unwrap_to_concrete(mut v: &Value) -> Option<&Value> {
    loop {
        match v {
            Value::Nullable { value, present: true } => v = value,
            Value::Nullable { present: false, .. } => return None,
            Value::Dynamic(Some(inner)) => v = inner,
            Value::Dynamic(None) => return None,
            Value::Typed { value, .. } => v = value,
            _ => return Some(v),
        }
    }
}

pub fn unwrap_to_concrete_mut(mut v: &mut Value) -> Option<&mut Value> {
    loop {
        match v {
            Value::Nullable { value, present: true } => v = value,
            Value::Nullable { present: false, .. } => return None,
            Value::Dynamic(Some(inner)) => v = inner,
            Value::Dynamic(None) => return None,
            Value::Typed { value, .. } => v = value,
            _ => return Some(v),
        }
    }
}

/// True only for an absent optional or an empty interface value.
pub fn is_nullish(v: &Value) -> bool {
    matches!(v, Value::Nullable { present: false, .. } | Value::Dynamic(None))
}

pub fn is_integer_kind(v: &Value) -> bool {
    matches!(v, Value::Int(_) | Value::Uint(_))
}
