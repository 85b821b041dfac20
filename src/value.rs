//! Closed shape model.
//!
//! The caller describes the data it wants as a `Value` tree once per request:
//! the document writer walks it to render the selection, the decoder walks it
//! again to fill it in from the response. No reflection: every kind the
//! library understands is a variant here, and every walk is an exhaustive
//! match.

use indexmap::IndexMap;
use serde_json::json;

/// One shape kind per variant. Data and shape live together: an absent
/// `Nullable` still carries the zero shape of its payload so selection
/// writing and decoder allocation stay type-driven.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(String),
    /// Identifier leaf; argument type name `ID`.
    Id(String),
    /// Bare named scalar. The argument writer emits `name` verbatim; decodes
    /// from a JSON string.
    Enum { name: String, value: String },
    /// Self-reported wire-type name. Overrides field annotations in the
    /// document writer. `Typed` around `Nullable` is the pointer-kind
    /// self-report (its argument type never gets `!`).
    Typed { name: String, value: Box<Value> },
    /// Optional value. `value` always holds the zero shape, even when
    /// `present == false`.
    Nullable { value: Box<Value>, present: bool },
    /// Interface-held value.
    Dynamic(Option<Box<Value>>),
    Record(Record),
    /// Transparent single-value container: invisible to the document, and the
    /// decoder writes through it into the inner slot.
    Wrapper(Box<Value>),
    /// `elem` carries the element shape for empty lists; during decoding
    /// `items[0]` doubles as the per-element template.
    List { elem: Box<Value>, items: Vec<Value> },
    /// Ordered-pairs-as-map. Two-ness is enforced by construction, so the
    /// "pair must have 2 elements" failure mode cannot occur.
    Pairs(Vec<(String, Value)>),
    /// Native dictionary. Rejected by writer and decoder (no guaranteed field
    /// order); only reachable as a scalar-capture target.
    Map(IndexMap<String, Value>),
    /// Raw-capture leaf: the decoder stores the complete JSON subtree here.
    Json(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    /// Bare type name, used by the argument writer when a record is passed
    /// as a variable value.
    pub type_name: Option<String>,
    pub fields: Vec<Field>,
}

/// A named record field plus its annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Host identifier, MixedCaps; the document writer derives the wire name
    /// from it when no annotation applies.
    pub name: String,
    /// `graphql` annotation: alias/arguments/fragment/skip grammar.
    pub tag: Option<String>,
    /// `json` annotation; drives variable-name collection and request-body
    /// serialization.
    pub json: Option<String>,
    /// Render the field name but never descend; the decoder captures the
    /// whole subtree.
    pub scalar: bool,
    /// Embedded field: inlined into the parent selection when untagged.
    pub embedded: bool,
    pub value: Value,
}

impl Field {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Field {
            name: name.into(),
            tag: None,
            json: None,
            scalar: false,
            embedded: false,
            value,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_json(mut self, json: impl Into<String>) -> Self {
        self.json = Some(json.into());
        self
    }

    pub fn scalar(mut self) -> Self {
        self.scalar = true;
        self
    }

    pub fn embedded(mut self) -> Self {
        self.embedded = true;
        self
    }
}

impl Record {
    pub fn new(fields: Vec<Field>) -> Self {
        Record { type_name: None, fields }
    }

    pub fn named(type_name: impl Into<String>, fields: Vec<Field>) -> Self {
        Record { type_name: Some(type_name.into()), fields }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.name == name)
    }
}

impl Value {
    /// Present optional.
    pub fn some(value: Value) -> Value {
        Value::Nullable { value: Box::new(value), present: true }
    }

    /// Absent optional carrying the zero shape of `shape`.
    pub fn none_of(shape: Value) -> Value {
        Value::Nullable { value: Box::new(shape.zeroed()), present: false }
    }

    pub fn string(s: impl Into<String>) -> Value {
        Value::Str(s.into())
    }

    /// Empty list of the given element shape.
    pub fn list_of(elem: Value) -> Value {
        Value::List { elem: Box::new(elem), items: Vec::new() }
    }

    pub fn list(elem: Value, items: Vec<Value>) -> Value {
        Value::List { elem: Box::new(elem), items }
    }

    /// Same shape, data cleared. Shape-bearing layers (`Nullable` payloads,
    /// list element shapes, held `Dynamic` kinds, record field sets) survive;
    /// runtime contents do not.
    pub fn zeroed(&self) -> Value {
        match self {
            Value::Bool(_) => Value::Bool(false),
            Value::Int(_) => Value::Int(0),
            Value::Uint(_) => Value::Uint(0),
            Value::Float(_) => Value::Float(0.0),
            Value::Str(_) => Value::Str(String::new()),
            Value::Id(_) => Value::Id(String::new()),
            Value::Enum { name, .. } => {
                Value::Enum { name: name.clone(), value: String::new() }
            }
            Value::Typed { name, value } => {
                Value::Typed { name: name.clone(), value: Box::new(value.zeroed()) }
            }
            Value::Nullable { value, .. } => {
                Value::Nullable { value: Box::new(value.zeroed()), present: false }
            }
            Value::Dynamic(held) => {
                Value::Dynamic(held.as_ref().map(|v| Box::new(v.zeroed())))
            }
            Value::Record(r) => {
                let fields = r
                    .fields
                    .iter()
                    .map(|f| Field { value: f.value.zeroed(), ..f.clone() })
                    .collect();
                Value::Record(Record { type_name: r.type_name.clone(), fields })
            }
            Value::Wrapper(inner) => Value::Wrapper(Box::new(inner.zeroed())),
            Value::List { elem, .. } => {
                Value::List { elem: elem.clone(), items: Vec::new() }
            }
            Value::Pairs(_) => Value::Pairs(Vec::new()),
            Value::Map(_) => Value::Map(IndexMap::new()),
            Value::Json(_) => Value::Json(serde_json::Value::Null),
        }
    }

    /// Short kind name for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Uint(_) => "uint",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Id(_) => "ID",
            Value::Enum { .. } => "enum",
            Value::Typed { .. } => "typed",
            Value::Nullable { .. } => "optional",
            Value::Dynamic(_) => "interface",
            Value::Record(_) => "struct",
            Value::Wrapper(_) => "wrapper",
            Value::List { .. } => "slice",
            Value::Pairs(_) => "ordered map",
            Value::Map(_) => "map",
            Value::Json(_) => "json",
        }
    }

    /// Serialize for the `variables` object of a request body.
    ///
    /// Record fields take their `json` annotation name when present (text
    /// before the first comma), skip `-`, and honor `omitempty` for absent
    /// optionals; otherwise the host field name is used as-is.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Bool(b) => json!(b),
            Value::Int(i) => json!(i),
            Value::Uint(u) => json!(u),
            Value::Float(f) => json!(f),
            Value::Str(s) | Value::Id(s) => json!(s),
            Value::Enum { value, .. } => json!(value),
            Value::Typed { value, .. } => value.to_json(),
            Value::Nullable { value, present } => {
                if *present {
                    value.to_json()
                } else {
                    serde_json::Value::Null
                }
            }
            Value::Dynamic(held) => match held {
                Some(v) => v.to_json(),
                None => serde_json::Value::Null,
            },
            Value::Record(r) => {
                let mut obj = serde_json::Map::new();
                for f in &r.fields {
                    let (name, opts) = match f.json.as_deref() {
                        Some(tag) => match tag.split_once(',') {
                            Some((n, rest)) => (n, rest),
                            None => (tag, ""),
                        },
                        None => (f.name.as_str(), ""),
                    };
                    if name == "-" {
                        continue;
                    }
                    let name = if name.is_empty() { f.name.as_str() } else { name };
                    if opts.split(',').any(|o| o == "omitempty")
                        && matches!(
                            f.value,
                            Value::Nullable { present: false, .. } | Value::Dynamic(None)
                        )
                    {
                        continue;
                    }
                    obj.insert(name.to_owned(), f.value.to_json());
                }
                serde_json::Value::Object(obj)
            }
            Value::Wrapper(inner) => inner.to_json(),
            Value::List { items, .. } => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Pairs(pairs) => {
                let mut obj = serde_json::Map::new();
                for (k, v) in pairs {
                    obj.insert(k.clone(), v.to_json());
                }
                serde_json::Value::Object(obj)
            }
            Value::Map(map) => {
                let mut obj = serde_json::Map::new();
                for (k, v) in map {
                    obj.insert(k.clone(), v.to_json());
                }
                serde_json::Value::Object(obj)
            }
            Value::Json(raw) => raw.clone(),
        }
    }
}

// ---- Variables ---- //

/// Variable set for a request: either an ordered name -> value map, or a
/// record shape whose annotated fields are the variables.
#[derive(Debug, Clone, PartialEq)]
pub enum Variables {
    Map(IndexMap<String, Value>),
    /// Must hold a `Record` (optionally behind `Nullable`); anything else is
    /// a caller contract violation and panics in the argument writer.
    Value(Value),
}

impl Variables {
    pub fn is_empty(&self) -> bool {
        match self {
            Variables::Map(m) => m.is_empty(),
            Variables::Value(_) => false,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Variables::Map(m) => {
                let mut obj = serde_json::Map::new();
                for (k, v) in m {
                    obj.insert(k.clone(), v.to_json());
                }
                serde_json::Value::Object(obj)
            }
            Variables::Value(v) => v.to_json(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zeroed_keeps_shape_drops_data() {
        let v = Value::some(Value::Record(Record::new(vec![
            Field::new("Name", Value::string("alice")),
            Field::new("Age", Value::Int(41)),
        ])));
        let z = v.zeroed();
        match z {
            Value::Nullable { value, present } => {
                assert!(!present);
                match *value {
                    Value::Record(r) => {
                        assert_eq!(r.fields[0].value, Value::Str(String::new()));
                        assert_eq!(r.fields[1].value, Value::Int(0));
                    }
                    other => panic!("expected record, got {}", other.kind()),
                }
            }
            other => panic!("expected optional, got {}", other.kind()),
        }
    }

    #[test]
    fn to_json_honors_json_annotations() {
        let v = Value::Record(Record::new(vec![
            Field::new("Login", Value::string("alice")).with_json("login"),
            Field::new("Secret", Value::string("x")).with_json("-"),
            Field::new("Nick", Value::none_of(Value::Str(String::new())))
                .with_json("nick,omitempty"),
            Field::new("Plain", Value::Int(3)),
        ]));
        assert_eq!(
            v.to_json(),
            serde_json::json!({"login": "alice", "Plain": 3})
        );
    }

    #[test]
    fn to_json_unwraps_transparent_layers() {
        let v = Value::Wrapper(Box::new(Value::Typed {
            name: "uuid".into(),
            value: Box::new(Value::string("u-1")),
        }));
        assert_eq!(v.to_json(), serde_json::json!("u-1"));
    }
}
