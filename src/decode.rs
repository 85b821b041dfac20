//! Response decoder.
//!
//! Walks the JSON token stream and the target shape in lockstep. Because one
//! JSON value may land in several places at once (inline fragments, embedded
//! records), the decoder keeps a set of frames, each holding a stack of
//! destinations plus the fragment type condition that frame came from. A
//! destination is a path into the target tree, resolved on demand, so many
//! frames can point into the same tree without holding live borrows.
//!
//! `__typename` values are captured as they stream by and gate which fragment
//! frames accept a key: when the current typename is known and a matching
//! fragment wants the key, non-matching fragments are skipped. With no
//! typename in the response, every fragment is populated.

use serde_json::Value as Json;

use crate::error::{Error, Result};
use crate::introspect;
use crate::tag;
use crate::token::{Token, TokenSource, parse_single};
use crate::value::{Field, Record, Value};

const TYPENAME_KEY: &str = "__typename";

/// Decode a JSON response body into `v`. Exactly one top-level JSON value is
/// consumed; anything after it is an error.
pub fn decode(data: &[u8], v: &mut Value) -> Result<()> {
    tracing::trace!(len = data.len(), target_kind = v.kind(), "decoding response");
    let parsed = parse_single(data)?;
    decode_parsed(&parsed, v)
}

/// Decode an already-parsed JSON tree into `v`. Used for the `data` part of a
/// response envelope, which arrives pre-parsed.
pub fn decode_parsed(parsed: &Json, v: &mut Value) -> Result<()> {
    let mut dec = Decoder {
        tokens: TokenSource::new(parsed),
        parse_state: Vec::new(),
        frames: vec![Frame { stack: vec![Some(Vec::new())], fragment_type: String::new() }],
        current_typename: String::new(),
        current_key: String::new(),
    };
    dec.run(v)
}

// ---- destination paths ---- //

/// One hop into the target tree.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Seg {
    Field(usize),
    Pair(usize),
    Item(usize),
    NullableInner,
    DynamicInner,
    TypedInner,
    WrapperInner,
}

type Path = Vec<Seg>;

fn resolve<'a>(root: &'a Value, path: &[Seg]) -> Option<&'a Value> {
    let mut cur = root;
    for seg in path {
        cur = match (cur, seg) {
            (Value::Record(r), Seg::Field(i)) => &r.fields.get(*i)?.value,
            (Value::Pairs(p), Seg::Pair(i)) => &p.get(*i)?.1,
            (Value::List { items, .. }, Seg::Item(i)) => items.get(*i)?,
            (Value::Nullable { value, .. }, Seg::NullableInner) => value,
            (Value::Dynamic(Some(inner)), Seg::DynamicInner) => inner,
            (Value::Typed { value, .. }, Seg::TypedInner) => value,
            (Value::Wrapper(inner), Seg::WrapperInner) => inner,
            _ => return None,
        };
    }
    Some(cur)
}

fn resolve_mut<'a>(root: &'a mut Value, path: &[Seg]) -> Option<&'a mut Value> {
    let mut cur = root;
    for seg in path {
        cur = match (cur, seg) {
            (Value::Record(r), Seg::Field(i)) => &mut r.fields.get_mut(*i)?.value,
            (Value::Pairs(p), Seg::Pair(i)) => &mut p.get_mut(*i)?.1,
            (Value::List { items, .. }, Seg::Item(i)) => items.get_mut(*i)?,
            (Value::Nullable { value, .. }, Seg::NullableInner) => value,
            (Value::Dynamic(Some(inner)), Seg::DynamicInner) => inner,
            (Value::Typed { value, .. }, Seg::TypedInner) => value,
            (Value::Wrapper(inner), Seg::WrapperInner) => inner,
            _ => return None,
        };
    }
    Some(cur)
}

/// Extend `path` through every transparent layer down to a concrete value.
/// `None` when a hop is null (absent optional, empty interface).
fn concrete_path(root: &Value, path: &[Seg]) -> Option<Path> {
    let mut path = path.to_vec();
    loop {
        match resolve(root, &path)? {
            Value::Nullable { present: true, .. } => path.push(Seg::NullableInner),
            Value::Nullable { present: false, .. } => return None,
            Value::Dynamic(Some(_)) => path.push(Seg::DynamicInner),
            Value::Dynamic(None) => return None,
            Value::Typed { .. } => path.push(Seg::TypedInner),
            Value::Wrapper(_) => path.push(Seg::WrapperInner),
            _ => return Some(path),
        }
    }
}

// ---- frames ---- //

/// One unmarshal destination: a stack of paths (the top is where the next
/// JSON value goes) plus the fragment type condition it is gated on. An empty
/// condition means "always".
#[derive(Debug)]
struct Frame {
    stack: Vec<Option<Path>>,
    fragment_type: String,
}

/// What the key handler hands back to the main loop: either the next token,
/// or a whole raw subtree for raw/scalar destinations.
enum Next {
    Tok(Token),
    Raw(Json),
}

struct Decoder<'a> {
    tokens: TokenSource<'a>,
    /// Stack of `{` / `[` markers for where we are in the input.
    parse_state: Vec<u8>,
    frames: Vec<Frame>,
    current_typename: String,
    current_key: String,
}

impl Decoder<'_> {
    fn run(&mut self, root: &mut Value) -> Result<()> {
        // Invariant: the top of every frame's stack is where the next JSON
        // value we see should land.
        while !self.frames.is_empty() {
            let tok = self.tokens.next().ok_or(Error::UnexpectedEnd)?;

            let next = match self.state() {
                Some(b'{') if tok != Token::ObjectEnd => match tok {
                    Token::Str(key) => self.object_key(key, root)?,
                    other => {
                        return Err(Error::UnexpectedToken {
                            token: other.to_string(),
                            at: "object key".to_owned(),
                        });
                    }
                },
                Some(b'[') if tok != Token::ArrayEnd => {
                    self.array_value(root)?;
                    Next::Tok(tok)
                }
                _ => Next::Tok(tok),
            };

            match next {
                Next::Raw(raw) => self.scalar_value(raw, root)?,
                Next::Tok(Token::Str(s)) => self.scalar_value(Json::String(s), root)?,
                Next::Tok(Token::Num(n)) => self.scalar_value(Json::Number(n), root)?,
                Next::Tok(Token::Bool(b)) => self.scalar_value(Json::Bool(b), root)?,
                Next::Tok(Token::Null) => self.scalar_value(Json::Null, root)?,
                Next::Tok(Token::ObjectStart) => self.object_start(root),
                Next::Tok(Token::ArrayStart) => self.array_start(root)?,
                Next::Tok(Token::ObjectEnd) => {
                    self.pop_frames();
                    self.pop_state();
                }
                Next::Tok(Token::ArrayEnd) => {
                    self.trim_templates(root);
                    self.pop_frames();
                    self.pop_state();
                }
            }
        }
        Ok(())
    }

    // ---- object keys ---- //

    /// Discover where `key`'s value should land in every frame, push those
    /// destinations, and fetch the value (raw for raw/scalar destinations).
    fn object_key(&mut self, key: String, root: &mut Value) -> Result<Next> {
        self.current_key = key.clone();

        struct Found {
            path: Option<Path>,
            scalar: bool,
            fragment_match: bool,
        }

        // First pass: find a field per frame, note whether any matching
        // fragment has it, and whether any destination wants raw capture.
        let mut founds = Vec::with_capacity(self.frames.len());
        let mut matching_fragment_has_field = false;
        let mut raw = false;
        for frame in &self.frames {
            let mut found = Found { path: None, scalar: false, fragment_match: true };

            if let Some(top) = frame.stack.last().and_then(|p| p.as_ref())
                && let Some(cpath) = concrete_path(root, top)
            {
                match resolve(root, &cpath) {
                    Some(Value::Record(r)) => {
                        if let Some((idx, scalar)) = field_index_by_wire_name(r, &key) {
                            let mut fpath = cpath.clone();
                            fpath.push(Seg::Field(idx));
                            // Wrapper fields redirect to their writable slot.
                            if matches!(resolve(root, &fpath), Some(Value::Wrapper(_))) {
                                fpath.push(Seg::WrapperInner);
                            }
                            if matches!(resolve(root, &fpath), Some(Value::Json(_))) {
                                raw = true;
                            }
                            found.path = Some(fpath);
                            found.scalar = scalar;
                        }
                    }
                    Some(Value::Pairs(pairs)) => {
                        if let Some(idx) = pair_index_by_wire_name(pairs, &key) {
                            let mut fpath = cpath.clone();
                            fpath.push(Seg::Pair(idx));
                            // Peel optional layers; the slot itself exists.
                            while matches!(
                                resolve(root, &fpath),
                                Some(Value::Nullable { .. })
                            ) {
                                fpath.push(Seg::NullableInner);
                            }
                            found.path = Some(fpath);
                        }
                    }
                    _ => {}
                }
            }

            if !frame.fragment_type.is_empty() && !self.current_typename.is_empty() {
                found.fragment_match = frame.fragment_type == self.current_typename;
            }
            if found.path.is_some() && found.fragment_match {
                matching_fragment_has_field = true;
            }
            founds.push(found);
        }

        // Second pass: push destinations, dropping a found field when it sits
        // in a non-matching fragment and a matching fragment also has it.
        let mut some_field = false;
        let mut is_scalar = false;
        for (frame, found) in self.frames.iter_mut().zip(founds) {
            if found.path.is_some() {
                some_field = true;
                if found.scalar {
                    is_scalar = true;
                }
            }
            let push = if found.path.is_some()
                && !found.fragment_match
                && matching_fragment_has_field
            {
                None
            } else {
                found.path
            };
            frame.stack.push(push);
        }

        if !some_field {
            return Err(Error::NoFieldForKey { key, places: self.frames.len() });
        }

        if raw || is_scalar {
            return Ok(Next::Raw(self.tokens.next_raw()?));
        }
        match self.tokens.next() {
            Some(tok) => Ok(Next::Tok(tok)),
            None => Err(Error::UnexpectedEnd),
        }
    }

    // ---- scalars ---- //

    fn scalar_value(&mut self, val: Json, root: &mut Value) -> Result<()> {
        // Capture __typename as it streams by; it gates fragment frames.
        if self.current_key == TYPENAME_KEY
            && let Json::String(name) = &val
        {
            self.current_typename = name.clone();
        }

        for frame in &self.frames {
            let Some(Some(path)) = frame.stack.last() else { continue };
            let Some(dest) = resolve_mut(root, path) else { continue };
            assign_json(dest, &val)?;
        }
        self.pop_frames();
        Ok(())
    }

    // ---- objects ---- //

    /// `{`: allocate absent optional tops, then discover fragment and
    /// embedded destinations breadth-first, adding a frame for each.
    fn object_start(&mut self, root: &mut Value) {
        self.push_state(b'{');

        let mut frontier: Vec<Path> = Vec::new();
        for frame in &self.frames {
            let Some(Some(path)) = frame.stack.last() else { continue };
            if let Some(Value::Nullable { present, .. }) = resolve_mut(root, path) {
                // Single-level allocation; the zero shape is already there.
                *present = true;
            }
            frontier.push(path.clone());
        }

        let mut i = 0;
        while i < frontier.len() {
            let path = frontier[i].clone();
            i += 1;
            let Some(cpath) = concrete_path(root, &path) else { continue };
            match resolve(root, &cpath) {
                Some(Value::Record(r)) => {
                    for (idx, f) in r.fields.iter().enumerate() {
                        let mut fpath = cpath.clone();
                        fpath.push(Seg::Field(idx));
                        let parsed = f.tag.as_deref().map(tag::parse);
                        if let Some(parsed) = parsed.filter(|p| p.is_fragment) {
                            self.frames.push(Frame {
                                stack: vec![Some(fpath.clone())],
                                fragment_type: parsed.type_name,
                            });
                            frontier.push(fpath);
                        } else if f.embedded {
                            self.frames.push(Frame {
                                stack: vec![Some(fpath.clone())],
                                fragment_type: String::new(),
                            });
                            frontier.push(fpath);
                        }
                    }
                }
                Some(Value::Pairs(pairs)) => {
                    for (idx, (k, _)) in pairs.iter().enumerate() {
                        let parsed = tag::parse(k);
                        if parsed.is_fragment {
                            let mut fpath = cpath.clone();
                            fpath.push(Seg::Pair(idx));
                            self.frames.push(Frame {
                                stack: vec![Some(fpath.clone())],
                                fragment_type: parsed.type_name,
                            });
                            frontier.push(fpath);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    // ---- arrays ---- //

    /// `[`: allocate absent optional tops and normalize every list
    /// destination to hold exactly one template element at index 0.
    fn array_start(&mut self, root: &mut Value) -> Result<()> {
        self.push_state(b'[');

        for frame in &self.frames {
            let Some(Some(path)) = frame.stack.last() else { continue };
            if let Some(Value::Nullable { present, .. }) = resolve_mut(root, path) {
                *present = true;
            }
            let Some(cpath) = concrete_path(root, path) else { continue };
            if let Some(Value::List { elem, items }) = resolve_mut(root, &cpath) {
                match items.len() {
                    0 => {
                        let zero = elem.zeroed();
                        items.push(zero);
                    }
                    1 => {}
                    n => return Err(Error::TemplateTooLong { got: n }),
                }
            }
        }
        Ok(())
    }

    /// A value inside an array: clone the template into a fresh element of
    /// every list destination and push the element as the new top.
    fn array_value(&mut self, root: &mut Value) -> Result<()> {
        let mut some_slice = false;
        for frame in &mut self.frames {
            let top = frame.stack.last().and_then(|p| p.clone());
            let mut push: Option<Path> = None;
            if let Some(path) = top
                && let Some(cpath) = concrete_path(root, &path)
                && let Some(Value::List { elem, items }) = resolve_mut(root, &cpath)
            {
                let template = items.first().cloned().unwrap_or_else(|| elem.zeroed());
                if matches!(template, Value::Map(_)) {
                    return Err(Error::MapTemplate);
                }
                items.push(template);
                let mut epath = cpath.clone();
                epath.push(Seg::Item(items.len() - 1));
                push = Some(epath);
                some_slice = true;
            }
            frame.stack.push(push);
        }
        if !some_slice {
            return Err(Error::NoSliceForArray { places: self.frames.len() });
        }
        Ok(())
    }

    /// `]`: drop the template element at index 0 of every list top.
    fn trim_templates(&mut self, root: &mut Value) {
        for frame in &self.frames {
            let Some(Some(path)) = frame.stack.last() else { continue };
            let Some(cpath) = concrete_path(root, path) else { continue };
            if let Some(Value::List { items, .. }) = resolve_mut(root, &cpath)
                && !items.is_empty()
            {
                items.remove(0);
            }
        }
    }

    // ---- bookkeeping ---- //

    /// Pop every frame's stack in lockstep, retiring frames that empty out.
    fn pop_frames(&mut self) {
        for frame in &mut self.frames {
            frame.stack.pop();
        }
        self.frames.retain(|f| !f.stack.is_empty());
    }

    fn push_state(&mut self, s: u8) {
        self.parse_state.push(s);
    }

    fn pop_state(&mut self) {
        self.parse_state.pop();
    }

    fn state(&self) -> Option<u8> {
        self.parse_state.last().copied()
    }
}

// ---- key matching ---- //

/// A record field matches `key` by self-reported name, then by tag (the alias
/// wins when present; fragments never match), and finally by ASCII
/// case-insensitive comparison with the host identifier.
fn field_index_by_wire_name(r: &Record, key: &str) -> Option<(usize, bool)> {
    r.fields
        .iter()
        .position(|f| field_matches(f, key))
        .map(|i| (i, r.fields[i].scalar))
}

fn field_matches(f: &Field, key: &str) -> bool {
    let mut named: Option<&str> = None;
    if introspect::declares_wire_type_name(&f.value) {
        named = introspect::wire_type_name(&f.value);
    }
    match named.or(f.tag.as_deref()) {
        Some(text) => key_has_wire_name(text, key),
        None => f.name.eq_ignore_ascii_case(key),
    }
}

fn pair_index_by_wire_name(pairs: &[(String, Value)], key: &str) -> Option<usize> {
    pairs.iter().position(|(k, _)| key_has_wire_name(k, key))
}

fn key_has_wire_name(text: &str, key: &str) -> bool {
    let parsed = tag::parse(text);
    if parsed.is_fragment {
        return false;
    }
    if !parsed.alias.is_empty() {
        return parsed.alias == key;
    }
    parsed.field_name == key
}

// ---- value conversion ---- //

fn conversion_error(val: &Json, dest: &Value) -> Error {
    let got = match val {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    };
    Error::Conversion { got: got.to_owned(), want: dest.kind().to_owned() }
}

/// Store a JSON value into a destination slot. `null` clears optional and
/// interface slots and is a no-op on other kinds; type mismatches are hard
/// errors. Whole subtrees land here too, via raw capture.
pub(crate) fn assign_json(dest: &mut Value, val: &Json) -> Result<()> {
    match dest {
        Value::Nullable { value, present } => {
            if val.is_null() {
                let zero = value.zeroed();
                **value = zero;
                *present = false;
                Ok(())
            } else {
                *present = true;
                assign_json(value, val)
            }
        }
        Value::Dynamic(held) => match held {
            Some(inner) => {
                if val.is_null() {
                    *held = None;
                    Ok(())
                } else {
                    assign_json(inner, val)
                }
            }
            None => {
                *held = infer_json(val);
                Ok(())
            }
        },
        Value::Typed { value, .. } => assign_json(value, val),
        Value::Wrapper(inner) => assign_json(inner, val),
        Value::Json(slot) => {
            *slot = val.clone();
            Ok(())
        }
        Value::Bool(b) => match val {
            Json::Bool(x) => {
                *b = *x;
                Ok(())
            }
            Json::Null => Ok(()),
            _ => Err(conversion_error(val, dest)),
        },
        Value::Int(i) => match val {
            Json::Number(n) if n.as_i64().is_some() => {
                *i = n.as_i64().unwrap_or_default();
                Ok(())
            }
            Json::Null => Ok(()),
            _ => Err(conversion_error(val, dest)),
        },
        Value::Uint(u) => match val {
            Json::Number(n) if n.as_u64().is_some() => {
                *u = n.as_u64().unwrap_or_default();
                Ok(())
            }
            Json::Null => Ok(()),
            _ => Err(conversion_error(val, dest)),
        },
        Value::Float(x) => match val {
            Json::Number(n) if n.as_f64().is_some() => {
                *x = n.as_f64().unwrap_or_default();
                Ok(())
            }
            Json::Null => Ok(()),
            _ => Err(conversion_error(val, dest)),
        },
        Value::Str(s) | Value::Id(s) | Value::Enum { value: s, .. } => match val {
            Json::String(x) => {
                *s = x.clone();
                Ok(())
            }
            Json::Null => Ok(()),
            _ => Err(conversion_error(val, dest)),
        },
        Value::Record(r) => match val {
            Json::Object(obj) => {
                for (k, v) in obj {
                    let Some(f) = r.fields.iter_mut().find(|f| json_field_matches(f, k))
                    else {
                        continue;
                    };
                    assign_json(&mut f.value, v)?;
                }
                Ok(())
            }
            Json::Null => Ok(()),
            _ => Err(conversion_error(val, dest)),
        },
        Value::List { elem, items } => match val {
            Json::Array(arr) => {
                let shape = elem.clone();
                let mut new_items = Vec::with_capacity(arr.len());
                for v in arr {
                    let mut item = shape.zeroed();
                    assign_json(&mut item, v)?;
                    new_items.push(item);
                }
                *items = new_items;
                Ok(())
            }
            Json::Null => {
                items.clear();
                Ok(())
            }
            _ => Err(conversion_error(val, dest)),
        },
        Value::Pairs(pairs) => match val {
            Json::Object(obj) => {
                for (k, v) in obj {
                    let Some((_, slot)) = pairs.iter_mut().find(|(pk, _)| pk == k) else {
                        continue;
                    };
                    assign_json(slot, v)?;
                }
                Ok(())
            }
            Json::Null => {
                pairs.clear();
                Ok(())
            }
            _ => Err(conversion_error(val, dest)),
        },
        Value::Map(map) => match val {
            Json::Object(obj) => {
                map.clear();
                for (k, v) in obj {
                    let mut slot = Value::Dynamic(None);
                    assign_json(&mut slot, v)?;
                    map.insert(k.clone(), slot);
                }
                Ok(())
            }
            Json::Null => {
                map.clear();
                Ok(())
            }
            _ => Err(conversion_error(val, dest)),
        },
    }
}

/// Raw-capture field matching: `json` annotation name first, host identifier
/// (case-insensitive) otherwise.
fn json_field_matches(f: &Field, key: &str) -> bool {
    match f.json.as_deref() {
        Some(tag) => {
            let name = tag.split(',').next().unwrap_or_default();
            !name.is_empty() && name != "-" && name == key
        }
        None => f.name.eq_ignore_ascii_case(key),
    }
}

/// Native inference for untyped interface slots: numbers come out as floats,
/// composites are kept raw.
fn infer_json(val: &Json) -> Option<Box<Value>> {
    match val {
        Json::Null => None,
        Json::Bool(b) => Some(Box::new(Value::Bool(*b))),
        Json::Number(n) => Some(Box::new(Value::Float(n.as_f64().unwrap_or_default()))),
        Json::String(s) => Some(Box::new(Value::Str(s.clone()))),
        Json::Object(_) | Json::Array(_) => Some(Box::new(Value::Json(val.clone()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use serde_json::json;

    fn rec(fields: Vec<Field>) -> Value {
        Value::Record(Record::new(fields))
    }

    fn s() -> Value {
        Value::Str(String::new())
    }

    fn str_field(name: &str) -> Field {
        Field::new(name, s())
    }

    fn get<'a>(v: &'a Value, name: &str) -> &'a Value {
        match v {
            Value::Record(r) => &r.field(name).expect(name).value,
            other => panic!("expected struct, got {}", other.kind()),
        }
    }

    fn items(v: &Value) -> &[Value] {
        match v {
            Value::List { items, .. } => items,
            other => panic!("expected slice, got {}", other.kind()),
        }
    }

    #[test]
    fn nested_scalars() {
        let mut q = rec(vec![Field::new(
            "Me",
            rec(vec![str_field("Name"), Field::new("Height", Value::Float(0.0))]),
        )]);
        decode(br#"{"me": {"name": "Luke Skywalker", "height": 1.72}}"#, &mut q).unwrap();
        let me = get(&q, "Me");
        assert_eq!(get(me, "Name"), &Value::Str("Luke Skywalker".into()));
        assert_eq!(get(me, "Height"), &Value::Float(1.72));
    }

    #[test]
    fn optional_set_and_cleared() {
        let mut q = rec(vec![Field::new("Name", Value::none_of(s()))]);
        decode(br#"{"name": "R2-D2"}"#, &mut q).unwrap();
        assert_eq!(get(&q, "Name"), &Value::some(Value::Str("R2-D2".into())));

        decode(br#"{"name": null}"#, &mut q).unwrap();
        assert_eq!(get(&q, "Name"), &Value::none_of(s()));
    }

    #[test]
    fn unknown_key_is_an_error() {
        let mut q = rec(vec![str_field("Name")]);
        let err = decode(br#"{"n": 1}"#, &mut q).unwrap_err();
        assert_eq!(
            err.to_string(),
            "struct field for \"n\" doesn't exist in any of 1 places to unmarshal"
        );
    }

    #[test]
    fn trailing_input_is_an_error() {
        let mut q = rec(vec![str_field("Name")]);
        let err = decode(b"{\"name\": \"x\"} {}", &mut q).unwrap_err();
        assert_eq!(err.to_string(), "invalid token '{' after top-level value");
    }

    #[test]
    fn key_matching_by_alias_and_case() {
        let mut q = rec(vec![
            Field::new("Node", s()).with_tag("node1: node(id: $id)"),
            str_field("AvatarUrl"),
        ]);
        decode(br#"{"node1": "a", "avatarURL": "b"}"#, &mut q).unwrap();
        assert_eq!(get(&q, "Node"), &Value::Str("a".into()));
        assert_eq!(get(&q, "AvatarUrl"), &Value::Str("b".into()));
    }

    fn timeline_query() -> Value {
        rec(vec![Field::new(
            "Timeline",
            Value::list_of(rec(vec![
                str_field("Typename").with_tag("__typename"),
                Field::new("ClosedEvent", rec(vec![str_field("CreatedAt")]))
                    .with_tag("... on ClosedEvent"),
                Field::new("ReopenedEvent", rec(vec![str_field("CreatedAt")]))
                    .with_tag("... on ReopenedEvent"),
            ])),
        )])
    }

    #[test]
    fn typename_selects_one_fragment() {
        let mut q = timeline_query();
        decode(
            br#"{"timeline": [{"__typename": "ClosedEvent", "createdAt": "2017-06-29"}]}"#,
            &mut q,
        )
        .unwrap();
        let item = &items(get(&q, "Timeline"))[0];
        assert_eq!(get(item, "Typename"), &Value::Str("ClosedEvent".into()));
        assert_eq!(
            get(get(item, "ClosedEvent"), "CreatedAt"),
            &Value::Str("2017-06-29".into())
        );
        // The non-matching fragment stays zero.
        assert_eq!(get(get(item, "ReopenedEvent"), "CreatedAt"), &s());
    }

    #[test]
    fn missing_typename_fills_all_fragments() {
        let mut q = timeline_query();
        decode(br#"{"timeline": [{"createdAt": "2017-06-29"}]}"#, &mut q).unwrap();
        let item = &items(get(&q, "Timeline"))[0];
        assert_eq!(
            get(get(item, "ClosedEvent"), "CreatedAt"),
            &Value::Str("2017-06-29".into())
        );
        assert_eq!(
            get(get(item, "ReopenedEvent"), "CreatedAt"),
            &Value::Str("2017-06-29".into())
        );
    }

    #[test]
    fn typename_selects_fragment_in_ordered_pairs() {
        let mut q = Value::Pairs(vec![
            ("__typename".into(), s()),
            (
                "... on ClosedEvent".into(),
                Value::Pairs(vec![("createdAt".into(), s())]),
            ),
            (
                "... on ReopenedEvent".into(),
                Value::Pairs(vec![("createdAt".into(), s())]),
            ),
        ]);
        decode(
            br#"{"__typename": "ClosedEvent", "createdAt": "2017-06-29"}"#,
            &mut q,
        )
        .unwrap();
        let Value::Pairs(pairs) = &q else { panic!() };
        assert_eq!(
            pairs[1].1,
            Value::Pairs(vec![("createdAt".into(), Value::Str("2017-06-29".into()))])
        );
        assert_eq!(pairs[2].1, Value::Pairs(vec![("createdAt".into(), s())]));
    }

    #[test]
    fn array_inside_fragment() {
        let mut q = rec(vec![Field::new(
            "Search",
            rec(vec![
                str_field("Typename").with_tag("__typename"),
                Field::new(
                    "OnRepository",
                    rec(vec![Field::new(
                        "Releases",
                        rec(vec![Field::new(
                            "Nodes",
                            Value::list_of(rec(vec![str_field("TagName")])),
                        )]),
                    )]),
                )
                .with_tag("... on Repository"),
            ]),
        )]);
        decode(
            br#"{"search": {"__typename": "Repository", "releases": {"nodes": [{"tagName": "v1.0"}, {"tagName": "v1.1"}]}}}"#,
            &mut q,
        )
        .unwrap();
        let nodes = items(get(get(get(get(&q, "Search"), "OnRepository"), "Releases"), "Nodes"));
        assert_eq!(nodes.len(), 2);
        assert_eq!(get(&nodes[0], "TagName"), &Value::Str("v1.0".into()));
        assert_eq!(get(&nodes[1], "TagName"), &Value::Str("v1.1".into()));
    }

    #[test]
    fn embedded_record_shares_keys() {
        let mut q = rec(vec![
            Field::new("EventBase", rec(vec![str_field("CreatedAt")])).embedded(),
            str_field("Body"),
        ]);
        decode(br#"{"createdAt": "c", "body": "b"}"#, &mut q).unwrap();
        assert_eq!(get(get(&q, "EventBase"), "CreatedAt"), &Value::Str("c".into()));
        assert_eq!(get(&q, "Body"), &Value::Str("b".into()));
    }

    #[test]
    fn arrays_of_scalars_empty_and_null() {
        let mut q = rec(vec![
            Field::new("Foo", Value::list_of(s())),
            Field::new("Bar", Value::list_of(s())),
            Field::new("Baz", Value::list_of(s())),
        ]);
        decode(br#"{"foo": ["bar", "baz"], "bar": [], "baz": null}"#, &mut q).unwrap();
        assert_eq!(
            items(get(&q, "Foo")),
            &[Value::Str("bar".into()), Value::Str("baz".into())]
        );
        assert_eq!(items(get(&q, "Bar")), &[] as &[Value]);
        assert_eq!(items(get(&q, "Baz")), &[] as &[Value]);
    }

    #[test]
    fn existing_item_acts_as_template_and_is_trimmed() {
        let mut q = rec(vec![Field::new(
            "Strings",
            Value::list(s(), vec![Value::Str("initial".into())]),
        )]);
        decode(br#"{"strings": ["bar", "baz"]}"#, &mut q).unwrap();
        assert_eq!(
            items(get(&q, "Strings")),
            &[Value::Str("bar".into()), Value::Str("baz".into())]
        );
    }

    #[test]
    fn oversized_template_is_an_error() {
        let mut q = rec(vec![Field::new("Strings", Value::list(s(), vec![s(), s()]))]);
        let err = decode(br#"{"strings": ["x"]}"#, &mut q).unwrap_err();
        assert_eq!(err.to_string(), "template slice can only have 1 item, got 2");
    }

    #[test]
    fn array_into_non_slice_is_an_error() {
        let mut q = rec(vec![Field::new("A", Value::Int(0))]);
        let err = decode(br#"{"a": [1]}"#, &mut q).unwrap_err();
        assert_eq!(
            err.to_string(),
            "slice doesn't exist in any of 1 places to unmarshal"
        );
    }

    #[test]
    fn ordered_pairs_fill_in_place() {
        let mut q = Value::Pairs(vec![("foo".into(), s())]);
        decode(br#"{"foo": "bar"}"#, &mut q).unwrap();
        assert_eq!(q, Value::Pairs(vec![("foo".into(), Value::Str("bar".into()))]));
    }

    #[test]
    fn ordered_pairs_template_cloned_per_element() {
        let template = Value::Pairs(vec![("foo".into(), s())]);
        let mut q = rec(vec![Field::new(
            "Rows",
            Value::list(template.clone(), vec![template]),
        )]);
        decode(br#"{"rows": [{"foo": "a"}, {"foo": "b"}]}"#, &mut q).unwrap();
        assert_eq!(
            items(get(&q, "Rows")),
            &[
                Value::Pairs(vec![("foo".into(), Value::Str("a".into()))]),
                Value::Pairs(vec![("foo".into(), Value::Str("b".into()))]),
            ]
        );
    }

    #[test]
    fn raw_destination_captures_subtree() {
        let mut q = rec(vec![Field::new("Data", Value::Json(Json::Null))]);
        decode(br#"{"Data": {"foo": "bar"}}"#, &mut q).unwrap();
        assert_eq!(get(&q, "Data"), &Value::Json(json!({"foo": "bar"})));
    }

    #[test]
    fn scalar_tag_captures_whole_subtrees() {
        let mut q = rec(vec![
            Field::new("Data", Value::Json(Json::Null)).scalar(),
            Field::new("Tags", Value::Map(IndexMap::new())).scalar(),
        ]);
        decode(
            br#"{"data": {"a": [1, 2]}, "tags": {"count": 3}}"#,
            &mut q,
        )
        .unwrap();
        assert_eq!(get(&q, "Data"), &Value::Json(json!({"a": [1, 2]})));
        let Value::Map(tags) = get(&q, "Tags") else { panic!() };
        assert_eq!(
            tags.get("count"),
            Some(&Value::Dynamic(Some(Box::new(Value::Float(3.0)))))
        );
    }

    #[test]
    fn wrapper_receives_through_its_slot() {
        let inner = rec(vec![
            str_field("Value1"),
            Field::new(
                "Value2",
                rec(vec![str_field("Type"), Field::new("Id", Value::Int(0))]),
            ),
        ]);
        let mut q = rec(vec![Field::new(
            "Testcontainer",
            rec(vec![Field::new(
                "Wrapper",
                Value::Typed {
                    name: "wrapper".into(),
                    value: Box::new(Value::Wrapper(Box::new(inner))),
                },
            )]),
        )]);
        decode(
            br#"{"testcontainer": {"wrapper": {"value1": "a", "value2": {"type": "t", "id": 2}}}}"#,
            &mut q,
        )
        .unwrap();
        let Value::Typed { value, .. } = get(get(&q, "Testcontainer"), "Wrapper") else {
            panic!()
        };
        let Value::Wrapper(inner) = value.as_ref() else { panic!() };
        assert_eq!(get(inner, "Value1"), &Value::Str("a".into()));
        assert_eq!(get(get(inner, "Value2"), "Id"), &Value::Int(2));
    }

    #[test]
    fn untyped_interface_infers_natively() {
        let mut q = rec(vec![Field::new("Anything", Value::Dynamic(None))]);
        decode(br#"{"anything": 42}"#, &mut q).unwrap();
        assert_eq!(
            get(&q, "Anything"),
            &Value::Dynamic(Some(Box::new(Value::Float(42.0))))
        );
    }

    #[test]
    fn type_mismatch_is_an_error() {
        let mut q = rec(vec![Field::new("Age", Value::Int(0))]);
        let err = decode(br#"{"age": "old"}"#, &mut q).unwrap_err();
        assert_eq!(err.to_string(), "cannot convert string into int value");
    }

    #[test]
    fn scalar_root() {
        let mut v = Value::Int(0);
        decode(b"42", &mut v).unwrap();
        assert_eq!(v, Value::Int(42));
    }

    #[test]
    fn redecoding_resets_list_contents() {
        let mut q = rec(vec![Field::new("Foo", Value::list_of(s()))]);
        decode(br#"{"foo": ["a", "b", "c"]}"#, &mut q).unwrap();
        assert_eq!(items(get(&q, "Foo")).len(), 3);
        let err = decode(br#"{"foo": ["d"]}"#, &mut q).unwrap_err();
        // A previously filled list is an oversized template on re-decode.
        assert_eq!(err.to_string(), "template slice can only have 1 item, got 3");
    }
}
