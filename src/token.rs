//! JSON token source for the decoder.
//!
//! The response body is parsed into a `serde_json::Value` once (one top-level
//! value; anything after it is the trailing-token error), then flattened
//! lazily into a token walk. Object keys come out as `Str` tokens between
//! `ObjectStart`/`ObjectEnd`, matching the shape of a streaming tokenizer.
//! `next_raw` hands over the next value unflattened, for raw-capture
//! destinations. `preserve_order` keeps object keys in wire order.

use std::fmt;

use serde_json::Value as Json;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    ObjectStart,
    ObjectEnd,
    ArrayStart,
    ArrayEnd,
    Str(String),
    Num(serde_json::Number),
    Bool(bool),
    Null,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::ObjectStart => f.write_str("{"),
            Token::ObjectEnd => f.write_str("}"),
            Token::ArrayStart => f.write_str("["),
            Token::ArrayEnd => f.write_str("]"),
            Token::Str(s) => write!(f, "{s:?}"),
            Token::Num(n) => write!(f, "{n}"),
            Token::Bool(b) => write!(f, "{b}"),
            Token::Null => f.write_str("null"),
        }
    }
}

/// Parse exactly one JSON value from `data`. A second value is an error
/// naming the offending token; a syntactically broken tail surfaces as the
/// underlying parse error.
pub fn parse_single(data: &[u8]) -> Result<Json> {
    let mut stream = serde_json::Deserializer::from_slice(data).into_iter::<Json>();
    let first = match stream.next() {
        Some(v) => v?,
        None => return Err(Error::UnexpectedEnd),
    };
    match stream.next() {
        None => Ok(first),
        Some(Ok(extra)) => Err(Error::TrailingToken {
            token: token_preview(&extra),
        }),
        Some(Err(e)) => Err(Error::Json(e)),
    }
}

fn token_preview(v: &Json) -> String {
    match v {
        Json::Object(_) => "{".to_owned(),
        Json::Array(_) => "[".to_owned(),
        other => other.to_string(),
    }
}

enum Pending<'a> {
    Value(&'a Json),
    Object(serde_json::map::Iter<'a>),
    Array(std::slice::Iter<'a, Json>),
}

/// Lazy tokenizer over a parsed tree.
pub struct TokenSource<'a> {
    pending: Vec<Pending<'a>>,
}

impl<'a> TokenSource<'a> {
    pub fn new(root: &'a Json) -> Self {
        TokenSource { pending: vec![Pending::Value(root)] }
    }

    /// Next token, or `None` at end of input.
    pub fn next(&mut self) -> Option<Token> {
        loop {
            match self.pending.pop()? {
                Pending::Value(v) => {
                    return Some(match v {
                        Json::Null => Token::Null,
                        Json::Bool(b) => Token::Bool(*b),
                        Json::Number(n) => Token::Num(n.clone()),
                        Json::String(s) => Token::Str(s.clone()),
                        Json::Object(m) => {
                            self.pending.push(Pending::Object(m.iter()));
                            Token::ObjectStart
                        }
                        Json::Array(a) => {
                            self.pending.push(Pending::Array(a.iter()));
                            Token::ArrayStart
                        }
                    });
                }
                Pending::Object(mut it) => match it.next() {
                    Some((k, v)) => {
                        self.pending.push(Pending::Object(it));
                        self.pending.push(Pending::Value(v));
                        return Some(Token::Str(k.clone()));
                    }
                    None => return Some(Token::ObjectEnd),
                },
                Pending::Array(mut it) => match it.next() {
                    Some(v) => {
                        self.pending.push(Pending::Array(it));
                        self.pending.push(Pending::Value(v));
                        // Element tokens follow on the next call.
                    }
                    None => return Some(Token::ArrayEnd),
                },
            }
        }
    }

    /// Hand over the next value whole, without flattening it. Only valid
    /// where a value is due (right after a key, or at an array element).
    pub fn next_raw(&mut self) -> Result<Json> {
        match self.pending.pop() {
            Some(Pending::Value(v)) => Ok(v.clone()),
            Some(other) => {
                self.pending.push(other);
                Err(Error::UnexpectedToken {
                    token: "<structure>".to_owned(),
                    at: "raw capture".to_owned(),
                })
            }
            None => Err(Error::UnexpectedEnd),
        }
    }
}
