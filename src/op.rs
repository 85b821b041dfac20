//! Operation assembly.
//!
//! Glues the selection writer and the argument writer into a full operation
//! string: `<type> <name>(<args>)<directives><selection>`. A bare query with
//! no variables, name or directives stays `{...}`; mutations and
//! subscriptions always carry their operation type.

use crate::args::write_arguments;
use crate::error::Result;
use crate::value::{Value, Variables};
use crate::write::write_selection;

/// Per-operation options: at most one name, any number of directives.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationOption {
    Name(String),
    Directive(String),
}

impl OperationOption {
    pub fn name(s: impl Into<String>) -> Self {
        OperationOption::Name(s.into())
    }

    pub fn directive(s: impl Into<String>) -> Self {
        OperationOption::Directive(s.into())
    }
}

struct Options {
    name: String,
    directives: Vec<String>,
}

impl Options {
    fn collect(options: &[OperationOption]) -> Options {
        let mut out = Options { name: String::new(), directives: Vec::new() };
        for opt in options {
            match opt {
                OperationOption::Name(n) => out.name = n.clone(),
                OperationOption::Directive(d) => out.directives.push(d.clone()),
            }
        }
        out
    }

    /// Space-joined and space-padded, or empty.
    fn directives_string(&self) -> String {
        if self.directives.is_empty() {
            String::new()
        } else {
            format!(" {} ", self.directives.join(" "))
        }
    }
}

fn construct_operation(
    operation_type: &str,
    v: &Value,
    variables: Option<&Variables>,
    include_type_in_default: bool,
    options: &[OperationOption],
) -> Result<String> {
    let selection = write_selection(v)?;
    let opts = Options::collect(options);
    tracing::trace!(operation_type, selection = %selection, "constructing operation");

    if let Some(vars) = variables.filter(|v| !v.is_empty()) {
        return Ok(format!(
            "{} {}({}){}{}",
            operation_type,
            opts.name,
            write_arguments(vars),
            opts.directives_string(),
            selection,
        ));
    }

    if opts.name.is_empty() && opts.directives.is_empty() {
        if include_type_in_default {
            return Ok(format!("{operation_type}{selection}"));
        }
        return Ok(selection);
    }

    Ok(format!(
        "{} {}{}{}",
        operation_type,
        opts.name,
        opts.directives_string(),
        selection,
    ))
}

pub fn construct_query(
    v: &Value,
    variables: Option<&Variables>,
    options: &[OperationOption],
) -> Result<String> {
    construct_operation("query", v, variables, false, options)
}

pub fn construct_mutation(
    v: &Value,
    variables: Option<&Variables>,
    options: &[OperationOption],
) -> Result<String> {
    construct_operation("mutation", v, variables, true, options)
}

pub fn construct_subscription(
    v: &Value,
    variables: Option<&Variables>,
    options: &[OperationOption],
) -> Result<String> {
    construct_operation("subscription", v, variables, true, options)
}
