//! Field-annotation grammar.
//!
//! A field's wire annotation packs name, alias, arguments and fragment
//! markers into one string:
//!
//!   - `name`                      -> field `name`
//!   - `height(unit: METER)`      -> field `height`, arguments kept verbatim
//!   - `node1: node(id: $id)`     -> alias `node1`, field `node`
//!   - `...` / `... on Droid`     -> inline fragment, optional type condition
//!   - `-`                        -> skip this field entirely
//!
//! Parsing never fails; malformed input degrades to a plain field name.

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedTag {
    /// Wire field name (after the alias, if any). `-` means skip.
    pub field_name: String,
    /// Content between the first `(` and the last `)`, verbatim.
    pub arguments: String,
    /// Alias, the part before the first `:` of the field part.
    pub alias: String,
    pub is_fragment: bool,
    /// Type condition for `... on TypeName` fragments.
    pub type_name: String,
}

pub fn parse(tag: &str) -> ParsedTag {
    let tag = tag.trim();
    let mut parsed = ParsedTag::default();

    if tag.is_empty() {
        return parsed;
    }
    if tag == "-" {
        parsed.field_name = "-".into();
        return parsed;
    }

    if let Some(rest) = tag.strip_prefix("...") {
        parsed.is_fragment = true;
        let rest = rest.trim();
        if let Some(ty) = rest.strip_prefix("on ") {
            parsed.type_name = ty.trim().to_owned();
        }
        return parsed;
    }

    // Arguments first: everything between the first `(` and the last `)`.
    let field_part = match tag.find('(') {
        Some(open) => {
            if let Some(close) = tag.rfind(')')
                && close > open
            {
                parsed.arguments = tag[open + 1..close].to_owned();
            }
            tag[..open].trim()
        }
        None => tag,
    };

    match field_part.find(':') {
        Some(colon) => {
            parsed.alias = field_part[..colon].trim().to_owned();
            parsed.field_name = field_part[colon + 1..].trim().to_owned();
        }
        None => parsed.field_name = field_part.trim().to_owned(),
    }

    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_name() {
        assert_eq!(parse("name").field_name, "name");
    }

    #[test]
    fn name_with_arguments() {
        let p = parse("height(unit: METER)");
        assert_eq!(p.field_name, "height");
        assert_eq!(p.arguments, "unit: METER");
        assert!(p.alias.is_empty());
    }

    #[test]
    fn alias_and_arguments() {
        let p = parse("node1: node(id: $id)");
        assert_eq!(p.alias, "node1");
        assert_eq!(p.field_name, "node");
        assert_eq!(p.arguments, "id: $id");
    }

    #[test]
    fn fragment_forms() {
        let bare = parse("...");
        assert!(bare.is_fragment);
        assert!(bare.type_name.is_empty());

        let on = parse("... on Droid");
        assert!(on.is_fragment);
        assert_eq!(on.type_name, "Droid");
    }

    #[test]
    fn skip_and_empty() {
        assert_eq!(parse("-").field_name, "-");
        assert_eq!(parse(""), ParsedTag::default());
        assert_eq!(parse("   "), ParsedTag::default());
    }

    #[test]
    fn nested_parens_kept_verbatim() {
        let p = parse("search(filter: {name: (odd)})");
        assert_eq!(p.field_name, "search");
        assert_eq!(p.arguments, "filter: {name: (odd)}");
    }

    #[test]
    fn whitespace_trimmed_around_parts() {
        let p = parse("  alias :  field ( a: 1 ) ");
        assert_eq!(p.alias, "alias");
        assert_eq!(p.field_name, "field");
        assert_eq!(p.arguments, " a: 1 ");
    }
}
