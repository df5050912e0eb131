//! Identifier formatting: case conversion and reserved-word escaping.

use once_cell::sync::Lazy;
use regex::Regex;

static NON_IDENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z0-9]+").unwrap());
static SEPARATED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-_]+([a-zA-Z])").unwrap());
static IDENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

const RESERVED_TYPES: &[&str] = &[
    "Type",
    "Protocol",
    "Class",
    "Enum",
    "Struct",
    "Extension",
    "Self",
    "Any",
];

const RESERVED_FIELDS: &[&str] = &[
    "Any", "Protocol", "Self", "Type", "as", "associatedtype", "await", "break",
    "case", "catch", "class", "continue", "default", "defer", "deinit", "do", "else", "enum",
    "extension", "fallthrough", "false", "fileprivate", "for", "func", "guard", "if", "import",
    "in", "init", "inout", "internal", "is", "let", "nil", "operator", "precedencegroup",
    "private", "protocol", "public", "repeat", "rethrows", "return", "self", "static", "struct",
    "subscript", "super", "switch", "throw", "throws", "true", "try", "typealias", "var",
    "where", "while",
];

/// `snake_case` / `kebab-case` → `camelCase`; everything else is left alone.
pub fn camelize(name: &str) -> String {
    let cleaned = NON_IDENT.replace_all(name, "_");
    SEPARATED
        .replace_all(&cleaned, |caps: &regex::Captures| caps[1].to_uppercase())
        .into_owned()
}

fn escape_leading_digit(name: String) -> String {
    match name.chars().next() {
        None => "_".to_string(),
        Some(c) if c.is_ascii_digit() => format!("_{name}"),
        Some(_) => name,
    }
}

/// Name for a struct, enum or class.
pub fn type_name(name: &str) -> String {
    let camel = camelize(name);
    let mut chars = camel.chars();
    let capitalized = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => String::new(),
    };
    let capitalized = escape_leading_digit(capitalized);
    if RESERVED_TYPES.contains(&capitalized.as_str()) {
        format!("_{capitalized}")
    } else {
        capitalized
    }
}

/// Name for a property, method, or enum case.
pub fn field_name(name: &str) -> String {
    let camel = escape_leading_digit(camelize(name));
    if RESERVED_FIELDS.contains(&camel.as_str()) {
        format!("_{camel}")
    } else {
        camel
    }
}

/// Property name for a union alternative whose type is `signature`.
/// `None` when the signature is not a plain identifier (`[Int]`, `Set<String>`).
pub fn alternative_name(signature: &str) -> Option<String> {
    if !IDENT.is_match(signature) {
        return None;
    }
    let mut chars = signature.chars();
    let lowered = match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect::<String>(),
        None => return None,
    };
    Some(field_name(&lowered))
}

/// Swift string literal, quotes included.
pub fn string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Doc comment lines for a description, one `///` per line.
pub fn doc_comment(description: &str) -> String {
    description
        .lines()
        .map(|line| format!("/// {}\n", line.trim_end()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_names_are_camel_cased_and_capitalized() {
        assert_eq!(type_name("hello"), "Hello");
        assert_eq!(type_name("helloInput"), "HelloInput");
        assert_eq!(type_name("full_name"), "FullName");
        assert_eq!(type_name("child-router"), "ChildRouter");
        assert_eq!(type_name("my.type"), "MyType");
    }

    #[test]
    fn reserved_type_names_are_escaped() {
        assert_eq!(type_name("type"), "_Type");
        assert_eq!(type_name("Self"), "_Self");
        assert_eq!(type_name("Types"), "Types");
    }

    #[test]
    fn field_names_keep_their_first_letter() {
        assert_eq!(field_name("fullName"), "fullName");
        assert_eq!(field_name("full_name"), "fullName");
        assert_eq!(field_name("in-progress"), "inProgress");
        assert_eq!(field_name("hello world"), "helloWorld");
        assert_eq!(field_name("ID"), "ID");
    }

    #[test]
    fn reserved_field_names_are_escaped() {
        assert_eq!(field_name("default"), "_default");
        assert_eq!(field_name("internal"), "_internal");
        assert_eq!(field_name("self"), "_self");
        assert_eq!(field_name("selfie"), "selfie");
        assert_eq!(field_name("as"), "_as");
        assert_eq!(field_name("await"), "_await");
        assert_eq!(field_name("Self"), "_Self");
        assert_eq!(field_name("Type"), "_Type");
        assert_eq!(field_name("Any"), "_Any");
        assert_eq!(field_name("Protocol"), "_Protocol");
        assert_eq!(field_name("assets"), "assets");
    }

    #[test]
    fn leading_digits_are_escaped() {
        assert_eq!(field_name("1st"), "_1st");
        assert_eq!(type_name("2fa"), "_2fa");
        assert_eq!(field_name(""), "_");
    }

    #[test]
    fn alternative_names() {
        assert_eq!(alternative_name("String").as_deref(), Some("string"));
        assert_eq!(alternative_name("Weird").as_deref(), Some("weird"));
        assert_eq!(alternative_name("[Int]"), None);
        assert_eq!(alternative_name("Set<String>"), None);
    }

    #[test]
    fn string_literals_are_escaped() {
        assert_eq!(string_literal("plain"), "\"plain\"");
        assert_eq!(string_literal("a\"b\\c"), "\"a\\\"b\\\\c\"");
    }

    #[test]
    fn doc_comments_cover_each_line() {
        assert_eq!(doc_comment("A person"), "/// A person\n");
        assert_eq!(doc_comment("one\ntwo"), "/// one\n/// two\n");
    }
}
