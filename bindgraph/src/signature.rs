//! Helpers for textual type signatures such as `Vec<app::Person>` or `u8[]`.
//!
//! Signatures are rendered without whitespace between generic arguments by the
//! symbol providers, but the helpers here tolerate spaces anyway.

use indexmap::IndexSet;

/// Component type of an array signature (`Foo[]` -> `Foo`).
pub fn array_component(signature: &str) -> Option<&str> {
    signature.trim().strip_suffix("[]").map(str::trim)
}

/// Split `Raw<Args>` into the raw name and the text between the first `<`
/// and the last `>`.
pub fn generic_split(signature: &str) -> Option<(&str, &str)> {
    let open = signature.find('<')?;
    let close = signature.rfind('>')?;
    if close <= open {
        return None;
    }
    Some((signature[..open].trim(), signature[open + 1..close].trim()))
}

/// Signature without generic arguments or array suffixes.
pub fn raw_name(signature: &str) -> &str {
    let mut current = signature.trim();
    while let Some(component) = array_component(current) {
        current = component;
    }
    match current.find('<') {
        Some(open) => current[..open].trim(),
        None => current,
    }
}

/// Split a generic argument list on commas that are not nested in brackets.
pub fn split_top_level(arguments: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in arguments.char_indices() {
        match c {
            '<' | '(' | '[' => depth += 1,
            '>' | ')' | ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(arguments[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    let last = arguments[start..].trim();
    if !last.is_empty() {
        parts.push(last);
    }
    parts
}

/// Every type name mentioned inside a generic argument list.
///
/// Nested generic arguments contribute their raw name followed by their own
/// arguments, array arguments contribute their component type.
pub fn flatten_arguments(arguments: &str) -> IndexSet<String> {
    let mut found = IndexSet::new();
    collect_parts(arguments, &mut found);
    found
}

fn collect_parts(arguments: &str, found: &mut IndexSet<String>) {
    for part in split_top_level(arguments) {
        let mut part = part;
        while let Some(component) = array_component(part) {
            part = component;
        }
        match generic_split(part) {
            Some((raw, nested)) => {
                found.insert(raw.to_string());
                collect_parts(nested, found);
            }
            None => {
                found.insert(part.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_component() {
        assert_eq!(array_component("u8[]"), Some("u8"));
        assert_eq!(array_component("Vec<u8>[]"), Some("Vec<u8>"));
        assert_eq!(array_component("Vec<u8>"), None);
    }

    #[test]
    fn test_generic_split() {
        assert_eq!(
            generic_split("HashMap<String,Vec<app::Item>>"),
            Some(("HashMap", "String,Vec<app::Item>"))
        );
        assert_eq!(generic_split("String"), None);
    }

    #[test]
    fn test_raw_name() {
        assert_eq!(raw_name("Vec<Option<u8>>"), "Vec");
        assert_eq!(raw_name("app::Item[][]"), "app::Item");
        assert_eq!(raw_name("Vec<u8>[]"), "Vec");
        assert_eq!(raw_name("u32"), "u32");
    }

    #[test]
    fn test_split_top_level() {
        assert_eq!(
            split_top_level("String, HashMap<u8,(u8, u16)>, u8[]"),
            vec!["String", "HashMap<u8,(u8, u16)>", "u8[]"]
        );
        assert!(split_top_level("").is_empty());
    }

    #[test]
    fn test_flatten_arguments() {
        let parts = flatten_arguments("String,Vec<Option<app::Item>>,app::Tag[]");
        let parts: Vec<_> = parts.iter().map(String::as_str).collect();
        assert_eq!(parts, vec!["String", "Vec", "Option", "app::Item", "app::Tag"]);
    }
}
