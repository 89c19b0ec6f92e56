//! Resource formulas are opaque text; this module only finds and rewrites
//! the resource ids they mention.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// An identifier, optionally followed by `(` when it is a function call.
static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Za-z_][A-Za-z0-9_]*)(\s*\()?").unwrap());

/// Identifiers a formula refers to, skipping function names such as `MAX(`.
pub fn references(formula: &str) -> Vec<&str> {
    let mut refs: Vec<&str> = Vec::new();
    for caps in IDENTIFIER.captures_iter(formula) {
        if caps.get(2).is_some() {
            continue;
        }
        if let Some(m) = caps.get(1) {
            if !refs.contains(&m.as_str()) {
                refs.push(m.as_str());
            }
        }
    }
    refs
}

/// Replace whole-identifier references for which `lookup` returns a value.
///
/// Unlike plain string replacement, `be` never matches inside `bed`.
pub fn substitute<F>(formula: &str, mut lookup: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    IDENTIFIER
        .replace_all(formula, |caps: &Captures<'_>| {
            let whole = caps.get(0).map_or("", |m| m.as_str());
            if caps.get(2).is_some() {
                return whole.to_string();
            }
            let ident = caps.get(1).map_or("", |m| m.as_str());
            lookup(ident).unwrap_or_else(|| whole.to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_references() {
        assert_eq!(references("(be+fe)*0.3"), vec!["be", "fe"]);
        assert_eq!(references("fe*0.33"), vec!["fe"]);
        assert_eq!(references("MAX(be, fe) + be"), vec!["be", "fe"]);
        assert_eq!(references("1e5 * qa_lead"), vec!["qa_lead"]);
        assert!(references("42").is_empty());
    }

    #[test]
    fn test_substitute_whole_identifiers() {
        let out = substitute("(be+bed)*0.3", |id| {
            (id == "be").then(|| "SUM(A1:A3)".to_string())
        });
        assert_eq!(out, "(SUM(A1:A3)+bed)*0.3");
    }

    #[test]
    fn test_substitute_keeps_function_calls() {
        let out = substitute("ROUND(be,0)", |id| Some(format!("<{id}>")));
        assert_eq!(out, "ROUND(<be>,0)");
    }
}
