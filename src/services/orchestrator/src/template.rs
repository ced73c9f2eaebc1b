//! Template Engine Module
//!
//! Recursive `{{name}}` placeholder substitution over JSON parameter
//! trees. Placeholder names may be dotted paths (`{{step1.field.0}}`)
//! that traverse into prior step results. Unknown placeholders are left
//! unchanged, and substituted values are never re-expanded, so
//! substitution is idempotent for placeholder-free substitution values.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z0-9_][A-Za-z0-9_.\-]*)\s*\}\}").expect("placeholder regex")
});

/// Substitution scope: step results and workflow inputs keyed by name
pub type Scope = HashMap<String, Value>;

/// Apply the scope to a parameter tree, returning the resolved tree
pub fn resolve(value: &Value, scope: &Scope) -> Value {
    match value {
        Value::String(s) => resolve_string(s, scope),
        Value::Array(items) => Value::Array(items.iter().map(|v| resolve(v, scope)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), resolve(v, scope)))
                .collect(),
        ),
        _ => value.clone(),
    }
}

/// Resolve a condition template to a boolean
///
/// Truthiness follows the JSON value: `false`, `null`, `0`, `""`, the
/// literal string `"false"`, and an unresolved placeholder are falsy;
/// everything else is truthy.
pub fn evaluate_condition(condition: &str, scope: &Scope) -> bool {
    match resolve_string(condition, scope) {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => {
            !s.is_empty() && s != "false" && s != "0" && !PLACEHOLDER.is_match(&s)
        }
        Value::Array(_) | Value::Object(_) => true,
    }
}

// A string that is exactly one placeholder resolves to the referenced
// value with its type preserved; embedded placeholders stringify.
fn resolve_string(s: &str, scope: &Scope) -> Value {
    if let Some(caps) = PLACEHOLDER.captures(s) {
        let whole = caps.get(0).map(|m| m.as_str() == s).unwrap_or(false);
        if whole {
            return match lookup(scope, &caps[1]) {
                Some(value) => value.clone(),
                None => Value::String(s.to_string()),
            };
        }
    }

    let replaced = PLACEHOLDER.replace_all(s, |caps: &regex::Captures<'_>| {
        match lookup(scope, &caps[1]) {
            Some(value) => scalar_text(value),
            None => caps[0].to_string(),
        }
    });
    Value::String(replaced.into_owned())
}

// Dotted-path lookup: the first segment keys into the scope, the rest
// traverse object fields and array indices.
fn lookup<'a>(scope: &'a Scope, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = scope.get(segments.next()?)?;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn scope(pairs: &[(&str, Value)]) -> Scope {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn substitutes_recursively() {
        let tree = json!({
            "query": "{{topic}}",
            "nested": {"items": ["{{topic}}", "static"]},
            "count": 3
        });
        let resolved = resolve(&tree, &scope(&[("topic", json!("rust"))]));
        assert_eq!(
            resolved,
            json!({
                "query": "rust",
                "nested": {"items": ["rust", "static"]},
                "count": 3
            })
        );
    }

    #[test]
    fn whole_placeholder_preserves_value_type() {
        let tree = json!({"limit": "{{max}}", "flags": "{{opts}}"});
        let s = scope(&[("max", json!(42)), ("opts", json!({"deep": true}))]);
        let resolved = resolve(&tree, &s);
        assert_eq!(resolved, json!({"limit": 42, "flags": {"deep": true}}));
    }

    #[test]
    fn embedded_placeholder_stringifies() {
        let tree = json!("page {{n}} of {{total}}");
        let resolved = resolve(&tree, &scope(&[("n", json!(2)), ("total", json!(9))]));
        assert_eq!(resolved, json!("page 2 of 9"));
    }

    #[test]
    fn unknown_placeholder_left_unchanged() {
        let tree = json!({"q": "{{missing}}"});
        let resolved = resolve(&tree, &scope(&[]));
        assert_eq!(resolved, json!({"q": "{{missing}}"}));
    }

    #[test]
    fn dotted_paths_traverse_results() {
        let s = scope(&[("fetch", json!({"body": {"ids": [7, 8]}}))]);
        assert_eq!(resolve(&json!("{{fetch.body.ids.1}}"), &s), json!(8));
    }

    #[test]
    fn substitution_is_idempotent() {
        let tree = json!({"a": "{{x}}", "b": ["{{y}} tail", "{{gone}}"]});
        let s = scope(&[("x", json!("one")), ("y", json!(2))]);
        let once = resolve(&tree, &s);
        let twice = resolve(&once, &s);
        assert_eq!(once, twice);
    }

    #[test]
    fn condition_truthiness() {
        let s = scope(&[
            ("yes", json!(true)),
            ("no", json!(false)),
            ("zero", json!(0)),
            ("name", json!("ok")),
            ("empty", json!("")),
        ]);
        assert!(evaluate_condition("{{yes}}", &s));
        assert!(!evaluate_condition("{{no}}", &s));
        assert!(!evaluate_condition("{{zero}}", &s));
        assert!(evaluate_condition("{{name}}", &s));
        assert!(!evaluate_condition("{{empty}}", &s));
        assert!(!evaluate_condition("{{unknown}}", &s));
        assert!(evaluate_condition("true", &s));
        assert!(!evaluate_condition("false", &s));
    }
}
