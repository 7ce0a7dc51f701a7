//! Variable resolution and `{{path}}` templating.
//!
//! Resolution order: active iteration variable in the innermost iterate
//! scope, then the flat variable store (which holds both `context`-node
//! variables and aliased node results — see DESIGN.md), then
//! `{{env:NAME}}`. Unresolved references are left as literal `{{...}}`
//! text so missing-variable conditions surface to the Director instead
//! of silently vanishing.

use director_core::variable::iteration_key;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;

fn template_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s*([^{}]+?)\s*\}\}").unwrap())
}

/// Resolves `{{path}}` references against a flat variable map and an
/// iteration scope stack.
pub struct VariableResolver {
    variables: HashMap<String, Value>,
    iteration_stack: Vec<(i64, usize)>,
}

impl VariableResolver {
    pub fn new(variables: HashMap<String, Value>) -> Self {
        Self { variables, iteration_stack: Vec::new() }
    }

    pub fn push_iteration(&mut self, position: i64, index: usize) {
        self.iteration_stack.push((position, index));
    }

    pub fn pop_iteration(&mut self) {
        self.iteration_stack.pop();
    }

    /// Insert or overwrite a flat variable (used after `context`/aliased
    /// node results land without a full store round-trip).
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.variables.insert(key.into(), value);
    }

    fn lookup_root(&self, name: &str) -> Option<&Value> {
        for (position, index) in self.iteration_stack.iter().rev() {
            let key = iteration_key(name, *position, *index);
            if let Some(v) = self.variables.get(&key) {
                return Some(v);
            }
        }
        self.variables.get(name)
    }

    /// Resolve one `path` (`name`, `name.a.b[0]`, or `env:NAME`) to a value.
    pub fn resolve_path(&self, path: &str) -> Option<Value> {
        if let Some(env_name) = path.strip_prefix("env:") {
            return std::env::var(env_name).ok().map(Value::String);
        }

        let mut segments = split_path(path);
        if segments.is_empty() {
            return None;
        }
        let root = segments.remove(0);
        let mut current = self.lookup_root(&root)?.clone();
        for segment in segments {
            current = index_into(&current, &segment)?;
        }
        Some(current)
    }

    /// Resolve every `{{path}}` occurrence in a string. A fully-templated
    /// string (`"{{x}}"` with nothing else around it) resolves to the raw
    /// JSON value re-serialized as a string only when non-string; partial
    /// templates (`"hello {{x}}"`) always interpolate as text.
    pub fn resolve_template(&self, input: &str) -> String {
        let re = template_re();
        let mut out = String::with_capacity(input.len());
        let mut last_end = 0;

        for caps in re.captures_iter(input) {
            let whole = caps.get(0).unwrap();
            out.push_str(&input[last_end..whole.start()]);
            let path = caps.get(1).unwrap().as_str();
            match self.resolve_path(path) {
                Some(value) => out.push_str(&value_to_text(&value)),
                None => out.push_str(whole.as_str()),
            }
            last_end = whole.end();
        }
        out.push_str(&input[last_end..]);
        out
    }

    /// Recursively resolve templates within a JSON value. A string that is
    /// *exactly* one `{{path}}` reference resolves to the referenced
    /// value's native JSON type rather than its stringified form.
    pub fn resolve_value(&self, value: &Value) -> Value {
        match value {
            Value::String(s) => {
                if let Some(path) = whole_template(s) {
                    if let Some(resolved) = self.resolve_path(path) {
                        return resolved;
                    }
                }
                Value::String(self.resolve_template(s))
            }
            Value::Array(items) => Value::Array(items.iter().map(|v| self.resolve_value(v)).collect()),
            Value::Object(map) => {
                Value::Object(map.iter().map(|(k, v)| (k.clone(), self.resolve_value(v))).collect())
            }
            other => other.clone(),
        }
    }
}

/// If `s` is exactly one `{{path}}` reference with nothing else, return the
/// inner path.
fn whole_template(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    let inner = trimmed.strip_prefix("{{")?.strip_suffix("}}")?;
    if inner.contains("{{") || inner.contains("}}") {
        return None;
    }
    Some(inner.trim())
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Split `name.a.b[0]` into `["name", "a", "b[0]"]`-equivalent segments,
/// further decomposed into field/index tokens by `index_into`.
fn split_path(path: &str) -> Vec<String> {
    path.split('.').map(|s| s.to_string()).filter(|s| !s.is_empty()).collect()
}

/// Index into `value` using one path segment, which may carry trailing
/// `[n]` index accessors (e.g. `items[0]`, `matrix[0][1]`).
fn index_into(value: &Value, segment: &str) -> Option<Value> {
    let mut field_end = segment.len();
    for (i, c) in segment.char_indices() {
        if c == '[' {
            field_end = i;
            break;
        }
    }
    let field = &segment[..field_end];
    let mut current = if field.is_empty() {
        value.clone()
    } else {
        value.get(field)?.clone()
    };

    let mut rest = &segment[field_end..];
    while let Some(stripped) = rest.strip_prefix('[') {
        let close = stripped.find(']')?;
        let index: usize = stripped[..close].parse().ok()?;
        current = current.get(index)?.clone();
        rest = &stripped[close + 1..];
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resolver() -> VariableResolver {
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), json!("Ada"));
        vars.insert("row".to_string(), json!({"a": {"b": [10, 20, 30]}}));
        VariableResolver::new(vars)
    }

    #[test]
    fn resolves_simple_path() {
        assert_eq!(resolver().resolve_path("name"), Some(json!("Ada")));
    }

    #[test]
    fn resolves_nested_path_with_index() {
        assert_eq!(resolver().resolve_path("row.a.b[1]"), Some(json!(20)));
    }

    #[test]
    fn unresolved_reference_stays_literal_in_template() {
        assert_eq!(resolver().resolve_template("hi {{missing}}"), "hi {{missing}}");
    }

    #[test]
    fn partial_template_interpolates_as_text() {
        assert_eq!(resolver().resolve_template("hello {{name}}"), "hello Ada");
    }

    #[test]
    fn whole_template_string_resolves_to_native_type() {
        let resolved = resolver().resolve_value(&json!("{{row.a.b}}"));
        assert_eq!(resolved, json!([10, 20, 30]));
    }

    #[test]
    fn iteration_scope_shadows_flat_variable() {
        let mut r = resolver();
        r.set(iteration_key("name", 3, 0), json!("Iter0"));
        r.push_iteration(3, 0);
        assert_eq!(r.resolve_path("name"), Some(json!("Iter0")));
        r.pop_iteration();
        assert_eq!(r.resolve_path("name"), Some(json!("Ada")));
    }

    #[test]
    fn resolve_is_idempotent() {
        let r = resolver();
        let once = r.resolve_template("hello {{name}}");
        let twice = r.resolve_template(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn env_prefix_reads_process_env() {
        std::env::set_var("DIRECTOR_TEST_VAR", "value");
        assert_eq!(resolver().resolve_path("env:DIRECTOR_TEST_VAR"), Some(json!("value")));
    }
}
