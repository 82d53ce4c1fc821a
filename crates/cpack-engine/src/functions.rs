//! Template functions (global functions available in templates)
//!
//! Three functions are render-specific:
//! - `env(key)`: override map first, then the real process environment
//! - `include(name, data)`: render a registered template against `data`
//! - `tpl(text, data)`: render `text` as an ad hoc template with the same
//!   function namespace but a fresh, template-less registry
//!
//! The rest form the general-purpose set chart templates expect.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use minijinja::value::Rest;
use minijinja::{Environment, Error, ErrorKind, State, UndefinedBehavior, Value};

use crate::filters;

/// Maximum recursion depth for the tpl function (prevents infinite loops)
const MAX_TPL_DEPTH: usize = 16;

/// Shared state captured by the render-specific functions.
///
/// Cheap to clone; nested `tpl` environments share the same depth counter
/// and override map.
#[derive(Debug, Clone, Default)]
pub struct RenderFns {
    env_overrides: Arc<BTreeMap<String, String>>,
    tpl_depth: Arc<AtomicUsize>,
}

impl RenderFns {
    pub fn new(env_overrides: BTreeMap<String, String>) -> Self {
        Self {
            env_overrides: Arc::new(env_overrides),
            tpl_depth: Arc::new(AtomicUsize::new(0)),
        }
    }
}

/// Build a fresh environment carrying the full function and filter
/// namespace but no registered templates.
///
/// Used both as the base for a render call (templates are added on top)
/// and by `tpl` for its isolated inline registry.
pub fn build_environment(fns: &RenderFns) -> Environment<'static> {
    let mut env = Environment::new();
    // Missing value paths chain to undefined so `default` applies instead
    // of erroring halfway through an attribute lookup.
    env.set_undefined_behavior(UndefinedBehavior::Chainable);

    filters::register(&mut env);

    env.add_function("fail", fail);
    env.add_function("dict", dict);
    env.add_function("list", list);
    env.add_function("get", get);
    env.add_function("coalesce", coalesce);
    env.add_function("ternary", ternary);
    env.add_function("tostring", tostring);
    env.add_function("toint", toint);
    env.add_function("now", now);

    let overrides = fns.clone();
    env.add_function("env", move |key: String| -> String {
        match overrides.env_overrides.get(&key) {
            Some(v) => v.clone(),
            None => std::env::var(&key).unwrap_or_default(),
        }
    });

    env.add_function(
        "include",
        |state: &State, name: String, data: Value| -> Result<String, Error> {
            let template = state.env().get_template(&name)?;
            template.render(data)
        },
    );

    let tpl_fns = fns.clone();
    env.add_function(
        "tpl",
        move |text: String, data: Value| -> Result<String, Error> {
            tpl(&tpl_fns, &text, data)
        },
    );

    env
}

/// Render `text` as an ad hoc template against a fresh registry.
///
/// Inline templates see the same functions and filters but none of the
/// chart's registered templates, so `include` inside `tpl` only reaches
/// templates the inline source itself could have registered (none).
fn tpl(fns: &RenderFns, text: &str, data: Value) -> Result<String, Error> {
    if text.is_empty() {
        return Ok(String::new());
    }

    let depth = fns.tpl_depth.fetch_add(1, Ordering::SeqCst) + 1;
    let result = if depth > MAX_TPL_DEPTH {
        Err(Error::new(
            ErrorKind::InvalidOperation,
            format!(
                "tpl recursion depth {} exceeds maximum {} - check for circular references in values",
                depth, MAX_TPL_DEPTH
            ),
        ))
    } else {
        let env = build_environment(fns);
        env.render_str(text, data)
            .map_err(|e| Error::new(ErrorKind::InvalidOperation, format!("tpl error: {}", e)))
    };
    fns.tpl_depth.fetch_sub(1, Ordering::SeqCst);

    result
}

/// Fail with a custom error message
///
/// Usage: {{ fail("Something went wrong") }}
pub fn fail(message: String) -> Result<Value, Error> {
    Err(Error::new(ErrorKind::InvalidOperation, message))
}

/// Create a dict from key-value pairs
///
/// Usage: {{ dict("key1", value1, "key2", value2) }}
pub fn dict(args: Rest<Value>) -> Result<Value, Error> {
    if args.len() % 2 != 0 {
        return Err(Error::new(
            ErrorKind::InvalidOperation,
            "dict requires an even number of arguments (key-value pairs)",
        ));
    }

    let mut map = serde_json::Map::new();
    for chunk in args.chunks(2) {
        let key = chunk[0]
            .as_str()
            .ok_or_else(|| Error::new(ErrorKind::InvalidOperation, "dict keys must be strings"))?;
        let value: serde_json::Value = serde_json::to_value(&chunk[1])
            .map_err(|e| Error::new(ErrorKind::InvalidOperation, e.to_string()))?;
        map.insert(key.to_string(), value);
    }

    Ok(Value::from_serialize(serde_json::Value::Object(map)))
}

/// Create a list from values
///
/// Usage: {{ list("a", "b", "c") }}
pub fn list(args: Rest<Value>) -> Value {
    Value::from(args.0)
}

/// Get a value with a default if undefined
///
/// Usage: {{ get(Values, "key", "default") }}
pub fn get(obj: Value, key: String, default: Option<Value>) -> Value {
    match obj.get_attr(&key) {
        Ok(v) if !v.is_undefined() => v,
        _ => default.unwrap_or(Value::UNDEFINED),
    }
}

/// Return first non-empty value
///
/// Usage: {{ coalesce(a, b, c) }}
pub fn coalesce(args: Rest<Value>) -> Value {
    for arg in args.0 {
        if !arg.is_undefined() && !arg.is_none() {
            if let Some(s) = arg.as_str() {
                if !s.is_empty() {
                    return arg;
                }
            } else {
                return arg;
            }
        }
    }
    Value::UNDEFINED
}

/// Ternary operator
///
/// Usage: {{ ternary(true_value, false_value, condition) }}
pub fn ternary(true_val: Value, false_val: Value, condition: Value) -> Value {
    if condition.is_true() { true_val } else { false_val }
}

/// Convert a value to a string representation
pub fn tostring(value: Value) -> String {
    if let Some(s) = value.as_str() {
        s.to_string()
    } else {
        value.to_string()
    }
}

/// Convert a value to an integer
pub fn toint(value: Value) -> Result<i64, Error> {
    if let Some(n) = value.as_i64() {
        Ok(n)
    } else if let Some(s) = value.as_str() {
        s.parse::<i64>().map_err(|_| {
            Error::new(
                ErrorKind::InvalidOperation,
                format!("cannot convert '{}' to int", s),
            )
        })
    } else {
        Err(Error::new(
            ErrorKind::InvalidOperation,
            format!("cannot convert {:?} to int", value),
        ))
    }
}

/// Current UTC timestamp
///
/// Usage: {{ now() }}
pub fn now() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    fn render(template: &str, fns: RenderFns) -> Result<String, minijinja::Error> {
        let env = build_environment(&fns);
        env.render_str(template, context! {})
    }

    #[test]
    fn test_env_prefers_override() {
        let mut overrides = BTreeMap::new();
        overrides.insert("HOME".to_string(), "/chart-home".to_string());
        let out = render("{{ env(\"HOME\") }}", RenderFns::new(overrides)).unwrap();
        assert_eq!(out, "/chart-home");
    }

    #[test]
    fn test_env_falls_back_to_process() {
        // SAFETY: single-threaded test process mutation
        unsafe { std::env::set_var("CPACK_FN_TEST_VAR", "from-process") };
        let out = render("{{ env(\"CPACK_FN_TEST_VAR\") }}", RenderFns::default()).unwrap();
        assert_eq!(out, "from-process");
    }

    #[test]
    fn test_env_unset_is_empty() {
        let out = render("[{{ env(\"CPACK_DEFINITELY_UNSET\") }}]", RenderFns::default()).unwrap();
        assert_eq!(out, "[]");
    }

    #[test]
    fn test_tpl_renders_inline() {
        let out = render(
            "{{ tpl(\"hello {{ who }}\", dict(\"who\", \"world\")) }}",
            RenderFns::default(),
        )
        .unwrap();
        assert_eq!(out, "hello world");
    }

    #[test]
    fn test_tpl_empty_text() {
        let out = render("[{{ tpl(\"\", dict()) }}]", RenderFns::default()).unwrap();
        assert_eq!(out, "[]");
    }

    #[test]
    fn test_tpl_recursion_limited() {
        // A tpl whose expansion calls tpl again on the same text, forever.
        let env = build_environment(&RenderFns::default());
        let result = env.render_str(
            r#"{{ tpl("{{ tpl(t, dict(\"t\", t)) }}", dict("t", "{{ tpl(t, dict(\"t\", t)) }}")) }}"#,
            context! {},
        );
        let err = result.unwrap_err();
        assert!(format!("{:#}", err).contains("recursion depth"));
    }

    #[test]
    fn test_dict_and_list() {
        let out = render("{{ dict(\"a\", 1).a }}|{{ list(1, 2) | length }}", RenderFns::default())
            .unwrap();
        assert_eq!(out, "1|2");
    }

    #[test]
    fn test_coalesce_and_ternary() {
        let out = render(
            "{{ coalesce(\"\", \"x\") }}|{{ ternary(\"yes\", \"no\", 1 == 1) }}",
            RenderFns::default(),
        )
        .unwrap();
        assert_eq!(out, "x|yes");
    }

    #[test]
    fn test_fail() {
        assert!(render("{{ fail(\"boom\") }}", RenderFns::default()).is_err());
    }

    #[test]
    fn test_toint() {
        let out = render("{{ toint(\"42\") + 1 }}", RenderFns::default()).unwrap();
        assert_eq!(out, "43");
    }
}
