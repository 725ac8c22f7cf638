use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// A dynamically typed runtime value flowing through the dependency graph.
///
/// Controls store raw configuration as strings, but once an embedded
/// expression is evaluated the result can be any of these shapes. The
/// `untagged` representation keeps the serialized form plain JSON, so a
/// `Value` round-trips through [`serde_json`] without wrapper objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl Value {
    /// Returns a short name for the value's type, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// Truthiness used by boolean coercion and logical functions.
    ///
    /// `null`, `false`, `0`, `NaN`, and the empty string are falsy,
    /// everything else is truthy.
    ///
    /// # Examples
    ///
    /// ```
    /// use propsheet::domain::Value;
    ///
    /// assert!(Value::Number(1.0).is_truthy());
    /// assert!(!Value::String(String::new()).is_truthy());
    /// assert!(!Value::Null.is_truthy());
    /// ```
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        }
    }

    /// Attempts a numeric reading of the value.
    ///
    /// Booleans count as 0/1 and numeric strings are parsed. Returns
    /// `None` for everything that has no reasonable numeric reading.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Renders the value the way it appears when spliced into a template
    /// string. Strings are unquoted, `null` renders as the empty string,
    /// and structured values use their compact JSON form.
    ///
    /// # Examples
    ///
    /// ```
    /// use propsheet::domain::Value;
    ///
    /// assert_eq!(Value::Number(3.0).to_display_string(), "3");
    /// assert_eq!(Value::String("Ann".into()).to_display_string(), "Ann");
    /// assert_eq!(Value::Null.to_display_string(), "");
    /// ```
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.clone(),
            other => serde_json::to_string(&other).unwrap_or_default(),
        }
    }

    /// Converts a [`serde_json::Value`] into a graph value.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => {
                Value::Array(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

/// Named variable bindings an expression evaluates against.
///
/// The host page assembles a context from other controls' exposed values,
/// so an expression like `{{userName}}` resolves to whatever the control
/// named `userName` currently exposes.
///
/// # Examples
///
/// ```
/// use propsheet::domain::{EvalContext, Value};
///
/// let ctx = EvalContext::new().with("userName", Value::from("Ann"));
/// assert_eq!(ctx.get("userName"), Some(&Value::from("Ann")));
/// assert_eq!(ctx.get("missing"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvalContext {
    vars: HashMap<String, Value>,
}

impl EvalContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion, convenient for assembling test contexts.
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.vars.insert(name.into(), value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Iterates over all bindings in the context.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.vars.iter()
    }
}

impl FromIterator<(String, Value)> for EvalContext {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().collect(),
        }
    }
}

/// An exposed value together with a recovered error message.
///
/// Evaluation failures never unwind past a control boundary. The affected
/// value degrades to a fallback and the message rides along so the host
/// can surface it next to the offending property.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValueAndMsg<T> {
    pub value: T,
    pub msg: Option<String>,
}

impl<T> ValueAndMsg<T> {
    /// A successfully computed value with no attached message.
    pub fn new(value: T) -> Self {
        Self { value, msg: None }
    }

    /// A degraded value carrying the failure that produced it.
    pub fn with_error(value: T, msg: impl Into<String>) -> Self {
        Self {
            value,
            msg: Some(msg.into()),
        }
    }

    pub fn has_error(&self) -> bool {
        self.msg.is_some()
    }
}
