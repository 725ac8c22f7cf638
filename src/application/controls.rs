//! Leaf controls: code-backed values with per-type coercion.
//!
//! A [`CodeControl`] stores its configuration as a raw string that may
//! embed `{{...}}` expressions. The exposed, typed value is derived by
//! evaluating the template and passing the result through the control
//! type's coercion rule. Mutation goes exclusively through [`Comp::reduce`],
//! which returns a new instance and leaves the original untouched.

use std::marker::PhantomData;

use regex::Regex;
use serde_json::Value as JsonValue;

use crate::domain::{EvalContext, Node, TemplateEvaluator, Value, ValueAndMsg};

use super::actions::CompAction;

/// An immutable, reducer-driven state container.
///
/// Reducing with an action the comp does not recognize returns an
/// instance equal to the input, so hosts can compare before and after to
/// skip re-rendering untouched subtrees.
pub trait Comp: Clone + std::fmt::Debug {
    /// Consumes one action and produces the successor instance.
    fn reduce(&self, action: CompAction) -> Self;

    /// Plain-data form accepted back by the comp's constructor.
    fn to_json_value(&self) -> JsonValue;
}

/// Coercion rule turning an evaluated template value into a typed view.
///
/// Implementations are zero-sized markers; the interesting part is the
/// associated `Output` type and the `coerce` function.
pub trait CodeType: Copy + Clone + PartialEq + std::fmt::Debug + 'static {
    type Output: Clone + PartialEq + std::fmt::Debug + 'static;

    /// The value used when no usable input is available.
    fn default_value() -> Self::Output;

    /// Coerces an evaluated value into the typed output. An `Err` carries
    /// a user-facing message and degrades the view to the default.
    fn coerce(value: &Value) -> Result<Self::Output, String>;

    /// Re-exposes the typed output to the dependency graph.
    fn to_value(output: &Self::Output) -> Value;
}

/// A leaf control whose raw value is a template string.
///
/// # Examples
///
/// ```
/// use propsheet::application::{Comp, CompAction, NumberControl};
/// use propsheet::domain::EvalContext;
///
/// let control = NumberControl::new("{{2*3}}");
/// assert_eq!(control.get_view(&EvalContext::new()).value, 6.0);
///
/// let replaced = control.reduce(CompAction::change_value("42"));
/// assert_eq!(replaced.get_view(&EvalContext::new()).value, 42.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CodeControl<T: CodeType> {
    unevaled: String,
    _kind: PhantomData<T>,
}

pub type StringControl = CodeControl<StringCode>;
pub type NumberControl = CodeControl<NumberCode>;
pub type PositiveNumberControl = CodeControl<PositiveNumberCode>;
pub type BoolCodeControl = CodeControl<BoolCode>;
pub type RegexControl = CodeControl<RegexCode>;
pub type ArrayStringControl = CodeControl<ArrayStringCode>;
pub type JsonValueControl = CodeControl<JsonCode>;

/// A string control whose non-empty view is treated as a failed custom
/// validation rule.
pub type CustomRuleControl = CodeControl<StringCode>;

/// The raw string form of a JSON payload. Strings pass through untouched,
/// everything else keeps its compact JSON rendering so `true` becomes
/// `"true"` and numbers keep their digits.
fn raw_from_json(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

impl<T: CodeType> CodeControl<T> {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            unevaled: code.into(),
            _kind: PhantomData,
        }
    }

    /// Builds the control from its serialized form.
    pub fn from_json_value(value: &JsonValue) -> Self {
        Self::new(raw_from_json(value))
    }

    /// The raw, unevaluated template string.
    pub fn unevaled_value(&self) -> &str {
        &self.unevaled
    }

    /// The value exposed when construction provides no usable input.
    pub fn default_value() -> T::Output {
        T::default_value()
    }

    /// Evaluates the template against a context and coerces the result.
    ///
    /// Failures are recovered here: the view degrades to the type's
    /// default and the message explains what went wrong.
    pub fn get_view(&self, ctx: &EvalContext) -> ValueAndMsg<T::Output> {
        let evaluated = TemplateEvaluator::new(ctx).evaluate_template(&self.unevaled);
        match T::coerce(&evaluated.value) {
            Ok(value) => ValueAndMsg {
                value,
                msg: evaluated.msg,
            },
            Err(coerce_msg) => ValueAndMsg {
                value: T::default_value(),
                msg: evaluated.msg.or(Some(coerce_msg)),
            },
        }
    }

    /// Builds the dependency node exposing this control's derived value.
    ///
    /// The node's declared dependencies are exactly the context names the
    /// template references, so unrelated context changes never trigger a
    /// recompute.
    pub fn exposing_node(&self) -> Node {
        let deps: Vec<String> = TemplateEvaluator::referenced_names(&self.unevaled)
            .into_iter()
            .collect();
        let dep_names = deps.clone();
        let raw = self.unevaled.clone();

        Node::new(deps, move |inputs| {
            let ctx: EvalContext = dep_names
                .iter()
                .cloned()
                .zip(inputs.iter().cloned())
                .collect();
            Ok(TemplateEvaluator::new(&ctx).evaluate_template(&raw).value)
        })
        .with_function(|value| {
            let output = T::coerce(&value).unwrap_or_else(|_| T::default_value());
            Ok(T::to_value(&output))
        })
    }
}

impl<T: CodeType> Default for CodeControl<T> {
    fn default() -> Self {
        Self::new("")
    }
}

impl<T: CodeType> Comp for CodeControl<T> {
    fn reduce(&self, action: CompAction) -> Self {
        match action {
            CompAction::ChangeValue(payload) => {
                let next = raw_from_json(&payload);
                if next == self.unevaled {
                    self.clone()
                } else {
                    Self::new(next)
                }
            }
            // Identity short-circuit: anything else is not ours.
            CompAction::Custom(_) | CompAction::Child { .. } => self.clone(),
        }
    }

    fn to_json_value(&self) -> JsonValue {
        JsonValue::String(self.unevaled.clone())
    }
}

/// Plain string view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringCode;

impl CodeType for StringCode {
    type Output = String;

    fn default_value() -> String {
        String::new()
    }

    fn coerce(value: &Value) -> Result<String, String> {
        Ok(value.to_display_string())
    }

    fn to_value(output: &String) -> Value {
        Value::String(output.clone())
    }
}

/// Numeric parse-or-default view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberCode;

impl CodeType for NumberCode {
    type Output = f64;

    fn default_value() -> f64 {
        0.0
    }

    fn coerce(value: &Value) -> Result<f64, String> {
        Ok(value.as_number().unwrap_or(0.0))
    }

    fn to_value(output: &f64) -> Value {
        Value::Number(*output)
    }
}

/// Numeric view clamped to zero or above.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositiveNumberCode;

impl CodeType for PositiveNumberCode {
    type Output = f64;

    fn default_value() -> f64 {
        0.0
    }

    fn coerce(value: &Value) -> Result<f64, String> {
        let n = value.as_number().unwrap_or(0.0);
        Ok(if n >= 0.0 { n } else { 0.0 })
    }

    fn to_value(output: &f64) -> Value {
        Value::Number(*output)
    }
}

/// Boolean cast view. The strings `"true"` and `"false"` read as the
/// booleans they spell (literal switches store their value that way);
/// everything else falls back to value truthiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoolCode;

impl CodeType for BoolCode {
    type Output = bool;

    fn default_value() -> bool {
        false
    }

    fn coerce(value: &Value) -> Result<bool, String> {
        match value {
            Value::String(s) => match s.trim() {
                "true" => Ok(true),
                "false" => Ok(false),
                other => Ok(!other.is_empty()),
            },
            other => Ok(other.is_truthy()),
        }
    }

    fn to_value(output: &bool) -> Value {
        Value::Bool(*output)
    }
}

/// A regular expression pattern, validated at coercion time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegexCode;

impl CodeType for RegexCode {
    type Output = String;

    fn default_value() -> String {
        String::new()
    }

    fn coerce(value: &Value) -> Result<String, String> {
        let pattern = value.to_display_string();
        match Regex::new(&pattern) {
            Ok(_) => Ok(pattern),
            Err(err) => Err(format!("invalid regular expression: {err}")),
        }
    }

    fn to_value(output: &String) -> Value {
        Value::String(output.clone())
    }
}

impl RegexControl {
    /// Compiles the current pattern. The empty pattern matches anything,
    /// which is also the fallback when the pattern fails to compile.
    pub fn compiled(&self, ctx: &EvalContext) -> Regex {
        let pattern = self.get_view(ctx).value;
        Regex::new(&pattern).unwrap_or_else(|_| super::validation::match_all_regex())
    }
}

/// Array-of-string view: arrays map element-wise, strings split as a JSON
/// array when they look like one and on commas otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayStringCode;

impl CodeType for ArrayStringCode {
    type Output = Vec<String>;

    fn default_value() -> Vec<String> {
        Vec::new()
    }

    fn coerce(value: &Value) -> Result<Vec<String>, String> {
        match value {
            Value::Array(items) => Ok(items.iter().map(Value::to_display_string).collect()),
            Value::Null => Ok(Vec::new()),
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Ok(Vec::new());
                }
                if trimmed.starts_with('[') {
                    if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(trimmed) {
                        return Ok(items.iter().map(Value::to_display_string).collect());
                    }
                }
                Ok(trimmed.split(',').map(|p| p.trim().to_string()).collect())
            }
            other => Ok(vec![other.to_display_string()]),
        }
    }

    fn to_value(output: &Vec<String>) -> Value {
        Value::Array(output.iter().cloned().map(Value::String).collect())
    }
}

/// JSON parse-or-passthrough view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonCode;

impl CodeType for JsonCode {
    type Output = Value;

    fn default_value() -> Value {
        Value::Null
    }

    fn coerce(value: &Value) -> Result<Value, String> {
        match value {
            Value::String(s) => {
                Ok(serde_json::from_str::<Value>(s).unwrap_or_else(|_| Value::String(s.clone())))
            }
            other => Ok(other.clone()),
        }
    }

    fn to_value(output: &Value) -> Value {
        output.clone()
    }
}

/// A boolean control without expression support: a plain switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoolPureControl {
    value: bool,
}

impl BoolPureControl {
    pub fn new(value: bool) -> Self {
        Self { value }
    }

    pub fn from_json_value(value: &JsonValue) -> Self {
        Self::new(Value::from_json(value).is_truthy())
    }

    pub fn get_view(&self) -> bool {
        self.value
    }
}

impl Comp for BoolPureControl {
    fn reduce(&self, action: CompAction) -> Self {
        match action {
            CompAction::ChangeValue(payload) => Self::new(Value::from_json(&payload).is_truthy()),
            CompAction::Custom(_) | CompAction::Child { .. } => *self,
        }
    }

    fn to_json_value(&self) -> JsonValue {
        JsonValue::Bool(self.value)
    }
}

/// An option set usable by a [`DropdownControl`].
pub trait DropdownOption: Copy + PartialEq + std::fmt::Debug + 'static {
    fn as_str(&self) -> &'static str;
    fn parse(s: &str) -> Option<Self>;
    fn all() -> &'static [Self];
}

/// A control selecting one value out of a closed option set.
///
/// Replace-value payloads naming no known option leave the selection
/// unchanged, so the set stays closed against arbitrary strings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropdownControl<T: DropdownOption> {
    value: T,
}

impl<T: DropdownOption> DropdownControl<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    pub fn from_json_value(value: &JsonValue, default: T) -> Self {
        let selected = value
            .as_str()
            .and_then(T::parse)
            .unwrap_or(default);
        Self::new(selected)
    }

    pub fn get_view(&self) -> T {
        self.value
    }
}

impl<T: DropdownOption> Comp for DropdownControl<T> {
    fn reduce(&self, action: CompAction) -> Self {
        match action {
            CompAction::ChangeValue(payload) => match payload.as_str().and_then(T::parse) {
                Some(value) => Self::new(value),
                None => *self,
            },
            CompAction::Custom(_) | CompAction::Child { .. } => *self,
        }
    }

    fn to_json_value(&self) -> JsonValue {
        JsonValue::String(self.value.as_str().to_string())
    }
}
