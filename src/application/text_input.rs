//! The text input comp: a composite of value and validation controls.
//!
//! The comp owns a fixed set of named child slots. Actions arrive wrapped
//! in a child envelope naming the slot; the comp unwraps exactly one
//! envelope, reduces the targeted child, and rebuilds itself only when
//! that child actually changed, so untouched children keep their identity
//! and the graph's memoization keeps their nodes warm.

use serde_json::Value as JsonValue;

use crate::domain::{DependencyGraph, EvalContext, Node, Value};

use super::actions::CompAction;
use super::bool_control::BoolControl;
use super::controls::{
    BoolCodeControl, Comp, CustomRuleControl, DropdownControl, DropdownOption, NumberControl,
    RegexControl, StringControl,
};
use super::validation::{
    validate_text_input, match_all_regex, DefaultMessages, Translator, ValidateResult,
    ValidationParams, ValidationType,
};

/// Child slot names, used for action routing and serialization.
const CHILD_KEYS: [&str; 10] = [
    "value",
    "placeholder",
    "disabled",
    "readOnly",
    "required",
    "minLength",
    "maxLength",
    "validationType",
    "regex",
    "customRule",
];

/// A text input property bundle.
///
/// # Examples
///
/// ```
/// use propsheet::application::{Comp, CompAction, wrap_child_action, TextInputComp};
/// use propsheet::domain::EvalContext;
///
/// let input = TextInputComp::default();
/// let edited = input.reduce(wrap_child_action("value", CompAction::change_value("hello")));
/// assert_eq!(edited.value.get_view(&EvalContext::new()).value, "hello");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TextInputComp {
    pub value: StringControl,
    pub placeholder: StringControl,
    pub disabled: BoolCodeControl,
    pub read_only: BoolControl,
    pub required: BoolControl,
    pub min_length: NumberControl,
    pub max_length: NumberControl,
    pub validation_type: DropdownControl<ValidationType>,
    pub regex: RegexControl,
    pub custom_rule: CustomRuleControl,
}

impl Default for TextInputComp {
    fn default() -> Self {
        Self {
            value: StringControl::default(),
            placeholder: StringControl::default(),
            disabled: BoolCodeControl::default(),
            read_only: BoolControl::new(),
            required: BoolControl::new(),
            min_length: NumberControl::default(),
            max_length: NumberControl::default(),
            validation_type: DropdownControl::new(ValidationType::Text),
            regex: RegexControl::default(),
            custom_rule: CustomRuleControl::default(),
        }
    }
}

impl TextInputComp {
    /// Builds the comp from a serialized object, filling missing slots
    /// with their defaults.
    pub fn from_json_value(value: &JsonValue) -> Self {
        let slot = |name: &str| value.get(name).cloned().unwrap_or(JsonValue::Null);
        Self {
            value: StringControl::from_json_value(&slot("value")),
            placeholder: StringControl::from_json_value(&slot("placeholder")),
            disabled: BoolCodeControl::from_json_value(&slot("disabled")),
            read_only: match value.get("readOnly") {
                Some(v) => BoolControl::from_json_value(v),
                None => BoolControl::new(),
            },
            required: match value.get("required") {
                Some(v) => BoolControl::from_json_value(v),
                None => BoolControl::new(),
            },
            min_length: NumberControl::from_json_value(&slot("minLength")),
            max_length: NumberControl::from_json_value(&slot("maxLength")),
            validation_type: DropdownControl::from_json_value(
                &slot("validationType"),
                ValidationType::Text,
            ),
            regex: RegexControl::from_json_value(&slot("regex")),
            custom_rule: CustomRuleControl::from_json_value(&slot("customRule")),
        }
    }

    fn reduce_child(&self, name: &str, action: CompAction) -> Self {
        macro_rules! route {
            ($field:ident) => {{
                let next = self.$field.reduce(action);
                if next == self.$field {
                    self.clone()
                } else {
                    Self {
                        $field: next,
                        ..self.clone()
                    }
                }
            }};
        }

        match name {
            "value" => route!(value),
            "placeholder" => route!(placeholder),
            "disabled" => route!(disabled),
            "readOnly" => route!(read_only),
            "required" => route!(required),
            "minLength" => route!(min_length),
            "maxLength" => route!(max_length),
            "validationType" => route!(validation_type),
            "regex" => route!(regex),
            "customRule" => route!(custom_rule),
            _ => self.clone(),
        }
    }

    /// A snapshot of the current value and rule views for validation.
    pub fn validation_params(&self, ctx: &EvalContext) -> ValidationParams {
        let bound = |control: &NumberControl| {
            let n = control.get_view(ctx).value;
            if n > 0.0 { n as usize } else { 0 }
        };

        ValidationParams {
            value: self.value.get_view(ctx).value,
            required: self.required.get_view(ctx).value,
            min_length: bound(&self.min_length),
            max_length: bound(&self.max_length),
            validation_type: self.validation_type.get_view(),
            regex: self.regex.compiled(ctx),
            custom_rule: self.custom_rule.get_view(ctx).value,
        }
    }

    /// Validates the current value against the sibling rule controls.
    pub fn validate(&self, ctx: &EvalContext, trans: &dyn Translator) -> ValidateResult {
        validate_text_input(&self.validation_params(ctx), trans)
    }

    /// Registers this comp's exposed nodes in a graph under `name`.
    ///
    /// Child nodes land at `<name>.<child>` and the comp-level validity
    /// flag at `<name>.invalid`, which depends on every rule child and
    /// recomputes only when one of them changes.
    pub fn register(&self, graph: &mut DependencyGraph, name: &str) {
        let key = |child: &str| format!("{name}.{child}");

        graph.set_node(key("value"), self.value.exposing_node());
        graph.set_node(key("placeholder"), self.placeholder.exposing_node());
        graph.set_node(key("disabled"), self.disabled.exposing_node());
        graph.set_node(key("readOnly"), self.read_only.exposing_node());
        graph.set_node(key("required"), self.required.exposing_node());
        graph.set_node(key("minLength"), self.min_length.exposing_node());
        graph.set_node(key("maxLength"), self.max_length.exposing_node());
        graph.set_node(
            key("validationType"),
            Node::constant(Value::String(
                self.validation_type.get_view().as_str().to_string(),
            )),
        );
        graph.set_node(key("regex"), self.regex.exposing_node());
        graph.set_node(key("customRule"), self.custom_rule.exposing_node());

        graph.set_node(key("invalid"), invalid_node(name));
    }
}

/// The comp-level validity node: true when the current snapshot fails
/// validation. Depends on the value and every rule child.
fn invalid_node(name: &str) -> Node {
    let deps: Vec<String> = [
        "value",
        "required",
        "minLength",
        "maxLength",
        "validationType",
        "regex",
        "customRule",
    ]
    .iter()
    .map(|child| format!("{name}.{child}"))
    .collect();

    Node::new(deps, |inputs| {
        let text = |v: &Value| v.to_display_string();
        let bound = |v: &Value| {
            let n = v.as_number().unwrap_or(0.0);
            if n > 0.0 { n as usize } else { 0 }
        };

        let pattern = text(&inputs[5]);
        let params = ValidationParams {
            value: text(&inputs[0]),
            required: inputs[1].is_truthy(),
            min_length: bound(&inputs[2]),
            max_length: bound(&inputs[3]),
            validation_type: ValidationType::parse(&text(&inputs[4]))
                .unwrap_or(ValidationType::Text),
            regex: regex::Regex::new(&pattern).unwrap_or_else(|_| match_all_regex()),
            custom_rule: text(&inputs[6]),
        };

        let result = validate_text_input(&params, &DefaultMessages);
        Ok(Value::Bool(result.is_invalid()))
    })
}

impl Comp for TextInputComp {
    fn reduce(&self, action: CompAction) -> Self {
        match action {
            CompAction::Child { name, action } => self.reduce_child(&name, *action),
            // Replacing the whole comp's value reconstructs the children
            // from the payload object.
            CompAction::ChangeValue(payload) => Self::from_json_value(&payload),
            CompAction::Custom(_) => self.clone(),
        }
    }

    fn to_json_value(&self) -> JsonValue {
        let mut map = serde_json::Map::new();
        for name in CHILD_KEYS {
            let child = match name {
                "value" => self.value.to_json_value(),
                "placeholder" => self.placeholder.to_json_value(),
                "disabled" => self.disabled.to_json_value(),
                "readOnly" => self.read_only.to_json_value(),
                "required" => self.required.to_json_value(),
                "minLength" => self.min_length.to_json_value(),
                "maxLength" => self.max_length.to_json_value(),
                "validationType" => self.validation_type.to_json_value(),
                "regex" => self.regex.to_json_value(),
                "customRule" => self.custom_rule.to_json_value(),
                _ => unreachable!("unknown child key"),
            };
            map.insert(name.to_string(), child);
        }
        JsonValue::Object(map)
    }
}
