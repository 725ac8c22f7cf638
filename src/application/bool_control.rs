//! The mode-switchable boolean control.
//!
//! A boolean property is usually a plain switch, but power users can flip
//! it into expression mode and bind it to other controls. The mode is not
//! stored separately: a string payload means expression mode, anything
//! else means literal mode, and every replace-value action re-derives the
//! mode from its payload's shape. An explicit toggle action flips the
//! editor without touching the wrapped value.

use serde_json::Value as JsonValue;

use crate::domain::{EvalContext, Node, ValueAndMsg};

use super::actions::{CompAction, CustomAction};
use super::controls::{BoolCodeControl, Comp};

/// Splits a constructor payload into a mode flag and the raw string the
/// inner evaluator operates on. Booleans are spelled out so the evaluator
/// always sees a string.
fn parse_value(value: &JsonValue) -> (bool, String) {
    match value {
        JsonValue::String(s) => (true, s.clone()),
        other => {
            let literal = crate::domain::Value::from_json(other).is_truthy();
            (false, if literal { "true" } else { "false" }.to_string())
        }
    }
}

/// A boolean control supporting a literal switch and an expression editor.
///
/// # Examples
///
/// ```
/// use propsheet::application::BoolControl;
/// use propsheet::domain::EvalContext;
///
/// let literal = BoolControl::from_json_value(&serde_json::json!(true));
/// assert!(!literal.uses_code_editor());
/// assert!(literal.get_view(&EvalContext::new()).value);
///
/// let bound = BoolControl::from_json_value(&serde_json::json!("{{1+1}}"));
/// assert!(bound.uses_code_editor());
/// assert!(bound.get_view(&EvalContext::new()).value);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BoolControl {
    use_code_editor: bool,
    code: BoolCodeControl,
}

impl BoolControl {
    /// A literal `false` control.
    pub fn new() -> Self {
        Self::from_json_value(&JsonValue::Bool(false))
    }

    /// A literal `true` control, for properties that default on.
    pub fn default_true() -> Self {
        Self::from_json_value(&JsonValue::Bool(true))
    }

    /// Builds the control from its serialized form, deriving the mode
    /// from the payload's shape.
    pub fn from_json_value(value: &JsonValue) -> Self {
        let (use_code_editor, raw) = parse_value(value);
        Self {
            use_code_editor,
            code: BoolCodeControl::new(raw),
        }
    }

    pub fn uses_code_editor(&self) -> bool {
        self.use_code_editor
    }

    /// The inner evaluator-backed control. Both modes read through it.
    pub fn code_control(&self) -> &BoolCodeControl {
        &self.code
    }

    /// The evaluated boolean view. Mode only affects editing; the view
    /// always comes from the inner evaluator.
    pub fn get_view(&self, ctx: &EvalContext) -> ValueAndMsg<bool> {
        self.code.get_view(ctx)
    }

    /// The action that flips between the switch and the expression editor.
    pub fn change_mode_action(&self) -> CompAction {
        CompAction::Custom(CustomAction::ToggleCodeEditor {
            use_code_editor: !self.use_code_editor,
        })
    }

    /// The node exposing this control's derived value.
    pub fn exposing_node(&self) -> Node {
        self.code.exposing_node()
    }
}

impl Default for BoolControl {
    fn default() -> Self {
        Self::new()
    }
}

impl Comp for BoolControl {
    fn reduce(&self, action: CompAction) -> Self {
        match action {
            CompAction::Custom(CustomAction::ToggleCodeEditor { use_code_editor }) => Self {
                use_code_editor,
                code: self.code.clone(),
            },
            CompAction::ChangeValue(payload) => {
                let (use_code_editor, raw) = parse_value(&payload);
                let code = self.code.reduce(CompAction::change_value(raw));
                if use_code_editor != self.use_code_editor || code != self.code {
                    Self {
                        use_code_editor,
                        code,
                    }
                } else {
                    self.clone()
                }
            }
            other => {
                // Delegate anything else to the wrapped control.
                let code = self.code.reduce(other);
                if code != self.code {
                    Self {
                        use_code_editor: self.use_code_editor,
                        code,
                    }
                } else {
                    self.clone()
                }
            }
        }
    }

    fn to_json_value(&self) -> JsonValue {
        if self.use_code_editor {
            self.code.to_json_value()
        } else {
            JsonValue::Bool(self.code.unevaled_value() == "true")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Value;

    fn ctx() -> EvalContext {
        EvalContext::new().with("flag", Value::Bool(true))
    }

    #[test]
    fn test_mode_from_constructor_shape() {
        let from_bool = BoolControl::from_json_value(&serde_json::json!(true));
        assert!(!from_bool.uses_code_editor());
        assert!(from_bool.get_view(&ctx()).value);

        let from_string = BoolControl::from_json_value(&serde_json::json!("1+1"));
        assert!(from_string.uses_code_editor());
    }

    #[test]
    fn test_expression_view_resolves_against_context() {
        let control = BoolControl::from_json_value(&serde_json::json!("{{1+1}}"));
        // 2 is truthy once the expression resolves.
        assert!(control.get_view(&ctx()).value);

        let bound = BoolControl::from_json_value(&serde_json::json!("{{flag}}"));
        assert!(bound.get_view(&ctx()).value);
    }

    #[test]
    fn test_literal_values_spelled_out() {
        let control = BoolControl::from_json_value(&serde_json::json!(false));
        assert_eq!(control.code_control().unevaled_value(), "false");
        assert!(!control.get_view(&ctx()).value);
    }

    #[test]
    fn test_toggle_keeps_wrapped_value() {
        let control = BoolControl::from_json_value(&serde_json::json!(true));
        let toggled = control.reduce(control.change_mode_action());

        assert!(toggled.uses_code_editor());
        assert_eq!(
            toggled.code_control().unevaled_value(),
            control.code_control().unevaled_value()
        );

        let back = toggled.reduce(toggled.change_mode_action());
        assert!(!back.uses_code_editor());
        assert_eq!(back, control);
    }

    #[test]
    fn test_change_value_rederives_mode() {
        let control = BoolControl::from_json_value(&serde_json::json!(true));
        assert!(!control.uses_code_editor());

        // Assigning a string flips into expression mode without an
        // explicit toggle.
        let bound = control.reduce(CompAction::change_value("{{flag}}"));
        assert!(bound.uses_code_editor());
        assert_eq!(bound.code_control().unevaled_value(), "{{flag}}");

        let literal = bound.reduce(CompAction::change_value(false));
        assert!(!literal.uses_code_editor());
        assert_eq!(literal.code_control().unevaled_value(), "false");
    }

    #[test]
    fn test_unchanged_reduce_is_stable() {
        let control = BoolControl::from_json_value(&serde_json::json!(true));
        let same = control.reduce(CompAction::change_value(true));
        assert_eq!(same, control);
    }

    #[test]
    fn test_json_round_trip_depends_on_mode() {
        let literal = BoolControl::from_json_value(&serde_json::json!(true));
        assert_eq!(literal.to_json_value(), serde_json::json!(true));

        let bound = BoolControl::from_json_value(&serde_json::json!("{{flag}}"));
        assert_eq!(bound.to_json_value(), serde_json::json!("{{flag}}"));

        let rebuilt = BoolControl::from_json_value(&bound.to_json_value());
        assert_eq!(rebuilt, bound);
    }

    #[test]
    fn test_default_presets() {
        assert!(!BoolControl::new().get_view(&ctx()).value);
        assert!(BoolControl::default_true().get_view(&ctx()).value);
    }
}
