//! The action protocol between host event handlers and the reactive core.
//!
//! Every mutation of a control tree is described by one [`CompAction`]
//! value. Actions are created where the event happens, routed down the
//! composite tree through [`CompAction::Child`] envelopes, and consumed
//! exactly once by a `reduce` call.

use serde_json::Value as JsonValue;

/// A tagged mutation request consumed by a comp's `reduce`.
#[derive(Debug, Clone, PartialEq)]
pub enum CompAction {
    /// Replace the control's value with the payload, passing it through
    /// the control's own parsing and coercion rule.
    ChangeValue(JsonValue),

    /// A control-specific request outside the common protocol.
    Custom(CustomAction),

    /// Routes a wrapped action to the named child of a composite. Each
    /// composite hop unwraps exactly one envelope.
    Child {
        name: String,
        action: Box<CompAction>,
    },
}

/// The closed set of control-specific actions.
///
/// New kinds are added by extending this union, never by matching on
/// loose strings.
#[derive(Debug, Clone, PartialEq)]
pub enum CustomAction {
    /// Switches a mode-switchable control between its literal editor and
    /// its expression editor.
    ToggleCodeEditor { use_code_editor: bool },
}

impl CompAction {
    /// Builds a replace-value action from anything JSON-representable.
    ///
    /// # Examples
    ///
    /// ```
    /// use propsheet::application::CompAction;
    ///
    /// let action = CompAction::change_value("new text");
    /// assert!(matches!(action, CompAction::ChangeValue(_)));
    /// ```
    pub fn change_value(value: impl Into<JsonValue>) -> Self {
        CompAction::ChangeValue(value.into())
    }
}

/// Wraps an action in a routing envelope addressed to a named child.
///
/// # Examples
///
/// ```
/// use propsheet::application::{wrap_child_action, CompAction};
///
/// let action = wrap_child_action("text", CompAction::change_value("abc"));
/// let CompAction::Child { name, .. } = &action else {
///     panic!("expected child envelope");
/// };
/// assert_eq!(name, "text");
/// ```
pub fn wrap_child_action(name: impl Into<String>, action: CompAction) -> CompAction {
    CompAction::Child {
        name: name.into(),
        action: Box::new(action),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_value_payloads() {
        assert_eq!(
            CompAction::change_value(true),
            CompAction::ChangeValue(JsonValue::Bool(true))
        );
        assert_eq!(
            CompAction::change_value("x"),
            CompAction::ChangeValue(JsonValue::String("x".into()))
        );
    }

    #[test]
    fn test_child_envelope_nesting() {
        let inner = CompAction::change_value(1);
        let wrapped = wrap_child_action("outer", wrap_child_action("inner", inner.clone()));

        let CompAction::Child { name, action } = wrapped else {
            panic!("expected child envelope");
        };
        assert_eq!(name, "outer");
        let CompAction::Child { name, action } = *action else {
            panic!("expected nested envelope");
        };
        assert_eq!(name, "inner");
        assert_eq!(*action, inner);
    }
}
