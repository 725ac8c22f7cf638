//! Parameter controls for query bindings.
//!
//! A params control wraps a string control and, instead of exposing the
//! rendered string, exposes one evaluated result per `{{...}}` span. The
//! host sends the resulting map to the server as request parameters.
//!
//! Duplicate expression text collapses to one map key, so callers must
//! not rely on per-occurrence results.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde_json::Value as JsonValue;
use tracing::warn;

use crate::domain::{
    dynamic_segments, evaluate_expression, referenced_identifiers, EvalContext, FunctionRegistry,
    Node, Parser, Value,
};

use super::actions::CompAction;
use super::controls::{
    ArrayStringCode, CodeControl, CodeType, JsonCode, NumberCode, PositiveNumberCode, StringCode,
};

pub type ParamsStringControl = ParamsControl<StringCode>;
pub type ParamsNumberControl = ParamsControl<NumberCode>;
pub type ParamsPositiveNumberControl = ParamsControl<PositiveNumberCode>;
pub type ParamsArrayStringControl = ParamsControl<ArrayStringCode>;
pub type ParamsJsonControl = ParamsControl<JsonCode>;

#[derive(Debug, Clone)]
struct ParamsNodeCache {
    raw: String,
    nodes: Rc<BTreeMap<String, Node>>,
}

/// A string-valued control exposing a map from expression text to its
/// evaluated result.
///
/// For the input `xx{{1+2}}sd{{-1}}` the exposed view is a map with the
/// keys `1+2` and `-1`. The per-expression node set is rebuilt only when
/// the raw string actually changes, so reconstructing the control for
/// unrelated reasons keeps every node's memoized result.
///
/// # Examples
///
/// ```
/// use propsheet::application::ParamsStringControl;
/// use propsheet::domain::{EvalContext, Value};
///
/// let control = ParamsStringControl::new("id:{{1+2}} name:{{userName}}");
/// let ctx = EvalContext::new().with("userName", Value::from("Ann"));
///
/// let params = control.evaluate_params(&ctx);
/// assert_eq!(params.get("1+2"), Some(&Value::Number(3.0)));
/// assert_eq!(params.get("userName"), Some(&Value::from("Ann")));
/// ```
#[derive(Debug)]
pub struct ParamsControl<T: CodeType> {
    text: CodeControl<T>,
    node_cache: RefCell<Option<ParamsNodeCache>>,
    param_values: RefCell<BTreeMap<String, Value>>,
}

impl<T: CodeType> ParamsControl<T> {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            text: CodeControl::new(code),
            node_cache: RefCell::new(None),
            param_values: RefCell::new(BTreeMap::new()),
        }
    }

    pub fn from_json_value(value: &JsonValue) -> Self {
        Self {
            text: CodeControl::from_json_value(value),
            node_cache: RefCell::new(None),
            param_values: RefCell::new(BTreeMap::new()),
        }
    }

    /// The wrapped text control.
    pub fn text(&self) -> &CodeControl<T> {
        &self.text
    }

    /// One node per distinct expression text in the raw string.
    ///
    /// The set is cached against the raw string: while the string is
    /// unchanged the same nodes (and their memoized evaluations) are
    /// returned, even across clones of this control.
    pub fn params_nodes(&self) -> Rc<BTreeMap<String, Node>> {
        let raw = self.text.unevaled_value();

        if let Some(cached) = self.node_cache.borrow().as_ref() {
            if cached.raw == raw {
                return Rc::clone(&cached.nodes);
            }
        }

        let mut nodes = BTreeMap::new();
        for segment in dynamic_segments(raw) {
            if !segment.is_dynamic() {
                continue;
            }
            let code = segment.code().to_string();
            if nodes.contains_key(&code) {
                continue;
            }
            nodes.insert(code.clone(), expression_node(code));
        }

        let nodes = Rc::new(nodes);
        *self.node_cache.borrow_mut() = Some(ParamsNodeCache {
            raw: raw.to_string(),
            nodes: Rc::clone(&nodes),
        });
        nodes
    }

    /// Evaluates every expression against the context and refreshes the
    /// exposed map.
    ///
    /// A failing expression degrades its own entry to null and leaves the
    /// rest of the map intact.
    pub fn evaluate_params(&self, ctx: &EvalContext) -> BTreeMap<String, Value> {
        let nodes = self.params_nodes();
        let mut out = BTreeMap::new();

        for (code, node) in nodes.iter() {
            let mut inputs = Vec::with_capacity(node.deps().len());
            let mut missing = None;
            for dep in node.deps() {
                match ctx.get(dep) {
                    Some(value) => inputs.push(value.clone()),
                    None => {
                        missing = Some(dep.clone());
                        break;
                    }
                }
            }

            if let Some(name) = missing {
                warn!(%code, %name, "parameter references unknown identifier");
                out.insert(code.clone(), Value::Null);
                continue;
            }

            match node.evaluate(&inputs) {
                Ok(value) => {
                    out.insert(code.clone(), value);
                }
                Err(err) => {
                    warn!(%code, %err, "parameter evaluation failed");
                    out.insert(code.clone(), Value::Null);
                }
            }
        }

        *self.param_values.borrow_mut() = out.clone();
        out
    }

    /// The last-computed parameter map.
    ///
    /// Empty until the first [`ParamsControl::evaluate_params`] pass has
    /// run; callers must not assume freshness beyond the latest pass.
    pub fn get_view(&self) -> BTreeMap<String, Value> {
        self.param_values.borrow().clone()
    }
}

/// Builds the node for one expression: its dependencies are the context
/// names the expression references.
fn expression_node(code: String) -> Node {
    let deps: Vec<String> = Parser::new(&code)
        .and_then(|mut p| p.parse())
        .map(|ast| referenced_identifiers(&ast).into_iter().collect())
        .unwrap_or_default();
    let dep_names = deps.clone();

    Node::new(deps, move |inputs| {
        let ctx: EvalContext = dep_names
            .iter()
            .cloned()
            .zip(inputs.iter().cloned())
            .collect();
        evaluate_expression(&code, &ctx, &FunctionRegistry::new())
    })
}

impl<T: CodeType> Clone for ParamsControl<T> {
    fn clone(&self) -> Self {
        Self {
            text: self.text.clone(),
            node_cache: RefCell::new(self.node_cache.borrow().clone()),
            param_values: RefCell::new(self.param_values.borrow().clone()),
        }
    }
}

impl<T: CodeType> PartialEq for ParamsControl<T> {
    fn eq(&self, other: &Self) -> bool {
        // Caches are derived state; only the configuration counts.
        self.text == other.text
    }
}

impl<T: CodeType> super::controls::Comp for ParamsControl<T> {
    fn reduce(&self, action: CompAction) -> Self {
        let next_text = match action {
            // One envelope hop addresses the wrapped text control.
            CompAction::Child { name, action } if name == "text" => self.text.reduce(*action),
            CompAction::ChangeValue(payload) => {
                self.text.reduce(CompAction::ChangeValue(payload))
            }
            _ => return self.clone(),
        };

        if next_text == self.text {
            self.clone()
        } else {
            Self {
                text: next_text,
                node_cache: RefCell::new(self.node_cache.borrow().clone()),
                param_values: RefCell::new(self.param_values.borrow().clone()),
            }
        }
    }

    fn to_json_value(&self) -> JsonValue {
        self.text.to_json_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::controls::Comp;
    use crate::application::wrap_child_action;

    fn ctx() -> EvalContext {
        EvalContext::new()
            .with("userName", Value::from("Ann"))
            .with("limit", Value::Number(10.0))
    }

    #[test]
    fn test_param_map_matches_expressions() {
        let control = ParamsStringControl::new("id:{{1+2}} name:{{userName}}");
        let params = control.evaluate_params(&ctx());

        assert_eq!(params.len(), 2);
        assert_eq!(params.get("1+2"), Some(&Value::Number(3.0)));
        assert_eq!(params.get("userName"), Some(&Value::from("Ann")));
    }

    #[test]
    fn test_duplicate_expressions_collapse() {
        let control = ParamsStringControl::new("{{userName}} and {{userName}}");
        let params = control.evaluate_params(&ctx());
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_no_expressions_means_empty_map() {
        let control = ParamsStringControl::new("plain text");
        assert!(control.evaluate_params(&ctx()).is_empty());
    }

    #[test]
    fn test_failed_expression_degrades_to_null() {
        let control = ParamsStringControl::new("{{unknownVar}} {{1+1}}");
        let params = control.evaluate_params(&ctx());

        assert_eq!(params.get("unknownVar"), Some(&Value::Null));
        assert_eq!(params.get("1+1"), Some(&Value::Number(2.0)));
    }

    #[test]
    fn test_view_is_lazy_until_first_pass() {
        let control = ParamsStringControl::new("{{1+1}}");
        assert!(control.get_view().is_empty());

        control.evaluate_params(&ctx());
        assert_eq!(control.get_view().get("1+1"), Some(&Value::Number(2.0)));
    }

    #[test]
    fn test_node_set_reused_while_raw_unchanged() {
        let control = ParamsStringControl::new("{{limit}}");
        let first = control.params_nodes();
        let second = control.params_nodes();
        assert!(Rc::ptr_eq(&first, &second));

        // A clone carries the cache along.
        let cloned = control.clone();
        let third = cloned.params_nodes();
        assert!(Rc::ptr_eq(&first, &third));
    }

    #[test]
    fn test_node_set_rebuilt_on_change() {
        let control = ParamsStringControl::new("{{limit}}");
        let before = control.params_nodes();

        let changed = control.reduce(CompAction::change_value("{{limit+1}}"));
        let after = changed.params_nodes();
        assert!(!Rc::ptr_eq(&before, &after));
        assert!(after.contains_key("limit+1"));
    }

    #[test]
    fn test_child_envelope_routes_to_text() {
        let control = ParamsStringControl::new("{{a}}");
        let next = control.reduce(wrap_child_action("text", CompAction::change_value("{{b}}")));
        assert_eq!(next.text().unevaled_value(), "{{b}}");

        // An envelope for an unknown child is ignored.
        let same = control.reduce(wrap_child_action("other", CompAction::change_value("x")));
        assert_eq!(same, control);
    }

    #[test]
    fn test_json_round_trip() {
        let control = ParamsNumberControl::new("{{limit}}");
        let rebuilt = ParamsNumberControl::from_json_value(&control.to_json_value());
        assert_eq!(rebuilt, control);
    }
}
