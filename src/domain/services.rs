//! Template evaluation services for control bindings.
//!
//! This module ties the segmentation and expression layers together: a
//! raw control string may be plain text, a single `{{expr}}` binding, or
//! a mixed template, and the evaluator produces one exposed value for all
//! three shapes.

use std::collections::BTreeSet;

use tracing::warn;

use super::models::{EvalContext, Value, ValueAndMsg};
use super::parser::{evaluate_expression, FunctionRegistry, Parser, referenced_identifiers};
use super::segments::dynamic_segments;

/// Evaluates raw template strings against a variable context.
///
/// Evaluation is synchronous and pure: the only inputs are the template
/// text and the context, and a failing segment degrades to the empty
/// string instead of aborting its siblings.
///
/// Shapes handled:
/// - plain text passes through unchanged,
/// - a string that is exactly one `{{expr}}` span yields the expression's
///   typed value,
/// - anything else renders each segment and concatenates the results.
///
/// # Examples
///
/// ```
/// use propsheet::domain::{EvalContext, TemplateEvaluator, Value};
///
/// let ctx = EvalContext::new().with("userName", Value::from("Ann"));
/// let evaluator = TemplateEvaluator::new(&ctx);
///
/// assert_eq!(evaluator.evaluate_template("hello").value, Value::from("hello"));
/// assert_eq!(evaluator.evaluate_template("{{1+1}}").value, Value::Number(2.0));
/// assert_eq!(
///     evaluator.evaluate_template("hi {{userName}}!").value,
///     Value::from("hi Ann!")
/// );
/// ```
pub struct TemplateEvaluator<'a> {
    context: &'a EvalContext,
    registry: FunctionRegistry,
}

impl<'a> TemplateEvaluator<'a> {
    /// Creates a new template evaluator over the given context with the
    /// built-in function set.
    pub fn new(context: &'a EvalContext) -> Self {
        Self {
            context,
            registry: FunctionRegistry::new(),
        }
    }

    /// Creates an evaluator with a caller-supplied function registry.
    pub fn with_registry(context: &'a EvalContext, registry: FunctionRegistry) -> Self {
        Self { context, registry }
    }

    /// Evaluates a raw template string to its exposed value.
    ///
    /// A syntax error or a failed lookup inside one segment is recovered:
    /// the segment contributes nothing to the output and the first such
    /// failure is reported through the returned message.
    pub fn evaluate_template(&self, input: &str) -> ValueAndMsg<Value> {
        let segments: Vec<_> = dynamic_segments(input).collect();

        // A template that is exactly one expression keeps its typed value
        // instead of being rendered into a string.
        if segments.len() == 1 && segments[0].is_dynamic() {
            return match evaluate_expression(segments[0].code(), self.context, &self.registry) {
                Ok(value) => ValueAndMsg::new(value),
                Err(err) => {
                    warn!(code = segments[0].code(), %err, "expression evaluation failed");
                    ValueAndMsg::with_error(Value::Null, err.to_string())
                }
            };
        }

        let mut out = String::new();
        let mut msg = None;
        for segment in segments {
            if !segment.is_dynamic() {
                out.push_str(segment.as_str());
                continue;
            }
            match evaluate_expression(segment.code(), self.context, &self.registry) {
                Ok(value) => out.push_str(&value.to_display_string()),
                Err(err) => {
                    warn!(code = segment.code(), %err, "expression evaluation failed");
                    if msg.is_none() {
                        msg = Some(err.to_string());
                    }
                }
            }
        }

        ValueAndMsg { value: Value::String(out), msg }
    }

    /// Collects the context names a template depends on across all of its
    /// expression segments. Segments that fail to parse contribute no
    /// names; they surface their error at evaluation time instead.
    pub fn referenced_names(input: &str) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        for segment in dynamic_segments(input) {
            if !segment.is_dynamic() {
                continue;
            }
            if let Ok(mut parser) = Parser::new(segment.code()) {
                if let Ok(ast) = parser.parse() {
                    names.extend(referenced_identifiers(&ast));
                }
            }
        }
        names
    }
}
