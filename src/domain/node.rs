//! Memoized dependency nodes and the graph that evaluates them.
//!
//! A [`Node`] is the atomic unit of derived state: a compute closure plus
//! the names of the inputs it reads. Nodes cache their last evaluation and
//! skip recomputation while the input tuple is unchanged, so an action
//! that touches one control does not re-evaluate every expression on the
//! page. A [`DependencyGraph`] resolves node keys to other nodes or to
//! leaf values on demand, in dependency order, and rejects cycles.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace};

use super::errors::{EvalError, EvalResult};
use super::models::{EvalContext, Value};

/// Equality used to decide whether a dependency input changed.
pub type EqualityFn = fn(&Value, &Value) -> bool;

fn default_equality(a: &Value, b: &Value) -> bool {
    a == b
}

#[derive(Clone)]
struct CachedEvaluation {
    inputs: Vec<Value>,
    output: Value,
}

/// A lazily evaluated, cacheable derived value.
///
/// The node declares which keys it reads; the caller (usually a
/// [`DependencyGraph`]) supplies the current value of each key in the
/// declared order. Consecutive evaluations with a pairwise-equal input
/// tuple return the cached result without re-invoking the compute
/// closure. A compute error clears the cache so a stale value is never
/// substituted for a failed evaluation.
///
/// # Examples
///
/// ```
/// use propsheet::domain::{Node, Value};
///
/// let node = Node::new(vec!["a".into(), "b".into()], |inputs| {
///     let a = inputs[0].as_number().unwrap_or(0.0);
///     let b = inputs[1].as_number().unwrap_or(0.0);
///     Ok(Value::Number(a + b))
/// });
///
/// let out = node.evaluate(&[Value::Number(1.0), Value::Number(2.0)]).unwrap();
/// assert_eq!(out, Value::Number(3.0));
/// ```
pub struct Node {
    deps: Vec<String>,
    compute: Rc<dyn Fn(&[Value]) -> EvalResult<Value>>,
    equals: EqualityFn,
    cache: RefCell<Option<CachedEvaluation>>,
}

impl Node {
    /// Creates a node computing a derived value from the named inputs.
    pub fn new(
        deps: Vec<String>,
        compute: impl Fn(&[Value]) -> EvalResult<Value> + 'static,
    ) -> Self {
        Self {
            deps,
            compute: Rc::new(compute),
            equals: default_equality,
            cache: RefCell::new(None),
        }
    }

    /// A node with no dependencies. It is computed exactly once and the
    /// cached value serves every later evaluation.
    pub fn constant(value: Value) -> Self {
        Self::new(Vec::new(), move |_| Ok(value.clone()))
    }

    /// Composes a post-processing step over this node's output without
    /// re-declaring its dependencies.
    ///
    /// # Examples
    ///
    /// ```
    /// use propsheet::domain::{Node, Value};
    ///
    /// let doubled = Node::constant(Value::Number(21.0))
    ///     .with_function(|v| Ok(Value::Number(v.as_number().unwrap_or(0.0) * 2.0)));
    /// assert_eq!(doubled.evaluate(&[]).unwrap(), Value::Number(42.0));
    /// ```
    pub fn with_function(self, transform: impl Fn(Value) -> EvalResult<Value> + 'static) -> Node {
        let inner = self.compute;
        Node {
            deps: self.deps,
            compute: Rc::new(move |inputs| transform(inner(inputs)?)),
            equals: self.equals,
            cache: RefCell::new(None),
        }
    }

    /// Replaces the input equality used by the memoization check.
    pub fn with_equality(mut self, equals: EqualityFn) -> Self {
        self.equals = equals;
        self.cache = RefCell::new(None);
        self
    }

    /// The dependency keys this node reads, in input order.
    pub fn deps(&self) -> &[String] {
        &self.deps
    }

    /// Evaluates the node against the current input values.
    ///
    /// `inputs` must line up with [`Node::deps`]. If every input equals
    /// the one seen on the previous evaluation, the cached output is
    /// returned and the compute closure is not invoked.
    pub fn evaluate(&self, inputs: &[Value]) -> EvalResult<Value> {
        debug_assert_eq!(
            inputs.len(),
            self.deps.len(),
            "node inputs must match declared dependencies"
        );

        if let Some(cached) = self.cache.borrow().as_ref() {
            if cached.inputs.len() == inputs.len()
                && cached
                    .inputs
                    .iter()
                    .zip(inputs)
                    .all(|(old, new)| (self.equals)(old, new))
            {
                trace!(deps = ?self.deps, "node cache hit");
                return Ok(cached.output.clone());
            }
        }

        debug!(deps = ?self.deps, "node recompute");
        match (self.compute)(inputs) {
            Ok(output) => {
                *self.cache.borrow_mut() = Some(CachedEvaluation {
                    inputs: inputs.to_vec(),
                    output: output.clone(),
                });
                Ok(output)
            }
            Err(err) => {
                // Never let a later evaluation pick up a value that
                // predates the failure.
                *self.cache.borrow_mut() = None;
                Err(err)
            }
        }
    }
}

impl Clone for Node {
    fn clone(&self) -> Self {
        Self {
            deps: self.deps.clone(),
            compute: Rc::clone(&self.compute),
            equals: self.equals,
            cache: RefCell::new(self.cache.borrow().clone()),
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("deps", &self.deps)
            .field("cached", &self.cache.borrow().is_some())
            .finish()
    }
}

/// A demand-driven evaluator over named nodes and leaf values.
///
/// Keys resolve to leaves first, then to nodes; a node's dependencies are
/// brought current before the node itself is computed, so evaluation
/// order always respects the dependency DAG. A key that transitively
/// reaches itself is reported as a cycle instead of recursing forever.
///
/// # Examples
///
/// ```
/// use propsheet::domain::{DependencyGraph, Node, Value};
///
/// let mut graph = DependencyGraph::new();
/// graph.set_leaf("base", Value::Number(10.0));
/// graph.set_node(
///     "double",
///     Node::new(vec!["base".into()], |inputs| {
///         Ok(Value::Number(inputs[0].as_number().unwrap_or(0.0) * 2.0))
///     }),
/// );
///
/// assert_eq!(graph.evaluate("double").unwrap(), Value::Number(20.0));
/// ```
#[derive(Default, Debug, Clone)]
pub struct DependencyGraph {
    nodes: HashMap<String, Node>,
    leaves: HashMap<String, Value>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a leaf value, the graph's equivalent of an input variable.
    pub fn set_leaf(&mut self, key: impl Into<String>, value: Value) {
        self.leaves.insert(key.into(), value);
    }

    /// Copies every binding of a context into the graph as leaves.
    pub fn set_leaves_from(&mut self, context: &EvalContext) {
        for (name, value) in context.iter() {
            self.leaves.insert(name.clone(), value.clone());
        }
    }

    /// Registers a derived node under a key.
    pub fn set_node(&mut self, key: impl Into<String>, node: Node) {
        self.nodes.insert(key.into(), node);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.leaves.contains_key(key) || self.nodes.contains_key(key)
    }

    /// Evaluates the value behind a key, computing any dependencies that
    /// are not current.
    pub fn evaluate(&self, key: &str) -> EvalResult<Value> {
        let mut stack = Vec::new();
        self.evaluate_inner(key, &mut stack)
    }

    fn evaluate_inner(&self, key: &str, stack: &mut Vec<String>) -> EvalResult<Value> {
        if let Some(value) = self.leaves.get(key) {
            return Ok(value.clone());
        }

        if stack.iter().any(|entry| entry == key) {
            let mut chain = stack.join(" -> ");
            chain.push_str(" -> ");
            chain.push_str(key);
            return Err(EvalError::CircularDependency(chain));
        }

        let node = self
            .nodes
            .get(key)
            .ok_or_else(|| EvalError::UnknownDependency(key.to_string()))?;

        stack.push(key.to_string());
        let mut inputs = Vec::with_capacity(node.deps().len());
        for dep in node.deps() {
            match self.evaluate_inner(dep, stack) {
                Ok(value) => inputs.push(value),
                Err(err) => {
                    stack.pop();
                    return Err(err);
                }
            }
        }
        stack.pop();

        node.evaluate(&inputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counting_node(deps: Vec<String>, calls: Rc<Cell<usize>>) -> Node {
        Node::new(deps, move |inputs| {
            calls.set(calls.get() + 1);
            let sum: f64 = inputs.iter().filter_map(Value::as_number).sum();
            Ok(Value::Number(sum))
        })
    }

    #[test]
    fn test_memoization_skips_recompute() {
        let calls = Rc::new(Cell::new(0));
        let node = counting_node(vec!["a".into(), "b".into()], Rc::clone(&calls));

        let inputs = [Value::Number(1.0), Value::Number(2.0)];
        assert_eq!(node.evaluate(&inputs).unwrap(), Value::Number(3.0));
        assert_eq!(node.evaluate(&inputs).unwrap(), Value::Number(3.0));
        assert_eq!(calls.get(), 1, "unchanged inputs must not recompute");

        let changed = [Value::Number(1.0), Value::Number(5.0)];
        assert_eq!(node.evaluate(&changed).unwrap(), Value::Number(6.0));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_constant_computes_once() {
        let calls = Rc::new(Cell::new(0));
        let node = counting_node(Vec::new(), Rc::clone(&calls));

        for _ in 0..5 {
            assert_eq!(node.evaluate(&[]).unwrap(), Value::Number(0.0));
        }
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_error_propagates_without_stale_value() {
        let fail = Rc::new(Cell::new(false));
        let fail_flag = Rc::clone(&fail);
        let node = Node::new(vec!["x".into()], move |inputs| {
            if fail_flag.get() {
                Err(EvalError::DivisionByZero)
            } else {
                Ok(inputs[0].clone())
            }
        });

        assert_eq!(
            node.evaluate(&[Value::Number(1.0)]).unwrap(),
            Value::Number(1.0)
        );

        fail.set(true);
        // The inputs changed, the compute fails, and the old cached value
        // must not leak through.
        assert_eq!(
            node.evaluate(&[Value::Number(2.0)]),
            Err(EvalError::DivisionByZero)
        );

        fail.set(false);
        assert_eq!(
            node.evaluate(&[Value::Number(1.0)]).unwrap(),
            Value::Number(1.0)
        );
    }

    #[test]
    fn test_with_function_composition() {
        let calls = Rc::new(Cell::new(0));
        let node = counting_node(vec!["x".into()], Rc::clone(&calls))
            .with_function(|v| Ok(Value::Number(v.as_number().unwrap_or(0.0) * 10.0)));

        assert_eq!(node.deps(), ["x".to_string()]);
        let inputs = [Value::Number(4.0)];
        assert_eq!(node.evaluate(&inputs).unwrap(), Value::Number(40.0));
        assert_eq!(node.evaluate(&inputs).unwrap(), Value::Number(40.0));
        assert_eq!(calls.get(), 1, "composed node keeps memoization");
    }

    #[test]
    fn test_custom_equality() {
        let calls = Rc::new(Cell::new(0));
        // Treat all strings as interchangeable inputs.
        let node = counting_node(vec!["x".into()], Rc::clone(&calls))
            .with_equality(|a, b| a.type_name() == b.type_name());

        node.evaluate(&[Value::String("a".into())]).unwrap();
        node.evaluate(&[Value::String("b".into())]).unwrap();
        assert_eq!(calls.get(), 1);

        node.evaluate(&[Value::Number(1.0)]).unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_graph_resolves_through_layers() {
        let mut graph = DependencyGraph::new();
        graph.set_leaf("a", Value::Number(2.0));
        graph.set_node(
            "b",
            Node::new(vec!["a".into()], |inputs| {
                Ok(Value::Number(inputs[0].as_number().unwrap_or(0.0) + 1.0))
            }),
        );
        graph.set_node(
            "c",
            Node::new(vec!["b".into(), "a".into()], |inputs| {
                let b = inputs[0].as_number().unwrap_or(0.0);
                let a = inputs[1].as_number().unwrap_or(0.0);
                Ok(Value::Number(b * a))
            }),
        );

        assert_eq!(graph.evaluate("c").unwrap(), Value::Number(6.0));
    }

    #[test]
    fn test_graph_unknown_key() {
        let graph = DependencyGraph::new();
        assert_eq!(
            graph.evaluate("missing"),
            Err(EvalError::UnknownDependency("missing".into()))
        );
    }

    #[test]
    fn test_graph_detects_cycles() {
        let mut graph = DependencyGraph::new();
        graph.set_node(
            "a",
            Node::new(vec!["b".into()], |inputs| Ok(inputs[0].clone())),
        );
        graph.set_node(
            "b",
            Node::new(vec!["a".into()], |inputs| Ok(inputs[0].clone())),
        );

        match graph.evaluate("a") {
            Err(EvalError::CircularDependency(chain)) => {
                assert!(chain.contains("a") && chain.contains("b"));
            }
            other => panic!("expected cycle error, got {other:?}"),
        }
    }

    #[test]
    fn test_graph_self_cycle() {
        let mut graph = DependencyGraph::new();
        graph.set_node(
            "a",
            Node::new(vec!["a".into()], |inputs| Ok(inputs[0].clone())),
        );

        assert!(matches!(
            graph.evaluate("a"),
            Err(EvalError::CircularDependency(_))
        ));
    }

    #[test]
    fn test_leaf_shadows_node() {
        let mut graph = DependencyGraph::new();
        graph.set_node("k", Node::constant(Value::Number(1.0)));
        graph.set_leaf("k", Value::Number(2.0));

        assert_eq!(graph.evaluate("k").unwrap(), Value::Number(2.0));
    }
}
