//! The execution engine.
//!
//! A graph's steps are run in hoisted declaration order, but that order is
//! only a fallback: resolving a path that starts with the name of a step
//! which has not run yet runs that step first. Every step runs at most once
//! per context, so a step reached both on demand and by the sequential pass
//! executes exactly once.
//!
//! Contexts live in an arena owned by the engine and follow call-stack
//! discipline: a sub-graph activation pushes a context, runs it to
//! completion and pops it, leaving only its output behind. A namespaced
//! child keeps the [`ContextId`] of its caller so unresolved `inputs.*`
//! paths can be retried there.

use std::collections::HashMap;
use std::sync::Arc;

use dgraph_transforms::TransformRegistry;
use dgraph_types::path::{first_segment, resolve, wildcard_target};
use dgraph_types::value::{loose_eq, type_name};
use dgraph_types::{
    Graph, GraphRef, GraphStep, InvokeMode, PathError, Step, StepKind, DEFAULT_CASE,
};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::context::{Context, ContextId, INPUTS_KEY};
use crate::error::{EvalError, EvalResult};

/// Map-mode input holding the sequence to iterate.
pub const COLLECTION_INPUT: &str = "collection";
/// Map-mode input each element is exposed under.
pub const ITEM_INPUT: &str = "item";
/// Prefix of the executed-step marker for an implicit template call.
const IMPLICIT_CALL_PREFIX: &str = "__implicit__";

/// Runs graphs against a transform registry.
pub struct Engine<'r> {
    registry: &'r TransformRegistry,
    config: EngineConfig,
    contexts: Vec<Context>,
    /// Templates registered anywhere in the current activation tree.
    templates: HashMap<String, Arc<Graph>>,
    depth: usize,
}

impl<'r> Engine<'r> {
    pub fn new(registry: &'r TransformRegistry, config: EngineConfig) -> Self {
        Self {
            registry,
            config,
            contexts: Vec::new(),
            templates: HashMap::new(),
            depth: 0,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Execute `graph` with `inputs` exposed as `inputs.*` and return the
    /// published, non-hidden results.
    pub fn run(
        &mut self,
        graph: impl Into<Arc<Graph>>,
        inputs: Value,
    ) -> EvalResult<Map<String, Value>> {
        self.contexts.clear();
        self.templates.clear();
        self.depth = 0;
        self.activate("<root>", graph.into(), Some(inputs), None)
    }

    // ══════════════════════════════════════════════════════════════════════
    // Activations
    // ══════════════════════════════════════════════════════════════════════

    /// Push a context for `graph`, run every step, pop it and hand back its
    /// output.
    ///
    /// Each activation counts one level towards `max_depth`; lookahead
    /// within a context does not.
    fn activate(
        &mut self,
        at: &str,
        graph: Arc<Graph>,
        inputs: Option<Value>,
        parent: Option<ContextId>,
    ) -> EvalResult<Map<String, Value>> {
        self.descend(at)?;
        let result = self.run_context(graph, inputs, parent);
        self.depth -= 1;
        result
    }

    fn run_context(
        &mut self,
        graph: Arc<Graph>,
        inputs: Option<Value>,
        parent: Option<ContextId>,
    ) -> EvalResult<Map<String, Value>> {
        let id = ContextId(self.contexts.len());
        self.contexts
            .push(Context::new(Arc::clone(&graph), inputs, parent));

        let result = graph
            .hoisted()
            .try_for_each(|step| self.execute_step(id, step));

        debug_assert_eq!(self.contexts.len(), id.0 + 1);
        let output = self
            .contexts
            .pop()
            .map(Context::into_output)
            .unwrap_or_default();
        result.map(|()| output)
    }

    fn context(&self, id: ContextId) -> &Context {
        &self.contexts[id.0]
    }

    fn context_mut(&mut self, id: ContextId) -> &mut Context {
        &mut self.contexts[id.0]
    }

    /// Count one level of context nesting, failing once the bound is reached.
    fn descend(&mut self, at: &str) -> EvalResult<()> {
        if self.depth >= self.config.max_depth {
            return Err(EvalError::CyclicReference {
                at: at.to_string(),
                depth: self.config.max_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn publish(&mut self, ctx: ContextId, key: &str, value: Value, hidden: bool) {
        if self.config.trace {
            info!(step = key, hidden, value = %value, "step executed");
        }
        self.context_mut(ctx).set_value(key, value, hidden);
    }

    // ══════════════════════════════════════════════════════════════════════
    // Step dispatch
    // ══════════════════════════════════════════════════════════════════════

    /// Run `step` in `ctx` unless it already ran there.
    fn execute_step(&mut self, ctx: ContextId, step: &Step) -> EvalResult<()> {
        if step.is_comment() || !self.context_mut(ctx).mark_executed(&step.name) {
            return Ok(());
        }
        self.dispatch(ctx, step)
    }

    fn dispatch(&mut self, ctx: ContextId, step: &Step) -> EvalResult<()> {
        let value = match &step.kind {
            StepKind::Static { value } => value.clone(),
            StepKind::Alias { mirror } => self.resolve_path(ctx, mirror)?,
            StepKind::Dereference {
                object_path,
                prop_name_path,
            } => {
                let object = self.resolve_path(ctx, object_path)?;
                let key = self.resolve_path(ctx, prop_name_path)?;
                dereference(&step.name, &object, &key)?
            }
            StepKind::Branch {
                test,
                cases,
                node_names,
            } => self.branch(ctx, step, test, cases, node_names)?,
            StepKind::Transform { function, params } => {
                self.transform(ctx, step, function, params)?
            }
            StepKind::Graph(graph) => return self.graph_step(ctx, step, graph),
            StepKind::Comment {} => return Ok(()),
        };
        self.publish(ctx, &step.name, value, step.is_hidden);
        Ok(())
    }

    fn branch(
        &mut self,
        ctx: ContextId,
        step: &Step,
        test: &str,
        cases: &[Value],
        node_names: &[Value],
    ) -> EvalResult<Value> {
        let value = self.resolve_path(ctx, test)?;
        let index = cases
            .iter()
            .position(|case| loose_eq(case, &value))
            .or_else(|| cases.iter().position(|case| case.as_str() == Some(DEFAULT_CASE)));
        let Some(node) = index.and_then(|i| node_names.get(i)) else {
            return Err(EvalError::NoMatchingCase {
                step: step.name.clone(),
                value: value.to_string(),
            });
        };
        self.resolve_value(ctx, node)
    }

    fn transform(
        &mut self,
        ctx: ContextId,
        step: &Step,
        function: &str,
        params: &Value,
    ) -> EvalResult<Value> {
        let registry = self.registry;
        if !registry.contains(function) {
            return Err(EvalError::UnknownTransform {
                step: step.name.clone(),
                function: function.to_string(),
            });
        }
        let params = self.resolve_params(ctx, params)?;
        if self.config.trace {
            debug!(step = %step.name, function, params = %params, "calling transform");
        }
        registry
            .call(function, &params)
            .map_err(|source| EvalError::Transform {
                step: step.name.clone(),
                function: function.to_string(),
                source,
            })
    }

    // ══════════════════════════════════════════════════════════════════════
    // Sub-graphs
    // ══════════════════════════════════════════════════════════════════════

    fn graph_step(&mut self, ctx: ContextId, step: &Step, graph: &GraphStep) -> EvalResult<()> {
        let body = self.body(step, &graph.graph_def)?;
        let Some(mode) = graph.invoke_mode() else {
            if self.config.trace {
                info!(template = %step.name, "template defined");
            }
            self.templates.insert(step.name.clone(), body);
            return Ok(());
        };

        if self.config.trace {
            info!(step = %step.name, ?mode, "sub-graph start");
        }
        match mode {
            InvokeMode::Plain => {
                let inputs = self.resolve_inputs(ctx, step, graph.inputs.as_ref())?;
                let output = self.activate(&step.name, body, Some(Value::Object(inputs)), None)?;
                self.publish(ctx, &step.name, Value::Object(output), step.is_hidden);
            }
            InvokeMode::Map => {
                let inputs = self.resolve_inputs(ctx, step, graph.inputs.as_ref())?;
                let items = match inputs.get(COLLECTION_INPUT) {
                    Some(Value::Array(items)) => items.clone(),
                    other => {
                        return Err(EvalError::TypeMismatch {
                            step: step.name.clone(),
                            message: format!(
                                "map collection must be an array, found {}",
                                other.map_or("nothing", type_name)
                            ),
                        })
                    }
                };
                let mut outputs = Vec::with_capacity(items.len());
                for item in items {
                    let mut element_inputs = inputs.clone();
                    element_inputs.insert(ITEM_INPUT.to_string(), item);
                    let output = self.activate(
                        &step.name,
                        Arc::clone(&body),
                        Some(Value::Object(element_inputs)),
                        None,
                    )?;
                    outputs.push(Value::Object(output));
                }
                self.publish(ctx, &step.name, Value::Array(outputs), step.is_hidden);
            }
            InvokeMode::Namespaced(namespace) => {
                let inputs = match &graph.inputs {
                    Some(inputs) => Some(Value::Object(self.resolve_inputs(ctx, step, Some(inputs))?)),
                    None => None,
                };
                let output = self.activate(&step.name, body, inputs, Some(ctx))?;
                self.publish(ctx, namespace, Value::Object(output), step.is_hidden);
            }
        }
        if self.config.trace {
            info!(step = %step.name, "sub-graph end");
        }
        Ok(())
    }

    fn body(&self, step: &Step, graph_def: &GraphRef) -> EvalResult<Arc<Graph>> {
        match graph_def {
            GraphRef::Inline(graph) => Ok(Arc::clone(graph)),
            GraphRef::Named(template) => {
                self.templates
                    .get(template)
                    .cloned()
                    .ok_or_else(|| EvalError::UndefinedTemplate {
                        step: step.name.clone(),
                        template: template.clone(),
                    })
            }
        }
    }

    /// Resolve a `graph` step's `inputs` into the child's input mapping.
    fn resolve_inputs(
        &mut self,
        ctx: ContextId,
        step: &Step,
        inputs: Option<&Value>,
    ) -> EvalResult<Map<String, Value>> {
        match inputs.map(|inputs| self.resolve_params(ctx, inputs)).transpose()? {
            None => Ok(Map::new()),
            Some(Value::Object(resolved)) => Ok(resolved),
            Some(other) => Err(EvalError::TypeMismatch {
                step: step.name.clone(),
                message: format!("inputs must resolve to an object, found {}", type_name(&other)),
            }),
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Resolution
    // ══════════════════════════════════════════════════════════════════════

    /// Resolve a `params` field: a mapping has each entry resolved, anything
    /// else is resolved as a single path-or-value.
    fn resolve_params(&mut self, ctx: ContextId, params: &Value) -> EvalResult<Value> {
        match params {
            Value::Object(entries) => entries
                .iter()
                .map(|(name, entry)| Ok((name.clone(), self.resolve_value(ctx, entry)?)))
                .collect::<EvalResult<Map<String, Value>>>()
                .map(Value::Object),
            other => self.resolve_value(ctx, other),
        }
    }

    /// Strings are paths; anything else is a literal.
    fn resolve_value(&mut self, ctx: ContextId, value: &Value) -> EvalResult<Value> {
        match value {
            Value::String(path) => self.resolve_path(ctx, path),
            literal => Ok(literal.clone()),
        }
    }

    /// Resolve `path`, degrading to the path string itself when nothing
    /// answers to it. A wildcard path has no such fallback: a projection
    /// over nothing fails.
    fn resolve_path(&mut self, ctx: ContextId, path: &str) -> EvalResult<Value> {
        match self.try_resolve(ctx, path)? {
            Some(value) => Ok(value),
            None if path.contains('*') => Err(match wildcard_target(path) {
                Some(target) => PathError::NotIterable {
                    path: path.to_string(),
                    target,
                },
                None => PathError::UnsupportedSyntax {
                    path: path.to_string(),
                },
            }
            .into()),
            None => {
                warn!(path, "could not resolve value, returning the path itself");
                Ok(Value::String(path.to_string()))
            }
        }
    }

    /// The resolution cascade:
    ///
    /// 1. the context's published values;
    /// 2. run the not-yet-executed step named by the first segment, retry;
    /// 3. call the template named by the first segment, retry;
    /// 4. for `inputs.*`, resolve the rest in the parent context.
    fn try_resolve(&mut self, ctx: ContextId, path: &str) -> EvalResult<Option<Value>> {
        if let Some(value) = self.lookup(ctx, path)? {
            return Ok(Some(value));
        }
        let head = first_segment(path);

        let graph = Arc::clone(self.context(ctx).graph());
        if let Some(step) = graph.find_step(head) {
            if !self.context(ctx).is_executed(&step.name) {
                self.execute_step(ctx, step)?;
                if let Some(value) = self.lookup(ctx, path)? {
                    return Ok(Some(value));
                }
            }
        }

        if let Some(template) = self.templates.get(head).cloned() {
            if self.call_template(ctx, head, template)? {
                if let Some(value) = self.lookup(ctx, path)? {
                    return Ok(Some(value));
                }
            }
        }

        let parent = self.context(ctx).parent();
        match (path.strip_prefix(INPUTS_KEY).and_then(|p| p.strip_prefix('.')), parent) {
            (Some(rest), Some(parent)) => self.try_resolve(parent, rest),
            _ => Ok(None),
        }
    }

    /// Treat a bare reference to a template as a zero-argument call in the
    /// caller's scope, published (hidden) under the template's name.
    /// Returns `false` if that call already happened in this context.
    fn call_template(
        &mut self,
        ctx: ContextId,
        name: &str,
        template: Arc<Graph>,
    ) -> EvalResult<bool> {
        let marker = format!("{IMPLICIT_CALL_PREFIX}{name}");
        if !self.context_mut(ctx).mark_executed(&marker) {
            return Ok(false);
        }
        if self.config.trace {
            info!(template = name, "implicit template call");
        }
        let output = self.activate(&marker, template, None, Some(ctx))?;
        self.publish(ctx, name, Value::Object(output), true);
        Ok(true)
    }

    fn lookup(&self, ctx: ContextId, path: &str) -> EvalResult<Option<Value>> {
        Ok(resolve(self.context(ctx).values(), path)?)
    }
}

/// Index `object` with `key`: a mapping by name, a sequence by position.
/// A missing entry is `null`.
fn dereference(step: &str, object: &Value, key: &Value) -> EvalResult<Value> {
    let found = match (object, key) {
        (Value::Object(fields), Value::String(name)) => fields.get(name),
        (Value::Object(fields), Value::Number(n)) => fields.get(&n.to_string()),
        (Value::Array(items), Value::Number(n)) => {
            n.as_u64().and_then(|i| usize::try_from(i).ok()).and_then(|i| items.get(i))
        }
        (Value::Array(items), Value::String(s)) => {
            s.parse::<usize>().ok().and_then(|i| items.get(i))
        }
        _ => {
            return Err(EvalError::TypeMismatch {
                step: step.to_string(),
                message: format!(
                    "cannot index {} with {}",
                    type_name(object),
                    type_name(key)
                ),
            })
        }
    };
    Ok(found.cloned().unwrap_or(Value::Null))
}
