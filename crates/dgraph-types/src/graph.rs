//! The declarative graph model.
//!
//! A [`Graph`] is an ordered list of [`Step`]s, each a closed [`StepKind`]
//! variant. The declared order is only a fallback execution order: steps
//! reference each other by name and the engine runs dependencies on demand.
//!
//! The serialized form is the persisted JSON document format, so existing
//! stored graphs deserialize unchanged (`isHidden`, `graphDef`, `nodeNames`,
//! and so on).

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{GraphError, GraphResult};

/// Sentinel entry in a branch's `cases` that matches any test value.
pub const DEFAULT_CASE: &str = "_default_";

/// Step type tags recognised by [`StepKind`].
const STEP_TYPES: &[&str] = &[
    "static",
    "alias",
    "dereference",
    "branch",
    "transform",
    "graph",
    "comment",
];

// ══════════════════════════════════════════════════════════════════════════════
// Steps
// ══════════════════════════════════════════════════════════════════════════════

/// One named, typed computation node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Unique within its graph; the key its result is published under.
    #[serde(default)]
    pub name: String,
    /// Recorded for other steps to reference, but left out of the output.
    #[serde(default, rename = "isHidden", skip_serializing_if = "is_false")]
    pub is_hidden: bool,
    /// Free-form annotation, never executed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    #[serde(flatten)]
    pub kind: StepKind,
}

/// The variant payload of a step, discriminated by its `type` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StepKind {
    /// A literal value.
    Static {
        #[serde(default)]
        value: Value,
    },
    /// Republish the value at `mirror`.
    Alias { mirror: String },
    /// Resolve an object and a key, then index the one with the other.
    Dereference {
        #[serde(rename = "objectPath")]
        object_path: String,
        #[serde(rename = "propNamePath")]
        prop_name_path: String,
    },
    /// Pick one of `node_names` by matching `test` against `cases`.
    Branch {
        test: String,
        cases: Vec<Value>,
        #[serde(rename = "nodeNames")]
        node_names: Vec<Value>,
    },
    /// Call a named function from the transform registry.
    Transform {
        #[serde(rename = "fn")]
        function: String,
        #[serde(default)]
        params: Value,
    },
    /// Define a template or invoke a sub-graph.
    Graph(GraphStep),
    /// Annotation only.
    Comment {},
}

impl Step {
    /// The key this step's result is published under: the namespace for a
    /// namespaced invocation, the step name otherwise.
    pub fn publish_key(&self) -> &str {
        match &self.kind {
            StepKind::Graph(graph) => match graph.invoke_mode() {
                Some(InvokeMode::Namespaced(namespace)) => namespace,
                _ => &self.name,
            },
            _ => &self.name,
        }
    }

    /// Whether this step registers a template instead of executing.
    pub fn is_template_definition(&self) -> bool {
        matches!(&self.kind, StepKind::Graph(graph) if graph.is_template_definition())
    }

    pub fn is_comment(&self) -> bool {
        matches!(self.kind, StepKind::Comment { .. })
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Sub-graph steps
// ══════════════════════════════════════════════════════════════════════════════

/// Payload of a `graph` step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphStep {
    #[serde(rename = "graphDef")]
    pub graph_def: GraphRef,
    #[serde(default, rename = "isTemplate", skip_serializing_if = "is_false")]
    pub is_template: bool,
    /// Argument name → path-or-literal, resolved in the caller's context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<Value>,
    #[serde(
        default,
        rename = "collectionMode",
        skip_serializing_if = "Option::is_none"
    )]
    pub collection_mode: Option<CollectionMode>,
    /// Run in the caller's scope and publish under this key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// The body of a `graph` step: inline steps, or the name of a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GraphRef {
    Inline(Arc<Graph>),
    Named(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionMode {
    /// Run the body once per element of `inputs.collection`.
    Map,
}

/// How a non-template `graph` step runs its body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvokeMode<'a> {
    /// Fresh child context fed by the `inputs` mapping.
    Plain,
    /// One fresh child context per element of `inputs.collection`.
    Map,
    /// Child context linked to the caller; published under the namespace.
    Namespaced(&'a str),
}

impl GraphStep {
    /// A step defines a template when `isTemplate` is set, or when it carries
    /// an inline body with neither `inputs` nor a `namespace`.
    pub fn is_template_definition(&self) -> bool {
        self.is_template
            || (matches!(self.graph_def, GraphRef::Inline(_))
                && self.inputs.is_none()
                && self.namespace.is_none())
    }

    /// The invocation mode, or `None` for a template definition.
    ///
    /// `collectionMode: "map"` takes precedence over `namespace`.
    pub fn invoke_mode(&self) -> Option<InvokeMode<'_>> {
        if self.is_template_definition() {
            return None;
        }
        Some(match (self.collection_mode, self.namespace.as_deref()) {
            (Some(CollectionMode::Map), _) => InvokeMode::Map,
            (None, Some(namespace)) => InvokeMode::Namespaced(namespace),
            (None, None) => InvokeMode::Plain,
        })
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Graphs
// ══════════════════════════════════════════════════════════════════════════════

/// An ordered sequence of steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Graph {
    steps: Vec<Step>,
}

impl Graph {
    /// Build a graph from already-typed steps, rejecting duplicate names.
    pub fn new(steps: Vec<Step>) -> GraphResult<Self> {
        let graph = Self { steps };
        graph.validate("graph")?;
        Ok(graph)
    }

    /// Load a graph from its persisted JSON form (a step array).
    pub fn from_value(value: &Value) -> GraphResult<Self> {
        let Value::Array(steps) = value else {
            return Err(GraphError::NotAGraph);
        };
        check_step_types(steps, "data")?;
        let graph: Graph = serde_json::from_value(value.clone())
            .map_err(|e| GraphError::Malformed(e.to_string()))?;
        graph.validate("data")?;
        Ok(graph)
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// First step whose name or publish key is `name`.
    pub fn find_step(&self, name: &str) -> Option<&Step> {
        self.steps
            .iter()
            .filter(|step| !step.is_comment())
            .find(|step| step.name == name || step.publish_key() == name)
    }

    /// Steps in execution order: template definitions first, then the rest,
    /// each group keeping its declared relative order.
    pub fn hoisted(&self) -> impl Iterator<Item = &Step> {
        let (templates, others): (Vec<&Step>, Vec<&Step>) = self
            .steps
            .iter()
            .partition(|step| step.is_template_definition());
        templates.into_iter().chain(others)
    }

    /// Reject duplicate step names or publish keys here and in every inline
    /// sub-graph.
    fn validate(&self, location: &str) -> GraphResult<()> {
        let mut seen = HashSet::new();
        for (index, step) in self.steps.iter().enumerate() {
            if step.is_comment() {
                continue;
            }
            let here = format!("{location}[{index}]");
            // A namespaced step is found by its namespace too.
            let keys = [step.name.as_str(), step.publish_key()];
            if let Some(name) = keys.iter().find(|name| seen.contains(**name)) {
                return Err(GraphError::DuplicateStepName {
                    location: here,
                    name: name.to_string(),
                });
            }
            seen.extend(keys);
            if let StepKind::Graph(GraphStep {
                graph_def: GraphRef::Inline(inner),
                ..
            }) = &step.kind
            {
                inner.validate(&format!("{here}.graphDef"))?;
            }
        }
        Ok(())
    }
}

/// Walk raw step objects (and inline bodies) before typed deserialization so
/// an unknown `type` is reported as such rather than as a serde message.
fn check_step_types(steps: &[Value], location: &str) -> GraphResult<()> {
    for (index, step) in steps.iter().enumerate() {
        let here = format!("{location}[{index}]");
        let found = match step.get("type") {
            Some(Value::String(tag)) => tag,
            Some(other) => {
                return Err(GraphError::UnknownStepType {
                    location: here,
                    found: other.to_string(),
                })
            }
            None => return Err(GraphError::MissingStepType { location: here }),
        };
        if !STEP_TYPES.contains(&found.as_str()) {
            return Err(GraphError::UnknownStepType {
                location: here,
                found: found.clone(),
            });
        }
        if let Some(Value::Array(inner)) = step.get("graphDef") {
            check_step_types(inner, &format!("{here}.graphDef"))?;
        }
    }
    Ok(())
}

// ══════════════════════════════════════════════════════════════════════════════
// Persisted documents
// ══════════════════════════════════════════════════════════════════════════════

/// A stored, versioned graph: `{ namespace, name, data, type }`.
///
/// Only `data` is executed; the rest identifies the document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub data: Graph,
}

impl GraphDocument {
    /// Accept either a bare step array or the document wrapper.
    pub fn from_value(value: &Value) -> GraphResult<Self> {
        match value {
            Value::Array(_) => Ok(Self {
                data: Graph::from_value(value)?,
                ..Self::default()
            }),
            Value::Object(fields) => {
                let data = Graph::from_value(fields.get("data").ok_or(GraphError::NotAGraph)?)?;
                let text = |key: &str| fields.get(key).and_then(Value::as_str).map(String::from);
                Ok(Self {
                    namespace: text("namespace"),
                    name: text("name"),
                    version: fields.get("version").and_then(Value::as_u64),
                    kind: text("type"),
                    data,
                })
            }
            _ => Err(GraphError::NotAGraph),
        }
    }

    /// `namespace/name@version`, for log lines.
    pub fn label(&self) -> String {
        let mut label = match (&self.namespace, &self.name) {
            (Some(namespace), Some(name)) => format!("{namespace}/{name}"),
            (None, Some(name)) => name.clone(),
            (Some(namespace), None) => namespace.clone(),
            (None, None) => "<anonymous>".to_string(),
        };
        if let Some(version) = self.version {
            label.push_str(&format!("@{version}"));
        }
        label
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}
