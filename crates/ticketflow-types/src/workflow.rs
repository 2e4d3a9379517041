//! Workflow graph model: the static definition a ticket executes against
//!
//! A Workflow owns a set of Elements (nodes bound to an operation and its
//! parameters) connected by named Links (outcome-labeled directed edges).
//! Definitions are configuration: created before any ticket exists and
//! read-only during execution.

use crate::{FlowError, FlowResult, JsonMap};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The outcome name the default completion path follows
pub const DEFAULT_OUTCOME: &str = "next";

// ── Identifiers ──────────────────────────────────────────────────────

/// Unique identifier for a workflow
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkflowId(pub String);

impl WorkflowId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn short(&self) -> &str {
        &self.0[..8.min(self.0.len())]
    }
}

impl std::fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a workflow element
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(pub String);

impl ElementId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Workflow ─────────────────────────────────────────────────────────

/// A workflow definition — a directed graph of processing elements
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Workflow {
    /// Unique identifier
    pub id: WorkflowId,
    /// Human-readable name
    pub name: String,
    /// Unique slug
    pub slug: String,
    /// What this workflow accomplishes
    pub description: String,
    /// The elements of the graph
    pub elements: Vec<Element>,
    /// The outcome-labeled edges of the graph
    pub links: Vec<Link>,
    /// When this definition was created
    pub created_at: DateTime<Utc>,
}

impl Workflow {
    /// Create a new empty workflow definition
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id: WorkflowId::generate(),
            name: name.into(),
            slug: slug.into(),
            description: String::new(),
            elements: Vec::new(),
            links: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add an element to the graph.
    ///
    /// Fails if the slug is already taken within this workflow, or if the
    /// element is marked initial and an initial element already exists.
    pub fn add_element(&mut self, element: Element) -> FlowResult<ElementId> {
        if self.elements.iter().any(|e| e.slug_name == element.slug_name) {
            return Err(FlowError::DuplicateElementSlug(element.slug_name));
        }
        if element.is_initial && self.initial_element().is_some() {
            return Err(FlowError::DuplicateInitialElement(self.id.clone()));
        }
        let id = element.id.clone();
        self.elements.push(element);
        Ok(id)
    }

    /// Add a link to the graph.
    ///
    /// Both endpoints must already be elements of this workflow, which is
    /// what keeps links from crossing workflow boundaries.
    pub fn add_link(&mut self, link: Link) -> FlowResult<()> {
        if self.element(&link.source).is_none() {
            return Err(FlowError::LinkEndpointMissing(link.source));
        }
        if self.element(&link.target).is_none() {
            return Err(FlowError::LinkEndpointMissing(link.target));
        }
        self.links.push(link);
        Ok(())
    }

    /// The element tickets start at
    pub fn initial_element(&self) -> Option<&Element> {
        self.elements.iter().find(|e| e.is_initial)
    }

    /// Get an element by ID
    pub fn element(&self, id: &ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| &e.id == id)
    }

    /// Get an element by its workflow-scoped slug
    pub fn element_by_slug(&self, slug: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.slug_name == slug)
    }

    /// All links leaving an element, in definition order
    pub fn outgoing_links(&self, source: &ElementId) -> Vec<&Link> {
        self.links.iter().filter(|l| &l.source == source).collect()
    }

    /// Links leaving an element carrying a specific outcome name
    pub fn outgoing_links_named(&self, source: &ElementId, outcome: &str) -> Vec<&Link> {
        self.links
            .iter()
            .filter(|l| &l.source == source && l.slug_name == outcome)
            .collect()
    }

    /// Validate the definition: a workflow that accepts tickets must have
    /// exactly one initial element.
    pub fn validate(&self) -> FlowResult<()> {
        let initial_count = self.elements.iter().filter(|e| e.is_initial).count();
        if initial_count == 0 {
            return Err(FlowError::NoInitialElement(self.id.clone()));
        }
        if initial_count > 1 {
            return Err(FlowError::DuplicateInitialElement(self.id.clone()));
        }
        Ok(())
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }
}

// ── Element ──────────────────────────────────────────────────────────

/// A node in the workflow graph, bound to an operation and its parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Element {
    /// Unique identifier
    pub id: ElementId,
    /// Slug unique within the owning workflow
    pub slug_name: String,
    /// Slug of the registered operation handling this element
    pub operation: String,
    /// Opaque configuration consumed by the operation handler
    #[serde(default, skip_serializing_if = "JsonMap::is_empty")]
    pub op_params: JsonMap,
    /// Whether tickets start at this element
    pub is_initial: bool,
}

impl Element {
    /// Create an element bound to a registered operation
    pub fn new(slug_name: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            id: ElementId::generate(),
            slug_name: slug_name.into(),
            operation: operation.into(),
            op_params: JsonMap::new(),
            is_initial: false,
        }
    }

    /// Mark this element as the workflow's entry point
    pub fn initial(mut self) -> Self {
        self.is_initial = true;
        self
    }

    pub fn with_params(mut self, params: JsonMap) -> Self {
        self.op_params = params;
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.op_params.insert(key.into(), value);
        self
    }
}

// ── Link ─────────────────────────────────────────────────────────────

/// A named directed edge between two elements of the same workflow
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Link {
    /// Source element
    pub source: ElementId,
    /// Target element
    pub target: ElementId,
    /// Outcome name selecting this edge during traversal
    pub slug_name: String,
}

impl Link {
    /// Create a link carrying the default "next" outcome
    pub fn new(source: ElementId, target: ElementId) -> Self {
        Self {
            source,
            target,
            slug_name: DEFAULT_OUTCOME.to_string(),
        }
    }

    /// Create a link carrying a specific outcome name
    pub fn named(source: ElementId, target: ElementId, outcome: impl Into<String>) -> Self {
        Self {
            source,
            target,
            slug_name: outcome.into(),
        }
    }
}

// ── Operation Descriptor ─────────────────────────────────────────────

/// A named, registered operation: the descriptor half of the registry.
///
/// The handler itself lives in the execution core; descriptors are the
/// configuration-facing record of what can be bound to an element.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OperationDescriptor {
    /// Human-readable name
    pub name: String,
    /// Stable slug elements reference
    pub slug: String,
    /// What the operation does
    pub description: String,
}

impl OperationDescriptor {
    pub fn new(
        name: impl Into<String>,
        slug: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
            description: description.into(),
        }
    }
}
