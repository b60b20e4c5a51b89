//! Index Registry - the closed catalog of known index implementations
//!
//! Each physical index the query engine can pick is described by one
//! [`IndexDescriptor`]: a stable class identifier, the token its explain-plan
//! annotation starts with, and the short names the engine uses for it in
//! cost log lines.
//!
//! ```text
//!   explain plan ──► PlanParser ──┐
//!                                 ├──► IndexRegistry (ordered, read-only)
//!   cost log lines ──► CostExtractor ┘
//! ```

mod plan;

pub use plan::{PlanParser, PLAN_MARKER};

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// A catalog entry identifying one index implementation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDescriptor {
    /// Fully qualified name of the index implementation
    pub class_identifier: String,

    /// Token the plan's index annotation starts with (or equals)
    pub plan_prefix: String,

    /// Names the engine uses for this index in cost log lines
    pub short_names: Vec<String>,
}

impl IndexDescriptor {
    pub fn new(class_identifier: &str, plan_prefix: &str, short_names: &[&str]) -> Self {
        Self {
            class_identifier: class_identifier.to_string(),
            plan_prefix: plan_prefix.to_string(),
            short_names: short_names.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Whether a plan annotation identifier belongs to this index
    pub fn matches_plan(&self, identifier: &str) -> bool {
        identifier.starts_with(&self.plan_prefix)
    }

    /// Short names joined for display, e.g. `lucene-property`
    pub fn short_names_display(&self) -> String {
        self.short_names.join(", ")
    }
}

/// Ordered, immutable collection of index descriptors
#[derive(Debug, Clone)]
pub struct IndexRegistry {
    descriptors: Vec<IndexDescriptor>,
}

impl IndexRegistry {
    /// Registry with the built-in index implementations
    pub fn new() -> Self {
        Self::from_descriptors(builtin_descriptors())
    }

    /// Registry over a custom descriptor list, kept in the given order
    pub fn from_descriptors(descriptors: Vec<IndexDescriptor>) -> Self {
        Self { descriptors }
    }

    /// Process-wide built-in registry
    pub fn global() -> &'static IndexRegistry {
        static REGISTRY: OnceLock<IndexRegistry> = OnceLock::new();
        REGISTRY.get_or_init(IndexRegistry::new)
    }

    /// All descriptors in registration order
    pub fn all(&self) -> &[IndexDescriptor] {
        &self.descriptors
    }

    /// Look up a descriptor by class identifier
    pub fn by_class(&self, class_identifier: &str) -> Option<&IndexDescriptor> {
        self.descriptors
            .iter()
            .find(|d| d.class_identifier == class_identifier)
    }

    /// Look up the first descriptor that logs under `short_name`
    pub fn by_short_name(&self, short_name: &str) -> Option<&IndexDescriptor> {
        self.descriptors
            .iter()
            .find(|d| d.short_names.iter().any(|n| n == short_name))
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl Default for IndexRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn builtin_descriptors() -> Vec<IndexDescriptor> {
    vec![
        IndexDescriptor::new(
            "org.apache.jackrabbit.oak.plugins.index.lucene.LucenePropertyIndex",
            "lucene:",
            &["lucene-property"],
        ),
        IndexDescriptor::new(
            "org.apache.jackrabbit.oak.plugins.index.nodetype.NodeTypeIndex",
            "nodeType",
            &["nodeType"],
        ),
        IndexDescriptor::new(
            "org.apache.jackrabbit.oak.plugins.index.property.PropertyIndex",
            "property",
            &["property"],
        ),
        IndexDescriptor::new(
            "org.apache.jackrabbit.oak.query.index.TraversingIndex",
            "traverse",
            &["traverse"],
        ),
        IndexDescriptor::new(
            "org.apache.jackrabbit.oak.plugins.index.reference.ReferenceIndex",
            "reference",
            &["reference"],
        ),
        IndexDescriptor::new(
            "org.apache.jackrabbit.oak.plugins.index.property.OrderedPropertyIndex",
            "ordered",
            &["ordered"],
        ),
        IndexDescriptor::new(
            "org.apache.jackrabbit.oak.plugins.index.solr.query.SolrQueryIndex",
            "solr:",
            &["solr"],
        ),
    ]
}
