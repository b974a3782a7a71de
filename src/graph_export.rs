//! Graph export functionality for dependency visualization.
//!
//! This module exports the container's registrations and their constructor
//! dependencies as a graph for visualization and debugging. DOT and Mermaid
//! output are always available; JSON requires the `graph-export` feature.

use std::collections::HashSet;
use std::fmt::Write as _;

use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::metadata::MetadataSource;
use crate::provider::is_provider_key;
use crate::registration::{Activator, Registry};
use crate::ServiceCollection;

/// How a registration produces its instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ActivationKind {
    /// Built by the container from constructor metadata
    Constructor,
    /// Built by a user factory
    Factory,
    /// Pre-built value
    Instance,
}

/// A node in the dependency graph: one effective registration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct GraphNode {
    /// Unique identifier for this node (the service identity)
    pub id: String,
    /// Display name of the implementation type
    pub implementation: String,
    /// Service lifetime
    pub lifetime: Lifetime,
    /// Whether the service is registered under a trait identity
    pub is_trait: bool,
    /// Whether the service is registered under a string token
    pub is_token: bool,
    pub activation: ActivationKind,
}

/// Types of dependency relationships between services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DependencyType {
    /// Declared constructor parameter
    Required,
    /// Parameter replaced by an injection override
    Injected,
    /// The provider itself
    Provider,
    /// Target has no registration
    Missing,
}

/// An edge from a service to one of its constructor dependencies.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct GraphEdge {
    /// Source node ID (the service that depends on another)
    pub from: String,
    /// Target node ID (the service being depended upon)
    pub to: String,
    /// Constructor parameter position
    pub parameter_index: usize,
    pub dependency_type: DependencyType,
}

/// Metadata about the entire dependency graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct GraphMetadata {
    /// Total number of effective registrations
    pub service_count: usize,
    /// Number of singleton services
    pub singleton_count: usize,
    /// Number of scoped services
    pub scoped_count: usize,
    /// Number of transient services
    pub transient_count: usize,
    /// Whether circular dependencies were detected
    pub has_circular_dependencies: bool,
}

/// Complete dependency graph of a container.
///
/// # Examples
///
/// ```
/// use keel_di::{ServiceCollection, DependencyGraph};
/// use keel_di::{Injectable, Arguments, ConstructorMetadata, DiResult};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct Database;
/// keel_di::injectable_default!(Database);
///
/// struct Users { db: Arc<Database> }
/// impl Injectable for Users {
///     fn metadata() -> ConstructorMetadata {
///         ConstructorMetadata::new().param::<Database>()
///     }
///     fn construct(args: &mut Arguments) -> DiResult<Self> {
///         Ok(Users { db: args.next()? })
///     }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton::<Database>().add_scoped::<Users>();
///
/// let graph = DependencyGraph::from_collection(&services);
/// assert_eq!(graph.nodes.len(), 2);
/// assert_eq!(graph.edges.len(), 1);
/// assert!(graph.to_dot().starts_with("digraph DependencyGraph {"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DependencyGraph {
    /// All service nodes in the graph
    pub nodes: Vec<GraphNode>,
    /// All dependency relationships between nodes
    pub edges: Vec<GraphEdge>,
    /// Graph-level metadata
    pub metadata: GraphMetadata,
}

impl DependencyGraph {
    /// Graph of the registrations currently in `services`.
    pub fn from_collection(services: &ServiceCollection) -> Self {
        services.dependency_graph()
    }

    pub(crate) fn build(registry: &Registry, metadata: &dyn MetadataSource) -> Self {
        let mut graph = DependencyGraph::default();
        let registered: HashSet<Key> = registry.effective().map(|r| r.descriptor.service).collect();

        for registration in registry.effective() {
            let descriptor = &registration.descriptor;
            let id = descriptor.service.to_string();
            let activation = match registration.activator {
                Activator::Constructor(_) => ActivationKind::Constructor,
                Activator::Factory(_) => ActivationKind::Factory,
                Activator::Instance(_) => ActivationKind::Instance,
            };

            match descriptor.lifetime {
                Lifetime::Singleton => graph.metadata.singleton_count += 1,
                Lifetime::Scoped => graph.metadata.scoped_count += 1,
                Lifetime::Transient => graph.metadata.transient_count += 1,
            }

            if let Some(dependencies) = registration.dependencies(metadata) {
                let declared = metadata
                    .parameters(&descriptor.implementation)
                    .unwrap_or_default();
                for (index, dependency) in dependencies.iter().enumerate() {
                    let dependency_type = if is_provider_key(dependency) {
                        DependencyType::Provider
                    } else if !registered.contains(dependency) {
                        DependencyType::Missing
                    } else if declared.get(index) != Some(dependency) {
                        DependencyType::Injected
                    } else {
                        DependencyType::Required
                    };
                    graph.edges.push(GraphEdge {
                        from: id.clone(),
                        to: dependency.to_string(),
                        parameter_index: index,
                        dependency_type,
                    });
                }
            }

            graph.nodes.push(GraphNode {
                id,
                implementation: descriptor.implementation_name().to_string(),
                lifetime: descriptor.lifetime,
                is_trait: matches!(descriptor.service, Key::Trait(..)),
                is_token: descriptor.service.is_token(),
                activation,
            });
        }

        graph.metadata.service_count = graph.nodes.len();
        graph.metadata.has_circular_dependencies = crate::validation::validate(registry, metadata)
            .errors
            .iter()
            .any(|e| matches!(e, crate::ValidationError::CircularDependency { .. }));
        graph
    }

    /// Exports graph as DOT format for Graphviz.
    pub fn to_dot(&self) -> String {
        let mut output = String::new();
        output.push_str("digraph DependencyGraph {\n");
        output.push_str("  rankdir=TB;\n");
        output.push_str("  node [shape=box];\n\n");

        for node in &self.nodes {
            let shape = if node.is_trait { "ellipse" } else { "box" };
            let color = match node.lifetime {
                Lifetime::Singleton => "lightblue",
                Lifetime::Scoped => "lightgreen",
                Lifetime::Transient => "lightyellow",
            };
            let _ = writeln!(
                output,
                "  \"{}\" [label=\"{}\\n({})\", shape={}, fillcolor={}, style=filled];",
                escape(&node.id),
                escape(&node.implementation),
                node.lifetime,
                shape,
                color
            );
        }

        output.push('\n');

        for edge in &self.edges {
            let style = match edge.dependency_type {
                DependencyType::Required => "solid",
                DependencyType::Injected => "dashed",
                DependencyType::Provider => "dotted",
                DependencyType::Missing => "bold, color=red",
            };
            let _ = writeln!(
                output,
                "  \"{}\" -> \"{}\" [style={}];",
                escape(&edge.from),
                escape(&edge.to),
                style
            );
        }

        output.push_str("}\n");
        output
    }

    /// Exports graph as a Mermaid flowchart.
    pub fn to_mermaid(&self) -> String {
        let mut output = String::from("graph TD\n");
        let ids: Vec<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        let node_ref = |id: &str| match ids.iter().position(|n| *n == id) {
            Some(i) => format!("n{}", i),
            None => format!("missing_{}", sanitize(id)),
        };

        for (i, node) in self.nodes.iter().enumerate() {
            let label = escape(&node.id);
            if node.is_trait {
                let _ = writeln!(output, "  n{}(\"{}\")", i, label);
            } else {
                let _ = writeln!(output, "  n{}[\"{}\"]", i, label);
            }
        }

        for edge in &self.edges {
            let arrow = match edge.dependency_type {
                DependencyType::Injected | DependencyType::Provider => "-.->",
                _ => "-->",
            };
            let _ = writeln!(output, "  {} {} {}", node_ref(&edge.from), arrow, node_ref(&edge.to));
        }

        output.push_str("\n  classDef singleton fill:#e1f5fe\n");
        output.push_str("  classDef scoped fill:#e8f5e8\n");
        output.push_str("  classDef transient fill:#fff3e0\n");
        for (i, node) in self.nodes.iter().enumerate() {
            let _ = writeln!(output, "  class n{} {}", i, node.lifetime);
        }

        output
    }

    /// Exports graph as pretty-printed JSON.
    #[cfg(feature = "graph-export")]
    pub fn to_json(&self) -> crate::DiResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| crate::DiError::Config(e.to_string()))
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Arguments, ConstructorMetadata, DiResult, Injectable};

    trait Store: Send + Sync {}

    #[derive(Default)]
    struct MemoryStore;
    impl Store for MemoryStore {}
    crate::injectable_default!(MemoryStore);

    struct Service;
    impl Injectable for Service {
        fn metadata() -> ConstructorMetadata {
            ConstructorMetadata::new()
                .param_trait::<dyn Store>()
                .param::<u64>()
                .param::<crate::ServiceProvider>()
                .inject(0, Key::token("store.memory"))
        }
        fn construct(_: &mut Arguments) -> DiResult<Self> {
            Ok(Service)
        }
    }

    fn graph() -> DependencyGraph {
        let mut services = ServiceCollection::new();
        services
            .add_singleton_token::<MemoryStore>("store.memory")
            .add_transient::<Service>()
            .add_scoped_factory::<String, _>(|_| Ok(String::new()));
        DependencyGraph::from_collection(&services)
    }

    #[test]
    fn classifies_edges() {
        let graph = graph();
        let kinds: Vec<_> = graph.edges.iter().map(|e| e.dependency_type).collect();
        assert_eq!(
            kinds,
            vec![
                DependencyType::Injected,
                DependencyType::Missing,
                DependencyType::Provider
            ]
        );
        assert_eq!(graph.metadata.service_count, 3);
        assert_eq!(graph.metadata.singleton_count, 1);
        assert_eq!(graph.metadata.scoped_count, 1);
        assert!(!graph.metadata.has_circular_dependencies);

        let factory = graph.nodes.iter().find(|n| n.activation == ActivationKind::Factory);
        assert!(factory.is_some());
    }

    #[test]
    fn dot_escapes_token_ids() {
        let dot = graph().to_dot();
        assert!(dot.contains("\"token \\\"store.memory\\\"\""));
        assert!(dot.contains("style=dashed"));
        assert!(dot.ends_with("}\n"));
    }

    #[test]
    fn mermaid_references_missing_targets() {
        let mermaid = graph().to_mermaid();
        assert!(mermaid.starts_with("graph TD\n"));
        assert!(mermaid.contains("missing_u64"));
        assert!(mermaid.contains("class n0 singleton"));
    }

    #[cfg(feature = "graph-export")]
    #[test]
    fn json_round_trips_through_serde_json() {
        let json = graph().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["nodes"].as_array().map(Vec::len), Some(3));
        assert_eq!(value["edges"][0]["dependency_type"], "injected");
        assert_eq!(value["nodes"][0]["lifetime"], "singleton");
    }
}
