//! Reference graph between record kinds.
//!
//! Nodes are [`RecordKind`]s; an edge runs from the kind being referenced to
//! the kind holding the reference, weighted by the [`ForeignKey`]. A kind may
//! only be persisted once every kind it points at has been persisted, so the
//! save tiers are a topological order of this graph.

use std::collections::BTreeSet;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::error::CoreError;
use crate::record::ForeignKey;
use crate::types::RecordKind;

/// Kind-level dependency graph built from [`ForeignKey::ALL`].
#[derive(Debug, Clone)]
pub struct SchemaGraph {
    graph: DiGraph<RecordKind, ForeignKey>,
}

impl SchemaGraph {
    pub fn new() -> Self {
        let mut graph = DiGraph::new();
        // Node index == RecordKind::index().
        for kind in RecordKind::ALL {
            graph.add_node(kind);
        }
        for fk in ForeignKey::ALL {
            graph.add_edge(node(fk.target()), node(fk.referencer()), fk);
        }
        SchemaGraph { graph }
    }

    /// Foreign keys that point at `kind`, in declaration order.
    pub fn dependents(&self, kind: RecordKind) -> Vec<ForeignKey> {
        let mut fks: Vec<ForeignKey> = self
            .graph
            .edges_directed(node(kind), Direction::Outgoing)
            .map(|edge| *edge.weight())
            .collect();
        fks.sort();
        fks
    }

    /// Kinds that `kind` references.
    pub fn prerequisites(&self, kind: RecordKind) -> BTreeSet<RecordKind> {
        self.graph
            .neighbors_directed(node(kind), Direction::Incoming)
            .map(|n| self.graph[n])
            .collect()
    }

    /// Persistence tiers: a topological order of the kinds, ties broken by
    /// declaration order.
    ///
    /// For the built-in schema this is `User, Project, Task, Watch`.
    pub fn tier_order(&self) -> Result<Vec<RecordKind>, CoreError> {
        let mut in_degree: Vec<usize> = self
            .graph
            .node_indices()
            .map(|n| self.graph.edges_directed(n, Direction::Incoming).count())
            .collect();

        let mut ready: BTreeSet<RecordKind> = self
            .graph
            .node_indices()
            .filter(|n| in_degree[n.index()] == 0)
            .map(|n| self.graph[n])
            .collect();

        let mut order = Vec::with_capacity(in_degree.len());
        while let Some(kind) = ready.pop_first() {
            order.push(kind);
            for edge in self.graph.edges_directed(node(kind), Direction::Outgoing) {
                let target = edge.target();
                in_degree[target.index()] -= 1;
                if in_degree[target.index()] == 0 {
                    ready.insert(self.graph[target]);
                }
            }
        }

        if order.len() != self.graph.node_count() {
            let stuck = self
                .graph
                .node_indices()
                .map(|n| self.graph[n])
                .filter(|kind| !order.contains(kind))
                .collect();
            return Err(CoreError::SchemaCycle { kinds: stuck });
        }
        Ok(order)
    }
}

impl Default for SchemaGraph {
    fn default() -> Self {
        Self::new()
    }
}

fn node(kind: RecordKind) -> NodeIndex<u32> {
    NodeIndex::new(kind.index())
}
