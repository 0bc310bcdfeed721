//! Record Dependency Graph
//!
//! petgraph view of the records generated in one run: one node per record,
//! one edge per field whose STRUCT leaf targets another generated record.
//! Opaque targets produce no edges.

pub mod analysis;

pub use analysis::{compute_scc_analysis, BoxedField, CycleHandling, SccAnalysis, SccGroup};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;

use crate::codegen::artifacts::RecordDefinition;
use crate::codegen::names::QualifiedName;

/// Reference from a record field to another record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldEdge {
    pub field: String,
    /// Collection layers between the field and the referenced record
    pub depth: usize,
}

#[derive(Debug, Default)]
pub struct RecordGraph {
    pub(crate) graph: DiGraph<QualifiedName, FieldEdge>,
    index: HashMap<QualifiedName, NodeIndex>,
}

impl RecordGraph {
    /// Build the graph for a set of record definitions
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a RecordDefinition>,
    {
        let records: Vec<&RecordDefinition> = records.into_iter().collect();
        let mut graph = Self::default();
        for record in &records {
            graph.add_record(record.name());
        }
        for record in &records {
            for field in &record.fields {
                let Some(target) = field.target.as_ref().and_then(|t| t.record()) else {
                    continue;
                };
                let from = graph.add_record(record.name());
                let to = graph.add_record(target);
                graph.graph.add_edge(
                    from,
                    to,
                    FieldEdge {
                        field: field.name.clone(),
                        depth: field.ty.depth(),
                    },
                );
            }
        }
        graph
    }

    fn add_record(&mut self, name: &QualifiedName) -> NodeIndex {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.graph.add_node(name.clone());
        self.index.insert(name.clone(), idx);
        idx
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Records referenced by `name`'s fields
    pub fn dependencies(&self, name: &QualifiedName) -> Vec<&QualifiedName> {
        let Some(&idx) = self.index.get(name) else {
            return Vec::new();
        };
        let mut out: Vec<&QualifiedName> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .filter_map(|e| self.graph.node_weight(e.target()))
            .collect();
        out.sort();
        out.dedup();
        out
    }
}
