//! Record Graph Analysis
//!
//! Computes strongly connected components over generated records, marking
//! recursive records and the fields that need indirection in a target
//! language.

use petgraph::algo::kosaraju_scc;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{HashMap, HashSet};

use super::RecordGraph;
use crate::codegen::names::QualifiedName;

// =============================================================================
// Boxed Field
// =============================================================================

/// A direct field reference into its record's own cycle
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BoxedField {
    pub record: QualifiedName,
    pub field: String,
    pub target: QualifiedName,
    pub scc_id: usize,
}

// =============================================================================
// SCC Group
// =============================================================================

/// A cycle group: several records, or one record referencing itself
#[derive(Debug, Clone)]
pub struct SccGroup {
    pub id: usize,
    pub members: Vec<QualifiedName>,
    pub boxed_fields: Vec<BoxedField>,
    pub is_self_referential: bool,
}

/// Cycle metadata for one record
#[derive(Debug, Clone, Default)]
pub struct CycleHandling {
    /// None = acyclic
    pub scc_id: Option<usize>,
    pub is_self_referential: bool,
    pub boxed_fields: Vec<String>,
}

impl CycleHandling {
    pub fn is_cyclic(&self) -> bool {
        self.scc_id.is_some()
    }

    pub fn needs_boxing(&self, field: &str) -> bool {
        self.boxed_fields.iter().any(|f| f == field)
    }
}

// =============================================================================
// Analysis Result
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct SccAnalysis {
    pub groups: Vec<SccGroup>,
    pub cycle_handling: HashMap<QualifiedName, CycleHandling>,
    pub total_boxed_fields: usize,
}

impl SccAnalysis {
    pub fn get(&self, record: &QualifiedName) -> Option<&CycleHandling> {
        self.cycle_handling.get(record)
    }

    pub fn is_cyclic(&self, record: &QualifiedName) -> bool {
        self.get(record).is_some_and(CycleHandling::is_cyclic)
    }

    pub fn needs_boxing(&self, record: &QualifiedName, field: &str) -> bool {
        self.get(record).is_some_and(|h| h.needs_boxing(field))
    }
}

/// Compute cycle groups for a record graph.
///
/// Only direct references (no LIST/MAP layer) inside a group are boxed;
/// collections already provide indirection.
pub fn compute_scc_analysis(graph: &RecordGraph) -> SccAnalysis {
    let g = &graph.graph;
    let mut components: Vec<Vec<QualifiedName>> = Vec::new();
    let mut member_sets = Vec::new();

    for scc in kosaraju_scc(g) {
        let cyclic = scc.len() > 1
            || scc.iter().any(|&n| g.edges_directed(n, Direction::Outgoing).any(|e| e.target() == n));
        if !cyclic {
            continue;
        }
        let mut members: Vec<QualifiedName> = scc.iter().filter_map(|&n| g.node_weight(n).cloned()).collect();
        members.sort();
        components.push(members);
        member_sets.push(scc.into_iter().collect::<HashSet<_>>());
    }

    // Deterministic group ids
    let mut order: Vec<usize> = (0..components.len()).collect();
    order.sort_by(|&a, &b| components[a].cmp(&components[b]));

    let mut analysis = SccAnalysis::default();
    for (scc_id, &i) in order.iter().enumerate() {
        let nodes = &member_sets[i];
        let mut boxed_fields = Vec::new();
        let mut self_refs: HashSet<&QualifiedName> = HashSet::new();

        for &node in nodes {
            for edge in g.edges_directed(node, Direction::Outgoing) {
                if !nodes.contains(&edge.target()) {
                    continue;
                }
                if edge.target() == node {
                    self_refs.extend(g.node_weight(node));
                }
                if edge.weight().depth > 0 {
                    continue;
                }
                if let (Some(record), Some(target)) = (g.node_weight(node), g.node_weight(edge.target())) {
                    boxed_fields.push(BoxedField {
                        record: record.clone(),
                        field: edge.weight().field.clone(),
                        target: target.clone(),
                        scc_id,
                    });
                }
            }
        }
        boxed_fields.sort_by(|a, b| (&a.record, &a.field).cmp(&(&b.record, &b.field)));

        for member in &components[i] {
            let handling = analysis.cycle_handling.entry(member.clone()).or_default();
            handling.scc_id = Some(scc_id);
            handling.is_self_referential = self_refs.contains(member);
            handling.boxed_fields = boxed_fields
                .iter()
                .filter(|b| &b.record == member)
                .map(|b| b.field.clone())
                .collect();
        }

        analysis.total_boxed_fields += boxed_fields.len();
        analysis.groups.push(SccGroup {
            id: scc_id,
            members: components[i].clone(),
            boxed_fields,
            is_self_referential: !self_refs.is_empty(),
        });
    }

    analysis
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::artifacts::{RecordDefinition, RecordField, StructTarget};
    use crate::codegen::config::NamingConfig;
    use crate::codegen::methods;
    use crate::codegen::names::Namer;
    use crate::fingerprint::Fingerprint;
    use crate::types::{ScalarKind, Type};

    fn record(name: &str, fields: Vec<RecordField>) -> RecordDefinition {
        let config = NamingConfig::default();
        let names = Namer::new(&config).artifact_names(name);
        RecordDefinition {
            methods: methods::synthesize(&names.record, &fields),
            names,
            identity: None,
            description: None,
            fields,
            capabilities: vec![],
            fingerprint: Fingerprint::from(0),
            root: false,
            recursive: false,
        }
    }

    fn field(name: &str, ty: Type, target: Option<&str>) -> RecordField {
        let config = NamingConfig::default();
        RecordField {
            name: name.to_string(),
            wire_name: name.to_string(),
            accessor: name.to_string(),
            constant: name.to_uppercase(),
            signature: ty.to_string(),
            ty,
            target: target.map(|t| StructTarget::Generated(Namer::new(&config).artifact_names(t))),
            description: None,
            default_value: None,
            sample_value: None,
            position: None,
            boxed: false,
        }
    }

    #[test]
    fn test_acyclic_records() {
        let records = vec![
            record("Address", vec![field("city", Type::Scalar(ScalarKind::String), None)]),
            record("Order", vec![field("shipTo", Type::Struct, Some("Address"))]),
        ];
        let graph = RecordGraph::from_records(&records);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        let analysis = compute_scc_analysis(&graph);
        assert!(analysis.groups.is_empty());
        assert!(!analysis.is_cyclic(records[1].name()));
        assert_eq!(graph.dependencies(records[1].name()), vec![records[0].name()]);
        assert!(graph.dependencies(records[0].name()).is_empty());
    }

    #[test]
    fn test_self_reference_boxes_direct_field_only() {
        let records = vec![record(
            "Node",
            vec![
                field("parent", Type::Struct, Some("Node")),
                field("children", Type::list(Type::Struct), Some("Node")),
            ],
        )];
        let analysis = compute_scc_analysis(&RecordGraph::from_records(&records));
        let name = records[0].name();
        assert!(analysis.is_cyclic(name));
        assert!(analysis.get(name).unwrap().is_self_referential);
        assert!(analysis.needs_boxing(name, "parent"));
        assert!(!analysis.needs_boxing(name, "children"));
        assert_eq!(analysis.total_boxed_fields, 1);
    }

    #[test]
    fn test_mutual_recursion() {
        let records = vec![
            record("A", vec![field("b", Type::Struct, Some("B"))]),
            record("B", vec![field("a", Type::map(Type::Struct), Some("A"))]),
            record("C", vec![field("a", Type::Struct, Some("A"))]),
        ];
        let analysis = compute_scc_analysis(&RecordGraph::from_records(&records));
        assert_eq!(analysis.groups.len(), 1);
        assert_eq!(analysis.groups[0].members.len(), 2);
        assert!(analysis.needs_boxing(records[0].name(), "b"));
        assert!(!analysis.needs_boxing(records[1].name(), "a"));
        assert!(!analysis.is_cyclic(records[2].name()));
    }
}
