//! Structural validation of a graph prior to freezing.
//!
//! Validation accumulates every issue it can find in one pass, the same
//! error-collection discipline the configuration loader uses: callers should
//! never have to fix one problem just to discover the next.
//!
//! Checks, in order:
//!
//! 1. **Slot resolution**: every slot is wired to a virtual buffer or
//!    promoted to a graph parameter.
//! 2. **Shape compatibility**: every virtual binding matches its slot.
//! 3. **Single producer**: no virtual buffer is written by two stages, and
//!    none is read without a producer.
//! 4. **Acyclicity**: DFS with an explicit recursion path, so the reported
//!    cycle names the stages on it.

use std::collections::HashMap;

use crate::errors::ValidationIssue;
use crate::graph::builder::{Graph, SlotBinding};
use crate::graph::{PortDirection, StageId, VirtualId};

/// Runs every structural check and returns all issues found.
pub(crate) fn collect_issues(graph: &Graph) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    collect_slot_issues(graph, &mut issues);
    collect_producer_issues(graph, &mut issues);
    if let Some(path) = find_cycle(graph) {
        issues.push(ValidationIssue::CycleDetected { path });
    }

    issues
}

fn collect_slot_issues(graph: &Graph, issues: &mut Vec<ValidationIssue>) {
    for (idx, entry) in graph.stages.iter().enumerate() {
        let stage_id = StageId(idx);
        let sides = [
            (PortDirection::Input, &entry.inputs, &entry.promoted_inputs, entry.stage.input_slots()),
            (PortDirection::Output, &entry.outputs, &entry.promoted_outputs, entry.stage.output_slots()),
        ];
        for (direction, bindings, promoted, slots) in sides {
            for (slot, binding) in bindings.iter().enumerate() {
                match binding {
                    SlotBinding::Unbound => {
                        if promoted[slot].is_none() {
                            issues.push(ValidationIssue::UnboundSlot {
                                stage_id,
                                stage_name: entry.name().to_string(),
                                direction,
                                slot,
                                slot_name: slots[slot].name.to_string(),
                            });
                        }
                    }
                    SlotBinding::Virtual(v) => {
                        if let Some(actual) = graph.virtuals.get(v.0) {
                            let expected = slots[slot].desc;
                            if *actual != expected {
                                issues.push(ValidationIssue::ShapeMismatch {
                                    stage_id,
                                    stage_name: entry.name().to_string(),
                                    slot_name: slots[slot].name.to_string(),
                                    expected,
                                    actual: *actual,
                                });
                            }
                        }
                    }
                }
            }
        }
    }
}

fn collect_producer_issues(graph: &Graph, issues: &mut Vec<ValidationIssue>) {
    let mut writers: HashMap<usize, StageId> = HashMap::new();
    for (idx, entry) in graph.stages.iter().enumerate() {
        for binding in &entry.outputs {
            if let SlotBinding::Virtual(v) = binding {
                if let Some(first) = writers.get(&v.0) {
                    issues.push(ValidationIssue::MultipleWriters {
                        virtual_id: VirtualId(v.0),
                        first: *first,
                        second: StageId(idx),
                    });
                } else {
                    writers.insert(v.0, StageId(idx));
                }
            }
        }
    }
    for (idx, entry) in graph.stages.iter().enumerate() {
        for binding in &entry.inputs {
            if let SlotBinding::Virtual(v) = binding {
                if !writers.contains_key(&v.0) {
                    issues.push(ValidationIssue::NeverProduced {
                        virtual_id: VirtualId(v.0),
                        reader: StageId(idx),
                    });
                }
            }
        }
    }
}

/// DFS cycle detection over the internal edges. Returns the stage names on
/// the cycle path, producer first.
pub(crate) fn find_cycle(graph: &Graph) -> Option<Vec<String>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Color {
        White,
        Gray,
        Black,
    }

    let edges = graph.adjacency();
    let mut colors = vec![Color::White; graph.stages.len()];
    let mut path: Vec<usize> = Vec::new();

    fn visit(
        node: usize,
        edges: &HashMap<usize, Vec<usize>>,
        colors: &mut [Color],
        path: &mut Vec<usize>,
    ) -> Option<usize> {
        colors[node] = Color::Gray;
        path.push(node);
        if let Some(next) = edges.get(&node) {
            for &n in next {
                match colors[n] {
                    Color::Gray => return Some(n),
                    Color::White => {
                        if let Some(start) = visit(n, edges, colors, path) {
                            return Some(start);
                        }
                    }
                    Color::Black => {}
                }
            }
        }
        colors[node] = Color::Black;
        path.pop();
        None
    }

    for start in 0..graph.stages.len() {
        if colors[start] == Color::White {
            if let Some(entry) = visit(start, &edges, &mut colors, &mut path) {
                let from = path.iter().position(|&n| n == entry).unwrap_or(0);
                let mut names: Vec<String> = path[from..]
                    .iter()
                    .map(|&n| graph.stages[n].name().to_string())
                    .collect();
                names.push(graph.stages[entry].name().to_string());
                return Some(names);
            }
        }
    }
    None
}

/// Deterministic topological order: Kahn's algorithm, ties broken by
/// insertion order so repeated runs schedule identically.
pub(crate) fn topological_order(graph: &Graph) -> Vec<StageId> {
    let edges = graph.adjacency();
    let mut indegree = vec![0usize; graph.stages.len()];
    for targets in edges.values() {
        for &t in targets {
            indegree[t] += 1;
        }
    }

    let mut order = Vec::with_capacity(graph.stages.len());
    let mut placed = vec![false; graph.stages.len()];
    while order.len() < graph.stages.len() {
        let next = (0..graph.stages.len())
            .find(|&n| !placed[n] && indegree[n] == 0)
            .expect("verified graph is acyclic");
        placed[next] = true;
        order.push(StageId(next));
        if let Some(targets) = edges.get(&next) {
            for &t in targets {
                indegree[t] -= 1;
            }
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::buffers::{ImageDesc, PixelFormat};
    use crate::graph::Graph;
    use crate::stages::IdentityCopy;

    fn desc() -> ImageDesc {
        ImageDesc::new(8, 8, PixelFormat::Gray8)
    }

    #[test]
    fn dangling_unbound_slot_is_reported_by_name() {
        let mut graph = Graph::new();
        graph
            .add_stage(
                Arc::new(IdentityCopy::new(desc())),
                vec![SlotBinding::Unbound],
                vec![SlotBinding::Unbound],
            )
            .unwrap();

        let issues = collect_issues(&graph);
        assert_eq!(issues.len(), 2);
        match &issues[0] {
            ValidationIssue::UnboundSlot { slot_name, direction, .. } => {
                assert_eq!(slot_name, "src");
                assert_eq!(*direction, PortDirection::Input);
            }
            other => panic!("expected UnboundSlot, got {other:?}"),
        }
    }

    #[test]
    fn consumed_but_never_produced_virtual_is_reported() {
        let mut graph = Graph::new();
        let v = graph.virtual_buffer(desc()).unwrap();
        let stage = graph
            .add_stage(
                Arc::new(IdentityCopy::new(desc())),
                vec![SlotBinding::Virtual(v)],
                vec![SlotBinding::Unbound],
            )
            .unwrap();
        graph
            .promote_parameter(stage, PortDirection::Output, 0)
            .unwrap();

        let issues = collect_issues(&graph);
        assert!(issues
            .iter()
            .any(|i| matches!(i, ValidationIssue::NeverProduced { .. })));
    }

    #[test]
    fn chain_orders_by_insertion_on_ties() {
        let mut graph = Graph::new();
        let a_out = graph.virtual_buffer(desc()).unwrap();
        let b_out = graph.virtual_buffer(desc()).unwrap();

        let a = graph
            .add_stage(
                Arc::new(IdentityCopy::new(desc())),
                vec![SlotBinding::Unbound],
                vec![SlotBinding::Virtual(a_out)],
            )
            .unwrap();
        let b = graph
            .add_stage(
                Arc::new(IdentityCopy::new(desc())),
                vec![SlotBinding::Virtual(a_out)],
                vec![SlotBinding::Virtual(b_out)],
            )
            .unwrap();
        let c = graph
            .add_stage(
                Arc::new(IdentityCopy::new(desc())),
                vec![SlotBinding::Virtual(b_out)],
                vec![SlotBinding::Unbound],
            )
            .unwrap();

        let order = topological_order(&graph);
        assert_eq!(order, vec![a, b, c]);
    }
}
