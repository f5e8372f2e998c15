//! Graph construction: stages, internal wiring, and parameter promotion.
//!
//! A [`Graph`] is an acyclic composition of stages sharing virtual
//! (intermediate) buffers, with a subset of unbound slots promoted to *graph
//! parameters* for external binding. The lifecycle is strict:
//!
//! 1. **Build**: `virtual_buffer`, `add_stage`, `promote_parameter`.
//! 2. **Verify once**: [`Graph::verify`] runs every structural check,
//!    collects *all* problems (not just the first), computes a deterministic
//!    execution order, and allocates the intermediate buffers.
//! 3. **Execute repeatedly**: the structure is frozen; any further mutation
//!    fails with [`GraphError::FrozenGraph`].
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use frameflow::buffers::{ImageDesc, PixelFormat};
//! use frameflow::graph::{Graph, PortDirection, SlotBinding};
//! use frameflow::stages::IdentityCopy;
//!
//! let desc = ImageDesc::new(16, 16, PixelFormat::Gray8);
//! let mut graph = Graph::new();
//! let stage = graph.add_stage(
//!     Arc::new(IdentityCopy::new(desc)),
//!     vec![SlotBinding::Unbound],
//!     vec![SlotBinding::Unbound],
//! ).unwrap();
//! let input = graph.promote_parameter(stage, PortDirection::Input, 0).unwrap();
//! let output = graph.promote_parameter(stage, PortDirection::Output, 0).unwrap();
//! graph.verify().unwrap();
//! assert_eq!(graph.param_count(), 2);
//! assert_ne!(input, output);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use crate::buffers::{ImageBuffer, ImageDesc};
use crate::errors::GraphError;
use crate::graph::validation;
use crate::graph::{ParamIndex, PortDirection, StageId, VirtualId};
use crate::observability::messages::validation::{GraphVerified, ValidationFailed};
use crate::observability::messages::StructuredLog;
use crate::traits::Stage;

/// How one stage slot is wired at registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotBinding {
    /// Wired to an internal buffer shared with another stage.
    Virtual(VirtualId),
    /// Left open; must be promoted to a graph parameter before `verify`.
    Unbound,
}

/// A promoted slot, addressable from outside the graph by its stable index.
#[derive(Debug, Clone, Copy)]
pub struct GraphParam {
    pub index: ParamIndex,
    pub stage: StageId,
    pub direction: PortDirection,
    pub slot: usize,
    pub desc: ImageDesc,
}

pub(crate) struct StageEntry {
    pub(crate) stage: Arc<dyn Stage>,
    pub(crate) inputs: Vec<SlotBinding>,
    pub(crate) outputs: Vec<SlotBinding>,
    pub(crate) promoted_inputs: Vec<Option<ParamIndex>>,
    pub(crate) promoted_outputs: Vec<Option<ParamIndex>>,
}

impl StageEntry {
    pub(crate) fn name(&self) -> &str {
        self.stage.name()
    }
}

/// Where a slot's buffer comes from during execution. Only meaningful after
/// a successful `verify`, which guarantees every slot resolves to one of
/// these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BufferRef {
    Param(ParamIndex),
    Virtual(VirtualId),
}

pub(crate) struct FrozenTopology {
    pub(crate) order: Vec<StageId>,
    /// Intermediate buffers, allocated once and reused across executions.
    /// `None` only transiently while a stage borrows the buffer.
    pub(crate) virtual_buffers: Vec<Option<ImageBuffer>>,
}

/// An acyclic composition of stages. See the module docs for the lifecycle.
pub struct Graph {
    pub(crate) stages: Vec<StageEntry>,
    pub(crate) virtuals: Vec<ImageDesc>,
    pub(crate) params: Vec<GraphParam>,
    pub(crate) frozen: Option<FrozenTopology>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            virtuals: Vec::new(),
            params: Vec::new(),
            frozen: None,
        }
    }

    /// Declares an internal buffer that wires one stage's output to another
    /// stage's input.
    pub fn virtual_buffer(&mut self, desc: ImageDesc) -> Result<VirtualId, GraphError> {
        self.ensure_mutable()?;
        self.virtuals.push(desc);
        Ok(VirtualId(self.virtuals.len() - 1))
    }

    /// Registers a stage together with the wiring of each of its slots.
    ///
    /// Bindings are positional: `inputs[i]` wires the stage's i-th input
    /// slot. A `Virtual` binding whose shape disagrees with the slot fails
    /// immediately with [`GraphError::IncompatibleShape`]; wiring that would
    /// make the edge set cyclic fails with [`GraphError::CycleDetected`].
    pub fn add_stage(
        &mut self,
        stage: Arc<dyn Stage>,
        inputs: Vec<SlotBinding>,
        outputs: Vec<SlotBinding>,
    ) -> Result<StageId, GraphError> {
        self.ensure_mutable()?;

        let in_slots = stage.input_slots().to_vec();
        let out_slots = stage.output_slots().to_vec();
        if inputs.len() != in_slots.len() {
            return Err(GraphError::BindingArity {
                stage_name: stage.name().to_string(),
                direction: PortDirection::Input,
                expected: in_slots.len(),
                actual: inputs.len(),
            });
        }
        if outputs.len() != out_slots.len() {
            return Err(GraphError::BindingArity {
                stage_name: stage.name().to_string(),
                direction: PortDirection::Output,
                expected: out_slots.len(),
                actual: outputs.len(),
            });
        }

        for (slot, binding) in in_slots.iter().zip(inputs.iter()) {
            self.check_binding_shape(stage.name(), slot.name, slot.desc, binding)?;
        }
        for (slot, binding) in out_slots.iter().zip(outputs.iter()) {
            self.check_binding_shape(stage.name(), slot.name, slot.desc, binding)?;
        }

        let entry = StageEntry {
            promoted_inputs: vec![None; inputs.len()],
            promoted_outputs: vec![None; outputs.len()],
            stage,
            inputs,
            outputs,
        };
        self.stages.push(entry);

        // The edge set must stay acyclic at every step, so a bad stage is
        // rejected here rather than surfacing later in verify.
        if let Some(path) = validation::find_cycle(self) {
            self.stages.pop();
            return Err(GraphError::CycleDetected { path });
        }

        Ok(StageId(self.stages.len() - 1))
    }

    /// Exposes an unbound slot as a graph parameter and returns its stable
    /// index. Indices are assigned in promotion order, starting at zero.
    pub fn promote_parameter(
        &mut self,
        stage_id: StageId,
        direction: PortDirection,
        slot: usize,
    ) -> Result<ParamIndex, GraphError> {
        self.ensure_mutable()?;

        let entry = self
            .stages
            .get(stage_id.0)
            .ok_or(GraphError::UnknownStage(stage_id))?;
        let (bindings, promoted, slots) = match direction {
            PortDirection::Input => (&entry.inputs, &entry.promoted_inputs, entry.stage.input_slots()),
            PortDirection::Output => (&entry.outputs, &entry.promoted_outputs, entry.stage.output_slots()),
        };
        if slot >= bindings.len() {
            return Err(GraphError::SlotOutOfRange { stage_id, direction, slot });
        }
        if bindings[slot] != SlotBinding::Unbound || promoted[slot].is_some() {
            return Err(GraphError::AlreadyPromoted { stage_id, direction, slot });
        }

        let index = ParamIndex(self.params.len());
        let desc = slots[slot].desc;
        self.params.push(GraphParam {
            index,
            stage: stage_id,
            direction,
            slot,
            desc,
        });
        let entry = &mut self.stages[stage_id.0];
        match direction {
            PortDirection::Input => entry.promoted_inputs[slot] = Some(index),
            PortDirection::Output => entry.promoted_outputs[slot] = Some(index),
        }
        Ok(index)
    }

    /// Validates the whole graph and freezes it for execution.
    ///
    /// Every unresolved or mismatched binding found is reported, not just
    /// the first. On success the execution order is fixed (topological,
    /// ties broken by insertion order) and the intermediate buffers are
    /// allocated. Idempotent once verified.
    pub fn verify(&mut self) -> Result<(), GraphError> {
        if self.frozen.is_some() {
            return Ok(());
        }

        let issues = validation::collect_issues(self);
        if !issues.is_empty() {
            ValidationFailed { issue_count: issues.len() }.log();
            return Err(GraphError::Validation { issues });
        }

        let order = validation::topological_order(self);
        let virtual_buffers = self
            .virtuals
            .iter()
            .map(|desc| Some(ImageBuffer::new(*desc)))
            .collect();
        self.frozen = Some(FrozenTopology { order, virtual_buffers });

        GraphVerified {
            stage_count: self.stages.len(),
            param_count: self.params.len(),
        }
        .log();
        info!(stages = self.stages.len(), params = self.params.len(), "graph frozen");
        Ok(())
    }

    pub fn is_verified(&self) -> bool {
        self.frozen.is_some()
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Promoted parameters in index order.
    pub fn params(&self) -> &[GraphParam] {
        &self.params
    }

    pub fn param(&self, index: ParamIndex) -> Result<&GraphParam, GraphError> {
        self.params
            .get(index.0)
            .ok_or(GraphError::UnknownParameter(index))
    }

    pub fn stage_name(&self, id: StageId) -> Result<&str, GraphError> {
        self.stages
            .get(id.0)
            .map(|e| e.name())
            .ok_or(GraphError::UnknownStage(id))
    }

    pub(crate) fn ensure_mutable(&self) -> Result<(), GraphError> {
        if self.frozen.is_some() {
            Err(GraphError::FrozenGraph)
        } else {
            Ok(())
        }
    }

    pub(crate) fn execution_order(&self) -> Result<Vec<StageId>, GraphError> {
        self.frozen
            .as_ref()
            .map(|f| f.order.clone())
            .ok_or(GraphError::NotVerified)
    }

    /// Resolves where the buffer for one slot comes from. Valid only after
    /// `verify`, which guarantees every slot is wired or promoted.
    pub(crate) fn buffer_ref(
        &self,
        stage_id: StageId,
        direction: PortDirection,
        slot: usize,
    ) -> BufferRef {
        let entry = &self.stages[stage_id.0];
        let (bindings, promoted) = match direction {
            PortDirection::Input => (&entry.inputs, &entry.promoted_inputs),
            PortDirection::Output => (&entry.outputs, &entry.promoted_outputs),
        };
        match bindings[slot] {
            SlotBinding::Virtual(v) => BufferRef::Virtual(v),
            SlotBinding::Unbound => BufferRef::Param(
                promoted[slot].expect("verified graph has no unpromoted unbound slot"),
            ),
        }
    }

    /// Producer -> consumers adjacency over internal edges, in stage order.
    pub(crate) fn adjacency(&self) -> HashMap<usize, Vec<usize>> {
        let mut writers: HashMap<usize, usize> = HashMap::new();
        for (idx, entry) in self.stages.iter().enumerate() {
            for binding in &entry.outputs {
                if let SlotBinding::Virtual(v) = binding {
                    writers.entry(v.0).or_insert(idx);
                }
            }
        }
        let mut edges: HashMap<usize, Vec<usize>> = HashMap::new();
        for (idx, entry) in self.stages.iter().enumerate() {
            for binding in &entry.inputs {
                if let SlotBinding::Virtual(v) = binding {
                    if let Some(&writer) = writers.get(&v.0) {
                        edges.entry(writer).or_default().push(idx);
                    }
                }
            }
        }
        edges
    }

    fn check_binding_shape(
        &self,
        stage_name: &str,
        slot_name: &str,
        expected: ImageDesc,
        binding: &SlotBinding,
    ) -> Result<(), GraphError> {
        if let SlotBinding::Virtual(v) = binding {
            let actual = *self
                .virtuals
                .get(v.0)
                .ok_or(GraphError::UnknownVirtual(*v))?;
            if actual != expected {
                return Err(GraphError::IncompatibleShape {
                    stage_name: stage_name.to_string(),
                    slot_name: slot_name.to_string(),
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffers::PixelFormat;
    use crate::stages::IdentityCopy;

    fn desc() -> ImageDesc {
        ImageDesc::new(8, 8, PixelFormat::Gray8)
    }

    fn identity() -> Arc<dyn Stage> {
        Arc::new(IdentityCopy::new(desc()))
    }

    #[test]
    fn add_stage_rejects_arity_mismatch() {
        let mut graph = Graph::new();
        let err = graph
            .add_stage(identity(), vec![], vec![SlotBinding::Unbound])
            .unwrap_err();
        assert!(matches!(err, GraphError::BindingArity { .. }));
    }

    #[test]
    fn add_stage_rejects_shape_mismatch() {
        let mut graph = Graph::new();
        let wrong = graph
            .virtual_buffer(ImageDesc::new(4, 4, PixelFormat::Rgb8))
            .unwrap();
        let err = graph
            .add_stage(
                identity(),
                vec![SlotBinding::Virtual(wrong)],
                vec![SlotBinding::Unbound],
            )
            .unwrap_err();
        assert!(matches!(err, GraphError::IncompatibleShape { .. }));
    }

    #[test]
    fn add_stage_rejects_self_cycle() {
        let mut graph = Graph::new();
        let v = graph.virtual_buffer(desc()).unwrap();
        // One stage both reading and writing the same virtual buffer is the
        // smallest possible cycle.
        let err = graph
            .add_stage(
                identity(),
                vec![SlotBinding::Virtual(v)],
                vec![SlotBinding::Virtual(v)],
            )
            .unwrap_err();
        assert!(matches!(err, GraphError::CycleDetected { .. }));
        assert_eq!(graph.stage_count(), 0);
    }

    #[test]
    fn promote_twice_fails() {
        let mut graph = Graph::new();
        let stage = graph
            .add_stage(identity(), vec![SlotBinding::Unbound], vec![SlotBinding::Unbound])
            .unwrap();
        graph
            .promote_parameter(stage, PortDirection::Input, 0)
            .unwrap();
        let err = graph
            .promote_parameter(stage, PortDirection::Input, 0)
            .unwrap_err();
        assert!(matches!(err, GraphError::AlreadyPromoted { .. }));
    }

    #[test]
    fn promote_internally_bound_slot_fails() {
        let mut graph = Graph::new();
        let v = graph.virtual_buffer(desc()).unwrap();
        let stage = graph
            .add_stage(identity(), vec![SlotBinding::Virtual(v)], vec![SlotBinding::Unbound])
            .unwrap();
        let err = graph
            .promote_parameter(stage, PortDirection::Input, 0)
            .unwrap_err();
        assert!(matches!(err, GraphError::AlreadyPromoted { .. }));
    }

    #[test]
    fn mutation_after_verify_fails() {
        let mut graph = Graph::new();
        let stage = graph
            .add_stage(identity(), vec![SlotBinding::Unbound], vec![SlotBinding::Unbound])
            .unwrap();
        graph.promote_parameter(stage, PortDirection::Input, 0).unwrap();
        graph.promote_parameter(stage, PortDirection::Output, 0).unwrap();
        graph.verify().unwrap();

        assert!(matches!(
            graph.add_stage(identity(), vec![SlotBinding::Unbound], vec![SlotBinding::Unbound]),
            Err(GraphError::FrozenGraph)
        ));
        assert!(matches!(graph.virtual_buffer(desc()), Err(GraphError::FrozenGraph)));
        assert!(matches!(
            graph.promote_parameter(stage, PortDirection::Input, 0),
            Err(GraphError::FrozenGraph)
        ));
    }

    #[test]
    fn verify_is_idempotent() {
        let mut graph = Graph::new();
        let stage = graph
            .add_stage(identity(), vec![SlotBinding::Unbound], vec![SlotBinding::Unbound])
            .unwrap();
        graph.promote_parameter(stage, PortDirection::Input, 0).unwrap();
        graph.promote_parameter(stage, PortDirection::Output, 0).unwrap();
        graph.verify().unwrap();
        graph.verify().unwrap();
        assert!(graph.is_verified());
    }
}
