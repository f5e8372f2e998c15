// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use crate::buffers::ImageDesc;
use crate::graph::{ParamIndex, PortDirection, StageId, VirtualId};

/// One problem found while verifying a graph.
///
/// Verification accumulates every issue it can find rather than stopping at
/// the first, so callers see the complete set of problems in one pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationIssue {
    /// A required slot is neither wired to a virtual buffer nor promoted to
    /// a graph parameter.
    #[error("stage {stage_id} '{stage_name}': {direction} slot {slot} '{slot_name}' is unbound and not promoted")]
    UnboundSlot {
        stage_id: StageId,
        stage_name: String,
        direction: PortDirection,
        slot: usize,
        slot_name: String,
    },
    /// A binding connects slots of mismatched shape.
    #[error("stage {stage_id} '{stage_name}': slot '{slot_name}' expects {expected} but is wired to {actual}")]
    ShapeMismatch {
        stage_id: StageId,
        stage_name: String,
        slot_name: String,
        expected: ImageDesc,
        actual: ImageDesc,
    },
    /// Two stages both write the same internal buffer.
    #[error("virtual buffer {virtual_id} is produced by both stage {first} and stage {second}")]
    MultipleWriters {
        virtual_id: VirtualId,
        first: StageId,
        second: StageId,
    },
    /// An internal buffer is consumed but no stage produces it.
    #[error("virtual buffer {virtual_id} is read by stage {reader} but never produced")]
    NeverProduced {
        virtual_id: VirtualId,
        reader: StageId,
    },
    /// The internal edges do not form a DAG.
    #[error("cyclic stage dependency: {}", path.join(" -> "))]
    CycleDetected { path: Vec<String> },
}

/// Errors raised while building, mutating, or verifying a graph.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A binding supplied to `add_stage` disagrees with the slot's shape.
    #[error("stage '{stage_name}' slot '{slot_name}': binding shape {actual} is incompatible with declared {expected}")]
    IncompatibleShape {
        stage_name: String,
        slot_name: String,
        expected: ImageDesc,
        actual: ImageDesc,
    },
    /// Adding the stage would make the edge set cyclic.
    #[error("adding stage would create a cycle: {}", path.join(" -> "))]
    CycleDetected { path: Vec<String> },
    /// The slot is already wired internally or already promoted.
    #[error("stage {stage_id} {direction} slot {slot} is already bound; it cannot be promoted")]
    AlreadyPromoted {
        stage_id: StageId,
        direction: PortDirection,
        slot: usize,
    },
    /// Structural mutation after a successful `verify`.
    #[error("graph is frozen after verification; structural changes are not allowed")]
    FrozenGraph,
    /// The graph has not been verified yet.
    #[error("graph has not been verified")]
    NotVerified,
    /// Pipelined mode needs at least one promoted parameter to drive
    /// dispatch.
    #[error("graph exposes no promoted parameters")]
    NoPromotedParameters,
    #[error("unknown stage {0}")]
    UnknownStage(StageId),
    #[error("unknown virtual buffer {0}")]
    UnknownVirtual(VirtualId),
    #[error("unknown graph parameter {0}")]
    UnknownParameter(ParamIndex),
    #[error("stage '{stage_name}' declares {expected} {direction} slots but {actual} bindings were supplied")]
    BindingArity {
        stage_name: String,
        direction: PortDirection,
        expected: usize,
        actual: usize,
    },
    #[error("stage {stage_id} has no {direction} slot {slot}")]
    SlotOutOfRange {
        stage_id: StageId,
        direction: PortDirection,
        slot: usize,
    },
    /// Verification failed; every discovered issue is listed.
    #[error("graph validation failed with {} issue(s): {}", issues.len(),
        issues.iter().map(|i| i.to_string()).collect::<Vec<_>>().join("; "))]
    Validation { issues: Vec<ValidationIssue> },
}
