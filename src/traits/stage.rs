use async_trait::async_trait;

use crate::buffers::{ImageBuffer, ImageDesc};
use crate::errors::StageError;

/// A typed input or output slot declared by a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotDesc {
    /// Human-readable slot name, used in validation and execution errors.
    pub name: &'static str,
    /// Shape a bound buffer must match.
    pub desc: ImageDesc,
}

impl SlotDesc {
    pub fn new(name: &'static str, desc: ImageDesc) -> Self {
        Self { name, desc }
    }
}

/// Buffers bound to one stage execution.
///
/// `inputs[i]` corresponds to the stage's i-th input slot and `outputs[j]` to
/// its j-th output slot, in declaration order. The scheduler guarantees every
/// buffer matches its slot's declared shape before `run` is called.
pub struct StageIo<'a> {
    pub inputs: &'a [ImageBuffer],
    pub outputs: &'a mut [ImageBuffer],
}

/// One opaque processing step in a graph.
///
/// The engine never looks inside a transform; its only contract with a stage
/// is the slot declaration and the success/failure of `run`. Stages are held
/// as `Arc<dyn Stage>` so one instance can be shared across graphs; a stage
/// that keeps per-frame mutable state (for example an updatable warp matrix)
/// must guard it internally.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Transform identifier used in logs, perf scopes, and error messages.
    fn name(&self) -> &str;

    /// Ordered typed input slots.
    fn input_slots(&self) -> &[SlotDesc];

    /// Ordered typed output slots.
    fn output_slots(&self) -> &[SlotDesc];

    /// Runs the transform once over the bound buffers.
    async fn run(&self, io: StageIo<'_>) -> Result<(), StageError>;
}
