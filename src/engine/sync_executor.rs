//! Single-shot graph execution on the caller's task.
//!
//! [`GraphExecutor::execute`] runs every stage exactly once, in the
//! topological order frozen at verification time (ties broken by insertion
//! order, so execution is deterministic and reproducible across runs). The
//! executor's only responsibilities are ordering and buffer visibility; each
//! stage transform is a black box.
//!
//! # Buffer visibility
//!
//! A stage never starts until all of its input buffers have been produced by
//! upstream stages or supplied externally, which the frozen topological
//! order guarantees by construction. Buffers are checked out of their slots
//! (parameter or intermediate) for exactly the duration of one stage's run
//! and checked back in afterwards, so a buffer has one owner at any instant.
//! When one buffer feeds several input slots of the same stage, the later
//! slots receive a copy of its contents and the original goes back through
//! its first slot.
//!
//! # Failure
//!
//! On the first stage failure execution halts immediately and the error
//! names the stage and the underlying cause. Downstream buffers are left in
//! an undefined, not-yet-produced state; callers must not read them.

use std::sync::Arc;
use std::time::Instant;

use crate::buffers::ImageBuffer;
use crate::errors::ExecutionError;
use crate::graph::builder::BufferRef;
use crate::graph::{Graph, PortDirection};
use crate::observability::messages::engine::{ExecutionCompleted, ExecutionStarted};
use crate::observability::messages::StructuredLog;
use crate::perf::{PerfRecorder, PerfScope};
use crate::traits::StageIo;

/// Synchronous scheduler: validates bindings, then runs a verified graph one
/// pass at a time, feeding graph-level and per-stage timing into its
/// [`PerfRecorder`].
pub struct GraphExecutor {
    perf: Arc<PerfRecorder>,
}

impl Default for GraphExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphExecutor {
    pub fn new() -> Self {
        Self {
            perf: Arc::new(PerfRecorder::new()),
        }
    }

    /// Shares an existing recorder, so pipelined sessions and their caller
    /// read the same statistics.
    pub fn with_recorder(perf: Arc<PerfRecorder>) -> Self {
        Self { perf }
    }

    pub fn perf(&self) -> &PerfRecorder {
        &self.perf
    }

    pub fn perf_handle(&self) -> Arc<PerfRecorder> {
        Arc::clone(&self.perf)
    }

    /// Runs every stage of `graph` exactly once.
    ///
    /// `params` supplies one buffer per promoted parameter, ordered by
    /// parameter index. The same buffers are back in `params` when the call
    /// returns, whether it succeeded or not; output buffers hold produced
    /// data only on success.
    pub async fn execute(
        &self,
        graph: &mut Graph,
        params: &mut Vec<ImageBuffer>,
    ) -> Result<(), ExecutionError> {
        let order = graph
            .execution_order()
            .map_err(|_| ExecutionError::NotVerified)?;

        if params.len() != graph.param_count() {
            return Err(ExecutionError::ParamCountMismatch {
                expected: graph.param_count(),
                actual: params.len(),
            });
        }
        for (buf, param) in params.iter().zip(graph.params()) {
            if *buf.desc() != param.desc {
                return Err(ExecutionError::ShapeMismatch {
                    param: param.index,
                    buffer: buf.id(),
                    expected: param.desc,
                    actual: *buf.desc(),
                });
            }
        }

        ExecutionStarted { stage_count: graph.stage_count() }.log();
        let graph_start = Instant::now();

        // Check all buffers into slot arenas for the duration of the pass.
        let mut param_slots: Vec<Option<ImageBuffer>> =
            std::mem::take(params).into_iter().map(Some).collect();
        let mut virtual_slots = std::mem::take(
            &mut graph
                .frozen
                .as_mut()
                .expect("execution_order succeeded on an unfrozen graph")
                .virtual_buffers,
        );

        let mut failure = None;
        for stage_id in order {
            let n_in = graph.stages[stage_id.0].inputs.len();
            let n_out = graph.stages[stage_id.0].outputs.len();
            let in_refs: Vec<BufferRef> = (0..n_in)
                .map(|s| graph.buffer_ref(stage_id, PortDirection::Input, s))
                .collect();
            let out_refs: Vec<BufferRef> = (0..n_out)
                .map(|s| graph.buffer_ref(stage_id, PortDirection::Output, s))
                .collect();

            // A stage may read the same buffer on more than one input slot;
            // only the first occurrence checks the slot out, later ones get
            // a copy of its contents.
            let mut inputs: Vec<ImageBuffer> = Vec::with_capacity(in_refs.len());
            for (slot, r) in in_refs.iter().enumerate() {
                let buf = match in_refs[..slot].iter().position(|earlier| earlier == r) {
                    Some(first) => copy_of(&inputs[first]),
                    None => take_slot(*r, &mut param_slots, &mut virtual_slots),
                };
                inputs.push(buf);
            }
            let mut outputs: Vec<ImageBuffer> = out_refs
                .iter()
                .map(|r| take_slot(*r, &mut param_slots, &mut virtual_slots))
                .collect();

            let stage = Arc::clone(&graph.stages[stage_id.0].stage);
            let stage_start = Instant::now();
            let result = stage
                .run(StageIo {
                    inputs: &inputs,
                    outputs: &mut outputs,
                })
                .await;

            for (slot, (r, buf)) in in_refs.iter().zip(inputs).enumerate() {
                if in_refs[..slot].contains(r) {
                    // Aliased copy; the original returns through its first slot.
                    continue;
                }
                put_slot(*r, buf, &mut param_slots, &mut virtual_slots);
            }
            for (r, buf) in out_refs.iter().zip(outputs) {
                put_slot(*r, buf, &mut param_slots, &mut virtual_slots);
            }

            match result {
                Ok(()) => {
                    self.perf
                        .record(PerfScope::Stage(stage_id), stage_start.elapsed());
                }
                Err(source) => {
                    failure = Some(ExecutionError::StageFailed {
                        stage_id,
                        stage_name: stage.name().to_string(),
                        source,
                    });
                    break;
                }
            }
        }

        // Check everything back in before reporting the outcome.
        graph
            .frozen
            .as_mut()
            .expect("frozen topology cannot disappear mid-execution")
            .virtual_buffers = virtual_slots;
        *params = param_slots
            .into_iter()
            .map(|slot| slot.expect("every parameter buffer is returned after a pass"))
            .collect();

        match failure {
            Some(err) => Err(err),
            None => {
                let elapsed = graph_start.elapsed();
                self.perf.record(PerfScope::Graph, elapsed);
                ExecutionCompleted { duration_us: elapsed.as_micros() }.log();
                Ok(())
            }
        }
    }
}

/// Fresh buffer (new id) holding the same shape and bytes.
fn copy_of(buf: &ImageBuffer) -> ImageBuffer {
    let mut copy = ImageBuffer::new(*buf.desc());
    copy.as_bytes_mut().copy_from_slice(buf.as_bytes());
    copy
}

fn take_slot(
    r: BufferRef,
    params: &mut [Option<ImageBuffer>],
    virtuals: &mut [Option<ImageBuffer>],
) -> ImageBuffer {
    let slot = match r {
        BufferRef::Param(p) => &mut params[p.index()],
        BufferRef::Virtual(v) => &mut virtuals[v.0],
    };
    slot.take().expect("slot is occupied between stage runs")
}

fn put_slot(
    r: BufferRef,
    buf: ImageBuffer,
    params: &mut [Option<ImageBuffer>],
    virtuals: &mut [Option<ImageBuffer>],
) {
    let slot = match r {
        BufferRef::Param(p) => &mut params[p.index()],
        BufferRef::Virtual(v) => &mut virtuals[v.0],
    };
    debug_assert!(slot.is_none(), "slot refilled twice in one stage run");
    *slot = Some(buf);
}
