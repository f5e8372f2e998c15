//! Auto-pipelined graph execution with per-parameter ready/done queues.
//!
//! A [`PipelinedExecutor`] replaces direct argument passing with
//! queue-mediated buffer flow: every promoted graph parameter gets a bounded
//! [`ParamQueue`](super::param_queue), and a dedicated dispatch worker
//! continuously looks for a moment when every parameter's ready queue holds
//! at least one buffer. It then atomically withdraws one buffer per
//! parameter, marks them in-flight, executes the graph exactly as in
//! single-shot mode, and lands every withdrawn buffer on the *done* side of
//! its own queue: consumed inputs so the caller can refill and re-enqueue
//! them, produced outputs so the caller can consume and recycle them.
//!
//! ```text
//!   caller task                         dispatch worker
//!   -----------                        ----------------
//!   enqueue_ready(in, ...)  ---+
//!   enqueue_ready(out, ...) ---+---->  all ready? withdraw one per queue
//!   dequeue_done(in)  <--------+        run graph (single-shot semantics)
//!   dequeue_done(out) <--------+       land buffers on done sides
//! ```
//!
//! `enqueue_ready` never blocks: it fails fast with `QueueFull` so a tight
//! refill loop can react instead of stalling. `dequeue_done` awaits until a
//! buffer is available (or the configured timeout elapses). For one queue,
//! buffers come back in the order they were admitted; across queues no
//! ordering is guaranteed or required.
//!
//! There is no mid-flight cancellation: the smallest cancellable unit is
//! "do not dispatch the next tuple". The documented shutdown idiom is
//! [`wait`](PipelinedExecutor::wait), drain, then
//! [`shutdown`](PipelinedExecutor::shutdown).
//!
//! A failed dispatch surfaces through [`take_error`]
//! (PipelinedExecutor::take_error) and does not tear the session down; the
//! tuple's buffers still travel to their done queues (output contents are
//! undefined) so the caller can replace or refill them and keep going.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;

use crate::buffers::{BufferId, BufferState, ImageBuffer};
use crate::engine::param_queue::ParamQueue;
use crate::engine::sync_executor::GraphExecutor;
use crate::errors::{ExecutionError, GraphError};
use crate::graph::{Graph, ParamIndex};
use crate::observability::messages::engine::{DispatchFailed, PipelineStarted};
use crate::observability::messages::StructuredLog;
use crate::perf::PerfRecorder;

/// Tuning for a pipelined session.
#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    /// Capacity of every parameter queue (ready + in-flight + done).
    /// Clamped to a minimum of 1.
    pub queue_depth: usize,
    /// Default timeout applied to every `dequeue_done`. `None` blocks
    /// indefinitely.
    pub dequeue_timeout: Option<Duration>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            queue_depth: 2,
            dequeue_timeout: None,
        }
    }
}

struct PipeState {
    queues: Vec<ParamQueue>,
    /// Lifecycle ledger keyed by buffer identity. A buffer appears here
    /// from admission until its final dequeue, which is what makes "same
    /// buffer in two queues" a reportable error instead of silent
    /// corruption.
    ledger: HashMap<BufferId, BufferState>,
    dispatch_in_flight: bool,
    dispatched: u64,
    completed: u64,
    errors: Vec<ExecutionError>,
    shutdown: bool,
}

impl PipeState {
    /// A dispatch is possible when every parameter has a ready buffer.
    fn dispatchable(&self) -> bool {
        !self.queues.is_empty() && self.queues.iter().all(|q| q.ready_len() > 0)
    }
}

struct PipeShared {
    state: Mutex<PipeState>,
    /// Woken when new ready buffers arrive or shutdown is requested.
    dispatch_wake: Notify,
    /// Woken after every completed dispatch; `dequeue_done` and `wait`
    /// re-check their conditions on each wake.
    done_wake: Notify,
}

/// Scheduler for continuous/batched execution of one verified graph.
pub struct PipelinedExecutor {
    shared: Arc<PipeShared>,
    perf: Arc<PerfRecorder>,
    dequeue_timeout: Option<Duration>,
    worker: JoinHandle<Graph>,
}

impl PipelinedExecutor {
    /// Attaches a parameter queue to every promoted parameter of `graph`
    /// and spawns the dispatch worker. Must be called from within a tokio
    /// runtime.
    pub fn start(graph: Graph, options: PipelineOptions) -> Result<Self, GraphError> {
        if !graph.is_verified() {
            return Err(GraphError::NotVerified);
        }
        if graph.param_count() == 0 {
            return Err(GraphError::NoPromotedParameters);
        }

        let depth = options.queue_depth.max(1);
        let queues = graph
            .params()
            .iter()
            .map(|p| ParamQueue::new(p.index, p.desc, depth))
            .collect::<Vec<_>>();

        PipelineStarted {
            param_count: queues.len(),
            queue_depth: depth,
        }
        .log();

        let shared = Arc::new(PipeShared {
            state: Mutex::new(PipeState {
                queues,
                ledger: HashMap::new(),
                dispatch_in_flight: false,
                dispatched: 0,
                completed: 0,
                errors: Vec::new(),
                shutdown: false,
            }),
            dispatch_wake: Notify::new(),
            done_wake: Notify::new(),
        });

        let perf = Arc::new(PerfRecorder::new());
        let worker = tokio::spawn(dispatch_loop(
            graph,
            Arc::clone(&shared),
            Arc::clone(&perf),
        ));

        Ok(Self {
            shared,
            perf,
            dequeue_timeout: options.dequeue_timeout,
            worker,
        })
    }

    /// Pushes buffers onto the ready side of one parameter's queue,
    /// draining the caller's vec on success.
    ///
    /// Never blocks. Fails fast with `QueueFull` when capacity would be
    /// exceeded and `ShapeMismatch` when a buffer's shape disagrees with
    /// the parameter; in both cases nothing is admitted and the caller
    /// keeps every buffer.
    pub async fn enqueue_ready(
        &self,
        param: ParamIndex,
        buffers: &mut Vec<ImageBuffer>,
    ) -> Result<(), ExecutionError> {
        if buffers.is_empty() {
            return Ok(());
        }
        {
            let mut st = self.shared.state.lock().await;
            if param.index() >= st.queues.len() {
                return Err(ExecutionError::UnknownParameter(param));
            }
            for buf in buffers.iter() {
                if let Some(state) = st.ledger.get(&buf.id()) {
                    return Err(ExecutionError::BufferStateViolation {
                        buffer: buf.id(),
                        state: *state,
                    });
                }
            }
            let ids: Vec<BufferId> = buffers.iter().map(|b| b.id()).collect();
            st.queues[param.index()].push_ready(buffers)?;
            for id in ids {
                st.ledger.insert(id, BufferState::Ready);
            }
        }
        self.shared.dispatch_wake.notify_one();
        Ok(())
    }

    /// Blocks until at least one buffer is available on the done side of
    /// the parameter's queue, then removes up to `max` buffers, oldest
    /// first. `max == 0` returns an empty vec immediately: none were
    /// requested, which is not an error.
    ///
    /// With a configured dequeue timeout the call yields `Timeout` instead
    /// of waiting forever; the timeout does not disturb queue state.
    pub async fn dequeue_done(
        &self,
        param: ParamIndex,
        max: usize,
    ) -> Result<Vec<ImageBuffer>, ExecutionError> {
        if max == 0 {
            return Ok(Vec::new());
        }
        let wait_for_done = async {
            loop {
                let awoken = self.shared.done_wake.notified();
                {
                    let mut st = self.shared.state.lock().await;
                    if param.index() >= st.queues.len() {
                        return Err(ExecutionError::UnknownParameter(param));
                    }
                    let taken = st.queues[param.index()].pop_done(max);
                    if !taken.is_empty() {
                        for buf in &taken {
                            st.ledger.remove(&buf.id());
                        }
                        return Ok(taken);
                    }
                    if st.shutdown && !st.dispatch_in_flight {
                        return Err(ExecutionError::WorkerGone);
                    }
                }
                awoken.await;
            }
        };
        match self.dequeue_timeout {
            Some(limit) => tokio::time::timeout(limit, wait_for_done)
                .await
                .map_err(|_| ExecutionError::Timeout { param })?,
            None => wait_for_done.await,
        }
    }

    /// Number of completed-but-undrained buffers on the parameter's done
    /// side. Non-blocking and never mutates the queue; useful for
    /// opportunistic draining.
    pub async fn check_done(&self, param: ParamIndex) -> Result<usize, ExecutionError> {
        let st = self.shared.state.lock().await;
        if param.index() >= st.queues.len() {
            return Err(ExecutionError::UnknownParameter(param));
        }
        Ok(st.queues[param.index()].done_len())
    }

    /// Blocks until every execution dispatchable from the buffers enqueued
    /// so far has completed. Afterwards `check_done` on every output
    /// parameter reflects the true number of completed-but-undrained
    /// results.
    pub async fn wait(&self) {
        loop {
            let awoken = self.shared.done_wake.notified();
            {
                let st = self.shared.state.lock().await;
                if !st.dispatch_in_flight && !st.dispatchable() {
                    return;
                }
            }
            awoken.await;
        }
    }

    /// Removes and returns the oldest unacknowledged dispatch error, if
    /// any. Dispatch errors never tear the session down; acknowledging
    /// them is the caller's part of the recovery contract.
    pub async fn take_error(&self) -> Option<ExecutionError> {
        let mut st = self.shared.state.lock().await;
        if st.errors.is_empty() {
            None
        } else {
            Some(st.errors.remove(0))
        }
    }

    /// Executions dispatched and completed so far.
    pub async fn progress(&self) -> (u64, u64) {
        let st = self.shared.state.lock().await;
        (st.dispatched, st.completed)
    }

    pub fn perf(&self) -> &PerfRecorder {
        &self.perf
    }

    pub fn perf_handle(&self) -> Arc<PerfRecorder> {
        Arc::clone(&self.perf)
    }

    /// Stops dispatching and returns the graph once the worker has wound
    /// down. Buffers still parked in queues are dropped with the session;
    /// callers that want them back drain before shutting down.
    pub async fn shutdown(self) -> Result<Graph, ExecutionError> {
        {
            let mut st = self.shared.state.lock().await;
            st.shutdown = true;
        }
        self.shared.dispatch_wake.notify_one();
        self.shared.done_wake.notify_waiters();
        self.worker.await.map_err(|_| ExecutionError::WorkerGone)
    }
}

/// The dispatch worker: owns the graph and a single-shot executor, and
/// converts "all queues ready" moments into executions.
async fn dispatch_loop(
    mut graph: Graph,
    shared: Arc<PipeShared>,
    perf: Arc<PerfRecorder>,
) -> Graph {
    let executor = GraphExecutor::with_recorder(perf);

    loop {
        // Acquire one buffer per parameter, atomically under the state
        // lock, or park until something changes.
        let tuple = loop {
            let awoken = shared.dispatch_wake.notified();
            {
                let mut st = shared.state.lock().await;
                if st.shutdown {
                    return graph;
                }
                if st.dispatchable() {
                    let mut bufs = Vec::with_capacity(st.queues.len());
                    for q in st.queues.iter_mut() {
                        bufs.push(q.pop_ready().expect("dispatchable queue has a ready buffer"));
                    }
                    for buf in &bufs {
                        st.ledger.insert(buf.id(), BufferState::InFlight);
                    }
                    st.dispatched += 1;
                    st.dispatch_in_flight = true;
                    break bufs;
                }
            }
            awoken.await;
        };

        let mut params = tuple;
        let result = executor.execute(&mut graph, &mut params).await;

        {
            let mut st = shared.state.lock().await;
            for (idx, buf) in params.into_iter().enumerate() {
                st.ledger.insert(buf.id(), BufferState::Done);
                st.queues[idx].complete(buf);
            }
            st.dispatch_in_flight = false;
            st.completed += 1;
            if let Err(error) = result {
                DispatchFailed {
                    sequence: st.completed,
                    error: &error,
                }
                .log();
                st.errors.push(error);
            }
        }
        shared.done_wake.notify_waiters();
        // More tuples may already be waiting; re-check immediately.
        shared.dispatch_wake.notify_one();
    }
}
