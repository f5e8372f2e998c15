//! Ready/done buffer queues for promoted graph parameters.
//!
//! Every promoted parameter in a pipelined session owns one [`ParamQueue`]:
//! a bounded FIFO split into a *ready* side (filled by the producer, drained
//! by the scheduler) and a *done* side (filled by the scheduler, drained by
//! the consumer). The split is what lets the caller's refill/consume work
//! overlap the next dispatch instead of rendezvousing on a single slot.
//!
//! ```text
//!            enqueue_ready           dispatch            dequeue_done
//!   caller ----------------> ready ----------> in-flight ----------> done --> caller
//!                              \________________ capacity ________________/
//! ```
//!
//! Capacity invariant: `ready + in_flight + done` never exceeds the
//! configured depth, so a caller can never park more buffers in a queue than
//! the pool assigned to that parameter.

use std::collections::VecDeque;

use crate::buffers::{ImageBuffer, ImageDesc};
use crate::errors::ExecutionError;
use crate::graph::ParamIndex;

pub(crate) struct ParamQueue {
    param: ParamIndex,
    desc: ImageDesc,
    depth: usize,
    ready: VecDeque<ImageBuffer>,
    done: VecDeque<ImageBuffer>,
    in_flight: usize,
}

impl ParamQueue {
    pub(crate) fn new(param: ParamIndex, desc: ImageDesc, depth: usize) -> Self {
        Self {
            param,
            desc,
            depth,
            ready: VecDeque::with_capacity(depth),
            done: VecDeque::with_capacity(depth),
            in_flight: 0,
        }
    }

    /// Buffers currently admitted in any stage of the lifecycle.
    pub(crate) fn occupancy(&self) -> usize {
        self.ready.len() + self.done.len() + self.in_flight
    }

    pub(crate) fn ready_len(&self) -> usize {
        self.ready.len()
    }

    pub(crate) fn done_len(&self) -> usize {
        self.done.len()
    }

    /// Admits buffers onto the ready side. Fails fast, without partial
    /// admission: shapes are checked before capacity so the caller always
    /// learns the most specific problem first.
    pub(crate) fn push_ready(&mut self, buffers: &mut Vec<ImageBuffer>) -> Result<(), ExecutionError> {
        for buf in buffers.iter() {
            if *buf.desc() != self.desc {
                return Err(ExecutionError::ShapeMismatch {
                    param: self.param,
                    buffer: buf.id(),
                    expected: self.desc,
                    actual: *buf.desc(),
                });
            }
        }
        if self.occupancy() + buffers.len() > self.depth {
            return Err(ExecutionError::QueueFull {
                param: self.param,
                depth: self.depth,
            });
        }
        self.ready.extend(buffers.drain(..));
        Ok(())
    }

    /// Withdraws the oldest ready buffer for dispatch, accounting it as
    /// in-flight.
    pub(crate) fn pop_ready(&mut self) -> Option<ImageBuffer> {
        let buf = self.ready.pop_front()?;
        self.in_flight += 1;
        Some(buf)
    }

    /// Lands an in-flight buffer on the done side.
    pub(crate) fn complete(&mut self, buffer: ImageBuffer) {
        debug_assert!(self.in_flight > 0, "complete without matching pop_ready");
        self.in_flight = self.in_flight.saturating_sub(1);
        self.done.push_back(buffer);
    }

    /// Removes up to `max` buffers from the done side, oldest first.
    pub(crate) fn pop_done(&mut self, max: usize) -> Vec<ImageBuffer> {
        let take = max.min(self.done.len());
        self.done.drain(..take).collect()
    }
}
