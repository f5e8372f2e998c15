//! Buffer pools and the buffer lifecycle state machine.

use std::fmt;

use crate::buffers::format::ImageDesc;
use crate::buffers::image::ImageBuffer;

/// Lifecycle state of a buffer while a pipelined session owns its identity.
///
/// ```text
/// Free -> Ready -> InFlight -> Done -> Free (recycled)
/// ```
///
/// The state is tracked explicitly, keyed by [`BufferId`], rather than
/// inferred from which queue currently holds the buffer. A buffer that is
/// anything other than `Free` cannot be enqueued ready again, which makes
/// "same buffer in two queues" an error the engine reports instead of a
/// silent corruption.
///
/// [`BufferId`]: crate::buffers::BufferId
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferState {
    /// Owned by the caller; eligible for `enqueue_ready`.
    Free,
    /// Sitting on a parameter's ready queue, awaiting dispatch.
    Ready,
    /// Withdrawn by the scheduler and bound to an execution.
    InFlight,
    /// Execution finished; sitting on the done queue awaiting pickup.
    Done,
}

impl fmt::Display for BufferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BufferState::Free => "free",
            BufferState::Ready => "ready",
            BufferState::InFlight => "in-flight",
            BufferState::Done => "done",
        };
        write!(f, "{}", name)
    }
}

/// A fixed-count set of identically shaped buffers for one role
/// (for example "pipeline inputs" or "pipeline outputs").
///
/// Pools are created once at session setup and drained into the caller's
/// refill loop; buffers are only dropped at shutdown.
#[derive(Debug)]
pub struct BufferPool {
    desc: ImageDesc,
    buffers: Vec<ImageBuffer>,
}

impl BufferPool {
    pub fn new(desc: ImageDesc, count: usize) -> Self {
        let buffers = (0..count).map(|_| ImageBuffer::new(desc)).collect();
        Self { desc, buffers }
    }

    pub fn desc(&self) -> &ImageDesc {
        &self.desc
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Hands every buffer to the caller, consuming the pool.
    pub fn into_buffers(self) -> Vec<ImageBuffer> {
        self.buffers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffers::format::PixelFormat;

    #[test]
    fn pool_creates_fixed_count_with_distinct_ids() {
        let desc = ImageDesc::new(8, 8, PixelFormat::Rgb8);
        let pool = BufferPool::new(desc, 4);
        assert_eq!(pool.len(), 4);

        let buffers = pool.into_buffers();
        let mut ids: Vec<_> = buffers.iter().map(|b| b.id()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 4);
        assert!(buffers.iter().all(|b| *b.desc() == desc));
    }
}
