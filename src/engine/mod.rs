pub mod param_queue;
pub mod pipelined;
pub mod sync_executor;

pub use pipelined::{PipelineOptions, PipelinedExecutor};
pub use sync_executor::GraphExecutor;
