/// Default parameter queue depth for pipelined sessions
pub const DEFAULT_QUEUE_DEPTH: usize = 2;
/// Maximum allowed parameter queue depth - memory limit
pub const MAX_QUEUE_DEPTH: usize = 64;
/// Maximum allowed image dimension on either axis
pub const MAX_IMAGE_DIM: u32 = 16_384;
/// Default number of frames a demo run pushes through the graph
pub const DEFAULT_FRAME_COUNT: usize = 32;
