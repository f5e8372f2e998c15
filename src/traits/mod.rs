pub mod stage;

pub use stage::{SlotDesc, Stage, StageIo};
