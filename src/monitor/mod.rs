pub mod rewind;
pub mod scheduler;

pub use rewind::{RewindStateMachine, SubtitleAction};
pub use scheduler::Monitor;
