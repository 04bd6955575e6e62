pub mod frames;
pub mod timer;

pub use frames::{FrameTimeStats, FrameTimes};
pub use timer::{HighPrecisionTimer, ManualTimer, Timer};
