//! Frame timing.
//!
//! One `FrameClock` per window; the runtime calls `tick()` once per redraw and
//! hands the resulting `FrameTime` to the delegate.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
