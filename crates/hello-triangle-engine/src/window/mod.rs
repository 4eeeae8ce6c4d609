//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and windows, and wires each window's GPU context
//! to the view delegate rendering into it.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};
