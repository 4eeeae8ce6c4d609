//! Core engine-facing contracts.
//!
//! This module defines the stable interface between the runtime (platform loop)
//! and the objects that render into a view. It avoids leaking runtime internals
//! into user code and provides a consistent per-frame context.

mod ctx;
mod delegate;

pub use ctx::{FrameCtx, View, WindowCtx};
pub use delegate::{AppControl, ViewDelegate};
