//! GPU rendering subsystem.
//!
//! Each renderer is responsible for its own GPU resources (pipelines, buffers).
//!
//! Convention:
//! - CPU geometry is in physical pixels (centre origin, +Y up).
//! - Vertex shader converts to clip space using a viewport uniform.

mod ctx;
pub mod triangle;

pub use ctx::{RenderCtx, RenderTarget};
pub use triangle::Renderer;
