//! Coordinate types shared between the frame loop and renderers.
//!
//! Canonical drawable space:
//! - Physical pixels
//! - Origin at the drawable centre
//! - +X right, +Y up
//!
//! Renderers convert to clip space in shaders using a viewport uniform.

mod viewport;

pub use viewport::Viewport;
