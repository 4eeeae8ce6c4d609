//! Color model for clear colors.
//!
//! Vertex colors travel through `shader_types::Vertex` as raw `[f32; 4]`;
//! this type is for host-side colors handed to render passes.

pub mod color;

pub use color::Color;
