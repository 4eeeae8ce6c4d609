//! Hello Triangle engine crate.
//!
//! Holds the vertex/binding contract shared with the triangle shader, the
//! renderer built on it, and the platform + GPU runtime that drives it.

pub mod shader_types;

pub mod core;
pub mod device;
pub mod window;
pub mod time;

pub mod logging;
pub mod coords;
pub mod render;
pub mod paint;
