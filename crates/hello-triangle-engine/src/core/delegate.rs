use winit::dpi::PhysicalSize;

use super::ctx::FrameCtx;

/// Control directive returned by delegate callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Callbacks the runtime invokes on the object that renders into a view.
///
/// The runtime holds delegates as `Box<dyn ViewDelegate>` and never needs the
/// concrete type.
pub trait ViewDelegate {
    /// Called once per frame to draw into the view.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;

    /// Called after the drawable has been resized, with the new size in
    /// physical pixels. A zero-area size means the view is minimised.
    fn on_resize(&mut self, size: PhysicalSize<u32>);
}
