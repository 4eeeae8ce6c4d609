use anyhow::{Context, Result};
use ouroboros::self_referencing;
use std::collections::HashMap;

use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{AppControl, FrameCtx, View, ViewDelegate, WindowCtx};
use crate::device::{Gpu, GpuInit};
use crate::time::{FrameClock, FrameTime};

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "Hello Triangle".to_string(),
            initial_size: LogicalSize::new(800.0, 600.0),
        }
    }
}

/// Runtime context passed to delegates.
///
/// Requests are recorded and applied after the current callback returns.
#[derive(Debug, Default)]
pub struct RuntimeCtx {
    exit: bool,
}

impl RuntimeCtx {
    /// Asks the runtime to leave the event loop once this frame is done.
    pub fn exit(&mut self) {
        self.exit = true;
    }

    pub fn is_exit_requested(&self) -> bool {
        self.exit
    }
}

/// Builds the delegate for a freshly created view.
type DelegateFactory = dyn FnMut(&View<'_>) -> Result<Box<dyn ViewDelegate>>;

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Runs the event loop until the window is closed or its delegate exits.
    ///
    /// `make_delegate` is called once the window's GPU context exists. A failure
    /// to create the window, its GPU context or its delegate ends the loop and is
    /// returned from here.
    pub fn run<F, D>(initial: RuntimeConfig, gpu_init: GpuInit, mut make_delegate: F) -> Result<()>
    where
        F: FnMut(&View<'_>) -> Result<D> + 'static,
        D: ViewDelegate + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;

        let factory: Box<DelegateFactory> = Box::new(move |view: &View<'_>| {
            let delegate = make_delegate(view)?;
            Ok(Box::new(delegate) as Box<dyn ViewDelegate>)
        });
        let mut state = AppState::new(initial, gpu_init, factory);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        state.finish()
    }
}

#[self_referencing]
struct WindowEntry {
    clock: FrameClock,

    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

/// A window together with the delegate that renders into it.
struct WindowSlot {
    entry: WindowEntry,
    delegate: Box<dyn ViewDelegate>,
}

struct AppState {
    initial: RuntimeConfig,
    gpu_init: GpuInit,
    make_delegate: Box<DelegateFactory>,

    windows: HashMap<WindowId, WindowSlot>,
    exit_requested: bool,

    /// First error that stopped the loop.
    fatal: Option<anyhow::Error>,
}

impl AppState {
    fn new(initial: RuntimeConfig, gpu_init: GpuInit, make_delegate: Box<DelegateFactory>) -> Self {
        Self {
            initial,
            gpu_init,
            make_delegate,
            windows: HashMap::new(),
            exit_requested: false,
            fatal: None,
        }
    }

    fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    /// Records `err` (the first one wins) and requests exit.
    fn fail(&mut self, err: anyhow::Error) {
        log::error!("{err:#}");
        if self.fatal.is_none() {
            self.fatal = Some(err);
        }
        self.request_exit();
    }

    /// Outcome of the run once the event loop has returned.
    fn finish(mut self) -> Result<()> {
        match self.fatal.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn create_window_slot(
        &mut self,
        event_loop: &ActiveEventLoop,
        config: RuntimeConfig,
    ) -> Result<WindowId> {
        let attrs = Window::default_attributes()
            .with_title(config.title)
            .with_inner_size(config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let id = window.id();
        let gpu_init = self.gpu_init.clone();

        let entry = WindowEntryTryBuilder {
            clock: FrameClock::default(),
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
        }
            .try_build()
            .context("GPU initialization failed for window")?;

        let make_delegate = &mut self.make_delegate;
        let delegate = entry
            .with_gpu(|gpu| make_delegate(&gpu.view()))
            .context("failed to create view delegate")?;

        log::info!("window {id:?} opened");
        self.windows.insert(id, WindowSlot { entry, delegate });
        Ok(id)
    }

    fn destroy_window_slot(&mut self, id: WindowId) {
        if self.windows.remove(&id).is_some() {
            log::info!("window {id:?} closed");
        }
    }

    fn resize_window(&mut self, id: WindowId, new_size: PhysicalSize<u32>) {
        let Some(slot) = self.windows.get_mut(&id) else {
            return;
        };

        slot.entry.with_gpu_mut(|gpu| gpu.resize(new_size));
        slot.delegate.on_resize(new_size);
        slot.entry.with_window(|w| w.request_redraw());
    }

    fn apply_runtime_ctx(&mut self, event_loop: &ActiveEventLoop, ctx: RuntimeCtx) {
        if ctx.is_exit_requested() {
            self.request_exit();
        }

        if self.windows.is_empty() {
            self.request_exit();
        }

        if self.exit_requested {
            event_loop.exit();
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if !self.windows.is_empty() {
            return;
        }

        if let Err(e) = self.create_window_slot(event_loop, self.initial.clone()) {
            self.fail(e.context("failed to create initial window"));
            event_loop.exit();
            return;
        }

        for slot in self.windows.values() {
            slot.entry.with_window(|w| w.request_redraw());
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw: the view draws every frame.
        for slot in self.windows.values() {
            slot.entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        match &event {
            WindowEvent::CloseRequested => {
                self.destroy_window_slot(window_id);
                if self.windows.is_empty() {
                    self.request_exit();
                    event_loop.exit();
                }
            }

            WindowEvent::Resized(new_size) => self.resize_window(window_id, *new_size),

            WindowEvent::ScaleFactorChanged { .. } => {
                let Some(slot) = self.windows.get(&window_id) else {
                    return;
                };
                let new_size = slot.entry.with_window(|w| w.inner_size());
                self.resize_window(window_id, new_size);
            }

            WindowEvent::RedrawRequested => {
                let mut runtime_ctx = RuntimeCtx::default();
                let mut control = AppControl::Continue;

                if let Some(WindowSlot { entry, delegate }) = self.windows.get_mut(&window_id) {
                    entry.with_mut(|fields| {
                        let ft: FrameTime = fields.clock.tick();

                        let mut ctx = FrameCtx {
                            window: WindowCtx {
                                id: window_id,
                                window: fields.window,
                            },
                            gpu: fields.gpu,
                            time: ft,
                            runtime: &mut runtime_ctx,
                        };

                        control = delegate.on_frame(&mut ctx);
                    });
                }

                if control == AppControl::Exit {
                    runtime_ctx.exit();
                }

                self.apply_runtime_ctx(event_loop, runtime_ctx);
            }

            _ => {}
        }

        if self.exit_requested {
            event_loop.exit();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        let factory: Box<DelegateFactory> =
            Box::new(|_: &View<'_>| -> Result<Box<dyn ViewDelegate>> {
                anyhow::bail!("no delegate in tests")
            });
        AppState::new(RuntimeConfig::default(), GpuInit::default(), factory)
    }

    #[test]
    fn runtime_ctx_records_exit() {
        let mut ctx = RuntimeCtx::default();
        assert!(!ctx.is_exit_requested());
        ctx.exit();
        assert!(ctx.is_exit_requested());
    }

    #[test]
    fn clean_run_finishes_ok() {
        assert!(state().finish().is_ok());
    }

    #[test]
    fn startup_failure_is_returned_from_run() {
        let mut state = state();
        state.fail(anyhow::anyhow!("no suitable GPU adapter found"));
        assert!(state.exit_requested);

        let err = state.finish().unwrap_err();
        assert_eq!(err.to_string(), "no suitable GPU adapter found");
    }

    #[test]
    fn first_failure_wins() {
        let mut state = state();
        state.fail(anyhow::anyhow!("failed to create window"));
        state.fail(anyhow::anyhow!("winit event loop terminated with error"));

        let err = state.finish().unwrap_err();
        assert_eq!(err.to_string(), "failed to create window");
    }
}
