use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::backend::{RenderBackend, WgpuBackend};
use crate::core::{App, AppControl, FrameCtx};
use crate::device::{GpuInit, SurfaceErrorAction};
use crate::input::platform::winit::translate_window_event;
use crate::input::{InputState, Key};
use crate::paint::Color;
use crate::time::FrameClock;

/// Window and loop configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    /// Close the window when Escape goes down.
    pub exit_on_escape: bool,
    /// Issued through the backend before every `on_frame`; `None` leaves clearing to the app.
    pub clear_color: Option<Color>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "kiln".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
            exit_on_escape: true,
            clear_color: Some(Color::new(0.1, 0.1, 0.12, 1.0)),
        }
    }
}

/// Entry point for the windowed loop.
pub struct Runtime;

impl Runtime {
    /// Opens one window, drives `app` until it exits, then returns.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: App + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        Ok(())
    }
}

#[self_referencing]
struct WindowEntry {
    input: InputState,
    clock: FrameClock,

    window: Window,

    #[borrows(window)]
    #[covariant]
    backend: WgpuBackend<'this>,
}

struct AppState<A: App> {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,
    entry: Option<WindowEntry>,
    exit_requested: bool,
}

impl<A: App> AppState<A> {
    fn new(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Self {
        Self {
            config,
            gpu_init,
            app,
            entry: None,
            exit_requested: false,
        }
    }

    fn create_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();
        let mut entry = WindowEntryBuilder {
            input: InputState::default(),
            clock: FrameClock::default(),
            window,
            backend_builder: |w| WgpuBackend::new(w, gpu_init),
        }
        .build();

        let initialized = entry.with_backend_mut(|b| {
            b.initialize();
            b.is_initialized()
        });
        anyhow::ensure!(initialized, "graphics backend failed to initialize");

        let app = &mut self.app;
        entry.with_backend_mut(|b| app.init(b));
        entry.with_window(|w| w.request_redraw());

        self.entry = Some(entry);
        Ok(())
    }

    /// Lets the app release its resources, then drops backend and window.
    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_requested = true;
        if let Some(mut entry) = self.entry.take() {
            let app = &mut self.app;
            entry.with_backend_mut(|b| app.on_exit(b));
            log::info!("window closed");
        }
        event_loop.exit();
    }

    /// Runs one frame. Returns `true` when the app or the surface asks to exit.
    fn redraw(&mut self) -> bool {
        let Some(entry) = self.entry.as_mut() else {
            return false;
        };
        let app = &mut self.app;
        let clear_color = self.config.clear_color;
        let mut exit = false;

        entry.with_mut(|fields| {
            let time = fields.clock.tick();

            match fields.backend.begin_frame() {
                Ok(()) => {}
                Err(SurfaceErrorAction::Fatal) => {
                    log::error!("surface lost irrecoverably; exiting");
                    exit = true;
                    return;
                }
                Err(_) => return,
            }

            if let Some(color) = clear_color {
                fields.backend.clear(color);
            }

            let mut ctx = FrameCtx {
                window: fields.window,
                backend: &mut *fields.backend,
                input: &*fields.input,
                time,
                exit_requested: false,
            };
            if app.on_frame(&mut ctx) == AppControl::Exit || ctx.exit_requested {
                exit = true;
            }

            fields.window.pre_present_notify();
            if let Err(SurfaceErrorAction::Fatal) = fields.backend.present() {
                log::error!("present failed irrecoverably; exiting");
                exit = true;
            }

            fields.input.end_frame();
        });

        exit
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        let Some(entry) = self.entry.as_mut() else { return };
        let app = &mut self.app;
        entry.with_mut(|fields| {
            fields.backend.resize(size.width as i32, size.height as i32);
            if size.width > 0 && size.height > 0 {
                app.on_resize(size.width, size.height);
            }
            fields.window.request_redraw();
        });
    }
}

impl<A: App> ApplicationHandler for AppState<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() || self.exit_requested {
            return;
        }
        if let Err(e) = self.create_entry(event_loop) {
            log::error!("failed to create window: {e:#}");
            self.shutdown(event_loop);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        // Continuous redraw.
        event_loop.set_control_flow(ControlFlow::Wait);
        if let Some(entry) = self.entry.as_ref() {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }
        let Some(entry) = self.entry.as_mut() else { return };

        let app = &mut self.app;
        let mut exit = false;
        entry.with_input_mut(|input| {
            if let Some(ev) = translate_window_event(&event) {
                input.apply_event(&ev);
            }
        });
        if app.on_window_event(&event) == AppControl::Exit {
            exit = true;
        }
        if self.config.exit_on_escape && entry.borrow_input().key_pressed(Key::Escape) {
            log::debug!("escape pressed; closing");
            exit = true;
        }

        match event {
            WindowEvent::CloseRequested => exit = true,
            WindowEvent::Resized(size) => self.resize(size),
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(size) = self.entry.as_ref().map(|e| e.borrow_window().inner_size()) {
                    self.resize(size);
                }
            }
            WindowEvent::RedrawRequested => exit |= self.redraw(),
            _ => {}
        }

        if exit {
            self.shutdown(event_loop);
        }
    }

    fn exiting(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() {
            self.shutdown(event_loop);
        }
    }
}
