use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize, Size};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App, AppControl, Driver};
use crate::device::{GfxDesc, WgpuBackend};
use crate::gfx::Backend;
use crate::input::platform::translate_window_event;
use crate::input::{InputEvent, Modifiers};

/// Static configuration handed to the host before the window opens.
#[derive(Debug, Clone)]
pub struct AppDesc {
    pub title: String,
    pub width: u32,
    pub height: u32,

    /// When set, `width`/`height` are logical units and the framebuffer uses
    /// the display's full pixel density. Otherwise they are physical pixels.
    pub high_dpi: bool,

    pub gfx: GfxDesc,
}

impl AppDesc {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    fn window_size(&self) -> Size {
        if self.high_dpi {
            LogicalSize::new(self.width as f64, self.height as f64).into()
        } else {
            PhysicalSize::new(self.width, self.height).into()
        }
    }
}

impl Default for AppDesc {
    fn default() -> Self {
        Self {
            title: "ticker".to_string(),
            width: 800,
            height: 600,
            high_dpi: true,
            gfx: GfxDesc::default(),
        }
    }
}

/// Entry point: opens one window and drives `A` until exit.
pub struct Runtime;

impl Runtime {
    /// Runs the event loop. `init` is called once the window and backend exist.
    ///
    /// Returns the first error raised by init, a frame, or the platform.
    pub fn run<A, F>(desc: AppDesc, init: F) -> Result<()>
    where
        A: App + 'static,
        F: FnOnce(&mut dyn Backend) -> Result<A> + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut host = Host::new(desc, Driver::new(init));

        event_loop
            .run_app(&mut host)
            .context("winit event loop terminated with error")?;

        match host.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    window: Window,

    #[borrows(window)]
    #[covariant]
    backend: WgpuBackend<'this>,
}

struct Host<A: App + 'static> {
    desc: AppDesc,
    driver: Driver<A>,
    entry: Option<WindowEntry>,
    modifiers: Modifiers,
    error: Option<anyhow::Error>,
}

impl<A: App + 'static> Host<A> {
    fn new(desc: AppDesc, driver: Driver<A>) -> Self {
        Self {
            desc,
            driver,
            entry: None,
            modifiers: Modifiers::default(),
            error: None,
        }
    }

    fn create_entry(&self, event_loop: &ActiveEventLoop) -> Result<WindowEntry> {
        let attrs = Window::default_attributes()
            .with_title(self.desc.title.clone())
            .with_inner_size(self.desc.window_size());

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gfx = &self.desc.gfx;
        WindowEntryTryBuilder {
            window,
            backend_builder: |w| pollster::block_on(WgpuBackend::new(w, gfx)),
        }
        .try_build()
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        if self.error.is_none() {
            self.error = Some(err);
        }
        self.driver.request_quit();
        event_loop.exit();
    }

    fn on_input(&mut self, event_loop: &ActiveEventLoop, ev: InputEvent) {
        if let InputEvent::ModifiersChanged(m) = ev {
            self.modifiers = m;
        }
        if self.driver.event(ev) == AppControl::Exit {
            event_loop.exit();
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        if self.driver.quit_requested() {
            return;
        }

        // Split borrows to avoid `self` capture inside `ouroboros` closures.
        let (driver, entry) = (&mut self.driver, &mut self.entry);
        let Some(entry) = entry.as_mut() else {
            return;
        };

        let result = entry.with_backend_mut(|backend| driver.frame(backend));
        match result {
            Ok(AppControl::Continue) => {}
            Ok(AppControl::Exit) => event_loop.exit(),
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        if let Some(entry) = self.entry.as_mut() {
            entry.with_backend_mut(|backend| backend.resize(size));
            entry.with_window(|w| w.request_redraw());
        }
    }
}

impl<A: App + 'static> ApplicationHandler for Host<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() || self.driver.quit_requested() {
            return;
        }

        let mut entry = match self.create_entry(event_loop) {
            Ok(entry) => entry,
            Err(e) => return self.fail(event_loop, e),
        };

        let driver = &mut self.driver;
        if let Err(e) = entry.with_backend_mut(|backend| driver.init(backend)) {
            entry.with_backend_mut(|backend| driver.cleanup(backend));
            return self.fail(event_loop, e);
        }

        entry.with_window(|w| w.request_redraw());
        self.entry = Some(entry);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.driver.quit_requested() {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw, paced by the present mode.
        if let Some(entry) = self.entry.as_ref() {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let Some(ev) = translate_window_event(self.modifiers, &event) {
            self.on_input(event_loop, ev);
        }

        match event {
            WindowEvent::CloseRequested => {
                log::info!("window close requested");
                self.driver.request_quit();
                event_loop.exit();
            }

            WindowEvent::Resized(size) => self.resize(size),

            WindowEvent::ScaleFactorChanged { .. } => {
                let size = self.entry.as_ref().map(|e| e.with_window(|w| w.inner_size()));
                if let Some(size) = size {
                    self.resize(size);
                }
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        let (driver, entry) = (&mut self.driver, &mut self.entry);
        if let Some(entry) = entry.as_mut() {
            entry.with_backend_mut(|backend| driver.cleanup(backend));
        }
        // Backend before window: the surface borrows the window.
        self.entry = None;
    }
}
