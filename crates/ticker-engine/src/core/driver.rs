use anyhow::{bail, Context, Result};

use crate::gfx::Backend;
use crate::input::{InputEvent, InputFrame, InputState};
use crate::time::FrameClock;

use super::app::{App, AppControl};
use super::ctx::FrameCtx;

type InitFn<A> = Box<dyn FnOnce(&mut dyn Backend) -> Result<A>>;

/// Lifecycle phase of a driven app.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Phase {
    Uninit,
    Ready,
    Rendering,
    ShuttingDown,
}

/// Drives one app through `init → frame* → cleanup`.
///
/// The driver is platform-agnostic: the window runtime forwards its callbacks
/// here, and tests drive it directly against a [`Recorder`](crate::gfx::Recorder).
///
/// Rules enforced here:
/// - `init` runs once and creates the app
/// - `frame` before `init` is an error
/// - once exit has been requested, no further frame reaches the app
/// - `cleanup` is idempotent and always shuts the backend down
pub struct Driver<A: App> {
    init: Option<InitFn<A>>,
    app: Option<A>,
    phase: Phase,
    quit_requested: bool,

    clock: FrameClock,
    input: InputState,
    input_frame: InputFrame,
}

impl<A: App> Driver<A> {
    pub fn new<F>(init: F) -> Self
    where
        F: FnOnce(&mut dyn Backend) -> Result<A> + 'static,
    {
        Self {
            init: Some(Box::new(init)),
            app: None,
            phase: Phase::Uninit,
            quit_requested: false,
            clock: FrameClock::new(),
            input: InputState::default(),
            input_frame: InputFrame::default(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether exit has been requested by an event, a frame, or the host.
    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn app(&self) -> Option<&A> {
        self.app.as_ref()
    }

    /// Runs the init closure against `gfx`.
    ///
    /// On failure the phase stays `Uninit`; `cleanup` is still safe to call.
    pub fn init(&mut self, gfx: &mut dyn Backend) -> Result<()> {
        if self.phase != Phase::Uninit {
            bail!("init called in phase {:?}", self.phase);
        }
        let init = self.init.take().context("init already attempted")?;

        log::info!("init ({:?} backend)", gfx.backend_kind());
        let app = init(gfx).context("app init failed")?;

        self.app = Some(app);
        self.phase = Phase::Ready;
        self.clock.reset();
        Ok(())
    }

    /// Runs one frame.
    ///
    /// Returns `Exit` without calling the app once exit has been requested or
    /// cleanup has run. Fails if called before `init` or if the device was lost.
    pub fn frame(&mut self, gfx: &mut dyn Backend) -> Result<AppControl> {
        match self.phase {
            Phase::Uninit => bail!("frame called before init"),
            Phase::ShuttingDown => return Ok(AppControl::Exit),
            Phase::Ready | Phase::Rendering => {}
        }
        if self.quit_requested {
            return Ok(AppControl::Exit);
        }
        let Some(app) = self.app.as_mut() else {
            bail!("no app in phase {:?}", self.phase);
        };

        self.phase = Phase::Rendering;
        let time = self.clock.tick();

        let control = {
            let mut ctx = FrameCtx {
                gfx: &mut *gfx,
                time,
                input: &self.input,
                input_frame: &self.input_frame,
            };
            app.frame(&mut ctx)
        };

        self.input_frame.clear();

        if gfx.is_lost() {
            bail!("graphics device lost");
        }
        if control == AppControl::Exit {
            self.request_quit();
        }
        Ok(control)
    }

    /// Forwards an input event to the app.
    ///
    /// Returns `Exit` exactly once: the first time the app asks for it.
    /// Events before `init` or after an exit request are dropped.
    pub fn event(&mut self, event: InputEvent) -> AppControl {
        if self.quit_requested || !matches!(self.phase, Phase::Ready | Phase::Rendering) {
            return AppControl::Continue;
        }
        let Some(app) = self.app.as_mut() else {
            return AppControl::Continue;
        };

        let control = app.event(&event);
        self.input.apply_event(&mut self.input_frame, event);

        if control == AppControl::Exit {
            self.request_quit();
        }
        control
    }

    /// Stops frame delivery, e.g. when the window is closed.
    pub fn request_quit(&mut self) {
        if !self.quit_requested {
            log::info!("quit requested");
            self.quit_requested = true;
        }
    }

    /// Lets the app release what it owns, then shuts the backend down.
    pub fn cleanup(&mut self, gfx: &mut dyn Backend) {
        if self.phase == Phase::ShuttingDown {
            return;
        }
        self.phase = Phase::ShuttingDown;
        self.quit_requested = true;
        self.init = None;

        if let Some(mut app) = self.app.take() {
            app.cleanup(gfx);
        }
        gfx.shutdown();
        log::info!("cleanup done");
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::gfx::{BufferDesc, Call, PassAction, Recorder};
    use crate::input::Key;

    type Log = Rc<RefCell<Vec<&'static str>>>;

    struct Scripted {
        log: Log,
        exit_after: Option<u64>,
    }

    impl App for Scripted {
        fn frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl {
            self.log.borrow_mut().push("frame");
            ctx.gfx.begin_pass(&PassAction::default());
            ctx.gfx.end_pass();
            ctx.gfx.commit();

            match self.exit_after {
                Some(n) if ctx.time.frame_index + 1 >= n => AppControl::Exit,
                _ => AppControl::Continue,
            }
        }

        fn cleanup(&mut self, _gfx: &mut dyn Backend) {
            self.log.borrow_mut().push("cleanup");
        }
    }

    fn driver(log: &Log) -> Driver<Scripted> {
        let log = log.clone();
        Driver::new(move |gfx| {
            gfx.create_buffer(&BufferDesc::vertices("scripted", &[0.0f32; 3]))?;
            log.borrow_mut().push("init");
            Ok(Scripted {
                log,
                exit_after: None,
            })
        })
    }

    fn frames(log: &Log) -> usize {
        log.borrow().iter().filter(|e| **e == "frame").count()
    }

    #[test]
    fn lifecycle_runs_in_order() {
        let log = Log::default();
        let mut gfx = Recorder::new();
        let mut d = driver(&log);

        d.init(&mut gfx).unwrap();
        assert_eq!(d.phase(), Phase::Ready);

        for _ in 0..3 {
            assert_eq!(d.frame(&mut gfx).unwrap(), AppControl::Continue);
        }
        assert_eq!(d.phase(), Phase::Rendering);

        d.cleanup(&mut gfx);
        assert_eq!(d.phase(), Phase::ShuttingDown);
        assert_eq!(
            *log.borrow(),
            vec!["init", "frame", "frame", "frame", "cleanup"]
        );
        assert!(gfx.is_shut_down());
        assert_eq!(gfx.live_resources(), 0);
    }

    #[test]
    fn frame_before_init_is_an_error() {
        let log = Log::default();
        let mut gfx = Recorder::new();
        let mut d = driver(&log);

        assert!(d.frame(&mut gfx).is_err());
        assert!(gfx.calls().is_empty());
    }

    #[test]
    fn init_runs_once() {
        let log = Log::default();
        let mut gfx = Recorder::new();
        let mut d = driver(&log);

        d.init(&mut gfx).unwrap();
        assert!(d.init(&mut gfx).is_err());
        assert_eq!(*log.borrow(), vec!["init"]);
    }

    #[test]
    fn escape_requests_quit_exactly_once() {
        let log = Log::default();
        let mut gfx = Recorder::new();
        let mut d = driver(&log);
        d.init(&mut gfx).unwrap();

        assert_eq!(d.event(InputEvent::key_down(Key::Space)), AppControl::Continue);
        assert!(!d.quit_requested());

        assert_eq!(d.event(InputEvent::key_down(Key::Escape)), AppControl::Exit);
        assert!(d.quit_requested());
        assert_eq!(d.event(InputEvent::key_down(Key::Escape)), AppControl::Continue);

        let before = gfx.calls().len();
        assert_eq!(d.frame(&mut gfx).unwrap(), AppControl::Exit);
        assert_eq!(gfx.calls().len(), before);
        assert_eq!(frames(&log), 0);
    }

    #[test]
    fn other_keys_do_not_quit() {
        let log = Log::default();
        let mut gfx = Recorder::new();
        let mut d = driver(&log);
        d.init(&mut gfx).unwrap();

        for key in [Key::Enter, Key::Char('q'), Key::F(4)] {
            assert_eq!(d.event(InputEvent::key_down(key)), AppControl::Continue);
        }
        assert_eq!(d.event(InputEvent::key_up(Key::Escape)), AppControl::Continue);
        assert!(!d.quit_requested());
    }

    #[test]
    fn exit_from_frame_stops_later_frames() {
        let log = Log::default();
        let mut gfx = Recorder::new();
        let l = log.clone();
        let mut d = Driver::new(move |_gfx| {
            Ok(Scripted {
                log: l,
                exit_after: Some(2),
            })
        });
        d.init(&mut gfx).unwrap();

        assert_eq!(d.frame(&mut gfx).unwrap(), AppControl::Continue);
        assert_eq!(d.frame(&mut gfx).unwrap(), AppControl::Exit);
        assert_eq!(d.frame(&mut gfx).unwrap(), AppControl::Exit);
        assert_eq!(frames(&log), 2);
    }

    #[test]
    fn cleanup_is_idempotent() {
        let log = Log::default();
        let mut gfx = Recorder::new();
        let mut d = driver(&log);
        d.init(&mut gfx).unwrap();

        d.cleanup(&mut gfx);
        d.cleanup(&mut gfx);

        let shutdowns = gfx
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::Shutdown))
            .count();
        assert_eq!(shutdowns, 1);
        assert_eq!(*log.borrow(), vec!["init", "cleanup"]);
    }

    #[test]
    fn frames_after_cleanup_issue_no_calls() {
        let log = Log::default();
        let mut gfx = Recorder::new();
        let mut d = driver(&log);
        d.init(&mut gfx).unwrap();
        d.cleanup(&mut gfx);

        let before = gfx.calls().len();
        assert_eq!(d.frame(&mut gfx).unwrap(), AppControl::Exit);
        assert_eq!(gfx.calls().len(), before);
    }

    #[test]
    fn cleanup_after_failed_init_is_safe() {
        let mut gfx = Recorder::new();
        let mut d: Driver<Scripted> = Driver::new(|gfx| {
            gfx.create_buffer(&BufferDesc::vertices("partial", &[1.0f32; 3]))?;
            anyhow::bail!("shader rejected")
        });

        assert!(d.init(&mut gfx).is_err());
        assert_eq!(d.phase(), Phase::Uninit);

        d.cleanup(&mut gfx);
        assert!(gfx.is_shut_down());
        assert_eq!(gfx.live_resources(), 0);
    }

    #[test]
    fn frame_index_advances_per_frame() {
        struct Counter(Vec<u64>);
        impl App for Counter {
            fn frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl {
                self.0.push(ctx.time.frame_index);
                AppControl::Continue
            }
        }

        let mut gfx = Recorder::new();
        let mut d = Driver::new(|_gfx| Ok(Counter(Vec::new())));
        d.init(&mut gfx).unwrap();
        for _ in 0..3 {
            d.frame(&mut gfx).unwrap();
        }
        assert_eq!(d.app().map(|c| c.0.clone()), Some(vec![0, 1, 2]));
    }

    #[test]
    fn key_presses_reach_the_next_frame_only() {
        struct Watch(Vec<bool>);
        impl App for Watch {
            fn frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl {
                self.0.push(ctx.input_frame.pressed(Key::Space));
                AppControl::Continue
            }
        }

        let mut gfx = Recorder::new();
        let mut d = Driver::new(|_gfx| Ok(Watch(Vec::new())));
        d.init(&mut gfx).unwrap();

        d.event(InputEvent::key_down(Key::Space));
        d.frame(&mut gfx).unwrap();
        d.frame(&mut gfx).unwrap();
        assert_eq!(d.app().map(|w| w.0.clone()), Some(vec![true, false]));
    }
}
