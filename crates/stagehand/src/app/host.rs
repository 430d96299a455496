use std::any::Any;
use std::fmt;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::input::InputEvent;
use super::metrics::{MetricsAccumulator, MetricsHandle, DEFAULT_METRICS_INTERVAL};
use super::rendering::{
    Canvas, CanvasTransform, Color, Display, DisplayBackend, DisplayError, LogicalSize, Viewport,
};
use super::scene::{Scene, SceneCommand, SceneContext, SceneDescriptor, SceneError};
use super::scheduler::{Scheduler, TickRate, DEFAULT_RATE};
use super::scratch::ScratchStore;

pub const DEFAULT_WIDTH: u32 = 800;
pub const DEFAULT_HEIGHT: u32 = 600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostState {
    Unstarted,
    Running,
    Closed,
}

impl fmt::Display for HostState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unstarted => "unstarted",
            Self::Running => "running",
            Self::Closed => "closed",
        })
    }
}

#[derive(Debug, Error)]
pub enum HostError {
    #[error("cannot {operation} while the host is {state}")]
    InvalidState {
        operation: &'static str,
        state: HostState,
    },
    #[error("scene `{scene}` failed to initialize: {source}")]
    SceneInit {
        scene: String,
        #[source]
        source: SceneError,
    },
    #[error("scene `{scene}` failed during tick: {source}")]
    SceneFault {
        scene: String,
        #[source]
        source: SceneError,
    },
    #[error(transparent)]
    Display(#[from] DisplayError),
}

/// What one [`GameHost::pump`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpReport {
    pub ticks_run: u32,
    pub rendered: bool,
    pub dropped_ticks: u32,
}

/// Owns the display, the active scene and the scheduler that drives it.
///
/// The host is single-threaded. Scene callbacks run inside [`GameHost::pump`],
/// [`GameHost::dispatch_input`] and [`GameHost::render_now`], and any
/// [`SceneCommand`] they return is applied once the callback has returned.
pub struct GameHost {
    state: HostState,
    backend: Box<dyn DisplayBackend>,
    display: Option<Box<dyn Display>>,
    viewport: Viewport,
    logical_size: LogicalSize,
    scheduler: Scheduler,
    active: Option<Box<dyn Scene>>,
    scratch: ScratchStore,
    canvas: Canvas,
    resizable: bool,
    tick_count: u64,
    metrics: MetricsAccumulator,
    metrics_handle: MetricsHandle,
    last_frame_at: Option<Instant>,
}

impl GameHost {
    pub fn new(backend: impl DisplayBackend + 'static) -> Self {
        let logical_size = LogicalSize::new(DEFAULT_WIDTH, DEFAULT_HEIGHT);
        Self {
            state: HostState::Unstarted,
            backend: Box::new(backend),
            display: None,
            viewport: Viewport::default(),
            logical_size,
            scheduler: Scheduler::new(),
            active: None,
            scratch: ScratchStore::new(),
            canvas: Canvas::new(logical_size),
            resizable: true,
            tick_count: 0,
            metrics: MetricsAccumulator::new(DEFAULT_METRICS_INTERVAL),
            metrics_handle: MetricsHandle::default(),
            last_frame_at: None,
        }
    }

    pub fn with_max_catch_up_ticks(mut self, max_catch_up_ticks: u32) -> Self {
        self.scheduler = self.scheduler.with_max_catch_up_ticks(max_catch_up_ticks);
        self
    }

    pub fn with_metrics(mut self, handle: MetricsHandle, interval: Duration) -> Self {
        self.metrics_handle = handle;
        self.metrics = MetricsAccumulator::new(interval);
        self
    }

    pub fn launch(&mut self, rate: i32, width: u32, height: u32) -> Result<(), HostError> {
        self.launch_at(rate, width, height, Instant::now())
    }

    pub fn launch_default(&mut self) -> Result<(), HostError> {
        self.launch(DEFAULT_RATE as i32, DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }

    fn launch_at(
        &mut self,
        rate: i32,
        width: u32,
        height: u32,
        now: Instant,
    ) -> Result<(), HostError> {
        self.ensure_state(HostState::Unstarted, "launch")?;

        let mut display = self.backend.open(width, height)?;
        display.set_resizable(self.resizable);
        self.viewport = display.viewport();
        self.display = Some(display);

        self.set_logical_size(LogicalSize::new(width, height));
        let tick_rate = self.scheduler.configure(rate, now);
        self.scheduler.start(now);
        self.state = HostState::Running;
        info!(
            rate = %tick_rate,
            width,
            height,
            viewport_width = self.viewport.width,
            viewport_height = self.viewport.height,
            "host_launched"
        );
        Ok(())
    }

    /// Makes `scene` the active scene, launching the host at the scene's
    /// declared size first if needed.
    ///
    /// When `init` fails the previous scene stays active and the scheduler
    /// resumes unchanged. A launch made by this call is reverted.
    pub fn load_scene(&mut self, scene: Box<dyn Scene>) -> Result<(), HostError> {
        self.load_scene_at(scene, Instant::now())
    }

    fn load_scene_at(&mut self, scene: Box<dyn Scene>, now: Instant) -> Result<(), HostError> {
        if self.state == HostState::Closed {
            return Err(HostError::InvalidState {
                operation: "load_scene",
                state: self.state,
            });
        }
        let descriptor = scene.descriptor();
        let launching = self.state == HostState::Unstarted;
        if launching {
            self.launch_at(descriptor.rate, descriptor.width, descriptor.height, now)?;
        }
        let result = self.install_scene(scene, descriptor, now);
        if launching && result.is_err() {
            self.unlaunch();
        }
        result
    }

    /// Undoes a launch that was only made for a scene whose `init` failed.
    fn unlaunch(&mut self) {
        self.scheduler.stop();
        self.display = None;
        self.viewport = Viewport::default();
        self.state = HostState::Unstarted;
        debug!("host_launch_reverted");
    }

    fn install_scene(
        &mut self,
        mut scene: Box<dyn Scene>,
        descriptor: SceneDescriptor,
        now: Instant,
    ) -> Result<(), HostError> {
        self.scheduler.stop();

        let init_result = {
            let mut ctx = SceneContext::new(
                &mut self.scratch,
                self.viewport,
                descriptor.logical_size(),
                self.tick_count,
            );
            scene.init(&mut ctx)
        };
        if let Err(source) = init_result {
            self.scheduler.start(now);
            return Err(HostError::SceneInit {
                scene: scene.name().to_owned(),
                source,
            });
        }

        let rate = self.scheduler.configure(descriptor.rate, now);
        self.set_logical_size(descriptor.logical_size());
        let previous = self.active.replace(scene);
        self.scheduler.start(now);

        info!(
            scene = self.active_scene_name().unwrap_or_default(),
            previous = previous.as_ref().map(|scene| scene.name()).unwrap_or("none"),
            rate = %rate,
            width = descriptor.width,
            height = descriptor.height,
            "scene_loaded"
        );
        Ok(())
    }

    /// Stops the loop and releases the scene and display. Closing twice is a
    /// no-op, and nothing can be loaded afterwards.
    pub fn close(&mut self) {
        if self.state == HostState::Closed {
            return;
        }
        self.scheduler.stop();
        let scene = self.active.take();
        self.display = None;
        self.state = HostState::Closed;
        info!(
            scene = scene.as_ref().map(|scene| scene.name()).unwrap_or("none"),
            ticks = self.tick_count,
            "host_closed"
        );
    }

    pub fn state(&self) -> HostState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == HostState::Closed
    }

    pub fn width(&self) -> u32 {
        self.logical_size.width
    }

    pub fn height(&self) -> u32 {
        self.logical_size.height
    }

    pub fn rate(&self) -> TickRate {
        self.scheduler.rate()
    }

    /// Changes the logical width used for mapping. The display keeps its size.
    pub fn set_width(&mut self, width: u32) {
        self.set_logical_size(LogicalSize::new(width, self.logical_size.height));
    }

    pub fn set_height(&mut self, height: u32) {
        self.set_logical_size(LogicalSize::new(self.logical_size.width, height));
    }

    pub fn set_rate(&mut self, rate: i32) -> Result<TickRate, HostError> {
        if self.state == HostState::Closed {
            return Err(HostError::InvalidState {
                operation: "set_rate",
                state: self.state,
            });
        }
        Ok(self.scheduler.configure(rate, Instant::now()))
    }

    pub fn store<T: Any>(&mut self, key: impl Into<String>, value: T) -> bool {
        self.scratch.store(key, value)
    }

    pub fn retrieve<T: Any>(&self, key: &str) -> Option<&T> {
        self.scratch.retrieve(key)
    }

    pub fn set_resizable(&mut self, resizable: bool) {
        self.resizable = resizable;
        if let Some(display) = self.display.as_mut() {
            display.set_resizable(resizable);
        }
    }

    pub fn is_resizable(&self) -> bool {
        self.resizable
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn logical_size(&self) -> LogicalSize {
        self.logical_size
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn active_scene_name(&self) -> Option<&str> {
        self.active.as_deref().map(|scene| scene.name())
    }

    pub fn metrics(&self) -> MetricsHandle {
        self.metrics_handle.clone()
    }

    /// Records the physical size reported by the windowing layer.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), HostError> {
        self.viewport = Viewport::new(width, height);
        if let Some(display) = self.display.as_mut() {
            display.resize(self.viewport)?;
            if !self.viewport.is_degenerate() {
                display.request_redraw();
            }
        }
        debug!(width, height, "viewport_resized");
        Ok(())
    }

    /// Mapping for the current logical and physical sizes. `None` while
    /// either has a zero dimension.
    pub fn transform(&self) -> Option<CanvasTransform> {
        CanvasTransform::fit(self.logical_size, self.viewport)
    }

    /// Delivers `event` to the active scene. Pointer positions are mapped from
    /// physical to logical coordinates first and dropped while the mapping is
    /// degenerate.
    pub fn dispatch_input(&mut self, event: InputEvent) {
        self.dispatch_input_at(event, Instant::now());
    }

    fn dispatch_input_at(&mut self, event: InputEvent, now: Instant) {
        if self.state != HostState::Running {
            return;
        }
        let event = match event.position() {
            Some(physical) => match self.transform() {
                Some(transform) => event.with_position(transform.inverse(physical)),
                None => {
                    debug!(kind = ?event.kind(), "pointer_event_dropped");
                    return;
                }
            },
            None => event,
        };

        let Some(scene) = self.active.as_mut() else {
            return;
        };
        let command = {
            let mut ctx = SceneContext::new(
                &mut self.scratch,
                self.viewport,
                self.logical_size,
                self.tick_count,
            );
            scene.handle_input(&event, &mut ctx)
        };
        self.apply_command(command, now);
    }

    /// Returns `true` when the active scene was replaced or the host closed.
    fn apply_command(&mut self, command: SceneCommand, now: Instant) -> bool {
        match command {
            SceneCommand::None => false,
            SceneCommand::Load(scene) => match self.load_scene_at(scene, now) {
                Ok(()) => true,
                Err(error) => {
                    warn!(error = %error, "scene_load_rejected");
                    false
                }
            },
            SceneCommand::Close => {
                self.close();
                true
            }
        }
    }

    /// Runs whatever the scheduler reports as due at `now`.
    ///
    /// A tick that swaps or closes the scene ends the batch, and the frame
    /// that was due is left to the next pump.
    pub fn pump(&mut self, now: Instant) -> Result<PumpReport, HostError> {
        let mut report = PumpReport::default();
        if self.state != HostState::Running {
            return Ok(report);
        }

        let work = self.scheduler.poll(now);
        report.dropped_ticks = work.dropped_ticks;
        if work.dropped_ticks > 0 {
            self.metrics.record_dropped_ticks(now, work.dropped_ticks);
        }

        let mut swapped = false;
        for _ in 0..work.ticks {
            let Some(scene) = self.active.as_mut() else {
                break;
            };
            self.tick_count += 1;
            let result = {
                let mut ctx = SceneContext::new(
                    &mut self.scratch,
                    self.viewport,
                    self.logical_size,
                    self.tick_count,
                );
                scene.tick(&mut ctx)
            };
            report.ticks_run += 1;

            let command = match result {
                Ok(command) => command,
                Err(source) => {
                    let scene_name = scene.name().to_owned();
                    error!(
                        scene = %scene_name,
                        tick = self.tick_count,
                        error = %source,
                        "scene_tick_failed"
                    );
                    self.scheduler.stop();
                    self.metrics.record_ticks(now, report.ticks_run);
                    return Err(HostError::SceneFault {
                        scene: scene_name,
                        source,
                    });
                }
            };
            if self.apply_command(command, now) {
                swapped = true;
                break;
            }
        }
        if report.ticks_run > 0 {
            self.metrics.record_ticks(now, report.ticks_run);
        }

        if work.render && !swapped && self.state == HostState::Running {
            self.render_frame(now)?;
            report.rendered = true;
        }
        self.publish_metrics(now);
        Ok(report)
    }

    /// Repaint requested by the windowing layer, outside the render cadence.
    pub fn render_now(&mut self) -> Result<(), HostError> {
        if self.state != HostState::Running {
            return Ok(());
        }
        self.render_frame(Instant::now())
    }

    /// Earliest instant at which [`GameHost::pump`] has work.
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.state != HostState::Running {
            return None;
        }
        self.scheduler.next_deadline()
    }

    fn render_frame(&mut self, now: Instant) -> Result<(), HostError> {
        let Some(display) = self.display.as_mut() else {
            return Ok(());
        };
        self.canvas.clear(Color::BLACK);
        if let Some(scene) = self.active.as_mut() {
            scene.render(&mut self.canvas);
        }
        let transform = CanvasTransform::fit(self.logical_size, self.viewport);
        display.present(&self.canvas, transform)?;

        let frame_dt = self
            .last_frame_at
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or_default();
        self.last_frame_at = Some(now);
        self.metrics.record_frame(now, frame_dt);
        Ok(())
    }

    fn publish_metrics(&mut self, now: Instant) {
        let Some(snapshot) = self.metrics.maybe_snapshot(now) else {
            return;
        };
        self.metrics_handle.publish(snapshot);
        info!(
            fps = snapshot.fps,
            tps = snapshot.tps,
            frame_time_ms = snapshot.frame_time_ms,
            dropped_ticks = snapshot.dropped_ticks,
            scene = self.active_scene_name().unwrap_or("none"),
            "loop_metrics"
        );
    }

    fn set_logical_size(&mut self, size: LogicalSize) {
        self.logical_size = size;
        self.canvas.resize(size);
    }

    fn ensure_state(&self, expected: HostState, operation: &'static str) -> Result<(), HostError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(HostError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use winit::keyboard::KeyCode;

    use super::*;
    use crate::app::input::{KeyInput, PointerInput};
    use crate::app::rendering::Point;

    #[derive(Default)]
    struct DisplayLog {
        opened: Vec<(u32, u32)>,
        presents: usize,
        last_transform: Option<CanvasTransform>,
        last_canvas_size: Option<LogicalSize>,
        resized: Vec<Viewport>,
        resizable: Option<bool>,
        dropped: bool,
    }

    type SharedLog = Rc<RefCell<DisplayLog>>;

    struct FakeBackend {
        log: SharedLog,
        unavailable: bool,
    }

    impl DisplayBackend for FakeBackend {
        fn open(&mut self, width: u32, height: u32) -> Result<Box<dyn Display>, DisplayError> {
            if self.unavailable {
                return Err(DisplayError::Unavailable(String::from("headless")));
            }
            self.log.borrow_mut().opened.push((width, height));
            Ok(Box::new(FakeDisplay {
                log: Rc::clone(&self.log),
                viewport: Viewport::new(width, height),
            }))
        }
    }

    struct FakeDisplay {
        log: SharedLog,
        viewport: Viewport,
    }

    impl Display for FakeDisplay {
        fn viewport(&self) -> Viewport {
            self.viewport
        }

        fn resize(&mut self, viewport: Viewport) -> Result<(), DisplayError> {
            if viewport.is_degenerate() {
                return Ok(());
            }
            self.viewport = viewport;
            self.log.borrow_mut().resized.push(viewport);
            Ok(())
        }

        fn present(
            &mut self,
            canvas: &Canvas,
            transform: Option<CanvasTransform>,
        ) -> Result<(), DisplayError> {
            let mut log = self.log.borrow_mut();
            log.presents += 1;
            log.last_transform = transform;
            log.last_canvas_size = Some(canvas.size());
            Ok(())
        }

        fn set_resizable(&mut self, resizable: bool) {
            self.log.borrow_mut().resizable = Some(resizable);
        }
    }

    impl Drop for FakeDisplay {
        fn drop(&mut self) {
            self.log.borrow_mut().dropped = true;
        }
    }

    type Calls = Rc<RefCell<Vec<String>>>;

    enum OnTick {
        Continue,
        Load(Option<Box<dyn Scene>>),
        Close,
        Fail,
    }

    struct Recorder {
        label: &'static str,
        descriptor: SceneDescriptor,
        calls: Calls,
        inputs: Rc<RefCell<Vec<InputEvent>>>,
        fail_init: bool,
        on_tick: OnTick,
    }

    impl Recorder {
        fn new(label: &'static str, rate: i32, width: u32, height: u32, calls: &Calls) -> Self {
            Self {
                label,
                descriptor: SceneDescriptor::new(rate, width, height),
                calls: Rc::clone(calls),
                inputs: Rc::default(),
                fail_init: false,
                on_tick: OnTick::Continue,
            }
        }

        fn record(&self, what: &str) {
            self.calls.borrow_mut().push(format!("{}:{what}", self.label));
        }
    }

    impl Scene for Recorder {
        fn descriptor(&self) -> SceneDescriptor {
            self.descriptor
        }

        fn name(&self) -> &str {
            self.label
        }

        fn init(&mut self, ctx: &mut SceneContext<'_>) -> Result<(), SceneError> {
            self.record("init");
            if self.fail_init {
                return Err(SceneError::Failed(String::from("init refused")));
            }
            ctx.store("last_init", self.label);
            Ok(())
        }

        fn tick(&mut self, _ctx: &mut SceneContext<'_>) -> Result<SceneCommand, SceneError> {
            self.record("tick");
            match &mut self.on_tick {
                OnTick::Continue => Ok(SceneCommand::None),
                OnTick::Load(next) => Ok(next.take().map_or(SceneCommand::None, SceneCommand::Load)),
                OnTick::Close => Ok(SceneCommand::Close),
                OnTick::Fail => Err(SceneError::Failed(String::from("boom"))),
            }
        }

        fn render(&mut self, canvas: &mut Canvas) {
            self.record("render");
            canvas.clear(Color::WHITE);
        }

        fn handle_input(&mut self, event: &InputEvent, _ctx: &mut SceneContext<'_>) -> SceneCommand {
            self.inputs.borrow_mut().push(event.clone());
            if event.key_code() == Some(KeyCode::Escape) {
                SceneCommand::Close
            } else {
                SceneCommand::None
            }
        }
    }

    fn host() -> (GameHost, SharedLog) {
        let log = SharedLog::default();
        let host = GameHost::new(FakeBackend {
            log: Rc::clone(&log),
            unavailable: false,
        });
        (host, log)
    }

    fn calls() -> Calls {
        Rc::default()
    }

    fn pointer_click(x: f64, y: f64) -> InputEvent {
        InputEvent::PointerClick(PointerInput {
            position: Point::new(x, y),
            button: None,
        })
    }

    fn escape() -> InputEvent {
        InputEvent::KeyDown(KeyInput {
            code: Some(KeyCode::Escape),
            repeat: false,
        })
    }

    #[test]
    fn first_load_launches_at_scene_size_and_rate() {
        let (mut host, log) = host();
        let calls = calls();
        let t0 = Instant::now();

        host.load_scene_at(Box::new(Recorder::new("a", 30, 400, 300, &calls)), t0)
            .expect("load");

        assert_eq!(host.state(), HostState::Running);
        assert_eq!(log.borrow().opened, vec![(400, 300)]);
        assert_eq!((host.width(), host.height()), (400, 300));
        assert_eq!(host.rate(), TickRate::Fixed(30));
        assert_eq!(host.viewport(), Viewport::new(400, 300));
        assert_eq!(*calls.borrow(), vec!["a:init"]);
        assert_eq!(host.retrieve::<&str>("last_init"), Some(&"a"));
    }

    #[test]
    fn launch_only_from_unstarted() {
        let (mut host, log) = host();
        host.launch_default().expect("launch");

        assert_eq!(log.borrow().opened, vec![(DEFAULT_WIDTH, DEFAULT_HEIGHT)]);
        assert_eq!(host.rate(), TickRate::Fixed(DEFAULT_RATE));
        assert!(matches!(
            host.launch(30, 10, 10),
            Err(HostError::InvalidState {
                operation: "launch",
                state: HostState::Running
            })
        ));

        host.close();
        assert!(matches!(
            host.launch_default(),
            Err(HostError::InvalidState {
                state: HostState::Closed,
                ..
            })
        ));
    }

    #[test]
    fn unavailable_display_leaves_host_unstarted() {
        let log = SharedLog::default();
        let mut host = GameHost::new(FakeBackend {
            log: Rc::clone(&log),
            unavailable: true,
        });

        let result = host.launch_default();

        assert!(matches!(
            result,
            Err(HostError::Display(DisplayError::Unavailable(_)))
        ));
        assert_eq!(host.state(), HostState::Unstarted);
    }

    #[test]
    fn rate_above_one_thousand_is_accepted() {
        let (mut host, log) = host();
        let calls = calls();

        host.load_scene(Box::new(Recorder::new("fast", 5000, 10, 10, &calls)))
            .expect("load");

        assert_eq!(host.state(), HostState::Running);
        assert_eq!(host.rate(), TickRate::Fixed(5000));
        assert_eq!(log.borrow().opened, vec![(10, 10)]);
        assert_eq!(*calls.borrow(), vec![String::from("fast:init")]);
    }

    #[test]
    fn failed_first_init_leaves_host_unstarted() {
        let (mut host, log) = host();
        let calls = calls();
        let t0 = Instant::now();
        let mut broken = Recorder::new("broken", 60, 320, 240, &calls);
        broken.fail_init = true;

        let result = host.load_scene_at(Box::new(broken), t0);

        assert!(matches!(result, Err(HostError::SceneInit { .. })));
        assert_eq!(host.state(), HostState::Unstarted);
        assert_eq!(host.active_scene_name(), None);
        assert_eq!(host.next_deadline(), None);
        assert!(log.borrow().dropped);

        host.load_scene_at(Box::new(Recorder::new("a", 60, 400, 300, &calls)), t0)
            .expect("load after failed init");
        assert_eq!(host.state(), HostState::Running);
        assert_eq!(log.borrow().opened, vec![(320, 240), (400, 300)]);
    }

    #[test]
    fn swapped_out_scene_receives_no_further_callbacks() {
        let (mut host, _log) = host();
        let calls = calls();
        let t0 = Instant::now();

        host.load_scene_at(Box::new(Recorder::new("a", 60, 400, 300, &calls)), t0)
            .expect("load a");
        host.pump(t0).expect("pump a");
        host.load_scene_at(Box::new(Recorder::new("b", 30, 200, 100, &calls)), t0)
            .expect("load b");
        for step in 0..20 {
            host.pump(t0 + Duration::from_millis(step * 10)).expect("pump b");
        }

        let calls = calls.borrow();
        assert_eq!(calls.iter().filter(|call| *call == "a:init").count(), 1);
        assert_eq!(calls.iter().filter(|call| *call == "b:init").count(), 1);
        let b_init = calls
            .iter()
            .position(|call| call == "b:init")
            .expect("b init");
        assert!(calls[b_init..].iter().all(|call| !call.starts_with("a:")));
        assert!(calls[b_init..].iter().any(|call| call == "b:tick"));
        assert_eq!((host.width(), host.height()), (200, 100));
    }

    #[test]
    fn failed_init_keeps_previous_scene_running() {
        let (mut host, _log) = host();
        let calls = calls();
        let t0 = Instant::now();
        host.load_scene_at(Box::new(Recorder::new("a", 20, 400, 300, &calls)), t0)
            .expect("load a");
        host.pump(t0).expect("pump");

        let mut broken = Recorder::new("broken", 50, 10, 10, &calls);
        broken.fail_init = true;
        let result = host.load_scene_at(Box::new(broken), t0 + Duration::from_millis(10));

        assert!(matches!(result, Err(HostError::SceneInit { ref scene, .. }) if scene == "broken"));
        assert_eq!(host.active_scene_name(), Some("a"));
        assert_eq!(host.rate(), TickRate::Fixed(20));
        assert_eq!((host.width(), host.height()), (400, 300));
        let report = host.pump(t0 + Duration::from_millis(50)).expect("pump");
        assert_eq!(report.ticks_run, 1);
        assert_eq!(calls.borrow().last().map(String::as_str), Some("a:render"));
    }

    #[test]
    fn close_is_terminal_and_idempotent() {
        let (mut host, log) = host();
        let calls = calls();
        let t0 = Instant::now();
        host.load_scene_at(Box::new(Recorder::new("a", 60, 400, 300, &calls)), t0)
            .expect("load");

        host.close();
        host.close();

        assert!(host.is_closed());
        assert!(log.borrow().dropped);
        assert_eq!(host.next_deadline(), None);
        assert_eq!(
            host.pump(t0 + Duration::from_secs(1)).expect("pump"),
            PumpReport::default()
        );
        let result = host.load_scene(Box::new(Recorder::new("c", 60, 10, 10, &calls)));
        assert!(matches!(
            result,
            Err(HostError::InvalidState {
                operation: "load_scene",
                state: HostState::Closed
            })
        ));
        assert!(matches!(host.set_rate(30), Err(HostError::InvalidState { .. })));
        assert_eq!(*calls.borrow(), vec!["a:init"]);
    }

    #[test]
    fn tick_command_swaps_scene_and_ends_batch() {
        let (mut host, _log) = host();
        let calls = calls();
        let t0 = Instant::now();
        let mut first = Recorder::new("a", 100, 400, 300, &calls);
        first.on_tick = OnTick::Load(Some(Box::new(Recorder::new("b", 100, 400, 300, &calls))));
        host.load_scene_at(Box::new(first), t0).expect("load");

        let report = host.pump(t0 + Duration::from_millis(45)).expect("pump");

        assert_eq!(report.ticks_run, 1);
        assert!(!report.rendered);
        assert_eq!(*calls.borrow(), vec!["a:init", "a:tick", "b:init"]);
        assert_eq!(host.active_scene_name(), Some("b"));

        let report = host.pump(t0 + Duration::from_millis(45)).expect("pump");
        assert_eq!(report.ticks_run, 1);
        assert!(report.rendered);
        assert_eq!(&calls.borrow()[3..], ["b:tick", "b:render"]);
    }

    #[test]
    fn close_command_from_tick_closes_host() {
        let (mut host, log) = host();
        let calls = calls();
        let t0 = Instant::now();
        let mut scene = Recorder::new("a", 60, 40, 30, &calls);
        scene.on_tick = OnTick::Close;
        host.load_scene_at(Box::new(scene), t0).expect("load");

        host.pump(t0).expect("pump");

        assert!(host.is_closed());
        assert_eq!(log.borrow().presents, 0);
    }

    #[test]
    fn tick_failure_stops_scheduler_and_reports_fault() {
        let (mut host, _log) = host();
        let calls = calls();
        let t0 = Instant::now();
        let mut scene = Recorder::new("faulty", 60, 40, 30, &calls);
        scene.on_tick = OnTick::Fail;
        host.load_scene_at(Box::new(scene), t0).expect("load");

        let result = host.pump(t0);

        assert!(matches!(result, Err(HostError::SceneFault { ref scene, .. }) if scene == "faulty"));
        assert_eq!(host.next_deadline(), None);
        let report = host.pump(t0 + Duration::from_secs(1)).expect("pump");
        assert_eq!(report, PumpReport::default());
        assert_eq!(*calls.borrow(), vec!["faulty:init", "faulty:tick"]);
    }

    #[test]
    fn render_only_scene_renders_without_ticks() {
        let (mut host, log) = host();
        let calls = calls();
        let t0 = Instant::now();
        host.load_scene_at(Box::new(Recorder::new("still", 0, 320, 200, &calls)), t0)
            .expect("load");

        let report = host.pump(t0).expect("pump");

        assert_eq!(host.rate(), TickRate::RenderOnly);
        assert_eq!(report.ticks_run, 0);
        assert!(report.rendered);
        assert_eq!(log.borrow().last_canvas_size, Some(LogicalSize::new(320, 200)));
        assert_eq!(*calls.borrow(), vec!["still:init", "still:render"]);
    }

    #[test]
    fn pointer_events_are_mapped_into_scene_space() {
        let (mut host, _log) = host();
        let calls = calls();
        let scene = Recorder::new("a", 60, 400, 300, &calls);
        let inputs = Rc::clone(&scene.inputs);
        host.load_scene(Box::new(scene)).expect("load");
        host.resize(800, 300).expect("resize");

        host.dispatch_input(pointer_click(0.0, 0.0));
        host.dispatch_input(pointer_click(400.0, 150.0));
        host.resize(400, 600).expect("resize");
        host.dispatch_input(pointer_click(200.0, 150.0));

        let positions: Vec<Point> = inputs
            .borrow()
            .iter()
            .filter_map(InputEvent::position)
            .collect();
        assert_eq!(
            positions,
            vec![
                Point::new(-200.0, 0.0),
                Point::new(200.0, 150.0),
                Point::new(200.0, 0.0)
            ]
        );
    }

    #[test]
    fn degenerate_viewport_drops_pointer_but_not_keys() {
        let (mut host, _log) = host();
        let calls = calls();
        let scene = Recorder::new("a", 60, 400, 300, &calls);
        let inputs = Rc::clone(&scene.inputs);
        host.load_scene(Box::new(scene)).expect("load");
        host.resize(0, 300).expect("resize");

        host.dispatch_input(pointer_click(10.0, 10.0));
        host.dispatch_input(InputEvent::KeyTyped(String::from("q")));

        assert_eq!(*inputs.borrow(), vec![InputEvent::KeyTyped(String::from("q"))]);
        assert_eq!(host.transform(), None);
    }

    #[test]
    fn close_command_from_input_closes_host() {
        let (mut host, _log) = host();
        let calls = calls();
        host.load_scene(Box::new(Recorder::new("a", 60, 40, 30, &calls)))
            .expect("load");

        host.dispatch_input(escape());

        assert!(host.is_closed());
    }

    #[test]
    fn render_now_uses_transform_for_current_viewport() {
        let (mut host, log) = host();
        let calls = calls();
        host.load_scene(Box::new(Recorder::new("a", 60, 400, 300, &calls)))
            .expect("load");

        host.resize(800, 300).expect("resize");
        host.render_now().expect("render");
        let pillarbox = log.borrow().last_transform.expect("transform");
        host.resize(400, 600).expect("resize");
        host.render_now().expect("render");
        let letterbox = log.borrow().last_transform.expect("transform");

        assert_eq!(pillarbox.offset_x, 200.0);
        assert_eq!(letterbox.offset_y, 150.0);
        assert_eq!(
            log.borrow().resized,
            vec![Viewport::new(800, 300), Viewport::new(400, 600)]
        );
    }

    #[test]
    fn set_width_changes_only_logical_size() {
        let (mut host, log) = host();
        let calls = calls();
        host.load_scene(Box::new(Recorder::new("a", 60, 400, 300, &calls)))
            .expect("load");

        host.set_width(800);
        host.set_height(450);
        host.render_now().expect("render");

        assert_eq!(host.logical_size(), LogicalSize::new(800, 450));
        assert_eq!(host.viewport(), Viewport::new(400, 300));
        assert!(log.borrow().resized.is_empty());
        assert_eq!(log.borrow().last_canvas_size, Some(LogicalSize::new(800, 450)));
    }

    #[test]
    fn resizable_flag_is_remembered_until_launch() {
        let (mut host, log) = host();
        host.set_resizable(false);
        assert_eq!(log.borrow().resizable, None);

        host.launch_default().expect("launch");
        assert_eq!(log.borrow().resizable, Some(false));

        host.set_resizable(true);
        assert_eq!(log.borrow().resizable, Some(true));
        assert!(host.is_resizable());
    }

    #[test]
    fn set_rate_restarts_scheduler_at_new_rate() {
        let (mut host, _log) = host();
        host.launch_default().expect("launch");

        let rate = host.set_rate(25).expect("rate");

        assert_eq!(rate, TickRate::Fixed(25));
        assert_eq!(host.rate(), TickRate::Fixed(25));
        assert!(host.next_deadline().is_some());
        assert_eq!(host.set_rate(2000).expect("rate"), TickRate::Fixed(2000));
        assert_eq!(host.set_rate(0).expect("rate"), TickRate::RenderOnly);
        host.close();
        assert!(matches!(host.set_rate(30), Err(HostError::InvalidState { .. })));
    }

    #[test]
    fn metrics_are_published_after_interval() {
        let log = SharedLog::default();
        let handle = MetricsHandle::default();
        let mut host = GameHost::new(FakeBackend {
            log: Rc::clone(&log),
            unavailable: false,
        })
        .with_metrics(handle.clone(), Duration::from_millis(100));
        let calls = calls();
        let t0 = Instant::now();
        host.load_scene_at(Box::new(Recorder::new("a", 100, 40, 30, &calls)), t0)
            .expect("load");

        for step in 0..=100 {
            host.pump(t0 + Duration::from_millis(step)).expect("pump");
        }

        let snapshot = handle.snapshot();
        assert!(snapshot.tps > 95.0 && snapshot.tps < 115.0, "tps {}", snapshot.tps);
        assert!(snapshot.fps > 95.0 && snapshot.fps < 115.0, "fps {}", snapshot.fps);
        assert_eq!(snapshot.dropped_ticks, 0);
    }
}
