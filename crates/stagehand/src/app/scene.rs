use std::any::Any;
use std::fmt;

use thiserror::Error;

use super::assets::ResourceError;
use super::input::InputEvent;
use super::rendering::{Canvas, LogicalSize, Viewport};
use super::scheduler::TickRate;
use super::scratch::ScratchStore;

/// Declared logical canvas size and tick rate of a scene.
///
/// `rate` is kept as declared. Values `<= 0` mean render-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneDescriptor {
    pub rate: i32,
    pub width: u32,
    pub height: u32,
}

impl SceneDescriptor {
    pub const fn new(rate: i32, width: u32, height: u32) -> Self {
        Self {
            rate,
            width,
            height,
        }
    }

    pub fn logical_size(&self) -> LogicalSize {
        LogicalSize::new(self.width, self.height)
    }

    pub fn tick_rate(&self) -> TickRate {
        TickRate::from_per_second(self.rate)
    }
}

#[derive(Debug, Error)]
pub enum SceneError {
    #[error(transparent)]
    Resource(#[from] ResourceError),
    #[error("{0}")]
    Failed(String),
}

pub enum SceneCommand {
    None,
    Load(Box<dyn Scene>),
    Close,
}

impl SceneCommand {
    pub fn load(scene: impl Scene + 'static) -> Self {
        Self::Load(Box::new(scene))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl fmt::Debug for SceneCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Load(scene) => f.debug_tuple("Load").field(&scene.name()).finish(),
            Self::Close => f.write_str("Close"),
        }
    }
}

/// Borrowed host state handed to scene callbacks.
pub struct SceneContext<'a> {
    scratch: &'a mut ScratchStore,
    viewport: Viewport,
    logical_size: LogicalSize,
    tick_count: u64,
}

impl<'a> SceneContext<'a> {
    pub fn new(
        scratch: &'a mut ScratchStore,
        viewport: Viewport,
        logical_size: LogicalSize,
        tick_count: u64,
    ) -> Self {
        Self {
            scratch,
            viewport,
            logical_size,
            tick_count,
        }
    }

    pub fn store<T: Any>(&mut self, key: impl Into<String>, value: T) -> bool {
        self.scratch.store(key, value)
    }

    pub fn retrieve<T: Any>(&self, key: &str) -> Option<&T> {
        self.scratch.retrieve(key)
    }

    pub fn retrieve_mut<T: Any>(&mut self, key: &str) -> Option<&mut T> {
        self.scratch.retrieve_mut(key)
    }

    pub fn take<T: Any>(&mut self, key: &str) -> Option<T> {
        self.scratch.take(key)
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.scratch.remove(key)
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn logical_size(&self) -> LogicalSize {
        self.logical_size
    }

    /// Ticks run by the host since it was created, across scene swaps.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}

/// Unit of content driven by the host.
///
/// `init` runs exactly once per load, before any `tick` or `render`, and must
/// reset all mutable state so a scene value can be loaded again. Commands
/// returned from `tick` and `handle_input` are applied after the callback
/// returns.
pub trait Scene {
    fn descriptor(&self) -> SceneDescriptor;

    fn name(&self) -> &str {
        "scene"
    }

    fn init(&mut self, ctx: &mut SceneContext<'_>) -> Result<(), SceneError>;

    fn tick(&mut self, ctx: &mut SceneContext<'_>) -> Result<SceneCommand, SceneError>;

    /// Must not change state that `tick` reads.
    fn render(&mut self, canvas: &mut Canvas);

    fn handle_input(&mut self, _event: &InputEvent, _ctx: &mut SceneContext<'_>) -> SceneCommand {
        SceneCommand::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Blank;

    impl Scene for Blank {
        fn descriptor(&self) -> SceneDescriptor {
            SceneDescriptor::new(30, 320, 240)
        }

        fn init(&mut self, _ctx: &mut SceneContext<'_>) -> Result<(), SceneError> {
            Ok(())
        }

        fn tick(&mut self, _ctx: &mut SceneContext<'_>) -> Result<SceneCommand, SceneError> {
            Ok(SceneCommand::None)
        }

        fn render(&mut self, _canvas: &mut Canvas) {}
    }

    #[test]
    fn descriptor_reports_logical_size_and_rate() {
        let descriptor = Blank.descriptor();

        assert_eq!(descriptor.logical_size(), LogicalSize::new(320, 240));
        assert_eq!(descriptor.tick_rate(), TickRate::Fixed(30));
        assert_eq!(SceneDescriptor::new(-1, 10, 10).tick_rate(), TickRate::RenderOnly);
        assert_eq!(SceneDescriptor::new(5000, 10, 10).tick_rate(), TickRate::Fixed(5000));
    }

    #[test]
    fn default_input_handler_returns_none() {
        let mut scratch = ScratchStore::new();
        let mut ctx = SceneContext::new(
            &mut scratch,
            Viewport::new(640, 480),
            LogicalSize::new(320, 240),
            0,
        );
        let event = InputEvent::KeyTyped(String::from("a"));

        assert!(Blank.handle_input(&event, &mut ctx).is_none());
        assert_eq!(Blank.name(), "scene");
    }

    #[test]
    fn context_exposes_scratch_store() {
        let mut scratch = ScratchStore::new();
        {
            let mut ctx = SceneContext::new(
                &mut scratch,
                Viewport::default(),
                LogicalSize::new(1, 1),
                7,
            );
            ctx.store("handoff", 42u32);
            assert_eq!(ctx.retrieve::<u32>("handoff"), Some(&42));
            assert_eq!(ctx.tick_count(), 7);
        }

        assert_eq!(scratch.retrieve::<u32>("handoff"), Some(&42));
    }

    #[test]
    fn command_debug_names_loaded_scene() {
        assert_eq!(format!("{:?}", SceneCommand::load(Blank)), "Load(\"scene\")");
        assert_eq!(format!("{:?}", SceneCommand::Close), "Close");
    }
}
