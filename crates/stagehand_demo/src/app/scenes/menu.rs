use rand::Rng;
use stagehand::{
    Canvas, Color, InputEvent, KeyCode, Scene, SceneCommand, SceneContext, SceneDescriptor,
    SceneError,
};
use tracing::info;

use super::{left_click_on_canvas, SquareScene};

const RATE: i32 = 60;
const WIDTH: u32 = 800;
const HEIGHT: u32 = 600;
const BUBBLE_COUNT: usize = 4;
const MAX_BUBBLE_RADIUS: u32 = 400;
const BACKGROUND: Color = Color::gray(240);
const VISITS_KEY: &str = "menu_visits";

#[derive(Debug, Clone, Copy, PartialEq)]
struct Bubble {
    x: f64,
    y: f64,
    radius: u32,
}

impl Bubble {
    fn stroke_width(&self) -> u32 {
        1 + self.radius / 50
    }
}

/// Each bubble starts just above the top edge and sinks one pixel per tick.
fn spawn_bubbles<R: Rng + ?Sized>(rng: &mut R) -> Vec<Bubble> {
    (0..BUBBLE_COUNT)
        .map(|_| {
            let radius = rng.random_range(0..MAX_BUBBLE_RADIUS);
            Bubble {
                x: rng.random_range(0.0..f64::from(WIDTH)),
                y: -f64::from(radius),
                radius,
            }
        })
        .collect()
}

pub(crate) struct MenuScene {
    bubbles: Vec<Bubble>,
}

impl MenuScene {
    pub(crate) fn new() -> Self {
        Self {
            bubbles: Vec::new(),
        }
    }
}

impl Scene for MenuScene {
    fn descriptor(&self) -> SceneDescriptor {
        SceneDescriptor::new(RATE, WIDTH, HEIGHT)
    }

    fn name(&self) -> &str {
        "menu"
    }

    fn init(&mut self, ctx: &mut SceneContext<'_>) -> Result<(), SceneError> {
        self.bubbles = spawn_bubbles(&mut rand::rng());

        let visits = ctx.retrieve::<u32>(VISITS_KEY).copied().unwrap_or(0) + 1;
        ctx.store(VISITS_KEY, visits);
        info!(visits, "menu_entered");
        Ok(())
    }

    fn tick(&mut self, _ctx: &mut SceneContext<'_>) -> Result<SceneCommand, SceneError> {
        for bubble in &mut self.bubbles {
            bubble.y += 1.0;
        }
        Ok(SceneCommand::None)
    }

    fn render(&mut self, canvas: &mut Canvas) {
        canvas.fill_rect(0, 0, WIDTH, HEIGHT, BACKGROUND);
        for bubble in &self.bubbles {
            canvas.stroke_circle(
                bubble.x as i32,
                bubble.y as i32,
                bubble.radius,
                bubble.stroke_width(),
                Color::CYAN,
            );
        }
    }

    fn handle_input(&mut self, event: &InputEvent, ctx: &mut SceneContext<'_>) -> SceneCommand {
        if event.key_code() == Some(KeyCode::Escape) {
            return SceneCommand::Close;
        }
        if left_click_on_canvas(event, ctx.logical_size()).is_some() {
            return SceneCommand::load(SquareScene::new());
        }
        SceneCommand::None
    }
}
