use stagehand::{
    Canvas, Color, InputEvent, KeyCode, Scene, SceneCommand, SceneContext, SceneDescriptor,
    SceneError,
};

use super::{left_click_on_canvas, MenuScene};

const RATE: i32 = 60;
const WIDTH: u32 = 400;
const HEIGHT: u32 = 300;
const SQUARE_SIZE: u32 = 56;

/// A red square drifting diagonally. Clicking the canvas moves it under the
/// cursor.
pub(crate) struct SquareScene {
    x: i32,
    y: i32,
}

impl SquareScene {
    pub(crate) fn new() -> Self {
        Self { x: 0, y: 0 }
    }
}

impl Scene for SquareScene {
    fn descriptor(&self) -> SceneDescriptor {
        SceneDescriptor::new(RATE, WIDTH, HEIGHT)
    }

    fn name(&self) -> &str {
        "square"
    }

    fn init(&mut self, _ctx: &mut SceneContext<'_>) -> Result<(), SceneError> {
        self.x = 0;
        self.y = 0;
        Ok(())
    }

    fn tick(&mut self, _ctx: &mut SceneContext<'_>) -> Result<SceneCommand, SceneError> {
        self.x += 1;
        self.y += 1;
        Ok(SceneCommand::None)
    }

    fn render(&mut self, canvas: &mut Canvas) {
        canvas.fill_rect(self.x, self.y, SQUARE_SIZE, SQUARE_SIZE, Color::RED);
    }

    fn handle_input(&mut self, event: &InputEvent, ctx: &mut SceneContext<'_>) -> SceneCommand {
        if event.key_code() == Some(KeyCode::Escape) {
            return SceneCommand::load(MenuScene::new());
        }
        if let Some(position) = left_click_on_canvas(event, ctx.logical_size()) {
            let half = (SQUARE_SIZE / 2) as i32;
            self.x = position.x as i32 - half;
            self.y = position.y as i32 - half;
        }
        SceneCommand::None
    }
}
