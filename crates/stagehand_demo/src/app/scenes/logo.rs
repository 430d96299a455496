use stagehand::{
    load_image, AssetPaths, Canvas, Color, Image, InputEvent, KeyCode, Scene, SceneCommand,
    SceneContext, SceneDescriptor, SceneError,
};
use tracing::{info, warn};

use super::{left_click_on_canvas, MenuScene};

const RATE: i32 = 60;
const WIDTH: u32 = 400;
const HEIGHT: u32 = 400;
const FADE_TICKS: u32 = 200;
const LOGO_IMAGE: &str = "logo.png";
const LOGO_LEFT: i32 = 100;
const LOGO_TOP: i32 = 100;
const LOGO_SIZE: u32 = 200;

/// Fades a gray square in and out, then hands over to the menu.
pub(crate) struct LogoScene {
    assets: AssetPaths,
    rate: i32,
    counter: u32,
    fade: u8,
    logo: Option<Image>,
}

impl LogoScene {
    pub(crate) fn new(assets: AssetPaths) -> Self {
        Self {
            assets,
            rate: RATE,
            counter: 0,
            fade: 0,
            logo: None,
        }
    }

    pub(crate) fn with_rate(mut self, rate: i32) -> Self {
        self.rate = rate;
        self
    }

    fn load_logo(&self) -> Option<Image> {
        let path = self.assets.image(LOGO_IMAGE);
        match load_image(&path) {
            Ok(image) => Some(image),
            Err(error) if error.is_missing() => {
                info!(path = %path.display(), "logo image not found; drawing plain square");
                None
            }
            Err(error) => {
                warn!(error = %error, "logo image unusable; drawing placeholder");
                Some(Image::placeholder(LOGO_SIZE, LOGO_SIZE))
            }
        }
    }
}

/// Brightness rises from 0, saturates at 255 and falls back to 0 at
/// `FADE_TICKS`.
fn fade_level(counter: u32) -> u8 {
    let counter = i64::from(counter);
    let level = (i64::from(FADE_TICKS) - counter) * counter / 30;
    level.clamp(0, 255) as u8
}

/// Copy of `image` with every color channel scaled by `level / 255`.
fn faded(image: &Image, level: u8) -> Option<Image> {
    let rgba = image
        .rgba()
        .chunks_exact(4)
        .flat_map(|pixel| {
            let scale = |channel: u8| ((u16::from(channel) * u16::from(level)) / 255) as u8;
            [scale(pixel[0]), scale(pixel[1]), scale(pixel[2]), pixel[3]]
        })
        .collect();
    Image::from_rgba(image.width(), image.height(), rgba)
}

impl Scene for LogoScene {
    fn descriptor(&self) -> SceneDescriptor {
        SceneDescriptor::new(self.rate, WIDTH, HEIGHT)
    }

    fn name(&self) -> &str {
        "logo"
    }

    fn init(&mut self, _ctx: &mut SceneContext<'_>) -> Result<(), SceneError> {
        self.counter = 0;
        self.fade = 0;
        self.logo = self.load_logo();
        Ok(())
    }

    fn tick(&mut self, _ctx: &mut SceneContext<'_>) -> Result<SceneCommand, SceneError> {
        self.fade = fade_level(self.counter);
        if self.counter > FADE_TICKS {
            return Ok(SceneCommand::load(MenuScene::new()));
        }
        self.counter += 1;
        Ok(SceneCommand::None)
    }

    fn render(&mut self, canvas: &mut Canvas) {
        match self.logo.as_ref().and_then(|logo| faded(logo, self.fade)) {
            Some(logo) => canvas.draw_image(&logo, LOGO_LEFT, LOGO_TOP),
            None => canvas.fill_rect(
                LOGO_LEFT,
                LOGO_TOP,
                LOGO_SIZE,
                LOGO_SIZE,
                Color::gray(self.fade),
            ),
        }
    }

    fn handle_input(&mut self, event: &InputEvent, ctx: &mut SceneContext<'_>) -> SceneCommand {
        let skip = event.key_code() == Some(KeyCode::Escape)
            || left_click_on_canvas(event, ctx.logical_size()).is_some();
        if skip {
            SceneCommand::load(MenuScene::new())
        } else {
            SceneCommand::None
        }
    }
}
