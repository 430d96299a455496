mod logo;
mod menu;
mod square;

pub(crate) use logo::LogoScene;
pub(crate) use menu::MenuScene;
pub(crate) use square::SquareScene;

use stagehand::{InputEvent, LogicalSize, MouseButton, Point};

/// Position of a left click that landed on the canvas rather than the bars.
fn left_click_on_canvas(event: &InputEvent, logical: LogicalSize) -> Option<Point> {
    let InputEvent::PointerClick(pointer) = event else {
        return None;
    };
    if pointer.button != Some(MouseButton::Left) || !logical.contains(pointer.position) {
        return None;
    }
    Some(pointer.position)
}
