//! Frame rendering module
//!
//! Software rasterizer built on signed distance fields. The static board is
//! drawn once; each frame starts from that background and adds the balls.

pub mod canvas;
pub mod shapes;

pub use canvas::{Canvas, Color};
pub use shapes::SpeedRamp;

use image::RgbaImage;

use crate::sim::World;

/// Renders world snapshots at a fixed canvas size
pub struct BoardRenderer {
    background: RgbaImage,
    canvas: Canvas,
    ramp: SpeedRamp,
}

impl BoardRenderer {
    /// Pre-render the static bodies currently in `world`
    pub fn new(width: u32, height: u32, world: &World) -> Self {
        let mut canvas = Canvas::new(width, height);
        canvas.clear(shapes::BACKGROUND);
        for wall in world.walls() {
            shapes::draw_wall(&mut canvas, wall);
        }
        for peg in world.pegs() {
            shapes::draw_peg(&mut canvas, peg);
        }
        log::debug!(
            "Board background rendered at {}x{} ({} pegs, {} walls)",
            width,
            height,
            world.pegs().len(),
            world.walls().len()
        );
        Self {
            background: canvas.snapshot(),
            canvas,
            ramp: SpeedRamp::for_board(world.gravity(), height as f32),
        }
    }

    /// Draw the balls over the background and return the frame
    pub fn render(&mut self, world: &World) -> &RgbaImage {
        self.canvas.copy_from(&self.background);
        for ball in world.balls() {
            shapes::draw_ball(&mut self.canvas, ball, &self.ramp);
        }
        self.canvas.image()
    }

    pub fn background(&self) -> &RgbaImage {
        &self.background
    }
}
