//! Board palette and body drawing

use glam::{Vec2, Vec3};

use super::canvas::{Canvas, Color};
use crate::sim::{Ball, Peg, Wall};

pub const BACKGROUND: Color = [1.0, 1.0, 1.0, 1.0];
pub const PEG_COLOR: Color = [0.25, 0.25, 0.3, 1.0];
pub const WALL_COLOR: Color = [0.0, 0.0, 0.0, 1.0];

/// Ramp stops from resting (blue) to full speed (red)
const RAMP: [Vec3; 5] = [
    Vec3::new(0.2, 0.4, 1.0),
    Vec3::new(0.2, 0.8, 1.0),
    Vec3::new(0.2, 0.8, 0.4),
    Vec3::new(1.0, 0.8, 0.2),
    Vec3::new(1.0, 0.3, 0.2),
];

/// Maps ball speed to a color, scaled to how fast balls can get on this board
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedRamp {
    top_speed: f32,
}

impl SpeedRamp {
    /// Top of the ramp is the speed of a ball that fell the full board height
    pub fn for_board(gravity: Vec2, height: f32) -> Self {
        Self {
            top_speed: (2.0 * gravity.length() * height).sqrt().max(1.0),
        }
    }

    pub fn top_speed(&self) -> f32 {
        self.top_speed
    }

    pub fn color(&self, speed: f32) -> Color {
        let t = (speed / self.top_speed).clamp(0.0, 1.0) * (RAMP.len() - 1) as f32;
        let stop = (t as usize).min(RAMP.len() - 2);
        let c = RAMP[stop].lerp(RAMP[stop + 1], t - stop as f32);
        [c.x, c.y, c.z, 1.0]
    }
}

pub fn draw_peg(canvas: &mut Canvas, peg: &Peg) {
    canvas.draw_circle(peg.pos, peg.radius, PEG_COLOR);
}

pub fn draw_wall(canvas: &mut Canvas, wall: &Wall) {
    canvas.draw_segment(wall.a, wall.b, wall.thickness, WALL_COLOR);
}

pub fn draw_ball(canvas: &mut Canvas, ball: &Ball, ramp: &SpeedRamp) {
    canvas.draw_circle(ball.pos, ball.radius, ramp.color(ball.vel.length()));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_board() -> SpeedRamp {
        SpeedRamp::for_board(Vec2::new(0.0, 900.0), 768.0)
    }

    #[test]
    fn test_top_speed_is_free_fall_over_the_board() {
        let ramp = default_board();
        assert!((ramp.top_speed() - (2.0f32 * 900.0 * 768.0).sqrt()).abs() < 1e-2);
        // A taller board needs more speed to reach red
        let tall = SpeedRamp::for_board(Vec2::new(0.0, 900.0), 1536.0);
        assert!(tall.top_speed() > ramp.top_speed());
        assert!(tall.color(ramp.top_speed())[0] < 1.0);
    }

    #[test]
    fn test_rest_is_blue_and_falling_is_red() {
        let ramp = default_board();
        assert_eq!(ramp.color(0.0), [0.2, 0.4, 1.0, 1.0]);
        let fast = ramp.color(ramp.top_speed() * 2.0);
        assert_eq!(fast, [1.0, 0.3, 0.2, 1.0]);
        // Halfway through the fall sits on the green stop
        let mid = ramp.color(ramp.top_speed() / 2.0);
        assert!((mid[1] - 0.8).abs() < 1e-5 && mid[0] < 0.3 && mid[2] < 0.5);
    }

    #[test]
    fn test_ramp_has_no_jumps() {
        let ramp = default_board();
        let steps = 1000;
        let mut prev = ramp.color(0.0);
        for i in 1..=steps {
            let next = ramp.color(ramp.top_speed() * i as f32 / steps as f32);
            for c in 0..3 {
                assert!((next[c] - prev[c]).abs() < 0.01, "jump at step {i}");
            }
            prev = next;
        }
    }

    #[test]
    fn test_weightless_board_still_has_a_ramp() {
        let ramp = SpeedRamp::for_board(Vec2::ZERO, 768.0);
        assert_eq!(ramp.top_speed(), 1.0);
        assert_eq!(ramp.color(5.0)[0], 1.0);
    }
}
