//! Board layout generation
//!
//! Pegs sit on a staggered lattice: even rows hold the widest row that fits,
//! odd rows one peg fewer, shifted right by half a spacing. Bin separators
//! drop from the bottom row's peg centers to the floor. Everything here is a
//! pure function of the config.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::settings::BoardConfig;

/// A static wall segment (capsule) between two points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WallSegment {
    pub a: Vec2,
    pub b: Vec2,
    /// Capsule radius
    pub thickness: f32,
}

/// Derived lattice metrics shared by every row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lattice {
    /// Horizontal distance between neighbouring pegs
    pub spacing_x: f32,
    /// Vertical distance between rows
    pub offset_y: f32,
    /// Pegs in an even (full) row
    pub max_pegs_even: u32,
    /// Left edge of the full row's occupied span
    pub left_margin: f32,
}

impl Lattice {
    /// Peg count and first x coordinate for a row
    pub fn row(&self, row: u32) -> (u32, f32) {
        if row % 2 == 0 {
            (self.max_pegs_even, self.left_margin)
        } else {
            (self.max_pegs_even - 1, self.left_margin + self.spacing_x / 2.0)
        }
    }

    /// Vertical center of a row
    pub fn row_y(&self, row: u32) -> f32 {
        self.offset_y * (row + 2) as f32
    }

    /// Peg centers of one row, left to right
    pub fn row_centers(&self, row: u32) -> Vec<f32> {
        let (count, start) = self.row(row);
        (0..count)
            .map(|i| start + i as f32 * self.spacing_x)
            .collect()
    }
}

/// Static geometry of the whole board
#[derive(Debug, Clone, PartialEq)]
pub struct BoardLayout {
    pub lattice: Lattice,
    /// Peg centers, row by row
    pub pegs: Vec<Vec2>,
    /// Pegs per row, top to bottom
    pub row_counts: Vec<u32>,
    /// Bin separators (left edge, bottom-row pegs, right edge) followed by the floor
    pub walls: Vec<WallSegment>,
    /// x coordinates of the separators, left to right
    pub separator_xs: Vec<f32>,
    /// Top of the separators
    pub separator_top_y: f32,
    /// Where balls are released
    pub spawn_point: Vec2,
}

impl BoardLayout {
    /// Compute the layout, failing on geometry that cannot form a lattice
    pub fn generate(config: &BoardConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let width = config.width();
        let height = config.height();
        let levels = config.layout.levels;
        let peg_radius = config.peg_radius();

        let offset_y = height / (levels + 4) as f32;
        let spacing_x = width / (levels + 1) as f32;
        if 2.0 * peg_radius >= spacing_x {
            return Err(ConfigError::PegTooLarge {
                diameter: 2.0 * peg_radius,
                spacing: spacing_x,
            });
        }

        let max_pegs_even = ((width - 2.0 * peg_radius) / spacing_x).floor() as u32 + 1;
        if max_pegs_even < 2 {
            return Err(ConfigError::TooFewPegs(max_pegs_even));
        }
        let occupied_width = (max_pegs_even - 1) as f32 * spacing_x;
        let left_margin = (width - occupied_width) / 2.0;

        let lattice = Lattice {
            spacing_x,
            offset_y,
            max_pegs_even,
            left_margin,
        };

        let mut pegs = Vec::new();
        let mut row_counts = Vec::with_capacity(levels as usize);
        for row in 0..levels {
            let y = lattice.row_y(row);
            let xs = lattice.row_centers(row);
            row_counts.push(xs.len() as u32);
            pegs.extend(xs.into_iter().map(|x| Vec2::new(x, y)));
        }

        // Separators hang from the bottom row's peg centers
        let bottom_row = levels - 1;
        let mut separator_xs = Vec::with_capacity(lattice.row(bottom_row).0 as usize + 2);
        separator_xs.push(0.0);
        separator_xs.extend(lattice.row_centers(bottom_row));
        separator_xs.push(width);

        let thickness = config.layout.floor_thickness;
        let visual_offset = config.layout.visual_offset;
        let margin = (peg_radius / 2.0).floor();
        let wall_top_y = lattice.row_y(bottom_row) - margin;
        // The floor capsule's inner edge sits `visual_offset` above the canvas bottom
        let floor_line_y = height + thickness - visual_offset;
        let separator_top_y = wall_top_y + visual_offset;

        let mut walls: Vec<WallSegment> = separator_xs
            .iter()
            .map(|&x| WallSegment {
                a: Vec2::new(x, floor_line_y),
                b: Vec2::new(x, separator_top_y),
                thickness,
            })
            .collect();
        walls.push(WallSegment {
            a: Vec2::new(0.0, floor_line_y),
            b: Vec2::new(width, floor_line_y),
            thickness,
        });

        let spawn_point = Vec2::new(width / 2.0, offset_y - config.ball_radius());

        log::debug!(
            "Layout: {} rows, {} pegs, {} bins, spacing {:.2}",
            levels,
            pegs.len(),
            separator_xs.len() - 1,
            spacing_x
        );

        Ok(Self {
            lattice,
            pegs,
            row_counts,
            walls,
            separator_xs,
            separator_top_y,
            spawn_point,
        })
    }

    /// Number of landing bins
    pub fn bin_count(&self) -> usize {
        self.separator_xs.len() - 1
    }

    /// Between the outer separators and above the floor
    pub fn in_play(&self, pos: Vec2) -> bool {
        let left = self.separator_xs.first().copied().unwrap_or(0.0);
        let right = self.separator_xs.last().copied().unwrap_or(left);
        let floor = self.walls.last().map_or(f32::INFINITY, |w| w.a.y);
        (left..=right).contains(&pos.x) && pos.y <= floor
    }

    /// Bin index for a resting ball, if it is inside the bin area
    pub fn bin_of(&self, pos: Vec2) -> Option<usize> {
        if pos.y < self.separator_top_y {
            return None;
        }
        self.separator_xs
            .windows(2)
            .position(|w| pos.x >= w[0] && pos.x < w[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn config_with(width: u32, height: u32, levels: u32) -> BoardConfig {
        let mut config = BoardConfig::default();
        config.canvas.width = width;
        config.canvas.height = height;
        config.layout.levels = levels;
        config
    }

    #[test]
    fn test_default_board_shape() {
        let layout = BoardLayout::generate(&BoardConfig::default()).unwrap();
        // 512 px wide, 11 gaps, 2 px pegs: floor(508 / 46.54) + 1 = 11
        assert_eq!(layout.lattice.max_pegs_even, 11);
        assert_eq!(layout.row_counts, vec![11, 10, 11, 10, 11, 10, 11, 10, 11, 10]);
        assert_eq!(layout.pegs.len(), 105);
        // Bottom row is odd: 10 pegs + two edges -> 12 separators, 11 bins, plus the floor
        assert_eq!(layout.separator_xs.len(), 12);
        assert_eq!(layout.walls.len(), 13);
        assert_eq!(layout.bin_count(), 11);
    }

    #[test]
    fn test_single_level_board() {
        let layout = BoardLayout::generate(&config_with(512, 768, 1)).unwrap();
        assert_eq!(layout.row_counts.len(), 1);
        assert_eq!(layout.row_counts[0], layout.lattice.max_pegs_even);
        // Edges plus every peg of the only (full) row
        assert_eq!(
            layout.separator_xs.len(),
            layout.lattice.max_pegs_even as usize + 2
        );
    }

    #[test]
    fn test_zero_levels_fails_before_layout() {
        let result = BoardLayout::generate(&config_with(512, 768, 0));
        assert!(matches!(result, Err(ConfigError::InvalidLevels(0))));
    }

    #[test]
    fn test_oversized_pegs_rejected() {
        let mut config = BoardConfig::default();
        config.layout.peg_size = 0.1;
        let result = BoardLayout::generate(&config);
        assert!(matches!(result, Err(ConfigError::PegTooLarge { .. })));
    }

    #[test]
    fn test_separators_span_floor_to_bottom_row() {
        let config = BoardConfig::default();
        let layout = BoardLayout::generate(&config).unwrap();
        let bottom_y = layout.lattice.row_y(config.layout.levels - 1);
        for wall in &layout.walls[..layout.separator_xs.len()] {
            assert_eq!(wall.a.x, wall.b.x);
            assert!(wall.a.y > wall.b.y, "separator runs bottom to top");
            assert!((wall.b.y - (bottom_y - 1.0 + 10.0)).abs() < 1e-4);
        }
        let floor = layout.walls.last().unwrap();
        assert_eq!(floor.a.x, 0.0);
        assert_eq!(floor.b.x, config.width());
        assert_eq!(floor.a.y, floor.b.y);
    }

    #[test]
    fn test_spawn_point_above_first_row() {
        let layout = BoardLayout::generate(&BoardConfig::default()).unwrap();
        assert_eq!(layout.spawn_point.x, 256.0);
        assert!(layout.spawn_point.y < layout.lattice.row_y(0));
    }

    #[test]
    fn test_bin_lookup() {
        let layout = BoardLayout::generate(&BoardConfig::default()).unwrap();
        let below = layout.separator_top_y + 5.0;
        assert_eq!(layout.bin_of(Vec2::new(1.0, below)), Some(0));
        assert_eq!(
            layout.bin_of(Vec2::new(511.0, below)),
            Some(layout.bin_count() - 1)
        );
        assert_eq!(layout.bin_of(Vec2::new(256.0, 10.0)), None);
    }

    #[test]
    fn test_balls_past_the_edges_are_out_of_play() {
        let layout = BoardLayout::generate(&BoardConfig::default()).unwrap();
        assert!(layout.in_play(layout.spawn_point));
        assert!(layout.in_play(Vec2::new(0.0, 700.0)));
        // Slipped past the right edge and kept falling
        assert!(!layout.in_play(Vec2::new(517.3, 550.6)));
        assert!(!layout.in_play(Vec2::new(-3.0, 100.0)));
        assert!(!layout.in_play(Vec2::new(256.0, 8.0e5)));
    }

    proptest! {
        #[test]
        fn prop_rows_alternate_and_center(
            width in 200u32..2000,
            height in 200u32..2000,
            levels in 1u32..25,
        ) {
            let config = config_with(width, height, levels);
            if let Ok(layout) = BoardLayout::generate(&config) {
                let full = layout.lattice.max_pegs_even;
                let mut total = 0u32;
                for (row, &count) in layout.row_counts.iter().enumerate() {
                    let expected = if row % 2 == 0 { full } else { full - 1 };
                    prop_assert_eq!(count, expected);
                    total += count;

                    let xs = layout.lattice.row_centers(row as u32);
                    let mid = (xs[0] + xs[xs.len() - 1]) / 2.0;
                    prop_assert!((mid - width as f32 / 2.0).abs() < 1e-2);
                }
                prop_assert_eq!(total as usize, layout.pegs.len());

                let mut seen: Vec<(i64, i64)> = layout
                    .pegs
                    .iter()
                    .map(|p| ((p.x * 1000.0) as i64, (p.y * 1000.0) as i64))
                    .collect();
                seen.sort_unstable();
                seen.dedup();
                prop_assert_eq!(seen.len(), layout.pegs.len());
            }
        }

        #[test]
        fn prop_layout_is_deterministic(levels in 1u32..20) {
            let config = config_with(512, 768, levels);
            let a = BoardLayout::generate(&config).unwrap();
            let b = BoardLayout::generate(&config).unwrap();
            prop_assert_eq!(a, b);
        }
    }
}
