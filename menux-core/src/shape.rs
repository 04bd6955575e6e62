//! Menu shapes and the pointer-offset → item-index hit test.
//!
//! Every size is a fraction of the smaller display dimension so that a menu
//! covers the same share of the screen on any device.

use crate::point::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const TEXT_SIZE_RATIO: f32 = 0.028;
/// Drag distance below which nothing is selected.
pub const MIN_DIST_RATIO: f32 = 0.007;
pub const LINEAR_CELL_WIDTH_RATIO: f32 = 0.277;
pub const LINEAR_CELL_HEIGHT_RATIO: f32 = 0.104;
pub const RADIAL_RADIUS_RATIO: f32 = 0.347;
pub const GRID_CELL_WIDTH_RATIO: f32 = 0.220;
pub const GRID_CELLS_PER_ROW: usize = 3;

/// Bare shape tag, used for scheduling and in the result log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MenuKind {
    Linear,
    Radial,
    Grid,
}

impl MenuKind {
    pub const ALL: [MenuKind; 3] = [MenuKind::Linear, MenuKind::Radial, MenuKind::Grid];

    pub fn as_str(&self) -> &'static str {
        match self {
            MenuKind::Linear => "LINEAR",
            MenuKind::Radial => "RADIAL",
            MenuKind::Grid => "GRID",
        }
    }
}

impl fmt::Display for MenuKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Size of the surface menus are drawn on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayMetrics {
    pub width: u32,
    pub height: u32,
}

impl DisplayMetrics {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn min_dimension(&self) -> f32 {
        self.width.min(self.height) as f32
    }

    /// Whole pixels, truncated like every other layout constant.
    pub fn scaled(&self, ratio: f32) -> f32 {
        (ratio * self.min_dimension()).floor()
    }
}

/// Shape variant together with its layout parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MenuShape {
    /// Column of `cell_width × cell_height` cells growing downwards.
    Linear { cell_width: f32, cell_height: f32 },
    /// Pie with sector 0 centred on north, items running clockwise.
    Radial { radius: f32 },
    /// Square cells filled row-major, `cells_per_row` columns.
    Grid { cell_width: f32, cells_per_row: usize },
}

impl MenuShape {
    pub fn for_kind(kind: MenuKind, metrics: DisplayMetrics) -> Self {
        match kind {
            MenuKind::Linear => MenuShape::Linear {
                cell_width: metrics.scaled(LINEAR_CELL_WIDTH_RATIO),
                cell_height: metrics.scaled(LINEAR_CELL_HEIGHT_RATIO),
            },
            MenuKind::Radial => MenuShape::Radial {
                radius: metrics.scaled(RADIAL_RADIUS_RATIO),
            },
            MenuKind::Grid => MenuShape::Grid {
                cell_width: metrics.scaled(GRID_CELL_WIDTH_RATIO),
                cells_per_row: GRID_CELLS_PER_ROW,
            },
        }
    }

    pub fn kind(&self) -> MenuKind {
        match self {
            MenuShape::Linear { .. } => MenuKind::Linear,
            MenuShape::Radial { .. } => MenuKind::Radial,
            MenuShape::Grid { .. } => MenuKind::Grid,
        }
    }
}

/// A shape plus the deadzone and text size shared by all shapes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MenuLayout {
    pub shape: MenuShape,
    pub min_dist: f32,
    pub text_size: f32,
}

impl MenuLayout {
    pub fn new(kind: MenuKind, metrics: DisplayMetrics) -> Self {
        Self {
            shape: MenuShape::for_kind(kind, metrics),
            min_dist: metrics.scaled(MIN_DIST_RATIO),
            text_size: metrics.scaled(TEXT_SIZE_RATIO),
        }
    }

    pub fn with_shape(shape: MenuShape, min_dist: f32) -> Self {
        Self {
            shape,
            min_dist,
            text_size: 0.0,
        }
    }

    pub fn kind(&self) -> MenuKind {
        self.shape.kind()
    }

    /// Maps an offset from the press origin to the item under it.
    ///
    /// `None` means "nothing selected": inside the deadzone, outside the
    /// menu, or past the last item of a partially filled grid row.
    pub fn resolve(&self, offset: Point, item_count: usize) -> Option<usize> {
        if item_count == 0 || !offset.is_finite() || offset.distance() < self.min_dist {
            return None;
        }
        match self.shape {
            MenuShape::Linear {
                cell_width,
                cell_height,
            } => resolve_linear(offset, item_count, cell_width, cell_height),
            MenuShape::Radial { .. } => Some(resolve_radial(offset, item_count)),
            MenuShape::Grid {
                cell_width,
                cells_per_row,
            } => resolve_grid(offset, item_count, cell_width, cells_per_row),
        }
    }
}

fn resolve_linear(offset: Point, item_count: usize, width: f32, height: f32) -> Option<usize> {
    if width <= 0.0 || height <= 0.0 {
        return None;
    }
    if offset.x < 0.0 || offset.x > width || offset.y < 0.0 || offset.y > height * item_count as f32
    {
        return None;
    }
    // The bottom edge is inside the menu and belongs to the last cell.
    let index = (offset.y / height).floor() as usize;
    Some(index.min(item_count - 1))
}

/// Sector boundaries are closed on their clockwise-first side: a point
/// exactly on an edge belongs to the sector that starts there.
fn resolve_radial(offset: Point, item_count: usize) -> usize {
    let sector = 360.0 / item_count as f64;
    let screen_angle = (offset.y as f64).atan2(offset.x as f64).to_degrees();
    let angle = (screen_angle + 90.0 + 0.5 * sector + 360.0).rem_euclid(360.0);
    // rounding can land a hair under 360 on exactly n
    ((angle / sector).floor() as usize).min(item_count - 1)
}

fn resolve_grid(offset: Point, item_count: usize, width: f32, per_row: usize) -> Option<usize> {
    if width <= 0.0 || per_row == 0 {
        return None;
    }
    let rows = item_count.div_ceil(per_row);
    if offset.x < 0.0
        || offset.x > width * per_row as f32
        || offset.y < 0.0
        || offset.y > width * rows as f32
    {
        return None;
    }
    let column = ((offset.x / width).floor() as usize).min(per_row - 1);
    let row = ((offset.y / width).floor() as usize).min(rows - 1);
    let index = row * per_row + column;
    (index < item_count).then_some(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const W: f32 = 120.0;
    const H: f32 = 40.0;
    const MIN: f32 = 5.0;

    fn linear() -> MenuLayout {
        MenuLayout::with_shape(
            MenuShape::Linear {
                cell_width: W,
                cell_height: H,
            },
            MIN,
        )
    }

    fn radial() -> MenuLayout {
        MenuLayout::with_shape(MenuShape::Radial { radius: 200.0 }, MIN)
    }

    fn grid() -> MenuLayout {
        MenuLayout::with_shape(
            MenuShape::Grid {
                cell_width: W,
                cells_per_row: 3,
            },
            MIN,
        )
    }

    /// Point `r` away from the origin, `degrees` clockwise from north.
    fn compass(degrees: f64, r: f64) -> Point {
        let rad = degrees.to_radians();
        Point::new((r * rad.sin()) as f32, (-r * rad.cos()) as f32)
    }

    #[test]
    fn linear_cells() {
        let menu = linear();
        assert_eq!(menu.resolve(Point::new(W / 2.0, H / 2.0), 3), Some(0));
        assert_eq!(menu.resolve(Point::new(W / 2.0, H * 2.5), 3), Some(2));
        assert_eq!(menu.resolve(Point::new(W / 2.0, H * 3.5), 3), None);
    }

    #[test]
    fn linear_outside_column() {
        let menu = linear();
        assert_eq!(menu.resolve(Point::new(-1.0, H * 1.5), 3), None);
        assert_eq!(menu.resolve(Point::new(W + 1.0, H * 1.5), 3), None);
        assert_eq!(menu.resolve(Point::new(W / 2.0, -10.0), 3), None);
    }

    #[test]
    fn linear_bottom_edge_is_last_cell() {
        assert_eq!(linear().resolve(Point::new(W / 2.0, H * 3.0), 3), Some(2));
    }

    #[test]
    fn radial_north_is_sector_zero() {
        assert_eq!(radial().resolve(Point::new(0.0, -50.0), 4), Some(0));
    }

    #[test]
    fn radial_just_past_first_boundary() {
        let menu = radial();
        assert_eq!(menu.resolve(compass(44.5, 50.0), 4), Some(0));
        assert_eq!(menu.resolve(compass(45.5, 50.0), 4), Some(1));
    }

    #[test]
    fn radial_exact_boundary_belongs_to_next_sector() {
        let menu = radial();
        assert_eq!(menu.resolve(Point::new(50.0, -50.0), 4), Some(1));
        assert_eq!(menu.resolve(Point::new(50.0, 50.0), 4), Some(2));
        assert_eq!(menu.resolve(Point::new(-50.0, 50.0), 4), Some(3));
        assert_eq!(menu.resolve(Point::new(-50.0, -50.0), 4), Some(0));
        assert_eq!(menu.resolve(Point::new(50.0, 0.0), 2), Some(1));
        assert_eq!(menu.resolve(Point::new(-50.0, 0.0), 2), Some(0));
    }

    #[test]
    fn radial_wraps_around_north() {
        let menu = radial();
        assert_eq!(menu.resolve(compass(350.0, 50.0), 4), Some(0));
        assert_eq!(menu.resolve(compass(314.0, 50.0), 4), Some(3));
        assert_eq!(menu.resolve(compass(180.0, 50.0), 4), Some(2));
        assert_eq!(menu.resolve(compass(90.0, 50.0), 4), Some(1));
    }

    #[test]
    fn radial_has_no_outer_bound() {
        assert_eq!(radial().resolve(Point::new(0.0, 10_000.0), 4), Some(2));
    }

    #[test]
    fn grid_partial_last_row() {
        let menu = grid();
        assert_eq!(menu.resolve(Point::new(2.5 * W, 1.5 * W), 5), None);
        assert_eq!(menu.resolve(Point::new(1.5 * W, 1.5 * W), 5), Some(4));
        assert_eq!(menu.resolve(Point::new(2.5 * W, 0.5 * W), 5), Some(2));
    }

    #[test]
    fn grid_right_edge_does_not_wrap_to_next_row() {
        assert_eq!(grid().resolve(Point::new(3.0 * W, 0.5 * W), 6), Some(2));
    }

    #[test]
    fn grid_outside_bounds() {
        let menu = grid();
        assert_eq!(menu.resolve(Point::new(3.0 * W + 1.0, 0.5 * W), 6), None);
        assert_eq!(menu.resolve(Point::new(0.5 * W, 2.0 * W + 1.0), 6), None);
    }

    #[test]
    fn empty_menu_never_resolves() {
        for menu in [linear(), radial(), grid()] {
            assert_eq!(menu.resolve(Point::new(10.0, 10.0), 0), None);
        }
    }

    #[test]
    fn nan_offset_is_none() {
        for menu in [linear(), radial(), grid()] {
            assert_eq!(menu.resolve(Point::new(f32::NAN, 10.0), 4), None);
        }
    }

    #[test]
    fn layout_scales_with_smaller_dimension() {
        let layout = MenuLayout::new(MenuKind::Linear, DisplayMetrics::new(1920, 1000));
        assert_eq!(
            layout.shape,
            MenuShape::Linear {
                cell_width: 277.0,
                cell_height: 104.0
            }
        );
        assert_eq!(layout.min_dist, 7.0);
        assert_eq!(layout.kind(), MenuKind::Linear);
    }

    proptest! {
        #[test]
        fn resolve_is_pure(x in -400.0f32..400.0, y in -400.0f32..400.0, n in 1usize..12) {
            for menu in [linear(), radial(), grid()] {
                let before = menu;
                let first = menu.resolve(Point::new(x, y), n);
                let second = menu.resolve(Point::new(x, y), n);
                prop_assert_eq!(first, second);
                prop_assert_eq!(menu, before);
            }
        }

        #[test]
        fn deadzone_wins_for_every_shape(angle in 0.0f64..360.0, r in 0.0f64..4.9, n in 1usize..12) {
            let offset = compass(angle, r);
            for menu in [linear(), radial(), grid()] {
                prop_assert_eq!(menu.resolve(offset, n), None);
            }
        }

        #[test]
        fn radial_is_total(angle in 0.0f64..360.0, r in 6.0f64..1000.0, n in 1usize..16) {
            let index = radial().resolve(compass(angle, r), n);
            prop_assert!(matches!(index, Some(i) if i < n));
        }

        #[test]
        fn radial_sector_centres(n in 1usize..16, r in 6.0f64..1000.0) {
            let sector = 360.0 / n as f64;
            for i in 0..n {
                prop_assert_eq!(radial().resolve(compass(i as f64 * sector, r), n), Some(i));
            }
        }

        #[test]
        fn bounded_shapes_stay_in_range(x in -400.0f32..400.0, y in -400.0f32..400.0, n in 1usize..12) {
            for menu in [linear(), grid()] {
                if let Some(i) = menu.resolve(Point::new(x, y), n) {
                    prop_assert!(i < n);
                }
            }
        }
    }
}
