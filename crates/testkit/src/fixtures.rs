//! Wall layouts shared by tests and the headless harness.

use arena_physics::{WallCollisionModel, WallId, WallSegment, SLICE_COUNT};

/// Thickness of straight wall fixtures.
pub const WALL_THICKNESS: f32 = 10.0;

/// 10x10 pillar at `(x, y)` with the given destruction mask.
pub fn pillar(id: WallId, x: f32, y: f32, mask: [bool; SLICE_COUNT]) -> WallSegment {
    WallSegment::pillar(id, x, y).with_mask(mask)
}

/// Horizontal wall of standard thickness.
pub fn horizontal_wall(id: WallId, x: f32, y: f32, width: f32) -> WallSegment {
    WallSegment::horizontal(id, x, y, width, WALL_THICKNESS)
}

/// Vertical wall of standard thickness.
pub fn vertical_wall(id: WallId, x: f32, y: f32, height: f32) -> WallSegment {
    WallSegment::vertical(id, x, y, WALL_THICKNESS, height)
}

/// Copy of `segment` with every slice destroyed.
pub fn destroyed(segment: WallSegment) -> WallSegment {
    segment.with_mask([true; SLICE_COUNT])
}

/// Small arena: a corridor, a partly broken wall, and a damaged pillar.
pub fn arena_walls() -> Vec<WallSegment> {
    vec![
        vertical_wall(1, 300.0, 150.0, 250.0),
        horizontal_wall(2, 150.0, 120.0, 300.0),
        horizontal_wall(3, 150.0, 430.0, 300.0).with_slice_destroyed(2),
        pillar(4, 500.0, 300.0, [false, false, true, false, false]),
    ]
}

/// [`arena_walls`] as a collision model.
pub fn arena_model() -> WallCollisionModel {
    WallCollisionModel::new(arena_walls())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_core::Vec2;

    #[test]
    fn test_arena_layout_blocks_where_expected() {
        let model = arena_model();

        assert_eq!(model.len(), 4);
        assert!(model.is_blocked(Vec2::new(305.0, 200.0)));
        // Destroyed middle slice of the lower wall is a gap.
        assert!(!model.is_blocked(Vec2::new(300.0, 435.0)));
        assert!(model.is_blocked(Vec2::new(200.0, 435.0)));
        // Pillar band 2 is destroyed.
        assert!(!model.is_blocked(Vec2::new(505.0, 305.0)));
        assert!(model.is_blocked(Vec2::new(505.0, 301.0)));
    }

    #[test]
    fn test_destroyed_wall_never_blocks() {
        let model = WallCollisionModel::new([destroyed(vertical_wall(1, 0.0, 0.0, 100.0))]);
        assert!(!model.is_blocked(Vec2::new(5.0, 50.0)));
    }
}
