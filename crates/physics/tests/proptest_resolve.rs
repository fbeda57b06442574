//! Property tests for sliding collision resolution.

use arena_physics::{resolve, WallCollisionModel, WallSegment, SLICE_COUNT};
use glam::Vec2;
use proptest::prelude::*;

fn arena() -> WallCollisionModel {
    WallCollisionModel::new([
        WallSegment::horizontal(1, 100.0, 100.0, 200.0, 12.0),
        WallSegment::vertical(2, 300.0, 150.0, 12.0, 200.0),
        WallSegment::pillar(3, 200.0, 250.0),
        WallSegment::horizontal(4, 50.0, 400.0, 100.0, 10.0).with_slice_destroyed(1),
    ])
}

fn coord() -> impl Strategy<Value = f32> {
    0.0f32..500.0
}

fn step() -> impl Strategy<Value = f32> {
    -6.0f32..6.0
}

proptest! {
    /// Property: standing still never moves the entity
    #[test]
    fn no_op_resolve_is_identity(x in coord(), y in coord()) {
        let model = arena();
        let pos = Vec2::new(x, y);
        prop_assert_eq!(resolve(pos, pos, &model), pos);
    }

    /// Property: the result is one of the four candidates, in X-before-Y order
    #[test]
    fn result_is_first_free_candidate(
        x in coord(), y in coord(), dx in step(), dy in step(),
    ) {
        let model = arena();
        let current = Vec2::new(x, y);
        let desired = current + Vec2::new(dx, dy);
        let x_only = Vec2::new(desired.x, current.y);
        let y_only = Vec2::new(current.x, desired.y);

        let expected = [desired, x_only, y_only]
            .into_iter()
            .find(|candidate| !model.is_blocked(*candidate))
            .unwrap_or(current);

        prop_assert_eq!(resolve(current, desired, &model), expected);
    }

    /// Property: moving from a free position never ends inside a wall
    #[test]
    fn free_start_stays_free(
        x in coord(), y in coord(), dx in step(), dy in step(),
    ) {
        let model = arena();
        let current = Vec2::new(x, y);
        prop_assume!(!model.is_blocked(current));

        let resolved = resolve(current, current + Vec2::new(dx, dy), &model);
        prop_assert!(!model.is_blocked(resolved));
    }

    /// Property: a destroyed slice never blocks any point that maps to it
    #[test]
    fn destroyed_slice_never_blocks(
        slice in 0..SLICE_COUNT,
        fx in 0.0f32..1.0,
        fy in -0.4f32..1.4,
    ) {
        let wall = WallSegment::horizontal(9, 0.0, 0.0, 100.0, 10.0).with_slice_destroyed(slice);
        let rect = wall.slice_rect(slice).unwrap();
        let model = WallCollisionModel::new([wall.clone()]);

        let point = Vec2::new(
            rect.min.x + rect.size().x * fx,
            rect.min.y + rect.size().y * fy,
        );
        prop_assume!(wall.slice_index(point) == Some(slice));
        prop_assert!(!model.is_blocked(point));
    }

    /// Property: resolution is a pure function of its inputs
    #[test]
    fn resolve_is_deterministic(
        x in coord(), y in coord(), dx in step(), dy in step(),
    ) {
        let model = arena();
        let current = Vec2::new(x, y);
        let desired = current + Vec2::new(dx, dy);
        prop_assert_eq!(resolve(current, desired, &model), resolve(current, desired, &model));
    }
}
