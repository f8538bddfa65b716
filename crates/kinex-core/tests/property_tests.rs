//! # Property-Based Tests
//!
//! Invariants of the geometry engine, the form validator and the rep counter.

use kinex_core::{
    AngleName, AngleSet, BalanceEstimate, FormValidator, GeometryEngine, Keypoint, PointXY,
    PoseFrame, RepCounter, RepEvent, RepThresholds, SquatTargets, Stage, angle_at,
};
use proptest::collection::vec;
use proptest::prelude::*;

fn point() -> impl Strategy<Value = PointXY> {
    (-2.0f64..2.0, -2.0f64..2.0).prop_map(|(x, y)| PointXY::new(x, y))
}

fn angle_set() -> impl Strategy<Value = AngleSet> {
    vec((0usize..5, 0.0f64..180.0), 0..6).prop_map(|entries| {
        entries
            .into_iter()
            .map(|(i, a)| (AngleName::ALL[i], a))
            .collect()
    })
}

proptest! {
    /// Any computed angle lies in [0, 180].
    #[test]
    fn angle_is_bounded(a in point(), b in point(), c in point()) {
        if let Some(angle) = angle_at(a, b, c) {
            prop_assert!((0.0..=180.0).contains(&angle));
        }
    }

    /// The bound holds at extreme coordinate scales too.
    #[test]
    fn angle_is_bounded_at_extreme_scales(
        a in point(), b in point(), c in point(),
        scale in prop_oneof![Just(1e-300), Just(1e-200), Just(1e200), Just(1e300)],
    ) {
        let s = |q: PointXY| PointXY::new(q.x * scale, q.y * scale);
        if let Some(angle) = angle_at(s(a), s(b), s(c)) {
            prop_assert!((0.0..=180.0).contains(&angle), "angle {angle}");
        }
    }

    /// Wide finite coordinates never yield a non-finite angle.
    #[test]
    fn angle_is_bounded_over_wide_range(
        ax in -1e300f64..1e300, ay in -1e300f64..1e300,
        cx in -1e300f64..1e300, cy in -1e300f64..1e300,
    ) {
        let b = PointXY::new(0.0, 0.0);
        if let Some(angle) = angle_at(PointXY::new(ax, ay), b, PointXY::new(cx, cy)) {
            prop_assert!((0.0..=180.0).contains(&angle), "angle {angle}");
        }
    }

    /// Swapping the outer points does not change the angle.
    #[test]
    fn angle_is_symmetric(a in point(), b in point(), c in point()) {
        let forward = angle_at(a, b, c);
        let backward = angle_at(c, b, a);
        match (forward, backward) {
            (Some(f), Some(r)) => prop_assert!((f - r).abs() < 1e-9),
            (f, r) => prop_assert_eq!(f.is_some(), r.is_some()),
        }
    }

    /// Opposite rays of any length give a straight angle.
    #[test]
    fn opposite_rays_are_straight(b in point(), dx in 0.01f64..1.0, dy in 0.01f64..1.0, k in 0.1f64..3.0) {
        let a = PointXY::new(b.x + dx, b.y + dy);
        let c = PointXY::new(b.x - dx * k, b.y - dy * k);
        let angle = angle_at(a, b, c).expect("non-degenerate");
        prop_assert!((angle - 180.0).abs() < 1e-4);
    }

    /// A frame where nothing clears the visibility gate yields no geometry.
    #[test]
    fn invisible_frame_is_empty(
        coords in vec((0.0f64..1.0, 0.0f64..1.0, 0.0f64..0.49), 33),
    ) {
        let keypoints = coords
            .iter()
            .enumerate()
            .map(|(i, &(x, y, v))| Keypoint::new(i as u32, x, y, 0.0, v))
            .collect();
        let frame = PoseFrame::new(keypoints);
        let engine = GeometryEngine::new(0.5);

        prop_assert!(engine.compute_angles(&frame).is_empty());
        prop_assert_eq!(engine.compute_balance(&frame), BalanceEstimate::default());
    }

    /// The validator is a pure function of its inputs.
    #[test]
    fn validator_is_idempotent(
        angles in angle_set(),
        cog in proptest::option::of(point()),
        base in proptest::option::of(point()),
    ) {
        let balance = BalanceEstimate { center_of_gravity: cog, base_of_support: base };
        let targets = SquatTargets::default();
        let first = FormValidator::evaluate(&angles, &balance, &targets);
        let second = FormValidator::evaluate(&angles, &balance, &targets);
        prop_assert_eq!(first, second);
    }

    /// Without ever rising above the up threshold, at most one descent and no reps.
    #[test]
    fn hysteresis_holds_below_up_threshold(
        angles in vec(95.0f64..=160.0, 1..200),
    ) {
        let mut counter = RepCounter::new(RepThresholds::default());
        let mut descents = 0;

        for angle in angles {
            match counter.update(Some(angle)) {
                Some(RepEvent::Descended) => descents += 1,
                Some(RepEvent::Completed { .. }) => prop_assert!(false, "rep completed at {}", angle),
                None => {}
            }
        }

        prop_assert!(descents <= 1);
        prop_assert_eq!(counter.rep_count(), 0);
    }

    /// Events alternate Descended / Completed and the count matches completions.
    #[test]
    fn events_alternate(
        angles in vec(proptest::option::of(40.0f64..180.0), 0..300),
    ) {
        let mut counter = RepCounter::new(RepThresholds::default());
        let mut expect_descent = true;
        let mut completions = 0u32;

        for angle in angles {
            match counter.update(angle) {
                Some(RepEvent::Descended) => {
                    prop_assert!(expect_descent);
                    expect_descent = false;
                }
                Some(RepEvent::Completed { rep_number, .. }) => {
                    prop_assert!(!expect_descent);
                    completions += 1;
                    prop_assert_eq!(rep_number, completions);
                    expect_descent = true;
                }
                None => {}
            }
        }

        prop_assert_eq!(counter.rep_count(), completions);
        prop_assert_eq!(counter.stage() == Stage::Up, expect_descent);
    }
}
