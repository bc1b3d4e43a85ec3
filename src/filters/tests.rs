use embassy_futures::block_on;

use super::*;
use crate::types::{HandLandmarks, Landmark, LANDMARK_COUNT};

const EPS: f64 = 1e-9;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < EPS
}

fn all_kinds() -> [SmootherKind; 3] {
    [SmootherKind::OneEuro, SmootherKind::Spring, SmootherKind::Holt]
}

fn ready_smoother(kind: SmootherKind) -> Smoother {
    let mut smoother = Smoother::build(kind, &PointerConfig::default()).expect("default config");
    block_on(smoother.init());
    smoother
}

fn moving(position: Point2, velocity: Point2) -> Option<Kinematics> {
    Some(Kinematics { position, velocity })
}

#[test]
fn tti_is_infinite_without_state_or_when_not_closing() {
    let target = Point2::new(0.9, 0.5);
    assert_eq!(time_to_impact(None, target), f64::INFINITY);

    let still = moving(Point2::new(0.1, 0.5), Point2::ZERO);
    assert_eq!(time_to_impact(still, target), f64::INFINITY);

    let away = moving(Point2::new(0.1, 0.5), Point2::new(-0.2, 0.0));
    assert_eq!(time_to_impact(away, target), f64::INFINITY);

    let sideways = moving(Point2::new(0.1, 0.5), Point2::new(0.0, 0.3));
    assert_eq!(time_to_impact(sideways, target), f64::INFINITY);
}

#[test]
fn tti_is_zero_on_target() {
    let state = moving(Point2::new(0.4, 0.4), Point2::new(-1.0, 0.0));
    assert_eq!(time_to_impact(state, Point2::new(0.4, 0.4)), 0.0);
}

#[test]
fn tti_shrinks_as_the_point_closes_in() {
    let target = Point2::new(0.9, 0.5);
    let velocity = Point2::new(0.5, 0.0);
    let mut previous = f64::INFINITY;
    for step in 0..8 {
        let x = 0.1 + 0.1 * step as f64;
        let tti = time_to_impact(moving(Point2::new(x, 0.5), velocity), target);
        assert!(tti.is_finite());
        assert!(tti < previous, "{tti} should be below {previous}");
        previous = tti;
    }
    // 0.8 units at 0.5 units/s.
    let tti = time_to_impact(moving(Point2::new(0.1, 0.5), velocity), target);
    assert!(approx(tti, 1_600.0));
}

#[test]
fn tti_through_the_trait_uses_last_frame() {
    let mut smoother = ready_smoother(SmootherKind::Holt);
    assert_eq!(smoother.calculate_tti(Point2::new(0.9, 0.5)), f64::INFINITY);
    for i in 0..20u64 {
        let _ = smoother.smooth(SmoothInput::at(i * 20, 0.1 + 0.01 * i as f64, 0.5));
    }
    let ahead = smoother.calculate_tti(Point2::new(0.9, 0.5));
    let behind = smoother.calculate_tti(Point2::new(0.0, 0.5));
    assert!(ahead.is_finite() && ahead > 0.0);
    assert_eq!(behind, f64::INFINITY);
}

#[test]
fn trajectory_is_evenly_spaced_and_clamped() {
    let state = moving(Point2::new(0.8, 0.5), Point2::new(1.0, -0.5));
    let points: Vec<_> = Trajectory::new(state, 400.0, 4).collect();
    assert_eq!(points.len(), 4);
    let times: Vec<f64> = points.iter().map(|p| p.t_ms).collect();
    assert_eq!(times, vec![100.0, 200.0, 300.0, 400.0]);
    assert!(approx(points[0].x, 0.9));
    assert!(approx(points[0].y, 0.45));
    assert_eq!(points[3].x, 1.0);
    assert!(points.iter().all(|p| (0.0..=1.0).contains(&p.y)));
}

#[test]
fn trajectory_is_deterministic_and_restartable() {
    let mut smoother = ready_smoother(SmootherKind::OneEuro);
    for i in 0..10u64 {
        let _ = smoother.smooth(SmoothInput::at(i * 16, 0.2 + 0.02 * i as f64, 0.4));
    }
    let first = smoother.predicted_trajectory(250.0, 5);
    let second = smoother.predicted_trajectory(250.0, 5);
    assert_eq!(first, second);

    let lazy = smoother.trajectory(250.0, 5);
    assert_eq!(lazy.len(), 5);
    let replay = lazy.clone();
    assert_eq!(lazy.collect::<Vec<_>>(), first);
    assert_eq!(replay.collect::<Vec<_>>(), first);
}

#[test]
fn trajectory_is_empty_without_state_or_steps() {
    assert_eq!(Trajectory::new(None, 100.0, 5).count(), 0);
    let state = moving(Point2::NEUTRAL, Point2::ZERO);
    assert_eq!(Trajectory::new(state, 100.0, 0).count(), 0);
    assert_eq!(Trajectory::new(state, -5.0, 3).count(), 0);
    assert_eq!(Trajectory::new(state, f64::NAN, 3).count(), 0);
}

#[test]
fn missing_point_passes_through_for_every_strategy() {
    for kind in all_kinds() {
        let mut smoother = ready_smoother(kind);
        let _ = smoother.smooth(SmoothInput::at(0, 0.3, 0.3));
        let before = smoother.kinematics();
        let out = smoother.smooth(SmoothInput::new(16, None));
        assert_eq!(out.position, None, "{kind:?}");
        assert_eq!(out.velocity, None, "{kind:?}");
        assert_eq!(smoother.kinematics(), before, "{kind:?}");
    }
}

#[test]
fn output_is_clamped_into_unit_square() {
    for kind in all_kinds() {
        let mut smoother = ready_smoother(kind);
        let mut out = SmoothedObservation::default();
        for i in 0..30u64 {
            out = smoother.smooth(SmoothInput::at(i * 16, 1.3, -0.4));
        }
        let p = out.position.expect("position");
        assert!((0.0..=1.0).contains(&p.x), "{kind:?} x = {}", p.x);
        assert!((0.0..=1.0).contains(&p.y), "{kind:?} y = {}", p.y);
    }
}

#[test]
fn nan_input_resets_instead_of_propagating() {
    for kind in all_kinds() {
        let mut smoother = ready_smoother(kind);
        let _ = smoother.smooth(SmoothInput::at(0, 0.3, 0.3));
        let out = smoother.smooth(SmoothInput::at(16, f64::NAN, 0.3));
        assert_eq!(out.position, None, "{kind:?}");
        assert_eq!(out.velocity, None, "{kind:?}");

        let next = smoother.smooth(SmoothInput::at(32, 0.6, 0.6));
        let p = next.position.expect("recovers on the next frame");
        assert!(p.is_finite(), "{kind:?}");
    }
}

#[test]
fn kind_selection_and_readiness() {
    let config = PointerConfig::default();
    let smoother = Smoother::from_config(&config).expect("default");
    assert_eq!(smoother.kind(), SmootherKind::OneEuro);
    assert!(smoother.is_ready());

    let spring = Smoother::build(SmootherKind::Spring, &config).expect("spring");
    assert!(!spring.is_ready());
    assert!(ready_smoother(SmootherKind::Spring).is_ready());
}

#[test]
fn invalid_config_fails_at_selection() {
    let mut config = PointerConfig::default();
    config.holt.alpha = 1.0;
    assert!(Smoother::build(SmootherKind::Holt, &config).is_err());
    assert!(Smoother::build(SmootherKind::OneEuro, &config).is_ok());
}

#[test]
fn bank_creates_one_smoother_per_key() {
    let mut bank =
        SmootherBank::new(SmootherKind::OneEuro, PointerConfig::default()).expect("bank");
    assert!(bank.is_empty());
    let _ = bank.smooth_point(8, SmoothInput::at(0, 0.2, 0.2));
    let _ = bank.smooth_point(4, SmoothInput::at(0, 0.7, 0.7));
    let _ = bank.smooth_point(8, SmoothInput::at(16, 0.2, 0.2));
    assert_eq!(bank.len(), 2);
    assert!(bank.get(8).and_then(|s| s.kinematics()).is_some());

    bank.reset();
    assert!(bank.get(8).and_then(|s| s.kinematics()).is_none());
}

#[test]
fn bank_smooths_whole_hands_and_initializes_late_entries() {
    let mut bank =
        SmootherBank::new(SmootherKind::Spring, PointerConfig::default()).expect("bank");
    block_on(bank.init());

    let mut points = [Landmark::default(); LANDMARK_COUNT];
    for (i, point) in points.iter_mut().enumerate() {
        *point = Landmark::new(i as f64 / 40.0, 0.5, 0.0);
    }
    let hand = HandLandmarks(points);
    let out = bank.smooth_landmarks(0, &hand);
    assert_eq!(bank.len(), LANDMARK_COUNT);
    assert!(out.iter().all(|o| o.velocity.is_some()));
    assert!(approx(out[20].position.expect("tip").x, 0.5));
}
