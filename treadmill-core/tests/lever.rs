use core::time::Duration;

use glam::Vec3;
use treadmill_core::surface::Grabbable;
use treadmill_core::surface::lever::{LeverConfig, SpeedLever};

const DT: Duration = Duration::from_millis(100);

/// Builds a controller direction that maps to the given deflection.
fn direction_for(degrees: f32) -> Vec3 {
    let radians = degrees.to_radians();
    Vec3::new(0.0, radians.cos(), radians.sin())
}

fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-3,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn held_lever_tracks_the_controller_immediately() {
    let mut lever = SpeedLever::new(LeverConfig::default()).expect("valid config");
    lever.on_select_start();

    lever.tick(DT, Some(direction_for(30.0)));
    assert_close(lever.current_angle(), 30.0);

    lever.tick(DT, Some(direction_for(-45.0)));
    assert_close(lever.current_angle(), -45.0);
}

#[test]
fn deflection_beyond_the_stop_clamps() {
    let mut lever = SpeedLever::new(LeverConfig::default()).expect("valid config");
    lever.on_select_start();

    lever.tick(DT, Some(direction_for(80.0)));
    assert_close(lever.current_angle(), 45.0);
    assert_close(lever.speed_fraction(), 1.0);
}

#[test]
fn speed_fraction_spans_the_configured_range() {
    let config = LeverConfig {
        min_speed_percent: 0.2,
        max_speed_percent: 0.8,
        ..LeverConfig::default()
    };
    let mut lever = SpeedLever::new(config).expect("valid config");

    lever.set_speed_fraction(0.0);
    assert_close(lever.speed_fraction(), 0.2);

    lever.set_speed_fraction(1.0);
    assert_close(lever.speed_fraction(), 0.8);

    lever.set_speed_fraction(0.5);
    assert_close(lever.speed_fraction(), 0.5);
}

#[test]
fn set_speed_fraction_clamps_and_applies_immediately() {
    let mut lever = SpeedLever::new(LeverConfig::default()).expect("valid config");

    lever.set_speed_fraction(7.3);
    assert_close(lever.current_angle(), 45.0);
    assert_close(lever.speed_fraction(), 1.0);

    lever.set_speed_fraction(-2.0);
    assert_close(lever.current_angle(), -45.0);
    assert_close(lever.speed_fraction(), 0.0);
}

#[test]
fn released_lever_relaxes_back_to_center() {
    let mut lever = SpeedLever::new(LeverConfig::default()).expect("valid config");
    lever.on_select_start();
    lever.tick(DT, Some(direction_for(45.0)));
    lever.on_select_end();

    let mut previous = lever.current_angle();
    for _ in 0..40 {
        lever.tick(DT, None);
        let angle = lever.current_angle();
        assert!(angle <= previous + 1e-6, "angle moved away from center");
        previous = angle;
    }
    // Default speed 0.5 centers at zero deflection.
    assert!(lever.current_angle().abs() < 0.1);
}

#[test]
fn lever_without_return_to_center_holds_its_angle() {
    let config = LeverConfig {
        return_to_center: false,
        ..LeverConfig::default()
    };
    let mut lever = SpeedLever::new(config).expect("valid config");
    lever.on_select_start();
    lever.tick(DT, Some(direction_for(45.0)));
    lever.on_select_end();

    for _ in 0..10 {
        lever.tick(DT, None);
    }
    assert_close(lever.current_angle(), 45.0);
}

#[test]
fn snapping_quantizes_to_detents() {
    let config = LeverConfig {
        snap_to_positions: true,
        snap_position_count: 5,
        ..LeverConfig::default()
    };
    let mut lever = SpeedLever::new(config).expect("valid config");
    lever.on_select_start();

    // Five detents across [-45, 45] sit 22.5 degrees apart.
    lever.tick(DT, Some(direction_for(30.0)));
    assert_close(lever.current_angle(), 22.5);

    lever.tick(DT, Some(direction_for(-40.0)));
    assert_close(lever.current_angle(), -45.0);
}

#[test]
fn degenerate_direction_holds_the_previous_angle() {
    let mut lever = SpeedLever::new(LeverConfig::default()).expect("valid config");
    lever.on_select_start();

    lever.tick(DT, Some(direction_for(30.0)));
    lever.tick(DT, Some(Vec3::ZERO));
    assert_close(lever.current_angle(), 30.0);
    assert!(lever.current_angle().is_finite());
    assert!(lever.speed_fraction().is_finite());
}

#[test]
fn degenerate_first_sample_holds_the_grab_pose() {
    let mut lever = SpeedLever::new(LeverConfig {
        default_speed_percent: 0.75,
        ..LeverConfig::default()
    })
    .expect("valid config");

    // Grab at the 22.5 degree rest pose; a pivot-centered sample must not
    // yank the lever anywhere.
    lever.on_select_start();
    lever.tick(DT, Some(Vec3::ZERO));
    assert_close(lever.current_angle(), 22.5);
}

#[test]
fn held_lever_ignores_return_to_center() {
    let mut lever = SpeedLever::new(LeverConfig::default()).expect("valid config");
    lever.on_select_start();
    lever.tick(DT, Some(direction_for(45.0)));

    // Held with no fresh sample: the lever stays where the operator left
    // it instead of relaxing.
    for _ in 0..10 {
        lever.tick(DT, None);
    }
    assert_close(lever.current_angle(), 45.0);
}
