#![allow(clippy::float_cmp)]

use super::*;

const EPSILON: f64 = 1e-10;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn point_approx_eq(a: Point, b: Point) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y)
}

// --- Point ---

#[test]
fn point_distance() {
    assert!(approx_eq(Point::new(0.0, 0.0).distance_to(Point::new(3.0, 4.0)), 5.0));
}

// --- Rect ---

#[test]
fn rect_from_corners_normalizes() {
    let r = Rect::from_corners(Point::new(10.0, 0.0), Point::new(0.0, 5.0));
    assert_eq!(r, Rect { min_x: 0.0, min_y: 0.0, max_x: 10.0, max_y: 5.0 });
}

#[test]
fn rect_contains_edges() {
    let r = Rect::from_corners(Point::new(0.0, 0.0), Point::new(10.0, 10.0));
    assert!(r.contains(0.0, 10.0));
    assert!(!r.contains(10.1, 5.0));
}

#[test]
fn rect_intersects_and_padding() {
    let a = Rect::from_corners(Point::new(0.0, 0.0), Point::new(10.0, 10.0));
    let b = Rect::from_corners(Point::new(15.0, 15.0), Point::new(20.0, 20.0));
    assert!(!a.intersects(&b));
    assert!(a.padded(5.0).intersects(&b));
}

// --- Camera defaults ---

#[test]
fn camera_default_is_identity() {
    let cam = Camera::default();
    assert_eq!(cam.offset_x, 0.0);
    assert_eq!(cam.offset_y, 0.0);
    assert_eq!(cam.scale, 1.0);
}

// --- conversions ---

#[test]
fn screen_to_world_with_pan_and_zoom() {
    let cam = Camera { offset_x: 20.0, offset_y: 10.0, scale: 2.0 };
    let world = cam.screen_to_world(Point::new(20.0, 10.0));
    assert!(point_approx_eq(world, Point::new(0.0, 0.0)));
}

#[test]
fn world_to_screen_inverts_screen_to_world() {
    let cam = Camera { offset_x: -35.0, offset_y: 12.5, scale: 0.75 };
    let screen = Point::new(123.0, 456.0);
    let back = cam.world_to_screen(cam.screen_to_world(screen));
    assert!(point_approx_eq(back, screen));
}

#[test]
fn screen_dist_to_world_divides_by_scale() {
    let cam = Camera { offset_x: 0.0, offset_y: 0.0, scale: 4.0 };
    assert!(approx_eq(cam.screen_dist_to_world(100.0), 25.0));
}

#[test]
fn visible_world_accounts_for_offset() {
    let cam = Camera { offset_x: -100.0, offset_y: -50.0, scale: 2.0 };
    let r = cam.visible_world(800.0, 600.0);
    assert!(approx_eq(r.min_x, 50.0));
    assert!(approx_eq(r.min_y, 25.0));
    assert!(approx_eq(r.max_x, 450.0));
    assert!(approx_eq(r.max_y, 325.0));
}

// --- pan / zoom ---

#[test]
fn pan_by_accumulates() {
    let mut cam = Camera::default();
    cam.pan_by(5.0, -3.0);
    cam.pan_by(1.0, 1.0);
    assert_eq!(cam.offset_x, 6.0);
    assert_eq!(cam.offset_y, -2.0);
}

#[test]
fn zoom_at_keeps_anchor_fixed() {
    let mut cam = Camera { offset_x: 30.0, offset_y: -20.0, scale: 1.5 };
    let anchor = Point::new(200.0, 150.0);
    let before = cam.screen_to_world(anchor);
    cam.zoom_at(anchor, -1.0);
    let after = cam.screen_to_world(anchor);
    assert!(point_approx_eq(before, after));
    assert!(approx_eq(cam.scale, 1.5 * 1.1));
}

#[test]
fn zoom_at_scroll_down_zooms_out() {
    let mut cam = Camera::default();
    cam.zoom_at(Point::new(0.0, 0.0), 3.0);
    assert!(approx_eq(cam.scale, 1.0 / 1.1));
}

#[test]
fn zoom_at_zero_delta_is_noop() {
    let mut cam = Camera::default();
    cam.zoom_at(Point::new(10.0, 10.0), 0.0);
    assert_eq!(cam, Camera::default());
}

#[test]
fn zoom_is_clamped() {
    let mut cam = Camera::default();
    for _ in 0..100 {
        cam.zoom_in(800.0, 600.0);
    }
    assert!(approx_eq(cam.scale, 10.0));
    for _ in 0..200 {
        cam.zoom_out(800.0, 600.0);
    }
    assert!(approx_eq(cam.scale, 0.1));
}

#[test]
fn zoom_in_keeps_center_fixed() {
    let mut cam = Camera::default();
    cam.zoom_in(800.0, 600.0);
    let center = cam.screen_to_world(Point::new(400.0, 300.0));
    assert!(point_approx_eq(center, Point::new(400.0, 300.0)));
}

#[test]
fn reset_restores_default() {
    let mut cam = Camera { offset_x: 1.0, offset_y: 2.0, scale: 3.0 };
    cam.reset();
    assert_eq!(cam, Camera::default());
}
