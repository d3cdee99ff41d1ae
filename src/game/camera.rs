//! Headless Follow Camera
//!
//! Orthographic top-down projection that trails the run along the track.
//! World X maps to viewport x, world Z maps to viewport y, so segments the
//! player has passed climb past the top of the viewport.

use glam::{Vec2, Vec3};

use crate::config::CameraConfig;
use crate::game::services::Viewport;
use crate::game::track::BACK;

/// Camera that moves backwards along the track at the run's forward speed.
#[derive(Clone, Debug, PartialEq)]
pub struct FollowCamera {
    /// Point projected to viewport (0.5, 0.5)
    pub focus: Vec3,
    start: Vec3,
    view_width: f32,
    view_depth: f32,
    shakes: u32,
}

impl FollowCamera {
    /// Camera from its configuration.
    pub fn new(config: &CameraConfig) -> Self {
        Self {
            focus: config.start_position,
            start: config.start_position,
            view_width: config.view_width,
            view_depth: config.view_depth,
            shakes: 0,
        }
    }

    /// Number of shakes requested so far.
    pub fn shake_count(&self) -> u32 {
        self.shakes
    }
}

impl Viewport for FollowCamera {
    fn world_to_viewport(&self, world: Vec3) -> Vec2 {
        let offset = world - self.focus;
        Vec2::new(
            0.5 + offset.x / self.view_width,
            0.5 + offset.z / self.view_depth,
        )
    }

    fn viewport_to_world(&self, viewport: Vec3) -> Vec3 {
        Vec3::new(
            self.focus.x + (viewport.x - 0.5) * self.view_width,
            self.focus.y,
            self.focus.z + (viewport.y - 0.5) * self.view_depth,
        )
    }

    fn follow(&mut self, dt: f32, forward_speed: f32) {
        self.focus += BACK * forward_speed * dt;
    }

    fn shake(&mut self) {
        self.shakes += 1;
    }

    fn reset(&mut self) {
        self.focus = self.start;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> FollowCamera {
        FollowCamera::new(&CameraConfig {
            view_width: 20.0,
            view_depth: 30.0,
            start_position: Vec3::ZERO,
        })
    }

    #[test]
    fn test_focus_is_center() {
        let cam = camera();
        assert_eq!(cam.world_to_viewport(Vec3::ZERO), Vec2::new(0.5, 0.5));
    }

    #[test]
    fn test_round_trip() {
        let cam = camera();
        let world = cam.viewport_to_world(Vec3::new(1.2, -0.2, 0.0));
        let back = cam.world_to_viewport(world);
        assert!((back.x - 1.2).abs() < 1e-5);
        assert!((back.y + 0.2).abs() < 1e-5);
    }

    #[test]
    fn test_follow_moves_passed_objects_up() {
        let mut cam = camera();
        let marker = Vec3::ZERO;
        let before = cam.world_to_viewport(marker).y;
        cam.follow(1.0, 6.0);
        let after = cam.world_to_viewport(marker).y;
        assert!(after > before);
        assert!((after - before - 6.0 / 30.0).abs() < 1e-5);

        cam.reset();
        assert_eq!(cam.world_to_viewport(marker).y, before);
    }

    #[test]
    fn test_shake_is_counted() {
        let mut cam = camera();
        assert_eq!(cam.shake_count(), 0);
        cam.shake();
        cam.shake();
        assert_eq!(cam.shake_count(), 2);

        // Shaking leaves the projection alone
        assert_eq!(cam.world_to_viewport(Vec3::ZERO), Vec2::new(0.5, 0.5));
    }
}
