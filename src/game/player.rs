//! Player Motion & Collision Controller
//!
//! The player slides diagonally (BACK+RIGHT) at the forward speed and
//! steers against it while input is held. The controller never touches the
//! collaborators; it reports [`PlayerSignal`]s that the session reduces.

use glam::Vec3;
use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::config::MotionConfig;
use crate::core::hash::StateHasher;
use crate::game::collision::Trigger;
use crate::game::events::DeathCause;
use crate::game::pool::{DecorationHandle, PoolSet};
use crate::game::services::Viewport;
use crate::game::state::GameState;
use crate::game::track::{BACK, FORWARD, LEFT, RIGHT};

/// Base yaw of the player model.
const BASE_HEADING_DEGREES: f32 = 45.0;

/// Something the session has to react to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlayerSignal {
    /// Steering toward the edge of the screen
    HeadingTowardEdge,
    /// Shake the camera
    CameraShake,
    /// Play the crash sound, interrupting
    CrashSound,
    /// Impulse applied to the crashed player
    CollisionImpulse(Vec3),
    /// A pickup was collected
    Collected(DecorationHandle),
    /// First death of the run
    Died(DeathCause),
}

/// Motion state of the player.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerController {
    config: MotionConfig,

    /// World position
    pub position: Vec3,
    /// Movement of the last frame, per second
    pub velocity: Vec3,
    /// Yaw in degrees
    pub heading_degrees: f32,

    /// L: steer speed
    steer_speed: f32,
    /// R: forward speed
    forward_speed: f32,
    /// Steer acceleration
    speed_factor: f32,
    collision_force: f32,

    started: bool,
    stopped: bool,
    dead: bool,
    triggers_enabled: bool,
    at_screen_edge: bool,
}

impl PlayerController {
    /// Player at its start position, not running.
    pub fn new(config: &MotionConfig) -> Self {
        Self {
            config: config.clone(),
            position: config.start_position,
            velocity: Vec3::ZERO,
            heading_degrees: BASE_HEADING_DEGREES,
            steer_speed: 0.0,
            forward_speed: 0.0,
            speed_factor: 0.0,
            collision_force: config.initial_collision_force,
            started: false,
            stopped: false,
            dead: false,
            triggers_enabled: true,
            at_screen_edge: false,
        }
    }

    /// Begin the run (Prepare -> Playing).
    pub fn start_run(&mut self) {
        self.started = true;
    }

    /// Run has started.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Motion stopped by a crash or overrun.
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Died this run.
    pub fn is_dead(&self) -> bool {
        self.dead
    }

    /// Last edge check flagged the player.
    pub fn is_at_screen_edge(&self) -> bool {
        self.at_screen_edge
    }

    /// Trigger checks are live.
    pub fn triggers_enabled(&self) -> bool {
        self.triggers_enabled
    }

    /// L
    pub fn steer_speed(&self) -> f32 {
        self.steer_speed
    }

    /// R
    pub fn forward_speed(&self) -> f32 {
        self.forward_speed
    }

    /// Current steer acceleration.
    pub fn speed_factor(&self) -> f32 {
        self.speed_factor
    }

    /// Current crash impulse magnitude.
    pub fn collision_force(&self) -> f32 {
        self.collision_force
    }

    /// Trigger radius.
    pub fn radius(&self) -> f32 {
        self.config.radius
    }

    // ========================================================================
    // Ramps (run as per-frame tasks)
    // ========================================================================

    /// Ramp forward speed and steer acceleration. Returns false once both
    /// are capped or the run is over.
    pub fn ramp_speed(&mut self, dt: f32, state: GameState) -> bool {
        if state == GameState::GameOver {
            return false;
        }

        let max_speed = self.config.max_speed;
        let max_factor = self.config.max_speed_factor;
        let rate = self.config.increase_speed_factor;

        if self.started {
            if self.forward_speed < max_speed {
                self.forward_speed += rate * dt;
            }
            if self.speed_factor < max_factor {
                self.speed_factor += rate * dt;
            }
        }

        self.forward_speed = self.forward_speed.min(max_speed);
        self.speed_factor = self.speed_factor.min(max_factor);

        !(self.forward_speed == max_speed && self.speed_factor == max_factor)
    }

    /// Ramp the collision force. Returns false once it is capped or the
    /// run is over.
    pub fn ramp_collision_force(&mut self, dt: f32, state: GameState) -> bool {
        if state == GameState::GameOver {
            return false;
        }

        if self.started {
            if self.collision_force < self.config.max_collision_force {
                self.collision_force += self.config.increase_collision_force_factor * dt;
            } else {
                self.collision_force = self.config.max_collision_force;
                return false;
            }
        }
        true
    }

    // ========================================================================
    // Per-frame update
    // ========================================================================

    /// Steer, move and check the screen edges.
    pub fn update(
        &mut self,
        dt: f32,
        steering: bool,
        state: GameState,
        viewport: &dyn Viewport,
        signals: &mut Vec<PlayerSignal>,
    ) {
        if self.started && state != GameState::GameOver {
            self.steer(dt, steering);
        }

        if !self.stopped {
            self.advance(dt);
        }

        let x = viewport.world_to_viewport(self.position).x;
        let heading_right = x >= self.config.edge_warning_max && self.steer_speed == 0.0;
        let heading_left = x <= self.config.edge_warning_min && self.steer_speed > 0.0;

        self.at_screen_edge = heading_left || heading_right;
        if self.at_screen_edge {
            signals.push(PlayerSignal::HeadingTowardEdge);
        }

        let off_screen = x > self.config.edge_death_max || x < self.config.edge_death_min;
        if !self.stopped && state != GameState::GameOver && off_screen {
            self.stopped = true;
            signals.push(PlayerSignal::CameraShake);
            signals.push(PlayerSignal::CrashSound);
            self.die(DeathCause::EdgeOverrun, signals);
        }
    }

    fn steer(&mut self, dt: f32, steering: bool) {
        let max_speed = self.config.max_speed;
        if steering {
            if self.steer_speed < max_speed {
                self.steer_speed += self.speed_factor * dt;
            } else {
                self.steer_speed = max_speed;
            }
        } else if self.steer_speed > 0.0 {
            self.steer_speed -= self.speed_factor * dt;
        } else {
            self.steer_speed = 0.0;
        }
    }

    fn advance(&mut self, dt: f32) {
        let right = (BACK + RIGHT) * self.forward_speed;
        let left = (BACK + LEFT) * self.steer_speed;
        let counter = (FORWARD + LEFT) * self.steer_speed;
        let total = right + left + counter;

        self.velocity = total;
        self.position += total * dt;

        let angle = if self.steer_speed == self.config.max_speed {
            90.0
        } else if self.steer_speed == 0.0 {
            0.0
        } else if right.length_squared() > 0.0 && total.length_squared() > 0.0 {
            right.angle_between(total).to_degrees()
        } else {
            0.0
        };
        self.heading_degrees = BASE_HEADING_DEGREES + angle;
    }

    // ========================================================================
    // Triggers
    // ========================================================================

    /// React to an overlapping trigger.
    pub fn on_trigger(
        &mut self,
        trigger: Trigger,
        state: GameState,
        pools: &mut PoolSet,
        signals: &mut Vec<PlayerSignal>,
    ) {
        if state == GameState::GameOver || !self.triggers_enabled {
            return;
        }

        if trigger.kind().is_lethal() {
            self.stopped = true;
            self.triggers_enabled = false;
            let impulse = self.config.collision_direction.normalize_or_zero() * self.collision_force;
            signals.push(PlayerSignal::CollisionImpulse(impulse));
            signals.push(PlayerSignal::CameraShake);
            signals.push(PlayerSignal::CrashSound);
            self.die(DeathCause::Collision, signals);
            return;
        }

        if let Trigger::Pickup(handle) = trigger {
            let Some(pickup) = pools.get_mut(handle) else {
                return;
            };
            if !pickup.collider_enabled {
                return;
            }
            pickup.collider_enabled = false;
            pickup.bounce_stopped = true;
            signals.push(PlayerSignal::Collected(handle));
        }
    }

    /// Signal death once per run.
    pub fn die(&mut self, cause: DeathCause, signals: &mut Vec<PlayerSignal>) {
        if self.dead {
            return;
        }
        self.dead = true;
        debug!("player died: {:?}", cause);
        signals.push(PlayerSignal::Died(cause));
    }

    /// Digest the motion state.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_vec3(self.position);
        hasher.update_vec3(self.velocity);
        hasher.update_f32(self.heading_degrees);
        hasher.update_f32(self.steer_speed);
        hasher.update_f32(self.forward_speed);
        hasher.update_f32(self.speed_factor);
        hasher.update_f32(self.collision_force);
        hasher.update_bool(self.started);
        hasher.update_bool(self.stopped);
        hasher.update_bool(self.dead);
        hasher.update_bool(self.triggers_enabled);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraConfig;
    use crate::core::rng::DeterministicRng;
    use crate::game::camera::FollowCamera;
    use crate::game::pool::{DecorationKind, PoolSizes, VariantCounts};
    use crate::game::track::{Side, WallId};

    const DT: f32 = 1.0 / 60.0;

    fn camera() -> FollowCamera {
        FollowCamera::new(&CameraConfig::default())
    }

    fn running_player() -> PlayerController {
        let mut player = PlayerController::new(&MotionConfig::default());
        player.start_run();
        player
    }

    fn pools() -> PoolSet {
        let mut rng = DeterministicRng::new(1);
        PoolSet::new(PoolSizes::for_track(2, 1, 10, false), VariantCounts::default(), &mut rng)
    }

    fn deaths(signals: &[PlayerSignal]) -> usize {
        signals.iter().filter(|s| matches!(s, PlayerSignal::Died(_))).count()
    }

    #[test]
    fn test_idle_before_start() {
        let mut player = PlayerController::new(&MotionConfig::default());
        let mut signals = Vec::new();
        for _ in 0..60 {
            assert!(player.ramp_speed(DT, GameState::Prepare));
            player.update(DT, true, GameState::Prepare, &camera(), &mut signals);
        }
        assert_eq!(player.position, Vec3::ZERO);
        assert_eq!(player.steer_speed(), 0.0);
        assert!(signals.is_empty());
    }

    #[test]
    fn test_speed_ramp_caps_and_finishes() {
        let mut player = running_player();
        let mut frames = 0;
        while player.ramp_speed(DT, GameState::Playing) {
            frames += 1;
            assert!(frames < 10_000);
        }
        assert_eq!(player.forward_speed(), 6.0);
        assert_eq!(player.speed_factor(), 8.0);
    }

    #[test]
    fn test_ramps_stop_at_game_over() {
        let mut player = running_player();
        assert!(!player.ramp_speed(DT, GameState::GameOver));
        assert!(!player.ramp_collision_force(DT, GameState::GameOver));
    }

    #[test]
    fn test_collision_force_ramp() {
        let mut player = running_player();
        assert_eq!(player.collision_force(), 200.0);
        let mut frames = 0;
        while player.ramp_collision_force(DT, GameState::Playing) {
            frames += 1;
            assert!(frames < 100_000);
        }
        assert_eq!(player.collision_force(), 600.0);
    }

    #[test]
    fn test_drift_without_steering() {
        let mut player = running_player();
        while player.ramp_speed(DT, GameState::Playing) {}

        let mut signals = Vec::new();
        player.update(1.0, false, GameState::Playing, &camera(), &mut signals);
        assert!((player.position - Vec3::new(6.0, 0.0, -6.0)).length() < 1e-5);
        assert_eq!(player.heading_degrees, 45.0);
    }

    #[test]
    fn test_full_steer_heads_left() {
        let mut player = running_player();
        while player.ramp_speed(DT, GameState::Playing) {}

        let mut signals = Vec::new();
        let cam = camera();
        for _ in 0..120 {
            player.update(DT, true, GameState::Playing, &cam, &mut signals);
        }
        assert_eq!(player.steer_speed(), 6.0);
        assert_eq!(player.heading_degrees, 135.0);
        assert!(player.velocity.x < 0.0);
    }

    #[test]
    fn test_steer_decays_to_zero() {
        let mut player = running_player();
        while player.ramp_speed(DT, GameState::Playing) {}

        let mut signals = Vec::new();
        let cam = camera();
        for _ in 0..30 {
            player.update(DT, true, GameState::Playing, &cam, &mut signals);
        }
        assert!(player.steer_speed() > 0.0);
        for _ in 0..120 {
            player.update(DT, false, GameState::Playing, &cam, &mut signals);
        }
        assert_eq!(player.steer_speed(), 0.0);
    }

    #[test]
    fn test_heading_toward_right_edge() {
        let mut player = running_player();
        player.position = Vec3::new(9.5, 0.0, 0.0);
        let mut signals = Vec::new();
        player.update(DT, false, GameState::Playing, &camera(), &mut signals);

        assert!(player.is_at_screen_edge());
        assert_eq!(signals, vec![PlayerSignal::HeadingTowardEdge]);
    }

    #[test]
    fn test_edge_overrun_dies() {
        let mut player = running_player();
        player.position = Vec3::new(14.0, 0.0, 0.0);
        let mut signals = Vec::new();
        player.update(DT, false, GameState::Playing, &camera(), &mut signals);

        assert!(player.is_stopped());
        assert!(player.is_dead());
        assert!(signals.contains(&PlayerSignal::Died(DeathCause::EdgeOverrun)));
        assert!(signals.contains(&PlayerSignal::CrashSound));
    }

    #[test]
    fn test_wall_and_overrun_in_one_tick_die_once() {
        let mut player = running_player();
        let mut pools = pools();
        player.position = Vec3::new(-14.0, 0.0, 0.0);
        player.steer_speed = 1.0;

        let mut signals = Vec::new();
        player.update(DT, true, GameState::Playing, &camera(), &mut signals);
        player.on_trigger(
            Trigger::Wall(WallId { side: Side::Left, index: 0 }),
            GameState::Playing,
            &mut pools,
            &mut signals,
        );

        assert_eq!(deaths(&signals), 1);
        assert_eq!(signals.iter().filter(|s| **s == PlayerSignal::Died(DeathCause::EdgeOverrun)).count(), 1);
    }

    #[test]
    fn test_collision_disables_triggers() {
        let mut player = running_player();
        let mut pools = pools();
        let mut signals = Vec::new();

        player.on_trigger(
            Trigger::Wall(WallId { side: Side::Right, index: 1 }),
            GameState::Playing,
            &mut pools,
            &mut signals,
        );
        assert!(!player.triggers_enabled());
        assert!(player.is_stopped());
        assert_eq!(deaths(&signals), 1);

        let impulse = signals.iter().find_map(|s| match s {
            PlayerSignal::CollisionImpulse(v) => Some(*v),
            _ => None,
        });
        assert!((impulse.unwrap().length() - 200.0).abs() < 1e-3);

        // A second hit is ignored entirely
        signals.clear();
        player.on_trigger(
            Trigger::Wall(WallId { side: Side::Right, index: 1 }),
            GameState::Playing,
            &mut pools,
            &mut signals,
        );
        assert!(signals.is_empty());
    }

    #[test]
    fn test_pickup_collected_once() {
        let mut player = running_player();
        let mut pools = pools();
        let mut rng = DeterministicRng::new(4);
        let handle = pools.acquire(DecorationKind::Pickup, &mut rng).unwrap();
        pools.place(
            handle,
            crate::game::pool::Owner::Wall(WallId { side: Side::Left, index: 0 }),
            Vec3::ZERO,
            0.0,
        );

        let mut signals = Vec::new();
        player.on_trigger(Trigger::Pickup(handle), GameState::Playing, &mut pools, &mut signals);
        player.on_trigger(Trigger::Pickup(handle), GameState::Playing, &mut pools, &mut signals);

        assert_eq!(signals, vec![PlayerSignal::Collected(handle)]);
        let pickup = pools.get(handle).unwrap();
        assert!(pickup.bounce_stopped);
        assert!(!pickup.collider_enabled);
    }

    #[test]
    fn test_triggers_ignored_after_game_over() {
        let mut player = running_player();
        let mut pools = pools();
        let mut signals = Vec::new();
        player.on_trigger(
            Trigger::Wall(WallId { side: Side::Left, index: 0 }),
            GameState::GameOver,
            &mut pools,
            &mut signals,
        );
        assert!(signals.is_empty());
        assert!(!player.is_dead());
    }
}
