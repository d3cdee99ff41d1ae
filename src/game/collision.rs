//! Collision Detection
//!
//! Trigger overlap tests between the player and the track. Walls are boxes,
//! rocks and pickups are circles in the XZ plane, the player is a sphere.
//! Candidates are visited in a fixed order (left walls, right walls, rocks,
//! pickups) so the resulting hit list is deterministic.

use glam::{Vec2, Vec3};

use crate::game::pool::{DecorationHandle, DecorationKind};
use crate::game::track::{Side, Track, WallId};

/// What a collider belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColliderKind {
    /// Track wall
    Wall,
    /// Rock
    Obstacle,
    /// Gift
    Pickup,
}

impl ColliderKind {
    /// Walls and rocks end the run.
    pub fn is_lethal(self) -> bool {
        matches!(self, ColliderKind::Wall | ColliderKind::Obstacle)
    }
}

/// A trigger the player overlaps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    /// Overlapping a wall
    Wall(WallId),
    /// Overlapping a rock
    Obstacle(DecorationHandle),
    /// Overlapping a pickup
    Pickup(DecorationHandle),
}

impl Trigger {
    /// Collider kind of the trigger.
    pub fn kind(&self) -> ColliderKind {
        match self {
            Trigger::Wall(_) => ColliderKind::Wall,
            Trigger::Obstacle(_) => ColliderKind::Obstacle,
            Trigger::Pickup(_) => ColliderKind::Pickup,
        }
    }
}

/// Check if a sphere overlaps an axis-aligned box.
#[inline]
pub fn sphere_overlaps_box(center: Vec3, radius: f32, box_center: Vec3, half_extents: Vec3) -> bool {
    let closest = center.clamp(box_center - half_extents, box_center + half_extents);
    closest.distance_squared(center) <= radius * radius
}

/// Check if two circles overlap in the XZ plane.
#[inline]
pub fn circles_overlap_xz(a: Vec3, radius_a: f32, b: Vec3, radius_b: f32) -> bool {
    let combined = radius_a + radius_b;
    Vec2::new(a.x, a.z).distance_squared(Vec2::new(b.x, b.z)) <= combined * combined
}

fn wall_hits(track: &Track, center: Vec3, radius: f32) -> impl Iterator<Item = WallId> + '_ {
    let half_extents = track.config().layout.wall_half_extents;
    [Side::Left, Side::Right].into_iter().flat_map(move |side| {
        track
            .walls(side)
            .iter()
            .enumerate()
            .filter(move |(_, wall)| {
                wall.active && sphere_overlaps_box(center, radius, wall.position, half_extents)
            })
            .map(move |(index, _)| WallId { side, index: index as u32 })
    })
}

fn decoration_hits(
    track: &Track,
    kind: DecorationKind,
    radius_of_kind: f32,
    center: Vec3,
    radius: f32,
) -> impl Iterator<Item = DecorationHandle> + '_ {
    track
        .pools()
        .pool(kind)
        .iter()
        .enumerate()
        .filter(move |(_, d)| {
            d.active
                && d.collider_enabled
                && circles_overlap_xz(center, radius, d.position, radius_of_kind)
        })
        .map(move |(index, _)| DecorationHandle { kind, index: index as u32 })
}

/// Every trigger the player sphere overlaps, in deterministic order.
pub fn scan_triggers(track: &Track, position: Vec3, radius: f32) -> Vec<Trigger> {
    let layout = track.config().layout;

    let mut hits: Vec<Trigger> = wall_hits(track, position, radius).map(Trigger::Wall).collect();
    hits.extend(
        decoration_hits(track, DecorationKind::Rock, layout.rock_radius, position, radius)
            .map(Trigger::Obstacle),
    );
    hits.extend(
        decoration_hits(track, DecorationKind::Pickup, layout.pickup_radius, position, radius)
            .map(Trigger::Pickup),
    );
    hits
}

/// Whether a wall or rock lies `lookahead` units along `velocity`.
///
/// A zero velocity never probes.
pub fn probe_ahead(track: &Track, position: Vec3, velocity: Vec3, radius: f32, lookahead: f32) -> bool {
    let Some(direction) = velocity.try_normalize() else {
        return false;
    };

    let probe = position + direction * lookahead;
    let rock_radius = track.config().layout.rock_radius;

    wall_hits(track, probe, radius).next().is_some()
        || decoration_hits(track, DecorationKind::Rock, rock_radius, probe, radius)
            .next()
            .is_some()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Difficulty, TrackConfig};
    use crate::core::rng::DeterministicRng;
    use crate::game::environment::EnvironmentProfile;
    use crate::game::pool::Owner;

    fn empty_track() -> Track {
        let config = TrackConfig {
            wall_count: 2,
            difficulty: Difficulty {
                path_difficulty: 0.0,
                obstacle_frequency: 0.0,
                gift_frequency: 0.0,
                bird_frequency: 0.0,
            },
            ..TrackConfig::default()
        };
        let env = EnvironmentProfile {
            trees_per_wall: 1,
            ..EnvironmentProfile::default()
        };
        let mut rng = DeterministicRng::new(1);
        Track::build(&config, &env, &mut rng)
    }

    fn place(track: &mut Track, kind: DecorationKind, position: Vec3) -> DecorationHandle {
        let mut rng = DeterministicRng::new(0);
        let handle = track.pools_mut().acquire(kind, &mut rng).unwrap();
        let wall = WallId { side: Side::Left, index: 1 };
        track.pools_mut().place(handle, Owner::Wall(wall), position, 0.0);
        handle
    }

    #[test]
    fn test_sphere_box() {
        let half = Vec3::new(0.5, 1.0, 11.0);
        assert!(sphere_overlaps_box(Vec3::new(-7.2, 0.0, 0.0), 0.5, Vec3::new(-8.0, 0.0, 0.0), half));
        assert!(!sphere_overlaps_box(Vec3::new(-6.9, 0.0, 0.0), 0.5, Vec3::new(-8.0, 0.0, 0.0), half));
        // Inside the box
        assert!(sphere_overlaps_box(Vec3::new(-8.0, 0.0, 3.0), 0.1, Vec3::new(-8.0, 0.0, 0.0), half));
    }

    #[test]
    fn test_circles_ignore_height() {
        assert!(circles_overlap_xz(Vec3::ZERO, 0.5, Vec3::new(0.9, 10.0, 0.0), 0.5));
        assert!(!circles_overlap_xz(Vec3::ZERO, 0.5, Vec3::new(1.1, 0.0, 0.0), 0.5));
    }

    #[test]
    fn test_center_of_track_is_clear() {
        let track = empty_track();
        assert!(scan_triggers(&track, Vec3::ZERO, 0.5).is_empty());
    }

    #[test]
    fn test_wall_hit() {
        let track = empty_track();
        let hits = scan_triggers(&track, Vec3::new(7.8, 0.0, -1.0), 0.5);
        assert_eq!(hits, vec![Trigger::Wall(WallId { side: Side::Right, index: 0 })]);
        assert!(hits[0].kind().is_lethal());
    }

    #[test]
    fn test_scan_order() {
        let mut track = empty_track();
        let pickup = place(&mut track, DecorationKind::Pickup, Vec3::new(-7.0, 0.0, 0.0));
        let rock = place(&mut track, DecorationKind::Rock, Vec3::new(-7.2, 0.0, 0.3));

        let hits = scan_triggers(&track, Vec3::new(-7.3, 0.0, 0.0), 0.5);
        assert_eq!(
            hits,
            vec![
                Trigger::Wall(WallId { side: Side::Left, index: 0 }),
                Trigger::Obstacle(rock),
                Trigger::Pickup(pickup),
            ]
        );
    }

    #[test]
    fn test_disabled_collider_is_ignored() {
        let mut track = empty_track();
        let pickup = place(&mut track, DecorationKind::Pickup, Vec3::new(0.0, 0.0, -2.0));
        assert_eq!(scan_triggers(&track, Vec3::new(0.0, 0.0, -2.0), 0.5), vec![Trigger::Pickup(pickup)]);

        track.pools_mut().get_mut(pickup).unwrap().collider_enabled = false;
        assert!(scan_triggers(&track, Vec3::new(0.0, 0.0, -2.0), 0.5).is_empty());
    }

    #[test]
    fn test_probe_ahead() {
        let mut track = empty_track();
        place(&mut track, DecorationKind::Rock, Vec3::new(0.0, 0.0, -5.0));

        let heading = Vec3::new(0.0, 0.0, -3.0);
        assert!(!probe_ahead(&track, Vec3::new(0.0, 0.0, -1.0), heading, 0.5, 1.5));
        assert!(probe_ahead(&track, Vec3::new(0.0, 0.0, -3.0), heading, 0.5, 1.5));
        assert!(!probe_ahead(&track, Vec3::new(0.0, 0.0, -3.0), Vec3::ZERO, 0.5, 1.5));
    }

    #[test]
    fn test_probe_ignores_pickups() {
        let mut track = empty_track();
        place(&mut track, DecorationKind::Pickup, Vec3::new(0.0, 0.0, -5.0));
        assert!(!probe_ahead(&track, Vec3::new(0.0, 0.0, -3.0), Vec3::NEG_Z, 0.5, 1.5));
    }
}
