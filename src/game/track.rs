//! Track Segment Manager
//!
//! Builds the endless track out of a fixed number of wall pairs and land
//! tiles, decorates each wall with trees, rocks and pickups, and recycles
//! the segment that scrolled out of view to the far end of the track.
//!
//! # Layout
//!
//! ```text
//!   -X  <-- LEFT          RIGHT -->  +X
//!
//!   |                              |      z = 0     (seed pair, index 0)
//!   |  trees    o  .  x      trees |
//!   |                              |      z = -22   (pair 1)
//!   |                              |      z = -44   (pair 2)
//!   v BACK (-Z): direction of travel
//! ```
//!
//! Cursors name the pair that has been off-screen longest; a recycled pair
//! jumps to `next_left` / `next_right` and the cursors advance modulo the
//! pool size.

use glam::Vec3;
use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::config::TrackConfig;
use crate::core::gate::FrequencyGate;
use crate::core::hash::StateHasher;
use crate::core::rng::DeterministicRng;
use crate::game::environment::EnvironmentProfile;
use crate::game::pool::{
    DecorationHandle, DecorationKind, Flight, Owner, PoolSet, PoolSizes, VariantCounts,
};
use crate::game::services::Viewport;

/// World forward (+Z).
pub const FORWARD: Vec3 = Vec3::Z;
/// World back (-Z), the direction of travel.
pub const BACK: Vec3 = Vec3::NEG_Z;
/// World right (+X).
pub const RIGHT: Vec3 = Vec3::X;
/// World left (-X).
pub const LEFT: Vec3 = Vec3::NEG_X;

/// Yaw of every tree.
pub const TREE_YAW_DEGREES: f32 = 45.0;

/// Slot offset that receives a second, independent item roll.
const EXTRA_SLOT_OFFSET: f32 = 2.0;

/// Bird spawn points in viewport space.
const BIRD_SPAWN_RIGHT: Vec3 = Vec3::new(1.2, -0.2, 0.0);
const BIRD_SPAWN_LEFT: Vec3 = Vec3::new(-0.2, -0.2, 0.0);

/// Viewport y at which a bird has crossed the screen.
const BIRD_EXIT_Y: f32 = 1.0;

/// Side of the track.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Side {
    /// -X side
    Left = 0,
    /// +X side
    Right = 1,
}

impl Side {
    /// Unit vector pointing away from the track center.
    pub fn outward(self) -> Vec3 {
        match self {
            Side::Left => LEFT,
            Side::Right => RIGHT,
        }
    }

    /// Unit vector pointing toward the track center.
    pub fn inward(self) -> Vec3 {
        -self.outward()
    }

    /// Convert a left-wall offset to this side.
    pub fn mirror(self, offset: Vec3) -> Vec3 {
        match self {
            Side::Left => offset,
            Side::Right => Vec3::new(-offset.x, offset.y, offset.z),
        }
    }
}

/// Identity of a wall segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WallId {
    /// Left or right wall list
    pub side: Side,
    /// Slot index in that list
    pub index: u32,
}

/// A wall or land tile.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// World position
    pub position: Vec3,
    /// Placed on the track
    pub active: bool,
}

impl Segment {
    fn inactive() -> Self {
        Self { position: Vec3::ZERO, active: false }
    }

    fn seed(position: Vec3) -> Self {
        Self { position, active: true }
    }
}

/// Start-area landmark.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// Asset name
    pub asset: String,
    /// World position
    pub position: Vec3,
    /// Still shown
    pub active: bool,
}

/// Items placed for one wall pair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ItemsPlaced {
    /// Pickups placed
    pub gifts: u32,
    /// Rocks placed
    pub obstacles: u32,
}

impl ItemsPlaced {
    /// Total entities placed.
    pub fn total(&self) -> u32 {
        self.gifts + self.obstacles
    }
}

/// A bird that just took off.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BirdLaunch {
    /// Pool entry of the bird
    pub handle: DecorationHandle,
    /// A chirp should be scheduled
    pub chirp: bool,
}

/// What a recycle poll did.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RecycleReport {
    /// Wall slot index that moved (both sides)
    pub walls: Option<u32>,
    /// Lateral deviation of the moved pair
    pub deviation: f32,
    /// Items placed on the moved pair
    pub items: ItemsPlaced,
    /// Bird launched by the recycle
    pub bird: Option<BirdLaunch>,
    /// Land slot index that moved
    pub land: Option<u32>,
}

/// Progress of a bird flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BirdStep {
    /// Still crossing the screen
    Flying,
    /// Left the screen and went back to the pool
    Landed,
}

/// The whole generated world.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Track {
    config: TrackConfig,
    trees_per_wall: u32,
    tree_spacing: f32,
    birds_enabled: bool,

    left_walls: Vec<Segment>,
    right_walls: Vec<Segment>,
    lands: Vec<Segment>,

    left_cursor: usize,
    right_cursor: usize,
    land_cursor: usize,

    next_left: Vec3,
    next_right: Vec3,
    next_land: Vec3,

    pools: PoolSet,
    landmark: Option<Landmark>,
}

impl Track {
    /// Build the track for one run.
    ///
    /// Order: pools, wall and land lists, land placement, trees and items
    /// on the seed pair, then placement and items for every other pair.
    pub fn build(config: &TrackConfig, env: &EnvironmentProfile, rng: &mut DeterministicRng) -> Self {
        let wall_count = config.wall_count as usize;
        let land_count = wall_count.div_ceil(2) + 1;
        let trees_per_wall = env.trees_per_wall.max(1);
        let birds_enabled = env.birds_enabled();

        let sizes = PoolSizes::for_track(
            config.wall_count,
            trees_per_wall,
            config.pickups_per_segment,
            birds_enabled,
        );
        let variants = VariantCounts {
            trees: env.tree_variants.len(),
            rocks: env.obstacle_variants.len(),
            birds: env.bird_variants.len(),
        };
        let pools = PoolSet::new(sizes, variants, rng);

        let mut left_walls = vec![Segment::seed(config.first_left_wall)];
        let mut right_walls = vec![Segment::seed(config.first_right_wall)];
        let mut lands = vec![Segment::seed(config.first_land)];
        left_walls.extend((0..wall_count).map(|_| Segment::inactive()));
        right_walls.extend((0..wall_count).map(|_| Segment::inactive()));
        lands.extend((1..land_count).map(|_| Segment::inactive()));

        let mut track = Self {
            config: config.clone(),
            trees_per_wall,
            tree_spacing: 7.0 * 1.6 / trees_per_wall as f32,
            birds_enabled,
            left_walls,
            right_walls,
            lands,
            left_cursor: 0,
            right_cursor: 0,
            land_cursor: 0,
            next_left: config.first_left_wall + BACK * config.wall_stride,
            next_right: config.first_right_wall + BACK * config.wall_stride,
            next_land: config.first_land + BACK * config.land_stride,
            pools,
            landmark: env.landmark.as_ref().map(|profile| Landmark {
                asset: profile.asset.clone(),
                position: profile.position,
                active: true,
            }),
        };

        for index in 1..land_count {
            track.move_land(index);
        }

        track.create_tree(WallId { side: Side::Left, index: 0 }, rng);
        track.create_tree(WallId { side: Side::Right, index: 0 }, rng);
        track.create_item(0, 0, rng);

        for index in 1..=wall_count {
            let deviation = track.draw_deviation(rng);
            track.move_wall(Side::Left, index, deviation, rng);
            track.move_wall(Side::Right, index, -deviation, rng);
            track.create_item(index, index, rng);
        }

        debug!(
            "track built: {} wall pairs, {} lands, {} trees/wall, birds {}",
            wall_count + 1,
            land_count,
            trees_per_wall,
            birds_enabled
        );

        track
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Left wall list (index 0 is the seed).
    pub fn left_walls(&self) -> &[Segment] {
        &self.left_walls
    }

    /// Right wall list (index 0 is the seed).
    pub fn right_walls(&self) -> &[Segment] {
        &self.right_walls
    }

    /// Land tiles.
    pub fn lands(&self) -> &[Segment] {
        &self.lands
    }

    /// Wall list of one side.
    pub fn walls(&self, side: Side) -> &[Segment] {
        match side {
            Side::Left => &self.left_walls,
            Side::Right => &self.right_walls,
        }
    }

    /// Wall segment by id.
    pub fn wall(&self, id: WallId) -> Option<&Segment> {
        self.walls(id.side).get(id.index as usize)
    }

    /// (left, right, land) cursors.
    pub fn cursors(&self) -> (usize, usize, usize) {
        (self.left_cursor, self.right_cursor, self.land_cursor)
    }

    /// Where the next recycled (left, right, land) segment goes.
    pub fn next_positions(&self) -> (Vec3, Vec3, Vec3) {
        (self.next_left, self.next_right, self.next_land)
    }

    /// Decoration pools.
    pub fn pools(&self) -> &PoolSet {
        &self.pools
    }

    /// Mutable decoration pools.
    pub fn pools_mut(&mut self) -> &mut PoolSet {
        &mut self.pools
    }

    /// Start-area landmark, if the environment has one.
    pub fn landmark(&self) -> Option<&Landmark> {
        self.landmark.as_ref()
    }

    /// Distance between consecutive trees.
    pub fn tree_spacing(&self) -> f32 {
        self.tree_spacing
    }

    /// Configuration the track was built with.
    pub fn config(&self) -> &TrackConfig {
        &self.config
    }

    // ========================================================================
    // Placement
    // ========================================================================

    /// Lateral deviation of the next pair.
    fn draw_deviation(&self, rng: &mut DeterministicRng) -> f32 {
        let gate = FrequencyGate::new(self.config.difficulty.path_difficulty);
        if gate.trial(rng) {
            rng.range_f32(self.config.min_wall_distance, self.config.max_wall_distance)
        } else {
            0.0
        }
    }

    /// Put a wall at the far end of its side, shifted by `distance` on X,
    /// and decorate it with trees.
    fn move_wall(&mut self, side: Side, index: usize, distance: f32, rng: &mut DeterministicRng) {
        let stride = BACK * self.config.wall_stride;
        let (walls, next) = match side {
            Side::Left => (&mut self.left_walls, &mut self.next_left),
            Side::Right => (&mut self.right_walls, &mut self.next_right),
        };

        let segment = &mut walls[index];
        segment.position = *next;
        *next += stride;
        segment.position.x += distance;
        segment.active = true;

        self.create_tree(WallId { side, index: index as u32 }, rng);
    }

    fn move_land(&mut self, index: usize) {
        let segment = &mut self.lands[index];
        segment.position = self.next_land;
        segment.active = true;
        self.next_land += BACK * self.config.land_stride;
    }

    /// Tree positions of a wall: `n` primary trees along FORWARD+outward,
    /// each followed by `n - 1` fill trees along BACK+outward.
    pub fn tree_grid(&self, id: WallId) -> Vec<Vec3> {
        let Some(wall) = self.wall(id) else {
            return Vec::new();
        };

        let n = self.trees_per_wall as usize;
        let spacing = self.tree_spacing;
        let primary = FORWARD + id.side.outward();
        let fill = BACK + id.side.outward();

        let mut grid = Vec::with_capacity(n * n);
        let mut position = wall.position + id.side.mirror(self.config.layout.tree_anchor);
        for _ in 0..n {
            grid.push(position);
            let mut filled = position;
            for _ in 1..n {
                filled += fill * spacing;
                grid.push(filled);
            }
            position += primary * spacing;
        }
        grid
    }

    fn create_tree(&mut self, id: WallId, rng: &mut DeterministicRng) {
        for position in self.tree_grid(id) {
            if let Some(handle) = self.pools.acquire(DecorationKind::Tree, rng) {
                self.pools.place(handle, Owner::Wall(id), position, TREE_YAW_DEGREES);
            }
        }
    }

    /// Populate the item slots of a wall pair.
    pub fn create_item(&mut self, left: usize, right: usize, rng: &mut DeterministicRng) -> ItemsPlaced {
        let left_pos = self.left_walls[left].position;
        let right_pos = self.right_walls[right].position;
        let min_distance = self.config.min_item_distance;
        let max_distance = (left_pos.x.abs() + right_pos.x.abs()) / self.config.item_distance_divisor;

        let mut placed = ItemsPlaced::default();
        for (side, index, wall_pos) in [(Side::Left, left, left_pos), (Side::Right, right, right_pos)] {
            let owner = Owner::Wall(WallId { side, index: index as u32 });
            let barrier = wall_pos + side.mirror(self.config.layout.barrier_anchor);
            let slot_dir = FORWARD + side.inward();
            let jitter_dir = side.inward() + BACK;
            let extra_dir = BACK + side.outward();

            let mut offset = 0.0;
            while offset < self.config.layout.barrier_length / 2.0 {
                self.roll_slot(owner, barrier + slot_dir * offset, jitter_dir, min_distance, max_distance, rng, &mut placed);
                if offset == EXTRA_SLOT_OFFSET {
                    self.roll_slot(owner, barrier + extra_dir * offset, jitter_dir, min_distance, max_distance, rng, &mut placed);
                }
                offset += self.config.item_slot_step;
            }
        }
        placed
    }

    /// One item trichotomy: gift lane or obstacle lane, then that lane's gate.
    #[allow(clippy::too_many_arguments)]
    fn roll_slot(
        &mut self,
        owner: Owner,
        base: Vec3,
        jitter_dir: Vec3,
        min_distance: f32,
        max_distance: f32,
        rng: &mut DeterministicRng,
        placed: &mut ItemsPlaced,
    ) {
        let difficulty = self.config.difficulty;
        let kind = if FrequencyGate::EVEN.trial(rng) {
            if !FrequencyGate::new(difficulty.gift_frequency).trial(rng) {
                return;
            }
            DecorationKind::Pickup
        } else {
            if !FrequencyGate::new(difficulty.obstacle_frequency).trial(rng) {
                return;
            }
            DecorationKind::Rock
        };

        let Some(handle) = self.pools.acquire(kind, rng) else {
            return;
        };
        let position = base + jitter_dir * rng.range_f32(min_distance, max_distance);
        self.pools.place(handle, owner, position, 0.0);

        match kind {
            DecorationKind::Pickup => placed.gifts += 1,
            _ => placed.obstacles += 1,
        }
    }

    /// Return every decoration of a wall to its pool.
    fn refresh_wall(&mut self, id: WallId) -> usize {
        self.pools.release_owned_by(Owner::Wall(id))
    }

    // ========================================================================
    // Recycling
    // ========================================================================

    /// Move the head pair and the head land tile to the far end once they
    /// have scrolled past the top of the viewport.
    pub fn recycle(&mut self, viewport: &dyn Viewport, rng: &mut DeterministicRng) -> RecycleReport {
        let mut report = RecycleReport::default();
        let threshold = self.config.recycle_threshold;

        let head_right = self.right_walls[self.right_cursor].position;
        if viewport.world_to_viewport(head_right).y > threshold {
            let li = self.left_cursor;
            let ri = self.right_cursor;

            let deviation = self.draw_deviation(rng);
            let released = self.refresh_wall(WallId { side: Side::Left, index: li as u32 })
                + self.refresh_wall(WallId { side: Side::Right, index: ri as u32 });
            self.move_wall(Side::Left, li, deviation, rng);
            self.move_wall(Side::Right, ri, -deviation, rng);
            report.items = self.create_item(li, ri, rng);
            report.deviation = deviation;
            report.walls = Some(li as u32);

            if self.birds_enabled
                && FrequencyGate::new(self.config.difficulty.bird_frequency).trial(rng)
            {
                report.bird = self.launch_bird(viewport, rng);
            }

            self.left_cursor = (li + 1) % self.left_walls.len();
            self.right_cursor = (ri + 1) % self.right_walls.len();

            debug!(
                "recycled wall pair {}: deviation {:.2}, released {}, placed {}",
                li,
                deviation,
                released,
                report.items.total()
            );
        }

        let head_land = self.lands[self.land_cursor].position;
        if viewport.world_to_viewport(head_land).y > threshold {
            let index = self.land_cursor;
            self.move_land(index);
            self.land_cursor = (index + 1) % self.lands.len();
            report.land = Some(index as u32);
            debug!("recycled land {}", index);
        }

        report
    }

    /// Hide the landmark once it has scrolled out of view.
    /// Returns `true` while the landmark still needs watching.
    pub fn check_landmark(&mut self, viewport: &dyn Viewport) -> bool {
        let threshold = self.config.landmark_threshold;
        let Some(landmark) = self.landmark.as_mut().filter(|l| l.active) else {
            return false;
        };

        if viewport.world_to_viewport(landmark.position).y > threshold {
            landmark.active = false;
            debug!("landmark {} hidden", landmark.asset);
            return false;
        }
        true
    }

    // ========================================================================
    // Birds
    // ========================================================================

    /// Take a bird from the pool and send it across the screen.
    pub fn launch_bird(&mut self, viewport: &dyn Viewport, rng: &mut DeterministicRng) -> Option<BirdLaunch> {
        let handle = self.pools.acquire(DecorationKind::Bird, rng)?;

        let (spawn, yaw, direction) = if FrequencyGate::EVEN.trial(rng) {
            (BIRD_SPAWN_RIGHT, 225.0, FORWARD + LEFT)
        } else {
            (BIRD_SPAWN_LEFT, 315.0, FORWARD + RIGHT)
        };
        let position = viewport.viewport_to_world(spawn);
        let speed = rng.range_f32(self.config.min_bird_speed, self.config.max_bird_speed);

        self.pools.place(handle, Owner::InFlight, position, yaw);
        if let Some(bird) = self.pools.get_mut(handle) {
            bird.flight = Some(Flight { direction, speed });
        }

        let chirp = rng.next_int(2) == 1;
        debug!("bird {} launched at speed {:.2}", handle.index, speed);
        Some(BirdLaunch { handle, chirp })
    }

    /// Advance one bird by `dt`. A bird that is no longer flying lands
    /// immediately.
    pub fn step_bird(&mut self, handle: DecorationHandle, dt: f32, viewport: &dyn Viewport) -> BirdStep {
        let Some(bird) = self.pools.get_mut(handle) else {
            return BirdStep::Landed;
        };
        let Some(flight) = bird.flight.filter(|_| bird.active) else {
            return BirdStep::Landed;
        };

        if viewport.world_to_viewport(bird.position).y < BIRD_EXIT_Y {
            bird.position += flight.direction * flight.speed * dt;
            BirdStep::Flying
        } else {
            self.pools.release(handle);
            BirdStep::Landed
        }
    }

    // ========================================================================
    // Hashing
    // ========================================================================

    /// Digest every segment, cursor and decoration.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        for list in [&self.left_walls, &self.right_walls, &self.lands] {
            hasher.update_u32(list.len() as u32);
            for segment in list {
                hasher.update_vec3(segment.position);
                hasher.update_bool(segment.active);
            }
        }

        hasher.update_u32(self.left_cursor as u32);
        hasher.update_u32(self.right_cursor as u32);
        hasher.update_u32(self.land_cursor as u32);
        hasher.update_vec3(self.next_left);
        hasher.update_vec3(self.next_right);
        hasher.update_vec3(self.next_land);

        if let Some(landmark) = &self.landmark {
            hasher.update_bool(landmark.active);
        }

        self.pools.hash_into(hasher);
    }
}

// =============================================================================
// TESTS
// =============================================================================
