//! Decoration Pools
//!
//! Fixed-capacity arenas of trees, rocks, pickups and birds. Entries are
//! created once when the track is built and recycled forever by moving
//! ownership between walls, the idle container and free flight.

use glam::Vec3;
use serde::{Serialize, Deserialize};

use crate::core::hash::StateHasher;
use crate::core::rng::DeterministicRng;
use crate::game::track::WallId;

/// Kind of pooled decoration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum DecorationKind {
    /// Dense wall filling
    Tree = 0,
    /// Lethal obstacle
    Rock = 1,
    /// Collectible gift
    Pickup = 2,
    /// Ambient bird flying across the screen
    Bird = 3,
}

impl DecorationKind {
    /// Every kind, in pool order.
    pub const ALL: [DecorationKind; 4] = [
        DecorationKind::Tree,
        DecorationKind::Rock,
        DecorationKind::Pickup,
        DecorationKind::Bird,
    ];

    /// Whether entries of this kind take part in trigger checks.
    pub fn has_collider(self) -> bool {
        matches!(self, DecorationKind::Rock | DecorationKind::Pickup)
    }
}

/// Handle to one pool entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DecorationHandle {
    /// Pool the entry lives in
    pub kind: DecorationKind,
    /// Slot index within that pool
    pub index: u32,
}

/// Current owner of a decoration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Owner {
    /// Parked in the kind's idle container
    #[default]
    Idle,
    /// Attached to a wall segment
    Wall(WallId),
    /// Detached from the track (birds in flight)
    InFlight,
}

/// Autonomous flight of a bird.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Flight {
    /// Unnormalized heading
    pub direction: Vec3,
    /// Units per second along `direction`
    pub speed: f32,
}

/// One pooled entity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Decoration {
    /// Kind of entity
    pub kind: DecorationKind,
    /// Asset variant picked at build time
    pub variant: u16,
    /// Visible and (if it has one) collidable
    pub active: bool,
    /// Who owns it right now
    pub owner: Owner,
    /// World position
    pub position: Vec3,
    /// Rotation around the vertical axis
    pub yaw_degrees: f32,
    /// Trigger checks consider this entity
    pub collider_enabled: bool,
    /// Pickup idle bounce stopped (set on collection)
    pub bounce_stopped: bool,
    /// Bird flight, while in the air
    pub flight: Option<Flight>,
}

impl Decoration {
    fn new(kind: DecorationKind, variant: u16) -> Self {
        Self {
            kind,
            variant,
            active: false,
            owner: Owner::Idle,
            position: Vec3::ZERO,
            yaw_degrees: 0.0,
            collider_enabled: false,
            bounce_stopped: false,
            flight: None,
        }
    }
}

/// Capacity of every pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSizes {
    /// Tree entries
    pub trees: u32,
    /// Rock entries
    pub rocks: u32,
    /// Pickup entries
    pub pickups: u32,
    /// Bird entries
    pub birds: u32,
}

impl PoolSizes {
    /// Sizes for a track with `wall_count` recyclable pairs plus the seed.
    ///
    /// Each wall holds `n` trees plus `n - 1` fill trees per tree, i.e. `n²`.
    pub fn for_track(
        wall_count: u32,
        trees_per_wall: u32,
        pickups_per_segment: u32,
        birds_enabled: bool,
    ) -> Self {
        let pairs = wall_count + 1;
        Self {
            trees: trees_per_wall * trees_per_wall * pairs * 2,
            rocks: pairs * 2,
            pickups: pickups_per_segment * pairs,
            birds: if birds_enabled { pairs } else { 0 },
        }
    }

    /// Capacity of one kind.
    pub fn of(&self, kind: DecorationKind) -> u32 {
        match kind {
            DecorationKind::Tree => self.trees,
            DecorationKind::Rock => self.rocks,
            DecorationKind::Pickup => self.pickups,
            DecorationKind::Bird => self.birds,
        }
    }
}

/// Asset variant counts per kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VariantCounts {
    /// Tree variants
    pub trees: usize,
    /// Rock variants
    pub rocks: usize,
    /// Bird variants
    pub birds: usize,
}

impl VariantCounts {
    fn of(&self, kind: DecorationKind) -> usize {
        match kind {
            DecorationKind::Tree => self.trees,
            DecorationKind::Rock => self.rocks,
            DecorationKind::Pickup => 1,
            DecorationKind::Bird => self.birds,
        }
    }
}

/// All decoration pools of a track.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PoolSet {
    pools: [Vec<Decoration>; 4],
}

impl PoolSet {
    /// Create every entry up front, inactive and idle.
    pub fn new(sizes: PoolSizes, variants: VariantCounts, rng: &mut DeterministicRng) -> Self {
        let pools = DecorationKind::ALL.map(|kind| {
            let variant_count = variants.of(kind);
            (0..sizes.of(kind))
                .map(|_| {
                    let variant = if variant_count > 1 {
                        rng.next_index(variant_count) as u16
                    } else {
                        0
                    };
                    Decoration::new(kind, variant)
                })
                .collect()
        });

        Self { pools }
    }

    /// Entries of one kind.
    pub fn pool(&self, kind: DecorationKind) -> &[Decoration] {
        &self.pools[kind as usize]
    }

    /// Capacity of one kind.
    pub fn capacity(&self, kind: DecorationKind) -> usize {
        self.pools[kind as usize].len()
    }

    /// Active entries of one kind.
    pub fn active_count(&self, kind: DecorationKind) -> usize {
        self.pool(kind).iter().filter(|d| d.active).count()
    }

    /// Entry behind a handle.
    pub fn get(&self, handle: DecorationHandle) -> Option<&Decoration> {
        self.pools[handle.kind as usize].get(handle.index as usize)
    }

    /// Mutable entry behind a handle.
    pub fn get_mut(&mut self, handle: DecorationHandle) -> Option<&mut Decoration> {
        self.pools[handle.kind as usize].get_mut(handle.index as usize)
    }

    /// Draw a uniformly random entry of `kind`, regardless of whether it is
    /// currently in use. `None` only when the pool is empty.
    ///
    /// Pickups come back bouncing. The collider follows [`PoolSet::place`].
    pub fn acquire(&mut self, kind: DecorationKind, rng: &mut DeterministicRng) -> Option<DecorationHandle> {
        let pool = &mut self.pools[kind as usize];
        if pool.is_empty() {
            return None;
        }

        let index = rng.next_index(pool.len());
        if kind == DecorationKind::Pickup {
            pool[index].bounce_stopped = false;
        }

        Some(DecorationHandle { kind, index: index as u32 })
    }

    /// Activate an acquired entry under a new owner.
    pub fn place(&mut self, handle: DecorationHandle, owner: Owner, position: Vec3, yaw_degrees: f32) {
        if let Some(entry) = self.get_mut(handle) {
            entry.owner = owner;
            entry.position = position;
            entry.yaw_degrees = yaw_degrees;
            entry.active = true;
            entry.collider_enabled = handle.kind.has_collider();
            entry.flight = None;
        }
    }

    /// Deactivate an entry and park it in the idle container.
    pub fn release(&mut self, handle: DecorationHandle) {
        if let Some(entry) = self.get_mut(handle) {
            entry.active = false;
            entry.collider_enabled = false;
            entry.owner = Owner::Idle;
            entry.flight = None;
        }
    }

    /// Release every tree, rock and pickup owned by `owner`.
    /// Returns how many entries were released.
    pub fn release_owned_by(&mut self, owner: Owner) -> usize {
        let mut released = 0;
        for pool in self.pools.iter_mut() {
            for entry in pool.iter_mut().filter(|d| d.owner == owner) {
                entry.active = false;
                entry.collider_enabled = false;
                entry.owner = Owner::Idle;
                entry.flight = None;
                released += 1;
            }
        }
        released
    }

    /// Handles of every entry owned by `owner`, in pool order.
    pub fn owned_by(&self, owner: Owner) -> Vec<DecorationHandle> {
        let mut handles = Vec::new();
        for kind in DecorationKind::ALL {
            for (index, entry) in self.pool(kind).iter().enumerate() {
                if entry.owner == owner {
                    handles.push(DecorationHandle { kind, index: index as u32 });
                }
            }
        }
        handles
    }

    /// Hash every entry.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        for pool in &self.pools {
            hasher.update_u32(pool.len() as u32);
            for entry in pool {
                hasher.update_u8(entry.variant as u8);
                hasher.update_bool(entry.active);
                hasher.update_vec3(entry.position);
                hasher.update_f32(entry.yaw_degrees);
                hasher.update_bool(entry.collider_enabled);
                hasher.update_bool(entry.bounce_stopped);
                match entry.owner {
                    Owner::Idle => hasher.update_u8(0),
                    Owner::Wall(wall) => {
                        hasher.update_u8(1);
                        hasher.update_u8(wall.side as u8);
                        hasher.update_u32(wall.index);
                    }
                    Owner::InFlight => hasher.update_u8(2),
                }
            }
        }
    }
}
