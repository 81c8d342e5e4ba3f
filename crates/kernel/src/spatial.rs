//! Static arena geometry: ground, boundary walls and trees.

use glam::{Vec2, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::ArenaConfig;

/// Radius within which a tree deflects a projectile.
pub const TREE_DEFLECT_RADIUS: f32 = 0.8;
/// Clearance the player must keep from a tree trunk.
pub const TREE_PLAYER_CLEARANCE: f32 = 1.0;
/// Distance a deflected projectile is pushed out of a trunk.
const TREE_PUSH_OUT: f32 = 0.1;
/// Planar velocity kept after a tree deflection.
const TREE_DAMPING: f32 = 0.7;
/// Planar velocity factor after a wall hit (reverses direction).
const WALL_REBOUND: f32 = -0.6;

/// A static collider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Obstacle {
    /// A vertical trunk of infinite height at `(x, z)`.
    Point { x: f32, z: f32 },
    /// An axis-aligned box given by its center and full extents.
    Box { center: Vec3, size: Vec3 },
}

impl Obstacle {
    fn planar_distance(x: f32, z: f32, px: f32, pz: f32) -> f32 {
        (x - px).hypot(z - pz)
    }
}

/// Registry of the arena's static obstacles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpatialWorld {
    obstacles: Vec<Obstacle>,
    bound: f32,
}

impl SpatialWorld {
    /// An empty arena with the given player bound.
    pub fn new(bound: f32) -> Self {
        Self {
            obstacles: Vec::new(),
            bound,
        }
    }

    /// Build the four boundary walls and scatter trees with `rng`.
    pub fn arena(config: &ArenaConfig, rng: &mut impl Rng) -> Self {
        let mut world = Self::new(config.player_bound);
        let d = config.wall_distance;
        let h = config.wall_height;
        let along_x = Vec3::new(config.wall_length, h, config.wall_thickness);
        let along_z = Vec3::new(config.wall_thickness, h, config.wall_length);
        for (center, size) in [
            (Vec3::new(0.0, h / 2.0, -d), along_x),
            (Vec3::new(0.0, h / 2.0, d), along_x),
            (Vec3::new(d, h / 2.0, 0.0), along_z),
            (Vec3::new(-d, h / 2.0, 0.0), along_z),
        ] {
            world.add(Obstacle::Box { center, size });
        }
        let extent = config.tree_extent;
        for _ in 0..config.tree_count {
            let x = rng.random_range(-extent..=extent);
            let z = rng.random_range(-extent..=extent);
            world.add(Obstacle::Point { x, z });
        }
        tracing::debug!(
            walls = 4,
            trees = config.tree_count,
            "arena built"
        );
        world
    }

    pub fn add(&mut self, obstacle: Obstacle) {
        self.obstacles.push(obstacle);
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn bound(&self) -> f32 {
        self.bound
    }

    /// Tree positions as `(x, z)`, in insertion order.
    pub fn trees(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.obstacles.iter().filter_map(|o| match *o {
            Obstacle::Point { x, z } => Some(Vec2::new(x, z)),
            Obstacle::Box { .. } => None,
        })
    }

    /// Wall boxes as `(center, size)`, in insertion order.
    pub fn walls(&self) -> impl Iterator<Item = (Vec3, Vec3)> + '_ {
        self.obstacles.iter().filter_map(|o| match *o {
            Obstacle::Box { center, size } => Some((center, size)),
            Obstacle::Point { .. } => None,
        })
    }

    /// Whether `(x, z)` lies within `clear_radius` of any tree.
    pub fn point_blocked(&self, x: f32, z: f32, clear_radius: f32) -> bool {
        self.trees()
            .any(|t| Obstacle::planar_distance(x, z, t.x, t.y) < clear_radius)
    }

    /// Clamp a planar position to the player bound.
    pub fn clamp_to_bounds(&self, x: f32, z: f32) -> (f32, f32) {
        (
            x.clamp(-self.bound, self.bound),
            z.clamp(-self.bound, self.bound),
        )
    }

    /// Deflect a moving sphere off every obstacle it overlaps.
    ///
    /// Trees reflect the planar velocity about the contact normal, push the
    /// sphere out and damp it. Walls reverse and damp the planar velocity,
    /// then move the sphere once along the new velocity. Vertical velocity is
    /// left alone. A sphere exactly on a trunk axis has no normal and is not
    /// deflected.
    pub fn resolve_obstacle_collision(
        &self,
        mut position: Vec3,
        mut velocity: Vec3,
        radius: f32,
    ) -> (Vec3, Vec3) {
        for tree in self.trees() {
            let dx = position.x - tree.x;
            let dz = position.z - tree.y;
            let dist = dx.hypot(dz);
            if dist >= TREE_DEFLECT_RADIUS || dist <= f32::EPSILON {
                continue;
            }
            let (nx, nz) = (dx / dist, dz / dist);
            let dot = velocity.x * nx + velocity.z * nz;
            velocity.x -= 2.0 * dot * nx;
            velocity.z -= 2.0 * dot * nz;
            position.x += nx * TREE_PUSH_OUT;
            position.z += nz * TREE_PUSH_OUT;
            velocity.x *= TREE_DAMPING;
            velocity.z *= TREE_DAMPING;
        }
        for (center, size) in self.walls() {
            let dx = position.x - center.x;
            let dz = position.z - center.z;
            if dx.abs() < size.x / 2.0 + radius && dz.abs() < size.z / 2.0 + radius {
                velocity.x *= WALL_REBOUND;
                velocity.z *= WALL_REBOUND;
                position += velocity;
            }
        }
        (position, velocity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn arena() -> SpatialWorld {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        SpatialWorld::arena(&ArenaConfig::default(), &mut rng)
    }

    fn one_tree(x: f32, z: f32) -> SpatialWorld {
        let mut world = SpatialWorld::new(48.5);
        world.add(Obstacle::Point { x, z });
        world
    }

    #[test]
    fn arena_has_walls_and_trees_in_range() {
        let world = arena();
        assert_eq!(world.walls().count(), 4);
        assert_eq!(world.trees().count(), 30);
        for t in world.trees() {
            assert!(t.x.abs() <= 40.0 && t.y.abs() <= 40.0);
        }
        let (c, s) = world.walls().next().unwrap();
        assert_eq!(c, Vec3::new(0.0, 3.0, -50.5));
        assert_eq!(s, Vec3::new(100.0, 6.0, 1.0));
    }

    #[test]
    fn same_seed_same_trees() {
        let a: Vec<Vec2> = arena().trees().collect();
        let b: Vec<Vec2> = arena().trees().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn clamp_holds_player_inside() {
        let world = arena();
        assert_eq!(world.clamp_to_bounds(60.0, -70.0), (48.5, -48.5));
        assert_eq!(world.clamp_to_bounds(1.0, 2.0), (1.0, 2.0));
    }

    #[test]
    fn point_blocked_near_tree() {
        let world = one_tree(5.0, 5.0);
        assert!(world.point_blocked(5.5, 5.0, TREE_PLAYER_CLEARANCE));
        assert!(!world.point_blocked(6.5, 5.0, TREE_PLAYER_CLEARANCE));
    }

    #[test]
    fn tree_reflects_and_damps() {
        let world = one_tree(0.0, 0.0);
        let (pos, vel) = world.resolve_obstacle_collision(
            Vec3::new(-0.5, 1.0, 0.0),
            Vec3::new(1.0, -0.1, 0.0),
            0.2,
        );
        assert!((vel.x + 0.7).abs() < 1e-6);
        assert_eq!(vel.y, -0.1);
        assert!((pos.x + 0.6).abs() < 1e-6);
    }

    #[test]
    fn zero_distance_skips_reflection() {
        let world = one_tree(0.0, 0.0);
        let pos = Vec3::new(0.0, 1.0, 0.0);
        let vel = Vec3::new(1.0, 0.0, 0.0);
        assert_eq!(world.resolve_obstacle_collision(pos, vel, 0.2), (pos, vel));
    }

    #[test]
    fn wall_reverses_planar_velocity() {
        let mut world = SpatialWorld::new(48.5);
        world.add(Obstacle::Box {
            center: Vec3::new(0.0, 3.0, 50.5),
            size: Vec3::new(100.0, 6.0, 1.0),
        });
        let (pos, vel) = world.resolve_obstacle_collision(
            Vec3::new(0.0, 2.0, 50.2),
            Vec3::new(0.0, 0.0, 1.0),
            0.2,
        );
        assert!((vel.z + 0.6).abs() < 1e-6);
        assert!((pos.z - 49.6).abs() < 1e-5);
    }
}
