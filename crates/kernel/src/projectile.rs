use std::collections::BTreeSet;

use duskfall_common::EntityId;
use duskfall_input::is_strong_shot;
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::spatial::SpatialWorld;

pub const PROJECTILE_RADIUS: f32 = 0.2;
pub const RESTITUTION: f32 = 0.8;
/// Downward acceleration per frame.
pub const PROJECTILE_GRAVITY: f32 = 0.015;
/// Planar velocity kept on each ground contact.
pub const GROUND_FRICTION: f32 = 0.98;
/// Frames a projectile lives without a terminal hit.
pub const PROJECTILE_LIFETIME: i32 = 600;

/// A launched shot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub id: EntityId,
    pub position: Vec3,
    pub velocity: Vec3,
    pub launch_speed: f32,
    pub strong: bool,
    /// Remaining frames; the projectile is removed once this is negative.
    pub life: i32,
    /// Hostiles already struck by this projectile.
    pub hit_set: BTreeSet<EntityId>,
}

impl Projectile {
    /// Launch from `origin` along the unit vector `direction`.
    pub fn launch(id: EntityId, origin: Vec3, direction: Vec3, speed: f32) -> Self {
        Self {
            id,
            position: origin,
            velocity: direction * speed,
            launch_speed: speed,
            strong: is_strong_shot(speed),
            life: PROJECTILE_LIFETIME,
            hit_set: BTreeSet::new(),
        }
    }

    /// Red when strong, otherwise orange shading to yellow with speed.
    pub fn tint(&self) -> Vec3 {
        if self.strong {
            Vec3::new(1.0, 0.0, 0.0)
        } else {
            Vec3::new(1.0, 0.5 + self.launch_speed / 6.0, 0.0)
        }
    }

    pub fn is_expired(&self) -> bool {
        self.life < 0
    }

    /// Gravity, integration, ground bounce and static obstacles.
    pub fn step_physics(&mut self, world: &SpatialWorld) {
        self.velocity.y -= PROJECTILE_GRAVITY;
        self.position += self.velocity;

        if self.position.y < PROJECTILE_RADIUS {
            self.position.y = PROJECTILE_RADIUS;
            self.velocity.y *= -RESTITUTION;
            self.velocity.x *= GROUND_FRICTION;
            self.velocity.z *= GROUND_FRICTION;
        }

        let (position, velocity) =
            world.resolve_obstacle_collision(self.position, self.velocity, PROJECTILE_RADIUS);
        self.position = position;
        self.velocity = velocity;
    }

    /// Count down one frame of life.
    pub fn age(&mut self) {
        self.life -= 1;
    }

    /// Mark as spent by a terminal hit.
    pub fn terminate(&mut self) {
        self.life = -1;
    }
}
