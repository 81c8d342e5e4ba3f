use duskfall_common::EntityId;
use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::actors::{Health, Hostile, HostileKind, Pickup, Player};
use crate::projectile::Projectile;

/// Owner of every dynamic actor.
///
/// Each actor lives in exactly one collection. Collections keep insertion
/// order so iteration, and therefore the simulation, is reproducible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRegistry {
    next_id: EntityId,
    pub player: Player,
    pub hostiles: Vec<Hostile>,
    pub projectiles: Vec<Projectile>,
    pub pickups: Vec<Pickup>,
}

impl EntityRegistry {
    pub fn new(health: Health) -> Self {
        Self {
            next_id: EntityId(1),
            player: Player::new(health),
            hostiles: Vec::new(),
            projectiles: Vec::new(),
            pickups: Vec::new(),
        }
    }

    fn allocate(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id = id.next();
        id
    }

    pub fn spawn_hostile(
        &mut self,
        kind: HostileKind,
        position: Vec3,
        now: f32,
        rng: &mut impl Rng,
    ) -> EntityId {
        let id = self.allocate();
        self.hostiles.push(Hostile::spawn(id, kind, position, now, rng));
        tracing::debug!(%id, kind = kind.name(), ?position, "hostile spawned");
        id
    }

    pub fn spawn_pickup(&mut self, position: Vec3) -> EntityId {
        let id = self.allocate();
        self.pickups.push(Pickup::new(id, position));
        tracing::debug!(%id, ?position, "heart spawned");
        id
    }

    /// Heart left behind by a dead hostile.
    pub fn drop_pickup(&mut self, death_position: Vec3) -> EntityId {
        let id = self.allocate();
        let pickup = Pickup::dropped_at(id, death_position);
        tracing::debug!(%id, position = ?pickup.position, "heart dropped");
        self.pickups.push(pickup);
        id
    }

    pub fn spawn_projectile(&mut self, origin: Vec3, direction: Vec3, speed: f32) -> EntityId {
        let id = self.allocate();
        self.projectiles
            .push(Projectile::launch(id, origin, direction, speed));
        id
    }

    /// Drop hostiles and pickups whose alive flag went false.
    pub fn sweep_dead(&mut self) -> usize {
        let before = self.hostiles.len() + self.pickups.len();
        self.hostiles.retain(|h| h.alive);
        self.pickups.retain(|p| p.alive);
        before - self.hostiles.len() - self.pickups.len()
    }

    pub fn live_hostiles(&self) -> impl Iterator<Item = &Hostile> {
        self.hostiles.iter().filter(|h| h.alive)
    }

    pub fn live_pickups(&self) -> impl Iterator<Item = &Pickup> {
        self.pickups.iter().filter(|p| p.alive)
    }

    /// Number of live actors, player excluded.
    pub fn actor_count(&self) -> usize {
        self.live_hostiles().count() + self.projectiles.len() + self.live_pickups().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn ids_are_unique_and_increasing() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut reg = EntityRegistry::new(Health::new(2, 5));
        let a = reg.spawn_hostile(HostileKind::Normal, Vec3::ZERO, 0.0, &mut rng);
        let b = reg.spawn_pickup(Vec3::ONE);
        let c = reg.spawn_projectile(Vec3::ZERO, Vec3::X, 1.0);
        assert!(a < b && b < c);
        assert_eq!(reg.actor_count(), 3);
    }

    #[test]
    fn sweep_removes_dead_only() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut reg = EntityRegistry::new(Health::new(2, 5));
        reg.spawn_hostile(HostileKind::Normal, Vec3::ZERO, 0.0, &mut rng);
        let keep = reg.spawn_hostile(HostileKind::Mini, Vec3::ZERO, 0.0, &mut rng);
        reg.spawn_pickup(Vec3::ONE);
        reg.hostiles[0].alive = false;
        reg.pickups[0].alive = false;
        assert_eq!(reg.sweep_dead(), 2);
        assert_eq!(reg.hostiles.len(), 1);
        assert_eq!(reg.hostiles[0].id, keep);
        assert!(reg.pickups.is_empty());
    }

    #[test]
    fn dropped_pickup_floats_at_one() {
        let mut reg = EntityRegistry::new(Health::new(2, 5));
        reg.drop_pickup(Vec3::new(3.0, 0.9, 4.0));
        assert_eq!(reg.pickups[0].position, Vec3::new(3.0, 1.0, 4.0));
    }
}
