//! Projectile versus world resolution.
//!
//! # Invariants
//! - A projectile registers at most one hit per hostile over its lifetime.
//! - A non-piercing hit removes the projectile in the same frame.

use duskfall_common::EntityId;
use rand::Rng;

use crate::actors::{Hostile, HostileDeath, HostileKind};
use crate::projectile::Projectile;
use crate::spatial::SpatialWorld;

/// One projectile striking one hostile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRecord {
    pub projectile: EntityId,
    pub hostile: EntityId,
    pub kind: HostileKind,
    pub strong: bool,
    pub killed: bool,
}

/// Everything combat produced in one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CombatReport {
    pub hits: Vec<HitRecord>,
    pub deaths: Vec<HostileDeath>,
    /// Projectiles removed this frame, by hit or by age.
    pub removed: Vec<EntityId>,
}

impl CombatReport {
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty() && self.deaths.is_empty() && self.removed.is_empty()
    }

    pub fn score(&self) -> u32 {
        self.deaths.iter().map(|d| d.score).sum()
    }
}

/// Moves projectiles and applies their damage.
#[derive(Debug, Clone, Copy)]
pub struct CombatResolver {
    drop_chance: f32,
}

impl CombatResolver {
    pub fn new(drop_chance: f32) -> Self {
        Self { drop_chance }
    }

    /// Advance every projectile one frame, dropping spent ones.
    pub fn resolve(
        &self,
        projectiles: &mut Vec<Projectile>,
        hostiles: &mut [Hostile],
        world: &SpatialWorld,
        rng: &mut impl Rng,
    ) -> CombatReport {
        let _span = tracing::trace_span!("combat", projectiles = projectiles.len()).entered();
        let mut report = CombatReport::default();
        projectiles.retain_mut(|p| {
            let keep = !self.step_projectile(p, hostiles, world, rng, &mut report);
            if !keep {
                report.removed.push(p.id);
            }
            keep
        });
        report
    }

    /// Physics, hostile hits and ageing for one projectile.
    /// Returns true when the projectile should be removed.
    pub fn step_projectile(
        &self,
        projectile: &mut Projectile,
        hostiles: &mut [Hostile],
        world: &SpatialWorld,
        rng: &mut impl Rng,
        report: &mut CombatReport,
    ) -> bool {
        projectile.step_physics(world);

        for hostile in hostiles.iter_mut() {
            if !hostile.alive || projectile.hit_set.contains(&hostile.id) {
                continue;
            }
            if !hostile.hit_test(projectile.position) {
                continue;
            }
            let death = hostile.take_damage(projectile.strong, self.drop_chance, rng);
            projectile.hit_set.insert(hostile.id);
            tracing::debug!(
                projectile = %projectile.id,
                hostile = %hostile.id,
                strong = projectile.strong,
                killed = death.is_some(),
                "projectile hit"
            );
            report.hits.push(HitRecord {
                projectile: projectile.id,
                hostile: hostile.id,
                kind: hostile.kind,
                strong: projectile.strong,
                killed: death.is_some(),
            });
            if let Some(death) = death {
                report.deaths.push(death);
            }
            let pierces = projectile.strong && !hostile.profile().strong_only;
            if !pierces {
                projectile.terminate();
                return true;
            }
        }

        projectile.age();
        projectile.is_expired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::Obstacle;
    use glam::Vec3;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(11)
    }

    fn hostile_at(id: u64, kind: HostileKind, z: f32) -> Hostile {
        let mut h = Hostile::spawn(EntityId(id), kind, Vec3::new(0.0, 0.8, z), 0.0, &mut rng());
        h.position.y = kind.profile().bob_base;
        h
    }

    /// A projectile hovering inside a hostile's hit volume with no velocity.
    fn hovering(id: u64, strong: bool, z: f32) -> Projectile {
        let speed = if strong { 3.0 } else { 0.5 };
        let mut p = Projectile::launch(EntityId(id), Vec3::new(0.0, 1.5, z), Vec3::X, speed);
        p.velocity = Vec3::new(0.0, PROJECTILE_HOVER, 0.0);
        p
    }

    // Cancels gravity for the first step.
    const PROJECTILE_HOVER: f32 = crate::projectile::PROJECTILE_GRAVITY;

    #[test]
    fn weak_shot_stops_on_first_hostile() {
        let resolver = CombatResolver::new(0.0);
        let world = SpatialWorld::new(48.5);
        let mut hostiles = vec![hostile_at(1, HostileKind::Mini, 0.0)];
        let mut projectiles = vec![hovering(10, false, 0.0)];
        let report = resolver.resolve(&mut projectiles, &mut hostiles, &world, &mut rng());
        assert!(projectiles.is_empty());
        assert_eq!(report.hits.len(), 1);
        assert!(report.deaths.is_empty());
        assert_eq!(hostiles[0].hit_points, 2);
        assert_eq!(report.removed, vec![EntityId(10)]);
    }

    #[test]
    fn strong_shot_pierces_and_hits_each_once() {
        let resolver = CombatResolver::new(0.0);
        let world = SpatialWorld::new(48.5);
        let mut hostiles = vec![
            hostile_at(1, HostileKind::Mini, 0.0),
            hostile_at(2, HostileKind::Mini, 0.5),
        ];
        let mut projectiles = vec![hovering(10, true, 0.0)];
        let mut rng = rng();
        let first = resolver.resolve(&mut projectiles, &mut hostiles, &world, &mut rng);
        assert_eq!(first.hits.len(), 2);
        assert_eq!(projectiles.len(), 1);
        for _ in 0..20 {
            let later = resolver.resolve(&mut projectiles, &mut hostiles, &world, &mut rng);
            assert!(later.hits.is_empty());
        }
        assert_eq!(hostiles[0].hit_points, 2);
        assert_eq!(hostiles[1].hit_points, 2);
    }

    #[test]
    fn super_absorbs_weak_shot_and_stops_it() {
        let resolver = CombatResolver::new(0.0);
        let world = SpatialWorld::new(48.5);
        let mut hostiles = vec![hostile_at(1, HostileKind::Super, 0.0)];
        let mut projectiles = vec![hovering(10, false, 0.0)];
        let report = resolver.resolve(&mut projectiles, &mut hostiles, &world, &mut rng());
        assert_eq!(report.hits.len(), 1);
        assert!(projectiles.is_empty());
        assert_eq!(hostiles[0].hit_points, 2);
    }

    #[test]
    fn strong_shot_does_not_pierce_super() {
        let resolver = CombatResolver::new(0.0);
        let world = SpatialWorld::new(48.5);
        let mut hostiles = vec![
            hostile_at(1, HostileKind::Super, 0.0),
            hostile_at(2, HostileKind::Normal, 0.5),
        ];
        let mut projectiles = vec![hovering(10, true, 0.0)];
        let report = resolver.resolve(&mut projectiles, &mut hostiles, &world, &mut rng());
        assert_eq!(report.hits.len(), 1);
        assert_eq!(hostiles[0].hit_points, 1);
        assert!(hostiles[1].alive);
        assert!(projectiles.is_empty());
    }

    #[test]
    fn normal_kill_awards_score() {
        let resolver = CombatResolver::new(0.0);
        let world = SpatialWorld::new(48.5);
        let mut hostiles = vec![hostile_at(1, HostileKind::Normal, 0.0)];
        let mut projectiles = vec![hovering(10, false, 0.0)];
        let report = resolver.resolve(&mut projectiles, &mut hostiles, &world, &mut rng());
        assert_eq!(report.deaths.len(), 1);
        assert_eq!(report.score(), 10);
        assert!(!report.deaths[0].drops_pickup);
        assert!(!hostiles[0].alive);
    }

    /// A wall along x centred at z = 10 and a projectile about to enter it.
    fn wall_bounce_setup() -> (SpatialWorld, Projectile) {
        let mut world = SpatialWorld::new(48.5);
        world.add(Obstacle::Box {
            center: Vec3::new(0.0, 3.0, 10.0),
            size: Vec3::new(100.0, 6.0, 1.0),
        });
        let mut p = Projectile::launch(EntityId(10), Vec3::new(0.0, 1.5, 8.6), Vec3::Z, 1.0);
        p.velocity.y = PROJECTILE_HOVER;
        (world, p)
    }

    #[test]
    fn wall_bounce_happens_before_hit_test() {
        let resolver = CombatResolver::new(0.0);

        // Integrated position z = 9.6 would be inside this hostile's 3.3
        // radius; after the wall sends the shot back to z = 9.0 it is not.
        let (world, projectile) = wall_bounce_setup();
        let mut behind = vec![hostile_at(1, HostileKind::Normal, 12.5)];
        let mut projectiles = vec![projectile];
        let report = resolver.resolve(&mut projectiles, &mut behind, &world, &mut rng());
        assert!(report.hits.is_empty());
        assert!(behind[0].alive);
        assert_eq!(projectiles.len(), 1);
        assert!((projectiles[0].velocity.z + 0.6).abs() < 1e-5);
        assert!((projectiles[0].position.z - 9.0).abs() < 1e-5);

        // Out of reach at z = 9.6, within reach at the rebounded z = 9.0.
        let (world, projectile) = wall_bounce_setup();
        let mut in_front = vec![hostile_at(2, HostileKind::Normal, 6.2)];
        let mut projectiles = vec![projectile];
        let report = resolver.resolve(&mut projectiles, &mut in_front, &world, &mut rng());
        assert_eq!(report.hits.len(), 1);
        assert_eq!(report.hits[0].hostile, EntityId(2));
        assert!(projectiles.is_empty());
    }

    #[test]
    fn misses_age_out() {
        let resolver = CombatResolver::new(0.0);
        let world = SpatialWorld::new(48.5);
        let mut hostiles: Vec<Hostile> = Vec::new();
        let mut projectiles = vec![hovering(10, false, 0.0)];
        let mut rng = rng();
        let mut frames = 0;
        while !projectiles.is_empty() {
            resolver.resolve(&mut projectiles, &mut hostiles, &world, &mut rng);
            frames += 1;
        }
        assert_eq!(frames, 601);
    }
}
