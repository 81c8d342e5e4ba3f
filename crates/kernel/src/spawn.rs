use glam::Vec3;
use rand::Rng;

use crate::actors::{HostileKind, RANDOM_PICKUP_Y};
use crate::config::{ArenaConfig, SpawnConfig};

/// Per-frame random arrivals of hostiles and hearts.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnRules {
    spawn: SpawnConfig,
    entry_distance: f32,
    spread: f32,
}

impl SpawnRules {
    pub fn new(spawn: &SpawnConfig, arena: &ArenaConfig) -> Self {
        Self {
            spawn: spawn.clone(),
            entry_distance: arena.hostile_spawn_distance,
            spread: arena.spawn_spread,
        }
    }

    pub fn drop_chance(&self) -> f32 {
        self.spawn.drop_chance
    }

    /// Variant for a spawn roll `r` in `[0, 1)` at the current score.
    pub fn choose_kind(&self, score: u32, r: f32) -> HostileKind {
        if score >= self.spawn.super_min_score && r < self.spawn.super_roll {
            HostileKind::Super
        } else if score >= self.spawn.mini_min_score && r < self.spawn.mini_roll {
            HostileKind::Mini
        } else {
            HostileKind::Normal
        }
    }

    /// A point on a random side of the arena, outside the walls.
    pub fn entry_point(&self, rng: &mut impl Rng) -> Vec3 {
        let side = rng.random_range(0..4u8);
        let offset = rng.random_range(-self.spread..self.spread);
        let d = self.entry_distance;
        match side {
            0 => Vec3::new(offset, 0.0, -d),
            1 => Vec3::new(offset, 0.0, d),
            2 => Vec3::new(d, 0.0, offset),
            _ => Vec3::new(-d, 0.0, offset),
        }
    }

    /// Roll this frame's hostile arrival.
    pub fn roll_hostile(&self, score: u32, rng: &mut impl Rng) -> Option<(HostileKind, Vec3)> {
        if rng.random::<f32>() >= self.spawn.hostile_chance {
            return None;
        }
        let kind = self.choose_kind(score, rng.random::<f32>());
        Some((kind, self.entry_point(rng)))
    }

    /// Roll this frame's free-standing heart.
    pub fn roll_heart(&self, rng: &mut impl Rng) -> Option<Vec3> {
        if rng.random::<f32>() >= self.spawn.heart_chance {
            return None;
        }
        let x = rng.random_range(-self.spread..self.spread);
        let z = rng.random_range(-self.spread..self.spread);
        Some(Vec3::new(x, RANDOM_PICKUP_Y, z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rules() -> SpawnRules {
        SpawnRules::new(&SpawnConfig::default(), &ArenaConfig::default())
    }

    #[test]
    fn low_score_only_spawns_normal() {
        let rules = rules();
        for i in 0..100 {
            assert_eq!(rules.choose_kind(99, i as f32 / 100.0), HostileKind::Normal);
        }
    }

    #[test]
    fn score_gates_unlock_variants() {
        let rules = rules();
        assert_eq!(rules.choose_kind(100, 0.05), HostileKind::Super);
        assert_eq!(rules.choose_kind(100, 0.2), HostileKind::Normal);
        assert_eq!(rules.choose_kind(300, 0.05), HostileKind::Super);
        assert_eq!(rules.choose_kind(300, 0.2), HostileKind::Mini);
        assert_eq!(rules.choose_kind(300, 0.3), HostileKind::Normal);
    }

    #[test]
    fn entry_points_lie_on_the_ring() {
        let rules = rules();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..200 {
            let p = rules.entry_point(&mut rng);
            let (major, minor) = if p.x.abs() == 65.0 { (p.x, p.z) } else { (p.z, p.x) };
            assert_eq!(major.abs(), 65.0);
            assert!(minor.abs() <= 40.0);
            assert_eq!(p.y, 0.0);
        }
    }

    #[test]
    fn spawn_rate_is_roughly_one_percent() {
        let rules = rules();
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let spawned = (0..100_000)
            .filter(|_| rules.roll_hostile(0, &mut rng).is_some())
            .count();
        assert!((700..1300).contains(&spawned), "{spawned}");
    }

    #[test]
    fn hearts_appear_inside_the_arena() {
        let mut config = SpawnConfig::default();
        config.heart_chance = 1.0;
        let rules = SpawnRules::new(&config, &ArenaConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        for _ in 0..50 {
            let p = rules.roll_heart(&mut rng).unwrap();
            assert!(p.x.abs() <= 40.0 && p.z.abs() <= 40.0);
            assert_eq!(p.y, RANDOM_PICKUP_Y);
        }
    }
}
