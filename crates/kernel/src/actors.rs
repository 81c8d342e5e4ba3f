//! Dynamic actors: hostiles, pickups and the player controller.
//!
//! # Invariants
//! - Hostile hit points never go negative; death clamps them to zero.
//! - Player health stays in `[0, max]`.
//! - Per-variant numbers live in [`HostileProfile`] tables, never inline.

use duskfall_common::EntityId;
use duskfall_input::MoveIntent;
use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::spatial::{SpatialWorld, TREE_PLAYER_CLEARANCE};

/// Hostile variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HostileKind {
    Normal,
    Mini,
    Super,
}

/// Static stats for one [`HostileKind`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostileProfile {
    pub hit_points: u32,
    pub scale: f32,
    pub base_speed: f32,
    /// Upper bound of the uniform speed bonus rolled at spawn.
    pub speed_jitter: f32,
    pub score: u32,
    /// Whether touching the player costs the player health.
    pub contact_damage: bool,
    pub bob_base: f32,
    pub bob_amplitude: f32,
    /// Horizontal hit radius is `hit_radius_mult * scale`.
    pub hit_radius_mult: f32,
    pub has_death_cue: bool,
    /// Only strong projectiles reduce hit points.
    pub strong_only: bool,
    pub tint: Vec3,
}

const NORMAL_PROFILE: HostileProfile = HostileProfile {
    hit_points: 1,
    scale: 0.6,
    base_speed: 0.04,
    speed_jitter: 0.03,
    score: 10,
    contact_damage: false,
    bob_base: 0.8,
    bob_amplitude: 0.1,
    hit_radius_mult: 5.5,
    has_death_cue: false,
    strong_only: false,
    tint: Vec3::ONE,
};

const MINI_PROFILE: HostileProfile = HostileProfile {
    hit_points: 3,
    scale: 0.4,
    base_speed: 0.06,
    speed_jitter: 0.02,
    score: 100,
    contact_damage: true,
    bob_base: 0.8,
    bob_amplitude: 0.1,
    hit_radius_mult: 4.0,
    has_death_cue: true,
    strong_only: false,
    tint: Vec3::new(0.2, 1.0, 0.2),
};

const SUPER_PROFILE: HostileProfile = HostileProfile {
    hit_points: 2,
    scale: 1.5,
    base_speed: 0.025,
    speed_jitter: 0.01,
    score: 50,
    contact_damage: true,
    bob_base: 1.5,
    bob_amplitude: 0.3,
    hit_radius_mult: 4.0,
    has_death_cue: true,
    strong_only: true,
    tint: Vec3::new(1.0, 0.5, 0.5),
};

impl HostileKind {
    pub const ALL: [HostileKind; 3] = [HostileKind::Normal, HostileKind::Mini, HostileKind::Super];

    pub fn profile(self) -> &'static HostileProfile {
        match self {
            HostileKind::Normal => &NORMAL_PROFILE,
            HostileKind::Mini => &MINI_PROFILE,
            HostileKind::Super => &SUPER_PROFILE,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            HostileKind::Normal => "normal",
            HostileKind::Mini => "mini",
            HostileKind::Super => "super",
        }
    }
}

/// Distance at which a contact-damage hostile reaches the player.
pub const CONTACT_RADIUS: f32 = 2.5;
/// Head height is this many times the hostile's scale.
pub const HEAD_HEIGHT_MULT: f32 = 5.5;
/// Distance at which talk cues fall silent.
pub const TALK_FALLOFF: f32 = 50.0;
const FIRST_TALK_MAX: f32 = 3.0;
const TALK_INTERVAL: f32 = 3.0;
const TALK_INTERVAL_JITTER: f32 = 2.0;
const BOB_RATE: f32 = 15.0;

/// A hostile's death, reported once.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HostileDeath {
    pub id: EntityId,
    pub kind: HostileKind,
    pub position: Vec3,
    pub score: u32,
    pub has_death_cue: bool,
    /// Whether the drop roll succeeded and a heart should appear.
    pub drops_pickup: bool,
}

/// Result of one hostile update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostileStatus {
    /// Still chasing. `talk` carries a cue volume when the talk timer fired.
    Chasing { talk: Option<f32> },
    /// Touched the player and removed itself.
    HitPlayer,
    /// Already dead; nothing happened.
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hostile {
    pub id: EntityId,
    pub kind: HostileKind,
    pub position: Vec3,
    /// Facing angle around +Y, `atan2(dx, dz)` towards the player.
    pub yaw: f32,
    pub hit_points: u32,
    pub speed: f32,
    pub alive: bool,
    /// Session time of the next talk cue.
    next_talk: f32,
}

impl Hostile {
    /// A fresh hostile at `position`. `now` is the session time in seconds.
    pub fn spawn(
        id: EntityId,
        kind: HostileKind,
        position: Vec3,
        now: f32,
        rng: &mut impl Rng,
    ) -> Self {
        let profile = kind.profile();
        Self {
            id,
            kind,
            position,
            yaw: 0.0,
            hit_points: profile.hit_points,
            speed: profile.base_speed + rng.random::<f32>() * profile.speed_jitter,
            alive: true,
            next_talk: now + rng.random::<f32>() * FIRST_TALK_MAX,
        }
    }

    pub fn profile(&self) -> &'static HostileProfile {
        self.kind.profile()
    }

    pub fn scale(&self) -> f32 {
        self.profile().scale
    }

    /// Chase the player for one frame.
    pub fn update(&mut self, player: Vec3, now: f32, rng: &mut impl Rng) -> HostileStatus {
        if !self.alive {
            return HostileStatus::Inactive;
        }
        let profile = self.profile();
        let to_player = player - self.position;
        let distance = to_player.length();

        if distance < CONTACT_RADIUS && profile.contact_damage {
            self.alive = false;
            tracing::debug!(id = %self.id, kind = self.kind.name(), "hostile reached player");
            return HostileStatus::HitPlayer;
        }

        let planar = Vec3::new(to_player.x, 0.0, to_player.z);
        self.yaw = planar.x.atan2(planar.z);
        self.position += planar.normalize_or_zero() * self.speed;
        self.position.y = profile.bob_base + (now * BOB_RATE).sin().abs() * profile.bob_amplitude;

        let talk = if now > self.next_talk {
            self.next_talk = now + TALK_INTERVAL + rng.random::<f32>() * TALK_INTERVAL_JITTER;
            Some(talk_volume(distance))
        } else {
            None
        };
        HostileStatus::Chasing { talk }
    }

    /// Whether a sphere at `point` overlaps this hostile's hit volume.
    pub fn hit_test(&self, point: Vec3) -> bool {
        let profile = self.profile();
        let planar = (point.x - self.position.x).hypot(point.z - self.position.z);
        let dy = point.y - self.position.y;
        let head = HEAD_HEIGHT_MULT * profile.scale;
        planar < profile.hit_radius_mult * profile.scale && dy > -0.5 && dy < head
    }

    /// Apply one hit. Returns the death record the first time hit points
    /// reach zero; later hits on a dead hostile do nothing.
    pub fn take_damage(
        &mut self,
        strong: bool,
        drop_chance: f32,
        rng: &mut impl Rng,
    ) -> Option<HostileDeath> {
        if !self.alive {
            return None;
        }
        let profile = self.profile();
        if profile.strong_only && !strong {
            tracing::trace!(id = %self.id, "weak shot ignored");
            return None;
        }
        self.hit_points = self.hit_points.saturating_sub(1);
        if self.hit_points > 0 {
            return None;
        }
        self.alive = false;
        let drops_pickup = rng.random::<f32>() < drop_chance;
        tracing::debug!(id = %self.id, kind = self.kind.name(), drops_pickup, "hostile died");
        Some(HostileDeath {
            id: self.id,
            kind: self.kind,
            position: self.position,
            score: profile.score,
            has_death_cue: profile.has_death_cue,
            drops_pickup,
        })
    }
}

/// Talk cue volume for a hostile `distance` away.
pub fn talk_volume(distance: f32) -> f32 {
    (1.0 - distance / TALK_FALLOFF).clamp(0.0, 1.0)
}

/// Bounded hit points of the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    current: u32,
    max: u32,
}

impl Health {
    pub fn new(current: u32, max: u32) -> Self {
        Self {
            current: current.min(max),
            max,
        }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn is_depleted(&self) -> bool {
        self.current == 0
    }

    /// Lose one point. Returns the remaining health.
    pub fn damage(&mut self) -> u32 {
        self.current = self.current.saturating_sub(1);
        self.current
    }

    /// Gain one point. Returns false when already at max.
    pub fn heal(&mut self) -> bool {
        if self.current >= self.max {
            return false;
        }
        self.current += 1;
        true
    }
}

/// Heart pickup: bobs, spins and heals on touch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pickup {
    pub id: EntityId,
    pub position: Vec3,
    pub base_y: f32,
    /// Spin angle around +Y in radians.
    pub spin: f32,
    pub alive: bool,
}

/// Height at which a dropped heart floats.
pub const DROPPED_PICKUP_Y: f32 = 1.0;
/// Height at which a randomly placed heart floats.
pub const RANDOM_PICKUP_Y: f32 = 1.5;
pub const PICKUP_RADIUS: f32 = 1.5;
const PICKUP_SPIN: f32 = 0.05;
const PICKUP_BOB_RATE: f32 = 3.0;
const PICKUP_BOB_AMPLITUDE: f32 = 0.3;

impl Pickup {
    pub fn new(id: EntityId, position: Vec3) -> Self {
        Self {
            id,
            position,
            base_y: position.y,
            spin: 0.0,
            alive: true,
        }
    }

    /// A heart left where a hostile died.
    pub fn dropped_at(id: EntityId, death_position: Vec3) -> Self {
        Self::new(
            id,
            Vec3::new(death_position.x, DROPPED_PICKUP_Y, death_position.z),
        )
    }

    /// Animate and test for collection. Returns true when the player
    /// touched it this frame; `health` is healed when not already full.
    pub fn update(&mut self, player: Vec3, now: f32, health: &mut Health) -> bool {
        if !self.alive {
            return false;
        }
        self.spin += PICKUP_SPIN;
        self.position.y = self.base_y + (now * PICKUP_BOB_RATE).sin() * PICKUP_BOB_AMPLITUDE;
        if self.position.distance(player) < PICKUP_RADIUS {
            health.heal();
            self.alive = false;
            return true;
        }
        false
    }
}

/// Eye height; the player stands on the ground at this height.
pub const EYE_HEIGHT: f32 = 1.7;
const PLAYER_GRAVITY: f32 = 0.01;
const JUMP_IMPULSE: f32 = 0.2;
const WALK_SPEED: f32 = 0.15;
const PITCH_LIMIT: f32 = 85.0;
const RECOIL_DECAY: f32 = 0.85;
const FLASH_DECAY: f32 = 0.8;
const FIRE_RECOIL: f32 = 0.6;

/// First-person player controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Eye position.
    pub position: Vec3,
    /// Degrees; -90 looks down -Z.
    pub yaw: f32,
    /// Degrees, clamped to ±85.
    pub pitch: f32,
    pub velocity_y: f32,
    pub grounded: bool,
    pub recoil: f32,
    pub flash: f32,
    pub health: Health,
}

impl Player {
    pub fn new(health: Health) -> Self {
        Self {
            position: Vec3::new(0.0, EYE_HEIGHT, 0.0),
            yaw: -90.0,
            pitch: 0.0,
            velocity_y: 0.0,
            grounded: true,
            recoil: 0.0,
            flash: 0.0,
            health,
        }
    }

    /// Unit view direction.
    pub fn front(&self) -> Vec3 {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        Vec3::new(pitch.cos() * yaw.cos(), pitch.sin(), pitch.cos() * yaw.sin()).normalize()
    }

    /// Unit view direction flattened onto the ground.
    pub fn walk_forward(&self) -> Vec3 {
        let f = self.front();
        Vec3::new(f.x, 0.0, f.z).normalize_or_zero()
    }

    /// Unit vector to the player's right, parallel to the ground.
    pub fn right(&self) -> Vec3 {
        self.walk_forward().cross(Vec3::Y)
    }

    /// Rotate the view by a yaw/pitch delta in degrees.
    pub fn look(&mut self, yaw_delta: f32, pitch_delta: f32) {
        self.yaw += yaw_delta;
        self.pitch = (self.pitch + pitch_delta).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Start a jump when standing on the ground.
    pub fn jump(&mut self) -> bool {
        if !self.grounded {
            return false;
        }
        self.velocity_y = JUMP_IMPULSE;
        self.grounded = false;
        true
    }

    /// Vertical physics then planar walking for one frame.
    pub fn step(&mut self, movement: &MoveIntent, world: &SpatialWorld) {
        self.velocity_y -= PLAYER_GRAVITY;
        self.position.y += self.velocity_y;
        if self.position.y < EYE_HEIGHT {
            self.position.y = EYE_HEIGHT;
            self.velocity_y = 0.0;
            self.grounded = true;
        }

        let axes = movement.axes();
        if axes.x == 0.0 && axes.y == 0.0 {
            return;
        }
        let delta = (self.walk_forward() * axes.y + self.right() * axes.x) * WALK_SPEED;
        let (x, z) = world.clamp_to_bounds(self.position.x + delta.x, self.position.z + delta.z);
        if !world.point_blocked(x, z, TREE_PLAYER_CLEARANCE) {
            self.position.x = x;
            self.position.z = z;
        }
    }

    /// Decay the weapon recoil and muzzle flash.
    pub fn decay_effects(&mut self) {
        self.recoil = (self.recoil * RECOIL_DECAY).max(0.0);
        self.flash *= FLASH_DECAY;
    }

    /// Kick the weapon for a shot at `speed`.
    pub fn apply_fire_kick(&mut self, speed: f32) {
        self.recoil = FIRE_RECOIL;
        self.flash = 0.5 + speed * 0.2;
    }

    /// Where projectiles leave the weapon.
    pub fn muzzle(&self) -> Vec3 {
        let front = self.front();
        let right = front.cross(Vec3::Y);
        self.position + right * 0.2 - Vec3::Y * 0.2 + front * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(3)
    }

    fn hostile(kind: HostileKind) -> Hostile {
        Hostile::spawn(EntityId(1), kind, Vec3::new(0.0, 0.8, 10.0), 0.0, &mut rng())
    }

    #[test]
    fn spawn_speed_within_jitter() {
        for kind in HostileKind::ALL {
            let p = kind.profile();
            let h = hostile(kind);
            assert!(h.speed >= p.base_speed && h.speed <= p.base_speed + p.speed_jitter);
            assert_eq!(h.hit_points, p.hit_points);
        }
    }

    #[test]
    fn damage_hp_times_kills_once() {
        let mut rng = rng();
        for kind in HostileKind::ALL {
            let mut h = hostile(kind);
            let mut deaths = 0;
            for _ in 0..kind.profile().hit_points {
                if h.take_damage(true, 0.0, &mut rng).is_some() {
                    deaths += 1;
                }
            }
            assert_eq!(deaths, 1, "{kind:?}");
            assert!(!h.alive);
            assert_eq!(h.hit_points, 0);
            assert!(h.take_damage(true, 0.0, &mut rng).is_none());
            assert_eq!(h.hit_points, 0);
        }
    }

    #[test]
    fn super_ignores_weak_shots() {
        let mut rng = rng();
        let mut h = hostile(HostileKind::Super);
        for _ in 0..10 {
            assert!(h.take_damage(false, 0.0, &mut rng).is_none());
        }
        assert_eq!(h.hit_points, 2);
        assert!(h.alive);
    }

    #[test]
    fn normal_dies_on_one_hit_and_rolls_drop() {
        let mut rng = rng();
        let mut h = hostile(HostileKind::Normal);
        let death = h.take_damage(false, 0.0, &mut rng).unwrap();
        assert_eq!(death.score, 10);
        assert!(!death.drops_pickup);
        assert!(!death.has_death_cue);

        let mut h = hostile(HostileKind::Normal);
        assert!(h.take_damage(false, 1.0, &mut rng).unwrap().drops_pickup);
    }

    #[test]
    fn contact_damage_only_for_mini_and_super() {
        let mut rng = rng();
        let player = Vec3::new(0.0, 1.7, 0.0);
        for kind in HostileKind::ALL {
            let mut h = Hostile::spawn(EntityId(1), kind, Vec3::new(1.0, 1.0, 0.0), 0.0, &mut rng);
            let status = h.update(player, 0.1, &mut rng);
            if kind == HostileKind::Normal {
                assert!(matches!(status, HostileStatus::Chasing { .. }));
                assert!(h.alive);
            } else {
                assert_eq!(status, HostileStatus::HitPlayer);
                assert!(!h.alive);
            }
        }
    }

    #[test]
    fn chase_moves_toward_player_and_faces_it() {
        let mut rng = rng();
        let mut h = hostile(HostileKind::Normal);
        let before = h.position.z;
        h.update(Vec3::new(0.0, 1.7, 0.0), 0.0, &mut rng);
        assert!((before - h.position.z - h.speed).abs() < 1e-5);
        // Player lies towards -Z.
        assert!((h.yaw.abs() - std::f32::consts::PI).abs() < 1e-5);
        assert!((h.position.y - 0.8).abs() < 1e-6);
    }

    #[test]
    fn talk_fires_then_waits() {
        let mut rng = rng();
        let mut h = hostile(HostileKind::Mini);
        let player = Vec3::new(0.0, 0.0, 35.0);
        let first = h.update(player, 3.5, &mut rng);
        assert!(matches!(first, HostileStatus::Chasing { talk: Some(_) }));
        let second = h.update(player, 3.6, &mut rng);
        assert_eq!(second, HostileStatus::Chasing { talk: None });
    }

    #[test]
    fn volume_falls_off() {
        assert_eq!(talk_volume(0.0), 1.0);
        assert!((talk_volume(25.0) - 0.5).abs() < 1e-6);
        assert_eq!(talk_volume(80.0), 0.0);
    }

    #[test]
    fn hit_volume_uses_profile() {
        let h = hostile(HostileKind::Normal);
        // 5.5 * 0.6 = 3.3 planar radius, head at 3.3 above base.
        assert!(h.hit_test(h.position + Vec3::new(3.2, 1.0, 0.0)));
        assert!(!h.hit_test(h.position + Vec3::new(3.4, 1.0, 0.0)));
        assert!(!h.hit_test(h.position + Vec3::new(0.0, -0.6, 0.0)));
        assert!(!h.hit_test(h.position + Vec3::new(0.0, 3.4, 0.0)));
    }

    #[test]
    fn health_bounds() {
        let mut hp = Health::new(5, 5);
        assert!(!hp.heal());
        assert_eq!(hp.current(), 5);
        for _ in 0..10 {
            hp.damage();
        }
        assert_eq!(hp.current(), 0);
        assert!(hp.is_depleted());
        assert_eq!(Health::new(9, 5).current(), 5);
    }

    #[test]
    fn pickup_heals_and_disappears() {
        let mut hp = Health::new(2, 5);
        let mut heart = Pickup::new(EntityId(9), Vec3::new(0.0, 1.5, 0.0));
        assert!(heart.update(Vec3::new(0.0, 1.7, 0.5), 0.0, &mut hp));
        assert_eq!(hp.current(), 3);
        assert!(!heart.alive);
        assert!(!heart.update(Vec3::new(0.0, 1.7, 0.0), 0.0, &mut hp));
    }

    #[test]
    fn pickup_at_full_health_is_still_consumed() {
        let mut hp = Health::new(5, 5);
        let mut heart = Pickup::dropped_at(EntityId(2), Vec3::new(0.0, 0.8, 0.0));
        assert_eq!(heart.base_y, DROPPED_PICKUP_Y);
        assert!(heart.update(Vec3::new(0.0, 1.7, 0.0), 0.0, &mut hp));
        assert_eq!(hp.current(), 5);
    }

    #[test]
    fn player_faces_negative_z() {
        let p = Player::new(Health::new(2, 5));
        assert!((p.front() - Vec3::NEG_Z).length() < 1e-5);
        assert!((p.right() - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut p = Player::new(Health::new(2, 5));
        p.look(0.0, 200.0);
        assert_eq!(p.pitch, 85.0);
        p.look(10.0, -400.0);
        assert_eq!(p.pitch, -85.0);
        assert_eq!(p.yaw, -80.0);
    }

    #[test]
    fn jump_only_from_ground() {
        let world = SpatialWorld::new(48.5);
        let mut p = Player::new(Health::new(2, 5));
        assert!(p.jump());
        assert!(!p.jump());
        p.step(&MoveIntent::default(), &world);
        assert!(p.position.y > EYE_HEIGHT);
        for _ in 0..100 {
            p.step(&MoveIntent::default(), &world);
        }
        assert_eq!(p.position.y, EYE_HEIGHT);
        assert!(p.grounded);
    }

    #[test]
    fn boundary_stops_walking() {
        let world = SpatialWorld::new(48.5);
        let mut p = Player::new(Health::new(2, 5));
        p.position.z = -48.4;
        let forward = MoveIntent {
            forward: true,
            ..MoveIntent::default()
        };
        for _ in 0..20 {
            p.step(&forward, &world);
            assert!(p.position.z >= -48.5);
        }
        assert_eq!(p.position.z, -48.5);
    }

    #[test]
    fn tree_blocks_walking() {
        let mut world = SpatialWorld::new(48.5);
        world.add(crate::spatial::Obstacle::Point { x: 0.0, z: -1.0 });
        let mut p = Player::new(Health::new(2, 5));
        let forward = MoveIntent {
            forward: true,
            ..MoveIntent::default()
        };
        p.step(&forward, &world);
        assert_eq!(p.position.z, 0.0);
    }

    #[test]
    fn effects_decay() {
        let mut p = Player::new(Health::new(2, 5));
        p.apply_fire_kick(3.0);
        assert_eq!(p.recoil, 0.6);
        assert!((p.flash - 1.1).abs() < 1e-6);
        p.decay_effects();
        assert!((p.recoil - 0.51).abs() < 1e-6);
        assert!((p.flash - 0.88).abs() < 1e-6);
    }

    #[test]
    fn muzzle_offsets_from_eye() {
        let p = Player::new(Health::new(2, 5));
        let m = p.muzzle();
        assert!((m - Vec3::new(0.2, 1.5, -0.5)).length() < 1e-5);
    }
}
