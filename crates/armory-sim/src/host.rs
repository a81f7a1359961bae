//! Target-range host.
//!
//! Projectiles travel instantly along their launch direction and hit the
//! nearest standing dummy within [`HIT_RADIUS`] of the line. Damage is
//! resolved with the reference [`Defenses`] order.

use armory_common::{TargetId, WeaponId};
use armory_weapons::{
    AimState, DamageEvent, Defenses, EffectHandle, HitPoint, ProjectileHandle,
    ProjectileProperties, ProjectileSpawn, TargetInfo, WeaponHost,
};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

/// Distance from a shot line that still counts as a hit.
pub const HIT_RADIUS: f32 = 0.75;

/// A target dummy on the range.
#[derive(Debug, Clone)]
pub struct Dummy {
    /// Target id.
    pub id: TargetId,
    /// Tag used by lock-on and homing.
    pub tag: String,
    /// World position.
    pub position: Vec3,
    /// Remaining defenses.
    pub defenses: Defenses,
}

/// Running totals reported in the summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeStats {
    /// Projectiles spawned.
    pub projectiles: u32,
    /// Damage events that reached a dummy.
    pub hits: u32,
    /// Health removed.
    pub damage_dealt: f32,
    /// Shield and armor absorption.
    pub damage_absorbed: f32,
    /// Dummies brought to zero health.
    pub kills: u32,
    /// Effect objects spawned.
    pub effects: u32,
    /// Weapons dropped into the world.
    pub drops: u32,
}

/// Headless [`WeaponHost`] with a row of target dummies.
#[derive(Debug)]
pub struct RangeHost {
    dummies: Vec<Dummy>,
    origin: Vec3,
    forward: Vec3,
    aim: AimState,
    readout: Option<String>,
    field_of_view: f32,
    time_scale: f32,
    stats: RangeStats,
    next_handle: u64,
}

impl RangeHost {
    /// Creates a range looking down -Z from standing eye height.
    #[must_use]
    pub fn new(dummies: Vec<Dummy>) -> Self {
        Self {
            dummies,
            origin: Vec3::new(0.0, 1.6, 0.0),
            forward: Vec3::NEG_Z,
            aim: AimState::default(),
            readout: None,
            field_of_view: 70.0,
            time_scale: 1.0,
            stats: RangeStats::default(),
            next_handle: 1,
        }
    }

    /// Sets the aim-down-sights flag.
    pub fn set_aiming(&mut self, aiming: bool, accuracy_multiplier: f32) {
        self.aim = AimState {
            is_aiming: aiming,
            accuracy_multiplier,
        };
    }

    /// Points the camera.
    pub fn look(&mut self, forward: Vec3) {
        self.forward = forward.normalize_or_zero();
    }

    /// Totals so far.
    #[must_use]
    pub const fn stats(&self) -> RangeStats {
        self.stats
    }

    /// Current readout text.
    #[must_use]
    pub fn readout(&self) -> Option<&str> {
        self.readout.as_deref()
    }

    /// Camera field of view in degrees.
    #[must_use]
    pub const fn field_of_view(&self) -> f32 {
        self.field_of_view
    }

    /// Current time scale.
    #[must_use]
    pub const fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Dummies still standing.
    #[must_use]
    pub fn standing(&self) -> usize {
        self.dummies.iter().filter(|d| d.defenses.is_alive()).count()
    }

    /// All dummies.
    #[must_use]
    pub fn dummies(&self) -> &[Dummy] {
        &self.dummies
    }

    fn handle(&mut self) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    /// Standing dummies along a line, nearest first, with their distance.
    fn along(&self, origin: Vec3, direction: Vec3) -> Vec<(TargetId, f32)> {
        let mut hits: Vec<(TargetId, f32)> = self
            .dummies
            .iter()
            .filter(|d| d.defenses.is_alive())
            .filter_map(|d| {
                let to = d.position - origin;
                let t = to.dot(direction);
                (t > 0.0 && (to - direction * t).length() <= HIT_RADIUS).then_some((d.id, t))
            })
            .collect();
        hits.sort_by(|a, b| a.1.total_cmp(&b.1));
        hits
    }

    fn position_of(&self, id: TargetId) -> Option<Vec3> {
        self.dummies
            .iter()
            .find(|d| d.id == id && d.defenses.is_alive())
            .map(|d| d.position)
    }
}

impl WeaponHost for RangeHost {
    fn aim_origin(&self) -> Vec3 {
        self.origin
    }

    fn aim_forward(&self) -> Vec3 {
        self.forward
    }

    fn muzzle_position(&self) -> Vec3 {
        self.origin + Vec3::new(0.2, -0.2, -0.5)
    }

    fn raycast_forward(&mut self) -> Option<HitPoint> {
        let (id, distance) = self.along(self.origin, self.forward).into_iter().next()?;
        Some(HitPoint {
            position: self.origin + self.forward * distance,
            normal: -self.forward,
            target: Some(id),
            distance,
        })
    }

    fn spawn_projectile_visual(&mut self, spawn: &ProjectileSpawn) -> ProjectileHandle {
        self.stats.projectiles += 1;
        let handle = ProjectileHandle(self.handle());

        let direct = spawn
            .homing_target
            .and_then(|id| self.position_of(id).map(|p| (id, p.distance(spawn.origin))));
        let line = self.along(spawn.origin, spawn.direction);
        let struck: Vec<(TargetId, f32)> = match (spawn.properties, direct) {
            (_, Some(hit)) => vec![hit],
            (ProjectileProperties::Piercing { max_pierce }, None) => {
                line.into_iter().take(max_pierce.max(1) as usize).collect()
            },
            (_, None) => line.into_iter().take(1).collect(),
        };

        for (id, distance) in struck {
            let point = spawn.origin + spawn.direction * distance;
            let event = spawn.damage.at(point, -spawn.direction);
            self.resolve_damage(id, &event);

            if let ProjectileProperties::Explosive {
                blast_radius,
                edge_falloff,
            } = spawn.properties
            {
                let splashed: Vec<(TargetId, f32)> = self
                    .dummies
                    .iter()
                    .filter(|d| d.id != id && d.defenses.is_alive())
                    .map(|d| (d.id, d.position.distance(point)))
                    .filter(|(_, r)| *r <= blast_radius)
                    .collect();
                for (other, r) in splashed {
                    let falloff = 1.0 - (1.0 - edge_falloff) * (r / blast_radius);
                    let mut splash = event;
                    splash.amount *= falloff;
                    self.resolve_damage(other, &splash);
                }
            }
        }
        trace!("projectile {:?} from {}", handle, spawn.weapon);
        handle
    }

    fn spawn_effect(&mut self, effect: &str, position: Vec3) -> EffectHandle {
        self.stats.effects += 1;
        let handle = EffectHandle(self.handle());
        debug!("effect {} spawned at {:?} ({:?})", effect, position, handle);
        handle
    }

    fn resolve_damage(&mut self, target: TargetId, event: &DamageEvent) {
        let Some(dummy) = self.dummies.iter_mut().find(|d| d.id == target) else {
            return;
        };
        if !dummy.defenses.is_alive() {
            return;
        }
        let outcome = dummy.defenses.apply(event);
        self.stats.hits += 1;
        self.stats.damage_dealt += outcome.health;
        self.stats.damage_absorbed +=
            outcome.energy_shield + outcome.physical_shield + outcome.armor;
        debug!(
            "{} took {:.1} ({:?}{}), health {:.1}",
            target,
            outcome.health,
            event.projectile_type,
            if event.critical { ", critical" } else { "" },
            dummy.defenses.health
        );
        if outcome.killed {
            self.stats.kills += 1;
            info!("{} ({}) down", target, dummy.tag);
        }
    }

    fn aim_state(&self) -> AimState {
        self.aim
    }

    fn targets_in_radius(&self, tag: &str, origin: Vec3, radius: f32) -> Vec<TargetInfo> {
        self.dummies
            .iter()
            .filter(|d| d.tag == tag && d.defenses.is_alive())
            .filter(|d| d.position.distance(origin) <= radius)
            .map(|d| TargetInfo {
                id: d.id,
                position: d.position,
            })
            .collect()
    }

    fn release_weapon(&mut self, weapon: WeaponId, impulse: Vec3) {
        self.stats.drops += 1;
        info!("{} released with impulse {:?}", weapon, impulse);
    }

    fn play_sound(&mut self, clip: &str) {
        trace!("sound {}", clip);
    }

    fn despawn_effect(&mut self, handle: EffectHandle) {
        debug!("effect {:?} removed", handle);
    }

    fn ammo_readout(&mut self, text: Option<&str>) {
        if let Some(text) = text {
            debug!("ammo {}", text);
        }
        self.readout = text.map(str::to_string);
    }

    fn set_field_of_view(&mut self, fov: f32) {
        self.field_of_view = fov;
    }

    fn set_time_scale(&mut self, scale: f32) {
        if (scale - self.time_scale).abs() > f32::EPSILON {
            info!("time scale {:.2}", scale);
        }
        self.time_scale = scale;
    }
}
