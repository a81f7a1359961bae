//! Ammo modules.
//!
//! - [`StandardAmmo`]: magazine plus reserve with timed reloads
//! - [`EnergyAmmo`]: regenerating pool that locks out when overheated
//! - [`InfiniteAmmo`]: never runs dry

use armory_common::ModuleId;
use tracing::debug;

use crate::capability::{AmmoModule, ModuleContext, WeaponModule};
use crate::events::WeaponEvent;
use crate::host::{animations, clips};
use crate::profile::WeaponProfile;
use crate::sequence::SequenceSlot;

/// Magazine and reserve with a timed reload.
///
/// A reload that is cancelled, whether explicitly or because the weapon was
/// put away, refunds nothing and transfers nothing.
#[derive(Debug, Clone)]
pub struct StandardAmmo {
    id: ModuleId,
    magazine: u32,
    reserve: u32,
    capacity: u32,
    reload_time: f32,
    reload: SequenceSlot,
}

impl Default for StandardAmmo {
    fn default() -> Self {
        Self::new()
    }
}

impl StandardAmmo {
    /// Creates an empty module. Capacity arrives with the profile.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: ModuleId::next(),
            magazine: 0,
            reserve: 0,
            capacity: 0,
            reload_time: 0.0,
            reload: SequenceSlot::new(),
        }
    }

    /// Creates a module initialized and filled from `profile`.
    #[must_use]
    pub fn from_profile(profile: &WeaponProfile) -> Self {
        let mut ammo = Self::new();
        ammo.initialize(profile);
        ammo.fill(profile);
        ammo
    }

    /// Rounds in the magazine.
    #[must_use]
    pub const fn magazine(&self) -> u32 {
        self.magazine
    }

    /// Rounds in reserve.
    #[must_use]
    pub const fn reserve(&self) -> u32 {
        self.reserve
    }

    /// Magazine capacity.
    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Reload progress in `[0, 1]` while reloading.
    #[must_use]
    pub fn reload_progress(&self, now: f32) -> Option<f32> {
        self.reload.progress(now)
    }

    fn finish_reload(&mut self, ctx: &mut ModuleContext<'_>) {
        let transfer = (self.capacity - self.magazine).min(self.reserve);
        self.magazine += transfer;
        self.reserve -= transfer;
        debug!(
            "{} reloaded {} rounds ({} / {})",
            ctx.weapon, transfer, self.magazine, self.reserve
        );
        ctx.publish(WeaponEvent::ReloadFinished {
            weapon: ctx.weapon,
            time: ctx.now,
            magazine: self.magazine,
            reserve: self.reserve,
        });
    }
}

impl WeaponModule for StandardAmmo {
    fn module_id(&self) -> ModuleId {
        self.id
    }

    fn label(&self) -> &'static str {
        "standard_ammo"
    }

    fn initialize(&mut self, profile: &WeaponProfile) {
        self.capacity = profile.magazine_capacity;
        self.reload_time = profile.reload_time;
        self.magazine = self.magazine.min(self.capacity);
    }

    fn on_deactivated(&mut self, ctx: &mut ModuleContext<'_>) {
        if self.cancel_reload() {
            debug!("{} reload cancelled on deactivation", ctx.weapon);
            ctx.publish(WeaponEvent::ReloadCancelled {
                weapon: ctx.weapon,
                time: ctx.now,
            });
        }
    }

    fn on_update(&mut self, ctx: &mut ModuleContext<'_>) {
        if self.reload.take_if_complete(ctx.now).is_some() {
            self.finish_reload(ctx);
        }
    }
}

impl AmmoModule for StandardAmmo {
    fn current_ammo(&self) -> u32 {
        self.magazine
    }

    fn total_ammo(&self) -> u32 {
        self.reserve
    }

    fn consume(&mut self, amount: u32, _now: f32) -> bool {
        if self.reload.is_running() || self.magazine < amount {
            return false;
        }
        self.magazine -= amount;
        true
    }

    fn can_reload(&self) -> bool {
        !self.reload.is_running() && self.magazine < self.capacity && self.reserve > 0
    }

    fn reload(&mut self, ctx: &mut ModuleContext<'_>) -> bool {
        if !self.can_reload() {
            return false;
        }
        self.reload.start(ctx.now, self.reload_time);
        debug!("{} reloading for {:.2}s", ctx.weapon, self.reload_time);
        ctx.host.play_sound(clips::RELOAD);
        ctx.host.trigger_animation(animations::RELOAD);
        ctx.publish(WeaponEvent::ReloadStarted {
            weapon: ctx.weapon,
            time: ctx.now,
        });
        true
    }

    fn cancel_reload(&mut self) -> bool {
        self.reload.cancel()
    }

    fn is_reloading(&self) -> bool {
        self.reload.is_running()
    }

    fn add_ammo(&mut self, amount: u32) {
        self.reserve = self.reserve.saturating_add(amount);
    }

    fn fill(&mut self, profile: &WeaponProfile) {
        self.reload.cancel();
        self.capacity = profile.magazine_capacity;
        self.magazine = profile.magazine_capacity;
        self.reserve = profile.total_ammo;
    }

    fn readout(&self) -> String {
        if self.reload.is_running() {
            "RELOADING".to_string()
        } else {
            format!("{} / {}", self.magazine, self.reserve)
        }
    }
}

/// Regenerating energy pool.
///
/// Spending energy down to `capacity - overheat_threshold` locks the pool for
/// the overheat cooldown, after which it resumes at a fraction of capacity.
#[derive(Debug, Clone)]
pub struct EnergyAmmo {
    id: ModuleId,
    energy: f32,
    capacity: f32,
    overheat_threshold: f32,
    regen_rate: f32,
    overheat_cooldown: f32,
    resume_fraction: f32,
    overheat: SequenceSlot,
    overheat_pending: bool,
}

impl Default for EnergyAmmo {
    fn default() -> Self {
        Self::new()
    }
}

impl EnergyAmmo {
    /// Creates an empty pool. Tuning arrives with the profile.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: ModuleId::next(),
            energy: 0.0,
            capacity: 0.0,
            overheat_threshold: 0.0,
            regen_rate: 0.0,
            overheat_cooldown: 0.0,
            resume_fraction: 0.0,
            overheat: SequenceSlot::new(),
            overheat_pending: false,
        }
    }

    /// Creates a pool initialized and filled from `profile`.
    #[must_use]
    pub fn from_profile(profile: &WeaponProfile) -> Self {
        let mut ammo = Self::new();
        ammo.initialize(profile);
        ammo.fill(profile);
        ammo
    }

    /// Exact energy level.
    #[must_use]
    pub const fn energy(&self) -> f32 {
        self.energy
    }

    /// Pool capacity.
    #[must_use]
    pub const fn capacity(&self) -> f32 {
        self.capacity
    }

    fn overheat_floor(&self) -> Option<f32> {
        (self.overheat_threshold > 0.0).then(|| self.capacity - self.overheat_threshold)
    }
}

impl WeaponModule for EnergyAmmo {
    fn module_id(&self) -> ModuleId {
        self.id
    }

    fn label(&self) -> &'static str {
        "energy_ammo"
    }

    fn initialize(&mut self, profile: &WeaponProfile) {
        self.capacity = profile.magazine_capacity as f32;
        self.overheat_threshold = profile.overheat_threshold;
        self.regen_rate = profile.energy.regen_rate;
        self.overheat_cooldown = profile.energy.overheat_cooldown;
        self.resume_fraction = profile.energy.resume_fraction;
        self.energy = self.energy.min(self.capacity);
    }

    fn on_update(&mut self, ctx: &mut ModuleContext<'_>) {
        if self.overheat_pending {
            self.overheat_pending = false;
            debug!("{} overheated at {:.1} energy", ctx.weapon, self.energy);
            ctx.host.play_sound(clips::OVERHEAT);
            ctx.publish(WeaponEvent::Overheated {
                weapon: ctx.weapon,
                time: ctx.now,
            });
        }

        if self.overheat.take_if_complete(ctx.now).is_some() {
            self.energy = self.capacity * self.resume_fraction;
            debug!("{} cooled, resuming at {:.1}", ctx.weapon, self.energy);
            ctx.publish(WeaponEvent::Cooled {
                weapon: ctx.weapon,
                time: ctx.now,
            });
        } else if !self.overheat.is_running() && self.energy < self.capacity {
            self.energy = (self.energy + self.regen_rate * ctx.dt).min(self.capacity);
        }
    }
}

impl AmmoModule for EnergyAmmo {
    fn current_ammo(&self) -> u32 {
        self.energy.max(0.0).floor() as u32
    }

    fn total_ammo(&self) -> u32 {
        self.capacity as u32
    }

    fn consume(&mut self, amount: u32, now: f32) -> bool {
        let amount = amount as f32;
        if self.overheat.is_running() || self.energy < amount {
            return false;
        }
        self.energy -= amount;
        if self.overheat_floor().is_some_and(|floor| self.energy <= floor) {
            self.overheat.start(now, self.overheat_cooldown);
            self.overheat_pending = true;
        }
        true
    }

    fn can_reload(&self) -> bool {
        false
    }

    fn reload(&mut self, _ctx: &mut ModuleContext<'_>) -> bool {
        false
    }

    fn cancel_reload(&mut self) -> bool {
        false
    }

    fn is_reloading(&self) -> bool {
        false
    }

    fn is_overheated(&self) -> bool {
        self.overheat.is_running()
    }

    fn add_ammo(&mut self, amount: u32) {
        self.energy = (self.energy + amount as f32).min(self.capacity);
    }

    fn fill(&mut self, profile: &WeaponProfile) {
        self.capacity = profile.magazine_capacity as f32;
        self.energy = self.capacity;
        self.overheat.cancel();
        self.overheat_pending = false;
    }

    fn readout(&self) -> String {
        if self.overheat.is_running() {
            return "OVERHEAT".to_string();
        }
        let percent = if self.capacity > 0.0 {
            (self.energy / self.capacity * 100.0).round()
        } else {
            0.0
        };
        format!("{percent}%")
    }
}

/// Ammo that never runs out.
#[derive(Debug, Clone)]
pub struct InfiniteAmmo {
    id: ModuleId,
}

impl Default for InfiniteAmmo {
    fn default() -> Self {
        Self::new()
    }
}

impl InfiniteAmmo {
    /// Count reported for display purposes.
    pub const DISPLAY_AMMO: u32 = 999;

    /// Creates the module.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: ModuleId::next(),
        }
    }
}

impl WeaponModule for InfiniteAmmo {
    fn module_id(&self) -> ModuleId {
        self.id
    }

    fn label(&self) -> &'static str {
        "infinite_ammo"
    }
}

impl AmmoModule for InfiniteAmmo {
    fn current_ammo(&self) -> u32 {
        Self::DISPLAY_AMMO
    }

    fn total_ammo(&self) -> u32 {
        Self::DISPLAY_AMMO
    }

    fn consume(&mut self, _amount: u32, _now: f32) -> bool {
        true
    }

    fn can_reload(&self) -> bool {
        false
    }

    fn reload(&mut self, _ctx: &mut ModuleContext<'_>) -> bool {
        true
    }

    fn cancel_reload(&mut self) -> bool {
        false
    }

    fn is_reloading(&self) -> bool {
        false
    }

    fn add_ammo(&mut self, _amount: u32) {}

    fn fill(&mut self, _profile: &WeaponProfile) {}

    fn has_ammo(&self, _amount: u32) -> bool {
        true
    }

    fn readout(&self) -> String {
        "∞".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::testing::Harness;
    use crate::profile::EnergySettings;

    fn rifle() -> WeaponProfile {
        WeaponProfile::named("rifle")
            .with_ammo(30, 120)
            .with_reload_time(2.0)
    }

    #[test]
    fn test_consume_fails_without_side_effect() {
        let mut ammo = StandardAmmo::from_profile(&rifle().with_ammo(2, 0));
        assert!(ammo.consume(2, 0.0));
        assert!(!ammo.consume(1, 0.0));
        assert_eq!(ammo.magazine(), 0);
        assert_eq!(ammo.reserve(), 0);
    }

    #[test]
    fn test_reload_transfers_after_reload_time() {
        let mut harness = Harness::new(rifle());
        let mut ammo = StandardAmmo::from_profile(&harness.profile);
        assert!(ammo.consume(10, 0.0));

        assert!(ammo.reload(&mut harness.ctx(1.0, 0.0)));
        assert!(ammo.is_reloading());
        assert!(!ammo.consume(1, 1.5));
        assert_eq!(ammo.readout(), "RELOADING");

        ammo.on_update(&mut harness.ctx(2.5, 0.5));
        assert!(ammo.is_reloading());

        ammo.on_update(&mut harness.ctx(3.0, 0.5));
        assert!(!ammo.is_reloading());
        assert_eq!(ammo.magazine(), 30);
        assert_eq!(ammo.reserve(), 110);
        assert_eq!(harness.host.sound_count(clips::RELOAD), 1);
        assert_eq!(ammo.readout(), "30 / 110");
    }

    #[test]
    fn test_reload_refused_when_full_or_no_reserve() {
        let mut harness = Harness::new(rifle());
        let mut full = StandardAmmo::from_profile(&harness.profile);
        assert!(!full.can_reload());
        assert!(!full.reload(&mut harness.ctx(0.0, 0.0)));

        let mut dry = StandardAmmo::from_profile(&rifle().with_ammo(30, 0));
        assert!(dry.consume(5, 0.0));
        assert!(!dry.reload(&mut harness.ctx(0.0, 0.0)));
        assert!(harness.events.drain().is_empty());
    }

    #[test]
    fn test_partial_reserve_transfer() {
        let mut harness = Harness::new(rifle().with_ammo(30, 4));
        let mut ammo = StandardAmmo::from_profile(&harness.profile);
        assert!(ammo.consume(10, 0.0));
        assert!(ammo.reload(&mut harness.ctx(0.0, 0.0)));
        ammo.on_update(&mut harness.ctx(2.0, 2.0));
        assert_eq!(ammo.magazine(), 24);
        assert_eq!(ammo.reserve(), 0);
    }

    #[test]
    fn test_deactivation_cancels_reload_without_refill() {
        let mut harness = Harness::new(rifle());
        let mut ammo = StandardAmmo::from_profile(&harness.profile);
        assert!(ammo.consume(30, 0.0));
        assert!(ammo.reload(&mut harness.ctx(0.0, 0.0)));

        ammo.on_deactivated(&mut harness.ctx(1.0, 0.0));
        assert!(!ammo.is_reloading());
        assert_eq!(ammo.magazine(), 0);
        assert_eq!(ammo.reserve(), 120);
        assert!(harness
            .events
            .drain()
            .iter()
            .any(|e| matches!(e, WeaponEvent::ReloadCancelled { .. })));
    }

    #[test]
    fn test_initialize_is_idempotent_and_keeps_rounds() {
        let profile = rifle();
        let mut ammo = StandardAmmo::from_profile(&profile);
        assert!(ammo.consume(7, 0.0));
        ammo.initialize(&profile);
        ammo.initialize(&profile);
        assert_eq!(ammo.magazine(), 23);

        ammo.initialize(&rifle().with_ammo(10, 0));
        assert_eq!(ammo.magazine(), 10);
    }

    fn plasma() -> WeaponProfile {
        WeaponProfile::named("plasma")
            .with_ammo(100, 0)
            .with_overheat_threshold(80.0)
            .with_energy(EnergySettings {
                regen_rate: 4.0,
                overheat_cooldown: 2.0,
                resume_fraction: 0.3,
            })
    }

    #[test]
    fn test_energy_overheats_and_resumes() {
        let mut harness = Harness::new(plasma());
        let mut ammo = EnergyAmmo::from_profile(&harness.profile);

        assert!(ammo.consume(79, 0.0));
        assert!(!ammo.is_overheated());
        assert!(ammo.consume(1, 0.0));
        assert!(ammo.is_overheated());
        assert!(!ammo.consume(1, 0.5));
        assert_eq!(ammo.readout(), "OVERHEAT");

        ammo.on_update(&mut harness.ctx(1.0, 1.0));
        assert!(ammo.is_overheated());
        assert!((ammo.energy() - 20.0).abs() < f32::EPSILON);

        ammo.on_update(&mut harness.ctx(2.0, 1.0));
        assert!(!ammo.is_overheated());
        assert!((ammo.energy() - 30.0).abs() < 1e-4);

        let events = harness.events.drain();
        assert!(matches!(events[0], WeaponEvent::Overheated { .. }));
        assert!(matches!(events[1], WeaponEvent::Cooled { .. }));
    }

    #[test]
    fn test_energy_regenerates_to_capacity() {
        let mut harness = Harness::new(plasma());
        let mut ammo = EnergyAmmo::from_profile(&harness.profile);
        assert!(ammo.consume(10, 0.0));

        ammo.on_update(&mut harness.ctx(1.0, 1.0));
        assert!((ammo.energy() - 94.0).abs() < f32::EPSILON);

        ammo.on_update(&mut harness.ctx(3.0, 2.0));
        assert!((ammo.energy() - 100.0).abs() < f32::EPSILON);
        assert_eq!(ammo.readout(), "100%");
    }

    #[test]
    fn test_energy_without_threshold_never_overheats() {
        let mut ammo = EnergyAmmo::from_profile(&plasma().with_overheat_threshold(0.0));
        assert!(ammo.consume(100, 0.0));
        assert!(!ammo.is_overheated());
        assert!(!ammo.consume(1, 0.0));
    }

    #[test]
    fn test_infinite_ammo() {
        let mut harness = Harness::new(WeaponProfile::default());
        let mut ammo = InfiniteAmmo::new();
        for _ in 0..10_000 {
            assert!(ammo.consume(1, 0.0));
        }
        assert_eq!(ammo.current_ammo(), InfiniteAmmo::DISPLAY_AMMO);
        assert!(ammo.reload(&mut harness.ctx(0.0, 0.0)));
        assert!(!ammo.is_reloading());
        assert_eq!(ammo.readout(), "∞");
    }
}
