//! Carried weapons.
//!
//! [`WeaponSlotManager`] owns a fixed row of slots. One slot is active and
//! only its weapon receives input. Pickups bind the weapon's profile at once
//! but grant ammo on the following tick; a weapon that was already granted
//! ammo keeps whatever it had when it was dropped.

use std::sync::Arc;

use armory_common::{Vec3, WeaponId};
use thiserror::Error;
use tracing::{debug, info};

use crate::coordinator::ModularWeapon;
use crate::host::WeaponHost;
use crate::input::WeaponInput;
use crate::profile::WeaponProfile;

/// One weapon that can be carried, dropped and picked up again.
#[derive(Debug)]
pub struct WeaponInstance {
    tag: String,
    profile: Arc<WeaponProfile>,
    weapon: ModularWeapon,
    ammo_granted: bool,
    ammo_grant_due: bool,
}

impl WeaponInstance {
    /// Wraps an assembled weapon. Its ammo is granted on first pickup.
    #[must_use]
    pub fn new(tag: impl Into<String>, profile: Arc<WeaponProfile>, weapon: ModularWeapon) -> Self {
        Self {
            tag: tag.into(),
            profile,
            weapon,
            ammo_granted: false,
            ammo_grant_due: false,
        }
    }

    /// Identity tag.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Weapon id.
    #[must_use]
    pub const fn id(&self) -> WeaponId {
        self.weapon.id()
    }

    /// Profile bound on pickup.
    #[must_use]
    pub const fn profile(&self) -> &Arc<WeaponProfile> {
        &self.profile
    }

    /// The coordinator.
    #[must_use]
    pub const fn weapon(&self) -> &ModularWeapon {
        &self.weapon
    }

    /// Mutable coordinator.
    pub fn weapon_mut(&mut self) -> &mut ModularWeapon {
        &mut self.weapon
    }

    /// Whether the first-pickup ammo grant has happened.
    #[must_use]
    pub const fn ammo_granted(&self) -> bool {
        self.ammo_granted
    }

    fn bind(&mut self) {
        self.weapon.set_profile(Arc::clone(&self.profile));
        if !self.ammo_granted {
            self.ammo_grant_due = true;
        }
    }

    fn settle(&mut self) {
        if self.ammo_grant_due {
            self.ammo_grant_due = false;
            self.ammo_granted = true;
            if self.weapon.fill_ammo() {
                debug!("{} ({}) granted full ammo", self.id(), self.tag);
            }
        }
    }
}

/// Pickup refusal. The weapon is handed back.
#[derive(Debug, Error)]
pub enum PickupError {
    /// The slot already holds a weapon.
    #[error("slot {slot} is already occupied")]
    SlotOccupied {
        /// Requested slot
        slot: usize,
        /// The refused weapon
        weapon: Box<WeaponInstance>,
    },

    /// The slot index is out of range.
    #[error("slot {slot} does not exist ({count} slots)")]
    NoSuchSlot {
        /// Requested slot
        slot: usize,
        /// Number of slots
        count: usize,
        /// The refused weapon
        weapon: Box<WeaponInstance>,
    },
}

impl PickupError {
    /// Takes the refused weapon back.
    #[must_use]
    pub fn into_weapon(self) -> WeaponInstance {
        match self {
            Self::SlotOccupied { weapon, .. } | Self::NoSuchSlot { weapon, .. } => *weapon,
        }
    }
}

/// Fixed row of weapon slots with one active slot.
#[derive(Debug)]
pub struct WeaponSlotManager {
    slots: Vec<Option<WeaponInstance>>,
    active: usize,
    drop_force: f32,
}

impl WeaponSlotManager {
    /// Default forward impulse for dropped weapons.
    pub const DEFAULT_DROP_FORCE: f32 = 4.0;

    /// Creates `slot_count` empty slots (at least one) with slot 0 active.
    #[must_use]
    pub fn new(slot_count: usize) -> Self {
        Self {
            slots: std::iter::repeat_with(|| None).take(slot_count.max(1)).collect(),
            active: 0,
            drop_force: Self::DEFAULT_DROP_FORCE,
        }
    }

    /// Set drop impulse strength.
    #[must_use]
    pub fn with_drop_force(mut self, force: f32) -> Self {
        self.drop_force = force;
        self
    }

    /// Number of slots.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Index of the active slot.
    #[must_use]
    pub const fn active_slot(&self) -> usize {
        self.active
    }

    /// Weapon in `slot`.
    #[must_use]
    pub fn get(&self, slot: usize) -> Option<&WeaponInstance> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    /// Mutable weapon in `slot`.
    pub fn get_mut(&mut self, slot: usize) -> Option<&mut WeaponInstance> {
        self.slots.get_mut(slot).and_then(Option::as_mut)
    }

    /// The held weapon.
    #[must_use]
    pub fn active_weapon(&self) -> Option<&WeaponInstance> {
        self.get(self.active)
    }

    /// The held weapon, mutably.
    pub fn active_weapon_mut(&mut self) -> Option<&mut WeaponInstance> {
        self.get_mut(self.active)
    }

    /// Whether `slot` holds a weapon.
    #[must_use]
    pub fn is_occupied(&self, slot: usize) -> bool {
        self.get(slot).is_some()
    }

    /// Makes `slot` active. Returns false for the current or a missing slot.
    pub fn switch_to(&mut self, slot: usize, host: &mut dyn WeaponHost, now: f32) -> bool {
        if slot >= self.slots.len() || slot == self.active {
            return false;
        }
        if let Some(previous) = self.active_weapon_mut() {
            previous.weapon.deactivate(host, now);
        }
        host.ammo_readout(None);
        self.active = slot;
        if let Some(next) = self.active_weapon_mut() {
            next.weapon.activate(host, now);
        }
        debug!("switched to slot {}", slot);
        true
    }

    /// Puts `weapon` into `slot` and makes it the held weapon.
    pub fn pickup(
        &mut self,
        mut weapon: WeaponInstance,
        slot: usize,
        host: &mut dyn WeaponHost,
        now: f32,
    ) -> Result<(), PickupError> {
        let count = self.slots.len();
        let Some(target) = self.slots.get_mut(slot) else {
            return Err(PickupError::NoSuchSlot {
                slot,
                count,
                weapon: Box::new(weapon),
            });
        };
        if target.is_some() {
            return Err(PickupError::SlotOccupied {
                slot,
                weapon: Box::new(weapon),
            });
        }

        weapon.bind();
        info!("picked up {} ({}) into slot {}", weapon.tag, weapon.id(), slot);
        *target = Some(weapon);

        if slot == self.active {
            if let Some(held) = self.active_weapon_mut() {
                held.weapon.activate(host, now);
            }
        } else {
            self.switch_to(slot, host, now);
        }
        Ok(())
    }

    /// Removes the weapon in `slot` and hands it to the world.
    pub fn drop_weapon(
        &mut self,
        slot: usize,
        host: &mut dyn WeaponHost,
        now: f32,
    ) -> Option<WeaponInstance> {
        let mut dropped = self.slots.get_mut(slot)?.take()?;
        dropped.weapon.deactivate(host, now);
        if slot == self.active {
            host.ammo_readout(None);
        }
        let impulse = host.aim_forward() * self.drop_force + Vec3::Y * (self.drop_force * 0.5);
        host.release_weapon(dropped.id(), impulse);
        info!("dropped {} ({}) from slot {}", dropped.tag, dropped.id(), slot);
        Some(dropped)
    }

    /// Drops the held weapon.
    pub fn drop_active(&mut self, host: &mut dyn WeaponHost, now: f32) -> Option<WeaponInstance> {
        self.drop_weapon(self.active, host, now)
    }

    /// Settles pending ammo grants, then ticks the held weapon. Returns the
    /// number of shots fired.
    pub fn update(
        &mut self,
        input: &WeaponInput,
        host: &mut dyn WeaponHost,
        now: f32,
        dt: f32,
    ) -> u32 {
        for instance in self.slots.iter_mut().flatten() {
            instance.settle();
        }
        match self.active_weapon_mut() {
            Some(held) => held.weapon.update(input, host, now, dt),
            None => 0,
        }
    }
}
