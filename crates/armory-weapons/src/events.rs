//! Weapon event bus.
//!
//! Each coordinator owns a bus. Modules publish through their context while
//! the weapon ticks; HUD, audio mixers, telemetry and tests drain it.

use armory_common::WeaponId;
use crossbeam_channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

use crate::capability::DeactivationReason;
use crate::profile::FireMode;

/// Something observable that happened to a weapon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WeaponEvent {
    /// A shot left the weapon
    ShotFired {
        /// Weapon that fired
        weapon: WeaponId,
        /// Frame time of the shot
        time: f32,
        /// Mode it was fired in
        mode: FireMode,
        /// Projectiles spawned by this shot
        pellets: u32,
        /// Normalized charge (0 for non-charge shots)
        charge_level: f32,
    },
    /// Trigger pulled with nothing to fire
    DryFire {
        /// Weapon
        weapon: WeaponId,
        /// Frame time
        time: f32,
    },
    /// Reload began
    ReloadStarted {
        /// Weapon
        weapon: WeaponId,
        /// Frame time
        time: f32,
    },
    /// Reload transferred rounds into the magazine
    ReloadFinished {
        /// Weapon
        weapon: WeaponId,
        /// Frame time
        time: f32,
        /// Magazine after the reload
        magazine: u32,
        /// Reserve after the reload
        reserve: u32,
    },
    /// Reload was abandoned without refilling
    ReloadCancelled {
        /// Weapon
        weapon: WeaponId,
        /// Frame time
        time: f32,
    },
    /// Energy weapon overheated
    Overheated {
        /// Weapon
        weapon: WeaponId,
        /// Frame time
        time: f32,
    },
    /// Energy weapon recovered from an overheat
    Cooled {
        /// Weapon
        weapon: WeaponId,
        /// Frame time
        time: f32,
    },
    /// Charge hold began
    ChargeStarted {
        /// Weapon
        weapon: WeaponId,
        /// Frame time
        time: f32,
    },
    /// Charge released too early or interrupted
    ChargeAborted {
        /// Weapon
        weapon: WeaponId,
        /// Frame time
        time: f32,
    },
    /// Fire mode switched
    ModeChanged {
        /// Weapon
        weapon: WeaponId,
        /// New mode
        mode: FireMode,
    },
    /// Ability turned on
    AbilityActivated {
        /// Weapon
        weapon: WeaponId,
        /// Ability name
        ability: String,
        /// Frame time
        time: f32,
    },
    /// Ability turned off
    AbilityDeactivated {
        /// Weapon
        weapon: WeaponId,
        /// Ability name
        ability: String,
        /// Why it ended
        reason: DeactivationReason,
        /// Frame time
        time: f32,
    },
    /// Weapon became the held weapon
    Activated {
        /// Weapon
        weapon: WeaponId,
    },
    /// Weapon was put away or dropped
    Deactivated {
        /// Weapon
        weapon: WeaponId,
    },
}

impl WeaponEvent {
    /// Snake-case event name for logs and summaries.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ShotFired { .. } => "shot_fired",
            Self::DryFire { .. } => "dry_fire",
            Self::ReloadStarted { .. } => "reload_started",
            Self::ReloadFinished { .. } => "reload_finished",
            Self::ReloadCancelled { .. } => "reload_cancelled",
            Self::Overheated { .. } => "overheated",
            Self::Cooled { .. } => "cooled",
            Self::ChargeStarted { .. } => "charge_started",
            Self::ChargeAborted { .. } => "charge_aborted",
            Self::ModeChanged { .. } => "mode_changed",
            Self::AbilityActivated { .. } => "ability_activated",
            Self::AbilityDeactivated { .. } => "ability_deactivated",
            Self::Activated { .. } => "activated",
            Self::Deactivated { .. } => "deactivated",
        }
    }
}

/// Bounded event bus for one weapon.
#[derive(Debug)]
pub struct EventBus {
    /// Sender for broadcasting events
    sender: Sender<WeaponEvent>,
    /// Receiver for collecting events
    receiver: Receiver<WeaponEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventBus {
    /// Creates a new event bus with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self { sender, receiver }
    }

    /// Publishes an event to the bus.
    pub fn publish(&self, event: WeaponEvent) {
        // Non-blocking send - if full, event is dropped
        let _ = self.sender.try_send(event);
    }

    /// Drains all pending events.
    pub fn drain(&self) -> Vec<WeaponEvent> {
        self.receiver.try_iter().collect()
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_and_drain() {
        let bus = EventBus::new(4);
        let weapon = WeaponId::from_raw(7);
        bus.publish(WeaponEvent::Activated { weapon });
        bus.publish(WeaponEvent::DryFire { weapon, time: 1.0 });
        assert_eq!(bus.pending_count(), 2);

        let events = bus.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], WeaponEvent::Activated { weapon });
        assert_eq!(bus.pending_count(), 0);
    }

    #[test]
    fn test_full_bus_drops_events() {
        let bus = EventBus::new(1);
        let weapon = WeaponId::from_raw(1);
        bus.publish(WeaponEvent::Activated { weapon });
        bus.publish(WeaponEvent::Deactivated { weapon });
        assert_eq!(bus.drain(), vec![WeaponEvent::Activated { weapon }]);
    }

    #[test]
    fn test_event_kind_names() {
        let weapon = WeaponId::from_raw(3);
        assert_eq!(WeaponEvent::DryFire { weapon, time: 0.0 }.kind(), "dry_fire");
        assert_eq!(WeaponEvent::Activated { weapon }.kind(), "activated");
    }
}
