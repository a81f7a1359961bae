//! Scripted scenarios.
//!
//! A scenario is a loadout, a range of dummies and a list of timed input
//! cues. It runs at a fixed tick rate and reports a [`SimSummary`].

use std::collections::BTreeMap;

use anyhow::{anyhow, Context, Result};
use armory_common::TargetId;
use armory_weapons::{
    Defenses, FireMode, ProfileRegistry, WeaponAction, WeaponInput, WeaponInstance,
    WeaponSlotManager,
};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::SimConfig;
use crate::host::{Dummy, RangeHost, RangeStats};

/// One scripted input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Cue {
    /// Hold an action down.
    Press {
        /// Action to hold
        action: WeaponAction,
    },
    /// Let go of an action.
    Release {
        /// Action to release
        action: WeaponAction,
    },
    /// Press an action for a single tick.
    Tap {
        /// Action to tap
        action: WeaponAction,
    },
    /// Aim down sights or stop aiming.
    Aim {
        /// Whether to aim
        on: bool,
    },
    /// Turn the camera.
    Look {
        /// New forward direction
        direction: Vec3,
    },
    /// Switch to a slot.
    Switch {
        /// Slot index
        slot: usize,
    },
    /// Drop the held weapon.
    Drop,
    /// Pick the last dropped weapon back up.
    Pickup {
        /// Slot to put it in
        slot: usize,
    },
}

/// A cue and when it happens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptStep {
    /// Seconds from the start.
    pub at: f32,
    /// What happens.
    pub cue: Cue,
}

impl ScriptStep {
    /// Creates a step.
    #[must_use]
    pub const fn new(at: f32, cue: Cue) -> Self {
        Self { at, cue }
    }
}

/// Script for the default three-slot loadout.
#[must_use]
pub fn default_script() -> Vec<ScriptStep> {
    use WeaponAction::{AbilityPrimary, AbilitySecondary, CycleMode, Fire, Reload};
    let press = |action| Cue::Press { action };
    let release = |action| Cue::Release { action };
    let tap = |action| Cue::Tap { action };

    vec![
        ScriptStep::new(0.25, press(Fire)),
        ScriptStep::new(1.5, release(Fire)),
        ScriptStep::new(1.75, tap(Reload)),
        ScriptStep::new(4.0, tap(AbilitySecondary)),
        ScriptStep::new(4.25, press(Fire)),
        ScriptStep::new(5.0, release(Fire)),
        ScriptStep::new(5.25, tap(CycleMode)),
        ScriptStep::new(5.5, tap(Fire)),
        ScriptStep::new(6.0, Cue::Switch { slot: 1 }),
        ScriptStep::new(6.5, tap(Fire)),
        ScriptStep::new(7.5, tap(Fire)),
        ScriptStep::new(8.0, Cue::Switch { slot: 2 }),
        ScriptStep::new(8.25, Cue::Aim { on: true }),
        ScriptStep::new(8.5, tap(AbilityPrimary)),
        ScriptStep::new(8.75, press(Fire)),
        ScriptStep::new(10.0, release(Fire)),
        ScriptStep::new(10.25, Cue::Aim { on: false }),
        ScriptStep::new(10.5, Cue::Drop),
        ScriptStep::new(11.0, Cue::Pickup { slot: 2 }),
        ScriptStep::new(11.25, tap(Fire)),
    ]
}

/// One occupied slot at the end of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotSummary {
    /// Slot index
    pub slot: usize,
    /// Weapon tag
    pub tag: String,
    /// Preset name
    pub preset: String,
    /// Rounds or energy in the weapon
    pub ammo: u32,
    /// Reserve or capacity
    pub reserve: u32,
    /// Selected fire mode
    pub mode: Option<FireMode>,
}

/// One dummy at the end of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetSummary {
    /// Target id
    pub id: u64,
    /// Tag
    pub tag: String,
    /// Health left
    pub health: f32,
}

/// Result of a scenario run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimSummary {
    /// Ticks simulated
    pub ticks: u32,
    /// Simulated seconds
    pub duration: f32,
    /// Shots fired
    pub shots: u32,
    /// Range totals
    pub range: RangeStats,
    /// Dummies still standing
    pub targets_standing: usize,
    /// Final dummy state
    pub targets: Vec<TargetSummary>,
    /// Weapon events by kind
    pub events: BTreeMap<String, u32>,
    /// Last ammo readout
    pub readout: Option<String>,
    /// Time scale at the end of the run
    pub time_scale: f32,
    /// Field of view at the end of the run
    pub field_of_view: f32,
    /// Held slot at the end of the run
    pub active_slot: usize,
    /// Carried weapons
    pub loadout: Vec<SlotSummary>,
    /// Tags of weapons left on the ground
    pub on_ground: Vec<String>,
}

/// A loadout on a target range, driven by a script.
#[derive(Debug)]
pub struct Scenario {
    config: SimConfig,
    slots: WeaponSlotManager,
    host: RangeHost,
    input: WeaponInput,
    script: Vec<ScriptStep>,
    cursor: usize,
    taps: Vec<WeaponAction>,
    ground: Vec<WeaponInstance>,
    events: BTreeMap<String, u32>,
    shots: u32,
    tick: u32,
}

impl Scenario {
    /// Loads presets, builds the loadout and places the dummies.
    pub fn new(config: SimConfig) -> Result<Self> {
        let mut registry =
            ProfileRegistry::with_builtins().context("registering built-in presets")?;
        registry
            .load_dir(&config.preset_dir)
            .with_context(|| format!("loading presets from {}", config.preset_dir.display()))?;
        info!("{} presets available", registry.len());

        let dummies = config
            .targets
            .iter()
            .zip(1u64..)
            .map(|(target, id)| Dummy {
                id: TargetId::new(id),
                tag: target.tag.clone(),
                position: target.position,
                defenses: Defenses {
                    energy_shield: target.energy_shield,
                    physical_shield: target.physical_shield,
                    armor: target.armor,
                    health: target.health,
                },
            })
            .collect();
        let mut host = RangeHost::new(dummies);

        let mut slots = WeaponSlotManager::new(config.slot_count);
        for (slot, blueprint) in config.blueprints.iter().enumerate() {
            let mut blueprint = blueprint.clone();
            if blueprint.seed.is_none() {
                blueprint.seed = Some(config.seed.wrapping_add(slot as u64));
            }
            let instance = blueprint
                .build(&registry)
                .with_context(|| format!("building blueprint {}", blueprint.tag))?;
            slots
                .pickup(instance, slot, &mut host, 0.0)
                .map_err(|e| anyhow!("loading slot {slot}: {e}"))?;
        }
        slots.switch_to(0, &mut host, 0.0);

        let mut script = if config.script.is_empty() {
            default_script()
        } else {
            config.script.clone()
        };
        script.sort_by(|a, b| a.at.total_cmp(&b.at));

        Ok(Self {
            config,
            slots,
            host,
            input: WeaponInput::new(),
            script,
            cursor: 0,
            taps: Vec::new(),
            ground: Vec::new(),
            events: BTreeMap::new(),
            shots: 0,
            tick: 0,
        })
    }

    /// Runs every tick and returns the summary.
    pub fn run(&mut self) -> SimSummary {
        let dt = self.config.dt();
        let total = self.config.total_ticks();
        info!(
            "Running {} ticks at {} Hz with {} cues",
            total,
            self.config.tick_rate,
            self.script.len()
        );
        for _ in 0..total {
            self.step(dt);
        }
        let summary = self.summary();
        info!(
            "Scenario finished: {} shots, {} hits, {} kills",
            summary.shots, summary.range.hits, summary.range.kills
        );
        summary
    }

    fn step(&mut self, dt: f32) {
        let now = self.tick as f32 * dt;
        for action in std::mem::take(&mut self.taps) {
            self.input.release(action);
        }
        while let Some(step) = self.script.get(self.cursor) {
            if step.at > now {
                break;
            }
            let cue = step.cue.clone();
            self.cursor += 1;
            self.apply(cue, now);
        }

        self.shots += self.slots.update(&self.input, &mut self.host, now, dt);
        self.input.end_frame();
        self.collect_events();
        self.tick += 1;
    }

    fn apply(&mut self, cue: Cue, now: f32) {
        debug!("{:.3}s cue {:?}", now, cue);
        match cue {
            Cue::Press { action } => self.input.press(action),
            Cue::Release { action } => self.input.release(action),
            Cue::Tap { action } => {
                self.input.press(action);
                self.taps.push(action);
            },
            Cue::Aim { on } => {
                let accuracy = self
                    .slots
                    .active_weapon()
                    .map_or(1.0, |held| held.profile().aim.accuracy_multiplier);
                self.host.set_aiming(on, accuracy);
            },
            Cue::Look { direction } => self.host.look(direction),
            Cue::Switch { slot } => {
                if !self.slots.switch_to(slot, &mut self.host, now) {
                    warn!("cannot switch to slot {}", slot);
                }
            },
            Cue::Drop => match self.slots.drop_active(&mut self.host, now) {
                Some(weapon) => self.ground.push(weapon),
                None => warn!("nothing to drop"),
            },
            Cue::Pickup { slot } => {
                let Some(weapon) = self.ground.pop() else {
                    warn!("nothing to pick up");
                    return;
                };
                if let Err(e) = self.slots.pickup(weapon, slot, &mut self.host, now) {
                    warn!("pickup refused: {}", e);
                    self.ground.push(e.into_weapon());
                }
            },
        }
    }

    fn collect_events(&mut self) {
        let carried = (0..self.slots.slot_count()).filter_map(|slot| self.slots.get(slot));
        for instance in carried.chain(self.ground.iter()) {
            for event in instance.weapon().drain_events() {
                debug!("{} {:?}", instance.tag(), event);
                *self.events.entry(event.kind().to_string()).or_default() += 1;
            }
        }
    }

    /// Summary of the run so far.
    #[must_use]
    pub fn summary(&self) -> SimSummary {
        let loadout = (0..self.slots.slot_count())
            .filter_map(|slot| self.slots.get(slot).map(|instance| (slot, instance)))
            .map(|(slot, instance)| {
                let weapon = instance.weapon();
                let (ammo, reserve) = weapon
                    .ammo()
                    .map_or((0, 0), |a| (a.current_ammo(), a.total_ammo()));
                SlotSummary {
                    slot,
                    tag: instance.tag().to_string(),
                    preset: instance.profile().name.clone(),
                    ammo,
                    reserve,
                    mode: weapon.fire_control().and_then(|f| f.current_mode()),
                }
            })
            .collect();

        SimSummary {
            ticks: self.tick,
            duration: self.tick as f32 * self.config.dt(),
            shots: self.shots,
            range: self.host.stats(),
            targets_standing: self.host.standing(),
            targets: self
                .host
                .dummies()
                .iter()
                .map(|d| TargetSummary {
                    id: d.id.raw(),
                    tag: d.tag.clone(),
                    health: d.defenses.health,
                })
                .collect(),
            events: self.events.clone(),
            readout: self.host.readout().map(str::to_string),
            time_scale: self.host.time_scale(),
            field_of_view: self.host.field_of_view(),
            active_slot: self.slots.active_slot(),
            loadout,
            on_ground: self.ground.iter().map(|w| w.tag().to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TargetConfig;
    use armory_weapons::WeaponBlueprint;
    use std::path::PathBuf;

    fn quiet(mut config: SimConfig) -> SimConfig {
        config.preset_dir = PathBuf::from("/nonexistent/presets");
        config
    }

    fn count(summary: &SimSummary, kind: &str) -> u32 {
        summary.events.get(kind).copied().unwrap_or(0)
    }

    #[test]
    fn test_default_scenario_runs() {
        let mut scenario = Scenario::new(quiet(SimConfig::default())).expect("scenario");
        let summary = scenario.run();

        assert_eq!(summary.ticks, 768);
        assert!(summary.shots > 0);
        assert_eq!(count(&summary, "shot_fired"), summary.shots);
        assert!(summary.range.hits > 0);
        assert!(count(&summary, "reload_started") >= 1);
        assert!(count(&summary, "ability_activated") >= 1);
        assert!(summary.on_ground.is_empty());
        assert_eq!(summary.loadout.len(), 3);
        assert_eq!(summary.active_slot, 2);
        assert_eq!(summary.range.drops, 1);
    }

    #[test]
    fn test_custom_script_and_loadout() {
        let mut config = quiet(SimConfig::default());
        config.duration = 0.5;
        config.blueprints = vec![WeaponBlueprint::new("sidearm", "pistol")];
        config.targets = vec![TargetConfig {
            health: 1000.0,
            ..TargetConfig::default()
        }];
        config.script = vec![ScriptStep::new(0.0, Cue::Tap { action: WeaponAction::Fire })];

        let summary = Scenario::new(config).expect("scenario").run();
        assert_eq!(summary.shots, 1);
        assert_eq!(summary.loadout[0].ammo, 11);
        assert_eq!(summary.loadout[0].reserve, 48);
        assert_eq!(summary.range.hits, 1);
        assert_eq!(summary.readout.as_deref(), Some("11 / 48"));
    }

    #[test]
    fn test_refused_pickup_stays_on_ground() {
        let mut config = quiet(SimConfig::default());
        config.duration = 1.0;
        config.blueprints.truncate(2);
        config.script = vec![
            ScriptStep::new(0.1, Cue::Drop),
            ScriptStep::new(0.2, Cue::Switch { slot: 1 }),
            ScriptStep::new(0.3, Cue::Pickup { slot: 1 }),
        ];

        let summary = Scenario::new(config).expect("scenario").run();
        assert_eq!(summary.on_ground, vec!["rifle".to_string()]);
        assert_eq!(summary.loadout.len(), 1);
        assert_eq!(summary.active_slot, 1);
    }

    #[test]
    fn test_unknown_preset_fails_setup() {
        let mut config = quiet(SimConfig::default());
        config.blueprints = vec![WeaponBlueprint::new("mystery", "railgun")];
        assert!(Scenario::new(config).is_err());
    }
}
