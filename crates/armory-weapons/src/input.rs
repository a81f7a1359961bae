//! Weapon input state.
//!
//! The host translates its device bindings into [`WeaponAction`] presses once
//! per frame; the coordinator only ever sees pressed/just-pressed edges.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// State of a button (pressed, just pressed, released).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonState {
    /// Whether the button is currently held down
    pub pressed: bool,
    /// Whether the button was just pressed this frame
    pub just_pressed: bool,
    /// Whether the button was just released this frame
    pub just_released: bool,
}

impl ButtonState {
    /// Create a new button state (not pressed).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pressed: false,
            just_pressed: false,
            just_released: false,
        }
    }

    /// Update the button state based on whether it's currently pressed.
    pub fn update(&mut self, is_pressed: bool) {
        self.just_pressed = is_pressed && !self.pressed;
        self.just_released = !is_pressed && self.pressed;
        self.pressed = is_pressed;
    }

    /// Clear the frame-specific state (just_pressed, just_released).
    pub fn clear_frame(&mut self) {
        self.just_pressed = false;
        self.just_released = false;
    }
}

/// Weapon actions a host can bind to devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponAction {
    /// Primary trigger
    Fire,
    /// Start a reload
    Reload,
    /// Cycle to the next fire mode
    CycleMode,
    /// First ability binding
    AbilityPrimary,
    /// Second ability binding
    AbilitySecondary,
    /// Third ability binding
    AbilityUtility,
}

/// Trigger edges handed to fire control each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TriggerState {
    /// Trigger is held
    pub pressed: bool,
    /// Trigger went down this frame
    pub just_pressed: bool,
}

impl TriggerState {
    /// Trigger released and idle.
    pub const RELEASED: Self = Self {
        pressed: false,
        just_pressed: false,
    };

    /// Trigger pressed this frame.
    pub const PULLED: Self = Self {
        pressed: true,
        just_pressed: true,
    };

    /// Trigger held from a previous frame.
    pub const HELD: Self = Self {
        pressed: true,
        just_pressed: false,
    };
}

impl From<ButtonState> for TriggerState {
    fn from(state: ButtonState) -> Self {
        Self {
            pressed: state.pressed,
            just_pressed: state.just_pressed,
        }
    }
}

/// Per-frame action states for one player.
#[derive(Debug, Clone, Default)]
pub struct WeaponInput {
    buttons: AHashMap<WeaponAction, ButtonState>,
}

impl WeaponInput {
    /// Creates an input with every action released.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records whether `action` is held this frame.
    pub fn set(&mut self, action: WeaponAction, is_pressed: bool) {
        self.buttons.entry(action).or_default().update(is_pressed);
    }

    /// Presses `action` (edge on the first frame it is held).
    pub fn press(&mut self, action: WeaponAction) {
        self.set(action, true);
    }

    /// Releases `action`.
    pub fn release(&mut self, action: WeaponAction) {
        self.set(action, false);
    }

    /// Clears per-frame edges. Call once after the frame is processed.
    pub fn end_frame(&mut self) {
        for state in self.buttons.values_mut() {
            state.clear_frame();
        }
    }

    /// Full state of an action.
    #[must_use]
    pub fn state(&self, action: WeaponAction) -> ButtonState {
        self.buttons.get(&action).copied().unwrap_or_default()
    }

    /// Whether `action` is held.
    #[must_use]
    pub fn is_pressed(&self, action: WeaponAction) -> bool {
        self.state(action).pressed
    }

    /// Whether `action` went down this frame.
    #[must_use]
    pub fn just_pressed(&self, action: WeaponAction) -> bool {
        self.state(action).just_pressed
    }

    /// Trigger edges for `action`.
    #[must_use]
    pub fn trigger(&self, action: WeaponAction) -> TriggerState {
        self.state(action).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_edges() {
        let mut state = ButtonState::new();
        state.update(true);
        assert!(state.just_pressed);
        state.update(true);
        assert!(state.pressed && !state.just_pressed);
        state.update(false);
        assert!(state.just_released);
    }

    #[test]
    fn test_input_edges_clear_at_end_of_frame() {
        let mut input = WeaponInput::new();
        input.press(WeaponAction::Fire);
        assert_eq!(input.trigger(WeaponAction::Fire), TriggerState::PULLED);

        input.end_frame();
        assert_eq!(input.trigger(WeaponAction::Fire), TriggerState::HELD);

        input.press(WeaponAction::Fire);
        assert!(!input.just_pressed(WeaponAction::Fire));

        input.release(WeaponAction::Fire);
        assert_eq!(input.trigger(WeaponAction::Fire), TriggerState::RELEASED);
    }

    #[test]
    fn test_unbound_action_is_released() {
        let input = WeaponInput::new();
        assert!(!input.is_pressed(WeaponAction::Reload));
    }
}
