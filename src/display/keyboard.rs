// Keyboard mapping - winit keys to the controller bitfield
//
// The controller wants one byte per frame with the hardware bit order
// (A, B, Select, Start, Up, Down, Left, Right from bit 0). Bindings come
// from the config file as KeyCode names; unknown names are dropped with a
// warning so a typo disables one button instead of the whole pad.

use crate::controller::buttons;
use crate::emulator::InputConfig;
use log::warn;
use std::collections::HashSet;
use winit::keyboard::{KeyCode, PhysicalKey};

/// Resolved bindings for one controller
pub struct KeyboardMapping {
    binds: Vec<(KeyCode, u8)>,
}

impl KeyboardMapping {
    /// Resolve the config's key names into codes.
    pub fn from_config(config: &InputConfig) -> Self {
        let pairs = [
            (&config.a, buttons::A),
            (&config.b, buttons::B),
            (&config.select, buttons::SELECT),
            (&config.start, buttons::START),
            (&config.up, buttons::UP),
            (&config.down, buttons::DOWN),
            (&config.left, buttons::LEFT),
            (&config.right, buttons::RIGHT),
        ];
        let mut binds = Vec::with_capacity(8);
        for (name, bit) in pairs {
            match key_from_name(name) {
                Some(code) => binds.push((code, bit)),
                None => warn!("unknown key name {:?} in input config", name),
            }
        }
        KeyboardMapping { binds }
    }

    /// Fold the currently pressed keys into the controller byte.
    pub fn buttons(&self, pressed: &HashSet<KeyCode>) -> u8 {
        let mut value = 0;
        for &(code, bit) in &self.binds {
            if pressed.contains(&code) {
                value |= bit;
            }
        }
        value
    }
}

/// Tracks the pressed-key set from winit events
#[derive(Default)]
pub struct KeyboardState {
    pressed: HashSet<KeyCode>,
}

impl KeyboardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, key: PhysicalKey) {
        if let PhysicalKey::Code(code) = key {
            self.pressed.insert(code);
        }
    }

    pub fn release(&mut self, key: PhysicalKey) {
        if let PhysicalKey::Code(code) = key {
            self.pressed.remove(&code);
        }
    }

    pub fn pressed(&self) -> &HashSet<KeyCode> {
        &self.pressed
    }
}

/// Parse a winit KeyCode name. Covers the keys anyone plausibly binds a
/// NES pad to; extend as needed.
fn key_from_name(name: &str) -> Option<KeyCode> {
    use KeyCode::*;
    let code = match name {
        "KeyA" => KeyA, "KeyB" => KeyB, "KeyC" => KeyC, "KeyD" => KeyD,
        "KeyE" => KeyE, "KeyF" => KeyF, "KeyG" => KeyG, "KeyH" => KeyH,
        "KeyI" => KeyI, "KeyJ" => KeyJ, "KeyK" => KeyK, "KeyL" => KeyL,
        "KeyM" => KeyM, "KeyN" => KeyN, "KeyO" => KeyO, "KeyP" => KeyP,
        "KeyQ" => KeyQ, "KeyR" => KeyR, "KeyS" => KeyS, "KeyT" => KeyT,
        "KeyU" => KeyU, "KeyV" => KeyV, "KeyW" => KeyW, "KeyX" => KeyX,
        "KeyY" => KeyY, "KeyZ" => KeyZ,
        "Digit0" => Digit0, "Digit1" => Digit1, "Digit2" => Digit2,
        "Digit3" => Digit3, "Digit4" => Digit4, "Digit5" => Digit5,
        "Digit6" => Digit6, "Digit7" => Digit7, "Digit8" => Digit8,
        "Digit9" => Digit9,
        "ArrowUp" => ArrowUp, "ArrowDown" => ArrowDown,
        "ArrowLeft" => ArrowLeft, "ArrowRight" => ArrowRight,
        "Enter" => Enter, "Space" => Space, "Tab" => Tab,
        "ShiftLeft" => ShiftLeft, "ShiftRight" => ShiftRight,
        "ControlLeft" => ControlLeft, "ControlRight" => ControlRight,
        "AltLeft" => AltLeft, "AltRight" => AltRight,
        "Comma" => Comma, "Period" => Period, "Slash" => Slash,
        "Semicolon" => Semicolon, "Quote" => Quote, "Backslash" => Backslash,
        _ => return None,
    };
    Some(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bindings_resolve() {
        let mapping = KeyboardMapping::from_config(&InputConfig::default());
        assert_eq!(mapping.binds.len(), 8, "all eight defaults parse");
    }

    #[test]
    fn test_buttons_fold_bit_order() {
        let mapping = KeyboardMapping::from_config(&InputConfig::default());
        let mut pressed = HashSet::new();
        pressed.insert(KeyCode::KeyX); // A
        pressed.insert(KeyCode::ArrowRight); // Right
        assert_eq!(
            mapping.buttons(&pressed),
            buttons::A | buttons::RIGHT
        );
    }

    #[test]
    fn test_unknown_key_name_dropped() {
        let mut config = InputConfig::default();
        config.a = "NotAKey".into();
        let mapping = KeyboardMapping::from_config(&config);
        assert_eq!(mapping.binds.len(), 7);
    }

    #[test]
    fn test_keyboard_state_tracks_press_release() {
        let mut state = KeyboardState::new();
        state.press(PhysicalKey::Code(KeyCode::KeyZ));
        assert!(state.pressed().contains(&KeyCode::KeyZ));
        state.release(PhysicalKey::Code(KeyCode::KeyZ));
        assert!(state.pressed().is_empty());
    }
}
