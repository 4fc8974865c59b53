//! Key event to gamepad event translation
//!
//! Each key press or release produces exactly one output value followed by a
//! frame marker. Key repeats produce nothing.
//!
//! Releasing one direction of an axis while the opposite direction is still
//! held reports the held direction rather than snapping the axis to rest.

use crate::error::SinkError;
use crate::keymap::{Binding, KeyMap, OutputKind};
use crate::names::KEY_COUNT;
use crate::sink::OutputSink;
use tracing::trace;

/// Decoded key action from the input device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAction {
    Release,
    Press,
    /// Auto-repeat while held
    Repeat,
}

impl KeyAction {
    /// Decode an `EV_KEY` event value (0 = release, 1 = press, 2 = repeat)
    pub fn from_value(value: i32) -> Option<Self> {
        match value {
            0 => Some(KeyAction::Release),
            1 => Some(KeyAction::Press),
            2 => Some(KeyAction::Repeat),
            _ => None,
        }
    }
}

/// Translates key events using a [`KeyMap`]
pub struct Translator<'a> {
    keymap: &'a mut KeyMap,
}

impl<'a> Translator<'a> {
    pub fn new(keymap: &'a mut KeyMap) -> Self {
        Self { keymap }
    }

    pub fn keymap(&self) -> &KeyMap {
        &*self.keymap
    }

    /// Handle one key event, emitting at most one value and one frame marker.
    ///
    /// Unbound keys, out-of-range keys and repeats are ignored. A sink error
    /// is returned as-is; the caller is expected to stop.
    pub fn handle<S: OutputSink + ?Sized>(
        &mut self,
        key: u16,
        action: KeyAction,
        sink: &mut S,
    ) -> Result<(), SinkError> {
        if action == KeyAction::Repeat {
            trace!("key {key}: repeat ignored");
            return Ok(());
        }

        let pressed = action == KeyAction::Press;
        let binding = match self.keymap.lookup_mut(key) {
            Some(binding) => {
                binding.holding = pressed;
                *binding
            }
            None if key as usize >= KEY_COUNT => {
                trace!("key {key}: out of range, ignored");
                return Ok(());
            }
            None => {
                trace!("key {key}: unbound, ignored");
                return Ok(());
            }
        };

        let value = if pressed {
            binding.pressed_value
        } else {
            self.release_value(&binding)
        };

        sink.emit(binding.kind, binding.output_id, value)?;
        sink.sync()
    }

    /// Value to report when a key is released
    fn release_value(&self, binding: &Binding) -> i32 {
        match (binding.kind, binding.opposite) {
            (OutputKind::Axis, Some(opposite)) => self
                .keymap
                .lookup(opposite)
                .filter(|b| b.holding)
                .map_or(0, |b| b.pressed_value),
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Location;
    use crate::keymap::{BindingRecord, AXIS_MAX, AXIS_MIN};
    use crate::names::{EV_ABS, EV_KEY};
    use crate::sink::{Emission, Recorder};

    const KEY_A: u16 = 30;
    const KEY_D: u16 = 32;
    const KEY_W: u16 = 17;
    const KEY_J: u16 = 36;
    const KEY_Q: u16 = 16;
    const ABS_X: u16 = 0;
    const ABS_Y: u16 = 1;
    const BTN_SOUTH: u16 = 0x130;

    fn test_keymap() -> KeyMap {
        let records = [
            (KEY_A, EV_ABS, ABS_X, AXIS_MIN),
            (KEY_D, EV_ABS, ABS_X, AXIS_MAX),
            (KEY_W, EV_ABS, ABS_Y, AXIS_MIN),
            (KEY_J, EV_KEY, BTN_SOUTH, 1),
        ];
        KeyMap::build(
            records
                .iter()
                .enumerate()
                .map(|(i, &(key, event_type, code, value))| BindingRecord {
                    key: key.into(),
                    event_type,
                    code: code.into(),
                    value,
                    at: Location::record(i),
                }),
        )
        .unwrap()
    }

    #[test]
    fn test_button_press_release() {
        let mut keymap = test_keymap();
        let mut translator = Translator::new(&mut keymap);
        let mut sink = Recorder::new();

        translator.handle(KEY_J, KeyAction::Press, &mut sink).unwrap();
        translator.handle(KEY_J, KeyAction::Release, &mut sink).unwrap();

        assert_eq!(
            sink.emissions(),
            &[
                Emission::Value {
                    kind: OutputKind::Button,
                    code: BTN_SOUTH,
                    value: 1
                },
                Emission::Sync,
                Emission::Value {
                    kind: OutputKind::Button,
                    code: BTN_SOUTH,
                    value: 0
                },
                Emission::Sync,
            ]
        );
    }

    #[test]
    fn test_repeat_emits_nothing() {
        let mut keymap = test_keymap();
        let mut translator = Translator::new(&mut keymap);
        let mut sink = Recorder::new();

        translator.handle(KEY_J, KeyAction::Press, &mut sink).unwrap();
        for _ in 0..5 {
            translator.handle(KEY_J, KeyAction::Repeat, &mut sink).unwrap();
        }
        translator.handle(KEY_J, KeyAction::Release, &mut sink).unwrap();

        assert_eq!(sink.frames(), 2);
        assert!(translator.keymap().lookup(KEY_J).is_some_and(|b| !b.holding));
    }

    #[test]
    fn test_unbound_key_ignored() {
        let mut keymap = test_keymap();
        let mut translator = Translator::new(&mut keymap);
        let mut sink = Recorder::new();

        for action in [KeyAction::Press, KeyAction::Repeat, KeyAction::Release] {
            translator.handle(KEY_Q, action, &mut sink).unwrap();
            translator.handle(0xFFFF, action, &mut sink).unwrap();
        }
        assert!(sink.emissions().is_empty());
    }

    #[test]
    fn test_axis_without_opposite_releases_to_rest() {
        let mut keymap = test_keymap();
        let mut translator = Translator::new(&mut keymap);
        let mut sink = Recorder::new();

        translator.handle(KEY_W, KeyAction::Press, &mut sink).unwrap();
        translator.handle(KEY_W, KeyAction::Release, &mut sink).unwrap();

        assert_eq!(
            sink.values(),
            vec![
                (OutputKind::Axis, ABS_Y, AXIS_MIN),
                (OutputKind::Axis, ABS_Y, 0)
            ]
        );
    }

    #[test]
    fn test_release_reports_held_opposite() {
        let mut keymap = test_keymap();
        let mut translator = Translator::new(&mut keymap);
        let mut sink = Recorder::new();

        translator.handle(KEY_A, KeyAction::Press, &mut sink).unwrap();
        translator.handle(KEY_D, KeyAction::Press, &mut sink).unwrap();
        translator.handle(KEY_A, KeyAction::Release, &mut sink).unwrap();
        translator.handle(KEY_D, KeyAction::Release, &mut sink).unwrap();

        assert_eq!(
            sink.values(),
            vec![
                (OutputKind::Axis, ABS_X, AXIS_MIN),
                (OutputKind::Axis, ABS_X, AXIS_MAX),
                (OutputKind::Axis, ABS_X, AXIS_MAX),
                (OutputKind::Axis, ABS_X, 0),
            ]
        );
    }

    #[test]
    fn test_double_press_is_idempotent() {
        let mut keymap = test_keymap();
        let mut translator = Translator::new(&mut keymap);
        let mut sink = Recorder::new();

        translator.handle(KEY_D, KeyAction::Press, &mut sink).unwrap();
        translator.handle(KEY_D, KeyAction::Press, &mut sink).unwrap();
        assert!(translator.keymap().lookup(KEY_D).is_some_and(|b| b.holding));
        translator.handle(KEY_D, KeyAction::Release, &mut sink).unwrap();

        assert_eq!(
            sink.values(),
            vec![
                (OutputKind::Axis, ABS_X, AXIS_MAX),
                (OutputKind::Axis, ABS_X, AXIS_MAX),
                (OutputKind::Axis, ABS_X, 0),
            ]
        );
    }

    #[test]
    fn test_key_action_decode() {
        assert_eq!(KeyAction::from_value(0), Some(KeyAction::Release));
        assert_eq!(KeyAction::from_value(1), Some(KeyAction::Press));
        assert_eq!(KeyAction::from_value(2), Some(KeyAction::Repeat));
        assert_eq!(KeyAction::from_value(3), None);
        assert_eq!(KeyAction::from_value(-1), None);
    }
}
