//! Key-to-gamepad binding table
//!
//! A [`KeyMap`] is a fixed-size table indexed by input key code. Each slot is
//! either empty (the key is not bound) or holds a [`Binding`] describing which
//! button or axis the key drives. The table is built once from a sequence of
//! [`BindingRecord`]s; after that only the per-key `holding` flags change.
//!
//! Two axis bindings on the same axis with equal and opposite press values
//! are linked as opposites, so releasing one direction while the other is
//! still held reports the held direction instead of the rest position.

use crate::error::{ConfigError, Location};
use crate::names::{self, ABS_COUNT, EV_ABS, EV_KEY, KEY_COUNT};
use std::collections::BTreeMap;
use tracing::debug;

/// Axis value range reported by the virtual device
pub const AXIS_MIN: i32 = -32767;
pub const AXIS_MAX: i32 = 32767;

/// Press value of a button binding
pub const BUTTON_PRESSED: i32 = 1;

/// What kind of gamepad output a key drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputKind {
    /// Digital button, 0 or 1
    Button,
    /// Absolute axis, rests at 0
    Axis,
}

impl OutputKind {
    /// Map an evdev event type (`EV_KEY`, `EV_ABS`) to an output kind
    pub fn from_event_type(event_type: u16) -> Option<Self> {
        match event_type {
            EV_KEY => Some(OutputKind::Button),
            EV_ABS => Some(OutputKind::Axis),
            _ => None,
        }
    }

    /// The evdev event type carrying this output
    pub fn event_type(self) -> u16 {
        match self {
            OutputKind::Button => EV_KEY,
            OutputKind::Axis => EV_ABS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OutputKind::Button => "button",
            OutputKind::Axis => "axis",
        }
    }

    /// Number of valid output codes of this kind
    fn code_count(self) -> usize {
        match self {
            OutputKind::Button => KEY_COUNT,
            OutputKind::Axis => ABS_COUNT,
        }
    }

    /// Display name for an output code of this kind
    pub fn code_name(self, code: u16) -> String {
        let name = match self {
            OutputKind::Button => names::key_name(code),
            OutputKind::Axis => names::axis_name(code),
        };
        name.map(str::to_string).unwrap_or_else(|| code.to_string())
    }
}

/// One unvalidated binding as supplied by a config loader.
///
/// Codes are kept wider than their valid range so that out-of-range values
/// reach [`KeyMap::build`] and are reported there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingRecord {
    /// Input key code
    pub key: u32,
    /// Output event type (`EV_KEY` or `EV_ABS`)
    pub event_type: u16,
    /// Output button or axis code
    pub code: u32,
    /// Value emitted on press
    pub value: i32,
    /// Origin of the record, for error messages
    pub at: Location,
}

/// A validated binding for one input key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub kind: OutputKind,
    pub output_id: u16,
    pub pressed_value: i32,
    /// Key bound to the opposite direction of the same axis
    pub opposite: Option<u16>,
    /// True while the key is pressed
    pub holding: bool,
}

/// Fixed-size table of bindings indexed by input key code
#[derive(Debug, Clone)]
pub struct KeyMap {
    slots: Box<[Option<Binding>]>,
}

impl KeyMap {
    /// Build a keymap from binding records.
    ///
    /// Fails on the first record that is out of range, has an unknown kind or
    /// invalid value, rebinds an already bound key, or makes an axis pairing
    /// ambiguous (same-direction pair, unequal magnitudes, three or more keys).
    pub fn build<I>(records: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = BindingRecord>,
    {
        let mut slots = vec![None; KEY_COUNT].into_boxed_slice();
        let mut origins: Vec<Option<Location>> = vec![None; KEY_COUNT];
        // axis code -> keys bound to it, in config order
        let mut axis_keys: BTreeMap<u16, Vec<(u16, Location)>> = BTreeMap::new();

        for record in records {
            let at = record.at;
            let key = validate_key(&record)?;
            let binding = validate_output(&record)?;

            if let Some(first) = origins[key as usize] {
                return Err(ConfigError::DuplicateKey { at, key, first });
            }

            if binding.kind == OutputKind::Axis {
                let keys = axis_keys.entry(binding.output_id).or_default();
                if keys.len() >= 2 {
                    return Err(ConfigError::AxisOverbound {
                        at,
                        axis: binding.output_id,
                        keys: keys.iter().map(|&(k, _)| k).collect(),
                    });
                }
                keys.push((key, at));
            }

            origins[key as usize] = Some(at);
            slots[key as usize] = Some(binding);
        }

        let mut keymap = Self { slots };
        for (axis, keys) in &axis_keys {
            if let [(first, _), (second, at)] = keys.as_slice() {
                keymap.link_opposites(*axis, *first, *second, *at)?;
            }
        }

        for (key, binding) in keymap.iter() {
            debug!(
                "{}: {} {} {}{}",
                names::key_label(key),
                binding.kind.as_str(),
                binding.kind.code_name(binding.output_id),
                binding.pressed_value,
                binding
                    .opposite
                    .map(|o| format!(" (opposite {})", names::key_label(o)))
                    .unwrap_or_default()
            );
        }

        Ok(keymap)
    }

    /// Link two keys sharing an axis, or reject the pair
    fn link_opposites(
        &mut self,
        axis: u16,
        first: u16,
        second: u16,
        at: Location,
    ) -> Result<(), ConfigError> {
        let first_value = self.slots[first as usize].map_or(0, |b| b.pressed_value);
        let second_value = self.slots[second as usize].map_or(0, |b| b.pressed_value);

        if first_value != -second_value {
            return Err(ConfigError::BadAxisPair {
                at,
                axis,
                first,
                second,
                first_value,
                second_value,
            });
        }

        if let Some(b) = self.slots[first as usize].as_mut() {
            b.opposite = Some(second);
        }
        if let Some(b) = self.slots[second as usize].as_mut() {
            b.opposite = Some(first);
        }
        Ok(())
    }

    /// Look up the binding for a key. Out-of-range codes are simply unbound.
    pub fn lookup(&self, key: u16) -> Option<&Binding> {
        self.slots.get(key as usize)?.as_ref()
    }

    pub(crate) fn lookup_mut(&mut self, key: u16) -> Option<&mut Binding> {
        self.slots.get_mut(key as usize)?.as_mut()
    }

    /// All bound keys with their bindings, in key order
    pub fn iter(&self) -> impl Iterator<Item = (u16, &Binding)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(key, slot)| slot.as_ref().map(|b| (key as u16, b)))
    }

    /// Number of bound keys
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Distinct output codes of one kind, sorted
    pub fn outputs(&self, kind: OutputKind) -> Vec<u16> {
        let mut codes: Vec<u16> = self
            .iter()
            .filter(|(_, b)| b.kind == kind)
            .map(|(_, b)| b.output_id)
            .collect();
        codes.sort_unstable();
        codes.dedup();
        codes
    }

    /// Button codes the keymap can emit
    pub fn buttons(&self) -> Vec<u16> {
        self.outputs(OutputKind::Button)
    }

    /// Axis codes the keymap can emit
    pub fn axes(&self) -> Vec<u16> {
        self.outputs(OutputKind::Axis)
    }
}

fn validate_key(record: &BindingRecord) -> Result<u16, ConfigError> {
    if record.key as usize >= KEY_COUNT {
        return Err(ConfigError::KeyOutOfRange {
            at: record.at,
            key: record.key,
            max: KEY_COUNT - 1,
        });
    }
    Ok(record.key as u16)
}

fn validate_output(record: &BindingRecord) -> Result<Binding, ConfigError> {
    let at = record.at;
    let kind = OutputKind::from_event_type(record.event_type).ok_or(ConfigError::UnknownKind {
        at,
        kind: record.event_type,
    })?;

    if record.code as usize >= kind.code_count() {
        return Err(ConfigError::OutputOutOfRange {
            at,
            kind: kind.as_str(),
            code: record.code,
        });
    }

    let value = record.value;
    match kind {
        OutputKind::Button if value != BUTTON_PRESSED => {
            return Err(ConfigError::InvalidValue {
                at,
                value: value.into(),
                reason: "button press value must be 1",
            });
        }
        OutputKind::Axis if value == 0 => {
            return Err(ConfigError::InvalidValue {
                at,
                value: 0,
                reason: "axis press value must not be the rest position",
            });
        }
        OutputKind::Axis if !(AXIS_MIN..=AXIS_MAX).contains(&value) => {
            return Err(ConfigError::InvalidValue {
                at,
                value: value.into(),
                reason: "axis press value must be within -32767..=32767",
            });
        }
        _ => {}
    }

    Ok(Binding {
        kind,
        output_id: record.code as u16,
        pressed_value: value,
        opposite: None,
        holding: false,
    })
}
