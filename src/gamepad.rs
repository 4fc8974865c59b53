//! Virtual gamepad device using evdev/uinput
//!
//! Creates a virtual gamepad exposing exactly the buttons and axes the keymap
//! can produce, so games see a controller with no phantom inputs.

use crate::config::DeviceSettings;
use crate::error::SinkError;
use crate::keymap::{KeyMap, OutputKind, AXIS_MAX, AXIS_MIN};
use crate::sink::OutputSink;
use evdev::{
    uinput::{VirtualDevice, VirtualDeviceBuilder},
    AbsInfo, AbsoluteAxisType, AttributeSet, BusType, EventType, InputEvent, InputId, Key,
    UinputAbsSetup,
};
use tracing::debug;

/// Device version reported in the input id
const DEVICE_VERSION: u16 = 1;

/// Virtual gamepad device
pub struct VirtualGamepad {
    device: VirtualDevice,
    /// Events emitted since the last sync
    pending: Vec<InputEvent>,
}

impl VirtualGamepad {
    /// Create the device with the identity from `settings` and the
    /// capabilities used by `keymap`
    pub fn new(settings: &DeviceSettings, keymap: &KeyMap) -> Result<Self, SinkError> {
        let mut builder = VirtualDeviceBuilder::new()
            .map_err(SinkError::Create)?
            .name(settings.device_name.as_str())
            .input_id(InputId::new(
                BusType::BUS_USB,
                settings.vendor,
                settings.product,
                DEVICE_VERSION,
            ));

        let buttons = keymap.buttons();
        if !buttons.is_empty() {
            let mut keys = AttributeSet::<Key>::new();
            for &code in &buttons {
                keys.insert(Key::new(code));
            }
            builder = builder.with_keys(&keys).map_err(SinkError::Create)?;
        }

        for code in keymap.axes() {
            let abs_setup = UinputAbsSetup::new(
                AbsoluteAxisType(code),
                AbsInfo::new(0, AXIS_MIN, AXIS_MAX, 0, 0, 1),
            );
            builder = builder
                .with_absolute_axis(&abs_setup)
                .map_err(SinkError::Create)?;
        }

        let device = builder.build().map_err(SinkError::Create)?;
        debug!(
            "Created {} with {} buttons, {} axes",
            settings.device_name,
            buttons.len(),
            keymap.axes().len()
        );

        Ok(Self {
            device,
            pending: Vec::new(),
        })
    }

    /// Get the device path (e.g., /dev/input/eventX)
    pub fn device_path(&mut self) -> Option<std::path::PathBuf> {
        self.device
            .enumerate_dev_nodes_blocking()
            .ok()?
            .next()?
            .ok()
    }
}

fn event_type(kind: OutputKind) -> EventType {
    match kind {
        OutputKind::Button => EventType::KEY,
        OutputKind::Axis => EventType::ABSOLUTE,
    }
}

impl OutputSink for VirtualGamepad {
    fn emit(&mut self, kind: OutputKind, code: u16, value: i32) -> Result<(), SinkError> {
        self.pending
            .push(InputEvent::new(event_type(kind), code, value));
        Ok(())
    }

    /// Write pending events; evdev appends the `SYN_REPORT` to the same write
    fn sync(&mut self) -> Result<(), SinkError> {
        let events = std::mem::take(&mut self.pending);
        self.device.emit(&events).map_err(SinkError::Write)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Location;
    use crate::keymap::BindingRecord;
    use crate::names::{EV_ABS, EV_KEY};

    #[test]
    fn test_event_types() {
        assert_eq!(event_type(OutputKind::Button).0, EV_KEY);
        assert_eq!(event_type(OutputKind::Axis).0, EV_ABS);
    }

    #[test]
    #[ignore] // Requires uinput access (run with: cargo test -- --ignored)
    fn test_create_gamepad() {
        let keymap = KeyMap::build([
            BindingRecord {
                key: 30,
                event_type: EV_ABS,
                code: 0,
                value: AXIS_MIN,
                at: Location::record(0),
            },
            BindingRecord {
                key: 36,
                event_type: EV_KEY,
                code: 0x130,
                value: 1,
                at: Location::record(1),
            },
        ])
        .unwrap();
        let mut gamepad = VirtualGamepad::new(&DeviceSettings::default(), &keymap).unwrap();
        gamepad.emit(OutputKind::Axis, 0, AXIS_MIN).unwrap();
        gamepad.sync().unwrap();
    }
}
