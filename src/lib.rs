//! Keyboard-to-Gamepad Translator
//!
//! Reads key events from a Linux input device and replays them as button and
//! axis events on a virtual gamepad, with correct handling of two keys that
//! drive opposite directions of one axis.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod gamepad;
pub mod keymap;
pub mod names;
pub mod sink;
pub mod source;
pub mod translator;

pub use config::{BindingEntry, CodeRef, ConfigFormat, ControllerConfig, DeviceSettings};
pub use dispatch::{pump, Dispatcher};
pub use error::{ConfigError, Location, RunError, SinkError, SourceError};
pub use gamepad::VirtualGamepad;
pub use keymap::{Binding, BindingRecord, KeyMap, OutputKind, AXIS_MAX, AXIS_MIN};
pub use sink::{Emission, LogSink, OutputSink, Recorder};
pub use source::{EvdevSource, EventSource, InputEvent, StreamSource};
pub use translator::{KeyAction, Translator};
