//! Configuration for the virtual controller
//!
//! Bindings are normally written in TOML:
//!
//! ```toml
//! device_name = "nh-virtual-controller"
//!
//! [[bindings]]
//! key = "KEY_A"
//! kind = "axis"
//! output = "ABS_X"
//! value = -32767
//!
//! [[bindings]]
//! key = "KEY_J"
//! kind = "button"
//! output = "BTN_SOUTH"
//! ```
//!
//! The older line format (`keys.conf`) is also accepted, one binding per line:
//!
//! ```text
//! KEY_A: EV_ABS ABS_X -32767
//! KEY_J: EV_KEY BTN_SOUTH 1
//! ```
//!
//! Keys, kinds and outputs may be given by name or as decimal codes.

use crate::error::{ConfigError, Location};
use crate::keymap::{BindingRecord, KeyMap, OutputKind, BUTTON_PRESSED};
use crate::names::{self, EV_ABS, EV_KEY};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ConfigFormat {
    Toml,
    /// `KEY: TYPE CODE VALUE` lines
    Legacy,
}

impl ConfigFormat {
    /// Guess the format from the file extension
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Legacy,
        }
    }
}

/// A key, kind or output given by name or number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CodeRef {
    Code(u32),
    Name(String),
}

impl CodeRef {
    /// Parse a config token: digits are a code, anything else a name
    pub fn parse(token: &str) -> Self {
        match token.parse::<u32>() {
            Ok(code) => CodeRef::Code(code),
            Err(_) => CodeRef::Name(token.to_string()),
        }
    }

    fn resolve(
        &self,
        at: Location,
        lookup: impl Fn(&str) -> Option<u16>,
    ) -> Result<u32, ConfigError> {
        match self {
            CodeRef::Code(code) => Ok(*code),
            CodeRef::Name(name) => {
                lookup(name)
                    .map(u32::from)
                    .ok_or_else(|| ConfigError::UnknownName {
                        at,
                        name: name.clone(),
                    })
            }
        }
    }
}

/// Resolve an output kind name to an event type
fn kind_from_name(name: &str) -> Option<u16> {
    match name.to_ascii_lowercase().as_str() {
        "button" | "key" => Some(EV_KEY),
        "axis" | "abs" => Some(EV_ABS),
        _ => names::event_type_from_name(name),
    }
}

/// One binding as written in the config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingEntry {
    /// Input key
    pub key: CodeRef,
    /// `button`, `axis`, or an event type
    pub kind: CodeRef,
    /// Button or axis
    pub output: CodeRef,
    /// Press value; required for axes, 1 for buttons
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<i32>,
    /// Source line (line format only)
    #[serde(skip)]
    pub line: Option<usize>,
}

impl BindingEntry {
    /// Resolve names and defaults into a record for [`KeyMap::build`]
    pub fn to_record(&self, index: usize) -> Result<BindingRecord, ConfigError> {
        let at = match self.line {
            Some(line) => Location::line(index, line),
            None => Location::record(index),
        };

        let key = self.key.resolve(at, names::key_code_from_name)?;
        let event_type = self.kind.resolve(at, kind_from_name)?;
        let event_type = u16::try_from(event_type).map_err(|_| ConfigError::UnknownKind {
            at,
            kind: u16::MAX,
        })?;
        let kind = OutputKind::from_event_type(event_type);

        let code = match kind {
            Some(OutputKind::Button) => self.output.resolve(at, names::button_code_from_name)?,
            Some(OutputKind::Axis) => self.output.resolve(at, names::axis_code_from_name)?,
            // Let the keymap report the unknown kind
            None => self.output.resolve(at, |n| {
                names::axis_code_from_name(n).or_else(|| names::button_code_from_name(n))
            })?,
        };

        let value = match (self.value, kind) {
            (Some(value), _) => value,
            (None, Some(OutputKind::Button)) => BUTTON_PRESSED,
            (None, _) => return Err(ConfigError::MissingField { at, field: "value" }),
        };

        Ok(BindingRecord {
            key,
            event_type,
            code,
            value,
            at,
        })
    }
}

/// Identity of the virtual device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSettings {
    /// Name shown in `evtest` and game controller settings
    #[serde(default = "default_device_name")]
    pub device_name: String,
    #[serde(default = "default_vendor")]
    pub vendor: u16,
    #[serde(default = "default_product")]
    pub product: u16,
}

fn default_device_name() -> String {
    "nh-virtual-controller".to_string()
}
fn default_vendor() -> u16 {
    0x4E48
}
fn default_product() -> u16 {
    0x7663
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            device_name: default_device_name(),
            vendor: default_vendor(),
            product: default_product(),
        }
    }
}

/// Complete controller configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    #[serde(flatten)]
    pub device: DeviceSettings,
    #[serde(default)]
    pub bindings: Vec<BindingEntry>,
}

impl ControllerConfig {
    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("virtual-controller")
            .join("keys.toml")
    }

    /// Load a config file. `format` overrides detection by extension.
    pub fn load(path: &Path, format: Option<ConfigFormat>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config = match format.unwrap_or_else(|| ConfigFormat::from_path(path)) {
            ConfigFormat::Toml => {
                toml::from_str(&content).map_err(|source| ConfigError::Toml {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            ConfigFormat::Legacy => Self::from_legacy(&content)?,
        };

        if config.bindings.is_empty() {
            return Err(ConfigError::Empty);
        }
        Ok(config)
    }

    /// Parse the `KEY: TYPE CODE VALUE` line format.
    ///
    /// Blank lines and `#` comments are skipped. The device identity keeps
    /// its defaults.
    pub fn from_legacy(content: &str) -> Result<Self, ConfigError> {
        let mut bindings = Vec::new();

        for (i, raw_line) in content.lines().enumerate() {
            let line_no = i + 1;
            let line = raw_line.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }
            let at = Location::line(bindings.len(), line_no);

            let (key, rest) = line.split_once(':').ok_or_else(|| ConfigError::Syntax {
                at,
                message: "expected KEY: TYPE CODE VALUE".to_string(),
            })?;
            let key = key.trim();
            if key.is_empty() || key.contains(char::is_whitespace) {
                return Err(ConfigError::Syntax {
                    at,
                    message: format!("bad key \"{key}\""),
                });
            }

            let fields: Vec<&str> = rest.split_whitespace().collect();
            let [kind, output, value] = fields.as_slice() else {
                return Err(ConfigError::Syntax {
                    at,
                    message: format!("expected TYPE CODE VALUE, found {} fields", fields.len()),
                });
            };
            let value = value.parse::<i32>().map_err(|_| ConfigError::Syntax {
                at,
                message: format!("bad value \"{value}\""),
            })?;

            bindings.push(BindingEntry {
                key: CodeRef::parse(key),
                kind: CodeRef::parse(kind),
                output: CodeRef::parse(output),
                value: Some(value),
                line: Some(line_no),
            });
        }

        Ok(Self {
            device: DeviceSettings::default(),
            bindings,
        })
    }

    /// Render as TOML (used to migrate line-format files)
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Resolve every binding into a record
    pub fn records(&self) -> Result<Vec<BindingRecord>, ConfigError> {
        self.bindings
            .iter()
            .enumerate()
            .map(|(i, entry)| entry.to_record(i))
            .collect()
    }

    /// Build the keymap described by this config
    pub fn keymap(&self) -> Result<KeyMap, ConfigError> {
        KeyMap::build(self.records()?)
    }
}
