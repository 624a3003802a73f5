//! Persisted printer settings (`config.json`).

use crate::error::KioskError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// RFCOMM channel of the printer; written either as a number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Channel {
    Number(u32),
    Name(String),
}

impl Channel {
    /// Zero and empty names mean no channel was configured.
    pub fn is_set(&self) -> bool {
        match self {
            Channel::Number(n) => *n != 0,
            Channel::Name(name) => !name.is_empty(),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Number(n) => write!(f, "{}", n),
            Channel::Name(name) => f.write_str(name),
        }
    }
}

/// Printer connection parameters, read once at bootstrap.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PrinterConfig {
    #[serde(default, alias = "bluetoothMacAddress")]
    pub bluetooth_mac_address: Option<String>,

    #[serde(default, alias = "bluetoothChannel")]
    pub bluetooth_channel: Option<Channel>,
}

impl PrinterConfig {
    /// Load the configuration; a missing file yields an empty record.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, KioskError> {
        let path = path.as_ref();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("{} not found, starting without printer settings", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(config_error(path, e)),
        };

        serde_json::from_str(&text).map_err(|e| config_error(path, e))
    }

    /// Address, ignoring empty strings.
    pub fn address(&self) -> Option<&str> {
        self.bluetooth_mac_address
            .as_deref()
            .filter(|address| !address.is_empty())
    }

    /// Channel, ignoring zero and empty values.
    pub fn channel(&self) -> Option<&Channel> {
        self.bluetooth_channel
            .as_ref()
            .filter(|channel| channel.is_set())
    }
}

/// Set `bluetooth_mac_address` in the file at `path`, keeping every other key.
pub fn store_address<P: AsRef<Path>>(path: P, address: &str) -> Result<(), KioskError> {
    let path = path.as_ref();

    let mut record = match std::fs::read_to_string(path) {
        Ok(text) => serde_json::from_str::<serde_json::Value>(&text)
            .map_err(|e| config_error(path, e))?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => serde_json::json!({}),
        Err(e) => return Err(config_error(path, e)),
    };

    let object = record
        .as_object_mut()
        .ok_or_else(|| config_error(path, "top level is not an object"))?;
    object.remove("bluetoothMacAddress");
    object.insert(
        "bluetooth_mac_address".to_string(),
        serde_json::Value::String(address.to_string()),
    );

    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    record
        .serialize(&mut serializer)
        .map_err(|e| config_error(path, e))?;

    std::fs::write(path, out).map_err(|e| config_error(path, e))
}

fn config_error(path: &Path, reason: impl fmt::Display) -> KioskError {
    KioskError::Config {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}
