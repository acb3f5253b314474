// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Tunables for the bridge dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Name of the method channel the host registers the plugin on.
    pub channel_name: String,
    /// Vibration length used when a call gives no valid duration.
    pub default_vibration_ms: u32,
    /// Label of the single button shown when a dialog has none.
    pub default_dialog_label: String,
    /// Dialog button labels beyond this count are dropped.
    pub max_dialog_buttons: usize,
    /// First request code handed out for permission requests.
    pub permission_request_code_base: i32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            channel_name: "miniapp_plugin".into(),
            default_vibration_ms: 200,
            default_dialog_label: "OK".into(),
            max_dialog_buttons: 3,
            permission_request_code_base: 1,
        }
    }
}

impl BridgeConfig {
    /// Parse a JSON document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = BridgeConfig::from_json(r#"{"default_vibration_ms": 50}"#).expect("parse");
        assert_eq!(cfg.default_vibration_ms, 50);
        assert_eq!(cfg.max_dialog_buttons, 3);
        assert_eq!(cfg.channel_name, "miniapp_plugin");
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        assert!(BridgeConfig::from_json("{not json").is_err());
    }
}
