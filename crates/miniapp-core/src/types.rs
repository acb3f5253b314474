// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Miniapp platform bridge.

use serde::{Deserialize, Serialize};

use crate::value::Value;
use crate::value_map;

/// Build and OS identity of the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub platform: String,
    pub version: String,
    pub model: String,
    pub manufacturer: String,
    pub sdk_version: i32,
    pub brand: String,
    pub device: String,
    pub product: String,
    pub hardware: String,
}

impl DeviceInfo {
    pub fn to_value(&self) -> Value {
        value_map! {
            "platform" => self.platform.as_str(),
            "version" => self.version.as_str(),
            "model" => self.model.as_str(),
            "manufacturer" => self.manufacturer.as_str(),
            "sdk_version" => self.sdk_version,
            "brand" => self.brand.as_str(),
            "device" => self.device.as_str(),
            "product" => self.product.as_str(),
            "hardware" => self.hardware.as_str(),
        }
    }
}

/// Package metadata of the running application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppInfo {
    pub package_name: String,
    pub version_name: Option<String>,
    pub version_code: i64,
    pub app_name: String,
    pub target_sdk_version: i32,
    pub min_sdk_version: i32,
    /// Milliseconds since the epoch.
    pub install_time: i64,
    /// Milliseconds since the epoch.
    pub update_time: i64,
}

impl AppInfo {
    pub fn to_value(&self) -> Value {
        value_map! {
            "packageName" => self.package_name.as_str(),
            "versionName" => self.version_name.clone(),
            "versionCode" => self.version_code,
            "appName" => self.app_name.as_str(),
            "targetSdkVersion" => self.target_sdk_version,
            "minSdkVersion" => self.min_sdk_version,
            "installTime" => self.install_time,
            "updateTime" => self.update_time,
        }
    }
}

/// System memory snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryInfo {
    pub avail_mem: i64,
    pub total_mem: i64,
    pub low_memory: bool,
}

impl MemoryInfo {
    pub fn to_value(&self) -> Value {
        value_map! {
            "availMem" => self.avail_mem,
            "totalMem" => self.total_mem,
            "lowMemory" => self.low_memory,
        }
    }
}

// ---------------------------------------------------------------------------
// Battery
// ---------------------------------------------------------------------------

pub const BATTERY_STATUS_CHARGING: i32 = 2;
pub const BATTERY_STATUS_FULL: i32 = 5;
pub const BATTERY_PLUGGED_AC: i32 = 1;
pub const BATTERY_PLUGGED_USB: i32 = 2;

/// Raw extras of the sticky battery-changed broadcast. `-1` means absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryReading {
    pub level: i32,
    pub scale: i32,
    pub status: i32,
    pub plugged: i32,
}

/// Battery state as reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatteryInfo {
    /// Charge percentage, 0–100.
    pub level: i32,
    pub is_charging: bool,
    pub usb_charge: bool,
    pub ac_charge: bool,
    pub status: i32,
}

impl BatteryInfo {
    /// Derive caller-facing battery state. `None` when level or scale is
    /// unusable.
    pub fn from_reading(r: &BatteryReading) -> Option<Self> {
        if r.level < 0 || r.scale <= 0 {
            return None;
        }
        let pct = (f64::from(r.level) * 100.0 / f64::from(r.scale)).round() as i32;
        Some(Self {
            level: pct.clamp(0, 100),
            is_charging: r.status == BATTERY_STATUS_CHARGING || r.status == BATTERY_STATUS_FULL,
            usb_charge: r.plugged == BATTERY_PLUGGED_USB,
            ac_charge: r.plugged == BATTERY_PLUGGED_AC,
            status: r.status,
        })
    }

    pub fn to_value(&self) -> Value {
        value_map! {
            "level" => self.level,
            "isCharging" => self.is_charging,
            "usbCharge" => self.usb_charge,
            "acCharge" => self.ac_charge,
            "status" => self.status,
        }
    }
}

// ---------------------------------------------------------------------------
// Screen / network
// ---------------------------------------------------------------------------

pub const SCREENLAYOUT_SIZE_MASK: i32 = 0x0f;
pub const SCREENLAYOUT_SIZE_LARGE: i32 = 0x03;

/// Tablet classification from the configuration's screen-layout bitmask.
pub fn is_large_screen(screen_layout: i32) -> bool {
    (screen_layout & SCREENLAYOUT_SIZE_MASK) >= SCREENLAYOUT_SIZE_LARGE
}

pub const NOT_CONNECTED: &str = "Not Connected";

/// Active network as seen by the connectivity service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkStatus {
    Connected {
        type_name: String,
        subtype_name: String,
    },
    Disconnected,
}

impl NetworkStatus {
    pub fn describe(&self) -> String {
        match self {
            Self::Connected {
                type_name,
                subtype_name,
            } => format!("{type_name} - {subtype_name}"),
            Self::Disconnected => NOT_CONNECTED.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Native views and methods
// ---------------------------------------------------------------------------

/// Screens `openNativeView` knows how to launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeView {
    /// Application details page in system settings.
    Settings,
    /// Image chooser.
    Gallery,
}

impl NativeView {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "settings" => Some(Self::Settings),
            "gallery" => Some(Self::Gallery),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Dialogs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogButtonRole {
    Positive,
    Negative,
    Neutral,
}

impl DialogButtonRole {
    /// Roles in the order labels are assigned to them.
    pub const ORDER: [Self; 3] = [Self::Positive, Self::Negative, Self::Neutral];
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogButton {
    pub role: DialogButtonRole,
    pub label: String,
}

/// Fully resolved alert dialog, ready to hand to the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogSpec {
    pub title: Option<String>,
    pub message: Option<String>,
    pub buttons: Vec<DialogButton>,
}

impl DialogSpec {
    /// Assign labels to positive/negative/neutral in order, dropping any past
    /// `max_buttons` (clamped to one through three). No labels yields a
    /// single positive button labelled `default_label`.
    pub fn new(
        title: Option<&str>,
        message: Option<&str>,
        labels: &[&str],
        max_buttons: usize,
        default_label: &str,
    ) -> Self {
        let max_buttons = max_buttons.clamp(1, DialogButtonRole::ORDER.len());
        let buttons = if labels.is_empty() {
            vec![DialogButton {
                role: DialogButtonRole::Positive,
                label: default_label.to_owned(),
            }]
        } else {
            DialogButtonRole::ORDER
                .iter()
                .zip(labels.iter().take(max_buttons))
                .map(|(role, label)| DialogButton {
                    role: *role,
                    label: (*label).to_owned(),
                })
                .collect()
        };
        Self {
            title: title.map(str::to_owned),
            message: message.map(str::to_owned),
            buttons,
        }
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Result of a native action, keeping "could not attempt" apart from
/// "attempted and failed". Collapsed to a boolean only at the channel edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T = ()> {
    Ok(T),
    /// A precondition was not met (no surface, no hardware).
    Unavailable(String),
    /// The user or OS refused.
    Denied,
    /// The attempt itself threw.
    Failed(String),
}

impl<T> Outcome<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }
}

impl Outcome<()> {
    /// Boolean form sent back across the channel.
    pub fn into_flag(self) -> bool {
        self.is_ok()
    }
}

/// Where a permission stands after `requestPermission`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    /// A system prompt was issued; the answer arrives as a `PermissionEvent`.
    Requested { request_code: i32 },
}

/// Answer to an earlier permission request, delivered out of band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionEvent {
    pub request_code: i32,
    pub permission: String,
    pub granted: bool,
}
