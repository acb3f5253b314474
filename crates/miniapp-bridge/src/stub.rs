// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub bridge for desktop/CI builds where native mobile APIs are unavailable.
//
// Answers every query from a `StubProfile` and records every action it is
// asked to perform, so the dispatcher can be exercised end to end without a
// device.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

use miniapp_core::error::{MiniappError, Result};
use miniapp_core::{
    AppInfo, BATTERY_PLUGGED_AC, BATTERY_STATUS_FULL, BatteryReading, DeviceInfo, DialogSpec,
    MemoryInfo, NativeView, NetworkStatus,
};

use crate::traits::*;

const PLATFORM_NAME: &str = "Desktop (stub)";

/// Stand-in for an `Activity`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubSurface {
    pub name: String,
}

impl StubSurface {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Side effect requested from the stub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StubAction {
    OpenedView { surface: String, view: NativeView },
    RequestedPermission { permission: String, request_code: i32 },
    ShowedDialog { surface: String, spec: DialogSpec },
    Vibrated { duration_ms: u32 },
}

/// Canned answers for the stub bridge.
#[derive(Debug, Clone)]
pub struct StubProfile {
    pub release: String,
    pub device: DeviceInfo,
    pub screen_layout: i32,
    /// `None` makes the package lookup fail.
    pub app: Option<AppInfo>,
    pub properties: HashMap<String, String>,
    pub memory: MemoryInfo,
    pub network: NetworkStatus,
    /// `None` means the battery broadcast is unavailable.
    pub battery: Option<BatteryReading>,
    pub has_vibrator: bool,
    pub granted: HashSet<String>,
    /// Make every UI action (views, dialogs, vibration) fail as if the OS threw.
    pub fail_actions: bool,
}

impl Default for StubProfile {
    fn default() -> Self {
        let properties = [
            ("os.name", std::env::consts::OS),
            ("os.arch", std::env::consts::ARCH),
            ("file.separator", "/"),
            ("line.separator", "\n"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();

        Self {
            release: "0.0".into(),
            device: DeviceInfo {
                platform: PLATFORM_NAME.into(),
                version: "0.0".into(),
                model: "Stub Device".into(),
                manufacturer: "Miniapp".into(),
                sdk_version: 0,
                brand: "generic".into(),
                device: "stub".into(),
                product: "stub".into(),
                hardware: std::env::consts::ARCH.into(),
            },
            screen_layout: 0x02,
            app: Some(AppInfo {
                package_name: "dev.miniapp.probe".into(),
                version_name: Some(env!("CARGO_PKG_VERSION").into()),
                version_code: 1,
                app_name: "Miniapp Probe".into(),
                target_sdk_version: 34,
                min_sdk_version: 21,
                install_time: 0,
                update_time: 0,
            }),
            properties,
            memory: MemoryInfo {
                avail_mem: 2 << 30,
                total_mem: 4 << 30,
                low_memory: false,
            },
            network: NetworkStatus::Connected {
                type_name: "WIFI".into(),
                subtype_name: String::new(),
            },
            battery: Some(BatteryReading {
                level: 100,
                scale: 100,
                status: BATTERY_STATUS_FULL,
                plugged: BATTERY_PLUGGED_AC,
            }),
            has_vibrator: false,
            granted: HashSet::new(),
            fail_actions: false,
        }
    }
}

/// Bridge returned on non-mobile platforms.
#[derive(Debug)]
pub struct StubBridge {
    profile: StubProfile,
    granted: Mutex<HashSet<String>>,
    actions: Mutex<Vec<StubAction>>,
}

impl Default for StubBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl StubBridge {
    pub fn new() -> Self {
        Self::with_profile(StubProfile::default())
    }

    pub fn with_profile(profile: StubProfile) -> Self {
        let granted = Mutex::new(profile.granted.clone());
        Self {
            profile,
            granted,
            actions: Mutex::new(Vec::new()),
        }
    }

    /// Simulate the user granting a permission.
    pub fn grant(&self, permission: &str) {
        self.granted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(permission.to_owned());
    }

    /// Everything the stub has been asked to do, oldest first.
    pub fn actions(&self) -> Vec<StubAction> {
        self.actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, action: StubAction) -> Result<()> {
        if self.profile.fail_actions {
            tracing::warn!(?action, "stub bridge: action failed");
            return Err(MiniappError::Bridge("stub action failure".into()));
        }
        tracing::debug!(?action, "stub bridge: action");
        self.actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(action);
        Ok(())
    }
}

impl PlatformBridge for StubBridge {
    fn platform_name(&self) -> &str {
        PLATFORM_NAME
    }
}

impl HasSurface for StubBridge {
    type Surface = StubSurface;
}

impl NativeDevice for StubBridge {
    fn os_release(&self) -> Result<String> {
        Ok(self.profile.release.clone())
    }

    fn device_info(&self) -> Result<DeviceInfo> {
        Ok(self.profile.device.clone())
    }

    fn screen_layout(&self) -> Result<i32> {
        Ok(self.profile.screen_layout)
    }
}

impl NativePackage for StubBridge {
    fn app_info(&self) -> Result<AppInfo> {
        self.profile.app.clone().ok_or_else(|| {
            MiniappError::Bridge("NameNotFoundException: package not installed".into())
        })
    }
}

impl NativeSystem for StubBridge {
    fn system_property(&self, key: &str) -> Result<Option<String>> {
        Ok(self.profile.properties.get(key).cloned())
    }

    fn current_time_millis(&self) -> Result<i64> {
        Ok(chrono::Utc::now().timestamp_millis())
    }

    fn memory_info(&self) -> Result<MemoryInfo> {
        Ok(self.profile.memory)
    }
}

impl NativeConnectivity for StubBridge {
    fn network_status(&self) -> Result<NetworkStatus> {
        Ok(self.profile.network.clone())
    }
}

impl NativePower for StubBridge {
    fn battery_reading(&self) -> Result<Option<BatteryReading>> {
        Ok(self.profile.battery)
    }
}

impl NativeVibrator for StubBridge {
    fn has_vibrator(&self) -> Result<bool> {
        Ok(self.profile.has_vibrator)
    }

    fn vibrate(&self, duration_ms: u32) -> Result<()> {
        if !self.profile.has_vibrator {
            return Err(MiniappError::PlatformUnavailable);
        }
        self.record(StubAction::Vibrated { duration_ms })
    }
}

impl NativePermissions for StubBridge {
    fn check_permission(&self, permission: &str) -> Result<bool> {
        Ok(self
            .granted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(permission))
    }

    fn request_permission(
        &self,
        _surface: &StubSurface,
        permission: &str,
        request_code: i32,
    ) -> Result<()> {
        self.record(StubAction::RequestedPermission {
            permission: permission.to_owned(),
            request_code,
        })
    }
}

impl NativeViews for StubBridge {
    fn open_view(&self, surface: &StubSurface, view: NativeView) -> Result<()> {
        self.record(StubAction::OpenedView {
            surface: surface.name.clone(),
            view,
        })
    }
}

impl NativeDialogs for StubBridge {
    fn show_dialog(&self, surface: &StubSurface, spec: &DialogSpec) -> Result<()> {
        self.record(StubAction::ShowedDialog {
            surface: surface.name.clone(),
            spec: spec.clone(),
        })
    }
}
