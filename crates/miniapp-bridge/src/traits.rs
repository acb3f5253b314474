// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for native capabilities.
//
// Each trait wraps one OS service. Handlers in the dispatcher only ever see
// these traits, so the same routing and failure policy runs against the JNI
// bridge on a device and the stub bridge everywhere else.

use miniapp_core::error::Result;
use miniapp_core::{AppInfo, BatteryReading, DeviceInfo, DialogSpec, MemoryInfo, NativeView, NetworkStatus};

/// Unified bridge that groups all native capabilities.
pub trait PlatformBridge:
    NativeDevice
    + NativePackage
    + NativeSystem
    + NativeConnectivity
    + NativePower
    + NativeVibrator
    + NativePermissions
    + NativeViews
    + NativeDialogs
    + Send
    + Sync
    + 'static
{
    /// Platform name used as the prefix of the version string (e.g. "Android").
    fn platform_name(&self) -> &str;
}

/// Handle to the foreground UI surface (an `Activity` on Android).
///
/// Only operations that need a live screen take a surface; the dispatcher
/// hands one out only while the session is attached.
pub trait HasSurface {
    type Surface: Send + Sync + 'static;
}

/// Build and screen information.
pub trait NativeDevice {
    /// OS release string (e.g. "14").
    fn os_release(&self) -> Result<String>;

    fn device_info(&self) -> Result<DeviceInfo>;

    /// Raw `Configuration.screenLayout` bitmask.
    fn screen_layout(&self) -> Result<i32>;
}

/// Package manager lookups for the running application.
pub trait NativePackage {
    fn app_info(&self) -> Result<AppInfo>;
}

/// Process-level queries reachable through `callNativeMethod`.
pub trait NativeSystem {
    /// JVM system property, or `None` if unset.
    fn system_property(&self, key: &str) -> Result<Option<String>>;

    /// Wall clock in milliseconds since the epoch.
    fn current_time_millis(&self) -> Result<i64>;

    fn memory_info(&self) -> Result<MemoryInfo>;
}

/// Network connectivity information.
pub trait NativeConnectivity {
    fn network_status(&self) -> Result<NetworkStatus>;
}

/// Battery state.
pub trait NativePower {
    /// Extras of the sticky battery-changed broadcast. `Ok(None)` when the
    /// broadcast is not available.
    fn battery_reading(&self) -> Result<Option<BatteryReading>>;
}

/// Haptics.
pub trait NativeVibrator {
    fn has_vibrator(&self) -> Result<bool>;

    /// One-shot vibration at default amplitude.
    fn vibrate(&self, duration_ms: u32) -> Result<()>;
}

/// Runtime permission checks and requests.
pub trait NativePermissions: HasSurface {
    fn check_permission(&self, permission: &str) -> Result<bool>;

    /// Ask the OS to prompt for `permission`. The answer comes back later
    /// tagged with `request_code`.
    fn request_permission(
        &self,
        surface: &Self::Surface,
        permission: &str,
        request_code: i32,
    ) -> Result<()>;
}

/// Launch other screens from the foreground surface.
pub trait NativeViews: HasSurface {
    fn open_view(&self, surface: &Self::Surface, view: NativeView) -> Result<()>;
}

/// Alert dialogs. Must be called on the UI thread.
pub trait NativeDialogs: HasSurface {
    fn show_dialog(&self, surface: &Self::Surface, spec: &DialogSpec) -> Result<()>;
}
