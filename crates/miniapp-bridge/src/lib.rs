// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! Miniapp: method-call bridge between the host application and native
//! platform services.
//!
//! The [`dispatcher::Dispatcher`] routes a named method call to one of the
//! twelve fixed handlers, each of which goes through the capability traits
//! in [`traits`]. The Android implementation talks to the OS over JNI; the
//! stub implementation serves desktop builds, CI and tests.

pub mod dispatcher;
pub mod executor;
pub mod permissions;
pub mod plugin;
pub mod session;
pub mod stub;
pub mod traits;

#[cfg(target_os = "android")]
pub mod android;

pub use dispatcher::{Dispatcher, Method};
pub use plugin::MiniappPlugin;
pub use session::{Session, SessionState};

/// Bridge implementation for the target operating system.
#[cfg(target_os = "android")]
pub type HostBridge = android::AndroidBridge;

/// Bridge implementation for the target operating system.
#[cfg(not(target_os = "android"))]
pub type HostBridge = stub::StubBridge;

/// Construct the bridge for the target operating system.
///
/// On Android this reads the VM and application context registered with
/// `ndk-context`, so it must run after the host has attached the plugin.
pub fn platform_bridge() -> miniapp_core::error::Result<HostBridge> {
    #[cfg(target_os = "android")]
    {
        android::AndroidBridge::from_ndk_context()
    }
    #[cfg(not(target_os = "android"))]
    {
        // DESKTOP/CI: canned values so non-native builds can exercise the
        // whole dispatch path.
        Ok(stub::StubBridge::new())
    }
}
