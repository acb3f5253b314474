// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge dispatcher: routes a named method call to its handler.
//
// Failure policy, per handler:
//
// - Multi-field lookups (app info, battery) never fail the call; a failed
//   lookup becomes an `error` entry in the returned map.
// - Actions (views, permission prompts, dialogs, vibration) resolve to an
//   `Outcome`, reported as a boolean on the wire.
// - Arguments that are missing or mistyped fail with `INVALID_ARGUMENT`.
// - Anything else, including a panic inside a handler, fails with
//   `NATIVE_ERROR`.
// - Unknown method names answer `NotImplemented`.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use miniapp_core::error::Result;
use miniapp_core::{
    Arguments, BatteryInfo, BridgeConfig, DialogSpec, MethodCall, MethodResponse, MiniappError,
    NativeView, NetworkStatus, Outcome, PermissionStatus, Value, is_large_screen, value_map,
};

use crate::executor::UiExecutor;
use crate::permissions::PermissionRegistry;
use crate::session::Session;
use crate::traits::PlatformBridge;

/// The twelve operations the bridge answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    PlatformVersion,
    DeviceInfo,
    IsTablet,
    AppInfo,
    OpenNativeView,
    CallNativeMethod,
    HasPermission,
    RequestPermission,
    NetworkInfo,
    ShowNativeDialog,
    Vibrate,
    BatteryInfo,
}

impl Method {
    pub const ALL: [Self; 12] = [
        Self::PlatformVersion,
        Self::DeviceInfo,
        Self::IsTablet,
        Self::AppInfo,
        Self::OpenNativeView,
        Self::CallNativeMethod,
        Self::HasPermission,
        Self::RequestPermission,
        Self::NetworkInfo,
        Self::ShowNativeDialog,
        Self::Vibrate,
        Self::BatteryInfo,
    ];

    /// Method name on the wire.
    pub fn name(self) -> &'static str {
        match self {
            Self::PlatformVersion => "getPlatformVersion",
            Self::DeviceInfo => "getDeviceInfo",
            Self::IsTablet => "isTablet",
            Self::AppInfo => "getAppInfo",
            Self::OpenNativeView => "openNativeView",
            Self::CallNativeMethod => "callNativeMethod",
            Self::HasPermission => "hasPermission",
            Self::RequestPermission => "requestPermission",
            Self::NetworkInfo => "getNetworkInfo",
            Self::ShowNativeDialog => "showNativeDialog",
            Self::Vibrate => "vibrate",
            Self::BatteryInfo => "getBatteryInfo",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }
}

pub struct Dispatcher<P: PlatformBridge> {
    platform: Arc<P>,
    session: Arc<Session<P::Surface>>,
    executor: Arc<dyn UiExecutor>,
    permissions: Arc<PermissionRegistry>,
    config: BridgeConfig,
}

impl<P: PlatformBridge> Dispatcher<P> {
    pub fn new(
        platform: Arc<P>,
        session: Arc<Session<P::Surface>>,
        executor: Arc<dyn UiExecutor>,
        permissions: Arc<PermissionRegistry>,
        config: BridgeConfig,
    ) -> Self {
        Self {
            platform,
            session,
            executor,
            permissions,
            config,
        }
    }

    pub fn platform(&self) -> &Arc<P> {
        &self.platform
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Answer one call. Never panics and never propagates an error.
    pub fn dispatch(&self, call: &MethodCall) -> MethodResponse {
        let Some(method) = Method::from_name(&call.method) else {
            tracing::debug!(method = %call.method, "method not implemented");
            return MethodResponse::NotImplemented;
        };

        tracing::debug!(method = method.name(), "dispatching");
        let outcome = catch_unwind(AssertUnwindSafe(|| self.handle(method, &call.arguments)));

        match outcome {
            Ok(Ok(value)) => MethodResponse::Success(value),
            Ok(Err(e)) => {
                tracing::warn!(method = method.name(), error = %e, "method failed");
                e.into()
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(method = method.name(), %message, "handler panicked");
                MiniappError::Native(message).into()
            }
        }
    }

    /// Operations that read no keys ignore whatever argument value came in.
    fn handle(&self, method: Method, arguments: &Value) -> Result<Value> {
        let args = || Arguments::from_value(arguments);
        match method {
            Method::PlatformVersion => self.platform_version().map(Value::from),
            Method::DeviceInfo => Ok(self.platform.device_info()?.to_value()),
            Method::IsTablet => self.is_tablet().map(Value::from),
            Method::AppInfo => Ok(self.app_info()),
            Method::OpenNativeView => {
                let args = args()?;
                let view_type = args.require_str("viewType")?;
                // Accepted for forward compatibility; no view reads them yet.
                let _params = args.nested("params")?;
                Ok(self.open_native_view(view_type).into_flag().into())
            }
            Method::CallNativeMethod => {
                let args = args()?;
                let name = args.require_str("method")?;
                self.call_native_method(name, args.nested("params")?)
            }
            Method::HasPermission => {
                let permission = args()?.require_str("permission")?;
                self.platform.check_permission(permission).map(Value::from)
            }
            Method::RequestPermission => {
                let permission = args()?.require_str("permission")?;
                let granted = matches!(
                    self.request_permission(permission)?,
                    Outcome::Ok(PermissionStatus::Granted)
                );
                Ok(granted.into())
            }
            Method::NetworkInfo => Ok(self.network_info().into()),
            Method::ShowNativeDialog => {
                let args = args()?;
                let spec = DialogSpec::new(
                    args.opt_str("title")?,
                    args.opt_str("message")?,
                    &args.opt_str_list("buttons")?.unwrap_or_default(),
                    self.config.max_dialog_buttons,
                    &self.config.default_dialog_label,
                );
                Ok(self.show_native_dialog(spec).into_flag().into())
            }
            Method::Vibrate => {
                // A non-map argument carries no duration.
                let args = args().unwrap_or_else(|_| Arguments::empty());
                let duration = vibration_duration(&args, self.config.default_vibration_ms);
                Ok(self.vibrate(duration).into_flag().into())
            }
            Method::BatteryInfo => Ok(self.battery_info()),
        }
    }

    // -- Queries -------------------------------------------------------------

    pub fn platform_version(&self) -> Result<String> {
        Ok(format!(
            "{} {}",
            self.platform.platform_name(),
            self.platform.os_release()?
        ))
    }

    pub fn is_tablet(&self) -> Result<bool> {
        Ok(is_large_screen(self.platform.screen_layout()?))
    }

    /// Package metadata, or a map holding only `error`.
    pub fn app_info(&self) -> Value {
        match self.platform.app_info() {
            Ok(info) => info.to_value(),
            Err(e) => {
                tracing::warn!(error = %e, "app info lookup failed");
                value_map! { "error" => e.to_string() }
            }
        }
    }

    /// Battery state, or a map holding only `error`.
    pub fn battery_info(&self) -> Value {
        let error = match self.platform.battery_reading() {
            Ok(Some(reading)) => match BatteryInfo::from_reading(&reading) {
                Some(info) => return info.to_value(),
                None => format!(
                    "invalid battery level {}/{}",
                    reading.level, reading.scale
                ),
            },
            Ok(None) => "battery status unavailable".to_owned(),
            Err(e) => e.to_string(),
        };
        tracing::warn!(%error, "battery info lookup failed");
        value_map! { "error" => error }
    }

    pub fn network_info(&self) -> String {
        match self.platform.network_status() {
            Ok(status) => status.describe(),
            Err(e) => {
                tracing::warn!(error = %e, "connectivity lookup failed");
                NetworkStatus::Disconnected.describe()
            }
        }
    }

    fn call_native_method(&self, name: &str, params: Arguments<'_>) -> Result<Value> {
        match name {
            "getSystemProperty" => {
                let key = params.require_str("key")?;
                Ok(self.platform.system_property(key)?.into())
            }
            "getCurrentTime" => Ok(self.platform.current_time_millis()?.into()),
            "getAvailableMemory" => Ok(self.platform.memory_info()?.to_value()),
            other => {
                tracing::debug!(method = other, "unknown native method");
                Ok(Value::Null)
            }
        }
    }

    // -- Actions -------------------------------------------------------------

    pub fn open_native_view(&self, view_type: &str) -> Outcome {
        let Some(view) = NativeView::from_tag(view_type) else {
            return Outcome::Unavailable(format!("unknown view type `{view_type}`"));
        };
        let Some(surface) = self.session.surface() else {
            return Outcome::Unavailable("no surface attached".into());
        };
        match self.platform.open_view(&surface, view) {
            Ok(()) => Outcome::Ok(()),
            Err(e) => {
                tracing::warn!(view_type, error = %e, "opening native view failed");
                Outcome::Failed(e.to_string())
            }
        }
    }

    /// Check, and if needed prompt for, a permission.
    ///
    /// `Err` only when the check itself fails.
    pub fn request_permission(&self, permission: &str) -> Result<Outcome<PermissionStatus>> {
        let Some(surface) = self.session.surface() else {
            return Ok(Outcome::Unavailable("no surface attached".into()));
        };
        if self.platform.check_permission(permission)? {
            return Ok(Outcome::Ok(PermissionStatus::Granted));
        }

        let request_code = self.permissions.register(permission);
        match self
            .platform
            .request_permission(&surface, permission, request_code)
        {
            Ok(()) => Ok(Outcome::Ok(PermissionStatus::Requested { request_code })),
            Err(e) => {
                self.permissions.cancel(request_code);
                tracing::warn!(permission, error = %e, "permission request failed");
                Ok(Outcome::Failed(e.to_string()))
            }
        }
    }

    /// Schedule the dialog on the UI thread. `Ok` means scheduled, not shown.
    pub fn show_native_dialog(&self, spec: DialogSpec) -> Outcome {
        let Some(surface) = self.session.surface() else {
            return Outcome::Unavailable("no surface attached".into());
        };
        let platform = Arc::clone(&self.platform);
        let task = Box::new(move || {
            if let Err(e) = platform.show_dialog(&surface, &spec) {
                tracing::warn!(error = %e, "native dialog failed");
            }
        });
        match self.executor.post(task) {
            Ok(()) => Outcome::Ok(()),
            Err(e) => Outcome::Failed(e.to_string()),
        }
    }

    pub fn vibrate(&self, duration_ms: u32) -> Outcome {
        match self.platform.has_vibrator() {
            Ok(true) => {}
            Ok(false) => return Outcome::Unavailable("no vibrator".into()),
            Err(e) => return Outcome::Failed(e.to_string()),
        }
        match self.platform.vibrate(duration_ms) {
            Ok(()) => Outcome::Ok(()),
            Err(e) => {
                tracing::warn!(duration_ms, error = %e, "vibration failed");
                Outcome::Failed(e.to_string())
            }
        }
    }
}

/// `duration` if it is a positive integer that fits, else `default_ms`.
fn vibration_duration(args: &Arguments<'_>, default_ms: u32) -> u32 {
    args.get("duration")
        .and_then(Value::as_i64)
        .filter(|ms| *ms > 0)
        .and_then(|ms| u32::try_from(ms).ok())
        .unwrap_or(default_ms)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{InlineExecutor, QueuedExecutor};
    use crate::stub::{StubAction, StubBridge, StubProfile, StubSurface};
    use miniapp_core::error::{INVALID_ARGUMENT, NATIVE_ERROR};
    use miniapp_core::{DialogButtonRole, NOT_CONNECTED};

    const CAMERA: &str = "android.permission.CAMERA";

    struct Fixture {
        bridge: Arc<StubBridge>,
        session: Arc<Session<StubSurface>>,
        dispatcher: Dispatcher<StubBridge>,
    }

    fn fixture_with(profile: StubProfile, executor: Arc<dyn UiExecutor>) -> Fixture {
        let bridge = Arc::new(StubBridge::with_profile(profile));
        let session = Arc::new(Session::new());
        let dispatcher = Dispatcher::new(
            Arc::clone(&bridge),
            Arc::clone(&session),
            executor,
            Arc::new(PermissionRegistry::new(1)),
            BridgeConfig::default(),
        );
        Fixture {
            bridge,
            session,
            dispatcher,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(StubProfile::default(), Arc::new(InlineExecutor))
    }

    fn attached(profile: StubProfile) -> Fixture {
        let f = fixture_with(profile, Arc::new(InlineExecutor));
        f.session.attach(StubSurface::new("main"));
        f
    }

    fn call(f: &Fixture, method: &str, args: Value) -> MethodResponse {
        f.dispatcher.dispatch(&MethodCall::new(method, args))
    }

    fn success(resp: MethodResponse) -> Value {
        match resp {
            MethodResponse::Success(v) => v,
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[test]
    fn method_names_round_trip() {
        for m in Method::ALL {
            assert_eq!(Method::from_name(m.name()), Some(m));
        }
        assert_eq!(Method::from_name("unknownOp"), None);
    }

    #[test]
    fn unknown_method_is_not_implemented() {
        let f = fixture();
        assert_eq!(
            call(&f, "unknownOp", Value::Null),
            MethodResponse::NotImplemented
        );
    }

    #[test]
    fn every_method_answers_without_arguments_or_surface() {
        let f = fixture();
        let shapes = [Value::Null, Value::from("x"), Value::List(vec![])];
        for m in Method::ALL {
            for args in &shapes {
                let resp = call(&f, m.name(), args.clone());
                assert_ne!(resp, MethodResponse::NotImplemented, "{}", m.name());
                if let MethodResponse::Error { code, .. } = &resp {
                    assert_eq!(code, INVALID_ARGUMENT, "{} with {args:?}", m.name());
                }
            }
        }
    }

    #[test]
    fn keyless_methods_ignore_non_map_arguments() {
        let f = fixture();
        let keyless = [
            Method::PlatformVersion,
            Method::DeviceInfo,
            Method::IsTablet,
            Method::AppInfo,
            Method::NetworkInfo,
            Method::BatteryInfo,
        ];
        for m in keyless {
            for args in [Value::from("x"), Value::List(vec![]), Value::Int(7)] {
                let resp = call(&f, m.name(), args.clone());
                assert!(resp.is_success(), "{} with {args:?}: {resp:?}", m.name());
            }
        }
    }

    #[test]
    fn vibrate_with_non_map_arguments_uses_the_default() {
        let f = fixture_with(
            StubProfile {
                has_vibrator: true,
                ..StubProfile::default()
            },
            Arc::new(InlineExecutor),
        );
        for args in [Value::from("x"), Value::List(vec![])] {
            assert_eq!(call(&f, "vibrate", args), MethodResponse::success(true));
        }
        assert_eq!(
            f.bridge.actions(),
            vec![StubAction::Vibrated { duration_ms: 200 }; 2]
        );
    }

    #[test]
    fn keyed_methods_reject_non_map_arguments() {
        let f = fixture();
        let keyed = [
            "openNativeView",
            "callNativeMethod",
            "hasPermission",
            "requestPermission",
        ];
        for name in keyed {
            match call(&f, name, Value::from("x")) {
                MethodResponse::Error { code, .. } => {
                    assert_eq!(code, INVALID_ARGUMENT, "{name}")
                }
                other => panic!("{name}: expected error, got {other:?}"),
            }
        }
    }

    #[test]
    fn platform_version_prefixes_platform_name() {
        let f = fixture();
        let v = success(call(&f, "getPlatformVersion", Value::Null));
        assert_eq!(v.as_str(), Some("Desktop (stub) 0.0"));
    }

    #[test]
    fn device_info_has_the_nine_fields() {
        let f = fixture();
        let v = success(call(&f, "getDeviceInfo", Value::Null));
        let map = v.as_map().expect("map");
        let mut keys: Vec<_> = map.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec![
                "brand",
                "device",
                "hardware",
                "manufacturer",
                "model",
                "platform",
                "product",
                "sdk_version",
                "version",
            ]
        );
        assert!(map["sdk_version"].as_i64().is_some());
    }

    #[test]
    fn tablet_follows_screen_layout() {
        let f = fixture_with(
            StubProfile {
                screen_layout: 0x04,
                ..StubProfile::default()
            },
            Arc::new(InlineExecutor),
        );
        assert_eq!(success(call(&f, "isTablet", Value::Null)), Value::Bool(true));
        assert_eq!(
            success(call(&fixture(), "isTablet", Value::Null)),
            Value::Bool(false)
        );
    }

    #[test]
    fn app_info_failure_stays_inside_the_map() {
        let f = fixture_with(
            StubProfile {
                app: None,
                ..StubProfile::default()
            },
            Arc::new(InlineExecutor),
        );
        let v = success(call(&f, "getAppInfo", Value::Null));
        let map = v.as_map().expect("map");
        assert_eq!(map.len(), 1);
        assert!(map["error"].as_str().expect("message").contains("NameNotFound"));
    }

    #[test]
    fn app_info_fields() {
        let v = success(call(&fixture(), "getAppInfo", Value::Null));
        assert_eq!(
            v.get("packageName").and_then(Value::as_str),
            Some("dev.miniapp.probe")
        );
        assert_eq!(v.get("targetSdkVersion"), Some(&Value::Int(34)));
        assert!(v.get("error").is_none());
    }

    #[test]
    fn open_native_view_needs_surface() {
        let f = fixture();
        let args = value_map! { "viewType" => "settings" };
        assert_eq!(
            success(call(&f, "openNativeView", args.clone())),
            Value::Bool(false)
        );

        f.session.attach(StubSurface::new("main"));
        assert_eq!(success(call(&f, "openNativeView", args)), Value::Bool(true));
        assert_eq!(
            f.bridge.actions(),
            vec![StubAction::OpenedView {
                surface: "main".into(),
                view: NativeView::Settings,
            }]
        );
    }

    #[test]
    fn open_native_view_unknown_tag_is_false() {
        let f = attached(StubProfile::default());
        let args = value_map! { "viewType" => "camera", "params" => value_map! {} };
        assert_eq!(success(call(&f, "openNativeView", args)), Value::Bool(false));
        assert!(f.bridge.actions().is_empty());
    }

    #[test]
    fn open_native_view_os_failure_is_false() {
        let f = attached(StubProfile {
            fail_actions: true,
            ..StubProfile::default()
        });
        assert!(matches!(
            f.dispatcher.open_native_view("gallery"),
            Outcome::Failed(_)
        ));
        let args = value_map! { "viewType" => "gallery" };
        assert_eq!(success(call(&f, "openNativeView", args)), Value::Bool(false));
    }

    #[test]
    fn open_native_view_without_view_type_is_a_decode_error() {
        let f = attached(StubProfile::default());
        let resp = call(&f, "openNativeView", value_map! { "viewType" => 3 });
        assert_eq!(resp.error_code(), Some(INVALID_ARGUMENT));
    }

    #[test]
    fn call_native_method_tags() {
        let f = fixture();

        let args = value_map! {
            "method" => "getSystemProperty",
            "params" => value_map! { "key" => "os.arch" },
        };
        assert_eq!(
            success(call(&f, "callNativeMethod", args)).as_str(),
            Some(std::env::consts::ARCH)
        );

        let args = value_map! { "method" => "getCurrentTime" };
        assert!(success(call(&f, "callNativeMethod", args)).as_i64().expect("millis") > 0);

        let args = value_map! { "method" => "getAvailableMemory" };
        let mem = success(call(&f, "callNativeMethod", args));
        assert_eq!(mem.get("lowMemory"), Some(&Value::Bool(false)));
        assert!(mem.get("totalMem").and_then(Value::as_i64).is_some());

        let args = value_map! { "method" => "reboot" };
        assert_eq!(success(call(&f, "callNativeMethod", args)), Value::Null);
    }

    #[test]
    fn system_property_without_key_is_a_decode_error() {
        let f = fixture();
        let args = value_map! { "method" => "getSystemProperty" };
        assert_eq!(
            call(&f, "callNativeMethod", args).error_code(),
            Some(INVALID_ARGUMENT)
        );
    }

    #[test]
    fn has_permission_reflects_grants() {
        let f = fixture();
        let args = value_map! { "permission" => CAMERA };
        assert_eq!(
            success(call(&f, "hasPermission", args.clone())),
            Value::Bool(false)
        );
        f.bridge.grant(CAMERA);
        assert_eq!(success(call(&f, "hasPermission", args)), Value::Bool(true));
    }

    #[test]
    fn request_permission_without_surface_is_false() {
        let f = fixture();
        f.bridge.grant(CAMERA);
        let args = value_map! { "permission" => CAMERA };
        assert_eq!(
            success(call(&f, "requestPermission", args)),
            Value::Bool(false)
        );
        assert!(f.bridge.actions().is_empty());
    }

    #[test]
    fn request_permission_prompts_only_when_needed() {
        let f = attached(StubProfile::default());
        let args = value_map! { "permission" => CAMERA };

        assert_eq!(
            success(call(&f, "requestPermission", args.clone())),
            Value::Bool(false)
        );
        assert_eq!(
            f.bridge.actions(),
            vec![StubAction::RequestedPermission {
                permission: CAMERA.into(),
                request_code: 1,
            }]
        );

        f.bridge.grant(CAMERA);
        assert_eq!(
            success(call(&f, "requestPermission", args)),
            Value::Bool(true)
        );
        assert_eq!(f.bridge.actions().len(), 1);
    }

    #[test]
    fn network_info_describes_connection() {
        let v = success(call(&fixture(), "getNetworkInfo", Value::Null));
        assert_eq!(v.as_str(), Some("WIFI - "));

        let f = fixture_with(
            StubProfile {
                network: NetworkStatus::Disconnected,
                ..StubProfile::default()
            },
            Arc::new(InlineExecutor),
        );
        let v = success(call(&f, "getNetworkInfo", Value::Null));
        assert_eq!(v.as_str(), Some(NOT_CONNECTED));
    }

    #[test]
    fn dialog_truncates_buttons() {
        let f = attached(StubProfile::default());
        let args = value_map! {
            "title" => "T",
            "message" => "M",
            "buttons" => vec!["A", "B", "C", "D"],
        };
        assert_eq!(success(call(&f, "showNativeDialog", args)), Value::Bool(true));

        let actions = f.bridge.actions();
        let [StubAction::ShowedDialog { spec, .. }] = actions.as_slice() else {
            panic!("expected one dialog, got {actions:?}");
        };
        assert_eq!(spec.title.as_deref(), Some("T"));
        assert_eq!(spec.message.as_deref(), Some("M"));
        let buttons: Vec<_> = spec
            .buttons
            .iter()
            .map(|b| (b.role, b.label.as_str()))
            .collect();
        assert_eq!(
            buttons,
            vec![
                (DialogButtonRole::Positive, "A"),
                (DialogButtonRole::Negative, "B"),
                (DialogButtonRole::Neutral, "C"),
            ]
        );
    }

    #[test]
    fn dialog_without_buttons_gets_ok() {
        let f = attached(StubProfile::default());
        let args = value_map! { "title" => "T", "buttons" => Vec::<Value>::new() };
        assert_eq!(success(call(&f, "showNativeDialog", args)), Value::Bool(true));

        let actions = f.bridge.actions();
        let [StubAction::ShowedDialog { spec, .. }] = actions.as_slice() else {
            panic!("expected one dialog, got {actions:?}");
        };
        assert_eq!(spec.buttons.len(), 1);
        assert_eq!(spec.buttons[0].label, "OK");
        assert_eq!(spec.buttons[0].role, DialogButtonRole::Positive);
    }

    #[test]
    fn dialog_without_surface_is_not_scheduled() {
        let exec = Arc::new(QueuedExecutor::new(|| Ok(())));
        let f = fixture_with(StubProfile::default(), exec.clone());
        let args = value_map! { "title" => "T" };
        assert_eq!(
            success(call(&f, "showNativeDialog", args)),
            Value::Bool(false)
        );
        assert_eq!(exec.pending(), 0);
    }

    #[test]
    fn dialog_is_built_on_the_ui_executor() {
        let exec = Arc::new(QueuedExecutor::new(|| Ok(())));
        let f = fixture_with(StubProfile::default(), exec.clone());
        f.session.attach(StubSurface::new("main"));

        let args = value_map! { "title" => "T" };
        assert_eq!(success(call(&f, "showNativeDialog", args)), Value::Bool(true));
        // Returned before anything was shown.
        assert!(f.bridge.actions().is_empty());

        // Surface may go away before the UI thread gets to it; the task
        // still holds its snapshot.
        f.session.detach();
        assert_eq!(exec.run_pending(), 1);
        assert_eq!(f.bridge.actions().len(), 1);
    }

    #[test]
    fn vibrate_defaults_to_configured_duration() {
        let f = fixture_with(
            StubProfile {
                has_vibrator: true,
                ..StubProfile::default()
            },
            Arc::new(InlineExecutor),
        );
        assert_eq!(success(call(&f, "vibrate", Value::Null)), Value::Bool(true));
        assert_eq!(
            success(call(&f, "vibrate", value_map! { "duration" => "long" })),
            Value::Bool(true)
        );
        assert_eq!(
            success(call(&f, "vibrate", value_map! { "duration" => -5 })),
            Value::Bool(true)
        );
        assert_eq!(
            success(call(&f, "vibrate", value_map! { "duration" => 50 })),
            Value::Bool(true)
        );
        assert_eq!(
            f.bridge.actions(),
            vec![
                StubAction::Vibrated { duration_ms: 200 },
                StubAction::Vibrated { duration_ms: 200 },
                StubAction::Vibrated { duration_ms: 200 },
                StubAction::Vibrated { duration_ms: 50 },
            ]
        );
    }

    #[test]
    fn vibrate_without_hardware_is_unavailable() {
        let f = fixture();
        assert!(matches!(f.dispatcher.vibrate(200), Outcome::Unavailable(_)));
        assert_eq!(success(call(&f, "vibrate", Value::Null)), Value::Bool(false));
    }

    #[test]
    fn vibrate_failure_is_false() {
        let f = fixture_with(
            StubProfile {
                has_vibrator: true,
                fail_actions: true,
                ..StubProfile::default()
            },
            Arc::new(InlineExecutor),
        );
        assert!(matches!(f.dispatcher.vibrate(200), Outcome::Failed(_)));
    }

    #[test]
    fn battery_info_fields() {
        let v = success(call(&fixture(), "getBatteryInfo", Value::Null));
        assert_eq!(v.get("level"), Some(&Value::Int(100)));
        assert_eq!(v.get("isCharging"), Some(&Value::Bool(true)));
        assert_eq!(v.get("acCharge"), Some(&Value::Bool(true)));
        assert_eq!(v.get("usbCharge"), Some(&Value::Bool(false)));
        assert_eq!(v.get("status"), Some(&Value::Int(5)));
    }

    #[test]
    fn battery_unavailable_yields_only_error() {
        let f = fixture_with(
            StubProfile {
                battery: None,
                ..StubProfile::default()
            },
            Arc::new(InlineExecutor),
        );
        let v = success(call(&f, "getBatteryInfo", Value::Null));
        let map = v.as_map().expect("map");
        assert_eq!(map.len(), 1);
        assert!(map.contains_key("error"));
    }

    #[test]
    fn non_map_arguments_are_rejected() {
        let resp = call(&fixture(), "hasPermission", Value::from("CAMERA"));
        assert_eq!(resp.error_code(), Some(INVALID_ARGUMENT));
    }

    #[test]
    fn panicking_platform_becomes_native_error() {
        struct Panicky;
        impl crate::traits::HasSurface for Panicky {
            type Surface = ();
        }
        impl crate::traits::NativeDevice for Panicky {
            fn os_release(&self) -> Result<String> {
                panic!("release exploded")
            }
            fn device_info(&self) -> Result<miniapp_core::DeviceInfo> {
                Err(MiniappError::PlatformUnavailable)
            }
            fn screen_layout(&self) -> Result<i32> {
                Err(MiniappError::PlatformUnavailable)
            }
        }
        impl crate::traits::NativePackage for Panicky {
            fn app_info(&self) -> Result<miniapp_core::AppInfo> {
                Err(MiniappError::PlatformUnavailable)
            }
        }
        impl crate::traits::NativeSystem for Panicky {
            fn system_property(&self, _key: &str) -> Result<Option<String>> {
                Err(MiniappError::PlatformUnavailable)
            }
            fn current_time_millis(&self) -> Result<i64> {
                Err(MiniappError::PlatformUnavailable)
            }
            fn memory_info(&self) -> Result<miniapp_core::MemoryInfo> {
                Err(MiniappError::PlatformUnavailable)
            }
        }
        impl crate::traits::NativeConnectivity for Panicky {
            fn network_status(&self) -> Result<NetworkStatus> {
                Err(MiniappError::PlatformUnavailable)
            }
        }
        impl crate::traits::NativePower for Panicky {
            fn battery_reading(&self) -> Result<Option<miniapp_core::BatteryReading>> {
                Err(MiniappError::PlatformUnavailable)
            }
        }
        impl crate::traits::NativeVibrator for Panicky {
            fn has_vibrator(&self) -> Result<bool> {
                Err(MiniappError::PlatformUnavailable)
            }
            fn vibrate(&self, _duration_ms: u32) -> Result<()> {
                Err(MiniappError::PlatformUnavailable)
            }
        }
        impl crate::traits::NativePermissions for Panicky {
            fn check_permission(&self, _permission: &str) -> Result<bool> {
                Err(MiniappError::PlatformUnavailable)
            }
            fn request_permission(&self, _: &(), _: &str, _: i32) -> Result<()> {
                Err(MiniappError::PlatformUnavailable)
            }
        }
        impl crate::traits::NativeViews for Panicky {
            fn open_view(&self, _: &(), _: NativeView) -> Result<()> {
                Err(MiniappError::PlatformUnavailable)
            }
        }
        impl crate::traits::NativeDialogs for Panicky {
            fn show_dialog(&self, _: &(), _: &DialogSpec) -> Result<()> {
                Err(MiniappError::PlatformUnavailable)
            }
        }
        impl PlatformBridge for Panicky {
            fn platform_name(&self) -> &str {
                "Panicky"
            }
        }

        let dispatcher = Dispatcher::new(
            Arc::new(Panicky),
            Arc::new(Session::new()),
            Arc::new(InlineExecutor),
            Arc::new(PermissionRegistry::new(1)),
            BridgeConfig::default(),
        );
        let resp = dispatcher.dispatch(&MethodCall::new("getPlatformVersion", Value::Null));
        match resp {
            MethodResponse::Error {
                code,
                message,
                details,
            } => {
                assert_eq!(code, NATIVE_ERROR);
                assert_eq!(message.as_deref(), Some("release exploded"));
                assert!(details.is_none());
            }
            other => panic!("expected error, got {other:?}"),
        }

        // Total failures of a multi-field lookup still answer in-band.
        let v = dispatcher.dispatch(&MethodCall::new("getBatteryInfo", Value::Null));
        assert!(v.success_value().and_then(|v| v.get("error")).is_some());
        let v = dispatcher.dispatch(&MethodCall::new("getNetworkInfo", Value::Null));
        assert_eq!(
            v.success_value().and_then(Value::as_str),
            Some(NOT_CONNECTED)
        );
    }
}
