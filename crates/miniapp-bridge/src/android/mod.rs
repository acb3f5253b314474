// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Android platform bridge via JNI.
//
// Targets `aarch64-linux-android` / `armv7-linux-androideabi`. Every trait
// method runs inside its own JNI local frame, so local references created
// while talking to the ART runtime are released when the method returns.
//
// ## Architecture notes
//
// The host plugin class (`com.example.miniapp_plugin.MiniappPlugin`) is a
// thin Java shim. It forwards its lifecycle callbacks and each method call
// into `ffi`, and provides two static hooks back into Java:
//
// - `requestUiDrain()` posts a runnable to the main looper that calls
//   `nativeRunUiTasks()`. Dialogs are built inside that drain.
// - `emitPermissionResult(String json)` forwards a permission answer to the
//   host application.

#![cfg(target_os = "android")]

pub mod ffi;

use std::sync::OnceLock;

use jni::objects::{GlobalRef, JObject, JString, JValue};
use jni::{JNIEnv, JavaVM};

use miniapp_core::error::{MiniappError, Result};
use miniapp_core::{
    AppInfo, BatteryReading, DeviceInfo, DialogButtonRole, DialogSpec, MemoryInfo, NativeView,
    NetworkStatus,
};

use crate::traits::*;

/// Local references one trait method may hold at once.
const LOCAL_FRAME_CAPACITY: i32 = 32;

/// `Build.VERSION_CODES.O`: first release with `VibrationEffect`.
const SDK_VIBRATION_EFFECT: i32 = 26;

/// `Build.VERSION_CODES.N`: first release with `ApplicationInfo.minSdkVersion`.
const SDK_MIN_SDK_FIELD: i32 = 24;

/// `VibrationEffect.DEFAULT_AMPLITUDE`.
const DEFAULT_AMPLITUDE: i32 = -1;

/// `PackageManager.PERMISSION_GRANTED`.
const PERMISSION_GRANTED: i32 = 0;

const GALLERY_CHOOSER_TITLE: &str = "Select Image";

static JAVA_VM: OnceLock<JavaVM> = OnceLock::new();

// ---------------------------------------------------------------------------
// JNI bootstrap helpers
// ---------------------------------------------------------------------------

/// The process-wide `JavaVM`, read from `ndk_context` on first use.
fn java_vm() -> Result<&'static JavaVM> {
    if let Some(vm) = JAVA_VM.get() {
        return Ok(vm);
    }
    let ctx = ndk_context::android_context();
    // SAFETY: `ctx.vm()` returns the `JavaVM*` registered through
    // `ndk_context::initialize_android_context`, valid for the lifetime of
    // the process.
    let vm = unsafe { JavaVM::from_raw(ctx.vm().cast()) }
        .map_err(|e| jni_err("failed to obtain JavaVM", e))?;
    let _ = JAVA_VM.set(vm);
    JAVA_VM
        .get()
        .ok_or_else(|| MiniappError::Bridge("JavaVM not initialised".into()))
}

/// Obtain a [`JNIEnv`] for the current thread, attaching it if needed.
fn jni_env() -> Result<JNIEnv<'static>> {
    java_vm()?
        .attach_current_thread_permanently()
        .map_err(|e| jni_err("failed to attach JNI thread", e))
}

/// Convenience: map any `jni::errors::Error` into `MiniappError::Jni`.
fn jni_err(context: &str, e: jni::errors::Error) -> MiniappError {
    MiniappError::Jni(format!("{context}: {e}"))
}

/// Run `f` inside a fresh local frame. A pending Java exception is cleared
/// and its `toString()` becomes the error message.
fn with_env<T>(
    context: &str,
    f: impl FnOnce(&mut JNIEnv<'_>) -> jni::errors::Result<T>,
) -> Result<T> {
    let mut env = jni_env()?;
    let out = env.with_local_frame(LOCAL_FRAME_CAPACITY, |env| f(env));
    out.map_err(|e| match e {
        jni::errors::Error::JavaException => {
            let detail = take_exception(&mut env).unwrap_or_else(|| "Java exception".into());
            MiniappError::Jni(format!("{context}: {detail}"))
        }
        other => jni_err(context, other),
    })
}

/// Clear the pending exception, returning its description.
fn take_exception(env: &mut JNIEnv<'_>) -> Option<String> {
    let throwable = env.exception_occurred().ok()?;
    if throwable.is_null() {
        return None;
    }
    env.exception_clear().ok()?;
    let text = env
        .call_method(&throwable, "toString", "()Ljava/lang/String;", &[])
        .ok()?
        .l()
        .ok()?;
    read_string(env, text).ok().flatten()
}

/// `java.lang.String` (possibly null) to `Option<String>`.
fn read_string(env: &mut JNIEnv<'_>, obj: JObject<'_>) -> jni::errors::Result<Option<String>> {
    if obj.is_null() {
        return Ok(None);
    }
    let s = JString::from(obj);
    Ok(Some(env.get_string(&s)?.into()))
}

/// Non-null string, empty if Java returned null.
fn read_string_or_empty(
    env: &mut JNIEnv<'_>,
    obj: JObject<'_>,
) -> jni::errors::Result<String> {
    Ok(read_string(env, obj)?.unwrap_or_default())
}

fn build_field(env: &mut JNIEnv<'_>, class: &str, name: &str) -> jni::errors::Result<String> {
    let obj = env
        .get_static_field(class, name, "Ljava/lang/String;")?
        .l()?;
    read_string_or_empty(env, obj)
}

fn sdk_int(env: &mut JNIEnv<'_>) -> jni::errors::Result<i32> {
    env.get_static_field("android/os/Build$VERSION", "SDK_INT", "I")?
        .i()
}

/// `context.getSystemService(name)`; may be null.
fn system_service<'local>(
    env: &mut JNIEnv<'local>,
    context: &JObject<'_>,
    name: &str,
) -> jni::errors::Result<JObject<'local>> {
    let j_name = env.new_string(name)?;
    env.call_method(
        context,
        "getSystemService",
        "(Ljava/lang/String;)Ljava/lang/Object;",
        &[JValue::Object(&j_name)],
    )?
    .l()
}

/// `new Intent(action)`.
fn new_intent<'local>(env: &mut JNIEnv<'local>, action: &str) -> jni::errors::Result<JObject<'local>> {
    let j_action = env.new_string(action)?;
    env.new_object(
        "android/content/Intent",
        "(Ljava/lang/String;)V",
        &[JValue::Object(&j_action)],
    )
}

// ---------------------------------------------------------------------------
// Bridge struct
// ---------------------------------------------------------------------------

/// Android implementation of the Miniapp platform bridge.
///
/// Holds a global reference to the application context; everything else is
/// looked up through JNI per call.
pub struct AndroidBridge {
    context: GlobalRef,
}

/// The foreground `Activity`.
pub struct AndroidSurface {
    activity: GlobalRef,
}

impl AndroidSurface {
    pub fn new(activity: GlobalRef) -> Self {
        Self { activity }
    }
}

impl AndroidBridge {
    pub fn new(context: GlobalRef) -> Self {
        Self { context }
    }

    /// Build from the application context registered with `ndk_context`.
    pub fn from_ndk_context() -> Result<Self> {
        let ptr = ndk_context::android_context().context();
        if ptr.is_null() {
            return Err(MiniappError::Bridge(
                "Android context is null, plugin not attached".into(),
            ));
        }
        let env = jni_env()?;
        // SAFETY: the pointer was registered as a global `jobject` for the
        // application context and stays valid for the process lifetime.
        let context = unsafe { JObject::from_raw(ptr.cast()) };
        let global = env
            .new_global_ref(&context)
            .map_err(|e| jni_err("new_global_ref(context)", e))?;
        Ok(Self::new(global))
    }

    fn ctx(&self) -> &JObject<'static> {
        self.context.as_obj()
    }
}

impl PlatformBridge for AndroidBridge {
    fn platform_name(&self) -> &str {
        "Android"
    }
}

impl HasSurface for AndroidBridge {
    type Surface = AndroidSurface;
}

// ---------------------------------------------------------------------------
// NativeDevice: android.os.Build, Configuration
// ---------------------------------------------------------------------------

impl NativeDevice for AndroidBridge {
    fn os_release(&self) -> Result<String> {
        with_env("Build.VERSION.RELEASE", |env| {
            build_field(env, "android/os/Build$VERSION", "RELEASE")
        })
    }

    fn device_info(&self) -> Result<DeviceInfo> {
        with_env("Build", |env| {
            Ok(DeviceInfo {
                platform: "Android".into(),
                version: build_field(env, "android/os/Build$VERSION", "RELEASE")?,
                model: build_field(env, "android/os/Build", "MODEL")?,
                manufacturer: build_field(env, "android/os/Build", "MANUFACTURER")?,
                sdk_version: sdk_int(env)?,
                brand: build_field(env, "android/os/Build", "BRAND")?,
                device: build_field(env, "android/os/Build", "DEVICE")?,
                product: build_field(env, "android/os/Build", "PRODUCT")?,
                hardware: build_field(env, "android/os/Build", "HARDWARE")?,
            })
        })
    }

    fn screen_layout(&self) -> Result<i32> {
        with_env("Configuration.screenLayout", |env| {
            let resources = env
                .call_method(
                    self.ctx(),
                    "getResources",
                    "()Landroid/content/res/Resources;",
                    &[],
                )?
                .l()?;
            let config = env
                .call_method(
                    &resources,
                    "getConfiguration",
                    "()Landroid/content/res/Configuration;",
                    &[],
                )?
                .l()?;
            env.get_field(&config, "screenLayout", "I")?.i()
        })
    }
}

// ---------------------------------------------------------------------------
// NativePackage: PackageManager
// ---------------------------------------------------------------------------

impl NativePackage for AndroidBridge {
    /// A `NameNotFoundException` surfaces as `MiniappError::Jni` with the
    /// exception text, which the dispatcher folds into the `error` field.
    fn app_info(&self) -> Result<AppInfo> {
        with_env("PackageManager", |env| {
            let pm = env
                .call_method(
                    self.ctx(),
                    "getPackageManager",
                    "()Landroid/content/pm/PackageManager;",
                    &[],
                )?
                .l()?;
            let package = env
                .call_method(self.ctx(), "getPackageName", "()Ljava/lang/String;", &[])?
                .l()?;

            let package_info = env
                .call_method(
                    &pm,
                    "getPackageInfo",
                    "(Ljava/lang/String;I)Landroid/content/pm/PackageInfo;",
                    &[JValue::Object(&package), JValue::Int(0)],
                )?
                .l()?;
            let app_info = env
                .call_method(
                    &pm,
                    "getApplicationInfo",
                    "(Ljava/lang/String;I)Landroid/content/pm/ApplicationInfo;",
                    &[JValue::Object(&package), JValue::Int(0)],
                )?
                .l()?;

            let label = env
                .call_method(
                    &pm,
                    "getApplicationLabel",
                    "(Landroid/content/pm/ApplicationInfo;)Ljava/lang/CharSequence;",
                    &[JValue::Object(&app_info)],
                )?
                .l()?;
            let label = env
                .call_method(&label, "toString", "()Ljava/lang/String;", &[])?
                .l()?;

            let package_name = env
                .get_field(&package_info, "packageName", "Ljava/lang/String;")?
                .l()?;
            let version_name = env
                .get_field(&package_info, "versionName", "Ljava/lang/String;")?
                .l()?;

            let min_sdk_version = if sdk_int(env)? >= SDK_MIN_SDK_FIELD {
                env.get_field(&app_info, "minSdkVersion", "I")?.i()?
            } else {
                0
            };

            Ok(AppInfo {
                package_name: read_string_or_empty(env, package_name)?,
                version_name: read_string(env, version_name)?,
                version_code: i64::from(env.get_field(&package_info, "versionCode", "I")?.i()?),
                app_name: read_string_or_empty(env, label)?,
                target_sdk_version: env.get_field(&app_info, "targetSdkVersion", "I")?.i()?,
                min_sdk_version,
                install_time: env.get_field(&package_info, "firstInstallTime", "J")?.j()?,
                update_time: env.get_field(&package_info, "lastUpdateTime", "J")?.j()?,
            })
        })
    }
}

// ---------------------------------------------------------------------------
// NativeSystem: java.lang.System, ActivityManager
// ---------------------------------------------------------------------------

impl NativeSystem for AndroidBridge {
    fn system_property(&self, key: &str) -> Result<Option<String>> {
        with_env("System.getProperty", |env| {
            let j_key = env.new_string(key)?;
            let value = env
                .call_static_method(
                    "java/lang/System",
                    "getProperty",
                    "(Ljava/lang/String;)Ljava/lang/String;",
                    &[JValue::Object(&j_key)],
                )?
                .l()?;
            read_string(env, value)
        })
    }

    fn current_time_millis(&self) -> Result<i64> {
        with_env("System.currentTimeMillis", |env| {
            env.call_static_method("java/lang/System", "currentTimeMillis", "()J", &[])?
                .j()
        })
    }

    fn memory_info(&self) -> Result<MemoryInfo> {
        with_env("ActivityManager.getMemoryInfo", |env| {
            let am = system_service(env, self.ctx(), "activity")?;
            let info = env.new_object("android/app/ActivityManager$MemoryInfo", "()V", &[])?;
            env.call_method(
                &am,
                "getMemoryInfo",
                "(Landroid/app/ActivityManager$MemoryInfo;)V",
                &[JValue::Object(&info)],
            )?;
            Ok(MemoryInfo {
                avail_mem: env.get_field(&info, "availMem", "J")?.j()?,
                total_mem: env.get_field(&info, "totalMem", "J")?.j()?,
                low_memory: env.get_field(&info, "lowMemory", "Z")?.z()?,
            })
        })
    }
}

// ---------------------------------------------------------------------------
// NativeConnectivity: ConnectivityManager
// ---------------------------------------------------------------------------

impl NativeConnectivity for AndroidBridge {
    fn network_status(&self) -> Result<NetworkStatus> {
        with_env("ConnectivityManager", |env| {
            let cm = system_service(env, self.ctx(), "connectivity")?;
            if cm.is_null() {
                return Ok(NetworkStatus::Disconnected);
            }
            let info = env
                .call_method(
                    &cm,
                    "getActiveNetworkInfo",
                    "()Landroid/net/NetworkInfo;",
                    &[],
                )?
                .l()?;
            if info.is_null() || !env.call_method(&info, "isConnected", "()Z", &[])?.z()? {
                return Ok(NetworkStatus::Disconnected);
            }
            let type_name = env
                .call_method(&info, "getTypeName", "()Ljava/lang/String;", &[])?
                .l()?;
            let subtype_name = env
                .call_method(&info, "getSubtypeName", "()Ljava/lang/String;", &[])?
                .l()?;
            Ok(NetworkStatus::Connected {
                type_name: read_string_or_empty(env, type_name)?,
                subtype_name: read_string_or_empty(env, subtype_name)?,
            })
        })
    }
}

// ---------------------------------------------------------------------------
// NativePower: sticky ACTION_BATTERY_CHANGED broadcast
// ---------------------------------------------------------------------------

impl NativePower for AndroidBridge {
    fn battery_reading(&self) -> Result<Option<BatteryReading>> {
        with_env("battery broadcast", |env| {
            let j_action = env.new_string("android.intent.action.BATTERY_CHANGED")?;
            let filter = env.new_object(
                "android/content/IntentFilter",
                "(Ljava/lang/String;)V",
                &[JValue::Object(&j_action)],
            )?;
            let status = env
                .call_method(
                    self.ctx(),
                    "registerReceiver",
                    "(Landroid/content/BroadcastReceiver;Landroid/content/IntentFilter;)Landroid/content/Intent;",
                    &[JValue::Object(&JObject::null()), JValue::Object(&filter)],
                )?
                .l()?;
            if status.is_null() {
                return Ok(None);
            }

            let mut extra = |name: &str| -> jni::errors::Result<i32> {
                let j_name = env.new_string(name)?;
                env.call_method(
                    &status,
                    "getIntExtra",
                    "(Ljava/lang/String;I)I",
                    &[JValue::Object(&j_name), JValue::Int(-1)],
                )?
                .i()
            };

            Ok(Some(BatteryReading {
                level: extra("level")?,
                scale: extra("scale")?,
                status: extra("status")?,
                plugged: extra("plugged")?,
            }))
        })
    }
}

// ---------------------------------------------------------------------------
// NativeVibrator: Vibrator / VibrationEffect
// ---------------------------------------------------------------------------

impl NativeVibrator for AndroidBridge {
    fn has_vibrator(&self) -> Result<bool> {
        with_env("Vibrator.hasVibrator", |env| {
            let vibrator = system_service(env, self.ctx(), "vibrator")?;
            if vibrator.is_null() {
                return Ok(false);
            }
            env.call_method(&vibrator, "hasVibrator", "()Z", &[])?.z()
        })
    }

    fn vibrate(&self, duration_ms: u32) -> Result<()> {
        tracing::debug!(duration_ms, "Android: vibrate");
        with_env("Vibrator.vibrate", |env| {
            let vibrator = system_service(env, self.ctx(), "vibrator")?;
            if vibrator.is_null() {
                return Err(jni::errors::Error::NullPtr("vibrator service"));
            }
            let duration = i64::from(duration_ms);
            if sdk_int(env)? >= SDK_VIBRATION_EFFECT {
                let effect = env
                    .call_static_method(
                        "android/os/VibrationEffect",
                        "createOneShot",
                        "(JI)Landroid/os/VibrationEffect;",
                        &[JValue::Long(duration), JValue::Int(DEFAULT_AMPLITUDE)],
                    )?
                    .l()?;
                env.call_method(
                    &vibrator,
                    "vibrate",
                    "(Landroid/os/VibrationEffect;)V",
                    &[JValue::Object(&effect)],
                )?;
            } else {
                env.call_method(&vibrator, "vibrate", "(J)V", &[JValue::Long(duration)])?;
            }
            Ok(())
        })
    }
}

// ---------------------------------------------------------------------------
// NativePermissions: ContextCompat / ActivityCompat
// ---------------------------------------------------------------------------

impl NativePermissions for AndroidBridge {
    fn check_permission(&self, permission: &str) -> Result<bool> {
        with_env("ContextCompat.checkSelfPermission", |env| {
            let j_permission = env.new_string(permission)?;
            let result = env
                .call_static_method(
                    "androidx/core/content/ContextCompat",
                    "checkSelfPermission",
                    "(Landroid/content/Context;Ljava/lang/String;)I",
                    &[JValue::Object(self.ctx()), JValue::Object(&j_permission)],
                )?
                .i()?;
            Ok(result == PERMISSION_GRANTED)
        })
    }

    fn request_permission(
        &self,
        surface: &AndroidSurface,
        permission: &str,
        request_code: i32,
    ) -> Result<()> {
        tracing::info!(permission, request_code, "Android: requesting permission");
        with_env("ActivityCompat.requestPermissions", |env| {
            let j_permission = env.new_string(permission)?;
            let array = env.new_object_array(1, "java/lang/String", &j_permission)?;
            env.call_static_method(
                "androidx/core/app/ActivityCompat",
                "requestPermissions",
                "(Landroid/app/Activity;[Ljava/lang/String;I)V",
                &[
                    JValue::Object(surface.activity.as_obj()),
                    JValue::Object(&array),
                    JValue::Int(request_code),
                ],
            )?;
            Ok(())
        })
    }
}

// ---------------------------------------------------------------------------
// NativeViews: Intents launched from the activity
// ---------------------------------------------------------------------------

impl NativeViews for AndroidBridge {
    fn open_view(&self, surface: &AndroidSurface, view: NativeView) -> Result<()> {
        tracing::info!(?view, "Android: opening native view");
        with_env("startActivity", |env| {
            let intent = match view {
                NativeView::Settings => {
                    let intent = new_intent(env, "android.settings.APPLICATION_DETAILS_SETTINGS")?;
                    let package = env
                        .call_method(self.ctx(), "getPackageName", "()Ljava/lang/String;", &[])?
                        .l()?;
                    let package = read_string_or_empty(env, package)?;
                    let j_uri = env.new_string(format!("package:{package}"))?;
                    let uri = env
                        .call_static_method(
                            "android/net/Uri",
                            "parse",
                            "(Ljava/lang/String;)Landroid/net/Uri;",
                            &[JValue::Object(&j_uri)],
                        )?
                        .l()?;
                    env.call_method(
                        &intent,
                        "setData",
                        "(Landroid/net/Uri;)Landroid/content/Intent;",
                        &[JValue::Object(&uri)],
                    )?;
                    intent
                }
                NativeView::Gallery => {
                    let intent = new_intent(env, "android.intent.action.VIEW")?;
                    let j_type = env.new_string("image/*")?;
                    env.call_method(
                        &intent,
                        "setType",
                        "(Ljava/lang/String;)Landroid/content/Intent;",
                        &[JValue::Object(&j_type)],
                    )?;
                    let j_title = env.new_string(GALLERY_CHOOSER_TITLE)?;
                    env.call_static_method(
                        "android/content/Intent",
                        "createChooser",
                        "(Landroid/content/Intent;Ljava/lang/CharSequence;)Landroid/content/Intent;",
                        &[JValue::Object(&intent), JValue::Object(&j_title)],
                    )?
                    .l()?
                }
            };

            env.call_method(
                surface.activity.as_obj(),
                "startActivity",
                "(Landroid/content/Intent;)V",
                &[JValue::Object(&intent)],
            )?;
            Ok(())
        })
    }
}

// ---------------------------------------------------------------------------
// NativeDialogs: AlertDialog.Builder (UI thread only)
// ---------------------------------------------------------------------------

impl NativeDialogs for AndroidBridge {
    /// Buttons get a null click listener, so any press just dismisses.
    fn show_dialog(&self, surface: &AndroidSurface, spec: &DialogSpec) -> Result<()> {
        const BUILDER: &str = "android/app/AlertDialog$Builder";
        const SET_TEXT: &str = "(Ljava/lang/CharSequence;)Landroid/app/AlertDialog$Builder;";
        const SET_BUTTON: &str = "(Ljava/lang/CharSequence;Landroid/content/DialogInterface$OnClickListener;)Landroid/app/AlertDialog$Builder;";

        tracing::debug!(buttons = spec.buttons.len(), "Android: showing dialog");
        with_env("AlertDialog", |env| {
            let builder = env.new_object(
                BUILDER,
                "(Landroid/content/Context;)V",
                &[JValue::Object(surface.activity.as_obj())],
            )?;

            if let Some(title) = &spec.title {
                let j_title = env.new_string(title)?;
                env.call_method(&builder, "setTitle", SET_TEXT, &[JValue::Object(&j_title)])?;
            }
            if let Some(message) = &spec.message {
                let j_message = env.new_string(message)?;
                env.call_method(&builder, "setMessage", SET_TEXT, &[JValue::Object(&j_message)])?;
            }

            for button in &spec.buttons {
                let setter = match button.role {
                    DialogButtonRole::Positive => "setPositiveButton",
                    DialogButtonRole::Negative => "setNegativeButton",
                    DialogButtonRole::Neutral => "setNeutralButton",
                };
                let j_label = env.new_string(&button.label)?;
                env.call_method(
                    &builder,
                    setter,
                    SET_BUTTON,
                    &[JValue::Object(&j_label), JValue::Object(&JObject::null())],
                )?;
            }

            env.call_method(&builder, "show", "()Landroid/app/AlertDialog;", &[])?;
            Ok(())
        })
    }
}
