// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// JNI entry points called by the Java shim `MiniappPlugin`.
//
// Method calls cross as JSON strings: `{"method": ..., "arguments": ...}` in,
// a serialised `MethodResponse` out. Nothing here may unwind into the JVM,
// so every export runs behind `catch_unwind`.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use jni::JNIEnv;
use jni::objects::{GlobalRef, JClass, JIntArray, JObject, JObjectArray, JString, JValue};
use jni::sys::{jint, jstring};

use miniapp_core::error::{MiniappError, Result};
use miniapp_core::{BridgeConfig, MethodCall, MethodResponse, PermissionEvent, Value};

use super::{AndroidBridge, AndroidSurface, jni_err, with_env};
use crate::executor::QueuedExecutor;
use crate::permissions::EventSink;
use crate::plugin::MiniappPlugin;

struct Host {
    plugin: MiniappPlugin<AndroidBridge>,
    executor: Arc<QueuedExecutor>,
}

static HOST: RwLock<Option<Arc<Host>>> = RwLock::new(None);

/// `ndk_context` may only be initialised once per process.
static NDK_CONTEXT_READY: AtomicBool = AtomicBool::new(false);

fn host() -> Option<Arc<Host>> {
    HOST.read().unwrap_or_else(PoisonError::into_inner).clone()
}

/// Run an export body, logging errors and swallowing panics.
fn guarded<R>(label: &str, f: impl FnOnce() -> Result<R>) -> Option<R> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(r)) => Some(r),
        Ok(Err(e)) => {
            tracing::error!(export = label, error = %e, "JNI export failed");
            None
        }
        Err(_) => {
            tracing::error!(export = label, "JNI export panicked");
            None
        }
    }
}

/// Calls `MiniappPlugin.requestUiDrain()` so the shim schedules
/// `nativeRunUiTasks` on the main looper.
fn request_ui_drain(class: &GlobalRef) -> Result<()> {
    with_env("MiniappPlugin.requestUiDrain", |env| {
        let class: &JClass = class.as_obj().into();
        env.call_static_method(class, "requestUiDrain", "()V", &[])?;
        Ok(())
    })
}

/// Forwards permission answers to `MiniappPlugin.emitPermissionResult(String)`.
struct JavaEventSink {
    class: GlobalRef,
}

impl EventSink for JavaEventSink {
    fn emit(&self, event: PermissionEvent) {
        let json = match serde_json::to_string(&event) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode permission event");
                return;
            }
        };
        let sent = with_env("MiniappPlugin.emitPermissionResult", |env| {
            let class: &JClass = self.class.as_obj().into();
            let j_json = env.new_string(&json)?;
            env.call_static_method(
                class,
                "emitPermissionResult",
                "(Ljava/lang/String;)V",
                &[JValue::Object(&j_json)],
            )?;
            Ok(())
        });
        if let Err(e) = sent {
            tracing::warn!(error = %e, "permission event not delivered");
        }
    }
}

fn read_optional_string(env: &mut JNIEnv<'_>, s: &JString<'_>) -> Result<Option<String>> {
    if s.is_null() {
        return Ok(None);
    }
    let s = env.get_string(s).map_err(|e| jni_err("get_string", e))?;
    Ok(Some(s.into()))
}

fn decode_call(env: &mut JNIEnv<'_>, method: &JString<'_>, arguments: &JString<'_>) -> Result<MethodCall> {
    let method = read_optional_string(env, method)?
        .ok_or_else(|| MiniappError::invalid_argument("method", "a string"))?;
    let arguments = match read_optional_string(env, arguments)? {
        Some(json) if !json.is_empty() => serde_json::from_str::<Value>(&json)?,
        _ => Value::Null,
    };
    Ok(MethodCall::new(method, arguments))
}

fn encode_response(env: &mut JNIEnv<'_>, response: &MethodResponse) -> jstring {
    let encoded = serde_json::to_string(response)
        .map_err(MiniappError::from)
        .and_then(|json| env.new_string(json).map_err(|e| jni_err("new_string", e)));
    match encoded {
        Ok(s) => s.into_raw(),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode method response");
            std::ptr::null_mut()
        }
    }
}

// ---------------------------------------------------------------------------
// Engine lifecycle
// ---------------------------------------------------------------------------

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_example_miniapp_1plugin_MiniappPlugin_nativeAttachToEngine<'local>(
    mut env: JNIEnv<'local>,
    class: JClass<'local>,
    context: JObject<'local>,
    config_json: JString<'local>,
) {
    guarded("nativeAttachToEngine", || {
        let config = match read_optional_string(&mut env, &config_json)? {
            Some(json) if !json.is_empty() => BridgeConfig::from_json(&json)?,
            _ => BridgeConfig::default(),
        };

        if !NDK_CONTEXT_READY.swap(true, Ordering::SeqCst) {
            let vm = env.get_java_vm().map_err(|e| jni_err("get_java_vm", e))?;
            // ndk_context keeps the raw pointer forever, so this reference
            // is deliberately never deleted.
            let leaked = env
                .new_global_ref(&context)
                .map_err(|e| jni_err("new_global_ref(ndk context)", e))?;
            let raw = leaked.as_obj().as_raw();
            std::mem::forget(leaked);
            // SAFETY: both pointers are valid for the process lifetime and
            // the flag above guarantees a single initialisation.
            unsafe {
                ndk_context::initialize_android_context(vm.get_java_vm_pointer().cast(), raw.cast());
            }
        }

        let context = env
            .new_global_ref(&context)
            .map_err(|e| jni_err("new_global_ref(context)", e))?;
        let class = env
            .new_global_ref(&class)
            .map_err(|e| jni_err("new_global_ref(class)", e))?;

        let wake_class = class.clone();
        let executor = Arc::new(QueuedExecutor::new(move || request_ui_drain(&wake_class)));
        let plugin = MiniappPlugin::new(
            AndroidBridge::new(context),
            executor.clone(),
            Arc::new(JavaEventSink { class }),
            config,
        );

        *HOST.write().unwrap_or_else(PoisonError::into_inner) =
            Some(Arc::new(Host { plugin, executor }));
        Ok(())
    });
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_example_miniapp_1plugin_MiniappPlugin_nativeDetachFromEngine<'local>(
    _env: JNIEnv<'local>,
    _class: JClass<'local>,
) {
    guarded("nativeDetachFromEngine", || {
        HOST.write().unwrap_or_else(PoisonError::into_inner).take();
        Ok(())
    });
}

// ---------------------------------------------------------------------------
// Activity lifecycle
// ---------------------------------------------------------------------------

fn surface_from(env: &JNIEnv<'_>, activity: &JObject<'_>) -> Result<AndroidSurface> {
    let global = env
        .new_global_ref(activity)
        .map_err(|e| jni_err("new_global_ref(activity)", e))?;
    Ok(AndroidSurface::new(global))
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_example_miniapp_1plugin_MiniappPlugin_nativeAttachToActivity<'local>(
    env: JNIEnv<'local>,
    _class: JClass<'local>,
    activity: JObject<'local>,
) {
    guarded("nativeAttachToActivity", || {
        if let Some(host) = host() {
            host.plugin
                .on_attached_to_activity(surface_from(&env, &activity)?);
        }
        Ok(())
    });
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_example_miniapp_1plugin_MiniappPlugin_nativeDetachFromActivityForConfigChanges<
    'local,
>(
    _env: JNIEnv<'local>,
    _class: JClass<'local>,
) {
    guarded("nativeDetachFromActivityForConfigChanges", || {
        if let Some(host) = host() {
            host.plugin.on_detached_from_activity_for_config_changes();
        }
        Ok(())
    });
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_example_miniapp_1plugin_MiniappPlugin_nativeReattachToActivityForConfigChanges<
    'local,
>(
    env: JNIEnv<'local>,
    _class: JClass<'local>,
    activity: JObject<'local>,
) {
    guarded("nativeReattachToActivityForConfigChanges", || {
        if let Some(host) = host() {
            host.plugin
                .on_reattached_to_activity_for_config_changes(surface_from(&env, &activity)?);
        }
        Ok(())
    });
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_example_miniapp_1plugin_MiniappPlugin_nativeDetachFromActivity<'local>(
    _env: JNIEnv<'local>,
    _class: JClass<'local>,
) {
    guarded("nativeDetachFromActivity", || {
        if let Some(host) = host() {
            host.plugin.on_detached_from_activity();
        }
        Ok(())
    });
}

// ---------------------------------------------------------------------------
// Calls and callbacks
// ---------------------------------------------------------------------------

/// One method call. Returns the JSON-encoded `MethodResponse`.
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_example_miniapp_1plugin_MiniappPlugin_nativeOnMethodCall<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    method: JString<'local>,
    arguments: JString<'local>,
) -> jstring {
    let response = catch_unwind(AssertUnwindSafe(|| {
        let Some(host) = host() else {
            return MethodResponse::from(MiniappError::Bridge("plugin not attached".into()));
        };
        match decode_call(&mut env, &method, &arguments) {
            Ok(call) => host.plugin.on_method_call(&call),
            Err(e) => e.into(),
        }
    }))
    .unwrap_or_else(|_| MiniappError::Native("method call panicked".into()).into());

    encode_response(&mut env, &response)
}

/// Drain queued UI work. The shim calls this on the main thread.
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_example_miniapp_1plugin_MiniappPlugin_nativeRunUiTasks<'local>(
    _env: JNIEnv<'local>,
    _class: JClass<'local>,
) {
    guarded("nativeRunUiTasks", || {
        if let Some(host) = host() {
            let ran = host.executor.run_pending();
            tracing::trace!(ran, "UI tasks drained");
        }
        Ok(())
    });
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_example_miniapp_1plugin_MiniappPlugin_nativeOnRequestPermissionsResult<
    'local,
>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    request_code: jint,
    permissions: JObjectArray<'local>,
    grant_results: JIntArray<'local>,
) {
    guarded("nativeOnRequestPermissionsResult", || {
        let Some(host) = host() else {
            return Ok(());
        };

        let mut names = Vec::new();
        if !permissions.is_null() {
            let len = env
                .get_array_length(&permissions)
                .map_err(|e| jni_err("get_array_length(permissions)", e))?;
            for i in 0..len {
                let element = env
                    .get_object_array_element(&permissions, i)
                    .map_err(|e| jni_err("get_object_array_element", e))?;
                let element = JString::from(element);
                if let Some(name) = read_optional_string(&mut env, &element)? {
                    names.push(name);
                }
            }
        }

        let mut grants = Vec::new();
        if !grant_results.is_null() {
            let len = env
                .get_array_length(&grant_results)
                .map_err(|e| jni_err("get_array_length(grant_results)", e))?;
            grants = vec![0; usize::try_from(len).unwrap_or(0)];
            env.get_int_array_region(&grant_results, 0, &mut grants)
                .map_err(|e| jni_err("get_int_array_region", e))?;
        }

        host.plugin
            .on_request_permissions_result(request_code, &names, &grants);
        Ok(())
    });
}
