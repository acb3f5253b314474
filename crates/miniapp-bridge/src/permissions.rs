// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Correlation of permission requests with their out-of-band answers.
//
// `requestPermission` returns before the user has answered. Each issued
// request gets a request code; when the host forwards the platform's
// request-permissions-result callback, the matching entry is resolved and a
// `PermissionEvent` goes to the registered sink.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Mutex, PoisonError};

use miniapp_core::PermissionEvent;

/// `PackageManager.PERMISSION_GRANTED`.
pub const PERMISSION_GRANTED: i32 = 0;

/// Android only routes the low 16 bits of a request code back.
const REQUEST_CODE_MASK: i32 = 0xffff;

/// Receives permission answers.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: PermissionEvent);
}

/// Sink that only logs. Used when the host has nowhere to forward events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: PermissionEvent) {
        tracing::info!(
            request_code = event.request_code,
            permission = %event.permission,
            granted = event.granted,
            "permission result"
        );
    }
}

#[derive(Debug)]
pub struct PermissionRegistry {
    base: i32,
    issued: AtomicI32,
    pending: Mutex<HashMap<i32, String>>,
}

impl PermissionRegistry {
    pub fn new(base: i32) -> Self {
        Self {
            base: base & REQUEST_CODE_MASK,
            issued: AtomicI32::new(0),
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Record a request about to be issued and return its request code.
    pub fn register(&self, permission: &str) -> i32 {
        let n = self.issued.fetch_add(1, Ordering::Relaxed);
        let code = self.base.wrapping_add(n) & REQUEST_CODE_MASK;
        if let Some(stale) = self.lock().insert(code, permission.to_owned()) {
            tracing::warn!(
                request_code = code,
                permission = %stale,
                "evicted unanswered permission request"
            );
        }
        tracing::debug!(request_code = code, permission, "permission request registered");
        code
    }

    /// Forget a request that never reached the OS.
    pub fn cancel(&self, request_code: i32) {
        self.lock().remove(&request_code);
    }

    /// Drop every unanswered request. Their answers can no longer arrive.
    pub fn clear(&self) {
        let mut pending = self.lock();
        if !pending.is_empty() {
            tracing::debug!(dropped = pending.len(), "clearing unanswered permission requests");
            pending.clear();
        }
    }

    /// Match a platform callback to its request.
    ///
    /// `grant_results` holds `PERMISSION_GRANTED` or a denial per entry of
    /// `permissions`. Empty arrays mean the prompt was interrupted; that
    /// resolves the pending permission as not granted. Unknown codes yield
    /// no events.
    pub fn resolve(
        &self,
        request_code: i32,
        permissions: &[String],
        grant_results: &[i32],
    ) -> Vec<PermissionEvent> {
        let Some(requested) = self.lock().remove(&request_code) else {
            tracing::warn!(request_code, "permission result for unknown request code");
            return Vec::new();
        };

        if permissions.is_empty() {
            return vec![PermissionEvent {
                request_code,
                permission: requested,
                granted: false,
            }];
        }

        permissions
            .iter()
            .zip(grant_results.iter().copied().chain(std::iter::repeat(-1)))
            .map(|(permission, result)| PermissionEvent {
                request_code,
                permission: permission.clone(),
                granted: result == PERMISSION_GRANTED,
            })
            .collect()
    }

    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<i32, String>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
