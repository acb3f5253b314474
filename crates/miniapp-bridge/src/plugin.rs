// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plugin object owned by the host: lifecycle hooks plus the dispatcher.
//
// Created when the host attaches the plugin to its engine and dropped when
// the engine detaches. Activity hooks move the session between states.

use std::sync::Arc;

use miniapp_core::{BridgeConfig, MethodCall, MethodResponse, PermissionEvent};

use crate::dispatcher::Dispatcher;
use crate::executor::UiExecutor;
use crate::permissions::{EventSink, PermissionRegistry};
use crate::session::Session;
use crate::traits::PlatformBridge;

pub struct MiniappPlugin<P: PlatformBridge> {
    dispatcher: Dispatcher<P>,
    session: Arc<Session<P::Surface>>,
    permissions: Arc<PermissionRegistry>,
    events: Arc<dyn EventSink>,
}

impl<P: PlatformBridge> MiniappPlugin<P> {
    /// Attach to the engine.
    pub fn new(
        platform: P,
        executor: Arc<dyn UiExecutor>,
        events: Arc<dyn EventSink>,
        config: BridgeConfig,
    ) -> Self {
        tracing::info!(
            channel = %config.channel_name,
            platform = platform.platform_name(),
            "plugin attached to engine"
        );
        let session = Arc::new(Session::new());
        let permissions = Arc::new(PermissionRegistry::new(config.permission_request_code_base));
        let dispatcher = Dispatcher::new(
            Arc::new(platform),
            Arc::clone(&session),
            executor,
            Arc::clone(&permissions),
            config,
        );
        Self {
            dispatcher,
            session,
            permissions,
            events,
        }
    }

    pub fn on_attached_to_activity(&self, surface: P::Surface) {
        self.session.attach(surface);
    }

    pub fn on_detached_from_activity_for_config_changes(&self) {
        self.session.suspend();
    }

    pub fn on_reattached_to_activity_for_config_changes(&self, surface: P::Surface) {
        self.session.attach(surface);
    }

    /// The activity is gone for good; prompts it issued will never answer.
    pub fn on_detached_from_activity(&self) {
        self.session.detach();
        self.permissions.clear();
    }

    pub fn on_method_call(&self, call: &MethodCall) -> MethodResponse {
        self.dispatcher.dispatch(call)
    }

    /// Forward the platform's permission callback. Returns the events that
    /// were emitted.
    pub fn on_request_permissions_result(
        &self,
        request_code: i32,
        permissions: &[String],
        grant_results: &[i32],
    ) -> Vec<PermissionEvent> {
        let events = self
            .permissions
            .resolve(request_code, permissions, grant_results);
        for event in &events {
            self.events.emit(event.clone());
        }
        events
    }

    pub fn dispatcher(&self) -> &Dispatcher<P> {
        &self.dispatcher
    }

    pub fn session(&self) -> &Session<P::Surface> {
        &self.session
    }
}

impl<P: PlatformBridge> Drop for MiniappPlugin<P> {
    fn drop(&mut self) {
        tracing::info!(
            pending_permission_requests = self.permissions.pending(),
            "plugin detached from engine"
        );
    }
}
