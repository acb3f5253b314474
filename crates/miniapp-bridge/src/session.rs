// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Session context: which UI surface, if any, the plugin may use right now.
//
// Only the host's lifecycle hooks write the state. Handlers take a snapshot
// once per call, so a surface cannot disappear halfway through an operation.

use std::sync::{Arc, PoisonError, RwLock};

/// Lifecycle of the foreground surface.
#[derive(Debug)]
pub enum SessionState<S> {
    /// No surface. Initial state, and the state after the activity is gone.
    Detached,
    /// A surface is live and may host dialogs or launch screens.
    Attached(Arc<S>),
    /// The surface was torn down for a configuration change and a new one
    /// is expected. Treated like `Detached` by handlers.
    Reconfiguring,
}

impl<S> Clone for SessionState<S> {
    fn clone(&self) -> Self {
        match self {
            Self::Detached => Self::Detached,
            Self::Attached(s) => Self::Attached(Arc::clone(s)),
            Self::Reconfiguring => Self::Reconfiguring,
        }
    }
}

#[derive(Debug)]
pub struct Session<S> {
    state: RwLock<SessionState<S>>,
}

impl<S> Default for Session<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Session<S> {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(SessionState::Detached),
        }
    }

    pub fn attach(&self, surface: S) {
        tracing::info!("session: surface attached");
        self.set(SessionState::Attached(Arc::new(surface)));
    }

    /// Surface going away for a configuration change.
    pub fn suspend(&self) {
        tracing::info!("session: surface detached for configuration change");
        self.set(SessionState::Reconfiguring);
    }

    pub fn detach(&self) {
        tracing::info!("session: surface detached");
        self.set(SessionState::Detached);
    }

    /// Snapshot of the live surface, if any.
    pub fn surface(&self) -> Option<Arc<S>> {
        match &*self.state.read().unwrap_or_else(PoisonError::into_inner) {
            SessionState::Attached(s) => Some(Arc::clone(s)),
            SessionState::Detached | SessionState::Reconfiguring => None,
        }
    }

    pub fn state(&self) -> SessionState<S> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_attached(&self) -> bool {
        self.surface().is_some()
    }

    fn set(&self, next: SessionState<S>) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = next;
    }
}
