// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Miniapp.

use thiserror::Error;

/// Failure code sent back for any error not caught by a handler.
pub const NATIVE_ERROR: &str = "NATIVE_ERROR";

/// Failure code sent back when a call's arguments cannot be decoded.
pub const INVALID_ARGUMENT: &str = "INVALID_ARGUMENT";

/// Top-level error type for all Miniapp operations.
#[derive(Debug, Error)]
pub enum MiniappError {
    // -- Argument decoding --
    #[error("argument `{key}` must be {expected}")]
    InvalidArgument { key: String, expected: &'static str },

    // -- Platform bridge --
    #[error("JNI call failed: {0}")]
    Jni(String),

    #[error("platform bridge error: {0}")]
    Bridge(String),

    /// A handler failed outside any typed path. Carries the raw message.
    #[error("{0}")]
    Native(String),

    #[error("no UI surface is attached")]
    NoSurface,

    #[error("feature not available on this platform")]
    PlatformUnavailable,

    // -- Encoding / config --
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MiniappError {
    /// Shorthand for a missing or mistyped argument.
    pub fn invalid_argument(key: impl Into<String>, expected: &'static str) -> Self {
        Self::InvalidArgument {
            key: key.into(),
            expected,
        }
    }

    /// The failure code reported across the channel for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument { .. } => INVALID_ARGUMENT,
            _ => NATIVE_ERROR,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, MiniappError>;
