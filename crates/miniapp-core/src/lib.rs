// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Miniapp: Core types, values and error definitions shared across all crates.

pub mod channel;
pub mod config;
pub mod error;
pub mod types;
pub mod value;

pub use channel::{MethodCall, MethodResponse};
pub use config::BridgeConfig;
pub use error::MiniappError;
pub use types::*;
pub use value::{Arguments, Value};
