// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Call/response envelopes exchanged with the host application.

use serde::{Deserialize, Serialize};

use crate::error::MiniappError;
use crate::value::Value;

/// One incoming method call: an operation name plus its named arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub arguments: Value,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, arguments: Value) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }
}

/// What goes back across the channel for a single call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MethodResponse {
    Success(Value),
    Error {
        code: String,
        message: Option<String>,
        details: Option<Value>,
    },
    /// The method name is not one this plugin handles. Not a failure.
    NotImplemented,
}

impl MethodResponse {
    pub fn success(value: impl Into<Value>) -> Self {
        Self::Success(value.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn error_code(&self) -> Option<&str> {
        match self {
            Self::Error { code, .. } => Some(code),
            _ => None,
        }
    }

    pub fn success_value(&self) -> Option<&Value> {
        match self {
            Self::Success(v) => Some(v),
            _ => None,
        }
    }
}

impl From<MiniappError> for MethodResponse {
    fn from(err: MiniappError) -> Self {
        Self::Error {
            code: err.code().to_owned(),
            message: Some(err.to_string()),
            details: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NATIVE_ERROR;

    #[test]
    fn call_without_arguments_parses() {
        let call: MethodCall =
            serde_json::from_str(r#"{"method": "getPlatformVersion"}"#).expect("parse");
        assert_eq!(call.method, "getPlatformVersion");
        assert!(call.arguments.is_null());
    }

    #[test]
    fn response_wire_shapes() {
        let ok = serde_json::to_string(&MethodResponse::success(true)).expect("encode");
        assert_eq!(ok, r#"{"success":true}"#);

        let missing = serde_json::to_string(&MethodResponse::NotImplemented).expect("encode");
        assert_eq!(missing, r#""notImplemented""#);
    }

    #[test]
    fn errors_carry_code_and_message_without_details() {
        let resp = MethodResponse::from(MiniappError::Jni("NullPointerException".into()));
        match resp {
            MethodResponse::Error {
                code,
                message,
                details,
            } => {
                assert_eq!(code, NATIVE_ERROR);
                assert!(message.expect("message").contains("NullPointerException"));
                assert!(details.is_none());
            }
            other => panic!("expected error, got {other:?}"),
        }
    }
}
