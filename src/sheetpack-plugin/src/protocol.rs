//! Wire types for out-of-process content packs.
//!
//! Every message is a single line of JSON. The host writes [`PluginRequest`]s
//! to the plugin's stdin and reads one [`PluginResponse`] per request from its
//! stdout.

use serde::{Deserialize, Serialize};
use sheetpack_core::ResponseEnvelope;

/// Protocol version for compatibility checking.
pub const PROTOCOL_VERSION: u32 = 1;

/// Request sent from the host to a plugin process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginRequest {
    /// Unique request ID for correlation.
    pub id: u64,
    pub method: PluginMethod,
}

/// Response from a plugin process to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginResponse {
    /// Request ID this response correlates to. Zero when the request could
    /// not be parsed.
    pub id: u64,
    pub result: PluginResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "params")]
pub enum PluginMethod {
    /// Handshake; the plugin answers with its [`PluginInfo`].
    Initialize,
    /// Resolve one content type, e.g. `{"method": "info", "arg": "info/druid"}`.
    Call {
        method: String,
        #[serde(default)]
        arg: Option<String>,
    },
    /// Shutdown the plugin gracefully.
    Shutdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum PluginResult {
    Initialized(PluginInfo),
    /// The envelope produced for a `Call`, including failure envelopes.
    Envelope(ResponseEnvelope),
    ShutdownAck,
    /// The request itself could not be handled.
    Error(PluginError),
}

/// Plugin initialization info returned after Initialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginInfo {
    pub id: String,
    pub name: String,
    pub version: String,
    /// Protocol version the plugin speaks.
    pub protocol_version: u32,
}

impl PluginInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: version.into(),
            protocol_version: PROTOCOL_VERSION,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginError {
    pub kind: PluginErrorKind,
    pub message: String,
}

impl PluginError {
    pub fn new(kind: PluginErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for PluginError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginErrorKind {
    /// The request line was not a valid [`PluginRequest`].
    MalformedRequest,
}

impl PluginErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PluginErrorKind::MalformedRequest => "malformed_request",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_as_tagged_json() {
        let request = PluginRequest {
            id: 7,
            method: PluginMethod::Call {
                method: "info".into(),
                arg: Some("info/druid".into()),
            },
        };
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(
            json,
            r#"{"id":7,"method":{"type":"Call","params":{"method":"info","arg":"info/druid"}}}"#
        );
        let parsed: PluginRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, request);
    }

    #[test]
    fn call_without_arg_parses() {
        let parsed: PluginRequest =
            serde_json::from_str(r#"{"id":1,"method":{"type":"Call","params":{"method":"spells"}}}"#)
                .unwrap();
        assert_eq!(
            parsed.method,
            PluginMethod::Call {
                method: "spells".into(),
                arg: None
            }
        );
    }

    #[test]
    fn unit_methods_have_no_params() {
        let parsed: PluginRequest =
            serde_json::from_str(r#"{"id":3,"method":{"type":"Shutdown"}}"#).unwrap();
        assert_eq!(parsed.method, PluginMethod::Shutdown);
    }

    #[test]
    fn envelope_result_carries_entry() {
        let response = PluginResponse {
            id: 2,
            result: PluginResult::Envelope(ResponseEnvelope::failure("boom")),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["result"]["status"], "Envelope");
        assert_eq!(json["result"]["entry"]["key"], "exception");

        let back: PluginResponse = serde_json::from_value(json).unwrap();
        assert_eq!(back, response);
    }

    #[test]
    fn initialized_result_is_flat() {
        let json = r#"{"id":1,"result":{"status":"Initialized","id":"srd","name":"SRD","version":"1.0.0","protocol_version":1}}"#;
        let response: PluginResponse = serde_json::from_str(json).unwrap();
        let PluginResult::Initialized(info) = response.result else {
            panic!("expected Initialized");
        };
        assert_eq!(info, PluginInfo::new("srd", "SRD", "1.0.0"));
    }

    #[test]
    fn plugin_error_displays_kind_and_message() {
        let err = PluginError::new(PluginErrorKind::MalformedRequest, "expected value");
        assert_eq!(err.to_string(), "malformed_request: expected value");
        assert_eq!(
            serde_json::to_value(&err).unwrap()["kind"],
            "malformed_request"
        );
    }
}
