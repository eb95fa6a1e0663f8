// Response types for the Perenio cloud API.
//
// The vendor publishes no schema and field presence varies between
// accounts and firmware, so payloads stay opaque JSON. Accessors read
// the handful of fields we care about defensively with fallbacks.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── Device ───────────────────────────────────────────────────────────

/// One device object from the discovery endpoint.
///
/// Identifier is `id`, falling back to `endpointId`; display name is
/// `name`, falling back to `deviceName`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Device(Value);

impl Device {
    pub fn new(raw: Value) -> Self {
        Self(raw)
    }

    /// Device identifier (`id` or `endpointId`). Numeric ids are stringified.
    pub fn id(&self) -> Option<String> {
        ["id", "endpointId"]
            .into_iter()
            .find_map(|key| self.identifier_field(key))
    }

    /// Display name (`name` or `deviceName`).
    pub fn name(&self) -> Option<&str> {
        ["name", "deviceName"]
            .into_iter()
            .find_map(|key| self.str_field(key))
    }

    pub fn model(&self) -> Option<&str> {
        self.str_field("model")
    }

    pub fn firmware_version(&self) -> Option<&str> {
        self.str_field("firmwareVersion")
    }

    /// Raw `status` value; the vendor uses both strings and objects here.
    pub fn status(&self) -> Option<&Value> {
        self.0.get("status")
    }

    /// Raw `online` value, usually a boolean.
    pub fn online(&self) -> Option<&Value> {
        self.0.get("online")
    }

    pub fn raw(&self) -> &Value {
        &self.0
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key)?.as_str().filter(|s| !s.is_empty())
    }

    fn identifier_field(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

// ── Recorded media ───────────────────────────────────────────────────

/// One entry from a camera's recorded-file listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordedFile(Value);

impl RecordedFile {
    pub fn new(raw: Value) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> &Value {
        &self.0
    }

    pub fn into_raw(self) -> Value {
        self.0
    }
}

// ── Streaming ────────────────────────────────────────────────────────

/// Raw media-stream offer (SDP-offer-like JSON).
///
/// Only the payload is surfaced; negotiating a WebRTC session from it is
/// not implemented.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamOffer(Value);

impl StreamOffer {
    pub fn raw(&self) -> &Value {
        &self.0
    }

    pub fn into_raw(self) -> Value {
        self.0
    }
}

// ── Account ──────────────────────────────────────────────────────────

/// Account profile from the OAuth realm's `users/me`. Advisory only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserInfo(Value);

impl UserInfo {
    pub fn email(&self) -> Option<&str> {
        self.0.get("email")?.as_str()
    }
}

/// Interpret a list endpoint's body: an array yields its elements,
/// anything else is treated as an empty listing.
pub(crate) fn list_payload<T>(body: Value, wrap: impl Fn(Value) -> T) -> Vec<T> {
    match body {
        Value::Array(items) => items.into_iter().map(wrap).collect(),
        _ => Vec::new(),
    }
}
