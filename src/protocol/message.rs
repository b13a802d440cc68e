//! Message envelope.
//!
//! Every frame on the wire is a JSON text frame of the form:
//!
//! ```json
//! { "type": "auth_request", "payload": { ... } }
//! ```
//!
//! The transport forwards any `type`; interpreting it is the caller's job.

// ============================================================================
// Imports
// ============================================================================

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, from_str, to_string};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Client → server credential submission.
pub const AUTH_REQUEST: &str = "auth_request";

/// Server → client authentication verdict.
pub const AUTH_RESPONSE: &str = "auth_response";

// ============================================================================
// Message
// ============================================================================

/// A `{type, payload}` envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message type, e.g. `auth_response`.
    #[serde(rename = "type")]
    message_type: String,

    /// Arbitrary JSON payload.
    payload: Value,
}

impl Message {
    /// Creates a message.
    #[inline]
    #[must_use]
    pub fn new(message_type: impl Into<String>, payload: Value) -> Self {
        Self {
            message_type: message_type.into(),
            payload,
        }
    }

    /// Creates a message from any serializable payload.
    ///
    /// # Errors
    ///
    /// [`Error::Json`] if the payload cannot be represented as JSON.
    pub fn with_payload<T: Serialize>(message_type: impl Into<String>, payload: &T) -> Result<Self> {
        Ok(Self::new(message_type, serde_json::to_value(payload)?))
    }

    /// Returns the message type.
    #[inline]
    #[must_use]
    pub fn message_type(&self) -> &str {
        &self.message_type
    }

    /// Returns the payload.
    #[inline]
    #[must_use]
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Returns `true` if this message has the given type.
    #[inline]
    #[must_use]
    pub fn is(&self, message_type: &str) -> bool {
        self.message_type == message_type
    }

    /// Consumes the message, returning `(type, payload)`.
    #[inline]
    #[must_use]
    pub fn into_parts(self) -> (String, Value) {
        (self.message_type, self.payload)
    }

    /// Decodes the payload into a typed value.
    ///
    /// # Errors
    ///
    /// [`Error::Json`] if the payload has a different shape.
    pub fn decode_payload<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(T::deserialize(&self.payload)?)
    }

    /// Parses an inbound text frame.
    ///
    /// The frame must be a JSON object with a string `type` and a `payload`
    /// key (any value, including `null`). Extra keys are ignored.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if the text is not JSON
    /// - [`Error::Protocol`] if the envelope is incomplete
    pub fn from_text(text: &str) -> Result<Self> {
        let value: Value = from_str(text)?;

        let Value::Object(mut fields) = value else {
            return Err(Error::protocol("frame is not a JSON object"));
        };

        let message_type = take_type(&mut fields)?;
        let payload = fields
            .remove("payload")
            .ok_or_else(|| Error::protocol("frame has no 'payload'"))?;

        Ok(Self {
            message_type,
            payload,
        })
    }

    /// Serializes the message into a text frame.
    ///
    /// # Errors
    ///
    /// [`Error::Json`] if serialization fails.
    pub fn to_text(&self) -> Result<String> {
        Ok(to_string(self)?)
    }
}

/// Removes and validates the `type` field.
fn take_type(fields: &mut Map<String, Value>) -> Result<String> {
    match fields.remove("type") {
        Some(Value::String(message_type)) => Ok(message_type),
        Some(_) => Err(Error::protocol("frame 'type' is not a string")),
        None => Err(Error::protocol("frame has no 'type'")),
    }
}

// ============================================================================
// Tests
// ============================================================================
