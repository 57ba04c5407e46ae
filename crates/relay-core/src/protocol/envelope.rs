//! Inbound job envelope decoding.
//!
//! Every WebSocket frame from the print server is a JSON object.  A frame
//! that carries a print job has an `escpos` field holding the raw printer
//! command bytes, base64-encoded so they survive a text frame:
//!
//! ```json
//! { "escpos": "G0AbYQFIZWxsbwo=" }
//! ```
//!
//! Any other field is ignored.  Three outcomes are possible:
//!
//! | Frame                                   | Result                          |
//! |-----------------------------------------|---------------------------------|
//! | object with a valid base64 `escpos`     | `Ok(Some(PrintJob))`            |
//! | object without `escpos` (or `null`)     | `Ok(None)` + warning            |
//! | not a JSON object / bad base64 / wrong type | `Err(MalformedJobError)`    |
//!
//! The decoder never touches the printer; the caller decides what to do with
//! the result.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

/// Name of the envelope field that carries the base64 ESC/POS payload.
pub const ESCPOS_FIELD: &str = "escpos";

/// Errors for frames that cannot be turned into a print job.
///
/// The session drops the offending frame and keeps running.
#[derive(Debug, Error)]
pub enum MalformedJobError {
    /// The frame is not a JSON object.
    #[error("frame is not a JSON object: {0}")]
    InvalidEnvelope(#[source] serde_json::Error),

    /// The `escpos` field exists but is not a string.
    #[error("`escpos` field must be a string, found {found}")]
    PayloadNotString { found: &'static str },

    /// The `escpos` string is not valid base64.
    #[error("`escpos` field is not valid base64: {0}")]
    InvalidPayload(#[source] base64::DecodeError),
}

/// One decoded print job: the exact bytes to hand to the printer.
///
/// The command buffer is never empty; [`PrintJob::new`] refuses an empty one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintJob {
    command_bytes: Vec<u8>,
}

impl PrintJob {
    /// Wraps a command buffer, returning `None` if it is empty.
    pub fn new(command_bytes: Vec<u8>) -> Option<Self> {
        if command_bytes.is_empty() {
            None
        } else {
            Some(Self { command_bytes })
        }
    }

    /// The raw ESC/POS bytes.
    pub fn command_bytes(&self) -> &[u8] {
        &self.command_bytes
    }

    /// Number of command bytes.
    pub fn len(&self) -> usize {
        self.command_bytes.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.command_bytes.is_empty()
    }

    /// Consumes the job, returning the owned command buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        self.command_bytes
    }
}

/// Stateless decoder from raw frame bytes to an optional [`PrintJob`].
#[derive(Debug, Default, Clone, Copy)]
pub struct JobDecoder;

impl JobDecoder {
    /// Creates a decoder.
    pub fn new() -> Self {
        Self
    }

    /// Decodes one inbound frame.
    ///
    /// Returns `Ok(None)` when the envelope carries no `escpos` payload (or an
    /// empty one).  Surrounding whitespace and line breaks inside the base64
    /// text are tolerated, as some servers wrap long payloads.  Interior
    /// spaces or tabs are not.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedJobError`] if the frame is not a JSON object, or if
    /// the `escpos` field is present but is not a valid base64 string.
    pub fn decode(&self, raw: &[u8]) -> Result<Option<PrintJob>, MalformedJobError> {
        let envelope: Map<String, Value> =
            serde_json::from_slice(raw).map_err(MalformedJobError::InvalidEnvelope)?;

        let encoded = match envelope.get(ESCPOS_FIELD) {
            None | Some(Value::Null) => {
                warn!(
                    fields = ?envelope.keys().collect::<Vec<_>>(),
                    "message has no `escpos` payload; ignoring"
                );
                return Ok(None);
            }
            Some(Value::String(s)) => s,
            Some(other) => {
                return Err(MalformedJobError::PayloadNotString {
                    found: json_type_name(other),
                })
            }
        };

        let compact: String = encoded
            .trim_matches(|c: char| c.is_ascii_whitespace())
            .chars()
            .filter(|c| !matches!(c, '\r' | '\n'))
            .collect();
        let bytes = STANDARD
            .decode(compact.as_bytes())
            .map_err(MalformedJobError::InvalidPayload)?;

        match PrintJob::new(bytes) {
            Some(job) => {
                debug!(bytes = job.len(), "decoded escpos payload");
                Ok(Some(job))
            }
            None => {
                warn!("message has an empty `escpos` payload; ignoring");
                Ok(None)
            }
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(raw: &str) -> Result<Option<PrintJob>, MalformedJobError> {
        JobDecoder::new().decode(raw.as_bytes())
    }

    #[test]
    fn test_decode_known_payload_yields_exact_bytes() {
        // Arrange
        let frame = r#"{"escpos":"GxkiwDE="}"#;

        // Act
        let job = decode(frame).unwrap().expect("job expected");

        // Assert
        assert_eq!(job.command_bytes(), &[0x1B, 0x19, 0x22, 0xC0, 0x31]);
        assert_eq!(job.len(), 5);
    }

    #[test]
    fn test_decode_missing_field_returns_none() {
        let result = decode(r#"{"foo":"bar"}"#).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_decode_null_field_returns_none() {
        assert!(decode(r#"{"escpos":null}"#).unwrap().is_none());
    }

    #[test]
    fn test_decode_empty_payload_returns_none() {
        assert!(decode(r#"{"escpos":""}"#).unwrap().is_none());
    }

    #[test]
    fn test_decode_ignores_extra_fields() {
        let job = decode(r#"{"order":17,"escpos":"G0A=","text":"ignored"}"#)
            .unwrap()
            .unwrap();
        assert_eq!(job.into_bytes(), vec![0x1B, 0x40]);
    }

    #[test]
    fn test_decode_tolerates_wrapped_base64() {
        let job = decode("{\"escpos\":\"Gxki\\nwDE=\\r\\n\"}").unwrap().unwrap();
        assert_eq!(job.command_bytes(), &[0x1B, 0x19, 0x22, 0xC0, 0x31]);
    }

    #[test]
    fn test_decode_tolerates_surrounding_whitespace() {
        let job = decode("{\"escpos\":\" \\tGxkiwDE= \"}").unwrap().unwrap();
        assert_eq!(job.command_bytes(), &[0x1B, 0x19, 0x22, 0xC0, 0x31]);
    }

    #[test]
    fn test_decode_invalid_base64_is_malformed() {
        let err = decode(r#"{"escpos":"not base64!!"}"#).unwrap_err();
        assert!(matches!(err, MalformedJobError::InvalidPayload(_)));
    }

    #[test]
    fn test_decode_non_string_payload_is_malformed() {
        let err = decode(r#"{"escpos":[27,64]}"#).unwrap_err();
        assert!(matches!(
            err,
            MalformedJobError::PayloadNotString { found: "array" }
        ));
    }

    #[test]
    fn test_decode_plain_text_frame_is_malformed() {
        let err = decode("hello printer").unwrap_err();
        assert!(matches!(err, MalformedJobError::InvalidEnvelope(_)));
    }

    #[test]
    fn test_decode_json_array_is_malformed() {
        let err = decode(r#"["escpos","GxkiwDE="]"#).unwrap_err();
        assert!(matches!(err, MalformedJobError::InvalidEnvelope(_)));
    }

    #[test]
    fn test_print_job_new_rejects_empty_buffer() {
        assert!(PrintJob::new(Vec::new()).is_none());
        assert!(!PrintJob::new(vec![0]).unwrap().is_empty());
    }

    #[test]
    fn test_error_messages_name_the_field() {
        let err = decode(r#"{"escpos":5}"#).unwrap_err();
        assert_eq!(err.to_string(), "`escpos` field must be a string, found number");
    }
}
