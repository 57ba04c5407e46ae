//! Integration tests for the relay-core job envelope decoder.
//!
//! These tests go through the public API only and check the decoding laws
//! the agent relies on: every valid payload comes back byte for byte, and
//! frames without a payload or with a broken one never produce a job.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use relay_core::{JobDecoder, MalformedJobError, PrintJob};

/// Wraps `bytes` in an envelope the way the print server does.
fn envelope_for(bytes: &[u8]) -> Vec<u8> {
    serde_json::json!({ "escpos": STANDARD.encode(bytes) })
        .to_string()
        .into_bytes()
}

fn decode(raw: &[u8]) -> Result<Option<PrintJob>, MalformedJobError> {
    JobDecoder::new().decode(raw)
}

#[test]
fn test_payloads_of_every_length_decode_byte_for_byte() {
    // Lengths 1..=64 cover all three base64 padding cases several times over.
    for len in 1..=64usize {
        let original: Vec<u8> = (0..len).map(|i| (i * 37 + 11) as u8).collect();

        let job = decode(&envelope_for(&original))
            .expect("decode must succeed")
            .expect("job expected");

        assert_eq!(job.command_bytes(), original.as_slice(), "length {len}");
    }
}

#[test]
fn test_every_byte_value_survives_decoding() {
    let original: Vec<u8> = (0..=255u8).collect();
    let job = decode(&envelope_for(&original)).unwrap().unwrap();
    assert_eq!(job.into_bytes(), original);
}

#[test]
fn test_realistic_receipt_payload() {
    // ESC @ (init), "Total 12.50\n", GS V 1 (partial cut)
    let mut original = vec![0x1B, 0x40];
    original.extend_from_slice(b"Total 12.50\n");
    original.extend_from_slice(&[0x1D, 0x56, 0x01]);

    let job = decode(&envelope_for(&original)).unwrap().unwrap();

    assert_eq!(job.command_bytes(), original.as_slice());
}

#[test]
fn test_envelopes_without_payload_yield_no_job() {
    let frames: [&[u8]; 4] = [
        br#"{}"#,
        br#"{"foo":"bar"}"#,
        br#"{"text":"Receipt #17"}"#,
        br#"{"ESCPOS":"GxkiwDE="}"#,
    ];
    for frame in frames {
        let result = decode(frame).expect("no-payload envelopes are not errors");
        assert!(result.is_none(), "frame {:?}", String::from_utf8_lossy(frame));
    }
}

#[test]
fn test_invalid_payload_encodings_are_malformed() {
    let frames: [&[u8]; 4] = [
        br#"{"escpos":"GxkiwDE"}"#,
        br#"{"escpos":"Gx=kiwDE"}"#,
        br#"{"escpos":"@@@@"}"#,
        br#"{"escpos":"GxkiwDE=="}"#,
    ];
    for frame in frames {
        let err = decode(frame).expect_err("must be malformed");
        assert!(
            matches!(err, MalformedJobError::InvalidPayload(_)),
            "frame {:?} gave {err}",
            String::from_utf8_lossy(frame)
        );
    }
}

#[test]
fn test_interior_spaces_and_tabs_are_malformed() {
    // Arrange
    let frames: [&[u8]; 2] = [
        br#"{"escpos":"Gx ki wD E="}"#,
        b"{\"escpos\":\"Gxki\\twDE=\"}",
    ];

    for frame in frames {
        // Act
        let err = decode(frame).expect_err("must be malformed");

        // Assert
        assert!(
            matches!(err, MalformedJobError::InvalidPayload(_)),
            "frame {:?} gave {err}",
            String::from_utf8_lossy(frame)
        );
    }
}

#[test]
fn test_unparseable_frames_are_malformed() {
    let frames: [&[u8]; 4] = [b"", b"{", b"null", b"\"GxkiwDE=\""];
    for frame in frames {
        let err = decode(frame).expect_err("must be malformed");
        assert!(matches!(err, MalformedJobError::InvalidEnvelope(_)));
    }
}
