use crate::upload::{BOUNDARY_PREFIX, encode, multipart::encode_with_boundary};

/// WHAT: Body layout is byte-exact
/// WHY: The ingestion endpoint parses the part headers literally
#[test]
fn given_fixed_boundary_when_encoding_then_body_matches_layout() {
    // Given: Payload bytes and a known boundary
    let payload = [0u8, 159, 146, 150, b'\r', b'\n'];

    // When: Encoding
    let encoded = encode_with_boundary(
        &payload,
        "recording-2025-05-24_09-30-05-000-1a2b3c4d.wav",
        "audio_file",
        "audio/wav",
        "Boundary-test",
    );

    // Then: Exact bytes and header value
    let mut expected = Vec::new();
    expected.extend_from_slice(b"--Boundary-test\r\n");
    expected.extend_from_slice(
        b"Content-Disposition: form-data; name=\"audio_file\"; \
          filename=\"recording-2025-05-24_09-30-05-000-1a2b3c4d.wav\"\r\n",
    );
    expected.extend_from_slice(b"Content-Type: audio/wav\r\n\r\n");
    expected.extend_from_slice(&payload);
    expected.extend_from_slice(b"\r\n--Boundary-test--\r\n");

    assert_eq!(encoded.body, expected);
    assert_eq!(
        encoded.content_type,
        "multipart/form-data; boundary=Boundary-test"
    );
    assert_eq!(encoded.boundary(), "Boundary-test");
}

/// WHAT: Random boundaries carry the fixed prefix and differ per call
/// WHY: A reused boundary raises the odds of colliding with payload bytes
#[test]
fn given_same_input_when_encoding_twice_then_boundaries_differ() {
    // Given: The same payload
    let payload = b"RIFF....WAVE";

    // When: Encoding twice
    let first = encode(payload, "a.wav", "audio_file", "audio/wav");
    let second = encode(payload, "a.wav", "audio_file", "audio/wav");

    // Then: Prefixed, long enough, distinct, and used in the body
    assert!(first.boundary().starts_with(BOUNDARY_PREFIX));
    assert!(first.boundary().len() >= BOUNDARY_PREFIX.len() + 8);
    assert_ne!(first.boundary(), second.boundary());
    assert!(first.body.starts_with(format!("--{}\r\n", first.boundary()).as_bytes()));
    assert!(
        first
            .body
            .ends_with(format!("\r\n--{}--\r\n", first.boundary()).as_bytes())
    );
}

/// WHAT: An empty file still yields a well-formed single part
/// WHY: A zero-length capture must not produce a malformed request
#[test]
fn given_empty_payload_when_encoding_then_part_has_no_content() {
    // Given: No bytes

    // When: Encoding
    let encoded = encode_with_boundary(b"", "empty.wav", "audio_file", "audio/wav", "B");

    // Then: Header block directly followed by the closing delimiter
    let text = String::from_utf8(encoded.body).unwrap_or_default();
    assert!(text.ends_with("Content-Type: audio/wav\r\n\r\n\r\n--B--\r\n"));
}
