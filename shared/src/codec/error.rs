use thiserror::Error;

/// Errors that can occur while encoding an outbound request frame
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncoderError {
    /// Payload could not be serialized to JSON text
    #[error("Failed to serialize payload for command {command:?}")]
    PayloadSerializationFailed { command: String },

    /// Request envelope could not be serialized to JSON text
    #[error("Failed to serialize request envelope for request {request_id:?}")]
    EnvelopeSerializationFailed { request_id: String },
}

/// Errors that can occur while decoding an inbound binary frame
///
/// Decoding processes untrusted network data: every failure mode is an
/// error for that single frame, never a panic, and never fatal to the
/// connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecoderError {
    /// LZ4 block decompression failed
    #[error("Failed to decompress frame of {payload_size} bytes (possible malformed or truncated data)")]
    DecompressionFailed { payload_size: usize },

    /// Decompressed bytes were not valid UTF-8 text
    #[error("Decompressed frame of {payload_size} bytes is not valid UTF-8")]
    InvalidUtf8 { payload_size: usize },

    /// Decompressed text was not a valid message envelope
    #[error("Failed to parse message envelope: {reason}")]
    MalformedEnvelope { reason: String },
}
