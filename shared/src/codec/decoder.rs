use log::debug;

use crate::messages::server_message::ServerMessage;

use super::error::DecoderError;

/// Decodes inbound binary frames.
///
/// A frame is an LZ4 block (with prepended size) that decompresses to UTF-8
/// text containing the JSON message envelope. The raw bytes must be fully
/// read before decoding starts; decoding itself is synchronous.
pub struct Decoder {
    result: Vec<u8>,
}

impl Decoder {
    pub fn new() -> Self {
        Self { result: Vec::new() }
    }

    /// Decode a single frame into a parsed server message.
    ///
    /// Processes untrusted network data: any malformed or truncated payload
    /// returns an error instead of panicking, and the decoder stays usable
    /// for the next frame.
    pub fn decode(&mut self, payload: &[u8]) -> Result<ServerMessage, DecoderError> {
        self.result = lz4::block::decompress(payload, None).map_err(|err| {
            debug!("frame decompression failed: {err}");
            DecoderError::DecompressionFailed {
                payload_size: payload.len(),
            }
        })?;

        let text = std::str::from_utf8(&self.result).map_err(|err| {
            debug!("decompressed frame is not UTF-8: {err}");
            DecoderError::InvalidUtf8 {
                payload_size: payload.len(),
            }
        })?;

        serde_json::from_str(text).map_err(|err| {
            debug!("envelope parse failed: {err}");
            DecoderError::MalformedEnvelope {
                reason: err.to_string(),
            }
        })
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}
