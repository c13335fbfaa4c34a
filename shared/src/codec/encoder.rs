use serde_json::Value;

use crate::messages::command::ClientCommand;
use crate::messages::server_message::RequestEnvelope;

use super::error::EncoderError;

/// Build the outbound wire envelope for one request, serialized to text.
///
/// Payloads that are already strings pass through unchanged; anything else
/// is serialized to JSON text first. No compression is applied on the
/// outbound path.
pub fn encode_request(
    request_id: &str,
    command: ClientCommand,
    payload: Option<&Value>,
) -> Result<String, EncoderError> {
    let data = match payload {
        None => None,
        Some(Value::String(text)) => Some(text.clone()),
        Some(value) => Some(serde_json::to_string(value).map_err(|_| {
            EncoderError::PayloadSerializationFailed {
                command: command.name().to_string(),
            }
        })?),
    };

    let envelope = RequestEnvelope {
        request_id: request_id.to_string(),
        msg_type: command.name().to_string(),
        data,
    };

    serde_json::to_string(&envelope).map_err(|_| EncoderError::EnvelopeSerializationFailed {
        request_id: request_id.to_string(),
    })
}
