use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outbound wire envelope, serialized to text before transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestEnvelope {
    #[serde(rename = "requestID")]
    pub request_id: String,
    #[serde(rename = "type")]
    pub msg_type: String,
    pub data: Option<String>,
}

/// A decoded inbound message from the server.
///
/// Control acknowledgments carry the request id of the command they answer;
/// spontaneous messages (scene updates, availability notices) carry none.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerMessage {
    #[serde(rename = "requestID", default)]
    pub request_id: Option<String>,
    #[serde(rename = "type")]
    msg_type: String,
    #[serde(default, alias = "data")]
    update: Option<Value>,
}

impl ServerMessage {
    #[cfg(test)]
    pub fn for_tests(msg_type: &str, update: Option<Value>) -> Self {
        Self {
            request_id: None,
            msg_type: msg_type.to_string(),
            update,
        }
    }

    pub fn kind(&self) -> ServerMessageKind {
        ServerMessageKind::from_tag(&self.msg_type)
    }

    /// The raw `type` discriminator as it appeared on the wire.
    pub fn raw_type(&self) -> &str {
        &self.msg_type
    }

    /// The update payload as a parsed document.
    ///
    /// The server embeds nested documents as JSON text inside the envelope;
    /// string payloads are therefore re-parsed before being returned.
    pub fn update_document(&self) -> Option<Value> {
        match &self.update {
            Some(Value::String(text)) => serde_json::from_str(text).ok(),
            other => other.clone(),
        }
    }

    /// The update payload as plain text, for messages whose data is not a
    /// nested document (client ids, script URLs, version strings).
    pub fn update_text(&self) -> Option<&str> {
        match &self.update {
            Some(Value::String(text)) => Some(text.as_str()),
            _ => None,
        }
    }
}

/// The server-to-client message vocabulary.
///
/// Unrecognized discriminators land in `Unknown` so a newer server never
/// breaks dispatch; handlers decide whether to ignore them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessageKind {
    /// Server-assigned client identity, used for request correlation
    ClientId,
    /// Full scene/model snapshot; triggers an initial tree build
    LoadModel,
    /// Incremental snapshot; reconciled into the live tree
    SceneUpdate,
    SimulationLoaded,
    SimulationStarted,
    SimulationPaused,
    SimulationStopped,
    SimulationConfiguration,
    /// Query-string parameters the server wants applied at startup
    ReadUrlParameters,
    ListWatchVars,
    ListForceVars,
    GetWatchLists,
    SetWatchLists,
    StartWatch,
    StopWatch,
    ClearWatch,
    /// Scripts the client should run after load
    FireSimScripts,
    RunScript,
    ServerVersion,
    ServerAvailable,
    ServerUnavailable,
    SimulatorFull,
    ObserverMode,
    ReloadCanvas,
    InfoMessage,
    ErrorLoadingSimulation,
    ErrorLoadingSimulationConfig,
    ErrorAddingWatchList,
    ErrorReadingScript,
    Unknown(String),
}

impl ServerMessageKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "client_id" => Self::ClientId,
            "load_model" => Self::LoadModel,
            "scene_update" => Self::SceneUpdate,
            "simulation_loaded" => Self::SimulationLoaded,
            "simulation_started" => Self::SimulationStarted,
            "simulation_paused" => Self::SimulationPaused,
            "simulation_stopped" => Self::SimulationStopped,
            "simulation_configuration" => Self::SimulationConfiguration,
            "read_url_parameters" => Self::ReadUrlParameters,
            "list_watch_vars" => Self::ListWatchVars,
            "list_force_vars" => Self::ListForceVars,
            "get_watch_lists" => Self::GetWatchLists,
            "set_watch_lists" => Self::SetWatchLists,
            "start_watch" => Self::StartWatch,
            "stop_watch" => Self::StopWatch,
            "clear_watch" => Self::ClearWatch,
            "fire_sim_scripts" => Self::FireSimScripts,
            "run_script" => Self::RunScript,
            "server_version" => Self::ServerVersion,
            "server_available" => Self::ServerAvailable,
            "server_unavailable" => Self::ServerUnavailable,
            "simulator_full" => Self::SimulatorFull,
            "observer_mode" => Self::ObserverMode,
            "reload_canvas" => Self::ReloadCanvas,
            "info_message" => Self::InfoMessage,
            "error_loading_simulation" => Self::ErrorLoadingSimulation,
            "error_loading_simulation_config" => Self::ErrorLoadingSimulationConfig,
            "error_adding_watch_list" => Self::ErrorAddingWatchList,
            "error_reading_script" => Self::ErrorReadingScript,
            other => Self::Unknown(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn watch_and_startup_discriminators_are_recognized() {
        assert_eq!(
            ServerMessageKind::from_tag("read_url_parameters"),
            ServerMessageKind::ReadUrlParameters
        );
        assert_eq!(
            ServerMessageKind::from_tag("list_force_vars"),
            ServerMessageKind::ListForceVars
        );
    }

    #[test]
    fn unknown_discriminators_are_preserved() {
        let kind = ServerMessageKind::from_tag("hologram_update");
        assert_eq!(kind, ServerMessageKind::Unknown("hologram_update".to_string()));
    }

    #[test]
    fn string_updates_reparse_as_documents() {
        let message = ServerMessage::for_tests(
            "load_model",
            Some(Value::String(r#"{"e1":{"kind":"Entity"}}"#.to_string())),
        );
        assert_eq!(
            message.update_document(),
            Some(json!({"e1": {"kind": "Entity"}}))
        );
    }

    #[test]
    fn object_updates_are_returned_as_is() {
        let message = ServerMessage::for_tests("scene_update", Some(json!({"t": 1})));
        assert_eq!(message.update_document(), Some(json!({"t": 1})));
        assert_eq!(message.update_text(), None);
    }
}
