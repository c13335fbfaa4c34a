/// Commands the client can issue to the simulation server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientCommand {
    /// Start the loaded simulation
    Start,
    /// Pause the running simulation
    Pause,
    /// Stop the running simulation
    Stop,
    /// Load a simulation from a URL (reload class)
    InitUrl,
    /// Load a simulation from inline content (reload class)
    InitSim,
    /// Observe a simulation another client controls
    Observe,
    /// Ask for the list of watchable variables
    ListWatchVars,
    /// Ask for the list of forceable variables
    ListForceVars,
    /// Install watch lists on the server
    SetWatch,
    /// Retrieve the server's watch lists
    GetWatch,
    /// Begin streaming watched-variable updates
    StartWatch,
    /// Stop streaming watched-variable updates
    StopWatch,
    /// Clear all server-side watch lists
    ClearWatch,
    /// Ask for the server version
    Version,
}

impl ClientCommand {
    /// Wire name of the command, used as the envelope `type` field.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Pause => "pause",
            Self::Stop => "stop",
            Self::InitUrl => "init_url",
            Self::InitSim => "init_sim",
            Self::Observe => "observe",
            Self::ListWatchVars => "list_watch_vars",
            Self::ListForceVars => "list_force_vars",
            Self::SetWatch => "set_watch",
            Self::GetWatch => "get_watch",
            Self::StartWatch => "start_watch",
            Self::StopWatch => "stop_watch",
            Self::ClearWatch => "clear_watch",
            Self::Version => "version",
        }
    }

    /// Reload-class commands rebuild the whole simulation on the server and
    /// leave the transport busy until the server answers.
    pub fn is_reload(&self) -> bool {
        matches!(self, Self::InitUrl | Self::InitSim)
    }
}
