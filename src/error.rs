use std::fmt;

/// Errors surfaced by the control surface of the engine.
///
/// None of these ever change what is currently audible: a failed operation
/// leaves the previously active voice playing untouched.
#[derive(Debug)]
pub enum EngineError {
    /// `start()` was called on an engine that is already running.
    AlreadyStarted,
    /// A control operation was issued before `start()` completed.
    NotStarted,
    /// The render side has been dropped; commands can no longer be delivered.
    RendererGone,
    /// The command queue to the render side is full.
    QueueFull { command: &'static str },
    /// A wave table handed to the engine was rejected.
    Table(WaveTableError),
    /// Engine configuration could not be parsed.
    Config(String),
}

/// Reasons a raw sample buffer cannot become a `WaveTable`.
#[derive(Debug, Clone, PartialEq)]
pub enum WaveTableError {
    WrongLength { expected: usize, found: usize },
    NonFinite { index: usize },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::AlreadyStarted => write!(f, "Audio engine already started"),
            EngineError::NotStarted => write!(f, "Audio engine not started"),
            EngineError::RendererGone => write!(f, "Renderer has been dropped"),
            EngineError::QueueFull { command } => {
                write!(f, "Command queue full, dropped '{command}'")
            }
            EngineError::Table(e) => write!(f, "Wave table error: {e}"),
            EngineError::Config(msg) => write!(f, "Config error: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl fmt::Display for WaveTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaveTableError::WrongLength { expected, found } => {
                write!(f, "Expected {expected} samples, found {found}")
            }
            WaveTableError::NonFinite { index } => {
                write!(f, "Non-finite sample at index {index}")
            }
        }
    }
}

impl std::error::Error for WaveTableError {}

impl From<WaveTableError> for EngineError {
    fn from(e: WaveTableError) -> Self {
        EngineError::Table(e)
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::Config(e.to_string())
    }
}
