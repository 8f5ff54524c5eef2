use std::fmt::{Display, Formatter};

/// Result type used by the engine crate.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors produced by engine components.
///
/// None of these reach the page: components turn them into logged, recovered
/// outcomes (defer, skip, retry or abandon).
#[derive(Debug)]
pub enum EngineError {
    EmptyPlaylist,
    InvalidConfig { reason: String },
    ConfigParse(serde_json::Error),
    InvalidDuration(f64),
    InvalidSurface { width: u32, height: u32 },
    RetriesExhausted { attempts: u32 },
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyPlaylist => write!(f, "playlist has no entries"),
            Self::InvalidConfig { reason } => write!(f, "invalid site config: {reason}"),
            Self::ConfigParse(err) => write!(f, "site config is not valid json ({err})"),
            Self::InvalidDuration(duration) => {
                write!(f, "media duration is not usable: {duration}")
            }
            Self::InvalidSurface { width, height } => {
                write!(f, "drawing surface has no area: {width}x{height}")
            }
            Self::RetriesExhausted { attempts } => {
                write!(f, "media retries exhausted after {attempts} attempts")
            }
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ConfigParse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(value: serde_json::Error) -> Self {
        Self::ConfigParse(value)
    }
}
