use std::fmt;

#[derive(Debug)]
pub enum EngineError {
    InvalidParameter(String),
    NotFound(String),
    SerializationError(String),
    DeserializationError(String),
    IoError(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EngineError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            EngineError::NotFound(msg) => write!(f, "Not found: {}", msg),
            EngineError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            EngineError::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
            EngineError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() {
            EngineError::DeserializationError(err.to_string())
        } else {
            EngineError::SerializationError(err.to_string())
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::IoError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
