use std::path::PathBuf;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the library
#[derive(Debug)]
pub enum Error {
    IoError(std::io::Error),
    ParseError { file: PathBuf, message: String },
    InvalidArgument(String),
    /// A schema object was constructed in violation of its structural rules
    InvalidObject { object: &'static str, message: String },
    /// The inspected views cannot be expressed as a document
    GenerationError(String),
    /// A reference or resolver invariant was broken
    ReferenceError(String),
    /// Attempt to modify or delete the contents of a `$ref` object
    ReferenceImmutable,
    ConfigurationError(String),
    SerializationError(String),
}

impl Error {
    pub fn invalid(object: &'static str, message: impl Into<String>) -> Self {
        Error::InvalidObject {
            object,
            message: message.into(),
        }
    }

    pub fn generation(message: impl Into<String>) -> Self {
        Error::GenerationError(message.into())
    }

    pub fn reference(message: impl Into<String>) -> Self {
        Error::ReferenceError(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Error::ConfigurationError(message.into())
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::IoError(e) => write!(f, "IO error: {}", e),
            Error::ParseError { file, message } => {
                write!(f, "failed to parse {}: {}", file.display(), message)
            }
            Error::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            Error::InvalidObject { object, message } => {
                write!(f, "invalid {}: {}", object, message)
            }
            Error::GenerationError(msg) => write!(f, "schema generation failed: {}", msg),
            Error::ReferenceError(msg) => write!(f, "reference error: {}", msg),
            Error::ReferenceImmutable => write!(f, "$ref objects are immutable"),
            Error::ConfigurationError(msg) => write!(f, "configuration error: {}", msg),
            Error::SerializationError(msg) => write!(f, "serialization error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::SerializationError(format!("YAML error: {}", err))
    }
}
