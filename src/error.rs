//! Crate-level error type.
//!
//! Each module reports its own error enum; [`Error`] gathers them for the
//! controller, and [`ErrorKind`] classifies them for logging and recovery.

extern crate alloc;
use alloc::format;
use alloc::string::String;
use core::fmt;

use crate::mapping::MappingError;
use crate::settings::SettingsError;
use crate::validation::InvalidInput;

/// Broad error classes and how each is recovered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or out-of-range command. Logged; no motion.
    InvalidInput,
    /// Settings could not be read or written. Defaults or best-effort skip.
    Io,
    /// Unusable mapping range. Rejected at startup.
    Config,
    /// Network or broker down. Retried on a timer.
    TransportDisconnected,
    /// Filesystem would not mount. Defaults and provisioning.
    StorageUnavailable,
}

impl ErrorKind {
    /// Returns the kind as a short lowercase string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid input",
            ErrorKind::Io => "i/o",
            ErrorKind::Config => "configuration",
            ErrorKind::TransportDisconnected => "transport disconnected",
            ErrorKind::StorageUnavailable => "storage unavailable",
        }
    }
}

/// Any error the controller deals with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// Command payload rejected.
    InvalidInput(InvalidInput),
    /// Settings persistence failed.
    Settings(SettingsError),
    /// Mapping range unusable.
    Mapping(MappingError),
    /// Broker operation failed.
    Transport(String),
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidInput(_) => ErrorKind::InvalidInput,
            Error::Settings(SettingsError::StorageUnavailable) => ErrorKind::StorageUnavailable,
            Error::Settings(_) => ErrorKind::Io,
            Error::Mapping(_) => ErrorKind::Config,
            Error::Transport(_) => ErrorKind::TransportDisconnected,
        }
    }

    /// Wrap a client error from any [`crate::traits::MqttClient`].
    pub fn transport(e: impl fmt::Debug) -> Self {
        Error::Transport(format!("{:?}", e))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidInput(e) => write!(f, "invalid input: {}", e),
            Error::Settings(e) => write!(f, "{}", e),
            Error::Mapping(e) => write!(f, "mapping: {}", e),
            Error::Transport(e) => write!(f, "transport: {}", e),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

impl From<InvalidInput> for Error {
    fn from(e: InvalidInput) -> Self {
        Error::InvalidInput(e)
    }
}

impl From<SettingsError> for Error {
    fn from(e: SettingsError) -> Self {
        Error::Settings(e)
    }
}

impl From<MappingError> for Error {
    fn from(e: MappingError) -> Self {
        Error::Mapping(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(Error::from(InvalidInput::Empty).kind(), ErrorKind::InvalidInput);
        assert_eq!(
            Error::from(SettingsError::StorageUnavailable).kind(),
            ErrorKind::StorageUnavailable
        );
        assert_eq!(Error::from(SettingsError::NotFound).kind(), ErrorKind::Io);
        assert_eq!(
            Error::from(MappingError::DegenerateInput).kind(),
            ErrorKind::Config
        );
        assert_eq!(Error::transport("refused").kind(), ErrorKind::TransportDisconnected);
    }

    #[test]
    fn display() {
        let e = Error::from(InvalidInput::Empty);
        assert_eq!(e.to_string(), "invalid input: empty command");

        let e = Error::transport("refused");
        assert_eq!(e.to_string(), "transport: \"refused\"");
    }
}
