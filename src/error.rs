use thiserror::Error;

/// Main error type
#[derive(Debug, Error)]
pub enum HandoverError {
    #[error("Buffer error: {0}")]
    Buffer(#[from] BufferError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),
}

impl HandoverError {
    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            HandoverError::Buffer(err) => err.user_message(),
            HandoverError::Config(err) => err.user_message(),
            HandoverError::Registry(err) => err.user_message(),
            HandoverError::Playback(err) => err.user_message(),
        }
    }

    /// Get suggested recovery actions for the error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            HandoverError::Buffer(err) => err.recovery_suggestions(),
            HandoverError::Config(err) => err.recovery_suggestions(),
            HandoverError::Registry(err) => err.recovery_suggestions(),
            HandoverError::Playback(err) => err.recovery_suggestions(),
        }
    }

    pub fn is_recoverable(&self) -> bool {
        match self {
            HandoverError::Buffer(err) => err.is_recoverable(),
            HandoverError::Config(err) => err.is_recoverable(),
            HandoverError::Registry(err) => err.is_recoverable(),
            HandoverError::Playback(err) => err.is_recoverable(),
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            HandoverError::Buffer(BufferError::InvalidFormat { .. }) => ErrorSeverity::Error,
            HandoverError::Buffer(_) => ErrorSeverity::Critical,
            HandoverError::Config(_) => ErrorSeverity::Warning,
            HandoverError::Registry(_) => ErrorSeverity::Error,
            HandoverError::Playback(PlaybackError::SeekOutOfRange { .. }) => ErrorSeverity::Info,
            HandoverError::Playback(_) => ErrorSeverity::Warning,
        }
    }
}

/// Error severity levels for logging and user feedback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl ErrorSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorSeverity::Info => "INFO",
            ErrorSeverity::Warning => "WARNING",
            ErrorSeverity::Error => "ERROR",
            ErrorSeverity::Critical => "CRITICAL",
        }
    }

    pub fn log_level(&self) -> log::Level {
        match self {
            ErrorSeverity::Info => log::Level::Info,
            ErrorSeverity::Warning => log::Level::Warn,
            ErrorSeverity::Error => log::Level::Error,
            ErrorSeverity::Critical => log::Level::Error,
        }
    }
}

/// Audio and frame buffer errors
#[derive(Debug, Error)]
pub enum BufferError {
    #[error("Allocation of {bytes} bytes failed")]
    AllocationFailed { bytes: usize },

    #[error("Frame allocation failed for {width}x{height}")]
    FrameAllocationFailed { width: u32, height: u32 },

    #[error("Invalid stream format: {reason}")]
    InvalidFormat { reason: String },
}

impl BufferError {
    pub fn user_message(&self) -> String {
        match self {
            BufferError::AllocationFailed { bytes } => {
                format!("Out of memory while growing the audio buffer to {} bytes", bytes)
            }
            BufferError::FrameAllocationFailed { width, height } => {
                format!("Out of memory while allocating a {}x{} frame", width, height)
            }
            BufferError::InvalidFormat { reason } => {
                format!("Decoded audio has an unusable format: {}", reason)
            }
        }
    }

    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            BufferError::AllocationFailed { .. } | BufferError::FrameAllocationFailed { .. } => vec![
                "Close other applications to free memory".to_string(),
                "Lower audio.safety_factor in the configuration".to_string(),
            ],
            BufferError::InvalidFormat { .. } => vec![
                "Check that the stream carries integer PCM audio".to_string(),
                "Try a different source URL".to_string(),
            ],
        }
    }

    pub fn is_recoverable(&self) -> bool {
        match self {
            BufferError::AllocationFailed { .. } => false,
            BufferError::FrameAllocationFailed { .. } => false,
            BufferError::InvalidFormat { .. } => true, // Next chunk may be valid
        }
    }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found")]
    ConfigDirNotFound,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] toml::ser::Error),

    #[error("Deserialization error: {0}")]
    DeserializationError(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigError {
    pub fn user_message(&self) -> String {
        match self {
            ConfigError::ConfigDirNotFound => {
                "Cannot find or create configuration directory".to_string()
            }
            ConfigError::IoError(err) => {
                format!("Cannot access configuration file: {}", err)
            }
            ConfigError::SerializationError(_) => {
                "Failed to save configuration settings".to_string()
            }
            ConfigError::DeserializationError(_) => {
                "Configuration file is corrupted or has invalid format".to_string()
            }
            ConfigError::Invalid { field, reason } => {
                format!("Setting '{}' is out of range: {}", field, reason)
            }
        }
    }

    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            ConfigError::ConfigDirNotFound => vec![
                "Check that you have write permissions to your home directory".to_string(),
                "Try creating the directory manually: ~/.config/handover-player/".to_string(),
            ],
            ConfigError::IoError(_) => vec![
                "Check file permissions for the configuration directory".to_string(),
                "Ensure the disk is not full".to_string(),
            ],
            ConfigError::SerializationError(_) => vec![
                "Configuration will use default values".to_string(),
                "Try resetting configuration with 'config reset'".to_string(),
            ],
            ConfigError::DeserializationError(_) => vec![
                "Delete the configuration file to reset to defaults".to_string(),
                "Check the configuration file format manually".to_string(),
            ],
            ConfigError::Invalid { field, .. } => vec![
                format!("Edit '{}' in the configuration file", field),
                "Run 'config reset' to restore defaults".to_string(),
            ],
        }
    }

    pub fn is_recoverable(&self) -> bool {
        true // Defaults are always available
    }
}

/// Name registry errors
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Node already registered: {name}")]
    AlreadyRegistered { name: String },

    #[error("Invalid node path: '{path}'")]
    InvalidPath { path: String },
}

impl RegistryError {
    pub fn user_message(&self) -> String {
        match self {
            RegistryError::AlreadyRegistered { name } => {
                format!("Another player output is already published as '{}'", name)
            }
            RegistryError::InvalidPath { path } => {
                format!("'{}' is not a usable node path", path)
            }
        }
    }

    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            RegistryError::AlreadyRegistered { .. } => vec![
                "Give each player node a unique path".to_string(),
            ],
            RegistryError::InvalidPath { .. } => vec![
                "Use an absolute path such as /project1/player1".to_string(),
            ],
        }
    }

    pub fn is_recoverable(&self) -> bool {
        false
    }
}

/// Non-fatal playback conditions. These are logged and surfaced in diagnostics
/// rather than returned from a tick.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("Transport error on '{url}': {message}")]
    Transport { url: String, message: String },

    #[error("Start time {start_ms}ms is beyond stream duration {duration_ms}ms")]
    SeekOutOfRange { start_ms: i64, duration_ms: i64 },
}

impl PlaybackError {
    pub fn user_message(&self) -> String {
        match self {
            PlaybackError::Transport { url, message } => {
                format!("Playback of '{}' failed: {}", url, message)
            }
            PlaybackError::SeekOutOfRange { start_ms, duration_ms } => {
                format!(
                    "Cannot start at {:.1}s - stream is only {:.1}s long",
                    *start_ms as f64 / 1000.0,
                    *duration_ms as f64 / 1000.0
                )
            }
        }
    }

    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            PlaybackError::Transport { .. } => vec![
                "Check that the URL is reachable".to_string(),
                "Request the URL again to restart playback".to_string(),
            ],
            PlaybackError::SeekOutOfRange { duration_ms, .. } => vec![
                format!("Use a start time below {:.1} seconds", *duration_ms as f64 / 1000.0),
            ],
        }
    }

    pub fn is_recoverable(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_handover_error_from_buffer_error() {
        let err: HandoverError = BufferError::AllocationFailed { bytes: 1024 }.into();
        match err {
            HandoverError::Buffer(BufferError::AllocationFailed { bytes }) => {
                assert_eq!(bytes, 1024);
            }
            _ => panic!("Expected Buffer error variant"),
        }
    }

    #[test]
    fn test_handover_error_from_registry_error() {
        let err: HandoverError = RegistryError::AlreadyRegistered {
            name: "/project1/player1".to_string(),
        }
        .into();
        assert!(matches!(err, HandoverError::Registry(_)));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_buffer_error_display() {
        let error = BufferError::AllocationFailed { bytes: 4096 };
        assert_eq!(format!("{}", error), "Allocation of 4096 bytes failed");

        let error = BufferError::FrameAllocationFailed { width: 1920, height: 1080 };
        assert_eq!(format!("{}", error), "Frame allocation failed for 1920x1080");

        let error = BufferError::InvalidFormat { reason: "zero channels".to_string() };
        assert_eq!(format!("{}", error), "Invalid stream format: zero channels");
    }

    #[test]
    fn test_playback_error_display() {
        let error = PlaybackError::SeekOutOfRange { start_ms: 12_000, duration_ms: 10_000 };
        assert_eq!(
            format!("{}", error),
            "Start time 12000ms is beyond stream duration 10000ms"
        );
        assert_eq!(error.user_message(), "Cannot start at 12.0s - stream is only 10.0s long");

        let error = PlaybackError::Transport {
            url: "a.mp4".to_string(),
            message: "connection reset".to_string(),
        };
        assert_eq!(format!("{}", error), "Transport error on 'a.mp4': connection reset");
    }

    #[test]
    fn test_config_error_display() {
        let error = ConfigError::ConfigDirNotFound;
        assert_eq!(format!("{}", error), "Configuration directory not found");

        let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "Permission denied");
        let error = ConfigError::IoError(io_error);
        assert!(format!("{}", error).contains("IO error"));

        let error = ConfigError::Invalid {
            field: "audio.safety_factor".to_string(),
            reason: "must be at least 1.0".to_string(),
        };
        assert_eq!(
            format!("{}", error),
            "Invalid value for audio.safety_factor: must be at least 1.0"
        );
    }

    #[test]
    fn test_severity_mapping() {
        let err: HandoverError = BufferError::AllocationFailed { bytes: 1 }.into();
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(err.severity().log_level(), log::Level::Error);

        let err: HandoverError = PlaybackError::SeekOutOfRange { start_ms: 2, duration_ms: 1 }.into();
        assert_eq!(err.severity(), ErrorSeverity::Info);

        let err: HandoverError = ConfigError::ConfigDirNotFound.into();
        assert_eq!(err.severity().as_str(), "WARNING");
    }

    #[test]
    fn test_recovery_suggestions_present() {
        let errors: Vec<HandoverError> = vec![
            BufferError::AllocationFailed { bytes: 1 }.into(),
            ConfigError::ConfigDirNotFound.into(),
            RegistryError::InvalidPath { path: String::new() }.into(),
            PlaybackError::Transport { url: "x".to_string(), message: "y".to_string() }.into(),
        ];
        for err in errors {
            assert!(!err.recovery_suggestions().is_empty());
            assert!(!err.user_message().is_empty());
        }
    }

    #[test]
    fn test_error_source_chain() {
        use std::error::Error;

        let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "Permission denied");
        let err = HandoverError::Config(ConfigError::IoError(io_error));

        let mut current_error: &dyn Error = &err;
        let mut error_count = 0;
        while let Some(source) = current_error.source() {
            current_error = source;
            error_count += 1;
        }
        assert!(error_count >= 1);
    }
}
