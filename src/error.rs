use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditPointError {
    #[error("I/O error while {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON parse error while {context}: {source}")]
    Json {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to decode audio '{path}': {message}")]
    AudioDecode { path: String, message: String },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("geometry constraint violated: {message}")]
    Geometry { message: String },
    #[error("sample index {index} out of range for buffer of {len} samples")]
    OutOfRange { index: usize, len: usize },
    #[error("invalid sample range [{start}, {end}) for buffer of {len} samples")]
    InvalidRange { start: usize, end: usize, len: usize },
    #[error("failed to write clip '{path}': {message}")]
    WriteFailure { path: String, message: String },
    #[error("failed to resample clip: {message}")]
    Resample { message: String },
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl EditPointError {
    pub(crate) fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }

    pub(crate) fn json(context: &'static str, source: serde_json::Error) -> Self {
        Self::Json { context, source }
    }

    pub(crate) fn audio_decode(path: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::AudioDecode {
            path: path.into(),
            message: err.to_string(),
        }
    }

    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub(crate) fn geometry(message: impl Into<String>) -> Self {
        Self::Geometry {
            message: message.into(),
        }
    }

    pub(crate) fn write_failure(path: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::WriteFailure {
            path: path.into(),
            message: err.to_string(),
        }
    }

    pub(crate) fn resample(err: impl std::fmt::Display) -> Self {
        Self::Resample {
            message: err.to_string(),
        }
    }

    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// True when the failure only invalidates a single candidate and the rest
    /// of the utterance can still be processed.
    pub fn is_candidate_scoped(&self) -> bool {
        matches!(
            self,
            Self::Geometry { .. }
                | Self::WriteFailure { .. }
                | Self::OutOfRange { .. }
                | Self::InvalidRange { .. }
                | Self::Resample { .. }
        )
    }
}
