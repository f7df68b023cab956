//! Error kinds for statline operations

use std::fmt;

/// The kind of error that occurred.
///
/// This enum categorizes errors to help users write clear error handling logic.
/// Users can match on ErrorKind to decide how to handle specific error cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // =========================================================================
    // General errors
    // =========================================================================
    /// An unexpected error occurred - catch-all for unhandled cases
    Unexpected,

    /// The requested feature or operation is not supported
    Unsupported,

    /// Invalid configuration or parameters
    ConfigInvalid,

    // =========================================================================
    // Dataset errors
    // =========================================================================
    /// CSV could not be read or parsed
    CsvFailed,

    /// The requested column is not present in the header
    ColumnNotFound,

    /// A cell expected to be numeric could not be parsed
    ValueNotNumeric,

    /// The table holds no rows
    EmptyTable,

    // =========================================================================
    // Inference/LLM errors
    // =========================================================================
    /// LLM inference failed
    InferenceFailed,

    /// The requested model is not available on the server
    ModelNotFound,

    /// Provider not available
    ProviderUnavailable,

    /// Rate limit exceeded
    RateLimited,

    // =========================================================================
    // Agent errors
    // =========================================================================
    /// The model requested a tool the agent does not expose
    ToolUnknown,

    /// Tool arguments did not match the declared schema
    ToolArgsInvalid,

    /// The agent loop did not finish within its step budget
    StepLimitExceeded,

    // =========================================================================
    // IO errors
    // =========================================================================
    /// File not found
    FileNotFound,

    /// Permission denied
    PermissionDenied,

    /// IO operation failed
    IoFailed,

    /// Network error
    NetworkFailed,

    // =========================================================================
    // Parse errors
    // =========================================================================
    /// Failed to parse input
    ParseFailed,

    /// Serialization/deserialization failed
    SerializationFailed,

    /// Invalid argument passed to function
    InvalidArgument,
}

impl ErrorKind {
    /// Returns the error kind as a static string
    pub fn as_str(&self) -> &'static str {
        match self {
            // General
            ErrorKind::Unexpected => "Unexpected",
            ErrorKind::Unsupported => "Unsupported",
            ErrorKind::ConfigInvalid => "ConfigInvalid",

            // Dataset
            ErrorKind::CsvFailed => "CsvFailed",
            ErrorKind::ColumnNotFound => "ColumnNotFound",
            ErrorKind::ValueNotNumeric => "ValueNotNumeric",
            ErrorKind::EmptyTable => "EmptyTable",

            // Inference
            ErrorKind::InferenceFailed => "InferenceFailed",
            ErrorKind::ModelNotFound => "ModelNotFound",
            ErrorKind::ProviderUnavailable => "ProviderUnavailable",
            ErrorKind::RateLimited => "RateLimited",

            // Agent
            ErrorKind::ToolUnknown => "ToolUnknown",
            ErrorKind::ToolArgsInvalid => "ToolArgsInvalid",
            ErrorKind::StepLimitExceeded => "StepLimitExceeded",

            // IO
            ErrorKind::FileNotFound => "FileNotFound",
            ErrorKind::PermissionDenied => "PermissionDenied",
            ErrorKind::IoFailed => "IoFailed",
            ErrorKind::NetworkFailed => "NetworkFailed",

            // Parse
            ErrorKind::ParseFailed => "ParseFailed",
            ErrorKind::SerializationFailed => "SerializationFailed",
            ErrorKind::InvalidArgument => "InvalidArgument",
        }
    }

    /// Check if this error kind is retryable by default
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::InferenceFailed
                | ErrorKind::NetworkFailed
                | ErrorKind::RateLimited
                | ErrorKind::ProviderUnavailable
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
