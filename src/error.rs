// Error types shared by every command. Each variant maps to one failure
// class a caller can act on; see `exit_code` for how the binary reports them.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, HecateError>;

/// Exit codes used by the `hecate` binary.
pub mod exit_codes {
    pub const GENERAL_ERROR: i32 = 1;
    pub const AUTH_ERROR: i32 = 2;
    pub const NETWORK_ERROR: i32 = 3;
    pub const VALIDATION_ERROR: i32 = 4;
    pub const SERVER_ERROR: i32 = 5;
}

#[derive(Debug, Error)]
pub enum HecateError {
    /// A required option was not supplied and the mode does not prompt.
    #[error("options.{field} required")]
    MissingField { field: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Server error ({status}): {body}")]
    Server { status: u16, body: String },

    #[error("404: Could not obtain auth list")]
    AuthListUnavailable,

    /// A clone stream line could not be decoded. The transfer is abandoned.
    #[error("Malformed record on line {line}: {source}")]
    MalformedRecord {
        line: u64,
        #[source]
        source: serde_json::Error,
    },

    /// The clone stream ended before the end-of-transmission record.
    /// Anything already written to the sink must be discarded.
    #[error("Transfer truncated after {records} records; output is incomplete and must be discarded")]
    TruncatedTransfer { records: u64 },

    #[error("Prompt aborted: {0}")]
    PromptAborted(String),

    #[error("Transfer cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl HecateError {
    pub fn missing(field: &str) -> Self {
        HecateError::MissingField {
            field: field.to_string(),
        }
    }

    /// Get the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            HecateError::MissingField { .. } | HecateError::Config(_) => {
                exit_codes::VALIDATION_ERROR
            }
            HecateError::PromptAborted(_) => exit_codes::AUTH_ERROR,
            HecateError::Transport(_)
            | HecateError::MalformedRecord { .. }
            | HecateError::TruncatedTransfer { .. } => exit_codes::NETWORK_ERROR,
            HecateError::Server { status, .. } if *status == 401 || *status == 403 => {
                exit_codes::AUTH_ERROR
            }
            HecateError::Server { .. } | HecateError::AuthListUnavailable => {
                exit_codes::SERVER_ERROR
            }
            HecateError::Cancelled | HecateError::Io(_) | HecateError::Decode(_) => {
                exit_codes::GENERAL_ERROR
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_names_the_option() {
        let err = HecateError::missing("name");
        assert_eq!(err.to_string(), "options.name required");
        assert_eq!(err.exit_code(), exit_codes::VALIDATION_ERROR);
    }

    #[test]
    fn unauthorized_server_errors_map_to_auth_exit_code() {
        let err = HecateError::Server {
            status: 401,
            body: "Not Authorized".into(),
        };
        assert_eq!(err.exit_code(), exit_codes::AUTH_ERROR);

        let err = HecateError::Server {
            status: 500,
            body: "boom".into(),
        };
        assert_eq!(err.exit_code(), exit_codes::SERVER_ERROR);
    }

    #[test]
    fn truncation_reports_forwarded_count() {
        let err = HecateError::TruncatedTransfer { records: 3 };
        assert!(err.to_string().contains("after 3 records"));
        assert_eq!(err.exit_code(), exit_codes::NETWORK_ERROR);
    }
}
