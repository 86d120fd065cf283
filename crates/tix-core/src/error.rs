use thiserror::Error;

#[derive(Debug, Error)]
pub enum TixError {
    #[error("not initialized: run 'tix init'")]
    NotInitialized,

    #[error("ticket not found: {0}")]
    TicketNotFound(String),

    #[error("ticket already exists: {0}")]
    TicketExists(String),

    #[error("invalid ticket code '{0}': must be alphanumeric with dashes or underscores")]
    InvalidCode(String),

    #[error("no such status: {0}")]
    InvalidStatus(String),

    #[error("cannot switch from status '{from}' to '{to}'")]
    InvalidTransition { from: String, to: String },

    #[error("invalid time '{0}'")]
    InvalidTime(String),

    #[error("last work entry is not open")]
    NoOpenEntry,

    #[error("work log is empty")]
    NoEntries,

    #[error("comment text is empty")]
    EmptyComment,

    #[error("unknown provider '{provider}' for {concern}")]
    UnknownProvider { concern: String, provider: String },

    #[error("external {concern} query failed: {message}")]
    ExternalQueryFailed { concern: String, message: String },

    #[error("unexpected status '{0}' from external provider")]
    UnknownExternalStatus(String),

    #[error("malformed ticket record: {0}")]
    MalformedRecord(String),

    #[error("home directory not found: set HOME environment variable")]
    HomeNotFound,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, TixError>;
