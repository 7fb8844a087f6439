//! Error types and handling for the Pilar server.
//!
//! Two families of errors exist. [`ServerError`] covers process-level failures
//! such as binding or a broken handshake. [`ProtocolError`] covers rejected
//! client input; those never escape a connection and are always answered with
//! an `error` message carrying [`ProtocolError::code`].

/// Enumeration of possible server errors.
///
/// Categorizes errors into network-related and internal server errors
/// to help with debugging and error handling.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Network-related errors such as binding failures or connection issues
    #[error("Network error: {0}")]
    Network(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A client message that was rejected.
///
/// Each variant maps to one machine-readable reason code sent back to the
/// offending connection. None of them changes state or closes the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// The message could not be parsed as a JSON object
    #[error("message is not valid JSON")]
    BadJson,

    /// A join was attempted with an empty identifier
    #[error("join requires a non-empty fid")]
    MissingFid,

    /// A per-player operation arrived before a join
    #[error("connection has not joined")]
    NotJoined,

    /// A mail send had an empty recipient or body
    #[error("mail requires a recipient and a body")]
    BadMail,
}

impl ProtocolError {
    /// The reason code placed in the `message` field of an error reply.
    pub fn code(&self) -> &'static str {
        match self {
            ProtocolError::BadJson => "bad_json",
            ProtocolError::MissingFid => "missing_fid",
            ProtocolError::NotJoined => "not_joined",
            ProtocolError::BadMail => "bad_mail",
        }
    }
}
