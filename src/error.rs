//! Error types for the order export.
//!
//! The extraction core never fails; everything here belongs to the
//! collaborators around it (configuration, mailbox, export sink).

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse bundle catalog: {0}")]
    BundleCatalog(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Mailbox collaborator errors.
///
/// Connection, authentication, folder selection and search failures abort
/// the run before any message is processed; protocol and IO failures stop
/// it where it is. Fetch and acknowledgement failures only concern a
/// single message.
#[derive(Debug, thiserror::Error)]
pub enum MailboxError {
    #[error("Could not connect to {host}: {reason}")]
    ConnectFailed { host: String, reason: String },

    #[error("Authentication failed for {username} on {host}")]
    AuthFailed { host: String, username: String },

    #[error("Could not select folder {folder}: {reason}")]
    FolderUnavailable { folder: String, reason: String },

    #[error("Search for unread messages failed: {0}")]
    SearchFailed(String),

    #[error("Could not fetch message {id}: {reason}")]
    FetchFailed { id: String, reason: String },

    #[error("Could not mark message {id} as read: {reason}")]
    AcknowledgeFailed { id: String, reason: String },

    #[error("Unexpected server response: {0}")]
    Protocol(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MailboxError {
    /// Whether this error ends the run rather than skipping one message.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::FetchFailed { .. } | Self::AcknowledgeFailed { .. }
        )
    }
}

/// Spreadsheet export errors.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Could not create export directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Workbook error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Sheet has {0} rows, more than a worksheet holds")]
    TooManyRows(usize),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_message_errors_are_not_fatal() {
        let fetch = MailboxError::FetchFailed {
            id: "7".into(),
            reason: "timeout".into(),
        };
        let ack = MailboxError::AcknowledgeFailed {
            id: "7".into(),
            reason: "NO".into(),
        };
        assert!(!fetch.is_fatal());
        assert!(!ack.is_fatal());
    }

    #[test]
    fn setup_errors_are_fatal() {
        let auth = MailboxError::AuthFailed {
            host: "imap.example.com".into(),
            username: "orders@example.com".into(),
        };
        let folder = MailboxError::FolderUnavailable {
            folder: "PayFast/Orders".into(),
            reason: "NO [NONEXISTENT]".into(),
        };
        assert!(auth.is_fatal());
        assert!(folder.is_fatal());
        assert!(MailboxError::SearchFailed("BAD".into()).is_fatal());
    }

    #[test]
    fn transport_errors_are_fatal() {
        assert!(MailboxError::Protocol("connection closed".into()).is_fatal());
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "read timed out");
        assert!(MailboxError::from(io).is_fatal());
    }
}
