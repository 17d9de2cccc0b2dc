//! Mailbox collaborators that feed order notifications into the pipeline.
//!
//! A source lists unread messages, hands out their raw bytes one at a
//! time, and is told when a message's rows have been built so it can mark
//! the message as read.

pub mod directory;
pub mod imap;
pub mod message;

use std::fmt;

use crate::error::MailboxError;

pub use directory::DirectoryMailbox;
pub use imap::{ImapConfig, ImapMailbox};
pub use message::RawMessage;

/// Source-specific handle for one message (IMAP sequence number, file path).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where order notifications come from.
///
/// Calls block; the binary runs the whole drive on a blocking thread.
pub trait MailboxSource {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Unread messages, in mailbox order. Failure here ends the run.
    fn unread(&mut self) -> Result<Vec<MessageId>, MailboxError>;

    /// Raw RFC 822 bytes of one message, without marking it read.
    fn fetch(&mut self, id: &MessageId) -> Result<Vec<u8>, MailboxError>;

    /// Mark a message consumed once its rows are built.
    fn acknowledge(&mut self, id: &MessageId) -> Result<(), MailboxError>;
}
