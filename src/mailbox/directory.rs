//! Local directory of saved `.eml` files, used in place of a live mailbox.
//!
//! Every `.eml` file under the root is unread until acknowledged, which
//! moves it into `<root>/processed/` at the same relative path.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::MailboxError;
use crate::mailbox::{MailboxSource, MessageId};

/// Subdirectory that acknowledged messages are moved into.
pub const PROCESSED_DIR: &str = "processed";

pub struct DirectoryMailbox {
    root: PathBuf,
}

fn is_eml(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|s| s.eq_ignore_ascii_case("eml"))
}

impl DirectoryMailbox {
    /// Open a directory. A missing directory is a fatal setup error.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, MailboxError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(MailboxError::FolderUnavailable {
                folder: root.display().to_string(),
                reason: "not a directory".into(),
            });
        }
        Ok(Self { root })
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.root.join(PROCESSED_DIR)
    }
}

impl MailboxSource for DirectoryMailbox {
    fn name(&self) -> &str {
        "directory"
    }

    /// `.eml` files outside `processed/`, sorted by path.
    fn unread(&mut self) -> Result<Vec<MessageId>, MailboxError> {
        let processed = self.processed_dir();
        let mut files = WalkDir::new(&self.root)
            .into_iter()
            .filter_entry(|e| e.path() != processed.as_path())
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| is_eml(p))
            .collect::<Vec<_>>();
        files.sort();
        debug!(root = %self.root.display(), count = files.len(), "Scanned message directory");
        Ok(files
            .into_iter()
            .map(|p| MessageId::new(p.to_string_lossy()))
            .collect())
    }

    fn fetch(&mut self, id: &MessageId) -> Result<Vec<u8>, MailboxError> {
        fs::read(id.as_str()).map_err(|e| MailboxError::FetchFailed {
            id: id.to_string(),
            reason: e.to_string(),
        })
    }

    fn acknowledge(&mut self, id: &MessageId) -> Result<(), MailboxError> {
        let ack_failed = |reason: String| MailboxError::AcknowledgeFailed {
            id: id.to_string(),
            reason,
        };

        let source = Path::new(id.as_str());
        let relative = source
            .strip_prefix(&self.root)
            .map_err(|_| ack_failed(format!("not under {}", self.root.display())))?;
        let target = self.processed_dir().join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| ack_failed(e.to_string()))?;
        }

        if target.exists() {
            return Err(ack_failed(format!("{} already exists", target.display())));
        }
        fs::rename(source, &target).map_err(|e| ack_failed(e.to_string()))
    }
}
