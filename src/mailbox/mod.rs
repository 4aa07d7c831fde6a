//! Mail client access: the capability trait, message retrieval, and the local store backend.

pub mod local;
pub mod mbox;
pub mod mime;

use std::path::Path;

use tracing::{debug, warn};

use crate::error::{MailKpiError, Result};
use crate::model::attachment::AttachmentRef;
use crate::model::mail::MessageRecord;
use crate::model::outgoing::OutgoingMail;

/// Folders read when no filter is given.
pub const DEFAULT_FOLDERS: &str = "收件箱, Inbox";

/// The operations this crate needs from a mail client.
///
/// Everything above this trait (selection, reporting, listings) is written
/// against it, so a client can be swapped for a fake in tests.
pub trait MailClient {
    /// Names of the top-level account folders.
    fn accounts(&self) -> Result<Vec<String>>;

    /// Names of the folders directly under an account.
    fn folders(&self, account: &str) -> Result<Vec<String>>;

    /// Items of a folder, newest received first.
    ///
    /// Returns [`MailKpiError::FolderUnsortable`] when the folder cannot be
    /// listed in that order.
    fn sorted_items(&self, account: &str, folder: &str) -> Result<Vec<MessageRecord>>;

    /// Write the decoded attachment content to `dest`.
    fn save_attachment(&self, attachment: &AttachmentRef, dest: &Path) -> Result<()>;

    /// Hand a composed message to the client's transport.
    fn send(&self, mail: &OutgoingMail) -> Result<()>;
}

/// How many messages a retrieval may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLimit {
    /// No limit (`-1` on the command line).
    All,
    /// At most this many messages.
    AtMost(usize),
}

impl MessageLimit {
    /// Interpret the `--max-emails` value: `-1` or any positive count.
    pub fn from_arg(value: i64) -> Result<Self> {
        match value {
            -1 => Ok(Self::All),
            n if n >= 1 => Ok(Self::AtMost(n as usize)),
            n => Err(MailKpiError::InvalidMessageLimit(n)),
        }
    }
}

/// Split a comma-separated folder filter into trimmed names.
pub fn parse_folder_filter(raw: &str) -> Vec<String> {
    raw.split(',').map(|s| s.trim().to_string()).collect()
}

/// Collect messages from the named folders of one account.
///
/// Folders are visited in the client's order and only when their name is in
/// `folders`; each contributes its items newest first. Folders that cannot
/// be sorted are skipped. An unknown account yields an empty list.
pub fn fetch_messages(
    client: &dyn MailClient,
    account: &str,
    folders: &[String],
    limit: MessageLimit,
) -> Result<Vec<MessageRecord>> {
    let mut items = Vec::new();

    if !client.accounts()?.iter().any(|a| a == account) {
        warn!(account, "Account not found in mail store");
        return Ok(items);
    }

    for folder in client.folders(account)? {
        if !folders.iter().any(|f| *f == folder) {
            continue;
        }
        match client.sorted_items(account, &folder) {
            Ok(mut found) => {
                debug!(account, folder = %folder, count = found.len(), "Read folder");
                items.append(&mut found);
            }
            Err(MailKpiError::FolderUnsortable { folder }) => {
                debug!(account, folder = %folder, "Skipping folder that cannot be sorted");
            }
            Err(e) => return Err(e),
        }
    }

    if let MessageLimit::AtMost(n) = limit {
        items.truncate(n);
    }
    Ok(items)
}
