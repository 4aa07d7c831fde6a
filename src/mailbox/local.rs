//! Local mail store: a directory tree standing in for a desktop mail client.
//!
//! ```text
//! <root>/
//!   Outbox.mbox                 sent mail is appended here
//!   <account>/
//!     Inbox.mbox                an MBOX folder
//!     收件箱/                    a folder of standalone .eml files
//!       0001.eml
//! ```

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info};

use crate::error::{MailKpiError, Result};
use crate::model::attachment::{AttachmentRef, Locator};
use crate::model::mail::MessageRecord;
use crate::model::outgoing::OutgoingMail;

use super::mbox::{MboxFolder, MessageSpan};
use super::{mime, MailClient};

/// Name of the MBOX file that receives sent mail.
pub const OUTBOX: &str = "Outbox.mbox";

/// A [`MailClient`] over a directory of accounts.
pub struct LocalMailStore {
    root: PathBuf,
}

impl LocalMailStore {
    /// Open a store rooted at `root`, which must be an existing directory.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(MailKpiError::StoreNotFound(root));
        }
        Ok(Self { root })
    }

    /// Path of the outbox MBOX.
    pub fn outbox_path(&self) -> PathBuf {
        self.root.join(OUTBOX)
    }

    /// Resolve a folder name to its MBOX file or `.eml` directory.
    fn folder_path(&self, account: &str, folder: &str) -> Option<PathBuf> {
        let account_dir = self.root.join(account);
        let mbox = account_dir.join(format!("{folder}.mbox"));
        if mbox.is_file() {
            return Some(mbox);
        }
        let dir = account_dir.join(folder);
        dir.is_dir().then_some(dir)
    }

    fn read_mbox_folder(path: &Path) -> Result<Vec<MessageRecord>> {
        let folder = MboxFolder::new(path);
        let mut records = Vec::new();
        folder.scan(&mut |span, raw| {
            let locator = Locator::Mbox {
                path: path.to_path_buf(),
                offset: span.offset,
                length: span.length,
            };
            records.push(mime::parse_record(raw, locator));
        })?;
        Ok(records)
    }

    fn read_eml_folder(path: &Path) -> Result<Vec<MessageRecord>> {
        let mut records = Vec::new();
        for entry in std::fs::read_dir(path).map_err(|e| MailKpiError::io(path, e))? {
            let entry = entry.map_err(|e| MailKpiError::io(path, e))?;
            let file = entry.path();
            let is_eml = file
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case("eml"))
                .unwrap_or(false);
            if !is_eml || !file.is_file() {
                continue;
            }
            let raw = std::fs::read(&file).map_err(|e| MailKpiError::io(&file, e))?;
            records.push(mime::parse_record(&raw, Locator::Eml { path: file }));
        }
        Ok(records)
    }
}

impl MailClient for LocalMailStore {
    fn accounts(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root).map_err(|e| MailKpiError::io(&self.root, e))? {
            let entry = entry.map_err(|e| MailKpiError::io(&self.root, e))?;
            if entry.path().is_dir() {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn folders(&self, account: &str) -> Result<Vec<String>> {
        let dir = self.root.join(account);
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&dir).map_err(|e| MailKpiError::io(&dir, e))? {
            let entry = entry.map_err(|e| MailKpiError::io(&dir, e))?;
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();
            if path.is_dir() {
                names.push(name);
            } else if let Some(stem) = name.strip_suffix(".mbox") {
                if name != OUTBOX {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn sorted_items(&self, account: &str, folder: &str) -> Result<Vec<MessageRecord>> {
        let unsortable = || MailKpiError::FolderUnsortable {
            folder: folder.to_string(),
        };
        let path = self.folder_path(account, folder).ok_or_else(unsortable)?;

        let read = if path.is_dir() {
            Self::read_eml_folder(&path)
        } else {
            Self::read_mbox_folder(&path)
        };
        let mut records = read.map_err(|e| {
            debug!(folder, error = %e, "Folder could not be read");
            unsortable()
        })?;

        // Stable, so equal timestamps keep their on-disk order
        records.sort_by(|a, b| b.received.cmp(&a.received));
        Ok(records)
    }

    fn save_attachment(&self, attachment: &AttachmentRef, dest: &Path) -> Result<()> {
        let raw = match &attachment.handle.locator {
            Locator::Mbox {
                path,
                offset,
                length,
            } => MboxFolder::new(path).read_message(MessageSpan {
                offset: *offset,
                length: *length,
            })?,
            Locator::Eml { path } => std::fs::read(path).map_err(|e| MailKpiError::io(path, e))?,
            Locator::Key(_) => {
                return Err(MailKpiError::AttachmentNotFound(attachment.file_name.clone()))
            }
        };
        let data = mime::extract_attachment(&raw, attachment.handle.index)?;
        std::fs::write(dest, &data).map_err(|e| MailKpiError::io(dest, e))?;
        debug!(
            file_name = %attachment.file_name,
            dest = %dest.display(),
            bytes = data.len(),
            "Saved attachment"
        );
        Ok(())
    }

    fn send(&self, mail: &OutgoingMail) -> Result<()> {
        let now = Utc::now();
        let raw = mime::render_outgoing(mail, now)?;
        let sender = mail.from.as_deref().unwrap_or_default();
        MboxFolder::new(self.outbox_path()).append(sender, now, &raw)?;
        info!(
            to = %mail.to.join(", "),
            subject = %mail.subject,
            outbox = %self.outbox_path().display(),
            "Queued message"
        );
        Ok(())
    }
}
