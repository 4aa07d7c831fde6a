//! Attachment references.
//!
//! The content is NOT loaded when a message is listed. A reference only
//! carries the filename and a handle that the owning mail client resolves
//! when the attachment is saved.

use std::path::PathBuf;

/// Where the message owning an attachment lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// A message inside an MBOX folder, addressed by byte range.
    Mbox {
        path: PathBuf,
        offset: u64,
        length: u64,
    },
    /// A standalone `.eml` file.
    Eml { path: PathBuf },
    /// Backend-defined key, for clients that are not file based.
    Key(String),
}

/// Opaque handle to one attachment of one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentHandle {
    /// The message that carries the attachment.
    pub locator: Locator,
    /// Position among the message's attachments (0-based).
    pub index: usize,
}

/// A read-only reference to an email attachment.
#[derive(Debug, Clone)]
pub struct AttachmentRef {
    /// Filename of the attachment. Generated if missing from the headers.
    pub file_name: String,

    /// Decoded size in bytes.
    pub size: u64,

    /// Resolved by [`crate::mailbox::MailClient::save_attachment`].
    pub handle: AttachmentHandle,
}
