//! Message records as returned by a mail client.

use chrono::{DateTime, Utc};

use super::attachment::AttachmentRef;

/// One retrieved message. Immutable once retrieved.
#[derive(Debug, Clone)]
pub struct MessageRecord {
    /// Decoded subject line (empty when the header is missing).
    pub subject: String,

    /// Display name of the sender, or the bare address when there is none.
    pub sender_name: String,

    /// Primary recipients (`To:`) in header order, by name.
    pub recipients: Vec<String>,

    /// When the message was received.
    /// Falls back to the Unix epoch if the date is missing.
    pub received: DateTime<Utc>,

    /// Attachments in MIME order.
    pub attachments: Vec<AttachmentRef>,
}

impl MessageRecord {
    /// Recipients joined the way listings print them: `a; b; c`.
    pub fn recipient_list(&self) -> String {
        self.recipients.join("; ")
    }
}
