//! Outgoing mail, as handed to [`crate::mailbox::MailClient::send`].

use std::path::PathBuf;

/// A composed message waiting to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    /// Send-on-behalf-of address. Most servers ignore it without extra permissions.
    pub from: Option<String>,
    /// Primary recipients.
    pub to: Vec<String>,
    /// Carbon-copy recipients.
    pub cc: Vec<String>,
    pub subject: String,
    /// Plain content; wrapped in a `<div>` to form the HTML body.
    pub content: String,
    /// File attached as-is.
    pub attachment: Option<PathBuf>,
}

impl OutgoingMail {
    /// Build a message from `;`-separated recipient strings.
    ///
    /// When `cc` is absent the `to` string is copied into it.
    pub fn new(
        to: &str,
        cc: Option<&str>,
        from: Option<&str>,
        subject: &str,
        content: &str,
        attachment: Option<PathBuf>,
    ) -> Self {
        Self {
            from: from.map(str::to_string),
            to: split_addresses(to),
            cc: split_addresses(cc.unwrap_or(to)),
            subject: subject.to_string(),
            content: content.to_string(),
            attachment,
        }
    }

    /// The HTML body that is actually sent.
    pub fn html_body(&self) -> String {
        format!("<div>{}</div>", self.content)
    }
}

/// Split `a@x; b@y;` into trimmed, non-empty addresses.
pub fn split_addresses(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
