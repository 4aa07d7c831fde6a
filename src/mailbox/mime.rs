//! MIME handling: decoding retrieved messages and rendering outgoing ones.

use base64::Engine;
use chrono::{DateTime, Utc};
use mail_parser::{Address, MessageParser, MimeHeaders};

use crate::error::{MailKpiError, Result};
use crate::model::attachment::{AttachmentHandle, AttachmentRef, Locator};
use crate::model::mail::MessageRecord;
use crate::model::outgoing::OutgoingMail;

use super::mbox::skip_from_line;

/// Line length for base64 bodies (RFC 2045 caps it at 76).
const BASE64_LINE: usize = 76;

/// Decode a raw message (with or without its MBOX separator line) into a record.
///
/// Unparseable input still yields a record with empty fields, so a single bad
/// message never hides the rest of a folder.
pub fn parse_record(raw_message: &[u8], locator: Locator) -> MessageRecord {
    let message_bytes = skip_from_line(raw_message);

    let Some(msg) = MessageParser::default().parse(message_bytes) else {
        tracing::warn!(?locator, "Could not parse message, keeping an empty record");
        return MessageRecord {
            subject: String::new(),
            sender_name: String::new(),
            recipients: Vec::new(),
            received: DateTime::UNIX_EPOCH,
            attachments: Vec::new(),
        };
    };

    let subject = msg.subject().unwrap_or_default().to_string();

    let sender_name = msg
        .from()
        .and_then(|from| address_names(from).into_iter().next())
        .unwrap_or_default();

    let recipients = msg.to().map(address_names).unwrap_or_default();

    let received = msg
        .date()
        .and_then(|d| DateTime::from_timestamp(d.to_timestamp(), 0))
        .unwrap_or(DateTime::UNIX_EPOCH);

    let attachments = msg
        .attachments()
        .enumerate()
        .map(|(index, part)| AttachmentRef {
            file_name: part
                .attachment_name()
                .map(String::from)
                .unwrap_or_else(|| format!("attachment_{index}")),
            size: part.contents().len() as u64,
            handle: AttachmentHandle {
                locator: locator.clone(),
                index,
            },
        })
        .collect();

    MessageRecord {
        subject,
        sender_name,
        recipients,
        received,
        attachments,
    }
}

/// Decode the content of the `index`-th attachment of a raw message.
pub fn extract_attachment(raw_message: &[u8], index: usize) -> Result<Vec<u8>> {
    let message_bytes = skip_from_line(raw_message);
    let msg = MessageParser::default().parse(message_bytes).ok_or_else(|| {
        MailKpiError::MimeError("Failed to parse message for attachment extraction".into())
    })?;

    msg.attachments()
        .nth(index)
        .map(|part| part.contents().to_vec())
        .ok_or_else(|| MailKpiError::MimeError(format!("Message has no attachment #{index}")))
}

/// Names of every mailbox in an address header, in order.
/// The display name is preferred; the bare address stands in when it is missing.
fn address_names(address: &Address<'_>) -> Vec<String> {
    let addrs: Vec<&mail_parser::Addr<'_>> = match address {
        Address::List(list) => list.iter().collect(),
        Address::Group(groups) => groups.iter().flat_map(|g| g.addresses.iter()).collect(),
    };
    addrs
        .into_iter()
        .filter_map(|a| {
            a.name
                .as_deref()
                .filter(|n| !n.trim().is_empty())
                .or(a.address.as_deref())
                .map(|s| s.trim().to_string())
        })
        .collect()
}

/// Render an outgoing mail as RFC 5322 bytes with an HTML body.
///
/// With an attachment the message becomes `multipart/mixed`.
pub fn render_outgoing(mail: &OutgoingMail, date: DateTime<Utc>) -> Result<Vec<u8>> {
    let mut out = String::with_capacity(1024);

    out.push_str(&format!("Date: {}\r\n", date.to_rfc2822()));
    if let Some(from) = &mail.from {
        out.push_str(&format!("From: {from}\r\n"));
        out.push_str(&format!("Sender: {from}\r\n"));
    }
    if !mail.to.is_empty() {
        out.push_str(&format!("To: {}\r\n", mail.to.join(", ")));
    }
    if !mail.cc.is_empty() {
        out.push_str(&format!("Cc: {}\r\n", mail.cc.join(", ")));
    }
    out.push_str(&format!("Subject: {}\r\n", encode_header_word(&mail.subject)));
    out.push_str("MIME-Version: 1.0\r\n");

    let html = mail.html_body();

    match &mail.attachment {
        None => {
            out.push_str("Content-Type: text/html; charset=utf-8\r\n");
            out.push_str("Content-Transfer-Encoding: base64\r\n\r\n");
            out.push_str(&base64_lines(html.as_bytes()));
        }
        Some(path) => {
            let data = std::fs::read(path).map_err(|e| MailKpiError::io(path, e))?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "attachment".to_string());
            let boundary = format!("mailkpi-{}", date.timestamp_nanos_opt().unwrap_or(0));

            out.push_str(&format!(
                "Content-Type: multipart/mixed; boundary=\"{boundary}\"\r\n\r\n"
            ));
            out.push_str(&format!("--{boundary}\r\n"));
            out.push_str("Content-Type: text/html; charset=utf-8\r\n");
            out.push_str("Content-Transfer-Encoding: base64\r\n\r\n");
            out.push_str(&base64_lines(html.as_bytes()));
            out.push_str(&format!("--{boundary}\r\n"));
            out.push_str(&format!(
                "Content-Type: application/octet-stream; name=\"{}\"\r\n",
                encode_header_word(&name)
            ));
            out.push_str(&format!(
                "Content-Disposition: attachment; filename=\"{}\"\r\n",
                encode_header_word(&name)
            ));
            out.push_str("Content-Transfer-Encoding: base64\r\n\r\n");
            out.push_str(&base64_lines(&data));
            out.push_str(&format!("--{boundary}--\r\n"));
        }
    }

    Ok(out.into_bytes())
}

/// RFC 2047 `B` encoding for non-ASCII header text; ASCII passes through.
fn encode_header_word(text: &str) -> String {
    if text.is_ascii() {
        text.to_string()
    } else {
        format!(
            "=?UTF-8?B?{}?=",
            base64::engine::general_purpose::STANDARD.encode(text.as_bytes())
        )
    }
}

/// Base64 with CRLF line breaks every [`BASE64_LINE`] characters.
fn base64_lines(data: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(data);
    let mut out = String::with_capacity(encoded.len() + encoded.len() / BASE64_LINE * 2 + 2);
    for chunk in encoded.as_bytes().chunks(BASE64_LINE) {
        // base64 output is pure ASCII
        out.push_str(&String::from_utf8_lossy(chunk));
        out.push_str("\r\n");
    }
    out
}
