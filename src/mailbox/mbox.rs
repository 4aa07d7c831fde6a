//! MBOX folders: streaming message splitter and append-only writer.
//!
//! Reads line-by-line through a buffered reader, so a folder is never
//! loaded into memory as a whole. Tolerant of malformed input.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::error::{MailKpiError, Result};

/// Read buffer size for sequential scans.
const READ_BUFFER_SIZE: usize = 128 * 1024;

/// One message boundary found by [`MboxFolder::scan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageSpan {
    /// Byte offset of the `From ` separator line.
    pub offset: u64,
    /// Length in bytes up to the next separator or EOF.
    pub length: u64,
}

/// A single MBOX file treated as a mail folder.
pub struct MboxFolder {
    path: PathBuf,
}

impl MboxFolder {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Walk the file and call `on_message(span, raw_bytes)` for every message.
    ///
    /// A `From ` line only starts a new message at the beginning of the file or
    /// after a blank line; elsewhere it is logged and still honored, matching
    /// what most mail clients do with sloppy writers.
    pub fn scan(&self, on_message: &mut dyn FnMut(MessageSpan, &[u8])) -> Result<u64> {
        let file = File::open(&self.path).map_err(|e| MailKpiError::io(&self.path, e))?;
        let mut reader = BufReader::with_capacity(READ_BUFFER_SIZE, file);

        let mut count: u64 = 0;
        let mut offset: u64 = 0;
        let mut message_start: u64 = 0;
        let mut message_buf: Vec<u8> = Vec::with_capacity(64 * 1024);
        let mut line_buf: Vec<u8> = Vec::with_capacity(4096);
        let mut prev_line_was_empty = true;

        loop {
            line_buf.clear();
            let line_len = reader
                .read_until(b'\n', &mut line_buf)
                .map_err(|e| MailKpiError::io(&self.path, e))?;
            if line_len == 0 {
                break;
            }

            if is_mbox_separator(&line_buf) {
                if !prev_line_was_empty {
                    warn!(
                        path = %self.path.display(),
                        offset,
                        "Found 'From ' separator without preceding blank line"
                    );
                }
                if !message_buf.is_empty() {
                    let span = MessageSpan {
                        offset: message_start,
                        length: offset - message_start,
                    };
                    on_message(span, &message_buf);
                    count += 1;
                }
                message_start = offset;
                message_buf.clear();
            }

            message_buf.extend_from_slice(&line_buf);
            prev_line_was_empty = is_blank_line(&line_buf);
            offset += line_len as u64;
        }

        if !message_buf.is_empty() {
            let span = MessageSpan {
                offset: message_start,
                length: offset - message_start,
            };
            on_message(span, &message_buf);
            count += 1;
        }

        Ok(count)
    }

    /// Read a single message by its span.
    pub fn read_message(&self, span: MessageSpan) -> Result<Vec<u8>> {
        let mut file = File::open(&self.path).map_err(|e| MailKpiError::io(&self.path, e))?;
        file.seek(SeekFrom::Start(span.offset))
            .map_err(|e| MailKpiError::io(&self.path, e))?;
        let mut buffer = vec![0u8; span.length as usize];
        file.read_exact(&mut buffer)
            .map_err(|e| MailKpiError::io(&self.path, e))?;
        Ok(buffer)
    }

    /// Append one RFC 5322 message, adding the separator line and quoting
    /// body lines that would otherwise read as separators (`>From `).
    pub fn append(&self, sender: &str, when: DateTime<Utc>, message: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| MailKpiError::io(parent, e))?;
        }
        let needs_gap = std::fs::metadata(&self.path)
            .map(|m| m.len() > 0)
            .unwrap_or(false);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| MailKpiError::io(&self.path, e))?;

        let mut out: Vec<u8> = Vec::with_capacity(message.len() + 128);
        if needs_gap {
            out.push(b'\n');
        }
        let sender = if sender.is_empty() {
            "MAILER-DAEMON"
        } else {
            sender
        };
        out.extend_from_slice(
            format!("From {} {}\n", sender, when.format("%a %b %e %H:%M:%S %Y")).as_bytes(),
        );
        for line in message.split_inclusive(|&b| b == b'\n') {
            if line.starts_with(b"From ") {
                out.push(b'>');
            }
            out.extend_from_slice(line);
        }
        if !out.ends_with(b"\n") {
            out.push(b'\n');
        }

        file.write_all(&out)
            .map_err(|e| MailKpiError::io(&self.path, e))?;
        Ok(())
    }
}

/// Skip the `From ` separator line at the start of an MBOX message.
pub fn skip_from_line(data: &[u8]) -> &[u8] {
    let data = data.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(data);
    if data.starts_with(b"From ") {
        if let Some(pos) = data.iter().position(|&b| b == b'\n') {
            return &data[pos + 1..];
        }
    }
    data
}

/// Check whether a line is an MBOX separator (`From ` at the start).
fn is_mbox_separator(line: &[u8]) -> bool {
    let line = line.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(line);
    line.starts_with(b"From ")
}

/// Check whether a line is blank (empty or only whitespace / CR / LF).
fn is_blank_line(line: &[u8]) -> bool {
    line.iter()
        .all(|&b| b == b'\n' || b == b'\r' || b == b' ' || b == b'\t')
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_MESSAGES: &str = "From a@example.com Thu Jan 04 10:00:00 2024\n\
Subject: One\n\
\n\
Body one\n\
\n\
From b@example.com Fri Jan 05 10:00:00 2024\n\
Subject: Two\n\
\n\
Body two\n";

    #[test]
    fn test_is_mbox_separator() {
        assert!(is_mbox_separator(
            b"From user@example.com Thu Jan 01 00:00:00 2024\n"
        ));
        assert!(!is_mbox_separator(b"from user@example.com\n"));
        assert!(!is_mbox_separator(b">From user@example.com\n"));
        assert!(!is_mbox_separator(b"Subject: From here\n"));
    }

    #[test]
    fn test_is_blank_line() {
        assert!(is_blank_line(b"\n"));
        assert!(is_blank_line(b"\r\n"));
        assert!(!is_blank_line(b"hello\n"));
    }

    #[test]
    fn test_skip_from_line() {
        let data = b"From user@example.com Thu Jan 01 00:00:00 2024\nSubject: Test\n\nBody\n";
        assert!(skip_from_line(data).starts_with(b"Subject:"));
        let bare = b"Subject: Test\n\nBody\n";
        assert_eq!(skip_from_line(bare), bare);
    }

    #[test]
    fn test_scan_and_read_back() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("Inbox.mbox");
        std::fs::write(&path, TWO_MESSAGES).unwrap();

        let folder = MboxFolder::new(&path);
        let mut spans = Vec::new();
        let count = folder.scan(&mut |span, _raw| spans.push(span)).unwrap();
        assert_eq!(count, 2);
        assert_eq!(spans[0].offset, 0);

        let second = folder.read_message(spans[1]).unwrap();
        assert!(second.starts_with(b"From b@example.com"));
        assert!(String::from_utf8_lossy(&second).contains("Body two"));
    }

    #[test]
    fn test_append_quotes_from_lines() {
        let tmp = tempfile::tempdir().unwrap();
        let folder = MboxFolder::new(tmp.path().join("Outbox.mbox"));
        let msg = b"Subject: Hi\n\nFrom the top\n";
        folder.append("me@example.com", DateTime::UNIX_EPOCH, msg).unwrap();
        folder.append("me@example.com", DateTime::UNIX_EPOCH, msg).unwrap();

        let mut count = 0;
        folder.scan(&mut |_span, raw| {
            count += 1;
            assert!(String::from_utf8_lossy(raw).contains(">From the top"));
        })
        .unwrap();
        assert_eq!(count, 2);
    }
}
