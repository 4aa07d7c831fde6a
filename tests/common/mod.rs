//! Builders for throwaway mail stores.

#![allow(dead_code)]

use std::path::Path;

use base64::Engine;

pub const ACCOUNT: &str = "lead@example.com";

pub const CASE_HEADER: &str = "Date/Time Opened,Closed Date,Status,Age (Days),Knowledge Base Article,Idol Knowledge Link,R&D Incident";

pub const SURVEY_HEADER: &str = "Case Number,Customer Feed Back Survey: Last Modified Date,Closed Data,OpenText made it easy to handle my case,Satisfied with support experience";

/// One MBOX entry carrying a base64-encoded CSV attachment.
pub fn csv_message(date: &str, subject: &str, file_name: &str, csv: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(csv);
    format!(
        "From reports@example.com Mon Mar  4 09:00:00 2024\n\
From: Salesforce Reports <reports@example.com>\n\
To: Support Lead <lead@example.com>, Team <team@example.com>\n\
Subject: {subject}\n\
Date: {date}\n\
MIME-Version: 1.0\n\
Content-Type: multipart/mixed; boundary=\"b1\"\n\
\n\
--b1\n\
Content-Type: text/plain; charset=utf-8\n\
\n\
Extract attached.\n\
--b1\n\
Content-Type: text/csv; name=\"{file_name}\"\n\
Content-Disposition: attachment; filename=\"{file_name}\"\n\
Content-Transfer-Encoding: base64\n\
\n\
{encoded}\n\
--b1--\n\
\n"
    )
}

/// One MBOX entry without attachments.
pub fn plain_message(date: &str, subject: &str) -> String {
    format!(
        "From alice@example.com Mon Mar  4 09:00:00 2024\n\
From: Alice Example <alice@example.com>\n\
To: Support Lead <lead@example.com>\n\
Subject: {subject}\n\
Date: {date}\n\
\n\
Hello.\n\
\n"
    )
}

/// Write `<root>/<ACCOUNT>/<folder>.mbox` from the given entries.
pub fn write_folder(root: &Path, folder: &str, messages: &[String]) {
    let account = root.join(ACCOUNT);
    std::fs::create_dir_all(&account).unwrap();
    std::fs::write(account.join(format!("{folder}.mbox")), messages.concat()).unwrap();
}
