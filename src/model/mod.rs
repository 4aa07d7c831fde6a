//! Core data model types for messages, attachments, and outgoing mail.

pub mod attachment;
pub mod mail;
pub mod outgoing;
