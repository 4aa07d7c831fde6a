//! `mailkpi`: mail utilities and monthly support KPI reports.
//!
//! The library reads messages through the [`mailbox::MailClient`] trait,
//! picks the newest case and survey extracts mailed as CSV attachments,
//! and aggregates them into a fixed set of monthly KPIs.

pub mod config;
pub mod error;
pub mod export;
pub mod mailbox;
pub mod model;
pub mod report;
