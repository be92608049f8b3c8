//! Transactional plant-care and notification emails sent through Azure
//! Communication Services.

pub mod config;
pub mod mail;
pub mod notify;

pub use crate::config::{EmailSettings, EnvConfig};
pub use mail::{AcsMailer, Email, MailError, Mailer, SendReceipt};
pub use notify::{CareNeeds, Delivery, Notifier};
