//! Email sending through Azure Communication Services.
//!
//! This module provides a thin client for the ACS Email REST API with
//! environment-based configuration.
//!
//! # Quick Start
//!
//! ```ignore
//! // 1. Initialize mailer from environment
//! let mailer = AcsMailer::from_env()?;
//!
//! // 2. Build and send; `send` returns once the provider reports completion
//! let email = Email::builder()
//!     .to("user@example.com")
//!     .subject("Welcome!")
//!     .text("Thanks for signing up.")
//!     .html("<html><p>Thanks for signing up.</p></html>")
//!     .build()?;
//! let receipt = mailer.send(&email).await?;
//! ```
//!
//! # Environment Variables
//!
//! The [`AcsMailer::from_env`] method reads:
//!
//! | Variable | Required | Description |
//! |----------|----------|-------------|
//! | `AZ_EMAIL_CONNECTION_STRING` | Yes | `endpoint=...;accesskey=...` |
//! | `AZ_EMAIL_SENDER_ADDRESS` | Yes | Default sender address |
//! | `AZ_EMAIL_API_VERSION` | No | API version (default: `2023-03-31`) |
//! | `AZ_EMAIL_POLL_INTERVAL` | No | Seconds between status polls (default: 5) |
//! | `AZ_EMAIL_POLL_TIMEOUT` | No | Seconds before giving up (default: 300) |
//! | `AZ_EMAIL_REQUEST_TIMEOUT` | No | Per-request timeout (default: 30) |

pub mod connection;
mod mailer;
mod message;
pub mod payload;
mod poller;
pub mod signing;

pub use connection::ConnectionString;
pub use mailer::{AcsMailer, Mailer, SendReceipt};
pub use message::{Email, EmailBody, EmailBuilder, Recipient};
pub use payload::OperationState;
pub use signing::AccessKey;

use thiserror::Error;

pub const MISSING_CREDENTIALS: &str =
    "No AZ_EMAIL_CONNECTION_STRING or AZ_EMAIL_SENDER_ADDRESS set in the environment.";

#[derive(Debug, Error)]
pub enum MailError {
    #[error("missing required config: {0}")]
    MissingConfig(String),

    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid connection string: {0}")]
    InvalidConnectionString(String),

    #[error("invalid email address: {0}")]
    InvalidAddress(String),

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("failed to render message: {0}")]
    Render(#[from] askama::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("email API returned {status}: {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("email operation {id} {status}: {message}")]
    Delivery {
        id: String,
        status: OperationState,
        message: String,
    },

    #[error("email operation {id} did not complete in time")]
    Timeout { id: String },
}
