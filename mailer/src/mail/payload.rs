//! Wire types for the ACS Email REST API.

use std::fmt;

use lettre::Address;
use serde::{Deserialize, Serialize};

use super::{Email, MailError, Recipient};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    pub sender_address: String,
    pub content: Content,
    pub recipients: Recipients,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reply_to: Vec<EmailAddress>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plain_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Recipients {
    pub to: Vec<EmailAddress>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cc: Vec<EmailAddress>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bcc: Vec<EmailAddress>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailAddress {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl TryFrom<&Recipient> for EmailAddress {
    type Error = MailError;

    fn try_from(recipient: &Recipient) -> Result<Self, Self::Error> {
        Ok(EmailAddress {
            address: validate_address(&recipient.address)?,
            display_name: recipient.display_name.clone(),
        })
    }
}

fn validate_address(address: &str) -> Result<String, MailError> {
    address
        .trim()
        .parse::<Address>()
        .map(|a| a.to_string())
        .map_err(|_| MailError::InvalidAddress(address.to_string()))
}

fn addresses(recipients: &[Recipient]) -> Result<Vec<EmailAddress>, MailError> {
    recipients.iter().map(EmailAddress::try_from).collect()
}

impl SendRequest {
    /// Build the request body for `email`, sending from `default_sender` unless
    /// the email overrides it.
    pub fn new(email: &Email, default_sender: &str) -> Result<Self, MailError> {
        let sender = email.from.as_deref().unwrap_or(default_sender);

        let reply_to = email
            .reply_to
            .as_deref()
            .map(|address| {
                Ok::<_, MailError>(EmailAddress {
                    address: validate_address(address)?,
                    display_name: None,
                })
            })
            .transpose()?
            .into_iter()
            .collect();

        Ok(SendRequest {
            sender_address: validate_address(sender)?,
            content: Content {
                subject: email.subject.clone(),
                plain_text: email.body.text().map(str::to_string),
                html: email.body.html().map(str::to_string),
            },
            recipients: Recipients {
                to: addresses(&email.to)?,
                cc: addresses(&email.cc)?,
                bcc: addresses(&email.bcc)?,
            },
            reply_to,
        })
    }
}

/// Lifecycle of a send operation as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum OperationState {
    NotStarted,
    Running,
    Succeeded,
    Failed,
    Canceled,
}

impl OperationState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OperationState::Succeeded | OperationState::Failed | OperationState::Canceled
        )
    }
}

impl fmt::Display for OperationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OperationState::NotStarted => "NotStarted",
            OperationState::Running => "Running",
            OperationState::Succeeded => "Succeeded",
            OperationState::Failed => "Failed",
            OperationState::Canceled => "Canceled",
        };
        f.write_str(s)
    }
}

/// Body of both the send response and the operation status response.
#[derive(Debug, Clone, Deserialize)]
pub struct OperationStatus {
    pub id: String,
    pub status: OperationState,
    #[serde(default)]
    pub error: Option<ErrorDetail>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}
