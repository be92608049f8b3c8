//! Email message types and builder.

use serde::{Deserialize, Serialize};

use super::MailError;

/// A recipient address with an optional display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub address: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl Recipient {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            display_name: None,
        }
    }

    pub fn named(address: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            display_name: Some(display_name.into()),
        }
    }
}

/// The body content of an email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EmailBody {
    /// Plain text only.
    Text(String),
    /// HTML only.
    Html(String),
    /// Both plain text and HTML.
    Multipart { text: String, html: String },
}

impl EmailBody {
    pub fn text(&self) -> Option<&str> {
        match self {
            EmailBody::Text(text) | EmailBody::Multipart { text, .. } => Some(text),
            EmailBody::Html(_) => None,
        }
    }

    pub fn html(&self) -> Option<&str> {
        match self {
            EmailBody::Html(html) | EmailBody::Multipart { html, .. } => Some(html),
            EmailBody::Text(_) => None,
        }
    }
}

/// A complete email message ready to send.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Email {
    /// Primary recipients.
    pub to: Vec<Recipient>,
    /// Carbon copy recipients.
    #[serde(default)]
    pub cc: Vec<Recipient>,
    /// Blind carbon copy recipients.
    #[serde(default)]
    pub bcc: Vec<Recipient>,
    /// Email subject line.
    pub subject: String,
    /// Email body content.
    pub body: EmailBody,
    /// Optional reply-to address.
    #[serde(default)]
    pub reply_to: Option<String>,
    /// Sender address. The mailer's configured sender is used when absent.
    #[serde(default)]
    pub from: Option<String>,
}

impl Email {
    /// Create a new email builder.
    pub fn builder() -> EmailBuilder {
        EmailBuilder::default()
    }
}

/// Builder for constructing [`Email`] instances.
#[derive(Debug, Default)]
pub struct EmailBuilder {
    to: Vec<Recipient>,
    cc: Vec<Recipient>,
    bcc: Vec<Recipient>,
    subject: Option<String>,
    text: Option<String>,
    html: Option<String>,
    reply_to: Option<String>,
    from: Option<String>,
}

impl EmailBuilder {
    /// Add a primary recipient.
    pub fn to(mut self, address: impl Into<String>) -> Self {
        self.to.push(Recipient::new(address));
        self
    }

    /// Add a primary recipient shown under `display_name`.
    pub fn to_named(mut self, address: impl Into<String>, display_name: impl Into<String>) -> Self {
        self.to.push(Recipient::named(address, display_name));
        self
    }

    /// Add a CC recipient.
    pub fn cc(mut self, address: impl Into<String>) -> Self {
        self.cc.push(Recipient::new(address));
        self
    }

    /// Add a BCC recipient.
    pub fn bcc(mut self, address: impl Into<String>) -> Self {
        self.bcc.push(Recipient::new(address));
        self
    }

    /// Set the subject line.
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Set plain text body content.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set HTML body content.
    pub fn html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    /// Set the reply-to address.
    pub fn reply_to(mut self, address: impl Into<String>) -> Self {
        self.reply_to = Some(address.into());
        self
    }

    /// Override the sender address.
    pub fn from(mut self, address: impl Into<String>) -> Self {
        self.from = Some(address.into());
        self
    }

    /// Build the email, validating required fields.
    pub fn build(self) -> Result<Email, MailError> {
        if self.to.is_empty() {
            return Err(MailError::Build("at least one recipient required".into()));
        }

        let subject = self
            .subject
            .ok_or_else(|| MailError::Build("subject required".into()))?;

        let body = match (self.text, self.html) {
            (Some(text), Some(html)) => EmailBody::Multipart { text, html },
            (Some(text), None) => EmailBody::Text(text),
            (None, Some(html)) => EmailBody::Html(html),
            (None, None) => return Err(MailError::Build("body required (text or html)".into())),
        };

        Ok(Email {
            to: self.to,
            cc: self.cc,
            bcc: self.bcc,
            subject,
            body,
            reply_to: self.reply_to,
            from: self.from,
        })
    }
}
