//! Plant-care reminders and generic notifications.
//!
//! Both kinds of message go out as plain text plus HTML. When a debug recipient
//! is configured (`DEBUG_EMAIL`), care reminders to every other recipient are
//! skipped. Generic mail (account verification, password resets) is always sent.

use std::fmt;
use std::sync::OnceLock;

use askama::Template;

use crate::config::EmailSettings;
use crate::mail::{AcsMailer, Email, MailError, Mailer, SendReceipt, MISSING_CREDENTIALS};

pub const SITE_URL: &str = "https://www.plantmindr.com";

/// Which kinds of care a plant is due for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CareNeeds {
    pub fertilizer: bool,
    pub water: bool,
}

impl CareNeeds {
    pub fn new(fertilizer: bool, water: bool) -> Self {
        Self { fertilizer, water }
    }
}

/// The reminder sentence, e.g. `Time to fertilize and water Fern`.
///
/// With neither kind of care flagged it reads `Time to check on Fern` rather
/// than leaving a gap where the action would be.
pub fn care_content(plant_name: &str, needs: CareNeeds) -> String {
    let action = match (needs.fertilizer, needs.water) {
        (true, true) => "fertilize and water",
        (true, false) => "fertilize",
        (false, true) => "water",
        (false, false) => "check on",
    };
    format!("Time to {action} {plant_name}")
}

pub fn care_subject(plant_name: &str) -> String {
    format!("{plant_name} needs some care!")
}

#[derive(Template)]
#[template(
    source = "<html><p>{{ content }}. Visit {{ site|safe }} to view your plants.</p></html>",
    ext = "html"
)]
struct CareHtml<'a> {
    content: &'a str,
    site: &'a str,
}

#[derive(Template)]
#[template(source = "<html><p>{{ content }}</p></html>", ext = "html")]
struct GenericHtml<'a> {
    content: &'a str,
}

pub fn care_html(content: &str) -> Result<String, MailError> {
    Ok(CareHtml {
        content,
        site: SITE_URL,
    }
    .render()?)
}

pub fn generic_html(content: &str) -> Result<String, MailError> {
    Ok(GenericHtml { content }.render()?)
}

/// What happened to a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Sent(SendReceipt),
    /// Skipped because the recipient is not the debug recipient.
    Suppressed,
}

impl fmt::Display for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delivery::Sent(receipt) => write!(f, "sent {receipt}"),
            Delivery::Suppressed => f.write_str("suppressed"),
        }
    }
}

type Connect<M> = fn(&EmailSettings) -> Result<M, MailError>;

/// Composes notifications and hands them to a [`Mailer`].
///
/// A notifier built from settings connects on first delivery, so a suppressed
/// reminder never needs credentials.
#[derive(Clone)]
pub struct Notifier<M> {
    mailer: OnceLock<M>,
    connect: Option<(EmailSettings, Connect<M>)>,
    debug_recipient: Option<String>,
}

impl Notifier<AcsMailer> {
    pub fn from_settings(settings: &EmailSettings) -> Self {
        Self {
            mailer: OnceLock::new(),
            connect: Some((settings.clone(), AcsMailer::from_config)),
            debug_recipient: settings.debug_recipient().map(str::to_string),
        }
    }
}

impl<M: Mailer> Notifier<M> {
    pub fn new(mailer: M) -> Self {
        Self {
            mailer: OnceLock::from(mailer),
            connect: None,
            debug_recipient: None,
        }
    }

    pub fn with_debug_recipient(mut self, recipient: Option<&str>) -> Self {
        self.debug_recipient = recipient.map(str::to_string);
        self
    }

    /// The mailer, connecting from settings on first use.
    pub fn mailer(&self) -> Result<&M, MailError> {
        if let Some(mailer) = self.mailer.get() {
            return Ok(mailer);
        }
        let (settings, connect) = self
            .connect
            .as_ref()
            .ok_or_else(|| MailError::MissingConfig(MISSING_CREDENTIALS.to_string()))?;
        let mailer = connect(settings)?;
        Ok(self.mailer.get_or_init(|| mailer))
    }

    /// Whether a care reminder to `recipient` may be delivered.
    pub fn allows(&self, recipient: &str) -> bool {
        match &self.debug_recipient {
            Some(debug) => debug == recipient,
            None => true,
        }
    }

    /// Remind `recipient` that `plant_name` needs care.
    pub async fn send_care_email(
        &self,
        recipient: &str,
        plant_name: &str,
        username: &str,
        needs: CareNeeds,
    ) -> Result<Delivery, MailError> {
        if !self.allows(recipient) {
            tracing::info!("Debug email does not match recipient. Not sending.");
            return Ok(Delivery::Suppressed);
        }

        let content = care_content(plant_name, needs);
        let email = Email::builder()
            .to_named(recipient, username)
            .subject(care_subject(plant_name))
            .html(care_html(&content)?)
            .text(content)
            .build()?;

        self.deliver(&email).await
    }

    /// Send literal `content` under `subject`. Not subject to the debug recipient.
    pub async fn send_email(
        &self,
        recipient: &str,
        content: &str,
        subject: &str,
    ) -> Result<Delivery, MailError> {
        let email = Email::builder()
            .to_named(recipient, recipient)
            .subject(subject)
            .text(content)
            .html(generic_html(content)?)
            .build()?;

        self.deliver(&email).await
    }

    async fn deliver(&self, email: &Email) -> Result<Delivery, MailError> {
        let receipt = self.mailer()?.send(email).await?;
        tracing::info!("Result: {}", receipt);
        Ok(Delivery::Sent(receipt))
    }
}
