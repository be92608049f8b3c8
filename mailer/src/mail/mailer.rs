//! Mailer trait and Azure Communication Services implementation.

use std::fmt;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use time::OffsetDateTime;
use url::Url;
use uuid::Uuid;

use super::payload::{ErrorDetail, ErrorResponse, OperationState, OperationStatus, SendRequest};
use super::poller::{self, Poll, PollOptions};
use super::signing::{self, AccessKey};
use super::{ConnectionString, Email, MailError, MISSING_CREDENTIALS};
use crate::config::EmailSettings;

/// Async email sending trait.
#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    /// Send an email, returning once the provider has finished with it.
    async fn send(&self, email: &Email) -> Result<SendReceipt, MailError>;
}

/// A completed send operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    pub id: String,
    pub status: OperationState,
}

impl fmt::Display for SendReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.status)
    }
}

/// Mailer backed by the ACS Email REST API.
#[derive(Clone)]
pub struct AcsMailer {
    http: reqwest::Client,
    endpoint: Url,
    key: AccessKey,
    from: String,
    api_version: String,
    poll: PollOptions,
}

impl fmt::Debug for AcsMailer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AcsMailer")
            .field("endpoint", &self.endpoint.as_str())
            .field("from", &self.from)
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

impl AcsMailer {
    /// Create a mailer from environment variables.
    ///
    /// Reads `AZ_EMAIL_CONNECTION_STRING`, `AZ_EMAIL_SENDER_ADDRESS` and the optional
    /// `AZ_EMAIL_*` tuning variables.
    pub fn from_env() -> Result<Self, MailError> {
        let settings = EmailSettings::load()?;
        Self::from_config(&settings)
    }

    /// Create a mailer from explicit configuration.
    pub fn from_config(settings: &EmailSettings) -> Result<Self, MailError> {
        let (conn, sender) = settings
            .credentials()
            .ok_or_else(|| MailError::MissingConfig(MISSING_CREDENTIALS.to_string()))?;

        let ConnectionString {
            endpoint,
            access_key,
        } = conn.parse::<ConnectionString>()?;

        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .build()?;

        Ok(Self {
            http,
            endpoint,
            key: access_key,
            from: sender.to_string(),
            api_version: settings.api_version.clone(),
            poll: PollOptions {
                interval: settings.poll_interval(),
                timeout: settings.poll_timeout(),
            },
        })
    }

    /// The default sender address.
    pub fn sender(&self) -> &str {
        &self.from
    }

    fn api_url(&self, path: &str) -> Url {
        let mut url = self.endpoint.clone();
        let base = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{base}/{path}"));
        url.set_query(None);
        url.query_pairs_mut()
            .append_pair("api-version", &self.api_version);
        url
    }

    fn send_url(&self) -> Url {
        self.api_url("emails:send")
    }

    fn operation_url(&self, id: &str) -> Url {
        self.api_url(&format!("emails/operations/{id}"))
    }

    fn signed(&self, method: Method, url: Url, body: Vec<u8>) -> RequestBuilder {
        let headers = signing::sign(
            &self.key,
            method.as_str(),
            &url,
            &body,
            OffsetDateTime::now_utc(),
        );

        let request = self
            .http
            .request(method, url)
            .header("x-ms-date", headers.date)
            .header("x-ms-content-sha256", headers.content_hash)
            .header(AUTHORIZATION, headers.authorization);

        if body.is_empty() {
            request
        } else {
            request.header(CONTENT_TYPE, "application/json").body(body)
        }
    }

    async fn fetch_status(&self, location: &Url) -> Result<Poll, MailError> {
        let response = dispatch(self.signed(Method::GET, location.clone(), Vec::new())).await?;
        let retry_after = poller::retry_after(response.headers());
        let status = response.json::<OperationStatus>().await?;
        Ok(Poll {
            status,
            retry_after,
        })
    }
}

#[async_trait]
impl Mailer for AcsMailer {
    async fn send(&self, email: &Email) -> Result<SendReceipt, MailError> {
        let request = SendRequest::new(email, &self.from)?;
        let body = serde_json::to_vec(&request)?;

        let response = dispatch(
            self.signed(Method::POST, self.send_url(), body)
                .header("repeatability-request-id", Uuid::new_v4().to_string())
                .header(
                    "repeatability-first-sent",
                    signing::http_date(OffsetDateTime::now_utc()),
                ),
        )
        .await?;

        if response.status() != StatusCode::ACCEPTED {
            let status = response.status();
            return Err(MailError::Api {
                status: status.as_u16(),
                code: reason(status),
                message: "expected 202 Accepted".to_string(),
            });
        }

        let location = response
            .headers()
            .get("operation-location")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Url::parse(v).ok());
        let retry_after = poller::retry_after(response.headers());
        let status = response.json::<OperationStatus>().await?;
        let location = location.unwrap_or_else(|| self.operation_url(&status.id));

        tracing::info!(id = %status.id, status = %status.status, "email submitted");

        let initial = Poll {
            status,
            retry_after,
        };
        let done = poller::poll_until_done(initial, self.poll, || self.fetch_status(&location))
            .await?;

        match done.status {
            OperationState::Succeeded => {
                tracing::info!(id = %done.id, "email delivered to provider");
                Ok(SendReceipt {
                    id: done.id,
                    status: done.status,
                })
            }
            status => {
                let message = done
                    .error
                    .map(|e| e.message)
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "no error details".to_string());
                Err(MailError::Delivery {
                    id: done.id,
                    status,
                    message,
                })
            }
        }
    }
}

/// Send the request and turn non-success statuses into [`MailError::Api`].
async fn dispatch(request: RequestBuilder) -> Result<Response, MailError> {
    let response = request.send().await?;
    if response.status().is_success() {
        return Ok(response);
    }
    Err(api_error(response).await)
}

async fn api_error(response: Response) -> MailError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();

    let detail = serde_json::from_str::<ErrorResponse>(&text)
        .map(|r| r.error)
        .unwrap_or_else(|_| ErrorDetail {
            code: reason(status),
            message: text,
        });

    tracing::debug!(status = status.as_u16(), code = %detail.code, "email API error");

    MailError::Api {
        status: status.as_u16(),
        code: detail.code,
        message: detail.message,
    }
}

fn reason(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("Unknown")
        .replace(' ', "")
}
