//! ACS connection strings: `endpoint=https://<resource>.communication.azure.com/;accesskey=<base64>`.

use std::str::FromStr;

use url::Url;

use super::signing::AccessKey;
use super::MailError;

#[derive(Clone, Debug)]
pub struct ConnectionString {
    pub endpoint: Url,
    pub access_key: AccessKey,
}

impl FromStr for ConnectionString {
    type Err = MailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut endpoint = None;
        let mut access_key = None;

        for segment in s.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            let (key, value) = segment.split_once('=').ok_or_else(|| {
                MailError::InvalidConnectionString(format!("malformed segment `{segment}`"))
            })?;

            match key.trim().to_ascii_lowercase().as_str() {
                "endpoint" => endpoint = Some(value.trim()),
                "accesskey" => access_key = Some(value.trim()),
                other => tracing::debug!("ignoring connection string key {}", other),
            }
        }

        let endpoint = endpoint
            .ok_or_else(|| MailError::InvalidConnectionString("missing endpoint".into()))?;
        let access_key = access_key
            .ok_or_else(|| MailError::InvalidConnectionString("missing accesskey".into()))?;

        let endpoint = Url::parse(endpoint)
            .map_err(|e| MailError::InvalidConnectionString(format!("endpoint: {e}")))?;
        if endpoint.cannot_be_a_base() || endpoint.host_str().is_none() {
            return Err(MailError::InvalidConnectionString(
                "endpoint must be an absolute URL".into(),
            ));
        }

        let access_key = AccessKey::try_from_base64(access_key)
            .map_err(|e| MailError::InvalidConnectionString(format!("accesskey: {e}")))?;

        Ok(ConnectionString {
            endpoint,
            access_key,
        })
    }
}
