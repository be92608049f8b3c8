use core::fmt;
use std::sync::Arc;

use base64::prelude::*;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use time::macros::format_description;
use time::OffsetDateTime;
use url::Url;

type HmacSha256 = Hmac<Sha256>;

const SIGNED_HEADERS: &str = "x-ms-date;host;x-ms-content-sha256";

/// ACS access key suitable for keeping in long-lived client state
///
/// Opaque to prevent leaking the key through logs
#[derive(Clone)]
pub struct AccessKey(Arc<Vec<u8>>);

impl AccessKey {
    pub fn try_from_base64(val: &str) -> Result<AccessKey, base64::DecodeError> {
        let bytes = BASE64_STANDARD.decode(val.as_bytes())?;
        Ok(AccessKey(Arc::new(bytes)))
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for AccessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessKey(..)")
    }
}

/// Header values authenticating a single request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub date: String,
    pub content_hash: String,
    pub authorization: String,
}

/// base64(SHA-256(body))
pub fn content_hash(body: &[u8]) -> String {
    BASE64_STANDARD.encode(Sha256::digest(body))
}

/// RFC 1123 date as expected in `x-ms-date`
pub fn http_date(at: OffsetDateTime) -> String {
    let format = format_description!(
        "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
    );
    at.to_offset(time::UtcOffset::UTC)
        .format(format)
        .unwrap_or_default()
}

/// Sign a request with the ACS HMAC-SHA256 scheme
pub fn sign(
    key: &AccessKey,
    method: &str,
    url: &Url,
    body: &[u8],
    at: OffsetDateTime,
) -> SignedHeaders {
    let date = http_date(at);
    let content_hash = content_hash(body);

    let host = match url.port() {
        Some(port) => format!("{}:{}", url.host_str().unwrap_or_default(), port),
        None => url.host_str().unwrap_or_default().to_string(),
    };
    let path_and_query = match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    };

    let string_to_sign = format!(
        "{}\n{}\n{};{};{}",
        method.to_ascii_uppercase(),
        path_and_query,
        date,
        host,
        content_hash
    );

    // HMAC accepts keys of any length
    let mut mac =
        HmacSha256::new_from_slice(key.as_bytes()).expect("HMAC can take key of any size");
    mac.update(string_to_sign.as_bytes());
    let signature = BASE64_STANDARD.encode(mac.finalize().into_bytes());

    SignedHeaders {
        authorization: format!(
            "HMAC-SHA256 SignedHeaders={}&Signature={}",
            SIGNED_HEADERS, signature
        ),
        date,
        content_hash,
    }
}
