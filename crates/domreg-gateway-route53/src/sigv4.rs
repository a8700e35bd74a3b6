//! AWS Signature Version 4 for JSON 1.1 `POST /` requests
//!
//! Only the subset the Route 53 Domains API needs: every request is a
//! `POST` to `/` with no query string and a JSON body.

use chrono::{DateTime, Utc};
use domreg_core::{Error, Result};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Signing name of the Route 53 Domains service
pub const SERVICE: &str = "route53domains";

/// Content type of every JSON 1.1 request
pub const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// AWS credentials
///
/// The Debug implementation never shows the secret or the session token.
#[derive(Clone)]
pub struct Credentials {
    pub access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<REDACTED>")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<REDACTED>"),
            )
            .finish()
    }
}

impl Credentials {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: Option<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: session_token.filter(|t| !t.is_empty()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.access_key_id.is_empty() || self.secret_access_key.is_empty()
    }
}

/// What gets signed for one request
#[derive(Debug, Clone, Copy)]
pub struct SigningInput<'a> {
    pub region: &'a str,
    /// `Host` header value, including a non-default port
    pub host: &'a str,
    /// `X-Amz-Target` header value
    pub target: &'a str,
    pub body: &'a [u8],
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(key)
        .map_err(|e| Error::fatal(format!("Invalid HMAC key: {}", e)))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Derive the per-day signing key
pub fn signing_key(secret: &str, date: &str, region: &str, service: &str) -> Result<Vec<u8>> {
    let k_date = hmac_sha256(format!("AWS4{}", secret).as_bytes(), date.as_bytes())?;
    let k_region = hmac_sha256(&k_date, region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, service.as_bytes())?;
    hmac_sha256(&k_service, b"aws4_request")
}

/// Sign a request, returning the headers to add to it
///
/// The caller must send `Content-Type` as [`CONTENT_TYPE`] and `X-Amz-Target`
/// as `input.target`; both are covered by the signature.
pub fn sign(
    credentials: &Credentials,
    input: &SigningInput<'_>,
    now: DateTime<Utc>,
) -> Result<Vec<(&'static str, String)>> {
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date = now.format("%Y%m%d").to_string();

    // Lowercase names, sorted
    let mut canonical_headers = vec![
        ("content-type", CONTENT_TYPE),
        ("host", input.host),
        ("x-amz-date", amz_date.as_str()),
    ];
    if let Some(token) = &credentials.session_token {
        canonical_headers.push(("x-amz-security-token", token.as_str()));
    }
    canonical_headers.push(("x-amz-target", input.target));

    let signed_headers = canonical_headers
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(";");

    let header_block: String = canonical_headers
        .iter()
        .map(|(name, value)| format!("{}:{}\n", name, value.trim()))
        .collect();

    let canonical_request = format!(
        "POST\n/\n\n{}\n{}\n{}",
        header_block,
        signed_headers,
        sha256_hex(input.body)
    );

    let scope = format!("{}/{}/{}/aws4_request", date, input.region, SERVICE);
    let string_to_sign = format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        amz_date,
        scope,
        sha256_hex(canonical_request.as_bytes())
    );

    let key = signing_key(&credentials.secret_access_key, &date, input.region, SERVICE)?;
    let signature = hex::encode(hmac_sha256(&key, string_to_sign.as_bytes())?);

    let mut headers = vec![("x-amz-date", amz_date.clone())];
    if let Some(token) = &credentials.session_token {
        headers.push(("x-amz-security-token", token.clone()));
    }
    headers.push((
        "authorization",
        format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM, credentials.access_key_id, scope, signed_headers, signature
        ),
    ));

    Ok(headers)
}
