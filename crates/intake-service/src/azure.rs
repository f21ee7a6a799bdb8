//! Azure Blob Storage backend
//!
//! Uploads are plain `Put Blob` REST calls. Authorization comes from the
//! storage connection string: either a SharedKey signature computed from
//! `AccountKey`, or a `SharedAccessSignature` token appended to the URL.

use async_trait::async_trait;
use axum::body::Bytes;
use base64::{engine::general_purpose, Engine as _};
use chrono::Utc;
use denuncias_common::{Error, Result};
use hmac::{Hmac, Mac};
use reqwest::{StatusCode, Url};
use sha2::Sha256;
use tracing::debug;

use crate::storage::ObjectStore;

const API_VERSION: &str = "2021-08-06";

/// Well-known Azurite emulator account
const DEV_ACCOUNT: &str = "devstoreaccount1";
const DEV_ACCOUNT_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";
const DEV_BLOB_ENDPOINT: &str = "http://127.0.0.1:10000/devstoreaccount1";

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
enum Credential {
    SharedKey { account: String, key: Vec<u8> },
    Sas(String),
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::SharedKey { account, .. } => {
                write!(f, "SharedKey {{ account: {:?}, key: <redacted> }}", account)
            }
            Credential::Sas(_) => f.write_str("Sas(<redacted>)"),
        }
    }
}

/// Parsed Azure Storage connection string
#[derive(Debug, Clone)]
pub struct ConnectionString {
    blob_endpoint: String,
    credential: Credential,
}

impl ConnectionString {
    /// Parse `Key=Value;Key=Value` pairs as issued by the Azure portal
    pub fn parse(raw: &str) -> Result<Self> {
        let mut protocol = "https".to_string();
        let mut suffix = "core.windows.net".to_string();
        let mut account = None;
        let mut account_key = None;
        let mut blob_endpoint = None;
        let mut sas = None;
        let mut development = false;

        for pair in raw.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                Error::Configuration(format!("malformed connection string segment: {}", key_only(pair)))
            })?;
            match key {
                "DefaultEndpointsProtocol" => protocol = value.to_string(),
                "EndpointSuffix" => suffix = value.to_string(),
                "AccountName" => account = Some(value.to_string()),
                "AccountKey" => account_key = Some(value.to_string()),
                "BlobEndpoint" => blob_endpoint = Some(value.trim_end_matches('/').to_string()),
                "SharedAccessSignature" => sas = Some(value.trim_start_matches('?').to_string()),
                "UseDevelopmentStorage" => development = value.eq_ignore_ascii_case("true"),
                _ => debug!("Ignoring connection string key {}", key),
            }
        }

        if development {
            account = Some(DEV_ACCOUNT.to_string());
            account_key = Some(DEV_ACCOUNT_KEY.to_string());
            blob_endpoint.get_or_insert_with(|| DEV_BLOB_ENDPOINT.to_string());
        }

        let blob_endpoint = match (blob_endpoint, &account) {
            (Some(endpoint), _) => endpoint,
            (None, Some(account)) => format!("{}://{}.blob.{}", protocol, account, suffix),
            (None, None) => {
                return Err(Error::Configuration(
                    "connection string needs AccountName or BlobEndpoint".to_string(),
                ))
            }
        };

        let credential = match (account, account_key, sas) {
            (Some(account), Some(key), _) => {
                let key = general_purpose::STANDARD.decode(key).map_err(|e| {
                    Error::Configuration(format!("AccountKey is not valid base64: {}", e))
                })?;
                Credential::SharedKey { account, key }
            }
            (_, _, Some(token)) => Credential::Sas(token),
            _ => {
                return Err(Error::Configuration(
                    "connection string needs AccountKey or SharedAccessSignature".to_string(),
                ))
            }
        };

        Ok(Self {
            blob_endpoint,
            credential,
        })
    }

    pub fn blob_endpoint(&self) -> &str {
        &self.blob_endpoint
    }
}

fn key_only(pair: &str) -> &str {
    // Never echo a value; it may be a secret.
    pair.split('=').next().unwrap_or_default()
}

/// Blob container client
pub struct AzureBlobStore {
    client: reqwest::Client,
    connection: ConnectionString,
    container: String,
}

impl AzureBlobStore {
    pub fn new(connection: ConnectionString, container: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            connection,
            container: container.into(),
        }
    }

    fn blob_url(&self, path: &str) -> Result<Url> {
        let mut url = Url::parse(&format!(
            "{}/{}/{}",
            self.connection.blob_endpoint, self.container, path
        ))
        .map_err(|e| Error::Configuration(format!("invalid blob URL: {}", e)))?;

        if let Credential::Sas(token) = &self.connection.credential {
            url.set_query(Some(token));
        }
        Ok(url)
    }
}

#[async_trait]
impl ObjectStore for AzureBlobStore {
    async fn put(&self, path: &str, bytes: Bytes, content_type: &str) -> Result<()> {
        let url = self.blob_url(path)?;
        let date = Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string();
        let length = bytes.len();

        let mut request = self
            .client
            .put(url.clone())
            .header("x-ms-date", &date)
            .header("x-ms-version", API_VERSION)
            .header("x-ms-blob-type", "BlockBlob")
            .header("If-None-Match", "*")
            .header("Content-Type", content_type);

        if let Credential::SharedKey { account, key } = &self.connection.credential {
            let to_sign = string_to_sign(account, url.path(), length, content_type, &date);
            let signature = sign(key, &to_sign)?;
            request = request.header("Authorization", format!("SharedKey {}:{}", account, signature));
        }

        let response = request
            .body(bytes)
            .send()
            .await
            .map_err(|e| Error::Storage(format!("upload of {} failed: {}", path, e)))?;

        match response.status() {
            status if status.is_success() => {
                debug!("Uploaded blob {} ({} bytes)", path, length);
                Ok(())
            }
            StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => {
                Err(Error::Conflict(path.to_string()))
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(Error::Storage(format!(
                    "upload of {} returned {}: {}",
                    path, status, body
                )))
            }
        }
    }

    fn describe(&self) -> String {
        format!(
            "Azure Blob container '{}' at {}",
            self.container, self.connection.blob_endpoint
        )
    }
}

/// Canonical SharedKey string for a `Put Blob` carrying the headers set in `put`
fn string_to_sign(
    account: &str,
    url_path: &str,
    content_length: usize,
    content_type: &str,
    date: &str,
) -> String {
    let length = if content_length == 0 {
        String::new()
    } else {
        content_length.to_string()
    };

    // VERB, Content-Encoding, Content-Language, Content-Length, Content-MD5,
    // Content-Type, Date, If-Modified-Since, If-Match, If-None-Match,
    // If-Unmodified-Since, Range
    format!(
        "PUT\n\n\n{}\n\n{}\n\n\n\n*\n\n\n\
         x-ms-blob-type:BlockBlob\nx-ms-date:{}\nx-ms-version:{}\n\
         /{}{}",
        length, content_type, date, API_VERSION, account, url_path
    )
}

fn sign(key: &[u8], to_sign: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| Error::Configuration(format!("invalid account key: {}", e)))?;
    mac.update(to_sign.as_bytes());
    Ok(general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}
