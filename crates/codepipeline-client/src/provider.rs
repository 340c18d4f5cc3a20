//! Credential resolution: environment, shared profile, container endpoint,
//! then EC2 instance metadata.
//!
//! Temporary credentials from the container endpoint or IMDS are cached and
//! refreshed shortly before they expire, since a watched execution can outlive
//! them.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;

use pipeline_core::BoxError;

use crate::credentials::{region_from_lookup, Credentials};
use crate::error::{ClientError, Result};
use crate::profile::ProfileSet;

const CONTAINER_HOST: &str = "http://169.254.170.2";
const IMDS_ENDPOINT: &str = "http://169.254.169.254";
const IMDS_TOKEN_TTL_SECS: &str = "21600";
const REFRESH_MARGIN_SECS: i64 = 300;
const METADATA_TIMEOUT: Duration = Duration::from_secs(2);

// ─── Sources ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    Static(Credentials),
    Container {
        uri: String,
        authorization: Option<String>,
    },
    InstanceMetadata {
        endpoint: String,
    },
}

impl CredentialSource {
    pub fn name(&self) -> &'static str {
        match self {
            CredentialSource::Static(_) => "static",
            CredentialSource::Container { .. } => "container",
            CredentialSource::InstanceMetadata { .. } => "instance metadata",
        }
    }

    /// Pick the first configured source. No network calls are made here.
    pub fn detect(
        lookup: impl Fn(&str) -> Option<String>,
        profile: &ProfileSet,
    ) -> Result<Self> {
        if let Some(credentials) = Credentials::from_lookup(&lookup) {
            return Ok(CredentialSource::Static(credentials));
        }
        if let Some(credentials) = profile.credentials()? {
            tracing::debug!(profile = profile.name(), "using shared profile credentials");
            return Ok(CredentialSource::Static(credentials));
        }

        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let container_uri = get("AWS_CONTAINER_CREDENTIALS_RELATIVE_URI")
            .map(|relative| format!("{CONTAINER_HOST}{relative}"))
            .or_else(|| get("AWS_CONTAINER_CREDENTIALS_FULL_URI"));
        if let Some(uri) = container_uri {
            let authorization = match get("AWS_CONTAINER_AUTHORIZATION_TOKEN_FILE") {
                Some(path) => Some(
                    std::fs::read_to_string(&path)
                        .map_err(|e| ClientError::CredentialsUnavailable {
                            provider: "container",
                            reason: format!("cannot read {path}: {e}"),
                        })?
                        .trim()
                        .to_string(),
                ),
                None => get("AWS_CONTAINER_AUTHORIZATION_TOKEN"),
            };
            return Ok(CredentialSource::Container { uri, authorization });
        }

        match instance_metadata_endpoint(&lookup) {
            Some(endpoint) => Ok(CredentialSource::InstanceMetadata { endpoint }),
            None => Err(ClientError::MissingCredentials),
        }
    }
}

/// IMDS endpoint unless `AWS_EC2_METADATA_DISABLED=true`.
pub fn instance_metadata_endpoint(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    let disabled = lookup("AWS_EC2_METADATA_DISABLED")
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"));
    if disabled {
        return None;
    }
    Some(
        lookup("AWS_EC2_METADATA_SERVICE_ENDPOINT")
            .filter(|v| !v.trim().is_empty())
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or_else(|| IMDS_ENDPOINT.to_string()),
    )
}

// ─── Provider ─────────────────────────────────────────────────────────────

/// Credentials document served by the container endpoint and IMDS.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RemoteCredentials {
    access_key_id: String,
    secret_access_key: String,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    expiration: Option<DateTime<Utc>>,
}

#[derive(Debug)]
struct Cached {
    credentials: Credentials,
    expires_at: Option<DateTime<Utc>>,
}

impl Cached {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .map_or(true, |at| now + chrono::Duration::seconds(REFRESH_MARGIN_SECS) < at)
    }
}

#[derive(Debug)]
pub struct CredentialsProvider {
    source: CredentialSource,
    http: reqwest::Client,
    cache: Mutex<Option<Cached>>,
}

impl CredentialsProvider {
    pub fn new(source: CredentialSource) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(METADATA_TIMEOUT)
            .connect_timeout(METADATA_TIMEOUT)
            .build()?;
        Ok(Self {
            source,
            http,
            cache: Mutex::new(None),
        })
    }

    pub fn fixed(credentials: Credentials) -> Self {
        Self {
            source: CredentialSource::Static(credentials),
            http: reqwest::Client::new(),
            cache: Mutex::new(None),
        }
    }

    pub fn source(&self) -> &CredentialSource {
        &self.source
    }

    /// Current credentials, fetching or refreshing remote ones as needed.
    pub async fn credentials(&self) -> Result<Credentials> {
        if let CredentialSource::Static(credentials) = &self.source {
            return Ok(credentials.clone());
        }

        let mut cache = self.cache.lock().await;
        if let Some(cached) = (*cache).as_ref().filter(|c| c.is_fresh(Utc::now())) {
            return Ok(cached.credentials.clone());
        }

        let provider = self.source.name();
        let remote = self
            .fetch()
            .await
            .map_err(|e| ClientError::CredentialsUnavailable {
                provider,
                reason: e.to_string(),
            })?;
        tracing::info!(
            provider,
            expires_at = ?remote.expiration,
            "loaded temporary AWS credentials"
        );

        let cached = Cached {
            credentials: Credentials {
                access_key_id: remote.access_key_id,
                secret_access_key: remote.secret_access_key,
                session_token: remote.token,
            },
            expires_at: remote.expiration,
        };
        let credentials = cached.credentials.clone();
        *cache = Some(cached);
        Ok(credentials)
    }

    async fn fetch(&self) -> std::result::Result<RemoteCredentials, BoxError> {
        match &self.source {
            CredentialSource::Container { uri, authorization } => {
                let mut request = self.http.get(uri);
                if let Some(token) = authorization {
                    request = request.header("authorization", token);
                }
                Ok(request.send().await?.error_for_status()?.json().await?)
            }
            CredentialSource::InstanceMetadata { endpoint } => {
                let imds = InstanceMetadata::new(&self.http, endpoint);
                let token = imds.session_token().await?;
                let roles = imds
                    .get(&token, "/latest/meta-data/iam/security-credentials/")
                    .await?;
                let Some(role) = roles.lines().map(str::trim).find(|r| !r.is_empty()) else {
                    return Err("no IAM role is attached to this instance".into());
                };
                let document = imds
                    .get(
                        &token,
                        &format!("/latest/meta-data/iam/security-credentials/{role}"),
                    )
                    .await?;
                Ok(serde_json::from_str(&document)?)
            }
            CredentialSource::Static(_) => Err("static credentials are not fetched".into()),
        }
    }
}

// ─── Instance metadata ────────────────────────────────────────────────────

/// IMDSv2 client: every read carries a session token from `PUT /latest/api/token`.
pub struct InstanceMetadata<'a> {
    http: &'a reqwest::Client,
    endpoint: &'a str,
}

impl<'a> InstanceMetadata<'a> {
    pub fn new(http: &'a reqwest::Client, endpoint: &'a str) -> Self {
        Self { http, endpoint }
    }

    async fn session_token(&self) -> std::result::Result<String, reqwest::Error> {
        self.http
            .put(format!("{}/latest/api/token", self.endpoint))
            .header("x-aws-ec2-metadata-token-ttl-seconds", IMDS_TOKEN_TTL_SECS)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }

    async fn get(&self, token: &str, path: &str) -> std::result::Result<String, reqwest::Error> {
        self.http
            .get(format!("{}{path}", self.endpoint))
            .header("x-aws-ec2-metadata-token", token)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }

    pub async fn region(&self) -> std::result::Result<String, reqwest::Error> {
        let token = self.session_token().await?;
        let region = self.get(&token, "/latest/meta-data/placement/region").await?;
        Ok(region.trim().to_string())
    }
}

// ─── Region ───────────────────────────────────────────────────────────────

/// `AWS_REGION`, `AWS_DEFAULT_REGION`, the profile's `region`, then the
/// instance's placement region when IMDS is reachable.
pub async fn resolve_region(
    lookup: impl Fn(&str) -> Option<String>,
    profile: &ProfileSet,
) -> Result<String> {
    if let Ok(region) = region_from_lookup(&lookup) {
        return Ok(region);
    }
    if let Some(region) = profile.region() {
        return Ok(region);
    }
    let Some(endpoint) = instance_metadata_endpoint(&lookup) else {
        return Err(ClientError::MissingRegion);
    };

    let http = reqwest::Client::builder()
        .timeout(METADATA_TIMEOUT)
        .connect_timeout(METADATA_TIMEOUT)
        .build()?;
    match InstanceMetadata::new(&http, &endpoint).region().await {
        Ok(region) if !region.is_empty() => Ok(region),
        Ok(_) => Err(ClientError::MissingRegion),
        Err(e) => {
            tracing::debug!(error = %e, "instance metadata region lookup failed");
            Err(ClientError::MissingRegion)
        }
    }
}
