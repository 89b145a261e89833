//! Search cluster client factory
//!
//! Turns an Elasticsearch [`InstanceDescriptor`] into a ready-to-use
//! [`SearchClient`]:
//!
//! 1. Validate the address (no network traffic when it is missing).
//! 2. Derive `http`/`https` from the descriptor's TLS flag.
//! 3. Parse the stored credentials and apply exactly one scheme as a default
//!    `Authorization` header.
//! 4. Issue a liveness probe (`GET /`) under a deadline; only a 2xx answer
//!    yields a client.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use opsdeck_core::{parse_auth_config, select_auth_scheme, ClientConnector, ClientHandle};
use opsdeck_domain::{
    AuthScheme, ClientConfig, ConnectError, InstanceDescriptor, InstanceId, OpsDeckError,
    ResourceKind, Result,
};
use parking_lot::RwLock;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use super::client::HttpClientBuilder;
use crate::errors::{connect_error_from_http, InfraError};

/// Builds [`SearchClient`]s for Elasticsearch instances.
pub struct SearchClientFactory {
    config: ClientConfig,
}

impl SearchClientFactory {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ClientConnector for SearchClientFactory {
    type Handle = SearchClient;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Elasticsearch
    }

    async fn connect(
        &self,
        descriptor: &InstanceDescriptor,
    ) -> std::result::Result<SearchClient, ConnectError> {
        let id = descriptor.id;
        let address = descriptor.address().ok_or(ConnectError::MissingAddress(id))?;
        let base_url = base_url(id, descriptor.scheme(), address)?;

        let credentials = parse_auth_config(&descriptor.auth_config);
        let auth = select_auth_scheme(&credentials);
        debug!(
            instance_id = id,
            encoding = ?credentials.encoding(),
            scheme = auth.as_ref().map_or("none", AuthScheme::name),
            "resolved instance credentials"
        );

        let probe_timeout = self.config.probe_timeout();
        let client = self
            .http_client(descriptor, address, auth.as_ref())?
            .build()
            .map_err(|err| ConnectError::InvalidConfig { instance_id: id, reason: err.to_string() })?;

        probe(&client, id, &base_url, address, probe_timeout).await?;

        info!(instance_id = id, url = %base_url, "instance client connected");
        Ok(SearchClient::new(id, base_url, client))
    }
}

impl SearchClientFactory {
    /// HTTP settings for one instance. Certificate verification is only
    /// relaxed when the descriptor opts out of it, and that is logged.
    fn http_client(
        &self,
        descriptor: &InstanceDescriptor,
        address: &str,
        auth: Option<&AuthScheme>,
    ) -> std::result::Result<HttpClientBuilder, ConnectError> {
        let skip_verify = descriptor.skips_tls_verify();
        if skip_verify {
            warn!(
                instance_id = descriptor.id,
                address,
                "TLS certificate verification disabled for instance"
            );
        }

        Ok(HttpClientBuilder::new()
            .connect_timeout(self.config.connect_timeout())
            .timeout(self.config.probe_timeout())
            .user_agent(self.config.user_agent.clone())
            .default_headers(default_headers(descriptor.id, auth)?)
            .accept_invalid_certs(skip_verify))
    }
}

fn base_url(
    instance_id: InstanceId,
    scheme: &str,
    address: &str,
) -> std::result::Result<Url, ConnectError> {
    let invalid = |reason: String| ConnectError::InvalidAddress {
        instance_id,
        address: address.to_string(),
        reason,
    };

    let url = Url::parse(&format!("{scheme}://{address}")).map_err(|err| invalid(err.to_string()))?;
    if url.host_str().is_none() {
        return Err(invalid("no host".into()));
    }
    Ok(url)
}

fn default_headers(
    instance_id: InstanceId,
    auth: Option<&AuthScheme>,
) -> std::result::Result<HeaderMap, ConnectError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    let Some(auth) = auth else {
        return Ok(headers);
    };

    let raw = match auth {
        AuthScheme::Basic { username, password } => {
            format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
        }
        AuthScheme::ApiKey(key) => format!("ApiKey {key}"),
    };

    let mut value = HeaderValue::from_str(&raw).map_err(|_| ConnectError::InvalidConfig {
        instance_id,
        reason: format!("{} credentials contain characters not allowed in a header", auth.name()),
    })?;
    value.set_sensitive(true);
    headers.insert(AUTHORIZATION, value);

    Ok(headers)
}

async fn probe(
    client: &ReqwestClient,
    instance_id: InstanceId,
    base_url: &Url,
    address: &str,
    deadline: Duration,
) -> std::result::Result<(), ConnectError> {
    let started = Instant::now();

    let response = match tokio::time::timeout(deadline, client.get(base_url.clone()).send()).await
    {
        Err(_) => {
            return Err(ConnectError::ConnectTimeout {
                instance_id,
                address: address.to_string(),
                timeout: deadline,
            })
        }
        Ok(Err(err)) => return Err(connect_error_from_http(&err, instance_id, address, deadline)),
        Ok(Ok(response)) => response,
    };

    let status = response.status();
    if !status.is_success() {
        return Err(ConnectError::UnhealthyResponse {
            instance_id,
            address: address.to_string(),
            status: status.as_u16(),
        });
    }

    debug!(
        instance_id,
        address,
        status = status.as_u16(),
        elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        "liveness probe succeeded"
    );
    Ok(())
}

/// Root endpoint payload of a search cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterInfo {
    pub name: String,
    pub cluster_name: String,
    pub cluster_uuid: String,
    pub version: ClusterVersion,
    pub tagline: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterVersion {
    pub number: String,
    pub distribution: Option<String>,
}

/// Live client for one search cluster.
///
/// Cheap to share behind an `Arc`. After [`ClientHandle::close`] every request
/// fails with a network error.
pub struct SearchClient {
    instance_id: InstanceId,
    base_url: Url,
    http: RwLock<Option<ReqwestClient>>,
}

impl SearchClient {
    fn new(instance_id: InstanceId, base_url: Url, http: ReqwestClient) -> Self {
        Self { instance_id, base_url, http: RwLock::new(Some(http)) }
    }

    pub fn instance_id(&self) -> InstanceId {
        self.instance_id
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn is_closed(&self) -> bool {
        self.http.read().is_none()
    }

    /// GET `path` relative to the cluster root and decode the JSON body.
    pub async fn get_json<T>(&self, path: &str) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let url = self
            .base_url
            .join(path)
            .map_err(|err| OpsDeckError::InvalidInput(format!("invalid request path '{path}': {err}")))?;

        let response = self.http()?.get(url).send().await.map_err(map_http_error)?;
        let response = response.error_for_status().map_err(map_http_error)?;
        response.json::<T>().await.map_err(map_http_error)
    }

    pub async fn cluster_info(&self) -> Result<ClusterInfo> {
        self.get_json("/").await
    }

    fn http(&self) -> Result<ReqwestClient> {
        self.http.read().clone().ok_or_else(|| {
            OpsDeckError::Network(format!("client for instance {} is closed", self.instance_id))
        })
    }
}

impl std::fmt::Debug for SearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchClient")
            .field("instance_id", &self.instance_id)
            .field("base_url", &self.base_url.as_str())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[async_trait]
impl ClientHandle for SearchClient {
    async fn close(&self) -> Result<()> {
        // Dropping the last clone of the reqwest client releases its pool.
        if self.http.write().take().is_some() {
            debug!(instance_id = self.instance_id, "search client closed");
        }
        Ok(())
    }
}

fn map_http_error(err: reqwest::Error) -> OpsDeckError {
    OpsDeckError::from(InfraError::from(err))
}
