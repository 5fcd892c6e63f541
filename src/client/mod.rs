//! HTTP client for the storage controller's resource API.
//!
//! Each operation issues one request against the controller endpoint and
//! maps failures onto [`ApiError`]. The orchestrator consumes this client
//! through the [`ResourceClient`] trait; the CLI also uses the inherent
//! CRUD methods directly.

mod attachment;
mod error;
mod profile;
mod snapshot;
mod volume;

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::config::{ConfigError, ControllerConfig};
use crate::model::{ConnectionInfo, Volume, VolumeAttachment};
use crate::resource::{AttachmentRequest, ClientFuture, ResourceClient, VolumeRequest};

pub use error::ApiError;

pub(crate) const VOLUMES_PATH: &str = "/v1/block/volumes";
pub(crate) const ATTACHMENTS_PATH: &str = "/v1/block/attachments";
pub(crate) const SNAPSHOTS_PATH: &str = "/v1/block/snapshots";
pub(crate) const PROFILES_PATH: &str = "/v1/block/profiles";

/// Client handle for one controller endpoint.
///
/// Construct one per process and pass it explicitly to the code that needs
/// it; there is no ambient global client.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
    auth_token: Option<String>,
}

impl ApiClient {
    /// Constructs a client from validated configuration.
    ///
    /// The underlying HTTP client applies the configured per-call timeout to
    /// every request; expiry surfaces as [`ApiError::Transport`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the configuration fails validation or
    /// the HTTP client cannot be built.
    pub fn new(config: &ControllerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|err| ConfigError::Client(err.to_string()))?;

        Ok(Self {
            http,
            base: config.endpoint.trim_end_matches('/').to_owned(),
            auth_token: config.auth_token.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{path}", self.base);
        let mut builder = self.http.request(method, url);
        if let Some(token) = &self.auth_token {
            builder = builder.header("X-Auth-Token", token);
        }
        builder
    }

    async fn send(builder: reqwest::RequestBuilder) -> Result<(u16, Vec<u8>), ApiError> {
        let response = builder
            .send()
            .await
            .map_err(|err| ApiError::transport(&err))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|err| ApiError::transport(&err))?;
        Ok((status, body.to_vec()))
    }

    async fn execute<R>(
        &self,
        method: Method,
        path: &str,
        body: Option<&impl Serialize>,
    ) -> Result<R, ApiError>
    where
        R: DeserializeOwned,
    {
        let mut builder = self.request(method, path);
        if let Some(payload) = body {
            builder = builder.json(payload);
        }

        let (status, bytes) = Self::send(builder).await?;
        if (200..300).contains(&status) {
            return serde_json::from_slice(&bytes).map_err(|err| ApiError::decode(&err));
        }

        Err(ApiError::Api {
            status,
            message: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }

    async fn execute_empty(
        &self,
        method: Method,
        path: &str,
        body: Option<&impl Serialize>,
    ) -> Result<(), ApiError> {
        let mut builder = self.request(method, path);
        if let Some(payload) = body {
            builder = builder.json(payload);
        }

        let (status, bytes) = Self::send(builder).await?;
        if (200..300).contains(&status) {
            return Ok(());
        }

        Err(ApiError::Api {
            status,
            message: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }
}

impl ResourceClient for ApiClient {
    type Error = ApiError;

    fn create_volume<'a>(
        &'a self,
        request: &'a VolumeRequest,
    ) -> ClientFuture<'a, Volume, Self::Error> {
        Box::pin(async move { Self::create_volume(self, request).await })
    }

    fn delete_volume<'a>(&'a self, volume_id: &'a str) -> ClientFuture<'a, (), Self::Error> {
        Box::pin(async move { Self::delete_volume(self, volume_id).await })
    }

    fn create_attachment<'a>(
        &'a self,
        request: &'a AttachmentRequest,
    ) -> ClientFuture<'a, VolumeAttachment, Self::Error> {
        Box::pin(async move { Self::create_attachment(self, request).await })
    }

    fn get_attachment<'a>(
        &'a self,
        attachment_id: &'a str,
    ) -> ClientFuture<'a, VolumeAttachment, Self::Error> {
        Box::pin(async move { Self::get_attachment(self, attachment_id).await })
    }

    fn attach_volume<'a>(
        &'a self,
        attachment: &'a VolumeAttachment,
    ) -> ClientFuture<'a, ConnectionInfo, Self::Error> {
        Box::pin(async move { Self::attach_volume(self, attachment).await })
    }

    fn detach_volume<'a>(
        &'a self,
        attachment: &'a VolumeAttachment,
    ) -> ClientFuture<'a, (), Self::Error> {
        Box::pin(async move { Self::detach_volume(self, attachment).await })
    }

    fn delete_attachment<'a>(
        &'a self,
        attachment_id: &'a str,
    ) -> ClientFuture<'a, (), Self::Error> {
        Box::pin(async move { Self::delete_attachment(self, attachment_id).await })
    }
}
