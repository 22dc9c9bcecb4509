use crate::config::Config;
use crate::errors::ApiError;
use crate::models::{DataRecord, Envelope, FetchParam};
use reqwest::{Client, Method, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, warn};

pub const CREATE_USER_PATH: &str = "/mypage/api/admin/create";
pub const EDIT_USER_PATH: &str = "/mypage/api/admin/edit";
pub const DELETE_USER_PATH: &str = "/mypage/api/admin/delete";
pub const ADD_TAG_PATH: &str = "/mypage/api/tag";
pub const DATA_PATH: &str = "/mypage/api/data";
pub const REGENERATE_TOKEN_PATH: &str = "/mypage/api/regenerate";
pub const REREGISTER_PASSWORD_PATH: &str = "/mypage/api/reregister_password";

/// Clones share the connection pool and the token read at page build.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    config: Arc<Config>,
}

impl ApiClient {
    pub fn new(config: Config) -> Self {
        Self {
            http: Client::new(),
            config: Arc::new(config),
        }
    }

    pub fn limit(&self) -> u32 {
        self.config.limit
    }

    pub async fn call<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Envelope<T>, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.config.endpoint(path);
        debug!(method = method.as_str(), url = url.as_str(), "api request");

        let mut request = self
            .http
            .request(method, url)
            .bearer_auth(&self.config.token)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(%status, path, "api returned non-success status");
            return Err(ApiError::Status(status));
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Runs a mutating call; an `is_success: false` envelope becomes
    /// [`ApiError::Rejected`] with the server's reason.
    pub async fn mutate<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized,
    {
        let envelope: Envelope<serde_json::Value> = self.call(method, path, body).await?;
        if envelope.is_success {
            Ok(())
        } else {
            Err(ApiError::Rejected(envelope.reason))
        }
    }

    pub async fn fetch_data(&self, params: &FetchParam) -> Result<Vec<DataRecord>, ApiError> {
        let envelope: Envelope<Vec<DataRecord>> =
            self.call(Method::POST, DATA_PATH, Some(params)).await?;
        if !envelope.is_success {
            return Err(ApiError::Rejected(envelope.reason));
        }

        Ok(envelope.data.unwrap_or_default())
    }
}
