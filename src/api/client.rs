//! HTTP client for the Safeguard approval service.
//!
//! One request per call: no retries, no backoff, one shared timeout.
//! Every request carries a fresh `x-request-id` so a call can be matched
//! with the service logs.

use crate::api::error::{ApiError, ApiResult};
use crate::api::protocol::*;
use crate::api::SafeguardApi;
use crate::approval::types::ApprovalStatus;
use crate::config::ServerConfig;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

/// Client for the approval service REST endpoints.
pub struct SafeguardClient {
    http: Client,
    base_url: Url,
    token: Option<String>,
}

impl SafeguardClient {
    /// Build a client from the `server` section of the configuration.
    pub fn new(config: &ServerConfig) -> ApiResult<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ApiError::Transport(format!("invalid base URL {}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Transport(format!(
                "invalid base URL {}: not a hierarchical URL",
                config.base_url
            )));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("safeguard/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url,
            token: config.token.clone().filter(|t| !t.is_empty()),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Base URL with the given path segments appended (each one percent-encoded).
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base was rejected in new(), so path segments are available
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        let url = self.endpoint(segments);
        let request_id = Uuid::new_v4().to_string();
        debug!(%url, request_id = %request_id, "GET");
        let builder = self
            .http
            .get(url)
            .query(query)
            .header("x-request-id", &request_id);
        self.execute(builder).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> ApiResult<T> {
        let url = self.endpoint(segments);
        let request_id = Uuid::new_v4().to_string();
        debug!(%url, request_id = %request_id, "POST");
        let builder = self
            .http
            .post(url)
            .json(body)
            .header("x-request-id", &request_id);
        self.execute(builder).await
    }

    async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ApiResult<T> {
        let builder = match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "Safeguard API error");
            return Err(ApiError::from_status(status.as_u16(), body));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl SafeguardApi for SafeguardClient {
    async fn list_requests(&self, status: ApprovalStatus) -> ApiResult<RequestListResponse> {
        self.get_json(
            &["safeguard", "requests"],
            &[("status", status.as_str().to_string())],
        )
        .await
    }

    async fn request_detail(&self, approval_id: &str) -> ApiResult<RequestDetailResponse> {
        self.get_json(&["safeguard", "request", approval_id], &[])
            .await
    }

    async fn approve(&self, body: &DecisionBody) -> ApiResult<DecisionResponse> {
        self.post_json(&["safeguard", "approve"], body).await
    }

    async fn reject(&self, body: &DecisionBody) -> ApiResult<DecisionResponse> {
        self.post_json(&["safeguard", "reject"], body).await
    }

    async fn history(&self, limit: u32) -> ApiResult<RequestListResponse> {
        self.get_json(&["safeguard", "history"], &[("limit", limit.to_string())])
            .await
    }

    async fn list_deferred(&self, limit: u32) -> ApiResult<DeferredListResponse> {
        self.get_json(&["safeguard", "deferred"], &[("limit", limit.to_string())])
            .await
    }

    async fn deferred_detail(&self, deferred_id: &str) -> ApiResult<DeferredDetailResponse> {
        self.get_json(&["safeguard", "deferred", deferred_id], &[])
            .await
    }

    async fn cancel_deferred(
        &self,
        deferred_id: &str,
        body: &CancelBody,
    ) -> ApiResult<CancelResponse> {
        self.post_json(&["safeguard", "deferred", deferred_id, "cancel"], body)
            .await
    }

    async fn deferred_stats(&self) -> ApiResult<DeferredStatsResponse> {
        self.get_json(&["safeguard", "deferred", "stats"], &[]).await
    }
}
