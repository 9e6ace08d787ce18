pub mod client;
pub mod error;
pub mod protocol;

use crate::api::error::ApiResult;
use crate::api::protocol::*;
use crate::approval::types::ApprovalStatus;
use async_trait::async_trait;

pub use client::SafeguardClient;
pub use error::{ApiError, ErrorKind};

/// Operations of the approval service.
/// Implementations return the decoded response unchanged; deciding what a
/// `success: false` body means is left to the caller.
#[async_trait]
pub trait SafeguardApi: Send + Sync {
    async fn list_requests(&self, status: ApprovalStatus) -> ApiResult<RequestListResponse>;

    async fn request_detail(&self, approval_id: &str) -> ApiResult<RequestDetailResponse>;

    async fn approve(&self, body: &DecisionBody) -> ApiResult<DecisionResponse>;

    async fn reject(&self, body: &DecisionBody) -> ApiResult<DecisionResponse>;

    async fn history(&self, limit: u32) -> ApiResult<RequestListResponse>;

    async fn list_deferred(&self, limit: u32) -> ApiResult<DeferredListResponse>;

    async fn deferred_detail(&self, deferred_id: &str) -> ApiResult<DeferredDetailResponse>;

    async fn cancel_deferred(
        &self,
        deferred_id: &str,
        body: &CancelBody,
    ) -> ApiResult<CancelResponse>;

    async fn deferred_stats(&self) -> ApiResult<DeferredStatsResponse>;
}
