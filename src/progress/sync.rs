//! Best-effort mirroring of local cooking progress to the remote cook history.
//!
//! Local state has always been written by the time a request reaches this module, so a
//! failed remote write only produces a notice for the user.

use async_trait::async_trait;

use super::machine::{CookingSession, SyncRequest, Transition};
use super::store::{ProgressStore, StoreError};
use crate::api_connection::endpoints::{CookedRecord, CookedRequest, UpdateCookedRequest};
use crate::api_connection::{ApiClient, ApiConnectionError};

#[async_trait]
pub trait CookHistoryApi: Send + Sync {
    async fn record_cooked(
        &self,
        request: &CookedRequest,
    ) -> Result<CookedRecord, ApiConnectionError>;

    async fn update_cooked(
        &self,
        id: &str,
        update: &UpdateCookedRequest,
    ) -> Result<(), ApiConnectionError>;
}

#[async_trait]
impl CookHistoryApi for ApiClient {
    async fn record_cooked(
        &self,
        request: &CookedRequest,
    ) -> Result<CookedRecord, ApiConnectionError> {
        ApiClient::record_cooked(self, request).await
    }

    async fn update_cooked(
        &self,
        id: &str,
        update: &UpdateCookedRequest,
    ) -> Result<(), ApiConnectionError> {
        ApiClient::update_cooked(self, id, update).await
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    Recorded(CookedRecord),
    Updated,
    /// Nothing to address yet: the history record has no server id.
    Skipped,
    Failed { notice: String },
}

impl SyncOutcome {
    pub fn notice(&self) -> Option<&str> {
        match self {
            SyncOutcome::Failed { notice } => Some(notice),
            _ => None,
        }
    }
}

pub async fn dispatch<A: CookHistoryApi + ?Sized>(api: &A, request: SyncRequest) -> SyncOutcome {
    match request {
        SyncRequest::StartCooking(body) => match api.record_cooked(&body).await {
            Ok(record) => {
                tracing::debug!(id = %record.id, title = %record.title, "cook history recorded");
                SyncOutcome::Recorded(record)
            }
            Err(e) => {
                tracing::warn!(error = %e, title = %body.title, "failed to record cook history");
                let notice = if e.is_auth_failure() {
                    "Please login to start cooking"
                } else {
                    "Failed to save this recipe to your cook history"
                };
                SyncOutcome::Failed {
                    notice: notice.to_string(),
                }
            }
        },
        SyncRequest::UpdateHistory { remote_id, update } => {
            let Some(id) = remote_id else {
                tracing::debug!(?update, "no history id yet, skipping remote update");
                return SyncOutcome::Skipped;
            };
            match api.update_cooked(&id, &update).await {
                Ok(()) => SyncOutcome::Updated,
                Err(e) => {
                    tracing::warn!(error = %e, id = %id, "failed to update cook history");
                    SyncOutcome::Failed {
                        notice: "Failed to update recipe progress".to_string(),
                    }
                }
            }
        }
    }
}

/// Dispatches a transition's sync request and keeps any server-assigned id locally.
///
/// A newly recorded history entry starts at step 0, so progress made before it existed
/// is replayed right away. A failed replay is reported in place of `Recorded`.
pub async fn sync_transition<S, A>(
    session: &mut CookingSession<S>,
    api: &A,
    transition: Transition,
) -> Result<Option<SyncOutcome>, StoreError>
where
    S: ProgressStore,
    A: CookHistoryApi + ?Sized,
{
    let Some(request) = transition.sync else {
        return Ok(None);
    };

    let outcome = dispatch(api, request).await;
    if let SyncOutcome::Recorded(record) = &outcome {
        session.attach_remote_id(record.id.clone())?;
        if let Some(catch_up) = session.catch_up_update() {
            let replayed = dispatch(api, catch_up).await;
            if replayed.notice().is_some() {
                return Ok(Some(replayed));
            }
        }
    }
    Ok(Some(outcome))
}
