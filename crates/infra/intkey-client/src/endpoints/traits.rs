//! Contains the [`ServiceEndpointClient`] trait, the interface the load driver
//! uses to talk to one validator node.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::{ClientError, TransactionId, TransactionRequest, TransactionStatus};

/// Client for a single integer-key validator endpoint.
#[async_trait]
pub trait ServiceEndpointClient: Send + Sync {
    /// Endpoint identifier, used in logs and errors.
    fn url(&self) -> &str;

    /// Submits a transaction.
    ///
    /// `Ok(None)` means the endpoint accepted the request but assigned no
    /// transaction identifier.
    async fn submit(
        &self,
        request: TransactionRequest,
    ) -> Result<Option<TransactionId>, ClientError>;

    /// Reports the commit status of a transaction.
    ///
    /// Transport failures are retried internally and surface as
    /// [`TransactionStatus::Unknown`].
    async fn query_status(&self, id: &TransactionId) -> TransactionStatus;

    /// Fetches the full key/value state as seen by this endpoint.
    async fn fetch_state(&self) -> Result<BTreeMap<String, i64>, ClientError>;

    /// Refreshes this client's view of the endpoint state ahead of a round.
    async fn refresh_cache(&self) -> Result<(), ClientError> {
        Ok(())
    }
}
