//! Edge → core RPC client

use std::time::Duration;

use async_trait::async_trait;
use tonic::transport::{Channel, Endpoint};
use tonic::{Request, Status};

use crate::correlation::{CorrelationId, attach_to_metadata};
use crate::rpc::messages::{
    CreateAccountRequest, CreateAccountResponse, TransferRequest, TransferResponse,
};
use crate::rpc::{AccountServiceClient, TransferServiceClient};

/// The two core calls the edge makes. Every call carries the minted id.
#[async_trait]
pub trait CoreClient: Send + Sync {
    async fn create_account(
        &self,
        correlation_id: CorrelationId,
        req: CreateAccountRequest,
    ) -> Result<CreateAccountResponse, Status>;

    async fn make_transfer(
        &self,
        correlation_id: CorrelationId,
        req: TransferRequest,
    ) -> Result<TransferResponse, Status>;
}

pub struct GrpcCoreClient {
    accounts: AccountServiceClient<Channel>,
    transfers: TransferServiceClient<Channel>,
    timeout: Duration,
}

impl GrpcCoreClient {
    /// Lazy channel: the first call dials, so the edge can start before the core.
    pub fn connect_lazy(endpoint: &str, timeout: Duration) -> anyhow::Result<Self> {
        let channel = Endpoint::from_shared(endpoint.to_string())?
            .connect_timeout(timeout)
            .timeout(timeout)
            .connect_lazy();

        tracing::info!(endpoint, "Core RPC channel configured");
        Ok(Self {
            accounts: AccountServiceClient::new(channel.clone()),
            transfers: TransferServiceClient::new(channel),
            timeout,
        })
    }

    fn request<T>(&self, correlation_id: CorrelationId, msg: T) -> Request<T> {
        let mut request = Request::new(msg);
        attach_to_metadata(request.metadata_mut(), correlation_id);
        request.set_timeout(self.timeout);
        request
    }
}

#[async_trait]
impl CoreClient for GrpcCoreClient {
    async fn create_account(
        &self,
        correlation_id: CorrelationId,
        req: CreateAccountRequest,
    ) -> Result<CreateAccountResponse, Status> {
        // Clients are cheap clones over one shared channel
        let mut client = self.accounts.clone();
        let response = client
            .create_account(self.request(correlation_id, req))
            .await?;
        Ok(response.into_inner())
    }

    async fn make_transfer(
        &self,
        correlation_id: CorrelationId,
        req: TransferRequest,
    ) -> Result<TransferResponse, Status> {
        let mut client = self.transfers.clone();
        let response = client
            .make_transfer(self.request(correlation_id, req))
            .await?;
        Ok(response.into_inner())
    }
}

/// Scripted core for handler tests
#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;
    use tonic::Code;

    type Scripted<T> = Mutex<Option<Result<T, (Code, String)>>>;

    fn replay<T: Clone>(slot: &Scripted<T>) -> Option<Result<T, Status>> {
        slot.lock()
            .unwrap()
            .clone()
            .map(|r| r.map_err(|(code, msg)| Status::new(code, msg)))
    }

    #[derive(Default)]
    pub struct MockCoreClient {
        account_result: Scripted<CreateAccountResponse>,
        transfer_result: Scripted<TransferResponse>,
        pub seen_ids: Mutex<Vec<CorrelationId>>,
        pub seen_transfers: Mutex<Vec<TransferRequest>>,
        pub seen_accounts: Mutex<Vec<CreateAccountRequest>>,
    }

    impl MockCoreClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond_account(&self, result: Result<CreateAccountResponse, (Code, &str)>) {
            *self.account_result.lock().unwrap() =
                Some(result.map_err(|(c, m)| (c, m.to_string())));
        }

        pub fn respond_transfer(&self, result: Result<TransferResponse, (Code, &str)>) {
            *self.transfer_result.lock().unwrap() =
                Some(result.map_err(|(c, m)| (c, m.to_string())));
        }

        pub fn calls(&self) -> usize {
            self.seen_ids.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CoreClient for MockCoreClient {
        async fn create_account(
            &self,
            correlation_id: CorrelationId,
            req: CreateAccountRequest,
        ) -> Result<CreateAccountResponse, Status> {
            self.seen_ids.lock().unwrap().push(correlation_id);
            self.seen_accounts.lock().unwrap().push(req);
            replay(&self.account_result).unwrap_or(Ok(CreateAccountResponse { success: true }))
        }

        async fn make_transfer(
            &self,
            correlation_id: CorrelationId,
            req: TransferRequest,
        ) -> Result<TransferResponse, Status> {
            self.seen_ids.lock().unwrap().push(correlation_id);
            self.seen_transfers.lock().unwrap().push(req);
            replay(&self.transfer_result)
                .unwrap_or_else(|| Err(Status::unavailable("no scripted response")))
        }
    }
}

#[cfg(test)]
pub use mock::MockCoreClient;
