/// 경매 API 클라이언트
///
/// 화면 계층이 백엔드의 `/api` 를 호출할 때 쓴다.
// region:    --- Imports
use crate::bidding::commands::{CreateAuctionCommand, PlaceBidCommand, UpsertUserCommand};
use crate::bidding::model::{Auction, AuctionDetail, AuctionHistoryEntry, Creator, PersistedBid};
use crate::presentation::{DailyItemSource, LoadError};
use crate::provider::contract::ContractReport;
use crate::provider::item::AuctionItem;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

// endregion: --- Imports

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Clone)]
pub struct AuctionApi {
    http: Client,
    base_url: String,
}

impl AuctionApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn read<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ErrorBody>().await {
                Ok(body) => body.error,
                Err(_) => status.canonical_reason().unwrap_or_default().to_string(),
            };
            return Err(ClientError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }

    pub async fn create_auction(&self, cmd: &CreateAuctionCommand) -> Result<Auction, ClientError> {
        debug!("{:<12} --> POST /api/auction", "Client");
        let response = self.http.post(self.url("/api/auction")).json(cmd).send().await?;
        Self::read(response).await
    }

    /// 없는 경매면 `None`
    pub async fn get_auction(&self, id: i64) -> Result<Option<AuctionDetail>, ClientError> {
        debug!("{:<12} --> GET /api/auction/{}", "Client", id);
        let response = self
            .http
            .get(self.url(&format!("/api/auction/{id}")))
            .send()
            .await?;
        Self::read(response).await
    }

    pub async fn place_bid(&self, cmd: &PlaceBidCommand) -> Result<PersistedBid, ClientError> {
        debug!("{:<12} --> POST /api/bid", "Client");
        let response = self.http.post(self.url("/api/bid")).json(cmd).send().await?;
        Self::read(response).await
    }

    pub async fn history(&self) -> Result<Vec<AuctionHistoryEntry>, ClientError> {
        let response = self.http.get(self.url("/api/history")).send().await?;
        Self::read(response).await
    }

    pub async fn upsert_user(&self, cmd: &UpsertUserCommand) -> Result<Creator, ClientError> {
        let response = self.http.post(self.url("/api/user")).json(cmd).send().await?;
        Self::read(response).await
    }

    pub async fn daily_item(&self) -> Result<AuctionItem, ClientError> {
        let response = self.http.get(self.url("/api/daily-item")).send().await?;
        Self::read(response).await
    }

    pub async fn contract(&self) -> Result<ContractReport, ClientError> {
        let response = self.http.get(self.url("/api/contract")).send().await?;
        Self::read(response).await
    }
}

#[async_trait]
impl DailyItemSource for AuctionApi {
    async fn load_daily_item(&self) -> Result<AuctionItem, LoadError> {
        self.daily_item()
            .await
            .map_err(|e| LoadError(e.to_string()))
    }
}
