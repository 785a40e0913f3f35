// region:    --- Imports
use crate::bidding::commands::{
    handle_create_auction, handle_place_bid, handle_upsert_user, CreateAuctionCommand,
    PlaceBidCommand, UpsertUserCommand,
};
use crate::bidding::model::{Auction, AuctionDetail, AuctionHistoryEntry, Creator, PersistedBid};
use crate::error::{ApiError, AuctionError};
use crate::provider::contract::{ContractAnalyzer, ContractReport, DAILY_AUCTION_CONTRACT};
use crate::provider::item::{AuctionItem, ItemProvider};
use crate::query;
use crate::store::AuctionStore;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};
use std::fmt::Display;
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

/// 라우터 공유 상태
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AuctionStore>,
    pub items: Arc<dyn ItemProvider>,
    pub analyzer: Arc<dyn ContractAnalyzer>,
}

/// 추출 실패도 작업별 고정 메시지의 500 으로 응답한다.
fn rejected(message: &'static str, rejection: impl Display) -> ApiError {
    ApiError::new(message, AuctionError::InvalidRequest(rejection.to_string()))
}

// region:    --- Command Handlers

/// 경매 생성 요청 처리
pub async fn handle_post_auction(
    State(state): State<AppState>,
    payload: Result<Json<CreateAuctionCommand>, JsonRejection>,
) -> Result<Json<Auction>, ApiError> {
    let Json(cmd) = payload.map_err(|e| rejected("Failed to create auction", e))?;
    info!("{:<12} --> 경매 생성 요청: {:?}", "Handler", cmd);
    handle_create_auction(cmd, state.store.as_ref())
        .await
        .map(Json)
        .map_err(|e| ApiError::new("Failed to create auction", e))
}

/// 입찰 요청 처리 (금액 검증 없음)
pub async fn handle_bid(
    State(state): State<AppState>,
    payload: Result<Json<PlaceBidCommand>, JsonRejection>,
) -> Result<Json<PersistedBid>, ApiError> {
    let Json(cmd) = payload.map_err(|e| rejected("Failed to place bid", e))?;
    info!("{:<12} --> 입찰 요청: {:?}", "Handler", cmd);
    handle_place_bid(cmd, state.store.as_ref())
        .await
        .map(Json)
        .map_err(|e| ApiError::new("Failed to place bid", e))
}

/// 사용자 등록 요청 처리
pub async fn handle_post_user(
    State(state): State<AppState>,
    payload: Result<Json<UpsertUserCommand>, JsonRejection>,
) -> Result<Json<Creator>, ApiError> {
    let Json(cmd) = payload.map_err(|e| rejected("Failed to save user", e))?;
    handle_upsert_user(cmd, state.store.as_ref())
        .await
        .map(Json)
        .map_err(|e| ApiError::new("Failed to save user", e))
}

// endregion: --- Command Handlers

// region:    --- Query Handlers

/// 경매 조회. 없으면 `null`.
pub async fn handle_get_auction(
    State(state): State<AppState>,
    auction_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Option<AuctionDetail>>, ApiError> {
    let Path(auction_id) = auction_id.map_err(|e| rejected("Failed to fetch auction", e))?;
    info!("{:<12} --> 경매 조회: {}", "HandlerQuery", auction_id);
    query::handlers::get_auction(state.store.as_ref(), auction_id)
        .await
        .map(Json)
        .map_err(|e| ApiError::new("Failed to fetch auction", e))
}

/// 종료된 경매 이력 조회
pub async fn handle_get_history(
    State(state): State<AppState>,
) -> Result<Json<Vec<AuctionHistoryEntry>>, ApiError> {
    info!("{:<12} --> 경매 이력 조회", "HandlerQuery");
    query::handlers::list_history(state.store.as_ref())
        .await
        .map(Json)
        .map_err(|e| ApiError::new("Failed to fetch history", e))
}

/// 오늘의 아이템. 제공자가 대체 값을 돌려줘도 그대로 응답한다.
pub async fn handle_get_daily_item(State(state): State<AppState>) -> Json<AuctionItem> {
    info!("{:<12} --> 오늘의 아이템 조회", "HandlerQuery");
    Json(state.items.fetch_daily_item().await.into_inner())
}

/// 고정 컨트랙트와 분석 결과
pub async fn handle_get_contract(State(state): State<AppState>) -> Json<ContractReport> {
    info!("{:<12} --> 컨트랙트 분석 조회", "HandlerQuery");
    let analysis = state
        .analyzer
        .analyze(DAILY_AUCTION_CONTRACT)
        .await
        .into_inner();
    Json(ContractReport {
        source: DAILY_AUCTION_CONTRACT.to_string(),
        analysis,
    })
}

pub async fn handle_health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

// endregion: --- Query Handlers
