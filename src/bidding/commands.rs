/// 경매/입찰 관련 커맨드 처리
/// 1. 경매 생성
/// 2. 입찰
/// 3. 사용자 등록
///
/// 도메인 검증은 하지 않는다. 최고가보다 낮은 입찰도, 종료된 경매에 대한 입찰도 그대로 저장된다.
// region:    --- Imports
use crate::bidding::model::{Auction, Creator, NewAuction, NewBid, PersistedBid};
use crate::error::AuctionError;
use crate::store::AuctionStore;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
// endregion: --- Imports

// region:    --- Commands
/// 경매 생성 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateAuctionCommand {
    pub image_url: String,
    pub creator_id: String,
    pub duration_hours: Option<f64>,
}

/// 입찰 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PlaceBidCommand {
    pub auction_id: i64,
    pub bidder_id: String,
    pub amount_usd: Decimal,
}

/// 사용자 등록 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UpsertUserCommand {
    pub id: String,
    pub username: Option<String>,
    pub pfp_url: Option<String>,
    pub fid: Option<i64>,
}

/// 기본 경매 기간 (시간)
pub const DEFAULT_DURATION_HOURS: f64 = 24.0;

/// 고정 환율: 1 ETH = 3000 USD
// TODO: 가격 오라클(Chainlink price feed) 연동 후 제거
pub const ETH_USD_RATE: i64 = 3000;

/// USD 금액을 고정 환율로 ETH 로 환산
pub fn usd_to_eth(amount_usd: Decimal) -> Decimal {
    amount_usd / Decimal::from(ETH_USD_RATE)
}

/// 시간 단위 기간을 밀리초 단위 Duration 으로 변환
fn duration_from_hours(hours: f64) -> Result<Duration, AuctionError> {
    let millis = (hours * 3_600_000.0).round();
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        return Err(AuctionError::InvalidRequest(format!(
            "durationHours out of range: {hours}"
        )));
    }
    Duration::try_milliseconds(millis as i64).ok_or_else(|| {
        AuctionError::InvalidRequest(format!("durationHours out of range: {hours}"))
    })
}

/// 1. 경매 생성
pub async fn handle_create_auction(
    cmd: CreateAuctionCommand,
    store: &dyn AuctionStore,
) -> Result<Auction, AuctionError> {
    info!("{:<12} --> 경매 생성 요청 처리 시작: {:?}", "Command", cmd);
    let hours = cmd.duration_hours.unwrap_or(DEFAULT_DURATION_HOURS);
    let end_time = Utc::now()
        .checked_add_signed(duration_from_hours(hours)?)
        .ok_or_else(|| AuctionError::InvalidRequest(format!("end time overflow: {hours}h")))?;

    let auction = store
        .insert_auction(NewAuction {
            image_url: cmd.image_url,
            creator_id: cmd.creator_id,
            end_time,
        })
        .await?;
    info!(
        "{:<12} --> 경매 생성 완료 id: {}, 종료: {}",
        "Command", auction.id, auction.end_time
    );
    Ok(auction)
}

/// 2. 입찰
pub async fn handle_place_bid(
    cmd: PlaceBidCommand,
    store: &dyn AuctionStore,
) -> Result<PersistedBid, AuctionError> {
    info!("{:<12} --> 입찰 요청 처리 시작: {:?}", "Command", cmd);
    let amount_eth = usd_to_eth(cmd.amount_usd);
    store
        .insert_bid(NewBid {
            auction_id: cmd.auction_id,
            bidder_id: cmd.bidder_id,
            amount_usd: cmd.amount_usd,
            amount_eth,
        })
        .await
}

/// 3. 사용자 등록 (경매 상세의 creator 정보)
pub async fn handle_upsert_user(
    cmd: UpsertUserCommand,
    store: &dyn AuctionStore,
) -> Result<Creator, AuctionError> {
    info!("{:<12} --> 사용자 등록 id: {}", "Command", cmd.id);
    store
        .upsert_user(Creator {
            id: cmd.id,
            username: cmd.username,
            pfp_url: cmd.pfp_url,
            fid: cmd.fid,
        })
        .await
}

// endregion: --- Commands
