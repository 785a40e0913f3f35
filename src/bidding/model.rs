use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// 경매 모델
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Auction {
    pub id: i64,
    pub image_url: String,
    pub creator_id: String,
    pub end_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

// 입찰 모델 (amount_eth 는 고정 환율로 계산된 값)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PersistedBid {
    pub id: i64,
    pub auction_id: i64,
    pub bidder_id: String,
    pub amount_usd: Decimal,
    pub amount_eth: Decimal,
    pub created_at: DateTime<Utc>,
}

// 경매 생성자 (미니앱 호스트 사용자)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Creator {
    pub id: String,
    pub username: Option<String>,
    pub pfp_url: Option<String>,
    pub fid: Option<i64>,
}

/// 경매 상세 (입찰은 금액 내림차순)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuctionDetail {
    #[serde(flatten)]
    pub auction: Auction,
    pub bids: Vec<PersistedBid>,
    pub creator: Option<Creator>,
}

/// 종료된 경매 이력 (최고 입찰 하나만 포함)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuctionHistoryEntry {
    #[serde(flatten)]
    pub auction: Auction,
    pub bids: Vec<PersistedBid>,
}

/// 저장 전 경매
#[derive(Debug, Clone)]
pub struct NewAuction {
    pub image_url: String,
    pub creator_id: String,
    pub end_time: DateTime<Utc>,
}

/// 저장 전 입찰
#[derive(Debug, Clone)]
pub struct NewBid {
    pub auction_id: i64,
    pub bidder_id: String,
    pub amount_usd: Decimal,
    pub amount_eth: Decimal,
}
