// region:    --- Imports
use crate::bidding::model::{
    Auction, AuctionDetail, AuctionHistoryEntry, Creator, NewAuction, NewBid, PersistedBid,
};
use crate::database::DatabaseManager;
use crate::error::AuctionError;
use crate::query::queries;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

mod memory;

pub use memory::MemoryAuctionStore;

// endregion: --- Imports

// region:    --- Auction Store Trait
/// 경매 저장소 트레이트
///
/// 구현체는 도메인 검증을 하지 않는다. 정렬 규칙만 보장한다:
/// - `find_auction` 의 입찰은 `amount_usd` 내림차순
/// - `ended_auctions` 는 `end_time` 내림차순, 경매별 최고 입찰 하나
#[async_trait]
pub trait AuctionStore: Send + Sync {
    async fn insert_auction(&self, auction: NewAuction) -> Result<Auction, AuctionError>;

    async fn find_auction(&self, id: i64) -> Result<Option<AuctionDetail>, AuctionError>;

    async fn insert_bid(&self, bid: NewBid) -> Result<PersistedBid, AuctionError>;

    async fn ended_auctions(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<AuctionHistoryEntry>, AuctionError>;

    async fn upsert_user(&self, user: Creator) -> Result<Creator, AuctionError>;
}
// endregion: --- Auction Store Trait

// region:    --- Postgres Auction Store
/// PostgreSQL 저장소 구현체
pub struct PostgresAuctionStore {
    db_manager: Arc<DatabaseManager>,
}

impl PostgresAuctionStore {
    pub fn new(db_manager: Arc<DatabaseManager>) -> Self {
        Self { db_manager }
    }
}

#[async_trait]
impl AuctionStore for PostgresAuctionStore {
    async fn insert_auction(&self, auction: NewAuction) -> Result<Auction, AuctionError> {
        let created = sqlx::query_as::<_, Auction>(queries::INSERT_AUCTION)
            .bind(&auction.image_url)
            .bind(&auction.creator_id)
            .bind(auction.end_time)
            .fetch_one(self.db_manager.pool.as_ref())
            .await?;
        Ok(created)
    }

    async fn find_auction(&self, id: i64) -> Result<Option<AuctionDetail>, AuctionError> {
        self.db_manager
            .transaction(|tx| {
                Box::pin(async move {
                    let Some(auction) = sqlx::query_as::<_, Auction>(queries::GET_AUCTION)
                        .bind(id)
                        .fetch_optional(&mut **tx)
                        .await?
                    else {
                        return Ok::<_, AuctionError>(None);
                    };

                    let bids = sqlx::query_as::<_, PersistedBid>(queries::GET_AUCTION_BIDS)
                        .bind(id)
                        .fetch_all(&mut **tx)
                        .await?;

                    let creator = sqlx::query_as::<_, Creator>(queries::GET_USER)
                        .bind(&auction.creator_id)
                        .fetch_optional(&mut **tx)
                        .await?;

                    Ok::<_, AuctionError>(Some(AuctionDetail {
                        auction,
                        bids,
                        creator,
                    }))
                })
            })
            .await
    }

    async fn insert_bid(&self, bid: NewBid) -> Result<PersistedBid, AuctionError> {
        let created = sqlx::query_as::<_, PersistedBid>(queries::INSERT_BID)
            .bind(bid.auction_id)
            .bind(&bid.bidder_id)
            .bind(bid.amount_usd)
            .bind(bid.amount_eth)
            .fetch_one(self.db_manager.pool.as_ref())
            .await?;
        Ok(created)
    }

    async fn ended_auctions(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<AuctionHistoryEntry>, AuctionError> {
        self.db_manager
            .transaction(|tx| {
                Box::pin(async move {
                    let auctions = sqlx::query_as::<_, Auction>(queries::GET_ENDED_AUCTIONS)
                        .bind(now)
                        .fetch_all(&mut **tx)
                        .await?;

                    let ids: Vec<i64> = auctions.iter().map(|a| a.id).collect();
                    let top_bids = sqlx::query_as::<_, PersistedBid>(queries::GET_TOP_BIDS)
                        .bind(&ids)
                        .fetch_all(&mut **tx)
                        .await?;
                    debug!(
                        "{:<12} --> 종료 경매 {}건, 최고 입찰 {}건",
                        "Store",
                        auctions.len(),
                        top_bids.len()
                    );

                    Ok::<_, AuctionError>(attach_top_bids(auctions, top_bids))
                })
            })
            .await
    }

    async fn upsert_user(&self, user: Creator) -> Result<Creator, AuctionError> {
        let saved = sqlx::query_as::<_, Creator>(queries::UPSERT_USER)
            .bind(&user.id)
            .bind(&user.username)
            .bind(&user.pfp_url)
            .bind(user.fid)
            .fetch_one(self.db_manager.pool.as_ref())
            .await?;
        Ok(saved)
    }
}
// endregion: --- Postgres Auction Store

/// 경매 순서를 유지한 채 경매별 최고 입찰을 붙인다.
pub(crate) fn attach_top_bids(
    auctions: Vec<Auction>,
    top_bids: Vec<PersistedBid>,
) -> Vec<AuctionHistoryEntry> {
    let mut by_auction: HashMap<i64, PersistedBid> = top_bids
        .into_iter()
        .map(|bid| (bid.auction_id, bid))
        .collect();

    auctions
        .into_iter()
        .map(|auction| {
            let bids = by_auction.remove(&auction.id).into_iter().collect();
            AuctionHistoryEntry { auction, bids }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal::Decimal;

    fn auction(id: i64, end_time: DateTime<Utc>) -> Auction {
        Auction {
            id,
            image_url: format!("https://img.example/{id}.png"),
            creator_id: "creator".to_string(),
            end_time,
            created_at: end_time - Duration::hours(24),
        }
    }

    fn bid(id: i64, auction_id: i64, usd: i64) -> PersistedBid {
        PersistedBid {
            id,
            auction_id,
            bidder_id: "bidder".to_string(),
            amount_usd: Decimal::from(usd),
            amount_eth: Decimal::from(usd) / Decimal::from(3000),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn attach_top_bids_keeps_auction_order() {
        let now = Utc::now();
        let auctions = vec![
            auction(2, now - Duration::hours(1)),
            auction(1, now - Duration::hours(5)),
            auction(3, now - Duration::hours(9)),
        ];
        let entries = attach_top_bids(auctions, vec![bid(10, 1, 500), bid(11, 2, 900)]);

        let ids: Vec<i64> = entries.iter().map(|e| e.auction.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
        assert_eq!(entries[0].bids.len(), 1);
        assert_eq!(entries[0].bids[0].id, 11);
        assert_eq!(entries[0].bids[0].amount_usd, Decimal::from(900));
        assert_eq!(entries[1].bids.len(), 1);
        assert_eq!(entries[1].bids[0].id, 10);
        assert!(entries[2].bids.is_empty());
    }
}
