// region:    --- Imports
use super::AuctionStore;
use crate::bidding::model::{
    Auction, AuctionDetail, AuctionHistoryEntry, Creator, NewAuction, NewBid, PersistedBid,
};
use crate::error::AuctionError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

// endregion: --- Imports

#[derive(Default)]
struct Tables {
    auctions: Vec<Auction>,
    bids: Vec<PersistedBid>,
    users: HashMap<String, Creator>,
    next_auction_id: i64,
    next_bid_id: i64,
}

/// 메모리 저장소 구현체 (테스트, DB 없는 데모 배포용)
#[derive(Default)]
pub struct MemoryAuctionStore {
    tables: RwLock<Tables>,
}

impl MemoryAuctionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// 금액 내림차순 정렬, 같은 금액은 먼저 들어온 입찰이 앞
fn sort_by_amount_desc(bids: &mut [PersistedBid]) {
    bids.sort_by(|a, b| b.amount_usd.cmp(&a.amount_usd).then(a.id.cmp(&b.id)));
}

#[async_trait]
impl AuctionStore for MemoryAuctionStore {
    async fn insert_auction(&self, auction: NewAuction) -> Result<Auction, AuctionError> {
        let mut tables = self.tables.write().await;
        tables.next_auction_id += 1;
        let created = Auction {
            id: tables.next_auction_id,
            image_url: auction.image_url,
            creator_id: auction.creator_id,
            end_time: auction.end_time,
            created_at: Utc::now(),
        };
        tables.auctions.push(created.clone());
        Ok(created)
    }

    async fn find_auction(&self, id: i64) -> Result<Option<AuctionDetail>, AuctionError> {
        let tables = self.tables.read().await;
        let Some(auction) = tables.auctions.iter().find(|a| a.id == id).cloned() else {
            return Ok(None);
        };

        let mut bids: Vec<PersistedBid> = tables
            .bids
            .iter()
            .filter(|b| b.auction_id == id)
            .cloned()
            .collect();
        sort_by_amount_desc(&mut bids);

        let creator = tables.users.get(&auction.creator_id).cloned();

        Ok(Some(AuctionDetail {
            auction,
            bids,
            creator,
        }))
    }

    async fn insert_bid(&self, bid: NewBid) -> Result<PersistedBid, AuctionError> {
        let mut tables = self.tables.write().await;
        tables.next_bid_id += 1;
        let created = PersistedBid {
            id: tables.next_bid_id,
            auction_id: bid.auction_id,
            bidder_id: bid.bidder_id,
            amount_usd: bid.amount_usd,
            amount_eth: bid.amount_eth,
            created_at: Utc::now(),
        };
        tables.bids.push(created.clone());
        Ok(created)
    }

    async fn ended_auctions(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<AuctionHistoryEntry>, AuctionError> {
        let tables = self.tables.read().await;
        let mut ended: Vec<Auction> = tables
            .auctions
            .iter()
            .filter(|a| a.end_time < now)
            .cloned()
            .collect();
        ended.sort_by(|a, b| b.end_time.cmp(&a.end_time));

        let entries = ended
            .into_iter()
            .map(|auction| {
                let mut bids: Vec<PersistedBid> = tables
                    .bids
                    .iter()
                    .filter(|b| b.auction_id == auction.id)
                    .cloned()
                    .collect();
                sort_by_amount_desc(&mut bids);
                bids.truncate(1);
                AuctionHistoryEntry { auction, bids }
            })
            .collect();
        Ok(entries)
    }

    async fn upsert_user(&self, user: Creator) -> Result<Creator, AuctionError> {
        let mut tables = self.tables.write().await;
        tables.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }
}
