// region:    --- Imports
use crate::bidding::model::{AuctionDetail, AuctionHistoryEntry};
use crate::error::AuctionError;
use crate::store::AuctionStore;
use chrono::Utc;
use tracing::info;

// endregion: --- Imports

// region:    --- Query Handlers

/// 경매 조회 (입찰 금액 내림차순, 생성자 정보 포함)
pub async fn get_auction(
    store: &dyn AuctionStore,
    auction_id: i64,
) -> Result<Option<AuctionDetail>, AuctionError> {
    info!("{:<12} --> 경매 조회 id: {}", "Query", auction_id);
    store.find_auction(auction_id).await
}

/// 종료된 경매 이력 조회 (종료 시간 내림차순, 경매별 최고 입찰만)
pub async fn list_history(
    store: &dyn AuctionStore,
) -> Result<Vec<AuctionHistoryEntry>, AuctionError> {
    info!("{:<12} --> 종료된 경매 이력 조회", "Query");
    store.ended_auctions(Utc::now()).await
}

// endregion: --- Query Handlers

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bidding::commands::{
        handle_create_auction, handle_place_bid, handle_upsert_user, CreateAuctionCommand,
        PlaceBidCommand, UpsertUserCommand,
    };
    use crate::store::MemoryAuctionStore;
    use rust_decimal::Decimal;

    async fn create(store: &MemoryAuctionStore, hours: f64) -> i64 {
        handle_create_auction(
            CreateAuctionCommand {
                image_url: format!("https://img.example/{hours}.png"),
                creator_id: "creator-1".to_string(),
                duration_hours: Some(hours),
            },
            store,
        )
        .await
        .unwrap()
        .id
    }

    async fn bid(store: &MemoryAuctionStore, auction_id: i64, usd: i64) {
        handle_place_bid(
            PlaceBidCommand {
                auction_id,
                bidder_id: format!("bidder-{usd}"),
                amount_usd: Decimal::from(usd),
            },
            store,
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn history_lists_only_ended_auctions_newest_first() {
        let store = MemoryAuctionStore::new();
        let older = create(&store, -48.0).await;
        let live = create(&store, 5.0).await;
        let newer = create(&store, -2.0).await;
        let no_bids = create(&store, -10.0).await;

        bid(&store, older, 100).await;
        bid(&store, older, 700).await;
        bid(&store, older, 300).await;
        bid(&store, newer, 50).await;
        bid(&store, live, 10_000).await;

        let history = list_history(&store).await.unwrap();
        let ids: Vec<i64> = history.iter().map(|e| e.auction.id).collect();
        assert_eq!(ids, vec![newer, no_bids, older]);

        for entry in &history {
            assert!(entry.auction.end_time < Utc::now());
            assert!(entry.bids.len() <= 1);
        }
        assert_eq!(history[0].bids[0].amount_usd, Decimal::from(50));
        assert!(history[1].bids.is_empty());
        assert_eq!(history[2].bids[0].amount_usd, Decimal::from(700));
    }

    #[tokio::test]
    async fn auction_detail_includes_creator_and_sorted_bids() {
        let store = MemoryAuctionStore::new();
        handle_upsert_user(
            UpsertUserCommand {
                id: "creator-1".to_string(),
                username: Some("dwr".to_string()),
                pfp_url: None,
                fid: Some(3),
            },
            &store,
        )
        .await
        .unwrap();
        let id = create(&store, 24.0).await;
        bid(&store, id, 20).await;
        bid(&store, id, 80).await;
        bid(&store, id, 40).await;

        let detail = get_auction(&store, id).await.unwrap().unwrap();
        let amounts: Vec<Decimal> = detail.bids.iter().map(|b| b.amount_usd).collect();
        assert_eq!(
            amounts,
            vec![Decimal::from(80), Decimal::from(40), Decimal::from(20)]
        );
        assert_eq!(detail.creator.unwrap().username.as_deref(), Some("dwr"));
    }
}
