//! 세션 입찰 장부
//!
//! 클라이언트 메모리에만 존재한다. 새 입찰은 맨 앞에 들어가고, 맨 앞 입찰이 곧 현재 최고 입찰이다.
//! 금액 검증은 하지 않는다: 현재 최고가보다 낮거나 음수인 입찰도 그대로 최고 입찰이 된다.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

/// 사용자 표시 이름이 없을 때
pub const ANONYMOUS_BIDDER: &str = "You";

/// 세션 입찰
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    pub id: String,
    pub bidder: String,
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
    /// 화면용 문자열. 실제 트랜잭션 해시가 아니며 검증할 수 없다.
    pub hash: String,
}

/// `0x` + 40자리 16진수
pub fn mock_hash() -> String {
    let mut bytes = [0u8; 20];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("0x{}", hex::encode(bytes))
}

#[derive(Debug, Clone, Default)]
pub struct BidLedger {
    bids: VecDeque<Bid>,
}

impl BidLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// 데모용 초기 입찰 두 건
    pub fn with_demo_history(now: DateTime<Utc>) -> Self {
        let bids = VecDeque::from(vec![
            Bid {
                id: "1".to_string(),
                bidder: "vitalik.eth".to_string(),
                amount: Decimal::new(12, 1),
                timestamp: now - Duration::minutes(5),
                hash: "0x7f...3a2b".to_string(),
            },
            Bid {
                id: "2".to_string(),
                bidder: "dwr.eth".to_string(),
                amount: Decimal::new(8, 1),
                timestamp: now - Duration::minutes(30),
                hash: "0x9c...1e4f".to_string(),
            },
        ]);
        Self { bids }
    }

    pub fn place_bid(&mut self, amount: Decimal, bidder: Option<&str>) -> Bid {
        self.place_bid_at(amount, bidder, Utc::now())
    }

    pub fn place_bid_at(
        &mut self,
        amount: Decimal,
        bidder: Option<&str>,
        now: DateTime<Utc>,
    ) -> Bid {
        let bid = Bid {
            id: now.timestamp_millis().to_string(),
            bidder: bidder.unwrap_or(ANONYMOUS_BIDDER).to_string(),
            amount,
            timestamp: now,
            hash: mock_hash(),
        };
        debug!(
            "{:<12} --> 입찰 추가 bidder={}, amount={}",
            "Ledger", bid.bidder, bid.amount
        );
        self.bids.push_front(bid.clone());
        bid
    }

    /// 장부 맨 앞 금액, 비어 있으면 시작가
    pub fn top_bid(&self, starting_price: Decimal) -> Decimal {
        self.bids
            .front()
            .map(|bid| bid.amount)
            .unwrap_or(starting_price)
    }

    /// 다음 입찰 제안 금액
    pub fn next_bid(&self, starting_price: Decimal, increment: Decimal) -> Decimal {
        self.top_bid(starting_price) + increment
    }

    pub fn bids(&self) -> impl Iterator<Item = &Bid> {
        self.bids.iter()
    }

    pub fn len(&self) -> usize {
        self.bids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty()
    }
}
