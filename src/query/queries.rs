/// 경매 생성
pub const INSERT_AUCTION: &str = r#"
    INSERT INTO auctions (image_url, creator_id, end_time)
    VALUES ($1, $2, $3)
    RETURNING id, image_url, creator_id, end_time, created_at
"#;

/// 경매 조회
pub const GET_AUCTION: &str =
    "SELECT id, image_url, creator_id, end_time, created_at FROM auctions WHERE id = $1";

/// 경매 입찰 조회 (금액 내림차순)
pub const GET_AUCTION_BIDS: &str = r#"
    SELECT id, auction_id, bidder_id, amount_usd, amount_eth, created_at
    FROM bids
    WHERE auction_id = $1
    ORDER BY amount_usd DESC, id ASC
"#;

/// 사용자 조회
pub const GET_USER: &str = "SELECT id, username, pfp_url, fid FROM users WHERE id = $1";

/// 사용자 생성 또는 갱신
pub const UPSERT_USER: &str = r#"
    INSERT INTO users (id, username, pfp_url, fid)
    VALUES ($1, $2, $3, $4)
    ON CONFLICT (id) DO UPDATE
    SET username = EXCLUDED.username, pfp_url = EXCLUDED.pfp_url, fid = EXCLUDED.fid
    RETURNING id, username, pfp_url, fid
"#;

/// 입찰 생성
pub const INSERT_BID: &str = r#"
    INSERT INTO bids (auction_id, bidder_id, amount_usd, amount_eth)
    VALUES ($1, $2, $3, $4)
    RETURNING id, auction_id, bidder_id, amount_usd, amount_eth, created_at
"#;

/// 종료된 경매 조회 (종료 시간 내림차순)
pub const GET_ENDED_AUCTIONS: &str = r#"
    SELECT id, image_url, creator_id, end_time, created_at
    FROM auctions
    WHERE end_time < $1
    ORDER BY end_time DESC
"#;

/// 경매별 최고 입찰 조회
pub const GET_TOP_BIDS: &str = r#"
    SELECT DISTINCT ON (auction_id) id, auction_id, bidder_id, amount_usd, amount_eth, created_at
    FROM bids
    WHERE auction_id = ANY($1)
    ORDER BY auction_id, amount_usd DESC, id ASC
"#;
