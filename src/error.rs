// region:    --- Imports
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

// endregion: --- Imports

// region:    --- Auction Error
/// 경매 저장/조회 오류
#[derive(Error, Debug)]
pub enum AuctionError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}
// endregion: --- Auction Error

// region:    --- Api Error
/// HTTP 응답용 오류
///
/// 원인과 관계없이 클라이언트에는 500과 작업별 고정 메시지만 내려준다.
#[derive(Error, Debug)]
#[error("{message}: {source}")]
pub struct ApiError {
    message: &'static str,
    #[source]
    source: AuctionError,
}

impl ApiError {
    pub fn new(message: &'static str, source: AuctionError) -> Self {
        Self { message, source }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!("{:<12} --> {}: {}", "Handler", self.message, self.source);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": self.message })),
        )
            .into_response()
    }
}
// endregion: --- Api Error

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn api_error_hides_storage_detail() {
        let err = ApiError::new(
            "Failed to place bid",
            AuctionError::Database(sqlx::Error::PoolTimedOut),
        );
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({ "error": "Failed to place bid" }));
    }
}
