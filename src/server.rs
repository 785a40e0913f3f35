// region:    --- Imports
use crate::config::{Config, GenAiConfig, StoreBackend};
use crate::database::DatabaseManager;
use crate::genai::{GeminiClient, GenAiError, GenerativeModel};
use crate::handlers::{self, AppState};
use crate::presentation::Profile;
use crate::provider::contract::{
    ContractAnalyzer, GenerativeContractAnalyzer, StaticContractAnalyzer,
};
use crate::provider::item::{GenerativeItemProvider, ItemProvider, StaticItemProvider};
use crate::store::{AuctionStore, MemoryAuctionStore, PostgresAuctionStore};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

// endregion: --- Imports

/// 요청 바디 상한 (이미지 data URL 포함)
const BODY_LIMIT: usize = 1024 * 1024 * 20;

pub fn routes(state: AppState) -> Router {
    // 미니앱 호스트 iframe 에서 호출하므로 모든 출처 허용
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/auction", post(handlers::handle_post_auction))
        .route("/api/auction/:id", get(handlers::handle_get_auction))
        .route("/api/bid", post(handlers::handle_bid))
        .route("/api/history", get(handlers::handle_get_history))
        .route("/api/user", post(handlers::handle_post_user))
        .route("/api/daily-item", get(handlers::handle_get_daily_item))
        .route("/api/contract", get(handlers::handle_get_contract))
        .route("/health", get(handlers::handle_health))
        .layer(cors)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn gemini(config: &GenAiConfig) -> Result<Arc<dyn GenerativeModel>, GenAiError> {
    let client = GeminiClient::new(
        config.api_key.clone(),
        config.base_url.clone(),
        config.text_model.clone(),
        config.image_model.clone(),
        config.timeout,
    )?;
    Ok(Arc::new(client))
}

/// 프로필에 맞는 아이템 제공자/분석기 구성
pub fn providers(
    profile: Profile,
    genai: Option<&GenAiConfig>,
) -> Result<(Arc<dyn ItemProvider>, Arc<dyn ContractAnalyzer>), GenAiError> {
    let providers: (Arc<dyn ItemProvider>, Arc<dyn ContractAnalyzer>) = match profile {
        Profile::MiniApp => (Arc::new(StaticItemProvider), Arc::new(StaticContractAnalyzer)),
        Profile::Showcase => {
            let model = genai.map(gemini).transpose()?;
            if model.is_none() {
                warn!("{:<12} --> GEMINI_API_KEY 미설정. 대체 아이템/분석 사용", "Main");
            }
            (
                Arc::new(GenerativeItemProvider::new(model.clone())),
                Arc::new(GenerativeContractAnalyzer::new(model)),
            )
        }
    };
    Ok(providers)
}

/// 설정에 맞는 저장소 구성. Postgres 면 스키마도 초기화한다.
pub async fn store(config: &Config) -> Result<Arc<dyn AuctionStore>, Box<dyn std::error::Error>> {
    match config.store {
        StoreBackend::Memory => {
            info!("{:<12} --> 메모리 저장소 사용", "Main");
            Ok(Arc::new(MemoryAuctionStore::new()))
        }
        StoreBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .ok_or(crate::config::ConfigError::MissingDatabaseUrl)?;
            let db_manager =
                Arc::new(DatabaseManager::connect(database_url, config.max_connections).await?);
            db_manager.initialize_database().await?;
            info!("{:<12} --> 데이터베이스 초기화 성공", "Main");
            Ok(Arc::new(PostgresAuctionStore::new(db_manager)))
        }
    }
}

pub async fn app_state(config: &Config) -> Result<AppState, Box<dyn std::error::Error>> {
    let store = store(config).await?;
    let (items, analyzer) = providers(config.profile, config.genai.as_ref())?;
    Ok(AppState {
        store,
        items,
        analyzer,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::contract::DAILY_AUCTION_CONTRACT;

    #[tokio::test]
    async fn showcase_without_key_degrades_instead_of_failing() {
        let (items, analyzer) = providers(Profile::Showcase, None).unwrap();
        assert!(items.fetch_daily_item().await.is_degraded());
        assert!(analyzer.analyze(DAILY_AUCTION_CONTRACT).await.is_degraded());
    }

    #[tokio::test]
    async fn mini_app_uses_static_providers() {
        let (items, analyzer) = providers(Profile::MiniApp, None).unwrap();
        assert_eq!(items.fetch_daily_item().await.value().id, "static-1");
        assert_eq!(analyzer.analyze("").await.value().risk_score, 5);
    }
}
