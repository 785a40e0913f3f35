// region:    --- Imports
use daily_auction::config::Config;
use daily_auction::server;
use tokio::net::TcpListener;
use tracing::{error, info};
// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    // 설정 로드
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{:<12} --> 설정 오류: {}", "Main", e);
            return Err(e.into());
        }
    };
    info!(
        "{:<12} --> 프로필: {}, 저장소: {:?}",
        "Main", config.profile, config.store
    );

    // 저장소 및 제공자 구성
    let state = match server::app_state(&config).await {
        Ok(state) => state,
        Err(e) => {
            error!("{:<12} --> 초기화 실패: {:?}", "Main", e);
            return Err(e);
        }
    };

    // 리스너 생성
    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행
    if let Err(err) = axum::serve(listener, server::routes(state).into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
