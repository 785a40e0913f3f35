//! 화면 상태 (헤드리스)
//!
//! 두 배포 프로필(쇼케이스, 미니앱)은 같은 아이템 제공자/입찰 장부 위에서 보이는 화면과 입찰 단위만 다르다.

pub mod host;

// region:    --- Imports
use crate::bidding::commands::CreateAuctionCommand;
use crate::bidding::model::Auction;
use crate::client::{AuctionApi, ClientError};
use crate::countdown::{Countdown, CountdownHandle};
use crate::ledger::{Bid, BidLedger};
use crate::provider::contract::{ContractAnalysis, ContractAnalyzer, DAILY_AUCTION_CONTRACT};
use crate::provider::item::{AuctionItem, ItemProvider};
use crate::provider::{DegradeCause, Provided};
use async_trait::async_trait;
use chrono::Utc;
use host::{signal_ready, HostShell, HostUser};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

// endregion: --- Imports

// region:    --- Profile & View
/// 배포 프로필
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// 생성형 AI 데모
    Showcase,
    /// 미니앱 호스트 탑재
    MiniApp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Auction,
    Contract,
    History,
}

impl Profile {
    pub fn views(&self) -> &'static [View] {
        match self {
            Profile::Showcase => &[View::Auction, View::Contract, View::History],
            Profile::MiniApp => &[View::Auction, View::History],
        }
    }

    /// 입찰 버튼 한 번의 증가폭
    pub fn bid_increment(&self) -> Decimal {
        match self {
            Profile::Showcase => Decimal::new(1, 1),
            Profile::MiniApp => Decimal::ONE,
        }
    }

    pub fn currency(&self) -> &'static str {
        match self {
            Profile::Showcase => "ETH",
            Profile::MiniApp => "USD",
        }
    }

    pub fn loading_message(&self) -> &'static str {
        match self {
            Profile::Showcase => "Gemini is curating today's artifact...",
            Profile::MiniApp => "Loading today's artifact...",
        }
    }

    pub fn load_error_message(&self) -> &'static str {
        match self {
            Profile::Showcase => {
                "Failed to generate today's auction item. Please check your API Key."
            }
            Profile::MiniApp => "Failed to load today's auction item.",
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("unknown profile: {0}")]
pub struct UnknownProfile(String);

impl FromStr for Profile {
    type Err = UnknownProfile;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "showcase" => Ok(Profile::Showcase),
            "miniapp" | "mini-app" => Ok(Profile::MiniApp),
            other => Err(UnknownProfile(other.to_string())),
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Profile::Showcase => write!(f, "showcase"),
            Profile::MiniApp => write!(f, "miniapp"),
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("view {view:?} is not available in the {profile} profile")]
pub struct UnsupportedView {
    pub view: View,
    pub profile: Profile,
}
// endregion: --- Profile & View

// region:    --- Item Source
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct LoadError(pub String);

/// 화면이 오늘의 아이템을 가져오는 곳
#[async_trait]
pub trait DailyItemSource: Send + Sync {
    async fn load_daily_item(&self) -> Result<AuctionItem, LoadError>;
}

/// 같은 프로세스의 아이템 제공자. 제공자는 실패하지 않으므로 항상 성공한다.
pub struct LocalItemSource {
    provider: Arc<dyn ItemProvider>,
}

impl LocalItemSource {
    pub fn new(provider: Arc<dyn ItemProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl DailyItemSource for LocalItemSource {
    async fn load_daily_item(&self) -> Result<AuctionItem, LoadError> {
        let provided = self.provider.fetch_daily_item().await;
        if let Some(cause) = provided.cause() {
            debug!("{:<12} --> 대체 아이템 사용: {:?}", "App", cause);
        }
        Ok(provided.into_inner())
    }
}
// endregion: --- Item Source

// region:    --- App State
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Loading,
    Ready(AuctionItem),
    Failed(String),
}

/// 호스트 사용자 없이 만든 경매의 생성자 ID
pub const ANONYMOUS_CREATOR: &str = "anonymous";

/// 로드 시작 시점의 세대 번호
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// 화면 스냅샷
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewModel {
    pub profile: Profile,
    pub view: View,
    pub views: Vec<View>,
    pub loading_message: Option<&'static str>,
    pub error: Option<String>,
    pub item: Option<AuctionItem>,
    pub currency: &'static str,
    pub top_bid: Decimal,
    pub next_bid: Decimal,
    pub bids: Vec<Bid>,
    pub remaining: Option<String>,
    pub user: Option<HostUser>,
    pub uploaded_image: Option<String>,
    pub contract: ContractPanel,
}

/// 컨트랙트 화면
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractPanel {
    pub source: &'static str,
    pub analyzing: bool,
    pub analysis: Option<ContractAnalysis>,
    /// 대체 분석이면 그 원인
    pub degraded: Option<DegradeCause>,
}

pub struct App {
    profile: Profile,
    view: View,
    load: LoadState,
    ledger: BidLedger,
    identity: Option<HostUser>,
    generation: Arc<AtomicU64>,
    countdown: Option<CountdownHandle>,
    uploaded_image: Option<String>,
    analyzing: bool,
    analysis: Option<Provided<ContractAnalysis>>,
}

impl App {
    pub fn new(profile: Profile) -> Self {
        Self {
            profile,
            view: View::Auction,
            load: LoadState::Loading,
            ledger: BidLedger::with_demo_history(Utc::now()),
            identity: None,
            generation: Arc::new(AtomicU64::new(0)),
            countdown: None,
            uploaded_image: None,
            analyzing: false,
            analysis: None,
        }
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load
    }

    pub fn identity(&self) -> Option<&HostUser> {
        self.identity.as_ref()
    }

    pub fn ledger(&self) -> &BidLedger {
        &self.ledger
    }

    /// 사용자 화면 전환. 프로필에 없는 화면만 거절한다.
    pub fn switch_view(&mut self, view: View) -> Result<(), UnsupportedView> {
        if !self.profile.views().contains(&view) {
            return Err(UnsupportedView {
                view,
                profile: self.profile,
            });
        }
        self.view = view;
        Ok(())
    }

    // region:    --- Lifecycle
    pub fn begin_load(&mut self) -> LoadTicket {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.load = LoadState::Loading;
        self.countdown = None;
        LoadTicket(generation)
    }

    /// 로드 결과 반영. 그 사이 언마운트/재마운트됐으면 버리고 `false`.
    ///
    /// 성공 시 카운트다운을 시작하므로 tokio 런타임 안에서 호출해야 한다.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<AuctionItem, LoadError>,
    ) -> bool {
        if self.generation.load(Ordering::SeqCst) != ticket.0 {
            warn!("{:<12} --> 오래된 로드 결과 무시 (세대 {})", "App", ticket.0);
            return false;
        }
        match result {
            Ok(item) => {
                info!("{:<12} --> 오늘의 아이템: {}", "App", item.name);
                self.countdown = Some(Countdown::until(item.ends_at).spawn());
                self.load = LoadState::Ready(item);
            }
            Err(e) => {
                error!("{:<12} --> 아이템 로드 실패: {}", "App", e);
                self.load = LoadState::Failed(self.profile.load_error_message().to_string());
            }
        }
        true
    }

    /// 마운트: 오늘의 아이템을 한 번 로드한다. 재시도는 없다.
    pub async fn mount(&mut self, source: &dyn DailyItemSource) {
        let ticket = self.begin_load();
        let result = source.load_daily_item().await;
        self.finish_load(ticket, result);
    }

    /// 언마운트: 진행 중인 로드와 ready 신호를 무효화하고 카운트다운을 멈춘다.
    pub fn unmount(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.countdown = None;
    }

    /// 호스트에서 사용자 정보를 가져온다. 실패는 기록만 한다.
    pub async fn authenticate(&mut self, host: &dyn HostShell) {
        match host.user_context().await {
            Ok(Some(user)) => {
                info!("{:<12} --> 호스트 사용자 fid={}", "App", user.fid);
                self.identity = Some(user);
            }
            Ok(None) => debug!("{:<12} --> 호스트 사용자 없음", "App"),
            Err(e) => error!("{:<12} --> 호스트 컨텍스트 조회 실패: {}", "App", e),
        }
    }

    /// 로드가 끝났을 때만 ready 신호를 만든다.
    pub fn ready_signal(&self) -> Option<ReadySignal> {
        if self.load == LoadState::Loading {
            return None;
        }
        Some(ReadySignal {
            generation: Arc::clone(&self.generation),
            expected: self.generation.load(Ordering::SeqCst),
        })
    }
    // endregion: --- Lifecycle

    // region:    --- Bidding
    fn starting_price(&self) -> Decimal {
        match &self.load {
            LoadState::Ready(item) => item.starting_price,
            _ => Decimal::ZERO,
        }
    }

    pub fn top_bid(&self) -> Decimal {
        self.ledger.top_bid(self.starting_price())
    }

    pub fn next_bid(&self) -> Decimal {
        self.ledger
            .next_bid(self.starting_price(), self.profile.bid_increment())
    }

    /// 입찰 버튼: 현재 최고 입찰 + 증가폭
    pub fn place_next_bid(&mut self) -> Bid {
        let amount = self.next_bid();
        self.place_bid(amount)
    }

    /// 금액 검증 없이 장부에 기록한다.
    pub fn place_bid(&mut self, amount: Decimal) -> Bid {
        let bidder = self.identity.as_ref().and_then(|u| u.username.as_deref());
        self.ledger.place_bid(amount, bidder)
    }
    // endregion: --- Bidding

    // region:    --- Contract
    /// 분석 시작 표시. 이전 결과는 지운다.
    pub fn begin_analysis(&mut self) {
        self.analyzing = true;
        self.analysis = None;
    }

    pub fn finish_analysis(&mut self, analysis: Provided<ContractAnalysis>) {
        if let Some(cause) = analysis.cause() {
            warn!("{:<12} --> 대체 분석 표시: {:?}", "App", cause);
        }
        self.analyzing = false;
        self.analysis = Some(analysis);
    }

    /// 고정 컨트랙트 감사 요청 (버튼 한 번에 한 번)
    pub async fn analyze_contract(&mut self, analyzer: &dyn ContractAnalyzer) {
        self.begin_analysis();
        let analysis = analyzer.analyze(DAILY_AUCTION_CONTRACT).await;
        self.finish_analysis(analysis);
    }

    pub fn is_analyzing(&self) -> bool {
        self.analyzing
    }

    pub fn analysis(&self) -> Option<&Provided<ContractAnalysis>> {
        self.analysis.as_ref()
    }
    // endregion: --- Contract

    // region:    --- Upload
    /// 경매에 올릴 이미지 선택 (URL 또는 data URL)
    pub fn select_image(&mut self, image_url: impl Into<String>) {
        self.uploaded_image = Some(image_url.into());
    }

    pub fn clear_image(&mut self) {
        self.uploaded_image = None;
    }

    /// 호스트 사용자 기준 생성자 ID. 사용자가 없으면 익명.
    fn creator_id(&self) -> String {
        match &self.identity {
            Some(user) => format!("fid:{}", user.fid),
            None => ANONYMOUS_CREATOR.to_string(),
        }
    }

    /// 선택한 이미지로 백엔드에 경매 생성. 이미지가 없으면 `None`.
    pub async fn start_auction(
        &mut self,
        api: &AuctionApi,
    ) -> Result<Option<Auction>, ClientError> {
        let Some(image_url) = self.uploaded_image.clone() else {
            return Ok(None);
        };
        let auction = api
            .create_auction(&CreateAuctionCommand {
                image_url,
                creator_id: self.creator_id(),
                duration_hours: None,
            })
            .await?;
        info!("{:<12} --> 경매 생성 id: {}", "App", auction.id);
        self.uploaded_image = None;
        Ok(Some(auction))
    }
    // endregion: --- Upload

    pub fn snapshot(&self) -> ViewModel {
        let (loading_message, error, item) = match &self.load {
            LoadState::Loading => (Some(self.profile.loading_message()), None, None),
            LoadState::Failed(banner) => (None, Some(banner.clone()), None),
            LoadState::Ready(item) => (None, None, Some(item.clone())),
        };
        ViewModel {
            profile: self.profile,
            view: self.view,
            views: self.profile.views().to_vec(),
            loading_message,
            error,
            item,
            currency: self.profile.currency(),
            top_bid: self.top_bid(),
            next_bid: self.next_bid(),
            bids: self.ledger.bids().cloned().collect(),
            remaining: self.countdown.as_ref().map(|c| c.current().to_string()),
            user: self.identity.clone(),
            uploaded_image: self.uploaded_image.clone(),
            contract: ContractPanel {
                source: DAILY_AUCTION_CONTRACT,
                analyzing: self.analyzing,
                analysis: self.analysis.as_ref().map(|a| a.value().clone()),
                degraded: self.analysis.as_ref().and_then(|a| a.cause().cloned()),
            },
        }
    }
}
// endregion: --- App State

// region:    --- Ready Signal
/// 호스트 ready 신호. 만든 뒤 앱이 언마운트되면 호출하지 않는다.
pub struct ReadySignal {
    generation: Arc<AtomicU64>,
    expected: u64,
}

impl ReadySignal {
    /// ready 를 호출했으면 `true`. 실패는 기록만 한다.
    pub async fn fire(self, host: &dyn HostShell) -> bool {
        let generation = self.generation;
        let expected = self.expected;
        match signal_ready(host, || generation.load(Ordering::SeqCst) == expected).await {
            Ok(true) => {
                debug!("{:<12} --> 호스트 ready 호출", "App");
                true
            }
            Ok(false) => {
                debug!("{:<12} --> 언마운트되어 ready 생략", "App");
                false
            }
            Err(e) => {
                warn!("{:<12} --> 호스트 ready 실패: {}", "App", e);
                false
            }
        }
    }
}
// endregion: --- Ready Signal
