//! 미니앱 호스트 경계
//!
//! 호스트 SDK 는 전역으로 가져오지 않고 `HostShell` 로 주입한다.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio::time::{sleep, timeout};

/// 폰트 로딩 대기 상한
pub const FONT_WAIT: Duration = Duration::from_millis(1000);
/// 폰트 로딩 API 가 없을 때 대기
pub const FALLBACK_PAUSE: Duration = Duration::from_millis(300);
/// 프레임 간격 근사값
const FRAME: Duration = Duration::from_millis(16);

/// 호스트가 제공하는 사용자
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostUser {
    pub username: Option<String>,
    pub pfp_url: Option<String>,
    pub fid: u64,
}

#[derive(Error, Debug)]
pub enum HostError {
    #[error("host context unavailable: {0}")]
    Context(String),

    #[error("ready hook failed: {0}")]
    Ready(String),
}

#[async_trait]
pub trait HostShell: Send + Sync {
    async fn user_context(&self) -> Result<Option<HostUser>, HostError>;

    fn supports_font_loading(&self) -> bool {
        false
    }

    async fn fonts_ready(&self) {}

    /// 다음 애니메이션 프레임 경계까지 대기
    async fn next_frame(&self);

    async fn ready(&self) -> Result<(), HostError>;
}

/// 호스트 없이 단독 실행
#[derive(Debug, Default, Clone)]
pub struct StandaloneHost;

#[async_trait]
impl HostShell for StandaloneHost {
    async fn user_context(&self) -> Result<Option<HostUser>, HostError> {
        Ok(None)
    }

    async fn next_frame(&self) {
        sleep(FRAME).await;
    }

    async fn ready(&self) -> Result<(), HostError> {
        Ok(())
    }
}

/// UI 안정화 후 호스트에 ready 를 알린다.
///
/// 폰트(최대 1초) 또는 300ms 대기, 프레임 경계 두 번을 지난 뒤 `still_wanted` 가 참일 때만 호출한다.
/// 호출했으면 `Ok(true)`.
pub async fn signal_ready<F>(host: &dyn HostShell, still_wanted: F) -> Result<bool, HostError>
where
    F: Fn() -> bool,
{
    if host.supports_font_loading() {
        let _ = timeout(FONT_WAIT, host.fonts_ready()).await;
    } else {
        sleep(FALLBACK_PAUSE).await;
    }

    host.next_frame().await;
    host.next_frame().await;

    if !still_wanted() {
        return Ok(false);
    }
    host.ready().await?;
    Ok(true)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// 호출 순서를 기록하는 호스트
    #[derive(Default)]
    pub(crate) struct RecordingHost {
        pub user: Option<HostUser>,
        pub fonts: Option<Duration>,
        pub context_fails: bool,
        pub ready_fails: bool,
        pub calls: Mutex<Vec<&'static str>>,
    }

    impl RecordingHost {
        pub fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: &'static str) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl HostShell for RecordingHost {
        async fn user_context(&self) -> Result<Option<HostUser>, HostError> {
            self.record("context");
            if self.context_fails {
                return Err(HostError::Context("sdk not injected".to_string()));
            }
            Ok(self.user.clone())
        }

        fn supports_font_loading(&self) -> bool {
            self.fonts.is_some()
        }

        async fn fonts_ready(&self) {
            if let Some(delay) = self.fonts {
                sleep(delay).await;
            }
            self.record("fonts");
        }

        async fn next_frame(&self) {
            sleep(FRAME).await;
            self.record("frame");
        }

        async fn ready(&self) -> Result<(), HostError> {
            self.record("ready");
            if self.ready_fails {
                return Err(HostError::Ready("host closed".to_string()));
            }
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_fonts_then_two_frames() {
        let host = RecordingHost {
            fonts: Some(Duration::from_millis(200)),
            ..Default::default()
        };
        assert!(signal_ready(&host, || true).await.unwrap());
        assert_eq!(host.calls(), vec!["fonts", "frame", "frame", "ready"]);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fonts_are_cut_off() {
        let host = RecordingHost {
            fonts: Some(Duration::from_secs(30)),
            ..Default::default()
        };
        let started = Instant::now();
        assert!(signal_ready(&host, || true).await.unwrap());
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(host.calls(), vec!["frame", "frame", "ready"]);
    }

    #[tokio::test(start_paused = true)]
    async fn no_font_api_pauses_instead() {
        let host = RecordingHost::default();
        let started = Instant::now();
        signal_ready(&host, || true).await.unwrap();
        assert!(started.elapsed() >= FALLBACK_PAUSE);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_signal_skips_ready() {
        let host = RecordingHost::default();
        assert!(!signal_ready(&host, || false).await.unwrap());
        assert!(!host.calls().contains(&"ready"));
    }
}
