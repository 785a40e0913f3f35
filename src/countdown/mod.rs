/// 경매 종료 카운트다운
///
/// 1초마다 남은 시간을 계산해 `watch` 채널로 내보낸다. 0 에 도달하면 멈추고,
/// 핸들이 drop 되면 작업도 중단된다.
// region:    --- Imports
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, Instant, MissedTickBehavior};
use tracing::debug;

// endregion: --- Imports

/// 남은 시간 (시는 24 로 나누지 않은 전체 시간)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
pub struct Remaining {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl Remaining {
    pub fn from_secs(total: u64) -> Self {
        Self {
            hours: total / 3600,
            minutes: (total % 3600) / 60,
            seconds: total % 60,
        }
    }

    pub fn total_secs(&self) -> u64 {
        self.hours * 3600 + self.minutes * 60 + self.seconds
    }

    pub fn is_zero(&self) -> bool {
        self.total_secs() == 0
    }
}

impl fmt::Display for Remaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hours, self.minutes, self.seconds
        )
    }
}

/// 기준 시각에서 목표 시각까지 남은 시간. 지났으면 0.
pub fn remaining_at(target: DateTime<Utc>, now: DateTime<Utc>) -> Remaining {
    let secs = (target - now).num_seconds().max(0) as u64;
    Remaining::from_secs(secs)
}

// region:    --- Countdown
pub struct Countdown {
    deadline: Instant,
}

impl Countdown {
    /// 벽시계 목표 시각 기준
    pub fn until(target: DateTime<Utc>) -> Self {
        let left = (target - Utc::now()).to_std().unwrap_or_default();
        Self::starting_in(left)
    }

    /// 지금부터 `left` 뒤
    pub fn starting_in(left: Duration) -> Self {
        Self {
            deadline: Instant::now() + left,
        }
    }

    fn remaining(&self) -> Remaining {
        let left = self.deadline.saturating_duration_since(Instant::now());
        Remaining::from_secs(left.as_secs())
    }

    /// 1초 간격 틱 시작
    pub fn spawn(self) -> CountdownHandle {
        let (tx, rx) = watch::channel(self.remaining());
        let task = tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(1));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if tx.is_closed() {
                    break;
                }
                let remaining = self.remaining();
                tx.send_if_modified(|current| {
                    if *current == remaining {
                        return false;
                    }
                    *current = remaining;
                    true
                });
                if remaining.is_zero() {
                    debug!("{:<12} --> 카운트다운 종료", "Countdown");
                    break;
                }
            }
        });
        CountdownHandle { rx, task }
    }
}

/// 카운트다운 핸들. drop 시 틱 작업을 중단한다.
pub struct CountdownHandle {
    rx: watch::Receiver<Remaining>,
    task: JoinHandle<()>,
}

impl CountdownHandle {
    pub fn current(&self) -> Remaining {
        *self.rx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Remaining> {
        self.rx.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for CountdownHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
// endregion: --- Countdown
