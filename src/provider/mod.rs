//! 경매 아이템/컨트랙트 분석 제공자
//!
//! 제공자는 호출자에게 오류를 전파하지 않는다. 자격 증명이 없거나 상위 호출이 실패하면
//! 고정된 대체 값을 `Provided::Degraded` 로 돌려준다.

pub mod contract;
pub mod item;

use serde::Serialize;

/// 저하 원인
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum DegradeCause {
    /// API 키 미설정
    MissingCredential,
    /// 생성형 AI 호출 실패
    Upstream(String),
}

/// 제공 결과
#[derive(Debug, Clone, PartialEq)]
pub enum Provided<T> {
    Fresh(T),
    Degraded { value: T, cause: DegradeCause },
}

impl<T> Provided<T> {
    pub fn degraded(value: T, cause: DegradeCause) -> Self {
        Self::Degraded { value, cause }
    }

    pub fn value(&self) -> &T {
        match self {
            Self::Fresh(value) | Self::Degraded { value, .. } => value,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Self::Fresh(value) | Self::Degraded { value, .. } => value,
        }
    }

    pub fn cause(&self) -> Option<&DegradeCause> {
        match self {
            Self::Fresh(_) => None,
            Self::Degraded { cause, .. } => Some(cause),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.cause().is_some()
    }
}
