/// 환경 변수 설정
///
/// `.env` 가 있으면 먼저 읽는다. 값이 없으면 기본값을 쓴다.
// region:    --- Imports
use crate::genai::DEFAULT_BASE_URL;
use crate::presentation::Profile;
use std::time::Duration;
use thiserror::Error;

// endregion: --- Imports

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },

    #[error("DATABASE_URL must be set for the postgres store")]
    MissingDatabaseUrl,
}

/// 경매 저장소 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

/// 생성형 AI 설정. API 키가 없으면 `None` 으로 둔다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub text_model: String,
    pub image_model: String,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind_addr: String,
    pub store: StoreBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub profile: Profile,
    pub genai: Option<GenAiConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 임의의 조회 함수에서 설정 구성
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let database_url = var("DATABASE_URL");
        let store = match var("STORE_BACKEND").as_deref().map(str::trim) {
            None | Some("postgres") => StoreBackend::Postgres,
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "STORE_BACKEND",
                    value: other.to_string(),
                })
            }
        };
        if store == StoreBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::MissingDatabaseUrl);
        }

        let max_connections = match var("DB_MAX_CONNECTIONS") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "DB_MAX_CONNECTIONS",
                value: raw,
            })?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let profile = match var("APP_PROFILE") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "APP_PROFILE",
                value: raw,
            })?,
            None => Profile::Showcase,
        };

        let timeout = match var("GENAI_TIMEOUT_SECS") {
            Some(raw) => Some(Duration::from_secs(raw.trim().parse().map_err(|_| {
                ConfigError::Invalid {
                    name: "GENAI_TIMEOUT_SECS",
                    value: raw,
                }
            })?)),
            None => None,
        };

        let genai = var("GEMINI_API_KEY")
            .or_else(|| var("API_KEY"))
            .map(|api_key| GenAiConfig {
                api_key,
                base_url: var("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                text_model: var("GEMINI_TEXT_MODEL")
                    .unwrap_or_else(|| DEFAULT_TEXT_MODEL.to_string()),
                image_model: var("GEMINI_IMAGE_MODEL")
                    .unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
                timeout,
            });

        Ok(Self {
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            store,
            database_url,
            max_connections,
            profile,
            genai,
        })
    }
}
