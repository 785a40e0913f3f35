// region:    --- Imports
use super::{DegradeCause, Provided};
use crate::genai::GenerativeModel;
use async_trait::async_trait;
use chrono::{DateTime, Days, Duration, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, warn};

// endregion: --- Imports

// region:    --- Model
/// 오늘의 경매 아이템
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionItem {
    pub id: String,
    pub name: String,
    pub description: String,
    pub lore: String,
    pub starting_price: Decimal,
    pub image_url: String,
    pub ends_at: DateTime<Utc>,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    #[serde(rename = "trait")]
    pub trait_name: String,
    pub value: String,
}

impl Attribute {
    fn new(trait_name: &str, value: &str) -> Self {
        Self {
            trait_name: trait_name.to_string(),
            value: value.to_string(),
        }
    }
}
// endregion: --- Model

pub const PLACEHOLDER_IMAGE_URL: &str = "https://picsum.photos/800/800";

const ITEM_PROMPT: &str = "Create a unique, high-value, sci-fi or fantasy artifact for a daily auction. It should sound legendary and expensive.";

// region:    --- Item Provider Trait
/// 경매 아이템 제공자 트레이트
#[async_trait]
pub trait ItemProvider: Send + Sync {
    async fn fetch_daily_item(&self) -> Provided<AuctionItem>;
}
// endregion: --- Item Provider Trait

/// 다음 UTC 자정. 같은 날 안에서는 항상 같은 값이고 `now` 보다 항상 뒤다.
pub fn next_utc_midnight(now: DateTime<Utc>) -> DateTime<Utc> {
    let tomorrow = now.date_naive() + Days::new(1);
    tomorrow.and_time(NaiveTime::MIN).and_utc()
}

fn chronos_dial(id: &str, now: DateTime<Utc>) -> AuctionItem {
    AuctionItem {
        id: id.to_string(),
        name: "Chronos Dial".to_string(),
        description: "A device said to turn back time by 5 seconds.".to_string(),
        lore: "Forged in the fires of a dying star, the Chronos Dial was used by the Time Keepers to prevent minor inconveniences. It hums with a low frequency.".to_string(),
        starting_price: Decimal::new(5, 1),
        image_url: PLACEHOLDER_IMAGE_URL.to_string(),
        ends_at: next_utc_midnight(now),
        attributes: vec![
            Attribute::new("Material", "Stardust"),
            Attribute::new("Era", "Pre-Void"),
        ],
    }
}

/// 생성 실패/키 없음 시 대체 아이템
pub fn mock_item(now: DateTime<Utc>) -> AuctionItem {
    chronos_dial("mock-1", now)
}

/// 정적 프로필 아이템
pub fn static_item(now: DateTime<Utc>) -> AuctionItem {
    chronos_dial("static-1", now)
}

// region:    --- Static Item Provider
/// 정적 아이템 제공자 (미니앱 프로필)
#[derive(Debug, Default, Clone)]
pub struct StaticItemProvider;

#[async_trait]
impl ItemProvider for StaticItemProvider {
    async fn fetch_daily_item(&self) -> Provided<AuctionItem> {
        Provided::Fresh(static_item(Utc::now()))
    }
}
// endregion: --- Static Item Provider

// region:    --- Generative Item Provider
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneratedItem {
    name: String,
    description: String,
    lore: String,
    starting_price: Decimal,
    #[serde(default)]
    visual_prompt: String,
    #[serde(default)]
    attributes: Vec<Attribute>,
}

fn item_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "name": { "type": "STRING", "description": "The name of the artifact" },
            "description": { "type": "STRING", "description": "A short catchy description (max 100 chars)" },
            "lore": { "type": "STRING", "description": "A paragraph of lore explaining its origin and power" },
            "startingPrice": { "type": "NUMBER", "description": "Starting price in ETH (0.1 to 5.0)" },
            "visualPrompt": { "type": "STRING", "description": "A highly detailed visual description for an image generator" },
            "attributes": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "trait": { "type": "STRING" },
                        "value": { "type": "STRING" }
                    }
                }
            }
        },
        "required": ["name", "description", "lore", "startingPrice", "visualPrompt", "attributes"]
    })
}

/// 생성형 AI 아이템 제공자 (쇼케이스 프로필)
pub struct GenerativeItemProvider {
    model: Option<Arc<dyn GenerativeModel>>,
}

impl GenerativeItemProvider {
    /// `model` 이 없으면 자격 증명 누락으로 간주한다.
    pub fn new(model: Option<Arc<dyn GenerativeModel>>) -> Self {
        Self { model }
    }

    /// 기준 시각을 받아 아이템 생성
    pub async fn fetch_at(&self, now: DateTime<Utc>) -> Provided<AuctionItem> {
        let Some(model) = &self.model else {
            warn!("{:<12} --> API 키 없음. 대체 아이템 반환", "ItemProvider");
            return Provided::degraded(mock_item(now), DegradeCause::MissingCredential);
        };

        let generated = match Self::generate_text(model.as_ref()).await {
            Ok(generated) => generated,
            Err(cause) => {
                error!("{:<12} --> 아이템 생성 실패: {}", "ItemProvider", cause);
                return Provided::degraded(mock_item(now), DegradeCause::Upstream(cause));
            }
        };

        let image_url = Self::generate_image_url(model.as_ref(), &generated).await;
        info!("{:<12} --> 아이템 생성 완료: {}", "ItemProvider", generated.name);

        Provided::Fresh(AuctionItem {
            id: now.timestamp_millis().to_string(),
            name: generated.name,
            description: generated.description,
            lore: generated.lore,
            starting_price: generated.starting_price,
            image_url,
            ends_at: now + Duration::hours(24),
            attributes: generated.attributes,
        })
    }

    async fn generate_text(model: &dyn GenerativeModel) -> Result<GeneratedItem, String> {
        let raw = model
            .generate_structured(ITEM_PROMPT, &item_schema())
            .await
            .map_err(|e| e.to_string())?;
        let generated: GeneratedItem =
            serde_json::from_str(&raw).map_err(|e| format!("unparsable item: {e}"))?;
        if generated.starting_price.is_sign_negative() {
            return Err(format!(
                "negative starting price: {}",
                generated.starting_price
            ));
        }
        Ok(generated)
    }

    /// 이미지 생성 실패는 저하로 보지 않고 자리표시 이미지를 쓴다.
    async fn generate_image_url(model: &dyn GenerativeModel, item: &GeneratedItem) -> String {
        let prompt = if item.visual_prompt.trim().is_empty() {
            format!(
                "A legendary artifact: {}, 8k resolution, cinematic lighting",
                item.name
            )
        } else {
            item.visual_prompt.clone()
        };

        match model.generate_image(&prompt).await {
            Ok(Some(image)) => format!("data:{};base64,{}", image.mime_type, image.data),
            Ok(None) => {
                warn!("{:<12} --> 이미지 응답 없음. 자리표시 이미지 사용", "ItemProvider");
                PLACEHOLDER_IMAGE_URL.to_string()
            }
            Err(e) => {
                error!("{:<12} --> 이미지 생성 실패: {}", "ItemProvider", e);
                PLACEHOLDER_IMAGE_URL.to_string()
            }
        }
    }
}

#[async_trait]
impl ItemProvider for GenerativeItemProvider {
    async fn fetch_daily_item(&self) -> Provided<AuctionItem> {
        self.fetch_at(Utc::now()).await
    }
}
// endregion: --- Generative Item Provider

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::genai::{GenAiError, InlineImage};
    use chrono::TimeZone;
    use std::sync::Mutex;

    /// 미리 정한 응답을 돌려주는 모델
    #[derive(Default)]
    pub(crate) struct ScriptedModel {
        pub text: Option<String>,
        pub image: Option<InlineImage>,
        pub image_fails: bool,
        pub prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl GenerativeModel for ScriptedModel {
        async fn generate_structured(
            &self,
            prompt: &str,
            _schema: &Value,
        ) -> Result<String, GenAiError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.text.clone().ok_or(GenAiError::Status {
                status: 403,
                body: "permission denied".to_string(),
            })
        }

        async fn generate_image(&self, prompt: &str) -> Result<Option<InlineImage>, GenAiError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            if self.image_fails {
                return Err(GenAiError::EmptyResponse);
            }
            Ok(self.image.clone())
        }
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
    }

    fn generated_json(visual_prompt: &str, price: f64) -> String {
        json!({
            "name": "Void Lantern",
            "description": "Light that casts shadows.",
            "lore": "Recovered from the last lighthouse of the void sea.",
            "startingPrice": price,
            "visualPrompt": visual_prompt,
            "attributes": [{ "trait": "Glow", "value": "Negative" }]
        })
        .to_string()
    }

    #[tokio::test]
    async fn missing_key_returns_identical_mock_all_day() {
        let provider = GenerativeItemProvider::new(None);
        let morning = Utc.with_ymd_and_hms(2026, 10, 16, 0, 0, 1).unwrap();
        let evening = Utc.with_ymd_and_hms(2026, 10, 16, 23, 59, 59).unwrap();

        let first = provider.fetch_at(morning).await;
        let second = provider.fetch_at(evening).await;

        assert_eq!(first.cause(), Some(&DegradeCause::MissingCredential));
        assert_eq!(first, second);
        assert_eq!(first.value().id, "mock-1");
        assert!(first.value().ends_at > evening);
    }

    #[test]
    fn next_midnight_is_strictly_later() {
        let midnight = Utc.with_ymd_and_hms(2026, 10, 16, 0, 0, 0).unwrap();
        assert_eq!(
            next_utc_midnight(midnight),
            Utc.with_ymd_and_hms(2026, 10, 17, 0, 0, 0).unwrap()
        );
        assert_eq!(next_utc_midnight(noon()), next_utc_midnight(midnight));
    }

    #[tokio::test]
    async fn generated_item_uses_inline_image() {
        let model = Arc::new(ScriptedModel {
            text: Some(generated_json("a lantern leaking darkness", 1.5)),
            image: Some(InlineImage {
                mime_type: "image/png".to_string(),
                data: "iVBORw0".to_string(),
            }),
            ..Default::default()
        });
        let provider = GenerativeItemProvider::new(Some(model.clone()));

        let item = provider.fetch_at(noon()).await;
        assert!(!item.is_degraded());
        let item = item.into_inner();
        assert_eq!(item.name, "Void Lantern");
        assert_eq!(item.starting_price, Decimal::new(15, 1));
        assert_eq!(item.image_url, "data:image/png;base64,iVBORw0");
        assert_eq!(item.ends_at, noon() + Duration::hours(24));
        assert_eq!(item.id, noon().timestamp_millis().to_string());
        assert_eq!(item.attributes, vec![Attribute::new("Glow", "Negative")]);

        let prompts = model.prompts.lock().unwrap();
        assert_eq!(prompts[1], "a lantern leaking darkness");
    }

    #[tokio::test]
    async fn image_failure_falls_back_to_placeholder() {
        let model = Arc::new(ScriptedModel {
            text: Some(generated_json("", 0.3)),
            image_fails: true,
            ..Default::default()
        });
        let provider = GenerativeItemProvider::new(Some(model.clone()));

        let item = provider.fetch_at(noon()).await;
        assert!(!item.is_degraded());
        assert_eq!(item.value().image_url, PLACEHOLDER_IMAGE_URL);

        let prompts = model.prompts.lock().unwrap();
        assert_eq!(
            prompts[1],
            "A legendary artifact: Void Lantern, 8k resolution, cinematic lighting"
        );
    }

    #[tokio::test]
    async fn text_failure_degrades_to_mock() {
        let provider = GenerativeItemProvider::new(Some(Arc::new(ScriptedModel::default())));
        let item = provider.fetch_at(noon()).await;
        assert!(matches!(item.cause(), Some(DegradeCause::Upstream(_))));
        assert_eq!(item.into_inner(), mock_item(noon()));
    }

    #[tokio::test]
    async fn garbage_or_negative_price_degrades() {
        for text in ["not json".to_string(), generated_json("x", -1.0)] {
            let provider = GenerativeItemProvider::new(Some(Arc::new(ScriptedModel {
                text: Some(text),
                ..Default::default()
            })));
            let item = provider.fetch_at(noon()).await;
            assert!(matches!(item.cause(), Some(DegradeCause::Upstream(_))));
        }
    }
}
