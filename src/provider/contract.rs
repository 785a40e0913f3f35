// region:    --- Imports
use super::{DegradeCause, Provided};
use crate::genai::GenerativeModel;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, warn};

// endregion: --- Imports

/// 화면에 보여주는 고정 컨트랙트. 배포되거나 실행되지 않는다.
pub const DAILY_AUCTION_CONTRACT: &str = r#"// SPDX-License-Identifier: MIT
pragma solidity ^0.8.20;

import "@openzeppelin/contracts/token/ERC721/ERC721.sol";
import "@openzeppelin/contracts/access/Ownable.sol";
import "@openzeppelin/contracts/utils/ReentrancyGuard.sol";

/**
 * @title DailyAuction
 * @dev A daily auction contract for Gemini-generated artifacts
 */
contract DailyAuction is ERC721, Ownable, ReentrancyGuard {
    uint256 public currentAuctionId;
    uint256 public auctionEndTime;
    uint256 public highestBid;
    address public highestBidder;
    bool public ended;

    event NewBid(address indexed bidder, uint256 amount);
    event AuctionEnded(address winner, uint256 amount);

    constructor() ERC721("DailyCastArtifact", "DCA") Ownable(msg.sender) {}

    function startAuction(uint256 _duration, uint256 _startingPrice) external onlyOwner {
        require(block.timestamp > auctionEndTime, "Current auction active");
        currentAuctionId++;
        auctionEndTime = block.timestamp + _duration;
        highestBid = _startingPrice;
        highestBidder = address(0);
        ended = false;
    }

    function bid() external payable nonReentrant {
        require(block.timestamp < auctionEndTime, "Auction ended");
        require(msg.value > highestBid, "Bid too low");

        if (highestBidder != address(0)) {
            // Refund previous bidder
            payable(highestBidder).transfer(highestBid);
        }

        highestBid = msg.value;
        highestBidder = msg.sender;
        emit NewBid(msg.sender, msg.value);
    }

    // ... Additional logic for settlement
}"#;

// region:    --- Model
/// 컨트랙트 분석 결과 (저장하지 않음)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractAnalysis {
    pub risk_score: u8,
    pub summary: String,
    pub functions: Vec<String>,
}

impl ContractAnalysis {
    fn new(risk_score: u8, summary: &str, functions: &[&str]) -> Self {
        Self {
            risk_score,
            summary: summary.to_string(),
            functions: functions.iter().map(|f| f.to_string()).collect(),
        }
    }

    /// 자격 증명이 없을 때의 모의 분석
    pub fn missing_credential() -> Self {
        Self::new(
            10,
            "API Key missing. Cannot analyze. (Mock Analysis: Safe)",
            &["startAuction", "bid", "withdraw"],
        )
    }

    /// 호출 실패 시의 분석
    pub fn failed() -> Self {
        Self::new(0, "Analysis failed due to API error.", &[])
    }

    /// 정적 프로필 분석
    pub fn static_analysis() -> Self {
        Self::new(
            5,
            "Static Analysis: Contract appears safe based on standard patterns.",
            &["startAuction", "bid", "withdraw", "endAuction"],
        )
    }
}
/// 컨트랙트 원문과 분석 결과
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractReport {
    pub source: String,
    pub analysis: ContractAnalysis,
}
// endregion: --- Model

// region:    --- Contract Analyzer Trait
#[async_trait]
pub trait ContractAnalyzer: Send + Sync {
    async fn analyze(&self, contract_text: &str) -> Provided<ContractAnalysis>;
}
// endregion: --- Contract Analyzer Trait

/// 정적 분석기 (미니앱 프로필)
#[derive(Debug, Default, Clone)]
pub struct StaticContractAnalyzer;

#[async_trait]
impl ContractAnalyzer for StaticContractAnalyzer {
    async fn analyze(&self, _contract_text: &str) -> Provided<ContractAnalysis> {
        Provided::Fresh(ContractAnalysis::static_analysis())
    }
}

// region:    --- Generative Contract Analyzer
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneratedAnalysis {
    risk_score: f64,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    functions: Vec<String>,
}

fn analysis_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "riskScore": { "type": "NUMBER" },
            "summary": { "type": "STRING" },
            "functions": { "type": "ARRAY", "items": { "type": "STRING" } }
        }
    })
}

fn analysis_prompt(contract_text: &str) -> String {
    format!(
        "Analyze this Solidity smart contract. Provide a risk score (0-100, where 100 is risky), a one-sentence summary, and a list of key function names.\n\nContract:\n{contract_text}"
    )
}

/// 생성형 AI 분석기 (쇼케이스 프로필)
pub struct GenerativeContractAnalyzer {
    model: Option<Arc<dyn GenerativeModel>>,
}

impl GenerativeContractAnalyzer {
    pub fn new(model: Option<Arc<dyn GenerativeModel>>) -> Self {
        Self { model }
    }

    async fn request(
        model: &dyn GenerativeModel,
        contract_text: &str,
    ) -> Result<ContractAnalysis, String> {
        let raw = model
            .generate_structured(&analysis_prompt(contract_text), &analysis_schema())
            .await
            .map_err(|e| e.to_string())?;
        let generated: GeneratedAnalysis =
            serde_json::from_str(&raw).map_err(|e| format!("unparsable analysis: {e}"))?;

        if !(0.0..=100.0).contains(&generated.risk_score) {
            return Err(format!("risk score out of range: {}", generated.risk_score));
        }
        Ok(ContractAnalysis {
            risk_score: generated.risk_score.round() as u8,
            summary: generated.summary,
            functions: generated.functions,
        })
    }
}

#[async_trait]
impl ContractAnalyzer for GenerativeContractAnalyzer {
    async fn analyze(&self, contract_text: &str) -> Provided<ContractAnalysis> {
        let Some(model) = &self.model else {
            warn!("{:<12} --> API 키 없음. 모의 분석 반환", "Analyzer");
            return Provided::degraded(
                ContractAnalysis::missing_credential(),
                DegradeCause::MissingCredential,
            );
        };

        match Self::request(model.as_ref(), contract_text).await {
            Ok(analysis) => {
                info!(
                    "{:<12} --> 분석 완료 riskScore={}",
                    "Analyzer", analysis.risk_score
                );
                Provided::Fresh(analysis)
            }
            Err(cause) => {
                error!("{:<12} --> 분석 실패: {}", "Analyzer", cause);
                Provided::degraded(ContractAnalysis::failed(), DegradeCause::Upstream(cause))
            }
        }
    }
}
// endregion: --- Generative Contract Analyzer

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::item::tests::ScriptedModel;

    fn analyzer(text: Option<&str>) -> (Arc<ScriptedModel>, GenerativeContractAnalyzer) {
        let model = Arc::new(ScriptedModel {
            text: text.map(str::to_string),
            ..Default::default()
        });
        let analyzer = GenerativeContractAnalyzer::new(Some(model.clone()));
        (model, analyzer)
    }

    #[tokio::test]
    async fn degraded_outputs_are_distinguishable() {
        let missing = GenerativeContractAnalyzer::new(None)
            .analyze(DAILY_AUCTION_CONTRACT)
            .await;
        let (_, failing) = analyzer(None);
        let failed = failing.analyze(DAILY_AUCTION_CONTRACT).await;

        assert_eq!(missing.cause(), Some(&DegradeCause::MissingCredential));
        assert_eq!(missing.value().risk_score, 10);
        assert!(matches!(failed.cause(), Some(DegradeCause::Upstream(_))));
        assert_eq!(failed.value(), &ContractAnalysis::failed());
        assert_ne!(missing.value(), failed.value());
    }

    #[tokio::test]
    async fn analysis_is_parsed_and_prompt_embeds_contract() {
        let (model, analyzer) = analyzer(Some(
            r#"{"riskScore": 35, "summary": "Refund via transfer may fail.", "functions": ["startAuction", "bid"]}"#,
        ));
        let result = analyzer.analyze(DAILY_AUCTION_CONTRACT).await;

        assert_eq!(
            result,
            Provided::Fresh(ContractAnalysis {
                risk_score: 35,
                summary: "Refund via transfer may fail.".to_string(),
                functions: vec!["startAuction".to_string(), "bid".to_string()],
            })
        );
        assert!(model.prompts.lock().unwrap()[0].ends_with(DAILY_AUCTION_CONTRACT));
    }

    #[tokio::test]
    async fn out_of_range_score_counts_as_failure() {
        let (_, analyzer) = analyzer(Some(
            r#"{"riskScore": 250, "summary": "?", "functions": []}"#,
        ));
        let result = analyzer.analyze(DAILY_AUCTION_CONTRACT).await;
        assert_eq!(result.value(), &ContractAnalysis::failed());
    }

    #[tokio::test]
    async fn static_analyzer_is_fresh() {
        let result = StaticContractAnalyzer.analyze("anything").await;
        assert!(!result.is_degraded());
        assert_eq!(result.value().functions.len(), 4);
    }
}
