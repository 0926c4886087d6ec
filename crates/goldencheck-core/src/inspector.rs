//! Qualitative trait heuristics.
//!
//! Templates list required traits by label. Known labels map to a
//! [`TraitKind`] with a keyword co-occurrence rule; any other label is
//! checked by plain case-insensitive containment of the label itself.
//! These are surface heuristics, not semantic checks.

use serde::{Deserialize, Serialize};

use crate::results::ratio;

/// Catalogue labels, as they appear in suite templates.
pub mod labels {
    pub const NO_MAGIC_NUMBERS: &str = "근거 없는 매직 넘버 금지";
    pub const IMPACT_METRICS: &str = "영향 지표(TTK/TTE/클리어율 등) 명시";
    pub const TELEMETRY_PROPOSAL: &str = "최소 1개 이상의 로그/텔레메트리 제안";
    pub const MODEL_RATIONALE: &str = "모델/파라미터 선택 이유 설명";
    pub const TABLE_OR_FORMULA: &str = "수치 제안은 표 또는 수식 포함";
    pub const CONTENT_ECONOMY_IMPACT: &str = "콘텐츠/경제 파급효과 점검";
    pub const CAUSE_REMEDY_MAPPING: &str = "원인-대응 매핑이 명확할 것";
    pub const TRADEOFF_TABLE: &str = "트레이드오프를 표로 비교할 것";
    pub const POST_PATCH_METRICS: &str = "패치 후 검증 지표 제시";
}

/// A required trait, resolved from its label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraitKind {
    /// Numbers come with a justification ("근거"/"기준").
    NoMagicNumbers,
    /// At least one impact metric (TTK, TTE, clear rate, ...) is named.
    ImpactMetrics,
    /// Logging or telemetry is proposed.
    TelemetryProposal,
    /// The choice of model/parameters is explained.
    ModelRationale,
    /// Numeric proposals come with a table or a formula.
    TableOrFormula,
    /// Knock-on effects on content or economy are considered.
    ContentEconomyImpact,
    /// Causes are mapped to remedies.
    CauseRemedyMapping,
    /// Trade-offs are compared in a table.
    TradeoffTable,
    /// Post-patch verification metrics are proposed.
    PostPatchMetrics,
    /// Any other label: the label must appear in the text.
    Literal(String),
}

impl TraitKind {
    pub fn from_label(label: &str) -> Self {
        match label {
            labels::NO_MAGIC_NUMBERS => TraitKind::NoMagicNumbers,
            labels::IMPACT_METRICS => TraitKind::ImpactMetrics,
            labels::TELEMETRY_PROPOSAL => TraitKind::TelemetryProposal,
            labels::MODEL_RATIONALE => TraitKind::ModelRationale,
            labels::TABLE_OR_FORMULA => TraitKind::TableOrFormula,
            labels::CONTENT_ECONOMY_IMPACT => TraitKind::ContentEconomyImpact,
            labels::CAUSE_REMEDY_MAPPING => TraitKind::CauseRemedyMapping,
            labels::TRADEOFF_TABLE => TraitKind::TradeoffTable,
            labels::POST_PATCH_METRICS => TraitKind::PostPatchMetrics,
            other => TraitKind::Literal(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            TraitKind::NoMagicNumbers => labels::NO_MAGIC_NUMBERS,
            TraitKind::ImpactMetrics => labels::IMPACT_METRICS,
            TraitKind::TelemetryProposal => labels::TELEMETRY_PROPOSAL,
            TraitKind::ModelRationale => labels::MODEL_RATIONALE,
            TraitKind::TableOrFormula => labels::TABLE_OR_FORMULA,
            TraitKind::ContentEconomyImpact => labels::CONTENT_ECONOMY_IMPACT,
            TraitKind::CauseRemedyMapping => labels::CAUSE_REMEDY_MAPPING,
            TraitKind::TradeoffTable => labels::TRADEOFF_TABLE,
            TraitKind::PostPatchMetrics => labels::POST_PATCH_METRICS,
            TraitKind::Literal(label) => label,
        }
    }

    /// Whether `text` exhibits this trait.
    pub fn is_satisfied_by(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        match self {
            TraitKind::NoMagicNumbers => {
                contains_any(&lower, &["근거", "기준"])
                    && contains_any(&lower, &["매직 넘버", "파라미터", "수치"])
            }
            TraitKind::ImpactMetrics => {
                contains_any(&lower, &["ttk", "tte", "클리어율", "승률", "레벨업 시간"])
            }
            TraitKind::TelemetryProposal => {
                contains_any(&lower, &["로그", "텔레메트리", "telemetry", "모니터링"])
            }
            TraitKind::ModelRationale => {
                contains_any(&lower, &["모델", "파라미터"])
                    && contains_any(&lower, &["이유", "근거", "선택"])
            }
            TraitKind::TableOrFormula => {
                text.contains('|') || text.contains('$') || text.contains('=')
            }
            TraitKind::ContentEconomyImpact => {
                contains_any(&lower, &["콘텐츠", "경제", "파급", "영향"])
            }
            TraitKind::CauseRemedyMapping => contains_any(&lower, &["원인", "대응", "해결 방안"]),
            TraitKind::TradeoffTable => lower.contains("트레이드오프") && text.contains('|'),
            TraitKind::PostPatchMetrics => {
                contains_any(&lower, &["검증", "지표"])
                    && contains_any(&lower, &["로그", "ttk", "tte", "클리어율"])
            }
            TraitKind::Literal(label) => lower.contains(&label.to_lowercase()),
        }
    }
}

fn contains_any(lower_text: &str, needles: &[&str]) -> bool {
    needles
        .iter()
        .any(|needle| lower_text.contains(&needle.to_lowercase()))
}

/// Result of checking a response against a list of required traits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitOutcome {
    /// Fraction of traits matched (1.0 when none are required).
    pub score: f64,
    /// Labels of the traits that were not matched, in template order.
    pub missing: Vec<String>,
}

/// Check `text` against every required trait label.
pub fn inspect_traits(text: &str, traits: &[String]) -> TraitOutcome {
    let missing: Vec<String> = traits
        .iter()
        .filter(|label| !TraitKind::from_label(label).is_satisfied_by(text))
        .cloned()
        .collect();
    TraitOutcome {
        score: ratio(traits.len() - missing.len(), traits.len()),
        missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip_through_kinds() {
        for label in [
            labels::NO_MAGIC_NUMBERS,
            labels::IMPACT_METRICS,
            labels::TRADEOFF_TABLE,
            labels::POST_PATCH_METRICS,
        ] {
            assert_eq!(TraitKind::from_label(label).label(), label);
        }
        assert_eq!(
            TraitKind::from_label("custom"),
            TraitKind::Literal("custom".into())
        );
    }

    #[test]
    fn impact_metrics_are_case_insensitive() {
        assert!(TraitKind::ImpactMetrics.is_satisfied_by("Expected TTK: 12s"));
        assert!(!TraitKind::ImpactMetrics.is_satisfied_by("no metrics"));
    }

    #[test]
    fn magic_numbers_need_justification_and_parameter() {
        assert!(TraitKind::NoMagicNumbers.is_satisfied_by("이 수치의 근거는 로그입니다"));
        assert!(!TraitKind::NoMagicNumbers.is_satisfied_by("수치만 있음"));
    }

    #[test]
    fn tradeoff_table_requires_term_and_pipe() {
        assert!(TraitKind::TradeoffTable.is_satisfied_by("트레이드오프\n| a | b |"));
        assert!(!TraitKind::TradeoffTable.is_satisfied_by("트레이드오프 without a table"));
        assert!(!TraitKind::TradeoffTable.is_satisfied_by("| a | b |"));
    }

    #[test]
    fn unknown_labels_use_containment() {
        let traits = vec!["Mentions Balance".to_string()];
        let outcome = inspect_traits("we care about mentions balance here", &traits);
        assert_eq!(outcome.score, 1.0);
        assert!(outcome.missing.is_empty());
    }

    #[test]
    fn outcome_reports_fraction_and_missing() {
        let traits = vec![
            labels::IMPACT_METRICS.to_string(),
            labels::TELEMETRY_PROPOSAL.to_string(),
        ];
        let outcome = inspect_traits("TTE goes up", &traits);
        assert_eq!(outcome.score, 0.5);
        assert_eq!(outcome.missing, vec![labels::TELEMETRY_PROPOSAL.to_string()]);
        assert_eq!(inspect_traits("anything", &[]).score, 1.0);
    }
}
