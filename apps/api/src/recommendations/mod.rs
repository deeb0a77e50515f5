//! Recommendation Gateway: prompt building, generation and response parsing.
//!
//! Every operation degrades to a fixed fallback payload when the generator
//! fails or its output cannot be parsed. Callers never see an error; they can
//! check `GatewayReply::used_fallback` when persistence should be skipped.

pub mod prompts;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::llm_client::{strip_json_fences, TextGenerator};
use crate::scoring::aggregate::AggregateProfile;
use crate::scoring::traits::{Trait, TraitMap};
use prompts::{
    CLASS_RECOMMENDATION_TEMPLATE, FINDINGS_MARKER, KEY_FINDINGS_TEMPLATE,
    RECOMMENDATIONS_MARKER, STUDENT_MARKER, STUDENT_RECOMMENDATION_TEMPLATE, TEACHER_MARKER,
    TRAIT_INSIGHTS_TEMPLATE, TRAIT_INTERVENTION_TEMPLATE,
};

const SHORT_REPLY_TOKENS: u32 = 300;
const FINDINGS_REPLY_TOKENS: u32 = 500;

const NO_TEACHER_STRATEGY: &str = "No teacher strategy provided.";
const NO_RECOMMENDATION: &str = "No recommendation provided.";

const FALLBACK_STUDENT: &str = "Error generating student recommendation.";
const FALLBACK_TEACHER: &str = "Error generating teacher strategy.";
const FALLBACK_INTERPRETATION: &str = "Error generating interpretation.";
const FALLBACK_TRAIT_RECOMMENDATION: &str = "Error generating recommendation.";
const FALLBACK_INTERVENTION: &str = "Failed to generate teaching recommendation.";
const FALLBACK_FINDINGS: &str = "Error generating key findings.";
const FALLBACK_RECOMMENDATIONS: &str = "Error generating recommendations.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub student: String,
    pub teacher: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitInsight {
    #[serde(default)]
    pub interpretation: String,
    #[serde(default)]
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyFindings {
    pub key_findings: Vec<String>,
    pub recommendations: Vec<String>,
}

/// A gateway payload, flagged when it is the fixed fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayReply<T> {
    pub payload: T,
    pub used_fallback: bool,
}

impl<T> GatewayReply<T> {
    fn generated(payload: T) -> Self {
        Self {
            payload,
            used_fallback: false,
        }
    }

    fn fallback(payload: T) -> Self {
        Self {
            payload,
            used_fallback: true,
        }
    }
}

#[derive(Deserialize)]
struct InterventionReply {
    recommendation: Option<String>,
}

#[derive(Clone)]
pub struct RecommendationGateway {
    generator: Arc<dyn TextGenerator>,
}

impl RecommendationGateway {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Learning recommendation and teaching strategy for one student's dominant trait label.
    pub async fn student_recommendation(&self, trait_label: &str) -> GatewayReply<Recommendation> {
        self.marker_recommendation(STUDENT_RECOMMENDATION_TEMPLATE, trait_label)
            .await
    }

    /// Same shape as `student_recommendation`, phrased for a whole class.
    pub async fn class_recommendation(&self, trait_label: &str) -> GatewayReply<Recommendation> {
        self.marker_recommendation(CLASS_RECOMMENDATION_TEMPLATE, trait_label)
            .await
    }

    async fn marker_recommendation(
        &self,
        template: &str,
        trait_label: &str,
    ) -> GatewayReply<Recommendation> {
        let prompt = template.replace("{trait}", trait_label);
        match self.generator.generate(&prompt, SHORT_REPLY_TOKENS).await {
            Ok(text) => GatewayReply::generated(split_recommendation(&text)),
            Err(e) => {
                warn!("Recommendation generation failed for '{trait_label}': {e}");
                GatewayReply::fallback(Recommendation {
                    student: FALLBACK_STUDENT.to_string(),
                    teacher: FALLBACK_TEACHER.to_string(),
                })
            }
        }
    }

    /// One interpretation and one teaching recommendation per trait, keyed by trait name.
    /// A reply naming no known trait is treated as a failure; traits it omits get
    /// the fallback texts.
    pub async fn trait_insights(&self, scores: &TraitMap<u32>) -> GatewayReply<TraitMap<TraitInsight>> {
        let scores_json = serde_json::to_string(scores).unwrap_or_default();
        let prompt = TRAIT_INSIGHTS_TEMPLATE.replace("{scores}", &scores_json);

        let parsed = match self.generator.generate(&prompt, SHORT_REPLY_TOKENS).await {
            Ok(text) => serde_json::from_str::<BTreeMap<String, TraitInsight>>(strip_json_fences(
                &text,
            ))
            .map_err(|e| e.to_string())
            .and_then(|raw| {
                known_trait_insights(raw).ok_or_else(|| "no known trait in reply".to_string())
            }),
            Err(e) => Err(e.to_string()),
        };

        match parsed {
            Ok(insights) => GatewayReply::generated(insights),
            Err(e) => {
                warn!("Trait insight generation failed: {e}");
                GatewayReply::fallback(TraitMap::from_fn(|_| fallback_insight()))
            }
        }
    }

    /// Classroom strategy for students dominant in `trait_name`.
    pub async fn trait_intervention(&self, trait_name: &str) -> GatewayReply<String> {
        let prompt = TRAIT_INTERVENTION_TEMPLATE.replace("{trait}", trait_name);
        let parsed = match self.generator.generate(&prompt, SHORT_REPLY_TOKENS).await {
            Ok(text) => serde_json::from_str::<InterventionReply>(strip_json_fences(&text))
                .map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        match parsed {
            Ok(reply) => GatewayReply::generated(
                reply
                    .recommendation
                    .unwrap_or_else(|| NO_RECOMMENDATION.to_string()),
            ),
            Err(e) => {
                warn!("Trait intervention generation failed for '{trait_name}': {e}");
                GatewayReply::fallback(FALLBACK_INTERVENTION.to_string())
            }
        }
    }

    /// Key findings and teaching recommendations for a class profile.
    pub async fn key_findings(&self, profile: &AggregateProfile) -> GatewayReply<KeyFindings> {
        let averages = serde_json::to_string(&profile.mean_scores).unwrap_or_default();
        let prompt = KEY_FINDINGS_TEMPLATE
            .replace("{averages}", &averages)
            .replace("{most_common}", &profile.most_common.to_string())
            .replace("{highest}", &profile.dominant.to_string())
            .replace("{lowest}", &profile.lowest.to_string());

        let parsed = match self.generator.generate(&prompt, FINDINGS_REPLY_TOKENS).await {
            Ok(text) => split_findings(&text).ok_or_else(|| "no key findings in reply".to_string()),
            Err(e) => Err(e.to_string()),
        };

        match parsed {
            Ok(findings) => GatewayReply::generated(findings),
            Err(e) => {
                warn!("Key findings generation failed: {e}");
                GatewayReply::fallback(KeyFindings {
                    key_findings: vec![FALLBACK_FINDINGS.to_string()],
                    recommendations: vec![FALLBACK_RECOMMENDATIONS.to_string()],
                })
            }
        }
    }
}

fn fallback_insight() -> TraitInsight {
    TraitInsight {
        interpretation: FALLBACK_INTERPRETATION.to_string(),
        recommendation: FALLBACK_TRAIT_RECOMMENDATION.to_string(),
    }
}

/// `None` when no key names a known trait.
fn known_trait_insights(raw: BTreeMap<String, TraitInsight>) -> Option<TraitMap<TraitInsight>> {
    let mut found = TraitMap::<Option<TraitInsight>>::default();
    for (key, insight) in raw {
        match key.parse::<Trait>() {
            Ok(t) => found[t] = Some(insight),
            Err(e) => warn!("Ignoring trait insight: {e}"),
        }
    }
    if found.iter().all(|(_, insight)| insight.is_none()) {
        return None;
    }
    Some(found.map(|_, insight| insight.clone().unwrap_or_else(fallback_insight)))
}

fn split_recommendation(text: &str) -> Recommendation {
    let (student, teacher) = text.split_once(TEACHER_MARKER).unwrap_or((text, ""));
    let teacher = teacher.trim();
    Recommendation {
        student: student.replace(STUDENT_MARKER, "").trim().to_string(),
        teacher: if teacher.is_empty() {
            NO_TEACHER_STRATEGY.to_string()
        } else {
            teacher.to_string()
        },
    }
}

/// `None` when the findings section has no entries.
fn split_findings(text: &str) -> Option<KeyFindings> {
    let (findings, recommendations) = text
        .split_once(RECOMMENDATIONS_MARKER)
        .unwrap_or((text, ""));
    let key_findings = bullets(&findings.replace(FINDINGS_MARKER, ""));
    if key_findings.is_empty() {
        return None;
    }
    Some(KeyFindings {
        key_findings,
        recommendations: bullets(recommendations),
    })
}

fn bullets(section: &str) -> Vec<String> {
    section
        .lines()
        .map(|line| line.trim_matches(|c: char| c == '-' || c == '*' || c == '•' || c.is_whitespace()))
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
