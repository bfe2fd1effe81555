//! The recruiting dossier produced by one analysis run.
//!
//! Field names are the wire contract with the presentation layer: every key
//! here is bound by name, so none may be renamed. Fields outside the required
//! core may be legitimately absent and are omitted again on serialization.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A 0–100 score as emitted by the model.
///
/// Integral values serialize as JSON integers so `85` round-trips as `85`, not `85.0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct Score(f64);

impl Score {
    pub const fn new(value: f64) -> Self {
        Self(value)
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Rescales probability-style fractions in the open interval (0, 1) to
    /// percentages, rounded to the nearest integer. Every other value,
    /// including exactly 0 and 1, is left untouched.
    pub fn normalized(self) -> Self {
        if self.0 > 0.0 && self.0 < 1.0 {
            Self((self.0 * 100.0).round())
        } else {
            self
        }
    }

    fn normalize_in_place(&mut self) {
        *self = self.normalized();
    }
}

impl Serialize for Score {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = self.0;
        if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
            serializer.serialize_i64(value as i64)
        } else {
            serializer.serialize_f64(value)
        }
    }
}

impl<'de> Deserialize<'de> for Score {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        f64::deserialize(deserializer).map(Score)
    }
}

/// Final hiring recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    Hire,
    #[serde(rename = "No Hire")]
    NoHire,
    Waitlist,
    #[serde(rename = "Potential Hire")]
    PotentialHire,
    #[serde(rename = "Partial Fit")]
    PartialFit,
}

impl Recommendation {
    pub const ALL: [&'static str; 5] = ["Hire", "No Hire", "Waitlist", "Potential Hire", "Partial Fit"];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
}

impl Severity {
    pub const ALL: [&'static str; 2] = ["high", "medium"];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionCategory {
    Technical,
    Integrity,
    Behavioral,
}

impl QuestionCategory {
    pub const ALL: [&'static str; 3] = ["technical", "integrity", "behavioral"];
}

/// Per-dimension breakdown, each 0–100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scorecard {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technical: Option<Score>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience: Option<Score>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Score>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<Score>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stability: Option<Score>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integrity: Option<Score>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoftSkill {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<Score>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A strength or a weakness. `impact_or_mitigation` is the impact for a
/// strength and the remediation for a weakness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategicPoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact_or_mitigation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityFlags {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_saudi: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transferable_iqama: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rare_skills: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iqama_expired: Option<bool>,
}

/// A chronological or factual inconsistency between what was entered and what the CV says.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discrepancy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_input: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cv_detected: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cv_snippet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewQuestion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_answer_hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<QuestionCategory>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryBenchmark {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_salary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison_with_expected: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternativeRole {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<Score>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Validated analysis output. Owned by the caller; nothing is shared across runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub match_score: Score,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scorecard: Option<Scorecard>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_fit: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suitability_label: Option<String>,
    pub merit_judgment: String,
    pub operational_risk: Score,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_final_recommendation: Option<Recommendation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation_why: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soft_skills: Option<Vec<SoftSkill>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strengths: Option<Vec<StrategicPoint>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weaknesses: Option<Vec<StrategicPoint>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority_flags: Option<PriorityFlags>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_joining_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discrepancies: Option<Vec<Discrepancy>>,
    pub interview_guide: Vec<InterviewQuestion>,
    pub salary_benchmark: SalaryBenchmark,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternatives: Option<Vec<AlternativeRole>>,
}

impl AnalysisResult {
    /// Applies the fraction-to-percentage rule to every 0–100 score field.
    pub fn normalize_scores(&mut self) {
        self.match_score.normalize_in_place();
        self.operational_risk.normalize_in_place();

        if let Some(card) = &mut self.scorecard {
            for score in [
                &mut card.technical,
                &mut card.experience,
                &mut card.location,
                &mut card.cost,
                &mut card.stability,
                &mut card.integrity,
            ]
            .into_iter()
            .flatten()
            {
                score.normalize_in_place();
            }
        }

        for skill in self.soft_skills.iter_mut().flatten() {
            if let Some(score) = &mut skill.score {
                score.normalize_in_place();
            }
        }

        for alternative in self.alternatives.iter_mut().flatten() {
            if let Some(score) = &mut alternative.score {
                score.normalize_in_place();
            }
        }
    }
}
