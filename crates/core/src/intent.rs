//! Base intents and ranked classification output
//!
//! `BaseIntent` is the closed, domain-agnostic set of analytical goals. Domain
//! configurations map these onto concrete endpoints; the classifier that
//! produces `RankedIntents` lives in the text processing crate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Abstract analytical goal inferred from query tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseIntent {
    DemographicAnalysis,
    CompetitiveAnalysis,
    StrategicAnalysis,
    ComparativeAnalysis,
    PerformanceRanking,
    DifferenceAnalysis,
    RelationshipAnalysis,
    TrendAnalysis,
    PredictionModeling,
    ClusteringSegmentation,
    AnomalyDetection,
    Optimization,
    GeneralExploration,
    ComprehensiveOverview,
}

impl BaseIntent {
    /// Every intent, in declaration order
    pub const ALL: [BaseIntent; 14] = [
        Self::DemographicAnalysis,
        Self::CompetitiveAnalysis,
        Self::StrategicAnalysis,
        Self::ComparativeAnalysis,
        Self::PerformanceRanking,
        Self::DifferenceAnalysis,
        Self::RelationshipAnalysis,
        Self::TrendAnalysis,
        Self::PredictionModeling,
        Self::ClusteringSegmentation,
        Self::AnomalyDetection,
        Self::Optimization,
        Self::GeneralExploration,
        Self::ComprehensiveOverview,
    ];

    /// Configuration name (snake_case)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DemographicAnalysis => "demographic_analysis",
            Self::CompetitiveAnalysis => "competitive_analysis",
            Self::StrategicAnalysis => "strategic_analysis",
            Self::ComparativeAnalysis => "comparative_analysis",
            Self::PerformanceRanking => "performance_ranking",
            Self::DifferenceAnalysis => "difference_analysis",
            Self::RelationshipAnalysis => "relationship_analysis",
            Self::TrendAnalysis => "trend_analysis",
            Self::PredictionModeling => "prediction_modeling",
            Self::ClusteringSegmentation => "clustering_segmentation",
            Self::AnomalyDetection => "anomaly_detection",
            Self::Optimization => "optimization",
            Self::GeneralExploration => "general_exploration",
            Self::ComprehensiveOverview => "comprehensive_overview",
        }
    }

    /// Human-readable label for reasoning traces
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::DemographicAnalysis => "Demographic Analysis",
            Self::CompetitiveAnalysis => "Competitive Analysis",
            Self::StrategicAnalysis => "Strategic Analysis",
            Self::ComparativeAnalysis => "Comparative Analysis",
            Self::PerformanceRanking => "Performance Ranking",
            Self::DifferenceAnalysis => "Difference Analysis",
            Self::RelationshipAnalysis => "Relationship Analysis",
            Self::TrendAnalysis => "Trend Analysis",
            Self::PredictionModeling => "Prediction Modeling",
            Self::ClusteringSegmentation => "Clustering & Segmentation",
            Self::AnomalyDetection => "Anomaly Detection",
            Self::Optimization => "Optimization",
            Self::GeneralExploration => "General Exploration",
            Self::ComprehensiveOverview => "Comprehensive Overview",
        }
    }
}

impl fmt::Display for BaseIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BaseIntent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .iter()
            .copied()
            .find(|intent| intent.as_str() == normalized)
            .ok_or_else(|| s.to_string())
    }
}

/// The four term categories of an intent signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureCategory {
    Subject,
    Analysis,
    Scope,
    Quality,
}

impl SignatureCategory {
    pub const ALL: [SignatureCategory; 4] =
        [Self::Subject, Self::Analysis, Self::Scope, Self::Quality];

    /// Fixed category weight in the intent score
    pub fn weight(&self) -> f64 {
        match self {
            Self::Subject => 0.35,
            Self::Analysis => 0.25,
            Self::Scope => 0.20,
            Self::Quality => 0.20,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Subject => "subject",
            Self::Analysis => "analysis",
            Self::Scope => "scope",
            Self::Quality => "quality",
        }
    }
}

/// Raw per-category match data, kept for the reasoning trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryMatch {
    pub category: SignatureCategory,
    /// Concept terms of the signature that matched
    pub matched_terms: Vec<String>,
    /// Number of concept terms in the signature category
    pub term_count: usize,
    /// `weight × matched / term_count`
    pub contribution: f64,
}

/// Score of one intent with its breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentScore {
    pub intent: BaseIntent,
    pub score: f64,
    /// Whether the multi-category bonus was applied
    pub multi_category_bonus: bool,
    pub breakdown: Vec<CategoryMatch>,
}

impl IntentScore {
    /// A zero score with no breakdown
    pub fn zero(intent: BaseIntent) -> Self {
        Self {
            intent,
            score: 0.0,
            multi_category_bonus: false,
            breakdown: Vec::new(),
        }
    }

    /// Number of categories that contributed
    pub fn contributing_categories(&self) -> usize {
        self.breakdown.iter().filter(|c| c.contribution > 0.0).count()
    }

    /// Short explanation line for the reasoning trace
    pub fn explain(&self) -> String {
        let parts: Vec<String> = self
            .breakdown
            .iter()
            .filter(|c| c.contribution > 0.0)
            .map(|c| {
                format!(
                    "{} {}/{} [{}]",
                    c.category.as_str(),
                    c.matched_terms.len(),
                    c.term_count,
                    c.matched_terms.join(", ")
                )
            })
            .collect();
        format!(
            "{} scored {:.3}{} ({})",
            self.intent.display_name(),
            self.score,
            if self.multi_category_bonus { " incl. multi-category bonus" } else { "" },
            parts.join("; ")
        )
    }
}

/// Intents sorted by descending score
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RankedIntents {
    scores: Vec<IntentScore>,
}

impl RankedIntents {
    /// Build from unsorted scores; ties keep enum declaration order
    pub fn from_scores(mut scores: Vec<IntentScore>) -> Self {
        scores.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.intent.cmp(&b.intent))
        });
        Self { scores }
    }

    /// All scores, best first
    pub fn scores(&self) -> &[IntentScore] {
        &self.scores
    }

    /// Best intent, or `None` when nothing scored above zero
    pub fn top(&self) -> Option<&IntentScore> {
        self.scores.first().filter(|s| s.score > 0.0)
    }

    /// Up to `n` best intents with a score strictly above `min_score`
    pub fn top_n(&self, n: usize, min_score: f64) -> Vec<&IntentScore> {
        self.scores
            .iter()
            .filter(|s| s.score > min_score)
            .take(n)
            .collect()
    }

    /// Score of one intent (zero when absent)
    pub fn score_of(&self, intent: BaseIntent) -> f64 {
        self.scores
            .iter()
            .find(|s| s.intent == intent)
            .map(|s| s.score)
            .unwrap_or(0.0)
    }

    /// True when no intent scored above zero
    pub fn is_empty(&self) -> bool {
        self.top().is_none()
    }

    /// Merge two rankings keeping the higher score per intent
    pub fn merge_max(&self, other: &RankedIntents) -> RankedIntents {
        let merged = BaseIntent::ALL
            .iter()
            .map(|intent| {
                let mine = self.scores.iter().find(|s| s.intent == *intent);
                let theirs = other.scores.iter().find(|s| s.intent == *intent);
                match (mine, theirs) {
                    (Some(a), Some(b)) if b.score > a.score => b.clone(),
                    (Some(a), _) => a.clone(),
                    (None, Some(b)) => b.clone(),
                    (None, None) => IntentScore::zero(*intent),
                }
            })
            .collect();
        RankedIntents::from_scores(merged)
    }
}
