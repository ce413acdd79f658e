//! Intent signature table
//!
//! One signature per base intent, four categories each. An entry is a
//! concept with its spelling and inflection variants; a category's match
//! fraction counts concepts, not variants. Variants are stemmed once when the
//! table is first used and never change afterwards.

use geo_router_core::{BaseIntent, SignatureCategory};
use once_cell::sync::Lazy;

use crate::tokenizer::stem_phrase;

/// A concept term with its variants
#[derive(Debug, Clone, Copy)]
pub struct Concept {
    pub name: &'static str,
    pub variants: &'static [&'static str],
}

const fn c(name: &'static str, variants: &'static [&'static str]) -> Concept {
    Concept { name, variants }
}

/// Static signature of one intent
#[derive(Debug, Clone, Copy)]
pub struct IntentSignature {
    pub intent: BaseIntent,
    pub subject: &'static [Concept],
    pub analysis: &'static [Concept],
    pub scope: &'static [Concept],
    pub quality: &'static [Concept],
}

impl IntentSignature {
    pub fn category(&self, category: SignatureCategory) -> &'static [Concept] {
        match category {
            SignatureCategory::Subject => self.subject,
            SignatureCategory::Analysis => self.analysis,
            SignatureCategory::Scope => self.scope,
            SignatureCategory::Quality => self.quality,
        }
    }
}

const AREA: Concept = c(
    "area",
    &["area", "neighborhood", "neighbourhood", "region", "zip", "zipcode", "location", "territory", "tract"],
);
const MARKET: Concept = c("market", &["market", "landscape", "industry", "sector", "business"]);

static SIGNATURES: [IntentSignature; 14] = [
    IntentSignature {
        intent: BaseIntent::DemographicAnalysis,
        subject: &[
            c("population", &["population", "people", "resident", "demographic", "demographics", "household", "inhabitant"]),
            c("income", &["income", "wealth", "affluence", "affluent", "earning", "salary"]),
            c("age", &["age", "generation", "millennial", "senior", "youth", "family"]),
        ],
        analysis: &[
            c("profile", &["profile", "characterize", "composition", "makeup"]),
            c("distribution", &["distribution", "distributed", "mix", "spread"]),
        ],
        scope: &[
            AREA,
            c("customer", &["customer", "consumer", "shopper", "audience"]),
        ],
        quality: &[
            c("density", &["density", "concentration", "dense"]),
            c("lifestyle", &["education", "ethnicity", "diversity", "lifestyle"]),
        ],
    },
    IntentSignature {
        intent: BaseIntent::CompetitiveAnalysis,
        subject: &[
            c("competitor", &["competitor", "competition", "rival", "competing", "competitive", "incumbent"]),
            c("advantage", &["advantage", "edge", "positioning", "dominance", "threat"]),
        ],
        analysis: &[
            c("benchmark", &["benchmark", "against", "outperform", "outcompete"]),
            c("share", &["market share", "share", "penetration", "saturation"]),
        ],
        scope: &[MARKET, AREA],
        quality: &[
            c("strength", &["strength", "weakness", "strong", "weak"]),
            c("score", &["score", "index", "rating"]),
        ],
    },
    IntentSignature {
        intent: BaseIntent::StrategicAnalysis,
        subject: &[
            c("expansion", &["expansion", "expand", "growth opportunity", "opportunity", "opportunities"]),
            c("strategy", &["strategy", "strategic", "investment", "invest", "planning"]),
        ],
        analysis: &[
            c("recommend", &["recommend", "recommendation", "suggest", "advise", "prioritize"]),
            c("evaluate", &["evaluate", "assess", "assessment", "potential"]),
        ],
        scope: &[
            c("site", &["site", "store", "branch", "outlet", "new location"]),
            c("future", &["future", "upcoming", "long term", "next year"]),
        ],
        quality: &[
            c("attractive", &["ideal", "optimal", "promising", "attractive", "best place"]),
            c("risk", &["risk", "viability", "feasibility", "viable"]),
        ],
    },
    IntentSignature {
        intent: BaseIntent::ComparativeAnalysis,
        subject: &[
            c("compare", &["compare", "comparison", "contrast", "versus", "vs"]),
            c("relative", &["relative", "between", "among"]),
        ],
        analysis: &[
            c("side_by_side", &["side by side", "head to head", "juxtapose"]),
            c("similar", &["similar", "similarity", "alike"]),
        ],
        scope: &[
            c("jurisdiction", &["city", "county", "state", "metro"]),
            AREA,
        ],
        quality: &[
            c("better", &["better", "worse", "higher", "lower"]),
        ],
    },
    IntentSignature {
        intent: BaseIntent::PerformanceRanking,
        subject: &[
            c("rank", &["top", "best", "worst", "highest", "lowest", "leading", "bottom", "rank", "ranking"]),
            c("performer", &["performer", "performance", "perform", "performing", "leader", "underperform"]),
        ],
        analysis: &[
            c("sort", &["sort", "order", "ranked"]),
            c("list", &["list", "show", "display", "identify", "find"]),
        ],
        scope: &[
            AREA,
            c("outlet", &["store", "branch", "outlet", "site"]),
        ],
        quality: &[
            c("score", &["score", "index", "rating", "metric"]),
            c("volume", &["value", "level", "volume", "sales", "revenue"]),
        ],
    },
    IntentSignature {
        intent: BaseIntent::DifferenceAnalysis,
        subject: &[
            c("difference", &["difference", "differ", "gap", "disparity", "variation"]),
            c("delta", &["delta", "shift", "discrepancy"]),
        ],
        analysis: &[
            c("distinguish", &["distinguish", "separate", "set apart"]),
            c("quantify", &["quantify", "measure", "calculate"]),
        ],
        scope: &[
            c("across", &["across", "between", "among"]),
            c("group", &["group", "segment", "category"]),
        ],
        quality: &[
            c("significant", &["significant", "largest", "biggest", "notable"]),
            c("percent", &["percent", "percentage", "ratio"]),
        ],
    },
    IntentSignature {
        intent: BaseIntent::RelationshipAnalysis,
        subject: &[
            c("relationship", &["relationship", "correlation", "correlate", "association", "link", "connection"]),
            c("driver", &["driver", "factor", "influence", "impact", "affect", "effect"]),
        ],
        analysis: &[
            c("explain", &["explain", "relate", "associate", "cause", "depend"]),
            c("regression", &["regression", "covariance", "elasticity"]),
        ],
        scope: &[
            c("variable", &["variable", "attribute", "feature", "field"]),
            c("outcome", &["outcome", "result", "sales", "revenue"]),
        ],
        quality: &[
            c("direction", &["positive", "negative", "inverse"]),
            c("significance", &["significance", "statistical", "strength of"]),
        ],
    },
    IntentSignature {
        intent: BaseIntent::TrendAnalysis,
        subject: &[
            c("trend", &["trend", "trending", "pattern", "trajectory"]),
            c("change", &["change", "growth", "decline", "increase", "decrease"]),
        ],
        analysis: &[
            c("track", &["track", "monitor", "evolve", "evolution", "develop"]),
        ],
        scope: &[
            c("time", &["time", "year", "month", "quarter", "season", "seasonal", "historical", "history"]),
            c("period", &["period", "since", "past", "last"]),
        ],
        quality: &[
            c("rate", &["rate", "pace", "speed", "momentum"]),
            c("direction", &["upward", "downward", "rising", "falling"]),
        ],
    },
    IntentSignature {
        intent: BaseIntent::PredictionModeling,
        subject: &[
            c("forecast", &["forecast", "predict", "prediction", "projection", "estimate"]),
            c("future", &["future", "upcoming", "next"]),
        ],
        analysis: &[
            c("model", &["model", "modeling", "modelling", "simulate", "simulation"]),
            c("expect", &["expect", "anticipate", "likely"]),
        ],
        scope: &[
            c("horizon", &["horizon", "year", "quarter"]),
            c("demand", &["demand", "sales", "revenue"]),
        ],
        quality: &[
            c("probability", &["accuracy", "confidence", "probability", "likelihood"]),
            c("scenario", &["scenario", "assumption"]),
        ],
    },
    IntentSignature {
        intent: BaseIntent::ClusteringSegmentation,
        subject: &[
            c("cluster", &["cluster", "clustering", "segment", "segmentation", "grouping"]),
            c("type", &["type", "kind", "similar", "alike"]),
        ],
        analysis: &[
            c("classify", &["classify", "categorize", "partition", "divide"]),
            c("discover", &["discover", "uncover", "detect"]),
        ],
        scope: &[
            c("customer", &["customer", "consumer", "shopper", "household"]),
            AREA,
        ],
        quality: &[
            c("distinct", &["distinct", "natural", "homogeneous", "characteristic"]),
            c("persona", &["persona", "archetype", "lifestyle"]),
        ],
    },
    IntentSignature {
        intent: BaseIntent::AnomalyDetection,
        subject: &[
            c("anomaly", &["anomaly", "anomalies", "outlier", "unusual", "abnormal", "irregular"]),
            c("spike", &["spike", "drop", "surge", "dip"]),
        ],
        analysis: &[
            c("detect", &["detect", "flag", "spot", "catch"]),
            c("diagnose", &["diagnose", "investigate", "audit"]),
        ],
        scope: &[
            c("data", &["data", "record", "kpi"]),
            c("outlet", &["store", "branch", "outlet"]),
        ],
        quality: &[
            c("unexpected", &["unexpected", "strange", "odd", "suspicious"]),
            c("deviation", &["deviation", "threshold", "extreme"]),
        ],
    },
    IntentSignature {
        intent: BaseIntent::Optimization,
        subject: &[
            c("optimize", &["optimize", "optimise", "optimization", "maximize", "minimize", "improve"]),
            c("allocation", &["allocation", "allocate", "budget", "resource"]),
        ],
        analysis: &[
            c("balance", &["balance", "tradeoff", "trade off"]),
            c("plan", &["plan", "schedule", "route"]),
        ],
        scope: &[
            c("network", &["network", "coverage", "portfolio"]),
            c("cost", &["cost", "spend", "efficiency", "roi"]),
        ],
        quality: &[
            c("efficient", &["efficient", "maximum", "minimum"]),
            c("constraint", &["constraint", "limit", "capacity"]),
        ],
    },
    IntentSignature {
        intent: BaseIntent::GeneralExploration,
        subject: &[
            c("data", &["data", "information", "insight", "insights"]),
            c("interesting", &["interesting", "noteworthy", "stand out"]),
        ],
        analysis: &[
            c("explore", &["explore", "exploration", "analyze", "analyse", "analysis", "investigate", "look", "dig"]),
            c("understand", &["understand", "learn", "discover"]),
        ],
        scope: &[MARKET, AREA],
        quality: &[
            c("general", &["general", "broad", "high level"]),
            c("detail", &["detail", "detailed", "deep", "dive"]),
        ],
    },
    IntentSignature {
        intent: BaseIntent::ComprehensiveOverview,
        subject: &[
            c("overview", &["overview", "summary", "snapshot", "picture"]),
            c("complete", &["everything", "complete", "comprehensive", "full", "whole", "entire"]),
        ],
        analysis: &[
            c("summarize", &["summarize", "summarise", "describe", "review", "analyze", "analysis"]),
            c("report", &["report", "dashboard", "breakdown"]),
        ],
        scope: &[MARKET, AREA],
        quality: &[
            c("overall", &["overall", "holistic", "total", "aggregate"]),
            c("key", &["key", "main", "major", "important"]),
        ],
    },
];

/// A concept with stemmed variant phrases
#[derive(Debug, Clone)]
pub(crate) struct CompiledConcept {
    pub name: &'static str,
    pub phrases: Vec<Vec<String>>,
}

/// A signature with stemmed concepts per category
#[derive(Debug, Clone)]
pub(crate) struct CompiledSignature {
    pub intent: BaseIntent,
    pub categories: Vec<(SignatureCategory, Vec<CompiledConcept>)>,
}

pub(crate) static COMPILED: Lazy<Vec<CompiledSignature>> = Lazy::new(|| {
    SIGNATURES
        .iter()
        .map(|sig| CompiledSignature {
            intent: sig.intent,
            categories: SignatureCategory::ALL
                .iter()
                .map(|category| {
                    let concepts = sig
                        .category(*category)
                        .iter()
                        .map(|concept| CompiledConcept {
                            name: concept.name,
                            phrases: concept
                                .variants
                                .iter()
                                .map(|v| stem_phrase(v))
                                .filter(|p| !p.is_empty())
                                .collect(),
                        })
                        .collect();
                    (*category, concepts)
                })
                .collect(),
        })
        .collect()
});

/// Signature of an intent
pub fn signature(intent: BaseIntent) -> &'static IntentSignature {
    // The table is declared in enum order
    &SIGNATURES[BaseIntent::ALL
        .iter()
        .position(|i| *i == intent)
        .unwrap_or_default()]
}

/// Every signature, in enum order
pub fn signatures() -> &'static [IntentSignature] {
    &SIGNATURES
}
