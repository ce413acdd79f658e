//! Routing feedback

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::EndpointId;

/// One piece of user feedback on a routing decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub query: String,
    pub chosen_endpoint: EndpointId,
    pub was_correct: bool,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl FeedbackRecord {
    pub fn new(query: impl Into<String>, chosen_endpoint: EndpointId, was_correct: bool) -> Self {
        Self {
            query: query.into(),
            chosen_endpoint,
            was_correct,
            timestamp: Utc::now(),
        }
    }
}

/// Accepts feedback for later threshold tuning and history learning
pub trait FeedbackSink: Send + Sync {
    fn submit(&self, record: FeedbackRecord);

    /// Take every pending record
    fn drain(&self) -> Vec<FeedbackRecord>;

    fn pending(&self) -> usize;
}
