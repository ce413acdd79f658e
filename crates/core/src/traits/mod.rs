//! Collaborator traits
//!
//! The engine talks to the outside world only through these seams:
//!
//! ```text
//!   DatasetProvider  : current dataset metadata snapshot
//!   FeedbackSink     : {query, chosen_endpoint, was_correct} records
//!   ResponseRenderer : turns a RoutingResult into presentation text
//! ```
//!
//! Only in-memory implementations ship with the workspace.

mod dataset;
mod feedback;
mod renderer;

pub use dataset::{DatasetProvider, StaticDatasetProvider};
pub use feedback::{FeedbackRecord, FeedbackSink};
pub use renderer::{PlainTextRenderer, ResponseRenderer};
