//! Dataset metadata provider

use std::sync::Arc;

use crate::dataset::DatasetContext;
use crate::error::Result;

/// Supplies the dataset snapshot used for context enhancement
///
/// Implementations decide how metadata is refreshed; the engine only asks for
/// the current snapshot once per query.
pub trait DatasetProvider: Send + Sync {
    fn snapshot(&self) -> Result<Arc<DatasetContext>>;
}

/// Provider over a fixed, preloaded snapshot
#[derive(Debug, Clone)]
pub struct StaticDatasetProvider {
    context: Arc<DatasetContext>,
}

impl StaticDatasetProvider {
    pub fn new(context: DatasetContext) -> Self {
        Self {
            context: Arc::new(context),
        }
    }
}

impl DatasetProvider for StaticDatasetProvider {
    fn snapshot(&self) -> Result<Arc<DatasetContext>> {
        Ok(Arc::clone(&self.context))
    }
}
