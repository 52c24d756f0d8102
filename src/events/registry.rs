//! Registry of loaded API definitions, swapped atomically on reload.

use std::collections::HashMap;
use std::sync::Arc;
use arc_swap::ArcSwap;

use crate::config::ApiDefinition;

type ApiMap = HashMap<String, Arc<ApiDefinition>>;

/// Lock-free lookup of APIs by id.
#[derive(Debug)]
pub struct ApiRegistry {
    apis: ArcSwap<ApiMap>,
}

impl ApiRegistry {
    pub fn new(apis: Vec<ApiDefinition>) -> Self {
        Self {
            apis: ArcSwap::from_pointee(Self::index(apis)),
        }
    }

    fn index(apis: Vec<ApiDefinition>) -> ApiMap {
        apis.into_iter()
            .map(|api| (api.api_id.clone(), Arc::new(api)))
            .collect()
    }

    /// Replace every definition at once.
    pub fn replace(&self, apis: Vec<ApiDefinition>) {
        let count = apis.len();
        self.apis.store(Arc::new(Self::index(apis)));
        tracing::info!(apis = count, "API registry updated");
    }

    pub fn get(&self, api_id: &str) -> Option<Arc<ApiDefinition>> {
        self.apis.load().get(api_id).cloned()
    }

    /// All definitions, ordered by id.
    pub fn all(&self) -> Vec<Arc<ApiDefinition>> {
        let mut apis: Vec<_> = self.apis.load().values().cloned().collect();
        apis.sort_by(|a, b| a.api_id.cmp(&b.api_id));
        apis
    }

    pub fn len(&self) -> usize {
        self.apis.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ApiRegistry {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
