use std::sync::Arc;

use super::client::CoreClient;
use crate::correlation::IdGenerator;

/// Edge application state (shared)
#[derive(Clone)]
pub struct EdgeState {
    /// Core RPC client
    pub core: Arc<dyn CoreClient>,
    /// Correlation id allocator, one per edge node
    pub ids: Arc<dyn IdGenerator>,
}

impl EdgeState {
    pub fn new(core: Arc<dyn CoreClient>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { core, ids }
    }
}
