use std::sync::Arc;

use crate::services::{
    InteractionLedger, QuotaGate, RecommendationEngine, SearchOrchestrator,
};

/// Shared application state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub search: Arc<SearchOrchestrator>,
    pub ledger: Arc<InteractionLedger>,
    pub recommendations: Arc<RecommendationEngine>,
    pub quota: Arc<QuotaGate>,
}
