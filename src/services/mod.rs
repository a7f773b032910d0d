pub mod catalog;
pub mod ledger;
pub mod quota;
pub mod recommendations;
pub mod search;
pub mod similarity;
pub mod vision;

pub use ledger::InteractionLedger;
pub use quota::QuotaGate;
pub use recommendations::RecommendationEngine;
pub use search::SearchOrchestrator;
