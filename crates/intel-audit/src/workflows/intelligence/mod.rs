//! Pattern learning across assessments: statistics upserts, batch trend analysis, and
//! market report synthesis behind the [`PatternStore`] port.

pub mod config;
pub mod domain;
pub mod import;
mod memory;
pub mod report;
pub mod repository;
pub mod retry;
pub mod router;
pub mod service;
mod sqlite;
mod trends;

#[cfg(test)]
mod tests;

pub use config::IntelligenceConfig;
pub use domain::{
    AssessmentRecord, IndustryTrend, InsightRecord, InsightType, PatternRecord, PatternStats,
    PatternType, ZoneFrequency,
};
pub use import::{import_assessments, import_from_path, ImportError, ImportSummary};
pub use memory::InMemoryPatternStore;
pub use report::{InsightView, MarketOpportunity, MarketReport};
pub use repository::{PatternStore, StorageError};
pub use retry::RetryPolicy;
pub use router::intelligence_router;
pub use service::{AssessmentReceipt, IntelligenceService, PatternLog, PatternLogError, TrendRun};
pub use sqlite::SqlitePatternStore;
pub use trends::TrendAnalyzer;
