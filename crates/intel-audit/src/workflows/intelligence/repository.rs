use chrono::{DateTime, Utc};

use super::domain::{
    AssessmentRecord, IndustryTrend, InsightRecord, PatternRecord, PatternStats, PatternType,
    ZoneFrequency,
};

/// Storage abstraction over assessment history, pattern statistics, and the insight log.
///
/// Implementations own their locking discipline: `upsert_pattern` must be an atomic
/// read-modify-write per `(pattern_type, key)`, `record_assessment` must hand out
/// distinct sequential ordinals, and `claim_batch` must succeed for exactly one caller
/// per batch index.
pub trait PatternStore: Send + Sync {
    /// Persists an assessment and returns its 1-based ordinal (the running count).
    fn record_assessment(&self, record: &AssessmentRecord) -> Result<u64, StorageError>;

    fn upsert_pattern(
        &self,
        pattern_type: PatternType,
        key: &str,
        value: Option<f64>,
    ) -> Result<PatternStats, StorageError>;

    fn count_assessments(&self) -> Result<u64, StorageError>;

    /// Mean overall waste score across all assessments, `None` when there are none.
    fn average_waste_score(&self) -> Result<Option<f64>, StorageError>;

    /// Zones ranked by how many assessments emitted them, with their average score.
    fn query_top_zones(&self, limit: usize) -> Result<Vec<ZoneFrequency>, StorageError>;

    /// Industries with at least `min_samples` assessments, ranked by average waste score.
    fn query_industry_trends(&self, min_samples: u64)
        -> Result<Vec<IndustryTrend>, StorageError>;

    /// Returns `true` only for the first caller claiming `batch_index`.
    fn claim_batch(&self, batch_index: u64) -> Result<bool, StorageError>;

    fn insert_insight(&self, record: &InsightRecord) -> Result<(), StorageError>;

    /// Insights generated at or after `since`, by confidence then recency, newest first.
    fn query_recent_insights(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<InsightRecord>, StorageError>;

    fn list_patterns(&self) -> Result<Vec<PatternRecord>, StorageError>;
}

/// Error enumeration for store failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("constraint violated: {0}")]
    Constraint(String),
    #[error("stored data is invalid: {0}")]
    Corrupt(String),
}

impl StorageError {
    /// Transient failures are worth retrying; everything else fails fast.
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::Unavailable(_))
    }
}
