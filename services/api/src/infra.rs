use chrono::{DateTime, Utc};
use intel_audit::config::AppConfig;
use intel_audit::error::AppError;
use intel_audit::workflows::assessment::{AssessmentResponse, AssessmentSubmission};
use intel_audit::workflows::intelligence::{
    AssessmentRecord, InMemoryPatternStore, IndustryTrend, InsightRecord, IntelligenceService,
    PatternRecord, PatternStats, PatternStore, PatternType, SqlitePatternStore, StorageError,
    ZoneFrequency,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::Value;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Pattern store selected from configuration.
pub(crate) enum ConfiguredStore {
    Memory(InMemoryPatternStore),
    Sqlite(SqlitePatternStore),
}

impl ConfiguredStore {
    pub(crate) fn open(database_path: Option<&Path>) -> Result<Self, StorageError> {
        match database_path {
            Some(path) => {
                info!(path = %path.display(), "opening sqlite pattern store");
                SqlitePatternStore::open(path).map(Self::Sqlite)
            }
            None => {
                info!("APP_DATABASE_PATH unset; using in-memory pattern store");
                Ok(Self::Memory(InMemoryPatternStore::new()))
            }
        }
    }

    fn inner(&self) -> &dyn PatternStore {
        match self {
            Self::Memory(store) => store,
            Self::Sqlite(store) => store,
        }
    }
}

impl PatternStore for ConfiguredStore {
    fn record_assessment(&self, record: &AssessmentRecord) -> Result<u64, StorageError> {
        self.inner().record_assessment(record)
    }

    fn upsert_pattern(
        &self,
        pattern_type: PatternType,
        key: &str,
        value: Option<f64>,
    ) -> Result<PatternStats, StorageError> {
        self.inner().upsert_pattern(pattern_type, key, value)
    }

    fn count_assessments(&self) -> Result<u64, StorageError> {
        self.inner().count_assessments()
    }

    fn average_waste_score(&self) -> Result<Option<f64>, StorageError> {
        self.inner().average_waste_score()
    }

    fn query_top_zones(&self, limit: usize) -> Result<Vec<ZoneFrequency>, StorageError> {
        self.inner().query_top_zones(limit)
    }

    fn query_industry_trends(
        &self,
        min_samples: u64,
    ) -> Result<Vec<IndustryTrend>, StorageError> {
        self.inner().query_industry_trends(min_samples)
    }

    fn claim_batch(&self, batch_index: u64) -> Result<bool, StorageError> {
        self.inner().claim_batch(batch_index)
    }

    fn insert_insight(&self, record: &InsightRecord) -> Result<(), StorageError> {
        self.inner().insert_insight(record)
    }

    fn query_recent_insights(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<InsightRecord>, StorageError> {
        self.inner().query_recent_insights(since, limit)
    }

    fn list_patterns(&self) -> Result<Vec<PatternRecord>, StorageError> {
        self.inner().list_patterns()
    }
}

pub(crate) fn build_service(
    config: &AppConfig,
) -> Result<Arc<IntelligenceService<ConfiguredStore>>, AppError> {
    let store = ConfiguredStore::open(config.storage.database_path.as_deref())?;
    Ok(Arc::new(IntelligenceService::new(
        Arc::new(store),
        config.intelligence.clone(),
        config.storage.retry_policy(),
    )))
}

/// Reads a submission from JSON: a full submission with `responses`, or a bare answer map.
pub(crate) fn read_submission(path: &Path) -> Result<AssessmentSubmission, AppError> {
    let raw = std::fs::read_to_string(path)?;
    parse_submission(&raw)
}

pub(crate) fn parse_submission(raw: &str) -> Result<AssessmentSubmission, AppError> {
    let value: Value = serde_json::from_str(raw)?;
    if value.get("responses").is_some() {
        Ok(serde_json::from_value(value)?)
    } else {
        Ok(AssessmentSubmission::new(AssessmentResponse::from_json(
            &value,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intel_audit::workflows::assessment::CategoryId;

    #[test]
    fn bare_answer_maps_are_accepted() {
        let submission =
            parse_submission(r#"{"q3": "we search for it", "q9": "ignored"}"#).expect("parses");
        assert_eq!(submission.industry, None);
        assert_eq!(
            submission.responses.answer(CategoryId::Q3),
            Some("we search for it")
        );
        assert_eq!(submission.responses.answered(), 1);
    }

    #[test]
    fn full_submissions_keep_labels() {
        let submission = parse_submission(
            r#"{"industry": "Retail", "team_size": 12, "responses": {"q8": "only she knows"}}"#,
        )
        .expect("parses");
        assert_eq!(submission.industry.as_deref(), Some("Retail"));
        assert_eq!(submission.team_size.as_deref(), Some("12"));
        assert_eq!(submission.responses.answered(), 1);
    }

    #[test]
    fn configured_store_defaults_to_memory() {
        let store = ConfiguredStore::open(None).expect("memory store");
        assert!(matches!(store, ConfiguredStore::Memory(_)));
        assert_eq!(store.count_assessments(), Ok(0));
    }
}
