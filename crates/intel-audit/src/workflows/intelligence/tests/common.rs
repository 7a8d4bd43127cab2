use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::assessment::{AssessmentResponse, AssessmentSubmission, CategoryId};
use crate::workflows::intelligence::domain::{
    AssessmentRecord, IndustryTrend, InsightRecord, PatternRecord, PatternStats, PatternType,
    ZoneFrequency,
};
use crate::workflows::intelligence::repository::{PatternStore, StorageError};
use crate::workflows::intelligence::{
    InMemoryPatternStore, IntelligenceConfig, IntelligenceService, RetryPolicy,
};

pub(super) fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn instant_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_backoff: Duration::ZERO,
        max_backoff: Duration::ZERO,
    }
}

/// q1 scores 60 and q7 scores 90: overall 75, Mechanical Tasks on top.
pub(super) fn mechanical_responses() -> AssessmentResponse {
    AssessmentResponse::new()
        .with_answer(CategoryId::Q1, "Every day, always the same thing")
        .with_answer(
            CategoryId::Q7,
            "Repetitive copy and paste, the same thing, no thinking needed",
        )
}

pub(super) fn lookup_responses() -> AssessmentResponse {
    AssessmentResponse::new().with_answer(CategoryId::Q3, "We search for files for minutes")
}

pub(super) fn submission(industry: &str) -> AssessmentSubmission {
    AssessmentSubmission::new(mechanical_responses())
        .with_industry(industry)
        .with_company("Acme Ltd")
}

pub(super) fn memory_service(
    config: IntelligenceConfig,
) -> (IntelligenceService<InMemoryPatternStore>, Arc<InMemoryPatternStore>) {
    let store = Arc::new(InMemoryPatternStore::new());
    let service = IntelligenceService::new(store.clone(), config, instant_retry(3));
    (service, store)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn assert_status(response: &Response, status: StatusCode) {
    assert_eq!(response.status(), status);
}

/// In-memory store with injectable failures.
#[derive(Default)]
pub(super) struct FlakyStore {
    pub(super) inner: InMemoryPatternStore,
    /// Upserts of this pattern type fail permanently.
    pub(super) failing_pattern: Mutex<Option<PatternType>>,
    /// Number of upcoming calls that fail with a transient error.
    pub(super) transient_failures: AtomicU32,
    pub(super) fail_records: bool,
    pub(super) fail_reads: bool,
    pub(super) fail_insights: bool,
    pub(super) upsert_calls: AtomicU32,
}

impl FlakyStore {
    pub(super) fn failing_pattern(pattern_type: PatternType) -> Self {
        Self {
            failing_pattern: Mutex::new(Some(pattern_type)),
            ..Self::default()
        }
    }

    pub(super) fn transient(failures: u32) -> Self {
        Self {
            transient_failures: AtomicU32::new(failures),
            ..Self::default()
        }
    }

    fn take_transient(&self) -> Result<(), StorageError> {
        let remaining = self.transient_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.transient_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(StorageError::Unavailable("database is locked".to_string()));
        }
        Ok(())
    }

    fn check_reads(&self) -> Result<(), StorageError> {
        if self.fail_reads {
            Err(StorageError::Corrupt("unreadable".to_string()))
        } else {
            Ok(())
        }
    }
}

impl PatternStore for FlakyStore {
    fn record_assessment(&self, record: &AssessmentRecord) -> Result<u64, StorageError> {
        if self.fail_records {
            return Err(StorageError::Constraint("assessments table is read only".to_string()));
        }
        self.inner.record_assessment(record)
    }

    fn upsert_pattern(
        &self,
        pattern_type: PatternType,
        key: &str,
        value: Option<f64>,
    ) -> Result<PatternStats, StorageError> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        self.take_transient()?;
        let failing = *self.failing_pattern.lock().expect("flaky store mutex");
        if failing == Some(pattern_type) {
            return Err(StorageError::Constraint(format!("{pattern_type} rejected")));
        }
        self.inner.upsert_pattern(pattern_type, key, value)
    }

    fn count_assessments(&self) -> Result<u64, StorageError> {
        self.check_reads()?;
        self.inner.count_assessments()
    }

    fn average_waste_score(&self) -> Result<Option<f64>, StorageError> {
        self.check_reads()?;
        self.inner.average_waste_score()
    }

    fn query_top_zones(&self, limit: usize) -> Result<Vec<ZoneFrequency>, StorageError> {
        self.check_reads()?;
        self.inner.query_top_zones(limit)
    }

    fn query_industry_trends(
        &self,
        min_samples: u64,
    ) -> Result<Vec<IndustryTrend>, StorageError> {
        self.check_reads()?;
        self.inner.query_industry_trends(min_samples)
    }

    fn claim_batch(&self, batch_index: u64) -> Result<bool, StorageError> {
        self.inner.claim_batch(batch_index)
    }

    fn insert_insight(&self, record: &InsightRecord) -> Result<(), StorageError> {
        if self.fail_insights {
            return Err(StorageError::Corrupt("insight log unavailable".to_string()));
        }
        self.inner.insert_insight(record)
    }

    fn query_recent_insights(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<InsightRecord>, StorageError> {
        self.check_reads()?;
        self.inner.query_recent_insights(since, limit)
    }

    fn list_patterns(&self) -> Result<Vec<PatternRecord>, StorageError> {
        self.check_reads()?;
        self.inner.list_patterns()
    }
}
