use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::workflows::assessment::{
    AssessmentOutcome, AssessmentResponse, AssessmentSubmission, WasteCatalog, WasteUrgency,
};

use super::config::IntelligenceConfig;
use super::domain::{
    normalized_label, AssessmentRecord, InsightRecord, PatternRecord, PatternStats, PatternType,
};
use super::report::{MarketReport, ReportSynthesizer};
use super::repository::{PatternStore, StorageError};
use super::retry::RetryPolicy;
use super::trends::TrendAnalyzer;

/// Service composing the scoring engine with the pattern store, trend analyzer, and
/// report synthesizer.
pub struct IntelligenceService<S> {
    store: Arc<S>,
    catalog: WasteCatalog,
    config: IntelligenceConfig,
    retry: RetryPolicy,
}

impl<S> IntelligenceService<S>
where
    S: PatternStore + 'static,
{
    pub fn new(store: Arc<S>, config: IntelligenceConfig, retry: RetryPolicy) -> Self {
        Self {
            store,
            catalog: WasteCatalog::standard(),
            config,
            retry,
        }
    }

    pub fn with_catalog(mut self, catalog: WasteCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &IntelligenceConfig {
        &self.config
    }

    pub fn analyze(&self, responses: &AssessmentResponse) -> AssessmentOutcome {
        self.catalog.analyze(responses)
    }

    /// Scores a submission and feeds it into the learning pipeline.
    ///
    /// Storage problems after scoring are logged and reflected in the receipt; the
    /// outcome is always returned.
    pub fn submit(&self, submission: AssessmentSubmission) -> AssessmentReceipt {
        self.submit_at(submission, Utc::now())
    }

    pub fn submit_at(
        &self,
        submission: AssessmentSubmission,
        now: DateTime<Utc>,
    ) -> AssessmentReceipt {
        let outcome = self.analyze(&submission.responses);
        let record = AssessmentRecord::new(&submission, &outcome, now);

        let assessment_id = match self
            .retry
            .run("record_assessment", || self.store.record_assessment(&record))
        {
            Ok(ordinal) => Some(ordinal),
            Err(err) => {
                warn!(error = %err, "assessment could not be recorded");
                None
            }
        };

        let pattern_logged = match self.log_pattern(
            record.industry.as_deref(),
            outcome.waste_score,
            outcome.top_zone,
        ) {
            Ok(_) => true,
            Err(err) => {
                warn!(error = %err, "pattern logging incomplete");
                false
            }
        };

        let insights_generated = match assessment_id {
            Some(ordinal) => match self.run_trend_analysis_at(ordinal, now) {
                Ok(TrendRun::Completed { insights, .. }) => insights.len(),
                Ok(_) => 0,
                Err(err) => {
                    warn!(ordinal, error = %err, "trend analysis skipped");
                    0
                }
            },
            None => 0,
        };

        AssessmentReceipt {
            assessment_id,
            urgency: outcome.urgency(),
            estimated_monthly_cost: outcome.estimated_monthly_cost(self.config.hourly_cost_rate),
            outcome,
            pattern_logged,
            insights_generated,
        }
    }

    /// Folds one assessment into the industry and zone statistics.
    ///
    /// The two upserts are attempted independently; a failure in one is reported
    /// alongside whatever the other produced.
    pub fn log_pattern(
        &self,
        industry: Option<&str>,
        waste_score: u8,
        top_zone: Option<&str>,
    ) -> Result<PatternLog, PatternLogError> {
        let mut log = PatternLog::default();
        let mut failures = Vec::new();

        match normalized_label(industry) {
            Some(industry) => {
                match self.retry.run("upsert_pattern", || {
                    self.store.upsert_pattern(
                        PatternType::IndustryWaste,
                        &industry,
                        Some(f64::from(waste_score)),
                    )
                }) {
                    Ok(stats) => log.industry = Some(stats),
                    Err(err) => failures.push((PatternType::IndustryWaste, err)),
                }
            }
            None => debug!("no industry label; industry pattern skipped"),
        }

        match normalized_label(top_zone) {
            Some(zone) => {
                match self.retry.run("upsert_pattern", || {
                    self.store
                        .upsert_pattern(PatternType::WasteZoneFrequency, &zone, None)
                }) {
                    Ok(stats) => log.zone = Some(stats),
                    Err(err) => failures.push((PatternType::WasteZoneFrequency, err)),
                }
            }
            None => debug!("no waste zone emitted; zone pattern skipped"),
        }

        if failures.is_empty() {
            Ok(log)
        } else {
            Err(PatternLogError {
                partial: log,
                failures,
            })
        }
    }

    /// Checks the current assessment count and runs trend analysis on a batch boundary.
    pub fn maybe_run_trend_analysis(&self) -> Result<TrendRun, StorageError> {
        let count = self
            .retry
            .run("count_assessments", || self.store.count_assessments())?;
        self.run_trend_analysis_at(count, Utc::now())
    }

    /// Runs trend analysis when `count` closes a batch and this caller wins the claim.
    pub fn run_trend_analysis_at(
        &self,
        count: u64,
        now: DateTime<Utc>,
    ) -> Result<TrendRun, StorageError> {
        let analyzer = TrendAnalyzer::new(&self.config, self.retry);
        let Some(batch) = analyzer.batch_boundary(count) else {
            return Ok(TrendRun::NotDue);
        };

        let claimed = self
            .retry
            .run("claim_batch", || self.store.claim_batch(batch))?;
        if !claimed {
            debug!(batch, "batch already analyzed");
            return Ok(TrendRun::AlreadyClaimed { batch });
        }

        info!(batch, count, "running trend analysis");
        let insights = analyzer.run(self.store.as_ref(), now)?;
        Ok(TrendRun::Completed { batch, insights })
    }

    pub fn generate_report(&self) -> Result<MarketReport, StorageError> {
        self.generate_report_at(Utc::now())
    }

    pub fn generate_report_at(&self, now: DateTime<Utc>) -> Result<MarketReport, StorageError> {
        ReportSynthesizer::new(&self.config, self.retry).synthesize(self.store.as_ref(), now)
    }

    pub fn patterns(&self) -> Result<Vec<PatternRecord>, StorageError> {
        self.retry.run("list_patterns", || self.store.list_patterns())
    }
}

/// Result of a submission: the outcome plus what happened downstream.
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentReceipt {
    /// Ordinal assigned by the store, absent when recording failed.
    pub assessment_id: Option<u64>,
    #[serde(flatten)]
    pub outcome: AssessmentOutcome,
    pub urgency: WasteUrgency,
    pub estimated_monthly_cost: u64,
    pub pattern_logged: bool,
    pub insights_generated: usize,
}

/// Statistics produced by a pattern log call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PatternLog {
    pub industry: Option<PatternStats>,
    pub zone: Option<PatternStats>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrendRun {
    NotDue,
    AlreadyClaimed { batch: u64 },
    Completed { batch: u64, insights: Vec<InsightRecord> },
}

/// Error raised when at least one pattern upsert failed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{} pattern upsert(s) failed: {}", .failures.len(), describe(.failures))]
pub struct PatternLogError {
    pub partial: PatternLog,
    pub failures: Vec<(PatternType, StorageError)>,
}

fn describe(failures: &[(PatternType, StorageError)]) -> String {
    failures
        .iter()
        .map(|(pattern_type, err)| format!("{pattern_type}: {err}"))
        .collect::<Vec<_>>()
        .join("; ")
}
