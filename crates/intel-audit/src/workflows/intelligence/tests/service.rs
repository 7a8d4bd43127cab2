use super::common::*;
use chrono::Duration;
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::workflows::assessment::{
    AssessmentResponse, AssessmentSubmission, CategoryDefinition, CategoryId, ComplexityTier,
    WasteCatalog, WasteUrgency,
};
use crate::workflows::intelligence::domain::{InsightRecord, InsightType, PatternType};
use crate::workflows::intelligence::repository::{PatternStore, StorageError};
use crate::workflows::intelligence::{IntelligenceConfig, IntelligenceService, TrendRun};

fn mechanical_only() -> AssessmentResponse {
    AssessmentResponse::new().with_answer(
        CategoryId::Q7,
        "Repetitive copy and paste, the same thing, no thinking needed",
    )
}

fn small_batches(batch_size: u64) -> IntelligenceConfig {
    IntelligenceConfig {
        batch_size,
        ..IntelligenceConfig::default()
    }
}

#[test]
fn submit_returns_outcome_with_derived_views() {
    let (service, store) = memory_service(IntelligenceConfig::default());

    let receipt = service.submit_at(submission("Logistics"), fixed_now());

    assert_eq!(receipt.assessment_id, Some(1));
    assert_eq!(receipt.outcome.waste_score, 75);
    assert_eq!(receipt.outcome.total_hours_wasted, 52);
    assert_eq!(receipt.outcome.top_zone, Some("Mechanical Tasks"));
    assert_eq!(receipt.urgency, WasteUrgency::High);
    assert_eq!(receipt.estimated_monthly_cost, 52 * 50);
    assert!(receipt.pattern_logged);
    assert_eq!(receipt.insights_generated, 0);
    assert_eq!(store.count_assessments().expect("count"), 1);
}

fn flat_category(id: CategoryId, zone_name: &'static str) -> CategoryDefinition {
    CategoryDefinition {
        id,
        keywords: &["ledger"],
        zone_name,
        complexity: ComplexityTier::Low,
        roi: 200,
        hour_weight: 10,
        recommendation: "Reconcile automatically.",
    }
}

#[test]
fn custom_catalog_keeps_table_order_for_equal_roi() {
    let (service, store) = memory_service(small_batches(5));
    let service = service.with_catalog(WasteCatalog::from_definitions(vec![
        flat_category(CategoryId::Q2, "Ledger Drift"),
        flat_category(CategoryId::Q1, "Invoice Chasing"),
    ]));
    assert_eq!(service.config().batch_size, 5);

    let responses = AssessmentResponse::new()
        .with_answer(CategoryId::Q1, "ledger")
        .with_answer(CategoryId::Q2, "ledger");
    let receipt = service.submit_at(
        AssessmentSubmission::new(responses).with_industry("Finance"),
        fixed_now(),
    );

    let names: Vec<&str> = receipt.outcome.waste_zones.iter().map(|zone| zone.name).collect();
    assert_eq!(names, vec!["Ledger Drift", "Invoice Chasing"]);
    assert_eq!(receipt.outcome.top_zone, Some("Ledger Drift"));
    assert!(Arc::ptr_eq(service.store(), &store));
    let zone = store
        .pattern(PatternType::WasteZoneFrequency, "Ledger Drift")
        .expect("top zone logged");
    assert_eq!(zone.frequency, 1);
    let industry = store
        .pattern(PatternType::IndustryWaste, "Finance")
        .expect("industry logged");
    assert_eq!(industry.average, Some(50.0));
}

#[test]
fn log_pattern_folds_exact_industry_mean() {
    let (service, store) = memory_service(IntelligenceConfig::default());

    service
        .log_pattern(Some("Retail"), 70, Some("Mechanical Tasks"))
        .expect("first log");
    let log = service
        .log_pattern(Some("Retail"), 45, Some("Mechanical Tasks"))
        .expect("second log");

    let industry = log.industry.expect("industry stats");
    assert_eq!(industry.frequency, 2);
    assert_eq!(industry.average, Some(57.5));

    let zone = log.zone.expect("zone stats");
    assert_eq!(zone.frequency, 2);
    assert_eq!(zone.average, None);

    let stored = store
        .pattern(PatternType::IndustryWaste, "Retail")
        .expect("stored pattern");
    assert_eq!(stored.frequency, 2);
    assert_eq!(stored.average, Some(57.5));
}

#[test]
fn blank_industry_and_missing_zone_are_skipped() {
    let (service, store) = memory_service(IntelligenceConfig::default());

    let log = service
        .log_pattern(Some("   "), 50, Some("Knowledge Silos"))
        .expect("log");
    assert!(log.industry.is_none());
    assert_eq!(log.zone.map(|stats| stats.frequency), Some(1));

    let log = service.log_pattern(None, 50, None).expect("log");
    assert!(log.industry.is_none());
    assert!(log.zone.is_none());

    let patterns = store.list_patterns().expect("patterns");
    assert_eq!(patterns.len(), 1);
    assert_eq!(patterns[0].pattern_type, PatternType::WasteZoneFrequency);
}

#[test]
fn zero_score_is_still_folded() {
    let (service, _) = memory_service(IntelligenceConfig::default());

    let log = service.log_pattern(Some("Retail"), 0, None).expect("log");
    let industry = log.industry.expect("industry stats");
    assert_eq!(industry.frequency, 1);
    assert_eq!(industry.average, Some(0.0));
}

#[test]
fn one_failed_upsert_does_not_block_the_other() {
    let store = Arc::new(FlakyStore::failing_pattern(PatternType::IndustryWaste));
    let service = IntelligenceService::new(
        store.clone(),
        IntelligenceConfig::default(),
        instant_retry(3),
    );

    let err = service
        .log_pattern(Some("Retail"), 80, Some("Mechanical Tasks"))
        .expect_err("industry upsert fails");

    assert_eq!(err.failures.len(), 1);
    assert_eq!(err.failures[0].0, PatternType::IndustryWaste);
    assert_eq!(err.partial.zone.map(|stats| stats.frequency), Some(1));
    assert!(store
        .inner
        .pattern(PatternType::WasteZoneFrequency, "Mechanical Tasks")
        .is_some());
    assert!(err.to_string().contains("industry_waste"));
}

#[test]
fn transient_failures_are_retried() {
    let store = Arc::new(FlakyStore::transient(2));
    let service = IntelligenceService::new(
        store.clone(),
        IntelligenceConfig::default(),
        instant_retry(3),
    );

    let log = service
        .log_pattern(Some("Retail"), 80, Some("Mechanical Tasks"))
        .expect("retries succeed");

    assert_eq!(log.industry.map(|stats| stats.frequency), Some(1));
    assert_eq!(log.zone.map(|stats| stats.frequency), Some(1));
    assert_eq!(store.upsert_calls.load(Ordering::SeqCst), 4);
}

#[test]
fn exhausted_retries_surface_both_failures() {
    let store = Arc::new(FlakyStore::transient(10));
    let service = IntelligenceService::new(
        store.clone(),
        IntelligenceConfig::default(),
        instant_retry(2),
    );

    let err = service
        .log_pattern(Some("Retail"), 80, Some("Mechanical Tasks"))
        .expect_err("retries exhausted");

    assert_eq!(err.failures.len(), 2);
    assert!(err
        .failures
        .iter()
        .all(|(_, failure)| matches!(failure, StorageError::Unavailable(_))));
    assert_eq!(store.upsert_calls.load(Ordering::SeqCst), 4);
}

#[test]
fn logging_failure_still_returns_outcome() {
    let store = Arc::new(FlakyStore::failing_pattern(PatternType::WasteZoneFrequency));
    let service = IntelligenceService::new(store, IntelligenceConfig::default(), instant_retry(1));

    let receipt = service.submit(submission("Logistics"));

    assert_eq!(receipt.outcome.waste_score, 75);
    assert_eq!(receipt.assessment_id, Some(1));
    assert!(!receipt.pattern_logged);
}

#[test]
fn unrecorded_assessment_skips_trend_check() {
    let store = Arc::new(FlakyStore {
        fail_records: true,
        ..FlakyStore::default()
    });
    let service = IntelligenceService::new(store.clone(), small_batches(1), instant_retry(1));

    let receipt = service.submit(submission("Logistics"));

    assert_eq!(receipt.assessment_id, None);
    assert_eq!(receipt.outcome.top_zone, Some("Mechanical Tasks"));
    assert!(receipt.pattern_logged);
    assert_eq!(receipt.insights_generated, 0);
    assert!(store.inner.insights().is_empty());
}

#[test]
fn trend_analysis_fires_exactly_at_batch_boundaries() {
    let (service, store) = memory_service(IntelligenceConfig::default());

    let fired: Vec<u64> = (0..30)
        .filter_map(|_| {
            let receipt = service.submit_at(submission("Logistics"), fixed_now());
            (receipt.insights_generated > 0).then(|| receipt.assessment_id.expect("recorded"))
        })
        .collect();

    assert_eq!(fired, vec![10, 20, 30]);
    assert_eq!(store.insights().len(), 6);
}

#[test]
fn batch_claim_prevents_duplicate_runs() {
    let (service, _) = memory_service(IntelligenceConfig::default());
    let now = fixed_now();

    assert!(matches!(
        service.run_trend_analysis_at(10, now),
        Ok(TrendRun::Completed { batch: 1, .. })
    ));
    assert_eq!(
        service.run_trend_analysis_at(10, now),
        Ok(TrendRun::AlreadyClaimed { batch: 1 })
    );
    assert_eq!(service.run_trend_analysis_at(7, now), Ok(TrendRun::NotDue));
    assert_eq!(service.run_trend_analysis_at(0, now), Ok(TrendRun::NotDue));
}

#[test]
fn maybe_run_uses_current_count() {
    let (service, _) = memory_service(small_batches(2));

    service.submit(submission("Logistics"));
    assert_eq!(service.maybe_run_trend_analysis(), Ok(TrendRun::NotDue));

    let receipt = service.submit(submission("Logistics"));
    assert_eq!(receipt.insights_generated, 1);
    assert_eq!(
        service.maybe_run_trend_analysis(),
        Ok(TrendRun::AlreadyClaimed { batch: 1 })
    );
}

#[test]
fn failed_trend_analysis_is_skipped() {
    let store = Arc::new(FlakyStore {
        fail_insights: true,
        ..FlakyStore::default()
    });
    let service = IntelligenceService::new(store.clone(), small_batches(1), instant_retry(1));

    let first = service.submit(submission("Logistics"));
    let second = service.submit(submission("Logistics"));

    assert_eq!(first.insights_generated, 0);
    assert_eq!(second.assessment_id, Some(2));
    assert_eq!(store.inner.claim_batch(2), Ok(false));
}

#[test]
fn industries_below_sample_size_are_excluded() {
    let (service, store) = memory_service(small_batches(5));
    let now = fixed_now();

    for _ in 0..3 {
        service.submit_at(
            AssessmentSubmission::new(lookup_responses()).with_industry("Logistics"),
            now,
        );
    }
    service.submit_at(submission("Retail"), now);
    let receipt = service.submit_at(submission("Retail"), now);
    assert_eq!(receipt.insights_generated, 2);

    let insights = store.insights();
    let zone_leader = insights
        .iter()
        .find(|insight| insight.insight_type == InsightType::WasteZoneLeader)
        .expect("zone leader");
    assert_eq!(
        zone_leader.text,
        "Most common waste zone: Information Access Gap (3 occurrences, avg score 60.0)"
    );

    let industry_leader = insights
        .iter()
        .find(|insight| insight.insight_type == InsightType::IndustryLeader)
        .expect("industry leader");
    assert_eq!(
        industry_leader.text,
        "Industry with highest intelligence waste: Logistics (avg 60.0 from 3 audits)"
    );
    assert_eq!(industry_leader.supporting_data["sample_size"], 3);
}

#[test]
fn empty_history_produces_empty_report() {
    let (service, _) = memory_service(IntelligenceConfig::default());

    let report = service.generate_report_at(fixed_now()).expect("report");

    assert!(report.is_empty());
    assert_eq!(report.period, "Last 30 days");
    assert_eq!(report.avg_waste_score, 0.0);
    assert!(report.top_waste_zones.is_empty());
    assert!(report.market_opportunities.is_empty());
    assert!(report.insights.is_empty());
    assert!(report.recommendations.is_empty());
}

#[test]
fn report_ranks_opportunities_from_history() {
    let (service, _) = memory_service(IntelligenceConfig::default());
    let now = fixed_now();

    for _ in 0..5 {
        service.submit_at(submission("Logistics"), now);
    }
    service.submit_at(
        AssessmentSubmission::new(mechanical_only()).with_industry("Retail"),
        now,
    );

    let report = service.generate_report_at(now).expect("report");

    assert_eq!(report.total_audits, 6);
    assert_eq!(report.avg_waste_score, 77.5);
    assert_eq!(report.top_waste_zones[0].zone, "Mechanical Tasks");
    assert_eq!(report.top_waste_zones[0].frequency, 6);
    assert_eq!(report.top_waste_zones[0].avg_score, 90.0);

    let opportunities: Vec<_> = report
        .market_opportunities
        .iter()
        .map(|opportunity| (opportunity.zone.as_str(), opportunity.potential_revenue))
        .collect();
    assert_eq!(
        opportunities,
        vec![("Mechanical Tasks", 30_000), ("Knowledge Bottleneck", 25_000)]
    );
    assert_eq!(
        report.recommendations,
        vec![
            "BUILD: Build Mechanical Tasks AI template - 6 companies need this (KSh 30,000 potential)"
                .to_string()
        ]
    );
}

#[test]
fn report_only_includes_insights_inside_window() {
    let (service, store) = memory_service(IntelligenceConfig::default());
    let now = fixed_now();

    for (days_ago, text) in [(40, "stale"), (1, "fresh")] {
        store
            .insert_insight(&InsightRecord {
                insight_type: InsightType::WasteZoneLeader,
                text: text.to_string(),
                confidence: 0.95,
                supporting_data: json!({}),
                generated_at: now - Duration::days(days_ago),
            })
            .expect("insert insight");
    }

    let report = service.generate_report_at(now).expect("report");
    let texts: Vec<_> = report.insights.iter().map(|insight| insight.text.as_str()).collect();
    assert_eq!(texts, vec!["fresh"]);
}

#[test]
fn report_surfaces_storage_errors() {
    let store = Arc::new(FlakyStore {
        fail_reads: true,
        ..FlakyStore::default()
    });
    let service = IntelligenceService::new(store, IntelligenceConfig::default(), instant_retry(3));

    assert!(matches!(
        service.generate_report(),
        Err(StorageError::Corrupt(_))
    ));
    assert!(service.patterns().is_err());
}
