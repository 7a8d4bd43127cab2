use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use super::domain::{
    AssessmentRecord, IndustryTrend, InsightRecord, PatternRecord, PatternStats, PatternType,
    ZoneFrequency,
};
use super::repository::{PatternStore, StorageError};

/// Process-local store. A single lock serializes every write, so upserts and batch
/// claims are atomic.
#[derive(Default, Clone)]
pub struct InMemoryPatternStore {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    assessments: Vec<AssessmentRecord>,
    patterns: BTreeMap<(PatternType, String), PatternRecord>,
    claimed_batches: BTreeSet<u64>,
    insights: Vec<InsightRecord>,
}

impl InMemoryPatternStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, MemoryState>, StorageError> {
        self.state
            .lock()
            .map_err(|_| StorageError::Corrupt("pattern store mutex poisoned".to_string()))
    }

    pub fn insights(&self) -> Vec<InsightRecord> {
        self.state()
            .map(|state| state.insights.clone())
            .unwrap_or_default()
    }

    pub fn pattern(&self, pattern_type: PatternType, key: &str) -> Option<PatternRecord> {
        self.state()
            .ok()
            .and_then(|state| state.patterns.get(&(pattern_type, key.to_string())).cloned())
    }
}

impl PatternStore for InMemoryPatternStore {
    fn record_assessment(&self, record: &AssessmentRecord) -> Result<u64, StorageError> {
        let mut state = self.state()?;
        state.assessments.push(record.clone());
        Ok(state.assessments.len() as u64)
    }

    fn upsert_pattern(
        &self,
        pattern_type: PatternType,
        key: &str,
        value: Option<f64>,
    ) -> Result<PatternStats, StorageError> {
        let value = value.filter(|_| pattern_type.tracks_average());
        let mut state = self.state()?;
        let entry_key = (pattern_type, key.to_string());
        let previous = state.patterns.get(&entry_key).map(|record| PatternStats {
            frequency: record.frequency,
            average: record.average,
        });
        let stats = PatternStats::fold(previous, value);

        state.patterns.insert(
            entry_key,
            PatternRecord {
                pattern_type,
                key: key.to_string(),
                frequency: stats.frequency,
                average: stats.average,
                last_updated: Utc::now(),
            },
        );
        Ok(stats)
    }

    fn count_assessments(&self) -> Result<u64, StorageError> {
        Ok(self.state()?.assessments.len() as u64)
    }

    fn average_waste_score(&self) -> Result<Option<f64>, StorageError> {
        let state = self.state()?;
        if state.assessments.is_empty() {
            return Ok(None);
        }
        let total: f64 = state
            .assessments
            .iter()
            .map(|record| f64::from(record.waste_score))
            .sum();
        Ok(Some(total / state.assessments.len() as f64))
    }

    fn query_top_zones(&self, limit: usize) -> Result<Vec<ZoneFrequency>, StorageError> {
        let state = self.state()?;
        let mut totals: BTreeMap<&str, (u64, u64)> = BTreeMap::new();
        for zone in state.assessments.iter().flat_map(|record| &record.zones) {
            let entry = totals.entry(zone.name).or_default();
            entry.0 += 1;
            entry.1 += u64::from(zone.score);
        }

        let mut zones: Vec<ZoneFrequency> = totals
            .into_iter()
            .map(|(zone, (frequency, score_sum))| ZoneFrequency {
                zone: zone.to_string(),
                frequency,
                avg_score: score_sum as f64 / frequency as f64,
            })
            .collect();
        rank_zones(&mut zones);
        zones.truncate(limit);
        Ok(zones)
    }

    fn query_industry_trends(
        &self,
        min_samples: u64,
    ) -> Result<Vec<IndustryTrend>, StorageError> {
        let state = self.state()?;
        let mut totals: BTreeMap<&str, (u64, u64)> = BTreeMap::new();
        for record in &state.assessments {
            if let Some(industry) = record.industry.as_deref() {
                let entry = totals.entry(industry).or_default();
                entry.0 += 1;
                entry.1 += u64::from(record.waste_score);
            }
        }

        let mut trends: Vec<IndustryTrend> = totals
            .into_iter()
            .filter(|(_, (count, _))| *count >= min_samples)
            .map(|(industry, (count, score_sum))| IndustryTrend {
                industry: industry.to_string(),
                avg_waste: score_sum as f64 / count as f64,
                count,
            })
            .collect();
        rank_industries(&mut trends);
        Ok(trends)
    }

    fn claim_batch(&self, batch_index: u64) -> Result<bool, StorageError> {
        Ok(self.state()?.claimed_batches.insert(batch_index))
    }

    fn insert_insight(&self, record: &InsightRecord) -> Result<(), StorageError> {
        self.state()?.insights.push(record.clone());
        Ok(())
    }

    fn query_recent_insights(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<InsightRecord>, StorageError> {
        let state = self.state()?;
        let mut recent: Vec<InsightRecord> = state
            .insights
            .iter()
            .filter(|insight| insight.generated_at >= since)
            .cloned()
            .collect();
        rank_insights(&mut recent);
        recent.truncate(limit);
        Ok(recent)
    }

    fn list_patterns(&self) -> Result<Vec<PatternRecord>, StorageError> {
        Ok(self.state()?.patterns.values().cloned().collect())
    }
}

pub(crate) fn rank_zones(zones: &mut [ZoneFrequency]) {
    zones.sort_by(|a, b| {
        b.frequency
            .cmp(&a.frequency)
            .then_with(|| a.zone.cmp(&b.zone))
    });
}

pub(crate) fn rank_industries(trends: &mut [IndustryTrend]) {
    trends.sort_by(|a, b| {
        b.avg_waste
            .partial_cmp(&a.avg_waste)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.industry.cmp(&b.industry))
    });
}

pub(crate) fn rank_insights(insights: &mut [InsightRecord]) {
    insights.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.generated_at.cmp(&a.generated_at))
    });
}
