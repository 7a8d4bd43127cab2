use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::info;

use super::config::IntelligenceConfig;
use super::domain::{IndustryTrend, InsightRecord, InsightType, ZoneFrequency};
use super::repository::{PatternStore, StorageError};
use super::retry::RetryPolicy;

/// Batch routine that turns leaderboards into insight records.
pub struct TrendAnalyzer<'a> {
    config: &'a IntelligenceConfig,
    retry: RetryPolicy,
}

impl<'a> TrendAnalyzer<'a> {
    pub fn new(config: &'a IntelligenceConfig, retry: RetryPolicy) -> Self {
        Self { config, retry }
    }

    /// Index of the batch completed at `count`, or `None` for intermediate counts.
    pub fn batch_boundary(&self, count: u64) -> Option<u64> {
        let size = self.config.batch_size;
        if count == 0 || size == 0 || count % size != 0 {
            None
        } else {
            Some(count / size)
        }
    }

    /// Queries the leaderboards, derives insights, and appends them to the store.
    pub fn run<S>(&self, store: &S, now: DateTime<Utc>) -> Result<Vec<InsightRecord>, StorageError>
    where
        S: PatternStore + ?Sized,
    {
        let top_zones = self.retry.run("query_top_zones", || {
            store.query_top_zones(self.config.analysis_zone_limit)
        })?;
        let industries = self.retry.run("query_industry_trends", || {
            store.query_industry_trends(self.config.min_industry_samples)
        })?;

        let insights = self.derive_insights(&top_zones, &industries, now);
        for insight in &insights {
            self.retry
                .run("insert_insight", || store.insert_insight(insight))?;
        }

        info!(
            zones = top_zones.len(),
            industries = industries.len(),
            insights = insights.len(),
            "trend analysis complete"
        );
        Ok(insights)
    }

    pub fn derive_insights(
        &self,
        top_zones: &[ZoneFrequency],
        industries: &[IndustryTrend],
        now: DateTime<Utc>,
    ) -> Vec<InsightRecord> {
        let mut insights = Vec::new();

        if let Some(leader) = top_zones.first() {
            insights.push(InsightRecord {
                insight_type: InsightType::WasteZoneLeader,
                text: format!(
                    "Most common waste zone: {} ({} occurrences, avg score {:.1})",
                    leader.zone, leader.frequency, leader.avg_score
                ),
                confidence: self.config.zone_leader_confidence,
                supporting_data: json!({
                    "zone": leader.zone,
                    "frequency": leader.frequency,
                    "avg_score": leader.avg_score,
                }),
                generated_at: now,
            });
        }

        if let Some(highest) = industries
            .iter()
            .find(|trend| trend.count >= self.config.min_industry_samples)
        {
            insights.push(InsightRecord {
                insight_type: InsightType::IndustryLeader,
                text: format!(
                    "Industry with highest intelligence waste: {} (avg {:.1} from {} audits)",
                    highest.industry, highest.avg_waste, highest.count
                ),
                confidence: self.config.industry_leader_confidence,
                supporting_data: json!({
                    "industry": highest.industry,
                    "avg_waste": highest.avg_waste,
                    "sample_size": highest.count,
                }),
                generated_at: now,
            });
        }

        insights
    }
}
