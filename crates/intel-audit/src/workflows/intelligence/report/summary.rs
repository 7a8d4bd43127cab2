use chrono::{DateTime, Duration, Utc};

use super::super::config::IntelligenceConfig;
use super::super::domain::ZoneFrequency;
use super::super::repository::{PatternStore, StorageError};
use super::super::retry::RetryPolicy;
use super::views::{InsightView, MarketOpportunity, MarketReport};

/// Read-only routine combining stored statistics and insights into a market report.
///
/// The individual queries are not taken from one snapshot; concurrent writes may land
/// between them.
pub struct ReportSynthesizer<'a> {
    config: &'a IntelligenceConfig,
    retry: RetryPolicy,
}

impl<'a> ReportSynthesizer<'a> {
    pub fn new(config: &'a IntelligenceConfig, retry: RetryPolicy) -> Self {
        Self { config, retry }
    }

    pub fn synthesize<S>(&self, store: &S, now: DateTime<Utc>) -> Result<MarketReport, StorageError>
    where
        S: PatternStore + ?Sized,
    {
        let total_audits = self
            .retry
            .run("count_assessments", || store.count_assessments())?;
        let avg_waste_score = self
            .retry
            .run("average_waste_score", || store.average_waste_score())?
            .unwrap_or(0.0);
        let top_waste_zones = self.retry.run("query_top_zones", || {
            store.query_top_zones(self.config.report_zone_limit)
        })?;

        let since = now - Duration::days(self.config.insight_window_days);
        let insights = self
            .retry
            .run("query_recent_insights", || {
                store.query_recent_insights(since, self.config.insight_limit)
            })?
            .into_iter()
            .map(InsightView::from)
            .collect();

        let market_opportunities = self.market_opportunities(&top_waste_zones);
        let recommendations = self.recommendations(&market_opportunities);

        Ok(MarketReport {
            period: format!("Last {} days", self.config.insight_window_days),
            generated_at: now,
            total_audits,
            avg_waste_score,
            top_waste_zones,
            market_opportunities,
            insights,
            recommendations,
        })
    }

    /// Frequent zones become template opportunities; the rest are not yet worth building.
    pub fn market_opportunities(&self, zones: &[ZoneFrequency]) -> Vec<MarketOpportunity> {
        zones
            .iter()
            .take(self.config.opportunity_pool)
            .filter(|zone| zone.frequency >= self.config.opportunity_min_frequency)
            .map(|zone| MarketOpportunity {
                opportunity: format!("Build {} AI template", zone.zone),
                zone: zone.zone.clone(),
                market_size: zone.frequency,
                avg_pain: zone.avg_score,
                potential_revenue: zone.frequency.saturating_mul(self.config.revenue_per_client),
            })
            .collect()
    }

    pub fn recommendations(&self, opportunities: &[MarketOpportunity]) -> Vec<String> {
        opportunities
            .first()
            .map(|top| {
                format!(
                    "BUILD: {} - {} companies need this ({} {} potential)",
                    top.opportunity,
                    top.market_size,
                    self.config.currency,
                    group_thousands(top.potential_revenue)
                )
            })
            .into_iter()
            .collect()
    }
}

/// Formats an integer with comma thousands separators.
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}
