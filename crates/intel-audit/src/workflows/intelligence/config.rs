use serde::{Deserialize, Serialize};

/// Tunables for trend analysis and report synthesis.
///
/// The confidence values are fixed heuristics attached to generated insights, not
/// statistical estimates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntelligenceConfig {
    /// Trend analysis runs whenever the assessment count is a multiple of this value.
    pub batch_size: u64,
    pub min_industry_samples: u64,
    pub analysis_zone_limit: usize,
    pub zone_leader_confidence: f64,
    pub industry_leader_confidence: f64,
    pub report_zone_limit: usize,
    pub opportunity_pool: usize,
    pub opportunity_min_frequency: u64,
    pub revenue_per_client: u64,
    pub insight_window_days: i64,
    pub insight_limit: usize,
    pub hourly_cost_rate: u32,
    pub currency: String,
}

impl Default for IntelligenceConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            min_industry_samples: 3,
            analysis_zone_limit: 5,
            zone_leader_confidence: 0.95,
            industry_leader_confidence: 0.90,
            report_zone_limit: 10,
            opportunity_pool: 3,
            opportunity_min_frequency: 5,
            revenue_per_client: 5_000,
            insight_window_days: 30,
            insight_limit: 5,
            hourly_cost_rate: 50,
            currency: "KSh".to_string(),
        }
    }
}
