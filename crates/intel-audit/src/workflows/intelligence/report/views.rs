use chrono::{DateTime, Utc};
use serde::Serialize;

use super::super::domain::{InsightRecord, InsightType, ZoneFrequency};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketOpportunity {
    pub opportunity: String,
    pub zone: String,
    pub market_size: u64,
    pub avg_pain: f64,
    pub potential_revenue: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightView {
    #[serde(rename = "type")]
    pub insight_type: InsightType,
    pub text: String,
    pub confidence: f64,
    pub generated_at: DateTime<Utc>,
}

impl From<InsightRecord> for InsightView {
    fn from(record: InsightRecord) -> Self {
        Self {
            insight_type: record.insight_type,
            text: record.text,
            confidence: record.confidence,
            generated_at: record.generated_at,
        }
    }
}

/// Market intelligence synthesized from the full assessment history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketReport {
    pub period: String,
    pub generated_at: DateTime<Utc>,
    pub total_audits: u64,
    pub avg_waste_score: f64,
    pub top_waste_zones: Vec<ZoneFrequency>,
    pub market_opportunities: Vec<MarketOpportunity>,
    pub insights: Vec<InsightView>,
    pub recommendations: Vec<String>,
}

impl MarketReport {
    pub fn is_empty(&self) -> bool {
        self.total_audits == 0
    }
}
