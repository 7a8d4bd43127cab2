use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::workflows::assessment::{AssessmentOutcome, AssessmentSubmission, ZoneResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    /// Overall waste score folded per industry (frequency + running mean).
    IndustryWaste,
    /// Count of assessments whose top zone was a given zone.
    WasteZoneFrequency,
}

impl PatternType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IndustryWaste => "industry_waste",
            Self::WasteZoneFrequency => "waste_zone_frequency",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "industry_waste" => Some(Self::IndustryWaste),
            "waste_zone_frequency" => Some(Self::WasteZoneFrequency),
            _ => None,
        }
    }

    pub const fn tracks_average(self) -> bool {
        matches!(self, Self::IndustryWaste)
    }
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statistics returned by an upsert.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PatternStats {
    pub frequency: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average: Option<f64>,
}

impl PatternStats {
    /// Folds one more value into the statistics using the exact incremental mean.
    pub fn fold(previous: Option<PatternStats>, value: Option<f64>) -> PatternStats {
        match previous {
            None => PatternStats {
                frequency: 1,
                average: value,
            },
            Some(stats) => {
                let frequency = stats.frequency + 1;
                let average = match (stats.average, value) {
                    (Some(avg), Some(v)) => {
                        Some((avg * stats.frequency as f64 + v) / frequency as f64)
                    }
                    (None, Some(v)) => Some(v),
                    (avg, None) => avg,
                };
                PatternStats { frequency, average }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternRecord {
    pub pattern_type: PatternType,
    pub key: String,
    pub frequency: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average: Option<f64>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightType {
    WasteZoneLeader,
    IndustryLeader,
}

impl InsightType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WasteZoneLeader => "waste_zone_leader",
            Self::IndustryLeader => "industry_leader",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "waste_zone_leader" => Some(Self::WasteZoneLeader),
            "industry_leader" => Some(Self::IndustryLeader),
            _ => None,
        }
    }
}

/// Append-only statement about aggregate trends.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightRecord {
    pub insight_type: InsightType,
    pub text: String,
    pub confidence: f64,
    pub supporting_data: Value,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneFrequency {
    pub zone: String,
    pub frequency: u64,
    pub avg_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndustryTrend {
    pub industry: String,
    pub avg_waste: f64,
    pub count: u64,
}

/// Persisted form of a scored assessment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentRecord {
    pub company_name: Option<String>,
    pub industry: Option<String>,
    pub team_size: Option<String>,
    pub waste_score: u8,
    pub total_hours_wasted: u32,
    pub zones: Vec<ZoneResult>,
    pub recorded_at: DateTime<Utc>,
}

impl AssessmentRecord {
    pub fn new(
        submission: &AssessmentSubmission,
        outcome: &AssessmentOutcome,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            company_name: submission.company_name.clone(),
            industry: normalized_label(submission.industry.as_deref()),
            team_size: submission.team_size.clone(),
            waste_score: outcome.waste_score,
            total_hours_wasted: outcome.total_hours_wasted,
            zones: outcome.waste_zones.clone(),
            recorded_at,
        }
    }
}

/// Trims a label and drops it when blank.
pub fn normalized_label(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(str::to_string)
}
