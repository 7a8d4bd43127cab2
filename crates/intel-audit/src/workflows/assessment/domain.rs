use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// One of the eight fixed questionnaire slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryId {
    Q1,
    Q2,
    Q3,
    Q4,
    Q5,
    Q6,
    Q7,
    Q8,
}

impl CategoryId {
    pub const fn ordered() -> [Self; 8] {
        [
            Self::Q1,
            Self::Q2,
            Self::Q3,
            Self::Q4,
            Self::Q5,
            Self::Q6,
            Self::Q7,
            Self::Q8,
        ]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Q1 => "q1",
            Self::Q2 => "q2",
            Self::Q3 => "q3",
            Self::Q4 => "q4",
            Self::Q5 => "q5",
            Self::Q6 => "q6",
            Self::Q7 => "q7",
            Self::Q8 => "q8",
        }
    }

    pub fn from_key(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ordered()
            .into_iter()
            .find(|id| id.key() == normalized)
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComplexityTier {
    Low,
    Medium,
    High,
    Varies,
}

impl ComplexityTier {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Varies => "Varies",
        }
    }
}

/// Free-text answers keyed by category. Missing, empty, or non-string answers carry no signal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AssessmentResponse {
    answers: BTreeMap<CategoryId, String>,
}

impl AssessmentResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_answer(mut self, category: CategoryId, text: impl Into<String>) -> Self {
        self.set(category, text);
        self
    }

    pub fn set(&mut self, category: CategoryId, text: impl Into<String>) {
        let text = text.into();
        if text.is_empty() {
            self.answers.remove(&category);
        } else {
            self.answers.insert(category, text);
        }
    }

    /// Returns the answer for a category, or `None` when it carries no signal.
    pub fn answer(&self, category: CategoryId) -> Option<&str> {
        self.answers.get(&category).map(String::as_str)
    }

    pub fn answered(&self) -> usize {
        self.answers.len()
    }

    /// Builds a response from loosely typed JSON, ignoring unknown keys and non-string values.
    pub fn from_json(value: &Value) -> Self {
        let mut response = Self::new();
        if let Value::Object(map) = value {
            for (key, value) in map {
                if let (Some(category), Value::String(text)) = (CategoryId::from_key(key), value) {
                    response.set(category, text.as_str());
                }
            }
        }
        response
    }
}

impl<'de> Deserialize<'de> for AssessmentResponse {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_json(&value))
    }
}

/// Actionable waste zone emitted for a category whose score clears the threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZoneResult {
    pub category: CategoryId,
    pub name: &'static str,
    pub score: u8,
    pub time_wasted: u32,
    pub complexity: ComplexityTier,
    pub roi: u16,
    pub recommendation: &'static str,
}

impl ZoneResult {
    pub fn is_quick_win(&self) -> bool {
        self.complexity == ComplexityTier::Low
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WasteUrgency {
    Critical,
    High,
    Medium,
    Low,
}

impl WasteUrgency {
    pub const fn from_score(score: u8) -> Self {
        if score >= 80 {
            Self::Critical
        } else if score >= 60 {
            Self::High
        } else if score >= 40 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssessmentOutcome {
    pub waste_score: u8,
    pub total_hours_wasted: u32,
    pub waste_zones: Vec<ZoneResult>,
    pub top_zone: Option<&'static str>,
    pub quick_wins: Vec<ZoneResult>,
}

impl AssessmentOutcome {
    pub fn urgency(&self) -> WasteUrgency {
        WasteUrgency::from_score(self.waste_score)
    }

    pub fn estimated_monthly_cost(&self, hourly_rate: u32) -> u64 {
        u64::from(self.total_hours_wasted) * u64::from(hourly_rate)
    }
}

/// Questionnaire submission with the labels used to tag pattern statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentSubmission {
    #[serde(default, deserialize_with = "lenient_label")]
    pub company_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_label")]
    pub industry: Option<String>,
    #[serde(default, deserialize_with = "lenient_label")]
    pub team_size: Option<String>,
    #[serde(default)]
    pub responses: AssessmentResponse,
}

impl AssessmentSubmission {
    pub fn new(responses: AssessmentResponse) -> Self {
        Self {
            responses,
            ..Self::default()
        }
    }

    pub fn with_industry(mut self, industry: impl Into<String>) -> Self {
        self.industry = Some(industry.into());
        self
    }

    pub fn with_company(mut self, company_name: impl Into<String>) -> Self {
        self.company_name = Some(company_name.into());
        self
    }
}

fn lenient_label<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let label = match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    };
    Ok(label.filter(|value| !value.is_empty()))
}
