use super::domain::{AssessmentOutcome, AssessmentResponse, CategoryId, ComplexityTier};
use super::{classifier, outcome, scorer};

/// Static description of one questionnaire category and the waste zone it maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryDefinition {
    pub id: CategoryId,
    pub keywords: &'static [&'static str],
    pub zone_name: &'static str,
    pub complexity: ComplexityTier,
    pub roi: u16,
    /// Monthly hours wasted when the category scores 100.
    pub hour_weight: u32,
    pub recommendation: &'static str,
}

/// Ordered table of category definitions used to score an assessment.
#[derive(Debug, Clone)]
pub struct WasteCatalog {
    categories: Vec<CategoryDefinition>,
}

impl WasteCatalog {
    pub fn standard() -> Self {
        Self {
            categories: STANDARD_CATEGORIES.to_vec(),
        }
    }

    /// Builds a catalog from a custom table. Evaluation order follows the slice order.
    pub fn from_definitions(categories: Vec<CategoryDefinition>) -> Self {
        Self { categories }
    }

    pub fn categories(&self) -> &[CategoryDefinition] {
        &self.categories
    }

    pub fn category(&self, id: CategoryId) -> Option<&CategoryDefinition> {
        self.categories.iter().find(|category| category.id == id)
    }

    pub fn analyze(&self, responses: &AssessmentResponse) -> AssessmentOutcome {
        let scored: Vec<_> = self
            .categories
            .iter()
            .filter_map(|category| {
                scorer::score_response(category, responses.answer(category.id))
                    .map(|score| (category, score))
            })
            .collect();

        let zones = classifier::classify(&scored);
        let raw_scores: Vec<u8> = scored.iter().map(|(_, score)| *score).collect();
        outcome::aggregate(zones, &raw_scores)
    }
}

impl Default for WasteCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

pub static STANDARD_CATEGORIES: [CategoryDefinition; 8] = [
    CategoryDefinition {
        id: CategoryId::Q1,
        keywords: &["every", "always", "repeatedly", "constantly", "daily"],
        zone_name: "Knowledge Bottleneck",
        complexity: ComplexityTier::Low,
        roi: 250,
        hour_weight: 20,
        recommendation:
            "Build internal knowledge base with AI search. Eliminate repeat explanations.",
    },
    CategoryDefinition {
        id: CategoryId::Q2,
        keywords: &["same", "metrics", "reports", "dashboard", "spreadsheet"],
        zone_name: "Repetitive Analysis",
        complexity: ComplexityTier::Medium,
        roi: 180,
        hour_weight: 30,
        recommendation:
            "Automate recurring analysis with AI dashboard. Decision-ready insights instantly.",
    },
    CategoryDefinition {
        id: CategoryId::Q3,
        keywords: &["look up", "search", "find", "minutes", "time"],
        zone_name: "Information Access Gap",
        complexity: ComplexityTier::Low,
        roi: 300,
        hour_weight: 15,
        recommendation:
            "Build AI customer support layer. Instant answers from company knowledge.",
    },
    CategoryDefinition {
        id: CategoryId::Q4,
        keywords: &["manual", "combine", "multiple", "sources", "compile"],
        zone_name: "Data Integration Gap",
        complexity: ComplexityTier::Medium,
        roi: 200,
        hour_weight: 40,
        recommendation:
            "Connect data sources with automated pipeline. Real-time unified reports.",
    },
    CategoryDefinition {
        id: CategoryId::Q5,
        keywords: &["if", "then", "check", "verify", "approve"],
        zone_name: "Rule-Based Decisions",
        complexity: ComplexityTier::Low,
        roi: 220,
        hour_weight: 25,
        recommendation:
            "Automate if/then logic with AI monitoring. Human only for exceptions.",
    },
    CategoryDefinition {
        id: CategoryId::Q6,
        keywords: &["better way", "frustrated", "waste", "inefficient"],
        zone_name: "Acknowledged Pain Points",
        complexity: ComplexityTier::Varies,
        roi: 150,
        hour_weight: 35,
        recommendation: "High-priority fix. Team already knows this needs solving.",
    },
    CategoryDefinition {
        id: CategoryId::Q7,
        keywords: &["repetitive", "copy", "paste", "same thing", "no thinking"],
        zone_name: "Mechanical Tasks",
        complexity: ComplexityTier::Low,
        roi: 280,
        hour_weight: 45,
        recommendation: "Pure automation opportunity. No creativity required, high ROI.",
    },
    CategoryDefinition {
        id: CategoryId::Q8,
        keywords: &["only", "person", "knows", "head", "ask"],
        zone_name: "Knowledge Silos",
        complexity: ComplexityTier::Medium,
        roi: 190,
        hour_weight: 20,
        recommendation:
            "Capture tribal knowledge in AI system. Team-wide access, not person-dependent.",
    },
];
