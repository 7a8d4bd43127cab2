use super::catalog::CategoryDefinition;
use super::domain::ZoneResult;

/// Scores at or below this value produce no zone.
pub const ZONE_THRESHOLD: u8 = 30;

/// Emits a zone for each scored category above the threshold, in evaluation order.
pub fn classify(scored: &[(&CategoryDefinition, u8)]) -> Vec<ZoneResult> {
    scored
        .iter()
        .filter(|(_, score)| *score > ZONE_THRESHOLD)
        .map(|(category, score)| zone_for(category, *score))
        .collect()
}

pub fn zone_for(category: &CategoryDefinition, score: u8) -> ZoneResult {
    ZoneResult {
        category: category.id,
        name: category.zone_name,
        score,
        time_wasted: hours_wasted(score, category.hour_weight),
        complexity: category.complexity,
        roi: category.roi,
        recommendation: category.recommendation,
    }
}

/// floor(score / 100 * weight), computed in integers.
pub fn hours_wasted(score: u8, hour_weight: u32) -> u32 {
    u32::from(score) * hour_weight / 100
}
