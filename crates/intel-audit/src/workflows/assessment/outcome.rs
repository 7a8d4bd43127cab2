use super::domain::{AssessmentOutcome, ZoneResult};

/// Folds zones and raw category scores into the assessment outcome.
///
/// The headline score averages every answered category, while the hours total only
/// counts categories that produced a zone.
pub fn aggregate(mut zones: Vec<ZoneResult>, raw_scores: &[u8]) -> AssessmentOutcome {
    let waste_score = if raw_scores.is_empty() {
        0
    } else {
        let total: u32 = raw_scores.iter().map(|score| u32::from(*score)).sum();
        (total / raw_scores.len() as u32) as u8
    };

    // stable: equal ROI keeps category order
    zones.sort_by(|a, b| b.roi.cmp(&a.roi));

    let total_hours_wasted = zones.iter().map(|zone| zone.time_wasted).sum();
    let top_zone = zones.first().map(|zone| zone.name);
    let quick_wins = zones
        .iter()
        .filter(|zone| zone.is_quick_win())
        .cloned()
        .collect();

    AssessmentOutcome {
        waste_score,
        total_hours_wasted,
        waste_zones: zones,
        top_zone,
        quick_wins,
    }
}
