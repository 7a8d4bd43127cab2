use super::catalog::CategoryDefinition;

pub const BASE_SCORE: u8 = 40;
pub const KEYWORD_BONUS: u8 = 10;
pub const MAX_SCORE: u8 = 100;

/// Scores a single answer. Returns `None` when the answer carries no signal.
pub fn score_response(category: &CategoryDefinition, text: Option<&str>) -> Option<u8> {
    let text = text.filter(|value| !value.is_empty())?;
    Some(score_text(category.keywords, text))
}

/// Base score plus a bonus per distinct keyword found as a case-insensitive substring.
pub fn score_text(keywords: &[&str], text: &str) -> u8 {
    let lowered = text.to_lowercase();
    let matched = keywords
        .iter()
        .filter(|keyword| lowered.contains(&keyword.to_lowercase()))
        .count();

    let score = u32::from(BASE_SCORE) + matched as u32 * u32::from(KEYWORD_BONUS);
    score.min(u32::from(MAX_SCORE)) as u8
}
