//! CSV import of historical questionnaires.
//!
//! Rows go through [`IntelligenceService::submit`], so imported history updates pattern
//! statistics and crosses batch boundaries exactly like live submissions.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer};
use tracing::{debug, info};

use crate::workflows::assessment::{AssessmentResponse, AssessmentSubmission, CategoryId};

use super::repository::PatternStore;
use super::service::IntelligenceService;

#[derive(Debug)]
pub enum ImportError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportError::Io(err) => write!(f, "failed to read assessment export: {}", err),
            ImportError::Csv(err) => write!(f, "invalid assessment CSV data: {}", err),
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImportError::Io(err) => Some(err),
            ImportError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Totals reported after an import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct ImportSummary {
    pub rows: usize,
    pub imported: usize,
    pub skipped: usize,
    /// Rows scored but not persisted because the store refused them.
    pub unrecorded: usize,
    pub insights_generated: usize,
}

pub fn import_from_path<S, P>(
    service: &IntelligenceService<S>,
    path: P,
) -> Result<ImportSummary, ImportError>
where
    S: PatternStore + 'static,
    P: AsRef<Path>,
{
    let file = File::open(path)?;
    import_assessments(service, file)
}

pub fn import_assessments<S, R>(
    service: &IntelligenceService<S>,
    reader: R,
) -> Result<ImportSummary, ImportError>
where
    S: PatternStore + 'static,
    R: Read,
{
    let rows = parse_rows(reader)?;
    let mut summary = ImportSummary {
        rows: rows.len(),
        ..ImportSummary::default()
    };

    for (line, submission) in rows.into_iter().enumerate() {
        let Some(submission) = submission else {
            debug!(row = line + 1, "row has no answers; skipped");
            summary.skipped += 1;
            continue;
        };

        let receipt = service.submit(submission);
        summary.imported += 1;
        if receipt.assessment_id.is_none() {
            summary.unrecorded += 1;
        }
        summary.insights_generated += receipt.insights_generated;
    }

    info!(
        rows = summary.rows,
        imported = summary.imported,
        skipped = summary.skipped,
        insights = summary.insights_generated,
        "assessment import finished"
    );
    Ok(summary)
}

/// Parses every row; rows without any answer come back as `None`.
pub fn parse_rows<R: Read>(reader: R) -> Result<Vec<Option<AssessmentSubmission>>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut submissions = Vec::new();

    for record in csv_reader.deserialize::<AssessmentRow>() {
        submissions.push(record?.into_submission());
    }

    Ok(submissions)
}

#[derive(Debug, Deserialize)]
struct AssessmentRow {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    company_name: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    industry: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    team_size: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    q1: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    q2: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    q3: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    q4: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    q5: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    q6: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    q7: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    q8: Option<String>,
}

impl AssessmentRow {
    fn into_submission(self) -> Option<AssessmentSubmission> {
        let answers = [
            (CategoryId::Q1, self.q1),
            (CategoryId::Q2, self.q2),
            (CategoryId::Q3, self.q3),
            (CategoryId::Q4, self.q4),
            (CategoryId::Q5, self.q5),
            (CategoryId::Q6, self.q6),
            (CategoryId::Q7, self.q7),
            (CategoryId::Q8, self.q8),
        ];

        let mut responses = AssessmentResponse::new();
        for (category, answer) in answers {
            if let Some(text) = answer {
                responses.set(category, text);
            }
        }
        if responses.answered() == 0 {
            return None;
        }

        Some(AssessmentSubmission {
            company_name: self.company_name,
            industry: self.industry,
            team_size: self.team_size,
            responses,
        })
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
