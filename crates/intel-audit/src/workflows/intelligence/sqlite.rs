use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, TransactionBehavior};

use super::domain::{
    AssessmentRecord, IndustryTrend, InsightRecord, InsightType, PatternRecord, PatternStats,
    PatternType, ZoneFrequency,
};
use super::repository::{PatternStore, StorageError};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS assessments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    company_name TEXT,
    industry TEXT,
    team_size TEXT,
    waste_score INTEGER NOT NULL,
    total_hours_wasted INTEGER NOT NULL,
    recorded_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS assessment_zones (
    assessment_id INTEGER NOT NULL REFERENCES assessments(id),
    category TEXT NOT NULL,
    waste_zone TEXT NOT NULL,
    waste_score INTEGER NOT NULL,
    time_wasted INTEGER NOT NULL,
    complexity TEXT NOT NULL,
    roi INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_assessment_zones_zone ON assessment_zones(waste_zone);
CREATE INDEX IF NOT EXISTS idx_assessments_industry ON assessments(industry);
CREATE TABLE IF NOT EXISTS patterns (
    pattern_type TEXT NOT NULL,
    pattern_key TEXT NOT NULL,
    frequency INTEGER NOT NULL,
    avg_score REAL,
    last_updated TEXT NOT NULL,
    PRIMARY KEY (pattern_type, pattern_key)
);
CREATE TABLE IF NOT EXISTS trend_batches (
    batch_index INTEGER PRIMARY KEY,
    claimed_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS insights (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    insight_type TEXT NOT NULL,
    insight_text TEXT NOT NULL,
    confidence REAL NOT NULL,
    supporting_data TEXT NOT NULL,
    generated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_insights_generated_at ON insights(generated_at);
";

// Folds the incoming value into the running mean using the row's pre-update values.
const UPSERT_PATTERN: &str = "
INSERT INTO patterns (pattern_type, pattern_key, frequency, avg_score, last_updated)
VALUES (?1, ?2, 1, ?3, ?4)
ON CONFLICT (pattern_type, pattern_key) DO UPDATE SET
    frequency = patterns.frequency + 1,
    avg_score = CASE
        WHEN excluded.avg_score IS NULL THEN patterns.avg_score
        WHEN patterns.avg_score IS NULL THEN excluded.avg_score
        ELSE (patterns.avg_score * patterns.frequency + excluded.avg_score)
             / (patterns.frequency + 1)
    END,
    last_updated = excluded.last_updated
RETURNING frequency, avg_score
";

/// SQLite-backed store. Writes go through one connection guarded by a mutex and use
/// single-statement upserts, so concurrent writers on the same key never lose updates.
pub struct SqlitePatternStore {
    conn: Mutex<Connection>,
}

impl SqlitePatternStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(map_sqlite_error)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))
            .map_err(map_sqlite_error)?;
        Self::initialize(conn)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(map_sqlite_error)?;
        Self::initialize(conn)
    }

    fn initialize(conn: Connection) -> Result<Self, StorageError> {
        conn.busy_timeout(Duration::from_secs(5))
            .map_err(map_sqlite_error)?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(map_sqlite_error)?;
        conn.execute_batch(SCHEMA).map_err(map_sqlite_error)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Corrupt("sqlite connection mutex poisoned".to_string()))
    }
}

impl PatternStore for SqlitePatternStore {
    fn record_assessment(&self, record: &AssessmentRecord) -> Result<u64, StorageError> {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(map_sqlite_error)?;

        tx.execute(
            "INSERT INTO assessments
                (company_name, industry, team_size, waste_score, total_hours_wasted, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.company_name,
                record.industry,
                record.team_size,
                record.waste_score,
                record.total_hours_wasted,
                timestamp(record.recorded_at),
            ],
        )
        .map_err(map_sqlite_error)?;
        let assessment_id = tx.last_insert_rowid();

        for zone in &record.zones {
            tx.execute(
                "INSERT INTO assessment_zones
                    (assessment_id, category, waste_zone, waste_score, time_wasted, complexity, roi)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    assessment_id,
                    zone.category.key(),
                    zone.name,
                    zone.score,
                    zone.time_wasted,
                    zone.complexity.label(),
                    zone.roi,
                ],
            )
            .map_err(map_sqlite_error)?;
        }

        let ordinal: i64 = tx
            .query_row("SELECT COUNT(*) FROM assessments", [], |row| row.get(0))
            .map_err(map_sqlite_error)?;
        tx.commit().map_err(map_sqlite_error)?;
        Ok(ordinal as u64)
    }

    fn upsert_pattern(
        &self,
        pattern_type: PatternType,
        key: &str,
        value: Option<f64>,
    ) -> Result<PatternStats, StorageError> {
        let value = value.filter(|_| pattern_type.tracks_average());
        let conn = self.conn()?;
        let (frequency, average): (i64, Option<f64>) = conn
            .query_row(
                UPSERT_PATTERN,
                params![pattern_type.as_str(), key, value, timestamp(Utc::now())],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(map_sqlite_error)?;

        Ok(PatternStats {
            frequency: frequency as u64,
            average,
        })
    }

    fn count_assessments(&self) -> Result<u64, StorageError> {
        let conn = self.conn()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM assessments", [], |row| row.get(0))
            .map_err(map_sqlite_error)?;
        Ok(count as u64)
    }

    fn average_waste_score(&self) -> Result<Option<f64>, StorageError> {
        let conn = self.conn()?;
        conn.query_row("SELECT AVG(waste_score) FROM assessments", [], |row| {
            row.get::<_, Option<f64>>(0)
        })
        .map_err(map_sqlite_error)
    }

    fn query_top_zones(&self, limit: usize) -> Result<Vec<ZoneFrequency>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT waste_zone, COUNT(*) AS frequency, AVG(waste_score) AS avg_score
                 FROM assessment_zones
                 GROUP BY waste_zone
                 ORDER BY frequency DESC, waste_zone ASC
                 LIMIT ?1",
            )
            .map_err(map_sqlite_error)?;

        let zones = stmt
            .query_map([limit as i64], |row| {
                Ok(ZoneFrequency {
                    zone: row.get(0)?,
                    frequency: row.get::<_, i64>(1)? as u64,
                    avg_score: row.get(2)?,
                })
            })
            .map_err(map_sqlite_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_sqlite_error)?;
        Ok(zones)
    }

    fn query_industry_trends(
        &self,
        min_samples: u64,
    ) -> Result<Vec<IndustryTrend>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT industry, AVG(waste_score) AS avg_waste, COUNT(*) AS count
                 FROM assessments
                 WHERE industry IS NOT NULL
                 GROUP BY industry
                 HAVING COUNT(*) >= ?1
                 ORDER BY avg_waste DESC, industry ASC",
            )
            .map_err(map_sqlite_error)?;

        let trends = stmt
            .query_map([min_samples as i64], |row| {
                Ok(IndustryTrend {
                    industry: row.get(0)?,
                    avg_waste: row.get(1)?,
                    count: row.get::<_, i64>(2)? as u64,
                })
            })
            .map_err(map_sqlite_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_sqlite_error)?;
        Ok(trends)
    }

    fn claim_batch(&self, batch_index: u64) -> Result<bool, StorageError> {
        let conn = self.conn()?;
        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO trend_batches (batch_index, claimed_at) VALUES (?1, ?2)",
                params![batch_index as i64, timestamp(Utc::now())],
            )
            .map_err(map_sqlite_error)?;
        Ok(inserted == 1)
    }

    fn insert_insight(&self, record: &InsightRecord) -> Result<(), StorageError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO insights
                (insight_type, insight_text, confidence, supporting_data, generated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.insight_type.as_str(),
                record.text,
                record.confidence,
                record.supporting_data.to_string(),
                timestamp(record.generated_at),
            ],
        )
        .map_err(map_sqlite_error)?;
        Ok(())
    }

    fn query_recent_insights(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<InsightRecord>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT insight_type, insight_text, confidence, supporting_data, generated_at
                 FROM insights
                 WHERE generated_at >= ?1
                 ORDER BY confidence DESC, generated_at DESC
                 LIMIT ?2",
            )
            .map_err(map_sqlite_error)?;

        let rows = stmt
            .query_map(params![timestamp(since), limit as i64], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .map_err(map_sqlite_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_sqlite_error)?;

        rows.into_iter()
            .map(|(insight_type, text, confidence, supporting, generated_at)| {
                let insight_type = InsightType::parse(&insight_type).ok_or_else(|| {
                    StorageError::Corrupt(format!("unknown insight type '{insight_type}'"))
                })?;
                let supporting_data = serde_json::from_str(&supporting)
                    .map_err(|err| StorageError::Corrupt(format!("supporting data: {err}")))?;
                Ok(InsightRecord {
                    insight_type,
                    text,
                    confidence,
                    supporting_data,
                    generated_at: parse_timestamp(&generated_at)?,
                })
            })
            .collect()
    }

    fn list_patterns(&self) -> Result<Vec<PatternRecord>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT pattern_type, pattern_key, frequency, avg_score, last_updated
                 FROM patterns
                 ORDER BY pattern_type, pattern_key",
            )
            .map_err(map_sqlite_error)?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, Option<f64>>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .map_err(map_sqlite_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_sqlite_error)?;

        rows.into_iter()
            .map(|(pattern_type, key, frequency, average, last_updated)| {
                let pattern_type = PatternType::parse(&pattern_type).ok_or_else(|| {
                    StorageError::Corrupt(format!("unknown pattern type '{pattern_type}'"))
                })?;
                Ok(PatternRecord {
                    pattern_type,
                    key,
                    frequency: frequency as u64,
                    average,
                    last_updated: parse_timestamp(&last_updated)?,
                })
            })
            .collect()
    }
}

impl SqlitePatternStore {
    pub fn pattern(
        &self,
        pattern_type: PatternType,
        key: &str,
    ) -> Result<Option<PatternStats>, StorageError> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT frequency, avg_score FROM patterns WHERE pattern_type = ?1 AND pattern_key = ?2",
            params![pattern_type.as_str(), key],
            |row| {
                Ok(PatternStats {
                    frequency: row.get::<_, i64>(0)? as u64,
                    average: row.get(1)?,
                })
            },
        )
        .optional()
        .map_err(map_sqlite_error)
    }
}

// Fixed-width UTC timestamps keep lexical and chronological order identical.
fn timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|err| StorageError::Corrupt(format!("timestamp '{value}': {err}")))
}

fn map_sqlite_error(err: rusqlite::Error) -> StorageError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _) => match failure.code {
            ErrorCode::DatabaseBusy
            | ErrorCode::DatabaseLocked
            | ErrorCode::CannotOpen
            | ErrorCode::SystemIoFailure => StorageError::Unavailable(err.to_string()),
            ErrorCode::ConstraintViolation => StorageError::Constraint(err.to_string()),
            _ => StorageError::Corrupt(err.to_string()),
        },
        _ => StorageError::Corrupt(err.to_string()),
    }
}
