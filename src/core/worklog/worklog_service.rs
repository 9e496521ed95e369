// The Summary Query Engine. Every query re-reads the sheet through the
// RowStore port - no local caching, so replies can never be staler than the
// spreadsheet itself.

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use super::query::{Subject, WorkQuery};
use super::summary::{self, GroupedSummary};

// ============================================================================
// DOMAIN MODELS
// ============================================================================

/// One parsed row of the work sheet. Rows whose timestamp fails to parse
/// never make it this far.
#[derive(Debug, Clone)]
pub struct WorkRow {
    pub date: NaiveDate,
    pub name: String,
    pub game: String,
    pub work: String,
}

/// Reply to a `w` query. Not-found is a real outcome, not an error.
#[derive(Debug, Clone)]
pub enum SummaryReply {
    Found(GroupedSummary),
    NotFound { label: String, date: NaiveDate },
}

/// Reply to a `most` query.
#[derive(Debug, Clone)]
pub enum FrequencyReply {
    Found {
        start: NaiveDate,
        end: NaiveDate,
        top_n: usize,
        ranked: Vec<(String, usize)>,
    },
    Empty {
        start: NaiveDate,
        end: NaiveDate,
    },
}

#[derive(Debug, Error)]
pub enum WorklogError {
    #[error("Row store error: {0}")]
    Store(String),
}

// ============================================================================
// PORT
// ============================================================================

/// Read-only view over the work sheet.
#[async_trait]
pub trait RowStore: Send + Sync {
    async fn read_all(&self) -> Result<Vec<WorkRow>, WorklogError>;
}

// ============================================================================
// SERVICE
// ============================================================================

pub struct WorklogService<R: RowStore> {
    store: R,
}

impl<R: RowStore> WorklogService<R> {
    pub fn new(store: R) -> Self {
        Self { store }
    }

    /// Summarize one day's work for a name (or everyone). Name matching is
    /// exact but case-insensitive; the date must match exactly.
    pub async fn work_summary(&self, query: &WorkQuery) -> Result<SummaryReply, WorklogError> {
        let rows = self.store.read_all().await?;

        let matching: Vec<&WorkRow> = rows
            .iter()
            .filter(|row| row.date == query.date && subject_matches(&query.subject, &row.name))
            .collect();

        if matching.is_empty() {
            return Ok(SummaryReply::NotFound {
                label: query.subject.label(),
                date: query.date,
            });
        }

        let categories = summary::group_by_category(matching.iter().copied());

        // For `all`, follow the aggregate with a per-person breakdown in
        // first-seen order.
        let per_user = match query.subject {
            Subject::All => {
                let mut users: Vec<(String, Vec<&WorkRow>)> = Vec::new();
                for row in matching.iter().copied() {
                    let name = row.name.trim().to_string();
                    match users.iter_mut().find(|(n, _)| *n == name) {
                        Some((_, rows)) => rows.push(row),
                        None => users.push((name, vec![row])),
                    }
                }
                users
                    .into_iter()
                    .map(|(name, rows)| (name, summary::group_by_category(rows.iter().copied())))
                    .collect()
            }
            Subject::Named(_) => Vec::new(),
        };

        Ok(SummaryReply::Found(GroupedSummary {
            label: query.subject.label(),
            date: query.date,
            categories,
            per_user,
        }))
    }

    /// Rank games by how often they appear in rows dated within the
    /// inclusive range, ties broken by first appearance.
    pub async fn most_played(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        top_n: usize,
    ) -> Result<FrequencyReply, WorklogError> {
        let rows = self.store.read_all().await?;

        let mut counts: Vec<(String, usize)> = Vec::new();
        for row in &rows {
            if row.date < start || row.date > end {
                continue;
            }
            let game = row.game.trim();
            if game.is_empty() {
                continue;
            }
            match counts.iter_mut().find(|(name, _)| name == game) {
                Some((_, count)) => *count += 1,
                None => counts.push((game.to_string(), 1)),
            }
        }

        if counts.is_empty() {
            return Ok(FrequencyReply::Empty { start, end });
        }

        // sort_by is stable, so equal counts keep their encounter order.
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts.truncate(top_n);

        Ok(FrequencyReply::Found {
            start,
            end,
            top_n,
            ranked: counts,
        })
    }
}

fn subject_matches(subject: &Subject, row_name: &str) -> bool {
    match subject {
        Subject::All => true,
        Subject::Named(name) => row_name.trim().to_lowercase() == name.trim().to_lowercase(),
    }
}

// ============================================================================
// TESTS
// ============================================================================
