// RowStore implementation over the form responses worksheet.
//
// Sheet columns: Timestamp | Game | Branch | Name | Work. The header row is
// excluded by starting the range at row 2. Branch is never used by the
// summary queries, so it is not carried into WorkRow.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::sync::Arc;

use super::sheets_client::SheetsClient;
use crate::core::worklog::{RowStore, WorkRow, WorklogError};

/// Format Google Forms writes into the timestamp column.
const TIMESTAMP_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

pub struct SheetRowStore {
    client: Arc<SheetsClient>,
    spreadsheet_id: String,
    worksheet: String,
}

impl SheetRowStore {
    pub fn new(client: Arc<SheetsClient>, spreadsheet_id: String, worksheet: String) -> Self {
        Self {
            client,
            spreadsheet_id,
            worksheet,
        }
    }

    fn range(&self) -> String {
        format!("{}!A2:E", self.worksheet)
    }
}

/// Parse one raw sheet row. Rows with a missing or unparseable timestamp are
/// dropped by the caller.
fn parse_work_row(cells: &[String]) -> Option<WorkRow> {
    let timestamp = cells.first()?.trim();
    let parsed = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).ok()?;

    let cell = |index: usize| {
        cells
            .get(index)
            .map(|value| value.trim().to_string())
            .unwrap_or_default()
    };

    Some(WorkRow {
        date: parsed.date(),
        game: cell(1),
        name: cell(3),
        work: cell(4),
    })
}

#[async_trait]
impl RowStore for SheetRowStore {
    async fn read_all(&self) -> Result<Vec<WorkRow>, WorklogError> {
        let values = self
            .client
            .get_values(&self.spreadsheet_id, &self.range())
            .await
            .map_err(|e| WorklogError::Store(e.to_string()))?;

        let mut rows = Vec::with_capacity(values.len());
        for cells in &values {
            match parse_work_row(cells) {
                Some(row) => rows.push(row),
                None => tracing::debug!(?cells, "Skipping sheet row with bad timestamp"),
            }
        }
        Ok(rows)
    }
}
