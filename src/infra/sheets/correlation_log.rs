// CorrelationLog implementation over a second worksheet in the same
// spreadsheet. Columns: message_id | game | branch | work, all lower-cased
// at write time. The sheet is append-only; `find_latest` scans the rows in
// reverse so the newest record for a key wins.

use async_trait::async_trait;
use std::sync::Arc;

use super::sheets_client::SheetsClient;
use crate::core::announce::{AnnounceError, AnnouncementKey, AnnouncementRecord, CorrelationLog};

pub struct SheetCorrelationLog {
    client: Arc<SheetsClient>,
    spreadsheet_id: String,
    worksheet: String,
}

impl SheetCorrelationLog {
    pub fn new(client: Arc<SheetsClient>, spreadsheet_id: String, worksheet: String) -> Self {
        Self {
            client,
            spreadsheet_id,
            worksheet,
        }
    }

    fn range(&self) -> String {
        format!("{}!A2:D", self.worksheet)
    }
}

fn record_to_cells(record: &AnnouncementRecord) -> Vec<String> {
    vec![
        record.message_id.to_string(),
        record.key.game.to_lowercase(),
        record.key.branch.to_lowercase(),
        record.key.work.to_lowercase(),
    ]
}

/// Parse one log row. Trims and lower-cases so hand-edited rows still match.
fn parse_record(cells: &[String]) -> Option<AnnouncementRecord> {
    let message_id = cells.first()?.trim().parse().ok()?;
    let cell = |index: usize| {
        cells
            .get(index)
            .map(|value| value.trim().to_lowercase())
            .unwrap_or_default()
    };

    Some(AnnouncementRecord {
        message_id,
        key: AnnouncementKey {
            game: cell(1),
            branch: cell(2),
            work: cell(3),
        },
    })
}

fn latest_match(values: &[Vec<String>], key: &AnnouncementKey) -> Option<AnnouncementRecord> {
    values
        .iter()
        .rev()
        .filter_map(|cells| parse_record(cells))
        .find(|record| &record.key == key)
}

#[async_trait]
impl CorrelationLog for SheetCorrelationLog {
    async fn append(&self, record: &AnnouncementRecord) -> Result<(), AnnounceError> {
        self.client
            .append_row(&self.spreadsheet_id, &self.range(), &record_to_cells(record))
            .await
            .map_err(|e| AnnounceError::Log(e.to_string()))
    }

    async fn find_latest(
        &self,
        key: &AnnouncementKey,
    ) -> Result<Option<AnnouncementRecord>, AnnounceError> {
        let values = self
            .client
            .get_values(&self.spreadsheet_id, &self.range())
            .await
            .map_err(|e| AnnounceError::Log(e.to_string()))?;

        Ok(latest_match(&values, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(game: &str, branch: &str, work: &str) -> AnnouncementKey {
        AnnouncementKey {
            game: game.to_string(),
            branch: branch.to_string(),
            work: work.to_string(),
        }
    }

    fn row(id: &str, game: &str, branch: &str, work: &str) -> Vec<String> {
        vec![
            id.to_string(),
            game.to_string(),
            branch.to_string(),
            work.to_string(),
        ]
    }

    #[test]
    fn records_are_written_lower_cased() {
        let record = AnnouncementRecord {
            message_id: 42,
            key: key("Chess", "HQ", "Repair"),
        };
        assert_eq!(record_to_cells(&record), vec!["42", "chess", "hq", "repair"]);
    }

    #[test]
    fn round_trips_through_sheet_cells() {
        let record = AnnouncementRecord {
            message_id: 42,
            key: key("chess", "hq", "repair"),
        };
        assert_eq!(parse_record(&record_to_cells(&record)), Some(record));
    }

    #[test]
    fn latest_row_wins_for_duplicate_keys() {
        let values = vec![
            row("1", "chess", "hq", "repair"),
            row("2", "go", "hq", "repair"),
            row("3", "chess", "hq", "repair"),
        ];

        let found = latest_match(&values, &key("chess", "hq", "repair")).unwrap();
        assert_eq!(found.message_id, 3);
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let values = vec![
            row("not-a-number", "chess", "hq", "repair"),
            row("7", "chess", "hq", "repair"),
        ];

        let found = latest_match(&values, &key("chess", "hq", "repair")).unwrap();
        assert_eq!(found.message_id, 7);
    }

    #[test]
    fn hand_edited_rows_still_match() {
        let values = vec![row("9", " Chess ", "HQ", " Repair")];
        let found = latest_match(&values, &key("chess", "hq", "repair")).unwrap();
        assert_eq!(found.message_id, 9);
    }

    #[test]
    fn missing_key_yields_none() {
        let values = vec![row("1", "chess", "hq", "repair")];
        assert!(latest_match(&values, &key("go", "hq", "repair")).is_none());
    }
}
