// This is the announce module - it contains ALL the business logic for the
// webhook-driven announcement flow. Notice how this module has NO Discord or
// HTTP code (no serenity, no axum imports). It works with plain strings and
// u64 message ids so the dispatch rules can be tested with in-memory fakes.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Marker token a form submission carries when it should open a new
/// announcement instead of resolving an existing one.
pub const DEFAULT_MARKER: &str = "[แจ้ง]";

/// First line of every posted announcement. The history-scan fallback uses it
/// to tell our messages apart from unrelated channel chatter.
pub const ANNOUNCEMENT_HEADER: &str = "📢 แจ้งเตือนจาก Google Form";

// ============================================================================
// DOMAIN MODELS
// ============================================================================

/// One Google Form entry, exactly as it arrived at the webhook boundary.
/// Fields may be blank; nothing here is normalized yet.
#[derive(Debug, Clone)]
pub struct SubmissionEvent {
    pub timestamp: String,
    pub game: String,
    pub branch: String,
    pub name: String,
    pub work: String,
}

/// Normalized correlation key: trimmed, lower-cased, marker stripped from the
/// work description. Two submissions about the same piece of work always
/// produce the same key regardless of spacing or capitalisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnouncementKey {
    pub game: String,
    pub branch: String,
    pub work: String,
}

impl AnnouncementKey {
    pub fn from_submission(event: &SubmissionEvent, marker: &str) -> Self {
        Self {
            game: event.game.trim().to_lowercase(),
            branch: event.branch.trim().to_lowercase(),
            work: event.work.replace(marker, "").trim().to_lowercase(),
        }
    }
}

/// Persisted correlation entry: which message announced which key.
/// Records are append-only; later duplicates of a key simply shadow earlier
/// ones because lookups take the most recent match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnouncementRecord {
    pub message_id: u64,
    pub key: AnnouncementKey,
}

/// What dispatching one submission actually did. `NoMatch` and `Skipped` are
/// ordinary outcomes, not errors - the Discord layer and webhook handler only
/// need to report them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Blank work field; nothing to announce.
    Skipped,
    Created { message_id: u64 },
    Edited { message_id: u64 },
    /// Edit requested but no live announcement matched the key.
    NoMatch,
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum AnnounceError {
    #[error("Channel error: {0}")]
    Channel(String),

    #[error("Correlation log error: {0}")]
    Log(String),
}

// ============================================================================
// PORTS
// ============================================================================
// The core defines WHAT it needs from the outside world, not HOW it is done.
// The infra layer backs these with Google Sheets and the Discord REST API;
// tests back them with vectors behind a mutex.

/// Append-only table mapping announcement keys to posted message ids.
#[async_trait]
pub trait CorrelationLog: Send + Sync {
    async fn append(&self, record: &AnnouncementRecord) -> Result<(), AnnounceError>;

    /// Most recent record for the key, scanning in reverse append order.
    async fn find_latest(
        &self,
        key: &AnnouncementKey,
    ) -> Result<Option<AnnouncementRecord>, AnnounceError>;
}

/// The one channel announcements land in.
#[async_trait]
pub trait AnnouncementChannel: Send + Sync {
    async fn send(&self, text: &str) -> Result<u64, AnnounceError>;
    async fn fetch(&self, message_id: u64) -> Result<String, AnnounceError>;
    async fn edit(&self, message_id: u64, text: &str) -> Result<(), AnnounceError>;
}

// ============================================================================
// SERVICE
// ============================================================================

/// Decides create-vs-edit for each incoming submission and performs the
/// corresponding channel operation. At most one send, one fetch and one edit
/// per event; no retries anywhere - a failed call drops the event.
pub struct AnnounceService {
    log: Arc<dyn CorrelationLog>,
    channel: Arc<dyn AnnouncementChannel>,
    marker: String,
}

impl AnnounceService {
    pub fn new(
        log: Arc<dyn CorrelationLog>,
        channel: Arc<dyn AnnouncementChannel>,
        marker: impl Into<String>,
    ) -> Self {
        Self {
            log,
            channel,
            marker: marker.into(),
        }
    }

    /// Handle one submission event end to end.
    ///
    /// Marker present -> compose and send a new announcement, then record its
    /// message id in the correlation log (append happens only after the send
    /// is confirmed). Marker absent -> look up the latest record for the
    /// normalized key and strike the referenced message through, crediting
    /// the submitter. A vanished message or an unknown key resolves to
    /// `NoMatch` rather than an error.
    pub async fn handle(&self, event: &SubmissionEvent) -> Result<DispatchOutcome, AnnounceError> {
        if event.work.trim().is_empty() {
            tracing::info!("Submission has empty work field; ignoring");
            return Ok(DispatchOutcome::Skipped);
        }

        let key = AnnouncementKey::from_submission(event, &self.marker);

        if event.work.contains(&self.marker) {
            let body = self.compose_announcement(event);
            let message_id = self.channel.send(&body).await?;
            tracing::info!(
                message_id,
                game = %key.game,
                branch = %key.branch,
                "Posted new announcement"
            );

            // The message is already live at this point. If the append fails
            // the caller sees an error, but there is no rollback - at-most-once
            // per event, never exactly-once.
            self.log
                .append(&AnnouncementRecord { message_id, key })
                .await?;

            Ok(DispatchOutcome::Created { message_id })
        } else {
            let record = match self.log.find_latest(&key).await? {
                Some(record) => record,
                None => {
                    tracing::warn!(
                        game = %key.game,
                        branch = %key.branch,
                        work = %key.work,
                        "No matching announcement found to edit"
                    );
                    return Ok(DispatchOutcome::NoMatch);
                }
            };

            let original = match self.channel.fetch(record.message_id).await {
                Ok(content) => content,
                Err(err) => {
                    // Stale id: the announcement was deleted or the log entry
                    // outlived the message. Recoverable, report as no match.
                    tracing::warn!(
                        message_id = record.message_id,
                        error = %err,
                        "Announcement message is gone; treating as no match"
                    );
                    return Ok(DispatchOutcome::NoMatch);
                }
            };

            let updated = format!("~~{}~~\n⭐️{}", original, event.name.trim());
            self.channel.edit(record.message_id, &updated).await?;
            tracing::info!(message_id = record.message_id, "Resolved announcement");

            Ok(DispatchOutcome::Edited {
                message_id: record.message_id,
            })
        }
    }

    fn compose_announcement(&self, event: &SubmissionEvent) -> String {
        format!(
            "{}\nTimestamps: {}\nGame: {}\nBranch: {}\nname: {}\nWork: {}",
            ANNOUNCEMENT_HEADER,
            event.timestamp.trim(),
            event.game.trim(),
            event.branch.trim(),
            event.name.trim(),
            event.work.trim()
        )
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    /// In-memory correlation log for testing.
    struct MockLog {
        records: Mutex<Vec<AnnouncementRecord>>,
    }

    impl MockLog {
        fn new() -> Self {
            Self {
                records: Mutex::new(Vec::new()),
            }
        }

        fn with_records(records: Vec<AnnouncementRecord>) -> Self {
            Self {
                records: Mutex::new(records),
            }
        }

        fn len(&self) -> usize {
            self.records.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CorrelationLog for MockLog {
        async fn append(&self, record: &AnnouncementRecord) -> Result<(), AnnounceError> {
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }

        async fn find_latest(
            &self,
            key: &AnnouncementKey,
        ) -> Result<Option<AnnouncementRecord>, AnnounceError> {
            Ok(self
                .records
                .lock()
                .unwrap()
                .iter()
                .rev()
                .find(|r| &r.key == key)
                .cloned())
        }
    }

    /// In-memory channel that records every call.
    struct MockChannel {
        next_id: AtomicU64,
        sent: Mutex<Vec<(u64, String)>>,
        edits: Mutex<Vec<(u64, String)>>,
        fail_send: bool,
    }

    impl MockChannel {
        fn new() -> Self {
            Self {
                next_id: AtomicU64::new(1000),
                sent: Mutex::new(Vec::new()),
                edits: Mutex::new(Vec::new()),
                fail_send: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail_send: true,
                ..Self::new()
            }
        }

        fn sent_count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl AnnouncementChannel for MockChannel {
        async fn send(&self, text: &str) -> Result<u64, AnnounceError> {
            if self.fail_send {
                return Err(AnnounceError::Channel("send rejected".to_string()));
            }
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            self.sent.lock().unwrap().push((id, text.to_string()));
            Ok(id)
        }

        async fn fetch(&self, message_id: u64) -> Result<String, AnnounceError> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .find(|(id, _)| *id == message_id)
                .map(|(_, content)| content.clone())
                .ok_or_else(|| AnnounceError::Channel("unknown message".to_string()))
        }

        async fn edit(&self, message_id: u64, text: &str) -> Result<(), AnnounceError> {
            self.edits
                .lock()
                .unwrap()
                .push((message_id, text.to_string()));
            Ok(())
        }
    }

    fn submission(game: &str, branch: &str, name: &str, work: &str) -> SubmissionEvent {
        SubmissionEvent {
            timestamp: "5/1/2025 10:30:00".to_string(),
            game: game.to_string(),
            branch: branch.to_string(),
            name: name.to_string(),
            work: work.to_string(),
        }
    }

    fn service(log: Arc<MockLog>, channel: Arc<MockChannel>) -> AnnounceService {
        AnnounceService::new(log, channel, DEFAULT_MARKER)
    }

    #[tokio::test]
    async fn marker_submission_sends_and_appends_exactly_once() {
        let log = Arc::new(MockLog::new());
        let channel = Arc::new(MockChannel::new());
        let service = service(Arc::clone(&log), Arc::clone(&channel));

        let outcome = service
            .handle(&submission("Chess", "HQ", "Bob", "[แจ้ง] Repair"))
            .await
            .unwrap();

        let message_id = match outcome {
            DispatchOutcome::Created { message_id } => message_id,
            other => panic!("expected Created, got {:?}", other),
        };

        assert_eq!(channel.sent_count(), 1);
        assert_eq!(log.len(), 1);

        let record = log.records.lock().unwrap()[0].clone();
        assert_eq!(record.message_id, message_id);
        assert_eq!(record.key.game, "chess");
        assert_eq!(record.key.branch, "hq");
        assert_eq!(record.key.work, "repair");
    }

    #[tokio::test]
    async fn announcement_body_embeds_all_fields() {
        let log = Arc::new(MockLog::new());
        let channel = Arc::new(MockChannel::new());
        let service = service(Arc::clone(&log), Arc::clone(&channel));

        service
            .handle(&submission("Chess", "HQ", "Bob", "[แจ้ง] Repair"))
            .await
            .unwrap();

        let body = channel.sent.lock().unwrap()[0].1.clone();
        assert!(body.starts_with(ANNOUNCEMENT_HEADER));
        assert!(body.contains("Game: Chess"));
        assert!(body.contains("Branch: HQ"));
        assert!(body.contains("name: Bob"));
        assert!(body.contains("Work: [แจ้ง] Repair"));
    }

    #[tokio::test]
    async fn blank_work_is_a_no_op() {
        let log = Arc::new(MockLog::new());
        let channel = Arc::new(MockChannel::new());
        let service = service(Arc::clone(&log), Arc::clone(&channel));

        let outcome = service
            .handle(&submission("Chess", "HQ", "Bob", "   "))
            .await
            .unwrap();

        assert_eq!(outcome, DispatchOutcome::Skipped);
        assert_eq!(channel.sent_count(), 0);
        assert_eq!(log.len(), 0);
    }

    #[tokio::test]
    async fn follow_up_edits_the_announced_message() {
        let log = Arc::new(MockLog::new());
        let channel = Arc::new(MockChannel::new());
        let service = service(Arc::clone(&log), Arc::clone(&channel));

        let created = service
            .handle(&submission("Chess", "HQ", "Bob", "[แจ้ง] Repair"))
            .await
            .unwrap();
        let message_id = match created {
            DispatchOutcome::Created { message_id } => message_id,
            other => panic!("expected Created, got {:?}", other),
        };

        let outcome = service
            .handle(&submission("Chess", "HQ", "Carol", "Repair"))
            .await
            .unwrap();

        assert_eq!(outcome, DispatchOutcome::Edited { message_id });
        // Edit, not a second announcement.
        assert_eq!(channel.sent_count(), 1);

        let (edited_id, content) = channel.edits.lock().unwrap()[0].clone();
        assert_eq!(edited_id, message_id);
        assert!(content.starts_with("~~"));
        assert!(content.ends_with("⭐️Carol"));
    }

    #[tokio::test]
    async fn key_matching_ignores_case_and_whitespace() {
        let log = Arc::new(MockLog::new());
        let channel = Arc::new(MockChannel::new());
        let service = service(Arc::clone(&log), Arc::clone(&channel));

        service
            .handle(&submission("Chess", "HQ", "Bob", "[แจ้ง] Repair"))
            .await
            .unwrap();

        let outcome = service
            .handle(&submission("  chess ", "hq", "Carol", "  REPAIR "))
            .await
            .unwrap();

        assert!(matches!(outcome, DispatchOutcome::Edited { .. }));
    }

    #[tokio::test]
    async fn unknown_key_reports_no_match_without_side_effects() {
        let log = Arc::new(MockLog::new());
        let channel = Arc::new(MockChannel::new());
        let service = service(Arc::clone(&log), Arc::clone(&channel));

        let outcome = service
            .handle(&submission("Chess", "HQ", "Carol", "Repair"))
            .await
            .unwrap();

        assert_eq!(outcome, DispatchOutcome::NoMatch);
        assert_eq!(channel.sent_count(), 0);
        assert!(channel.edits.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn stale_message_id_reports_no_match() {
        // Record points at a message the channel no longer has.
        let key = AnnouncementKey {
            game: "chess".to_string(),
            branch: "hq".to_string(),
            work: "repair".to_string(),
        };
        let log = Arc::new(MockLog::with_records(vec![AnnouncementRecord {
            message_id: 42,
            key,
        }]));
        let channel = Arc::new(MockChannel::new());
        let service = service(Arc::clone(&log), Arc::clone(&channel));

        let outcome = service
            .handle(&submission("Chess", "HQ", "Carol", "Repair"))
            .await
            .unwrap();

        assert_eq!(outcome, DispatchOutcome::NoMatch);
        assert!(channel.edits.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_keys_resolve_to_latest_record() {
        let log = Arc::new(MockLog::new());
        let channel = Arc::new(MockChannel::new());
        let service = service(Arc::clone(&log), Arc::clone(&channel));

        service
            .handle(&submission("Chess", "HQ", "Bob", "[แจ้ง] Repair"))
            .await
            .unwrap();
        let second = service
            .handle(&submission("Chess", "HQ", "Dan", "[แจ้ง] Repair"))
            .await
            .unwrap();
        let second_id = match second {
            DispatchOutcome::Created { message_id } => message_id,
            other => panic!("expected Created, got {:?}", other),
        };

        let outcome = service
            .handle(&submission("Chess", "HQ", "Carol", "Repair"))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            DispatchOutcome::Edited {
                message_id: second_id
            }
        );
    }

    #[tokio::test]
    async fn send_failure_drops_the_event() {
        let log = Arc::new(MockLog::new());
        let channel = Arc::new(MockChannel::failing());
        let service = service(Arc::clone(&log), Arc::clone(&channel));

        let result = service
            .handle(&submission("Chess", "HQ", "Bob", "[แจ้ง] Repair"))
            .await;

        assert!(result.is_err());
        // No record for a message that never went out.
        assert_eq!(log.len(), 0);
    }
}
