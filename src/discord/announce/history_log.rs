// Fallback CorrelationLog that scans recent channel history instead of the
// structured sheet log. The announcement body itself carries the key (the
// `Game:` / `Branch:` lines), so `append` has nothing to persist and the
// lookup greps a bounded window of recent messages. Matching is on game and
// branch only - the body does not embed a normalized work description.
// Slower and cruder than the sheet log; selected with ANNOUNCE_LOOKUP=history.

use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

use crate::core::announce::{
    AnnounceError, AnnouncementKey, AnnouncementRecord, CorrelationLog, ANNOUNCEMENT_HEADER,
};

/// How far back the scan reaches. Matches the Discord API's per-request
/// maximum.
const HISTORY_WINDOW: u8 = 100;

pub struct ChannelHistoryLog {
    http: Arc<serenity::Http>,
    channel_id: serenity::ChannelId,
}

impl ChannelHistoryLog {
    pub fn new(http: Arc<serenity::Http>, channel_id: u64) -> Self {
        Self {
            http,
            channel_id: serenity::ChannelId::new(channel_id),
        }
    }
}

/// Pull the normalized game and branch out of an announcement body.
/// Returns None for messages that are not our announcements.
fn parse_game_branch(content: &str) -> Option<(String, String)> {
    if !content.contains(ANNOUNCEMENT_HEADER) {
        return None;
    }

    let mut game = None;
    let mut branch = None;
    for line in content.lines() {
        let line = line.trim();
        let lowered = line.to_lowercase();
        if lowered.starts_with("game:") {
            game = line.split_once(':').map(|(_, v)| v.trim().to_lowercase());
        } else if lowered.starts_with("branch:") {
            branch = line.split_once(':').map(|(_, v)| v.trim().to_lowercase());
        }
    }

    match (game, branch) {
        (Some(game), Some(branch)) => Some((game, branch)),
        _ => None,
    }
}

#[async_trait]
impl CorrelationLog for ChannelHistoryLog {
    async fn append(&self, _record: &AnnouncementRecord) -> Result<(), AnnounceError> {
        // The posted message is its own record here.
        Ok(())
    }

    async fn find_latest(
        &self,
        key: &AnnouncementKey,
    ) -> Result<Option<AnnouncementRecord>, AnnounceError> {
        let messages = self
            .channel_id
            .messages(
                &self.http,
                serenity::GetMessages::new().limit(HISTORY_WINDOW),
            )
            .await
            .map_err(|e| AnnounceError::Channel(e.to_string()))?;

        // The API returns newest first, which is exactly the latest-wins
        // scan order the contract asks for.
        for message in &messages {
            if let Some((game, branch)) = parse_game_branch(&message.content) {
                if game == key.game && branch == key.branch {
                    return Ok(Some(AnnouncementRecord {
                        message_id: message.id.get(),
                        key: key.clone(),
                    }));
                }
            }
        }

        Ok(None)
    }
}
