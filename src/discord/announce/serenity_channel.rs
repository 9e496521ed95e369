// AnnouncementChannel implementation backed by the Discord REST API. This
// layer is THIN - it translates between core's (u64, String) world and
// serenity's typed ids and builders, nothing more.

use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

use crate::core::announce::{AnnounceError, AnnouncementChannel};

pub struct SerenityAnnouncementChannel {
    http: Arc<serenity::Http>,
    channel_id: serenity::ChannelId,
}

impl SerenityAnnouncementChannel {
    pub fn new(http: Arc<serenity::Http>, channel_id: u64) -> Self {
        Self {
            http,
            channel_id: serenity::ChannelId::new(channel_id),
        }
    }
}

#[async_trait]
impl AnnouncementChannel for SerenityAnnouncementChannel {
    async fn send(&self, text: &str) -> Result<u64, AnnounceError> {
        let message = self
            .channel_id
            .send_message(&self.http, serenity::CreateMessage::new().content(text))
            .await
            .map_err(|e| AnnounceError::Channel(e.to_string()))?;
        Ok(message.id.get())
    }

    async fn fetch(&self, message_id: u64) -> Result<String, AnnounceError> {
        let message = self
            .channel_id
            .message(&self.http, serenity::MessageId::new(message_id))
            .await
            .map_err(|e| AnnounceError::Channel(e.to_string()))?;
        Ok(message.content)
    }

    async fn edit(&self, message_id: u64, text: &str) -> Result<(), AnnounceError> {
        self.channel_id
            .edit_message(
                &self.http,
                serenity::MessageId::new(message_id),
                serenity::EditMessage::new().content(text),
            )
            .await
            .map_err(|e| AnnounceError::Channel(e.to_string()))?;
        Ok(())
    }
}
