// Announcement adapters over the Discord REST API.
// - `serenity_channel.rs` is the AnnouncementChannel port implementation.
// - `history_log.rs` is the degraded lookup that greps recent messages
//   instead of the structured log.

#[path = "serenity_channel.rs"]
pub mod serenity_channel;

#[path = "history_log.rs"]
pub mod history_log;

pub use history_log::ChannelHistoryLog;
pub use serenity_channel::SerenityAnnouncementChannel;
