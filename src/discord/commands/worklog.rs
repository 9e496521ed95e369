// Discord commands for the work summaries.
//
// **Notice the pattern:**
// 1. Parse the raw command arguments
// 2. Call the core service
// 3. Relay the rendered reply
//
// This layer is THIN - no business logic, just translation.

use std::sync::Arc;

use crate::core::worklog::dates::{self, DateParseError};
use crate::core::worklog::{
    summary, FrequencyReply, SummaryReply, WorkQuery, WorklogService,
};
use crate::infra::sheets::SheetRowStore;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Shared state for all commands.
pub struct Data {
    pub worklog: Arc<WorklogService<SheetRowStore>>,
    /// The café's timezone; "today" means today there, not on the host.
    pub timezone: chrono_tz::Tz,
}

const DEFAULT_TOP_N: usize = 10;

/// Discord caps message length at 2000 characters; big days need splitting.
async fn say_chunked(ctx: &Context<'_>, text: &str) -> Result<(), Error> {
    for chunk in text.chars().collect::<Vec<char>>().chunks(2000) {
        let chunk_str: String = chunk.iter().collect();
        ctx.say(chunk_str).await?;
    }
    Ok(())
}

/// Summarize a day's work for one name, or for everyone with `all`.
/// Examples: `!w Alice`, `!w y Alice`, `!w 27May2025 Alice`, `!w all`.
#[poise::command(prefix_command)]
pub async fn w(
    ctx: Context<'_>,
    #[rest]
    #[description = "Optional date (27May2025 or y) and name (or all)"]
    args: Option<String>,
) -> Result<(), Error> {
    let args = args.unwrap_or_default();
    let today = dates::today_in(ctx.data().timezone);

    let query = match WorkQuery::parse(&args, today) {
        Ok(query) => query,
        Err(DateParseError::BadToken(token)) => {
            ctx.say(format!(
                "❌ ไม่สามารถแปลงวันที่จาก `{}` ได้ กรุณาใช้รูปแบบ 27May2025",
                token
            ))
            .await?;
            return Ok(());
        }
    };

    match ctx.data().worklog.work_summary(&query).await {
        Ok(SummaryReply::Found(found)) => {
            say_chunked(&ctx, &summary::render_summary(&found)).await?;
        }
        Ok(SummaryReply::NotFound { label, date }) => {
            ctx.say(summary::render_not_found(&label, date)).await?;
        }
        Err(err) => {
            tracing::error!(error = %err, "Work summary query failed");
            ctx.say("เกิดข้อผิดพลาดในการอ่านชีท ลองใหม่อีกครั้ง").await?;
        }
    }

    Ok(())
}

/// Rank the most frequent games over an inclusive date range.
/// Example: `!most 25May2025-26May2025 10`.
#[poise::command(prefix_command)]
pub async fn most(
    ctx: Context<'_>,
    #[description = "Date range, e.g. 25May2025-26May2025"] date_range: Option<String>,
    #[description = "How many games to list"] top_x: Option<String>,
) -> Result<(), Error> {
    let Some(range) = date_range else {
        ctx.say("Please provide date range and number. Ex: !most 25May2025-26May2025 10")
            .await?;
        return Ok(());
    };

    let (start, end) = match dates::parse_date_range(&range) {
        Ok(bounds) => bounds,
        Err(_) => {
            ctx.say("❌ Invalid date format. Use this format: `25May2025-26May2025`")
                .await?;
            return Ok(());
        }
    };

    let top_n = match top_x.as_deref() {
        None => DEFAULT_TOP_N,
        Some(raw) => match raw.trim().parse() {
            Ok(count) => count,
            Err(_) => {
                ctx.say("❌ Invalid number. Ex: !most 25May2025-26May2025 10")
                    .await?;
                return Ok(());
            }
        },
    };

    match ctx.data().worklog.most_played(start, end, top_n).await {
        Ok(FrequencyReply::Found {
            start,
            end,
            top_n,
            ranked,
        }) => {
            say_chunked(&ctx, &summary::render_frequency(start, end, top_n, &ranked)).await?;
        }
        Ok(FrequencyReply::Empty { .. }) => {
            ctx.say("No games found in that date range.").await?;
        }
        Err(err) => {
            tracing::error!(error = %err, "Game frequency query failed");
            ctx.say("เกิดข้อผิดพลาดในการอ่านชีท ลองใหม่อีกครั้ง").await?;
        }
    }

    Ok(())
}
