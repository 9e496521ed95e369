use crate::discord::commands::worklog::{Context, Error};

/// Quick liveness check.
#[poise::command(prefix_command)]
pub async fn ping(ctx: Context<'_>) -> Result<(), Error> {
    ctx.say("Pong!").await?;
    Ok(())
}

/// Static usage text for the prefix commands.
#[poise::command(prefix_command)]
pub async fn help(ctx: Context<'_>) -> Result<(), Error> {
    let p = ctx.prefix();
    let help_text = format!(
        "Help command:\n\
         `{p}w <name>` - Show today's work for a name.\n\
         `{p}w y <name>` - Show yesterday's work for a name.\n\
         `{p}w <ddMMMyyyy> <name>` - Show work for a name on a specific date.\n\
         `{p}w all` - Show all work today.\n\
         `{p}most <startdate-enddate> <number>` - Show top games in the date range.\n\
         `{p}ping` - Ping the bot."
    );
    ctx.say(help_text).await?;
    Ok(())
}
