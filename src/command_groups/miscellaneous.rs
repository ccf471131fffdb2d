use serenity::client::Context;
use serenity::framework::standard::macros::{command, group};
use serenity::framework::standard::CommandResult;
use serenity::model::channel::Message;

/// Test if the bot is online and responsive
#[command]
#[max_args(0)]
async fn ping(ctx: &Context, msg: &Message) -> CommandResult {
    msg.channel_id.say(&ctx.http, "pong").await?;
    Ok(())
}

/// Nothing of much interest
#[group]
#[commands(ping)]
struct Miscellaneous;
