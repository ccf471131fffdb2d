use std::sync::Arc;

use serenity::client::Context;
use serenity::framework::standard::macros::check;
use serenity::framework::standard::{Args, CommandOptions, Reason};
use serenity::model::prelude::*;

use crate::config::{BotConfig, BotConfigKey};
use crate::pug_queue::is_pug_admin;

async fn bot_config(ctx: &Context) -> Arc<BotConfig> {
    let data = ctx.data.read().await;
    Arc::clone(data.get::<BotConfigKey>().unwrap())
}

// Commands gated by this check only run on the configured PUG channel.
#[check]
#[name = "PugChannel"]
pub async fn pug_channel_check(
    ctx: &Context,
    msg: &Message,
    _: &mut Args,
    _: &CommandOptions,
) -> Result<(), Reason> {
    let config = bot_config(ctx).await;
    let channel_name = msg.channel_id.name(&ctx.http).await.map_err(|why| {
        Reason::Log(format!(
            "Failed to resolve name of channel {}: {}",
            msg.channel_id, why
        ))
    })?;
    if channel_name == config.pug_channel {
        Ok(())
    } else {
        Err(Reason::User(format!(
            "Sorry, this command can only be used on the channel: _{}_",
            config.pug_channel
        )))
    }
}

// Role-name gate for commands that clear the queue or ping everyone in it.
// With no admin roles configured, anyone passes.
#[check]
#[name = "PugAdmin"]
pub async fn pug_admin_check(
    ctx: &Context,
    msg: &Message,
    _: &mut Args,
    _: &CommandOptions,
) -> Result<(), Reason> {
    let config = bot_config(ctx).await;
    if config.pug_admin_roles.is_empty() {
        return Ok(());
    }
    let guild_id = msg
        .guild_id
        .ok_or_else(|| Reason::User("This command can only be used in a server".into()))?;
    let member = guild_id
        .member(&ctx.http, msg.author.id)
        .await
        .map_err(|why| {
            Reason::Log(format!(
                "Failed to fetch member {} of guild {}: {}",
                msg.author.id, guild_id, why
            ))
        })?;
    let guild_roles = guild_id.roles(&ctx.http).await.map_err(|why| {
        Reason::Log(format!("Failed to fetch roles of guild {guild_id}: {why}"))
    })?;
    let user_roles: Vec<String> = member
        .roles
        .iter()
        .filter_map(|role_id| guild_roles.get(role_id).map(|role| role.name.clone()))
        .collect();
    if is_pug_admin(&user_roles, &config.pug_admin_roles) {
        Ok(())
    } else {
        Err(Reason::User(format!(
            "This command can only be used by users with role(s): _{}_",
            config.pug_admin_roles.join(", ")
        )))
    }
}
