use std::sync::Arc;

use log::warn;
use rand::seq::SliceRandom;
use rand::Rng;
use serenity::client::Context;
use serenity::framework::standard::macros::{command, group};
use serenity::framework::standard::{Args, CommandResult};
use serenity::model::prelude::*;
use serenity::prelude::*;

use super::checks::*;
use crate::config::{BotConfig, BotConfigKey};
use crate::pug_queue::{JoinOutcome, LeaveOutcome, PugQueue, PugQueueKey, Pugger};

const PUG_READY_TITLE: &str = "**PUG is now ready!**";

async fn pug_state(ctx: &Context) -> (Arc<RwLock<PugQueue>>, Arc<BotConfig>) {
    let data = ctx.data.read().await;
    (
        Arc::clone(data.get::<PugQueueKey>().unwrap()),
        Arc::clone(data.get::<BotConfigKey>().unwrap()),
    )
}

fn names(puggers: &[Pugger]) -> String {
    puggers
        .iter()
        .map(|p| p.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn mentions(puggers: &[Pugger]) -> String {
    puggers
        .iter()
        .map(|p| p.user_id.mention().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Join the PUG queue
#[command]
#[checks(PugChannel)]
async fn pug(ctx: &Context, msg: &Message) -> CommandResult {
    let (queue_lock, config) = pug_state(ctx).await;
    let (outcome, queued, capacity, roster) = {
        let mut queue = queue_lock.write().await;
        let outcome = queue.join(Pugger::new(msg.author.id, msg.author.name.clone()));
        let roster = match outcome {
            JoinOutcome::Filled => queue.last_full_roster().to_vec(),
            _ => Vec::new(),
        };
        (outcome, queue.len(), queue.capacity(), roster)
    };
    match outcome {
        JoinOutcome::Joined | JoinOutcome::Filled => {
            msg.channel_id
                .say(
                    &ctx.http,
                    format!(
                        "{} has joined the PUG queue ({queued} / {capacity})",
                        msg.author.name
                    ),
                )
                .await?;
            if outcome == JoinOutcome::Filled {
                announce_pug_ready(ctx, msg, &config, &roster).await?;
            }
        }
        JoinOutcome::AlreadyQueued => {
            msg.reply(
                ctx,
                format!(
                    "You are already queued! If you wanted to un-PUG, please use **{}unpug** instead.",
                    config.command_prefix
                ),
            )
            .await?;
        }
        JoinOutcome::QueueFull => {
            msg.reply(ctx, "Sorry, this PUG is currently full!").await?;
        }
    }
    Ok(())
}

/// Broadcast for the not-full -> full transition: mention the pugger role and
/// everyone on the freshly captured roster.
async fn announce_pug_ready(
    ctx: &Context,
    msg: &Message,
    config: &BotConfig,
    roster: &[Pugger],
) -> CommandResult {
    let mut announcement = format!("{PUG_READY_TITLE}\n");
    if let Some(role_mention) = pugger_role_mention(ctx, msg.guild_id, &config.pugger_role).await {
        announcement += &format!("{role_mention} ");
    }
    announcement += &mentions(roster);
    announcement += &format!(
        "\n\nTeams unbalanced? Use **{}scramble** to suggest new random teams.",
        config.command_prefix
    );
    msg.channel_id.say(&ctx.http, announcement).await?;
    Ok(())
}

async fn pugger_role_mention(
    ctx: &Context,
    guild_id: Option<GuildId>,
    role_name: &str,
) -> Option<String> {
    let guild_id = guild_id?;
    match guild_id.roles(&ctx.http).await {
        Ok(roles) => {
            let mention = roles
                .values()
                .find(|role| role.name == role_name)
                .map(|role| role.mention().to_string());
            if mention.is_none() {
                warn!("Guild {guild_id} has no role named '{role_name}'");
            }
            mention
        }
        Err(why) => {
            warn!("Failed to fetch roles of guild {guild_id}: {why}");
            None
        }
    }
}

/// Leave the PUG queue
#[command]
#[checks(PugChannel)]
async fn unpug(ctx: &Context, msg: &Message) -> CommandResult {
    let (queue_lock, _config) = pug_state(ctx).await;
    let (outcome, queued, capacity) = {
        let mut queue = queue_lock.write().await;
        (queue.leave(msg.author.id), queue.len(), queue.capacity())
    };
    match outcome {
        LeaveOutcome::Left => {
            msg.channel_id
                .say(
                    &ctx.http,
                    format!(
                        "{} has left the PUG queue ({queued} / {capacity})",
                        msg.author.name
                    ),
                )
                .await?;
        }
        LeaveOutcome::NotQueued => {
            msg.reply(ctx, "You are not currently in the PUG queue")
                .await?;
        }
    }
    Ok(())
}

/// List players currently queueing for PUG
#[command]
#[max_args(0)]
async fn puggers(ctx: &Context, msg: &Message) -> CommandResult {
    let (queue_lock, _config) = pug_state(ctx).await;
    let (queued_names, queued, capacity) = {
        let queue = queue_lock.read().await;
        (names(queue.members()), queue.len(), queue.capacity())
    };
    let mut response = format!("{queued} / {capacity} player(s) currently queued");
    if queued > 0 {
        response += ": ";
        response += &queued_names;
    }
    msg.channel_id.say(&ctx.http, response).await?;
    Ok(())
}

/// Get new random teams suggestion for the latest PUG
#[command]
#[checks(PugChannel)]
async fn scramble(ctx: &Context, msg: &Message) -> CommandResult {
    let (queue_lock, config) = pug_state(ctx).await;
    let teams = {
        let queue = queue_lock.read().await;
        queue.scramble(&mut rand::thread_rng())
    };
    match teams {
        None => {
            msg.reply(ctx, "Sorry, no previous PUG found to scramble")
                .await?;
        }
        Some(teams) => {
            let mut response = format!("{} suggests scrambled teams:\n", msg.author.name);
            response += &format!(
                "_(random shuffle id: {})_\n",
                random_shuffle_phrase(&mut rand::thread_rng())
            );
            response += &format!("_{} players:_\n{}\n", config.first_team_name, names(&teams.first));
            response += &format!(
                "_{} players:_\n{}\n",
                config.second_team_name,
                names(&teams.second)
            );
            response += &format!(
                "\nTeams still unbalanced? Use **{}scramble** to suggest new random teams.",
                config.command_prefix
            );
            msg.channel_id.say(&ctx.http, response).await?;
        }
    }
    Ok(())
}

const SHUFFLE_ADJECTIVES: &[&str] = &[
    "amber", "brisk", "crafty", "dapper", "eager", "fuzzy", "gallant", "hasty", "jolly", "keen",
    "lucky", "mellow", "nimble", "plucky", "rusty", "sly", "tidy", "vivid", "wily", "zesty",
];

const SHUFFLE_NOUNS: &[&str] = &[
    "badger", "comet", "donut", "falcon", "glacier", "harbor", "lantern", "magpie", "nebula",
    "otter", "pebble", "quokka", "raccoon", "sparrow", "turnip", "viper", "walrus", "zeppelin",
];

/// Human readable identifier for a scramble, so players can refer to a
/// specific suggestion over voice chat.
fn random_shuffle_phrase(rng: &mut impl Rng) -> String {
    let adjective = SHUFFLE_ADJECTIVES.choose(rng).copied().unwrap_or("random");
    let noun = SHUFFLE_NOUNS.choose(rng).copied().unwrap_or("shuffle");
    format!("{adjective} {noun}")
}

/// Empty the PUG queue
#[command]
#[checks(PugChannel, PugAdmin)]
async fn clearpuggers(ctx: &Context, msg: &Message) -> CommandResult {
    let (queue_lock, _config) = pug_state(ctx).await;
    queue_lock.write().await.clear();
    msg.channel_id
        .say(
            &ctx.http,
            format!("{} has reset the PUG queue", msg.author.name),
        )
        .await?;
    Ok(())
}

/// Ping all players currently queueing for PUG
#[command]
#[checks(PugChannel, PugAdmin)]
async fn ping_puggers(ctx: &Context, msg: &Message, args: Args) -> CommandResult {
    let (queue_lock, config) = pug_state(ctx).await;
    let message = args.rest().trim();
    if message.is_empty() {
        msg.reply(
            ctx,
            format!(
                "Usage: **{}ping_puggers <message to the queued players>**",
                config.command_prefix
            ),
        )
        .await?;
        return Ok(());
    }

    let (queued, others) = {
        let queue = queue_lock.read().await;
        let others: Vec<Pugger> = queue
            .members()
            .iter()
            .filter(|p| p.user_id != msg.author.id)
            .cloned()
            .collect();
        (queue.len(), others)
    };
    if queued == 0 {
        msg.reply(ctx, "PUG queue is currently empty.").await?;
        return Ok(());
    }
    if others.is_empty() {
        msg.reply(ctx, "There are no other players in the queue to ping!")
            .await?;
        return Ok(());
    }

    // Strip backticks so the message can't break out of its code block.
    let message = message.replace('`', "");
    msg.channel_id
        .say(
            &ctx.http,
            format!(
                "{} User {} is pinging the PUG queue with message:\n```{}```",
                mentions(&others),
                msg.author.mention(),
                message
            ),
        )
        .await?;
    Ok(())
}

/// Organize pick-up games
#[group]
#[commands(pug, unpug, puggers, scramble, clearpuggers, ping_puggers)]
struct PugCommands;
