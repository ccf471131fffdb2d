mod command_groups;
mod config;
mod pug_queue;

use std::collections::HashSet;
use std::process::ExitCode;
use std::sync::Arc;

use command_groups::*;
use log::{error, info, warn};
use serenity::async_trait;
use serenity::client::{Client, Context, EventHandler};
use serenity::framework::standard::macros::{help, hook};
use serenity::framework::standard::{
    help_commands, Args, CommandGroup, CommandResult, Configuration, DispatchError, HelpOptions,
    Reason, StandardFramework,
};
use serenity::http::Http;
use serenity::model::prelude::*;
use serenity::prelude::*;
use simple_logger::SimpleLogger;

use config::{BotConfig, BotConfigKey};
use pug_queue::{PugQueue, PugQueueKey};

struct Handler;

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _: Context, ready: Ready) {
        info!("Connected as {}", ready.user.name);
    }
}

#[help]
#[command_not_found_text = "Could not find command: {}"]
#[max_levenshtein_distance(3)]
#[lacking_role = "hide"]
#[lacking_ownership = "hide"]
#[lacking_permissions = "hide"]
#[lacking_conditions = "strike"]
async fn my_help(
    ctx: &Context,
    msg: &Message,
    args: Args,
    hopt: &'static HelpOptions,
    groups: &[&'static CommandGroup],
    owners: HashSet<UserId>,
) -> CommandResult {
    let _ = help_commands::with_embeds(ctx, msg, args, hopt, groups, owners).await;
    Ok(())
}

#[hook]
async fn after(ctx: &Context, msg: &Message, command_name: &str, command_result: CommandResult) {
    if let Err(why) = command_result {
        error!("Command '{}' returned error: {}", command_name, why);
        if let Err(why_echo) = msg
            .channel_id
            .say(
                &ctx.http,
                format!("Error occured while running command `{command_name}`: {why}"),
            )
            .await
        {
            error!("Error sending command error report: {}", why_echo);
        }
    }
}

/// Turns check failures and bad argument counts into user-visible replies.
#[hook]
async fn dispatch_error(ctx: &Context, msg: &Message, error: DispatchError, command_name: &str) {
    match error {
        DispatchError::CheckFailed(_, Reason::User(reply)) => {
            if let Err(why) = msg.reply(ctx, reply).await {
                error!("Error sending check failure reply: {}", why);
            }
        }
        DispatchError::CheckFailed(check_name, reason) => {
            warn!(
                "Check '{}' failed for command '{}': {:?}",
                check_name, command_name, reason
            );
        }
        DispatchError::NotEnoughArguments { min, given } => {
            if let Err(why) = msg
                .reply(
                    ctx,
                    format!("This command needs at least {min} argument(s), got {given}"),
                )
                .await
            {
                error!("Error sending argument count reply: {}", why);
            }
        }
        other => {
            warn!("Command '{}' was not dispatched: {:?}", command_name, other);
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .env()
        .init()
        .expect("Failed to initialize logger");

    let config = match BotConfig::from_env() {
        Ok(config) => Arc::new(config),
        Err(why) => {
            error!("Configuration error: {why}");
            return ExitCode::FAILURE;
        }
    };

    let http = Http::new(&config.secret_token);

    let (owners, bot_id) = match http.get_current_application_info().await {
        Ok(info) => {
            let mut owners = HashSet::new();
            if let Some(team) = info.team {
                owners.insert(team.owner_user_id);
            } else if let Some(owner) = &info.owner {
                owners.insert(owner.id);
            }
            match http.get_current_user().await {
                Ok(bot_user) => (owners, bot_user.id),
                Err(why) => {
                    error!("Could not access the bot id: {why:?}");
                    return ExitCode::FAILURE;
                }
            }
        }
        Err(why) => {
            error!("Could not access application info: {why:?}");
            return ExitCode::FAILURE;
        }
    };

    let framework = StandardFramework::new()
        .after(after)
        .on_dispatch_error(dispatch_error)
        .help(&MY_HELP)
        .group(&PUGCOMMANDS_GROUP)
        .group(&MISCELLANEOUS_GROUP);
    framework.configure(
        Configuration::new()
            .on_mention(Some(bot_id))
            .prefix(config.command_prefix.as_str())
            .case_insensitivity(true)
            .owners(owners),
    );

    let intents = GatewayIntents::non_privileged() | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&config.secret_token, intents)
        .event_handler(Handler)
        .framework(framework)
        .await
        .expect("Err creating client");

    {
        let mut client_data = client.data.write().await;
        client_data.insert::<PugQueueKey>(Arc::new(RwLock::new(PugQueue::new(
            config.players_required_total,
        ))));
        client_data.insert::<BotConfigKey>(Arc::clone(&config));
    }

    info!(
        "Managing a {}-player PUG queue on channel '{}'",
        config.players_required_total, config.pug_channel
    );

    if let Err(why) = client.start().await {
        error!("Client error: {why:?}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
