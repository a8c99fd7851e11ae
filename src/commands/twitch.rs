use serenity::all::{
    ChannelId, CommandInteraction, CommandOptionType, Context, CreateCommand,
    CreateCommandOption, EditInteractionResponse, ResolvedOption, ResolvedValue,
};

use crate::{
    embed::Embed,
    error::{Error, Result},
    helpers::{command_response, deferred_response, option_channel, option_str},
    nay,
    twitch::{
        embeds::make_user_embed,
        models::{ClipSubject, FollowedAccount, TwitchProfile},
        TwitchApi,
    },
    yay,
};

enum Reply {
    Text(String),
    Embed(Embed),
}

fn can_manage(command: &CommandInteraction) -> bool {
    command
        .member
        .as_ref()
        .and_then(|m| m.permissions)
        .is_some_and(|p| p.manage_channels())
}

async fn lookup(api: &TwitchApi, name: &str) -> Result<TwitchProfile> {
    api.get_profile_from_name(name).await.map_err(|e| {
        nay!("Twitch lookup for {} failed: {}", name, e);
        Error::usage(format!("{} is not a valid Twitch username", name))
    })
}

fn required<'a>(args: &'a [ResolvedOption<'a>], name: &str) -> Result<&'a str> {
    option_str(args, name).ok_or_else(|| Error::usage(format!("You must specify a {}", name)))
}

fn required_channel(args: &[ResolvedOption<'_>]) -> Result<ChannelId> {
    option_channel(args, "channel").ok_or_else(|| Error::usage("You must specify a channel"))
}

async fn profile(api: &TwitchApi, args: &[ResolvedOption<'_>], user_id: u64) -> Result<Reply> {
    let profile = api
        .maybe_get_twitch_profile(option_str(args, "name"), user_id)
        .await?;
    Ok(Reply::Embed(make_user_embed(&profile)))
}

async fn link(api: &TwitchApi, args: &[ResolvedOption<'_>], user_id: u64) -> Result<Reply> {
    let profile = lookup(api, required(args, "name")?).await?;
    let twitch_id = profile.id.clone();
    api.store()
        .twitch_users
        .update(|users| users.insert(user_id, twitch_id))
        .await?;
    Ok(Reply::Text(format!(
        "Your twitch account is now set to {}",
        profile.display_name
    )))
}

async fn follow(api: &TwitchApi, args: &[ResolvedOption<'_>]) -> Result<Reply> {
    let profile = lookup(api, required(args, "name")?).await?;
    let channel = required_channel(args)?.get();
    // only followers arriving after this point get announced
    let (followers, total) = api.get_all_followers(&profile.id).await?;

    let account = FollowedAccount {
        id: profile.id.clone(),
        display_name: profile.display_name.clone(),
        followers,
        channels: vec![channel],
    };
    api.store()
        .twitch_accounts
        .update(|accounts| match accounts.iter_mut().find(|a| a.id == account.id) {
            Some(existing) => {
                if !existing.channels.contains(&channel) {
                    existing.channels.push(channel);
                }
            }
            None => accounts.push(account),
        })
        .await?;

    yay!("Following {} ({} followers) in {}", profile.login, total, channel);
    Ok(Reply::Text(format!(
        "{} has been added to follower notifications in <#{}>",
        profile.display_name, channel
    )))
}

async fn unfollow(api: &TwitchApi, args: &[ResolvedOption<'_>]) -> Result<Reply> {
    let profile = lookup(api, required(args, "name")?).await?;
    let channel = required_channel(args)?.get();

    let removed = api
        .store()
        .twitch_accounts
        .update(|accounts| {
            let Some(account) = accounts.iter_mut().find(|a| a.id == profile.id) else {
                return false;
            };
            let before = account.channels.len();
            account.channels.retain(|c| *c != channel);
            let removed = account.channels.len() != before;
            accounts.retain(|a| !a.channels.is_empty());
            removed
        })
        .await?;

    Ok(Reply::Text(if removed {
        format!(
            "{} will no longer be announced in <#{}>",
            profile.display_name, channel
        )
    } else {
        format!(
            "{} isn't announced in <#{}>",
            profile.display_name, channel
        )
    }))
}

async fn clips(api: &TwitchApi, args: &[ResolvedOption<'_>]) -> Result<Reply> {
    let profile = lookup(api, required(args, "name")?).await?;
    let channel = required_channel(args)?.get();
    let existing: Vec<String> = api
        .get_new_clips(&profile.id, None)
        .await?
        .into_iter()
        .map(|clip| clip.id)
        .collect();

    let display_name = profile.display_name.clone();
    api.store()
        .twitch_clips
        .update(|subjects| {
            let subject = subjects
                .entry(profile.id.clone())
                .or_insert_with(|| ClipSubject {
                    display_name,
                    clips: existing,
                    channels: Vec::new(),
                });
            if !subject.channels.contains(&channel) {
                subject.channels.push(channel);
            }
        })
        .await?;

    Ok(Reply::Text(format!(
        "New clips from {} will be posted in <#{}>",
        profile.display_name, channel
    )))
}

pub async fn run(
    options: &[ResolvedOption<'_>],
    ctx: &Context,
    command: &CommandInteraction,
    twitch: Option<&TwitchApi>,
) {
    let Some(api) = twitch else {
        command_response(ctx, command, "Twitch isn't set up on this bot.").await;
        return;
    };
    let Some(ResolvedOption {
        name,
        value: ResolvedValue::SubCommand(args),
        ..
    }) = options.first()
    else {
        command_response(ctx, command, "You must pick a twitch subcommand").await;
        return;
    };

    let managing = matches!(*name, "follow" | "unfollow" | "clips");
    if managing && !can_manage(command) {
        command_response(ctx, command, "You need Manage Channels to do that.").await;
        return;
    }

    // twitch can make us wait out its rate limit
    if let Err(e) = command.defer(&ctx.http).await {
        nay!("Failed to defer twitch command: {}", e);
        return;
    }

    let user_id = command.user.id.get();
    let reply = match *name {
        "profile" => profile(api, args, user_id).await,
        "link" => link(api, args, user_id).await,
        "follow" => follow(api, args).await,
        "unfollow" => unfollow(api, args).await,
        "clips" => clips(api, args).await,
        other => Err(Error::usage(format!("Unknown twitch subcommand {}", other))),
    };

    match reply {
        Ok(Reply::Text(text)) => deferred_response(ctx, command, text).await,
        Ok(Reply::Embed(em)) => {
            let builder = EditInteractionResponse::new().embed(em.to_serenity());
            if let Err(e) = command.edit_response(&ctx.http, builder).await {
                nay!("Failed to respond to command: {}", e);
            }
        }
        Err(Error::Usage(msg)) => deferred_response(ctx, command, msg).await,
        Err(e) => {
            nay!("Twitch {} failed: {}", name, e);
            deferred_response(ctx, command, "Something went wrong talking to twitch.").await;
        }
    }
}

fn name_option(required: bool) -> CreateCommandOption {
    CreateCommandOption::new(CommandOptionType::String, "name", "Twitch username").required(required)
}

fn channel_option() -> CreateCommandOption {
    CreateCommandOption::new(CommandOptionType::Channel, "channel", "Where to announce")
        .required(true)
}

pub fn register() -> CreateCommand {
    CreateCommand::new("twitch")
        .description("Twitch profiles and announcements")
        .add_option(
            CreateCommandOption::new(CommandOptionType::SubCommand, "profile", "Show a twitch profile")
                .add_sub_option(name_option(false)),
        )
        .add_option(
            CreateCommandOption::new(CommandOptionType::SubCommand, "link", "Link your twitch account")
                .add_sub_option(name_option(true)),
        )
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::SubCommand,
                "follow",
                "Announce new followers of a channel",
            )
            .add_sub_option(name_option(true))
            .add_sub_option(channel_option()),
        )
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::SubCommand,
                "unfollow",
                "Stop announcing new followers",
            )
            .add_sub_option(name_option(true))
            .add_sub_option(channel_option()),
        )
        .add_option(
            CreateCommandOption::new(CommandOptionType::SubCommand, "clips", "Announce new clips")
                .add_sub_option(name_option(true))
                .add_sub_option(channel_option()),
        )
        .dm_permission(false)
}
