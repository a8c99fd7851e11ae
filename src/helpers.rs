use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serenity::all::{
    ChannelId, Command, CommandInteraction, CreateCommand, CreateInteractionResponse,
    CreateInteractionResponseMessage, EditInteractionResponse, ResolvedOption, ResolvedValue,
};
use serenity::client::Context;

use crate::nay;

/// year, separator, month, separator, day; groups 1, 3 and 4 hold the parts
pub static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"((19|20)\d\d)[- /.](0[1-9]|1[012]|[1-9])[- /.](0[1-9]|[12][0-9]|3[01]|[1-9])")
        .expect("date pattern is valid")
});

pub fn matches_date(text: &str) -> bool {
    DATE_RE.is_match(text)
}

/// Pulls the first date out of free text. Matches that aren't real calendar
/// days (2023-02-30) give `None`.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let caps = DATE_RE.captures(text)?;
    let year = caps.get(1)?.as_str().parse().ok()?;
    let month = caps.get(3)?.as_str().parse().ok()?;
    let day = caps.get(4)?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Joins names the way a sentence would: "a", "a and b", "a, b, and c".
pub fn humanize_list(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [one] => one.clone(),
        [a, b] => format!("{} and {}", a, b),
        [rest @ .., last] => format!("{}, and {}", rest.join(", "), last),
    }
}

pub async fn command_response<S: Into<String>>(
    ctx: &Context,
    command: &CommandInteraction,
    msg: S,
) {
    let data = CreateInteractionResponseMessage::new().content(msg.into());
    let builder = CreateInteractionResponse::Message(data);
    if let Err(err) = command.create_response(&ctx.http, builder).await {
        nay!("Failed to respond to command: {}", err)
    }
}

/// Edits the answer to a command that was deferred.
pub async fn deferred_response<S: Into<String>>(
    ctx: &Context,
    command: &CommandInteraction,
    msg: S,
) {
    let builder = EditInteractionResponse::new().content(msg.into());
    if let Err(err) = command.edit_response(&ctx.http, builder).await {
        nay!("Failed to respond to command: {}", err)
    }
}

pub fn option_str<'a>(options: &'a [ResolvedOption<'a>], name: &str) -> Option<&'a str> {
    options.iter().find_map(|o| match o.value {
        ResolvedValue::String(value) if o.name == name => Some(value),
        _ => None,
    })
}

pub fn option_channel(options: &[ResolvedOption<'_>], name: &str) -> Option<ChannelId> {
    options.iter().find_map(|o| match o.value {
        ResolvedValue::Channel(channel) if o.name == name => Some(channel.id),
        _ => None,
    })
}

pub async fn register_command(ctx: &Context, cmd: CreateCommand) {
    if let Err(e) = Command::create_global_command(&ctx.http, cmd).await {
        nay!("Failed to register a command: {}", e);
    }
}
