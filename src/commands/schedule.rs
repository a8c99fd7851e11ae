use std::sync::Arc;

use chrono::Local;
use serenity::all::{
    CommandInteraction, CommandOptionType, Context, CreateCommand, CreateCommandOption,
    ResolvedOption,
};

use crate::{
    config::ConfigSettings,
    discord_helpers::open_menu,
    helpers::{command_response, option_str, parse_date},
    hockey::{
        teams::{find_team, Team},
        HockeyApi, ScheduleSource,
    },
    menu::schedule_controls,
    nay,
};

/// Teams from a comma separated list. The first name that matches nothing is returned as the error.
fn parse_teams(list: &str) -> Result<Vec<&'static Team>, String> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| find_team(name).ok_or_else(|| name.to_string()))
        .collect()
}

pub async fn run(
    options: &[ResolvedOption<'_>],
    ctx: &Context,
    command: &CommandInteraction,
    hockey: &Arc<HockeyApi>,
    config: &ConfigSettings,
) {
    let teams = match option_str(options, "team").map(parse_teams) {
        None => Vec::new(),
        Some(Ok(teams)) => teams,
        Some(Err(unknown)) => {
            command_response(ctx, command, format!("{} is not an NHL team", unknown)).await;
            return;
        }
    };

    let date = match option_str(options, "date") {
        None => Local::now().date_naive(),
        Some(text) => match parse_date(text) {
            Some(date) => date,
            None => {
                command_response(ctx, command, "Dates look like `YYYY-MM-DD`").await;
                return;
            }
        },
    };

    let source = ScheduleSource::new(Arc::clone(hockey), date, teams);
    if let Err(e) = open_menu(ctx, command, source, schedule_controls(), config).await {
        nay!("Failed to open schedule menu: {}", e);
    }
}

pub fn register() -> CreateCommand {
    CreateCommand::new("schedule")
        .description("Games for the week starting on a date")
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::String,
                "team",
                "Only these teams, comma separated",
            )
            .required(false),
        )
        .add_option(
            CreateCommandOption::new(CommandOptionType::String, "date", "YYYY-MM-DD, today by default")
                .required(false),
        )
}
