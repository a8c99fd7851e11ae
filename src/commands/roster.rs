use std::sync::Arc;

use serenity::all::{
    CommandInteraction, CommandOptionType, Context, CreateCommand, CreateCommandOption,
    ResolvedOption,
};

use crate::{
    config::ConfigSettings,
    discord_helpers::open_menu,
    helpers::{command_response, option_str},
    hockey::{teams::find_team, HockeyApi, RosterSource},
    menu::standard_controls,
    nay,
};

pub async fn run(
    options: &[ResolvedOption<'_>],
    ctx: &Context,
    command: &CommandInteraction,
    hockey: &Arc<HockeyApi>,
    config: &ConfigSettings,
) {
    let Some(query) = option_str(options, "team") else {
        command_response(ctx, command, "You must specify a team").await;
        return;
    };
    let Some(team) = find_team(query) else {
        command_response(ctx, command, format!("{} is not an NHL team", query)).await;
        return;
    };

    let roster = match hockey.roster(team.id).await {
        Ok(roster) => roster,
        Err(e) => {
            nay!("Failed to fetch the {} roster: {}", team.name, e);
            command_response(ctx, command, "Couldn't reach the NHL right now.").await;
            return;
        }
    };

    let source = RosterSource::new(Arc::clone(hockey), roster);
    if let Err(e) = open_menu(ctx, command, source, standard_controls(), config).await {
        nay!("Failed to open roster menu: {}", e);
    }
}

pub fn register() -> CreateCommand {
    CreateCommand::new("roster")
        .description("Browse a team's roster")
        .add_option(
            CreateCommandOption::new(CommandOptionType::String, "team", "Team name, e.g. Bruins")
                .required(true),
        )
}
