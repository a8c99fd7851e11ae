use serenity::all::{
    CommandInteraction, CommandOptionType, Context, CreateCommand, CreateCommandOption,
    ResolvedOption,
};

use crate::{
    config::ConfigSettings,
    discord_helpers::open_menu,
    helpers::{command_response, option_str},
    hockey::{HockeyApi, StandingsSource, StandingsStyle},
    menu::standard_controls,
    nay,
};

pub async fn run(
    options: &[ResolvedOption<'_>],
    ctx: &Context,
    command: &CommandInteraction,
    hockey: &HockeyApi,
    config: &ConfigSettings,
) {
    let style = match option_str(options, "style").unwrap_or("all").parse::<StandingsStyle>() {
        Ok(style) => style,
        Err(e) => {
            command_response(ctx, command, e.to_string()).await;
            return;
        }
    };

    let standings = match hockey.standings().await {
        Ok(standings) => standings,
        Err(e) => {
            nay!("Failed to fetch standings: {}", e);
            command_response(ctx, command, "Couldn't reach the NHL right now.").await;
            return;
        }
    };

    let source = StandingsSource::new(style, standings);
    if let Err(e) = open_menu(ctx, command, source, standard_controls(), config).await {
        nay!("Failed to open standings menu: {}", e);
    }
}

pub fn register() -> CreateCommand {
    CreateCommand::new("standings")
        .description("Current NHL standings")
        .add_option(
            CreateCommandOption::new(CommandOptionType::String, "style", "How to group the standings")
                .add_string_choice("All", "all")
                .add_string_choice("Division", "division")
                .add_string_choice("Conference", "conference")
                .add_string_choice("Team", "team")
                .required(false),
        )
}
