use serenity::all::{CommandInteraction, Context, CreateCommand};

use crate::{
    config::ConfigSettings,
    discord_helpers::open_menu,
    helpers::command_response,
    hockey::{
        leaderboard::{points_lines, LINES_PER_PAGE},
        HockeyApi, LeaderboardSource,
    },
    menu::standard_controls,
    nay,
};

pub async fn run(
    ctx: &Context,
    command: &CommandInteraction,
    hockey: &HockeyApi,
    config: &ConfigSettings,
) {
    let standings = match hockey.standings().await {
        Ok(standings) => standings,
        Err(e) => {
            nay!("Failed to fetch standings: {}", e);
            command_response(ctx, command, "Couldn't reach the NHL right now.").await;
            return;
        }
    };

    let (guild_name, guild_icon) = command
        .guild_id
        .and_then(|id| id.to_guild_cached(&ctx.cache).map(|g| (g.name.clone(), g.icon_url())))
        .unwrap_or_else(|| ("NHL".to_string(), None));

    let source = LeaderboardSource::new(
        points_lines(&standings),
        LINES_PER_PAGE,
        "Points",
        guild_name,
        guild_icon,
    );
    if let Err(e) = open_menu(ctx, command, source, standard_controls(), config).await {
        nay!("Failed to open leaderboard menu: {}", e);
    }
}

pub fn register() -> CreateCommand {
    CreateCommand::new("leaderboard").description("League points leaderboard")
}
