use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use serenity::{
    all::{
        ActivityData, Context, EventHandler, GuildId, Interaction, OnlineStatus, Ready,
        ResumedEvent,
    },
    async_trait,
};
use tokio::sync::watch;

use crate::{
    commands,
    config::ConfigSettings,
    discord_helpers::DiscordNotifier,
    helpers::{command_response, register_command},
    hey,
    hockey::HockeyApi,
    twitch::{TwitchApi, TwitchPoller},
    whisper, yay,
};

pub(crate) struct Handler {
    pub config: Arc<ConfigSettings>,
    pub hockey: Arc<HockeyApi>,
    pub twitch: Option<Arc<TwitchApi>>,
    /// generation of the poller that is allowed to keep running
    pub live_poller: Arc<AtomicU64>,
    pub ready: watch::Sender<bool>,
}

impl Handler {
    pub fn new(
        config: ConfigSettings,
        hockey: HockeyApi,
        twitch: Option<TwitchApi>,
    ) -> Self {
        let (ready, _) = watch::channel(false);
        Self {
            config: Arc::new(config),
            hockey: Arc::new(hockey),
            twitch: twitch.map(Arc::new),
            live_poller: Arc::new(AtomicU64::new(0)),
            ready,
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn cache_ready(&self, ctx: Context, _guilds: Vec<GuildId>) {
        self.ready.send_replace(true);

        let Some(api) = &self.twitch else {
            hey!("Twitch credentials not set, follower and clip announcements are off");
            return;
        };

        // a newer generation retires whatever poller is already running
        let generation = self.live_poller.fetch_add(1, Ordering::SeqCst) + 1;
        let poller = TwitchPoller::new(
            Arc::clone(api),
            DiscordNotifier::new(ctx),
            generation,
            Arc::clone(&self.live_poller),
            self.ready.subscribe(),
        )
        .interval(self.config.poll_interval())
        .clip_lookback(self.config.clip_lookback_days);

        whisper!("Spawning twitch poller generation {}", generation);
        tokio::spawn(poller.run());
    }

    async fn ready(&self, ctx: Context, ready: Ready) {
        register_command(&ctx, commands::standings::register()).await;
        register_command(&ctx, commands::roster::register()).await;
        register_command(&ctx, commands::schedule::register()).await;
        register_command(&ctx, commands::leaderboard::register()).await;
        register_command(&ctx, commands::twitch::register()).await;

        yay!("{} is connected!", ready.user.name);

        ctx.set_presence(
            Some(ActivityData::watching("the standings")),
            OnlineStatus::Online,
        );
    }

    async fn resume(&self, _: Context, _: ResumedEvent) {
        hey!("Resumed");
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        // button presses are picked up by the menu collectors
        let Interaction::Command(command) = interaction else {
            return;
        };
        let command_options = &command.data.options();

        match command.data.name.as_str() {
            "standings" => {
                commands::standings::run(command_options, &ctx, &command, &self.hockey, &self.config)
                    .await;
            }
            "roster" => {
                commands::roster::run(command_options, &ctx, &command, &self.hockey, &self.config)
                    .await;
            }
            "schedule" => {
                commands::schedule::run(command_options, &ctx, &command, &self.hockey, &self.config)
                    .await;
            }
            "leaderboard" => {
                commands::leaderboard::run(&ctx, &command, &self.hockey, &self.config).await;
            }
            "twitch" => {
                commands::twitch::run(command_options, &ctx, &command, self.twitch.as_deref())
                    .await;
            }
            _ => {
                command_response(&ctx, &command, "Unknown command!").await;
            }
        }
    }
}
