use serenity::all::GatewayIntents;
use serenity::Client;
use std::env;
use std::sync::Arc;

use crate::config::{ConfigSettings, TwitchCredentials};
use crate::discord_handler::Handler;
use crate::hockey::HockeyApi;
use crate::store::Store;
use crate::twitch::TwitchApi;

pub mod config;
pub mod embed;
pub mod error;
pub mod helpers;
pub mod hockey;
pub mod logging;
pub mod menu;
pub mod store;
pub mod twitch;

mod commands;
mod discord_handler;
mod discord_helpers;

#[tokio::main]
async fn main() {
    yay!("🏒 Rink Bot is starting up!");

    if let Err(e) = dotenv::dotenv() {
        hey!("No .env file loaded: {}", e);
    }

    let Ok(token) = env::var("DISCORD_TOKEN") else {
        nay!("DISCORD_TOKEN not found in environment");
        return;
    };

    let config = ConfigSettings::get();

    let store = match Store::open(&config.data_dir()) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            nay!("Failed to open data directory {}: {}", config.data_dir, e);
            return;
        }
    };

    let twitch = match TwitchCredentials::from_env() {
        Some(credentials) => {
            if credentials.client_secret.is_none() {
                hey!("TWITCH_CLIENT_SECRET not set, using the twitch API without a bearer token");
            }
            Some(TwitchApi::new(credentials, Arc::clone(&store)))
        }
        None => None,
    };

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let Ok(mut client) = Client::builder(token, intents)
        .event_handler(Handler::new(config, HockeyApi::default(), twitch))
        .await
    else {
        nay!("Error creating client");
        return;
    };

    if let Err(err) = client.start().await {
        nay!("Client error: {}", err);
    }
}
