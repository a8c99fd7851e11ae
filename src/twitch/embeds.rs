use chrono::Utc;

use crate::{
    embed::{truncate, Embed},
    twitch::models::TwitchProfile,
};

pub const TWITCH_PURPLE: u32 = 0x6441A4;

pub fn make_user_embed(profile: &TwitchProfile) -> Embed {
    Embed::new()
        .colour(TWITCH_PURPLE)
        .description(profile.description.clone())
        .author(
            profile.display_name.clone(),
            Some(profile.url()),
            Some(profile.profile_image_url.clone()),
        )
        .image(profile.offline_image_url.clone())
        .thumbnail(profile.profile_image_url.clone())
        .footer(
            format!("{} Viewer count", profile.view_count),
            Some(profile.profile_image_url.clone()),
        )
}

/// Announcement that `follower` just followed `account`.
pub fn make_follow_embed(account: &TwitchProfile, follower: &TwitchProfile, total_followers: u64) -> Embed {
    let url = follower.url();
    Embed::new()
        .colour(TWITCH_PURPLE)
        .description(truncate(&format!("{}\n\n{}", follower.description, url), 2048))
        .author(
            format!("{} has just followed {}!", follower.display_name, account.display_name),
            Some(url),
            Some(follower.profile_image_url.clone()),
        )
        .image(follower.offline_image_url.clone())
        .field("Viewer count", follower.view_count.to_string(), true)
        .thumbnail(follower.profile_image_url.clone())
        .footer(
            format!("{} has {} followers", account.display_name, total_followers),
            Some(account.profile_image_url.clone()),
        )
        .timestamp(Utc::now())
}

pub fn follow_text(account: &TwitchProfile, follower: &TwitchProfile) -> String {
    format!(
        "{} has just followed {}!",
        follower.display_name, account.display_name
    )
}

pub fn clip_text(display_name: &str, clip_url: &str) -> String {
    format!("{} has a new clip! {}", display_name, clip_url)
}
