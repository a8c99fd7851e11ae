use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Helix wraps every list in `{"data": [...]}`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub total: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwitchProfile {
    pub id: String,
    pub login: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub profile_image_url: String,
    #[serde(default)]
    pub offline_image_url: String,
    #[serde(default)]
    pub view_count: u64,
}

impl TwitchProfile {
    /// The first user in a `/users` response.
    pub fn from_json(body: Value) -> Result<Self> {
        let envelope: Envelope<TwitchProfile> = serde_json::from_value(body)?;
        envelope
            .data
            .into_iter()
            .next()
            .ok_or_else(|| Error::upstream("no such twitch user"))
    }

    pub fn url(&self) -> String {
        format!("https://twitch.tv/{}", self.login)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TwitchFollower {
    pub from_id: String,
    #[serde(default)]
    pub from_name: String,
    #[serde(default)]
    pub followed_at: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Clip {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub creator_name: String,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// A channel whose new followers get announced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowedAccount {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    /// follower ids already announced; only ever grows
    #[serde(default)]
    pub followers: Vec<String>,
    /// discord channel ids to announce in
    #[serde(default)]
    pub channels: Vec<u64>,
}

/// A broadcaster whose new clips get announced, keyed by twitch id in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipSubject {
    pub display_name: String,
    /// clip ids already announced; only ever grows
    #[serde(default)]
    pub clips: Vec<String>,
    #[serde(default)]
    pub channels: Vec<u64>,
}
