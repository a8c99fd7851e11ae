use std::{collections::BTreeSet, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use reqwest::{header::HeaderMap, StatusCode};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::{
    config::TwitchCredentials,
    error::{Error, Result},
    hey, nay, say,
    store::Store,
    twitch::models::{AccessToken, Clip, Envelope, TwitchFollower, TwitchProfile},
    whisper,
};

pub const BASE_URL: &str = "https://api.twitch.tv/helix";
pub const OAUTH_URL: &str = "https://id.twitch.tv/oauth2";

const SCOPES: [&str; 6] = [
    "analytics:read:extensions",
    "analytics:read:games",
    "bits:read",
    "clips:edit",
    "user:edit",
    "user:edit:broadcast",
];

/// Slack added on top of a reset time so twitch has rolled its counter over
/// by the time we ask again.
const RESET_MARGIN_MS: i64 = 100;

/// Local view of the helix request budget, fed from response headers.
#[derive(Debug, Default, Clone)]
pub struct RateLimit {
    pub remaining: u32,
    /// pending reset times, unix seconds
    pub resets: BTreeSet<i64>,
}

impl RateLimit {
    pub fn record(&mut self, remaining: Option<u32>, reset: Option<i64>) {
        if let Some(remaining) = remaining {
            self.remaining = remaining;
        }
        if let Some(reset) = reset {
            self.resets.insert(reset);
        }
    }

    /// How long the next request has to wait, if at all. Resets that have
    /// already passed are dropped.
    pub fn wait_time(&mut self, now_ms: i64) -> Option<Duration> {
        if self.remaining != 0 {
            return None;
        }
        self.resets.retain(|reset| reset * 1000 > now_ms);
        let earliest = self.resets.first()?;
        let wait_ms = earliest * 1000 - now_ms + RESET_MARGIN_MS;
        Some(Duration::from_millis(wait_ms as u64))
    }
}

fn header_value<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

pub struct TwitchApi {
    client: reqwest::Client,
    credentials: TwitchCredentials,
    store: Arc<Store>,
    rate_limit: Mutex<RateLimit>,
    base_url: String,
    oauth_url: String,
}

impl TwitchApi {
    pub fn new(credentials: TwitchCredentials, store: Arc<Store>) -> Self {
        Self::with_urls(credentials, store, BASE_URL, OAUTH_URL)
    }

    pub fn with_urls(
        credentials: TwitchCredentials,
        store: Arc<Store>,
        base_url: impl Into<String>,
        oauth_url: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            credentials,
            store,
            rate_limit: Mutex::new(RateLimit::default()),
            base_url: base_url.into(),
            oauth_url: oauth_url.into(),
        }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub async fn rate_limit(&self) -> RateLimit {
        self.rate_limit.lock().await.clone()
    }

    async fn validate(&self, token: &AccessToken) -> Result<()> {
        let resp = self
            .client
            .get(format!("{}/validate", self.oauth_url))
            .header("Authorization", format!("OAuth {}", token.access_token))
            .send()
            .await?;
        if resp.status() == StatusCode::OK {
            Ok(())
        } else {
            Err(Error::InvalidCredential)
        }
    }

    async fn request_token(&self, client_secret: &str) -> Result<AccessToken> {
        let scope = SCOPES.join(" ");
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", client_secret),
            ("grant_type", "client_credentials"),
            ("scope", scope.as_str()),
        ];
        let resp = self
            .client
            .post(format!("{}/token", self.oauth_url))
            .form(&params)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Error::upstream(format!(
                "token exchange failed with {}",
                resp.status()
            )));
        }
        Ok(resp.json().await?)
    }

    /// Makes sure a usable app token is cached. Without a client secret there
    /// is no way to get one and requests go out with the client id alone.
    pub async fn oauth_check(&self) -> Result<()> {
        let Some(secret) = self.credentials.client_secret.as_deref() else {
            return Ok(());
        };

        if let Some(token) = self.store.access_token.get().await {
            match self.validate(&token).await {
                Ok(()) => return Ok(()),
                Err(Error::InvalidCredential) => {
                    hey!("Twitch access token was rejected, requesting a new one");
                    self.store.access_token.set(None).await?;
                }
                Err(e) => return Err(e),
            }
        }

        let token = self.request_token(secret).await?;
        self.store.access_token.set(Some(token)).await?;
        say!("Acquired a new twitch app access token");
        Ok(())
    }

    pub async fn wait_for_rate_limit_reset(&self) {
        let wait = self
            .rate_limit
            .lock()
            .await
            .wait_time(Utc::now().timestamp_millis());
        if let Some(wait) = wait {
            whisper!("Twitch rate limit reached, waiting {:?}", wait);
            tokio::time::sleep(wait).await;
        }
    }

    async fn record_rate_limit(&self, headers: &HeaderMap) {
        let remaining = header_value(headers, "Ratelimit-Remaining");
        let reset = header_value(headers, "Ratelimit-Reset");
        self.rate_limit.lock().await.record(remaining, reset);
    }

    async fn fetch_once(&self, url: &str) -> Result<Value> {
        self.oauth_check().await?;

        let mut request = self
            .client
            .get(url)
            .header("Client-ID", &self.credentials.client_id);
        if let Some(token) = self.store.access_token.get().await {
            request = request.bearer_auth(token.access_token);
        }

        self.wait_for_rate_limit_reset().await;
        let resp = request.send().await?;
        self.record_rate_limit(resp.headers()).await;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimited);
        }
        if !status.is_success() {
            return Err(Error::upstream(format!("{} from {}", status, url)));
        }
        Ok(resp.json().await?)
    }

    /// GET a helix url and parse the body. Rate-limited requests are retried
    /// until they go through.
    pub async fn fetch(&self, url: &str) -> Result<Value> {
        loop {
            match self.fetch_once(url).await {
                Err(Error::RateLimited) => say!("Twitch rate limited {}, trying again", url),
                other => return other,
            }
        }
    }

    pub async fn get_profile_from_name(&self, twitch_name: &str) -> Result<TwitchProfile> {
        let url = format!(
            "{}/users?login={}",
            self.base_url,
            urlencoding::encode(twitch_name)
        );
        TwitchProfile::from_json(self.fetch(&url).await?)
    }

    pub async fn get_profile_from_id(&self, twitch_id: &str) -> Result<TwitchProfile> {
        let url = format!("{}/users?id={}", self.base_url, urlencoding::encode(twitch_id));
        TwitchProfile::from_json(self.fetch(&url).await?)
    }

    /// The newest 100 followers of `user_id`, newest first, and the total count.
    pub async fn get_new_followers(&self, user_id: &str) -> Result<(Vec<TwitchFollower>, u64)> {
        let url = format!(
            "{}/users/follows?to_id={}&first=100",
            self.base_url,
            urlencoding::encode(user_id)
        );
        let envelope: Envelope<TwitchFollower> = serde_json::from_value(self.fetch(&url).await?)?;
        let total = envelope.total.unwrap_or(envelope.data.len() as u64);
        whisper!("{} of {} followers for {}", envelope.data.len(), total, user_id);
        Ok((envelope.data, total))
    }

    pub async fn get_all_followers(&self, user_id: &str) -> Result<(Vec<String>, u64)> {
        let (followers, total) = self.get_new_followers(user_id).await?;
        Ok((followers.into_iter().map(|f| f.from_id).collect(), total))
    }

    /// Clips for `user_id`, optionally only those made since `started_at`.
    pub async fn get_new_clips(
        &self,
        user_id: &str,
        started_at: Option<DateTime<Utc>>,
    ) -> Result<Vec<Clip>> {
        let mut url = format!(
            "{}/clips?broadcaster_id={}",
            self.base_url,
            urlencoding::encode(user_id)
        );
        if let Some(started_at) = started_at {
            url.push_str(&format!(
                "&started_at={}&ended_at={}",
                started_at.format("%Y-%m-%dT%H:%M:%SZ"),
                Utc::now().format("%Y-%m-%dT%H:%M:%SZ")
            ));
        }
        let envelope: Envelope<Clip> = serde_json::from_value(self.fetch(&url).await?)?;
        Ok(envelope.data)
    }

    /// Looks up `twitch_name`, or the twitch account `discord_user` linked.
    pub async fn maybe_get_twitch_profile(
        &self,
        twitch_name: Option<&str>,
        discord_user: u64,
    ) -> Result<TwitchProfile> {
        if let Some(name) = twitch_name {
            return match self.get_profile_from_name(name).await {
                Ok(profile) => Ok(profile),
                Err(e) => {
                    nay!("{} is not a valid Twitch username: {}", name, e);
                    Err(Error::usage(format!("{} is not a valid Twitch username", name)))
                }
            };
        }

        let linked = self.store.twitch_users.get().await;
        match linked.get(&discord_user) {
            Some(twitch_id) => self.get_profile_from_id(twitch_id).await,
            None => Err(Error::usage("You must set a twitch ID")),
        }
    }
}
