use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use tokio::sync::watch;

use crate::{
    embed::Embed,
    error::Result,
    hey, nay, say,
    twitch::{
        api::TwitchApi,
        embeds::{clip_text, follow_text, make_follow_embed},
        models::FollowedAccount,
    },
    yay,
};

/// What the bot may do in a destination channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelCapabilities {
    pub send_messages: bool,
    pub embed_links: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outgoing {
    Embed(Embed),
    Text(String),
}

/// Where announcements go.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// `None` when the channel can't be reached at all.
    async fn capabilities(&self, channel_id: u64) -> Option<ChannelCapabilities>;

    async fn send(&self, channel_id: u64, message: Outgoing) -> Result<()>;
}

/// Polls twitch for new followers and clips and announces them.
///
/// A poller only runs while its `generation` matches the host's live
/// generation; the host bumps it whenever it starts a fresh poller, which
/// retires any older one at its next cycle.
pub struct TwitchPoller<N> {
    api: Arc<TwitchApi>,
    notifier: N,
    generation: u64,
    live: Arc<AtomicU64>,
    ready: watch::Receiver<bool>,
    interval: Duration,
    clip_lookback: chrono::Duration,
}

impl<N: Notifier> TwitchPoller<N> {
    pub fn new(
        api: Arc<TwitchApi>,
        notifier: N,
        generation: u64,
        live: Arc<AtomicU64>,
        ready: watch::Receiver<bool>,
    ) -> Self {
        Self {
            api,
            notifier,
            generation,
            live,
            ready,
            interval: Duration::from_secs(60),
            clip_lookback: chrono::Duration::days(8),
        }
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn clip_lookback(mut self, days: i64) -> Self {
        self.clip_lookback = chrono::Duration::days(days);
        self
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst) == self.generation
    }

    pub async fn run(mut self) {
        let host_ready = self.ready.wait_for(|ready| *ready).await.is_ok();
        if !host_ready {
            hey!("Host shut down before it was ready, twitch poller not started");
            return;
        }

        say!("Twitch poller {} started", self.generation);
        while self.is_live() {
            self.poll_once().await;
            tokio::time::sleep(self.interval).await;
        }
        say!("Twitch poller {} retired", self.generation);
    }

    pub async fn poll_once(&self) {
        let accounts = self.api.store().twitch_accounts.get().await;
        for account in &accounts {
            if let Err(e) = self.check_followers(account).await {
                nay!("Error checking twitch followers for {}: {}", account.id, e);
            }
        }
        self.check_clips().await;
    }

    /// Sends one message to every channel that will take it, all at once.
    async fn deliver(&self, channels: &[u64], embed: Option<&Embed>, text: &str) -> usize {
        let sends = channels.iter().map(|&channel_id| async move {
            let caps = self.notifier.capabilities(channel_id).await?;
            if !caps.send_messages {
                return None;
            }
            let message = match embed {
                Some(embed) if caps.embed_links => Outgoing::Embed(embed.clone()),
                _ => Outgoing::Text(text.to_string()),
            };
            match self.notifier.send(channel_id, message).await {
                Ok(()) => Some(()),
                Err(e) => {
                    nay!("Failed to send twitch notification to {}: {}", channel_id, e);
                    None
                }
            }
        });
        join_all(sends).await.into_iter().flatten().count()
    }

    /// Announces followers of `account` that haven't been announced yet.
    /// Returns how many were announced.
    pub async fn check_followers(&self, account: &FollowedAccount) -> Result<usize> {
        let followed = self.api.get_profile_from_id(&account.id).await?;
        let (followers, total) = self.api.get_new_followers(&account.id).await?;

        let mut seen: HashSet<&str> = account.followers.iter().map(String::as_str).collect();
        let mut announced = 0;
        // twitch lists newest first; announce oldest first
        for follow in followers.iter().rev() {
            if seen.contains(follow.from_id.as_str()) {
                continue;
            }
            let profile = match self.api.get_profile_from_id(&follow.from_id).await {
                Ok(profile) => profile,
                Err(e) => {
                    nay!("Error getting twitch profile {}: {}", follow.from_id, e);
                    continue;
                }
            };
            say!(
                "{} Followed! {} has {} followers now.",
                profile.login,
                followed.display_name,
                total
            );

            let embed = make_follow_embed(&followed, &profile, total);
            let text = follow_text(&followed, &profile);
            self.deliver(&account.channels, Some(&embed), &text).await;

            let follower_id = follow.from_id.clone();
            self.api
                .store()
                .twitch_accounts
                .update(|accounts| {
                    if let Some(stored) = accounts.iter_mut().find(|a| a.id == account.id) {
                        if !stored.followers.contains(&follower_id) {
                            stored.followers.push(follower_id);
                        }
                    }
                })
                .await?;
            seen.insert(follow.from_id.as_str());
            announced += 1;
        }
        Ok(announced)
    }

    /// Announces clips from the lookback window that haven't been announced.
    /// A subject whose clips can't be fetched is skipped for this round.
    pub async fn check_clips(&self) -> usize {
        let subjects = self.api.store().twitch_clips.get().await;
        let since = Utc::now() - self.clip_lookback;
        let mut announced = 0;

        for (user_id, subject) in &subjects {
            let clips = match self.api.get_new_clips(user_id, Some(since)).await {
                Ok(clips) => clips,
                Err(e) => {
                    nay!("Error getting twitch clips {}: {}", user_id, e);
                    continue;
                }
            };

            let mut seen: HashSet<&str> = subject.clips.iter().map(String::as_str).collect();
            for clip in &clips {
                if seen.contains(clip.id.as_str()) {
                    continue;
                }
                let text = clip_text(&subject.display_name, &clip.url);
                let sent = self.deliver(&subject.channels, None, &text).await;
                if sent > 0 {
                    yay!("Announced clip {} in {} channels", clip.id, sent);
                }

                let clip_id = clip.id.clone();
                let saved = self
                    .api
                    .store()
                    .twitch_clips
                    .update(|clips| {
                        if let Some(stored) = clips.get_mut(user_id) {
                            if !stored.clips.contains(&clip_id) {
                                stored.clips.push(clip_id);
                            }
                        }
                    })
                    .await;
                if let Err(e) = saved {
                    nay!("Failed to record clip {}: {}", clip.id, e);
                }
                seen.insert(clip.id.as_str());
                announced += 1;
            }
        }
        announced
    }
}
