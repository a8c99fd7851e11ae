use async_trait::async_trait;
use serenity::all::{ChannelId, Context, CreateMessage};

use crate::{
    error::{Error, Result},
    twitch::{ChannelCapabilities, Notifier, Outgoing},
};

/// Sends twitch announcements to guild channels through the gateway client.
pub struct DiscordNotifier {
    ctx: Context,
}

impl DiscordNotifier {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn capabilities(&self, channel_id: u64) -> Option<ChannelCapabilities> {
        if channel_id == 0 {
            return None;
        }
        let channel = ChannelId::new(channel_id)
            .to_channel(&self.ctx)
            .await
            .ok()?
            .guild()?;
        let me = self.ctx.cache.current_user().id;
        let perms = {
            let guild = self.ctx.cache.guild(channel.guild_id)?;
            let member = guild.members.get(&me)?;
            guild.user_permissions_in(&channel, member)
        };
        Some(ChannelCapabilities {
            send_messages: perms.send_messages(),
            embed_links: perms.embed_links(),
        })
    }

    async fn send(&self, channel_id: u64, message: Outgoing) -> Result<()> {
        if channel_id == 0 {
            return Err(Error::upstream("channel id 0"));
        }
        let builder = match message {
            Outgoing::Embed(em) => CreateMessage::new().embed(em.to_serenity()),
            Outgoing::Text(text) => CreateMessage::new().content(text),
        };
        ChannelId::new(channel_id)
            .send_message(&self.ctx.http, builder)
            .await?;
        Ok(())
    }
}
