/*
 * Embeds with multiple traversable pages. Each page is an embed (or plain text) and users move
 * through them with buttons under the message. The buttons only live as long as the session
 * that owns them: once it times out the buttons are removed and the message stays as it is.
 */

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serenity::all::{
    ButtonStyle, ChannelId, CommandInteraction, ComponentInteractionCollector, Context,
    CreateActionRow, CreateButton, CreateInteractionResponse,
    CreateInteractionResponseFollowup, CreateMessage, EditMessage, Http, Message,
    MessageCollector, MessageId, ReactionType, ShardMessenger, UserId,
};
use tokio::sync::Mutex;

use crate::{
    config::ConfigSettings,
    error::Result,
    menu::{Control, ControlEvent, MenuSession, MenuSurface, Page, PageSource},
    nay, say,
};

const BUTTONS_PER_ROW: usize = 5;

struct Shown {
    message: Option<MessageId>,
    // the deferred slash command still waits for its first followup
    pending_command: Option<CommandInteraction>,
    // once the menu is deleted nothing may bring it back
    deleted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Unsent,
    Sent(MessageId),
    Deleted,
}

impl Shown {
    fn target(&self) -> Target {
        match (self.deleted, self.message) {
            (true, _) => Target::Deleted,
            (false, Some(message_id)) => Target::Sent(message_id),
            (false, None) => Target::Unsent,
        }
    }

    /// Marks the menu gone and hands back the message to remove, if any.
    fn mark_deleted(&mut self) -> Option<MessageId> {
        self.deleted = true;
        self.message.take()
    }
}

/// A menu message in a Discord channel.
pub struct DiscordSurface {
    http: Arc<Http>,
    shard: ShardMessenger,
    channel_id: ChannelId,
    author_id: UserId,
    shown: Mutex<Shown>,
}

fn buttons(controls: &[Control]) -> Vec<CreateActionRow> {
    controls
        .chunks(BUTTONS_PER_ROW)
        .map(|row| {
            CreateActionRow::Buttons(
                row.iter()
                    .map(|c| {
                        CreateButton::new(c.id)
                            .emoji(ReactionType::Unicode(c.emoji.to_string()))
                            .style(ButtonStyle::Secondary)
                    })
                    .collect(),
            )
        })
        .collect()
}

impl DiscordSurface {
    /// A surface answering a deferred slash command.
    pub fn for_command(ctx: &Context, command: &CommandInteraction) -> Self {
        Self {
            http: Arc::clone(&ctx.http),
            shard: ctx.shard.clone(),
            channel_id: command.channel_id,
            author_id: command.user.id,
            shown: Mutex::new(Shown {
                message: None,
                pending_command: Some(command.clone()),
                deleted: false,
            }),
        }
    }

    pub async fn message_id(&self) -> Option<MessageId> {
        self.shown.lock().await.message
    }

    /// Button presses on the menu message, acknowledged as they arrive.
    pub fn events(&self, message_id: MessageId) -> impl Stream<Item = ControlEvent> + Unpin + Send {
        let http = Arc::clone(&self.http);
        let presses = ComponentInteractionCollector::new(self.shard.clone())
            .message_id(message_id)
            .stream();
        Box::pin(presses.then(move |press| {
            let http = Arc::clone(&http);
            async move {
                if let Err(e) = press
                    .create_response(&http, CreateInteractionResponse::Acknowledge)
                    .await
                {
                    nay!("Failed to acknowledge menu button: {}", e);
                }
                ControlEvent::new(press.user.id.get(), press.data.custom_id.clone())
            }
        }))
    }

    /// Sends a new message, answering the pending slash command if there is one.
    async fn send_new(
        &self,
        shown: &mut Shown,
        page: &Page,
        rows: Vec<CreateActionRow>,
    ) -> Result<Message> {
        if let Some(command) = shown.pending_command.take() {
            let mut followup = CreateInteractionResponseFollowup::new().components(rows);
            followup = match page {
                Page::Embed(em) => followup.embed(em.to_serenity()),
                Page::Text(text) => followup.content(text),
            };
            return Ok(command.create_followup(&self.http, followup).await?);
        }
        let mut builder = CreateMessage::new().components(rows);
        builder = match page {
            Page::Embed(em) => builder.embed(em.to_serenity()),
            Page::Text(text) => builder.content(text),
        };
        Ok(self.channel_id.send_message(&self.http, builder).await?)
    }

    async fn edit(&self, message_id: MessageId, builder: EditMessage) -> Result<()> {
        self.channel_id
            .edit_message(&self.http, message_id, builder)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl MenuSurface for DiscordSurface {
    async fn render(&self, page: &Page, controls: &[Control]) -> Result<()> {
        let mut shown = self.shown.lock().await;
        let rows = buttons(controls);
        match shown.target() {
            Target::Deleted => Ok(()),
            Target::Sent(message_id) => {
                let builder = match page {
                    Page::Embed(em) => EditMessage::new().content("").embed(em.to_serenity()),
                    Page::Text(text) => EditMessage::new().content(text).embeds(Vec::new()),
                };
                self.edit(message_id, builder.components(rows)).await
            }
            Target::Unsent => {
                let message = self.send_new(&mut shown, page, rows).await?;
                shown.message = Some(message.id);
                Ok(())
            }
        }
    }

    async fn notice(&self, text: &str) -> Result<()> {
        let target = self.shown.lock().await.target();
        let message_id = match target {
            Target::Deleted => return Ok(()),
            Target::Unsent => return self.say(text).await,
            Target::Sent(message_id) => message_id,
        };
        self.edit(message_id, EditMessage::new().content(text).embeds(Vec::new()))
            .await
    }

    async fn say(&self, text: &str) -> Result<()> {
        let mut shown = self.shown.lock().await;
        self.send_new(&mut shown, &Page::Text(text.to_string()), Vec::new())
            .await?;
        Ok(())
    }

    async fn delete(&self) -> Result<()> {
        let Some(message_id) = self.shown.lock().await.mark_deleted() else {
            return Ok(());
        };
        self.channel_id
            .delete_message(&self.http, message_id)
            .await?;
        Ok(())
    }

    async fn clear_controls(&self) -> Result<()> {
        let Target::Sent(message_id) = self.shown.lock().await.target() else {
            return Ok(());
        };
        self.edit(message_id, EditMessage::new().components(Vec::new()))
            .await
    }

    async fn prompt(
        &self,
        question: &str,
        accept: for<'a> fn(&'a str) -> bool,
        timeout: Duration,
    ) -> Result<Option<String>> {
        let asked = self
            .channel_id
            .send_message(&self.http, CreateMessage::new().content(question))
            .await?;

        let reply = MessageCollector::new(self.shard.clone())
            .author_id(self.author_id)
            .channel_id(self.channel_id)
            .filter(move |m: &Message| accept(&m.content))
            .timeout(timeout)
            .next()
            .await;

        match reply {
            Some(reply) => Ok(Some(reply.content)),
            None => {
                asked.delete(&self.http).await?;
                Ok(None)
            }
        }
    }
}

/// Answers `command` with a menu over `source` and drives it in the background.
pub async fn open_menu<S>(
    ctx: &Context,
    command: &CommandInteraction,
    source: S,
    controls: Vec<Control>,
    config: &ConfigSettings,
) -> Result<()>
where
    S: PageSource + 'static,
{
    command.defer(&ctx.http).await?;

    let surface = DiscordSurface::for_command(ctx, command);
    let session = MenuSession::new(source, surface, controls, command.user.id.get())
        .owners(config.owner_ids.clone())
        .timeout(config.menu_timeout())
        .prompt_timeout(config.prompt_timeout());

    if !session.start().await? {
        return Ok(());
    }
    let Some(message_id) = session.surface().message_id().await else {
        return Ok(());
    };
    let events = session.surface().events(message_id);

    say!("Menu opened for {} in {}", command.user.name, command.channel_id);
    tokio::spawn(Arc::new(session).run(events));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::{schedule_controls, standard_controls};

    #[test]
    fn rows_hold_at_most_five_buttons() {
        assert_eq!(buttons(&standard_controls()).len(), 1);
        assert_eq!(buttons(&schedule_controls()).len(), 2);
        assert!(buttons(&[]).is_empty());
    }

    #[test]
    fn a_deleted_menu_stays_deleted() {
        let mut shown = Shown {
            message: None,
            pending_command: None,
            deleted: false,
        };
        assert_eq!(shown.target(), Target::Unsent);

        shown.message = Some(MessageId::new(42));
        assert_eq!(shown.target(), Target::Sent(MessageId::new(42)));

        assert_eq!(shown.mark_deleted(), Some(MessageId::new(42)));
        // a page that was already in flight must not send a fresh menu
        assert_eq!(shown.target(), Target::Deleted);
        assert_eq!(shown.mark_deleted(), None);
        assert_eq!(shown.target(), Target::Deleted);
    }
}
