use super::*;

use teloxide::payloads::setters::*;
use teloxide::requests::Requester;
use teloxide::types::{
    ChatId, InlineKeyboardButton, InlineKeyboardMarkup, MessageId, ParseMode,
};

pub(super) struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub(super) fn new(bot: Bot) -> Self {
        TelegramTransport { bot }
    }
}

pub(super) fn keyboard_markup(rows: &[Vec<Button>]) -> InlineKeyboardMarkup {
    let rows = rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|button| match &button.action {
                    ButtonAction::Callback(data) => {
                        InlineKeyboardButton::callback(button.label.clone(), data.clone())
                    }
                    ButtonAction::SwitchInline(query) => {
                        InlineKeyboardButton::switch_inline_query(button.label.clone(), query.clone())
                    }
                })
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(rows)
}

pub(super) fn parse_mode(markup: Markup) -> Option<ParseMode> {
    match markup {
        Markup::Plain => None,
        Markup::MarkdownV2 => Some(ParseMode::MarkdownV2),
    }
}

pub(super) fn is_message_not_modified_error(err: &teloxide::RequestError) -> bool {
    err.to_string()
        .to_ascii_lowercase()
        .contains("message is not modified")
}

impl TelegramTransport {
    async fn send_new(&self, reply: &Reply, chat_id: i64) -> Result<MessageRef> {
        let mut request = self.bot.send_message(ChatId(chat_id), reply.text.clone());
        if let Some(mode) = parse_mode(reply.markup) {
            request = request.parse_mode(mode);
        }
        if !reply.keyboard.is_empty() {
            request = request.reply_markup(keyboard_markup(&reply.keyboard));
        }
        let sent = request.await?;
        Ok(MessageRef::Chat {
            chat_id: sent.chat.id.0,
            message_id: sent.id.0,
        })
    }

    async fn edit(&self, reply: &Reply, target: &MessageRef) -> Result<()> {
        let result = match target {
            MessageRef::Chat {
                chat_id,
                message_id,
            } => {
                let mut request = self.bot.edit_message_text(
                    ChatId(*chat_id),
                    MessageId(*message_id),
                    reply.text.clone(),
                );
                if let Some(mode) = parse_mode(reply.markup) {
                    request = request.parse_mode(mode);
                }
                request = request.reply_markup(keyboard_markup(&reply.keyboard));
                request.await.map(|_| ())
            }
            MessageRef::Inline { inline_id } => {
                let mut request = self
                    .bot
                    .edit_message_text_inline(inline_id.clone(), reply.text.clone());
                if let Some(mode) = parse_mode(reply.markup) {
                    request = request.parse_mode(mode);
                }
                request = request.reply_markup(keyboard_markup(&reply.keyboard));
                request.await.map(|_| ())
            }
        };
        match result {
            Ok(()) => Ok(()),
            Err(err) if is_message_not_modified_error(&err) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn deliver(&self, reply: &Reply, destination: &MessageRef) -> Result<Option<MessageRef>> {
        match (reply.mode, destination.chat_id()) {
            (DeliveryMode::New, Some(chat_id)) => Ok(Some(self.send_new(reply, chat_id).await?)),
            // Inline messages cannot receive new messages; edit them instead.
            _ => {
                self.edit(reply, destination).await?;
                Ok(None)
            }
        }
    }

    async fn delete(&self, message: &MessageRef) -> Result<()> {
        match message {
            MessageRef::Chat {
                chat_id,
                message_id,
            } => {
                self.bot
                    .delete_message(ChatId(*chat_id), MessageId(*message_id))
                    .await?;
                Ok(())
            }
            MessageRef::Inline { .. } => Err(anyhow!("inline messages cannot be deleted")),
        }
    }
}
