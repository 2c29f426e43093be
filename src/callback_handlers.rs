use super::*;

use teloxide::payloads::setters::*;
use teloxide::requests::Requester;
use teloxide::types::CallbackQuery;

pub(super) async fn handle_callback(bot: Bot, q: CallbackQuery, state: Arc<AppState>) -> Result<()> {
    let origin = match (&q.message, &q.inline_message_id) {
        (Some(message), _) => MessageRef::Chat {
            chat_id: message.chat.id.0,
            message_id: message.id.0,
        },
        (None, Some(inline_id)) => MessageRef::Inline {
            inline_id: inline_id.clone(),
        },
        (None, None) => {
            bot.answer_callback_query(q.id).await?;
            return Ok(());
        }
    };

    let Some((list_id, token)) = q.data.as_deref().and_then(parse_callback_data) else {
        warn!("[{}] malformed callback data {:?}", q.from.id.0, q.data);
        bot.answer_callback_query(q.id)
            .text(MALFORMED_CALLBACK_TEXT)
            .await?;
        return Ok(());
    };
    let token = token.to_string();

    let outcome = if token == NEW_LIST_TOKEN {
        run_new_list(&state, &list_id).await
    } else {
        run_cross_out(&state, &list_id, &ItemHash(token)).await
    };

    match outcome {
        Ok(outcome) => {
            bot.answer_callback_query(q.id).await?;
            tokio::spawn(async move {
                dispatch_reply(&state, outcome, &origin).await;
            });
        }
        Err(err) => {
            error!("[{}] callback on list {} failed: {:#}", q.from.id.0, list_id, err);
            bot.answer_callback_query(q.id)
                .text(err.user_message())
                .await?;
        }
    }
    Ok(())
}
