use super::*;

use teloxide::payloads::setters::*;
use teloxide::requests::Requester;
use teloxide::types::{
    ChosenInlineResult, InlineQuery, InlineQueryResult, InlineQueryResultArticle,
    InputMessageContent, InputMessageContentText,
};

pub(super) async fn handle_inline_query(bot: Bot, q: InlineQuery, state: Arc<AppState>) -> Result<()> {
    let profile = Profile {
        platform_id: q.from.id.0 as i64,
        name: q.from.first_name.clone(),
        phone: None,
        locale: q.from.language_code.clone(),
    };

    let results = match run_inline_turn(&state, profile, &q.id, &q.query).await {
        Ok(Some((list, reply))) => vec![inline_article(&list, &reply)],
        Ok(None) => Vec::new(),
        Err(err) => {
            error!("[{}] inline query failed: {:#}", q.from.id.0, err);
            Vec::new()
        }
    };

    bot.answer_inline_query(q.id, results)
        .cache_time(0)
        .is_personal(true)
        .await?;
    Ok(())
}

fn inline_article(list: &PurchaseList, reply: &Reply) -> InlineQueryResult {
    let mut content = InputMessageContentText::new(reply.text.clone());
    if let Some(mode) = telegram::parse_mode(reply.markup) {
        content = content.parse_mode(mode);
    }
    let article = InlineQueryResultArticle::new(
        list.id.to_string(),
        SHARE_LABEL,
        InputMessageContent::Text(content),
    )
    .description(list.plain_text().replace('\n', ", "))
    .reply_markup(telegram::keyboard_markup(&reply.keyboard));
    InlineQueryResult::Article(article)
}

pub(super) async fn handle_chosen_inline_result(
    result: ChosenInlineResult,
    state: Arc<AppState>,
) -> Result<()> {
    let Some(list_id) = ListId::parse(&result.result_id) else {
        warn!("chosen inline result with foreign id {}", result.result_id);
        return Ok(());
    };
    let platform_id = result.from.id.0 as i64;
    if let Err(err) =
        commit_inline_result(&state, platform_id, &list_id, result.inline_message_id).await
    {
        error!("[{}] commit inline list {} failed: {:#}", platform_id, list_id, err);
    }
    Ok(())
}
