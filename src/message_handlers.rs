use super::*;

use teloxide::types::Message;

pub(super) async fn handle_message(msg: Message, state: Arc<AppState>) -> Result<()> {
    let Some(from) = msg.from() else {
        return Ok(());
    };

    let raw = msg.text().or_else(|| msg.caption()).unwrap_or("");
    let (command, text) = classify_text(raw);
    let profile = Profile {
        platform_id: from.id.0 as i64,
        name: from.first_name.clone(),
        phone: msg.contact().map(|contact| contact.phone_number.clone()),
        locale: from.language_code.clone(),
    };
    info!(
        "[{}] command {:?}, {} line(s)",
        profile.platform_id,
        command,
        text.lines().count()
    );

    let event = IncomingEvent {
        profile,
        command,
        text,
    };
    let origin = MessageRef::Chat {
        chat_id: msg.chat.id.0,
        message_id: msg.id.0,
    };

    // Turns run detached so that the coalescing delay never holds up the
    // next update from the same chat.
    tokio::spawn(handle_turn(state, event, origin));
    Ok(())
}
