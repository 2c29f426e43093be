use super::*;

#[async_trait]
pub(super) trait Transport: Send + Sync {
    async fn deliver(&self, reply: &Reply, destination: &MessageRef) -> Result<Option<MessageRef>>;
    async fn delete(&self, message: &MessageRef) -> Result<()>;
}

pub(super) async fn deliver_reply(state: &AppState, reply: &Reply, origin: &MessageRef) {
    if reply.text.is_empty() {
        debug!("reply not sent: empty text");
        return;
    }

    let sent = match state.transport.deliver(reply, origin).await {
        Ok(sent) => sent,
        Err(err) => {
            warn!("delivery failed, sending fallback notice: {:#}", err);
            if let Err(err) = state
                .transport
                .deliver(&Reply::notice(DELIVERY_FAILED_TEXT), origin)
                .await
            {
                error!("fallback delivery failed: {:#}", err);
            }
            return;
        }
    };

    let Some(list_id) = reply.list_id.as_ref() else {
        return;
    };

    if let (Some(sent), DeliveryMode::New) = (sent.as_ref(), reply.mode) {
        let message = DeliveredMessage {
            target: sent.clone(),
            initial: false,
        };
        if let Err(err) = bounded(state, state.store.record_delivered_message(list_id, message)).await {
            warn!("record delivered message for list {} failed: {:#}", list_id, err);
        }
    }

    if reply.delete_previous {
        delete_previous_renderings(state, list_id, sent.as_ref()).await;
    }
}

async fn delete_previous_renderings(state: &AppState, list_id: &ListId, keep: Option<&MessageRef>) {
    let list = match bounded(state, state.store.find_by_id(list_id)).await {
        Ok(list) => list,
        Err(err) => {
            warn!("load list {} for cleanup failed: {:#}", list_id, err);
            return;
        }
    };
    for message in list.messages.iter().filter(|m| !m.initial) {
        if Some(&message.target) == keep {
            continue;
        }
        if let Err(err) = state.transport.delete(&message.target).await {
            warn!("delete previous rendering failed: {:#}", err);
        }
        if let Err(err) =
            bounded(state, state.store.forget_delivered_message(list_id, &message.target)).await
        {
            warn!("forget delivered message failed: {:#}", err);
        }
    }
}
