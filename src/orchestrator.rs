use super::*;

use std::future::Future;

#[derive(Debug, thiserror::Error)]
pub(super) enum TurnError {
    #[error("identity resolution failed: {0}")]
    Identity(#[source] StoreError),
    #[error("list unavailable: {0}")]
    List(#[source] StoreError),
    #[error("session persistence failed: {0}")]
    Persist(#[source] StoreError),
}

impl TurnError {
    pub(super) fn user_message(&self) -> &'static str {
        match self {
            TurnError::Identity(_) => IDENTITY_FAILED_TEXT,
            TurnError::List(_) => LIST_FAILED_TEXT,
            TurnError::Persist(_) => PERSIST_FAILED_TEXT,
        }
    }
}

#[derive(Debug, Clone)]
pub(super) struct IncomingEvent {
    pub(super) profile: Profile,
    pub(super) command: Option<Command>,
    pub(super) text: String,
}

#[derive(Debug)]
pub(super) struct TurnOutcome {
    pub(super) reply: Reply,
    pub(super) ticket: Ticket,
}

pub(super) async fn bounded<T, F>(state: &AppState, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(state.config.store_timeout(), fut).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout),
    }
}

pub(super) async fn handle_turn(state: Arc<AppState>, event: IncomingEvent, origin: MessageRef) {
    match run_turn(&state, &event).await {
        Ok(outcome) => dispatch_reply(&state, outcome, &origin).await,
        Err(err) => {
            error!("[{}] turn aborted: {:#}", event.profile.platform_id, err);
            deliver_reply(&state, &Reply::notice(err.user_message()), &origin).await;
        }
    }
}

pub(super) async fn dispatch_reply(state: &AppState, outcome: TurnOutcome, origin: &MessageRef) {
    if outcome.reply.replaces_previous() && !state.coalescer.settle(&outcome.ticket).await {
        return;
    }
    deliver_reply(state, &outcome.reply, origin).await;
}

pub(super) async fn run_turn(
    state: &AppState,
    event: &IncomingEvent,
) -> Result<TurnOutcome, TurnError> {
    let store = state.store.as_ref();

    let user = bounded(state, store.upsert_user(event.profile.clone()))
        .await
        .map_err(TurnError::Identity)?;
    let mut session = bounded(state, store.find_or_create_session(&user.id))
        .await
        .map_err(TurnError::Identity)?;

    let list = match session.list_id.clone() {
        Some(id) => match bounded(state, store.find_by_id(&id)).await {
            Ok(list) => list,
            Err(StoreError::NotFound(what)) => {
                warn!("session of user {} points to missing {}", user.id, what);
                open_list(state, &user.id).await.map_err(TurnError::List)?
            }
            Err(err) => return Err(TurnError::List(err)),
        },
        None => open_list(state, &user.id)
            .await
            .map_err(TurnError::List)?,
    };
    session.list_id = Some(list.id.clone());

    let current = session.state;
    let pristine = list.is_pristine();
    let mut posted = 0usize;
    if current.accepts_items() {
        for name in normalize_items(&event.text) {
            if add_item_with_retry(state, &list.id, &name).await {
                posted += 1;
            }
        }
    }
    info!(
        "[{}] state {:?}, {} item(s) posted to list {}",
        user.platform_id, current, posted, list.id
    );

    let transition = Transition::resolve(event.command, current, pristine);
    if transition.opens_list {
        let fresh = open_list(state, &user.id)
            .await
            .map_err(TurnError::Persist)?;
        session.list_id = Some(fresh.id);
    }
    transition.apply(&mut session);
    bounded(state, store.update_session(&session))
        .await
        .map_err(TurnError::Persist)?;
    debug!(
        "[{}] {:?} -> {:?}",
        user.platform_id, session.previous_state, session.state
    );

    // Items go to the list that was active when the event arrived, so that is
    // the one to show when anything was posted.
    let render_id = if posted > 0 {
        list.id.clone()
    } else {
        session.list_id.clone().unwrap_or_else(|| list.id.clone())
    };
    let ticket = state.coalescer.stamp(&render_id).await;
    let snapshot = bounded(state, store.find_by_id(&render_id))
        .await
        .map_err(TurnError::List)?;

    let meta = EventMeta {
        command: event.command,
    };
    let reply = render_reply(&meta, Some(&session), Some(&user), &snapshot);
    Ok(TurnOutcome { reply, ticket })
}

async fn add_item_with_retry(state: &AppState, list_id: &ListId, name: &str) -> bool {
    for attempt in 0..ITEM_ADD_ATTEMPTS {
        match bounded(state, state.store.add_item(list_id, name)).await {
            Ok(_) => return true,
            Err(err) if attempt + 1 < ITEM_ADD_ATTEMPTS => {
                warn!("add {:?} to list {} failed, retrying: {:#}", name, list_id, err);
            }
            Err(err) => {
                warn!("add {:?} to list {} failed, skipping: {:#}", name, list_id, err);
            }
        }
    }
    false
}

pub(super) async fn open_list(
    state: &AppState,
    owner: &UserId,
) -> Result<PurchaseList, StoreError> {
    let list = PurchaseList::new(owner.clone(), None);
    bounded(state, state.store.create(&list)).await?;
    Ok(list)
}

pub(super) async fn run_cross_out(
    state: &AppState,
    list_id: &ListId,
    hash: &ItemHash,
) -> Result<TurnOutcome, TurnError> {
    let outcome = bounded(state, state.store.cross_out(list_id, hash))
        .await
        .map_err(TurnError::List)?;
    if outcome == ModifyOutcome::NotFound {
        debug!("item {} is not active in list {}", hash, list_id);
    }
    let ticket = state.coalescer.stamp(list_id).await;
    let list = bounded(state, state.store.find_by_id(list_id))
        .await
        .map_err(TurnError::List)?;
    let reply = render_reply(&EventMeta::default(), None, None, &list);
    Ok(TurnOutcome { reply, ticket })
}

pub(super) async fn run_new_list(
    state: &AppState,
    list_id: &ListId,
) -> Result<TurnOutcome, TurnError> {
    let store = state.store.as_ref();
    let old = bounded(state, store.find_by_id(list_id))
        .await
        .map_err(TurnError::List)?;
    let owner = bounded(state, store.find_user(&old.owner))
        .await
        .map_err(TurnError::Identity)?;
    let mut session = bounded(state, store.find_or_create_session(&owner.id))
        .await
        .map_err(TurnError::Identity)?;

    let fresh = open_list(state, &owner.id)
        .await
        .map_err(TurnError::Persist)?;
    session.list_id = Some(fresh.id.clone());
    Transition {
        next: DialogState::Creation,
        opens_list: true,
    }
    .apply(&mut session);
    bounded(state, store.update_session(&session))
        .await
        .map_err(TurnError::Persist)?;
    info!("[{}] new list {} after {}", owner.platform_id, fresh.id, old.id);

    let ticket = state.coalescer.stamp(&old.id).await;
    let mut reply = Reply::notice(ENTER_ITEMS_TEXT);
    reply.mode = DeliveryMode::Edit;
    Ok(TurnOutcome { reply, ticket })
}

// Inline queries arrive once per keystroke, so the list is only built in memory
// here and replaces the user's previous pending one. It reaches the store when
// the result is chosen.
pub(super) async fn run_inline_turn(
    state: &AppState,
    profile: Profile,
    query_id: &str,
    text: &str,
) -> Result<Option<(PurchaseList, Reply)>, TurnError> {
    let items = normalize_items(text);
    if items.is_empty() {
        return Ok(None);
    }
    let platform_id = profile.platform_id;
    let user = bounded(state, state.store.upsert_user(profile))
        .await
        .map_err(TurnError::Identity)?;
    let mut list = PurchaseList::new(user.id, Some(query_id.to_string()));
    for name in &items {
        list.add_item(name);
    }
    let reply = render_list_view(&list);
    state
        .pending_inline
        .lock()
        .await
        .insert(platform_id, list.clone());
    Ok(Some((list, reply)))
}

/// Stores the chosen pending list in a single write, with the inline message
/// as its initial rendering. A list that is no longer pending only gets the
/// message recorded.
pub(super) async fn commit_inline_result(
    state: &AppState,
    platform_id: i64,
    list_id: &ListId,
    inline_id: Option<String>,
) -> Result<(), StoreError> {
    let chosen = {
        let mut pending = state.pending_inline.lock().await;
        let is_chosen = pending
            .get(&platform_id)
            .map_or(false, |list| &list.id == list_id);
        if is_chosen {
            pending.remove(&platform_id)
        } else {
            None
        }
    };
    let message = inline_id.map(|inline_id| DeliveredMessage {
        target: MessageRef::Inline { inline_id },
        initial: true,
    });

    if let Some(mut list) = chosen {
        if let Some(message) = message {
            list.record_message(message);
        }
        info!("[{}] inline list {} posted", platform_id, list.id);
        return bounded(state, state.store.create(&list)).await;
    }
    match message {
        Some(message) => {
            bounded(state, state.store.record_delivered_message(list_id, message)).await
        }
        None => Ok(()),
    }
}
