use super::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Ticket {
    pub(super) list_id: ListId,
    pub(super) token: u64,
}

pub(super) struct ReplyCoalescer {
    delay: Duration,
    latest: Mutex<HashMap<ListId, u64>>,
}

impl ReplyCoalescer {
    pub(super) fn new(delay: Duration) -> Self {
        ReplyCoalescer {
            delay,
            latest: Mutex::new(HashMap::new()),
        }
    }

    pub(super) async fn stamp(&self, list_id: &ListId) -> Ticket {
        self.record(list_id, rand::random()).await
    }

    pub(super) async fn record(&self, list_id: &ListId, token: u64) -> Ticket {
        self.latest.lock().await.insert(list_id.clone(), token);
        Ticket {
            list_id: list_id.clone(),
            token,
        }
    }

    pub(super) async fn is_latest(&self, ticket: &Ticket) -> bool {
        self.latest.lock().await.get(&ticket.list_id) == Some(&ticket.token)
    }

    pub(super) async fn settle(&self, ticket: &Ticket) -> bool {
        tokio::time::sleep(self.delay).await;
        let latest = self.is_latest(ticket).await;
        if !latest {
            debug!("[coalesce] skip stale reply for list {}", ticket.list_id);
        }
        latest
    }
}
