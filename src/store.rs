use super::*;

#[derive(Debug, thiserror::Error)]
pub(super) enum StoreError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("storage deadline exceeded")]
    Timeout,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

#[async_trait]
pub(super) trait IdentityStore: Send + Sync {
    async fn upsert_user(&self, profile: Profile) -> Result<User, StoreError>;
    async fn find_user(&self, id: &UserId) -> Result<User, StoreError>;
    async fn find_or_create_session(&self, user_id: &UserId) -> Result<Session, StoreError>;
    async fn update_session(&self, session: &Session) -> Result<(), StoreError>;
}

#[async_trait]
pub(super) trait ListStore: Send + Sync {
    async fn create(&self, list: &PurchaseList) -> Result<(), StoreError>;
    async fn find_by_id(&self, id: &ListId) -> Result<PurchaseList, StoreError>;
    async fn add_item(&self, id: &ListId, name: &str) -> Result<AddOutcome, StoreError>;
    async fn cross_out(&self, id: &ListId, hash: &ItemHash) -> Result<ModifyOutcome, StoreError>;
    async fn record_delivered_message(
        &self,
        id: &ListId,
        message: DeliveredMessage,
    ) -> Result<(), StoreError>;
    async fn forget_delivered_message(
        &self,
        id: &ListId,
        target: &MessageRef,
    ) -> Result<ModifyOutcome, StoreError>;
}

pub(super) trait Store: IdentityStore + ListStore {}

impl<T: IdentityStore + ListStore> Store for T {}

#[derive(Serialize, Deserialize, Default, Debug)]
struct StoreData {
    #[serde(default)]
    users: HashMap<UserId, User>,
    #[serde(default)]
    sessions: HashMap<UserId, Session>,
    #[serde(default)]
    lists: HashMap<ListId, PurchaseList>,
}

/// Document store kept in memory and flushed as one JSON file after every
/// mutation. A mutation whose flush fails is rolled back, so memory never runs
/// ahead of the file.
pub(super) struct JsonStore {
    path: Option<PathBuf>,
    data: Mutex<StoreData>,
}

impl JsonStore {
    pub(super) fn open(path: PathBuf) -> Result<Self> {
        let data = load_store_data(&path)?;
        info!(
            "store loaded from {}: {} users, {} lists",
            path.display(),
            data.users.len(),
            data.lists.len()
        );
        Ok(JsonStore {
            path: Some(path),
            data: Mutex::new(data),
        })
    }

    #[cfg(test)]
    pub(super) fn in_memory() -> Self {
        JsonStore {
            path: None,
            data: Mutex::new(StoreData::default()),
        }
    }

    fn flush(&self, data: &StoreData) -> Result<(), StoreError> {
        if let Some(path) = &self.path {
            save_store_data(path, data)?;
        }
        Ok(())
    }

    async fn mutate_list<T>(
        &self,
        id: &ListId,
        f: impl FnOnce(&mut PurchaseList) -> T + Send,
    ) -> Result<T, StoreError> {
        let mut data = self.data.lock().await;
        let list = data
            .lists
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("list {}", id)))?;
        let before = list.clone();
        let out = f(list);
        if let Err(err) = self.flush(&data) {
            data.lists.insert(id.clone(), before);
            return Err(err);
        }
        Ok(out)
    }
}

fn restore<K, V>(map: &mut HashMap<K, V>, key: K, previous: Option<V>)
where
    K: std::hash::Hash + Eq,
{
    match previous {
        Some(value) => {
            map.insert(key, value);
        }
        None => {
            map.remove(&key);
        }
    }
}

#[async_trait]
impl IdentityStore for JsonStore {
    async fn upsert_user(&self, profile: Profile) -> Result<User, StoreError> {
        let mut data = self.data.lock().await;
        let existing = data
            .users
            .values()
            .find(|user| user.platform_id == profile.platform_id)
            .cloned();
        let user = match &existing {
            Some(user) => {
                let mut refreshed = user.clone();
                refreshed.refresh(profile);
                if refreshed == *user {
                    return Ok(refreshed);
                }
                refreshed
            }
            None => User::from_profile(profile),
        };
        let previous = data.users.insert(user.id.clone(), user.clone());
        if let Err(err) = self.flush(&data) {
            restore(&mut data.users, user.id.clone(), previous);
            return Err(err);
        }
        Ok(user)
    }

    async fn find_user(&self, id: &UserId) -> Result<User, StoreError> {
        let data = self.data.lock().await;
        data.users
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("user {}", id)))
    }

    async fn find_or_create_session(&self, user_id: &UserId) -> Result<Session, StoreError> {
        let mut data = self.data.lock().await;
        if let Some(session) = data.sessions.get(user_id) {
            return Ok(session.clone());
        }
        let session = Session::new(user_id.clone());
        data.sessions.insert(user_id.clone(), session.clone());
        if let Err(err) = self.flush(&data) {
            data.sessions.remove(user_id);
            return Err(err);
        }
        Ok(session)
    }

    async fn update_session(&self, session: &Session) -> Result<(), StoreError> {
        let mut data = self.data.lock().await;
        if !data.sessions.contains_key(&session.user_id) {
            return Err(StoreError::NotFound(format!(
                "session of user {}",
                session.user_id
            )));
        }
        let previous = data
            .sessions
            .insert(session.user_id.clone(), session.clone());
        if let Err(err) = self.flush(&data) {
            restore(&mut data.sessions, session.user_id.clone(), previous);
            return Err(err);
        }
        Ok(())
    }
}

#[async_trait]
impl ListStore for JsonStore {
    async fn create(&self, list: &PurchaseList) -> Result<(), StoreError> {
        let mut data = self.data.lock().await;
        let previous = data.lists.insert(list.id.clone(), list.clone());
        if let Err(err) = self.flush(&data) {
            restore(&mut data.lists, list.id.clone(), previous);
            return Err(err);
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &ListId) -> Result<PurchaseList, StoreError> {
        let data = self.data.lock().await;
        data.lists
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("list {}", id)))
    }

    async fn add_item(&self, id: &ListId, name: &str) -> Result<AddOutcome, StoreError> {
        self.mutate_list(id, |list| list.add_item(name)).await
    }

    async fn cross_out(&self, id: &ListId, hash: &ItemHash) -> Result<ModifyOutcome, StoreError> {
        self.mutate_list(id, |list| list.cross_out(hash)).await
    }

    async fn record_delivered_message(
        &self,
        id: &ListId,
        message: DeliveredMessage,
    ) -> Result<(), StoreError> {
        self.mutate_list(id, |list| list.record_message(message))
            .await
    }

    async fn forget_delivered_message(
        &self,
        id: &ListId,
        target: &MessageRef,
    ) -> Result<ModifyOutcome, StoreError> {
        self.mutate_list(id, |list| list.forget_message(target))
            .await
    }
}

fn load_store_data(path: &Path) -> Result<StoreData> {
    if !path.exists() {
        return Ok(StoreData::default());
    }
    let data = fs::read_to_string(path).with_context(|| format!("read store {}", path.display()))?;
    let parsed = serde_json::from_str(&data).context("parse store")?;
    Ok(parsed)
}

fn save_store_data(path: &Path, data: &StoreData) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(data).context("serialize store")?;
    atomic_write(path, &bytes)
}
