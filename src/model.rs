use super::*;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub(super) struct UserId(pub(super) String);

impl UserId {
    pub(super) fn generate() -> Self {
        UserId(Uuid::new_v4().simple().to_string())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub(super) struct ListId(pub(super) String);

impl ListId {
    pub(super) fn generate() -> Self {
        let id = Uuid::new_v4().simple().to_string();
        ListId(id[..LIST_ID_LEN].to_string())
    }

    pub(super) fn parse(raw: &str) -> Option<Self> {
        if raw.len() == LIST_ID_LEN && raw.chars().all(|c| c.is_ascii_hexdigit()) {
            Some(ListId(raw.to_ascii_lowercase()))
        } else {
            None
        }
    }
}

impl fmt::Display for ListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub(super) struct ItemHash(pub(super) String);

impl ItemHash {}

impl fmt::Display for ItemHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub(super) fn content_hash(name: &str) -> ItemHash {
    let digest = Sha256::digest(name.to_lowercase().as_bytes());
    let hex = digest[..HASH_BYTES]
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<String>();
    ItemHash(hex)
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(super) enum MessageRef {
    Chat { chat_id: i64, message_id: i32 },
    Inline { inline_id: String },
}

impl MessageRef {
    pub(super) fn chat_id(&self) -> Option<i64> {
        match self {
            MessageRef::Chat { chat_id, .. } => Some(*chat_id),
            MessageRef::Inline { .. } => None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(super) struct DeliveredMessage {
    pub(super) target: MessageRef,
    pub(super) initial: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub(super) struct Profile {
    pub(super) platform_id: i64,
    pub(super) name: String,
    pub(super) phone: Option<String>,
    pub(super) locale: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(super) struct User {
    pub(super) id: UserId,
    pub(super) platform_id: i64,
    pub(super) name: String,
    pub(super) phone: Option<String>,
    pub(super) locale: Option<String>,
    pub(super) created_at: DateTime<Utc>,
}

impl User {
    pub(super) fn from_profile(profile: Profile) -> Self {
        User {
            id: UserId::generate(),
            platform_id: profile.platform_id,
            name: profile.name,
            phone: profile.phone,
            locale: profile.locale,
            created_at: Utc::now(),
        }
    }

    pub(super) fn refresh(&mut self, profile: Profile) {
        self.name = profile.name;
        if profile.phone.is_some() {
            self.phone = profile.phone;
        }
        if profile.locale.is_some() {
            self.locale = profile.locale;
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub(super) enum DialogState {
    New,
    Registered,
    Creation,
    InProgress,
    Done,
}

impl DialogState {
    pub(super) fn accepts_items(self) -> bool {
        matches!(self, DialogState::Creation | DialogState::Done)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(super) struct Session {
    pub(super) user_id: UserId,
    pub(super) state: DialogState,
    pub(super) previous_state: DialogState,
    pub(super) list_id: Option<ListId>,
    pub(super) created_at: DateTime<Utc>,
}

impl Session {
    pub(super) fn new(user_id: UserId) -> Self {
        Session {
            user_id,
            state: DialogState::New,
            previous_state: DialogState::New,
            list_id: None,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum AddOutcome {
    Added,
    Duplicate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ModifyOutcome {
    Applied,
    NotFound,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(super) struct PurchaseList {
    pub(super) id: ListId,
    pub(super) owner: UserId,
    /// Every name ever posted into the list. Entries are never removed.
    pub(super) dictionary: HashMap<ItemHash, String>,
    pub(super) active: Vec<ItemHash>,
    pub(super) deleted: Vec<ItemHash>,
    #[serde(default)]
    pub(super) messages: Vec<DeliveredMessage>,
    #[serde(default)]
    pub(super) inline_context: Option<String>,
    pub(super) created_at: DateTime<Utc>,
    pub(super) updated_at: DateTime<Utc>,
}

impl PurchaseList {
    pub(super) fn new(owner: UserId, inline_context: Option<String>) -> Self {
        let now = Utc::now();
        PurchaseList {
            id: ListId::generate(),
            owner,
            dictionary: HashMap::new(),
            active: Vec::new(),
            deleted: Vec::new(),
            messages: Vec::new(),
            inline_context,
            created_at: now,
            updated_at: now,
        }
    }

    pub(super) fn is_pristine(&self) -> bool {
        self.dictionary.is_empty() && self.active.is_empty() && self.deleted.is_empty()
    }

    pub(super) fn name_of(&self, hash: &ItemHash) -> Option<&str> {
        self.dictionary.get(hash).map(|name| name.as_str())
    }

    pub(super) fn add_item(&mut self, name: &str) -> AddOutcome {
        let hash = content_hash(name);
        self.dictionary
            .entry(hash.clone())
            .or_insert_with(|| name.to_string());
        self.deleted.retain(|h| h != &hash);
        if self.active.contains(&hash) {
            return AddOutcome::Duplicate;
        }
        self.active.push(hash);
        self.updated_at = Utc::now();
        AddOutcome::Added
    }

    pub(super) fn cross_out(&mut self, hash: &ItemHash) -> ModifyOutcome {
        let Some(pos) = self.active.iter().position(|h| h == hash) else {
            return ModifyOutcome::NotFound;
        };
        let hash = self.active.remove(pos);
        if !self.deleted.contains(&hash) {
            self.deleted.push(hash);
        }
        self.updated_at = Utc::now();
        ModifyOutcome::Applied
    }

    pub(super) fn record_message(&mut self, message: DeliveredMessage) {
        if self.messages.iter().any(|m| m.target == message.target) {
            return;
        }
        self.messages.push(message);
        self.updated_at = Utc::now();
    }

    pub(super) fn forget_message(&mut self, target: &MessageRef) -> ModifyOutcome {
        let before = self.messages.len();
        self.messages.retain(|m| &m.target != target);
        if self.messages.len() == before {
            ModifyOutcome::NotFound
        } else {
            self.updated_at = Utc::now();
            ModifyOutcome::Applied
        }
    }

    pub(super) fn plain_text(&self) -> String {
        self.active
            .iter()
            .filter_map(|hash| self.name_of(hash))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
