use super::*;

use teloxide::utils::markdown;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum DeliveryMode {
    New,
    Edit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Markup {
    Plain,
    MarkdownV2,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum ButtonAction {
    Callback(String),
    SwitchInline(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Button {
    pub(super) label: String,
    pub(super) action: ButtonAction,
}

impl Button {
    pub(super) fn callback(label: impl Into<String>, data: impl Into<String>) -> Self {
        Button {
            label: label.into(),
            action: ButtonAction::Callback(data.into()),
        }
    }

    pub(super) fn switch_inline(label: impl Into<String>, query: impl Into<String>) -> Self {
        Button {
            label: label.into(),
            action: ButtonAction::SwitchInline(query.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Reply {
    pub(super) text: String,
    pub(super) keyboard: Vec<Vec<Button>>,
    pub(super) mode: DeliveryMode,
    pub(super) delete_previous: bool,
    pub(super) markup: Markup,
    pub(super) list_id: Option<ListId>,
}

impl Reply {
    pub(super) fn notice(text: impl Into<String>) -> Self {
        Reply {
            text: text.into(),
            keyboard: Vec::new(),
            mode: DeliveryMode::New,
            delete_previous: false,
            markup: Markup::Plain,
            list_id: None,
        }
    }

    pub(super) fn replaces_previous(&self) -> bool {
        self.delete_previous
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub(super) struct EventMeta {
    pub(super) command: Option<Command>,
}

pub(super) fn render_reply(
    event: &EventMeta,
    session: Option<&Session>,
    user: Option<&User>,
    list: &PurchaseList,
) -> Reply {
    let Some(session) = session else {
        let mut reply = render_list_view(list);
        reply.mode = DeliveryMode::Edit;
        return reply;
    };

    match event.command {
        Some(Command::Help) => return Reply::notice(HELP_TEXT),
        Some(Command::Clear) => return Reply::notice(LIST_CLOSED_TEXT),
        Some(Command::Share) => return render_share_menu(list),
        _ => {}
    }

    match session.state {
        DialogState::Creation => {
            if event.command.is_some() && session.previous_state == DialogState::New {
                Reply::notice(onboarding_text(user))
            } else {
                let mut reply = render_list_view(list);
                reply.delete_previous = !list.active.is_empty();
                reply
            }
        }
        DialogState::Done => render_list_view(list),
        DialogState::New | DialogState::Registered | DialogState::InProgress => {
            Reply::notice(FALLBACK_TEXT)
        }
    }
}

fn onboarding_text(user: Option<&User>) -> String {
    let greeting = match user {
        Some(user) if !user.name.trim().is_empty() => format!("Hello, {}!", user.name.trim()),
        _ => "Hello!".to_string(),
    };
    format!("{}\n{}\n\n{}", greeting, HELP_TEXT, ENTER_ITEMS_TEXT)
}

pub(super) fn render_list_view(list: &PurchaseList) -> Reply {
    if list.active.is_empty() && list.deleted.is_empty() {
        let mut reply = Reply::notice(ENTER_ITEMS_TEXT);
        reply.list_id = Some(list.id.clone());
        return reply;
    }

    let mut lines = Vec::new();
    for hash in &list.deleted {
        let name = display_name(list, hash);
        lines.push(format!("✔️ {}", markdown::strike(&markdown::escape(name))));
    }

    let mut keyboard = Vec::new();
    if list.deleted.is_empty() && !list.active.is_empty() {
        keyboard.push(vec![Button::switch_inline(SHARE_LABEL, list.plain_text())]);
    }
    for hash in &list.active {
        let name = display_name(list, hash);
        lines.push(markdown::escape(name));
        keyboard.push(vec![Button::callback(name, item_callback_data(&list.id, hash))]);
    }

    if list.active.is_empty() {
        keyboard.push(vec![if list.inline_context.is_some() {
            Button::switch_inline(NEW_LIST_LABEL, "")
        } else {
            Button::callback(NEW_LIST_LABEL, new_list_callback_data(&list.id))
        }]);
    }

    Reply {
        text: lines.join("\n"),
        keyboard,
        mode: DeliveryMode::New,
        delete_previous: false,
        markup: Markup::MarkdownV2,
        list_id: Some(list.id.clone()),
    }
}

fn render_share_menu(list: &PurchaseList) -> Reply {
    let mut reply = Reply::notice(SHARE_TEXT);
    reply.keyboard = vec![vec![Button::switch_inline(SEND_SAME_LABEL, list.plain_text())]];
    reply
}

fn display_name<'a>(list: &'a PurchaseList, hash: &ItemHash) -> &'a str {
    list.name_of(hash).unwrap_or(MISSING_NAME_LABEL)
}

pub(super) fn item_callback_data(list_id: &ListId, hash: &ItemHash) -> String {
    format!("{}:{}", list_id, hash)
}

pub(super) fn new_list_callback_data(list_id: &ListId) -> String {
    format!("{}:{}", list_id, NEW_LIST_TOKEN)
}
