use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Command {
    Start,
    Help,
    CreatePost,
    Confirm,
    Clear,
    Cancel,
    Share,
}

impl Command {
    pub(super) fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "start" => Command::Start,
            "help" => Command::Help,
            "create" => Command::CreatePost,
            "ok" => Command::Confirm,
            "clear" => Command::Clear,
            "cancel" => Command::Cancel,
            "share" => Command::Share,
            _ => Command::Help,
        }
    }
}

pub(super) fn classify_text(text: &str) -> (Option<Command>, String) {
    if let Some(name) = parse_command(text) {
        return (Some(Command::from_name(name)), String::new());
    }
    let trimmed = text.trim();
    if trimmed == DONE_LABEL || trimmed == NEW_LIST_LABEL {
        return (Some(Command::Confirm), String::new());
    }
    if trimmed == OPEN_MENU_LABEL {
        return (Some(Command::Share), String::new());
    }
    (None, text.to_string())
}

pub(super) fn next_state(command: Option<Command>, current: DialogState) -> DialogState {
    match command {
        Some(Command::Start) if current == DialogState::New => DialogState::Creation,
        Some(Command::Confirm)
            if matches!(
                current,
                DialogState::Creation | DialogState::Done | DialogState::New
            ) =>
        {
            DialogState::Creation
        }
        Some(Command::CreatePost)
            if matches!(current, DialogState::New | DialogState::Registered) =>
        {
            DialogState::Creation
        }
        Some(Command::Clear) => DialogState::Done,
        _ => current,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Transition {
    pub(super) next: DialogState,
    pub(super) opens_list: bool,
}

impl Transition {
    /// Resolves the transition for one turn.
    ///
    /// Staying in `Done` is turned into `Creation`: text after a closed list
    /// starts a new one. Entering `Done` always opens a fresh list; leaving it
    /// does so only when the bound list already holds items at turn start, so
    /// the empty list opened by `clear` is reused.
    pub(super) fn resolve(
        command: Option<Command>,
        current: DialogState,
        bound_list_pristine: bool,
    ) -> Self {
        let mut next = next_state(command, current);
        if next == current && current == DialogState::Done {
            next = DialogState::Creation;
        }
        let opens_list = next == DialogState::Done
            || (current == DialogState::Done && !bound_list_pristine);
        Transition { next, opens_list }
    }

    pub(super) fn apply(&self, session: &mut Session) {
        session.previous_state = session.state;
        session.state = self.next;
    }
}
