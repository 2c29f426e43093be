use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clap::Parser;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use teloxide::dispatching::{Dispatcher, UpdateFilterExt};
use teloxide::dptree;
use teloxide::types::Update;
use teloxide::Bot;
use tokio::sync::Mutex;
use uuid::Uuid;

mod callback_handlers;
mod coalesce;
mod dialog;
mod helpers;
mod inline_handlers;
mod message_handlers;
mod model;
mod normalize;
mod orchestrator;
mod render;
mod store;
mod telegram;
mod transport;


use coalesce::*;
use dialog::*;
use helpers::*;
use model::*;
use normalize::*;
use orchestrator::*;
use render::*;
use store::*;
use transport::*;

const MAX_ITEMS_IN_LIST: usize = 50;
const MAX_ITEM_NAME_CHARS: usize = 30;
const LIST_ID_LEN: usize = 24;
const HASH_BYTES: usize = 16;
const ITEM_ADD_ATTEMPTS: usize = 2;
const DEFAULT_COALESCE_DELAY_MS: u64 = 500;
const DEFAULT_STORE_TIMEOUT_SECS: u64 = 20;
const STORE_FILE_NAME: &str = "store.json";

const NEW_LIST_TOKEN: &str = "new";
const DONE_LABEL: &str = "Done";
const NEW_LIST_LABEL: &str = "New list";
const OPEN_MENU_LABEL: &str = "Open menu";
const SHARE_LABEL: &str = "Share list";
const SEND_SAME_LABEL: &str = "Send the same";
const MISSING_NAME_LABEL: &str = "Name got lost 😔";

const HELP_TEXT: &str = "To build a list, write items here:\n - as separate messages\n - in one message, one item per line\n - by forwarding messages from other chats";
const ENTER_ITEMS_TEXT: &str = "Type an item name or a list";
const LIST_CLOSED_TEXT: &str = "List closed\n\nType an item name or a list";
const SHARE_TEXT: &str = "Share the current list with another chat";
const FALLBACK_TEXT: &str = "Not sure what to answer. Try again or press /clear";
const IDENTITY_FAILED_TEXT: &str = "Could not load your profile. Please try again.";
const LIST_FAILED_TEXT: &str = "Could not load the list. Please try again.";
const PERSIST_FAILED_TEXT: &str = "Could not save your progress. Please try again.";
const MALFORMED_CALLBACK_TEXT: &str = "Not enough data";
const DELIVERY_FAILED_TEXT: &str = "Something went wrong while sending. Try again or press /clear";

#[derive(Debug, Deserialize)]
struct ConfigFile {
    token: String,
    data_dir: PathBuf,
    coalesce_delay_ms: Option<u64>,
    store_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone)]
struct Config {
    token: String,
    data_dir: PathBuf,
    coalesce_delay_ms: u64,
    store_timeout_seconds: u64,
}

impl Config {
    fn coalesce_delay(&self) -> Duration {
        Duration::from_millis(self.coalesce_delay_ms)
    }

    fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_seconds)
    }
}

#[derive(Parser, Debug)]
struct Args {
    #[arg(long)]
    config: PathBuf,
}

struct AppState {
    config: Config,
    store: Arc<dyn Store>,
    transport: Arc<dyn Transport>,
    coalescer: ReplyCoalescer,
    // Latest unposted inline list per platform user.
    pending_inline: Mutex<HashMap<i64, PurchaseList>>,
}

impl AppState {
    fn new(config: Config, store: Arc<dyn Store>, transport: Arc<dyn Transport>) -> Self {
        let coalescer = ReplyCoalescer::new(config.coalesce_delay());
        AppState {
            config,
            store,
            transport,
            coalescer,
            pending_inline: Mutex::new(HashMap::new()),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = load_config(&args.config)?;
    fs::create_dir_all(&config.data_dir).context("create data_dir")?;

    let store = JsonStore::open(config.data_dir.join(STORE_FILE_NAME))?;
    let bot = Bot::new(config.token.clone());
    let transport = telegram::TelegramTransport::new(bot.clone());

    let state = Arc::new(AppState::new(config, Arc::new(store), Arc::new(transport)));
    info!(
        "starting, store in {}, coalescing delay {:?}",
        state.config.data_dir.display(),
        state.config.coalesce_delay()
    );

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(message_handlers::handle_message))
        .branch(Update::filter_callback_query().endpoint(callback_handlers::handle_callback))
        .branch(Update::filter_inline_query().endpoint(inline_handlers::handle_inline_query))
        .branch(
            Update::filter_chosen_inline_result()
                .endpoint(inline_handlers::handle_chosen_inline_result),
        );

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
