mod account;
mod config_cmd;
mod export;
mod item;
mod list;
mod open;
mod scan;

pub use account::{logout, whoami, LoginCommand, RegisterCommand};
pub use config_cmd::ConfigCommand;
pub use export::ExportCommand;
pub use item::ItemCommand;
pub use list::ListCommand;
pub use open::OpenCommand;
pub use scan::ScanCommand;

use clap::ValueEnum;
use std::sync::Arc;

use scanlist::config::Config;
use scanlist::scan::{Scanner, TesseractEngine};
use scanlist::{ApiClient, ItemId, ListState, Session, StoreError, SyncEngine};

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Everything a command needs: configuration and a client for the server.
pub struct Context {
    pub config: Config,
    pub client: Arc<ApiClient>,
}

impl Context {
    pub fn new(config: Config) -> Result<Self, StoreError> {
        let client = Arc::new(ApiClient::new(config.server_url.value.clone())?);
        Ok(Self { config, client })
    }

    pub fn session(&self) -> Result<Session, Box<dyn std::error::Error>> {
        Session::load(&self.config.session_path.value)?
            .ok_or_else(|| "Not logged in. Run 'scanlist login <username>' first.".into())
    }

    /// A sync engine for the logged-in user.
    pub fn engine(&self) -> Result<SyncEngine, Box<dyn std::error::Error>> {
        let session = self.session()?;
        Ok(SyncEngine::new(self.client.clone(), &session))
    }

    pub fn scanner(&self) -> Scanner {
        let ocr = &self.config.ocr;
        Scanner::new(
            Arc::new(TesseractEngine::new(ocr.command.value.clone())),
            ocr.language.value.clone(),
            ocr.timeout(),
        )
    }
}

/// Opens a list by ID or case-insensitive name.
pub async fn open_list<'a>(
    engine: &'a mut SyncEngine,
    identifier: &str,
) -> Result<&'a ListState, Box<dyn std::error::Error>> {
    let lists = engine.lists().await?;
    let list = lists
        .iter()
        .position(|l| l.id == identifier)
        .or_else(|| {
            lists
                .iter()
                .position(|l| l.name.eq_ignore_ascii_case(identifier))
        })
        .map(|index| lists[index].clone())
        .ok_or_else(|| format!("List not found: {}", identifier))?;

    Ok(engine.open_list(list))
}

/// Resolves an item by raw ID or 1-based display position.
pub fn find_item(state: &ListState, reference: &str) -> Result<ItemId, Box<dyn std::error::Error>> {
    state
        .locate(reference)
        .ok_or_else(|| format!("Item not found: {}", reference).into())
}

/// Waits for outstanding writes and warns about the ones that failed.
pub async fn finish(engine: &mut SyncEngine) {
    let report = engine.flush().await;
    if report.failed > 0 {
        eprintln!(
            "Warning: {} change(s) could not be saved to the server; they are lost once this session ends.",
            report.failed
        );
    }
}

/// Prints the items of a list, numbered in display order.
pub fn print_items(state: &ListState) {
    let items = state.display_order();
    if items.is_empty() {
        println!("  (no items)");
        return;
    }
    for (n, item) in items.iter().enumerate() {
        println!("  {:>3}. {}", n + 1, item);
    }
}
