//! Interactive editor for one list.
//!
//! Edits apply locally at once and are written to the server in the
//! background. Item numbers refer to the order shown by `ls`.

use chrono::Local;
use clap::Args;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{find_item, finish, open_list, print_items, CommandResult, Context};
use scanlist::{export, Item, ItemField, ListState, SyncEngine};

const HELP: &str = "\
Commands:
  ls                      Show items (numbers are used below)
  add <text>              Append an item
  toggle <item>           Check or uncheck an item
  edit <item> <text>      Replace an item's text
  note <item> <text>      Replace an item's note
  rm <item>               Delete an item
  rename <name>           Rename the list
  scan <image>            Append one item per recognized line
  export [dir]            Write <Name>_backup.txt (default: current directory)
  share                   Print the export text
  refresh                 Reload the list from the server
  help                    Show this help
  quit                    Save pending changes and exit";

/// Open a list for interactive editing
#[derive(Args)]
pub struct OpenCommand {
    /// List ID or name
    list: String,
}

impl OpenCommand {
    pub async fn run(&self, ctx: &Context) -> CommandResult {
        let mut engine = ctx.engine()?;
        let state = open_list(&mut engine, &self.list).await?;
        println!("{}", state.name());
        print_items(state);
        println!("\nType 'help' for commands.");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
            if matches!(command, "quit" | "exit" | "q") {
                break;
            }

            if let Err(e) = execute(ctx, &mut engine, command, rest.trim()).await {
                println!("Error: {}", e);
            }
        }

        finish(&mut engine).await;
        Ok(())
    }
}

async fn execute(ctx: &Context, engine: &mut SyncEngine, command: &str, args: &str) -> CommandResult {
    match command {
        "help" | "?" => {
            println!("{}", HELP);
            return Ok(());
        }
        "ls" => {}
        "add" => {
            engine.append_item(Item::new(args))?;
        }
        "toggle" | "t" => {
            let id = find_item(current(engine)?, args)?;
            engine.toggle_checked(&id)?;
        }
        "edit" | "note" => {
            let (reference, value) = args.split_once(' ').unwrap_or((args, ""));
            let id = find_item(current(engine)?, reference)?;
            let field = if command == "edit" {
                ItemField::Text
            } else {
                ItemField::Note
            };
            engine.set_field(&id, field, value.trim())?;
        }
        "rm" | "delete" => {
            let id = find_item(current(engine)?, args)?;
            engine.delete_item(&id)?;
        }
        "rename" => {
            engine.rename(args)?;
        }
        "scan" => {
            if args.is_empty() {
                return Err("Usage: scan <image>".into());
            }
            println!("Scanning {}...", args);
            let items = ctx.scanner().scan(Path::new(args)).await?;
            if items.is_empty() {
                println!("No text recognized.");
                return Ok(());
            }
            let added = engine.append_many(items)?;
            println!("Added {} item(s).", added);
        }
        "export" => {
            let dir = if args.is_empty() {
                PathBuf::from(".")
            } else {
                PathBuf::from(args)
            };
            let state = current(engine)?;
            let path = export::write_to_dir(state.list(), Local::now().date_naive(), &dir)?;
            println!("Exported to {}", path.display());
            return Ok(());
        }
        "share" => {
            let state = current(engine)?;
            print!("{}", export::render(state.list(), Local::now().date_naive()));
            return Ok(());
        }
        "refresh" => {
            // Let pending writes land before reading back.
            finish(engine).await;
            engine.refresh().await?;
        }
        other => {
            return Err(format!("Unknown command '{}'. Type 'help' for commands.", other).into());
        }
    }

    let state = current(engine)?;
    println!("{}", state.name());
    print_items(state);
    Ok(())
}

fn current(engine: &SyncEngine) -> Result<&ListState, Box<dyn std::error::Error>> {
    engine
        .current()
        .ok_or_else(|| "The list was closed.".into())
}
