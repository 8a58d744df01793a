use clap::{Args, Subcommand};

use super::{find_item, finish, open_list, print_items, CommandResult, Context};
use scanlist::Item;

#[derive(Args)]
pub struct ItemCommand {
    #[command(subcommand)]
    pub command: ItemSubcommand,
}

#[derive(Subcommand)]
pub enum ItemSubcommand {
    /// Add an item to a list
    Add {
        /// List ID or name
        list: String,

        /// Item text (may be empty)
        #[arg(default_value = "")]
        text: String,

        /// Note shown next to the text
        #[arg(long)]
        note: Option<String>,
    },

    /// Check or uncheck an item
    Toggle {
        /// List ID or name
        list: String,

        /// Item ID or position as shown by `list show`
        item: String,
    },

    /// Edit an item's text or note
    Edit {
        /// List ID or name
        list: String,

        /// Item ID or position as shown by `list show`
        item: String,

        /// New text
        #[arg(long)]
        text: Option<String>,

        /// New note
        #[arg(long)]
        note: Option<String>,
    },

    /// Delete an item
    Delete {
        /// List ID or name
        list: String,

        /// Item ID or position as shown by `list show`
        item: String,
    },
}

impl ItemCommand {
    pub async fn run(&self, ctx: &Context) -> CommandResult {
        let mut engine = ctx.engine()?;

        match &self.command {
            ItemSubcommand::Add { list, text, note } => {
                open_list(&mut engine, list).await?;
                let mut item = Item::new(text.as_str());
                if let Some(note) = note {
                    item = item.with_note(note.as_str());
                }
                engine.append_item(item)?;
            }

            ItemSubcommand::Toggle { list, item } => {
                let state = open_list(&mut engine, list).await?;
                let id = find_item(state, item)?;
                engine.toggle_checked(&id)?;
            }

            ItemSubcommand::Edit {
                list,
                item,
                text,
                note,
            } => {
                if text.is_none() && note.is_none() {
                    return Err("Nothing to update. Provide --text and/or --note.".into());
                }

                let state = open_list(&mut engine, list).await?;
                let id = find_item(state, item)?;
                engine.edit_item(&id, text.as_deref(), note.as_deref())?;
            }

            ItemSubcommand::Delete { list, item } => {
                let state = open_list(&mut engine, list).await?;
                let id = find_item(state, item)?;
                engine.delete_item(&id)?;
            }
        }

        finish(&mut engine).await;
        if let Some(state) = engine.current() {
            println!("{}", state.name());
            print_items(state);
        }
        Ok(())
    }
}
