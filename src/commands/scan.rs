use clap::Args;
use std::path::PathBuf;

use super::{finish, open_list, print_items, CommandResult, Context};

/// Recognize text in an image and append each line as an item
#[derive(Args)]
pub struct ScanCommand {
    /// List ID or name
    list: String,

    /// Image file to recognize
    image: PathBuf,
}

impl ScanCommand {
    pub async fn run(&self, ctx: &Context) -> CommandResult {
        let mut engine = ctx.engine()?;
        open_list(&mut engine, &self.list).await?;

        let scanner = ctx.scanner();
        println!("Scanning {}...", self.image.display());
        let items = scanner.scan(&self.image).await?;

        if items.is_empty() {
            println!("No text recognized.");
            return Ok(());
        }

        let added = engine.append_many(items)?;
        finish(&mut engine).await;

        if let Some(state) = engine.current() {
            println!("Added {} item(s) to '{}':", added, state.name());
            print_items(state);
        }
        Ok(())
    }
}
