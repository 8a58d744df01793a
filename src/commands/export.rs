use chrono::Local;
use clap::Args;
use std::path::PathBuf;

use super::{open_list, CommandResult, Context};
use scanlist::export;

/// Export a list as plain text
#[derive(Args)]
pub struct ExportCommand {
    /// List ID or name
    list: String,

    /// Directory to write `<Name>_backup.txt` into (default: current directory)
    #[arg(long, conflicts_with = "stdout")]
    dir: Option<PathBuf>,

    /// Print the export instead of writing a file
    #[arg(long)]
    stdout: bool,
}

impl ExportCommand {
    pub async fn run(&self, ctx: &Context) -> CommandResult {
        let mut engine = ctx.engine()?;
        let state = open_list(&mut engine, &self.list).await?;
        let today = Local::now().date_naive();

        if self.stdout {
            print!("{}", export::render(state.list(), today));
            return Ok(());
        }

        let dir = self.dir.clone().unwrap_or_else(|| PathBuf::from("."));
        let path = export::write_to_dir(state.list(), today, &dir)?;
        println!("Exported '{}' to {}", state.name(), path.display());
        Ok(())
    }
}
