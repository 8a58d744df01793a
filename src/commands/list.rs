use clap::{Args, Subcommand};
use std::io::{self, Write};

use super::{finish, open_list, print_items, CommandResult, Context, OutputFormat};
use scanlist::ListRecord;

#[derive(Args)]
pub struct ListCommand {
    #[command(subcommand)]
    pub command: ListSubcommand,
}

#[derive(Subcommand)]
pub enum ListSubcommand {
    /// List all your lists, newest first
    Ls {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Create a new, empty list
    Create {
        /// Name of the list
        name: String,
    },

    /// Rename a list
    Rename {
        /// List ID or name
        list: String,

        /// New name
        name: String,
    },

    /// Delete a list and all its items
    Delete {
        /// List ID or name
        list: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// Show a list's items
    Show {
        /// List ID or name
        list: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl ListCommand {
    pub async fn run(&self, ctx: &Context) -> CommandResult {
        let mut engine = ctx.engine()?;

        match &self.command {
            ListSubcommand::Ls { format } => {
                let lists = engine.lists().await?;

                match format {
                    OutputFormat::Json => {
                        let records: Vec<ListRecord> = lists.iter().map(ListRecord::from).collect();
                        println!("{}", serde_json::to_string_pretty(&records)?);
                    }
                    OutputFormat::Text => {
                        if lists.is_empty() {
                            println!("No lists found");
                            return Ok(());
                        }
                        println!("{:<36}  {:<30}  {:>5}  CREATED", "ID", "NAME", "ITEMS");
                        println!("{}", "-".repeat(90));
                        for list in &lists {
                            let name = if list.name.chars().count() > 30 {
                                format!("{}...", list.name.chars().take(27).collect::<String>())
                            } else {
                                list.name.clone()
                            };
                            println!(
                                "{:<36}  {:<30}  {:>5}  {}",
                                list.id,
                                name,
                                list.items.len(),
                                list.created_at.format("%Y-%m-%d %H:%M")
                            );
                        }
                        println!("\nTotal: {} list(s)", lists.len());
                    }
                }
                Ok(())
            }

            ListSubcommand::Create { name } => {
                let state = engine.create_list(name).await?;
                println!("Created list:");
                println!("{}", state.list());
                Ok(())
            }

            ListSubcommand::Rename { list, name } => {
                let old_name = open_list(&mut engine, list).await?.name().to_string();
                engine.rename(name)?;
                finish(&mut engine).await;
                println!("Renamed '{}' to '{}'", old_name, name.trim());
                Ok(())
            }

            ListSubcommand::Delete { list, force } => {
                let state = open_list(&mut engine, list).await?;
                let (id, name) = (state.id().to_string(), state.name().to_string());

                // Confirm deletion unless --force is used
                if !force {
                    print!("Delete list '{}' and its {} item(s)? [y/N] ", name, state.items().len());
                    io::stdout().flush()?;

                    let mut input = String::new();
                    io::stdin().read_line(&mut input)?;

                    if !input.trim().eq_ignore_ascii_case("y") {
                        println!("Deletion cancelled.");
                        return Ok(());
                    }
                }

                engine.delete_list(&id).await?;
                println!("Deleted list: {}", name);
                Ok(())
            }

            ListSubcommand::Show { list, format } => {
                let state = open_list(&mut engine, list).await?;

                match format {
                    OutputFormat::Json => {
                        println!(
                            "{}",
                            serde_json::to_string_pretty(&ListRecord::from(state.list()))?
                        );
                    }
                    OutputFormat::Text => {
                        println!("{}", state.list());
                        println!();
                        print_items(state);
                    }
                }
                Ok(())
            }
        }
    }
}
