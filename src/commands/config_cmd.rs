use clap::{Args, Subcommand};
use std::fs;
use std::io::Write;

use super::OutputFormat;
use scanlist::config::Config;

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Initialize configuration file
    Init,
}

impl ConfigCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(config)?);
                    }
                    OutputFormat::Text => {
                        println!("Configuration");
                        println!("=============\n");

                        if let Some(path) = &config.config_file {
                            println!("Config file: {}", path.display());
                        } else {
                            println!(
                                "Config file: {} (not found)",
                                Config::default_config_path().display()
                            );
                        }
                        println!();

                        println!("server_url: {}", config.server_url.value);
                        println!("  source: {}", config.server_url.source);
                        println!();

                        println!("session_path: {}", config.session_path.value.display());
                        println!("  source: {}", config.session_path.source);
                        println!();

                        println!("ocr.command: {}", config.ocr.command.value);
                        println!("  source: {}", config.ocr.command.source);
                        println!("ocr.language: {}", config.ocr.language.value);
                        println!("  source: {}", config.ocr.language.source);
                        println!("ocr.timeout_secs: {}", config.ocr.timeout_secs.value);
                        println!("  source: {}", config.ocr.timeout_secs.source);
                    }
                }
                Ok(())
            }

            ConfigSubcommand::Init => {
                let config_path = Config::default_config_path();

                // Check if config already exists
                if config_path.exists() {
                    println!("Config file already exists: {}", config_path.display());
                    println!("Use 'scanlist config show' to view current configuration.");
                    return Ok(());
                }

                // Create parent directory
                if let Some(parent) = config_path.parent() {
                    fs::create_dir_all(parent)?;
                }

                let default_config = r#"# scanlist configuration

# List server base URL
server_url: http://localhost:5000

# Where the login session is stored (default: <data dir>/scanlist/session.json)
# session_path: session.json

ocr:
  # Recognizer executable and language
  command: tesseract
  language: eng
  # Give up on a single recognition after this many seconds
  timeout_secs: 60
"#;

                let mut file = fs::File::create(&config_path)?;
                file.write_all(default_config.as_bytes())?;

                println!("Created config file: {}", config_path.display());
                println!("\nEdit this file to customize your settings.");
                Ok(())
            }
        }
    }
}
