//! Account commands: register, login, logout, whoami.

use clap::Args;
use std::io::{self, Write};

use super::{CommandResult, Context};
use scanlist::{AuthProvider, Session};

#[derive(Args)]
pub struct RegisterCommand {
    /// Username for the new account
    username: String,

    /// Password (prompted if omitted)
    #[arg(long)]
    password: Option<String>,
}

#[derive(Args)]
pub struct LoginCommand {
    /// Username
    username: String,

    /// Password (prompted if omitted)
    #[arg(long)]
    password: Option<String>,
}

impl RegisterCommand {
    pub async fn run(&self, ctx: &Context) -> CommandResult {
        let password = password_or_prompt(self.password.as_deref())?;
        let account = ctx.client.register(&self.username, &password).await?;

        let session = Session::from(account);
        session.save(&ctx.config.session_path.value)?;
        println!("Registered and logged in as {}", session.username);
        Ok(())
    }
}

impl LoginCommand {
    pub async fn run(&self, ctx: &Context) -> CommandResult {
        let password = password_or_prompt(self.password.as_deref())?;
        let account = ctx.client.login(&self.username, &password).await?;

        let session = Session::from(account);
        session.save(&ctx.config.session_path.value)?;
        println!("Logged in as {}", session.username);
        Ok(())
    }
}

pub fn logout(ctx: &Context) -> CommandResult {
    if Session::logout(&ctx.config.session_path.value)? {
        println!("Logged out.");
    } else {
        println!("Not logged in.");
    }
    Ok(())
}

pub async fn whoami(ctx: &Context) -> CommandResult {
    match Session::load(&ctx.config.session_path.value)? {
        Some(session) => {
            println!("Logged in as: {}", session.username);
            println!("User ID: {}", session.user_id);
        }
        None => println!("Not logged in."),
    }

    let reachable = ctx.client.health().await;
    println!(
        "Server: {} ({})",
        ctx.client.server_url(),
        if reachable { "reachable" } else { "unreachable" }
    );
    Ok(())
}

fn password_or_prompt(password: Option<&str>) -> Result<String, io::Error> {
    if let Some(password) = password {
        return Ok(password.to_string());
    }

    print!("Password: ");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}
