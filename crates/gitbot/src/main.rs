mod cli;
mod color;
mod logging;
mod output;

use anyhow::{anyhow, Result};
use clap::Parser;
use cli::{AuthCommands, Cli, Commands, ConfigCommands, IssueCommands, OutputFormat};
use gitbot::config::{config_paths, Config};
use gitbot::interaction::{new_issue_modal_id, BODY_INPUT, TITLE_INPUT};
use gitbot::{AesGcmTokenCodec, FileCredentialStore, Interaction, IssueBot, IssueCommand, Response};
use github_backend::GitHubClient;
use output::{output_error, output_message, output_result};
use serde::Serialize;
use std::collections::HashMap;
use std::io::{BufRead, IsTerminal, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    color::init(cli.color);
    let format = cli.format;

    if let Err(e) = run(cli) {
        output_error(&e, format);
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

fn run(cli: Cli) -> Result<()> {
    if let Commands::Completions { shell } = &cli.command {
        Cli::generate_completions(*shell);
        return Ok(());
    }

    let mut config = Config::load(cli.config.clone())?;
    config.merge_with_cli(cli.api_url.clone());
    logging::init_tracing(config.log_level.as_deref());

    match &cli.command {
        Commands::Config { action } => handle_config(*action, &config, &cli),
        Commands::Auth { action } => handle_auth(action, &config, &cli),
        Commands::Issue { action } => {
            config.validate()?;
            let bot = build_bot(&config)?;
            handle_issue(&bot, action, &cli)
        }
        Commands::Completions { .. } => Ok(()),
    }
}

fn build_bot(config: &Config) -> Result<IssueBot> {
    let codec = AesGcmTokenCodec::new(config.token_key.as_deref());
    if !codec.has_key() {
        tracing::debug!("no token_key configured; linked tokens cannot be decrypted");
    }
    Ok(IssueBot::new(
        Box::new(GitHubClient::with_base_url(&config.api_url)),
        Box::new(FileCredentialStore::new(config.credentials_path()?)),
        Box::new(codec),
    )
    .with_page_size(config.page_size)
    .with_session_timeout(config.session_timeout()))
}

fn caller_id(cli: &Cli) -> String {
    cli.user.clone().unwrap_or_default()
}

fn required_user(cli: &Cli) -> Result<&str> {
    cli.user
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| anyhow!("No user given. Set via --user or GITBOT_USER env var"))
}

fn handle_issue(bot: &IssueBot, action: &IssueCommands, cli: &Cli) -> Result<()> {
    let command = match action {
        IssueCommands::Open { repo, issue_id } => IssueCommand::Open {
            repo: repo.clone(),
            issue_id: *issue_id,
        },
        IssueCommands::Closed { repo, issue_id } => IssueCommand::Closed {
            repo: repo.clone(),
            issue_id: *issue_id,
        },
        IssueCommands::Close { repo, issue_id } => IssueCommand::Close {
            repo: repo.clone(),
            issue_id: *issue_id,
        },
        IssueCommands::New { repo, title, body } => {
            return handle_new(bot, repo, title, body.as_deref(), cli)
        }
        IssueCommands::Comments { repo, issue_id } => IssueCommand::Comments {
            repo: repo.clone(),
            issue_id: *issue_id,
        },
        IssueCommands::Comment {
            repo,
            issue_id,
            text,
        } => IssueCommand::Comment {
            repo: repo.clone(),
            issue_id: *issue_id,
            text: text.clone(),
        },
    };

    let interactive = matches!(action, IssueCommands::Comments { .. })
        && cli.format == OutputFormat::Text
        && std::io::stdin().is_terminal();

    let response = bot.handle(&Interaction::Command {
        interaction_id: format!("cli-{}", std::process::id()),
        caller_id: caller_id(cli),
        command,
    });
    output_result(&response, cli.format);

    if interactive {
        browse_comments(bot, response, cli)?;
    }
    Ok(())
}

/// Open the form, then submit it with the given fields
fn handle_new(
    bot: &IssueBot,
    repo: &str,
    title: &str,
    body: Option<&str>,
    cli: &Cli,
) -> Result<()> {
    let caller = caller_id(cli);
    let opened = bot.handle(&Interaction::Command {
        interaction_id: format!("cli-{}", std::process::id()),
        caller_id: caller.clone(),
        command: IssueCommand::New {
            repo: repo.to_string(),
        },
    });

    let Response::Modal(form) = opened else {
        output_result(&opened, cli.format);
        return Ok(());
    };
    tracing::debug!(form = %form.custom_id, "submitting issue form");

    let mut fields = HashMap::new();
    fields.insert(TITLE_INPUT.to_string(), title.to_string());
    fields.insert(BODY_INPUT.to_string(), body.unwrap_or_default().to_string());

    let submitted = bot.handle(&Interaction::ModalSubmit {
        caller_id: caller,
        custom_id: new_issue_modal_id(repo.trim()),
        fields,
    });
    output_result(&submitted, cli.format);
    Ok(())
}

/// Drive the page buttons from stdin until the user quits or no page is left
fn browse_comments(bot: &IssueBot, mut current: Response, cli: &Cli) -> Result<()> {
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        let Some(reply) = current.reply() else {
            return Ok(());
        };
        if reply.buttons.iter().all(|b| b.disabled) {
            return Ok(());
        }
        let buttons = reply.buttons.clone();

        print!("[n]ext, [p]rev, [q]uit: ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next() else {
            return Ok(());
        };
        let pressed = match line?.trim() {
            "n" | "next" => buttons.iter().find(|b| b.custom_id.ends_with(":next")),
            "p" | "prev" => buttons.iter().find(|b| b.custom_id.ends_with(":prev")),
            "q" | "quit" => return Ok(()),
            _ => continue,
        };
        let Some(button) = pressed else {
            continue;
        };

        let response = bot.handle(&Interaction::Component {
            caller_id: caller_id(cli),
            custom_id: button.custom_id.clone(),
        });
        output_result(&response, cli.format);
        if !matches!(response, Response::Acknowledge) {
            current = response;
        }
    }
}

fn handle_auth(action: &AuthCommands, config: &Config, cli: &Cli) -> Result<()> {
    let user = required_user(cli)?;
    let store = FileCredentialStore::new(config.credentials_path()?);

    match action {
        AuthCommands::Link { token } => {
            let codec = AesGcmTokenCodec::new(config.token_key.as_deref());
            let payload = codec.encrypt(token)?;
            store.link(user, &payload)?;
            output_message(&format!("Linked GitHub token for user {}", user), cli.format);
        }
        AuthCommands::Unlink => {
            if store.unlink(user)? {
                output_message(&format!("Unlinked GitHub token for user {}", user), cli.format);
            } else {
                output_message(&format!("No linked GitHub token for user {}", user), cli.format);
            }
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct ConfigPath {
    path: String,
    exists: bool,
}

fn handle_config(action: ConfigCommands, config: &Config, cli: &Cli) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            let shown = config.redacted();
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&shown)?),
                OutputFormat::Text => {
                    let unset = "(unset)".to_string();
                    let credentials = config
                        .credentials_path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|_| unset.clone());
                    println!("api_url: {}", shown.api_url);
                    println!("credentials_path: {}", credentials);
                    println!(
                        "token_key: {}",
                        shown.token_key.as_ref().unwrap_or(&unset)
                    );
                    println!("page_size: {}", shown.page_size);
                    println!("session_timeout_secs: {}", shown.session_timeout_secs);
                    println!(
                        "log_level: {}",
                        shown.log_level.as_ref().unwrap_or(&unset)
                    );
                }
            }
        }
        ConfigCommands::Path => {
            let paths: Vec<ConfigPath> = config_paths(cli.config.as_deref())
                .into_iter()
                .map(|p| ConfigPath {
                    exists: p.exists(),
                    path: p.display().to_string(),
                })
                .collect();
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&paths)?),
                OutputFormat::Text => {
                    for p in &paths {
                        let marker = if p.exists { " (found)" } else { "" };
                        println!("{}{}", p.path, marker);
                    }
                }
            }
        }
    }
    Ok(())
}
