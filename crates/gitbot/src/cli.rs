use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "gitbot",
    version,
    about = "GitHub issue commands for chat bots, driven from the terminal"
)]
pub struct Cli {
    /// Output format
    #[arg(long, short = 'o', value_enum, global = true, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// When to colorize output
    #[arg(long, value_enum, global = true, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a TOML config file
    #[arg(long, env = "GITBOT_CONFIG", global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// GitHub API base URL (overrides config file)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Chat user id the commands run as
    #[arg(long, env = "GITBOT_USER", global = true, value_name = "ID")]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(ValueEnum, Clone, Debug, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(ValueEnum, Clone, Debug, Copy, Default)]
pub enum ColorChoice {
    /// Colorize output if stdout is a terminal
    #[default]
    Auto,
    /// Always colorize output
    Always,
    /// Never colorize output
    Never,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Issue commands, as the chat bot runs them
    #[command(visible_alias = "i")]
    Issue {
        #[command(subcommand)]
        action: IssueCommands,
    },
    /// Link or unlink a GitHub token for --user
    Auth {
        #[command(subcommand)]
        action: AuthCommands,
    },
    /// Inspect configuration
    #[command(visible_alias = "cfg")]
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum IssueCommands {
    /// List open issues, or show one
    Open {
        /// Repository as owner/repo (e.g. myferr/x3)
        repo: String,
        /// Issue number; lists all open issues when omitted
        issue_id: Option<u64>,
    },
    /// List closed issues, or show one
    Closed {
        /// Repository as owner/repo
        repo: String,
        /// Issue number; lists all closed issues when omitted
        issue_id: Option<u64>,
    },
    /// Close an issue (requires a linked token)
    Close {
        /// Repository as owner/repo
        repo: String,
        /// Issue number
        issue_id: u64,
    },
    /// Create an issue (requires a linked token)
    New {
        /// Repository as owner/repo
        repo: String,
        /// Issue title
        #[arg(long, short = 't')]
        title: String,
        /// Issue body
        #[arg(long, short = 'b')]
        body: Option<String>,
    },
    /// Browse the comments on an issue
    Comments {
        /// Repository as owner/repo
        repo: String,
        /// Issue number
        issue_id: u64,
    },
    /// Post a comment on an issue (requires a linked token)
    Comment {
        /// Repository as owner/repo
        repo: String,
        /// Issue number
        issue_id: u64,
        /// Comment text
        text: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Encrypt and store a GitHub token for --user
    Link {
        /// GitHub personal access token
        #[arg(long, env = "GITBOT_GITHUB_TOKEN", hide_env_values = true)]
        token: String,
    },
    /// Remove the stored token for --user
    Unlink,
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// List the config files consulted
    Path,
}

impl Cli {
    pub fn generate_completions(shell: Shell) {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "gitbot", &mut std::io::stdout());
    }
}
