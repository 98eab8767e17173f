use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::client::{Action, JenkinsClient, SessionStore};
use crate::commands::{self, RunContext};
use crate::config::{ColorChoice, Config, Settings};

#[derive(Parser)]
#[command(name = "jenkins")]
#[command(author, version, about = "Command-line client for the Jenkins JSON API", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Jenkins server URI
    #[arg(short, long, global = true, env = "JENKINS_URL")]
    base_uri: Option<String>,

    /// Show successful jobs green instead of blue
    #[arg(short, long, global = true)]
    stoplight: bool,

    /// Job to work on; repeatable
    #[arg(short, long = "job", global = true)]
    jobs: Vec<String>,

    /// View whose jobs to work on, nested as `parent/child`; repeatable
    #[arg(short = 'w', long = "view", global = true)]
    views: Vec<String>,

    /// Act on several jobs without asking
    #[arg(short, long, global = true)]
    yes: bool,

    /// When to color output
    #[arg(long, global = true, value_enum)]
    color: Option<ColorChoice>,

    /// Trace HTTP requests on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// User to log in as
    #[arg(short, long, global = true, env = "JENKINS_USER")]
    user: Option<String>,

    /// Show stuck items in the queue
    #[arg(long, global = true)]
    stuck: bool,

    /// Configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show status of matching jobs
    #[command(visible_alias = "ls")]
    List { pattern: Option<String> },

    /// Trigger a build of matching jobs
    Start { pattern: String },

    /// Abort the running build of matching jobs
    Stop { pattern: String },

    /// Follow the console log of the last build of one job
    Tail { pattern: String },

    /// Disable matching jobs
    Disable { pattern: String },

    /// Enable matching jobs
    Enable { pattern: String },

    /// Wipe out the workspace of matching jobs
    Wipeout { pattern: String },

    /// Show the build queue
    #[command(visible_alias = "q")]
    Queue,

    /// Show recent builds of one job
    #[command(visible_alias = "hist")]
    History {
        pattern: String,

        /// Number of builds to show
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

impl Cli {
    /// Config file values with command-line flags applied on top.
    fn settings(&self, config: Config) -> Settings {
        let mut settings = Settings::from(config);

        if let Some(base_uri) = &self.base_uri {
            settings.base_uri = base_uri.clone();
        }
        if let Some(user) = &self.user {
            settings.credentials.user = Some(user.clone());
        }
        if !self.jobs.is_empty() {
            settings.jobs = self.jobs.clone();
        }
        if !self.views.is_empty() {
            settings.views = self.views.clone();
        }
        if let Some(color) = self.color {
            settings.color = color;
        }
        settings.stoplight |= self.stoplight;
        settings.verbose |= self.verbose;
        settings.show_stuck |= self.stuck;
        settings.auto_confirm |= self.yes;

        settings
    }

    pub async fn execute(self) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;
        let settings = self.settings(config);

        init_logging(settings.verbose);
        settings.color.apply();

        let client = JenkinsClient::new(
            &settings.base_uri,
            settings.credentials.clone(),
            SessionStore::default_location(),
        )?;
        info!("Using Jenkins at {}", client.base_url());
        let history_limit = settings.history_limit;
        let mut ctx = RunContext::new(client, settings);

        let stdout = io::stdout();
        let mut out = stdout.lock();

        match self.command {
            Commands::List { pattern } => {
                commands::list(&mut ctx, pattern.as_deref(), &mut out).await?
            }
            Commands::Start { pattern } => act(&mut ctx, Action::Start, &pattern, &mut out).await?,
            Commands::Stop { pattern } => act(&mut ctx, Action::Stop, &pattern, &mut out).await?,
            Commands::Disable { pattern } => act(&mut ctx, Action::Disable, &pattern, &mut out).await?,
            Commands::Enable { pattern } => act(&mut ctx, Action::Enable, &pattern, &mut out).await?,
            Commands::Wipeout { pattern } => act(&mut ctx, Action::Wipeout, &pattern, &mut out).await?,
            Commands::Tail { pattern } => commands::tail(&mut ctx, &pattern, &mut out).await?,
            Commands::Queue => commands::queue(&mut ctx, &mut out).await?,
            Commands::History { pattern, limit } => {
                let limit = limit.unwrap_or(history_limit);
                commands::history(&mut ctx, &pattern, limit, &mut out).await?
            }
        }

        out.flush()?;
        Ok(())
    }
}

/// Runs a write verb. Stdin is locked only for the confirmation prompt.
async fn act(
    ctx: &mut RunContext,
    action: Action,
    pattern: &str,
    out: &mut impl Write,
) -> crate::error::Result<()> {
    commands::act(ctx, action, pattern, io::stdin().lock(), out).await
}

/// `warn` by default, `debug` for this crate with `--verbose`; `RUST_LOG`
/// wins over both.
fn init_logging(verbose: bool) {
    let default = if verbose {
        concat!("warn,", env!("CARGO_CRATE_NAME"), "=debug")
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_aliases_and_flags_parse() {
        let cli = Cli::try_parse_from([
            "jenkins", "hist", "api", "-l", "5", "-j", "api", "-j", "web", "--color", "never",
            "-y",
        ])
        .unwrap();

        assert!(matches!(
            cli.command,
            Commands::History { ref pattern, limit: Some(5) } if pattern == "api"
        ));
        assert_eq!(cli.jobs, ["api", "web"]);
        assert_eq!(cli.color, Some(ColorChoice::Never));
        assert!(cli.yes);
    }

    #[test]
    fn test_action_requires_pattern() {
        assert!(Cli::try_parse_from(["jenkins", "start"]).is_err());
        assert!(Cli::try_parse_from(["jenkins", "ls"]).is_ok());
        assert!(Cli::try_parse_from(["jenkins", "q"]).is_ok());
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "jenkins", "list", "-b", "https://ci.example.com/", "-w", "nightly", "--stuck",
        ])
        .unwrap();

        let mut config = Config::default();
        config.selection.views = vec!["all".to_string()];
        config.selection.jobs = vec!["deploy".to_string()];
        config.display.stoplight = true;

        let settings = cli.settings(config);
        assert_eq!(settings.base_uri, "https://ci.example.com/");
        assert_eq!(settings.views, ["nightly"]);
        assert_eq!(settings.jobs, ["deploy"]);
        assert!(settings.stoplight);
        assert!(settings.show_stuck);
        assert!(!settings.auto_confirm);
    }
}
