//! fieldops: operator CLI for the field-operations backend

mod commands;
mod logger;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fieldops_client::ClientConfig;
use shared::models::{IssueStatus, IssueType};

#[derive(Parser, Debug)]
#[command(name = "fieldops", version)]
#[command(about = "Field operations dashboard from the command line")]
struct Cli {
    /// API root, e.g. http://localhost:8000/api
    #[arg(long, env = "FIELDOPS_API_URL")]
    api_url: Option<String>,

    /// Bearer token; falls back to the saved session
    #[arg(long, env = "FIELDOPS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Directory holding session.json
    #[arg(long, env = "FIELDOPS_SESSION_DIR", default_value = ".fieldops")]
    session_dir: PathBuf,

    #[arg(long, env = "FIELDOPS_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[arg(long, env = "FIELDOPS_LOG_JSON")]
    json_logs: bool,

    /// Also write daily rotating log files here
    #[arg(long, env = "FIELDOPS_LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Headline metrics and delayed projects
    Dashboard {
        #[arg(long)]
        json: bool,
    },
    /// List reported problems
    Issues {
        /// Case-insensitive project name fragment
        #[arg(long)]
        project: Option<String>,
        #[arg(long = "type")]
        issue_type: Option<IssueType>,
        #[arg(long)]
        status: Option<IssueStatus>,
        /// Creation date, YYYY-MM-DD
        #[arg(long)]
        date: Option<chrono::NaiveDate>,
    },
    /// Assign a technician to an issue
    Assign {
        #[arg(long)]
        technician: i64,
        #[arg(long)]
        issue: i64,
    },
    /// Clear the technician from an issue
    Unassign {
        #[arg(long)]
        issue: i64,
    },
    /// Project report as JSON
    Report {
        #[arg(long)]
        project: i64,
    },
    /// Add or remove an employee's projects
    EmployeeProjects {
        #[arg(long)]
        employee: i64,
        #[arg(long, value_delimiter = ',')]
        assign: Vec<i64>,
        #[arg(long, value_delimiter = ',')]
        unassign: Vec<i64>,
    },
    /// Local session and role switching
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
}

#[derive(Subcommand, Debug)]
enum SessionAction {
    /// Save the token and user returned by a login
    Login {
        #[arg(long)]
        token: String,
        /// User object as JSON
        #[arg(long)]
        user: String,
    },
    /// Act as another user, keeping the current session aside
    Impersonate {
        #[arg(long)]
        token: String,
        /// User object as JSON
        #[arg(long)]
        user: String,
    },
    /// Go back to the session kept aside by `impersonate`
    Restore,
    Show,
}

impl Cli {
    fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::from_env().with_session_dir(&self.session_dir);
        if let Some(url) = &self.api_url {
            config.base_url = url.clone();
        }
        if let Some(token) = &self.token {
            config = config.with_token(token.clone());
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    logger::init_logger(&cli.log_level, cli.json_logs, cli.log_dir.as_deref())
        .context("failed to initialize logging")?;

    let config = cli.client_config();
    tracing::debug!(base_url = %config.base_url, "Configuration loaded");

    match cli.command {
        Command::Session { action } => commands::session(&config, action),
        Command::Dashboard { json } => commands::dashboard(config, json).await,
        Command::Issues {
            project,
            issue_type,
            status,
            date,
        } => commands::issues(config, project, issue_type, status, date).await,
        Command::Assign { technician, issue } => commands::assign(config, technician, issue).await,
        Command::Unassign { issue } => commands::unassign(config, issue).await,
        Command::Report { project } => commands::report(config, project).await,
        Command::EmployeeProjects {
            employee,
            assign,
            unassign,
        } => commands::employee_projects(config, employee, assign, unassign).await,
    }
}
