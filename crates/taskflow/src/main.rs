//! CLI entry point for taskflow.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use taskflow_app::ApiError;
use taskflow_app::config::API_URL_ENV;
use taskflow_core::{CompletionFilter, ParseError, Priority, SortKey, TaskFilter, TaskId};
use time::Date;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

mod commands;

/// Command-line client for a TaskFlow server.
#[derive(Parser, Debug)]
#[command(
    name = "taskflow",
    version,
    about = "taskflow: manage tasks on a TaskFlow server from the terminal"
)]
struct Cli {
    /// Config file (defaults to <config dir>/taskflow/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the API base URL.
    #[arg(long, global = true, env = API_URL_ENV)]
    api_url: Option<String>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account.
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Sign in.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Keep the session for later invocations (defaults to the config value).
        #[arg(long)]
        remember: Option<bool>,
    },

    /// Sign out and forget the stored session.
    Logout,

    /// Show the signed-in user's profile.
    Whoami {
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Update name and email.
    Profile {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },

    /// Change the password.
    Password {
        #[arg(long)]
        current: String,
        #[arg(long)]
        new: String,
        #[arg(long)]
        confirm: String,
    },

    /// Statistics, a filtered list and recent activity.
    Dashboard {
        #[arg(long, default_value = "all")]
        filter: TaskFilter,
        /// Number of tasks shown under "recent activity".
        #[arg(long, default_value_t = 3)]
        recent: usize,
    },

    /// List tasks.
    Ls {
        #[arg(long, default_value = "all")]
        filter: TaskFilter,
        /// all, pending or completed.
        #[arg(long, default_value = "all")]
        status: CompletionFilter,
        #[arg(long)]
        sort: Option<SortKey>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Show task statistics.
    Stats {
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Create a task.
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, default_value = "low")]
        priority: Priority,
        /// Due date as YYYY-MM-DD.
        #[arg(long, value_parser = parse_due)]
        due: Date,
        /// Create the task already completed.
        #[arg(long)]
        completed: bool,
    },

    /// Update fields of a task.
    Edit {
        id: TaskId,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long, value_parser = parse_due)]
        due: Option<Date>,
        #[arg(long)]
        completed: Option<bool>,
    },

    /// Delete a task.
    Rm { id: TaskId },

    /// Flip the completion state of a task.
    Toggle { id: TaskId },
}

/// Output format for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn parse_due(raw: &str) -> Result<Date, ParseError> {
    taskflow_core::task::parse_date(raw).ok_or_else(|| ParseError::Date(raw.to_owned()))
}

fn main() -> Result<()> {
    let Cli {
        config,
        api_url,
        cmd,
    } = Cli::parse();
    install_tracing();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(commands::run(config.as_deref(), api_url, cmd));
    if let Err(err) = &result
        && err.downcast_ref::<ApiError>().is_some_and(ApiError::is_auth)
    {
        eprintln!("hint: run `taskflow login` to sign in again");
    }
    result
}

fn install_tracing() {
    // RUST_LOG overrides the default WARN level.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_span_events(FmtSpan::NONE)
        .compact()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn parse_add_command() {
        let cli = Cli::parse_from([
            "taskflow",
            "add",
            "--title",
            "Buy groceries",
            "--priority",
            "High",
            "--due",
            "2025-05-02",
        ]);

        match cli.cmd {
            Command::Add {
                title,
                description,
                priority,
                due,
                completed,
            } => {
                assert_eq!(title, "Buy groceries");
                assert_eq!(description, None);
                assert_eq!(priority, Priority::High);
                assert_eq!(due, date!(2025 - 05 - 02));
                assert!(!completed);
            }
            _ => panic!("expected add command"),
        }
    }

    #[test]
    fn parse_ls_command_with_defaults() {
        let cli = Cli::parse_from(["taskflow", "ls", "--status", "pending", "--sort", "priority"]);
        match cli.cmd {
            Command::Ls {
                filter,
                status,
                sort,
                format,
            } => {
                assert_eq!(filter, TaskFilter::All);
                assert_eq!(status, CompletionFilter::Pending);
                assert_eq!(sort, Some(SortKey::Priority));
                assert_eq!(format, OutputFormat::Table);
            }
            _ => panic!("expected ls command"),
        }
    }

    #[test]
    fn parse_edit_command_with_partial_fields() {
        let cli = Cli::parse_from([
            "taskflow",
            "--api-url",
            "http://127.0.0.1:9000/api",
            "edit",
            "abc123",
            "--completed",
            "true",
        ]);
        assert_eq!(cli.api_url.as_deref(), Some("http://127.0.0.1:9000/api"));
        match cli.cmd {
            Command::Edit {
                id,
                title,
                completed,
                due,
                ..
            } => {
                assert_eq!(id.as_str(), "abc123");
                assert_eq!(title, None);
                assert_eq!(due, None);
                assert_eq!(completed, Some(true));
            }
            _ => panic!("expected edit command"),
        }
    }

    #[test]
    fn parse_login_remember_flag() {
        let cli = Cli::parse_from([
            "taskflow", "login", "--email", "a@b.c", "--password", "pw", "--remember", "false",
        ]);
        match cli.cmd {
            Command::Login { remember, .. } => assert_eq!(remember, Some(false)),
            _ => panic!("expected login command"),
        }
    }

    #[test]
    fn dashboard_shows_three_recent_tasks_by_default() {
        let cli = Cli::parse_from(["taskflow", "dashboard"]);
        match cli.cmd {
            Command::Dashboard { filter, recent } => {
                assert_eq!(filter, TaskFilter::All);
                assert_eq!(recent, 3);
            }
            _ => panic!("expected dashboard command"),
        }
    }

    #[test]
    fn rejects_bad_filter_and_date() {
        assert!(Cli::try_parse_from(["taskflow", "dashboard", "--filter", "someday"]).is_err());
        assert!(
            Cli::try_parse_from(["taskflow", "add", "--title", "x", "--due", "tomorrow"]).is_err()
        );
    }
}
