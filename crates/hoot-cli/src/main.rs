mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use hoot_ai::VideoMetadata;
use hoot_core::config::get_data_dir;

use commands::{
    backend::Backend,
    blocked,
    config::{handle_config_command, ConfigAction},
    daemon::{run_daemon_process, show_daemon_status, start_daemon, stop_daemon},
    data::handle_data_clear,
    focus::{self, BlocklistAction},
    helpers::session_seconds,
};

#[derive(Parser)]
#[command(name = "hoot")]
#[command(about = "Focus sessions with goal-aware site and video blocking", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start a focus session (25 minutes unless a duration is given)
    Start {
        /// What you want to get done
        goal: String,
        #[arg(long, default_value_t = 0)]
        hours: i64,
        #[arg(short, long, default_value_t = 0)]
        minutes: i64,
        #[arg(short, long, default_value_t = 0)]
        seconds: i64,
    },
    /// End the running session and turn blocking off
    End,
    /// Show the session, block list and scheduler state
    Status {
        #[arg(long)]
        json: bool,
    },
    /// Evaluate a navigation against the active block list
    Check {
        url: String,
        /// Treat as an in-page history update instead of a committed load
        #[arg(long)]
        history: bool,
        #[arg(long)]
        json: bool,
    },
    /// Ask the classifier whether a video serves the session goal
    Analyze {
        /// Video id on the video host
        #[arg(long)]
        id: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        channel: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        url: Option<String>,
        /// Page observer the request belongs to
        #[arg(long, default_value = "cli")]
        observer: String,
        /// Judge against this goal instead of the session goal
        #[arg(long)]
        goal: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Show the block page for the most recent block
    Blocked,
    /// Inspect or change the active block list
    Blocklist {
        #[command(subcommand)]
        action: BlocklistAction,
    },
    /// Record a user-visible notification
    Notify { message: String },
    /// Manage the background daemon
    Daemon {
        #[command(subcommand)]
        action: DaemonAction,
    },
    /// (Internal) Run the daemon process
    #[command(hide = true)]
    DaemonInternalStart,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Data management commands
    Data {
        #[command(subcommand)]
        action: DataAction,
    },
}

#[derive(Subcommand, Debug)]
enum DaemonAction {
    /// Start the daemon in the background
    Start,
    /// Stop the daemon
    Stop,
    /// Check whether the daemon is running
    Status,
}

#[derive(Subcommand, Debug)]
enum DataAction {
    /// Delete all stored state
    Clear {
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if !matches!(cli.command, Commands::DaemonInternalStart) {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .format_timestamp_secs()
            .init();
    }

    let data_dir = get_data_dir()?;

    match cli.command {
        Commands::Start {
            goal,
            hours,
            minutes,
            seconds,
        } => {
            let backend = Backend::connect(&data_dir).await?;
            focus::start(&backend, goal, session_seconds(hours, minutes, seconds)).await
        }
        Commands::End => focus::end(&Backend::connect(&data_dir).await?).await,
        Commands::Status { json } => focus::status(&Backend::connect(&data_dir).await?, json).await,
        Commands::Check { url, history, json } => {
            let backend = Backend::connect(&data_dir).await?;
            focus::check(&backend, url, history, json).await
        }
        Commands::Analyze {
            id,
            title,
            channel,
            description,
            url,
            observer,
            goal,
            json,
        } => {
            let backend = Backend::connect(&data_dir).await?;
            let video = VideoMetadata {
                content_id: id,
                title,
                channel,
                description,
                url,
            };
            focus::analyze(&backend, observer, video, goal, json).await
        }
        Commands::Blocked => blocked::show(&Backend::connect(&data_dir).await?).await,
        Commands::Blocklist { action } => {
            focus::blocklist(&Backend::connect(&data_dir).await?, action).await
        }
        Commands::Notify { message } => {
            focus::notify(&Backend::connect(&data_dir).await?, message).await
        }
        Commands::Daemon { action } => match action {
            DaemonAction::Start => start_daemon(&data_dir),
            DaemonAction::Stop => stop_daemon(&data_dir).await,
            DaemonAction::Status => show_daemon_status(&data_dir).await,
        },
        Commands::DaemonInternalStart => run_daemon_process().await,
        Commands::Config { action } => handle_config_command(&data_dir, action).await,
        Commands::Data { action } => match action {
            DataAction::Clear { yes } => handle_data_clear(&data_dir, yes).await,
        },
    }
}
