use clap::{ArgAction, Parser, Subcommand};
use commands::{catalog, config, recommend, session::Session, tab};
use media_tracker_models::{ItemId, MediaKind, StatusCategory, WatchStatus};
use std::process::ExitCode;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "mediatracker")]
#[command(about = "MediaTracker - Keep track of the movies and TV shows you watch")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// Which list to work on: movie or tv (defaults to the last active tab)
    #[arg(short, long, global = true)]
    kind: Option<MediaKind>,

    /// Also write logs to the daily-rotated log file
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    log_file: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show your list, optionally filtered
    #[command(long_about = "Show the movies or TV shows in your list. --query keeps titles containing the text (case-insensitive); --status keeps one watch status ('all', 'want-to-watch', 'watching', 'watched').")]
    List {
        /// Only titles containing this text
        #[arg(long)]
        query: Option<String>,

        /// Only items with this status, or 'all'
        #[arg(long)]
        status: Option<StatusCategory>,
    },

    /// Add a movie or TV show
    Add {
        #[arg(long)]
        title: String,

        #[arg(long)]
        year: Option<i32>,

        #[arg(long, default_value = "want-to-watch")]
        status: WatchStatus,

        /// Rating from 0 to 5
        #[arg(long)]
        rating: Option<f32>,

        /// Personal note shown with the item
        #[arg(long)]
        note: Option<String>,

        /// Fill year, poster and overview from a metadata search on the title
        #[arg(long, action = ArgAction::SetTrue)]
        lookup: bool,
    },

    /// Change fields of an item in your list
    Edit {
        id: ItemId,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        year: Option<i32>,

        #[arg(long)]
        status: Option<WatchStatus>,

        #[arg(long)]
        rating: Option<f32>,

        #[arg(long)]
        note: Option<String>,
    },

    /// Remove an item from your list
    Delete {
        id: ItemId,

        /// Skip the confirmation prompt
        #[arg(short, long, action = ArgAction::SetTrue)]
        yes: bool,
    },

    /// Show recommendations based on your list, or accept one
    #[command(long_about = "Show titles recommended from what is already in your list. The service needs at least a few items in the list first. Use --accept to add a recommended title to your list as 'Want to Watch'.")]
    Recommend {
        /// Title of the recommendation to add
        #[arg(long, value_name = "TITLE")]
        accept: Option<String>,
    },

    /// Find the trailer of an item in your list
    Trailer { id: ItemId },

    /// Search metadata for a title
    Search { query: String },

    /// Show or set the default list
    Tab {
        /// movie or tv
        #[arg(value_name = "KIND")]
        tab: Option<MediaKind>,
    },

    /// Show or create the configuration file
    Config {
        #[command(subcommand)]
        cmd: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration and paths
    Show,

    /// Write a configuration file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,

        /// Use the production catalog service
        #[arg(long, action = ArgAction::SetTrue)]
        production: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> color_eyre::Result<ExitCode> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let log_file = cli
        .log_file
        .then(|| media_tracker_config::PathManager::default().log_file());
    logging::init_logging_with_file(cli.verbose, cli.quiet, log_file)
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    let kind = cli.kind;
    match cli.command {
        Commands::Config { cmd } => {
            config::run_config(cmd.unwrap_or(ConfigCommands::Show), &output)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Tab { tab: selected } => {
            tab::run_tab(selected, &output)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::List { query, status } => {
            let session = Session::open(kind)?;
            let result = catalog::run_list(&session, query, status, &output).await;
            session.finish(result, &output)
        }
        Commands::Add {
            title,
            year,
            status,
            rating,
            note,
            lookup,
        } => {
            let session = Session::open(kind)?;
            let draft = catalog::Draft {
                title,
                year,
                status,
                rating,
                note,
            };
            let result = catalog::run_add(&session, draft, lookup, &output).await;
            session.finish(result, &output)
        }
        Commands::Edit {
            id,
            title,
            year,
            status,
            rating,
            note,
        } => {
            let session = Session::open(kind)?;
            let patch = catalog::edit_patch(title, year, status, rating, note);
            let result = catalog::run_edit(&session, id, patch, &output).await;
            session.finish(result, &output)
        }
        Commands::Delete { id, yes } => {
            let session = Session::open(kind)?;
            let result = catalog::run_delete(&session, id, yes, &output).await;
            session.finish(result, &output)
        }
        Commands::Recommend { accept } => {
            let session = Session::open(kind)?;
            let result = recommend::run_recommend(&session, accept, &output).await;
            session.finish(result, &output)
        }
        Commands::Trailer { id } => {
            let session = Session::open(kind)?;
            let result = catalog::run_trailer(&session, id, &output).await;
            session.finish(result, &output)
        }
        Commands::Search { query } => {
            let session = Session::open(kind)?;
            let result = catalog::run_search(&session, &query, &output).await;
            session.finish(result, &output)
        }
    }
}
