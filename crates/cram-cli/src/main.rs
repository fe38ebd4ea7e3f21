//! Cram CLI - Turn study files into summaries, flashcards, and study guides

mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Cram - Turn study files into summaries, flashcards, and study guides
#[derive(Parser)]
#[command(name = "cram")]
#[command(version)]
#[command(about = "Turn study files into summaries, flashcards, and study guides", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize cram (create config and database)
    Init,

    /// Register a new study session from file URLs
    Create {
        /// Owning user ID
        #[arg(short, long)]
        user: String,

        /// Files as name=url=media-type triples (repeatable)
        #[arg(required = true)]
        files: Vec<String>,

        /// Skip summary generation
        #[arg(long)]
        no_summary: bool,

        /// Skip flashcard generation
        #[arg(long)]
        no_flashcards: bool,

        /// Skip study guide generation
        #[arg(long)]
        no_study_guide: bool,
    },

    /// Process a pending session
    Process {
        /// Session ID
        id: String,

        /// User ID the session must belong to
        #[arg(short, long)]
        user: String,
    },

    /// Show a session's results
    Show {
        /// Session ID
        id: String,

        /// Also print the stored text chunks
        #[arg(long)]
        chunks: bool,
    },

    /// List recent sessions
    Status {
        /// Maximum number of sessions to show
        #[arg(short, long, default_value = "10")]
        limit: i64,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("cram=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cram=info,warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Init => commands::init::run(),
        Commands::Create {
            user,
            files,
            no_summary,
            no_flashcards,
            no_study_guide,
        } => commands::create::run(&user, &files, no_summary, no_flashcards, no_study_guide),
        Commands::Process { id, user } => commands::process::run(&id, &user),
        Commands::Show { id, chunks } => commands::show::run(&id, chunks),
        Commands::Status { limit } => commands::status::run(limit),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
