//! Biblioteca CLI - command line front end for the library admin client.
//!
//! # Commands
//!
//! - `biblioteca users list|get|create|update|delete` - Manage users
//! - `biblioteca authors list|get|create|update|delete` - Manage authors
//! - `biblioteca books list|get|create|update|delete` - Manage books
//! - `biblioteca loans list|get|create|return` - Manage loans
//! - `biblioteca watch` - Stream bus events, metrics and realtime status
//! - `biblioteca completions` - Generate shell completions
//!
//! Every API call runs through the reactive wrapper, so the delay, timeout
//! and retry settings from `BIBLIOTECA_EVENT_*` apply.

use biblioteca::AdminApp;
use biblioteca::client::models::BookForm;
use biblioteca::config::AppConfig;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use colored::Colorize;
use std::io;

mod commands;
mod error;
mod output;

use commands::{authors, books, loans, users, watch};
use error::{CliError, CliResult};
use output::print_mini_banner;

/// Biblioteca CLI - library administration from the terminal
#[derive(Parser)]
#[command(name = "biblioteca")]
#[command(author = "Pegasus Heavy Industries LLC")]
#[command(version)]
#[command(about = "📚 Manage users, authors, books and loans of the library API")]
#[command(long_about = None)]
#[command(propagate_version = true)]
#[command(after_help = format!(
    "{}\n  {} biblioteca books list --available\n  {} biblioteca loans create --user 1 --book 7\n  {} biblioteca watch --seconds 30\n\n{}\n  {} BIBLIOTECA_API_URL, BIBLIOTECA_WS_URL, BIBLIOTECA_EVENT_*, BIBLIOTECA_WS_*",
    "Examples:".bright_cyan().bold(),
    "$".dimmed(),
    "$".dimmed(),
    "$".dimmed(),
    "Environment:".bright_cyan().bold(),
    "→".dimmed()
))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override the REST API base URL
    #[arg(long, global = true, env = "BIBLIOTECA_API_URL")]
    api_url: Option<String>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage users
    #[command(alias = "u")]
    Users {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Manage authors
    #[command(alias = "a")]
    Authors {
        #[command(subcommand)]
        command: AuthorCommands,
    },

    /// Manage books
    #[command(alias = "b")]
    Books {
        #[command(subcommand)]
        command: BookCommands,
    },

    /// Manage loans
    #[command(alias = "l")]
    Loans {
        #[command(subcommand)]
        command: LoanCommands,
    },

    /// Stream bus events, metrics and realtime status
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Generate shell completions
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// =============================================================================
// RESOURCE COMMANDS
// =============================================================================

#[derive(Subcommand)]
enum UserCommands {
    /// List all users
    #[command(alias = "ls")]
    List,
    /// Show one user
    Get { id: i64 },
    /// Register a user
    Create(UserArgs),
    /// Update a user
    Update {
        id: i64,
        #[command(flatten)]
        user: UserArgs,
    },
    /// Delete a user
    #[command(alias = "rm")]
    Delete { id: i64 },
}

#[derive(Args)]
struct UserArgs {
    /// Full name
    #[arg(short, long)]
    name: String,

    /// Email address
    #[arg(short, long)]
    email: String,
}

#[derive(Subcommand)]
enum AuthorCommands {
    /// List all authors
    #[command(alias = "ls")]
    List,
    /// Show one author
    Get { id: i64 },
    /// Register an author
    Create(AuthorArgs),
    /// Update an author
    Update {
        id: i64,
        #[command(flatten)]
        author: AuthorArgs,
    },
    /// Delete an author
    #[command(alias = "rm")]
    Delete { id: i64 },
}

#[derive(Args)]
struct AuthorArgs {
    /// Author name
    #[arg(short, long)]
    name: String,

    /// Nationality
    #[arg(long)]
    nationality: Option<String>,
}

#[derive(Subcommand)]
enum BookCommands {
    /// List all books
    #[command(alias = "ls")]
    List {
        /// Only books that can be loaned
        #[arg(long)]
        available: bool,
    },
    /// Show one book
    Get { id: i64 },
    /// Register a book
    Create(BookArgs),
    /// Update a book
    Update {
        id: i64,
        #[command(flatten)]
        book: BookArgs,
    },
    /// Delete a book
    #[command(alias = "rm")]
    Delete { id: i64 },
}

#[derive(Args)]
struct BookArgs {
    /// Book title
    #[arg(short, long)]
    title: String,

    /// Author ID
    #[arg(short, long)]
    author: i64,

    /// Availability flag
    #[arg(long)]
    available: Option<bool>,
}

impl From<BookArgs> for BookForm {
    fn from(args: BookArgs) -> Self {
        BookForm {
            title: args.title,
            author_id: args.author,
            available: args.available,
        }
    }
}

#[derive(Subcommand)]
enum LoanCommands {
    /// List loans
    #[command(alias = "ls")]
    List {
        /// Only loans that have not been returned
        #[arg(long)]
        open: bool,
    },
    /// Show one loan
    Get { id: i64 },
    /// Lend a book to a user
    Create {
        /// User ID
        #[arg(short, long)]
        user: i64,

        /// Book ID
        #[arg(short, long)]
        book: i64,
    },
    /// Mark a loan as returned
    Return { id: i64 },
}

#[derive(Args)]
struct WatchArgs {
    /// Stop after this many seconds
    #[arg(short, long)]
    seconds: Option<u64>,

    /// Do not connect the realtime relay
    #[arg(long)]
    no_realtime: bool,
}

// =============================================================================
// ENTRY POINT
// =============================================================================

fn load_app(api_url: Option<String>) -> CliResult<AdminApp> {
    let mut config = AppConfig::from_env().map_err(|e| CliError::Config(e.to_string()))?;
    if let Some(url) = api_url {
        config.api_url = url;
    }
    Ok(AdminApp::new(config)?)
}

async fn run(cli: Cli) -> CliResult<()> {
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "biblioteca", &mut io::stdout());
        return Ok(());
    }

    let app = load_app(cli.api_url)?;
    tracing::debug!(?app, "starting command");

    match cli.command {
        Commands::Users { command } => match command {
            UserCommands::List => users::list(&app).await,
            UserCommands::Get { id } => users::get(&app, id).await,
            UserCommands::Create(user) => users::create(&app, user.name, user.email).await,
            UserCommands::Update { id, user } => {
                users::update(&app, id, user.name, user.email).await
            }
            UserCommands::Delete { id } => users::delete(&app, id).await,
        },

        Commands::Authors { command } => match command {
            AuthorCommands::List => authors::list(&app).await,
            AuthorCommands::Get { id } => authors::get(&app, id).await,
            AuthorCommands::Create(author) => {
                authors::create(&app, author.name, author.nationality).await
            }
            AuthorCommands::Update { id, author } => {
                authors::update(&app, id, author.name, author.nationality).await
            }
            AuthorCommands::Delete { id } => authors::delete(&app, id).await,
        },

        Commands::Books { command } => match command {
            BookCommands::List { available } => books::list(&app, available).await,
            BookCommands::Get { id } => books::get(&app, id).await,
            BookCommands::Create(book) => books::create(&app, book.into()).await,
            BookCommands::Update { id, book } => books::update(&app, id, book.into()).await,
            BookCommands::Delete { id } => books::delete(&app, id).await,
        },

        Commands::Loans { command } => match command {
            LoanCommands::List { open } => loans::list(&app, open).await,
            LoanCommands::Get { id } => loans::get(&app, id).await,
            LoanCommands::Create { user, book } => loans::create(&app, user, book).await,
            LoanCommands::Return { id } => loans::return_loan(&app, id).await,
        },

        Commands::Watch(args) => {
            print_mini_banner();
            watch::run(&app, args.seconds, !args.no_realtime).await
        }

        Commands::Completions { .. } => Ok(()),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let mut log_config = biblioteca::log::LogConfig::from_env();
    if cli.verbose {
        log_config.level = biblioteca::log::Level::Debug;
    }
    biblioteca::log::init_with(&log_config);

    if let Err(e) = run(cli).await {
        eprintln!("\n  {} {}\n", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
