use crate::browse::{run_browse, run_cantons, run_list};
use crate::server;
use clap::{Args, Parser, Subcommand};
use lehrstellen::config::ListingConfig;
use lehrstellen::error::AppError;
use lehrstellen::listing::DataLocation;

#[derive(Parser, Debug)]
#[command(
    name = "lehrstellen",
    about = "Browse apprenticeship postings by canton and profession",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print one page of the filtered listing
    List(ListArgs),
    /// Browse the listing interactively from the terminal
    Browse(BrowseArgs),
    /// Show the known cantons and how many ZIP codes each covers
    Cantons(DataArgs),
}

/// Overrides for where the posting list and canton mapping are read from.
#[derive(Args, Debug, Default, Clone)]
pub(crate) struct DataArgs {
    /// Path or http(s) URL of the posting list
    #[arg(long)]
    pub(crate) postings: Option<String>,
    /// Path or http(s) URL of the ZIP code to canton mapping
    #[arg(long)]
    pub(crate) cantons: Option<String>,
}

impl DataArgs {
    pub(crate) fn apply(&self, listing: &mut ListingConfig) {
        if let Some(postings) = &self.postings {
            listing.postings = DataLocation::parse(postings);
        }
        if let Some(cantons) = &self.cantons {
            listing.cantons = DataLocation::parse(cantons);
        }
    }
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    #[command(flatten)]
    pub(crate) data: DataArgs,
}

#[derive(Args, Debug)]
pub(crate) struct ListArgs {
    /// Canton code, e.g. ZH
    #[arg(long)]
    pub(crate) canton: Option<String>,
    /// Exact profession name
    #[arg(long)]
    pub(crate) profession: Option<String>,
    /// 1-based page number
    #[arg(long)]
    pub(crate) page: Option<usize>,
    #[command(flatten)]
    pub(crate) data: DataArgs,
}

#[derive(Args, Debug)]
pub(crate) struct BrowseArgs {
    /// Override the delay before a requested change is shown, in milliseconds
    #[arg(long)]
    pub(crate) delay_ms: Option<u64>,
    #[command(flatten)]
    pub(crate) data: DataArgs,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::List(args) => run_list(args).await,
        Command::Browse(args) => run_browse(args).await,
        Command::Cantons(args) => run_cantons(args).await,
    }
}
