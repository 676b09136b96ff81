use clap::{Parser, Subcommand};

/// LazyHire job tracker: HTTP API plus the automated ingestion pipeline.
#[derive(Parser, Debug)]
#[command(name = "lazyhire", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start the HTTP server and the daily scrape scheduler (default).
    Serve,

    /// Run a single ingestion in the foreground and exit.
    RunOnce {
        /// Send the digest email like a scheduled run would.
        #[arg(long)]
        notify: bool,
    },
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }
}
