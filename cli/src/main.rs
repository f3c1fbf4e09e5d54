pub use self::error::{Error, Result};
mod error;

use std::io;

use clap::Parser;
use todo_sync_core::{FileStore, Synchronizer, TodoClient};
use tracing::info;

use cli::Cli;
use transport::UreqTransport;

mod cli;
mod logging;
mod repl;
mod transport;
mod view;

fn main() {
    if let Err(e) = run() {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Cli::parse();
    logging::init()?;

    let state_file = args.state_file()?;
    info!(api_url = %args.api_url, state_file = %state_file.display(), "starting");

    let mut sync = Synchronizer::new(
        TodoClient::new(&args.api_url),
        UreqTransport::new(),
        FileStore::new(state_file),
    );
    repl::run(&mut sync, io::stdin().lock(), io::stdout().lock())?;
    Ok(())
}
