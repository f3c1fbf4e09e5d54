use std::path::PathBuf;

use clap::Parser;

use crate::{Error, Result};

/// Terminal client for the todo API.
#[derive(Parser, Debug)]
#[command(name = "todo-sync", version, about = "Terminal client for the todo API")]
pub struct Cli {
    /// Base URL of the todo API server.
    #[arg(long, env = "TODO_API_URL", default_value = "http://localhost:5000")]
    pub api_url: String,

    /// File holding the persisted session.
    ///
    /// Defaults to `todo-sync/session.json` under the user's config directory.
    #[arg(long, env = "TODO_STATE_FILE")]
    pub state_file: Option<PathBuf>,
}

impl Cli {
    pub fn state_file(&self) -> Result<PathBuf> {
        if let Some(path) = &self.state_file {
            return Ok(path.clone());
        }
        dirs::config_dir()
            .map(|dir| dir.join("todo-sync").join("session.json"))
            .ok_or_else(|| Error::Custom("no config directory found; pass --state-file".to_string()))
    }
}
