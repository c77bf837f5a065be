use crate::config::{DEFAULT_FIND_ALL_SIZE, DEFAULT_URL};
use crate::core::ConfigProvider;
use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "tasks")]
#[command(about = "A small to-do list stored in elasticsearch")]
pub struct CliConfig {
    #[arg(long, global = true, default_value = DEFAULT_URL)]
    pub url: String,

    #[arg(long, global = true, help = "Read adapter settings from a TOML file")]
    pub config: Option<String>,

    #[arg(long, global = true)]
    pub timeout_seconds: Option<u64>,

    #[arg(long, global = true, help = "Ask elasticsearch to refresh after every write")]
    pub refresh: bool,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Write log lines as JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Add a new task
    Add { title: String },
    /// List every task
    List,
    /// List tasks that are not completed yet
    Remaining,
    /// Mark a task as completed
    Done { id: String },
    /// Mark a task as not completed
    Undo { id: String },
    /// Delete a task
    Remove { id: String },
}

impl ConfigProvider for CliConfig {
    fn base_url(&self) -> &str {
        &self.url
    }

    fn timeout_seconds(&self) -> Option<u64> {
        self.timeout_seconds
    }

    fn find_all_size(&self) -> usize {
        DEFAULT_FIND_ALL_SIZE
    }

    fn refresh_on_write(&self) -> bool {
        self.refresh
    }
}
