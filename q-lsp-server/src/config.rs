use clap::Parser;
use q_lsp_core::DEFAULT_GLOB_PATTERN;
use std::path::PathBuf;

/// q-lsp: language server for the q programming language
#[derive(Parser, Debug, Clone)]
#[command(name = "q-lsp", version)]
#[command(about = "Language server for q, speaking LSP over stdio", long_about = None)]
pub struct Cli {
    /// Glob selecting the files indexed at startup, relative to the workspace root
    #[arg(long, env = "Q_LSP_GLOB", default_value = DEFAULT_GLOB_PATTERN)]
    pub glob: String,

    /// Write logs to this file instead of stderr
    #[arg(long, env = "Q_LSP_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Log filter directive, overridden by RUST_LOG when set
    #[arg(long, env = "Q_LSP_LOG", default_value = "q_lsp=info")]
    pub log_level: String,
}

impl Cli {
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            glob: self.glob.clone(),
        }
    }
}

/// Settings the running server needs after startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub glob: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            glob: DEFAULT_GLOB_PATTERN.to_string(),
        }
    }
}
