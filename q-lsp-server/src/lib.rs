pub mod config;
pub mod server;
pub mod test_utils;

pub use config::{Cli, ServerConfig};
pub use server::QLanguageServer;
