//! Runtime configuration, read from command-line arguments with environment fallbacks.

use anyhow::Context;
use clap::Args;
use derive_new::new;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8000";
pub const REPOSITORY_ENV: &str = "REVDIFF_REPOSITORY";
pub const BIND_ENV: &str = "REVDIFF_BIND";

#[derive(Debug, Clone, Default, Args)]
pub struct RepositoryArgs {
    #[arg(
        long = "repo",
        env = REPOSITORY_ENV,
        value_name = "PATH",
        help = "Path to the repository to compare (defaults to the current directory)"
    )]
    pub repository_path: Option<PathBuf>,
}

impl RepositoryArgs {
    pub fn resolve(&self) -> anyhow::Result<PathBuf> {
        match &self.repository_path {
            Some(path) => Ok(path.clone()),
            None => std::env::current_dir().context("unable to read the current directory"),
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    #[command(flatten)]
    pub repository: RepositoryArgs,
    #[arg(
        long = "bind",
        env = BIND_ENV,
        value_name = "ADDR",
        default_value = DEFAULT_BIND_ADDRESS,
        help = "Address the HTTP server listens on"
    )]
    pub bind_address: SocketAddr,
}

/// Settings of a running server. The repository path is fixed at startup.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct ServerConfig {
    pub repository_path: PathBuf,
    pub bind_address: SocketAddr,
}

impl TryFrom<ServeArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: ServeArgs) -> anyhow::Result<Self> {
        Ok(ServerConfig::new(args.repository.resolve()?, args.bind_address))
    }
}
