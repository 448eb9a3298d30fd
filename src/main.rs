use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use revdiff::areas::repository::Repository;
use revdiff::artifacts::core::write_paged;
use revdiff::config::{RepositoryArgs, ServeArgs, ServerConfig};
use revdiff::server;
use std::io::Write;

#[derive(Parser)]
#[command(
    name = "revdiff",
    version = "0.1.0",
    author = "Sami Barbut-Dica",
    about = "Line-level comparison of two revisions of a git repository",
    long_about = "This tool compares two revisions (tags, branches or commits) of a local git \
    repository and classifies every changed line as added, removed or modified. \
    It can print the comparison or serve it over HTTP.",
    help_template = r"
{name} {version} - {about}

USAGE:
    {usage}

OPTIONS:
    {all-args}
",
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum OutputFormat {
    #[default]
    Json,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    #[command(
        name = "serve",
        about = "Serve the comparison API over HTTP",
        long_about = "This command starts the HTTP server exposing `GET /`, \
        `POST /compare-versions/` and `GET /refs` for the configured repository."
    )]
    Serve {
        #[command(flatten)]
        args: ServeArgs,
    },
    #[command(
        name = "compare",
        about = "Compare two revisions and print the changed lines",
        long_about = "This command resolves both revisions, diffs their trees and prints the \
        line-level classification of every changed file."
    )]
    Compare {
        #[arg(index = 1, help = "The base revision")]
        version1: String,
        #[arg(index = 2, help = "The revision to compare against the base")]
        version2: String,
        #[command(flatten)]
        repository: RepositoryArgs,
        #[arg(long, value_enum, default_value_t = OutputFormat::Json, help = "Output format")]
        format: OutputFormat,
    },
    #[command(
        name = "refs",
        about = "List the refs of the repository",
        long_about = "This command lists every loose and packed ref, followed by HEAD."
    )]
    Refs {
        #[command(flatten)]
        repository: RepositoryArgs,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { args } => {
            let config = ServerConfig::try_from(args)?;
            tokio::runtime::Runtime::new()?.block_on(server::serve(config))?
        }
        Commands::Compare {
            version1,
            version2,
            repository,
            format,
        } => {
            let repository = Repository::open(repository.resolve()?)?;
            let comparison = repository.compare_versions(&version1, &version2)?;

            match format {
                OutputFormat::Json => {
                    let mut stdout = std::io::stdout().lock();
                    serde_json::to_writer_pretty(&mut stdout, &comparison)?;
                    writeln!(stdout)?;
                }
                OutputFormat::Text => write_paged(|writer| comparison.write_text(writer))?,
            }
        }
        Commands::Refs { repository } => {
            let repository = Repository::open(repository.resolve()?)?;
            let mut stdout = std::io::stdout().lock();

            for name in repository.list_refs()? {
                writeln!(stdout, "{name}")?;
            }
        }
    }

    Ok(())
}
