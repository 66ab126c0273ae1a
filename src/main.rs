use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};
use quire::build::build_site;
use quire::config::Config;

#[derive(Debug, Parser)]
#[command(
    name = "quire",
    version,
    about = "Compiles a directory of Markdown posts into a static site"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Builds the site once.
    Build(ProjectArgs),

    /// Builds the site, then serves it and rebuilds on changes.
    Serve(ServeArgs),
}

#[derive(Debug, Args)]
struct ProjectArgs {
    /// The project file. Defaults to the nearest `quire.yaml` in the current
    /// directory or its parents.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides the output directory from the project file.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ServeArgs {
    #[command(flatten)]
    project: ProjectArgs,

    /// The address to listen on.
    #[arg(long, default_value = "127.0.0.1:8080")]
    addr: SocketAddr,
}

impl ProjectArgs {
    fn load(&self) -> Result<Config> {
        let output = self.output.as_deref();
        match &self.config {
            Some(path) => Config::from_project_file(path, output)
                .with_context(|| format!("load project file `{}`", path.display())),
            None => Config::from_directory(
                &std::env::current_dir().context("get current directory")?,
                output,
            ),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> Result<()> {
    quire::logging::init().context("init logging")?;

    let cli = Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        Command::Build(args) => {
            let config = args.load()?;
            tokio::task::block_in_place(|| build_site(&config)).context("build")?;
        }
        Command::Serve(args) => {
            let config = args.project.load()?;
            tokio::task::block_in_place(|| build_site(&config)).context("initial build")?;
            quire::serve::serve(config, args.addr)
                .await
                .context("serve")?;
        }
    }

    Ok(())
}
