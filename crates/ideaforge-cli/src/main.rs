mod cmd;
mod output;

use clap::{Parser, Subcommand};
use ideaforge_cli::root;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "ideaforge",
    about = "Ask a language model for small projects and keep improving them, one commit at a time",
    version,
    propagate_version = true
)]
struct Cli {
    /// Primary repository root (default: auto-detect from ideaforge.yaml or .git/)
    #[arg(long, global = true, env = "IDEAFORGE_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new project or improve an existing one, then commit and push
    Run,

    /// List known projects (ideas directory, or the manifest in multi-repo mode)
    List,

    /// Print the context blob the model would see for a local project
    Context {
        /// Project directory name under the ideas directory
        project: String,
    },

    /// Extract files from a saved model response
    Parse {
        /// Response file, or `-` for stdin
        file: PathBuf,

        /// Re-emit the extracted files in marker format
        #[arg(long)]
        render: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Run => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());
    ideaforge_cli::load_env_file(&root);

    let result = match cli.command {
        Commands::Run => cmd::run::run(&root, cli.json),
        Commands::List => cmd::list::run(&root, cli.json).map(|()| true),
        Commands::Context { project } => {
            cmd::context::run(&root, &project, cli.json).map(|()| true)
        }
        Commands::Parse { file, render } => cmd::parse::run(&file, render, cli.json).map(|()| true),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            // Print the full error chain (anyhow's alternate Display)
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
    }
}
