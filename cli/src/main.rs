use registrar::{commands, logging};

use anyhow::Result;
use clap::Parser;
use registrar_core::{Category, MaterializeOptions};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "registrar",
    about = "Install and sync agents, tools and prompts from component registries",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Add items and their registry dependencies to the project
    ///
    /// Items can be specified in multiple formats:
    ///
    ///   Bare names:
    ///     web-search                - Resolved against the default registry
    ///
    ///   Namespaced:
    ///     @acme/web-search          - Resolved via [registries] in registrar.toml
    ///
    ///   URLs and local files:
    ///     https://example.com/r/web-search.json
    ///     ./items/web-search.json
    ///
    /// Examples:
    ///   registrar add web-search fetch-url
    ///   registrar add -k agents researcher
    ///   registrar add @acme/summarize -k prompts --overwrite
    Add {
        /// Items to add
        #[arg(required = true)]
        items: Vec<String>,

        /// Item kind (agents, tools or prompts)
        #[arg(long, short = 'k', default_value = "tools")]
        kind: Category,

        /// Project directory
        #[arg(long, default_value = ".")]
        cwd: PathBuf,

        /// Overwrite changed files without asking
        #[arg(long)]
        overwrite: bool,

        /// Answer yes to all prompts
        #[arg(long, short = 'y')]
        yes: bool,

        /// Don't print a summary
        #[arg(long, short = 's')]
        silent: bool,
    },

    /// Compare items against the local cache and update it
    ///
    /// Items may be given as `kind/name` (e.g. `prompts/greeting`) or as a
    /// name with --kind.
    Sync {
        /// Items to sync
        #[arg(required = true)]
        items: Vec<String>,

        /// Kind for items given without a `kind/` prefix
        #[arg(long, short = 'k', default_value = "tools")]
        kind: Category,

        /// Project directory
        #[arg(long, default_value = ".")]
        cwd: PathBuf,

        /// Cache directory (defaults to cache_dir in registrar.toml, then ~/.config/registrar/cache)
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Sync without asking for confirmation
        #[arg(long, short = 'y')]
        yes: bool,

        /// Print the plan and exit without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the resolved dependency tree as JSON
    View {
        /// Items to resolve
        #[arg(required = true)]
        items: Vec<String>,

        /// Item kind (agents, tools or prompts)
        #[arg(long, short = 'k', default_value = "tools")]
        kind: Category,

        /// Project directory
        #[arg(long, default_value = ".")]
        cwd: PathBuf,
    },

    /// Registry configuration commands
    Registry {
        #[command(subcommand)]
        command: RegistryCommand,
    },

    /// Create a registrar.toml with default settings
    Init {
        /// Project directory
        #[arg(long, default_value = ".")]
        cwd: PathBuf,

        /// Overwrite an existing registrar.toml
        #[arg(long)]
        force: bool,
    },
}

#[derive(Parser)]
enum RegistryCommand {
    /// List the default registry and configured namespaces
    List {
        /// Project directory
        #[arg(long, default_value = ".")]
        cwd: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = logging::init() {
        eprintln!("warning: file logging disabled: {:#}", e);
    }

    match cli.command {
        Command::Add {
            items,
            kind,
            cwd,
            overwrite,
            yes,
            silent,
        } => {
            let options = MaterializeOptions {
                overwrite,
                silent,
                yes,
            };
            commands::add::run(&items, kind, &cwd, options).await
        }

        Command::Sync {
            items,
            kind,
            cwd,
            cache_dir,
            yes,
            dry_run,
        } => {
            let options = commands::sync::SyncOptions {
                cache_dir,
                yes,
                dry_run,
            };
            commands::sync::run(&items, kind, &cwd, options).await
        }

        Command::View { items, kind, cwd } => commands::view::run(&items, kind, &cwd).await,

        Command::Registry { command } => match command {
            RegistryCommand::List { cwd } => commands::registry::list(&cwd),
        },

        Command::Init { cwd, force } => commands::init::run(&cwd, force),
    }
}
