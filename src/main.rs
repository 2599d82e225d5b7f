use anyhow::{Context as _, Result};
use arxiv_shelf::config::{
    default_config_path, find_config_file, load_config, render_config, write_default_config,
    Config,
};
use arxiv_shelf::import::ImportPipeline;
use arxiv_shelf::models::PaperRecord;
use arxiv_shelf::sources::PaperSource;
use arxiv_shelf::ui::{self, Spinner, Status};
use arxiv_shelf::{SearchSession, ShelfError};
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// arxiv-shelf - Search arXiv and add papers to your e-book library
#[derive(Parser, Debug)]
#[command(name = "arxiv-shelf")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "hongkongkiwi")]
#[command(about = "Search arXiv and add papers to your e-book library", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search arXiv and list the results
    #[command(alias = "s")]
    Search {
        /// Search terms
        #[arg(required = true)]
        terms: Vec<String>,
    },

    /// Search and show the details of one result
    Show {
        /// Search terms
        #[arg(required = true)]
        terms: Vec<String>,

        /// Result to show (1-based)
        #[arg(long, short, default_value_t = 1)]
        pick: usize,
    },

    /// Search and add one result to the library
    Add {
        /// Search terms
        #[arg(required = true)]
        terms: Vec<String>,

        /// Result to add (1-based)
        #[arg(long, short, default_value_t = 1)]
        pick: usize,
    },

    /// Add a paper to the library by its arXiv URL
    Import {
        /// Canonical paper URL, e.g. http://arxiv.org/abs/1706.03762v7
        url: String,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Write a configuration file with the default settings
    Init {
        /// Where to write it (defaults to the user config directory)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

fn init_tracing(cli: &Cli, config: &Config) {
    let level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => config.logging.level.as_str(),
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("arxiv_shelf={}", level)),
    );

    let json = config.logging.is_json();
    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
        }))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}

/// Text shown when a search fails
fn search_failure(err: &ShelfError) -> String {
    match err {
        ShelfError::EmptyQuery => err.to_string(),
        ShelfError::SearchFailed(source) => format!("Search failed: {}", source),
        other => format!("Search failed: {}", other),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Spinners are only drawn for human-readable, non-quiet output
fn shows_progress(cli: &Cli) -> bool {
    !(cli.quiet || cli.json)
}

/// Run a search, exiting with an error message if it fails
async fn search_or_exit(session: &mut SearchSession, terms: &[String], cli: &Cli) {
    let spinner = Spinner::with_visibility(ui::SEARCHING_MESSAGE, shows_progress(cli));
    let result = session.search(&terms.join(" ")).await.map(|r| r.len());
    spinner.clear();

    if let Err(e) = result {
        ui::print_status(Status::Error, &search_failure(&e));
        std::process::exit(1);
    }
}

/// Select the 1-based `pick`, exiting with an error message if out of range
fn pick_or_exit(session: &mut SearchSession, pick: usize) -> PaperRecord {
    if session.is_empty() {
        ui::print_status(Status::Error, ui::NO_RESULTS_MESSAGE);
        std::process::exit(1);
    }
    let count = session.results().len();
    match pick.checked_sub(1).map(|i| session.select(i)) {
        Some(Ok(record)) => record.clone(),
        _ => {
            ui::print_status(
                Status::Error,
                &format!("No result #{} (the search returned {})", pick, count),
            );
            std::process::exit(1);
        }
    }
}

/// Import on a background task, reporting progress on a spinner
async fn import_or_exit(pipeline: ImportPipeline, record: PaperRecord, cli: &Cli) -> Result<()> {
    let pipeline = Arc::new(pipeline);
    let spinner = Spinner::with_visibility(
        &format!("Importing {}", record.title),
        shows_progress(cli),
    );
    let mut handle = pipeline.spawn(record);

    while let Some(event) = handle.next_event().await {
        tracing::debug!(?event, "Import progress");
        spinner.set_message(&ui::import_event_message(&event));
    }

    match handle.finish().await {
        Ok(outcome) => {
            if cli.json {
                spinner.clear();
                print_json(&outcome)?;
            } else if cli.quiet {
                spinner.clear();
            } else {
                spinner.finish_with_success(&format!(
                    "Added \"{}\" to {}",
                    outcome.record.title, outcome.location
                ));
            }
            Ok(())
        }
        Err(e) => {
            spinner.clear();
            ui::print_status(Status::Error, &format!("Import failed: {}", e));
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().or_else(find_config_file);
    let config = load_config(config_path.as_deref()).with_context(|| match &config_path {
        Some(path) => format!("Failed to load config from {}", path.display()),
        None => "Failed to load config from the environment".to_string(),
    })?;

    init_tracing(&cli, &config);
    if let Some(path) = &config_path {
        tracing::info!("Using config file: {}", path.display());
    }

    match &cli.command {
        Commands::Search { terms } => {
            let source: Arc<dyn PaperSource> = Arc::new(config.arxiv_source()?);
            let mut session = SearchSession::new(source);
            search_or_exit(&mut session, terms, &cli).await;

            if cli.json {
                print_json(&session.results())?;
            } else {
                ui::print_results(session.results());
            }
        }

        Commands::Show { terms, pick } => {
            let source: Arc<dyn PaperSource> = Arc::new(config.arxiv_source()?);
            let mut session = SearchSession::new(source);
            search_or_exit(&mut session, terms, &cli).await;
            let record = pick_or_exit(&mut session, *pick);

            if cli.json {
                print_json(&record)?;
            } else {
                ui::print_details(&record);
            }
        }

        Commands::Add { terms, pick } => {
            let source: Arc<dyn PaperSource> = Arc::new(config.arxiv_source()?);
            let mut session = SearchSession::new(Arc::clone(&source));
            search_or_exit(&mut session, terms, &cli).await;
            let record = pick_or_exit(&mut session, *pick);

            let pipeline = config.import_pipeline(source)?;
            import_or_exit(pipeline, record, &cli).await?;
        }

        Commands::Import { url } => {
            let source: Arc<dyn PaperSource> = Arc::new(config.arxiv_source()?);
            let record = PaperRecord::from_url(url);
            let pipeline = config.import_pipeline(source)?;
            import_or_exit(pipeline, record, &cli).await?;
        }

        Commands::Config { action } => match action {
            ConfigAction::Init { path, force } => {
                let path = path
                    .clone()
                    .or_else(default_config_path)
                    .context("No config directory found; pass --path")?;
                write_default_config(&path, *force)?;
                if !cli.quiet {
                    ui::print_status(
                        Status::Success,
                        &format!("Wrote default config to {}", path.display()),
                    );
                }
            }
            ConfigAction::Show => {
                if cli.json {
                    print_json(&config)?;
                } else {
                    print!("{}", render_config(&config)?);
                }
            }
        },

        Commands::Completions { shell } => {
            clap_complete::generate(
                *shell,
                &mut Cli::command(),
                "arxiv-shelf",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}
