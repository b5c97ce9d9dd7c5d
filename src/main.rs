use lectern::cli::{Cli, Commands, ConfigAction};
use lectern::config::Config;
use lectern::corpus::FileLoader;
use lectern::embedding::FastEmbedProvider;
use lectern::engine::QaEngine;
use lectern::error::{LecternError, Result};
use lectern::indexer::{self, BuildManifest};
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Initialize logging
    init_logging(cli.verbose);

    // Handle commands
    match cli.command {
        Commands::Index { corpus } => {
            cmd_index(cli.config, corpus)?;
        }
        Commands::Ask {
            question,
            json,
            show_matches,
        } => {
            cmd_ask(cli.config, &question, json, show_matches)?;
        }
        Commands::Status => {
            cmd_status(cli.config)?;
        }
        Commands::Config { action } => {
            cmd_config(cli.config, action)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_filter = if verbose {
        "lectern=debug"
    } else {
        "lectern=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    fmt().with_env_filter(filter).with_target(false).init();
}

fn cmd_index(config_path: Option<PathBuf>, corpus: Option<PathBuf>) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(corpus) = corpus {
        config.corpus.documents_dir = corpus;
    }
    resolve_paths(&mut config)?;

    let provider = FastEmbedProvider::new(&config.embedding.model)?;
    let report = indexer::build_index(&config, &FileLoader, &provider)?;

    println!("✓ Index built");
    println!(
        "  Documents: {} indexed, {} skipped",
        report.documents_indexed, report.documents_skipped
    );
    println!(
        "  Chunks: {} ({}-dimensional)",
        report.chunk_count, report.dimension
    );
    println!("  Artifacts: {}", config.corpus.artifacts_dir.display());

    Ok(())
}

fn cmd_ask(
    config_path: Option<PathBuf>,
    question: &str,
    json: bool,
    show_matches: bool,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    resolve_paths(&mut config)?;

    let engine = QaEngine::open(&config)?;
    let outcome = engine.ask(question)?;

    if json {
        let payload = if show_matches {
            serde_json::json!({ "answer": outcome.answer, "matches": outcome.matches })
        } else {
            serde_json::json!({ "answer": outcome.answer })
        };
        let rendered = serde_json::to_string_pretty(&payload).map_err(|e| LecternError::Json {
            source: e,
            context: "Failed to serialize answer".to_string(),
        })?;
        println!("{}", rendered);
    } else {
        println!("{}", outcome.answer);

        if show_matches {
            println!();
            println!("Matches:");
            for hit in &outcome.matches {
                println!("  chunk {:>4}  distance {:.4}", hit.id, hit.distance);
            }
        }
    }

    Ok(())
}

fn cmd_status(config_path: Option<PathBuf>) -> Result<()> {
    let mut config = load_config(config_path)?;
    resolve_paths(&mut config)?;

    println!("Lectern Status");
    println!("==============");
    println!("\nCorpus:    {}", config.corpus.documents_dir.display());
    println!("Artifacts: {}", config.corpus.artifacts_dir.display());

    if !indexer::artifacts_exist(&config.corpus.artifacts_dir) {
        println!("\nIndex: not built (run `lectern index`)");
        return Ok(());
    }

    let manifest = BuildManifest::load(
        &config.corpus.artifacts_dir.join(indexer::MANIFEST_FILE),
    )?;

    println!(
        "\nIndex: {} chunks from {} documents",
        manifest.chunk_count, manifest.document_count
    );
    println!(
        "  Model: {} ({}-dimensional)",
        manifest.model, manifest.dimension
    );
    println!("  Chunk size: {} words", manifest.chunk_size);
    println!("  Built: {}", manifest.built_at);

    Ok(())
}

fn cmd_config(config_path: Option<PathBuf>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(config_path)?;
            let json = serde_json::to_string_pretty(&config).map_err(|e| LecternError::Json {
                source: e,
                context: "Failed to serialize config".to_string(),
            })?;

            println!("{}", json);
        }
        ConfigAction::Validate { file } => {
            let path = match file {
                Some(path) => path,
                None => Config::default_path()?,
            };
            let config = Config::load(&path)?;
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);
        }
        ConfigAction::Init { force } => {
            let path = Config::default_path()?;

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| LecternError::Io {
                    source: e,
                    context: format!("Failed to create config directory: {:?}", parent),
                })?;
            }

            let config = Config::default();
            config.save(&path)?;

            println!("✓ Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

fn load_config(config_path: Option<PathBuf>) -> Result<Config> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };

    if !path.exists() {
        tracing::warn!(
            "Config file not found, using defaults. Run 'lectern config init' to create one."
        );
        return Ok(Config::default());
    }

    Config::load(&path)
}

fn resolve_paths(config: &mut Config) -> Result<()> {
    config.corpus.documents_dir = expand_path(&config.corpus.documents_dir)?;
    config.corpus.artifacts_dir = expand_path(&config.corpus.artifacts_dir)?;
    Ok(())
}

fn expand_path(path: &Path) -> Result<PathBuf> {
    let path_str = path
        .to_str()
        .ok_or_else(|| LecternError::Config("Invalid path encoding".to_string()))?;

    if let Some(stripped) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| LecternError::Config("Cannot determine home directory".to_string()))?;
        Ok(home.join(stripped))
    } else {
        Ok(path.to_path_buf())
    }
}
