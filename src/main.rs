use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use docq::cli::{Cli, Commands, ConfigAction};
use docq::completion::OpenAiClient;
use docq::config::Config;
use docq::embedding;
use docq::error::{DocqError, Result};
use docq::pipeline::{PipelineOptions, RagPipeline};
use docq::server::{self, AppState};
use docq::store::VectorStore;

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    init_logging(cli.verbose);

    match cli.command {
        Commands::Index { src, out } => {
            cmd_index(cli.config, src, out)?;
        }
        Commands::Ask { query, top_k } => {
            cmd_ask(cli.config, &query, top_k)?;
        }
        Commands::Serve { bind } => {
            cmd_serve(cli.config, bind)?;
        }
        Commands::Config { action } => {
            cmd_config(cli.config, action)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "docq=debug" } else { "docq=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt().with_env_filter(filter).with_target(false).init();
}

fn cmd_index(
    config_path: Option<PathBuf>,
    src: Option<PathBuf>,
    out: Option<PathBuf>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let src_dir = src.unwrap_or_else(|| config.paths.data_dir.clone());
    let index_dir = out.unwrap_or_else(|| config.paths.index_dir.clone());

    let embedder = embedding::build_provider(&config.embedding)?;
    let mut store = VectorStore::open(&index_dir, embedder)?;
    let chunks = store.rebuild(&src_dir, &config.chunking)?;

    println!("✓ Index built: {} chunks", chunks);
    println!("  Source: {}", src_dir.display());
    println!("  Output: {}", index_dir.display());
    Ok(())
}

fn cmd_ask(config_path: Option<PathBuf>, query: &str, top_k: usize) -> Result<()> {
    let config = load_config(config_path)?;
    let mut pipeline = build_pipeline(&config)?;

    let rt = tokio::runtime::Runtime::new().map_err(|e| DocqError::Io {
        source: e,
        context: "Failed to create tokio runtime".to_string(),
    })?;
    let (answer, sources) = rt.block_on(pipeline.answer(query, top_k))?;

    println!("{}", answer);
    if !sources.is_empty() {
        println!("\nSources:");
        for source in &sources {
            let page = source.page.map(|p| format!(":p{}", p)).unwrap_or_default();
            println!(
                "  {}{} (score {:.3})",
                source.path.display(),
                page,
                source.score
            );
        }
    }
    Ok(())
}

fn cmd_serve(config_path: Option<PathBuf>, bind: SocketAddr) -> Result<()> {
    let config = load_config(config_path)?;
    let pipeline = build_pipeline(&config)?;

    tracing::info!(
        "Serving index of {} chunks from {:?}",
        pipeline.index_len(),
        config.paths.index_dir
    );

    let state = AppState {
        pipeline: Arc::new(tokio::sync::RwLock::new(pipeline)),
        config: Arc::new(config),
    };

    let rt = tokio::runtime::Runtime::new().map_err(|e| DocqError::Io {
        source: e,
        context: "Failed to create tokio runtime".to_string(),
    })?;
    rt.block_on(server::serve(state, bind))
}

fn cmd_config(config_path: Option<PathBuf>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(config_path)?;
            let json = serde_json::to_string_pretty(&config).map_err(|e| DocqError::Json {
                source: e,
                context: "Failed to serialize config".to_string(),
            })?;
            println!("{}", json);
        }
        ConfigAction::Validate { file } => {
            let path = match file {
                Some(p) => p,
                None => Config::default_path()?,
            };
            Config::load(&path)?;
            println!("✓ Configuration is valid: {}", path.display());
        }
        ConfigAction::Init { force } => {
            let path = Config::default_path()?;

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| DocqError::Io {
                    source: e,
                    context: format!("Failed to create config directory: {:?}", parent),
                })?;
            }

            Config::default().save(&path)?;
            println!("✓ Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

fn build_pipeline(config: &Config) -> Result<RagPipeline> {
    let embedder = embedding::build_provider(&config.embedding)?;
    let store = VectorStore::open(&config.paths.index_dir, embedder)?;
    let llm = Arc::new(OpenAiClient::new(&config.completion));

    if !llm.has_credential() {
        tracing::warn!(
            "No completion credential found (OPENAI_API_KEY / GROQ_API_KEY); \
             answers will fall back to extracted excerpts"
        );
    }

    Ok(RagPipeline::new(
        store,
        llm,
        PipelineOptions::from_config(config),
    ))
}

fn load_config(config_path: Option<PathBuf>) -> Result<Config> {
    let path = match config_path {
        Some(p) => p,
        None => Config::default_path()?,
    };

    if !path.exists() {
        tracing::warn!("Config file not found, using defaults. Run 'docq config init' to create one.");
        let mut config = Config::default();
        config.apply_env_overrides();
        config.validate()?;
        return Ok(config);
    }

    Config::load(&path)
}
