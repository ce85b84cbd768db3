use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tablechat::{
    AskOutcome, Config, DirTableStore, HttpCompletionClient, HttpEmbedder, Indexer, QdrantIndex,
    QueryPipeline,
};

#[derive(Parser)]
#[command(name = "tablechat")]
#[command(about = "Ask natural-language questions over CSV/Excel tables")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index all tabular files in the data directory
    Index {
        /// Path to the data directory (default: ./data or $DATA_DIR)
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
    },
    /// Ask a question about the indexed tables
    Ask {
        /// The question in natural language
        question: String,

        /// Path to the data directory (default: ./data or $DATA_DIR)
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tablechat=info".into()),
        )
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;

    match args.command {
        Commands::Index { data_dir } => run_index(config, data_dir).await,
        Commands::Ask { question, data_dir } => run_ask(config, question, data_dir).await,
    }
}

fn build_components(
    config: &Config,
    data_dir: Option<PathBuf>,
) -> (Arc<HttpEmbedder>, Arc<QdrantIndex>, Arc<HttpCompletionClient>, Arc<DirTableStore>) {
    let embedder = Arc::new(HttpEmbedder::new(
        config.openai_api_key.clone(),
        config.openai_base_url.clone(),
        config.embedding_model.clone(),
        config.embedding_dimension,
    ));
    let index = Arc::new(QdrantIndex::new(
        &config.qdrant_url,
        config.qdrant_api_key.clone(),
    ));
    let llm = Arc::new(HttpCompletionClient::new(
        config.openai_api_key.clone(),
        config.openai_base_url.clone(),
        config.llm_model.clone(),
    ));
    let store = Arc::new(DirTableStore::new(
        data_dir.unwrap_or_else(|| config.data_dir.clone()),
    ));
    (embedder, index, llm, store)
}

async fn run_index(config: Config, data_dir: Option<PathBuf>) -> Result<()> {
    let (embedder, index, _llm, store) = build_components(&config, data_dir);

    let indexer = Indexer::new(embedder, index);
    let report = indexer.index_store(store.as_ref()).await?;

    println!("Indexed {} table(s).", report.indexed.len());
    for file in &report.indexed {
        println!("  {}", file);
    }
    if !report.failed.is_empty() {
        println!("Failed {} table(s):", report.failed.len());
        for (file, reason) in &report.failed {
            println!("  {}: {}", file, reason);
        }
    }
    Ok(())
}

async fn run_ask(config: Config, question: String, data_dir: Option<PathBuf>) -> Result<()> {
    let (embedder, index, llm, store) = build_components(&config, data_dir);

    let pipeline = QueryPipeline::new(embedder, index, llm, store);
    match pipeline.ask(&question).await? {
        AskOutcome::Rejected => {
            println!("Please enter a meaningful natural language query.");
        }
        AskOutcome::NoMatch => {
            println!("No matching table found.");
        }
        AskOutcome::Answered(answer) => {
            match answer.score {
                Some(score) => println!(
                    "With a {}% match, the relevant data is likely in the {} ({}) table.",
                    (score * 100.0).round() as i64,
                    answer.table_name,
                    answer.source_file
                ),
                None => println!(
                    "Best matching table: {} ({})",
                    answer.table_name, answer.source_file
                ),
            }
            println!("SQL: {}", answer.sql);
            if answer.repaired {
                println!("(query was repaired after a failed first attempt)");
            }
            println!("{}", answer.rendering);
            println!();
            println!("{}", answer.summary);
        }
    }
    Ok(())
}
