use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod analyze;
mod display;
mod ingest;
mod search;

#[derive(Parser)]
#[command(name = "complai", version, about = "AI-driven financial complaint risk analysis")]
struct Cli {
    /// Directory containing `model.onnx` and `tokenizer.json`.
    #[arg(
        long,
        env = "COMPLAI_MODEL_DIR",
        default_value = "models/all-MiniLM-L6-v2",
        global = true
    )]
    model_dir: PathBuf,

    /// LanceDB directory holding the precedent store.
    #[arg(long, env = "COMPLAI_DB_PATH", default_value = "data/lancedb", global = true)]
    db_path: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest a directory of historical decision documents into the precedent store.
    Ingest {
        /// Directory of `.pdf`/`.txt` decision documents.
        #[arg(default_value = "knowledge_base")]
        dir: PathBuf,
    },

    /// Analyze a complaint/FRL pair and print the risk report.
    Analyze {
        /// Customer complaint (PDF).
        complaint: PathBuf,
        /// Firm's final response letter (PDF).
        frl: PathBuf,
        /// Gemini API key.
        #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
        api_key: String,
        /// Generative model name.
        #[arg(long, env = "COMPLAI_GEN_MODEL", default_value = complai_llm::DEFAULT_MODEL)]
        gen_model: String,
        /// Also generate outcome and confidence explanations.
        #[arg(long)]
        explain: bool,
    },

    /// Search the precedent store with a free-text query.
    Search {
        query: String,
        /// Number of matches to return.
        #[arg(long, default_value_t = 5)]
        k: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Ingest { dir } => ingest::run(&cli.model_dir, &cli.db_path, &dir).await,
        Command::Analyze {
            complaint,
            frl,
            api_key,
            gen_model,
            explain,
        } => {
            analyze::run(
                &cli.model_dir,
                &cli.db_path,
                &api_key,
                &gen_model,
                &complaint,
                &frl,
                explain,
            )
            .await
        }
        Command::Search { query, k } => search::run(&cli.model_dir, &cli.db_path, &query, k).await,
    }
}
