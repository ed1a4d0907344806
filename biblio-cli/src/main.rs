//! Interactive launcher: initialize the engine once, then answer
//! questions in a read-eval loop, printing each answer with its sources.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::info;
use tracing_subscriber::EnvFilter;

use biblio_rag::{EngineConfig, initialize};

#[derive(Parser)]
#[command(name = "biblio", about = "Ask questions over a local document collection")]
struct Args {
    /// Directory scanned recursively for .txt and .pdf documents
    #[arg(long, default_value = "data/documents")]
    docs_dir: PathBuf,

    /// Directory holding the persisted vector index
    #[arg(long, default_value = "vector_store")]
    index_dir: PathBuf,

    /// Maximum chunk size in characters
    #[arg(long, default_value_t = 1000)]
    chunk_size: usize,

    /// Overlap between consecutive chunks in characters
    #[arg(long, default_value_t = 150)]
    chunk_overlap: usize,

    /// Number of passages retrieved per question
    #[arg(long, default_value_t = 4)]
    top_k: usize,

    /// Provider request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = EngineConfig::builder()
        .docs_dir(args.docs_dir)
        .index_dir(args.index_dir)
        .chunk_size(args.chunk_size)
        .chunk_overlap(args.chunk_overlap)
        .top_k(args.top_k)
        .request_timeout(Duration::from_secs(args.timeout_secs))
        .build()?;

    info!("initializing engine");
    let engine = initialize(&config).await;
    println!("engine status: {}", engine.status());
    if engine.is_ready() {
        println!("type a question, or 'exit' to quit\n");
    }

    let mut editor = DefaultEditor::new()?;
    loop {
        match editor.readline("question> ") {
            Ok(line) => {
                let question = line.trim();
                if question.is_empty() {
                    continue;
                }
                if question == "exit" || question == "quit" {
                    break;
                }
                let _ = editor.add_history_entry(question);

                let answer = engine.answer(question).await;
                println!("\n{}\n", answer.text);
                if !answer.sources.is_empty() {
                    println!("sources:");
                    let mut seen: Vec<&str> = Vec::new();
                    for chunk in &answer.sources {
                        let source = chunk.source_path().unwrap_or("<unknown>");
                        if !seen.contains(&source) {
                            println!("  - {source}");
                            seen.push(source);
                        }
                    }
                    println!();
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(error) => return Err(error.into()),
        }
    }

    Ok(())
}
