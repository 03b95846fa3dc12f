use std::path::PathBuf;

use serde::Deserialize;

use rankfuse::cli::{Cli, Commands};
use rankfuse::config::Config;
use rankfuse::corpus::Corpus;
use rankfuse::error::{Result, RetrieverError};
use rankfuse::lexical::{tokenize, Bm25Index, Bm25Params, IndexStore};

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    init_logging(cli.verbose);

    let config = Config::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Index { input, output } => cmd_index(&config, input, output),
        Commands::Search {
            query,
            limit,
            index,
            json,
        } => cmd_search(&config, &query, limit, index, json),
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "rankfuse=debug" } else { "rankfuse=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt().with_env_filter(filter).with_target(false).init();
}

/// One input line of the `index` command
#[derive(Debug, Deserialize)]
struct PassageRecord {
    text: String,
    source: String,
    #[serde(default)]
    page: Option<u32>,
}

fn cmd_index(config: &Config, input: PathBuf, output: Option<PathBuf>) -> Result<()> {
    let content = std::fs::read_to_string(&input).map_err(|e| RetrieverError::Io {
        source: e,
        context: format!("Failed to read passage file: {}", input.display()),
    })?;

    let mut corpus = Corpus::new();
    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record: PassageRecord =
            serde_json::from_str(line).map_err(|e| RetrieverError::Json {
                source: e,
                context: format!("Invalid passage record at {}:{}", input.display(), line_no + 1),
            })?;
        corpus.push(record.text, record.source, record.page);
    }

    if corpus.is_empty() {
        return Err(RetrieverError::Config(format!(
            "No passages found in {}",
            input.display()
        )));
    }

    let params = Bm25Params {
        k1: config.retrieval.bm25_k1,
        b: config.retrieval.bm25_b,
    };
    let index = Bm25Index::build(&corpus, params);
    let store = IndexStore::new(output.unwrap_or_else(|| config.storage.index_path.clone()));
    let snapshot = store.save(index, corpus)?;

    println!(
        "Indexed {} passages -> {} (fingerprint {})",
        snapshot.corpus.len(),
        store.path().display(),
        &snapshot.fingerprint()[..16]
    );
    Ok(())
}

fn cmd_search(
    config: &Config,
    query: &str,
    limit: usize,
    index: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let store = IndexStore::new(index.unwrap_or_else(|| config.storage.index_path.clone()));
    let Some(snapshot) = store.load() else {
        return Err(RetrieverError::Config(format!(
            "No usable lexical index at {} - run `rankfuse index` first",
            store.path().display()
        )));
    };

    let terms = tokenize(query);
    let hits = snapshot.index.top_k(&terms, limit);

    if json {
        let results: Vec<serde_json::Value> = hits
            .iter()
            .filter_map(|&(ordinal, score)| {
                snapshot.corpus.get(ordinal).map(|p| {
                    serde_json::json!({
                        "score": score,
                        "passage": p,
                    })
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&results).map_err(|e| {
            RetrieverError::Json {
                source: e,
                context: "Failed to encode search results".to_string(),
            }
        })?);
        return Ok(());
    }

    if hits.is_empty() {
        println!("No matches.");
        return Ok(());
    }

    for (rank, &(ordinal, score)) in hits.iter().enumerate() {
        let Some(passage) = snapshot.corpus.get(ordinal) else {
            continue;
        };
        let location = match passage.page {
            Some(page) => format!("{} p.{}", passage.source, page),
            None => passage.source.clone(),
        };
        println!("{:2}. [{:.3}] {}", rank + 1, score, location);
        println!("      {}", passage.preview(160));
    }
    Ok(())
}
