use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use search_core::{
    log_duration, process_queries, process_queries_joined, remove_duplicates, DocumentId,
    DocumentStatus, ExecutionPolicy, SearchOptions, SearchServer,
};
use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct InputDoc {
    id: DocumentId,
    text: String,
    #[serde(default)]
    status: DocumentStatus,
    #[serde(default)]
    ratings: Vec<i32>,
}

#[derive(Parser)]
#[command(name = "runner")]
#[command(about = "Load documents into an in-memory TF-IDF engine and query it", long_about = None)]
struct Cli {
    /// Input path (JSON/JSONL file or a directory of them)
    #[arg(long)]
    input: String,
    /// Space separated stop words
    #[arg(long, default_value = "")]
    stop_words: String,
    /// JSON file with search options (max_results, relevance_epsilon, shard_count)
    #[arg(long)]
    config: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank documents against a query
    Search {
        #[arg(long)]
        query: String,
        /// Only documents with this status (active, irrelevant, banned, removed)
        #[arg(long, value_parser = parse_status, default_value = "active")]
        status: DocumentStatus,
        #[arg(long, default_value_t = false)]
        parallel: bool,
    },
    /// List the query words found in one document
    Match {
        #[arg(long)]
        query: String,
        #[arg(long)]
        id: DocumentId,
        #[arg(long, default_value_t = false)]
        parallel: bool,
    },
    /// Run every line of a file as a query
    Batch {
        #[arg(long)]
        queries: String,
        /// Print one flat list instead of one list per query
        #[arg(long, default_value_t = false)]
        joined: bool,
    },
    /// Remove documents whose word set repeats an earlier one
    Dedup,
    /// Remove one document and report what is left
    Remove {
        #[arg(long)]
        id: DocumentId,
        #[arg(long, default_value_t = false)]
        parallel: bool,
    },
    /// Print corpus statistics
    Stats,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    let options = load_options(cli.config.as_deref())?;
    let mut server = SearchServer::with_options(search_core::tokenizer::split_into_words(&cli.stop_words), options)?;
    let loaded = load_documents(Path::new(&cli.input), &mut server)?;
    tracing::info!(loaded, shard_count = options.shard_count, "corpus loaded");

    match cli.command {
        Commands::Search { query, status, parallel } => {
            log_duration!("search");
            let found = server.find_top_documents_with_status(policy(parallel), &query, status)?;
            for document in found {
                println!("{document}");
            }
        }
        Commands::Match { query, id, parallel } => {
            log_duration!("match");
            let (words, status) = server.match_document_with(policy(parallel), &query, id)?;
            println!("{{ document_id = {id}, status = {status:?}, words = {} }}", words.join(" "));
        }
        Commands::Batch { queries, joined } => {
            let queries = read_queries(Path::new(&queries))?;
            log_duration!("batch");
            if joined {
                for document in process_queries_joined(&server, &queries)? {
                    println!("{document}");
                }
            } else {
                for (query, found) in queries.iter().zip(process_queries(&server, &queries)?) {
                    println!("{query}:");
                    for document in found {
                        println!("  {document}");
                    }
                }
            }
        }
        Commands::Dedup => {
            let removed = remove_duplicates(&mut server);
            println!("removed {} duplicates, {} documents left", removed.len(), server.document_count());
        }
        Commands::Remove { id, parallel } => {
            server.remove_document_with(policy(parallel), id);
            let ids: Vec<String> = server.document_ids().map(|id| id.to_string()).collect();
            println!("{} documents left: {}", server.document_count(), ids.join(" "));
        }
        Commands::Stats => {
            println!("documents: {}", server.document_count());
            println!("stop words: {}", server.stop_words().count());
            for id in &server {
                println!("  {id}: {} distinct words", server.get_word_frequencies(id).len());
            }
        }
    }
    Ok(())
}

fn policy(parallel: bool) -> ExecutionPolicy {
    if parallel {
        ExecutionPolicy::Parallel
    } else {
        ExecutionPolicy::Sequential
    }
}

fn parse_status(raw: &str) -> Result<DocumentStatus, String> {
    serde_json::from_value(serde_json::Value::String(raw.to_lowercase()))
        .map_err(|_| format!("unknown status {raw:?}"))
}

fn load_options(config: Option<&str>) -> Result<SearchOptions> {
    let mut options = match config {
        Some(path) => {
            let json = fs::read_to_string(path).with_context(|| format!("reading config {path}"))?;
            SearchOptions::from_json_str(&json)?
        }
        None => SearchOptions::default(),
    };
    if let Ok(raw) = std::env::var("SEARCH_SHARD_COUNT") {
        let shard_count: usize = raw
            .parse()
            .with_context(|| format!("SEARCH_SHARD_COUNT={raw} is not a number"))?;
        options = options.with_shard_count(shard_count);
    }
    Ok(options)
}

fn read_queries(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path).with_context(|| format!("reading queries {}", path.display()))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect())
}

fn load_documents(input_path: &Path, server: &mut SearchServer) -> Result<usize> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input_path.is_dir() {
        for entry in WalkDir::new(input_path).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if matches!(ext, "json" | "jsonl") {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
    } else if input_path.is_file() {
        files.push(input_path.to_path_buf());
    } else {
        anyhow::bail!("input {} does not exist", input_path.display());
    }

    let mut loaded = 0;
    for file in files {
        loaded += if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            load_jsonl(&file, server)?
        } else {
            load_json(&file, server)?
        };
    }
    Ok(loaded)
}

fn load_jsonl(file: &Path, server: &mut SearchServer) -> Result<usize> {
    let reader = BufReader::new(File::open(file)?);
    let mut loaded = 0;
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let doc: InputDoc = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}", file.display(), line_no + 1))?;
        ingest_doc(doc, server)?;
        loaded += 1;
    }
    Ok(loaded)
}

fn load_json(file: &Path, server: &mut SearchServer) -> Result<usize> {
    let reader = BufReader::new(File::open(file)?);
    let json: serde_json::Value = serde_json::from_reader(reader)
        .with_context(|| format!("parsing {}", file.display()))?;
    let docs: Vec<InputDoc> = match json {
        serde_json::Value::Array(_) => serde_json::from_value(json)?,
        serde_json::Value::Object(_) => vec![serde_json::from_value(json)?],
        _ => Vec::new(),
    };
    let loaded = docs.len();
    for doc in docs {
        ingest_doc(doc, server)?;
    }
    Ok(loaded)
}

fn ingest_doc(doc: InputDoc, server: &mut SearchServer) -> Result<()> {
    server
        .add_document(doc.id, &doc.text, doc.status, &doc.ratings)
        .with_context(|| format!("adding document {}", doc.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn loads_json_and_jsonl_from_directory() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("a.jsonl"),
            "{\"id\": 1, \"text\": \"white cat\", \"ratings\": [4, 5]}\n\n{\"id\": 2, \"text\": \"black dog\", \"status\": \"banned\"}\n",
        )
        .unwrap();
        fs::write(dir.path().join("b.json"), r#"[{"id": 3, "text": "grey cat"}]"#).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut server = SearchServer::new(std::iter::empty::<&str>()).unwrap();
        let loaded = load_documents(dir.path(), &mut server).unwrap();

        assert_eq!(loaded, 3);
        assert_eq!(server.document_ids().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(server.document_status(2), Some(DocumentStatus::Banned));
        assert_eq!(server.document_rating(1), Some(4));
    }

    #[test]
    fn duplicate_ids_in_input_fail() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("dup.json");
        fs::write(&file, r#"[{"id": 1, "text": "a"}, {"id": 1, "text": "b"}]"#).unwrap();
        let mut server = SearchServer::new(std::iter::empty::<&str>()).unwrap();
        assert!(load_documents(&file, &mut server).is_err());
    }

    #[test]
    fn status_names_parse_case_insensitively() {
        assert_eq!(parse_status("Banned"), Ok(DocumentStatus::Banned));
        assert_eq!(parse_status("active"), Ok(DocumentStatus::Active));
        assert!(parse_status("archived").is_err());
    }

    #[test]
    fn queries_skip_blank_lines() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("queries.txt");
        fs::write(&file, "cat\n\n  dog -bird \n").unwrap();
        assert_eq!(read_queries(&file).unwrap(), vec!["cat", "dog -bird"]);
    }
}
