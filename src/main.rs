use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing_subscriber::{fmt, EnvFilter};

use hive_signal_engine::config::EngineConfig;
use hive_signal_engine::engine::DecisionEngine;
use hive_signal_engine::models::{CandidateSignal, ExperienceRecord};
use hive_signal_engine::store::JsonFileStore;

const USAGE: &str = "usage: hive-signal-engine <evaluate|confidence|record> <file.json> | stats";

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = EngineConfig::from_env();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .init();

    let store_path =
        std::env::var("EXPERIENCE_FILE").unwrap_or_else(|_| "data/experience.jsonl".to_string());
    let store = Arc::new(JsonFileStore::new(&store_path)?);

    let engine = DecisionEngine::new(cfg, store);
    engine.load().await;

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("");

    match command {
        "evaluate" => {
            let candidate: CandidateSignal = read_json(&args, 2)?;
            let verdict = engine.should_take_signal(&candidate).await?;
            println!("{}", serde_json::to_string_pretty(&verdict)?);
        }
        "confidence" => {
            let candidate: CandidateSignal = read_json(&args, 2)?;
            let report = engine.get_confidence(&candidate).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        "record" => {
            let record: ExperienceRecord = read_json(&args, 2)?;
            let seq = engine.record_outcome(record).await?;
            println!("{}", serde_json::json!({ "status": "ok", "seq": seq }));
        }
        "stats" => {
            let stats = engine.pool_stats().await;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        _ => bail!(USAGE),
    }

    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(args: &[String], idx: usize) -> Result<T> {
    let path = args.get(idx).with_context(|| USAGE.to_string())?;
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {path}"))
}
