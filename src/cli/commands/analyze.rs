//! `analyze` command

use std::sync::Arc;

use anyhow::{Result, anyhow};
use futures::future::join_all;
use serde::Serialize;
use tunesense_analyzer::{AnalysisService, ResultSource};
use tunesense_cache::{LoadOutcome, SaveOutcome};
use tunesense_core::AnalysisResult;

use crate::cli::args::AnalyzeArgs;
use crate::config::TunesenseConfig;
use crate::runtime::{build_cache, build_collaborators, build_service, env_secrets, warm_up};

/// One line of `analyze` output
#[derive(Debug, Clone, Serialize)]
pub struct QueryReport {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<ResultSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Arc<AnalysisResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Run every query concurrently. Reports keep the order of `queries`.
pub async fn analyze_queries(service: &AnalysisService, queries: &[String]) -> Vec<QueryReport> {
    let runs = queries.iter().map(|query| async move {
        match service.analyze(query).await {
            Ok(outcome) => QueryReport {
                query: query.clone(),
                source: Some(outcome.source),
                result: Some(outcome.result),
                error: None,
            },
            Err(e) => {
                log::warn!("Analysis of {:?} failed: {}", query, e);
                QueryReport {
                    query: query.clone(),
                    source: None,
                    result: None,
                    error: Some(e.to_string()),
                }
            }
        }
    });

    join_all(runs).await
}

pub async fn run_analyze_command(args: AnalyzeArgs, config: &TunesenseConfig) -> Result<()> {
    let secrets = env_secrets();
    let cache = Arc::new(build_cache(config, secrets.clone()));

    let (loaded, purged) = warm_up(&cache, config);
    if let LoadOutcome::Loaded { entries } = loaded {
        log::info!(
            "Warm cache: {} entries loaded, {} expired",
            entries,
            purged.removed_count
        );
    }

    let collaborators = build_collaborators(config, secrets.as_ref())?;
    let service = build_service(config, cache.clone(), collaborators, !args.no_cache);

    let reports = tokio::select! {
        reports = analyze_queries(&service, &args.queries) => Some(reports),
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\nInterrupted by user");
            None
        }
    };

    if let SaveOutcome::Failed(e) = cache.save() {
        eprintln!("⚠️  Cache was not saved: {}", e);
    }

    let Some(reports) = reports else {
        std::process::exit(130);
    };

    let output = if args.pretty {
        serde_json::to_string_pretty(&reports)?
    } else {
        serde_json::to_string(&reports)?
    };
    println!("{}", output);

    let failed = reports.iter().filter(|r| !r.is_ok()).count();
    if failed > 0 {
        return Err(anyhow!("{} of {} queries failed", failed, reports.len()));
    }

    Ok(())
}
