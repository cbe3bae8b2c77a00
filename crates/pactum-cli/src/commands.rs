//! Command implementations: wire a pipeline over in-memory stores and run
//! it against a local contract file.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use pactum_ai::{ChatGenerator, StaticClauseLibrary, TextGenerator};
use pactum_core::{ContractRecord, NegotiationSession, RiskReport, UserContext, UserPriorities};
use pactum_pipeline::{Pipeline, ResponseOutcome};
use pactum_store::{ContractStore, MemoryContractStore, MemorySessionStore};

use crate::offline::OfflineGenerator;

const LOCAL_USER: &str = "local";

/// HTTP generator when a service URL is configured, offline generator
/// otherwise.
pub fn build_generator(
    generator_url: Option<&str>,
    model: &str,
    api_key: Option<&str>,
) -> Arc<dyn TextGenerator> {
    match generator_url {
        Some(url) => {
            let mut client = ChatGenerator::new(url, model);
            if let Some(key) = api_key {
                client = client.with_api_key(key);
            }
            Arc::new(client)
        }
        None => {
            tracing::info!("no generation service configured, using offline generator");
            Arc::new(OfflineGenerator)
        }
    }
}

async fn load_pipeline(
    generator: Arc<dyn TextGenerator>,
    file: &Path,
    ctx: UserContext,
) -> anyhow::Result<(Pipeline, String)> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("reading contract file {}", file.display()))?;

    let contract_id = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "contract".into());

    let contracts = Arc::new(MemoryContractStore::new());
    let mut record = ContractRecord::new(contract_id.clone(), LOCAL_USER);
    record.full_text = Some(text);
    record.user_context = ctx;
    contracts.put(record).await?;

    let pipeline = Pipeline::new(generator, contracts, Arc::new(MemorySessionStore::new()))
        .with_retriever(Arc::new(StaticClauseLibrary));
    Ok((pipeline, contract_id))
}

/// Analyze a contract file and return its risk report.
pub async fn analyze_file(
    generator: Arc<dyn TextGenerator>,
    file: &Path,
    ctx: UserContext,
) -> anyhow::Result<RiskReport> {
    let (pipeline, contract_id) = load_pipeline(generator, file, ctx).await?;
    let report = pipeline.analyze_contract(&contract_id).await?;
    Ok(report)
}

/// Analyze a contract file and plan a negotiation for it.
pub async fn plan_file(
    generator: Arc<dyn TextGenerator>,
    file: &Path,
    ctx: UserContext,
    priorities: UserPriorities,
) -> anyhow::Result<NegotiationSession> {
    let (pipeline, contract_id) = load_pipeline(generator, file, ctx).await?;
    pipeline.analyze_contract(&contract_id).await?;
    let session = pipeline
        .plan_negotiation(&contract_id, &priorities, &[])
        .await?;
    Ok(session)
}

/// Full loop: analyze, plan, then process a counterparty response.
pub async fn respond_file(
    generator: Arc<dyn TextGenerator>,
    file: &Path,
    ctx: UserContext,
    response_text: &str,
) -> anyhow::Result<ResponseOutcome> {
    let (pipeline, contract_id) = load_pipeline(generator, file, ctx).await?;
    pipeline.analyze_contract(&contract_id).await?;
    let session = pipeline
        .plan_negotiation(&contract_id, &UserPriorities::default(), &[])
        .await?;
    let outcome = pipeline
        .process_counterparty_response(&session.id, response_text)
        .await?;
    Ok(outcome)
}
