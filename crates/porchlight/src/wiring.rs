// SPDX-FileCopyrightText: 2026 Porchlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared component wiring for the serve and shell commands.
//!
//! Every collaborator is an explicitly-scoped instance handed into the
//! pipeline, so either entry point (or a test) can substitute its own.

use std::sync::Arc;

use porchlight_agent::ExecutionPipeline;
use porchlight_anthropic::AnthropicProvider;
use porchlight_config::PorchlightConfig;
use porchlight_core::{InteractionSink, PorchlightError, SchemaCatalog};
use porchlight_llm::LlmGateway;
use porchlight_rag::UnstructuredRetriever;
use porchlight_session::SessionCache;
use porchlight_sql::StructuredRetriever;
use porchlight_storage::{
    Fts5DocumentIndex, SqliteExecutor, SqliteInteractionLog, SqliteSchemaCatalog,
};
use tracing::info;

/// The wired application components shared by serve and shell.
pub struct AppComponents {
    pub pipeline: Arc<ExecutionPipeline>,
    pub executor: Arc<SqliteExecutor>,
    pub interaction_log: Arc<SqliteInteractionLog>,
}

/// Builds the full component stack over the configured database.
///
/// `pipeline_logs_turns` controls whether the pipeline itself records
/// turns fire-and-forget; the HTTP surface logs synchronously instead
/// so it can hand the log id back to the client.
pub async fn build(
    config: &PorchlightConfig,
    pipeline_logs_turns: bool,
) -> Result<AppComponents, PorchlightError> {
    let errors = porchlight_config::validate(config);
    if !errors.is_empty() {
        return Err(PorchlightError::Config(errors.join("; ")));
    }

    let conn = porchlight_storage::open_database(&config.storage.database_path).await?;

    let catalog = Arc::new(SqliteSchemaCatalog::new(conn.clone()));
    catalog.ensure_schema().await?;

    let doc_index = Arc::new(Fts5DocumentIndex::new(conn.clone()));
    doc_index.ensure_schema().await?;

    let interaction_log = Arc::new(SqliteInteractionLog::new(conn.clone()));
    interaction_log.ensure_schema().await?;

    let executor = Arc::new(SqliteExecutor::new(conn));

    let provider = Arc::new(AnthropicProvider::new(config)?);
    let gateway = Arc::new(LlmGateway::new(provider, config));

    let structured = StructuredRetriever::new(
        gateway.clone(),
        catalog.clone() as Arc<dyn SchemaCatalog>,
        executor.clone(),
        config,
    );
    let unstructured = UnstructuredRetriever::new(gateway.clone(), doc_index, config);

    let cache = Arc::new(SessionCache::new(&config.cache));

    let sink = if pipeline_logs_turns {
        Some(interaction_log.clone() as Arc<dyn InteractionSink>)
    } else {
        None
    };

    let pipeline = Arc::new(ExecutionPipeline::new(
        gateway,
        structured,
        unstructured,
        cache,
        catalog,
        sink,
        config,
    ));

    info!(
        database = config.storage.database_path.as_str(),
        model = config.llm.model_id.as_str(),
        "porchlight components wired"
    );

    Ok(AppComponents {
        pipeline,
        executor,
        interaction_log,
    })
}
