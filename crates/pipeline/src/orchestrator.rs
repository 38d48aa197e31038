//! Request orchestration.
//!
//! One request flows: validate, resolve tenant, parse intent, then fork
//! code retrieval against the database work, join, and generate. The
//! data snapshot and trace are deterministic; only the prose is not.
//! Failures follow the taxonomy: retrieval and generation degrade
//! silently, structural and database errors surface.

use crate::atdw::collect_import;
use crate::error::{PipelineError, PipelineResult};
use crate::filter_chain::{run_filter_chain, ChainOutcome};
use crate::generate::{generate, generate_stream, targets_for_prompt, GenerationContext};
use crate::inspector::{describe_available_blocks, describe_missing_page, inspect_block};
use crate::intent::parse_intent;
use crate::prompts::{render_component_config, render_import_config, PromptInputs};
use lantern_cache::{keys, KvStore};
use lantern_core::component::{ComponentConfig, RelatedItem};
use lantern_core::tenant::parse_origin_value;
use lantern_core::trace::TraceStep;
use lantern_core::{
    sanitize_history, AppConfig, ChatTurn, Domain, ParsedIntent, Tenant, TRACE_TTL,
};
use lantern_db::{resolve_schema, ContentStore};
use lantern_llm::{ChatClient, ChunkStream};
use lantern_retrieval::{retrieve_context, SearchClient};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// An explanation request as posted by the dashboard widget.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainRequest {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub tenant: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub page_uri: Option<String>,
    #[serde(default)]
    pub component_index: Option<usize>,
    #[serde(default)]
    pub history: Option<serde_json::Value>,
}

/// Timing breakdown surfaced in the debug payload.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Timing {
    pub parse_ms: u64,
    pub collect_ms: u64,
    pub retrieval_ms: u64,
    pub generation_ms: u64,
    pub total_ms: u64,
}

/// Debug payload: the parsed intent plus timings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugInfo {
    pub intent: ParsedIntent,
    pub timing: Timing,
    pub request_id: String,
    pub trace_cache_hit: bool,
}

/// A buffered explanation response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainResponse {
    pub explanation: String,
    pub trace: Vec<TraceStep>,
    pub config: serde_json::Value,
    pub debug: DebugInfo,
}

/// The first frame of a streaming response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamMetadata {
    pub trace: Vec<TraceStep>,
    pub config: serde_json::Value,
    pub debug: DebugInfo,
}

/// Cached value under `trace:{tenant}:{pageUri}:{componentType}:{index}`.
#[derive(Debug, Serialize, Deserialize)]
struct CachedSnapshot {
    config: ComponentConfig,
    trace: Vec<TraceStep>,
}

/// One collected data snapshot, whatever the domain.
enum Snapshot {
    Page(ChainOutcome),
    Import(crate::atdw::ImportOutcome),
    /// General questions and unresolvable pages carry only descriptive
    /// steps; the generator asks a clarifying question.
    Bare(Vec<TraceStep>),
}

impl Snapshot {
    fn trace(&self) -> &[TraceStep] {
        match self {
            Self::Page(outcome) => &outcome.trace,
            Self::Import(outcome) => &outcome.trace,
            Self::Bare(trace) => trace,
        }
    }

    fn into_trace(self) -> Vec<TraceStep> {
        match self {
            Self::Page(outcome) => outcome.trace,
            Self::Import(outcome) => outcome.trace,
            Self::Bare(trace) => trace,
        }
    }

    fn config_value(&self) -> serde_json::Value {
        match self {
            Self::Page(outcome) => serde_json::to_value(&outcome.config).unwrap_or_default(),
            Self::Import(outcome) => serde_json::to_value(&outcome.config).unwrap_or_default(),
            Self::Bare(_) => serde_json::Value::Null,
        }
    }

    fn config_text(&self) -> String {
        match self {
            Self::Page(outcome) => render_component_config(&outcome.config),
            Self::Import(outcome) => render_import_config(&outcome.config),
            Self::Bare(_) => String::new(),
        }
    }
}

/// The explanation pipeline, shared across requests.
pub struct Orchestrator {
    store: Arc<dyn ContentStore>,
    kv: Arc<dyn KvStore>,
    search: Arc<dyn SearchClient>,
    chat: Arc<dyn ChatClient>,
    config: Arc<AppConfig>,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn ContentStore>,
        kv: Arc<dyn KvStore>,
        search: Arc<dyn SearchClient>,
        chat: Arc<dyn ChatClient>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            store,
            kv,
            search,
            chat,
            config,
        }
    }

    /// Map a request onto a tenant: explicit field first, then the
    /// hostname mapping, then the configured default. The result always
    /// passes the tenant gate; no SQL is composed before this succeeds.
    pub async fn resolve_tenant(
        &self,
        explicit: Option<&str>,
        hostname: Option<&str>,
    ) -> PipelineResult<Tenant> {
        if let Some(raw) = explicit {
            return Ok(Tenant::parse(raw)?);
        }
        if let Some(hostname) = hostname {
            if let Some(value) = self.kv.get(&keys::origin(hostname)).await? {
                return Ok(parse_origin_value(&value)?);
            }
        }
        Ok(Tenant::parse(&self.config.tenancy.default_tenant)?)
    }

    /// Validate, collect, and retrieve; everything but generation.
    async fn prepare(&self, request: &ExplainRequest) -> PipelineResult<Prepared> {
        let started = Instant::now();
        if request.question.trim().is_empty() {
            return Err(PipelineError::BadRequest(
                "question must be a non-empty string".to_string(),
            ));
        }
        let history = sanitize_history(request.history.as_ref());
        let tenant = self
            .resolve_tenant(request.tenant.as_deref(), request.hostname.as_deref())
            .await?;
        let request_id = Uuid::new_v4().to_string();

        let parse_started = Instant::now();
        let intent = parse_intent(
            self.chat.as_ref(),
            &self.config.llm,
            &request.question,
            request.page_uri.as_deref(),
        )
        .await;
        let parse_ms = elapsed_ms(parse_started);
        tracing::info!(
            request_id = %request_id,
            tenant = %tenant,
            domain = intent.domain.as_str(),
            "parsed intent"
        );

        // Code retrieval runs concurrently with the database work.
        let retrieval_fut = async {
            let retrieval_started = Instant::now();
            let context = retrieve_context(
                self.search.as_ref(),
                &self.config.search,
                &intent,
                Some(&tenant),
            )
            .await;
            (context, elapsed_ms(retrieval_started))
        };
        let collect_fut = async {
            let collect_started = Instant::now();
            let collected = self.collect(&tenant, &intent, request).await;
            (collected, elapsed_ms(collect_started))
        };
        let ((context, retrieval_ms), (collected, collect_ms)) =
            tokio::join!(retrieval_fut, collect_fut);
        let (snapshot, targets, cache_hit) = collected?;
        let prompt_targets = targets_for_prompt(&intent.product_names, &targets);

        Ok(Prepared {
            intent,
            snapshot,
            prompt_targets,
            context,
            history,
            request_id,
            cache_hit,
            parse_ms,
            collect_ms,
            retrieval_ms,
            started,
        })
    }

    /// Buffered explanation.
    pub async fn explain(&self, request: &ExplainRequest) -> PipelineResult<ExplainResponse> {
        let prepared = self.prepare(request).await?;
        let ctx = prepared.generation_context(&self.config);

        let generation_started = Instant::now();
        let explanation = generate(self.chat.as_ref(), &ctx).await;
        let generation_ms = elapsed_ms(generation_started);

        let debug = prepared.debug(generation_ms);
        Ok(ExplainResponse {
            explanation,
            config: prepared.snapshot.config_value(),
            trace: prepared.snapshot.into_trace(),
            debug,
        })
    }

    /// Streaming explanation: the metadata frame plus the content stream.
    pub async fn explain_stream(
        &self,
        request: &ExplainRequest,
    ) -> PipelineResult<(StreamMetadata, ChunkStream)> {
        let prepared = self.prepare(request).await?;
        let ctx = prepared.generation_context(&self.config);
        let stream = generate_stream(self.chat.as_ref(), &ctx).await;

        let debug = prepared.debug(0);
        let metadata = StreamMetadata {
            config: prepared.snapshot.config_value(),
            trace: prepared.snapshot.into_trace(),
            debug,
        };
        Ok((metadata, stream))
    }

    /// Dispatch to the matching collector and resolve target ids.
    async fn collect(
        &self,
        tenant: &Tenant,
        intent: &ParsedIntent,
        request: &ExplainRequest,
    ) -> PipelineResult<(Snapshot, Vec<RelatedItem>, bool)> {
        match intent.domain {
            Domain::AtdwImport => {
                let outcome = collect_import(self.store.as_ref(), tenant, intent).await?;
                Ok((Snapshot::Import(outcome), Vec::new(), false))
            }
            Domain::PageComponent => {
                let Some(page_uri) = intent
                    .page_uri
                    .clone()
                    .or_else(|| request.page_uri.clone())
                else {
                    return Ok((Snapshot::Bare(Vec::new()), Vec::new(), false));
                };
                self.collect_page(tenant, intent, request, &page_uri).await
            }
            Domain::General => Ok((Snapshot::Bare(Vec::new()), Vec::new(), false)),
        }
    }

    async fn collect_page(
        &self,
        tenant: &Tenant,
        intent: &ParsedIntent,
        request: &ExplainRequest,
        page_uri: &str,
    ) -> PipelineResult<(Snapshot, Vec<RelatedItem>, bool)> {
        let schema = resolve_schema(self.kv.as_ref(), self.store.as_ref(), tenant).await?;
        let block_index = request.component_index.unwrap_or(0);
        let cache_key = keys::trace(
            tenant.as_str(),
            page_uri,
            &intent.component_type,
            block_index,
        );

        // The cached trace and the target resolution are independent.
        let (cached, targets) = tokio::join!(self.kv.get(&cache_key), async {
            if intent.product_names.is_empty() {
                Ok(Vec::new())
            } else {
                self.store
                    .products_by_title(tenant, &schema, &intent.product_names)
                    .await
            }
        });
        let targets = targets?;
        let target_ids: Vec<i64> = targets.iter().map(|item| item.id).collect();

        if let Some(raw) = cached? {
            if let Ok(snapshot) = serde_json::from_str::<CachedSnapshot>(&raw) {
                tracing::debug!(key = %cache_key, "trace cache hit");
                return Ok((
                    Snapshot::Page(ChainOutcome {
                        config: snapshot.config,
                        trace: snapshot.trace,
                    }),
                    targets,
                    true,
                ));
            }
        }

        let Some(page) = self.store.find_page(tenant, page_uri).await? else {
            return Ok((
                Snapshot::Bare(vec![describe_missing_page(page_uri)]),
                targets,
                false,
            ));
        };

        let mut blocks = self
            .store
            .page_blocks(tenant, &schema, page.id, Some(&intent.component_type))
            .await?;
        if blocks.is_empty() {
            let all_blocks = self
                .store
                .page_blocks(tenant, &schema, page.id, None)
                .await?;
            return Ok((
                Snapshot::Bare(vec![describe_available_blocks(&page.title, &all_blocks)]),
                targets,
                false,
            ));
        }
        let block = if block_index < blocks.len() {
            blocks.remove(block_index)
        } else {
            blocks.remove(0)
        };

        let outcome = if block.block_type.eq_ignore_ascii_case("products") {
            run_filter_chain(self.store.as_ref(), tenant, &schema, &block, &target_ids).await?
        } else {
            inspect_block(&block)
        };

        let cached = CachedSnapshot {
            config: outcome.config.clone(),
            trace: outcome.trace.clone(),
        };
        if let Ok(serialized) = serde_json::to_string(&cached) {
            self.kv.put(&cache_key, serialized, Some(TRACE_TTL)).await?;
        }

        Ok((Snapshot::Page(outcome), targets, false))
    }
}

/// Everything collected ahead of generation.
struct Prepared {
    intent: ParsedIntent,
    snapshot: Snapshot,
    prompt_targets: Vec<RelatedItem>,
    context: String,
    history: Vec<ChatTurn>,
    request_id: String,
    cache_hit: bool,
    parse_ms: u64,
    collect_ms: u64,
    retrieval_ms: u64,
    started: Instant,
}

impl Prepared {
    fn generation_context<'a>(&'a self, config: &'a AppConfig) -> GenerationContext<'a> {
        GenerationContext {
            llm: &config.llm,
            domain: self.intent.domain,
            inputs: PromptInputs {
                intent: &self.intent,
                config_text: self.snapshot.config_text(),
                trace: self.snapshot.trace(),
                code_context: &self.context,
                targets: &self.prompt_targets,
            },
            history: &self.history,
        }
    }

    fn debug(&self, generation_ms: u64) -> DebugInfo {
        DebugInfo {
            intent: self.intent.clone(),
            timing: Timing {
                parse_ms: self.parse_ms,
                collect_ms: self.collect_ms,
                retrieval_ms: self.retrieval_ms,
                generation_ms,
                total_ms: elapsed_ms(self.started),
            },
            request_id: self.request_id.clone(),
            trace_cache_hit: self.cache_hit,
        }
    }
}

fn elapsed_ms(since: Instant) -> u64 {
    u64::try_from(since.elapsed().as_millis()).unwrap_or(u64::MAX)
}
