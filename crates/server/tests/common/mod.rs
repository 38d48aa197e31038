//! Server test utilities: an in-process router over in-memory fakes.
//! Note: #[allow(dead_code)] because each test file compiles common/ separately.

#![allow(dead_code)]

use async_trait::async_trait;
use lantern_cache::{KvStore, MemoryKvStore};
use lantern_core::component::{RelatedItem, SortOrder};
use lantern_core::{AppConfig, Tenant};
use lantern_db::models::{
    AtdwProductRow, Block, EntryState, ImportStats, PageRow, RegionCategory, TenantSchema,
};
use lantern_db::{ContentStore, DbResult};
use lantern_llm::{ChatClient, ChatRequest, ChunkStream, LlmResult};
use lantern_retrieval::{RetrievalResult, SearchClient, SearchRequest, SearchResponse};
use lantern_server::{create_router, AppState};
use std::collections::BTreeMap;
use std::sync::Arc;
use time::OffsetDateTime;

/// A test server wrapper with all dependencies.
pub struct TestServer {
    pub router: axum::Router,
    pub kv: Arc<MemoryKvStore>,
}

impl TestServer {
    /// A server whose store knows one page (`/stay`) with one products
    /// block, and whose model replies with a fixed intent and a fixed
    /// explanation.
    pub async fn new() -> Self {
        let kv = Arc::new(MemoryKvStore::new());
        let state = AppState::new(
            AppConfig::for_testing(),
            Arc::new(SeededStore),
            kv.clone(),
            Arc::new(EmptySearch),
            Arc::new(ScriptedChat),
        );
        Self {
            router: create_router(state),
            kv,
        }
    }
}

/// Fixed tenant schema used across server tests.
pub fn schema() -> TenantSchema {
    TenantSchema {
        fields: BTreeMap::from([("global:pageBuilder".to_string(), 5)]),
        sections: BTreeMap::from([("products".to_string(), 3)]),
        matrix_content_table: "craft_matrixcontent_pagebuilder".to_string(),
        cached_at: OffsetDateTime::now_utc(),
    }
}

/// A store seeded with just enough content for the HTTP surface tests.
struct SeededStore;

#[async_trait]
impl ContentStore for SeededStore {
    async fn rebuild_schema(&self, _tenant: &Tenant) -> DbResult<TenantSchema> {
        Ok(schema())
    }

    async fn find_page(&self, _tenant: &Tenant, uri: &str) -> DbResult<Option<PageRow>> {
        let found = lantern_db::sql::page_uri_candidates(uri)
            .iter()
            .any(|c| c == "/stay");
        Ok(found.then(|| PageRow {
            id: 100,
            title: "Stay".to_string(),
            uri: Some("/stay".to_string()),
        }))
    }

    async fn page_blocks(
        &self,
        _tenant: &Tenant,
        _schema: &TenantSchema,
        page_id: i64,
        block_type: Option<&str>,
    ) -> DbResult<Vec<Block>> {
        if page_id != 100 || block_type.is_some_and(|t| !t.eq_ignore_ascii_case("products")) {
            return Ok(Vec::new());
        }
        Ok(vec![Block {
            block_id: 900,
            block_type: "products".to_string(),
            sort_order: 1,
            field_values: BTreeMap::from([
                ("limit".to_string(), serde_json::json!(6)),
                ("order".to_string(), serde_json::json!("alphabetically")),
            ]),
            relations: BTreeMap::from([(
                "includeProducts".to_string(),
                vec![
                    RelatedItem::new(2, "Lake Boga Motel"),
                    RelatedItem::new(1, "Big River Cruises"),
                ],
            )]),
        }])
    }

    async fn deepest_only(&self, _tenant: &Tenant, ids: &[i64]) -> DbResult<Vec<i64>> {
        Ok(ids.to_vec())
    }

    async fn region_postcodes(&self, _tenant: &Tenant, _region_ids: &[i64]) -> DbResult<Vec<String>> {
        Ok(Vec::new())
    }

    async fn products_by_postcodes(
        &self,
        _tenant: &Tenant,
        _schema: &TenantSchema,
        _postcodes: &[String],
    ) -> DbResult<Vec<i64>> {
        Ok(Vec::new())
    }

    async fn products_by_region_relation(
        &self,
        _tenant: &Tenant,
        _schema: &TenantSchema,
        _region_ids: &[i64],
    ) -> DbResult<Vec<i64>> {
        Ok(Vec::new())
    }

    async fn products_related_to_any(
        &self,
        _tenant: &Tenant,
        _schema: &TenantSchema,
        _target_ids: &[i64],
    ) -> DbResult<Vec<i64>> {
        Ok(Vec::new())
    }

    async fn products_by_title(
        &self,
        _tenant: &Tenant,
        _schema: &TenantSchema,
        names: &[String],
    ) -> DbResult<Vec<RelatedItem>> {
        Ok(names
            .iter()
            .filter(|name| name.eq_ignore_ascii_case("lake boga motel"))
            .map(|_| RelatedItem::new(2, "Lake Boga Motel"))
            .collect())
    }

    async fn product_titles(
        &self,
        _tenant: &Tenant,
        ids: &[i64],
        _order: SortOrder,
    ) -> DbResult<Vec<RelatedItem>> {
        Ok(ids
            .iter()
            .filter_map(|id| match id {
                1 => Some(RelatedItem::new(1, "Big River Cruises")),
                2 => Some(RelatedItem::new(2, "Lake Boga Motel")),
                _ => None,
            })
            .collect())
    }

    async fn find_atdw_product_by_id(
        &self,
        _tenant: &Tenant,
        _product_id: &str,
    ) -> DbResult<Option<AtdwProductRow>> {
        Ok(None)
    }

    async fn find_atdw_product_by_name(
        &self,
        _tenant: &Tenant,
        _name: &str,
    ) -> DbResult<Option<AtdwProductRow>> {
        Ok(None)
    }

    async fn atdw_import_stats(&self, _tenant: &Tenant) -> DbResult<ImportStats> {
        Ok(ImportStats {
            total: 42,
            imported: 40,
            last_updated: None,
        })
    }

    async fn region_categories(&self, _tenant: &Tenant) -> DbResult<Vec<RegionCategory>> {
        Ok(Vec::new())
    }

    async fn category_by_slug(
        &self,
        _tenant: &Tenant,
        _group_handle: &str,
        _slug: &str,
    ) -> DbResult<Option<RelatedItem>> {
        Ok(None)
    }

    async fn related_categories(
        &self,
        _tenant: &Tenant,
        _source_id: i64,
    ) -> DbResult<Vec<RelatedItem>> {
        Ok(Vec::new())
    }

    async fn entry_state(&self, _tenant: &Tenant, _entry_id: i64) -> DbResult<Option<EntryState>> {
        Ok(None)
    }
}

/// Chat client whose first completion is a page-component intent and
/// whose later calls return a fixed explanation.
struct ScriptedChat;

#[async_trait]
impl ChatClient for ScriptedChat {
    async fn complete(&self, request: &ChatRequest) -> LlmResult<String> {
        // The intent call is recognisable by its small token cap.
        if request.max_tokens <= 256 {
            return Ok(serde_json::json!({
                "domain": "page_component",
                "pageUri": "/stay",
                "componentType": "products",
                "productNames": ["Lake Boga Motel"],
                "questionType": "why_included"
            })
            .to_string());
        }
        Ok("This component hand-picks two places to stay.".to_string())
    }

    async fn stream(&self, _request: &ChatRequest) -> LlmResult<ChunkStream> {
        Ok(Box::pin(futures::stream::iter(vec![
            Ok("This component ".to_string()),
            Ok("hand-picks two places to stay.".to_string()),
        ])))
    }
}

/// Search client that finds nothing.
struct EmptySearch;

#[async_trait]
impl SearchClient for EmptySearch {
    async fn search(&self, _request: &SearchRequest) -> RetrievalResult<SearchResponse> {
        Ok(SearchResponse::default())
    }
}
