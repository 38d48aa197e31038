//! Test doubles for the pipeline: an in-memory content store and
//! scripted search/chat clients.
//! Note: #[allow(dead_code)] because each test file compiles common/ separately.

#![allow(dead_code)]

use async_trait::async_trait;
use lantern_core::component::{RelatedItem, SortOrder};
use lantern_core::Tenant;
use lantern_db::models::{
    AtdwProductRow, Block, EntryState, ImportStats, PageRow, RegionCategory, TenantSchema,
};
use lantern_db::{ContentStore, DbResult};
use lantern_llm::{ChatClient, ChatRequest, ChunkStream, LlmError, LlmResult};
use lantern_retrieval::{RetrievalError, RetrievalResult, SearchClient, SearchRequest, SearchResponse};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use time::OffsetDateTime;

pub fn tenant() -> Tenant {
    Tenant::parse("testtenant").unwrap()
}

pub fn schema() -> TenantSchema {
    TenantSchema {
        fields: BTreeMap::from([
            ("includeCategories".to_string(), 11),
            ("includeRegions".to_string(), 12),
            ("global:pageBuilder".to_string(), 5),
            ("global:roam_products_locations".to_string(), 6),
        ]),
        sections: BTreeMap::from([
            ("products".to_string(), 3),
            ("pages".to_string(), 4),
            ("homepage".to_string(), 7),
        ]),
        matrix_content_table: "craft_matrixcontent_pagebuilder".to_string(),
        cached_at: OffsetDateTime::now_utc(),
    }
}

/// Build a block from relation handles and scalar field values.
pub fn block(
    block_type: &str,
    relations: &[(&str, &[(i64, &str)])],
    fields: &[(&str, serde_json::Value)],
) -> Block {
    Block {
        block_id: 900,
        block_type: block_type.to_string(),
        sort_order: 1,
        field_values: fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect(),
        relations: relations
            .iter()
            .map(|(handle, items)| {
                (
                    handle.to_string(),
                    items
                        .iter()
                        .map(|(id, title)| RelatedItem::new(*id, *title))
                        .collect(),
                )
            })
            .collect(),
    }
}

/// In-memory [`ContentStore`] with hand-seeded data.
#[derive(Default)]
pub struct FakeStore {
    pub schema: Option<TenantSchema>,
    pub rebuilds: AtomicUsize,
    /// uri -> page
    pub pages: HashMap<String, PageRow>,
    /// page id -> blocks
    pub blocks: HashMap<i64, Vec<Block>>,
    /// child element -> parent element, for nested-set checks
    pub parents: HashMap<i64, i64>,
    /// region category id -> postcodes
    pub region_postcode_field: HashMap<i64, Vec<String>>,
    /// postcode -> products matched via the search index
    pub postcode_products: HashMap<String, Vec<i64>>,
    /// relation target id -> related products
    pub relation_products: HashMap<i64, Vec<i64>>,
    /// product id -> title
    pub titles: HashMap<i64, String>,
    /// explicit event ordering for SortOrder::EventDate
    pub event_order: Vec<i64>,
    pub atdw_records: Vec<AtdwProductRow>,
    pub import_stats: ImportStats,
    pub regions: Vec<RegionCategory>,
    /// mapping-group slug -> mapping category
    pub mapping_categories: HashMap<String, RelatedItem>,
    /// source element -> related categories
    pub related: HashMap<i64, Vec<RelatedItem>>,
    pub entries: HashMap<i64, EntryState>,
}

impl FakeStore {
    pub fn with_schema() -> Self {
        Self {
            schema: Some(schema()),
            ..Default::default()
        }
    }

    fn is_ancestor(&self, ancestor: i64, of: i64) -> bool {
        let mut current = of;
        while let Some(&parent) = self.parents.get(&current) {
            if parent == ancestor {
                return true;
            }
            current = parent;
        }
        false
    }
}

#[async_trait]
impl ContentStore for FakeStore {
    async fn rebuild_schema(&self, tenant: &Tenant) -> DbResult<TenantSchema> {
        self.rebuilds.fetch_add(1, Ordering::SeqCst);
        match &self.schema {
            Some(schema) => Ok(TenantSchema {
                cached_at: OffsetDateTime::now_utc(),
                ..schema.clone()
            }),
            None => Err(lantern_db::DbError::SchemaIncomplete {
                tenant: tenant.to_string(),
                missing: "global field 'pageBuilder'".to_string(),
            }),
        }
    }

    async fn find_page(&self, _tenant: &Tenant, uri: &str) -> DbResult<Option<PageRow>> {
        let candidates = lantern_db::sql::page_uri_candidates(uri);
        for candidate in candidates {
            if let Some(page) = self.pages.get(&candidate) {
                return Ok(Some(page.clone()));
            }
        }
        Ok(None)
    }

    async fn page_blocks(
        &self,
        _tenant: &Tenant,
        _schema: &TenantSchema,
        page_id: i64,
        block_type: Option<&str>,
    ) -> DbResult<Vec<Block>> {
        let mut blocks = self.blocks.get(&page_id).cloned().unwrap_or_default();
        if let Some(handle) = block_type {
            // Handle comparison is case-insensitive, as under the MySQL
            // collation.
            blocks.retain(|b| b.block_type.eq_ignore_ascii_case(handle));
        }
        Ok(blocks)
    }

    async fn deepest_only(&self, _tenant: &Tenant, ids: &[i64]) -> DbResult<Vec<i64>> {
        Ok(ids
            .iter()
            .copied()
            .filter(|a| !ids.iter().any(|b| a != b && self.is_ancestor(*a, *b)))
            .collect())
    }

    async fn region_postcodes(&self, _tenant: &Tenant, region_ids: &[i64]) -> DbResult<Vec<String>> {
        let mut out = Vec::new();
        for id in region_ids {
            for pc in self.region_postcode_field.get(id).into_iter().flatten() {
                if !out.contains(pc) {
                    out.push(pc.clone());
                }
            }
        }
        Ok(out)
    }

    async fn products_by_postcodes(
        &self,
        _tenant: &Tenant,
        _schema: &TenantSchema,
        postcodes: &[String],
    ) -> DbResult<Vec<i64>> {
        let mut out = Vec::new();
        for pc in postcodes {
            for id in self.postcode_products.get(pc).into_iter().flatten() {
                if !out.contains(id) {
                    out.push(*id);
                }
            }
        }
        Ok(out)
    }

    async fn products_by_region_relation(
        &self,
        tenant: &Tenant,
        schema: &TenantSchema,
        region_ids: &[i64],
    ) -> DbResult<Vec<i64>> {
        self.products_related_to_any(tenant, schema, region_ids).await
    }

    async fn products_related_to_any(
        &self,
        _tenant: &Tenant,
        _schema: &TenantSchema,
        target_ids: &[i64],
    ) -> DbResult<Vec<i64>> {
        let mut out = Vec::new();
        for target in target_ids {
            for id in self.relation_products.get(target).into_iter().flatten() {
                if !out.contains(id) {
                    out.push(*id);
                }
            }
        }
        Ok(out)
    }

    async fn products_by_title(
        &self,
        _tenant: &Tenant,
        _schema: &TenantSchema,
        names: &[String],
    ) -> DbResult<Vec<RelatedItem>> {
        let mut out = Vec::new();
        for (id, title) in &self.titles {
            if names
                .iter()
                .any(|name| title.to_lowercase().contains(&name.to_lowercase()))
            {
                out.push(RelatedItem::new(*id, title.clone()));
            }
        }
        out.sort_by_key(|item| item.id);
        Ok(out)
    }

    async fn product_titles(
        &self,
        _tenant: &Tenant,
        ids: &[i64],
        order: SortOrder,
    ) -> DbResult<Vec<RelatedItem>> {
        let item = |id: i64| {
            self.titles
                .get(&id)
                .map(|title| RelatedItem::new(id, title.clone()))
        };
        match order {
            SortOrder::EventDate => Ok(self
                .event_order
                .iter()
                .copied()
                .filter(|id| ids.contains(id))
                .filter_map(item)
                .collect()),
            _ => Ok(ids.iter().copied().filter_map(item).collect()),
        }
    }

    async fn find_atdw_product_by_id(
        &self,
        _tenant: &Tenant,
        product_id: &str,
    ) -> DbResult<Option<AtdwProductRow>> {
        Ok(self
            .atdw_records
            .iter()
            .find(|r| r.product_id == product_id)
            .cloned())
    }

    async fn find_atdw_product_by_name(
        &self,
        _tenant: &Tenant,
        name: &str,
    ) -> DbResult<Option<AtdwProductRow>> {
        let needle = name.to_lowercase();
        Ok(self
            .atdw_records
            .iter()
            .find(|r| r.product_name.to_lowercase().contains(&needle))
            .cloned())
    }

    async fn atdw_import_stats(&self, _tenant: &Tenant) -> DbResult<ImportStats> {
        Ok(self.import_stats.clone())
    }

    async fn region_categories(&self, _tenant: &Tenant) -> DbResult<Vec<RegionCategory>> {
        Ok(self.regions.clone())
    }

    async fn category_by_slug(
        &self,
        _tenant: &Tenant,
        _group_handle: &str,
        slug: &str,
    ) -> DbResult<Option<RelatedItem>> {
        Ok(self.mapping_categories.get(slug).cloned())
    }

    async fn related_categories(
        &self,
        _tenant: &Tenant,
        source_id: i64,
    ) -> DbResult<Vec<RelatedItem>> {
        Ok(self.related.get(&source_id).cloned().unwrap_or_default())
    }

    async fn entry_state(&self, _tenant: &Tenant, entry_id: i64) -> DbResult<Option<EntryState>> {
        Ok(self.entries.get(&entry_id).cloned())
    }
}

/// Scripted chat client. The first completion is the intent reply, the
/// second the explanation; `fail_all` makes every call error.
pub struct FakeChat {
    pub intent_reply: Option<String>,
    pub explanation: String,
    pub stream_chunks: Vec<String>,
    pub fail_all: bool,
    calls: AtomicUsize,
    pub requests: Mutex<Vec<ChatRequest>>,
}

impl Default for FakeChat {
    fn default() -> Self {
        Self {
            intent_reply: None,
            explanation: "Here is why.".to_string(),
            stream_chunks: vec!["Here ".to_string(), "is why.".to_string()],
            fail_all: false,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }
}

impl FakeChat {
    pub fn with_intent(reply: &str) -> Self {
        Self {
            intent_reply: Some(reply.to_string()),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Default::default()
        }
    }

    pub fn completions(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatClient for FakeChat {
    async fn complete(&self, request: &ChatRequest) -> LlmResult<String> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail_all {
            return Err(LlmError::Api {
                status: 500,
                body: "scripted failure".to_string(),
            });
        }
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call == 0 {
            if let Some(reply) = &self.intent_reply {
                return Ok(reply.clone());
            }
        }
        Ok(self.explanation.clone())
    }

    async fn stream(&self, request: &ChatRequest) -> LlmResult<ChunkStream> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail_all {
            return Err(LlmError::Api {
                status: 500,
                body: "scripted failure".to_string(),
            });
        }
        let chunks = self.stream_chunks.clone();
        Ok(Box::pin(futures::stream::iter(
            chunks.into_iter().map(Ok).collect::<Vec<_>>(),
        )))
    }
}

/// Scripted search client.
pub struct FakeSearch {
    pub response: Option<SearchResponse>,
    pub queries: Mutex<Vec<SearchRequest>>,
}

impl FakeSearch {
    pub fn empty() -> Self {
        Self {
            response: Some(SearchResponse::default()),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            response: None,
            queries: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl SearchClient for FakeSearch {
    async fn search(&self, request: &SearchRequest) -> RetrievalResult<SearchResponse> {
        self.queries.lock().unwrap().push(request.clone());
        match &self.response {
            Some(response) => Ok(response.clone()),
            None => Err(RetrievalError::Service {
                status: 500,
                body: "scripted outage".to_string(),
            }),
        }
    }
}
