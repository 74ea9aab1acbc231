use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A single URL hit within a [`CompanyGroup`]. `content_preview` is the
/// first 500 characters of the document's raw content; the enterprise
/// schema (`spec.md` §3) never stores raw content, so it is always
/// `None` in practice and kept as an `Option` for forward compatibility
/// with a future stored-content field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct UrlHit {
    pub id: String,
    pub url: String,
    pub url_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_preview: Option<String>,
    pub matched_terms: Vec<String>,
    pub score: f32,
}

/// Hits grouped under their owning company. `urls` preserves the original
/// hit order; the company-level fields are taken from the first hit
/// encountered for this `jcn`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CompanyGroup {
    pub jcn: String,
    pub company_name_kj: String,
    pub cust_status2: String,
    pub company_address_all: String,
    pub prefecture: String,
    pub city: String,
    pub large_class_name: String,
    pub middle_class_name: String,
    pub curr_setlmnt_taking_amt: u64,
    pub employee_all_num: u64,
    pub district_finalized_cd: String,
    pub branch_name_cd: String,
    pub main_domain_url: String,
    pub urls: Vec<UrlHit>,
}

/// Top-level envelope returned from `search::SearchService::search`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SearchResponse {
    pub grouped_results: Vec<CompanyGroup>,
    pub total_found: usize,
    pub total_companies: usize,
    pub search_time: f64,
    pub processed_query: String,
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefecture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cust_status: Option<String>,
}

impl SearchResponse {
    /// The zero-result envelope returned for an empty/whitespace query.
    pub fn empty(query: String) -> Self {
        Self {
            query,
            ..Default::default()
        }
    }
}

/// `search::SearchService::stats()` response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Stats {
    pub total_documents: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_size: usize,
    pub cache_max_size: usize,
    pub engine_type: String,
}

/// One configured prefecture shard, as advertised to callers of
/// `router::PrefectureRouter::stats`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvailablePrefecture {
    pub value: String,
    pub name: String,
    pub index_dir: String,
}

/// A single shard's display name plus its own [`Stats`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PrefectureStats {
    pub name: String,
    pub stats: Stats,
}

/// `router::PrefectureRouter::stats()` response: per-shard stats, the
/// sum of every shard's document count, and the full configured shard
/// list (whether or not it has ever been searched).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MultiIndexStats {
    pub prefectures: HashMap<String, PrefectureStats>,
    pub total_documents: u64,
    pub available_prefectures: Vec<AvailablePrefecture>,
}
