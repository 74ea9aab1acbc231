use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use error::{Error, Result};
use index::{Engine, Hit, SearchFilters, SortKey};
use lru::LruCache;
use schema::document::Document;
use schema::response::{CompanyGroup, SearchResponse, Stats, UrlHit};
use tokenizer::MorphAnalyzer;

const DEFAULT_CACHE_CAPACITY: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    query: String,
    limit: usize,
    prefecture: Option<String>,
    cust_status: Option<String>,
    sort: SortKey,
}

#[derive(Debug, Clone)]
struct CacheValue {
    hits: Vec<Hit>,
    compiled: String,
}

/// Orchestrates the query processor and index engine, groups hits by
/// `jcn`, and caches raw hit lists keyed on the full search signature.
pub struct SearchService {
    engine: Engine,
    analyzer: Box<dyn MorphAnalyzer + Send + Sync>,
    cache: Mutex<LruCache<CacheKey, CacheValue>>,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    engine_type: String,
    min_token_length: usize,
}

impl SearchService {
    pub fn new(
        engine: Engine,
        analyzer: Box<dyn MorphAnalyzer + Send + Sync>,
        engine_type: impl Into<String>,
    ) -> Self {
        Self::with_cache_capacity(
            engine,
            analyzer,
            engine_type,
            DEFAULT_CACHE_CAPACITY,
            query::DEFAULT_MIN_TOKEN_LENGTH,
        )
    }

    pub fn with_cache_capacity(
        engine: Engine,
        analyzer: Box<dyn MorphAnalyzer + Send + Sync>,
        engine_type: impl Into<String>,
        capacity: usize,
        min_token_length: usize,
    ) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity.max(1) is never zero");
        Self {
            engine,
            analyzer,
            cache: Mutex::new(LruCache::new(capacity)),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            engine_type: engine_type.into(),
            min_token_length,
        }
    }

    pub fn add(&self, document: &Document) -> Result<()> {
        self.engine.add(document)?;
        self.clear_cache();
        Ok(())
    }

    pub fn add_batch(&self, documents: &[Document]) -> Result<()> {
        self.engine.add_batch(documents)?;
        self.clear_cache();
        Ok(())
    }

    pub fn delete(&self, id: &str) -> Result<u64> {
        let count = self.engine.delete(id)?;
        self.clear_cache();
        Ok(count)
    }

    pub fn clear(&self) -> Result<()> {
        self.engine.clear()?;
        self.clear_cache();
        Ok(())
    }

    pub fn search(
        &self,
        query: &str,
        limit: usize,
        prefecture: Option<&str>,
        cust_status: Option<&str>,
        sort: SortKey,
    ) -> Result<SearchResponse> {
        let started = Instant::now();
        if query.trim().is_empty() {
            return Ok(SearchResponse::empty(query.to_string()));
        }

        let key = CacheKey {
            query: query.to_string(),
            limit,
            prefecture: prefecture.map(str::to_string),
            cust_status: cust_status.map(str::to_string),
            sort,
        };

        let cached = {
            let mut cache = self.lock_cache()?;
            cache.get(&key).cloned()
        };

        let (hits, compiled) = match cached {
            Some(value) => {
                self.cache_hits.fetch_add(1, Ordering::Relaxed);
                (value.hits, value.compiled)
            }
            None => {
                self.cache_misses.fetch_add(1, Ordering::Relaxed);
                let compiled = query::compile(self.analyzer.as_ref(), query, self.min_token_length);
                let hits = if compiled.is_empty() {
                    Vec::new()
                } else {
                    let filters = SearchFilters {
                        prefecture: prefecture.map(str::to_string),
                        cust_status: cust_status.map(str::to_string),
                    };
                    self.engine.search(&compiled, limit, &filters, sort)?
                };

                let mut cache = self.lock_cache()?;
                cache.put(
                    key,
                    CacheValue {
                        hits: hits.clone(),
                        compiled: compiled.clone(),
                    },
                );
                (hits, compiled)
            }
        };

        let total_found = hits.len();
        let grouped_results = Self::group_by_jcn(hits);
        let total_companies = grouped_results.len();

        Ok(SearchResponse {
            grouped_results,
            total_found,
            total_companies,
            search_time: started.elapsed().as_secs_f64(),
            processed_query: compiled,
            query: query.to_string(),
            prefecture: prefecture.map(str::to_string),
            city: None,
            cust_status: cust_status.map(str::to_string),
        })
    }

    pub fn stats(&self) -> Result<Stats> {
        let cache = self.lock_cache()?;
        Ok(Stats {
            total_documents: self.engine.doc_count()?,
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            cache_size: cache.len(),
            cache_max_size: cache.cap().get(),
            engine_type: self.engine_type.clone(),
        })
    }

    fn lock_cache(&self) -> Result<std::sync::MutexGuard<'_, LruCache<CacheKey, CacheValue>>> {
        self.cache.lock().map_err(|_| {
            log::error!("search cache mutex poisoned, treating as a storage failure");
            Error::Storage("search cache lock poisoned".to_string())
        })
    }

    fn clear_cache(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }

    /// Groups hits by `jcn`, emitting groups in ascending `jcn` order.
    /// Shared company fields come from the first hit seen for a `jcn`;
    /// `urls` preserves the original hit order within a group.
    fn group_by_jcn(hits: Vec<Hit>) -> Vec<CompanyGroup> {
        let mut groups: Vec<CompanyGroup> = Vec::new();
        let mut index_by_jcn: HashMap<String, usize> = HashMap::new();

        for hit in hits {
            let url_hit = UrlHit {
                id: hit.id.clone(),
                url: hit.url.clone(),
                url_name: hit.url_name.clone(),
                content_preview: None,
                matched_terms: hit.matched_terms.clone(),
                score: hit.score,
            };

            if let Some(&idx) = index_by_jcn.get(&hit.jcn) {
                groups[idx].urls.push(url_hit);
                continue;
            }

            index_by_jcn.insert(hit.jcn.clone(), groups.len());
            groups.push(CompanyGroup {
                jcn: hit.jcn,
                company_name_kj: hit.company_name_kj,
                cust_status2: hit.cust_status2,
                company_address_all: hit.company_address_all,
                prefecture: hit.prefecture,
                city: hit.city,
                large_class_name: hit.large_class_name,
                middle_class_name: hit.middle_class_name,
                curr_setlmnt_taking_amt: hit.curr_setlmnt_taking_amt,
                employee_all_num: hit.employee_all_num,
                district_finalized_cd: hit.district_finalized_cd,
                branch_name_cd: hit.branch_name_cd,
                main_domain_url: hit.main_domain_url,
                urls: vec![url_hit],
            });
        }

        groups.sort_by(|a, b| a.jcn.cmp(&b.jcn));
        groups
    }
}
