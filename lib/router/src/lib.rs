use std::collections::HashMap;

use config::Config;
use error::{Error, Result};
use index::{Engine, SortKey};
use schema::document::Document;
use schema::response::{AvailablePrefecture, MultiIndexStats, PrefectureStats, SearchResponse};
use search::SearchService;
use tokenizer::TokenizerFactory;

struct Shard {
    display_name: String,
    index_path: String,
    service: SearchService,
}

/// Holds one `search::SearchService` per configured prefecture. Never
/// fans a query out across shards: every operation is addressed by a
/// single `prefecture` token, which must be present in `config`.
pub struct PrefectureRouter {
    shards: HashMap<String, Shard>,
}

impl PrefectureRouter {
    /// Opens one index engine per entry in `config.prefectures`.
    pub fn open(config: &Config) -> Result<Self> {
        let mut shards = HashMap::new();
        for prefecture in &config.prefectures {
            let engine = Engine::open(&prefecture.index_path)?;
            let analyzer = TokenizerFactory::create(config.get_tokenizer_backend());
            let service = SearchService::with_cache_capacity(
                engine,
                analyzer,
                "tantivy",
                config.get_cache_capacity(),
                config.get_min_token_length(),
            );
            shards.insert(
                prefecture.token.clone(),
                Shard {
                    display_name: prefecture.display_name.clone(),
                    index_path: prefecture.index_path.clone(),
                    service,
                },
            );
        }
        Ok(Self { shards })
    }

    fn shard(&self, prefecture: &str) -> Result<&Shard> {
        self.shards.get(prefecture).ok_or_else(|| {
            log::warn!("unknown prefecture requested: {prefecture}");
            Error::UnknownPrefecture(prefecture.to_string())
        })
    }

    pub fn search(
        &self,
        prefecture: &str,
        query: &str,
        limit: usize,
        cust_status: Option<&str>,
        sort: SortKey,
    ) -> Result<SearchResponse> {
        let shard = self.shard(prefecture)?;
        shard
            .service
            .search(query, limit, Some(prefecture), cust_status, sort)
    }

    pub fn add(&self, prefecture: &str, document: &Document) -> Result<()> {
        self.shard(prefecture)?.service.add(document)
    }

    pub fn add_batch(&self, prefecture: &str, documents: &[Document]) -> Result<()> {
        self.shard(prefecture)?.service.add_batch(documents)
    }

    pub fn delete(&self, prefecture: &str, id: &str) -> Result<u64> {
        self.shard(prefecture)?.service.delete(id)
    }

    pub fn clear(&self, prefecture: &str) -> Result<()> {
        self.shard(prefecture)?.service.clear()
    }

    /// Aggregates every shard's stats plus the full configured shard
    /// list, whether or not it has been searched yet.
    pub fn stats(&self) -> Result<MultiIndexStats> {
        let mut prefectures = HashMap::new();
        let mut total_documents = 0u64;
        let mut available_prefectures = Vec::new();

        for (token, shard) in &self.shards {
            let stats = shard.service.stats()?;
            total_documents += stats.total_documents;
            available_prefectures.push(AvailablePrefecture {
                value: token.clone(),
                name: shard.display_name.clone(),
                index_dir: shard.index_path.clone(),
            });
            prefectures.insert(
                token.clone(),
                PrefectureStats {
                    name: shard.display_name.clone(),
                    stats,
                },
            );
        }

        available_prefectures.sort_by(|a, b| a.value.cmp(&b.value));

        Ok(MultiIndexStats {
            prefectures,
            total_documents,
            available_prefectures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::PrefectureConfig;
    use schema::document::IngestRecord;
    use tempfile::tempdir;

    fn router_with_prefectures(paths: &[(&str, &str, &std::path::Path)]) -> PrefectureRouter {
        let mut config = Config::default();
        for (token, name, path) in paths {
            config.prefectures.push(PrefectureConfig {
                token: token.to_string(),
                display_name: name.to_string(),
                index_path: path.to_str().unwrap().to_string(),
            });
        }
        PrefectureRouter::open(&config).unwrap()
    }

    fn record(id: &str) -> Document {
        IngestRecord {
            id: id.to_string(),
            url: format!("https://example.test/{id}"),
            url_name: "top".to_string(),
            content: None,
            content_tokens: Some("機械学習".to_string()),
            jcn: "1000000000001".to_string(),
            cust_status2: "白地".to_string(),
            company_name_kj: "テスト株式会社".to_string(),
            company_address_all: "テスト県テスト市".to_string(),
            prefecture: "東京都".to_string(),
            city: "テスト市".to_string(),
            large_class_name: "製造業".to_string(),
            middle_class_name: "機械".to_string(),
            curr_setlmnt_taking_amt: Some(1000),
            employee_all_num: Some(50),
            district_finalized_cd: "1".to_string(),
            branch_name_cd: "本社".to_string(),
            main_domain_url: "example.test".to_string(),
        }
        .into_document(|_| String::new())
        .unwrap()
    }

    #[test]
    fn search_on_unconfigured_prefecture_is_an_error() {
        let dir = tempdir().unwrap();
        let router = router_with_prefectures(&[("東京都", "東京都", dir.path())]);
        let result = router.search("大阪府", "機械学習", 10, None, SortKey::Score);
        assert!(matches!(result, Err(Error::UnknownPrefecture(p)) if p == "大阪府"));
    }

    #[test]
    fn add_is_addressed_by_prefecture() {
        let tokyo_dir = tempdir().unwrap();
        let osaka_dir = tempdir().unwrap();
        let router = router_with_prefectures(&[
            ("東京都", "東京都", tokyo_dir.path()),
            ("大阪府", "大阪府", osaka_dir.path()),
        ]);

        router.add("東京都", &record("1")).unwrap();

        let stats = router.stats().unwrap();
        assert_eq!(stats.total_documents, 1);
        assert_eq!(stats.prefectures["東京都"].stats.total_documents, 1);
        assert_eq!(stats.prefectures["大阪府"].stats.total_documents, 0);
    }

    #[test]
    fn stats_lists_every_configured_prefecture() {
        let tokyo_dir = tempdir().unwrap();
        let osaka_dir = tempdir().unwrap();
        let router = router_with_prefectures(&[
            ("東京都", "東京都", tokyo_dir.path()),
            ("大阪府", "大阪府", osaka_dir.path()),
        ]);

        let stats = router.stats().unwrap();
        assert_eq!(stats.available_prefectures.len(), 2);
        assert_eq!(stats.available_prefectures[0].value, "大阪府");
        assert_eq!(stats.available_prefectures[1].value, "東京都");
    }
}
