use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use error::{Error, Result};
use index::SortKey;
use schema::response::{CompanyGroup, SearchResponse, UrlHit};
use search::SearchService;
use tempfile::NamedTempFile;

/// `search(limit=...)` used to materialize an export: large enough that
/// a company-grouped CSV export is effectively unbounded for any single
/// prefecture shard.
pub const EXPORT_SEARCH_LIMIT: usize = 10_000;

const CONTENT_PREVIEW_LIMIT: usize = 500;

const CSV_COLUMNS: [&str; 18] = [
    "jcn",
    "CUST_STATUS2",
    "company_name_kj",
    "company_address_all",
    "LARGE_CLASS_NAME",
    "MIDDLE_CLASS_NAME",
    "CURR_SETLMNT_TAKING_AMT",
    "EMPLOYEE_ALL_NUM",
    "prefecture",
    "city",
    "district_finalized_cd",
    "branch_name_cd",
    "main_domain_url",
    "url_name",
    "url",
    "content",
    "matched_terms",
    "id",
];

/// Content-addressed CSV materialization over `search::SearchService`
/// results. Key is `md5(query:prefecture:cust_status)`; presence of
/// `{root}/{key}.csv` serves as the cache. A query that previously
/// failed persists a one-line error record so retries don't loop until
/// an operator deletes the file.
pub struct ExportCache {
    root: PathBuf,
}

impl ExportCache {
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn key(query: &str, prefecture: Option<&str>, cust_status: Option<&str>) -> String {
        let material = format!("{}:{}:{}", query, prefecture.unwrap_or(""), cust_status.unwrap_or(""));
        format!("{:x}", md5::compute(material.as_bytes()))
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.csv"))
    }

    /// Returns the path to a cache file for `(query, prefecture,
    /// cust_status)`, running the underlying search and writing the file
    /// only on a cache miss.
    pub fn fetch(
        &self,
        service: &SearchService,
        query: &str,
        prefecture: Option<&str>,
        cust_status: Option<&str>,
    ) -> Result<PathBuf> {
        let key = Self::key(query, prefecture, cust_status);
        let path = self.path_for(&key);
        if path.exists() {
            return Ok(path);
        }

        match service.search(query, EXPORT_SEARCH_LIMIT, prefecture, cust_status, SortKey::Jcn) {
            Ok(response) => self.write_rows(&path, &response)?,
            Err(err) => self.write_error(&path, &err)?,
        }
        Ok(path)
    }

    fn write_rows(&self, path: &Path, response: &SearchResponse) -> Result<()> {
        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(&[0xEF, 0xBB, 0xBF])?;
        {
            let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(&mut tmp);
            writer.write_record(CSV_COLUMNS).map_err(csv_err)?;
            for group in &response.grouped_results {
                for url in &group.urls {
                    writer.write_record(row(group, url)).map_err(csv_err)?;
                }
            }
            writer.flush().map_err(|e| Error::Storage(e.to_string()))?;
        }
        tmp.persist(path).map_err(|e| Error::Storage(e.to_string()))?;
        Ok(())
    }

    fn write_error(&self, path: &Path, err: &Error) -> Result<()> {
        log::warn!("persisting export failure to {}: {err}", path.display());
        let mut tmp = NamedTempFile::new_in(&self.root)?;
        writeln!(tmp, "error: {err}")?;
        tmp.persist(path).map_err(|e| Error::Storage(e.to_string()))?;
        Ok(())
    }
}

fn row(group: &CompanyGroup, url: &UrlHit) -> [String; 18] {
    let content = url
        .content_preview
        .as_deref()
        .map(|c| c.chars().take(CONTENT_PREVIEW_LIMIT).collect())
        .unwrap_or_default();

    [
        group.jcn.clone(),
        group.cust_status2.clone(),
        group.company_name_kj.clone(),
        group.company_address_all.clone(),
        group.large_class_name.clone(),
        group.middle_class_name.clone(),
        group.curr_setlmnt_taking_amt.to_string(),
        group.employee_all_num.to_string(),
        group.prefecture.clone(),
        group.city.clone(),
        group.district_finalized_cd.clone(),
        group.branch_name_cd.clone(),
        group.main_domain_url.clone(),
        url.url_name.clone(),
        url.url.clone(),
        content,
        url.matched_terms.join("|"),
        url.id.clone(),
    ]
}

fn csv_err(e: csv::Error) -> Error {
    Error::Storage(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use index::Engine;
    use schema::document::IngestRecord;
    use tempfile::tempdir;
    use tokenizer::{MorphAnalyzer, PartOfSpeech, RawToken};

    struct FakeAnalyzer;

    impl MorphAnalyzer for FakeAnalyzer {
        fn analyze(&self, text: &str) -> Vec<RawToken> {
            text.split_whitespace()
                .map(|surface| RawToken {
                    surface: surface.to_string(),
                    pos: PartOfSpeech::Noun,
                    base_form: surface.to_string(),
                })
                .collect()
        }
    }

    fn service() -> (SearchService, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let engine = Engine::open(dir.path()).unwrap();
        (SearchService::new(engine, Box::new(FakeAnalyzer), "tantivy"), dir)
    }

    fn record(id: &str) -> schema::document::Document {
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
    fn key_is_stable_and_distinguishes_filters() {
        let a = ExportCache::key("機械学習", Some("東京都"), None);
        let b = ExportCache::key("機械学習", Some("東京都"), None);
        let c = ExportCache::key("機械学習", Some("大阪府"), None);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn fetch_writes_bom_header_and_rows_then_reuses_the_cached_file() {
        let (svc, _index_dir) = service();
        svc.add(&record("1")).unwrap();

        let cache_dir = tempdir().unwrap();
        let cache = ExportCache::open(cache_dir.path()).unwrap();

        let path = cache.fetch(&svc, "機械学習", None, None).unwrap();
        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);

        let content = String::from_utf8(bytes).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "jcn,CUST_STATUS2,company_name_kj,company_address_all,LARGE_CLASS_NAME,MIDDLE_CLASS_NAME,\
CURR_SETLMNT_TAKING_AMT,EMPLOYEE_ALL_NUM,prefecture,city,district_finalized_cd,branch_name_cd,\
main_domain_url,url_name,url,content,matched_terms,id"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("1000000000001,白地,"));
        assert!(row.ends_with(",1"));

        svc.add(&record("2")).unwrap();
        let reused = cache.fetch(&svc, "機械学習", None, None).unwrap();
        assert_eq!(reused, path);
        let still_one_row = fs::read_to_string(&reused).unwrap().lines().count();
        assert_eq!(still_one_row, 2);
    }
}
