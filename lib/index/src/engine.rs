use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use error::{Error, Result};
use tantivy::collector::TopDocs;
use tantivy::directory::MmapDirectory;
use tantivy::query::{BooleanQuery, Occur, Query, QueryParser, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, Schema, Value};
use tantivy::{DocAddress, Document as TantivyDocument, Index, IndexReader, IndexWriter, ReloadPolicy, Searcher, Term};

use crate::tantivy_schema::{self, Fields};
use crate::tokenizer::WhitespaceTokenizer;
use schema::document::Document;

const WRITER_MEMORY_BUDGET: usize = 50_000_000;

#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    pub prefecture: Option<String>,
    pub cust_status: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    Score,
    Jcn,
}

/// One ranked search result: every stored field of the winning document
/// plus its score and the set of `content_tokens` surfaces that matched.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub id: String,
    pub url: String,
    pub url_name: String,
    pub jcn: String,
    pub cust_status2: String,
    pub company_name_kj: String,
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
    pub score: f32,
    pub matched_terms: Vec<String>,
}

/// Single-directory tantivy-backed index. One `IndexWriter` behind a
/// `Mutex` (acquire-use-release per call); readers go through
/// `IndexReader::searcher()`, safe for concurrent use without external
/// locking.
pub struct Engine {
    index: Index,
    reader: IndexReader,
    writer: Mutex<IndexWriter>,
    fields: Fields,
    #[allow(dead_code)]
    path: PathBuf,
}

impl Engine {
    /// Opens the index directory, creating it if missing. If the
    /// directory exists but fails to open (corruption), it is wiped and
    /// recreated — documented data loss, the only recovery mechanism.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        std::fs::create_dir_all(&path)?;
        let (schema, fields) = tantivy_schema::build();

        let index = match Self::open_directory(&path, &schema) {
            Ok(index) => index,
            Err(e) => {
                log::warn!(
                    "index at {} failed to open ({e}), recreating",
                    path.display()
                );
                std::fs::remove_dir_all(&path)?;
                std::fs::create_dir_all(&path)?;
                Self::open_directory(&path, &schema).map_err(|e| Error::CorruptIndex(e.to_string()))?
            }
        };

        index
            .tokenizers()
            .register(tantivy_schema::CONTENT_TOKENS_TOKENIZER, WhitespaceTokenizer);

        let writer = index
            .writer(WRITER_MEMORY_BUDGET)
            .map_err(|e| Error::Storage(e.to_string()))?;
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommit)
            .try_into()
            .map_err(|e: tantivy::TantivyError| Error::Storage(e.to_string()))?;

        Ok(Self {
            index,
            reader,
            writer: Mutex::new(writer),
            fields,
            path,
        })
    }

    fn open_directory(path: &Path, schema: &Schema) -> tantivy::Result<Index> {
        let dir = MmapDirectory::open(path)?;
        Index::open_or_create(dir, schema.clone())
    }

    pub fn add(&self, document: &Document) -> Result<()> {
        let mut writer = self.writer.lock().map_err(|_| Error::WriterUnavailable)?;
        writer
            .add_document(tantivy_schema::to_tantivy(&self.fields, document))
            .map_err(|e| Error::Storage(e.to_string()))?;
        writer.commit().map_err(|e| Error::Storage(e.to_string()))?;
        self.reader.reload().map_err(|e| Error::Storage(e.to_string()))?;
        Ok(())
    }

    /// Atomic per batch: the first failing document rolls the whole batch
    /// back rather than leaving a partial commit.
    pub fn add_batch(&self, documents: &[Document]) -> Result<()> {
        let mut writer = self.writer.lock().map_err(|_| Error::WriterUnavailable)?;
        for document in documents {
            if let Err(e) = writer.add_document(tantivy_schema::to_tantivy(&self.fields, document)) {
                let _ = writer.rollback();
                return Err(Error::Storage(e.to_string()));
            }
        }
        writer.commit().map_err(|e| Error::Storage(e.to_string()))?;
        self.reader.reload().map_err(|e| Error::Storage(e.to_string()))?;
        Ok(())
    }

    pub fn delete(&self, id: &str) -> Result<u64> {
        let searcher = self.reader.searcher();
        let term = Term::from_field_text(self.fields.id, id);
        let count = searcher
            .search(
                &TermQuery::new(term.clone(), IndexRecordOption::Basic),
                &tantivy::collector::Count,
            )
            .map_err(|e| Error::Storage(e.to_string()))? as u64;
        if count == 0 {
            return Ok(0);
        }

        let mut writer = self.writer.lock().map_err(|_| Error::WriterUnavailable)?;
        writer.delete_term(term);
        writer.commit().map_err(|e| Error::Storage(e.to_string()))?;
        self.reader.reload().map_err(|e| Error::Storage(e.to_string()))?;
        Ok(count)
    }

    pub fn clear(&self) -> Result<()> {
        let mut writer = self.writer.lock().map_err(|_| Error::WriterUnavailable)?;
        writer
            .delete_all_documents()
            .map_err(|e| Error::Storage(e.to_string()))?;
        writer.commit().map_err(|e| Error::Storage(e.to_string()))?;
        self.reader.reload().map_err(|e| Error::Storage(e.to_string()))?;
        Ok(())
    }

    pub fn doc_count(&self) -> Result<u64> {
        Ok(self.reader.searcher().num_docs())
    }

    /// Disjunctive parse over `content_tokens`, AND-composed with the
    /// prefecture/cust_status filters, sorted by score or by `jcn`.
    pub fn search(
        &self,
        compiled_query: &str,
        limit: usize,
        filters: &SearchFilters,
        sort: SortKey,
    ) -> Result<Vec<Hit>> {
        if compiled_query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let searcher = self.reader.searcher();
        let main_query = self.parse_or_fallback(compiled_query);
        let final_query = self.apply_filters(main_query, filters);

        let mut terms = BTreeSet::new();
        final_query.query_terms(&mut terms);

        // Scoring a `jcn`-sorted page requires the full candidate set: a
        // score-ranked cap taken before re-sorting would silently drop
        // matches that happen to rank low by score.
        let collect_cap = match sort {
            SortKey::Score => limit.max(1),
            SortKey::Jcn => (searcher.num_docs() as usize).max(1),
        };

        let top_docs = searcher
            .search(&final_query, &TopDocs::with_limit(collect_cap))
            .map_err(|e| Error::Storage(e.to_string()))?;

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, addr) in top_docs {
            let retrieved = searcher.doc(addr).map_err(|e| Error::Storage(e.to_string()))?;
            let matched_terms = self.matched_terms_for(&searcher, &terms, addr);
            hits.push(self.to_hit(&retrieved, score, matched_terms));
        }

        if sort == SortKey::Jcn {
            hits.sort_by(|a, b| a.jcn.cmp(&b.jcn));
        }
        hits.truncate(limit);
        Ok(hits)
    }

    fn parse_or_fallback(&self, compiled_query: &str) -> Box<dyn Query> {
        let mut parser = QueryParser::for_index(&self.index, vec![self.fields.content_tokens]);
        parser.set_conjunction_by_default(false);
        match parser.parse_query(compiled_query) {
            Ok(query) => query,
            Err(e) => {
                log::warn!("query parse failed ({e}), falling back to whitespace-split OR");
                self.whitespace_fallback(compiled_query)
            }
        }
    }

    fn whitespace_fallback(&self, compiled_query: &str) -> Box<dyn Query> {
        let cleaned: String = compiled_query
            .chars()
            .map(|c| if c == '"' || c == '(' || c == ')' { ' ' } else { c })
            .collect();
        let mut terms: Vec<Box<dyn Query>> = cleaned
            .split_whitespace()
            .map(|t| {
                let term = Term::from_field_text(self.fields.content_tokens, t);
                Box::new(TermQuery::new(term, IndexRecordOption::WithFreqsAndPositions)) as Box<dyn Query>
            })
            .collect();

        match terms.len() {
            0 => Box::new(BooleanQuery::union(Vec::new())),
            1 => terms.pop().unwrap(),
            _ => Box::new(BooleanQuery::union(terms)),
        }
    }

    fn apply_filters(&self, main: Box<dyn Query>, filters: &SearchFilters) -> Box<dyn Query> {
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = vec![(Occur::Must, main)];

        if let Some(prefecture) = &filters.prefecture {
            let term = Term::from_field_text(self.fields.prefecture, &prefecture.to_lowercase());
            clauses.push((
                Occur::Must,
                Box::new(TermQuery::new(term, IndexRecordOption::Basic)),
            ));
        }

        if let Some(cust_status) = &filters.cust_status {
            let options: Vec<Box<dyn Query>> = cust_status
                .split('|')
                .filter(|s| !s.is_empty())
                .map(|status| {
                    let term = Term::from_field_text(self.fields.cust_status2, status);
                    Box::new(TermQuery::new(term, IndexRecordOption::Basic)) as Box<dyn Query>
                })
                .collect();
            if !options.is_empty() {
                let status_query = if options.len() == 1 {
                    let mut options = options;
                    options.pop().unwrap()
                } else {
                    Box::new(BooleanQuery::union(options)) as Box<dyn Query>
                };
                clauses.push((Occur::Must, status_query));
            }
        }

        if clauses.len() == 1 {
            clauses.pop().unwrap().1
        } else {
            Box::new(BooleanQuery::new(clauses))
        }
    }

    /// Decodes which `content_tokens` terms actually matched `addr` by
    /// checking segment postings membership directly — tantivy's
    /// `TopDocs` collector does not expose match provenance, so this runs
    /// once per returned hit rather than as a collector built into
    /// tantivy.
    fn matched_terms_for(&self, searcher: &Searcher, terms: &BTreeSet<Term>, addr: DocAddress) -> Vec<String> {
        let segment_reader = searcher.segment_reader(addr.segment_ord);
        let inverted_index = match segment_reader.inverted_index(self.fields.content_tokens) {
            Ok(ii) => ii,
            Err(_) => return Vec::new(),
        };

        let mut seen = HashSet::new();
        let mut matched = Vec::new();
        for term in terms {
            if term.field() != self.fields.content_tokens {
                continue;
            }
            if let Ok(Some(mut postings)) = inverted_index.read_postings(term, IndexRecordOption::Basic) {
                if postings.seek(addr.doc_id) == addr.doc_id {
                    if let Some(text) = term.as_str() {
                        if seen.insert(text.to_string()) {
                            matched.push(text.to_string());
                        }
                    }
                }
            }
        }
        matched
    }

    fn to_hit(&self, doc: &TantivyDocument, score: f32, matched_terms: Vec<String>) -> Hit {
        let text = |field: Field| -> String {
            doc.get_first(field)
                .and_then(|v| v.as_text())
                .unwrap_or("")
                .to_string()
        };
        let num = |field: Field| -> u64 { doc.get_first(field).and_then(|v| v.as_u64()).unwrap_or(0) };

        Hit {
            id: text(self.fields.id),
            url: text(self.fields.url),
            url_name: text(self.fields.url_name),
            jcn: text(self.fields.jcn),
            cust_status2: text(self.fields.cust_status2),
            company_name_kj: text(self.fields.company_name_kj),
            company_address_all: text(self.fields.company_address_all),
            prefecture: text(self.fields.prefecture),
            city: text(self.fields.city),
            large_class_name: text(self.fields.large_class_name),
            middle_class_name: text(self.fields.middle_class_name),
            curr_setlmnt_taking_amt: num(self.fields.curr_setlmnt_taking_amt),
            employee_all_num: num(self.fields.employee_all_num),
            district_finalized_cd: text(self.fields.district_finalized_cd),
            branch_name_cd: text(self.fields.branch_name_cd),
            main_domain_url: text(self.fields.main_domain_url),
            score,
            matched_terms,
        }
    }
}
