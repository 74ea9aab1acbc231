use error::Error;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

/// One crawled URL, annotated with its owning company's metadata.
///
/// `id` is the globally unique key. `content_tokens` is the sole analyzed
/// field and is always a whitespace-joined list of retained surface forms,
/// never the original text. `prefecture` is always stored lowercased.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Document {
    pub id: String,
    pub url: String,
    pub url_name: String,
    pub content_tokens: String,
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
}

impl Document {
    /// Enforces the `prefecture`-is-lowercase invariant. Called once, right
    /// before a document is handed to the index writer.
    pub fn normalize(&mut self) {
        self.prefecture = self.prefecture.to_lowercase();
    }
}

/// Explicit per-field kind tag, consumed by `index` when building its
/// tantivy schema. Kept as a sum type rather than a dynamic attribute map so
/// every field's storage/indexing/filtering behavior is fixed at compile
/// time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum FieldKind {
    /// Unique identifier, stored and used as the delete key.
    Id,
    /// Stored-only display text, never indexed.
    StoredText,
    /// Tokenized and indexed with positions, never stored.
    AnalyzedText,
    /// Exact-match keyword: stored, indexed, filterable.
    Keyword,
    /// Exact-match keyword additionally usable as a fast-field sort key.
    SortableKeyword,
    /// Stored numeric field, coerced from missing/blank to 0 on write.
    Numeric,
}

/// Input to `add`/`add_batch`: every [`Document`] field except
/// `content_tokens`, plus either `content` (raw pre-HTML-stripped text,
/// tokenized on write) or `content_tokens` directly.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IngestRecord {
    pub id: String,
    pub url: String,
    pub url_name: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub content_tokens: Option<String>,
    pub jcn: String,
    #[serde(default)]
    pub cust_status2: String,
    #[serde(default)]
    pub company_name_kj: String,
    #[serde(default)]
    pub company_address_all: String,
    pub prefecture: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub large_class_name: String,
    #[serde(default)]
    pub middle_class_name: String,
    #[serde(default)]
    pub curr_setlmnt_taking_amt: Option<u64>,
    #[serde(default)]
    pub employee_all_num: Option<u64>,
    #[serde(default)]
    pub district_finalized_cd: String,
    #[serde(default)]
    pub branch_name_cd: String,
    #[serde(default)]
    pub main_domain_url: String,
}

impl IngestRecord {
    /// Builds a [`Document`], tokenizing `content` through `tokenize` when
    /// `content_tokens` wasn't supplied directly. Missing/blank numeric
    /// fields coerce to 0.
    pub fn into_document<F>(self, tokenize: F) -> Result<Document, Error>
    where
        F: FnOnce(&str) -> String,
    {
        if self.id.is_empty() {
            return Err(Error::MissingField("id"));
        }
        if self.jcn.is_empty() {
            return Err(Error::MissingField("jcn"));
        }
        if self.prefecture.is_empty() {
            return Err(Error::MissingField("prefecture"));
        }

        let content_tokens = match (self.content_tokens, self.content) {
            (Some(tokens), _) => tokens,
            (None, Some(content)) => tokenize(&content),
            (None, None) => String::new(),
        };

        let mut doc = Document {
            id: self.id,
            url: self.url,
            url_name: self.url_name,
            content_tokens,
            jcn: self.jcn,
            cust_status2: self.cust_status2,
            company_name_kj: self.company_name_kj,
            company_address_all: self.company_address_all,
            prefecture: self.prefecture,
            city: self.city,
            large_class_name: self.large_class_name,
            middle_class_name: self.middle_class_name,
            curr_setlmnt_taking_amt: self.curr_setlmnt_taking_amt.unwrap_or(0),
            employee_all_num: self.employee_all_num.unwrap_or(0),
            district_finalized_cd: self.district_finalized_cd,
            branch_name_cd: self.branch_name_cd,
            main_domain_url: self.main_domain_url,
        };
        doc.normalize();
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_lowercases_prefecture() {
        let mut doc = Document {
            prefecture: "Tokyo".to_string(),
            ..Default::default()
        };
        doc.normalize();
        assert_eq!(doc.prefecture, "tokyo");
    }

    #[test]
    fn into_document_requires_id_jcn_prefecture() {
        let rec = IngestRecord {
            jcn: "1".to_string(),
            prefecture: "Tokyo".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            rec.into_document(|c| c.to_string()),
            Err(Error::MissingField("id"))
        ));
    }

    #[test]
    fn into_document_tokenizes_content_when_tokens_absent() {
        let rec = IngestRecord {
            id: "a".to_string(),
            jcn: "1".to_string(),
            prefecture: "Osaka".to_string(),
            content: Some("raw text".to_string()),
            ..Default::default()
        };
        let doc = rec.into_document(|_| "raw text tokenized".to_string()).unwrap();
        assert_eq!(doc.content_tokens, "raw text tokenized");
        assert_eq!(doc.prefecture, "osaka");
    }

    #[test]
    fn into_document_prefers_content_tokens_over_content() {
        let rec = IngestRecord {
            id: "a".to_string(),
            jcn: "1".to_string(),
            prefecture: "osaka".to_string(),
            content: Some("ignored".to_string()),
            content_tokens: Some("already tokenized".to_string()),
            ..Default::default()
        };
        let doc = rec
            .into_document(|_| panic!("tokenize must not be called"))
            .unwrap();
        assert_eq!(doc.content_tokens, "already tokenized");
    }
}
