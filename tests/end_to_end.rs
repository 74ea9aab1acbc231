use index::{Engine, SortKey};
use journal::Journal;
use schema::document::{Document, IngestRecord};
use search::SearchService;
use tempfile::tempdir;
use tokenizer::{MorphAnalyzer, PartOfSpeech, RawToken};

/// Splits on whitespace only — every scenario below supplies
/// pre-segmented `content_tokens` directly, so the only thing under
/// test that needs real tokenization is the user's search string.
struct WhitespaceAnalyzer;

impl MorphAnalyzer for WhitespaceAnalyzer {
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

#[allow(clippy::too_many_arguments)]
fn doc(id: &str, jcn: &str, prefecture: &str, cust_status: &str, content_tokens: &str) -> Document {
    IngestRecord {
        id: id.to_string(),
        url: format!("https://example.test/{id}"),
        url_name: "top".to_string(),
        content: None,
        content_tokens: Some(content_tokens.to_string()),
        jcn: jcn.to_string(),
        cust_status2: cust_status.to_string(),
        company_name_kj: "株式会社サンプル".to_string(),
        company_address_all: "テスト県テスト市".to_string(),
        prefecture: prefecture.to_string(),
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

fn service() -> (SearchService, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let engine = Engine::open(dir.path()).unwrap();
    (SearchService::new(engine, Box::new(WhitespaceAnalyzer), "tantivy"), dir)
}

#[test]
fn ingest_then_query_finds_the_document_and_its_group() {
    let (svc, _dir) = service();
    svc.add(&doc("a", "1", "Tokyo", "白地", "機械学習 プラットフォーム 開発"))
        .unwrap();

    let response = svc.search("機械学習", 10, None, None, SortKey::Score).unwrap();
    assert_eq!(response.grouped_results.len(), 1);
    let group = &response.grouped_results[0];
    assert_eq!(group.jcn, "1");
    assert_eq!(group.urls.len(), 1);
    assert_eq!(group.urls[0].id, "a");

    let accepted = ["機械", "学習", "機械学習"];
    assert!(group.urls[0]
        .matched_terms
        .iter()
        .any(|term| accepted.contains(&term.as_str())));
}

#[test]
fn prefecture_filter_restricts_results_to_the_shard() {
    let (svc, _dir) = service();
    svc.add(&doc("a", "1", "Tokyo", "白地", "機械学習 プラットフォーム 開発"))
        .unwrap();
    svc.add(&doc("b", "2", "Osaka", "白地", "機械学習 サービス"))
        .unwrap();

    let tokyo = svc
        .search("機械学習", 10, Some("tokyo"), None, SortKey::Score)
        .unwrap();
    assert_eq!(tokyo.total_found, 1);
    assert_eq!(tokyo.grouped_results[0].urls[0].id, "a");

    let osaka = svc
        .search("機械学習", 10, Some("osaka"), None, SortKey::Score)
        .unwrap();
    assert_eq!(osaka.total_found, 1);
    assert_eq!(osaka.grouped_results[0].urls[0].id, "b");
}

#[test]
fn customer_status_or_filter_returns_only_matching_statuses() {
    let (svc, _dir) = service();
    svc.add(&doc("a", "1", "Tokyo", "契約", "機械学習 基盤")).unwrap();
    svc.add(&doc("b", "2", "Tokyo", "白地", "機械学習 基盤")).unwrap();
    svc.add(&doc("c", "3", "Tokyo", "過去", "機械学習 基盤")).unwrap();

    let response = svc
        .search("機械学習", 10, None, Some("白地|過去"), SortKey::Score)
        .unwrap();

    let mut ids: Vec<String> = response
        .grouped_results
        .iter()
        .flat_map(|g| g.urls.iter().map(|u| u.id.clone()))
        .collect();
    ids.sort();
    assert_eq!(ids, vec!["b".to_string(), "c".to_string()]);
}

#[test]
fn sort_by_jcn_emits_ascending_order() {
    let (svc, _dir) = service();
    svc.add(&doc("a", "3", "Tokyo", "白地", "機械学習 基盤")).unwrap();
    svc.add(&doc("b", "1", "Tokyo", "白地", "機械学習 基盤")).unwrap();
    svc.add(&doc("c", "2", "Tokyo", "白地", "機械学習 基盤")).unwrap();

    let response = svc
        .search("機械学習", 10, None, None, SortKey::Jcn)
        .unwrap();

    let jcns: Vec<String> = response.grouped_results.iter().map(|g| g.jcn.clone()).collect();
    assert_eq!(jcns, vec!["1".to_string(), "2".to_string(), "3".to_string()]);
}

#[test]
fn quoted_phrase_matches_only_the_merged_surface() {
    let (svc, _dir) = service();
    svc.add(&doc("a", "1", "Tokyo", "白地", "データ 分析 基盤")).unwrap();
    svc.add(&doc("b", "2", "Tokyo", "白地", "データ分析 基盤")).unwrap();

    let response = svc
        .search("\"データ分析\"", 10, None, None, SortKey::Score)
        .unwrap();

    let ids: Vec<String> = response
        .grouped_results
        .iter()
        .flat_map(|g| g.urls.iter().map(|u| u.id.clone()))
        .collect();
    assert_eq!(ids, vec!["b".to_string()]);
}

#[test]
fn journal_rankings_count_normalized_queries_across_logs() {
    let dir = tempdir().unwrap();
    let journal = Journal::open(dir.path(), Box::new(WhitespaceAnalyzer)).unwrap();

    for query in ["AI", "AI", "機械学習", "AI", "機械学習"] {
        journal.log("alice", query, 1, 0.001, None, None, None).unwrap();
    }

    let popular = journal.popular_queries(2);
    assert_eq!(
        popular,
        vec![("ai".to_string(), 3), ("機械学習".to_string(), 2)]
    );
    assert_eq!(journal.rankings_stats().total_queries, 5);
}
