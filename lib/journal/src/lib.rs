use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use error::Result;
use parking_lot::RwLock;
use schema::event::SearchEvent;
use serde::{Deserialize, Serialize};
use tokenizer::MorphAnalyzer;

const KEYWORD_MIN_LENGTH: usize = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RankingsStats {
    pub total_queries: u64,
    pub unique_queries: usize,
    pub top_query: Option<(String, u64)>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct UserStats {
    pub total_searches: u64,
    pub unique_users: usize,
    pub unique_queries: usize,
}

#[derive(Default)]
struct Tables {
    query_counts: HashMap<String, u64>,
    keyword_counts: HashMap<String, u64>,
    user_search_counts: HashMap<String, u64>,
    user_history: HashMap<String, Vec<SearchEvent>>,
}

/// Per-user append-only search journal with four in-memory ranking
/// tables rebuilt from the journal files at startup and kept current on
/// every append. Readers and writers of the tables share one
/// `parking_lot::RwLock`; the file append for a `log` call happens
/// before the table update but outside that lock, so durability always
/// precedes visibility.
pub struct Journal {
    root: PathBuf,
    analyzer: Box<dyn MorphAnalyzer + Send + Sync>,
    tables: RwLock<Tables>,
}

impl Journal {
    pub fn open(root: impl AsRef<Path>, analyzer: Box<dyn MorphAnalyzer + Send + Sync>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        let tables = Self::reconstruct(&root, analyzer.as_ref())?;
        Ok(Self {
            root,
            analyzer,
            tables: RwLock::new(tables),
        })
    }

    fn reconstruct(root: &Path, analyzer: &dyn MorphAnalyzer) -> Result<Tables> {
        let mut tables = Tables::default();

        for entry in fs::read_dir(root)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("jsonl") {
                continue;
            }
            let username = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();

            let file = match File::open(&path) {
                Ok(f) => f,
                Err(_) => continue,
            };

            let mut events: Vec<SearchEvent> = Vec::new();
            for line in BufReader::new(file).lines() {
                let line = match line {
                    Ok(l) if !l.trim().is_empty() => l,
                    _ => continue,
                };
                let event: SearchEvent = match serde_json::from_str(&line) {
                    Ok(e) => e,
                    Err(e) => {
                        log::warn!("skipping malformed journal line in {}: {e}", path.display());
                        continue;
                    }
                };
                Self::record_query(&mut tables, analyzer, &event.query);
                events.push(event);
            }

            if events.is_empty() {
                continue;
            }
            tables
                .user_search_counts
                .entry(username.clone())
                .and_modify(|c| *c += events.len() as u64)
                .or_insert(events.len() as u64);
            events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            tables.user_history.insert(username, events);
        }

        Ok(tables)
    }

    fn record_query(tables: &mut Tables, analyzer: &dyn MorphAnalyzer, raw_query: &str) {
        let normalized = query::normalize(raw_query).to_lowercase();
        if normalized.is_empty() {
            return;
        }
        *tables.query_counts.entry(normalized.clone()).or_insert(0) += 1;
        for keyword in tokenizer::tokenize_and_filter(analyzer, &normalized, KEYWORD_MIN_LENGTH) {
            *tables.keyword_counts.entry(keyword).or_insert(0) += 1;
        }
    }

    fn path_for(&self, username: &str) -> PathBuf {
        self.root.join(format!("{}.jsonl", utils::sanitize_username(username)))
    }

    /// Normalizes `raw_query`, atomically appends one JSON line to the
    /// user's file, then — under the write lock, after the append
    /// completes — updates `query_counts`, `keyword_counts`,
    /// `user_search_counts`, and prepends to `user_history`.
    #[allow(clippy::too_many_arguments)]
    pub fn log(
        &self,
        username: &str,
        raw_query: &str,
        results_count: usize,
        search_time: f64,
        prefecture: Option<&str>,
        cust_status: Option<&str>,
        city: Option<&str>,
    ) -> Result<()> {
        let normalized = query::normalize(raw_query);
        let event = SearchEvent {
            timestamp: now_iso(),
            query: normalized,
            results_count,
            search_time,
            prefecture: prefecture.map(str::to_string),
            cust_status: cust_status.map(str::to_string),
            city: city.map(str::to_string),
        };

        self.append_line(username, &event)?;

        let mut tables = self.tables.write();
        Self::record_query(&mut tables, self.analyzer.as_ref(), &event.query);
        *tables
            .user_search_counts
            .entry(username.to_string())
            .or_insert(0) += 1;
        tables
            .user_history
            .entry(username.to_string())
            .or_default()
            .insert(0, event);

        Ok(())
    }

    fn append_line(&self, username: &str, event: &SearchEvent) -> Result<()> {
        let path = self.path_for(username);
        let line = serde_json::to_string(event).map_err(|e| error::Error::Serde(e.to_string()))?;
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    pub fn popular_queries(&self, limit: usize) -> Vec<(String, u64)> {
        let tables = self.tables.read();
        top_n(&tables.query_counts, limit)
    }

    pub fn popular_keywords(&self, limit: usize) -> Vec<(String, u64)> {
        let tables = self.tables.read();
        top_n(&tables.keyword_counts, limit)
    }

    pub fn user_searches(&self, username: &str, limit: usize) -> Vec<SearchEvent> {
        let tables = self.tables.read();
        tables
            .user_history
            .get(username)
            .map(|events| events.iter().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    pub fn user_rankings(&self, limit: usize) -> Vec<(String, u64)> {
        let tables = self.tables.read();
        top_n(&tables.user_search_counts, limit)
    }

    pub fn rankings_stats(&self) -> RankingsStats {
        let tables = self.tables.read();
        let total_queries = tables.query_counts.values().sum();
        let unique_queries = tables.query_counts.len();
        let top_query = tables
            .query_counts
            .iter()
            .max_by_key(|(_, count)| **count)
            .map(|(query, count)| (query.clone(), *count));
        RankingsStats {
            total_queries,
            unique_queries,
            top_query,
        }
    }

    /// Admin-facing view across every user, merged and re-sorted by
    /// timestamp descending.
    pub fn all_searches(&self, limit: usize) -> Vec<(String, SearchEvent)> {
        let tables = self.tables.read();
        let mut merged: Vec<(String, SearchEvent)> = tables
            .user_history
            .iter()
            .flat_map(|(user, events)| events.iter().map(move |event| (user.clone(), event.clone())))
            .collect();
        merged.sort_by(|a, b| b.1.timestamp.cmp(&a.1.timestamp));
        merged.truncate(limit);
        merged
    }

    /// `{total_searches, unique_users, unique_queries}`.
    pub fn user_stats(&self) -> UserStats {
        let tables = self.tables.read();
        UserStats {
            total_searches: tables.user_search_counts.values().sum(),
            unique_users: tables.user_search_counts.len(),
            unique_queries: tables.query_counts.len(),
        }
    }
}

fn top_n(counts: &HashMap<String, u64>, limit: usize) -> Vec<(String, u64)> {
    let mut entries: Vec<(String, u64)> = counts.iter().map(|(k, v)| (k.clone(), *v)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(limit);
    entries
}

fn now_iso() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}
