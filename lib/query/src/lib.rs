use once_cell::sync::Lazy;
use regex::Regex;
use tokenizer::MorphAnalyzer;

/// Default minimum retained token length, used when a caller has no
/// configured value of its own (e.g. in tests). Production callers get
/// theirs from `config::Config::get_min_token_length`.
pub const DEFAULT_MIN_TOKEN_LENGTH: usize = 2;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static QUOTED_PHRASE: Lazy<Regex> = Lazy::new(|| Regex::new("\"([^\"]*)\"").unwrap());

/// Trims `raw`, folds the full-width ideographic space (U+3000) to an
/// ASCII space, and collapses runs of whitespace to one. Idempotent:
/// `normalize(normalize(q)) == normalize(q)`.
pub fn normalize(raw: &str) -> String {
    let folded = raw.trim().replace('\u{3000}', " ");
    WHITESPACE.replace_all(&folded, " ").trim().to_string()
}

/// Extracts every maximal double-quoted substring as a literal phrase and
/// returns `(residue_with_phrases_removed, phrases)`.
pub fn extract_quoted_phrases(text: &str) -> (String, Vec<String>) {
    let phrases = QUOTED_PHRASE
        .captures_iter(text)
        .map(|c| c[1].to_string())
        .collect();
    let residue = QUOTED_PHRASE.replace_all(text, "").trim().to_string();
    (normalize(&residue), phrases)
}

/// Compiles a raw user query into the string form consumed by the index
/// engine's disjunctive parser: phrases as `"phrase"`, tokens as `(token)`,
/// space-joined, phrases first. Returns the empty string when nothing
/// survives normalization/tokenization/filtering — callers treat that as
/// "no results". `min_token_length` is the configured floor below which a
/// token is dropped (see `passes_filters` in the `tokenizer` crate).
pub fn compile(analyzer: &dyn MorphAnalyzer, raw_query: &str, min_token_length: usize) -> String {
    let normalized = normalize(raw_query);
    let (residue, phrases) = extract_quoted_phrases(&normalized);
    let tokens = tokenizer::tokenize_and_filter(analyzer, &residue, min_token_length);

    let mut parts: Vec<String> = phrases
        .iter()
        .filter(|p| !p.trim().is_empty())
        .map(|p| format!("\"{p}\""))
        .collect();
    parts.extend(tokens.iter().map(|t| format!("({t})")));

    parts.join(" ")
}
