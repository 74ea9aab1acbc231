mod dictionary;
#[cfg(feature = "native")]
mod native;

pub use dictionary::DictionaryTokenizer;
#[cfg(feature = "native")]
pub use native::NativeTokenizer;

/// Japanese part-of-speech tag, collapsed to the coarse classes the filter
/// pipeline cares about. Any morpheme class outside these four is folded
/// into `Other` and dropped by [`tokenize_and_filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartOfSpeech {
    Noun,
    Verb,
    Adjective,
    Adverb,
    Other,
}

impl PartOfSpeech {
    /// Classifies the leading element of a MeCab/IPADIC-style feature
    /// string (e.g. `"名詞,一般,*,*,*,*,機械,キカイ,キカイ"`).
    pub fn from_major_class(major: &str) -> Self {
        match major {
            "名詞" => PartOfSpeech::Noun,
            "動詞" => PartOfSpeech::Verb,
            "形容詞" => PartOfSpeech::Adjective,
            "副詞" => PartOfSpeech::Adverb,
            _ => PartOfSpeech::Other,
        }
    }

    #[inline]
    fn retained(self) -> bool {
        !matches!(self, PartOfSpeech::Other)
    }
}

/// One morpheme as produced by a backend, before any filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawToken {
    pub surface: String,
    pub pos: PartOfSpeech,
    pub base_form: String,
}

/// Capability every tokenizer backend provides: turning text into an
/// ordered, unfiltered morpheme stream. Callers never branch on which
/// backend they hold; the filter pipeline below is shared and
/// backend-agnostic.
pub trait MorphAnalyzer {
    /// Segments `text`. Never fails the caller: on internal error this
    /// returns an empty vector and logs a warning.
    fn analyze(&self, text: &str) -> Vec<RawToken>;
}

/// The closed set of high-frequency Japanese particles and copulas
/// discarded regardless of part of speech. Preserved verbatim.
pub const STOPWORDS: &[&str] = &[
    "する", "ある", "なる", "いる", "できる", "という", "として", "の", "に", "は", "を", "が",
    "で", "て", "と", "から", "まで", "これ", "それ", "あれ", "この", "その", "あの", "ここ",
    "そこ", "あそこ", "こちら", "そちら", "あちら", "どこ", "だれ", "なに", "なん", "いつ",
    "どう", "だ", "である", "です", "ます",
];

#[inline]
fn is_stopword(surface: &str) -> bool {
    STOPWORDS.contains(&surface)
}

#[inline]
fn is_pure_digits(surface: &str) -> bool {
    !surface.is_empty() && surface.chars().all(|c| c.is_ascii_digit())
}

/// Returns `true` if `token` survives the POS/length/stopword filter
/// pipeline described in the tokenizer contract.
fn passes_filters(token: &RawToken, min_length: usize) -> bool {
    token.pos.retained()
        && token.surface.chars().count() >= min_length
        && !is_stopword(&token.surface)
}

/// `tokenize(text) -> ordered sequence of (surface, pos, base_form)`.
/// Applies no filtering; exposed for callers that need the raw morpheme
/// stream (e.g. furigana/base-form lookups).
pub fn tokenize(analyzer: &dyn MorphAnalyzer, text: &str) -> Vec<RawToken> {
    analyzer.analyze(text)
}

/// `tokenize_and_filter(text, min_length) -> ordered sequence of surface
/// strings`, applying the POS filter, length filter (default
/// `min_length = 2`) and stopword filter. Does **not** apply the
/// indexing-only pure-digit filter; see [`tokenize_for_index`].
pub fn tokenize_and_filter(analyzer: &dyn MorphAnalyzer, text: &str, min_length: usize) -> Vec<String> {
    analyzer
        .analyze(text)
        .into_iter()
        .filter(|t| passes_filters(t, min_length))
        .map(|t| t.surface)
        .collect()
}

/// Same as [`tokenize_and_filter`] but additionally discards pure-digit
/// surfaces, as required when tokenizing text for indexing.
pub fn tokenize_for_index(analyzer: &dyn MorphAnalyzer, text: &str, min_length: usize) -> Vec<String> {
    analyzer
        .analyze(text)
        .into_iter()
        .filter(|t| passes_filters(t, min_length) && !is_pure_digits(&t.surface))
        .map(|t| t.surface)
        .collect()
}

/// Selects a [`MorphAnalyzer`] backend by name. `None` (and an explicit
/// `"native"` request) tries the faster native-library backend first and
/// falls back to the pure dictionary backend if it is unavailable at
/// runtime (libmecab missing or failing to load), not just when the
/// `native` feature was left out of the build.
pub struct TokenizerFactory;

impl TokenizerFactory {
    pub fn create(name: Option<&str>) -> Box<dyn MorphAnalyzer + Send + Sync> {
        match name {
            Some("dictionary") => Box::new(DictionaryTokenizer::new()),
            #[cfg(feature = "native")]
            Some("native") => Self::try_native(),
            #[cfg(not(feature = "native"))]
            Some("native") => {
                log::warn!("native tokenizer backend requested but not compiled in, falling back to dictionary");
                Box::new(DictionaryTokenizer::new())
            }
            Some(other) => {
                log::warn!("unknown tokenizer backend '{other}', falling back to dictionary");
                Box::new(DictionaryTokenizer::new())
            }
            None => Self::auto_detect(),
        }
    }

    #[cfg(feature = "native")]
    fn auto_detect() -> Box<dyn MorphAnalyzer + Send + Sync> {
        Self::try_native()
    }

    #[cfg(not(feature = "native"))]
    fn auto_detect() -> Box<dyn MorphAnalyzer + Send + Sync> {
        Box::new(DictionaryTokenizer::new())
    }

    #[cfg(feature = "native")]
    fn try_native() -> Box<dyn MorphAnalyzer + Send + Sync> {
        match NativeTokenizer::try_new() {
            Some(tokenizer) => Box::new(tokenizer),
            None => {
                log::warn!("native tokenizer backend unavailable (libmecab missing or failed to load), falling back to dictionary");
                Box::new(DictionaryTokenizer::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    struct FakeAnalyzer(Vec<RawToken>);

    impl MorphAnalyzer for FakeAnalyzer {
        fn analyze(&self, _text: &str) -> Vec<RawToken> {
            self.0.clone()
        }
    }

    fn tok(surface: &str, pos: PartOfSpeech) -> RawToken {
        RawToken {
            surface: surface.to_string(),
            pos,
            base_form: surface.to_string(),
        }
    }

    #[test]
    fn filters_short_surfaces() {
        let analyzer = FakeAnalyzer(vec![tok("あ", PartOfSpeech::Noun)]);
        assert!(tokenize_and_filter(&analyzer, "x", 2).is_empty());
    }

    #[test]
    fn filters_non_retained_pos() {
        let analyzer = FakeAnalyzer(vec![tok("です", PartOfSpeech::Other)]);
        assert!(tokenize_and_filter(&analyzer, "x", 2).is_empty());
    }

    #[test_case("する"; "suru")]
    #[test_case("である"; "dearu")]
    #[test_case("これ"; "kore")]
    fn filters_stopwords(word: &str) {
        let analyzer = FakeAnalyzer(vec![tok(word, PartOfSpeech::Noun)]);
        assert!(tokenize_and_filter(&analyzer, "x", 1).is_empty());
    }

    #[test]
    fn retains_valid_surfaces() {
        let analyzer = FakeAnalyzer(vec![tok("機械学習", PartOfSpeech::Noun)]);
        assert_eq!(tokenize_and_filter(&analyzer, "x", 2), vec!["機械学習"]);
    }

    #[test]
    fn indexing_drops_pure_digit_tokens() {
        let analyzer = FakeAnalyzer(vec![
            tok("12345", PartOfSpeech::Noun),
            tok("機械学習", PartOfSpeech::Noun),
        ]);
        assert_eq!(tokenize_for_index(&analyzer, "x", 2), vec!["機械学習"]);
    }

    #[test]
    fn non_indexing_filter_keeps_digit_tokens() {
        let analyzer = FakeAnalyzer(vec![tok("12345", PartOfSpeech::Noun)]);
        assert_eq!(tokenize_and_filter(&analyzer, "x", 2), vec!["12345"]);
    }
}
