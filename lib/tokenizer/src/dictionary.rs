use crate::{MorphAnalyzer, PartOfSpeech, RawToken};
use lindera::tokenizer::{Tokenizer, TokenizerConfig};
use lindera::{DictionaryConfig, DictionaryKind, Mode};
use once_cell::sync::OnceCell;

/// Pure, self-contained dictionary-based segmenter. Backed by `lindera`
/// with an embedded IPADIC dictionary: no external process, no native
/// library to link against.
pub struct DictionaryTokenizer {
    tokenizer: OnceCell<Tokenizer>,
}

impl DictionaryTokenizer {
    pub fn new() -> Self {
        Self {
            tokenizer: OnceCell::new(),
        }
    }

    fn tokenizer(&self) -> Option<&Tokenizer> {
        self.tokenizer
            .get_or_try_init(|| {
                let dictionary = DictionaryConfig {
                    kind: Some(DictionaryKind::IPADIC),
                    path: None,
                };
                let config = TokenizerConfig {
                    dictionary,
                    user_dictionary: None,
                    mode: Mode::Normal,
                };
                Tokenizer::from_config(config)
            })
            .map_err(|e| log::warn!("failed to initialize dictionary tokenizer: {e}"))
            .ok()
    }
}

impl Default for DictionaryTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl MorphAnalyzer for DictionaryTokenizer {
    fn analyze(&self, text: &str) -> Vec<RawToken> {
        let tokenizer = match self.tokenizer() {
            Some(t) => t,
            None => return Vec::new(),
        };

        let tokens = match tokenizer.tokenize(text) {
            Ok(tokens) => tokens,
            Err(e) => {
                log::warn!("dictionary tokenizer failed: {e}");
                return Vec::new();
            }
        };

        tokens
            .into_iter()
            .map(|mut token| {
                let details = token.get_details().unwrap_or_default();
                let major_class = details.first().copied().unwrap_or("*");
                let base_form = details.get(6).copied().unwrap_or(token.text.as_ref());
                RawToken {
                    surface: token.text.to_string(),
                    pos: PartOfSpeech::from_major_class(major_class),
                    base_form: base_form.to_string(),
                }
            })
            .collect()
    }
}
