use crate::{MorphAnalyzer, PartOfSpeech, RawToken};
use mecab::Tagger;

/// Faster native-library backend, binding the system `libmecab` C++
/// library through the `mecab` crate's FFI wrapper. Faster than the pure
/// dictionary backend, but requires the native library to be installed on
/// the host.
pub struct NativeTokenizer {
    tagger: Tagger,
}

impl NativeTokenizer {
    pub fn new() -> Self {
        Self {
            tagger: Tagger::new(""),
        }
    }

    /// Attempts to initialize the backend, returning `None` if libmecab
    /// is missing or fails to load rather than panicking/aborting the
    /// process.
    pub fn try_new() -> Option<Self> {
        std::panic::catch_unwind(|| Tagger::new(""))
            .ok()
            .map(|tagger| Self { tagger })
    }
}

impl Default for NativeTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl MorphAnalyzer for NativeTokenizer {
    fn analyze(&self, text: &str) -> Vec<RawToken> {
        let mut tokens = Vec::new();
        let mut node = self.tagger.parse_to_node(text);

        loop {
            // BOS/EOS nodes carry an empty surface and are skipped, same
            // as the original MeCab-based backend.
            if !node.surface.is_empty() {
                let features: Vec<&str> = node.feature.split(',').collect();
                let major_class = features.first().copied().unwrap_or("*");
                let base_form = features
                    .get(6)
                    .filter(|f| **f != "*")
                    .copied()
                    .unwrap_or(node.surface);

                tokens.push(RawToken {
                    surface: node.surface.to_string(),
                    pos: PartOfSpeech::from_major_class(major_class),
                    base_form: base_form.to_string(),
                });
            }

            match node.next() {
                Some(next) => node = next,
                None => break,
            }
        }

        tokens
    }
}
