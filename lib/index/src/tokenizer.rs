use tantivy::tokenizer::{BoxTokenStream, Token, TokenStream, Tokenizer};

/// `content_tokens` already holds space-joined surface forms produced by
/// the `tokenizer` crate; tantivy only needs to split on whitespace, not
/// re-run morphological analysis.
#[derive(Clone, Default)]
pub struct WhitespaceTokenizer;

pub struct WhitespaceTokenStream {
    tokens: Vec<Token>,
    index: usize,
}

impl Tokenizer for WhitespaceTokenizer {
    fn token_stream<'a>(&self, text: &'a str) -> BoxTokenStream<'a> {
        let mut tokens = Vec::new();
        let mut offset = 0;
        for surface in text.split_whitespace() {
            let start = text[offset..].find(surface).map(|p| offset + p).unwrap_or(offset);
            let end = start + surface.len();
            tokens.push(Token {
                offset_from: start,
                offset_to: end,
                position: tokens.len(),
                text: surface.to_string(),
                position_length: 1,
            });
            offset = end;
        }
        BoxTokenStream::from(WhitespaceTokenStream { tokens, index: 0 })
    }
}

impl TokenStream for WhitespaceTokenStream {
    fn advance(&mut self) -> bool {
        if self.index < self.tokens.len() {
            self.index += 1;
            true
        } else {
            false
        }
    }

    fn token(&self) -> &Token {
        &self.tokens[self.index - 1]
    }

    fn token_mut(&mut self) -> &mut Token {
        &mut self.tokens[self.index - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_whitespace_and_tracks_offsets() {
        let mut stream = WhitespaceTokenizer.token_stream("機械 学習 基盤");
        let mut surfaces = Vec::new();
        while stream.advance() {
            surfaces.push(stream.token().text.clone());
        }
        assert_eq!(surfaces, vec!["機械", "学習", "基盤"]);
    }
}
